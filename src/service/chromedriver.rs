//! Lifecycle management for a locally spawned chromedriver process.
//!
//! The run itself only needs a WebDriver endpoint; this module exists
//! so a cron-driven host can bring one up without a system service
//! manager. State lives under `~/.claw-login/`.

use std::fs::{self, File};
use std::path::PathBuf;
use std::process::Command;
use std::time::Duration;

use claw_login_core::{AppError, Config, Result};
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

/// Filesystem locations for the managed chromedriver instance.
pub struct ServicePaths {
    pub pid_file: PathBuf,
    pub log_file: PathBuf,
    pub drivers_dir: PathBuf,
}

impl ServicePaths {
    pub fn resolve() -> Self {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        let base = PathBuf::from(home).join(".claw-login");
        let service_dir = base.join("service");
        let drivers_dir = base.join("drivers");

        fs::create_dir_all(&service_dir).ok();
        fs::create_dir_all(&drivers_dir).ok();

        ServicePaths {
            pid_file: service_dir.join("chromedriver.pid"),
            log_file: service_dir.join("chromedriver.log"),
            drivers_dir,
        }
    }
}

/// Port the WebDriver endpoint listens on, taken from the configured
/// endpoint URL.
fn driver_port(config: &Config) -> u16 {
    url::Url::parse(&config.webdriver_url)
        .ok()
        .and_then(|u| u.port())
        .unwrap_or(4444)
}

/// Locates the chromedriver executable: explicit config path first,
/// then the managed drivers directory, then common install locations.
pub fn detect_driver_path(config: &Config) -> Result<PathBuf> {
    if let Some(ref custom) = config.chromedriver_path {
        if !custom.is_empty() {
            let path = PathBuf::from(custom);
            if path.is_file() {
                info!("Using configured chromedriver path: {}", path.display());
                return Ok(path);
            }
            warn!(
                "Configured chromedriver path '{}' not found or not a file",
                custom
            );
        }
    }

    let paths = ServicePaths::resolve();
    let managed = paths.drivers_dir.join("chromedriver");
    if managed.is_file() {
        return Ok(managed);
    }

    let mut candidates: Vec<PathBuf> = vec![
        PathBuf::from("/usr/local/bin/chromedriver"),
        PathBuf::from("/usr/bin/chromedriver"),
    ];
    #[cfg(target_os = "macos")]
    {
        candidates.push(PathBuf::from("/opt/homebrew/bin/chromedriver"));
        if let Ok(home) = std::env::var("HOME") {
            candidates.push(PathBuf::from(home).join("Applications/chromedriver"));
        }
    }

    for path in candidates {
        if path.is_file() {
            debug!("Found chromedriver at: {}", path.display());
            return Ok(path);
        }
    }

    Err(AppError::Initialization(
        "chromedriver executable not found. Install it or set chromedriver_path.".to_string(),
    ))
}

/// Probes the WebDriver /status endpoint.
async fn is_responsive(config: &Config) -> bool {
    let status_url = format!(
        "{}/status",
        config.webdriver_url.trim_end_matches('/')
    );
    matches!(
        reqwest::Client::new()
            .get(&status_url)
            .timeout(Duration::from_secs(2))
            .send()
            .await,
        Ok(response) if response.status().is_success()
    )
}

#[cfg(unix)]
fn process_alive(pid: u32) -> Result<bool> {
    let output = Command::new("ps").arg("-p").arg(pid.to_string()).output()?;
    Ok(output.status.success())
}

/// Starts chromedriver, reusing an already responsive instance.
pub async fn start(config: &Config) -> Result<()> {
    let paths = ServicePaths::resolve();
    let driver_path = detect_driver_path(config)?;

    if paths.pid_file.exists() {
        let pid_str = fs::read_to_string(&paths.pid_file)?;
        let pid = pid_str
            .trim()
            .parse::<u32>()
            .map_err(|e| AppError::Initialization(format!("Invalid PID in file: {}", e)))?;

        #[cfg(unix)]
        {
            if process_alive(pid)? {
                info!("chromedriver already running with PID {}", pid);
                if is_responsive(config).await {
                    info!("chromedriver is responsive at {}", config.webdriver_url);
                    return Ok(());
                }
                warn!("chromedriver process exists but is not responsive, restarting");
                stop(config).await?;
            } else {
                warn!("Found stale PID file, removing");
                fs::remove_file(&paths.pid_file)?;
            }
        }
    }

    let port = driver_port(config);
    info!(
        "Starting chromedriver at {} on port {}",
        driver_path.display(),
        port
    );

    if let Some(log_dir) = paths.log_file.parent() {
        fs::create_dir_all(log_dir)?;
    }
    let log_handle = File::create(&paths.log_file)?;

    let child = Command::new(&driver_path)
        .arg(format!("--port={}", port))
        .arg("--whitelisted-ips=")
        .stdout(std::process::Stdio::from(log_handle.try_clone()?))
        .stderr(std::process::Stdio::from(log_handle))
        .spawn()?;

    let pid = child.id();
    fs::write(&paths.pid_file, pid.to_string())?;

    sleep(Duration::from_secs(2)).await;
    if !is_responsive(config).await {
        sleep(Duration::from_secs(3)).await;
        if !is_responsive(config).await {
            error!("chromedriver started but is not responsive");
            return Err(AppError::Initialization(format!(
                "chromedriver started but is not responding at {}",
                config.webdriver_url
            )));
        }
    }

    info!("chromedriver started successfully with PID {}", pid);
    Ok(())
}

/// Stops the managed chromedriver process, escalating to SIGKILL if it
/// ignores the polite request.
pub async fn stop(_config: &Config) -> Result<()> {
    let paths = ServicePaths::resolve();

    if !paths.pid_file.exists() {
        info!("chromedriver is not running (no PID file found)");
        return Ok(());
    }

    let pid_str = fs::read_to_string(&paths.pid_file)?;
    let pid = match pid_str.trim().parse::<u32>() {
        Ok(p) => p,
        Err(e) => {
            error!("Invalid PID in file: {}", e);
            fs::remove_file(&paths.pid_file)?;
            return Ok(());
        }
    };

    info!("Stopping chromedriver (PID {})", pid);

    #[cfg(unix)]
    {
        Command::new("kill").arg(pid.to_string()).output()?;

        for _ in 0..10 {
            if !process_alive(pid)? {
                break;
            }
            sleep(Duration::from_millis(500)).await;
        }

        if process_alive(pid)? {
            warn!("chromedriver did not terminate gracefully, forcing");
            Command::new("kill")
                .arg("-9")
                .arg(pid.to_string())
                .output()?;
        }
    }

    fs::remove_file(&paths.pid_file)?;
    info!("chromedriver stopped");
    Ok(())
}

/// Reports whether the managed instance is alive and responsive.
pub async fn status(config: &Config) -> Result<bool> {
    let paths = ServicePaths::resolve();

    if !paths.pid_file.exists() {
        info!("chromedriver is not running (no PID file found)");
        return Ok(false);
    }

    let pid_str = fs::read_to_string(&paths.pid_file)?;
    let pid = match pid_str.trim().parse::<u32>() {
        Ok(p) => p,
        Err(e) => {
            error!("Invalid PID in file: {}", e);
            fs::remove_file(&paths.pid_file)?;
            return Ok(false);
        }
    };

    #[cfg(unix)]
    {
        if !process_alive(pid)? {
            info!("chromedriver is not running (stale PID file)");
            fs::remove_file(&paths.pid_file)?;
            return Ok(false);
        }
    }

    let responsive = is_responsive(config).await;
    if responsive {
        info!("chromedriver is running with PID {} and is responsive", pid);
    } else {
        warn!(
            "chromedriver process exists (PID {}) but is not responding",
            pid
        );
    }
    Ok(responsive)
}

/// Returns the last `lines` lines of the chromedriver log.
pub fn logs(lines: usize) -> Result<String> {
    let paths = ServicePaths::resolve();

    if !paths.log_file.exists() {
        return Err(AppError::Initialization(
            "chromedriver log file not found".to_string(),
        ));
    }

    let content = fs::read_to_string(&paths.log_file)?;
    let log_lines: Vec<&str> = content.lines().collect();
    let start = log_lines.len().saturating_sub(lines);
    Ok(log_lines[start..].join("\n"))
}

/// Stops and restarts the managed instance.
pub async fn restart(config: &Config) -> Result<()> {
    stop(config).await?;
    sleep(Duration::from_secs(1)).await;
    start(config).await
}
