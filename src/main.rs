//! Binary entry point: parses the CLI, initializes tracing, and either
//! manages the local chromedriver service or runs the login flow.

mod cli;
mod service;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use claw_login_core::{run_login, AppError, Result};

use crate::cli::{Cli, Command, DriverAction};

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let code = match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{}", e);
            match e {
                AppError::Config(_) => 2,
                _ => 1,
            }
        }
    };
    std::process::exit(code);
}

async fn run(cli: Cli) -> Result<i32> {
    match cli.command {
        Some(Command::Driver { action }) => {
            let config = cli.run.build_config()?;
            match action {
                DriverAction::Start => {
                    service::chromedriver::start(&config).await?;
                    Ok(0)
                }
                DriverAction::Stop => {
                    service::chromedriver::stop(&config).await?;
                    Ok(0)
                }
                DriverAction::Status => {
                    let responsive = service::chromedriver::status(&config).await?;
                    Ok(if responsive { 0 } else { 1 })
                }
                DriverAction::Restart => {
                    service::chromedriver::restart(&config).await?;
                    Ok(0)
                }
                DriverAction::Logs { lines } => {
                    println!("{}", service::chromedriver::logs(lines)?);
                    Ok(0)
                }
            }
        }
        None => {
            let config = cli.run.build_config()?;
            let credentials = cli.run.build_credentials()?;
            let outcome = run_login(&config, &credentials).await?;
            Ok(if outcome.success { 0 } else { 1 })
        }
    }
}
