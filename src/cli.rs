//! Command-line interface for the claw-login binary.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use claw_login_core::{load_config_file, AppError, Config, ConfigBuilder, Credentials, Result};

#[derive(Parser, Debug)]
#[command(
    name = "claw-login",
    version,
    about = "Unattended ClawCloud Run console login via GitHub OAuth"
)]
pub struct Cli {
    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Command>,

    #[command(flatten)]
    pub run: RunArgs,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Manage the local chromedriver service.
    Driver {
        #[command(subcommand)]
        action: DriverAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum DriverAction {
    /// Start chromedriver on the configured port.
    Start,
    /// Stop the managed chromedriver process.
    Stop,
    /// Show whether chromedriver is running and responsive.
    Status,
    /// Restart the managed chromedriver process.
    Restart,
    /// Print the tail of the chromedriver log.
    Logs {
        /// Number of lines to show.
        #[arg(short = 'n', long, default_value_t = 50)]
        lines: usize,
    },
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Provider account username.
    #[arg(long, env = "GH_USERNAME")]
    pub username: Option<String>,

    /// Provider account password.
    #[arg(long, env = "GH_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Base32 TOTP shared secret for the two-factor challenge.
    #[arg(long, env = "GH_2FA_SECRET", hide_env_values = true)]
    pub totp_secret: Option<String>,

    /// Telegram bot token for outcome notification.
    #[arg(long, env = "TG_BOT_TOKEN", hide_env_values = true)]
    pub bot_token: Option<String>,

    /// Telegram chat id for outcome notification.
    #[arg(long, env = "TG_CHAT_ID")]
    pub chat_id: Option<String>,

    /// Also send a notification when the run fails.
    #[arg(long)]
    pub notify_on_failure: bool,

    /// Path to a TOML configuration file.
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Entry URL of the target application.
    #[arg(long)]
    pub target_url: Option<String>,

    /// WebDriver endpoint URL.
    #[arg(long)]
    pub webdriver_url: Option<String>,

    /// Explicit chromedriver binary path.
    #[arg(long)]
    pub chromedriver_path: Option<String>,

    /// Screenshot output path.
    #[arg(long, value_name = "FILE")]
    pub screenshot: Option<PathBuf>,
}

impl RunArgs {
    /// Assembles the runtime configuration: defaults, then the config
    /// file (explicit or probed), then CLI/env overrides.
    pub fn build_config(&self) -> Result<Config> {
        let mut builder = ConfigBuilder::new();
        if let Some((file, path)) = load_config_file(self.config.as_deref())? {
            builder = builder.with_config_file(&file, &path);
        }
        builder
            .target_url(self.target_url.clone())
            .webdriver_url(self.webdriver_url.clone())
            .chromedriver_path(self.chromedriver_path.clone())
            .screenshot_path(self.screenshot.clone())
            .bot_token(self.bot_token.clone())
            .chat_id(self.chat_id.clone())
            .notify_on_failure(self.notify_on_failure)
            .build()
    }

    /// Credentials are mandatory for a login run; failing here keeps
    /// the error ahead of any browser session.
    pub fn build_credentials(&self) -> Result<Credentials> {
        let username = self
            .username
            .clone()
            .ok_or_else(|| AppError::Config("GH_USERNAME (or --username) must be set".to_string()))?;
        let password = self
            .password
            .clone()
            .ok_or_else(|| AppError::Config("GH_PASSWORD (or --password) must be set".to_string()))?;
        Ok(Credentials {
            username,
            password,
            totp_secret: self.totp_secret.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn bare_args() -> RunArgs {
        RunArgs {
            username: None,
            password: None,
            totp_secret: None,
            bot_token: None,
            chat_id: None,
            notify_on_failure: false,
            config: None,
            target_url: None,
            webdriver_url: None,
            chromedriver_path: None,
            screenshot: None,
        }
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn missing_credentials_is_a_config_error() {
        let result = bare_args().build_credentials();
        assert!(matches!(result, Err(AppError::Config(_))));

        let mut args = bare_args();
        args.username = Some("octocat".to_string());
        assert!(matches!(
            args.build_credentials(),
            Err(AppError::Config(_))
        ));
    }

    #[test]
    fn complete_credentials_build() {
        let mut args = bare_args();
        args.username = Some("octocat".to_string());
        args.password = Some("hunter2".to_string());
        let creds = args.build_credentials().unwrap();
        assert_eq!(creds.username, "octocat");
        assert!(creds.totp_secret.is_none());
    }

    #[test]
    fn cli_overrides_reach_config() {
        let mut args = bare_args();
        args.webdriver_url = Some("http://localhost:9515".to_string());
        args.notify_on_failure = true;
        let config = args.build_config().unwrap();
        assert_eq!(config.webdriver_url, "http://localhost:9515");
        assert!(config.notify_on_failure);
    }

    #[test]
    fn driver_subcommand_parses() {
        let cli = Cli::try_parse_from(["claw-login", "driver", "logs", "-n", "10"]).unwrap();
        match cli.command {
            Some(Command::Driver {
                action: DriverAction::Logs { lines },
            }) => assert_eq!(lines, 10),
            other => panic!("unexpected parse: {:?}", other),
        }
    }
}
