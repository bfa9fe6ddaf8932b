//! Core library for unattended console login through a GitHub OAuth
//! flow, with TOTP two-factor handling and Telegram outcome reporting.

pub mod core;
pub mod driver;
pub mod login;
pub mod notify;

pub use crate::core::config::{load_config_file, Config, ConfigBuilder, ConfigFile};
pub use crate::core::error::{AppError, Result};
pub use crate::core::models::{Credentials, Outcome};
pub use crate::driver::WebDriverPage;
pub use crate::login::LoginFlow;

use tracing::info;

/// Runs the full login flow: open a browser session, drive the OAuth
/// flow, report the outcome, and return it.
///
/// The outcome notification follows the configured policy; a flow
/// error still produces a failure notification before propagating.
pub async fn run_login(config: &Config, credentials: &Credentials) -> Result<Outcome> {
    info!(target: "login_flow", "Starting login run as {}", credentials.username);

    let page = WebDriverPage::connect(config).await?;
    let flow = LoginFlow::new(config, credentials);

    match flow.run(&page).await {
        Ok(outcome) => {
            notify::report_outcome(config, &credentials.username, outcome.success).await;
            Ok(outcome)
        }
        Err(e) => {
            notify::report_outcome(config, &credentials.username, false).await;
            Err(e)
        }
    }
}
