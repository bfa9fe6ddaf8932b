//! Defines the core runtime `Config` struct, its defaults, and related utilities.
//! Submodules handle loading, building, and validation.

pub(crate) mod builder;
pub(crate) mod file;
pub(crate) mod loading;
pub(crate) mod validation;

pub use builder::ConfigBuilder;
pub use file::ConfigFile;
pub use loading::load_config_file;

use std::path::PathBuf;
use std::time::Duration;

/// Runtime configuration settings used by the claw-login core logic.
///
/// The timeout and settle fields are policy constants: they encode
/// empirically tuned tolerance for provider redirect latency and are
/// configurable, but the defaults match the magnitudes the flow was
/// tuned against.
#[derive(Debug, Clone)]
pub struct Config {
    /// Entry URL of the target application.
    pub target_url: String,
    /// Host substring identifying the identity provider.
    pub provider_domain: String,

    /// WebDriver endpoint the browser session is created against.
    pub webdriver_url: String,
    /// Explicit chromedriver binary location, if any.
    pub chromedriver_path: Option<String>,
    /// Browser window size (width, height).
    pub window_size: (u32, u32),

    /// Maximum wait for initial navigation and page readiness.
    pub nav_timeout: Duration,
    /// Wait for the "login with provider" control to appear.
    pub button_timeout: Duration,
    /// Wait for the browser URL to reach the provider's domain.
    pub redirect_timeout: Duration,
    /// General element visibility wait (credential and code fields).
    pub element_timeout: Duration,
    /// Wait for the Authorize control.
    pub authorize_timeout: Duration,
    /// Short settle before re-inspecting page state.
    pub settle_short: Duration,
    /// Long settle allowing final redirects to complete before the
    /// terminal observation.
    pub settle_final: Duration,

    /// Screenshot destination, overwritten each run.
    pub screenshot_path: PathBuf,

    /// Telegram bot token; notification is disabled unless both this
    /// and `chat_id` are present.
    pub bot_token: Option<String>,
    /// Telegram chat id.
    pub chat_id: Option<String>,
    /// Also notify when the run ends in failure.
    pub notify_on_failure: bool,

    /// Path of the config file that was merged in, if any.
    pub loaded_config_path: Option<String>,
}

impl Config {
    fn build_default() -> Self {
        Config {
            target_url: "https://ap-northeast-1.run.claw.cloud/".to_string(),
            provider_domain: "github.com".to_string(),
            webdriver_url: "http://localhost:4444".to_string(),
            chromedriver_path: None,
            window_size: (1920, 1080),
            nav_timeout: Duration::from_secs(60),
            button_timeout: Duration::from_secs(10),
            redirect_timeout: Duration::from_secs(15),
            element_timeout: Duration::from_secs(15),
            authorize_timeout: Duration::from_secs(5),
            settle_short: Duration::from_secs(3),
            settle_final: Duration::from_secs(20),
            screenshot_path: PathBuf::from("login_result.png"),
            bot_token: None,
            chat_id: None,
            notify_on_failure: false,
            loaded_config_path: None,
        }
    }

    /// True when both notification recipient parts are configured.
    pub fn notification_enabled(&self) -> bool {
        self.bot_token.is_some() && self.chat_id.is_some()
    }
}

impl Default for Config {
    fn default() -> Self {
        Config::build_default()
    }
}
