//! Defines the structure mirroring the TOML configuration file format.

use serde::Deserialize;

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    #[serde(default)]
    pub(crate) provider: ProviderConfig,
    #[serde(default)]
    pub(crate) flow: FlowConfig,
    #[serde(default)]
    pub(crate) webdriver: WebDriverConfig,
    #[serde(default)]
    pub(crate) artifacts: ArtifactsConfig,
    #[serde(default)]
    pub(crate) notification: NotificationConfig,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
pub(crate) struct ProviderConfig {
    pub(crate) target_url: Option<String>,
    pub(crate) provider_domain: Option<String>,
}

/// All durations are in whole seconds.
#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
pub(crate) struct FlowConfig {
    pub(crate) nav_timeout: Option<u64>,
    pub(crate) button_timeout: Option<u64>,
    pub(crate) redirect_timeout: Option<u64>,
    pub(crate) element_timeout: Option<u64>,
    pub(crate) authorize_timeout: Option<u64>,
    pub(crate) settle_short: Option<u64>,
    pub(crate) settle_final: Option<u64>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
pub(crate) struct WebDriverConfig {
    pub(crate) webdriver_url: Option<String>,
    pub(crate) chromedriver_path: Option<String>,
    pub(crate) window_width: Option<u32>,
    pub(crate) window_height: Option<u32>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
pub(crate) struct ArtifactsConfig {
    pub(crate) screenshot_path: Option<String>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
pub(crate) struct NotificationConfig {
    pub(crate) bot_token: Option<String>,
    pub(crate) chat_id: Option<String>,
    pub(crate) notify_on_failure: Option<bool>,
}
