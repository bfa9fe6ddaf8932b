//! Builds the runtime `Config` by layering sources: defaults, then the
//! optional TOML file, then explicit CLI/environment overrides.

use std::path::PathBuf;
use std::time::Duration;

use crate::core::config::file::ConfigFile;
use crate::core::config::validation;
use crate::core::config::Config;
use crate::core::error::Result;

/// Layered builder for [`Config`].
///
/// Precedence is lowest to highest: built-in defaults, config file,
/// explicit setters (CLI flags / environment).
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        ConfigBuilder {
            config: Config::default(),
        }
    }

    /// Merges settings from a parsed configuration file. File values
    /// override defaults but lose to later explicit setters.
    pub fn with_config_file(mut self, file: &ConfigFile, path: &str) -> Self {
        if let Some(url) = &file.provider.target_url {
            self.config.target_url = url.clone();
        }
        if let Some(domain) = &file.provider.provider_domain {
            self.config.provider_domain = domain.clone();
        }

        if let Some(secs) = file.flow.nav_timeout {
            self.config.nav_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = file.flow.button_timeout {
            self.config.button_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = file.flow.redirect_timeout {
            self.config.redirect_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = file.flow.element_timeout {
            self.config.element_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = file.flow.authorize_timeout {
            self.config.authorize_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = file.flow.settle_short {
            self.config.settle_short = Duration::from_secs(secs);
        }
        if let Some(secs) = file.flow.settle_final {
            self.config.settle_final = Duration::from_secs(secs);
        }

        if let Some(url) = &file.webdriver.webdriver_url {
            self.config.webdriver_url = url.clone();
        }
        if let Some(path) = &file.webdriver.chromedriver_path {
            self.config.chromedriver_path = Some(path.clone());
        }
        if let Some(w) = file.webdriver.window_width {
            self.config.window_size.0 = w;
        }
        if let Some(h) = file.webdriver.window_height {
            self.config.window_size.1 = h;
        }

        if let Some(p) = &file.artifacts.screenshot_path {
            self.config.screenshot_path = PathBuf::from(p);
        }

        if let Some(token) = &file.notification.bot_token {
            self.config.bot_token = Some(token.clone());
        }
        if let Some(chat) = &file.notification.chat_id {
            self.config.chat_id = Some(chat.clone());
        }
        if let Some(flag) = file.notification.notify_on_failure {
            self.config.notify_on_failure = flag;
        }

        self.config.loaded_config_path = Some(path.to_string());
        self
    }

    pub fn target_url(mut self, url: Option<String>) -> Self {
        if let Some(url) = url {
            self.config.target_url = url;
        }
        self
    }

    pub fn provider_domain(mut self, domain: Option<String>) -> Self {
        if let Some(domain) = domain {
            self.config.provider_domain = domain;
        }
        self
    }

    pub fn webdriver_url(mut self, url: Option<String>) -> Self {
        if let Some(url) = url {
            self.config.webdriver_url = url;
        }
        self
    }

    pub fn chromedriver_path(mut self, path: Option<String>) -> Self {
        if let Some(path) = path {
            self.config.chromedriver_path = Some(path);
        }
        self
    }

    pub fn screenshot_path(mut self, path: Option<PathBuf>) -> Self {
        if let Some(path) = path {
            self.config.screenshot_path = path;
        }
        self
    }

    pub fn bot_token(mut self, token: Option<String>) -> Self {
        if let Some(token) = token {
            self.config.bot_token = Some(token);
        }
        self
    }

    pub fn chat_id(mut self, chat: Option<String>) -> Self {
        if let Some(chat) = chat {
            self.config.chat_id = Some(chat);
        }
        self
    }

    pub fn notify_on_failure(mut self, flag: bool) -> Self {
        if flag {
            self.config.notify_on_failure = true;
        }
        self
    }

    /// Validates the assembled configuration and returns it.
    pub fn build(self) -> Result<Config> {
        validation::validate(&self.config)?;
        Ok(self.config)
    }
}
