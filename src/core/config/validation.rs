//! Sanity checks applied to the assembled configuration before use.

use tracing::warn;

use crate::core::config::Config;
use crate::core::error::{AppError, Result};

pub(crate) fn validate(config: &Config) -> Result<()> {
    if config.target_url.is_empty() {
        return Err(AppError::Config("target_url must not be empty".to_string()));
    }
    if !config.target_url.starts_with("http://") && !config.target_url.starts_with("https://") {
        return Err(AppError::Config(format!(
            "target_url must be an http(s) URL, got '{}'",
            config.target_url
        )));
    }
    if config.provider_domain.is_empty() {
        return Err(AppError::Config(
            "provider_domain must not be empty".to_string(),
        ));
    }
    if config.webdriver_url.is_empty() {
        return Err(AppError::Config(
            "webdriver_url must not be empty".to_string(),
        ));
    }

    let (w, h) = config.window_size;
    if w == 0 || h == 0 {
        return Err(AppError::Config(format!(
            "window size must be nonzero, got {}x{}",
            w, h
        )));
    }

    for (name, d) in [
        ("nav_timeout", config.nav_timeout),
        ("button_timeout", config.button_timeout),
        ("redirect_timeout", config.redirect_timeout),
        ("element_timeout", config.element_timeout),
        ("authorize_timeout", config.authorize_timeout),
    ] {
        if d.is_zero() {
            return Err(AppError::Config(format!("{} must be nonzero", name)));
        }
    }

    // One half of the notification pair without the other is almost
    // certainly a mistake, but the run itself can still proceed.
    if config.bot_token.is_some() != config.chat_id.is_some() {
        warn!(
            "Only one of bot_token/chat_id is set; Telegram notification stays disabled"
        );
    }

    Ok(())
}
