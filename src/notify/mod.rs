//! Telegram outcome reporting.
//!
//! Delivery is best-effort: a run's exit status must never depend on
//! whether the notification went through, so every transport or API
//! failure in here is logged and swallowed.

use std::path::Path;

use chrono::Local;
use tracing::{info, warn};

use crate::core::config::Config;

const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

/// Sends run outcome messages to a Telegram chat via the Bot API.
pub struct TelegramNotifier {
    token: String,
    chat_id: String,
    api_base: String,
    http: reqwest::Client,
}

impl TelegramNotifier {
    pub fn new(token: &str, chat_id: &str) -> Self {
        TelegramNotifier {
            token: token.to_string(),
            chat_id: chat_id.to_string(),
            api_base: TELEGRAM_API_BASE.to_string(),
            http: reqwest::Client::new(),
        }
    }

    /// Builds a notifier from config, or `None` when either half of
    /// the recipient pair is missing.
    pub fn from_config(config: &Config) -> Option<Self> {
        match (&config.bot_token, &config.chat_id) {
            (Some(token), Some(chat_id)) => Some(Self::new(token, chat_id)),
            _ => None,
        }
    }

    /// Points the notifier at a different API host.
    pub fn with_api_base(mut self, base: &str) -> Self {
        self.api_base = base.trim_end_matches('/').to_string();
        self
    }

    /// Reports the run outcome. Attaches the screenshot when the file
    /// exists, otherwise falls back to a plain message.
    pub async fn notify(&self, username: &str, success: bool, screenshot: Option<&Path>) {
        let status = if success {
            "ClawCloud login succeeded"
        } else {
            "ClawCloud login FAILED"
        };
        let message = format!(
            "{}\nAccount: {}\nTime: {}",
            status,
            username,
            Local::now().format("%Y-%m-%d %H:%M:%S")
        );

        let shot = screenshot.filter(|p| p.exists());
        let result = match shot {
            Some(path) => self.send_photo(&message, path).await,
            None => self.send_message(&format!("{} (no screenshot)", message)).await,
        };

        match result {
            Ok(()) => info!(target: "notify", "Telegram notification sent"),
            Err(e) => warn!(target: "notify", "Telegram notification failed: {}", e),
        }
    }

    async fn send_photo(&self, caption: &str, path: &Path) -> Result<(), String> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| format!("could not read screenshot {}: {}", path.display(), e))?;

        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name("login_result.png")
            .mime_str("image/png")
            .map_err(|e| e.to_string())?;
        let form = reqwest::multipart::Form::new()
            .text("chat_id", self.chat_id.clone())
            .text("caption", caption.to_string())
            .part("photo", part);

        let response = self
            .http
            .post(format!("{}/bot{}/sendPhoto", self.api_base, self.token))
            .multipart(form)
            .send()
            .await
            .map_err(|e| e.to_string())?;

        check_response(response).await
    }

    async fn send_message(&self, text: &str) -> Result<(), String> {
        let response = self
            .http
            .post(format!("{}/bot{}/sendMessage", self.api_base, self.token))
            .form(&[("chat_id", self.chat_id.as_str()), ("text", text)])
            .send()
            .await
            .map_err(|e| e.to_string())?;

        check_response(response).await
    }
}

async fn check_response(response: reqwest::Response) -> Result<(), String> {
    let status = response.status();
    if status.is_success() {
        Ok(())
    } else {
        let body = response.text().await.unwrap_or_default();
        Err(format!("API returned {}: {}", status, body))
    }
}

/// Success is always reported; failure only when `notify_on_failure`
/// is set.
fn should_notify(success: bool, notify_on_failure: bool) -> bool {
    success || notify_on_failure
}

/// Reports the outcome according to the configured notification policy.
pub async fn report_outcome(config: &Config, username: &str, success: bool) {
    let Some(notifier) = TelegramNotifier::from_config(config) else {
        info!(target: "notify", "Telegram notification not configured, skipping");
        return;
    };

    if !should_notify(success, config.notify_on_failure) {
        info!(target: "notify", "Run failed and notify_on_failure is off, skipping notification");
        return;
    }

    notifier
        .notify(username, success, Some(&config.screenshot_path))
        .await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn ok_body() -> serde_json::Value {
        serde_json::json!({ "ok": true, "result": {} })
    }

    #[tokio::test]
    async fn photo_is_sent_when_screenshot_exists() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/bot123:abc/sendPhoto"))
            .and(body_string_contains("octocat"))
            .and(body_string_contains("login_result.png"))
            .respond_with(ResponseTemplate::new(200).set_body_json(ok_body()))
            .expect(1)
            .mount(&server)
            .await;

        let mut shot = tempfile::NamedTempFile::new().unwrap();
        shot.write_all(b"\x89PNG fake").unwrap();

        let notifier = TelegramNotifier::new("123:abc", "42").with_api_base(&server.uri());
        notifier.notify("octocat", true, Some(shot.path())).await;
    }

    #[tokio::test]
    async fn message_fallback_when_screenshot_missing() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/bot123:abc/sendMessage"))
            .and(body_string_contains("no+screenshot"))
            .respond_with(ResponseTemplate::new(200).set_body_json(ok_body()))
            .expect(1)
            .mount(&server)
            .await;

        let notifier = TelegramNotifier::new("123:abc", "42").with_api_base(&server.uri());
        notifier
            .notify("octocat", false, Some(Path::new("/nonexistent/shot.png")))
            .await;
    }

    #[tokio::test]
    async fn api_errors_are_swallowed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/bot123:abc/sendMessage"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .expect(1)
            .mount(&server)
            .await;

        let notifier = TelegramNotifier::new("123:abc", "42").with_api_base(&server.uri());
        // Must not panic or propagate.
        notifier.notify("octocat", false, None).await;
    }

    #[tokio::test]
    async fn from_config_requires_both_halves() {
        let mut config = Config::default();
        assert!(TelegramNotifier::from_config(&config).is_none());

        config.bot_token = Some("123:abc".to_string());
        assert!(TelegramNotifier::from_config(&config).is_none());

        config.chat_id = Some("42".to_string());
        assert!(TelegramNotifier::from_config(&config).is_some());
    }

    #[test]
    fn failure_is_skipped_unless_opted_in() {
        assert!(should_notify(true, false));
        assert!(should_notify(true, true));
        assert!(!should_notify(false, false));
        assert!(should_notify(false, true));
    }
}
