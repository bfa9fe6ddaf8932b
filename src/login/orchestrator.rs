//! Drives the login flow end to end: console entry page, provider
//! chooser, credential form, two-factor challenge, OAuth consent, and
//! the terminal observation that decides success.
//!
//! The browser session is closed exactly once on every path out of
//! [`LoginFlow::run`], including fatal errors partway through.

use std::path::PathBuf;

use once_cell::sync::Lazy;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::core::config::Config;
use crate::core::error::{AppError, Result};
use crate::core::models::{Credentials, FlowState, Outcome};
use crate::driver::{PageDriver, Selector};
use crate::login::executor::{self, Step, StepAction};
use crate::login::selectors::{ConsoleSelectors, GithubSelectors};
use crate::login::totp;

/// Page-text fragments that positively identify the logged-in console.
static SUCCESS_TEXT_MARKERS: Lazy<Vec<&'static str>> =
    Lazy::new(|| vec!["App Launchpad", "Devbox"]);

/// URL fragments that positively identify a post-login console URL.
static SUCCESS_URL_MARKERS: Lazy<Vec<&'static str>> = Lazy::new(|| vec!["private-team", "console"]);

/// Everything the flow can still read once it reaches the terminal
/// state. Each field is best-effort.
struct TerminalObservation {
    final_url: Option<String>,
    page_text: String,
    screenshot: Option<PathBuf>,
}

/// The login flow state machine.
pub struct LoginFlow<'a> {
    config: &'a Config,
    credentials: &'a Credentials,
}

impl<'a> LoginFlow<'a> {
    pub fn new(config: &'a Config, credentials: &'a Credentials) -> Self {
        LoginFlow {
            config,
            credentials,
        }
    }

    /// Runs the flow to completion against an open page.
    ///
    /// On a flow error the terminal observation is still attempted
    /// (the screenshot lands on disk for the failure report) and the
    /// session is still closed before the error is returned.
    pub async fn run(&self, page: &dyn PageDriver) -> Result<Outcome> {
        let started = std::time::Instant::now();
        let flow = self.drive(page).await;

        let observation = self.observe_terminal(page).await;

        if let Err(e) = page.close().await {
            warn!(target: "login_flow", "Failed to close browser session cleanly: {}", e);
        } else {
            info!(target: "login_flow", "Browser session closed");
        }

        let elapsed = started.elapsed();
        match flow {
            Ok(()) => {
                let success = determine_success(
                    &observation.page_text,
                    observation.final_url.as_deref(),
                    &self.config.provider_domain,
                );
                info!(
                    target: "login_flow",
                    "Flow finished in {:.1}s: {}",
                    elapsed.as_secs_f64(),
                    if success { "success" } else { "failure" }
                );
                let outcome = if success {
                    Outcome::success(observation.final_url, observation.screenshot)
                } else {
                    Outcome::failure(observation.final_url, observation.screenshot)
                };
                Ok(outcome)
            }
            Err(e) => {
                warn!(
                    target: "login_flow",
                    "Flow aborted after {:.1}s: {}", elapsed.as_secs_f64(), e
                );
                Err(e)
            }
        }
    }

    async fn drive(&self, page: &dyn PageDriver) -> Result<()> {
        let config = self.config;
        let mut state = FlowState::Start;

        info!(target: "login_flow", "[Step 1] Opening {}", config.target_url);
        if let Err(e) = page.navigate(&config.target_url).await {
            // The entry page sometimes stalls mid-load while the app
            // itself is already interactive.
            warn!(target: "login_flow", "Initial navigation reported an error, continuing: {}", e);
        }
        executor::execute(
            page,
            &Step {
                name: "page-ready",
                action: StepAction::WaitForElement(Selector::Css("body")),
                timeout: config.nav_timeout,
                optional: true,
            },
        )
        .await?;

        self.transition(&mut state, FlowState::ProviderChooser);
        info!(target: "login_flow", "[Step 2] Looking for the GitHub sign-in button");
        let chooser = executor::execute(
            page,
            &Step {
                name: "provider-chooser-click",
                action: StepAction::Click(ConsoleSelectors::github_button()),
                timeout: config.button_timeout,
                optional: true,
            },
        )
        .await?;
        if !chooser.advanced() {
            info!(
                target: "login_flow",
                "GitHub button not found; an existing session may have skipped the chooser"
            );
        }

        info!(target: "login_flow", "[Step 3] Waiting for redirect to {}", config.provider_domain);
        let redirected = executor::execute(
            page,
            &Step {
                name: "provider-redirect",
                action: StepAction::WaitForUrlContains(&config.provider_domain),
                timeout: config.redirect_timeout,
                optional: true,
            },
        )
        .await?;

        if redirected.advanced() {
            self.enter_provider(page, &mut state).await?;
        } else {
            info!(
                target: "login_flow",
                "Never reached the provider; assuming the session was already authenticated"
            );
        }

        self.transition(&mut state, FlowState::Settling);
        info!(
            target: "login_flow",
            "[Step 6] Letting final redirects settle for {:?}", config.settle_final
        );
        sleep(config.settle_final).await;

        self.transition(&mut state, FlowState::Terminal);
        Ok(())
    }

    /// Credential form, two-factor challenge, and OAuth consent, run
    /// only once the browser has reached the provider's domain.
    async fn enter_provider(&self, page: &dyn PageDriver, state: &mut FlowState) -> Result<()> {
        let config = self.config;

        let url = page.current_url().await.unwrap_or_default();
        if url.contains("login") {
            self.transition(state, FlowState::CredentialPrompt);
            info!(target: "login_flow", "[Step 4] Entering credentials");
            self.submit_credentials(page).await?;
        } else {
            info!(
                target: "login_flow",
                "[Step 4] No credential form (already signed in to the provider)"
            );
        }

        sleep(config.settle_short).await;

        let url = page.current_url().await.unwrap_or_default();
        let totp_present = page.element_count(&GithubSelectors::totp_input()).await? > 0;
        if url.contains("two-factor") || totp_present {
            self.transition(state, FlowState::TwoFactorPrompt);
            info!(target: "login_flow", "[Step 5] Two-factor challenge detected");
            self.answer_two_factor(page).await?;
        }

        sleep(config.settle_short).await;

        let url = page.current_url().await.unwrap_or_default();
        if url.to_lowercase().contains("authorize") {
            self.transition(state, FlowState::AuthorizePrompt);
            info!(target: "login_flow", "Authorization consent requested, confirming");
            executor::execute(
                page,
                &Step {
                    name: "authorize-click",
                    action: StepAction::Click(GithubSelectors::authorize_button()),
                    timeout: config.authorize_timeout,
                    optional: true,
                },
            )
            .await?;
        }

        Ok(())
    }

    async fn submit_credentials(&self, page: &dyn PageDriver) -> Result<()> {
        let config = self.config;
        let steps = [
            Step {
                name: "username-fill",
                action: StepAction::Fill(
                    GithubSelectors::login_field(),
                    &self.credentials.username,
                ),
                timeout: config.element_timeout,
                optional: true,
            },
            Step {
                name: "password-fill",
                action: StepAction::Fill(
                    GithubSelectors::password_field(),
                    &self.credentials.password,
                ),
                timeout: config.element_timeout,
                optional: true,
            },
            Step {
                name: "sign-in-click",
                action: StepAction::Click(GithubSelectors::sign_in_button()),
                timeout: config.element_timeout,
                optional: true,
            },
        ];

        for step in &steps {
            let outcome = executor::execute(page, step).await?;
            if !outcome.advanced() {
                info!(
                    target: "login_flow",
                    "Credential step '{}' skipped ({:?})", step.name, outcome
                );
            }
        }
        info!(target: "login_flow", "Sign-in form submitted");
        Ok(())
    }

    /// Nothing past a detected two-factor prompt can succeed without
    /// the code, so every failure in here is fatal.
    async fn answer_two_factor(&self, page: &dyn PageDriver) -> Result<()> {
        let secret = self
            .credentials
            .totp_secret
            .as_deref()
            .ok_or(AppError::SecondFactorRequired)?;

        let code = totp::generate_now(secret)?;

        executor::execute(
            page,
            &Step {
                name: "two-factor-code",
                action: StepAction::Fill(GithubSelectors::totp_input(), &code),
                timeout: self.config.element_timeout,
                optional: false,
            },
        )
        .await?;
        info!(target: "login_flow", "Two-factor code submitted");
        Ok(())
    }

    async fn observe_terminal(&self, page: &dyn PageDriver) -> TerminalObservation {
        let final_url = match page.current_url().await {
            Ok(url) => {
                info!(target: "login_flow", "Final URL: {}", url);
                Some(url)
            }
            Err(e) => {
                warn!(target: "login_flow", "Could not read final URL: {}", e);
                None
            }
        };

        let page_text = match page.page_text().await {
            Ok(text) => text,
            Err(e) => {
                warn!(target: "login_flow", "Could not read page text: {}", e);
                String::new()
            }
        };

        let screenshot = match page.screenshot(&self.config.screenshot_path).await {
            Ok(()) => {
                info!(
                    target: "login_flow",
                    "Result screenshot saved to {}", self.config.screenshot_path.display()
                );
                Some(self.config.screenshot_path.clone())
            }
            Err(e) => {
                warn!(target: "login_flow", "Screenshot capture failed: {}", e);
                None
            }
        };

        TerminalObservation {
            final_url,
            page_text,
            screenshot,
        }
    }

    fn transition(&self, state: &mut FlowState, next: FlowState) {
        tracing::debug!(target: "login_flow", "State: {} -> {}", state, next);
        *state = next;
    }
}

/// Ordered success heuristic over the terminal observation.
///
/// Checks run strongest first: console page text, then known console
/// URL fragments. The last arm is a loose fallback that treats any URL
/// away from both the sign-in page and the provider as success; it can
/// misclassify error pages that land elsewhere, but the console's
/// post-login URLs vary too much to enumerate.
fn determine_success(page_text: &str, final_url: Option<&str>, provider_domain: &str) -> bool {
    if SUCCESS_TEXT_MARKERS.iter().any(|m| page_text.contains(m)) {
        return true;
    }
    let Some(url) = final_url else {
        return false;
    };
    if SUCCESS_URL_MARKERS.iter().any(|m| url.contains(m)) {
        return true;
    }
    !url.contains("signin") && !url.contains(provider_domain)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::mock::{ClickEffect, MockPageDriver};
    use crate::driver::Selector;

    const TARGET: &str = "https://ap-northeast-1.run.claw.cloud/";
    const RFC_SECRET: &str = "GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQ";

    fn test_config(dir: &tempfile::TempDir) -> Config {
        let mut config = Config::default();
        config.screenshot_path = dir.path().join("login_result.png");
        config
    }

    fn credentials(secret: Option<&str>) -> Credentials {
        Credentials {
            username: "octocat".to_string(),
            password: "hunter2".to_string(),
            totp_secret: secret.map(str::to_string),
        }
    }

    // ------------------------------------------------------------------
    // Success heuristic
    // ------------------------------------------------------------------

    #[test]
    fn text_marker_wins_even_on_signin_url() {
        assert!(determine_success(
            "Welcome! App Launchpad",
            Some("https://example.test/signin"),
            "github.com"
        ));
    }

    #[test]
    fn url_marker_matches() {
        assert!(determine_success(
            "",
            Some("https://example.test/private-team/dashboard"),
            "github.com"
        ));
        assert!(determine_success(
            "",
            Some("https://example.test/console"),
            "github.com"
        ));
    }

    #[test]
    fn fallback_accepts_unrecognized_urls() {
        assert!(determine_success(
            "",
            Some("https://somewhere.else/home"),
            "github.com"
        ));
    }

    #[test]
    fn signin_and_provider_urls_fail() {
        assert!(!determine_success(
            "",
            Some("https://example.test/signin"),
            "github.com"
        ));
        assert!(!determine_success(
            "",
            Some("https://github.com/login"),
            "github.com"
        ));
    }

    #[test]
    fn missing_url_needs_text_marker() {
        assert!(!determine_success("", None, "github.com"));
        assert!(determine_success("Devbox", None, "github.com"));
    }

    // ------------------------------------------------------------------
    // Full flow
    // ------------------------------------------------------------------

    #[tokio::test(start_paused = true)]
    async fn full_flow_without_two_factor_succeeds() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(&dir);
        let creds = credentials(Some(RFC_SECRET));

        let login_field = GithubSelectors::login_field();
        let password_field = GithubSelectors::password_field();
        let commit = GithubSelectors::sign_in_button();

        let page = MockPageDriver::new()
            .with_present(&[&ConsoleSelectors::github_button()])
            .on_click(
                &ConsoleSelectors::github_button(),
                ClickEffect {
                    url: Some("https://github.com/login".to_string()),
                    add: vec![login_field.raw(), password_field.raw(), commit.raw()],
                    ..Default::default()
                },
            )
            .on_click(
                &commit,
                ClickEffect {
                    url: Some(format!("{}console", TARGET)),
                    page_text: Some("App Launchpad / Devbox".to_string()),
                    ..Default::default()
                },
            );

        let outcome = LoginFlow::new(&config, &creds).run(&page).await.unwrap();

        assert!(outcome.success);
        assert_eq!(outcome.final_url.as_deref(), Some("https://ap-northeast-1.run.claw.cloud/console"));
        assert_eq!(page.navigations(), vec![TARGET.to_string()]);
        assert_eq!(
            page.fills(),
            vec![
                ("#login_field".to_string(), "octocat".to_string()),
                ("#password".to_string(), "hunter2".to_string()),
            ]
        );
        assert_eq!(page.close_count(), 1);
        assert_eq!(page.screenshots().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn existing_session_skips_chooser_and_succeeds() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(&dir);
        let creds = credentials(None);

        // No GitHub button, URL never leaves the console host.
        let page = MockPageDriver::new().with_page_text("App Launchpad");

        let outcome = LoginFlow::new(&config, &creds).run(&page).await.unwrap();

        assert!(outcome.success);
        assert!(page.fills().is_empty());
        assert_eq!(page.close_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn two_factor_without_secret_aborts_and_still_closes() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(&dir);
        let creds = credentials(None);

        let page = MockPageDriver::new()
            .with_url("https://github.com/sessions/two-factor/app")
            .with_present(&[&GithubSelectors::totp_input()]);

        let result = LoginFlow::new(&config, &creds).run(&page).await;

        assert!(matches!(result, Err(AppError::SecondFactorRequired)));
        assert_eq!(page.close_count(), 1);
        // The failure screenshot is still captured for the report.
        assert_eq!(page.screenshots().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn two_factor_code_is_filled() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(&dir);
        let creds = credentials(Some(RFC_SECRET));

        let page = MockPageDriver::new()
            .with_url("https://github.com/sessions/two-factor/app")
            .with_present(&[&GithubSelectors::totp_input()]);

        let _ = LoginFlow::new(&config, &creds).run(&page).await.unwrap();

        let fills = page.fills();
        assert_eq!(fills.len(), 1);
        assert_eq!(fills[0].0, "#app_totp");
        assert_eq!(fills[0].1.len(), 6);
        assert!(fills[0].1.chars().all(|c| c.is_ascii_digit()));
    }

    #[tokio::test(start_paused = true)]
    async fn two_factor_fill_failure_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(&dir);
        let creds = credentials(Some(RFC_SECRET));

        let page = MockPageDriver::new()
            .with_url("https://github.com/sessions/two-factor/app")
            .with_present(&[&GithubSelectors::totp_input()])
            .failing_on(&GithubSelectors::totp_input());

        let result = LoginFlow::new(&config, &creds).run(&page).await;

        assert!(matches!(result, Err(AppError::MandatoryStep(_))));
        assert_eq!(page.close_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn invalid_secret_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(&dir);
        let creds = credentials(Some("not!base32!"));

        let page = MockPageDriver::new()
            .with_url("https://github.com/sessions/two-factor/app")
            .with_present(&[&GithubSelectors::totp_input()]);

        let result = LoginFlow::new(&config, &creds).run(&page).await;

        assert!(matches!(result, Err(AppError::InvalidSecret(_))));
        assert_eq!(page.close_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn authorize_prompt_is_confirmed() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(&dir);
        let creds = credentials(None);

        let authorize = GithubSelectors::authorize_button();
        let page = MockPageDriver::new()
            .with_url("https://github.com/login/oauth/authorize?client_id=x")
            .with_present(&[&authorize])
            .on_click(
                &authorize,
                ClickEffect {
                    url: Some(format!("{}console", TARGET)),
                    ..Default::default()
                },
            );

        let outcome = LoginFlow::new(&config, &creds).run(&page).await.unwrap();

        assert!(outcome.success);
        assert_eq!(page.clicks(), vec![authorize.raw().to_string()]);
        assert_eq!(page.close_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn screenshot_failure_does_not_break_the_run() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(&dir);
        let creds = credentials(None);

        let page = MockPageDriver::new()
            .with_page_text("App Launchpad")
            .failing_screenshot();

        let outcome = LoginFlow::new(&config, &creds).run(&page).await.unwrap();

        assert!(outcome.success);
        assert!(outcome.screenshot_path.is_none());
        assert_eq!(page.close_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn sign_in_page_without_button_is_failure() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(&dir);
        let creds = credentials(None);

        let signin_url = format!("{}signin", TARGET);
        let page = MockPageDriver::new().with_url(&signin_url);

        let outcome = LoginFlow::new(&config, &creds).run(&page).await.unwrap();

        assert!(!outcome.success);
        assert_eq!(page.close_count(), 1);
    }

    #[test]
    fn selector_raw_roundtrip() {
        assert_eq!(Selector::Css("#x").raw(), "#x");
    }
}
