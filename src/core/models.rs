//! Core data structures shared across the login flow.

use std::path::PathBuf;

/// Account credentials for the identity provider.
///
/// The password is never logged or included in notification text; only
/// the username appears in run output.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
    /// Base32 TOTP shared secret. Absent means a two-factor challenge
    /// cannot be answered and aborts the run.
    pub totp_secret: Option<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field(
                "totp_secret",
                &self.totp_secret.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

/// Terminal result of a login run.
#[derive(Debug, Clone)]
pub struct Outcome {
    /// Whether the success heuristic classified the final page as
    /// logged in.
    pub success: bool,
    /// Browser URL observed at the terminal state, if it could be read.
    pub final_url: Option<String>,
    /// Where the terminal screenshot landed, if capture succeeded.
    pub screenshot_path: Option<PathBuf>,
}

impl Outcome {
    pub fn success(final_url: Option<String>, screenshot_path: Option<PathBuf>) -> Self {
        Outcome {
            success: true,
            final_url,
            screenshot_path,
        }
    }

    pub fn failure(final_url: Option<String>, screenshot_path: Option<PathBuf>) -> Self {
        Outcome {
            success: false,
            final_url,
            screenshot_path,
        }
    }
}

/// Stages of the login flow, in the order they are normally traversed.
/// The flow may skip stages (an existing session can jump straight to
/// `Settling`) but never moves backwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowState {
    Start,
    ProviderChooser,
    CredentialPrompt,
    TwoFactorPrompt,
    AuthorizePrompt,
    Settling,
    Terminal,
}

impl std::fmt::Display for FlowState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            FlowState::Start => "start",
            FlowState::ProviderChooser => "provider-chooser",
            FlowState::CredentialPrompt => "credential-prompt",
            FlowState::TwoFactorPrompt => "two-factor-prompt",
            FlowState::AuthorizePrompt => "authorize-prompt",
            FlowState::Settling => "settling",
            FlowState::Terminal => "terminal",
        };
        f.write_str(name)
    }
}

/// How an individual flow step ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// The step's action took effect.
    Completed,
    /// An optional step was abandoned after a non-fatal driver
    /// failure.
    Skipped,
    /// The bounded wait elapsed without the step's element or
    /// condition appearing.
    TimedOut,
}

impl StepOutcome {
    pub fn advanced(&self) -> bool {
        matches!(self, StepOutcome::Completed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credentials_debug_redacts_password() {
        let creds = Credentials {
            username: "octocat".to_string(),
            password: "hunter2".to_string(),
            totp_secret: Some("GEZDGNBV".to_string()),
        };
        let rendered = format!("{:?}", creds);
        assert!(rendered.contains("octocat"));
        assert!(!rendered.contains("hunter2"));
        assert!(!rendered.contains("GEZDGNBV"));
    }

    #[test]
    fn outcome_constructors() {
        let ok = Outcome::success(Some("https://console.example/".to_string()), None);
        assert!(ok.success);
        let bad = Outcome::failure(None, Some(PathBuf::from("shot.png")));
        assert!(!bad.success);
        assert!(bad.screenshot_path.is_some());
    }

    #[test]
    fn step_outcome_advanced() {
        assert!(StepOutcome::Completed.advanced());
        assert!(!StepOutcome::Skipped.advanced());
        assert!(!StepOutcome::TimedOut.advanced());
    }
}
