//! Element selectors for the GitHub OAuth and console login flow.

use crate::driver::Selector;

/// GitHub sign-in and authorization page selectors.
pub struct GithubSelectors;

impl GithubSelectors {
    pub fn login_field() -> Selector {
        Selector::Css("#login_field")
    }

    pub fn password_field() -> Selector {
        Selector::Css("#password")
    }

    pub fn sign_in_button() -> Selector {
        Selector::Css("input[name='commit']")
    }

    /// The one-time code input on the two-factor challenge page.
    pub fn totp_input() -> Selector {
        Selector::Css("#app_totp")
    }

    /// Authorization consent button shown on first-time or re-consent
    /// OAuth grants. GitHub renders it with dynamic ids, so it is
    /// matched by visible text.
    pub fn authorize_button() -> Selector {
        Selector::XPath("//button[contains(., 'Authorize')]")
    }
}

/// Console entry page selectors.
pub struct ConsoleSelectors;

impl ConsoleSelectors {
    /// The provider chooser control on the console's sign-in page.
    pub fn github_button() -> Selector {
        Selector::XPath("//button[contains(., 'GitHub')]")
    }
}
