//! Bounded execution of individual flow steps.
//!
//! Every step carries its own timeout and an `optional` flag. Optional
//! steps that time out or fail are classified and logged, never fatal;
//! mandatory steps escalate into [`AppError::MandatoryStep`].

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::core::error::{AppError, Result};
use crate::core::models::StepOutcome;
use crate::driver::{PageDriver, Selector};

/// What a step does to the page.
pub enum StepAction<'a> {
    Click(Selector),
    Fill(Selector, &'a str),
    WaitForElement(Selector),
    WaitForUrlContains(&'a str),
}

/// A single bounded flow step.
pub struct Step<'a> {
    pub name: &'static str,
    pub action: StepAction<'a>,
    pub timeout: Duration,
    /// When true, a timeout or driver failure is classified and the
    /// flow continues. When false, either escalates.
    pub optional: bool,
}

/// Runs the step against the page and classifies its result.
pub async fn execute(page: &dyn PageDriver, step: &Step<'_>) -> Result<StepOutcome> {
    let attempt = match &step.action {
        StepAction::Click(selector) => page.click(selector, step.timeout).await,
        StepAction::Fill(selector, text) => page.fill(selector, text, step.timeout).await,
        StepAction::WaitForElement(selector) => page.wait_for_element(selector, step.timeout).await,
        StepAction::WaitForUrlContains(needle) => {
            page.wait_for_url_contains(needle, step.timeout).await
        }
    };

    match (attempt, step.optional) {
        (Ok(true), _) => {
            debug!(target: "login_flow", "Step '{}' completed", step.name);
            Ok(StepOutcome::Completed)
        }
        (Ok(false), true) => {
            info!(
                target: "login_flow",
                "Step '{}' did not complete within {:?}, continuing", step.name, step.timeout
            );
            Ok(StepOutcome::TimedOut)
        }
        (Ok(false), false) => Err(AppError::MandatoryStep(format!(
            "step '{}': condition not met within {:?}",
            step.name, step.timeout
        ))),
        (Err(e), true) => {
            warn!(
                target: "login_flow",
                "Step '{}' failed ({}), skipping", step.name, e
            );
            Ok(StepOutcome::Skipped)
        }
        (Err(e), false) => Err(AppError::MandatoryStep(format!(
            "step '{}': {}",
            step.name, e
        ))),
    }
}
