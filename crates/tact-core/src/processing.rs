//! The "calculating your kitchen" interstitial (step 5).
//!
//! Nothing is computed here. The screen shows a scripted series of status
//! lines, pauses, and then moves the wizard to the contact step exactly once.

use std::time::Duration;

use crate::wizard::{reduce, Step, WizardAction, WizardState};

#[derive(Debug, Clone)]
pub struct ProcessingSequence {
    pub messages: Vec<String>,
    /// Delay between consecutive status lines, and after the last one.
    pub interval: Duration,
    /// Pause on the "done" screen before the wizard advances.
    pub settle: Duration,
}

impl Default for ProcessingSequence {
    fn default() -> Self {
        Self {
            messages: [
                "Analyzing your selections...",
                "Calculating the total area...",
                "Finding the best prices for you...",
                "Preparing your offer...",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            interval: Duration::from_millis(1_000),
            settle: Duration::from_millis(1_500),
        }
    }
}

impl ProcessingSequence {
    /// Wall-clock time from start until the wizard advances.
    #[must_use]
    pub fn total_duration(&self) -> Duration {
        let ticks = u32::try_from(self.messages.len().max(1)).unwrap_or(u32::MAX);
        self.interval * ticks + self.settle
    }
}

/// Plays `sequence`, reporting each status line through `on_status`, then
/// advances the wizard by one step.
///
/// The advance only happens if `state` is on [`Step::Processing`]; a state
/// that is anywhere else comes back unchanged after the sequence plays.
pub async fn run_processing<F>(
    state: WizardState,
    sequence: &ProcessingSequence,
    mut on_status: F,
) -> WizardState
where
    F: FnMut(&str),
{
    for (i, message) in sequence.messages.iter().enumerate() {
        if i > 0 {
            tokio::time::sleep(sequence.interval).await;
        }
        on_status(message);
    }
    tokio::time::sleep(sequence.interval).await;
    tokio::time::sleep(sequence.settle).await;

    if state.step() == Step::Processing {
        tracing::debug!("processing sequence complete, advancing to contact step");
        reduce(state, WizardAction::Next)
    } else {
        state
    }
}
