//! Dry-run paste cycles.
//!
//! Wires a [`PasteOrchestrator`] to recording collaborators and runs it
//! through a [`RetryingThreadLoop`] that retries key-send failures, the way a
//! real host retries a paste request.

use std::sync::Arc;

use crate::config::Config;
use crate::error::{ClipshiftError, Result};
use crate::logging::Logger;
use crate::paste::recording::RecordingRig;
use crate::paste::{Key, PasteOrchestrator, RecoveryPolicy};
use crate::runner::{RetryingJob, RetryingThreadLoop, ThreadLoop};

/// Starting conditions for a dry run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Scenario {
    pub modifier_down: bool,
    pub letter_down: bool,
    /// Number of key-send batches that fail before sends succeed
    pub failing_sends: u32,
    /// Force [`RecoveryPolicy::Restore`] regardless of configuration
    pub restore: bool,
}

/// What a dry run did
#[derive(Debug)]
pub struct SimulationReport {
    pub rig: RecordingRig,
    pub outcome: Result<()>,
}

/// Run one retried paste cycle against recording collaborators.
pub async fn run(config: &Config, scenario: Scenario, logger: Logger) -> SimulationReport {
    let mut settings = config.paste;
    if scenario.restore {
        settings.recovery = RecoveryPolicy::Restore;
    }

    let mut held: Vec<Key> = Vec::with_capacity(2);
    if scenario.modifier_down {
        held.push(settings.modifier_key);
    }
    if scenario.letter_down {
        held.push(settings.letter_key);
    }

    let rig = RecordingRig::new(&held);
    rig.keyboard.fail_next_sends(scenario.failing_sends);

    let orchestrator = Arc::new(PasteOrchestrator::new(rig.collaborators(), logger.clone()).with_settings(&settings));

    let job = RetryingJob::new(move || {
        let orchestrator = Arc::clone(&orchestrator);
        async move { orchestrator.perform_paste().await }
    })
    .with_settings(&config.retry)
    .retry_when(|err| matches!(err, ClipshiftError::KeySend(_)));

    let retrying = RetryingThreadLoop::new(ThreadLoop::new(logger));
    let outcome = retrying.start(job).await;

    SimulationReport { rig, outcome }
}
