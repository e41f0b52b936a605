//! Paste orchestrator - simulates the paste shortcut without tripping the
//! hotkey interceptor that watches for it.
//!
//! One cycle runs these stages strictly in order:
//!
//! ```text
//! Idle → CaptureState → SuspendInterception → Phase1Inject →
//! ReinstallInterception → Phase2Inject → ResumeInterception → Idle
//! ```
//!
//! Errors from the key sender or the hook surface are returned as-is. With
//! [`RecoveryPolicy::Leave`] a failed cycle leaves interception suspended and
//! the caller owns cleanup; [`RecoveryPolicy::Restore`] resumes interception
//! before the error reaches the caller.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::PasteSettings;
use crate::error::Result;
use crate::logging::Logger;

use super::collaborators::{
    HookSuspension, HotkeyInterceptor, InteractionMediator, KeySender, KeyStateSource, WindowHandleSource,
};
use super::keys::{CapturedKeys, PasteGesture};

/// Where a paste cycle currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PasteStage {
    Idle,
    CaptureState,
    SuspendInterception,
    Phase1Inject,
    ReinstallInterception,
    Phase2Inject,
    ResumeInterception,
}

/// What happens to interception when a cycle fails part-way
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecoveryPolicy {
    /// Leave interception as it was at the failure point
    #[default]
    Leave,
    /// Reinstall and re-enable the interceptor and reconnect the mediator
    Restore,
}

/// External components a paste cycle drives
#[derive(Clone)]
pub struct PasteCollaborators {
    pub key_state: Arc<dyn KeyStateSource>,
    pub key_sender: Arc<dyn KeySender>,
    pub interceptor: Arc<dyn HotkeyInterceptor>,
    pub mediator: Arc<dyn InteractionMediator>,
    pub window: Arc<dyn WindowHandleSource>,
    pub suspension: HookSuspension,
}

/// Simulates the paste shortcut around a suspended hotkey interceptor.
///
/// Not reentrant and holds no lock: callers serialize paste requests and any
/// other code that toggles the interceptor or the hook suspension flag.
pub struct PasteOrchestrator {
    collaborators: PasteCollaborators,
    gesture: PasteGesture,
    recovery: RecoveryPolicy,
    logger: Logger,
}

impl PasteOrchestrator {
    pub fn new(collaborators: PasteCollaborators, logger: Logger) -> Self {
        Self {
            collaborators,
            gesture: PasteGesture::default(),
            recovery: RecoveryPolicy::default(),
            logger,
        }
    }

    /// Use the keys and recovery policy from configuration
    pub fn with_settings(mut self, settings: &PasteSettings) -> Self {
        self.gesture = PasteGesture::new(settings.modifier_key, settings.letter_key);
        self.recovery = settings.recovery;
        self
    }

    pub fn gesture(&self) -> PasteGesture {
        self.gesture
    }

    pub fn recovery(&self) -> RecoveryPolicy {
        self.recovery
    }

    /// Run one full paste cycle.
    pub async fn perform_paste(&self) -> Result<()> {
        let captured = self.gesture.capture(self.collaborators.key_state.as_ref());

        self.simulate_paste(captured).await?;

        self.logger.info("Paste simulated.");
        Ok(())
    }

    async fn simulate_paste(&self, captured: CapturedKeys) -> Result<()> {
        self.logger.info(format!(
            "Simulating paste with {} {} and {} {}.",
            self.gesture.modifier,
            describe(captured.modifier_down),
            self.gesture.letter,
            describe(captured.letter_down),
        ));

        let mut cycle = CycleGuard::new(self);

        cycle.enter(PasteStage::SuspendInterception);
        self.disable_interceptor();
        self.uninstall_interceptor()?;
        self.collaborators.mediator.disconnect();

        cycle.enter(PasteStage::Phase1Inject);
        self.run_first_phase(captured).await?;

        cycle.enter(PasteStage::ReinstallInterception);
        self.install_interceptor()?;

        cycle.enter(PasteStage::Phase2Inject);
        self.run_second_phase(captured).await?;

        cycle.enter(PasteStage::ResumeInterception);
        self.enable_interceptor();
        self.collaborators.mediator.connect();
        cycle.finish();

        self.logger.verbose("Paste hotkey interceptor has been re-enabled.");
        Ok(())
    }

    async fn run_first_phase(&self, captured: CapturedKeys) -> Result<()> {
        let operations = self.gesture.first_phase(captured);
        self.collaborators.key_sender.send_keys(&operations).await
    }

    async fn run_second_phase(&self, captured: CapturedKeys) -> Result<()> {
        if !captured.any_down() {
            return Ok(());
        }

        let operations = self.gesture.second_phase(captured);
        self.collaborators.key_sender.send_keys(&operations).await
    }

    fn enable_interceptor(&self) {
        self.collaborators.interceptor.set_enabled(true);
        self.logger.info("Enabled paste hotkey interceptor.");
    }

    fn disable_interceptor(&self) {
        self.collaborators.interceptor.set_enabled(false);
        self.logger.info("Disabled paste hotkey interceptor.");
    }

    fn install_interceptor(&self) -> Result<()> {
        self.collaborators
            .interceptor
            .install(self.collaborators.window.handle())?;
        self.collaborators.suspension.set_should_ignore_hook(false);

        self.logger.info("Installed paste hotkey interceptor.");
        Ok(())
    }

    fn uninstall_interceptor(&self) -> Result<()> {
        self.collaborators.interceptor.uninstall()?;
        self.collaborators.suspension.set_should_ignore_hook(true);

        self.logger.info("Uninstalled paste hotkey interceptor.");
        Ok(())
    }

    /// Bring interception back after a cycle stopped at `stage`.
    ///
    /// If the hook cannot be reinstalled the interceptor stays disabled, but
    /// the suspension flag is still cleared and the mediator reconnected.
    fn restore_after_failure(&self, stage: PasteStage) {
        self.logger
            .error(format!("Paste cycle failed during {stage:?}; restoring hotkey interception."));

        let mut hook_installed = true;
        if stage <= PasteStage::ReinstallInterception {
            if let Err(err) = self.install_interceptor() {
                hook_installed = false;
                self.collaborators.suspension.set_should_ignore_hook(false);
                self.logger.error(format!(
                    "Could not reinstall paste hotkey interceptor: {err}; leaving it disabled."
                ));
            }
        }
        if hook_installed {
            self.enable_interceptor();
        }
        if stage >= PasteStage::Phase1Inject {
            self.collaborators.mediator.connect();
        }
    }
}

/// State a failed cycle leaves behind under [`RecoveryPolicy::Leave`]
fn left_behind(stage: PasteStage) -> &'static str {
    match stage {
        PasteStage::Idle | PasteStage::CaptureState => "hotkey interception untouched",
        PasteStage::SuspendInterception => "interceptor disabled, hook still installed",
        PasteStage::Phase1Inject | PasteStage::ReinstallInterception => "hotkey interception left suspended",
        PasteStage::Phase2Inject => "hook reinstalled, interceptor still disabled",
        PasteStage::ResumeInterception => "interceptor enabled, mediator may be disconnected",
    }
}

fn describe(down: bool) -> &'static str {
    if down { "down" } else { "released" }
}

/// Tracks how far a cycle got. Dropped before `finish` means the cycle failed
/// or its future was abandoned.
struct CycleGuard<'a> {
    orchestrator: &'a PasteOrchestrator,
    stage: PasteStage,
    finished: bool,
}

impl<'a> CycleGuard<'a> {
    fn new(orchestrator: &'a PasteOrchestrator) -> Self {
        Self {
            orchestrator,
            stage: PasteStage::CaptureState,
            finished: false,
        }
    }

    fn enter(&mut self, stage: PasteStage) {
        self.stage = stage;
    }

    fn finish(&mut self) {
        self.finished = true;
    }
}

impl Drop for CycleGuard<'_> {
    fn drop(&mut self) {
        if self.finished || self.stage < PasteStage::SuspendInterception {
            return;
        }
        match self.orchestrator.recovery {
            RecoveryPolicy::Leave => self.orchestrator.logger.error(format!(
                "Paste cycle failed during {:?}; {}.",
                self.stage,
                left_behind(self.stage)
            )),
            RecoveryPolicy::Restore => self.orchestrator.restore_after_failure(self.stage),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClipshiftError;
    use crate::logging::MemorySink;
    use crate::paste::keys::{Key, KeyOperation};
    use crate::paste::recording::{PasteEvent, RecordingRig};

    fn build(rig: &RecordingRig) -> (Arc<MemorySink>, PasteOrchestrator) {
        let sink = Arc::new(MemorySink::new());
        let orchestrator = PasteOrchestrator::new(rig.collaborators(), Logger::new(sink.clone()));
        (sink, orchestrator)
    }

    #[tokio::test]
    async fn test_cycle_with_both_keys_released() {
        let rig = RecordingRig::new(&[]);
        let (_sink, orchestrator) = build(&rig);

        orchestrator.perform_paste().await.unwrap();

        assert_eq!(
            rig.timeline.events(),
            vec![
                PasteEvent::InterceptorEnabled(false),
                PasteEvent::HookUninstalled,
                PasteEvent::MediatorDisconnected,
                PasteEvent::KeysSent {
                    operations: vec![
                        KeyOperation::down(Key::LeftCtrl),
                        KeyOperation::down(Key::V),
                        KeyOperation::up(Key::V),
                    ],
                    hook_ignored: true,
                },
                PasteEvent::HookInstalled(rig.window),
                PasteEvent::InterceptorEnabled(true),
                PasteEvent::MediatorConnected,
            ]
        );
        assert!(!rig.suspension.should_ignore_hook());
        assert!(rig.interceptor.is_enabled());
        assert!(rig.interceptor.is_installed());
    }

    #[tokio::test]
    async fn test_cycle_with_modifier_held_restores_it() {
        let rig = RecordingRig::new(&[Key::LeftCtrl]);
        let (_sink, orchestrator) = build(&rig);

        orchestrator.perform_paste().await.unwrap();

        assert_eq!(
            rig.timeline.sent_batches(),
            vec![
                vec![KeyOperation::down(Key::V), KeyOperation::up(Key::V)],
                vec![KeyOperation::down(Key::LeftCtrl)],
            ]
        );
        let events = rig.timeline.events();
        assert_eq!(
            events[events.len() - 3..],
            [
                PasteEvent::KeysSent {
                    operations: vec![KeyOperation::down(Key::LeftCtrl)],
                    hook_ignored: false,
                },
                PasteEvent::InterceptorEnabled(true),
                PasteEvent::MediatorConnected,
            ]
        );
    }

    #[tokio::test]
    async fn test_custom_gesture_from_settings() {
        let rig = RecordingRig::new(&[Key::Insert]);
        let settings = PasteSettings {
            modifier_key: Key::LeftShift,
            letter_key: Key::Insert,
            recovery: RecoveryPolicy::Leave,
        };
        let (_sink, orchestrator) = build(&rig);
        let orchestrator = orchestrator.with_settings(&settings);
        assert_eq!(orchestrator.gesture(), PasteGesture::new(Key::LeftShift, Key::Insert));
        assert_eq!(orchestrator.recovery(), RecoveryPolicy::Leave);

        orchestrator.perform_paste().await.unwrap();

        assert_eq!(
            rig.timeline.sent_batches(),
            vec![
                vec![
                    KeyOperation::down(Key::LeftShift),
                    KeyOperation::down(Key::Insert),
                    KeyOperation::up(Key::Insert),
                ],
                vec![KeyOperation::down(Key::Insert)],
            ]
        );
    }

    #[tokio::test]
    async fn test_logs_describe_cycle() {
        let rig = RecordingRig::new(&[Key::V]);
        let (sink, orchestrator) = build(&rig);

        orchestrator.perform_paste().await.unwrap();

        assert_eq!(
            sink.lines(),
            vec![
                "Information: Simulating paste with LeftCtrl released and V down.".to_string(),
                "Information: Disabled paste hotkey interceptor.".to_string(),
                "Information: Uninstalled paste hotkey interceptor.".to_string(),
                "Information: Installed paste hotkey interceptor.".to_string(),
                "Information: Enabled paste hotkey interceptor.".to_string(),
                "Verbose: Paste hotkey interceptor has been re-enabled.".to_string(),
                "Information: Paste simulated.".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_phase_one_failure_leaves_interception_suspended() {
        let rig = RecordingRig::new(&[]);
        rig.keyboard.fail_next_sends(1);
        let (sink, orchestrator) = build(&rig);

        let err = orchestrator.perform_paste().await.unwrap_err();

        assert!(matches!(err, ClipshiftError::KeySend(_)));
        assert!(!rig.interceptor.is_enabled());
        assert!(!rig.interceptor.is_installed());
        assert!(rig.suspension.should_ignore_hook());
        assert_eq!(rig.mediator.disconnects(), 1);
        assert_eq!(rig.mediator.connects(), 0);
        assert!(sink.contains("left suspended"));
        assert!(!sink.contains("Paste simulated."));
    }

    #[tokio::test]
    async fn test_phase_one_failure_restored_when_configured() {
        let rig = RecordingRig::new(&[]);
        rig.keyboard.fail_next_sends(1);
        let (_sink, orchestrator) = build(&rig);
        let orchestrator = orchestrator.with_settings(&PasteSettings {
            recovery: RecoveryPolicy::Restore,
            ..Default::default()
        });

        let err = orchestrator.perform_paste().await.unwrap_err();

        assert!(matches!(err, ClipshiftError::KeySend(_)));
        assert!(rig.interceptor.is_enabled());
        assert!(rig.interceptor.is_installed());
        assert!(!rig.suspension.should_ignore_hook());
        assert_eq!(rig.mediator.disconnects(), 1);
        assert_eq!(rig.mediator.connects(), 1);
    }

    #[tokio::test]
    async fn test_phase_two_failure_restore_skips_reinstall() {
        let rig = RecordingRig::new(&[Key::LeftCtrl]);
        let (_sink, orchestrator) = build(&rig);
        let orchestrator = orchestrator.with_settings(&PasteSettings {
            recovery: RecoveryPolicy::Restore,
            ..Default::default()
        });
        rig.keyboard.fail_sends_after(1);

        assert!(orchestrator.perform_paste().await.is_err());

        let installs = rig
            .timeline
            .events()
            .into_iter()
            .filter(|event| matches!(event, PasteEvent::HookInstalled(_)))
            .count();
        assert_eq!(installs, 1);
        assert!(rig.interceptor.is_enabled());
        assert_eq!(rig.mediator.connects(), 1);
    }

    #[tokio::test]
    async fn test_uninstall_failure_propagates_before_disconnect() {
        let rig = RecordingRig::new(&[]);
        rig.interceptor.fail_uninstall(true);
        let (sink, orchestrator) = build(&rig);

        let err = orchestrator.perform_paste().await.unwrap_err();

        assert!(matches!(err, ClipshiftError::Hook(_)));
        assert_eq!(rig.timeline.events(), vec![PasteEvent::InterceptorEnabled(false)]);
        assert_eq!(rig.mediator.disconnects(), 0);
        assert!(rig.timeline.sent_batches().is_empty());
        assert!(rig.interceptor.is_installed());
        assert!(!rig.suspension.should_ignore_hook());
        assert!(sink.contains("SuspendInterception; interceptor disabled, hook still installed."));
        assert!(!sink.contains("left suspended"));
    }

    #[tokio::test]
    async fn test_phase_two_failure_log_names_disabled_interceptor() {
        let rig = RecordingRig::new(&[Key::V]);
        rig.keyboard.fail_sends_after(1);
        let (sink, orchestrator) = build(&rig);

        assert!(orchestrator.perform_paste().await.is_err());

        assert!(rig.interceptor.is_installed());
        assert!(!rig.interceptor.is_enabled());
        assert!(sink.contains("Phase2Inject; hook reinstalled, interceptor still disabled."));
    }

    #[tokio::test]
    async fn test_reinstall_failure_restore_keeps_interceptor_disabled() {
        let rig = RecordingRig::new(&[]);
        rig.interceptor.fail_install(true);
        let (sink, orchestrator) = build(&rig);
        let orchestrator = orchestrator.with_settings(&PasteSettings {
            recovery: RecoveryPolicy::Restore,
            ..Default::default()
        });

        let err = orchestrator.perform_paste().await.unwrap_err();

        assert!(matches!(err, ClipshiftError::Hook(_)));
        assert!(!rig.interceptor.is_installed());
        assert!(!rig.interceptor.is_enabled());
        assert!(!rig.suspension.should_ignore_hook());
        assert_eq!(rig.mediator.disconnects(), 1);
        assert_eq!(rig.mediator.connects(), 1);
        assert!(sink.contains("Could not reinstall paste hotkey interceptor"));
        assert!(sink.contains("leaving it disabled."));
        assert!(!rig.timeline.events().contains(&PasteEvent::InterceptorEnabled(true)));
    }
}
