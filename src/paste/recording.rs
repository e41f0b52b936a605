//! In-memory collaborators that record what a paste cycle does.
//!
//! Every recorder appends to one shared [`Timeline`], so the ordering across
//! the interceptor, the mediator and the key sender can be inspected after a
//! cycle. Used by the `simulate` command and by tests.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::{ClipshiftError, Result};

use super::collaborators::{
    HookSuspension, HotkeyInterceptor, InteractionMediator, KeySender, KeyStateSource, WindowHandle,
    WindowHandleSource,
};
use super::keys::{Key, KeyOperation};
use super::orchestrator::PasteCollaborators;

fn locked<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PasteEvent {
    InterceptorEnabled(bool),
    HookUninstalled,
    HookInstalled(WindowHandle),
    MediatorDisconnected,
    MediatorConnected,
    KeysSent {
        operations: Vec<KeyOperation>,
        /// Hook suspension flag at the moment of sending
        hook_ignored: bool,
    },
}

/// Ordered log of events shared by all recorders
#[derive(Debug, Clone, Default)]
pub struct Timeline {
    events: Arc<Mutex<Vec<PasteEvent>>>,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, event: PasteEvent) {
        locked(&self.events).push(event);
    }

    pub fn events(&self) -> Vec<PasteEvent> {
        locked(&self.events).clone()
    }

    /// Operation batches handed to the key sender, in order
    pub fn sent_batches(&self) -> Vec<Vec<KeyOperation>> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                PasteEvent::KeysSent { operations, .. } => Some(operations),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        locked(&self.events).clear();
    }
}

#[derive(Debug, Default)]
struct SendPlan {
    succeed_first: u32,
    then_fail: u32,
}

/// Keyboard with a fixed set of held keys that records injected batches.
#[derive(Debug)]
pub struct RecordingKeyboard {
    timeline: Timeline,
    held: HashSet<Key>,
    suspension: Option<HookSuspension>,
    plan: Mutex<SendPlan>,
}

impl RecordingKeyboard {
    pub fn new(timeline: Timeline, held: &[Key]) -> Self {
        Self {
            timeline,
            held: held.iter().copied().collect(),
            suspension: None,
            plan: Mutex::new(SendPlan::default()),
        }
    }

    /// Record the hook suspension flag alongside each batch
    pub fn observing(mut self, suspension: HookSuspension) -> Self {
        self.suspension = Some(suspension);
        self
    }

    /// Make the next `count` sends fail
    pub fn fail_next_sends(&self, count: u32) {
        *locked(&self.plan) = SendPlan {
            succeed_first: 0,
            then_fail: count,
        };
    }

    /// Let `count` sends through, then fail every later one
    pub fn fail_sends_after(&self, count: u32) {
        *locked(&self.plan) = SendPlan {
            succeed_first: count,
            then_fail: u32::MAX,
        };
    }

    fn should_fail(&self) -> bool {
        let mut plan = locked(&self.plan);
        if plan.succeed_first > 0 {
            plan.succeed_first -= 1;
            return false;
        }
        if plan.then_fail > 0 {
            plan.then_fail -= 1;
            return true;
        }
        false
    }
}

impl KeyStateSource for RecordingKeyboard {
    fn is_key_down(&self, key: Key) -> bool {
        self.held.contains(&key)
    }
}

#[async_trait]
impl KeySender for RecordingKeyboard {
    async fn send_keys(&self, operations: &[KeyOperation]) -> Result<()> {
        if self.should_fail() {
            return Err(ClipshiftError::KeySend(format!(
                "injection of {} operations rejected",
                operations.len()
            )));
        }

        self.timeline.push(PasteEvent::KeysSent {
            operations: operations.to_vec(),
            hook_ignored: self
                .suspension
                .as_ref()
                .is_some_and(HookSuspension::should_ignore_hook),
        });
        Ok(())
    }
}

/// Interceptor that starts installed and enabled.
#[derive(Debug)]
pub struct RecordingInterceptor {
    timeline: Timeline,
    enabled: AtomicBool,
    installed: AtomicBool,
    fail_install: AtomicBool,
    fail_uninstall: AtomicBool,
}

impl RecordingInterceptor {
    pub fn new(timeline: Timeline) -> Self {
        Self {
            timeline,
            enabled: AtomicBool::new(true),
            installed: AtomicBool::new(true),
            fail_install: AtomicBool::new(false),
            fail_uninstall: AtomicBool::new(false),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    pub fn is_installed(&self) -> bool {
        self.installed.load(Ordering::SeqCst)
    }

    pub fn fail_install(&self, fail: bool) {
        self.fail_install.store(fail, Ordering::SeqCst);
    }

    pub fn fail_uninstall(&self, fail: bool) {
        self.fail_uninstall.store(fail, Ordering::SeqCst);
    }
}

impl HotkeyInterceptor for RecordingInterceptor {
    fn is_enabled(&self) -> bool {
        RecordingInterceptor::is_enabled(self)
    }

    fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
        self.timeline.push(PasteEvent::InterceptorEnabled(enabled));
    }

    fn install(&self, handle: WindowHandle) -> Result<()> {
        if self.fail_install.load(Ordering::SeqCst) {
            return Err(ClipshiftError::Hook(format!("could not install hook for window {}", handle.0)));
        }
        self.installed.store(true, Ordering::SeqCst);
        self.timeline.push(PasteEvent::HookInstalled(handle));
        Ok(())
    }

    fn uninstall(&self) -> Result<()> {
        if self.fail_uninstall.load(Ordering::SeqCst) {
            return Err(ClipshiftError::Hook("could not uninstall hook".to_string()));
        }
        self.installed.store(false, Ordering::SeqCst);
        self.timeline.push(PasteEvent::HookUninstalled);
        Ok(())
    }
}

/// Mediator that counts connects and disconnects
#[derive(Debug)]
pub struct RecordingMediator {
    timeline: Timeline,
    connects: AtomicU32,
    disconnects: AtomicU32,
}

impl RecordingMediator {
    pub fn new(timeline: Timeline) -> Self {
        Self {
            timeline,
            connects: AtomicU32::new(0),
            disconnects: AtomicU32::new(0),
        }
    }

    pub fn connects(&self) -> u32 {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn disconnects(&self) -> u32 {
        self.disconnects.load(Ordering::SeqCst)
    }
}

impl InteractionMediator for RecordingMediator {
    fn connect(&self) {
        self.connects.fetch_add(1, Ordering::SeqCst);
        self.timeline.push(PasteEvent::MediatorConnected);
    }

    fn disconnect(&self) {
        self.disconnects.fetch_add(1, Ordering::SeqCst);
        self.timeline.push(PasteEvent::MediatorDisconnected);
    }
}

/// Always reports the same window
#[derive(Debug, Clone, Copy)]
pub struct FixedWindowHandle(pub WindowHandle);

impl WindowHandleSource for FixedWindowHandle {
    fn handle(&self) -> WindowHandle {
        self.0
    }
}

/// A full set of recording collaborators sharing one timeline.
#[derive(Debug, Clone)]
pub struct RecordingRig {
    pub timeline: Timeline,
    pub keyboard: Arc<RecordingKeyboard>,
    pub interceptor: Arc<RecordingInterceptor>,
    pub mediator: Arc<RecordingMediator>,
    pub suspension: HookSuspension,
    pub window: WindowHandle,
}

impl RecordingRig {
    /// Build a rig whose keyboard reports `held` as pressed
    pub fn new(held: &[Key]) -> Self {
        let timeline = Timeline::new();
        let suspension = HookSuspension::new();
        Self {
            keyboard: Arc::new(RecordingKeyboard::new(timeline.clone(), held).observing(suspension.clone())),
            interceptor: Arc::new(RecordingInterceptor::new(timeline.clone())),
            mediator: Arc::new(RecordingMediator::new(timeline.clone())),
            window: WindowHandle(0x1001),
            suspension,
            timeline,
        }
    }

    pub fn collaborators(&self) -> PasteCollaborators {
        PasteCollaborators {
            key_state: self.keyboard.clone(),
            key_sender: self.keyboard.clone(),
            interceptor: self.interceptor.clone(),
            mediator: self.mediator.clone(),
            window: Arc::new(FixedWindowHandle(self.window)),
            suspension: self.suspension.clone(),
        }
    }
}
