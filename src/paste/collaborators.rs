//! Interfaces the paste orchestrator drives.
//!
//! The keyboard hook, the OS injection primitive and the UI mediator live
//! outside this crate; these traits are the seams they plug into.

use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::Result;

use super::keys::{Key, KeyOperation};

/// Synchronous, side-effect-free view of the physical keyboard
pub trait KeyStateSource: Send + Sync {
    fn is_key_down(&self, key: Key) -> bool;
}

/// Injects synthetic key events
#[async_trait]
pub trait KeySender: Send + Sync {
    /// Deliver `operations` to the OS in order. Fails if any injection fails.
    async fn send_keys(&self, operations: &[KeyOperation]) -> Result<()>;
}

/// Native window handle the hook is installed against
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct WindowHandle(pub isize);

/// Supplies the main window handle at the time of a paste
pub trait WindowHandleSource: Send + Sync {
    fn handle(&self) -> WindowHandle;
}

/// The global hotkey interceptor.
///
/// `install` and `uninstall` must tolerate redundant calls.
pub trait HotkeyInterceptor: Send + Sync {
    fn is_enabled(&self) -> bool;
    fn set_enabled(&self, enabled: bool);
    fn install(&self, handle: WindowHandle) -> Result<()>;
    fn uninstall(&self) -> Result<()>;
}

/// Bridge between clipboard events and the UI
pub trait InteractionMediator: Send + Sync {
    fn connect(&self);
    fn disconnect(&self);
}

/// "Ignore hook" flag read by the low-level hook host.
///
/// While set, the hook host lets every key event through untouched. Clones
/// share the flag. Writers must be serialized by the caller: a paste cycle
/// assumes it is the only code toggling this flag while it runs.
#[derive(Debug, Clone, Default)]
pub struct HookSuspension {
    ignoring: Arc<AtomicBool>,
}

impl HookSuspension {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_should_ignore_hook(&self, ignore: bool) {
        self.ignoring.store(ignore, Ordering::SeqCst);
    }

    pub fn should_ignore_hook(&self) -> bool {
        self.ignoring.load(Ordering::SeqCst)
    }
}
