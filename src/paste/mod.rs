//! Paste simulation - injects the paste shortcut while the hotkey
//! interceptor that listens for it is suspended.
//!
//! - keys: key operations and the two injection phases
//! - collaborators: traits for the hook, key injection and UI mediator
//! - orchestrator: the paste cycle itself
//! - recording: in-memory collaborators for dry runs and tests

mod collaborators;
mod keys;
mod orchestrator;
pub mod recording;

pub use collaborators::{
    HookSuspension, HotkeyInterceptor, InteractionMediator, KeySender, KeyStateSource, WindowHandle,
    WindowHandleSource,
};
pub use keys::{CapturedKeys, Key, KeyDirection, KeyOperation, PasteGesture};
pub use orchestrator::{PasteCollaborators, PasteOrchestrator, PasteStage, RecoveryPolicy};
