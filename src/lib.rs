//! clipshift - resilient execution core of a clipboard-history manager
//!
//! Provides continuously running loops with bounded retry, and a paste
//! orchestrator that simulates the paste shortcut while the global hotkey
//! interceptor is suspended.

pub mod config;
pub mod error;
pub mod logging;
pub mod paste;
pub mod runner;
pub mod simulation;

pub use error::{ClipshiftError, Result};
