//! CLI command definitions using clap.
//!
//! Defines the main CLI structure and subcommands:
//! - simulate: run one paste cycle against recording collaborators
//! - config: print the effective configuration

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// clipshift - hotkey-safe paste simulation with retrying background loops
#[derive(Parser, Debug)]
#[command(name = "clipshift")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Optional config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Check if verbose mode is enabled
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

/// Main subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Dry-run one paste cycle and print what the keyboard hook would see
    Simulate {
        /// Pretend the modifier key is held when the cycle starts
        #[arg(long)]
        modifier_down: bool,

        /// Pretend the letter key is held when the cycle starts
        #[arg(long)]
        letter_down: bool,

        /// Make this many key-send batches fail before injection succeeds
        #[arg(long, default_value_t = 0)]
        fail_sends: u32,

        /// Restore interception when a cycle fails, overriding config
        #[arg(long)]
        restore: bool,
    },

    /// Print the effective configuration as YAML
    Config,
}
