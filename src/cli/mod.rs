//! CLI module for clipshift - command-line interface and subcommands.
//!
//! Provides a dry-run paste simulation and a view of the effective
//! configuration.

pub mod commands;

pub use commands::Cli;
