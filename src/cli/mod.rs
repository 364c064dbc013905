//! Command-line interface for studio-forge.
//!
//! Provides commands for running studio agents and polling job status.

mod commands;

pub use commands::{parse_cli, run, run_with_cli, Cli, Commands, GenerateOutput};
