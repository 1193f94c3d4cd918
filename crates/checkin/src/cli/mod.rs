//! Command-line interface for checkin.
//!
//! This module provides the CLI structure for the `checkin` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    ConfigCommand, LinksCommand, OutputFormat, RegisterCommand, RegistrationsCommand, RouteCommand,
};

/// checkin - Event attendance registration
///
/// Attendees review the event documents, fill in their contact details and
/// sign; administrators manage the document links and export the attendance
/// report.
#[derive(Debug, Parser)]
#[command(name = "checkin")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage document links
    #[command(subcommand)]
    Links(LinksCommand),

    /// Inspect, export or clear registrations
    #[command(subcommand)]
    Registrations(RegistrationsCommand),

    /// Register an attendee
    Register(RegisterCommand),

    /// Show which view an address opens
    Route(RouteCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> crate::logging::Verbosity {
        if self.quiet {
            crate::logging::Verbosity::Quiet
        } else {
            match self.verbose {
                0 => crate::logging::Verbosity::Normal,
                1 => crate::logging::Verbosity::Verbose,
                _ => crate::logging::Verbosity::Trace,
            }
        }
    }
}
