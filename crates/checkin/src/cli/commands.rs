//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};

/// Document link commands.
#[derive(Debug, Subcommand)]
pub enum LinksCommand {
    /// Add document links
    ///
    /// Only `http://` and `https://` links are kept; duplicates are ignored.
    Add {
        /// Links to add
        links: Vec<String>,

        /// Read additional links from a file, one per line
        #[arg(short, long, value_name = "PATH")]
        file: Option<PathBuf>,
    },

    /// List document links with their positions
    List,

    /// Remove the link at a position (as shown by `links list`)
    Remove {
        /// 0-based position
        position: usize,
    },

    /// Remove every document link
    Clear,

    /// Print the address to send attendees
    Share,
}

/// Registration commands.
#[derive(Debug, Subcommand)]
pub enum RegistrationsCommand {
    /// Print how many attendees are registered
    Count,

    /// List registrations
    List {
        /// Output format
        #[arg(short, long, value_enum, default_value = "plain")]
        format: OutputFormat,
    },

    /// Write the registration report as PDF
    Export {
        /// Output file (defaults to the configured report file name)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },

    /// Delete every registration
    Clear {
        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

/// Register command arguments.
#[derive(Debug, Args)]
pub struct RegisterCommand {
    /// Attendee full name
    #[arg(long)]
    pub name: String,

    /// Company
    #[arg(long)]
    pub company: String,

    /// Document number (7 or 8 digits)
    #[arg(long)]
    pub dni: String,

    /// Mobile phone (8 to 15 digits)
    #[arg(long, default_value = "")]
    pub phone: String,

    /// Email address
    #[arg(long, default_value = "")]
    pub email: String,

    /// JSON file with the signature input events
    #[arg(long, value_name = "FILE")]
    pub signature: PathBuf,

    /// Shared address the attendee opened (its links replace the local ones)
    #[arg(long, value_name = "URL")]
    pub url: Option<String>,

    /// Don't wait for Enter after showing each document
    #[arg(short, long)]
    pub yes: bool,
}

/// Route command arguments.
#[derive(Debug, Args)]
pub struct RouteCommand {
    /// Address to resolve
    pub url: String,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

/// Output format for commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Plain text output
    #[default]
    Plain,
    /// Formatted table
    Table,
    /// JSON output
    Json,
}
