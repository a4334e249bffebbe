//! CLI argument parsing using clap.

use clap::{
    Parser, Subcommand,
    builder::styling::{AnsiColor, Effects, Styles},
};
use std::path::PathBuf;

fn clap_cargo_style() -> Styles {
    Styles::styled()
        .header(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::Green.on_default())
}

/// Directory views with live refresh
#[derive(Parser, Debug)]
#[command(
    name = "dirpane",
    version = env!("CARGO_PKG_VERSION"),
    about = "Directory views with live refresh",
    long_about = "Open directory views that stay current as files come and go.",
    next_line_help = true,
    styles = clap_cargo_style()
)]
pub struct Cli {
    /// Path to custom settings.toml file
    #[arg(short, long, global = true, env = "DIRPANE_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write a default settings file
    #[command(about = "Create settings.toml with default configuration")]
    Init {
        /// Force overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Show current configuration settings
    #[command(about = "Display active settings")]
    Config,

    /// List one directory, folders first
    #[command(
        about = "List a directory the way a view shows it",
        after_help = "Examples:\n  dirpane list .\n  dirpane list ~/Downloads"
    )]
    List {
        /// Directory to list
        #[arg(value_name = "DIR")]
        directory: PathBuf,
    },

    /// Open views and report refreshes until interrupted
    #[command(
        about = "Watch directories and print every refresh",
        after_help = "Examples:\n  dirpane watch\n  dirpane watch ~/Downloads /tmp\n  dirpane watch . --no-watch\n\nWithout DIR arguments the views saved in settings.toml are opened."
    )]
    Watch {
        /// Directories to open, one view each
        #[arg(value_name = "DIR")]
        directories: Vec<PathBuf>,

        /// Load the views but do not follow changes
        #[arg(long)]
        no_watch: bool,
    },
}
