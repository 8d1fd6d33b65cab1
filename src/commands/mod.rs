//! Command-line interface.
//!
//! | Command | Purpose |
//! |---------|---------|
//! | `init` | Configuration wizard |
//! | `clock-in` / `clock-out` | Open or close the work session |
//! | `watch` | Run idle detection for the open work session |
//! | `status` | Open work session, open break and idle settings |
//! | `settings` | Show or change the idle settings |
//! | `break start` / `break end` | Manual breaks |
//! | `breaks` | Break sessions of a day |

pub mod breaks;
pub mod clock;
pub mod init;
pub mod manual_break;
pub mod settings;
pub mod status;
pub mod watch;

use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Debug, Subcommand)]
enum Commands {
    #[command(about = "Configuration initialization")]
    Init(init::InitArgs),
    #[command(about = "Open a work session")]
    ClockIn,
    #[command(about = "Close the open work session")]
    ClockOut,
    #[command(about = "Detect inactivity and record idle breaks")]
    Watch(watch::WatchArgs),
    #[command(about = "Show the current session, break and idle settings")]
    Status,
    #[command(about = "Show or update idle settings")]
    Settings(settings::SettingsArgs),
    #[command(name = "break", about = "Start or end a manual break")]
    Break(manual_break::BreakArgs),
    #[command(about = "Display breaks for a given date")]
    Breaks(breaks::BreaksArgs),
}

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
#[command(arg_required_else_help(true))]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    pub async fn menu() -> Result<()> {
        let cli = Self::parse();
        match cli.command {
            Commands::Init(args) => init::cmd(args),
            Commands::ClockIn => clock::clock_in().await,
            Commands::ClockOut => clock::clock_out().await,
            Commands::Watch(args) => watch::cmd(args).await,
            Commands::Status => status::cmd().await,
            Commands::Settings(args) => settings::cmd(args).await,
            Commands::Break(args) => manual_break::cmd(args).await,
            Commands::Breaks(args) => breaks::cmd(args).await,
        }
    }
}
