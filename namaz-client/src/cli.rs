use std::path::PathBuf;

use clap::{Parser, Subcommand};

const HELP_EPILOG: &str = r#"Config resolution order:
  1) --config/-c PATH
  2) $NAMAZ_CONFIG
  3) platform default, e.g. ~/.config/namaz-reminder/client.yaml
"#;

#[derive(Debug, Parser)]
#[command(
    name = "namaz-client",
    version,
    about = "Prayer countdown and reminder notifications",
    long_about = None,
    after_long_help = HELP_EPILOG,
)]
pub struct Cli {
    /// Path to YAML config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Optional subcommand. Without one, runs the countdown agent.
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the countdown, reminders and quotes until interrupted
    Run {
        /// Countdown length in minutes (overrides config)
        #[arg(long)]
        minutes: Option<u64>,
    },
    /// Schedule a prayer reminder and wait until it fires
    Remind {
        /// Minutes from now (overrides config; 0 sends immediately)
        #[arg(long = "in")]
        minutes: Option<u64>,
    },
    /// Send a prayer reminder right now
    Notify,
    /// Show the selected channel and permission state
    Status,
    /// Print the current hadith about prayer
    Quote,
    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}
