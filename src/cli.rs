use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "alarm-relay",
    version,
    about = "Relays alarm events into Slack summaries of nearby ERROR log entries",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Configuration file path (defaults to $ALARM_RELAY_CONFIG, then built-in defaults)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Serve alarm events from the Lambda runtime (default)
    Serve,

    /// Run the pipeline once for an alarm time and print the response
    Invoke {
        /// Alarm time, e.g. 2024-01-01T12:00:00.000000+00:00
        #[arg(short, long)]
        time: String,
    },

    /// Validate the configuration and show the resolved settings
    Check,
}
