use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "hatarake")]
#[command(about = "Nags you when your last pomodoro was too long ago", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Config file (defaults to the platform config directory)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
    /// Also append logs to this file
    #[arg(long, global = true)]
    pub logfile: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Watch the feed and nag until interrupted
    Run {
        /// Skip the status panel and only log and notify
        #[arg(long)]
        headless: bool,
    },
    /// Fetch the feed once and print the last pomodoro
    Status,
    /// Send a single Info notification to check the growl connection
    Notify {
        title: String,
        #[arg(default_value = "")]
        message: String,
    },
    /// Print the resolved config
    Config,
}

impl Commands {
    /// Whether this command takes over the terminal
    pub fn uses_panel(&self) -> bool {
        matches!(self, Commands::Run { headless: false })
    }
}
