use clap::Parser;

use hatarake::cli::{handlers, Cli, Commands};
use hatarake::utils::{logging, TuiWriter};
use hatarake::{Config, Result};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // The status panel owns the terminal, so its logs go through a channel
    let (tui_writer, log_rx) = if cli.command.uses_panel() {
        let (writer, rx) = TuiWriter::new();
        (Some(writer), Some(rx))
    } else {
        (None, None)
    };
    let log_control = logging::init(tui_writer, cli.logfile.as_deref())?;

    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Run { headless } => handlers::run(config, headless, log_control, log_rx).await,
        Commands::Status => handlers::status(config).await,
        Commands::Notify { title, message } => handlers::notify(config, title, message).await,
        Commands::Config => handlers::show_config(cli.config.as_deref(), &config),
    }
}
