use chrono::{Local, Utc};
use std::path::Path;
use tokio::sync::mpsc;

use crate::app::{runner, App};
use crate::core::nag::{format_elapsed, title_label};
use crate::feed::{Fetcher, SessionSource};
use crate::notify::{GntpTransport, Growler, Note, Transport};
use crate::tui::StatusTui;
use crate::utils::{LogControl, LogEntry};
use crate::{Config, Result};

pub async fn run(
    config: Config,
    headless: bool,
    log_control: LogControl,
    log_rx: Option<mpsc::UnboundedReceiver<LogEntry>>,
) -> Result<()> {
    tracing::info!("Starting with {} feed", config.feed.label());

    let fetcher = Fetcher::from_config(&config)?;
    let notifier = Growler::new(GntpTransport::new(&config.growl)).await;
    let app = App::new(config, fetcher, notifier, log_control, Utc::now());

    match log_rx {
        Some(log_rx) if !headless => {
            let mut tui = StatusTui::new()?;
            tui.run(app, log_rx).await
        }
        _ => runner::run_headless(app).await,
    }
}

pub async fn status(config: Config) -> Result<()> {
    let fetcher = Fetcher::from_config(&config)?;
    let session = fetcher.fetch().await?;
    let elapsed = session.elapsed(Utc::now());

    println!("Last pomodoro: {}", session.name);
    println!(
        "Ended:         {}",
        session.end.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S")
    );
    println!("Elapsed:       {}", format_elapsed(elapsed));
    println!("Status:        {}", title_label(elapsed));
    Ok(())
}

/// Unlike the nag loop, this surfaces transport errors
pub async fn notify(config: Config, title: String, message: String) -> Result<()> {
    let transport = GntpTransport::new(&config.growl);
    transport.register().await?;
    transport.notify(&Note::info(title, message)).await?;
    println!(
        "Sent to {}:{}",
        config.growl.host, config.growl.port
    );
    Ok(())
}

pub fn show_config(path: Option<&Path>, config: &Config) -> Result<()> {
    match path.or(config.source.as_deref()) {
        Some(path) => println!("# {}", path.display()),
        None => println!("# (no config file)"),
    }
    print!("{}", config.to_redacted_toml()?);
    Ok(())
}
