use chrono::Utc;
use tokio::time::{interval, Duration, MissedTickBehavior};

use super::{App, RELOAD_INTERVAL};
use crate::feed::SessionSource;
use crate::notify::Transport;

/// Drive the app without a UI until Ctrl+C
pub async fn run_headless<S: SessionSource, T: Transport>(mut app: App<S, T>) -> anyhow::Result<()> {
    let mut clock = interval(Duration::from_secs(1));
    clock.set_missed_tick_behavior(MissedTickBehavior::Skip);
    // first tick fires immediately, which doubles as the startup load
    let mut reload = interval(RELOAD_INTERVAL);
    reload.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    tracing::info!("Running headless against {} feed", app.config().feed.label());
    let mut last_title = String::new();

    loop {
        tokio::select! {
            biased;
            result = &mut shutdown => {
                result?;
                tracing::info!("Shutting down");
                return Ok(());
            }
            _ = reload.tick() => {
                // errors are logged inside; the next tick retries
                let _ = app.reload(Utc::now()).await;
            }
            _ = clock.tick() => {
                if let Some(priority) = app.tick(Utc::now()).await {
                    tracing::info!("Nagged at {:?} priority", priority);
                }
                if app.title() != last_title {
                    last_title = app.title().to_string();
                    tracing::debug!("{}", last_title);
                }
            }
        }
    }
}
