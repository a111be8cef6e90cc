//! The nag state machine behind the status menu.
//!
//! Front ends (the terminal panel or the headless runner) call `tick` every
//! second and `reload` every few minutes from a single task; nothing here is
//! ever entered concurrently.

pub mod menu;
pub mod runner;

use chrono::{DateTime, Local, Utc};

use crate::core::nag::{self, format_elapsed};
use crate::core::session::truncate_to_second;
use crate::core::{Config, FeedKind, NagState, PauseChange, PauseKind, Priority, Session};
use crate::feed::{FeedError, SessionSource};
use crate::notify::{Growler, Transport};
use crate::utils::LogControl;

pub use menu::{Menu, MenuEntry, MenuItem};

pub const ISSUES_LINK: &str = "https://github.com/kfdm/hatarake/issues";
/// Stand-in session shown when the calendar cannot be reached
pub const ERROR_SESSION_NAME: &str = "Error loading calendar";
pub const RELOAD_INTERVAL: std::time::Duration = std::time::Duration::from_secs(300);

pub struct App<S, T> {
    config: Config,
    source: S,
    notifier: Growler<T>,
    state: NagState,
    menu: Menu,
    title: String,
    debug: bool,
    log_control: LogControl,
}

impl<S: SessionSource, T: Transport> App<S, T> {
    pub fn new(
        config: Config,
        source: S,
        notifier: Growler<T>,
        log_control: LogControl,
        now: DateTime<Utc>,
    ) -> Self {
        let state = NagState::new(config.nag_interval, now);
        let menu = Menu::new(config.development);
        App {
            config,
            source,
            notifier,
            state,
            menu,
            title: "Hatarake".to_string(),
            debug: false,
            log_control,
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn menu(&self) -> &Menu {
        &self.menu
    }

    pub fn state(&self) -> &NagState {
        &self.state
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn notifier(&self) -> &Growler<T> {
        &self.notifier
    }

    pub fn is_debug(&self) -> bool {
        self.debug
    }

    /// One clock tick: refresh labels and nag if this second calls for it.
    /// Returns the priority of the nag sent, if any.
    pub async fn tick(&mut self, now: DateTime<Utc>) -> Option<Priority> {
        let Some(session) = self.state.last_session.clone() else {
            tracing::warn!("No session loaded yet");
            return None;
        };
        let now = truncate_to_second(now);
        let elapsed = session.elapsed(now);
        tracing::debug!("Pomodoro {} {}, {}", self.title, session.end, now);

        let mut fired = None;
        if !self.state.pause.is_paused(now) {
            if let Some(priority) = nag::decide(elapsed, self.state.delay) {
                self.notifier.nag(&session.name, elapsed).await;
                fired = Some(priority);
            }
        }

        self.refresh_labels(&session, now);
        fired
    }

    /// Update the title and menu labels without sending anything
    pub fn refresh(&mut self, now: DateTime<Utc>) {
        if let Some(session) = self.state.last_session.clone() {
            self.refresh_labels(&session, truncate_to_second(now));
        }
    }

    fn refresh_labels(&mut self, session: &Session, now: DateTime<Utc>) {
        let elapsed = session.elapsed(now);
        self.menu.set_title(
            MenuItem::Reload,
            format!(
                "⏰Last pomodoro [{}] was {} ago",
                session.name,
                format_elapsed(elapsed)
            ),
        );
        self.title = nag::title_label(elapsed);

        let remaining = nag::remaining_today(&now.with_timezone(&Local));
        self.menu.set_title(
            MenuItem::Remaining,
            format!("⌛️Time Remaining today: {}", format_elapsed(remaining)),
        );
    }

    fn apply_config(&mut self, config: Config) {
        if let Err(e) = self.source.reconfigure(&config) {
            tracing::error!("Keeping previous feed, new config rejected: {}", e);
            return;
        }
        self.menu.set_development(config.development);
        if !config.development && self.debug {
            self.set_debug(false);
        }
        if !self.debug {
            self.state.delay = config.nag_interval;
        }
        self.config = config;
    }

    /// Re-read the config file, then fetch the latest session
    pub async fn reload(&mut self, now: DateTime<Utc>) -> Result<(), FeedError> {
        match self.config.reload() {
            Ok(config) => self.apply_config(config),
            Err(e) => tracing::warn!("Config reload failed, keeping previous: {}", e),
        }

        match self.source.fetch().await {
            Ok(session) => {
                self.state.replace_session(session);
                Ok(())
            }
            Err(e) => {
                if e.is_fetch() && matches!(self.config.feed, FeedKind::Calendar { .. }) {
                    self.state.replace_session(Session::new(
                        ERROR_SESSION_NAME,
                        truncate_to_second(now),
                    ));
                }
                tracing::error!("Reload failed: {}", e);
                Err(e)
            }
        }
    }

    fn set_debug(&mut self, debug: bool) {
        self.debug = debug;
        self.state.delay = if debug {
            self.config.debug_interval
        } else {
            self.config.nag_interval
        };
        self.menu.set_checked(MenuItem::Debug, debug);
        self.log_control.set_verbose(debug);
        let mode = if debug { "on" } else { "off" };
        tracing::info!("Debug {} with nag delay {:?}", mode, self.state.delay);
    }

    /// Flip the debug toggle; only available in development mode
    pub fn toggle_debug(&mut self) -> bool {
        if !self.config.development {
            return false;
        }
        self.set_debug(!self.debug);
        self.debug
    }

    pub fn open_issues(&self) -> anyhow::Result<()> {
        if !self.config.development {
            return Ok(());
        }
        open::that(ISSUES_LINK)?;
        Ok(())
    }

    pub async fn toggle_pause(&mut self, kind: PauseKind, now: DateTime<Utc>) -> PauseChange {
        let change = self.state.pause.toggle(kind, now);
        self.menu.set_checked(
            MenuItem::Pause15m,
            self.state.pause.is_checked(PauseKind::FifteenMinutes),
        );
        self.menu.set_checked(
            MenuItem::Pause1h,
            self.state.pause.is_checked(PauseKind::OneHour),
        );

        match change {
            PauseChange::Paused { until } => {
                let until = until.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S%:z");
                self.notifier
                    .info("Pause", &format!("Pausing alerts until {}", until))
                    .await;
            }
            PauseChange::Resumed => self.notifier.info("Pause", "Unpaused Alerts").await,
        }
        change
    }

    /// Dispatch a menu selection
    pub async fn activate(&mut self, item: MenuItem, now: DateTime<Utc>) -> anyhow::Result<()> {
        match item {
            MenuItem::Reload => {
                // failure is already logged and the old session stays up
                let _ = self.reload(now).await;
                self.refresh(now);
            }
            MenuItem::Debug => {
                self.toggle_debug();
            }
            MenuItem::Issues => self.open_issues()?,
            MenuItem::Pause15m => {
                self.toggle_pause(PauseKind::FifteenMinutes, now).await;
            }
            MenuItem::Pause1h => {
                self.toggle_pause(PauseKind::OneHour, now).await;
            }
            MenuItem::Remaining | MenuItem::Pause => {}
        }
        Ok(())
    }
}
