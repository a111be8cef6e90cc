use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::{
    filter::Directive, fmt, layer::SubscriberExt, reload, util::SubscriberInitExt, EnvFilter,
    Registry,
};

use super::tui_writer::TuiWriter;

/// Quiet by default, like the menu-bar app
pub const DEFAULT_DIRECTIVE: &str = "hatarake=warn";
pub const VERBOSE_DIRECTIVE: &str = "hatarake=info";

fn build_filter(directive: &str) -> EnvFilter {
    let filter = EnvFilter::from_default_env();
    match directive.parse::<Directive>() {
        Ok(directive) => filter.add_directive(directive),
        Err(_) => filter,
    }
}

/// Runtime switch for the crate's log level
#[derive(Clone, Default)]
pub struct LogControl {
    handle: Option<reload::Handle<EnvFilter, Registry>>,
}

impl LogControl {
    /// A control that does nothing, for when no subscriber was installed
    pub fn detached() -> Self {
        LogControl { handle: None }
    }

    pub fn set_verbose(&self, verbose: bool) {
        let Some(handle) = &self.handle else {
            return;
        };
        let directive = if verbose {
            VERBOSE_DIRECTIVE
        } else {
            DEFAULT_DIRECTIVE
        };
        if let Err(e) = handle.modify(|filter| *filter = build_filter(directive)) {
            tracing::warn!("Failed to change log level: {}", e);
        }
    }
}

/// Install the global subscriber.
///
/// With a `TuiWriter` log lines go to the status panel instead of stderr.
/// A logfile, when given, receives a copy of everything.
pub fn init(tui: Option<TuiWriter>, logfile: Option<&Path>) -> anyhow::Result<LogControl> {
    let (filter, handle) = reload::Layer::new(build_filter(DEFAULT_DIRECTIVE));

    let file_layer = match logfile {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)?;
            Some(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
        }
        None => None,
    };

    let (stderr_layer, tui_layer) = match tui {
        Some(writer) => (None, Some(fmt::layer().with_ansi(false).with_writer(writer))),
        None => (Some(fmt::layer().with_writer(std::io::stderr)), None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(tui_layer)
        .with(file_layer)
        .try_init()?;

    Ok(LogControl {
        handle: Some(handle),
    })
}
