use anyhow::Result;
use chrono::Utc;
use crossterm::{
    event::{self, Event, EventStream, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures_util::StreamExt;
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame, Terminal,
};
use std::io;
use tokio::sync::mpsc;
use tokio::time::{interval, Duration, MissedTickBehavior};

use crate::app::{App, MenuItem, RELOAD_INTERVAL};
use crate::feed::SessionSource;
use crate::notify::Transport;
use crate::utils::tui_writer::{LogEntry, LogLevel};

const MAX_LOGS: usize = 50;

/// Terminal rendition of the menu-bar item and its dropdown
pub struct StatusTui {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
    status_message: String,
    system_logs: Vec<LogEntry>,
}

/// Snapshot of what the panel shows, taken before drawing
struct View {
    title: String,
    menu: Vec<(MenuItem, String, bool)>,
    paused_until: Option<String>,
    debug: bool,
}

impl View {
    fn capture<S: SessionSource, T: Transport>(app: &App<S, T>) -> Self {
        let now = Utc::now();
        let pause = &app.state().pause;
        View {
            title: app.title().to_string(),
            menu: app
                .menu()
                .iter()
                .map(|(item, entry)| (item, entry.title.clone(), entry.checked))
                .collect(),
            paused_until: pause.is_paused(now).then(|| {
                pause
                    .disabled_until()
                    .with_timezone(&chrono::Local)
                    .format("%H:%M:%S")
                    .to_string()
            }),
            debug: app.is_debug(),
        }
    }
}

impl StatusTui {
    pub fn new() -> Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;

        Ok(StatusTui {
            terminal,
            status_message: "Loading…".to_string(),
            system_logs: Vec::new(),
        })
    }

    pub async fn run<S: SessionSource, T: Transport>(
        &mut self,
        mut app: App<S, T>,
        mut log_rx: mpsc::UnboundedReceiver<LogEntry>,
    ) -> Result<()> {
        let result = self.event_loop(&mut app, &mut log_rx).await;
        self.cleanup();
        result
    }

    async fn event_loop<S: SessionSource, T: Transport>(
        &mut self,
        app: &mut App<S, T>,
        log_rx: &mut mpsc::UnboundedReceiver<LogEntry>,
    ) -> Result<()> {
        let mut clock = interval(Duration::from_secs(1));
        clock.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut reload = interval(RELOAD_INTERVAL);
        reload.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut event_stream = EventStream::new();

        loop {
            tokio::select! {
                biased;
                maybe_event = event_stream.next() => {
                    match maybe_event {
                        Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                            let ctrl_c = key.code == KeyCode::Char('c')
                                && key.modifiers.contains(event::KeyModifiers::CONTROL);
                            if ctrl_c || key.code == KeyCode::Char('q') {
                                tracing::info!("Quit requested");
                                return Ok(());
                            }
                            if let KeyCode::Char(c) = key.code {
                                self.handle_key(app, c).await;
                            }
                        }
                        Some(Ok(_)) => {}
                        Some(Err(e)) => tracing::warn!("Event stream error: {:?}", e),
                        None => return Ok(()),
                    }
                }
                _ = reload.tick() => {
                    self.status_message = match app.reload(Utc::now()).await {
                        Ok(()) => format!("Reloaded at {}", chrono::Local::now().format("%H:%M:%S")),
                        Err(e) => format!("Reload failed: {}", e),
                    };
                }
                _ = clock.tick() => {
                    app.tick(Utc::now()).await;
                }
                Some(entry) = log_rx.recv() => {
                    self.system_logs.push(entry);
                    if self.system_logs.len() > MAX_LOGS {
                        self.system_logs.drain(0..(self.system_logs.len() - MAX_LOGS));
                    }
                }
            }
            self.draw(&View::capture(app))?;
        }
    }

    async fn handle_key<S: SessionSource, T: Transport>(&mut self, app: &mut App<S, T>, key: char) {
        let Some(item) = MenuItem::from_shortcut(key) else {
            return;
        };
        if !app.menu().contains(item) {
            return;
        }
        tracing::debug!("Menu item {:?} selected", item);
        self.status_message = match app.activate(item, Utc::now()).await {
            Ok(()) => format!("{} done", item.default_title()),
            Err(e) => format!("{} failed: {}", item.default_title(), e),
        };
    }

    fn cleanup(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(self.terminal.backend_mut(), LeaveAlternateScreen);
        let _ = self.terminal.show_cursor();
    }

    fn draw(&mut self, view: &View) -> Result<()> {
        let status_message = self.status_message.clone();
        let logs = &self.system_logs;

        self.terminal.draw(|f| {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([
                    Constraint::Length(3), // title
                    Constraint::Length(10), // menu
                    Constraint::Min(3),    // logs
                    Constraint::Length(3), // footer
                ])
                .split(f.area());

            let header = Paragraph::new(view.title.as_str())
                .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
                .alignment(Alignment::Center)
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .border_style(Style::default().fg(Color::Blue)),
                );
            f.render_widget(header, chunks[0]);

            draw_menu(f, chunks[1], view);
            draw_system_logs(f, chunks[2], logs);

            let footer = Paragraph::new(format!("{} | q: Quit", status_message))
                .style(Style::default().fg(Color::Gray))
                .alignment(Alignment::Center)
                .block(Block::default().borders(Borders::ALL));
            f.render_widget(footer, chunks[3]);
        })?;

        Ok(())
    }
}

impl Drop for StatusTui {
    fn drop(&mut self) {
        self.cleanup();
    }
}

fn draw_menu(f: &mut Frame, area: Rect, view: &View) {
    let mut title = "Menu".to_string();
    if view.debug {
        title.push_str(" [debug]");
    }
    if let Some(until) = &view.paused_until {
        title.push_str(&format!(" [paused until {}]", until));
    }
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Green));

    let lines: Vec<Line> = view
        .menu
        .iter()
        .map(|(item, label, checked)| {
            let indent = if item.is_submenu() { "    " } else { "" };
            let check = if *checked { "✓ " } else { "  " };
            let key = item
                .shortcut()
                .map(|c| format!("[{}] ", c))
                .unwrap_or_else(|| "    ".to_string());
            Line::from(vec![
                Span::styled(key, Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)),
                Span::raw(indent),
                Span::styled(check, Style::default().fg(Color::Green)),
                Span::raw(label.clone()),
            ])
        })
        .collect();

    f.render_widget(Paragraph::new(lines).block(block), area);
}

fn draw_system_logs(f: &mut Frame, area: Rect, logs: &[LogEntry]) {
    let logs_block = Block::default()
        .title("Logs")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Blue));

    if logs.is_empty() {
        let no_logs = Paragraph::new("No log messages")
            .style(Style::default().fg(Color::Gray))
            .block(logs_block)
            .alignment(Alignment::Center);
        f.render_widget(no_logs, area);
        return;
    }

    let log_lines: Vec<Line> = logs
        .iter()
        .map(|log| {
            let level_color = match log.level {
                LogLevel::Error => Color::Red,
                LogLevel::Warn => Color::Yellow,
                LogLevel::Info => Color::Cyan,
                LogLevel::Debug => Color::Gray,
                LogLevel::Trace => Color::DarkGray,
            };
            Line::from(vec![
                Span::styled(
                    format!("[{}] ", log.timestamp.with_timezone(&chrono::Local).format("%H:%M:%S")),
                    Style::default().fg(Color::Gray),
                ),
                Span::styled(
                    format!("{:<5} ", log.level.as_str()),
                    Style::default().fg(level_color).add_modifier(Modifier::BOLD),
                ),
                Span::raw(log.message.clone()),
            ])
        })
        .collect();

    let visible = area.height.saturating_sub(2) as usize;
    let logs_paragraph = Paragraph::new(log_lines)
        .block(logs_block)
        .wrap(Wrap { trim: true })
        .scroll((logs.len().saturating_sub(visible) as u16, 0));
    f.render_widget(logs_paragraph, area);
}
