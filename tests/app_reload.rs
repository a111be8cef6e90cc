use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use hatarake::app::{App, MenuItem, ERROR_SESSION_NAME};
use hatarake::core::Priority;
use hatarake::feed::Fetcher;
use hatarake::notify::{Growler, Note, NotifyError, Transport};
use hatarake::utils::LogControl;
use hatarake::Config;

#[derive(Clone, Default)]
struct Recorder(Arc<Mutex<Vec<Note>>>);

#[async_trait]
impl Transport for Recorder {
    async fn register(&self) -> Result<(), NotifyError> {
        Ok(())
    }

    async fn notify(&self, note: &Note) -> Result<(), NotifyError> {
        self.0.lock().unwrap().push(note.clone());
        Ok(())
    }
}

async fn unused_port() -> u16 {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap().port()
}

fn write_config(path: &Path, body: &str) {
    std::fs::write(path, body).unwrap();
}

#[tokio::test]
async fn test_unreachable_calendar_shows_error_session() {
    let port = unused_port().await;
    let file = tempfile::NamedTempFile::new().unwrap();
    write_config(
        file.path(),
        &format!("[feed]\nnag = \"http://127.0.0.1:{}/cal.ics\"\n", port),
    );

    let config = Config::load(Some(file.path())).unwrap();
    let fetcher = Fetcher::from_config(&config).unwrap();
    let recorder = Recorder::default();
    let growler = Growler::new(recorder.clone()).await;
    let now = Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap() + Duration::milliseconds(300);
    let mut app = App::new(config, fetcher, growler, LogControl::detached(), now);

    let err = app.reload(now).await.unwrap_err();
    assert!(err.is_fetch());

    let session = app.state().last_session.clone().unwrap();
    assert_eq!(session.name, ERROR_SESSION_NAME);
    assert_eq!(session.end, Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap());

    // the synthetic session ages like a real one
    let later = session.end + Duration::minutes(20);
    assert_eq!(app.tick(later).await, Some(Priority::High));
    assert!(app
        .menu()
        .get(MenuItem::Reload)
        .unwrap()
        .title
        .contains(ERROR_SESSION_NAME));
    assert_eq!(recorder.0.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_api_failure_keeps_previous_state() {
    let port = unused_port().await;
    let file = tempfile::NamedTempFile::new().unwrap();
    write_config(
        file.path(),
        &format!(
            "[server]\napi = \"http://127.0.0.1:{}/api\"\ntoken = \"t\"\n",
            port
        ),
    );

    let config = Config::load(Some(file.path())).unwrap();
    let fetcher = Fetcher::from_config(&config).unwrap();
    let growler = Growler::new(Recorder::default()).await;
    let mut app = App::new(config, fetcher, growler, LogControl::detached(), Utc::now());

    assert!(app.reload(Utc::now()).await.is_err());
    assert!(app.state().last_session.is_none());
}

#[tokio::test]
async fn test_reload_picks_up_config_changes() {
    let port = unused_port().await;
    let file = tempfile::NamedTempFile::new().unwrap();
    write_config(
        file.path(),
        &format!("[feed]\nnag = \"http://127.0.0.1:{}/a.ics\"\n", port),
    );

    let config = Config::load(Some(file.path())).unwrap();
    let fetcher = Fetcher::from_config(&config).unwrap();
    let growler = Growler::new(Recorder::default()).await;
    let mut app = App::new(config, fetcher, growler, LogControl::detached(), Utc::now());
    assert!(!app.menu().contains(MenuItem::Debug));

    write_config(
        file.path(),
        &format!(
            "[feed]\nnag = \"http://127.0.0.1:{}/a.ics\"\n[hatarake]\ndevelopment = true\nnag_interval = 120\n",
            port
        ),
    );
    let _ = app.reload(Utc::now()).await;

    assert!(app.menu().contains(MenuItem::Debug));
    assert!(app.config().development);
    assert_eq!(app.state().delay, std::time::Duration::from_secs(120));
}

#[tokio::test]
async fn test_broken_config_keeps_previous_settings() {
    let port = unused_port().await;
    let file = tempfile::NamedTempFile::new().unwrap();
    write_config(
        file.path(),
        &format!(
            "[feed]\nnag = \"http://127.0.0.1:{}/a.ics\"\n[hatarake]\ndevelopment = true\nnag_interval = 90\n",
            port
        ),
    );

    let config = Config::load(Some(file.path())).unwrap();
    let feed = config.feed.clone();
    let fetcher = Fetcher::from_config(&config).unwrap();
    let growler = Growler::new(Recorder::default()).await;
    let mut app = App::new(config, fetcher, growler, LogControl::detached(), Utc::now());
    let _ = app.reload(Utc::now()).await;
    assert_eq!(app.state().delay, std::time::Duration::from_secs(90));

    for broken in [
        "[feed\nnag = ",
        "[feed]\n[hatarake]\ndevelopment = false\nnag_interval = 30\n",
    ] {
        write_config(file.path(), broken);
        let _ = app.reload(Utc::now()).await;

        assert_eq!(app.config().feed, feed);
        assert!(app.config().development);
        assert_eq!(app.config().nag_interval, std::time::Duration::from_secs(90));
        assert_eq!(app.state().delay, std::time::Duration::from_secs(90));
        assert!(app.menu().contains(MenuItem::Debug));
    }
}
