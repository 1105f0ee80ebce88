//! skillchat-tui: Terminal chat widget for the skillchat assistant
//!
//! This crate provides the TUI layer for skillchat, including:
//! - The chat screen (conversation, input box, status and footer bars)
//! - Markdown rendering for assistant replies
//! - The event loop that runs ask and speak requests off the UI thread

mod app;
mod conversation;
mod event;
mod screens;
#[cfg(test)]
pub mod test_utils;
mod text;
mod theme;
mod widgets;

pub use app::{App, Command, Focus, Notice};
pub use event::{Action, Event, EventHandler};
pub use skillchat_engine;
pub use theme::Theme;

use crossterm::{
    cursor::Show as ShowCursor,
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use skillchat_engine::{
    player_for, AskClient, AskOutcome, Config, HttpTransport, PendingAsk, SpeakJob, Transport,
    TtsClient, TtsError, TtsOutcome,
};
use std::io::{self, stdout};
use std::sync::Arc;
use std::time::Instant;
use tokio::task::{JoinError, JoinHandle};
use tracing::{error, info};

/// Tick rate of the event loop (4 Hz).
const TICK_MS: u64 = 250;

/// RAII guard for terminal state restoration.
struct TerminalGuard;

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(stdout(), DisableMouseCapture, LeaveAlternateScreen, ShowCursor);
    }
}

/// Backend clients shared with spawned requests.
struct Clients {
    ask: Arc<AskClient>,
    tts: Arc<TtsClient>,
}

/// A running request and the ticket it settles.
type Running<K, T> = (K, JoinHandle<T>);

/// Run the TUI application.
///
/// Sets up the terminal, runs the event loop, and restores the terminal on exit.
pub async fn run_tui(config: Config, theme: Theme) -> Result<(), Box<dyn std::error::Error>> {
    let transport: Arc<dyn Transport> = Arc::new(HttpTransport::new(&config)?);
    let clients = Clients {
        ask: Arc::new(AskClient::new(transport.clone(), &config)),
        tts: Arc::new(TtsClient::new(transport, player_for(&config), &config)),
    };

    enable_raw_mode()?;
    let _guard = TerminalGuard;

    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(&config, theme);
    info!(session = %app.session.id(), backend = %app.backend, url = %app.base_url, "chat started");

    let mut events = EventHandler::new(TICK_MS);
    let result = run_loop(&mut terminal, &mut app, &mut events, &clients).await;

    terminal.show_cursor()?;
    result
}

async fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    events: &mut EventHandler,
    clients: &Clients,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut ask_handles: Vec<Running<PendingAsk, AskOutcome>> = Vec::new();
    let mut speak_handles: Vec<Running<SpeakJob, TtsOutcome>> = Vec::new();
    let mut last_frame = Instant::now();

    loop {
        let now = Instant::now();
        app.advance(now - last_frame);
        last_frame = now;

        let size = terminal.size()?;
        app.sync_layout(ratatui::layout::Rect::new(0, 0, size.width, size.height));
        terminal.draw(|frame| {
            let area = frame.area();
            screens::render_app(app, area, frame.buffer_mut());
        })?;

        if let Some(event) = events.next().await {
            let command = match event {
                Event::Key(key) => app.handle_key(key),
                Event::Mouse(mouse) => {
                    app.handle_mouse(mouse);
                    None
                }
                Event::Tick => {
                    app.tick();
                    None
                }
                // Picked up by the next sync_layout.
                Event::Resize(_, _) => None,
            };
            match command {
                Some(Command::Ask(pending)) => {
                    let client = clients.ask.clone();
                    let query = pending.query.clone();
                    let handle = tokio::spawn(async move { client.ask(&query).await });
                    ask_handles.push((pending, handle));
                }
                Some(Command::Speak(job)) => {
                    let client = clients.tts.clone();
                    let text = job.text.clone();
                    let handle = tokio::spawn(async move { client.speak(&text).await });
                    speak_handles.push((job, handle));
                }
                Some(Command::CancelAsks) => {
                    for (pending, handle) in ask_handles.drain(..) {
                        handle.abort();
                        app.cancel_ask(pending);
                    }
                }
                None => {}
            }
        }

        for (pending, result) in take_finished(&mut ask_handles).await {
            let outcome = result.unwrap_or_else(|err| AskOutcome::unavailable(task_failure(&err)));
            app.apply_reply(pending, outcome);
        }
        for (job, result) in take_finished(&mut speak_handles).await {
            let outcome = result
                .unwrap_or_else(|err| TtsOutcome::Failed(TtsError::Task(task_failure(&err))));
            app.apply_speech(&job, &outcome);
        }

        if app.should_quit {
            for (_, handle) in ask_handles {
                handle.abort();
            }
            for (_, handle) in speak_handles {
                handle.abort();
            }
            break;
        }
    }

    Ok(())
}

/// Remove finished tasks and pair each result with its ticket.
///
/// A panicked task still yields its ticket so the caller can settle it.
async fn take_finished<K, T>(handles: &mut Vec<Running<K, T>>) -> Vec<(K, Result<T, JoinError>)> {
    let mut results = Vec::new();
    let mut i = 0;
    while i < handles.len() {
        if handles[i].1.is_finished() {
            let (ticket, handle) = handles.remove(i);
            results.push((ticket, handle.await));
        } else {
            i += 1;
        }
    }
    results
}

fn task_failure(err: &JoinError) -> String {
    error!(error = %err, "request task failed");
    format!("request task failed: {err}")
}

/// Get the TUI version.
pub fn tui_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tui_version() {
        let version = tui_version();
        assert!(!version.is_empty());
        assert!(version.starts_with("0."));
    }

    fn values<K, T>(results: Vec<(K, Result<T, JoinError>)>) -> Vec<(K, T)> {
        results
            .into_iter()
            .map(|(k, r)| (k, r.unwrap()))
            .collect()
    }

    #[tokio::test]
    async fn test_take_finished_keeps_running_tasks() {
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        let mut handles = vec![
            ("a", tokio::spawn(async { 1 })),
            (
                "b",
                tokio::spawn(async move {
                    let _ = rx.await;
                    2
                }),
            ),
        ];
        while !handles[0].1.is_finished() {
            tokio::task::yield_now().await;
        }

        assert_eq!(values(take_finished(&mut handles).await), vec![("a", 1)]);
        assert_eq!(handles.len(), 1);

        let _ = tx.send(());
        while !handles[0].1.is_finished() {
            tokio::task::yield_now().await;
        }
        assert_eq!(values(take_finished(&mut handles).await), vec![("b", 2)]);
        assert!(handles.is_empty());
    }

    #[tokio::test]
    async fn test_panicked_ask_still_settles() {
        let mut app = App::new(&Config::default(), Theme::default());
        for c in "hi".chars() {
            app.handle_action(Action::Insert(c));
        }
        let Some(Command::Ask(pending)) = app.handle_action(Action::Submit) else {
            panic!("expected an ask command");
        };
        let handle: JoinHandle<AskOutcome> = tokio::spawn(async { panic!("backend client crashed") });
        let mut handles = vec![(pending, handle)];
        while !handles[0].1.is_finished() {
            tokio::task::yield_now().await;
        }

        for (pending, result) in take_finished(&mut handles).await {
            let err = result.unwrap_err();
            app.apply_reply(pending, AskOutcome::unavailable(task_failure(&err)));
        }

        assert!(!app.session.is_busy());
        assert_eq!(app.session.store().placeholder_count(), 0);
        assert!(app.session.last_error().is_some_and(|e| e.contains("request task failed")));
        assert!(app.notice.as_ref().is_some_and(|n| n.is_error));
    }

    #[tokio::test]
    async fn test_panicked_speak_releases_guard() {
        let mut app = App::new(&Config::default(), Theme::default());
        let greeting = app.session.messages()[0].id();
        let job = app.session.begin_speak(greeting).unwrap();
        let handle: JoinHandle<TtsOutcome> = tokio::spawn(async { panic!("player crashed") });
        let mut handles = vec![(job, handle)];
        while !handles[0].1.is_finished() {
            tokio::task::yield_now().await;
        }

        for (job, result) in take_finished(&mut handles).await {
            let err = result.unwrap_err();
            app.apply_speech(&job, &TtsOutcome::Failed(TtsError::Task(task_failure(&err))));
        }

        assert!(!app.session.tts().is_in_flight(greeting));
        app.advance(std::time::Duration::ZERO);
        assert!(app.notice.as_ref().is_some_and(|n| n.text.contains("TTS task failed")));
    }
}
