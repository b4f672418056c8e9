//! Screen-level application state: welcome menu, the typing session and the
//! results dashboard.

use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::{debug, info, warn};

use crate::generation::{GenerationAdapter, GenerationHandle};
use crate::history::{HistoryStore, HistorySummary, UserStats};
use crate::runtime::{schedule, TrainerEvent};
use crate::session::{Command, SessionEvent, SessionOutcome, SessionSettings, SessionState, TypingSession};
use crate::sources::TextSource;
use crate::theme::Theme;

pub const MENU_ITEMS: [&str; 2] = ["Start session", "Exit"];

#[derive(Debug, Clone, PartialEq)]
pub enum AppState {
    Welcome { selected: usize },
    Session,
    Dashboard { record: TypingSession },
    Exit,
}

/// Everything needed to build an [`App`].
pub struct AppSetup {
    pub opening_text: String,
    pub source: Arc<dyn TextSource>,
    pub settings: SessionSettings,
    pub theme: Theme,
    pub history: Option<HistoryStore>,
    pub generation_timeout: Duration,
    pub events: Sender<TrainerEvent>,
}

pub struct App {
    pub state: AppState,
    pub session: SessionState,
    pub theme: Theme,
    pub stats: UserStats,
    history: Option<HistoryStore>,
    generation: GenerationAdapter,
    in_flight: Option<GenerationHandle>,
    events: Sender<TrainerEvent>,
}

impl App {
    pub fn new(setup: AppSetup) -> Self {
        let settings = SessionSettings {
            generative: setup.source.supports_continuation(),
            ..setup.settings
        };

        let stats = match setup.history.as_ref().map(HistoryStore::load) {
            Some(Ok(stats)) => stats,
            Some(Err(err)) => {
                warn!(error = %err, "could not read history");
                UserStats::default()
            }
            None => UserStats::default(),
        };

        Self {
            state: AppState::Welcome { selected: 0 },
            session: SessionState::new(&setup.opening_text, settings),
            theme: setup.theme,
            stats,
            history: setup.history,
            generation: GenerationAdapter::new(
                setup.source,
                setup.generation_timeout,
                setup.events.clone(),
            ),
            in_flight: None,
            events: setup.events,
        }
    }

    pub fn summary(&self) -> Option<HistorySummary> {
        self.stats.summary()
    }

    pub fn should_exit(&self) -> bool {
        self.state == AppState::Exit
    }

    /// Whether the screen changes on its own and needs redrawing every tick.
    pub fn is_animating(&self) -> bool {
        self.state == AppState::Session && self.session.is_active()
    }

    pub fn handle(&mut self, event: TrainerEvent, now: Instant) {
        match event {
            TrainerEvent::Key(key) => self.on_key(key, now),
            TrainerEvent::Resize => {}
            TrainerEvent::Tick => self.forward(SessionEvent::Tick, now),
            TrainerEvent::GenerationComplete(text) => {
                self.in_flight = None;
                self.forward(SessionEvent::GenerationComplete(text), now);
            }
            TrainerEvent::GenerationFailed(reason) => {
                self.in_flight = None;
                self.forward(SessionEvent::GenerationFailed(reason), now);
            }
            TrainerEvent::FlashExpired(started) => {
                self.forward(SessionEvent::FlashExpired(started), now)
            }
        }
    }

    fn on_key(&mut self, key: KeyEvent, now: Instant) {
        let ctrl_c = key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c');

        match self.state {
            AppState::Welcome { selected } => {
                self.state = match key.code {
                    _ if ctrl_c => AppState::Exit,
                    KeyCode::Esc | KeyCode::Char('q') => AppState::Exit,
                    KeyCode::Up | KeyCode::Char('k') => AppState::Welcome {
                        selected: (selected + MENU_ITEMS.len() - 1) % MENU_ITEMS.len(),
                    },
                    KeyCode::Down | KeyCode::Char('j') => AppState::Welcome {
                        selected: (selected + 1) % MENU_ITEMS.len(),
                    },
                    KeyCode::Enter | KeyCode::Char(' ') if selected == 0 => AppState::Session,
                    KeyCode::Enter | KeyCode::Char(' ') => AppState::Exit,
                    _ => return,
                };
            }
            AppState::Session => {
                if let Some(event) = session_event_for_key(key) {
                    self.forward(event, now);
                }
            }
            AppState::Dashboard { .. } => match key.code {
                _ if ctrl_c => self.state = AppState::Exit,
                KeyCode::Enter | KeyCode::Esc | KeyCode::Char('q') => self.state = AppState::Exit,
                _ => {}
            },
            AppState::Exit => {}
        }
    }

    fn forward(&mut self, event: SessionEvent, now: Instant) {
        if self.state != AppState::Session {
            return;
        }

        if let Some(command) = self.session.update(event, now) {
            self.run(command);
        }

        if let Some(outcome) = self.session.outcome() {
            self.finish(outcome);
        }
    }

    fn run(&mut self, command: Command) {
        match command {
            Command::StartGeneration(request) => {
                self.in_flight = Some(self.generation.request_continuation(request));
            }
            Command::ScheduleFlashClear { delay, started } => {
                schedule(self.events.clone(), delay, TrainerEvent::FlashExpired(started));
            }
        }
    }

    fn finish(&mut self, outcome: SessionOutcome) {
        if let Some(handle) = self.in_flight.take() {
            debug!("cancelling in-flight generation");
            handle.cancel();
        }

        match outcome {
            SessionOutcome::Completed(record) => {
                self.record(&record);
                self.state = AppState::Dashboard { record };
            }
            SessionOutcome::Quit => {
                info!("session quit, nothing recorded");
                self.state = AppState::Exit;
            }
        }
    }

    fn record(&mut self, record: &TypingSession) {
        let Some(store) = &self.history else {
            self.stats.sessions.push(record.clone());
            return;
        };

        match store.append(record.clone()) {
            Ok(stats) => self.stats = stats,
            Err(err) => {
                warn!(error = %err, path = %store.path().display(), "failed to save session");
                self.stats.sessions.push(record.clone());
            }
        }
    }
}

/// Session-screen key bindings.
pub fn session_event_for_key(key: KeyEvent) -> Option<SessionEvent> {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return (key.code == KeyCode::Char('c')).then_some(SessionEvent::Quit);
    }

    match key.code {
        KeyCode::Esc => Some(SessionEvent::Quit),
        KeyCode::Up => Some(SessionEvent::IncreaseDuration),
        KeyCode::Down => Some(SessionEvent::DecreaseDuration),
        KeyCode::Enter => Some(SessionEvent::Confirm),
        KeyCode::Backspace => Some(SessionEvent::Backspace),
        KeyCode::Char(c) => Some(SessionEvent::Char(c)),
        _ => None,
    }
}

/// Dashboard message for a finished session.
pub fn encouragement(accuracy: f32, wpm: f32) -> &'static str {
    if accuracy >= 95.0 && wpm >= 50.0 {
        "Outstanding! You're a typing master!"
    } else if accuracy >= 90.0 && wpm >= 40.0 {
        "Great job! Keep up the excellent work!"
    } else if accuracy >= 85.0 {
        "Good progress! Practice makes perfect!"
    } else {
        "Keep practicing! You're improving!"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::DummySource;
    use assert_matches::assert_matches;
    use crossterm::event::KeyEventKind;
    use std::sync::mpsc;
    use tempfile::tempdir;

    fn key(code: KeyCode) -> TrainerEvent {
        TrainerEvent::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn app_with(text: &str, history: Option<HistoryStore>) -> (App, mpsc::Receiver<TrainerEvent>) {
        let (tx, rx) = mpsc::channel();
        let app = App::new(AppSetup {
            opening_text: text.to_string(),
            source: Arc::new(DummySource),
            settings: SessionSettings::default(),
            theme: Theme::default(),
            history,
            generation_timeout: Duration::from_secs(1),
            events: tx,
        });
        (app, rx)
    }

    #[test]
    fn welcome_menu_wraps() {
        let (mut app, _rx) = app_with("hi", None);
        let now = Instant::now();
        app.handle(key(KeyCode::Up), now);
        assert_eq!(app.state, AppState::Welcome { selected: 1 });
        app.handle(key(KeyCode::Char('j')), now);
        assert_eq!(app.state, AppState::Welcome { selected: 0 });
    }

    #[test]
    fn welcome_exit_item() {
        let (mut app, _rx) = app_with("hi", None);
        let now = Instant::now();
        app.handle(key(KeyCode::Down), now);
        app.handle(key(KeyCode::Enter), now);
        assert!(app.should_exit());
    }

    #[test]
    fn ctrl_c_exits_everywhere() {
        let (mut app, _rx) = app_with("hi", None);
        let ctrl_c = TrainerEvent::Key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        app.handle(ctrl_c.clone(), Instant::now());
        assert!(app.should_exit());

        let (mut app, _rx) = app_with("hi", None);
        app.handle(key(KeyCode::Enter), Instant::now());
        app.handle(ctrl_c, Instant::now());
        assert!(app.should_exit());
        assert_eq!(app.stats.sessions.len(), 0);
    }

    #[test]
    fn full_session_reaches_dashboard_and_is_saved() {
        let dir = tempdir().unwrap();
        let store = HistoryStore::with_path(dir.path().join("user_stats.json"));
        let (mut app, _rx) = app_with("ok go", Some(store.clone()));
        let t0 = Instant::now();

        app.handle(key(KeyCode::Enter), t0);
        assert_eq!(app.state, AppState::Session);
        app.handle(key(KeyCode::Up), t0);
        assert_eq!(app.session.duration_minutes(), 2);
        app.handle(key(KeyCode::Enter), t0);
        assert!(app.is_animating());

        for c in "ok go".chars() {
            app.handle(key(KeyCode::Char(c)), t0 + Duration::from_secs(3));
        }

        assert_matches!(&app.state, AppState::Dashboard { record } => {
            assert_eq!(record.errors, 0);
            assert_eq!(record.accuracy, 100.0);
        });
        assert_eq!(store.load().unwrap().sessions.len(), 1);
        assert_eq!(app.summary().unwrap().sessions, 1);

        app.handle(key(KeyCode::Enter), t0);
        assert!(app.should_exit());
    }

    #[test]
    fn typo_flash_schedules_expiry_event() {
        let (tx, rx) = mpsc::channel();
        let mut app = App::new(AppSetup {
            opening_text: "abc".into(),
            source: Arc::new(DummySource),
            settings: SessionSettings {
                policy: crate::typing_policy::TypingPolicy {
                    typo_flash: true,
                    flash_duration: Duration::from_millis(10),
                    ..Default::default()
                },
                ..SessionSettings::default()
            },
            theme: Theme::default(),
            history: None,
            generation_timeout: Duration::from_secs(1),
            events: tx,
        });
        let t0 = Instant::now();
        app.handle(key(KeyCode::Enter), t0);
        app.handle(key(KeyCode::Enter), t0);
        app.handle(key(KeyCode::Char('x')), t0);

        assert_eq!(
            rx.recv_timeout(Duration::from_secs(2)).unwrap(),
            TrainerEvent::FlashExpired(t0)
        );
    }

    #[test]
    fn key_bindings() {
        let k = |code| KeyEvent::new(code, KeyModifiers::NONE);
        assert_eq!(session_event_for_key(k(KeyCode::Esc)), Some(SessionEvent::Quit));
        assert_eq!(session_event_for_key(k(KeyCode::Up)), Some(SessionEvent::IncreaseDuration));
        assert_eq!(session_event_for_key(k(KeyCode::Down)), Some(SessionEvent::DecreaseDuration));
        assert_eq!(session_event_for_key(k(KeyCode::Enter)), Some(SessionEvent::Confirm));
        assert_eq!(session_event_for_key(k(KeyCode::Backspace)), Some(SessionEvent::Backspace));
        assert_eq!(session_event_for_key(k(KeyCode::Char('a'))), Some(SessionEvent::Char('a')));
        assert_eq!(session_event_for_key(k(KeyCode::Tab)), None);

        let ctrl = |c| KeyEvent::new_with_kind(KeyCode::Char(c), KeyModifiers::CONTROL, KeyEventKind::Press);
        assert_eq!(session_event_for_key(ctrl('c')), Some(SessionEvent::Quit));
        assert_eq!(session_event_for_key(ctrl('a')), None);
    }

    #[test]
    fn encouragement_bands() {
        assert_eq!(encouragement(96.0, 55.0), "Outstanding! You're a typing master!");
        assert_eq!(encouragement(96.0, 45.0), "Great job! Keep up the excellent work!");
        assert_eq!(encouragement(88.0, 70.0), "Good progress! Practice makes perfect!");
        assert_eq!(encouragement(70.0, 90.0), "Keep practicing! You're improving!");
    }
}
