use ratatui::{buffer::Buffer, layout::Rect};

use crate::app::{App, AppState};

/// A UI Screen boundary: responsible for rendering one application state
pub trait Screen {
    fn render(&self, app: &App, area: Rect, buf: &mut Buffer);
}

/// Welcome menu with history summary
pub struct WelcomeScreen;

impl Screen for WelcomeScreen {
    fn render(&self, app: &App, area: Rect, buf: &mut Buffer) {
        super::render_welcome(app, area, buf);
    }
}

/// Duration selection before the clock starts, then the typing view
pub struct SessionScreen;

impl Screen for SessionScreen {
    fn render(&self, app: &App, area: Rect, buf: &mut Buffer) {
        if app.session.is_active() {
            super::render_active(app, area, buf);
        } else {
            super::render_configuring(app, area, buf);
        }
    }
}

/// Results of the finished session
pub struct DashboardScreen;

impl Screen for DashboardScreen {
    fn render(&self, app: &App, area: Rect, buf: &mut Buffer) {
        if let AppState::Dashboard { record } = &app.state {
            super::render_dashboard(app, record, area, buf);
        }
    }
}

/// Nothing to draw while shutting down
pub struct BlankScreen;

impl Screen for BlankScreen {
    fn render(&self, _app: &App, _area: Rect, _buf: &mut Buffer) {}
}

/// Helper to construct the appropriate screen for the current state
pub fn current_screen(state: &AppState) -> Box<dyn Screen> {
    match state {
        AppState::Welcome { .. } => Box::new(WelcomeScreen),
        AppState::Session => Box::new(SessionScreen),
        AppState::Dashboard { .. } => Box::new(DashboardScreen),
        AppState::Exit => Box::new(BlankScreen),
    }
}
