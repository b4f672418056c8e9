use clap::ValueEnum;
use ratatui::style::{Color, Modifier, Style};
use tracing::warn;

use crate::projector::CharClass;

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, ValueEnum, strum_macros::Display)]
#[strum(serialize_all = "lowercase")]
pub enum ThemeName {
    #[default]
    Default,
    Dark,
}

impl ThemeName {
    /// Parse a config value, falling back to the default theme.
    pub fn from_config(name: &str) -> Self {
        <Self as ValueEnum>::from_str(name, true).unwrap_or_else(|_| {
            warn!(theme = name, "unknown theme, using default");
            ThemeName::Default
        })
    }
}

/// Styles for every element the UI draws. Passed explicitly to the
/// projector and the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Theme {
    pub name: ThemeName,
    pub correct: Style,
    pub incorrect: Style,
    pub cursor: Style,
    pub pending: Style,
    pub title: Style,
    pub subtitle: Style,
    pub highlight: Style,
    pub muted: Style,
    pub border: Style,
    pub success: Style,
    pub warning: Style,
    pub progress: Style,
    pub flash: Style,
}

impl Theme {
    pub fn new(name: ThemeName) -> Self {
        match name {
            ThemeName::Default => Self::default_theme(),
            ThemeName::Dark => Self::dark(),
        }
    }

    fn default_theme() -> Self {
        Self {
            name: ThemeName::Default,
            correct: Style::default().fg(Color::Indexed(2)),
            incorrect: Style::default().fg(Color::Indexed(1)),
            cursor: Style::default().fg(Color::Indexed(0)).bg(Color::Indexed(6)),
            pending: Style::default().fg(Color::Indexed(7)),
            title: Style::default()
                .fg(Color::Indexed(7))
                .add_modifier(Modifier::BOLD),
            subtitle: Style::default()
                .fg(Color::Indexed(8))
                .add_modifier(Modifier::ITALIC),
            highlight: Style::default()
                .fg(Color::Indexed(6))
                .add_modifier(Modifier::BOLD),
            muted: Style::default().fg(Color::Indexed(8)),
            border: Style::default().fg(Color::Indexed(8)),
            success: Style::default()
                .fg(Color::Indexed(7))
                .add_modifier(Modifier::BOLD),
            warning: Style::default()
                .fg(Color::Indexed(8))
                .add_modifier(Modifier::BOLD),
            progress: Style::default().fg(Color::Indexed(6)).bg(Color::Indexed(8)),
            flash: Style::default().fg(Color::Indexed(15)).bg(Color::Indexed(1)),
        }
    }

    fn dark() -> Self {
        Self {
            name: ThemeName::Dark,
            correct: Style::default().fg(Color::Indexed(10)),
            incorrect: Style::default().fg(Color::Indexed(9)),
            cursor: Style::default().fg(Color::Indexed(0)).bg(Color::Indexed(11)),
            pending: Style::default().fg(Color::Indexed(15)),
            title: Style::default()
                .fg(Color::Indexed(14))
                .add_modifier(Modifier::BOLD),
            subtitle: Style::default()
                .fg(Color::Indexed(13))
                .add_modifier(Modifier::ITALIC),
            highlight: Style::default()
                .fg(Color::Indexed(11))
                .add_modifier(Modifier::BOLD),
            muted: Style::default().fg(Color::Indexed(8)),
            border: Style::default().fg(Color::Indexed(14)),
            success: Style::default()
                .fg(Color::Indexed(10))
                .add_modifier(Modifier::BOLD),
            warning: Style::default()
                .fg(Color::Indexed(11))
                .add_modifier(Modifier::BOLD),
            progress: Style::default().fg(Color::Indexed(14)).bg(Color::Indexed(8)),
            flash: Style::default().fg(Color::Indexed(0)).bg(Color::Indexed(9)),
        }
    }

    pub fn style_for(&self, class: CharClass) -> Style {
        match class {
            CharClass::Correct => self.correct,
            CharClass::Incorrect => self.incorrect,
            CharClass::Cursor => self.cursor,
            CharClass::Pending => self.pending,
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::new(ThemeName::Default)
    }
}
