//! Derives a drawable snapshot from the session state.
//!
//! [`project`] is pure: the same state, theme, instant and width always give
//! the same [`Frame`].

use std::ops::Range;
use std::time::{Duration, Instant};

use ratatui::style::Style;

use crate::metrics::{current_accuracy, current_wpm};
use crate::session::SessionState;
use crate::theme::Theme;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CharClass {
    Correct,
    Incorrect,
    Cursor,
    Pending,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeaderStats {
    pub wpm: f32,
    pub accuracy: f32,
    pub errors: usize,
    pub remaining: Duration,
    pub generating: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CharSpan {
    pub ch: char,
    pub class: CharClass,
    pub style: Style,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub header: HeaderStats,
    /// Characters inside the viewport, in order.
    pub spans: Vec<CharSpan>,
    pub viewport: Range<usize>,
    /// Index into the target text where the next character goes.
    pub cursor: usize,
    /// Fraction of the time budget used, in `0.0..=1.0`.
    pub progress: f64,
    pub flash: bool,
    pub waiting_for_text: bool,
    pub problem_words: Vec<String>,
}

impl Frame {
    /// Whether the caret sits past the last visible character.
    pub fn caret_after_text(&self) -> bool {
        self.cursor == self.viewport.end
    }
}

pub fn project(state: &SessionState, theme: &Theme, now: Instant, width: usize) -> Frame {
    let typed_len = state.typed().len();
    let elapsed = state.elapsed(now);
    let budget = state.budget();

    let header = HeaderStats {
        wpm: current_wpm(typed_len, elapsed),
        accuracy: current_accuracy(typed_len, state.error_count()),
        errors: state.error_count(),
        remaining: state.remaining(now),
        generating: state.generation().pending,
    };

    let len = state.target().len();
    let cursor = state.cursor();
    // At the end of the text the caret takes a cell after the last character.
    let window = if cursor == len { width.saturating_sub(1) } else { width };
    let viewport = viewport(len, cursor, window);
    let spans = viewport
        .clone()
        .map(|i| {
            let class = classify(state, i);
            CharSpan {
                ch: state.target()[i],
                class,
                style: theme.style_for(class),
            }
        })
        .collect();

    let progress = if budget.is_zero() {
        0.0
    } else {
        (elapsed.as_secs_f64() / budget.as_secs_f64()).clamp(0.0, 1.0)
    };

    Frame {
        header,
        spans,
        viewport,
        cursor,
        progress,
        flash: state.flash_active(now),
        waiting_for_text: state.is_waiting_for_text(),
        problem_words: state.current_problem_words().to_vec(),
    }
}

/// Classification of the target character at `index`.
pub fn classify(state: &SessionState, index: usize) -> CharClass {
    let cursor = state.cursor();
    if index < cursor {
        if state.typed()[index] == state.target()[index] {
            CharClass::Correct
        } else {
            CharClass::Incorrect
        }
    } else if index == cursor {
        CharClass::Cursor
    } else {
        CharClass::Pending
    }
}

/// Window of `width` positions around `cursor`, clamped to the text.
pub fn viewport(len: usize, cursor: usize, width: usize) -> Range<usize> {
    if len <= width {
        return 0..len;
    }
    let start = cursor.saturating_sub(width / 2).min(len - width);
    start..start + width
}

/// `m:ss`
pub fn format_clock(duration: Duration) -> String {
    let secs = duration.as_secs();
    format!("{}:{:02}", secs / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{SessionEvent, SessionSettings};

    fn active(target: &str, typed: &str, t0: Instant) -> SessionState {
        let mut state = SessionState::new(target, SessionSettings::default());
        state.update(SessionEvent::Confirm, t0);
        for c in typed.chars() {
            state.update(SessionEvent::Char(c), t0);
        }
        state
    }

    #[test]
    fn classifies_typed_cursor_and_pending() {
        let t0 = Instant::now();
        let state = active("abcd", "ax", t0);
        let frame = project(&state, &Theme::default(), t0, 80);

        let classes: Vec<CharClass> = frame.spans.iter().map(|s| s.class).collect();
        assert_eq!(
            classes,
            vec![
                CharClass::Correct,
                CharClass::Incorrect,
                CharClass::Cursor,
                CharClass::Pending
            ]
        );
        let text: String = frame.spans.iter().map(|s| s.ch).collect();
        assert_eq!(text, "abcd");
    }

    #[test]
    fn spans_carry_theme_styles() {
        let t0 = Instant::now();
        let theme = Theme::default();
        let state = active("ab", "a", t0);
        let frame = project(&state, &theme, t0, 80);
        assert_eq!(frame.spans[0].style, theme.correct);
        assert_eq!(frame.spans[1].style, theme.cursor);
    }

    #[test]
    fn header_reports_live_metrics() {
        let t0 = Instant::now();
        let state = active("hello world", "hellx", t0);
        let frame = project(&state, &Theme::default(), t0 + Duration::from_secs(30), 80);

        assert_eq!(frame.header.errors, 1);
        assert_eq!(frame.header.accuracy, 80.0);
        // 5 chars in 30s = 1 word / 0.5 min
        assert_eq!(frame.header.wpm, 2.0);
        assert_eq!(frame.header.remaining, Duration::from_secs(30));
        assert!(!frame.header.generating);
        assert!((frame.progress - 0.5).abs() < 1e-9);
    }

    #[test]
    fn projection_is_idempotent() {
        let t0 = Instant::now();
        let state = active("the quick brown fox", "the qu", t0);
        let now = t0 + Duration::from_secs(3);
        let theme = Theme::default();
        assert_eq!(project(&state, &theme, now, 10), project(&state, &theme, now, 10));
    }

    #[test]
    fn short_text_is_shown_whole() {
        assert_eq!(viewport(5, 3, 10), 0..5);
        assert_eq!(viewport(10, 9, 10), 0..10);
    }

    #[test]
    fn long_text_centres_on_cursor() {
        assert_eq!(viewport(100, 50, 20), 40..60);
    }

    #[test]
    fn viewport_clamps_at_edges() {
        assert_eq!(viewport(100, 3, 20), 0..20);
        assert_eq!(viewport(100, 99, 20), 80..100);
        assert_eq!(viewport(100, 100, 20), 80..100);
    }

    #[test]
    fn frame_window_follows_cursor() {
        let t0 = Instant::now();
        let target = "abcdefghijklmnopqrstuvwxyz";
        let state = active(target, "abcdefghijklm", t0);
        let frame = project(&state, &Theme::default(), t0, 6);
        assert_eq!(frame.viewport, 10..16);
        assert_eq!(frame.spans.len(), 6);
        assert_eq!(frame.spans[3].class, CharClass::Cursor);
        assert_eq!(frame.spans[3].ch, 'n');
    }

    #[test]
    fn caret_follows_text_while_waiting_for_continuation() {
        let t0 = Instant::now();
        let mut state = SessionState::new(
            "abcdefghij",
            SessionSettings {
                generative: true,
                pregenerate_threshold: 3,
                ..SessionSettings::default()
            },
        );
        state.update(SessionEvent::Confirm, t0);
        for c in "abcdefgh".chars() {
            state.update(SessionEvent::Char(c), t0);
        }
        assert!(state.update(SessionEvent::Tick, t0).is_some());
        for c in "ij".chars() {
            state.update(SessionEvent::Char(c), t0);
        }
        assert!(state.is_waiting_for_text());

        let frame = project(&state, &Theme::default(), t0, 6);
        assert_eq!(frame.cursor, 10);
        assert_eq!(frame.viewport, 5..10);
        assert!(frame.caret_after_text());
        assert!(frame.spans.iter().all(|s| s.class != CharClass::Cursor));

        let wide = project(&state, &Theme::default(), t0, 40);
        assert_eq!(wide.viewport, 0..10);
        assert!(wide.caret_after_text());
    }

    #[test]
    fn caret_inside_text_is_a_cursor_span() {
        let t0 = Instant::now();
        let frame = project(&active("hello", "he", t0), &Theme::default(), t0, 40);
        assert_eq!(frame.cursor, 2);
        assert!(!frame.caret_after_text());
    }

    #[test]
    fn configuring_frame_shows_full_budget() {
        let t0 = Instant::now();
        let state = SessionState::new("abc", SessionSettings::default());
        let frame = project(&state, &Theme::default(), t0, 80);
        assert_eq!(frame.header.remaining, Duration::from_secs(60));
        assert_eq!(frame.header.wpm, 0.0);
        assert_eq!(frame.progress, 0.0);
    }

    #[test]
    fn clock_format() {
        assert_eq!(format_clock(Duration::from_secs(0)), "0:00");
        assert_eq!(format_clock(Duration::from_secs(65)), "1:05");
        assert_eq!(format_clock(Duration::from_secs(600)), "10:00");
        assert_eq!(format_clock(Duration::from_millis(59_999)), "0:59");
    }
}
