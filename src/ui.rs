pub mod screen;

use std::time::Instant;

use itertools::Itertools;
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Gauge, Paragraph, Widget, Wrap},
};

use crate::app::{encouragement, App, AppState, MENU_ITEMS};
use crate::projector::{self, format_clock, CharClass};
use crate::session::TypingSession;

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 2;

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        screen::current_screen(&self.state).render(self, area, buf);
    }
}

/// Columns available for target text inside the bordered text box.
pub fn text_width(area: Rect) -> usize {
    area.width.saturating_sub(HORIZONTAL_MARGIN * 2 + 2) as usize
}

fn render_welcome(app: &App, area: Rect, buf: &mut Buffer) {
    let selected = match app.state {
        AppState::Welcome { selected } => selected,
        _ => 0,
    };
    let theme = &app.theme;

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(2),
            Constraint::Length(2),
            Constraint::Length(MENU_ITEMS.len() as u16 + 1),
            Constraint::Length(1),
            Constraint::Min(0),
        ])
        .split(area);

    Paragraph::new(vec![
        Line::from(Span::styled("typecoach", theme.title)),
        Line::from(Span::styled("touch typing practice", theme.subtitle)),
    ])
    .alignment(Alignment::Center)
    .render(chunks[1], buf);

    let history = match app.summary() {
        Some(summary) => format!(
            "{} sessions · avg {:.0} wpm · best {:.0} wpm · {:.1}% accuracy",
            summary.sessions, summary.avg_wpm, summary.best_wpm, summary.avg_accuracy
        ),
        None => "No sessions yet".to_string(),
    };
    Paragraph::new(Span::styled(history, theme.muted))
        .alignment(Alignment::Center)
        .render(chunks[2], buf);

    let menu: Vec<Line> = MENU_ITEMS
        .iter()
        .enumerate()
        .map(|(idx, item)| {
            if idx == selected {
                Line::from(Span::styled(format!("> {item}"), theme.highlight))
            } else {
                Line::from(Span::styled(format!("  {item}"), theme.pending))
            }
        })
        .collect();
    Paragraph::new(menu)
        .alignment(Alignment::Center)
        .render(chunks[3], buf);

    Paragraph::new(Span::styled(
        "(↑/↓) move / (enter) select / (q) quit",
        theme.muted.add_modifier(Modifier::ITALIC),
    ))
    .alignment(Alignment::Center)
    .render(chunks[4], buf);
}

fn render_configuring(app: &App, area: Rect, buf: &mut Buffer) {
    let theme = &app.theme;
    let minutes = app.session.duration_minutes();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(2),
            Constraint::Length(2),
            Constraint::Length(1),
            Constraint::Min(0),
        ])
        .split(area);

    Paragraph::new(Span::styled("Session duration", theme.title))
        .alignment(Alignment::Center)
        .render(chunks[1], buf);

    let unit = if minutes == 1 { "minute" } else { "minutes" };
    Paragraph::new(Span::styled(format!("◀ {minutes} {unit} ▶"), theme.highlight))
        .alignment(Alignment::Center)
        .render(chunks[2], buf);

    Paragraph::new(Span::styled(
        "(↑/↓) adjust / (enter) start / (esc) quit",
        theme.muted.add_modifier(Modifier::ITALIC),
    ))
    .alignment(Alignment::Center)
    .render(chunks[3], buf);
}

fn render_active(app: &App, area: Rect, buf: &mut Buffer) {
    let theme = &app.theme;
    let frame = projector::project(&app.session, theme, Instant::now(), text_width(area));

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(1), // stats
            Constraint::Length(1), // time bar
            Constraint::Length(1),
            Constraint::Length(3), // text
            Constraint::Length(1), // status
            Constraint::Length(1), // problem words
            Constraint::Min(0),
            Constraint::Length(1), // legend
        ])
        .split(area);

    let header = &frame.header;
    let mut stats = vec![
        Span::styled(format!("{:.0} wpm", header.wpm), theme.title),
        Span::raw("   "),
        Span::styled(format!("{:.1}% acc", header.accuracy), theme.title),
        Span::raw("   "),
        Span::styled(format!("{} errors", header.errors), theme.title),
        Span::raw("   "),
        Span::styled(format_clock(header.remaining), theme.highlight),
    ];
    if header.generating {
        stats.push(Span::raw("   "));
        stats.push(Span::styled("Generating...", theme.subtitle));
    }
    Paragraph::new(Line::from(stats))
        .alignment(Alignment::Center)
        .render(chunks[1], buf);

    Gauge::default()
        .gauge_style(theme.progress)
        .ratio(frame.progress)
        .label("")
        .render(chunks[2], buf);

    let mut spans: Vec<Span> = frame
        .spans
        .iter()
        .map(|span| {
            let symbol = match (span.class, span.ch) {
                (CharClass::Incorrect, ' ') => "·".to_string(),
                (_, c) => c.to_string(),
            };
            Span::styled(symbol, span.style)
        })
        .collect();
    if frame.caret_after_text() {
        spans.push(Span::styled(" ", theme.cursor));
    }
    let border_style = if frame.flash {
        theme.flash
    } else {
        theme.border
    };
    Paragraph::new(Line::from(spans))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(border_style),
        )
        .render(chunks[4], buf);

    if frame.waiting_for_text {
        Paragraph::new(Span::styled("Waiting for the next sentence...", theme.subtitle))
            .alignment(Alignment::Center)
            .render(chunks[5], buf);
    }

    if !frame.problem_words.is_empty() {
        Paragraph::new(Line::from(vec![
            Span::styled("Problem words: ", theme.muted),
            Span::styled(frame.problem_words.iter().join(", "), theme.warning),
        ]))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .render(chunks[6], buf);
    }

    Paragraph::new(Span::styled(
        "(esc) quit",
        theme.muted.add_modifier(Modifier::ITALIC),
    ))
    .render(chunks[8], buf);
}

fn stat_box<'a>(title: &'a str, value: String, app: &App) -> Paragraph<'a> {
    Paragraph::new(Span::styled(value, app.theme.title))
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .title(Span::styled(title, app.theme.muted))
                .title_alignment(Alignment::Center)
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(app.theme.border),
        )
}

fn render_dashboard(app: &App, record: &TypingSession, area: Rect, buf: &mut Buffer) {
    let theme = &app.theme;

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Length(2), // title
            Constraint::Length(3), // stat boxes
            Constraint::Length(1),
            Constraint::Length(4), // history
            Constraint::Length(2), // encouragement
            Constraint::Min(0),
            Constraint::Length(1), // legend
        ])
        .split(area);

    Paragraph::new(Span::styled("Session complete", theme.title))
        .alignment(Alignment::Center)
        .render(chunks[0], buf);

    let boxes = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 4); 4])
        .split(chunks[1]);
    stat_box("WPM", format!("{:.1}", record.wpm), app).render(boxes[0], buf);
    stat_box("Accuracy", format!("{:.1}%", record.accuracy), app).render(boxes[1], buf);
    stat_box("Errors", record.errors.to_string(), app).render(boxes[2], buf);
    stat_box("Time", format_clock(record.duration), app).render(boxes[3], buf);

    let history = match app.summary() {
        Some(summary) => vec![
            Line::from(Span::styled("History", theme.subtitle)),
            Line::from(format!(
                "Average: {:.1} wpm · {:.1}% accuracy",
                summary.avg_wpm, summary.avg_accuracy
            )),
            Line::from(format!("Best: {:.1} wpm", summary.best_wpm)),
            Line::from(format!("Sessions: {}", summary.sessions)),
        ],
        None => vec![Line::from(Span::styled("No history yet", theme.muted))],
    };
    Paragraph::new(history)
        .style(theme.pending)
        .alignment(Alignment::Center)
        .render(chunks[3], buf);

    Paragraph::new(Span::styled(
        encouragement(record.accuracy, record.wpm),
        theme.success,
    ))
    .alignment(Alignment::Center)
    .render(chunks[4], buf);

    Paragraph::new(Span::styled(
        "(enter) exit",
        Style::default().patch(theme.muted).add_modifier(Modifier::ITALIC),
    ))
    .alignment(Alignment::Center)
    .render(chunks[6], buf);
}
