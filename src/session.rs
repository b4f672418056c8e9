//! Typing session state machine.
//!
//! A session starts in [`Phase::Configuring`], enters [`Phase::Active`] on
//! confirm and ends in either [`Phase::Completed`] or [`Phase::Quit`]. All
//! input (keys, timer ticks, generation results) arrives through
//! [`SessionState::update`], which may hand back a [`Command`] for the caller
//! to execute. Once a terminal phase is reached every event is ignored.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::ops::Range;
use std::time::{Duration, Instant};

use chrono::{DateTime, Local};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::analysis::{analyze, char_mismatch_count};
use crate::metrics::{final_accuracy, final_wpm};
use crate::typing_policy::{TypingPolicy, TypoState};

pub const MIN_DURATION_MINUTES: u32 = 1;
pub const MAX_DURATION_MINUTES: u32 = 60;
/// Cap on the problem words shown for the current sentence.
pub const MAX_PROBLEM_WORDS: usize = 10;

/// Result record of a finished session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypingSession {
    pub started_at: DateTime<Local>,
    pub wpm: f32,
    pub accuracy: f32,
    pub errors: usize,
    pub duration: Duration,
}

/// How a session ended.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionOutcome {
    Completed(TypingSession),
    Quit,
}

/// Timing captured when the user confirms the session setup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActiveClock {
    pub started_at: Instant,
    pub started_wall: DateTime<Local>,
    pub last_keystroke: Instant,
    pub budget: Duration,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Phase {
    Configuring,
    Active(ActiveClock),
    Completed(TypingSession),
    Quit,
}

impl Phase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Phase::Completed(_) | Phase::Quit)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    IncreaseDuration,
    DecreaseDuration,
    Confirm,
    Quit,
    Char(char),
    Backspace,
    Tick,
    GenerationComplete(String),
    GenerationFailed(String),
    /// Expiry of the flash that started at the given instant.
    FlashExpired(Instant),
}

/// Input for one continuation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub context: String,
    /// Problem characters, most frequent first.
    pub error_chars: Vec<char>,
    pub error_words: Vec<String>,
}

/// Side effects requested by the state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    StartGeneration(GenerationRequest),
    ScheduleFlashClear { delay: Duration, started: Instant },
}

/// Offsets into the typed buffer that were typed wrong in the current sentence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WordErrorTracker {
    positions: HashSet<usize>,
}

impl WordErrorTracker {
    pub fn mark(&mut self, pos: usize) {
        self.positions.insert(pos);
    }

    pub fn contains(&self, pos: usize) -> bool {
        self.positions.contains(&pos)
    }

    pub fn any_in(&self, range: Range<usize>) -> bool {
        range.into_iter().any(|pos| self.positions.contains(&pos))
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn clear(&mut self) {
        self.positions.clear();
    }
}

/// Bookkeeping for background continuation of the passage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationState {
    pub enabled: bool,
    pub pending: bool,
    pub ready_text: Option<String>,
    pub last_context_sentence: String,
    pub accumulated_error_chars: BTreeMap<char, usize>,
    pub accumulated_error_words: BTreeSet<String>,
    pub pregenerate_threshold: usize,
}

impl GenerationState {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            pending: false,
            ready_text: None,
            last_context_sentence: String::new(),
            accumulated_error_chars: BTreeMap::new(),
            accumulated_error_words: BTreeSet::new(),
            pregenerate_threshold: 0,
        }
    }

    pub fn enabled(opening: &str, pregenerate_threshold: usize) -> Self {
        Self {
            enabled: true,
            last_context_sentence: opening.to_string(),
            pregenerate_threshold,
            ..Self::disabled()
        }
    }

    pub fn is_idle(&self) -> bool {
        !self.pending && self.ready_text.is_none()
    }

    pub fn request(&self) -> GenerationRequest {
        let error_chars = self
            .accumulated_error_chars
            .iter()
            .sorted_by(|a, b| b.1.cmp(a.1).then(a.0.cmp(b.0)))
            .map(|(c, _)| *c)
            .collect();

        GenerationRequest {
            context: self.last_context_sentence.clone(),
            error_chars,
            error_words: self.accumulated_error_words.iter().cloned().collect(),
        }
    }
}

/// Knobs fixed for the lifetime of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSettings {
    pub duration_minutes: u32,
    pub policy: TypingPolicy,
    /// Whether the text source can continue the passage.
    pub generative: bool,
    pub pregenerate_threshold: usize,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            duration_minutes: 1,
            policy: TypingPolicy::default(),
            generative: false,
            pregenerate_threshold: 20,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SessionState {
    target: Vec<char>,
    typed: Vec<char>,
    error_count: usize,
    word_errors: WordErrorTracker,
    keystroke_latencies: Vec<Duration>,
    duration_minutes: u32,
    phase: Phase,
    generation: GenerationState,
    policy: TypingPolicy,
    typo: TypoState,
    sentence_end: usize,
    last_word_end: usize,
    current_problem_words: Vec<String>,
}

impl SessionState {
    pub fn new(target: &str, settings: SessionSettings) -> Self {
        debug_assert!(!target.is_empty(), "session needs target text");

        let generation = if settings.generative {
            GenerationState::enabled(target, settings.pregenerate_threshold)
        } else {
            GenerationState::disabled()
        };
        let target: Vec<char> = target.chars().collect();

        Self {
            sentence_end: target.len(),
            target,
            typed: Vec::new(),
            error_count: 0,
            word_errors: WordErrorTracker::default(),
            keystroke_latencies: Vec::new(),
            duration_minutes: settings
                .duration_minutes
                .clamp(MIN_DURATION_MINUTES, MAX_DURATION_MINUTES),
            phase: Phase::Configuring,
            generation,
            policy: settings.policy,
            typo: TypoState::default(),
            last_word_end: 0,
            current_problem_words: Vec::new(),
        }
    }

    pub fn target(&self) -> &[char] {
        &self.target
    }

    pub fn typed(&self) -> &[char] {
        &self.typed
    }

    pub fn target_text(&self) -> String {
        self.target.iter().collect()
    }

    pub fn typed_text(&self) -> String {
        self.typed.iter().collect()
    }

    /// Position of the next character to type; always equal to the typed length.
    pub fn cursor(&self) -> usize {
        self.typed.len()
    }

    pub fn error_count(&self) -> usize {
        self.error_count
    }

    pub fn word_errors(&self) -> &WordErrorTracker {
        &self.word_errors
    }

    pub fn keystroke_latencies(&self) -> &[Duration] {
        &self.keystroke_latencies
    }

    pub fn duration_minutes(&self) -> u32 {
        self.duration_minutes
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn generation(&self) -> &GenerationState {
        &self.generation
    }

    pub fn policy(&self) -> &TypingPolicy {
        &self.policy
    }

    pub fn typo(&self) -> &TypoState {
        &self.typo
    }

    pub fn sentence_end(&self) -> usize {
        self.sentence_end
    }

    pub fn current_problem_words(&self) -> &[String] {
        &self.current_problem_words
    }

    pub fn is_active(&self) -> bool {
        matches!(self.phase, Phase::Active(_))
    }

    pub fn is_terminal(&self) -> bool {
        self.phase.is_terminal()
    }

    /// True while the cursor sits at the end of the text and a continuation is on its way.
    pub fn is_waiting_for_text(&self) -> bool {
        self.is_active() && self.generation.pending && self.typed.len() >= self.target.len()
    }

    pub fn elapsed(&self, now: Instant) -> Duration {
        match &self.phase {
            Phase::Active(clock) => now.saturating_duration_since(clock.started_at),
            Phase::Completed(record) => record.duration,
            _ => Duration::ZERO,
        }
    }

    pub fn remaining(&self, now: Instant) -> Duration {
        match &self.phase {
            Phase::Active(clock) => clock.budget.saturating_sub(self.elapsed(now)),
            Phase::Configuring => Duration::from_secs(u64::from(self.duration_minutes) * 60),
            _ => Duration::ZERO,
        }
    }

    pub fn budget(&self) -> Duration {
        match &self.phase {
            Phase::Active(clock) => clock.budget,
            _ => Duration::from_secs(u64::from(self.duration_minutes) * 60),
        }
    }

    pub fn flash_active(&self, now: Instant) -> bool {
        self.typo.flash_active(&self.policy, now)
    }

    pub fn outcome(&self) -> Option<SessionOutcome> {
        match &self.phase {
            Phase::Completed(record) => Some(SessionOutcome::Completed(record.clone())),
            Phase::Quit => Some(SessionOutcome::Quit),
            _ => None,
        }
    }

    /// Apply one event. Events after a terminal phase are discarded.
    pub fn update(&mut self, event: SessionEvent, now: Instant) -> Option<Command> {
        let active = match self.phase {
            Phase::Configuring => false,
            Phase::Active(_) => true,
            Phase::Completed(_) | Phase::Quit => {
                debug!(?event, "session finished, dropping event");
                return None;
            }
        };

        if event == SessionEvent::Quit {
            info!(typed = self.typed.len(), "session cancelled");
            self.phase = Phase::Quit;
            return None;
        }

        if active {
            self.update_active(event, now)
        } else {
            self.update_configuring(event, now);
            None
        }
    }

    fn update_configuring(&mut self, event: SessionEvent, now: Instant) {
        match event {
            SessionEvent::IncreaseDuration => self.adjust_duration(1),
            SessionEvent::DecreaseDuration => self.adjust_duration(-1),
            SessionEvent::Confirm => self.start(now),
            other => debug!(?other, "ignored while configuring"),
        }
    }

    fn update_active(&mut self, event: SessionEvent, now: Instant) -> Option<Command> {
        match event {
            SessionEvent::Tick => self.on_tick(now),
            SessionEvent::Char(c) => self.on_char(c, now),
            SessionEvent::Backspace => {
                self.on_backspace();
                None
            }
            SessionEvent::GenerationComplete(text) => {
                self.on_generation_complete(text);
                None
            }
            SessionEvent::GenerationFailed(reason) => {
                self.on_generation_failed(&reason);
                None
            }
            SessionEvent::FlashExpired(started) => {
                self.typo.clear_flash(started);
                None
            }
            SessionEvent::IncreaseDuration
            | SessionEvent::DecreaseDuration
            | SessionEvent::Confirm
            | SessionEvent::Quit => None,
        }
    }

    fn adjust_duration(&mut self, delta: i64) {
        let minutes = (i64::from(self.duration_minutes) + delta).clamp(
            i64::from(MIN_DURATION_MINUTES),
            i64::from(MAX_DURATION_MINUTES),
        );
        self.duration_minutes = minutes as u32;
    }

    fn start(&mut self, now: Instant) {
        let budget = Duration::from_secs(u64::from(self.duration_minutes) * 60);
        info!(minutes = self.duration_minutes, "session started");
        self.phase = Phase::Active(ActiveClock {
            started_at: now,
            started_wall: Local::now(),
            last_keystroke: now,
            budget,
        });
    }

    fn on_tick(&mut self, now: Instant) -> Option<Command> {
        let clock = match self.phase {
            Phase::Active(clock) => clock,
            _ => return None,
        };

        if now.saturating_duration_since(clock.started_at) >= clock.budget {
            debug!("time budget exhausted");
            self.complete();
            return None;
        }

        if self.generation.enabled && self.generation.is_idle() {
            let remaining = self.target.len().saturating_sub(self.typed.len());
            if remaining > 0 && remaining <= self.generation.pregenerate_threshold {
                self.generation.pending = true;
                let request = self.generation.request();
                debug!(remaining, "requesting continuation");
                return Some(Command::StartGeneration(request));
            }
        }

        None
    }

    fn on_char(&mut self, c: char, now: Instant) -> Option<Command> {
        if !self.typo.accepts_input(&self.policy) {
            debug!("input blocked until typo is cleared");
            return None;
        }
        if self.typed.len() >= self.target.len() {
            debug!("no text left to type, waiting");
            return None;
        }

        let pos = self.typed.len();
        self.typed.push(c);

        if let Phase::Active(clock) = &mut self.phase {
            let latency = now.saturating_duration_since(clock.last_keystroke);
            clock.last_keystroke = now;
            self.keystroke_latencies.push(latency);
        }

        let mut command = None;
        if c != self.target[pos] {
            self.error_count += 1;
            self.word_errors.mark(pos);
            command = self
                .typo
                .on_mismatch(&self.policy, now)
                .map(|delay| Command::ScheduleFlashClear { delay, started: now });
        }

        self.detect_completed_word();
        self.check_sentence_boundary();
        command
    }

    /// Drops the last typed character. The error tally is left untouched.
    fn on_backspace(&mut self) {
        self.typed.pop();
        self.typo.on_backspace();
    }

    fn on_generation_complete(&mut self, text: String) {
        if !self.generation.pending {
            debug!("discarding continuation nobody asked for");
            return;
        }

        let text = text.trim();
        if text.is_empty() {
            self.on_generation_failed("empty continuation");
            return;
        }

        info!(chars = text.chars().count(), "continuation ready");
        self.target.push(' ');
        self.target.extend(text.chars());
        self.generation.ready_text = Some(text.to_string());
        self.generation.pending = false;

        self.check_sentence_boundary();
    }

    fn on_generation_failed(&mut self, reason: &str) {
        warn!(reason, "continuation failed, carrying on with current text");
        self.generation.pending = false;
        self.generation.ready_text = None;

        self.check_sentence_boundary();
    }

    fn detect_completed_word(&mut self) {
        let typed_len = self.typed.len();
        if typed_len == 0 || typed_len <= self.last_word_end {
            return;
        }

        let at_boundary = self.typed[typed_len - 1] == ' ' || typed_len == self.target.len();
        if !at_boundary {
            return;
        }

        let mut start = self.last_word_end;
        while start < typed_len && self.typed[start] == ' ' {
            start += 1;
        }
        let mut end = typed_len;
        if self.typed[end - 1] == ' ' {
            end -= 1;
        }

        if start < end {
            let target_end = end.min(self.target.len());
            let mut target_start = start.min(target_end);
            while target_start < target_end && self.target[target_start] == ' ' {
                target_start += 1;
            }
            let mut target_stop = target_end;
            if target_stop > target_start && self.target[target_stop - 1] == ' ' {
                target_stop -= 1;
            }

            if target_start < target_stop {
                let typed_word: String = self.typed[start..end].iter().collect();
                let target_word: String = self.target[target_start..target_stop].iter().collect();

                if self.word_errors.any_in(start..end) || typed_word != target_word {
                    self.note_problem_word(target_word);
                }
            }
        }

        self.last_word_end = typed_len;
    }

    fn note_problem_word(&mut self, word: String) {
        if self.current_problem_words.len() < MAX_PROBLEM_WORDS
            && !self.current_problem_words.contains(&word)
        {
            debug!(%word, "problem word");
            self.current_problem_words.push(word);
        }
    }

    fn check_sentence_boundary(&mut self) {
        if !self.is_active() || self.typed.len() < self.sentence_end {
            return;
        }

        if !self.generation.enabled {
            self.complete();
            return;
        }

        if let Some(next) = self.generation.ready_text.take() {
            self.advance_sentence(next);
        } else if self.generation.pending {
            debug!("sentence finished, waiting for continuation");
        } else if self.typed.len() >= self.target.len() {
            debug!("text exhausted");
            self.complete();
        }
    }

    fn advance_sentence(&mut self, next: String) {
        let end = self.sentence_end;
        let typed: String = self.typed[..end].iter().collect();
        let target: String = self.target[..end].iter().collect();
        let analysis = analyze(&typed, &target);
        debug!(
            mismatches = char_mismatch_count(&typed, &target),
            error_positions = self.word_errors.len(),
            "sentence finished"
        );

        for c in analysis.error_chars {
            *self.generation.accumulated_error_chars.entry(c).or_insert(0) += 1;
        }
        self.generation
            .accumulated_error_words
            .extend(analysis.problem_words);

        self.generation.last_context_sentence = next;
        self.sentence_end = self.target.len();
        self.current_problem_words.clear();
        self.word_errors.clear();
        self.last_word_end = self.typed.len();
        debug!(sentence_end = self.sentence_end, "moved to next sentence");
    }

    fn complete(&mut self) {
        let clock = match self.phase {
            Phase::Active(clock) => clock,
            _ => return,
        };

        let duration = clock
            .last_keystroke
            .saturating_duration_since(clock.started_at);
        let record = TypingSession {
            started_at: clock.started_wall,
            wpm: final_wpm(self.typed.len(), duration),
            accuracy: final_accuracy(self.typed.len(), self.error_count),
            errors: self.error_count,
            duration,
        };

        info!(
            wpm = record.wpm,
            accuracy = record.accuracy,
            errors = record.errors,
            "session completed"
        );
        self.phase = Phase::Completed(record);
    }
}
