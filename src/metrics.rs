use std::time::Duration;

/// Characters per standard word.
pub const CHARS_PER_WORD: f32 = 5.0;

/// Live words-per-minute. Returns 0 until a full second has elapsed.
pub fn current_wpm(typed_len: usize, elapsed: Duration) -> f32 {
    if elapsed < Duration::from_secs(1) {
        return 0.0;
    }

    let words = typed_len as f32 / CHARS_PER_WORD;
    let minutes = elapsed.as_secs_f32() / 60.0;
    words / minutes
}

/// Live accuracy in percent. Returns 0 for an empty buffer.
pub fn current_accuracy(typed_len: usize, error_count: usize) -> f32 {
    if typed_len == 0 {
        return 0.0;
    }

    let correct = typed_len.saturating_sub(error_count);
    100.0 * correct as f32 / typed_len as f32
}

/// Final WPM over the span between session start and the last keystroke.
pub fn final_wpm(typed_len: usize, active_duration: Duration) -> f32 {
    current_wpm(typed_len, active_duration)
}

pub fn final_accuracy(typed_len: usize, error_count: usize) -> f32 {
    current_accuracy(typed_len, error_count)
}

pub fn mean(data: &[f64]) -> Option<f64> {
    let sum = data.iter().sum::<f64>();
    let count = data.len();

    match count {
        positive if positive > 0 => Some(sum / count as f64),
        _ => None,
    }
}
