/// Shortest time any single word is given.
pub const MIN_WORD_SECS: f64 = 0.2;
/// Length of a word's entrance animation in dynamic mode.
pub const WORD_ENTRANCE_SECS: f64 = 0.3;

/// Seconds allotted to each word of a scene.
pub fn word_duration(scene_duration: f64, word_count: usize) -> f64 {
    let d = if scene_duration.is_finite() {
        scene_duration.max(0.0)
    } else {
        0.0
    };
    if word_count == 0 {
        return d.max(MIN_WORD_SECS);
    }
    (d / word_count as f64).max(MIN_WORD_SECS)
}

/// Unclamped index of the word being spoken at `elapsed`.
fn raw_word_index(elapsed: f64, word_duration: f64) -> usize {
    if !elapsed.is_finite() || elapsed <= 0.0 || word_duration <= 0.0 {
        return 0;
    }
    (elapsed / word_duration).floor() as usize
}

/// Current word, clamped to the last word.
pub fn current_word_index(elapsed: f64, word_duration: f64, word_count: usize) -> usize {
    raw_word_index(elapsed, word_duration).min(word_count.saturating_sub(1))
}

/// Active chunk, clamped to the last chunk.
pub fn chunk_index(
    elapsed: f64,
    word_duration: f64,
    words_per_chunk: usize,
    word_count: usize,
) -> usize {
    let per = words_per_chunk.max(1);
    let chunks = word_count.div_ceil(per);
    (raw_word_index(elapsed, word_duration) / per).min(chunks.saturating_sub(1))
}

/// Per-word state in dynamic mode.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum WordState {
    /// Not spoken yet.
    Inactive,
    /// Current word inside its entrance window; `progress` in `[0, 1)`.
    Entering { progress: f64 },
    /// Current word past its entrance window.
    Active,
    /// Already spoken.
    Settled,
}

/// State of word `index` given the current word and time since the current word started.
pub fn word_state(index: usize, current: usize, word_time: f64) -> WordState {
    match index.cmp(&current) {
        std::cmp::Ordering::Less => WordState::Settled,
        std::cmp::Ordering::Greater => WordState::Inactive,
        std::cmp::Ordering::Equal => {
            if word_time < WORD_ENTRANCE_SECS {
                WordState::Entering {
                    progress: (word_time / WORD_ENTRANCE_SECS).clamp(0.0, 1.0),
                }
            } else {
                WordState::Active
            }
        }
    }
}

/// Dynamic caption timing for one frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WordClock {
    pub word_duration: f64,
    pub current_word: usize,
    pub chunk: usize,
    /// `elapsed - current_word * word_duration`.
    pub word_time: f64,
    /// Progress through the current word's full duration, `[0, 1]`.
    pub word_progress: f64,
}

impl WordClock {
    pub fn at(elapsed: f64, scene_duration: f64, word_count: usize, words_per_chunk: usize) -> Self {
        let wd = word_duration(scene_duration, word_count);
        let current = current_word_index(elapsed, wd, word_count);
        let elapsed = if elapsed.is_finite() { elapsed.max(0.0) } else { 0.0 };
        let word_time = elapsed - current as f64 * wd;
        Self {
            word_duration: wd,
            current_word: current,
            chunk: chunk_index(elapsed, wd, words_per_chunk, word_count),
            word_time,
            word_progress: (word_time / wd).clamp(0.0, 1.0),
        }
    }

    pub fn state_of(&self, index: usize) -> WordState {
        word_state(index, self.current_word, self.word_time)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/caption/chunk.rs"]
mod tests;
