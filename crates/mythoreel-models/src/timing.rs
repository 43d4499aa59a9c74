//! Word-level timing data used for subtitle captioning.

use serde::{Deserialize, Serialize};

/// One word with its start/end timestamps in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordTiming {
    /// The word text.
    pub text: String,
    /// Start time in seconds.
    pub start: f64,
    /// End time in seconds.
    pub end: f64,
}

/// Forced-alignment result: word timestamps recovered by matching the
/// narration audio against its known script text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ForcedAlignment {
    /// Words in narration order; `start` values are non-decreasing.
    pub words: Vec<WordTiming>,
}

impl ForcedAlignment {
    /// Words with non-empty text, whitespace-only entries skipped.
    pub fn spoken_words(&self) -> impl Iterator<Item = &WordTiming> {
        self.words.iter().filter(|w| !w.text.trim().is_empty())
    }
}
