//! Sentences, translations and suggestions

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// A tokenized sentence
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sentence {
    words: Vec<String>,
}

impl Sentence {
    /// Create a sentence from already tokenized words
    pub fn new(words: Vec<String>) -> Self {
        Self { words }
    }

    /// Tokenize text on whitespace
    pub fn from_text(text: &str) -> Self {
        Self {
            words: text.split_whitespace().map(str::to_string).collect(),
        }
    }

    /// Sentence words
    pub fn words(&self) -> &[String] {
        &self.words
    }

    /// Number of words
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// True if the sentence has no words
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// True if there is anything to translate
    pub fn has_words(&self) -> bool {
        !self.words.is_empty()
    }
}

impl fmt::Display for Sentence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.words.join(" "))
    }
}

/// Word alignment between a source sentence and its translation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Alignment {
    /// (source index, target index) pairs
    pub points: Vec<(usize, usize)>,
    /// Alignment confidence in [0, 1]
    pub score: f32,
}

impl Alignment {
    /// Create a new alignment
    pub fn new(points: Vec<(usize, usize)>, score: f32) -> Self {
        Self { points, score }
    }

    /// Number of alignment points
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// True if there are no alignment points
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Decoder output for one sentence (or a joined request)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Translation {
    /// Target words
    pub words: Vec<String>,
    /// Optional word alignment
    pub alignment: Option<Alignment>,
    /// Deepest queue seen by any split of the request
    pub queue_length: usize,
    /// Time spent waiting in the scheduler queue
    pub queue_time: Duration,
    /// Time spent in the decoder
    pub decode_time: Duration,
}

impl Translation {
    /// Create a translation without alignment
    pub fn new(words: Vec<String>) -> Self {
        Self {
            words,
            ..Self::default()
        }
    }

    /// Translation of a sentence with no words
    pub fn empty() -> Self {
        Self::default()
    }

    /// Attach a word alignment
    pub fn with_alignment(mut self, alignment: Alignment) -> Self {
        self.alignment = Some(alignment);
        self
    }

    /// True if an alignment is attached
    pub fn has_alignment(&self) -> bool {
        self.alignment.is_some()
    }

    /// Space-joined target text
    pub fn text(&self) -> String {
        self.words.join(" ")
    }
}

/// A translation-memory match used to bias the decoder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreEntry {
    /// Memory the entry comes from
    pub memory: u64,
    /// Source side words
    pub sentence: Vec<String>,
    /// Target side words
    pub translation: Vec<String>,
    /// Match score in [0, 1]
    pub score: f32,
}

impl ScoreEntry {
    /// Create a new suggestion
    pub fn new(memory: u64, sentence: Vec<String>, translation: Vec<String>, score: f32) -> Self {
        Self {
            memory,
            sentence,
            translation,
            score,
        }
    }

    /// True for an exact memory match
    pub fn is_perfect_match(&self) -> bool {
        self.score >= 1.0
    }
}
