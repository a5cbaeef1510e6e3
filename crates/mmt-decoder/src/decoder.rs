//! Decoder interface and the echo reference decoder

use crate::error::{DecoderError, DecoderResult};
use mmt_types::{Alignment, LanguageDirection, ScoreEntry, Sentence, Translation};
use std::thread;
use std::time::Duration;

/// A translation engine instance.
///
/// Instances are not shared: a worker checks one out of the `DecoderPool`
/// and has exclusive use of it for the duration of a job.
pub trait Decoder: Send {
    /// Translate a batch, returning one translation per sentence in order
    fn translate(
        &mut self,
        direction: &LanguageDirection,
        sentences: &[&Sentence],
        suggestions: Option<&[ScoreEntry]>,
    ) -> DecoderResult<Vec<Translation>>;

    /// Force-decode each sentence against its reference and return the
    /// reference with a word alignment
    fn align(
        &mut self,
        direction: &LanguageDirection,
        sentences: &[&Sentence],
        references: &[&[String]],
    ) -> DecoderResult<Vec<Translation>>;
}

/// Decoder that copies the source to the target.
///
/// A perfect top translation-memory match for a sentence is returned verbatim.
#[derive(Debug, Clone, Default)]
pub struct EchoDecoder {
    delay: Duration,
}

impl EchoDecoder {
    /// Create an echo decoder
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep for `delay` on every batch, to simulate decoding cost
    pub fn with_delay(delay: Duration) -> Self {
        Self { delay }
    }

    fn simulate_work(&self) {
        if !self.delay.is_zero() {
            thread::sleep(self.delay);
        }
    }
}

/// Points mapping every target word to a source word, preserving order
fn monotone_alignment(source_len: usize, target_len: usize) -> Alignment {
    if source_len == 0 || target_len == 0 {
        return Alignment::default();
    }

    let points = (0..target_len)
        .map(|target| (target * source_len / target_len, target))
        .collect();
    Alignment::new(points, 1.0)
}

/// The top suggestion, if it is a perfect match for `sentence`.
///
/// Suggestions are shared by every sentence of a job, so the top entry must
/// also have the sentence as its source.
fn perfect_match<'a>(sentence: &Sentence, suggestions: &'a [ScoreEntry]) -> Option<&'a ScoreEntry> {
    suggestions
        .first()
        .filter(|top| top.is_perfect_match() && top.sentence == sentence.words())
}

impl Decoder for EchoDecoder {
    fn translate(
        &mut self,
        _direction: &LanguageDirection,
        sentences: &[&Sentence],
        suggestions: Option<&[ScoreEntry]>,
    ) -> DecoderResult<Vec<Translation>> {
        self.simulate_work();

        let translations = sentences
            .iter()
            .map(|sentence| {
                let words = match suggestions.and_then(|s| perfect_match(sentence, s)) {
                    Some(entry) => entry.translation.clone(),
                    None => sentence.words().to_vec(),
                };
                let alignment = monotone_alignment(sentence.len(), words.len());
                Translation::new(words).with_alignment(alignment)
            })
            .collect();
        Ok(translations)
    }

    fn align(
        &mut self,
        _direction: &LanguageDirection,
        sentences: &[&Sentence],
        references: &[&[String]],
    ) -> DecoderResult<Vec<Translation>> {
        if sentences.len() != references.len() {
            return Err(DecoderError::MissingReference);
        }
        self.simulate_work();

        let translations = sentences
            .iter()
            .zip(references)
            .map(|(sentence, reference)| {
                let alignment = monotone_alignment(sentence.len(), reference.len());
                Translation::new(reference.to_vec()).with_alignment(alignment)
            })
            .collect();
        Ok(translations)
    }
}
