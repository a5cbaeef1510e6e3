//! Reassembles per-split results into one request translation

use mmt_scheduler::{TranslationError, TranslationSplit};
use mmt_types::{Alignment, Translation};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Joins the splits of one request back together
pub struct TranslationJoiner;

impl TranslationJoiner {
    /// Concatenate the split translations in order.
    ///
    /// The first failed split fails the whole join. The points of every
    /// aligned split are merged with source and target offsets; splits without
    /// an alignment only shift the offsets. The merged score is the mean of the
    /// split scores weighted by source plus target length, over aligned splits.
    pub fn join(splits: &[Arc<TranslationSplit>]) -> Result<Translation, TranslationError> {
        let mut words = Vec::new();
        let mut alignment = AlignmentJoiner::default();

        for split in splits {
            let translation = match split.result() {
                Some(Ok(translation)) => translation,
                Some(Err(err)) => return Err(err.clone()),
                None => return Err(TranslationError::Decoder("split not completed".into())),
            };

            alignment.append(split.sentence().len(), translation);
            words.extend(translation.words.iter().cloned());
        }

        let stats = RequestStats::collect(splits);
        Ok(Translation {
            words,
            alignment: alignment.build(),
            queue_length: stats.queue_length,
            queue_time: stats.queue_time,
            decode_time: stats.decode_time,
        })
    }
}

#[derive(Debug, Default)]
struct AlignmentJoiner {
    points: Vec<(usize, usize)>,
    source_offset: usize,
    target_offset: usize,
    score: f32,
    score_norm: usize,
}

impl AlignmentJoiner {
    fn append(&mut self, source_len: usize, translation: &Translation) {
        let target_len = translation.words.len();

        if let Some(alignment) = &translation.alignment {
            let (source_offset, target_offset) = (self.source_offset, self.target_offset);
            self.points.extend(
                alignment
                    .points
                    .iter()
                    .map(|&(s, t)| (s + source_offset, t + target_offset)),
            );
            self.score += alignment.score * (source_len + target_len) as f32;
            self.score_norm += source_len + target_len;
        }

        self.source_offset += source_len;
        self.target_offset += target_len;
    }

    /// `None` when no split contributed a point
    fn build(self) -> Option<Alignment> {
        if self.points.is_empty() {
            return None;
        }
        let score = if self.score_norm > 0 {
            self.score / self.score_norm as f32
        } else {
            0.0
        };
        Some(Alignment::new(self.points, score))
    }
}

/// Request level timing derived from split telemetry
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct RequestStats {
    queue_length: usize,
    queue_time: Duration,
    decode_time: Duration,
}

impl RequestStats {
    fn collect(splits: &[Arc<TranslationSplit>]) -> Self {
        let mut queue_length = 0;
        let mut first_enter: Option<Instant> = None;
        let mut last_end: Option<Instant> = None;
        let mut compute = Duration::ZERO;
        let mut decode = Duration::ZERO;

        for split in splits {
            let timings = split.timings();
            queue_length = queue_length.max(timings.queue_size);

            let (Some(enter), Some(end)) = (timings.queue_enter, timings.translation_end) else {
                continue;
            };
            first_enter = Some(first_enter.map_or(enter, |first| first.min(enter)));
            last_end = Some(last_end.map_or(end, |last| last.max(end)));
            compute += end.saturating_duration_since(enter);

            if let Some(begin) = timings.translation_begin {
                decode += end.saturating_duration_since(begin);
            }
        }

        let real = match (first_enter, last_end) {
            (Some(enter), Some(end)) => end.saturating_duration_since(enter),
            _ => Duration::ZERO,
        };

        // Splits of a request run in parallel: scale the decode share of the
        // summed compute time onto the wall-clock time
        let decode_time = if compute.is_zero() {
            Duration::ZERO
        } else {
            real.mul_f64(decode.as_secs_f64() / compute.as_secs_f64())
        };

        Self {
            queue_length,
            queue_time: real.saturating_sub(decode_time),
            decode_time,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mmt_scheduler::{Priority, Scheduler};
    use mmt_types::{LanguageDirection, Sentence};

    fn split(text: &str) -> Arc<TranslationSplit> {
        Arc::new(TranslationSplit::new(Sentence::from_text(text), Priority::Normal))
    }

    fn aligned(text: &str, points: Vec<(usize, usize)>, score: f32) -> Translation {
        Translation::new(text.split_whitespace().map(str::to_string).collect())
            .with_alignment(Alignment::new(points, score))
    }

    #[test]
    fn test_join_words_and_alignment() {
        let splits = vec![split("a b"), split(""), split("c d e")];
        splits[0].set_translation(aligned("x y", vec![(0, 1), (1, 0)], 1.0));
        splits[1].set_translation(Translation::empty());
        splits[2].set_translation(aligned("z", vec![(2, 0)], 0.5));

        let joined = TranslationJoiner::join(&splits).unwrap();
        assert_eq!(joined.text(), "x y z");

        let alignment = joined.alignment.unwrap();
        assert_eq!(alignment.points, vec![(0, 1), (1, 0), (4, 2)]);
        // (1.0 * (2 + 2) + 0.5 * (3 + 1)) / 8
        assert!((alignment.score - 0.75).abs() < 1e-6);
    }

    #[test]
    fn test_join_keeps_partial_alignment() {
        let splits = vec![split("a b"), split("c d e"), split("f")];
        splits[0].set_translation(aligned("x y", vec![(0, 0), (1, 1)], 0.8));
        splits[1].set_translation(Translation::new(vec!["u".into(), "v".into()]));
        splits[2].set_translation(aligned("w", vec![(0, 0)], 0.2));

        let joined = TranslationJoiner::join(&splits).unwrap();
        assert_eq!(joined.text(), "x y u v w");

        // The unaligned split contributes no points but shifts the offsets
        let alignment = joined.alignment.unwrap();
        assert_eq!(alignment.points, vec![(0, 0), (1, 1), (5, 4)]);
        // Weighted over aligned splits only: (0.8 * 4 + 0.2 * 2) / 6
        assert!((alignment.score - 0.6).abs() < 1e-6);
    }

    #[test]
    fn test_join_without_alignment() {
        let splits = vec![split("a"), split("b")];
        splits[0].set_translation(Translation::new(vec!["x".into()]));
        splits[1].set_translation(Translation::new(vec!["y".into()]));

        let joined = TranslationJoiner::join(&splits).unwrap();
        assert_eq!(joined.text(), "x y");
        assert!(!joined.has_alignment());
    }

    #[test]
    fn test_join_fails_on_split_error() {
        let splits = vec![split("a"), split("b")];
        splits[0].set_translation(Translation::new(vec!["x".into()]));
        splits[1].set_exception(TranslationError::ShutDown);

        assert_eq!(TranslationJoiner::join(&splits), Err(TranslationError::ShutDown));
        assert!(TranslationJoiner::join(&[split("pending")]).is_err());
    }

    #[test]
    fn test_request_stats() {
        let scheduler = Scheduler::with_defaults();
        scheduler
            .schedule(LanguageDirection::new("en", "it"), vec![split("warm up")], None)
            .unwrap();

        let splits = vec![split("a"), split("b")];
        scheduler
            .schedule(LanguageDirection::new("en", "it"), splits.clone(), None)
            .unwrap();

        let start = Instant::now();
        for split in &splits {
            split.on_translation_begin(start + Duration::from_millis(10));
            split.on_translation_end(start + Duration::from_millis(30));
            split.set_translation(Translation::new(vec!["t".into()]));
        }

        let joined = TranslationJoiner::join(&splits).unwrap();
        assert_eq!(joined.queue_length, 1);
        assert!(joined.decode_time > Duration::ZERO);
        assert!(joined.decode_time <= Duration::from_millis(30));
        assert!(joined.queue_time >= Duration::from_millis(9));

        let timings = splits[0].timings();
        let real = timings.translation_end.unwrap() - timings.queue_enter.unwrap();
        assert_eq!(joined.queue_time + joined.decode_time, real);
    }
}
