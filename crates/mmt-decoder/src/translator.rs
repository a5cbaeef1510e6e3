//! Producer side facade: split, schedule, wait, join

use crate::error::{TranslateError, TranslateResult};
use crate::joiner::TranslationJoiner;
use mmt_scheduler::{Priority, Scheduler, TranslationLock, TranslationSplit};
use mmt_types::{LanguageDirection, ScoreEntry, Sentence, Translation};
use std::sync::Arc;
use std::time::Duration;

/// Submits requests to a scheduler and waits for their translation
#[derive(Clone)]
pub struct Translator {
    scheduler: Arc<Scheduler>,
    timeout: Option<Duration>,
}

impl Translator {
    /// Create a translator that waits without limit
    pub fn new(scheduler: Arc<Scheduler>) -> Self {
        Self {
            scheduler,
            timeout: None,
        }
    }

    /// Expire splits and stop waiting after `timeout`
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Configured request timeout
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Translate `sentences` as one job and join the results in order
    pub fn translate(
        &self,
        direction: LanguageDirection,
        sentences: Vec<Sentence>,
        suggestions: Option<Vec<ScoreEntry>>,
        priority: Priority,
    ) -> TranslateResult<Translation> {
        if sentences.is_empty() {
            return Ok(Translation::empty());
        }

        let splits: Vec<_> = sentences
            .into_iter()
            .map(|sentence| self.split(TranslationSplit::new(sentence, priority)))
            .collect();

        let lock = self
            .scheduler
            .schedule(direction, splits.clone(), suggestions)?;
        self.wait(&lock)?;
        Ok(TranslationJoiner::join(&splits)?)
    }

    /// Translate multi-line text, one sentence per non-blank line
    pub fn translate_text(
        &self,
        direction: LanguageDirection,
        text: &str,
        priority: Priority,
    ) -> TranslateResult<Translation> {
        let sentences = text
            .lines()
            .map(Sentence::from_text)
            .filter(Sentence::has_words)
            .collect();
        self.translate(direction, sentences, None, priority)
    }

    /// Align `sentence` against a known `reference` translation
    pub fn align(
        &self,
        direction: LanguageDirection,
        sentence: Sentence,
        reference: Vec<String>,
        priority: Priority,
    ) -> TranslateResult<Translation> {
        let split = self.split(TranslationSplit::alignment(sentence, reference, priority));
        let lock = self
            .scheduler
            .schedule_alignment(direction, Arc::clone(&split))?;
        self.wait(&lock)?;
        Ok(TranslationJoiner::join(&[split])?)
    }

    fn split(&self, split: TranslationSplit) -> Arc<TranslationSplit> {
        let split = match self.timeout {
            Some(timeout) => split.with_timeout(timeout),
            None => split,
        };
        Arc::new(split)
    }

    fn wait(&self, lock: &TranslationLock) -> TranslateResult<()> {
        match self.timeout {
            Some(timeout) if !lock.wait_timeout(timeout) => Err(TranslateError::Timeout(timeout)),
            Some(_) => Ok(()),
            None => {
                lock.wait();
                Ok(())
            }
        }
    }
}
