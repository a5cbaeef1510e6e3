//! # mmt-types
//!
//! Shared data model for MMT.
//!
//! Types:
//! - `LanguageDirection`: source/target language pair of a request
//! - `Sentence`: tokenized input unit handed to a decoder
//! - `Translation`: decoder output plus request-level timing stats
//! - `Alignment`: word alignment between a sentence and its translation
//! - `ScoreEntry`: translation-memory suggestion used to bias the decoder

#![warn(missing_docs)]
#![warn(clippy::all)]

mod language;
mod model;

pub use language::{LanguageDirection, ParseDirectionError};
pub use model::{Alignment, ScoreEntry, Sentence, Translation};
