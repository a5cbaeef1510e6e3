//! # mmt-decoder
//!
//! Worker side of the MMT translation pipeline.
//!
//! This crate provides:
//! - `Decoder`: the translation engine interface, with `EchoDecoder` as a reference engine
//! - `DecoderPool`: decoder instances checked out per job, warm by language direction
//! - `DecoderExecutor` / `ExecutorPool`: worker threads draining the scheduler
//! - `TranslationJoiner`: reassembles split results and request timing
//! - `Translator`: producer facade that schedules a request and waits for it

#![warn(missing_docs)]
#![warn(clippy::all)]

mod decoder;
mod error;
mod executor;
mod joiner;
mod pool;
mod translator;

pub use decoder::{Decoder, EchoDecoder};
pub use error::{DecoderError, DecoderResult, TranslateError, TranslateResult};
pub use executor::{
    DecoderExecutor, ExecutorPool, METRIC_DECODE_TIME, METRIC_SPLITS_EXPIRED, METRIC_SPLITS_FAILED,
    METRIC_SPLITS_TRANSLATED,
};
pub use joiner::TranslationJoiner;
pub use pool::{DecoderPool, PooledDecoder};
pub use translator::Translator;
