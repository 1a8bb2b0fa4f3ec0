//! Recoverable errors of the library surface.
//!
//! Malformed input never ends up here: it is reported through `error` tokens. These errors
//! cover configuration and the persistence of resumable state.

use config::ConfigError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LexerError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("resumable state could not be encoded or decoded: {0}")]
    StateEncoding(#[from] serde_json::Error),

    #[error("invalid tag prefix `{0}`: expected a letter followed by letters, digits, `_`, `-` or `.`")]
    InvalidTagPrefix(String),

    #[error("{0} tag prefixes configured, at most 32 are supported")]
    TooManyTagPrefixes(usize),

    #[error("chunk size must be positive")]
    ZeroChunkSize,

    #[error("edit removing {removed} bytes at {offset} does not fit a document of {len} bytes")]
    InvalidEdit {
        offset: usize,
        removed: usize,
        len: usize,
    },
}
