//! Core error type.
//!
//! Domain crates define their own error enums; this one covers only the
//! configuration and parsing helpers that live in `rn-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("parse error: {0}")]
    Parse(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
