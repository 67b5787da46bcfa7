//! Error types for cipher mode operations

use thiserror::Error;

use crate::modes::Direction;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CipherModeError {
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Mode requires an IV or counter")]
    MissingIv,

    #[error("Invalid IV length (expected {expected} bytes, got {actual})")]
    InvalidIvLength { expected: usize, actual: usize },

    #[error("Input length {len} is not a multiple of the block size {block_size}")]
    InvalidLength { len: usize, block_size: usize },

    /// Deliberately carries no detail about which check failed.
    #[error("Padding error")]
    InvalidPadding,

    #[error("Block size mismatch (expected {expected} bytes, got {actual})")]
    BlockSizeMismatch { expected: usize, actual: usize },

    #[error("Cipher already bound to {bound:?}, cannot {requested:?}")]
    DirectionMismatch {
        bound: Direction,
        requested: Direction,
    },

    #[error("Operation not supported: {0}")]
    UnsupportedOperation(&'static str),

    #[error("MAC tag mismatch")]
    InvalidTag,
}

pub type Result<T> = std::result::Result<T, CipherModeError>;
