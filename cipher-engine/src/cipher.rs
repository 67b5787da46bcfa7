//! Generic block cipher traits

use crate::error::{CipherModeError, Result};

/// A keyed, fixed-size block permutation.
///
/// Implementations transform exactly [`BlockCipher::BLOCK_SIZE`] bytes in
/// place and must reject any other length with
/// [`CipherModeError::BlockSizeMismatch`]. The mode engine never relies on
/// that rejection; it is a guard against programming errors.
pub trait BlockCipher {
    /// Block size in bytes.
    const BLOCK_SIZE: usize;

    /// Encrypts a single block in place
    fn encrypt_block(&self, block: &mut [u8]) -> Result<()>;

    /// Decrypts a single block in place
    fn decrypt_block(&self, block: &mut [u8]) -> Result<()>;

    /// Returns the block size of the cipher
    fn block_size(&self) -> usize {
        Self::BLOCK_SIZE
    }
}

/// Construction of a primitive from raw key material.
///
/// `Params` carries primitive-specific knobs (such as a round count);
/// primitives without any use `()`.
pub trait KeyInit: BlockCipher + Sized {
    type Params: Default;

    /// Builds the primitive, validating key length and parameters.
    fn with_params(key: &[u8], params: &Self::Params) -> Result<Self>;

    /// Builds the primitive with default parameters.
    fn new(key: &[u8]) -> Result<Self> {
        Self::with_params(key, &Self::Params::default())
    }
}

/// Rejects blocks of the wrong size before they reach a primitive.
pub(crate) fn check_block_len(expected: usize, block: &[u8]) -> Result<()> {
    if block.len() != expected {
        return Err(CipherModeError::BlockSizeMismatch {
            expected,
            actual: block.len(),
        });
    }
    Ok(())
}
