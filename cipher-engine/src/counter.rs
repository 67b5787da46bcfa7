//! Counter blocks for CTR mode
//!
//! A counter is advanced destructively: every keystream block consumes the
//! current value and moves the counter forward. Encrypting and decrypting
//! the same stream therefore needs two counters that start from the same
//! value, never one counter shared by both sides.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use zeroize::Zeroize;

use crate::error::{CipherModeError, Result};

/// Source of CTR counter blocks.
pub trait Counter {
    /// The current counter block.
    fn current(&self) -> Vec<u8>;

    /// Moves the counter to its next value.
    fn advance(&mut self);
}

/// Big-endian counter that wraps around at `2^(8 * len)`.
#[derive(Clone, PartialEq, Eq)]
pub struct BlockCounter {
    value: Vec<u8>,
}

impl BlockCounter {
    /// Counter starting at `initial`; its length fixes the block size.
    pub fn new(initial: &[u8]) -> Result<Self> {
        if initial.is_empty() {
            return Err(CipherModeError::InvalidParameter(
                "counter block cannot be empty".to_string(),
            ));
        }
        Ok(Self {
            value: initial.to_vec(),
        })
    }

    /// Counter of `block_size` bytes holding `value` in its low 64 bits.
    pub fn from_u64(value: u64, block_size: usize) -> Result<Self> {
        if block_size == 0 {
            return Err(CipherModeError::InvalidParameter(
                "counter block cannot be empty".to_string(),
            ));
        }
        let mut block = vec![0u8; block_size];
        let be = value.to_be_bytes();
        let copy_len = 8.min(block_size);
        block[block_size - copy_len..].copy_from_slice(&be[8 - copy_len..]);
        Ok(Self { value: block })
    }

    /// `nonce` in the leading bytes, a 32-bit big-endian block index in the
    /// trailing four.
    pub fn with_nonce(nonce: &[u8], counter: u32, block_size: usize) -> Result<Self> {
        if block_size < 4 || nonce.len() > block_size - 4 {
            return Err(CipherModeError::InvalidParameter(
                "nonce too long for block size".to_string(),
            ));
        }
        let mut block = vec![0u8; block_size];
        block[..nonce.len()].copy_from_slice(nonce);
        block[block_size - 4..].copy_from_slice(&counter.to_be_bytes());
        Ok(Self { value: block })
    }

    pub fn len(&self) -> usize {
        self.value.len()
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    /// Wraps the counter for deliberate sharing between ciphers.
    pub fn shared(self) -> SharedCounter<Self> {
        SharedCounter::new(self)
    }
}

impl Counter for BlockCounter {
    fn current(&self) -> Vec<u8> {
        self.value.clone()
    }

    fn advance(&mut self) {
        for byte in self.value.iter_mut().rev() {
            let (next, overflow) = byte.overflowing_add(1);
            *byte = next;
            if !overflow {
                break;
            }
        }
    }
}

impl fmt::Debug for BlockCounter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("BlockCounter")
            .field(&hex::encode(&self.value))
            .finish()
    }
}

impl fmt::Display for BlockCounter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(&self.value))
    }
}

impl Drop for BlockCounter {
    fn drop(&mut self) {
        self.value.zeroize();
    }
}

/// A counter shared by reference between several ciphers.
///
/// Every holder advances the same underlying value, so ciphers sharing one
/// stay in lockstep. This is an intentional tool for custom protocols; it is
/// never correct for the encrypting and decrypting side of one stream.
/// Not `Send`: sharing across threads does not compile.
pub struct SharedCounter<C> {
    inner: Rc<RefCell<C>>,
}

impl<C: Counter> SharedCounter<C> {
    pub fn new(counter: C) -> Self {
        Self {
            inner: Rc::new(RefCell::new(counter)),
        }
    }

    /// Runs `f` with read access to the underlying counter.
    pub fn with<R>(&self, f: impl FnOnce(&C) -> R) -> R {
        f(&self.inner.borrow())
    }
}

impl<C> Clone for SharedCounter<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<C: Counter> Counter for SharedCounter<C> {
    fn current(&self) -> Vec<u8> {
        self.inner.borrow().current()
    }

    fn advance(&mut self) {
        self.inner.borrow_mut().advance();
    }
}
