//! OFB (Output Feedback) mode implementation

use zeroize::Zeroize;

use crate::{error::CipherModeError, utils, BlockCipher, Result};

use super::CipherModes;

/// OFB keystream state.
///
/// Algorithm:
/// 1. O_0 = IV
/// 2. O_i = E(K, O_{i-1}) for i = 1, 2, ..., n
/// 3. C_i = P_i ⊕ O_i
pub struct OfbState {
    feedback: Vec<u8>,
    pos: usize,
}

impl OfbState {
    pub fn new(iv: &[u8], block_size: usize) -> Result<Self> {
        if iv.len() != block_size {
            return Err(CipherModeError::InvalidIvLength {
                expected: block_size,
                actual: iv.len(),
            });
        }
        Ok(Self {
            feedback: iv.to_vec(),
            pos: block_size,
        })
    }

    /// XORs the keystream into `data`; encryption and decryption are the same.
    pub fn apply<C: BlockCipher>(&mut self, cipher: &C, data: &mut [u8]) -> Result<()> {
        let mut offset = 0;
        while offset < data.len() {
            if self.pos == C::BLOCK_SIZE {
                cipher.encrypt_block(&mut self.feedback)?;
                self.pos = 0;
            }

            let take = (C::BLOCK_SIZE - self.pos).min(data.len() - offset);
            utils::xor_in_place(
                &mut data[offset..offset + take],
                &self.feedback[self.pos..self.pos + take],
            );

            self.pos += take;
            offset += take;
        }
        Ok(())
    }
}

impl Drop for OfbState {
    fn drop(&mut self) {
        self.feedback.zeroize();
    }
}

impl CipherModes {
    /// OFB mode encryption
    pub fn ofb_encrypt<C: BlockCipher>(cipher: &C, plaintext: &[u8], iv: &[u8]) -> Result<Vec<u8>> {
        let mut state = OfbState::new(iv, C::BLOCK_SIZE)?;
        let mut ciphertext = plaintext.to_vec();
        state.apply(cipher, &mut ciphertext)?;
        Ok(ciphertext)
    }

    /// OFB mode decryption
    ///
    /// Since OFB is a stream cipher mode, decryption is identical to encryption.
    pub fn ofb_decrypt<C: BlockCipher>(cipher: &C, ciphertext: &[u8], iv: &[u8]) -> Result<Vec<u8>> {
        Self::ofb_encrypt(cipher, ciphertext, iv)
    }
}
