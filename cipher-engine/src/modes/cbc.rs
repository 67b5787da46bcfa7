//! CBC (Cipher Block Chaining) mode implementation

use zeroize::Zeroize;

use crate::{error::CipherModeError, utils, BlockCipher, Padding, Result};

use super::CipherModes;

/// CBC chain state: the previous ciphertext block, initially the IV.
///
/// An IV must never be reused for a second message under the same key;
/// doing so reveals whether two messages share a prefix.
pub struct CbcState {
    chain: Vec<u8>,
}

impl CbcState {
    pub fn new(iv: &[u8], block_size: usize) -> Result<Self> {
        if iv.len() != block_size {
            return Err(CipherModeError::InvalidIvLength {
                expected: block_size,
                actual: iv.len(),
            });
        }
        Ok(Self { chain: iv.to_vec() })
    }

    /// Encrypts aligned `data` in place, continuing the chain.
    pub fn encrypt_blocks<C: BlockCipher>(&mut self, cipher: &C, data: &mut [u8]) -> Result<()> {
        for block in data.chunks_exact_mut(C::BLOCK_SIZE) {
            utils::xor_in_place(block, &self.chain);
            cipher.encrypt_block(block)?;
            self.chain.copy_from_slice(block);
        }
        Ok(())
    }

    /// Decrypts aligned `data` in place, continuing the chain.
    pub fn decrypt_blocks<C: BlockCipher>(&mut self, cipher: &C, data: &mut [u8]) -> Result<()> {
        let mut saved = vec![0u8; C::BLOCK_SIZE];
        for block in data.chunks_exact_mut(C::BLOCK_SIZE) {
            saved.copy_from_slice(block);
            cipher.decrypt_block(block)?;
            utils::xor_in_place(block, &self.chain);
            std::mem::swap(&mut self.chain, &mut saved);
        }
        saved.zeroize();
        Ok(())
    }

    /// The current chain block.
    pub fn chain(&self) -> &[u8] {
        &self.chain
    }
}

impl Drop for CbcState {
    fn drop(&mut self) {
        self.chain.zeroize();
    }
}

impl CipherModes {
    /// CBC mode encryption
    pub fn cbc_encrypt<C: BlockCipher>(
        cipher: &C,
        plaintext: &[u8],
        iv: &[u8],
        padding: Padding,
    ) -> Result<Vec<u8>> {
        let mut state = CbcState::new(iv, C::BLOCK_SIZE)?;
        let mut ciphertext = padding.pad(plaintext, C::BLOCK_SIZE)?;
        state.encrypt_blocks(cipher, &mut ciphertext)?;
        Ok(ciphertext)
    }

    /// CBC mode decryption
    pub fn cbc_decrypt<C: BlockCipher>(
        cipher: &C,
        ciphertext: &[u8],
        iv: &[u8],
        padding: Padding,
    ) -> Result<Vec<u8>> {
        let mut state = CbcState::new(iv, C::BLOCK_SIZE)?;

        if ciphertext.len() % C::BLOCK_SIZE != 0 {
            return Err(CipherModeError::InvalidLength {
                len: ciphertext.len(),
                block_size: C::BLOCK_SIZE,
            });
        }

        let mut plaintext = ciphertext.to_vec();
        state.decrypt_blocks(cipher, &mut plaintext)?;
        padding.unpad_and_wipe(&mut plaintext, C::BLOCK_SIZE)
    }
}
