//! CFB (Cipher Feedback) mode implementation
//!
//! Full-block CFB used as a self-synchronizing stream cipher:
//!
//! 1. O_i = E(K, C_{i-1}), C_0 = IV
//! 2. C_i = P_i ⊕ O_i
//!
//! Both directions run the primitive forwards. The shift register keeps the
//! keystream block with its consumed prefix overwritten by ciphertext, so a
//! call may stop mid-block and the next one resumes there.

use zeroize::Zeroize;

use crate::{error::CipherModeError, BlockCipher, Result};

use super::CipherModes;

pub struct CfbState {
    register: Vec<u8>,
    pos: usize,
}

impl CfbState {
    pub fn new(iv: &[u8], block_size: usize) -> Result<Self> {
        if iv.len() != block_size {
            return Err(CipherModeError::InvalidIvLength {
                expected: block_size,
                actual: iv.len(),
            });
        }
        // pos == block size: register holds feedback that still has to be
        // encrypted into the next keystream block
        Ok(Self {
            register: iv.to_vec(),
            pos: block_size,
        })
    }

    pub fn encrypt<C: BlockCipher>(&mut self, cipher: &C, data: &mut [u8]) -> Result<()> {
        self.process(cipher, data, true)
    }

    pub fn decrypt<C: BlockCipher>(&mut self, cipher: &C, data: &mut [u8]) -> Result<()> {
        self.process(cipher, data, false)
    }

    fn process<C: BlockCipher>(&mut self, cipher: &C, data: &mut [u8], encrypt: bool) -> Result<()> {
        let mut offset = 0;
        while offset < data.len() {
            if self.pos == C::BLOCK_SIZE {
                cipher.encrypt_block(&mut self.register)?;
                self.pos = 0;
            }

            let take = (C::BLOCK_SIZE - self.pos).min(data.len() - offset);
            let segment = &mut data[offset..offset + take];
            let keystream = &mut self.register[self.pos..self.pos + take];
            for (byte, ks) in segment.iter_mut().zip(keystream.iter_mut()) {
                let input = *byte;
                *byte ^= *ks;
                // feedback is always the ciphertext byte
                *ks = if encrypt { *byte } else { input };
            }

            self.pos += take;
            offset += take;
        }
        Ok(())
    }
}

impl Drop for CfbState {
    fn drop(&mut self) {
        self.register.zeroize();
    }
}

impl CipherModes {
    /// CFB mode encryption; output length equals input length.
    pub fn cfb_encrypt<C: BlockCipher>(cipher: &C, plaintext: &[u8], iv: &[u8]) -> Result<Vec<u8>> {
        let mut state = CfbState::new(iv, C::BLOCK_SIZE)?;
        let mut ciphertext = plaintext.to_vec();
        state.encrypt(cipher, &mut ciphertext)?;
        Ok(ciphertext)
    }

    /// CFB mode decryption
    pub fn cfb_decrypt<C: BlockCipher>(cipher: &C, ciphertext: &[u8], iv: &[u8]) -> Result<Vec<u8>> {
        let mut state = CfbState::new(iv, C::BLOCK_SIZE)?;
        let mut plaintext = ciphertext.to_vec();
        state.decrypt(cipher, &mut plaintext)?;
        Ok(plaintext)
    }
}
