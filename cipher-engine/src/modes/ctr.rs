//! CTR (Counter) mode implementation

use zeroize::Zeroize;

use crate::{
    counter::{BlockCounter, Counter},
    error::CipherModeError,
    utils, BlockCipher, Result,
};

use super::CipherModes;

/// CTR keystream state.
///
/// In CTR mode, a counter is used which is advanced for each block.
/// The encryption of the counter is XORed with the plaintext.
///
/// Algorithm:
/// 1. T_i = counter value before the i-th advance
/// 2. C_i = P_i ⊕ E(K, T_i)
///
/// The counter is advanced in place and never copied, so the decrypting side
/// needs its own counter starting from the same value.
pub struct CtrState {
    counter: Box<dyn Counter>,
    keystream: Vec<u8>,
    pos: usize,
}

impl CtrState {
    pub fn new(counter: Box<dyn Counter>, block_size: usize) -> Result<Self> {
        let initial = counter.current();
        if initial.len() != block_size {
            return Err(CipherModeError::InvalidIvLength {
                expected: block_size,
                actual: initial.len(),
            });
        }
        Ok(Self {
            counter,
            keystream: vec![0u8; block_size],
            pos: block_size,
        })
    }

    /// XORs the keystream into `data`; encryption and decryption are the same.
    pub fn apply<C: BlockCipher>(&mut self, cipher: &C, data: &mut [u8]) -> Result<()> {
        let mut offset = 0;
        while offset < data.len() {
            if self.pos == C::BLOCK_SIZE {
                self.next_keystream(cipher)?;
            }

            let take = (C::BLOCK_SIZE - self.pos).min(data.len() - offset);
            utils::xor_in_place(
                &mut data[offset..offset + take],
                &self.keystream[self.pos..self.pos + take],
            );

            self.pos += take;
            offset += take;
        }
        Ok(())
    }

    fn next_keystream<C: BlockCipher>(&mut self, cipher: &C) -> Result<()> {
        let mut block = self.counter.current();
        if block.len() != C::BLOCK_SIZE {
            return Err(CipherModeError::BlockSizeMismatch {
                expected: C::BLOCK_SIZE,
                actual: block.len(),
            });
        }
        cipher.encrypt_block(&mut block)?;
        self.counter.advance();

        self.keystream.zeroize();
        self.keystream = block;
        self.pos = 0;
        Ok(())
    }
}

impl Drop for CtrState {
    fn drop(&mut self) {
        self.keystream.zeroize();
    }
}

impl CipherModes {
    /// CTR mode encryption with a fresh big-endian counter starting at
    /// `initial`.
    pub fn ctr_encrypt<C: BlockCipher>(cipher: &C, plaintext: &[u8], initial: &[u8]) -> Result<Vec<u8>> {
        let counter = BlockCounter::new(initial)?;
        let mut state = CtrState::new(Box::new(counter), C::BLOCK_SIZE)?;
        let mut ciphertext = plaintext.to_vec();
        state.apply(cipher, &mut ciphertext)?;
        Ok(ciphertext)
    }

    /// CTR mode decryption
    ///
    /// Since CTR is a stream cipher mode, decryption is identical to encryption.
    pub fn ctr_decrypt<C: BlockCipher>(cipher: &C, ciphertext: &[u8], initial: &[u8]) -> Result<Vec<u8>> {
        Self::ctr_encrypt(cipher, ciphertext, initial)
    }

    /// CTR mode with the counter block laid out as `nonce || counter`
    /// (32-bit big-endian counter in the trailing bytes).
    pub fn ctr_encrypt_with_nonce<C: BlockCipher>(
        cipher: &C,
        plaintext: &[u8],
        nonce: &[u8],
        counter: u32,
    ) -> Result<Vec<u8>> {
        let counter = BlockCounter::with_nonce(nonce, counter, C::BLOCK_SIZE)?;
        let mut state = CtrState::new(Box::new(counter), C::BLOCK_SIZE)?;
        let mut ciphertext = plaintext.to_vec();
        state.apply(cipher, &mut ciphertext)?;
        Ok(ciphertext)
    }

    /// CTR mode decryption with nonce
    pub fn ctr_decrypt_with_nonce<C: BlockCipher>(
        cipher: &C,
        ciphertext: &[u8],
        nonce: &[u8],
        counter: u32,
    ) -> Result<Vec<u8>> {
        Self::ctr_encrypt_with_nonce(cipher, ciphertext, nonce, counter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{KeyInit, Present};

    fn cipher() -> Present {
        Present::new(b"ctr-key-10").unwrap()
    }

    #[test]
    fn test_ctr_encrypt_decrypt() {
        let cipher = cipher();
        let plaintext = b"Hello World! This is a test message.";
        let initial = 1000u64.to_be_bytes();

        let ciphertext = CipherModes::ctr_encrypt(&cipher, plaintext, &initial).unwrap();
        let decrypted = CipherModes::ctr_decrypt(&cipher, &ciphertext, &initial).unwrap();

        assert_eq!(plaintext, &decrypted[..]);
    }

    #[test]
    fn test_ctr_with_nonce() {
        let cipher = cipher();
        let plaintext = b"Hello, CTR with nonce!";
        let nonce = b"nce";

        let ciphertext =
            CipherModes::ctr_encrypt_with_nonce(&cipher, plaintext, nonce, 1).unwrap();
        let decrypted =
            CipherModes::ctr_decrypt_with_nonce(&cipher, &ciphertext, nonce, 1).unwrap();

        assert_eq!(plaintext, &decrypted[..]);
    }

    #[test]
    fn test_ctr_partial_block() {
        let cipher = cipher();
        let plaintext = b"Hi"; // Less than block size
        let initial = 42u64.to_be_bytes();

        let ciphertext = CipherModes::ctr_encrypt(&cipher, plaintext, &initial).unwrap();
        let decrypted = CipherModes::ctr_decrypt(&cipher, &ciphertext, &initial).unwrap();

        assert_eq!(plaintext, &decrypted[..]);
        assert_eq!(ciphertext.len(), plaintext.len()); // No padding in CTR
    }

    #[test]
    fn test_ctr_counter_overflow() {
        let cipher = cipher();
        let plaintext = b"Test overflow";
        let initial = u64::MAX.to_be_bytes(); // Will wrap

        let ciphertext = CipherModes::ctr_encrypt(&cipher, plaintext, &initial).unwrap();
        let decrypted = CipherModes::ctr_decrypt(&cipher, &ciphertext, &initial).unwrap();

        assert_eq!(plaintext, &decrypted[..]);

        // second block is keyed by the wrapped counter
        let mut zero = [0u8; 8];
        cipher.encrypt_block(&mut zero).unwrap();
        let keystream = CipherModes::ctr_encrypt(&cipher, &[0u8; 16], &initial).unwrap();
        assert_eq!(&keystream[8..], &zero);
    }

    #[test]
    fn test_ctr_keystream_is_encrypted_counter() {
        let cipher = cipher();
        let keystream = CipherModes::ctr_encrypt(&cipher, &[0u8; 24], &[0u8; 8]).unwrap();
        for (k, block) in keystream.chunks(8).enumerate() {
            let mut expected = (k as u64).to_be_bytes();
            cipher.encrypt_block(&mut expected).unwrap();
            assert_eq!(block, expected);
        }
    }

    #[test]
    fn test_ctr_rejects_wrong_counter_size() {
        let counter = BlockCounter::new(&[0u8; 16]).unwrap();
        let result = CtrState::new(Box::new(counter), 8);
        assert!(matches!(result, Err(CipherModeError::InvalidIvLength { .. })));
    }
}
