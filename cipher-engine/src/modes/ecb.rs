//! ECB (Electronic Code Book) mode implementation

use crate::{error::CipherModeError, BlockCipher, Padding, Result};

use super::CipherModes;

/// Encrypts every block of `data` independently. `data` must be aligned.
pub(crate) fn encrypt_blocks<C: BlockCipher>(cipher: &C, data: &mut [u8]) -> Result<()> {
    for block in data.chunks_exact_mut(C::BLOCK_SIZE) {
        cipher.encrypt_block(block)?;
    }
    Ok(())
}

/// Decrypts every block of `data` independently. `data` must be aligned.
pub(crate) fn decrypt_blocks<C: BlockCipher>(cipher: &C, data: &mut [u8]) -> Result<()> {
    for block in data.chunks_exact_mut(C::BLOCK_SIZE) {
        cipher.decrypt_block(block)?;
    }
    Ok(())
}

impl CipherModes {
    /// ECB mode encryption
    ///
    /// Identical plaintext blocks produce identical ciphertext blocks; only
    /// use ECB for single-block values or test vectors.
    pub fn ecb_encrypt<C: BlockCipher>(
        cipher: &C,
        plaintext: &[u8],
        padding: Padding,
    ) -> Result<Vec<u8>> {
        let mut ciphertext = padding.pad(plaintext, C::BLOCK_SIZE)?;
        encrypt_blocks(cipher, &mut ciphertext)?;
        Ok(ciphertext)
    }

    /// ECB mode decryption
    pub fn ecb_decrypt<C: BlockCipher>(
        cipher: &C,
        ciphertext: &[u8],
        padding: Padding,
    ) -> Result<Vec<u8>> {
        if ciphertext.len() % C::BLOCK_SIZE != 0 {
            return Err(CipherModeError::InvalidLength {
                len: ciphertext.len(),
                block_size: C::BLOCK_SIZE,
            });
        }

        let mut plaintext = ciphertext.to_vec();
        decrypt_blocks(cipher, &mut plaintext)?;
        padding.unpad_and_wipe(&mut plaintext, C::BLOCK_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{KeyInit, Present};

    fn cipher() -> Present {
        Present::new(&[0u8; 10]).unwrap()
    }

    #[test]
    fn test_ecb_encrypt_decrypt() {
        let cipher = cipher();
        let plaintext = b"Hello World! This is a test message.";

        let ciphertext = CipherModes::ecb_encrypt(&cipher, plaintext, Padding::Pkcs7).unwrap();
        assert_eq!(ciphertext.len(), 40);

        let decrypted = CipherModes::ecb_decrypt(&cipher, &ciphertext, Padding::Pkcs7).unwrap();
        assert_eq!(plaintext, &decrypted[..]);
    }

    #[test]
    fn test_ecb_identical_blocks_leak() {
        let cipher = cipher();
        let ciphertext = CipherModes::ecb_encrypt(&cipher, &[7u8; 16], Padding::None).unwrap();
        assert_eq!(ciphertext[..8], ciphertext[8..]);
    }

    #[test]
    fn test_ecb_decrypt_invalid_length() {
        let cipher = cipher();
        let result = CipherModes::ecb_decrypt(&cipher, &[0u8; 12], Padding::Pkcs7);
        assert_eq!(
            result,
            Err(CipherModeError::InvalidLength { len: 12, block_size: 8 })
        );
    }

    #[test]
    fn test_ecb_decrypt_tampered_padding() {
        let cipher = cipher();
        let mut ciphertext = CipherModes::ecb_encrypt(&cipher, b"short", Padding::Pkcs7).unwrap();
        // re-encrypt a block whose last byte is an impossible pad length
        let mut forged = *b"short\x00\x00\x00";
        cipher.encrypt_block(&mut forged).unwrap();
        ciphertext.copy_from_slice(&forged);

        let result = CipherModes::ecb_decrypt(&cipher, &ciphertext, Padding::Pkcs7);
        assert_eq!(result, Err(CipherModeError::InvalidPadding));
    }
}
