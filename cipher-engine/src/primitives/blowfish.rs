//! Blowfish (Schneier, 1993) backed by the RustCrypto `blowfish` crate

use ::blowfish::cipher::generic_array::GenericArray;
use ::blowfish::cipher::{BlockDecrypt, BlockEncrypt, KeyInit as _};

use crate::cipher::{check_block_len, BlockCipher, KeyInit};
use crate::error::{CipherModeError, Result};

pub const MIN_KEY_LEN: usize = 4;
pub const MAX_KEY_LEN: usize = 56;

/// Big-endian Blowfish, matching Schneier's reference vectors.
pub struct Blowfish {
    inner: ::blowfish::Blowfish,
}

impl BlockCipher for Blowfish {
    const BLOCK_SIZE: usize = 8;

    fn encrypt_block(&self, block: &mut [u8]) -> Result<()> {
        check_block_len(Self::BLOCK_SIZE, block)?;
        self.inner
            .encrypt_block(GenericArray::from_mut_slice(block));
        Ok(())
    }

    fn decrypt_block(&self, block: &mut [u8]) -> Result<()> {
        check_block_len(Self::BLOCK_SIZE, block)?;
        self.inner
            .decrypt_block(GenericArray::from_mut_slice(block));
        Ok(())
    }
}

impl KeyInit for Blowfish {
    type Params = ();

    /// Accepts keys of 4 to 56 bytes.
    fn with_params(key: &[u8], _params: &()) -> Result<Self> {
        if !(MIN_KEY_LEN..=MAX_KEY_LEN).contains(&key.len()) {
            return Err(CipherModeError::InvalidKey(format!(
                "Blowfish key must be {MIN_KEY_LEN} to {MAX_KEY_LEN} bytes, got {}",
                key.len()
            )));
        }
        let inner = ::blowfish::Blowfish::new_from_slice(key)
            .map_err(|_| CipherModeError::InvalidKey("rejected by key schedule".to_string()))?;
        Ok(Self { inner })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schneier_vectors() {
        // (key, plaintext, ciphertext) from https://www.schneier.com/code/vectors.txt
        let cases = [
            ("0000000000000000", "0000000000000000", "4ef997456198dd78"),
            ("ffffffffffffffff", "ffffffffffffffff", "51866fd5b85ecb8a"),
            ("0131d9619dc1376e", "5cd54ca83def57da", "b1b8cc0b250f09a0"),
        ];
        for (key, plain, expected) in cases {
            let cipher = Blowfish::new(&hex::decode(key).unwrap()).unwrap();
            let mut block = hex::decode(plain).unwrap();
            cipher.encrypt_block(&mut block).unwrap();
            assert_eq!(hex::encode(&block), expected);
            cipher.decrypt_block(&mut block).unwrap();
            assert_eq!(hex::encode(&block), plain);
        }
    }

    #[test]
    fn test_key_length_bounds() {
        assert!(Blowfish::new(&[0u8; 3]).is_err());
        assert!(Blowfish::new(&[0u8; 4]).is_ok());
        assert!(Blowfish::new(&[0u8; 56]).is_ok());
        assert!(matches!(
            Blowfish::new(&[0u8; 57]),
            Err(CipherModeError::InvalidKey(_))
        ));
    }
}
