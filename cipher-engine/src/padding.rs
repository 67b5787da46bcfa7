//! Block padding schemes for ECB and CBC

use subtle::{Choice, ConditionallySelectable, ConstantTimeEq, ConstantTimeGreater};
use zeroize::Zeroize;

use crate::error::{CipherModeError, Result};

/// Padding applied to the final block of an ECB or CBC message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Padding {
    /// PKCS#7: `n` bytes of value `n`, always at least one byte.
    #[default]
    Pkcs7,
    /// ISO/IEC 7816-4 bit padding: `0x80` followed by zero bytes.
    Iso7816,
    /// Zero bytes up to the next block boundary. Lossy for data that ends
    /// in `0x00`.
    Zeros,
    /// No padding; data must already be block aligned.
    None,
}

impl Padding {
    /// Pads `data` to a multiple of `block_size`.
    pub fn pad(&self, data: &[u8], block_size: usize) -> Result<Vec<u8>> {
        validate_block_size(*self, block_size)?;

        let mut padded = data.to_vec();
        let remainder = data.len() % block_size;

        match self {
            Padding::Pkcs7 => {
                let n = block_size - remainder;
                padded.resize(data.len() + n, n as u8);
            }
            Padding::Iso7816 => {
                padded.push(0x80);
                let remainder = padded.len() % block_size;
                if remainder != 0 {
                    padded.resize(padded.len() + block_size - remainder, 0);
                }
            }
            Padding::Zeros => {
                if remainder != 0 {
                    padded.resize(data.len() + block_size - remainder, 0);
                }
            }
            Padding::None => {
                if remainder != 0 {
                    return Err(CipherModeError::InvalidLength {
                        len: data.len(),
                        block_size,
                    });
                }
            }
        }

        Ok(padded)
    }

    /// Strips the padding from `padded`.
    ///
    /// PKCS#7 and ISO 7816-4 inspect the whole final block without
    /// data-dependent branches and report every failure as
    /// [`CipherModeError::InvalidPadding`].
    pub fn unpad(&self, padded: &[u8], block_size: usize) -> Result<Vec<u8>> {
        validate_block_size(*self, block_size)?;

        if padded.len() % block_size != 0 {
            return Err(CipherModeError::InvalidLength {
                len: padded.len(),
                block_size,
            });
        }

        match self {
            Padding::Pkcs7 | Padding::Iso7816 => {
                if padded.is_empty() {
                    return Err(CipherModeError::InvalidPadding);
                }
                let last = &padded[padded.len() - block_size..];
                let (valid, pad_len) = if *self == Padding::Pkcs7 {
                    check_pkcs7(last)
                } else {
                    check_iso7816(last)
                };
                if !bool::from(valid) {
                    return Err(CipherModeError::InvalidPadding);
                }
                Ok(padded[..padded.len() - pad_len].to_vec())
            }
            Padding::Zeros => {
                let end = padded
                    .iter()
                    .rposition(|&b| b != 0)
                    .map_or(0, |pos| pos + 1);
                Ok(padded[..end].to_vec())
            }
            Padding::None => Ok(padded.to_vec()),
        }
    }

    /// Like [`Padding::unpad`], but wipes `buf` afterwards on success and
    /// failure alike.
    pub(crate) fn unpad_and_wipe(&self, buf: &mut Vec<u8>, block_size: usize) -> Result<Vec<u8>> {
        let result = self.unpad(buf, block_size);
        buf.zeroize();
        result
    }
}

fn validate_block_size(padding: Padding, block_size: usize) -> Result<()> {
    if block_size == 0 {
        return Err(CipherModeError::InvalidParameter(
            "block size must be > 0".to_string(),
        ));
    }
    // the PKCS#7 pad byte encodes the pad length
    if padding == Padding::Pkcs7 && block_size > u8::MAX as usize {
        return Err(CipherModeError::InvalidParameter(format!(
            "PKCS#7 supports block sizes up to 255 bytes, got {block_size}"
        )));
    }
    Ok(())
}

fn check_pkcs7(last: &[u8]) -> (Choice, usize) {
    let block_size = last.len() as u8;
    let n = last[last.len() - 1];

    let mut valid = !n.ct_eq(&0) & !n.ct_gt(&block_size);
    for (i, byte) in last.iter().rev().enumerate() {
        let in_pad = !(i as u8 + 1).ct_gt(&n);
        valid &= !in_pad | byte.ct_eq(&n);
    }

    (valid, n as usize)
}

fn check_iso7816(last: &[u8]) -> (Choice, usize) {
    let mut found = Choice::from(0);
    let mut stray = Choice::from(0);
    let mut pad_len = 0u64;

    for (i, byte) in last.iter().rev().enumerate() {
        let is_zero = byte.ct_eq(&0);
        let is_marker = byte.ct_eq(&0x80);
        let scanning = !found;

        pad_len.conditional_assign(&(i as u64 + 1), scanning & is_marker);
        stray |= scanning & !is_zero & !is_marker;
        found |= is_marker;
    }

    (found & !stray, pad_len as usize)
}
