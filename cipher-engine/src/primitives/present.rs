//! PRESENT lightweight block cipher (Bogdanov et al., CHES 2007)
//!
//! 64-bit block, 80 or 128-bit key. The round count is configurable; the
//! standard cipher uses 32 round keys (31 full rounds plus a final key
//! addition).

use zeroize::Zeroize;

use crate::cipher::{check_block_len, BlockCipher, KeyInit};
use crate::error::{CipherModeError, Result};

const SBOX: [u8; 16] = [
    0xc, 0x5, 0x6, 0xb, 0x9, 0x0, 0xa, 0xd, 0x3, 0xe, 0xf, 0x8, 0x4, 0x7, 0x1, 0x2,
];

const INV_SBOX: [u8; 16] = [
    0x5, 0xe, 0xf, 0x8, 0xc, 0x1, 0x2, 0xd, 0xb, 0x4, 0x6, 0x3, 0x0, 0x7, 0x9, 0xa,
];

pub const DEFAULT_ROUNDS: u32 = 32;

/// Tuning knobs accepted by [`Present`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PresentParams {
    /// Number of round keys, at least 1.
    pub rounds: u32,
}

impl Default for PresentParams {
    fn default() -> Self {
        Self {
            rounds: DEFAULT_ROUNDS,
        }
    }
}

/// PRESENT with an expanded key schedule.
pub struct Present {
    round_keys: Vec<u64>,
}

impl Present {
    pub fn rounds(&self) -> u32 {
        self.round_keys.len() as u32
    }

    fn schedule_80(key: &[u8], rounds: u32) -> Vec<u64> {
        const MASK_80: u128 = (1 << 80) - 1;

        let mut register = key.iter().fold(0u128, |acc, &b| (acc << 8) | b as u128);
        let mut round_keys = Vec::with_capacity(rounds as usize);
        for i in 1..=rounds as u128 {
            round_keys.push((register >> 16) as u64);
            register = ((register << 61) | (register >> 19)) & MASK_80;
            let top = SBOX[(register >> 76) as usize] as u128;
            register = (top << 76) | (register & ((1 << 76) - 1));
            register ^= (i & 0x1f) << 15;
        }
        register.zeroize();
        round_keys
    }

    fn schedule_128(key: &[u8], rounds: u32) -> Vec<u64> {
        let mut register = key.iter().fold(0u128, |acc, &b| (acc << 8) | b as u128);
        let mut round_keys = Vec::with_capacity(rounds as usize);
        for i in 1..=rounds as u128 {
            round_keys.push((register >> 64) as u64);
            register = register.rotate_left(61);
            let hi = SBOX[(register >> 124) as usize] as u128;
            let lo = SBOX[((register >> 120) & 0xf) as usize] as u128;
            register = (hi << 124) | (lo << 120) | (register & ((1 << 120) - 1));
            register ^= (i & 0x1f) << 62;
        }
        register.zeroize();
        round_keys
    }

    fn encrypt_state(&self, mut state: u64) -> u64 {
        let (last, rounds) = match self.round_keys.split_last() {
            Some(split) => split,
            None => return state,
        };
        for &key in rounds {
            state ^= key;
            state = s_layer(state, &SBOX);
            state = p_layer(state);
        }
        state ^ last
    }

    fn decrypt_state(&self, mut state: u64) -> u64 {
        let (first, rounds) = match self.round_keys.split_first() {
            Some(split) => split,
            None => return state,
        };
        for &key in rounds.iter().rev() {
            state ^= key;
            state = inv_p_layer(state);
            state = s_layer(state, &INV_SBOX);
        }
        state ^ first
    }
}

fn s_layer(state: u64, sbox: &[u8; 16]) -> u64 {
    (0..16).fold(0u64, |out, nibble| {
        let shift = nibble * 4;
        out | (sbox[((state >> shift) & 0xf) as usize] as u64) << shift
    })
}

/// Bit `i` moves to `16 * i mod 63`; bit 63 stays.
fn p_position(i: u32) -> u32 {
    if i == 63 {
        63
    } else {
        (i * 16) % 63
    }
}

fn p_layer(state: u64) -> u64 {
    (0..64).fold(0u64, |out, i| out | ((state >> i) & 1) << p_position(i))
}

fn inv_p_layer(state: u64) -> u64 {
    (0..64).fold(0u64, |out, i| out | ((state >> p_position(i)) & 1) << i)
}

impl BlockCipher for Present {
    const BLOCK_SIZE: usize = 8;

    fn encrypt_block(&self, block: &mut [u8]) -> Result<()> {
        check_block_len(Self::BLOCK_SIZE, block)?;
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(block);
        let out = self.encrypt_state(u64::from_be_bytes(bytes));
        block.copy_from_slice(&out.to_be_bytes());
        Ok(())
    }

    fn decrypt_block(&self, block: &mut [u8]) -> Result<()> {
        check_block_len(Self::BLOCK_SIZE, block)?;
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(block);
        let out = self.decrypt_state(u64::from_be_bytes(bytes));
        block.copy_from_slice(&out.to_be_bytes());
        Ok(())
    }
}

impl KeyInit for Present {
    type Params = PresentParams;

    /// Accepts 10-byte (80-bit) or 16-byte (128-bit) keys.
    fn with_params(key: &[u8], params: &PresentParams) -> Result<Self> {
        if params.rounds == 0 {
            return Err(CipherModeError::InvalidParameter(
                "PRESENT needs at least one round".to_string(),
            ));
        }

        let round_keys = match key.len() {
            10 => Self::schedule_80(key, params.rounds),
            16 => Self::schedule_128(key, params.rounds),
            other => {
                return Err(CipherModeError::InvalidKey(format!(
                    "PRESENT key must be 80 or 128 bits, got {} bits",
                    other * 8
                )))
            }
        };

        Ok(Self { round_keys })
    }
}

impl Drop for Present {
    fn drop(&mut self) {
        self.round_keys.zeroize();
    }
}
