//! Streaming cipher bound to one primitive, mode and direction

use tracing::{debug, trace};
use zeroize::Zeroize;

use crate::cipher::{BlockCipher, KeyInit};
use crate::counter::{BlockCounter, Counter};
use crate::error::{CipherModeError, Result};
use crate::modes::{ecb, CbcState, CfbState, CmacState, CtrState, Direction, Mode, OfbState, Subkeys};
use crate::padding::Padding;

/// IV or counter handed to a [`Cipher`] at construction.
pub enum Feedback {
    /// Initial chain block for CBC, CFB and OFB. For CTR it seeds a fresh
    /// big-endian [`BlockCounter`] owned by the cipher.
    Iv(Vec<u8>),
    /// Counter for CTR mode. Pass a
    /// [`SharedCounter`](crate::counter::SharedCounter) to deliberately keep
    /// several ciphers in lockstep.
    Counter(Box<dyn Counter>),
}

impl Feedback {
    pub fn iv(iv: &[u8]) -> Self {
        Feedback::Iv(iv.to_vec())
    }

    pub fn counter<C: Counter + 'static>(counter: C) -> Self {
        Feedback::Counter(Box::new(counter))
    }
}

enum Engine {
    Ecb,
    Cbc(CbcState),
    Cfb(CfbState),
    Ofb(OfbState),
    Ctr(CtrState),
    Cmac { subkeys: Subkeys, state: CmacState },
}

/// A block cipher primitive driven through one mode of operation.
///
/// The first `encrypt`, `decrypt` or `compute` call fixes the direction;
/// calling the other direction afterwards fails with
/// [`CipherModeError::DirectionMismatch`]. ECB is stateless and only refuses
/// to switch while it holds a buffered partial block. Build one `Cipher` per
/// direction and per message.
///
/// ECB and CBC process whole blocks as they arrive and buffer the rest;
/// [`Cipher::finish`] applies or strips the padding. While decrypting with a
/// padding scheme the last complete block is held back until `finish`, since
/// it may carry the pad.
///
/// Not safe to share between threads; every call mutates chain state.
pub struct Cipher<P: BlockCipher> {
    primitive: P,
    mode: Mode,
    engine: Engine,
    padding: Padding,
    direction: Option<Direction>,
    pending: Vec<u8>,
}

impl<P: BlockCipher> Cipher<P> {
    /// Binds `primitive` to `mode`.
    ///
    /// CBC, CFB and OFB need [`Feedback::Iv`]; CTR needs a counter or an IV
    /// to seed one; ECB and CMAC take nothing. Never reuse an IV or counter
    /// value with the same key for a different message.
    pub fn new(primitive: P, mode: Mode, feedback: Option<Feedback>) -> Result<Self> {
        let block_size = P::BLOCK_SIZE;
        let engine = match (mode, feedback) {
            (Mode::Ecb, None) => Engine::Ecb,
            (Mode::Cmac, None) => Engine::Cmac {
                subkeys: Subkeys::derive(&primitive)?,
                state: CmacState::new(block_size),
            },
            (Mode::Ecb | Mode::Cmac, Some(_)) => {
                return Err(CipherModeError::InvalidParameter(format!(
                    "{mode} takes no IV or counter"
                )))
            }
            (Mode::Cbc | Mode::Cfb | Mode::Ofb | Mode::Ctr, None) => {
                return Err(CipherModeError::MissingIv)
            }
            (Mode::Cbc, Some(Feedback::Iv(iv))) => Engine::Cbc(CbcState::new(&iv, block_size)?),
            (Mode::Cfb, Some(Feedback::Iv(iv))) => Engine::Cfb(CfbState::new(&iv, block_size)?),
            (Mode::Ofb, Some(Feedback::Iv(iv))) => Engine::Ofb(OfbState::new(&iv, block_size)?),
            (Mode::Cbc | Mode::Cfb | Mode::Ofb, Some(Feedback::Counter(_))) => {
                return Err(CipherModeError::InvalidParameter(format!(
                    "{mode} takes an IV, not a counter"
                )))
            }
            (Mode::Ctr, Some(Feedback::Iv(iv))) => {
                let counter = BlockCounter::new(&iv)?;
                Engine::Ctr(CtrState::new(Box::new(counter), block_size)?)
            }
            (Mode::Ctr, Some(Feedback::Counter(counter))) => {
                Engine::Ctr(CtrState::new(counter, block_size)?)
            }
        };

        debug!(%mode, block_size, "cipher constructed");

        Ok(Self {
            primitive,
            mode,
            engine,
            padding: Padding::default(),
            direction: None,
            pending: Vec::new(),
        })
    }

    pub fn ecb(primitive: P) -> Result<Self> {
        Self::new(primitive, Mode::Ecb, None)
    }

    pub fn cbc(primitive: P, iv: &[u8]) -> Result<Self> {
        Self::new(primitive, Mode::Cbc, Some(Feedback::iv(iv)))
    }

    pub fn cfb(primitive: P, iv: &[u8]) -> Result<Self> {
        Self::new(primitive, Mode::Cfb, Some(Feedback::iv(iv)))
    }

    pub fn ofb(primitive: P, iv: &[u8]) -> Result<Self> {
        Self::new(primitive, Mode::Ofb, Some(Feedback::iv(iv)))
    }

    pub fn ctr<C: Counter + 'static>(primitive: P, counter: C) -> Result<Self> {
        Self::new(primitive, Mode::Ctr, Some(Feedback::counter(counter)))
    }

    pub fn cmac(primitive: P) -> Result<Self> {
        Self::new(primitive, Mode::Cmac, None)
    }

    /// Selects the padding used by ECB and CBC (PKCS#7 by default).
    pub fn with_padding(mut self, padding: Padding) -> Self {
        self.padding = padding;
        self
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn padding(&self) -> Padding {
        self.padding
    }

    /// `None` until the first streaming call.
    pub fn direction(&self) -> Option<Direction> {
        self.direction
    }

    pub fn block_size(&self) -> usize {
        P::BLOCK_SIZE
    }

    pub fn primitive(&self) -> &P {
        &self.primitive
    }

    /// Encrypts the next chunk of the stream.
    ///
    /// Stream modes return exactly `data.len()` bytes. ECB and CBC return
    /// only the complete blocks available so far.
    pub fn encrypt(&mut self, data: &[u8]) -> Result<Vec<u8>> {
        self.bind(Direction::Encrypt)?;
        trace!(mode = %self.mode, len = data.len(), "encrypt");

        if self.mode.is_padded() {
            return self.take_blocks(data, Direction::Encrypt);
        }

        match &mut self.engine {
            Engine::Cfb(state) => {
                let mut out = data.to_vec();
                state.encrypt(&self.primitive, &mut out)?;
                Ok(out)
            }
            Engine::Ofb(state) => {
                let mut out = data.to_vec();
                state.apply(&self.primitive, &mut out)?;
                Ok(out)
            }
            Engine::Ctr(state) => {
                let mut out = data.to_vec();
                state.apply(&self.primitive, &mut out)?;
                Ok(out)
            }
            Engine::Ecb | Engine::Cbc(_) | Engine::Cmac { .. } => Err(
                CipherModeError::UnsupportedOperation("not a stream mode"),
            ),
        }
    }

    /// Decrypts the next chunk of the stream.
    ///
    /// ECB and CBC accept ciphertext of any length here and buffer the
    /// trailing partial block. A stream that does not end on a block
    /// boundary is reported as [`CipherModeError::InvalidLength`] by
    /// [`Cipher::finish`], not by this call.
    pub fn decrypt(&mut self, data: &[u8]) -> Result<Vec<u8>> {
        self.bind(Direction::Decrypt)?;
        trace!(mode = %self.mode, len = data.len(), "decrypt");

        if self.mode.is_padded() {
            return self.take_blocks(data, Direction::Decrypt);
        }

        match &mut self.engine {
            Engine::Cfb(state) => {
                let mut out = data.to_vec();
                state.decrypt(&self.primitive, &mut out)?;
                Ok(out)
            }
            Engine::Ofb(state) => {
                let mut out = data.to_vec();
                state.apply(&self.primitive, &mut out)?;
                Ok(out)
            }
            Engine::Ctr(state) => {
                let mut out = data.to_vec();
                state.apply(&self.primitive, &mut out)?;
                Ok(out)
            }
            Engine::Ecb | Engine::Cbc(_) | Engine::Cmac { .. } => Err(
                CipherModeError::UnsupportedOperation("not a stream mode"),
            ),
        }
    }

    /// Absorbs the next chunk of a CMAC message; [`Cipher::finish`] returns
    /// the tag.
    pub fn compute(&mut self, data: &[u8]) -> Result<()> {
        let Engine::Cmac { state, .. } = &mut self.engine else {
            return Err(CipherModeError::UnsupportedOperation(
                "compute is only available in CMAC mode",
            ));
        };
        if self.direction.is_none() {
            debug!(mode = %self.mode, "direction bound to Authenticate");
        }
        self.direction = Some(Direction::Authenticate);
        trace!(mode = %self.mode, len = data.len(), "compute");
        state.update(&self.primitive, data)
    }

    /// Ends the stream.
    ///
    /// * ECB/CBC encryption: pads and returns the final block(s).
    /// * ECB/CBC decryption: decrypts the held-back block and strips the
    ///   padding. A trailing partial block is an [`InvalidLength`] error.
    /// * CMAC: returns the full-length tag.
    /// * CFB/OFB/CTR: nothing is buffered; returns an empty vector.
    ///
    /// A cipher that was never fed counts as encrypting (or authenticating)
    /// an empty message.
    ///
    /// [`InvalidLength`]: CipherModeError::InvalidLength
    pub fn finish(mut self) -> Result<Vec<u8>> {
        let direction = self.direction.unwrap_or(match self.mode {
            Mode::Cmac => Direction::Authenticate,
            _ => Direction::Encrypt,
        });
        debug!(mode = %self.mode, ?direction, padding = ?self.padding, "finish");

        let mut pending = std::mem::take(&mut self.pending);
        let result = if let Engine::Cmac { subkeys, state } = &mut self.engine {
            state.finalize(&self.primitive, subkeys)
        } else if self.mode.is_padded() {
            self.finish_blocks(&mut pending, direction)
        } else {
            Ok(Vec::new())
        };
        pending.zeroize();
        result
    }

    fn finish_blocks(&mut self, pending: &mut Vec<u8>, direction: Direction) -> Result<Vec<u8>> {
        let block_size = P::BLOCK_SIZE;

        if direction == Direction::Encrypt {
            let mut out = self.padding.pad(pending, block_size)?;
            self.process_blocks(&mut out, Direction::Encrypt)?;
            return Ok(out);
        }

        if pending.len() % block_size != 0 {
            return Err(CipherModeError::InvalidLength {
                len: pending.len(),
                block_size,
            });
        }
        self.process_blocks(pending, Direction::Decrypt)?;
        self.padding.unpad_and_wipe(pending, block_size)
    }

    fn bind(&mut self, requested: Direction) -> Result<()> {
        if self.mode == Mode::Cmac {
            return Err(CipherModeError::UnsupportedOperation(
                "CMAC authenticates; use compute",
            ));
        }

        match self.direction {
            Some(bound) if bound != requested => {
                if self.mode != Mode::Ecb || !self.pending.is_empty() {
                    return Err(CipherModeError::DirectionMismatch { bound, requested });
                }
            }
            Some(_) => return Ok(()),
            None => {}
        }

        debug!(mode = %self.mode, ?requested, "direction bound");
        self.direction = Some(requested);
        Ok(())
    }

    /// Buffers `data` and processes every block that is safe to release.
    fn take_blocks(&mut self, data: &[u8], direction: Direction) -> Result<Vec<u8>> {
        let block_size = P::BLOCK_SIZE;
        self.pending.extend_from_slice(data);

        let mut ready = self.pending.len() / block_size * block_size;
        let holds_pad = direction == Direction::Decrypt && self.padding != Padding::None;
        if holds_pad && ready == self.pending.len() {
            ready = ready.saturating_sub(block_size);
        }

        let mut out: Vec<u8> = self.pending.drain(..ready).collect();
        self.process_blocks(&mut out, direction)?;
        Ok(out)
    }

    fn process_blocks(&mut self, data: &mut [u8], direction: Direction) -> Result<()> {
        match (&mut self.engine, direction) {
            (Engine::Ecb, Direction::Encrypt) => ecb::encrypt_blocks(&self.primitive, data),
            (Engine::Ecb, _) => ecb::decrypt_blocks(&self.primitive, data),
            (Engine::Cbc(state), Direction::Encrypt) => state.encrypt_blocks(&self.primitive, data),
            (Engine::Cbc(state), _) => state.decrypt_blocks(&self.primitive, data),
            _ => Err(CipherModeError::UnsupportedOperation(
                "block processing is only used by ECB and CBC",
            )),
        }
    }
}

impl<P: KeyInit> Cipher<P> {
    /// Builds the primitive from `key` and `params`, then binds it to `mode`.
    pub fn from_key(
        key: &[u8],
        mode: Mode,
        feedback: Option<Feedback>,
        params: &P::Params,
    ) -> Result<Self> {
        let primitive = P::with_params(key, params)?;
        Self::new(primitive, mode, feedback)
    }
}

impl<P: BlockCipher> Drop for Cipher<P> {
    fn drop(&mut self) {
        self.pending.zeroize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::counter::SharedCounter;
    use crate::modes::CipherModes;
    use crate::Present;

    fn present() -> Present {
        Present::new(b"facade-k10").unwrap()
    }

    #[test]
    fn test_missing_iv() {
        for mode in [Mode::Cbc, Mode::Cfb, Mode::Ofb, Mode::Ctr] {
            let result = Cipher::new(present(), mode, None);
            assert!(matches!(result, Err(CipherModeError::MissingIv)), "{mode}");
        }
    }

    #[test]
    fn test_feedback_rejected_where_unused() {
        let result = Cipher::new(present(), Mode::Ecb, Some(Feedback::iv(&[0u8; 8])));
        assert!(matches!(result, Err(CipherModeError::InvalidParameter(_))));

        let counter = BlockCounter::new(&[0u8; 8]).unwrap();
        let result = Cipher::new(present(), Mode::Cbc, Some(Feedback::counter(counter)));
        assert!(matches!(result, Err(CipherModeError::InvalidParameter(_))));
    }

    #[test]
    fn test_direction_fixed_at_first_use() {
        let mut cipher = Cipher::ofb(present(), b"init-vec").unwrap();
        assert_eq!(cipher.direction(), None);
        cipher.encrypt(b"abc").unwrap();
        assert_eq!(cipher.direction(), Some(Direction::Encrypt));

        let result = cipher.decrypt(b"abc");
        assert_eq!(
            result,
            Err(CipherModeError::DirectionMismatch {
                bound: Direction::Encrypt,
                requested: Direction::Decrypt,
            })
        );
    }

    #[test]
    fn test_ecb_switches_direction_only_when_idle() {
        let mut cipher = Cipher::ecb(present()).unwrap().with_padding(Padding::None);
        let block = cipher.encrypt(&[1u8; 8]).unwrap();
        assert_eq!(cipher.decrypt(&block).unwrap(), vec![1u8; 8]);

        cipher.decrypt(&block[..3]).unwrap();
        assert!(matches!(
            cipher.encrypt(&[0u8; 8]),
            Err(CipherModeError::DirectionMismatch { .. })
        ));
    }

    #[test]
    fn test_cbc_buffers_partial_blocks() {
        let mut cipher = Cipher::cbc(present(), b"init-vec").unwrap();
        assert!(cipher.encrypt(b"12345").unwrap().is_empty());
        assert_eq!(cipher.encrypt(b"6789").unwrap().len(), 8);
        // one byte left plus seven bytes of padding
        assert_eq!(cipher.finish().unwrap().len(), 8);
    }

    #[test]
    fn test_decrypt_holds_back_padded_block() {
        let ciphertext =
            CipherModes::cbc_encrypt(&present(), b"hello, world!", b"init-vec", Padding::Pkcs7)
                .unwrap();
        assert_eq!(ciphertext.len(), 16);

        let mut cipher = Cipher::cbc(present(), b"init-vec").unwrap();
        let head = cipher.decrypt(&ciphertext).unwrap();
        assert_eq!(head, b"hello, w");
        assert_eq!(cipher.finish().unwrap(), b"orld!");
    }

    #[test]
    fn test_finish_rejects_truncated_ciphertext() {
        let mut cipher = Cipher::ecb(present()).unwrap();
        // the partial block is buffered, not rejected
        assert_eq!(cipher.decrypt(&[0u8; 11]).unwrap().len(), 8);
        assert_eq!(
            cipher.finish(),
            Err(CipherModeError::InvalidLength { len: 3, block_size: 8 })
        );
    }

    #[test]
    fn test_cmac_through_facade() {
        let expected = CipherModes::cmac(&present(), b"authenticate me").unwrap();

        let mut cipher = Cipher::cmac(present()).unwrap();
        cipher.compute(b"authen").unwrap();
        cipher.compute(b"ticate me").unwrap();
        assert_eq!(cipher.direction(), Some(Direction::Authenticate));
        assert_eq!(cipher.finish().unwrap(), expected);
    }

    #[test]
    fn test_cmac_rejects_encrypt_and_compute_rejects_others() {
        let mut cipher = Cipher::cmac(present()).unwrap();
        assert!(matches!(
            cipher.encrypt(b"x"),
            Err(CipherModeError::UnsupportedOperation(_))
        ));

        let mut cipher = Cipher::ecb(present()).unwrap();
        assert!(matches!(
            cipher.compute(b"x"),
            Err(CipherModeError::UnsupportedOperation(_))
        ));
    }

    #[test]
    fn test_ctr_iv_seeds_owned_counter() {
        let mut a = Cipher::new(present(), Mode::Ctr, Some(Feedback::iv(&[0u8; 8]))).unwrap();
        let counter = BlockCounter::new(&[0u8; 8]).unwrap();
        let mut b = Cipher::ctr(present(), counter).unwrap();
        assert_eq!(a.encrypt(&[0u8; 20]).unwrap(), b.encrypt(&[0u8; 20]).unwrap());
    }

    #[test]
    fn test_shared_counter_desynchronizes_roundtrip() {
        let shared: SharedCounter<BlockCounter> = BlockCounter::new(&[0u8; 8]).unwrap().shared();
        let mut encryptor = Cipher::ctr(present(), shared.clone()).unwrap();
        let mut decryptor = Cipher::ctr(present(), shared.clone()).unwrap();

        let ciphertext = encryptor.encrypt(b"eight by").unwrap();
        // the decryptor sees the counter already advanced by the encryptor
        assert_ne!(decryptor.decrypt(&ciphertext).unwrap(), b"eight by");
        assert_eq!(shared.current(), vec![0, 0, 0, 0, 0, 0, 0, 2]);
    }

    #[test]
    fn test_fresh_finish_encrypts_empty_message() {
        let cipher = Cipher::ecb(present()).unwrap();
        assert_eq!(cipher.finish().unwrap().len(), 8);

        let cipher = Cipher::ofb(present(), b"init-vec").unwrap();
        assert!(cipher.finish().unwrap().is_empty());
    }
}
