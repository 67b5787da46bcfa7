//! CMAC (Cipher-based Message Authentication Code) implementation.
//!
//! Follows NIST SP 800-38B for 64-bit and 128-bit block ciphers.

use subtle::ConstantTimeEq;
use zeroize::Zeroize;

use crate::{error::CipherModeError, utils, BlockCipher, Result};

use super::CipherModes;

/// Reduction constant for doubling in GF(2^n), by block size in bytes.
fn reduction_constant(block_size: usize) -> Result<u8> {
    match block_size {
        8 => Ok(0x1b),
        16 => Ok(0x87),
        other => Err(CipherModeError::InvalidParameter(format!(
            "CMAC is defined for 64 and 128-bit blocks, got {} bits",
            other * 8
        ))),
    }
}

/// Left-shift a block by 1 bit; if the MSB was 1, XOR the low byte with `rb`.
fn dbl(block: &[u8], rb: u8) -> Vec<u8> {
    let mut result = vec![0u8; block.len()];
    let mut carry = 0u8;
    for i in (0..block.len()).rev() {
        result[i] = (block[i] << 1) | carry;
        carry = block[i] >> 7;
    }
    // mask instead of branching on the secret bit
    let last = result.len() - 1;
    result[last] ^= rb & 0u8.wrapping_sub(carry);
    result
}

/// CMAC subkeys K1 and K2, derived once per key.
pub struct Subkeys {
    k1: Vec<u8>,
    k2: Vec<u8>,
}

impl Subkeys {
    pub fn derive<C: BlockCipher>(cipher: &C) -> Result<Self> {
        let rb = reduction_constant(C::BLOCK_SIZE)?;

        // L = E_K(0^n)
        let mut l = vec![0u8; C::BLOCK_SIZE];
        cipher.encrypt_block(&mut l)?;

        let k1 = dbl(&l, rb);
        let k2 = dbl(&k1, rb);
        l.zeroize();

        Ok(Self { k1, k2 })
    }

    pub fn k1(&self) -> &[u8] {
        &self.k1
    }

    pub fn k2(&self) -> &[u8] {
        &self.k2
    }
}

impl Drop for Subkeys {
    fn drop(&mut self) {
        self.k1.zeroize();
        self.k2.zeroize();
    }
}

/// Streaming CBC-MAC accumulator.
///
/// The most recent block is always held back because whether it gets K1 or
/// K2 depends on whether more data follows.
pub struct CmacState {
    chain: Vec<u8>,
    buf: Vec<u8>,
    block_size: usize,
}

impl CmacState {
    pub fn new(block_size: usize) -> Self {
        Self {
            chain: vec![0u8; block_size],
            buf: Vec::with_capacity(block_size),
            block_size,
        }
    }

    pub fn update<C: BlockCipher>(&mut self, cipher: &C, mut data: &[u8]) -> Result<()> {
        while !data.is_empty() {
            if self.buf.len() == C::BLOCK_SIZE {
                utils::xor_in_place(&mut self.chain, &self.buf);
                cipher.encrypt_block(&mut self.chain)?;
                self.buf.zeroize();
            }

            let take = (C::BLOCK_SIZE - self.buf.len()).min(data.len());
            self.buf.extend_from_slice(&data[..take]);
            data = &data[take..];
        }
        Ok(())
    }

    /// Produces the full-length tag and resets the accumulator.
    pub fn finalize<C: BlockCipher>(&mut self, cipher: &C, subkeys: &Subkeys) -> Result<Vec<u8>> {
        let mut last = vec![0u8; C::BLOCK_SIZE];
        last[..self.buf.len()].copy_from_slice(&self.buf);

        if self.buf.len() == C::BLOCK_SIZE {
            utils::xor_in_place(&mut last, &subkeys.k1);
        } else {
            last[self.buf.len()] = 0x80;
            utils::xor_in_place(&mut last, &subkeys.k2);
        }

        utils::xor_in_place(&mut self.chain, &last);
        cipher.encrypt_block(&mut self.chain)?;
        last.zeroize();

        let tag = self.chain.clone();
        self.reset();
        Ok(tag)
    }

    pub fn reset(&mut self) {
        // zeroize also empties the vectors
        self.chain.zeroize();
        self.chain.resize(self.block_size, 0);
        self.buf.zeroize();
    }
}

impl Drop for CmacState {
    fn drop(&mut self) {
        self.chain.zeroize();
        self.buf.zeroize();
    }
}

/// CMAC bound to one primitive, with its subkeys cached.
pub struct Cmac<C: BlockCipher> {
    cipher: C,
    subkeys: Subkeys,
    state: CmacState,
    tag_len: usize,
}

impl<C: BlockCipher> Cmac<C> {
    /// Derives the subkeys; fails for block sizes other than 64 or 128 bits.
    pub fn new(cipher: C) -> Result<Self> {
        let subkeys = Subkeys::derive(&cipher)?;
        Ok(Self {
            cipher,
            subkeys,
            state: CmacState::new(C::BLOCK_SIZE),
            tag_len: C::BLOCK_SIZE,
        })
    }

    /// Truncates every tag produced by this instance to `tag_len` bytes.
    pub fn with_tag_len(mut self, tag_len: usize) -> Result<Self> {
        check_tag_len(tag_len, C::BLOCK_SIZE)?;
        self.tag_len = tag_len;
        Ok(self)
    }

    pub fn tag_len(&self) -> usize {
        self.tag_len
    }

    pub fn subkeys(&self) -> &Subkeys {
        &self.subkeys
    }

    /// Tag over a complete message. Does not touch the streaming state.
    pub fn compute(&self, message: &[u8]) -> Result<Vec<u8>> {
        self.compute_truncated(message, self.tag_len)
    }

    /// Tag over a complete message, truncated to `tag_len` bytes.
    pub fn compute_truncated(&self, message: &[u8], tag_len: usize) -> Result<Vec<u8>> {
        check_tag_len(tag_len, C::BLOCK_SIZE)?;
        let mut state = CmacState::new(C::BLOCK_SIZE);
        state.update(&self.cipher, message)?;
        let mut tag = state.finalize(&self.cipher, &self.subkeys)?;
        tag.truncate(tag_len);
        Ok(tag)
    }

    /// Checks `tag` against the message in constant time. The expected tag
    /// length is taken from `tag`.
    pub fn verify(&self, message: &[u8], tag: &[u8]) -> Result<()> {
        check_tag_len(tag.len(), C::BLOCK_SIZE).map_err(|_| CipherModeError::InvalidTag)?;
        let expected = self.compute_truncated(message, tag.len())?;
        if bool::from(expected.ct_eq(tag)) {
            Ok(())
        } else {
            Err(CipherModeError::InvalidTag)
        }
    }

    /// Feeds data into the streaming computation.
    pub fn update(&mut self, data: &[u8]) -> Result<()> {
        self.state.update(&self.cipher, data)
    }

    /// Finishes the streaming computation and resets it for the next message.
    pub fn finalize(&mut self) -> Result<Vec<u8>> {
        let mut tag = self.state.finalize(&self.cipher, &self.subkeys)?;
        tag.truncate(self.tag_len);
        Ok(tag)
    }

    /// Discards any partially absorbed message.
    pub fn reset(&mut self) {
        self.state.reset();
    }
}

fn check_tag_len(tag_len: usize, block_size: usize) -> Result<()> {
    if tag_len == 0 || tag_len > block_size {
        return Err(CipherModeError::InvalidParameter(format!(
            "tag length must be 1..={block_size} bytes, got {tag_len}"
        )));
    }
    Ok(())
}

impl CipherModes {
    /// CMAC tag of a complete message.
    pub fn cmac<C: BlockCipher>(cipher: &C, message: &[u8]) -> Result<Vec<u8>> {
        let subkeys = Subkeys::derive(cipher)?;
        let mut state = CmacState::new(C::BLOCK_SIZE);
        state.update(cipher, message)?;
        state.finalize(cipher, &subkeys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Primitive whose "encryption" is a fixed XOR mask, so L = mask.
    struct MaskCipher<const N: usize>([u8; N]);

    impl<const N: usize> BlockCipher for MaskCipher<N> {
        const BLOCK_SIZE: usize = N;

        fn encrypt_block(&self, block: &mut [u8]) -> Result<()> {
            crate::cipher::check_block_len(N, block)?;
            utils::xor_in_place(block, &self.0);
            Ok(())
        }

        fn decrypt_block(&self, block: &mut [u8]) -> Result<()> {
            self.encrypt_block(block)
        }
    }

    #[test]
    fn test_dbl_without_carry() {
        assert_eq!(dbl(&[0x01, 0x02], 0x1b), vec![0x02, 0x04]);
    }

    #[test]
    fn test_dbl_with_carry_reduces() {
        let block = [0x80, 0, 0, 0, 0, 0, 0, 0x01];
        assert_eq!(dbl(&block, 0x1b), vec![0, 0, 0, 0, 0, 0, 0, 0x02 ^ 0x1b]);
    }

    #[test]
    fn test_subkeys_64_bit() {
        let cipher = MaskCipher([0xc0, 0, 0, 0, 0, 0, 0, 0]);
        let subkeys = Subkeys::derive(&cipher).unwrap();
        // L = c0 00.., K1 = 80 00..1b, K2 = 00 00..36 ^ 1b
        assert_eq!(subkeys.k1(), &[0x80, 0, 0, 0, 0, 0, 0, 0x1b]);
        assert_eq!(subkeys.k2(), &[0, 0, 0, 0, 0, 0, 0, 0x36 ^ 0x1b]);
    }

    #[test]
    fn test_subkeys_128_bit() {
        let mut mask = [0u8; 16];
        mask[0] = 0x80;
        let subkeys = Subkeys::derive(&MaskCipher(mask)).unwrap();
        let mut k1 = [0u8; 16];
        k1[15] = 0x87;
        assert_eq!(subkeys.k1(), &k1);
        let mut k2 = [0u8; 16];
        k2[14] = 0x01;
        k2[15] = 0x0e;
        assert_eq!(subkeys.k2(), &k2);
    }

    #[test]
    fn test_unsupported_block_size() {
        let result = Subkeys::derive(&MaskCipher([0u8; 4]));
        assert!(matches!(result, Err(CipherModeError::InvalidParameter(_))));
    }

    #[test]
    fn test_streaming_matches_one_shot() {
        let cmac = Cmac::new(MaskCipher([0x5a; 8])).unwrap();
        let message = b"streamed message over several blocks";
        let expected = cmac.compute(message).unwrap();

        let mut streaming = Cmac::new(MaskCipher([0x5a; 8])).unwrap();
        for chunk in message.chunks(5) {
            streaming.update(chunk).unwrap();
        }
        assert_eq!(streaming.finalize().unwrap(), expected);

        // finalize resets, so the same instance can tag again
        streaming.update(message).unwrap();
        assert_eq!(streaming.finalize().unwrap(), expected);
    }

    #[test]
    fn test_aligned_and_padded_messages_differ() {
        let cmac = Cmac::new(MaskCipher([0x33; 8])).unwrap();
        let aligned = cmac.compute(&[0u8; 8]).unwrap();
        let short = cmac.compute(&[0u8; 7]).unwrap();
        assert_ne!(aligned, short);
    }

    #[test]
    fn test_truncated_tag_and_verify() {
        let cmac = Cmac::new(MaskCipher([0x11; 8])).unwrap().with_tag_len(4).unwrap();
        let tag = cmac.compute(b"message").unwrap();
        assert_eq!(tag.len(), 4);
        assert!(cmac.verify(b"message", &tag).is_ok());
        assert_eq!(cmac.verify(b"massage", &tag), Err(CipherModeError::InvalidTag));
        assert_eq!(cmac.verify(b"message", &[]), Err(CipherModeError::InvalidTag));
    }

    #[test]
    fn test_invalid_tag_len() {
        let cmac = Cmac::new(MaskCipher([0x11; 8])).unwrap();
        assert!(cmac.compute_truncated(b"m", 0).is_err());
        assert!(cmac.compute_truncated(b"m", 9).is_err());
    }
}
