//! Utility functions for cipher modes

/// XOR `src` into `dst`; only the overlapping prefix is touched.
pub fn xor_in_place(dst: &mut [u8], src: &[u8]) {
    for (d, s) in dst.iter_mut().zip(src.iter()) {
        *d ^= s;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_xor_in_place_prefix() {
        let mut dst = [1u8, 2, 3, 4];
        xor_in_place(&mut dst, &[1, 1]);
        assert_eq!(dst, [0, 3, 3, 4]);
    }
}
