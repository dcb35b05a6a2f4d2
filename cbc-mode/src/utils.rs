//! Utility functions for block processing

/// XOR `src` into `dst` byte for byte.
///
/// Both slices are expected to have the same length; extra bytes in the
/// longer slice are left untouched.
pub fn xor_in_place(dst: &mut [u8], src: &[u8]) {
    debug_assert_eq!(dst.len(), src.len());
    for (d, s) in dst.iter_mut().zip(src) {
        *d ^= s;
    }
}

/// Whether `len` splits into whole blocks of `block_size` bytes
pub fn is_block_aligned(len: usize, block_size: usize) -> bool {
    block_size != 0 && len % block_size == 0
}
