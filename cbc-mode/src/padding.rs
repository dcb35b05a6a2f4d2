//! PKCS#7 padding
//!
//! Appends `n` bytes of value `n` so the message becomes a multiple of the
//! block size. `n` is always in `1..=block_size`: an already aligned message
//! gains a whole extra block.

use crate::error::PaddingError;

/// Block size used when the caller does not supply one
pub const DEFAULT_BLOCK_SIZE: usize = 16;

/// A reversible padding scheme usable by a block cipher mode.
pub trait Padding {
    /// Returns a new buffer holding `data` followed by the padding bytes
    fn pad(&self, data: &[u8], block_size: usize) -> Vec<u8>;

    /// Returns a new buffer holding `data` without its padding bytes
    fn strip(&self, data: &[u8], block_size: usize) -> Result<Vec<u8>, PaddingError>;
}

/// The PKCS#7 padding scheme (RFC 5652, section 6.3).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Pkcs7;

impl Padding for Pkcs7 {
    fn pad(&self, data: &[u8], block_size: usize) -> Vec<u8> {
        pad(data, block_size)
    }

    fn strip(&self, data: &[u8], block_size: usize) -> Result<Vec<u8>, PaddingError> {
        strip(data, block_size)
    }
}

/// Pads `data` to a multiple of `block_size`.
///
/// # Panics
///
/// Panics if `block_size` is not in `1..=255`, since the padding length has
/// to fit in a single byte.
pub fn pad(data: &[u8], block_size: usize) -> Vec<u8> {
    assert!(
        (1..=255).contains(&block_size),
        "PKCS#7 block size must be in 1..=255, got {block_size}"
    );

    let padding = block_size - data.len() % block_size;
    let mut padded = Vec::with_capacity(data.len() + padding);
    padded.extend_from_slice(data);
    // padding <= 255, checked above
    padded.resize(data.len() + padding, padding as u8);
    padded
}

/// Removes PKCS#7 padding from `data`, validating every padding byte.
///
/// Validation stops at the first bad byte and is not constant time.
pub fn strip(data: &[u8], block_size: usize) -> Result<Vec<u8>, PaddingError> {
    let Some(&last) = data.last().filter(|_| data.len() >= block_size) else {
        return Err(PaddingError::TooShort {
            len: data.len(),
            block_size,
        });
    };

    let padding = usize::from(last);
    if padding == 0 || padding > block_size {
        return Err(PaddingError::OutOfRange {
            value: last,
            block_size,
        });
    }

    let length = data.len() - padding;
    if let Some(offset) = data[length..].iter().position(|&b| b != last) {
        return Err(PaddingError::InvalidByte {
            position: length + offset,
            expected: last,
            found: data[length + offset],
        });
    }

    Ok(data[..length].to_vec())
}
