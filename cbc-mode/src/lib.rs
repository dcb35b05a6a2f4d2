//! # CBC Mode Library
//!
//! Cipher Block Chaining (CBC) mode of operation with PKCS#7 padding, for any
//! 128-bit block cipher that can encrypt and decrypt one block in place.
//!
//! ## Usage
//!
//! ```rust
//! use cbc_mode::{Cbc, Pkcs7, XorCipher};
//!
//! // Create a cipher (replace with your AES implementation)
//! let cipher = XorCipher::new(*b"my-secret-key-16");
//! let iv = b"initialization16";
//!
//! // Encrypt with PKCS#7 padding
//! let cbc = Cbc::with_padding(&cipher, iv, &Pkcs7)?;
//! let encrypted = cbc.encrypt(b"Hello, World!")?;
//!
//! // Decrypt
//! let decrypted = cbc.decrypt(&encrypted)?;
//! assert_eq!(decrypted, b"Hello, World!");
//! # Ok::<(), cbc_mode::CbcError>(())
//! ```
//!
//! ## Features
//!
//! - Generic `BlockCipher` trait for easy integration with any block cipher
//! - Pluggable `Padding` trait, with PKCS#7 provided
//! - Typed errors for IV, alignment and padding failures

// Public modules
pub mod cbc;
pub mod cipher;
pub mod error;
pub mod padding;
pub mod utils;

// Re-exports for easy access
pub use cbc::{Cbc, IV_SIZE};
pub use cipher::BlockCipher;
pub use error::{CbcError, ConstructionError, PaddingError, Result, SizeError};
pub use padding::{Padding, Pkcs7, DEFAULT_BLOCK_SIZE};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Block cipher that leaves every block unchanged
///
/// Only useful for testing the chaining logic in isolation: with this cipher
/// a CBC ciphertext block is exactly the plaintext block XORed with the
/// previous ciphertext block (or the IV).
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityCipher;

impl IdentityCipher {
    pub fn new() -> Self {
        Self
    }
}

impl BlockCipher for IdentityCipher {
    fn block_size(&self) -> usize {
        IV_SIZE
    }

    fn encrypt_block(&self, _block: &mut [u8]) {}

    fn decrypt_block(&self, _block: &mut [u8]) {}
}

/// Dummy cipher XORing each block with a fixed 16-byte key
///
/// This "cipher" should **never** be used in production. It's only provided
/// for testing and demonstrating the mode without a real cipher.
///
/// # Example
///
/// ```rust
/// use cbc_mode::{BlockCipher, XorCipher};
///
/// let cipher = XorCipher::new([0xff; 16]);
/// let mut block = [0x0f; 16];
/// cipher.encrypt_block(&mut block);
/// assert_eq!(block, [0xf0; 16]);
/// ```
#[derive(Debug, Clone)]
pub struct XorCipher {
    key: [u8; IV_SIZE],
}

impl XorCipher {
    pub fn new(key: [u8; IV_SIZE]) -> Self {
        Self { key }
    }
}

impl BlockCipher for XorCipher {
    fn block_size(&self) -> usize {
        IV_SIZE
    }

    fn encrypt_block(&self, block: &mut [u8]) {
        utils::xor_in_place(block, &self.key);
    }

    /// For XOR, decryption is identical to encryption
    fn decrypt_block(&self, block: &mut [u8]) {
        self.encrypt_block(block);
    }
}
