//! CBC (Cipher Block Chaining) mode implementation

use std::fmt;

use tracing::{debug, trace};

use crate::error::{ConstructionError, SizeError};
use crate::padding::Padding;
use crate::{utils, BlockCipher, CbcError, Result};

/// Required IV size, and with it the block size of the bound cipher
pub const IV_SIZE: usize = 16;

/// A CBC engine bound to a cipher, an IV and optionally a padding scheme.
///
/// The engine keeps no chaining state between calls: every `encrypt` and
/// `decrypt` starts again from the IV. The cipher and padding are borrowed
/// for the lifetime of the engine and never mutated by it.
///
/// ```rust
/// use cbc_mode::{Cbc, Pkcs7, XorCipher};
///
/// let cipher = XorCipher::new([0x5c; 16]);
/// let iv = [0u8; 16];
/// let cbc = Cbc::with_padding(&cipher, &iv, &Pkcs7)?;
///
/// let ciphertext = cbc.encrypt(b"Hello, World!")?;
/// assert_eq!(ciphertext.len(), 16);
/// assert_eq!(cbc.decrypt(&ciphertext)?, b"Hello, World!");
/// # Ok::<(), cbc_mode::CbcError>(())
/// ```
#[derive(Clone, Copy)]
pub struct Cbc<'a> {
    cipher: &'a (dyn BlockCipher + Sync),
    iv: [u8; IV_SIZE],
    padding: Option<&'a (dyn Padding + Sync)>,
}

impl<'a> Cbc<'a> {
    /// Binds `cipher` and a private copy of `iv`, with optional `padding`.
    ///
    /// Fails unless `iv` is exactly [`IV_SIZE`] bytes and the cipher works on
    /// blocks of that same size.
    pub fn new(
        cipher: &'a (dyn BlockCipher + Sync),
        iv: &[u8],
        padding: Option<&'a (dyn Padding + Sync)>,
    ) -> Result<Self> {
        let iv: [u8; IV_SIZE] = iv.try_into().map_err(|_| ConstructionError::InvalidIvLength {
            expected: IV_SIZE,
            actual: iv.len(),
        })?;

        if cipher.block_size() != IV_SIZE {
            return Err(ConstructionError::UnsupportedBlockSize {
                expected: IV_SIZE,
                actual: cipher.block_size(),
            }
            .into());
        }

        Ok(Self { cipher, iv, padding })
    }

    /// Shorthand for [`Cbc::new`] with a padding scheme
    pub fn with_padding(
        cipher: &'a (dyn BlockCipher + Sync),
        iv: &[u8],
        padding: &'a (dyn Padding + Sync),
    ) -> Result<Self> {
        Self::new(cipher, iv, Some(padding))
    }

    /// Shorthand for [`Cbc::new`] without padding; inputs must be block aligned
    pub fn unpadded(cipher: &'a (dyn BlockCipher + Sync), iv: &[u8]) -> Result<Self> {
        Self::new(cipher, iv, None)
    }

    pub fn iv(&self) -> &[u8; IV_SIZE] {
        &self.iv
    }

    pub fn block_size(&self) -> usize {
        self.cipher.block_size()
    }

    pub fn is_padded(&self) -> bool {
        self.padding.is_some()
    }

    /// Encrypts a whole message, padding it first when a scheme is bound.
    ///
    /// The result is a new buffer whose length is a multiple of the block
    /// size; `plaintext` is never modified.
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        let block_size = self.block_size();

        let mut buffer = match self.padding {
            Some(padding) => padding.pad(plaintext, block_size),
            None => {
                check_aligned(plaintext.len(), block_size)?;
                plaintext.to_vec()
            }
        };
        // a custom padding scheme may not honour the block size
        check_aligned(buffer.len(), block_size)?;

        let mut chain = self.iv;
        for block in buffer.chunks_exact_mut(block_size) {
            utils::xor_in_place(block, &chain);
            self.cipher.encrypt_block(block);
            chain.copy_from_slice(block);
        }

        trace!(
            plaintext_len = plaintext.len(),
            blocks = buffer.len() / block_size,
            "cbc encrypt"
        );
        Ok(buffer)
    }

    /// Decrypts a whole message, stripping padding when a scheme is bound.
    ///
    /// Either the fully validated plaintext is returned or an error; no
    /// partially stripped output escapes on failure.
    pub fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>> {
        let block_size = self.block_size();
        check_aligned(ciphertext.len(), block_size)?;

        let mut buffer = ciphertext.to_vec();
        let mut chain = self.iv;
        for (block, original) in buffer
            .chunks_exact_mut(block_size)
            .zip(ciphertext.chunks_exact(block_size))
        {
            self.cipher.decrypt_block(block);
            utils::xor_in_place(block, &chain);
            chain.copy_from_slice(original);
        }

        trace!(
            ciphertext_len = ciphertext.len(),
            blocks = ciphertext.len() / block_size,
            "cbc decrypt"
        );

        match self.padding {
            Some(padding) => padding.strip(&buffer, block_size).map_err(|err| {
                debug!(error = %err, "rejecting decrypted message");
                CbcError::from(err)
            }),
            None => Ok(buffer),
        }
    }
}

impl fmt::Debug for Cbc<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cbc")
            .field("block_size", &self.block_size())
            .field("iv", &self.iv)
            .field("padded", &self.is_padded())
            .finish_non_exhaustive()
    }
}

fn check_aligned(len: usize, block_size: usize) -> std::result::Result<(), SizeError> {
    if utils::is_block_aligned(len, block_size) {
        Ok(())
    } else {
        Err(SizeError::NotBlockAligned { len, block_size })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PaddingError;
    use crate::{IdentityCipher, Pkcs7, XorCipher};

    const KEY: [u8; 16] = *b"0123456789abcdef";

    /// Byte-wise add/subtract of a key; not an involution, so mixing up the
    /// two directions shows up in the output.
    struct AddCipher([u8; 16]);

    impl BlockCipher for AddCipher {
        fn block_size(&self) -> usize {
            16
        }

        fn encrypt_block(&self, block: &mut [u8]) {
            for (b, k) in block.iter_mut().zip(self.0) {
                *b = b.wrapping_add(k).rotate_left(3);
            }
        }

        fn decrypt_block(&self, block: &mut [u8]) {
            for (b, k) in block.iter_mut().zip(self.0) {
                *b = b.rotate_right(3).wrapping_sub(k);
            }
        }
    }

    struct EightByteCipher;

    impl BlockCipher for EightByteCipher {
        fn block_size(&self) -> usize {
            8
        }

        fn encrypt_block(&self, _block: &mut [u8]) {}

        fn decrypt_block(&self, _block: &mut [u8]) {}
    }

    /// Pads to one byte short of a block, to exercise the post-pad check
    struct BrokenPadding;

    impl Padding for BrokenPadding {
        fn pad(&self, data: &[u8], block_size: usize) -> Vec<u8> {
            let mut out = data.to_vec();
            out.resize(block_size - 1, 0);
            out
        }

        fn strip(&self, data: &[u8], _block_size: usize) -> std::result::Result<Vec<u8>, PaddingError> {
            Ok(data.to_vec())
        }
    }

    fn xor(a: &[u8], b: &[u8]) -> Vec<u8> {
        a.iter().zip(b).map(|(x, y)| x ^ y).collect()
    }

    #[test]
    fn test_identity_cipher_zero_iv() {
        let cipher = IdentityCipher::new();
        let cbc = Cbc::unpadded(&cipher, &[0u8; 16]).unwrap();

        let ciphertext = cbc.encrypt(&[0x41; 16]).unwrap();
        assert_eq!(ciphertext, vec![0x41; 16]);
        assert_eq!(cbc.decrypt(&ciphertext).unwrap(), vec![0x41; 16]);
    }

    #[test]
    fn test_identity_cipher_chains_blocks() {
        let cipher = IdentityCipher::new();
        let iv = [0x10u8; 16];
        let cbc = Cbc::unpadded(&cipher, &iv).unwrap();

        let plaintext = [0x01u8; 32];
        let ciphertext = cbc.encrypt(&plaintext).unwrap();

        let c0 = xor(&plaintext[..16], &iv);
        let c1 = xor(&plaintext[16..], &c0);
        assert_eq!(&ciphertext[..16], &c0[..]);
        assert_eq!(&ciphertext[16..], &c1[..]);
    }

    #[test]
    fn test_encrypt_matches_hand_chained_blocks() {
        let cipher = XorCipher::new(KEY);
        let iv = *b"initialization16";
        let cbc = Cbc::unpadded(&cipher, &iv).unwrap();

        let plaintext = b"first block 16b!second block 16!third block  16b";
        let ciphertext = cbc.encrypt(plaintext).unwrap();

        let mut chain = iv.to_vec();
        for (i, p) in plaintext.chunks(16).enumerate() {
            let expected = xor(&xor(p, &chain), &KEY);
            assert_eq!(&ciphertext[i * 16..(i + 1) * 16], &expected[..], "block {i}");
            chain = expected;
        }
    }

    #[test]
    fn test_decrypt_chains_on_ciphertext() {
        let cipher = AddCipher(KEY);
        let iv = [0x33u8; 16];
        let cbc = Cbc::unpadded(&cipher, &iv).unwrap();

        let plaintext: Vec<u8> = (0..64u8).collect();
        let ciphertext = cbc.encrypt(&plaintext).unwrap();
        assert_eq!(cbc.decrypt(&ciphertext).unwrap(), plaintext);

        // flipping a bit in block 1 garbles block 1 and flips the same bit in block 2 only
        let mut tampered = ciphertext.clone();
        tampered[16] ^= 0x80;
        let decrypted = cbc.decrypt(&tampered).unwrap();
        assert_eq!(&decrypted[..16], &plaintext[..16]);
        assert_ne!(&decrypted[16..32], &plaintext[16..32]);
        assert_eq!(decrypted[32], plaintext[32] ^ 0x80);
        assert_eq!(&decrypted[33..], &plaintext[33..]);
    }

    #[test]
    fn test_round_trip_with_padding() {
        let cipher = AddCipher(KEY);
        let cbc = Cbc::with_padding(&cipher, b"initialization16", &Pkcs7).unwrap();

        for len in 0..100 {
            let plaintext: Vec<u8> = (0..len).map(|i| (i * 7) as u8).collect();
            let ciphertext = cbc.encrypt(&plaintext).unwrap();
            assert_eq!(ciphertext.len(), (len / 16 + 1) * 16);
            assert_eq!(cbc.decrypt(&ciphertext).unwrap(), plaintext, "len {len}");
        }
    }

    #[test]
    fn test_deterministic_and_stateless() {
        let cipher = XorCipher::new(KEY);
        let cbc = Cbc::with_padding(&cipher, &[7u8; 16], &Pkcs7).unwrap();

        let first = cbc.encrypt(b"same message").unwrap();
        let _other = cbc.encrypt(b"an unrelated message in between").unwrap();
        let second = cbc.encrypt(b"same message").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_iv_sensitivity() {
        let cipher = AddCipher(KEY);
        let a = Cbc::with_padding(&cipher, &[0u8; 16], &Pkcs7).unwrap();
        let mut iv = [0u8; 16];
        iv[15] = 1;
        let b = Cbc::with_padding(&cipher, &iv, &Pkcs7).unwrap();

        let plaintext = [0x42u8; 40];
        let ca = a.encrypt(&plaintext).unwrap();
        let cb = b.encrypt(&plaintext).unwrap();
        assert_ne!(&ca[..16], &cb[..16]);
        assert_ne!(ca, cb);
    }

    #[test]
    fn test_invalid_iv_length() {
        let cipher = IdentityCipher::new();
        for len in [0, 8, 15, 17, 32] {
            let result = Cbc::unpadded(&cipher, &vec![0u8; len]);
            assert_eq!(
                result.unwrap_err(),
                CbcError::Construction(ConstructionError::InvalidIvLength {
                    expected: 16,
                    actual: len,
                })
            );
        }
    }

    #[test]
    fn test_unsupported_block_size() {
        let result = Cbc::unpadded(&EightByteCipher, &[0u8; 16]);
        assert!(matches!(
            result,
            Err(CbcError::Construction(ConstructionError::UnsupportedBlockSize {
                expected: 16,
                actual: 8,
            }))
        ));
    }

    #[test]
    fn test_iv_is_copied() {
        let cipher = IdentityCipher::new();
        let mut iv = vec![1u8; 16];
        let cbc = Cbc::unpadded(&cipher, &iv).unwrap();
        iv.fill(0xff);
        drop(iv);
        assert_eq!(cbc.iv(), &[1u8; 16]);
    }

    #[test]
    fn test_unaligned_without_padding() {
        let cipher = IdentityCipher::new();
        let unpadded = Cbc::unpadded(&cipher, &[0u8; 16]).unwrap();

        assert_eq!(
            unpadded.encrypt(&[0u8; 17]),
            Err(CbcError::Size(SizeError::NotBlockAligned { len: 17, block_size: 16 }))
        );

        let padded = Cbc::with_padding(&cipher, &[0u8; 16], &Pkcs7).unwrap();
        assert_eq!(padded.encrypt(&[0u8; 17]).unwrap().len(), 32);
    }

    #[test]
    fn test_decrypt_unaligned() {
        let cipher = IdentityCipher::new();
        let cbc = Cbc::with_padding(&cipher, &[0u8; 16], &Pkcs7).unwrap();
        assert_eq!(
            cbc.decrypt(&[0u8; 31]),
            Err(CbcError::Size(SizeError::NotBlockAligned { len: 31, block_size: 16 }))
        );
    }

    #[test]
    fn test_misbehaving_padding_is_caught() {
        let cipher = IdentityCipher::new();
        let cbc = Cbc::with_padding(&cipher, &[0u8; 16], &BrokenPadding).unwrap();
        assert!(matches!(
            cbc.encrypt(b"abc"),
            Err(CbcError::Size(SizeError::NotBlockAligned { len: 15, .. }))
        ));
    }

    #[test]
    fn test_empty_input() {
        let cipher = XorCipher::new(KEY);
        let unpadded = Cbc::unpadded(&cipher, &[0u8; 16]).unwrap();
        assert_eq!(unpadded.encrypt(&[]).unwrap(), Vec::<u8>::new());
        assert_eq!(unpadded.decrypt(&[]).unwrap(), Vec::<u8>::new());

        let padded = Cbc::with_padding(&cipher, &[0u8; 16], &Pkcs7).unwrap();
        assert_eq!(padded.encrypt(&[]).unwrap().len(), 16);
        assert_eq!(
            padded.decrypt(&[]),
            Err(CbcError::Padding(PaddingError::TooShort { len: 0, block_size: 16 }))
        );
    }

    #[test]
    fn test_bad_padding_after_decrypt() {
        let cipher = IdentityCipher::new();
        let unpadded = Cbc::unpadded(&cipher, &[0u8; 16]).unwrap();
        let padded = Cbc::with_padding(&cipher, &[0u8; 16], &Pkcs7).unwrap();

        // a plaintext ending in 0x00 can never come out of pad()
        let ciphertext = unpadded.encrypt(&[0u8; 16]).unwrap();
        assert!(matches!(
            padded.decrypt(&ciphertext),
            Err(CbcError::Padding(PaddingError::OutOfRange { value: 0, .. }))
        ));

        let mut forged = [0x41u8; 16];
        forged[14] = 2;
        forged[15] = 3;
        let ciphertext = unpadded.encrypt(&forged).unwrap();
        assert!(matches!(
            padded.decrypt(&ciphertext),
            Err(CbcError::Padding(PaddingError::InvalidByte { position: 13, .. }))
        ));
    }

    #[test]
    fn test_inputs_left_untouched() {
        let cipher = AddCipher(KEY);
        let cbc = Cbc::unpadded(&cipher, &[9u8; 16]).unwrap();

        let plaintext = vec![0x11u8; 32];
        let ciphertext = cbc.encrypt(&plaintext).unwrap();
        assert_eq!(plaintext, vec![0x11u8; 32]);

        let snapshot = ciphertext.clone();
        let _ = cbc.decrypt(&ciphertext).unwrap();
        assert_eq!(ciphertext, snapshot);
    }

    #[test]
    fn test_accessors_and_debug() {
        let cipher = IdentityCipher::new();
        let cbc = Cbc::with_padding(&cipher, &[0u8; 16], &Pkcs7).unwrap();
        assert_eq!(cbc.block_size(), 16);
        assert!(cbc.is_padded());
        assert!(!Cbc::unpadded(&cipher, &[0u8; 16]).unwrap().is_padded());
        assert!(format!("{cbc:?}").starts_with("Cbc { block_size: 16"));
    }
}
