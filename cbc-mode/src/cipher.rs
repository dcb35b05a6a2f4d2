//! Generic block cipher trait

/// A keyed block cipher transforming one block at a time, in place.
///
/// Implementations are expected to be fully initialized (key scheduled)
/// before being handed to a mode of operation, and must not keep mutable
/// state between calls.
pub trait BlockCipher {
    /// Returns the block size of the cipher in bytes
    fn block_size(&self) -> usize;

    /// Encrypts exactly one block of `block_size()` bytes in place
    fn encrypt_block(&self, block: &mut [u8]);

    /// Decrypts exactly one block of `block_size()` bytes in place
    fn decrypt_block(&self, block: &mut [u8]);
}

impl<C: BlockCipher + ?Sized> BlockCipher for &C {
    fn block_size(&self) -> usize {
        (**self).block_size()
    }

    fn encrypt_block(&self, block: &mut [u8]) {
        (**self).encrypt_block(block)
    }

    fn decrypt_block(&self, block: &mut [u8]) {
        (**self).decrypt_block(block)
    }
}
