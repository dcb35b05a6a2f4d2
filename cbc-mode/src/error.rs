//! Error types for CBC mode and padding operations

use thiserror::Error;

/// Errors raised while binding a cipher and IV into a [`Cbc`](crate::Cbc) engine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConstructionError {
    #[error("Invalid IV length: {actual} bytes (must be {expected} bytes)")]
    InvalidIvLength { expected: usize, actual: usize },

    #[error("Unsupported cipher block size: {actual} bytes (must be {expected} bytes)")]
    UnsupportedBlockSize { expected: usize, actual: usize },
}

/// Errors raised when a buffer cannot be split into whole blocks.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SizeError {
    #[error("Invalid data size: {len} bytes (must be a multiple of {block_size} bytes)")]
    NotBlockAligned { len: usize, block_size: usize },
}

/// Errors raised while stripping PKCS#7 padding.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PaddingError {
    #[error("PKCS#7 invalid length: {len} bytes (need at least {block_size} bytes)")]
    TooShort { len: usize, block_size: usize },

    #[error("PKCS#7 padding byte out of range: {value} (must be 1..={block_size})")]
    OutOfRange { value: u8, block_size: usize },

    #[error("PKCS#7 invalid padding byte at offset {position}: expected {expected}, found {found}")]
    InvalidByte { position: usize, expected: u8, found: u8 },
}

/// Any failure surfaced by the CBC engine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CbcError {
    #[error(transparent)]
    Construction(#[from] ConstructionError),

    #[error(transparent)]
    Size(#[from] SizeError),

    #[error(transparent)]
    Padding(#[from] PaddingError),
}

pub type Result<T> = std::result::Result<T, CbcError>;
