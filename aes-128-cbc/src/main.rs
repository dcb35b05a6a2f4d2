//! AES-128 file encryption in CBC mode
//!
//! Reads plaintext or ciphertext, a 16-byte key and a 16-byte IV from
//! hexadecimal text files and writes the result as hexadecimal text.
//! PKCS#7 padding is applied unless `--no-padding` is given.

mod aes;
mod hexio;

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use cbc_mode::{Cbc, Pkcs7, IV_SIZE};
use clap::{Parser, ValueEnum};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::aes::{Aes128, KEY_SIZE};

/// Command-line arguments for the AES-128-CBC program.
#[derive(Parser, Debug)]
#[command(
    name = "aes-128-cbc",
    version,
    about = "AES-128 encryption and decryption of hex files in CBC mode"
)]
struct Cli {
    /// Path to the input file.
    #[arg(short, long, help = "Path to the input file (hex)")]
    file: PathBuf,

    /// Key for the cipher.
    #[arg(short, long, help = "File containing the 16-byte key (hex)")]
    key: PathBuf,

    /// Initialization vector.
    #[arg(short, long, help = "File containing the 16-byte IV (hex)")]
    iv: PathBuf,

    /// Path to the output file.
    #[arg(short, long, help = "Path to the output file")]
    output: PathBuf,

    /// Mode of operation (encrypt or decrypt).
    #[arg(short, long, help = "Mode of operation (encrypt/decrypt)")]
    mode: OperationMode,

    /// Skip PKCS#7; input must then be a multiple of 16 bytes.
    #[arg(long, help = "Disable PKCS#7 padding")]
    no_padding: bool,

    #[arg(short, long, help = "Log at debug level unless RUST_LOG is set")]
    verbose: bool,
}

/// Enum representing the mode of operation for the cipher.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OperationMode {
    /// Encrypt mode.
    Encrypt,
    /// Decrypt mode.
    Decrypt,
}

fn init_tracing(verbose: bool) -> Result<()> {
    let default_level = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::WARN
    };

    tracing::subscriber::set_global_default(
        tracing_subscriber::FmtSubscriber::builder()
            .with_env_filter(
                EnvFilter::builder()
                    .with_default_directive(default_level.into())
                    .from_env_lossy(),
            )
            .with_writer(std::io::stderr)
            .finish(),
    )
    .context("Failed to install the log subscriber")
}

fn read_fixed<const N: usize>(path: &Path, what: &str) -> Result<[u8; N]> {
    let bytes = hexio::read_hex_from_file(path)?;
    let len = bytes.len();
    bytes
        .try_into()
        .map_err(|_| anyhow!("Invalid {what} length: {len} bytes, expected {N} bytes"))
}

/// Runs one encryption or decryption over in-memory data
fn process(
    mode: OperationMode,
    key: &[u8; KEY_SIZE],
    iv: &[u8; IV_SIZE],
    padded: bool,
    input: &[u8],
) -> Result<Vec<u8>> {
    let cipher = Aes128::new(key);
    let cbc = if padded {
        Cbc::with_padding(&cipher, iv, &Pkcs7)?
    } else {
        Cbc::unpadded(&cipher, iv)?
    };

    let output = match mode {
        OperationMode::Encrypt => cbc.encrypt(input).context("Encryption failed")?,
        OperationMode::Decrypt => cbc.decrypt(input).context("Decryption failed")?,
    };
    Ok(output)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    // Read input, key and IV
    let text_data = hexio::read_hex_from_file(&cli.file)?;
    let key = read_fixed::<KEY_SIZE>(&cli.key, "key")?;
    let iv = read_fixed::<IV_SIZE>(&cli.iv, "IV")?;
    tracing::debug!(
        mode = ?cli.mode,
        input_len = text_data.len(),
        padding = !cli.no_padding,
        "processing {}",
        cli.file.display()
    );

    let result = process(cli.mode, &key, &iv, !cli.no_padding, &text_data)?;

    hexio::write_hex_to_file(&cli.output, &result)?;
    tracing::info!(
        output_len = result.len(),
        "wrote {}",
        cli.output.display()
    );
    Ok(())
}
