//! Hex text files: whitespace-tolerant input, space-separated byte output

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

/// Decodes hexadecimal text, ignoring spaces and line breaks
pub fn parse_hex(content: &str) -> Result<Vec<u8>> {
    let hex_string: String = content.chars().filter(|c| !c.is_whitespace()).collect();
    hex::decode(&hex_string).context("Invalid hexadecimal data")
}

/// Encodes bytes as lowercase hex pairs separated by single spaces
pub fn format_hex(data: &[u8]) -> String {
    data.iter()
        .map(|b| format!("{:02x}", b))
        .collect::<Vec<String>>()
        .join(" ")
}

pub fn read_hex_from_file(path: &Path) -> Result<Vec<u8>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    parse_hex(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

pub fn write_hex_to_file(path: &Path, data: &[u8]) -> Result<()> {
    fs::write(path, format_hex(data))
        .with_context(|| format!("Failed to write {}", path.display()))
}
