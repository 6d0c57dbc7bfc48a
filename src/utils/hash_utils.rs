use std::io;
use std::path::Path;

use log::trace;
use sha2::{Digest, Sha256};

use super::file_utils;

/// Calculate SHA-256 hash of a byte buffer
pub fn hash_bytes(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    format!("{:x}", hasher.finalize())
}

/// Calculate SHA-256 hash of a file's binary content
pub fn hash_file(path: impl AsRef<Path>) -> io::Result<String> {
    let path = path.as_ref();
    trace!("Calculating hash for file: {}", path.display());

    let content = file_utils::read_file_bytes(path)?;
    Ok(hash_bytes(&content))
}
