//! SHA-256 verification of downloaded files

use crate::error::{Error, Result};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::Read;
use std::path::Path;

const READ_BUFFER_SIZE: usize = 64 * 1024;

/// Hex-encoded SHA-256 digest of the file at `path`
pub fn sha256_file(path: &Path) -> Result<String> {
    let file_error = |e: std::io::Error| Error::FileError {
        path: path.to_path_buf(),
        reason: e.to_string(),
    };

    let mut file = File::open(path).map_err(file_error)?;
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; READ_BUFFER_SIZE];
    loop {
        let n = file.read(&mut buffer).map_err(file_error)?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }

    Ok(hex::encode(hasher.finalize()))
}

/// Check the file at `path` against a published hex SHA-256 digest
///
/// Hex case is ignored.
pub fn verify_sha256(path: &Path, expected: &str) -> Result<()> {
    let actual = sha256_file(path)?;
    if actual.eq_ignore_ascii_case(expected.trim()) {
        Ok(())
    } else {
        Err(Error::ChecksumMismatch {
            path: path.to_path_buf(),
            expected: expected.to_string(),
            actual,
        })
    }
}
