//! SHA-256 checks over downloaded files

use sdk::MnError;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Compute the SHA-256 hash of `data` and return hex string
pub fn compute_hash(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Compute the SHA-256 hash of a file without loading it into memory
pub fn hash_file(path: &Path) -> Result<String, MnError> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 64 * 1024];
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Verify that the SHA-256 hash of the file at `path` matches `expected_hex`
///
/// Comparison ignores case, since published checksums come in both forms.
pub fn verify_file(path: &Path, expected_hex: &str) -> Result<(), MnError> {
    let computed = hash_file(path)?;
    let expected = expected_hex.trim();

    if !computed.eq_ignore_ascii_case(expected) {
        return Err(MnError::ChecksumMismatch {
            expected: expected.to_string(),
            actual: computed,
        });
    }

    Ok(())
}
