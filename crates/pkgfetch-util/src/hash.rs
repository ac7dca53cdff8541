//! SHA-256 checksums of cached package artifacts.

use std::fs::File;
use std::path::Path;

use sha2::{Digest, Sha256};

/// Lowercase hex SHA-256 of the file at `path`, streamed.
pub fn sha256_file(path: &Path) -> std::io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    std::io::copy(&mut file, &mut hasher)?;
    Ok(format!("{:x}", hasher.finalize()))
}

/// Compare the file at `path` against an expected hex digest.
///
/// Returns the actual digest if it differs. Case is ignored.
pub fn checksum_mismatch(path: &Path, expected: &str) -> std::io::Result<Option<String>> {
    let actual = sha256_file(path)?;
    Ok((!actual.eq_ignore_ascii_case(expected.trim())).then_some(actual))
}
