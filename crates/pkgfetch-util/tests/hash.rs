use pkgfetch_util::hash::{checksum_mismatch, sha256_file};
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

const HELLO_SHA256: &str = "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824";

fn file_with(content: &[u8]) -> NamedTempFile {
    let mut tmp = NamedTempFile::new().unwrap();
    tmp.write_all(content).unwrap();
    tmp.flush().unwrap();
    tmp
}

#[test]
fn test_sha256_file_empty() {
    let tmp = file_with(b"");
    assert_eq!(
        sha256_file(tmp.path()).unwrap(),
        "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
    );
}

#[test]
fn test_sha256_file_hello() {
    let tmp = file_with(b"hello");
    assert_eq!(sha256_file(tmp.path()).unwrap(), HELLO_SHA256);
}

#[test]
fn test_sha256_file_not_found() {
    let result = sha256_file(Path::new("/nonexistent/path/file.rpm"));
    assert!(result.is_err());
}

#[test]
fn test_checksum_mismatch_reports_actual_digest() {
    let tmp = file_with(b"hello");

    assert_eq!(checksum_mismatch(tmp.path(), HELLO_SHA256).unwrap(), None);
    assert_eq!(
        checksum_mismatch(tmp.path(), &HELLO_SHA256.to_uppercase()).unwrap(),
        None
    );
    let other = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";
    assert_eq!(
        checksum_mismatch(tmp.path(), other).unwrap(),
        Some(HELLO_SHA256.to_string())
    );
}
