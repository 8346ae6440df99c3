//! Content digests in the form wheel RECORD files use.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use anyhow::{Context, Result};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use sha2::{Digest, Sha256};

/// Digest algorithm name written into RECORD entries.
pub const RECORD_ALGORITHM: &str = "sha256";

/// SHA256 of a byte slice, base64-url encoded without padding.
pub fn sha256_urlsafe(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    URL_SAFE_NO_PAD.encode(hasher.finalize())
}

/// Digest and byte length of a file, streamed.
pub fn file_digest(path: &Path) -> Result<(String, u64)> {
    let file = File::open(path)
        .with_context(|| format!("failed to open file for hashing: {}", path.display()))?;

    let mut reader = BufReader::new(file);
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 8192];
    let mut len = 0u64;

    loop {
        let bytes_read = reader
            .read(&mut buffer)
            .with_context(|| format!("failed to read {}", path.display()))?;
        if bytes_read == 0 {
            break;
        }
        len += bytes_read as u64;
        hasher.update(&buffer[..bytes_read]);
    }

    Ok((URL_SAFE_NO_PAD.encode(hasher.finalize()), len))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_sha256_urlsafe() {
        assert_eq!(
            sha256_urlsafe(b"hello"),
            "LPJNul-wow4m6DsqxbninhsWHlwfp0JecwQzYpOLmCQ"
        );
        assert_eq!(
            sha256_urlsafe(b""),
            "47DEQpj8HBSa-_TImW-5JCeuQeRkm5NMpJWZG3hSuFU"
        );
    }

    #[test]
    fn test_file_digest_matches_bytes() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("data.bin");
        let data: Vec<u8> = (0..20_000u32).map(|i| (i % 251) as u8).collect();
        std::fs::write(&path, &data).unwrap();

        let (digest, len) = file_digest(&path).unwrap();
        assert_eq!(digest, sha256_urlsafe(&data));
        assert_eq!(len, 20_000);
        assert!(!digest.contains('='));
    }
}
