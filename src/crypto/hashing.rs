// Content hashing for documents: SHA-256 over the raw file bytes.

use std::fmt;
use std::path::Path;

use sha2::{Digest, Sha256};

use crate::infra::error::HashError;

/// Length of a digest in hex characters.
pub const DIGEST_HEX_LEN: usize = 64;

/// A SHA-256 content digest of a document.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct DocumentDigest([u8; 32]);

impl DocumentDigest {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Lowercase hex, no prefix.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for DocumentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for DocumentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DocumentDigest({})", self.to_hex())
    }
}

/// Hashes an in-memory buffer.
pub fn hash_bytes(bytes: &[u8]) -> DocumentDigest {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    DocumentDigest(hasher.finalize().into())
}

/// Reads the whole file into memory and hashes it.
pub fn hash_file(path: &Path) -> Result<DocumentDigest, HashError> {
    let bytes = std::fs::read(path).map_err(|source| HashError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(hash_bytes(&bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn matches_reference_vectors() {
        assert_eq!(
            hash_bytes(b"").to_hex(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_eq!(
            hash_bytes(b"abc").to_hex(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        // 56 bytes: forces the length into a second padding block.
        assert_eq!(
            hash_bytes(b"abcdbcdecdefdefgefghfghighijhijkijkljklmklmnlmnomnopnopq").to_hex(),
            "248d6a61d20638b8e5c026930c3e6039a33ce45964ff2167f6ecedd419db06c1"
        );
    }

    #[test]
    fn odd_length_inputs_are_not_padded() {
        // 43 bytes, not a multiple of 4 or 64.
        assert_eq!(
            hash_bytes(b"The quick brown fox jumps over the lazy dog").to_hex(),
            "d7a8fbb307d7809469ca9abcb0082e4f8d5651e46d3cdb762d02d0bf37c9e592"
        );
        assert_ne!(hash_bytes(b"abc"), hash_bytes(b"abc\0"));
    }

    #[test]
    fn million_a() {
        let input = vec![b'a'; 1_000_000];
        assert_eq!(
            hash_bytes(&input).to_hex(),
            "cdc76e5c9914fb9281a1c7e284d73e67f1809a48a497200e046d39ccc7112cd0"
        );
    }

    #[test]
    fn file_hash_is_deterministic_and_fixed_length() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"contract.pdf contents").unwrap();

        let a = hash_file(file.path()).unwrap();
        let b = hash_file(file.path()).unwrap();
        assert_eq!(a, b);
        assert_eq!(a, hash_bytes(b"contract.pdf contents"));
        assert_eq!(a.to_hex().len(), DIGEST_HEX_LEN);
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = hash_file(&dir.path().join("nope.bin")).unwrap_err();
        assert!(matches!(err, HashError::Io { .. }));
    }
}
