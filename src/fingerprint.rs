use memmap2::Mmap;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FingerprintError {
    #[error("input unavailable: {0}")]
    InputUnavailable(#[from] std::io::Error),
}

/// SHA-256 content digest, lowercase hex. Identical bytes always produce the
/// same fingerprint, so it serves as the stable identity key for uploads.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint(pub String);

impl Fingerprint {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub struct Fingerprinter;

impl Fingerprinter {
    pub fn new() -> Self {
        Self
    }

    /// Fingerprint in-memory content. Never fails on valid bytes.
    pub fn fingerprint_bytes(&self, bytes: &[u8]) -> Fingerprint {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        Fingerprint(format!("{:x}", hasher.finalize()))
    }

    /// Fingerprint a file on disk via memory mapping.
    pub fn fingerprint_file<P: AsRef<Path>>(&self, path: P) -> Result<Fingerprint, FingerprintError> {
        let file = File::open(path.as_ref())?;
        // Zero-length files cannot be mapped.
        if file.metadata()?.len() == 0 {
            return Ok(self.fingerprint_bytes(&[]));
        }
        let mmap = unsafe { Mmap::map(&file)? };
        Ok(self.fingerprint_bytes(&mmap))
    }

    /// Fingerprint multiple files in parallel.
    /// Returns a (path, result) pair per input file.
    pub fn fingerprint_files_batch(
        &self,
        paths: &[PathBuf],
    ) -> Vec<(PathBuf, Result<Fingerprint, FingerprintError>)> {
        use rayon::prelude::*;

        paths
            .par_iter()
            .map(|path| (path.clone(), self.fingerprint_file(path)))
            .collect()
    }
}

impl Default for Fingerprinter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_fingerprint_is_deterministic() {
        let fp = Fingerprinter::new();

        let a = fp.fingerprint_bytes(b"Hello, World!");
        let b = fp.fingerprint_bytes(b"Hello, World!");
        assert_eq!(a, b);

        // 64 hex characters for SHA-256
        assert_eq!(a.as_str().len(), 64);
        assert!(a.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_different_bytes_different_fingerprint() {
        let fp = Fingerprinter::new();

        let a = fp.fingerprint_bytes(b"Content A");
        let b = fp.fingerprint_bytes(b"Content B");
        assert_ne!(a, b);
    }

    #[test]
    fn test_file_matches_bytes() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("scan.bin");
        let content = b"scanned sheet bytes";
        fs::write(&file_path, content).unwrap();

        let fp = Fingerprinter::new();
        let from_file = fp.fingerprint_file(&file_path).unwrap();
        let from_bytes = fp.fingerprint_bytes(content);
        assert_eq!(from_file, from_bytes);
    }

    #[test]
    fn test_empty_file() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("empty.bin");
        fs::write(&file_path, b"").unwrap();

        let fp = Fingerprinter::new();
        let from_file = fp.fingerprint_file(&file_path).unwrap();
        assert_eq!(from_file, fp.fingerprint_bytes(&[]));
    }

    #[test]
    fn test_missing_file_is_input_unavailable() {
        let fp = Fingerprinter::new();
        let result = fp.fingerprint_file("/nonexistent/scan.bin");
        assert!(matches!(result, Err(FingerprintError::InputUnavailable(_))));
    }

    #[test]
    fn test_batch_fingerprinting() {
        let temp_dir = TempDir::new().unwrap();
        let file1 = temp_dir.path().join("file1.bin");
        let file2 = temp_dir.path().join("file2.bin");
        fs::write(&file1, b"Content 1").unwrap();
        fs::write(&file2, b"Content 2").unwrap();

        let fp = Fingerprinter::new();
        let results = fp.fingerprint_files_batch(&[file1, file2]);

        assert_eq!(results.len(), 2);
        let hash1 = results[0].1.as_ref().unwrap();
        let hash2 = results[1].1.as_ref().unwrap();
        assert_ne!(hash1, hash2);
    }
}
