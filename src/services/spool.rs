use crate::fingerprint::Fingerprint;
use std::fs;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SpoolError {
    #[error("spool I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Content-addressed staging area for uploaded bytes. `submit` writes here so
/// a later `process_anyway` resolution can re-read the content by identity
/// alone, without the caller re-uploading.
pub struct UploadSpool {
    root: PathBuf,
}

impl UploadSpool {
    pub fn new<P: Into<PathBuf>>(root: P) -> Result<Self, SpoolError> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn path_for(&self, fingerprint: &Fingerprint) -> PathBuf {
        self.root.join(fingerprint.as_str())
    }

    /// Store the bytes under their fingerprint. Idempotent: the same
    /// fingerprint always names the same bytes, so an existing file is left
    /// alone.
    pub fn store(&self, fingerprint: &Fingerprint, bytes: &[u8]) -> Result<PathBuf, SpoolError> {
        let path = self.path_for(fingerprint);
        if !path.exists() {
            fs::write(&path, bytes)?;
        }
        Ok(path)
    }

    pub fn read(&self, fingerprint: &Fingerprint) -> Result<Vec<u8>, SpoolError> {
        Ok(fs::read(self.path_for(fingerprint))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fingerprint::Fingerprinter;
    use tempfile::TempDir;

    #[test]
    fn test_store_and_read_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let spool = UploadSpool::new(temp_dir.path().join("uploads")).unwrap();
        let fp = Fingerprinter::new().fingerprint_bytes(b"sheet bytes");

        let path = spool.store(&fp, b"sheet bytes").unwrap();
        assert!(path.is_file());
        assert_eq!(spool.read(&fp).unwrap(), b"sheet bytes");
    }

    #[test]
    fn test_store_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let spool = UploadSpool::new(temp_dir.path().join("uploads")).unwrap();
        let fp = Fingerprinter::new().fingerprint_bytes(b"sheet bytes");

        let first = spool.store(&fp, b"sheet bytes").unwrap();
        let second = spool.store(&fp, b"sheet bytes").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_read_missing_content() {
        let temp_dir = TempDir::new().unwrap();
        let spool = UploadSpool::new(temp_dir.path().join("uploads")).unwrap();
        let fp = Fingerprint("feedbeef".to_string());

        assert!(matches!(spool.read(&fp), Err(SpoolError::Io(_))));
    }
}
