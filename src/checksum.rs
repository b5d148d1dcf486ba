//! Content checksums for change detection of generated files

use sha2::{Digest, Sha256};
use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

/// SHA256 checksum of file content
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Checksum(String);

impl Checksum {
    /// Compute checksum from raw bytes
    pub fn from_bytes(data: &[u8]) -> Self {
        let hash = Sha256::digest(data);
        Self(format!("{:x}", hash))
    }

    /// Compute checksum from a string
    pub fn of_str(content: &str) -> Self {
        Self::from_bytes(content.as_bytes())
    }

    /// Checksum of a file on disk, `None` when it does not exist
    pub fn of_file(path: &Path) -> io::Result<Option<Self>> {
        match fs::read(path) {
            Ok(data) => Ok(Some(Self::from_bytes(&data))),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Get the hex string representation
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Verify that content matches this checksum
    pub fn verify(&self, content: &str) -> bool {
        *self == Self::of_str(content)
    }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checksum_consistency() {
        let content = "<Package><Name>portal</Name></Package>";
        assert_eq!(Checksum::of_str(content), Checksum::of_str(content));
        assert_eq!(Checksum::of_str(content).as_str().len(), 64);
    }

    #[test]
    fn test_checksum_different_content() {
        assert_ne!(Checksum::of_str("package portal"), Checksum::of_str("package common"));
    }

    #[test]
    fn test_checksum_verification() {
        let checksum = Checksum::of_str("generated");
        assert!(checksum.verify("generated"));
        assert!(!checksum.verify("different content"));
    }

    #[test]
    fn test_checksum_of_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");
        assert_eq!(Checksum::of_file(&path).unwrap(), None);

        std::fs::write(&path, "generated").unwrap();
        assert_eq!(Checksum::of_file(&path).unwrap(), Some(Checksum::of_str("generated")));
    }
}
