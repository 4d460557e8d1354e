#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Content hashing for arcdl
//!
//! Downloads are verified against SHA-256 digests published next to the
//! archive; BLAKE3 is accepted as an alternative. Expected digests are parsed
//! from hex, optionally prefixed with the algorithm name (`sha256:` or
//! `blake3:`). Hex parsing accepts either case, so comparisons are
//! case-insensitive.

use arcdl_errors::{Error, StorageError};
use serde::{Deserialize, Serialize};
use sha2::Digest;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tokio::fs::File;
use tokio::io::AsyncReadExt;

/// Size of chunks for streaming hash computation
const CHUNK_SIZE: usize = 1024 * 1024; // 1MB

/// Digest algorithm used for a [`Hash`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    #[default]
    Sha256,
    Blake3,
}

impl HashAlgorithm {
    /// Lowercase algorithm name, as used in hash prefixes
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sha256 => "sha256",
            Self::Blake3 => "blake3",
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HashAlgorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sha256" | "sha-256" => Ok(Self::Sha256),
            "blake3" => Ok(Self::Blake3),
            other => Err(StorageError::CorruptedData {
                message: format!("unknown hash algorithm: {other}"),
            }
            .into()),
        }
    }
}

/// Incremental hasher over either supported algorithm
#[allow(clippy::large_enum_variant)]
pub enum Hasher {
    Sha256(sha2::Sha256),
    Blake3(blake3::Hasher),
}

impl Hasher {
    /// Create a hasher for `algorithm`
    #[must_use]
    pub fn new(algorithm: HashAlgorithm) -> Self {
        match algorithm {
            HashAlgorithm::Sha256 => Self::Sha256(sha2::Sha256::new()),
            HashAlgorithm::Blake3 => Self::Blake3(blake3::Hasher::new()),
        }
    }

    /// Feed bytes into the hasher
    pub fn update(&mut self, data: &[u8]) {
        match self {
            Self::Sha256(h) => h.update(data),
            Self::Blake3(h) => {
                h.update(data);
            }
        }
    }

    /// Consume the hasher and produce the digest
    #[must_use]
    pub fn finalize(self) -> Hash {
        match self {
            Self::Sha256(h) => Hash::from_bytes(HashAlgorithm::Sha256, h.finalize().into()),
            Self::Blake3(h) => Hash::from_bytes(HashAlgorithm::Blake3, *h.finalize().as_bytes()),
        }
    }
}

/// A 32-byte digest tagged with the algorithm that produced it
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Hash {
    algorithm: HashAlgorithm,
    bytes: [u8; 32],
}

impl Hash {
    /// Create a hash from raw bytes
    #[must_use]
    pub fn from_bytes(algorithm: HashAlgorithm, bytes: [u8; 32]) -> Self {
        Self { algorithm, bytes }
    }

    /// Get the raw bytes
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.bytes
    }

    /// Algorithm that produced this digest
    #[must_use]
    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// Convert to lowercase hex string
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes)
    }

    /// Hex string prefixed with the algorithm name, e.g. `sha256:ab12...`
    #[must_use]
    pub fn to_prefixed_hex(&self) -> String {
        format!("{}:{}", self.algorithm, self.to_hex())
    }

    /// Parse from hex string
    ///
    /// An `algorithm:` prefix selects the algorithm; without one SHA-256 is
    /// assumed. Surrounding whitespace is ignored and hex digits may be in
    /// either case.
    ///
    /// # Errors
    /// Returns an error if the prefix names an unknown algorithm, the input is
    /// not valid hexadecimal, or it does not decode to exactly 32 bytes.
    pub fn from_hex(s: &str) -> Result<Self, Error> {
        let s = s.trim();
        let (algorithm, digits) = match s.split_once(':') {
            Some((prefix, rest)) => (prefix.parse()?, rest),
            None => (HashAlgorithm::default(), s),
        };
        Self::from_hex_with(algorithm, digits)
    }

    /// Parse from hex string for a known algorithm
    ///
    /// # Errors
    /// Returns an error if the input is not valid hexadecimal or is not exactly 64 characters (32 bytes).
    pub fn from_hex_with(algorithm: HashAlgorithm, s: &str) -> Result<Self, Error> {
        let bytes = hex::decode(s.trim()).map_err(|e| StorageError::CorruptedData {
            message: format!("invalid hex: {e}"),
        })?;

        if bytes.len() != 32 {
            return Err(StorageError::CorruptedData {
                message: format!("hash must be 32 bytes, got {}", bytes.len()),
            }
            .into());
        }

        let mut array = [0u8; 32];
        array.copy_from_slice(&bytes);
        Ok(Self::from_bytes(algorithm, array))
    }

    /// Compute hash of a byte slice
    #[must_use]
    pub fn from_data(algorithm: HashAlgorithm, data: &[u8]) -> Self {
        let mut hasher = Hasher::new(algorithm);
        hasher.update(data);
        hasher.finalize()
    }

    /// Compute hash of a file
    ///
    /// The file is read in fixed-size chunks and never loaded whole.
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened, read, or if any I/O operation fails.
    pub async fn hash_file(path: &Path, algorithm: HashAlgorithm) -> Result<Self, Error> {
        let mut file = File::open(path)
            .await
            .map_err(|e| StorageError::from_io_with_path(&e, path))?;

        let mut hasher = Hasher::new(algorithm);
        let mut buffer = vec![0; CHUNK_SIZE];

        loop {
            let n = file.read(&mut buffer).await?;
            if n == 0 {
                break;
            }
            hasher.update(&buffer[..n]);
        }

        Ok(hasher.finalize())
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl FromStr for Hash {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl Serialize for Hash {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_prefixed_hex())
    }
}

impl<'de> Deserialize<'de> for Hash {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// Verify a file matches an expected hash
///
/// # Errors
/// Returns an error if the file cannot be read or hashed.
pub async fn verify_file(path: &Path, expected: &Hash) -> Result<bool, Error> {
    let actual = Hash::hash_file(path, expected.algorithm()).await?;
    Ok(actual == *expected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    const HELLO_SHA256: &str = "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9";
    const HELLO_BLAKE3: &str = "d74981efa70a0c880b8d8c1985d075dbcbf679b99a5f9914e5aaf96b831a9e24";

    #[test]
    fn test_hash_basics() {
        let data = b"hello world";
        assert_eq!(
            Hash::from_data(HashAlgorithm::Sha256, data).to_hex(),
            HELLO_SHA256
        );
        assert_eq!(
            Hash::from_data(HashAlgorithm::Blake3, data).to_hex(),
            HELLO_BLAKE3
        );
    }

    #[test]
    fn test_hex_parsing_is_case_insensitive() {
        let lower = Hash::from_hex(HELLO_SHA256).unwrap();
        let upper = Hash::from_hex(&HELLO_SHA256.to_uppercase()).unwrap();
        assert_eq!(lower, upper);
        assert_eq!(lower.algorithm(), HashAlgorithm::Sha256);
    }

    #[test]
    fn test_prefixed_hex() {
        let hash = Hash::from_hex(&format!("blake3:{HELLO_BLAKE3}")).unwrap();
        assert_eq!(hash.algorithm(), HashAlgorithm::Blake3);
        assert_eq!(hash.to_prefixed_hex(), format!("blake3:{HELLO_BLAKE3}"));

        let sha = Hash::from_hex(&format!("SHA256:{HELLO_SHA256}")).unwrap();
        assert_eq!(sha, Hash::from_data(HashAlgorithm::Sha256, b"hello world"));

        assert!(Hash::from_hex(&format!("md5:{HELLO_SHA256}")).is_err());
    }

    #[test]
    fn test_hash_serialization() {
        let hash = Hash::from_data(HashAlgorithm::Blake3, b"test");
        let json = serde_json::to_string(&hash).unwrap();
        assert!(json.contains("blake3:"));
        let deserialized: Hash = serde_json::from_str(&json).unwrap();
        assert_eq!(hash, deserialized);
    }

    #[tokio::test]
    async fn test_hash_file() {
        use std::io::Write;
        let mut temp = NamedTempFile::new().unwrap();
        // Larger than one read chunk so the streaming loop runs more than once
        let data = vec![7u8; CHUNK_SIZE + 17];
        temp.write_all(&data).unwrap();

        let hash = Hash::hash_file(temp.path(), HashAlgorithm::Sha256)
            .await
            .unwrap();
        assert_eq!(hash, Hash::from_data(HashAlgorithm::Sha256, &data));
    }

    #[tokio::test]
    async fn test_hash_missing_file() {
        let err = Hash::hash_file(Path::new("/definitely/not/here"), HashAlgorithm::Sha256)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Storage(StorageError::PathNotFound { .. })
        ));
    }
}
