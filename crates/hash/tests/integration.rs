//! Integration tests for hash crate

#[cfg(test)]
mod tests {
    use arcdl_hash::*;
    use tempfile::tempdir;
    use tokio::fs;

    #[tokio::test]
    async fn test_verify_file() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("test.txt");

        let data = b"verify this content";
        fs::write(&file_path, data).await.unwrap();

        let hash = Hash::from_data(HashAlgorithm::Sha256, data);
        assert!(verify_file(&file_path, &hash).await.unwrap());

        let wrong_hash = Hash::from_data(HashAlgorithm::Sha256, b"different content");
        assert!(!verify_file(&file_path, &wrong_hash).await.unwrap());

        // Same bytes, different algorithm: verified with the expected algorithm
        let blake = Hash::from_data(HashAlgorithm::Blake3, data);
        assert!(verify_file(&file_path, &blake).await.unwrap());
    }

    #[test]
    fn test_hash_from_hex_errors() {
        // Too short
        let result = Hash::from_hex("1234");
        assert!(result.is_err());

        // Too long
        let result = Hash::from_hex(&"a".repeat(65));
        assert!(result.is_err());

        // Invalid hex
        let result = Hash::from_hex("xyz123");
        assert!(result.is_err());
    }

    #[test]
    fn test_algorithm_parsing() {
        assert_eq!("SHA-256".parse::<HashAlgorithm>().unwrap(), HashAlgorithm::Sha256);
        assert_eq!("blake3".parse::<HashAlgorithm>().unwrap(), HashAlgorithm::Blake3);
        assert!("crc32".parse::<HashAlgorithm>().is_err());
    }
}
