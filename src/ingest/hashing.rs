use std::fs::File;
use std::io::Read;
use std::path::Path;

use sha2::{Digest, Sha256};

const BLOCK_SIZE: usize = 1 << 20;

/// Content-addressed identifier for a game log, or `None` when the file
/// cannot be opened or read.
pub fn hash_file(path: &Path) -> Option<String> {
    let mut file = File::open(path).ok()?;
    let mut hasher = Sha256::new();
    let mut block = vec![0u8; BLOCK_SIZE];
    loop {
        let read = file.read(&mut block).ok()?;
        if read == 0 {
            break;
        }
        hasher.update(&block[..read]);
    }
    Some(format!("{:x}", hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::hash_file;

    #[test]
    fn hashes_contents_not_names() {
        let root = std::env::temp_dir().join(format!("bloom-hash-{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(&root).expect("temp root should be creatable");
        let a = root.join("a.log");
        let b = root.join("b.log");
        std::fs::write(&a, b"turn 1\nturn 2\n").expect("write a");
        std::fs::write(&b, b"turn 1\nturn 2\n").expect("write b");

        let first = hash_file(&a).expect("hash a");
        assert_eq!(first, hash_file(&b).expect("hash b"));
        assert_eq!(first.len(), 64);
        assert!(first.chars().all(|ch| ch.is_ascii_hexdigit() && !ch.is_ascii_uppercase()));

        let _ = std::fs::remove_dir_all(root);
    }

    #[test]
    fn empty_file_matches_known_digest() {
        let root = std::env::temp_dir().join(format!("bloom-hash-{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(&root).expect("temp root should be creatable");
        let empty = root.join("empty.log");
        std::fs::write(&empty, b"").expect("write empty");
        assert_eq!(
            hash_file(&empty).as_deref(),
            Some("e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855")
        );
        let _ = std::fs::remove_dir_all(root);
    }

    #[test]
    fn missing_file_has_no_hash() {
        let path = std::env::temp_dir().join(format!("bloom-missing-{}", uuid::Uuid::now_v7()));
        assert!(hash_file(&path).is_none());
    }
}
