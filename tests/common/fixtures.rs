//! File fixtures for seeder directories.

use sha2::{Digest, Sha256};
use swarmfetch::Torrent;
use tempfile::TempDir;

pub const TEN_BYTES: &[u8] = b"0123456789";

/// Hex SHA-256 of `content`.
pub fn sha256_hex(content: &[u8]) -> String {
    hex::encode(Sha256::digest(content))
}

/// The torrent identity a seeder derives for `content` stored as `name`.
pub fn torrent_for(name: &str, content: &[u8]) -> Torrent {
    Torrent::new(name, content.len() as u64, sha256_hex(content))
}

/// Deterministic pseudo-random content of `len` bytes.
pub fn patterned(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 31 % 251) as u8).collect()
}

/// A temporary directory holding `files`.
pub fn shared_dir(files: &[(&str, &[u8])]) -> TempDir {
    let dir = TempDir::new().unwrap();
    for (name, content) in files {
        std::fs::write(dir.path().join(name), content).unwrap();
    }
    dir
}
