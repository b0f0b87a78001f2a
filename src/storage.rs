//! File access used by seeders and the client.
//!
//! Implementations are blocking; async callers go through [`run_blocking`].

use crate::error::{SwarmError, SwarmResult};
use sha2::{Digest, Sha256};
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Size and SHA-256 (lowercase hex) of a whole file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    pub size: u64,
    pub content_hash: String,
}

#[cfg_attr(test, mockall::automock)]
pub trait Storage: Send + Sync {
    /// Read exactly `len` bytes starting at `offset`.
    fn read_at(&self, path: &Path, offset: u64, len: u64) -> SwarmResult<Vec<u8>>;

    /// Write `data` at `offset` into an existing file.
    fn write_at(&self, path: &Path, offset: u64, data: &[u8]) -> SwarmResult<()>;

    /// Create or truncate `path` and size it to `size` bytes.
    fn create_preallocated(&self, path: &Path, size: u64) -> SwarmResult<()>;

    fn file_info(&self, path: &Path) -> SwarmResult<FileInfo>;

    /// Regular files directly inside `dir`, sorted by path.
    fn list_regular_files(&self, dir: &Path) -> SwarmResult<Vec<PathBuf>>;
}

pub type SharedStorage = Arc<dyn Storage>;

/// Run a storage call on the blocking pool.
pub async fn run_blocking<T, F>(f: F) -> SwarmResult<T>
where
    F: FnOnce() -> SwarmResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| SwarmError::Storage(format!("storage task failed: {}", e)))?
}

/// [`Storage`] backed by the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalStorage;

const HASH_BUFFER_SIZE: usize = 64 * 1024;

impl LocalStorage {
    pub fn new() -> Self {
        Self
    }

    pub fn shared() -> SharedStorage {
        Arc::new(Self)
    }
}

impl Storage for LocalStorage {
    fn read_at(&self, path: &Path, offset: u64, len: u64) -> SwarmResult<Vec<u8>> {
        let mut file = File::open(path).map_err(|e| SwarmError::storage(path, e))?;
        file.seek(SeekFrom::Start(offset))
            .map_err(|e| SwarmError::storage(path, e))?;

        let mut buf = vec![0u8; len as usize];
        file.read_exact(&mut buf)
            .map_err(|e| SwarmError::storage(path, e))?;
        Ok(buf)
    }

    fn write_at(&self, path: &Path, offset: u64, data: &[u8]) -> SwarmResult<()> {
        let mut file = OpenOptions::new()
            .write(true)
            .open(path)
            .map_err(|e| SwarmError::storage(path, e))?;
        file.seek(SeekFrom::Start(offset))
            .map_err(|e| SwarmError::storage(path, e))?;
        file.write_all(data)
            .map_err(|e| SwarmError::storage(path, e))?;
        Ok(())
    }

    fn create_preallocated(&self, path: &Path, size: u64) -> SwarmResult<()> {
        let file = File::create(path).map_err(|e| SwarmError::storage(path, e))?;
        file.set_len(size)
            .map_err(|e| SwarmError::storage(path, e))?;
        Ok(())
    }

    fn file_info(&self, path: &Path) -> SwarmResult<FileInfo> {
        let mut file = File::open(path).map_err(|e| SwarmError::storage(path, e))?;
        let mut hasher = Sha256::new();
        let mut buffer = vec![0u8; HASH_BUFFER_SIZE];
        let mut size = 0u64;

        loop {
            let n = file
                .read(&mut buffer)
                .map_err(|e| SwarmError::storage(path, e))?;
            if n == 0 {
                break;
            }
            hasher.update(&buffer[..n]);
            size += n as u64;
        }

        Ok(FileInfo {
            size,
            content_hash: hex::encode(hasher.finalize()),
        })
    }

    fn list_regular_files(&self, dir: &Path) -> SwarmResult<Vec<PathBuf>> {
        let mut files = Vec::new();
        for entry in std::fs::read_dir(dir).map_err(|e| SwarmError::storage(dir, e))? {
            let path = entry.map_err(|e| SwarmError::storage(dir, e))?.path();
            // Follows symlinks; dangling links are skipped
            match std::fs::metadata(&path) {
                Ok(meta) if meta.is_file() => files.push(path),
                _ => {}
            }
        }
        files.sort();
        Ok(files)
    }
}
