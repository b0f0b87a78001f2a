use crate::error::SwarmResult;
use crate::message::Torrent;
use crate::storage::{run_blocking, SharedStorage};
use std::path::PathBuf;
use tracing::{debug, warn};

/// Torrent identities for every regular file directly inside `root`.
///
/// Each file is hashed in full; names are relative to `root`.
pub async fn scan(storage: SharedStorage, root: PathBuf) -> SwarmResult<Vec<Torrent>> {
    run_blocking(move || {
        let mut torrents = Vec::new();
        for path in storage.list_regular_files(&root)? {
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                warn!(path = %path.display(), "skipping file with non UTF-8 name");
                continue;
            };
            let info = storage.file_info(&path)?;
            debug!(file = name, size = info.size, hash = %info.content_hash, "cataloged");
            torrents.push(Torrent::new(name, info.size, info.content_hash));
        }
        Ok(torrents)
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SwarmError;
    use crate::storage::{FileInfo, LocalStorage, MockStorage};
    use std::path::Path;
    use std::sync::Arc;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_scan_directory() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("b.txt"), b"abc").unwrap();
        std::fs::write(dir.path().join("a.txt"), b"").unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();

        let torrents = scan(LocalStorage::shared(), dir.path().to_path_buf())
            .await
            .unwrap();

        assert_eq!(
            torrents,
            vec![
                Torrent::new(
                    "a.txt",
                    0,
                    "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
                ),
                Torrent::new(
                    "b.txt",
                    3,
                    "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
                ),
            ]
        );
    }

    #[tokio::test]
    async fn test_scan_propagates_hash_failure() {
        let mut storage = MockStorage::new();
        storage
            .expect_list_regular_files()
            .returning(|dir: &Path| Ok(vec![dir.join("gone.bin")]));
        storage
            .expect_file_info()
            .returning(|_| Err(SwarmError::Storage("gone.bin vanished".into())));

        let err = scan(Arc::new(storage), PathBuf::from("/srv"))
            .await
            .unwrap_err();
        assert!(matches!(err, SwarmError::Storage(_)));
    }

    #[tokio::test]
    async fn test_scan_uses_file_info() {
        let mut storage = MockStorage::new();
        storage
            .expect_list_regular_files()
            .returning(|dir: &Path| Ok(vec![dir.join("x.iso")]));
        storage
            .expect_file_info()
            .withf(|path: &Path| path == Path::new("/srv/x.iso"))
            .times(1)
            .returning(|_| {
                Ok(FileInfo {
                    size: 4096,
                    content_hash: "feed".to_string(),
                })
            });

        let torrents = scan(Arc::new(storage), PathBuf::from("/srv")).await.unwrap();
        assert_eq!(torrents, vec![Torrent::new("x.iso", 4096, "feed")]);
    }
}
