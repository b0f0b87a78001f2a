use crate::error::{SwarmError, SwarmResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of a shareable file.
///
/// Two torrents are the same torrent only when name, size and digest all match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Torrent {
    pub name: String,
    pub size: u64,
    /// SHA-256 of the full content, lowercase hex
    pub content_hash: String,
}

impl Torrent {
    pub fn new(name: impl Into<String>, size: u64, content_hash: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            size,
            content_hash: content_hash.into(),
        }
    }
}

impl fmt::Display for Torrent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let short = self.content_hash.get(..12).unwrap_or(&self.content_hash);
        write!(f, "{} ({} bytes, {})", self.name, self.size, short)
    }
}

/// Request for one contiguous byte range of a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkRequest {
    pub file_name: String,
    pub offset: u64,
    pub size: u64,
}

impl ChunkRequest {
    pub fn new(file_name: impl Into<String>, offset: u64, size: u64) -> Self {
        Self {
            file_name: file_name.into(),
            offset,
            size,
        }
    }

    /// Exclusive end offset of the range, `None` if it does not fit in a `u64`.
    pub fn end(&self) -> Option<u64> {
        self.offset.checked_add(self.size)
    }
}

/// Seeder reply to a [`ChunkRequest`].
///
/// `data` is only meaningful when `error` is `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkResponse {
    pub request: ChunkRequest,
    #[serde(with = "base64_data")]
    pub data: Vec<u8>,
    pub error: Option<String>,
}

impl ChunkResponse {
    pub fn ok(request: ChunkRequest, data: Vec<u8>) -> Self {
        Self {
            request,
            data,
            error: None,
        }
    }

    pub fn failed(request: ChunkRequest, error: impl Into<String>) -> Self {
        Self {
            request,
            data: Vec::new(),
            error: Some(error.into()),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Take the chunk bytes, checking them against the range that was asked for.
    pub fn into_data(self, expected: &ChunkRequest) -> SwarmResult<Vec<u8>> {
        if let Some(error) = self.error {
            return Err(SwarmError::Storage(format!(
                "seeder failed to serve {}@{}: {}",
                expected.file_name, expected.offset, error
            )));
        }
        if self.request != *expected {
            return Err(SwarmError::InvalidChunk(format!(
                "asked for {}@{}+{}, got {}@{}+{}",
                expected.file_name,
                expected.offset,
                expected.size,
                self.request.file_name,
                self.request.offset,
                self.request.size
            )));
        }
        if self.data.len() as u64 != expected.size {
            return Err(SwarmError::InvalidChunk(format!(
                "{}@{}: expected {} bytes, got {}",
                expected.file_name,
                expected.offset,
                expected.size,
                self.data.len()
            )));
        }
        Ok(self.data)
    }
}

/// Chunk bytes travel as one base64 string rather than a JSON number array.
mod base64_data {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(data: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(data))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD.decode(encoded).map_err(serde::de::Error::custom)
    }
}

/// Complete list of torrents a seeder advertises.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TorrentList {
    /// host:port the seeder accepts chunk requests on
    pub seeder_addr: String,
    pub torrents: Vec<Torrent>,
}

/// Seeders currently advertising a torrent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeederList {
    pub torrent: Torrent,
    pub seeders: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> ChunkRequest {
        ChunkRequest::new("data.bin", 8, 4)
    }

    #[test]
    fn test_torrent_equality_uses_every_field() {
        let a = Torrent::new("a.txt", 10, "aa");
        assert_eq!(a, Torrent::new("a.txt", 10, "aa"));
        assert_ne!(a, Torrent::new("a.txt", 10, "bb"));
        assert_ne!(a, Torrent::new("a.txt", 11, "aa"));
        assert_ne!(a, Torrent::new("b.txt", 10, "aa"));
    }

    #[test]
    fn test_into_data_success() {
        let resp = ChunkResponse::ok(request(), vec![1, 2, 3, 4]);
        assert_eq!(resp.into_data(&request()).unwrap(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_into_data_reports_seeder_error() {
        let resp = ChunkResponse::failed(request(), "no such file");
        assert!(resp.is_error());
        let err = resp.into_data(&request()).unwrap_err();
        assert!(matches!(err, SwarmError::Storage(msg) if msg.contains("no such file")));
    }

    #[test]
    fn test_into_data_rejects_short_chunk() {
        let resp = ChunkResponse::ok(request(), vec![1, 2]);
        assert!(matches!(
            resp.into_data(&request()),
            Err(SwarmError::InvalidChunk(_))
        ));
    }

    #[test]
    fn test_into_data_rejects_other_range() {
        let resp = ChunkResponse::ok(ChunkRequest::new("data.bin", 0, 4), vec![0; 4]);
        assert!(matches!(
            resp.into_data(&request()),
            Err(SwarmError::InvalidChunk(_))
        ));
    }

    #[test]
    fn test_end_overflow_is_none() {
        assert_eq!(request().end(), Some(12));
        assert_eq!(ChunkRequest::new("a", u64::MAX, 0).end(), Some(u64::MAX));
        assert_eq!(ChunkRequest::new("a", u64::MAX, 1).end(), None);
    }

    #[test]
    fn test_torrent_display_shortens_hash() {
        let t = Torrent::new("movie.mkv", 42, "0123456789abcdef0123");
        assert_eq!(t.to_string(), "movie.mkv (42 bytes, 0123456789ab)");
    }
}
