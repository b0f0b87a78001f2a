use crate::error::{SwarmError, SwarmResult};
use crate::message::ChunkRequest;

/// Split `[0, size)` into consecutive windows of `chunk_size` bytes.
///
/// The last window may be shorter. A zero-sized file has no chunks.
pub fn split(file_name: &str, size: u64, chunk_size: u64) -> SwarmResult<Vec<ChunkRequest>> {
    if chunk_size == 0 {
        return Err(SwarmError::InvalidArgument(
            "chunk size must be positive".to_string(),
        ));
    }

    let count = size.div_ceil(chunk_size);
    Ok((0..count)
        .map(|i| {
            let offset = i * chunk_size;
            ChunkRequest::new(file_name, offset, chunk_size.min(size - offset))
        })
        .collect())
}

/// Round-robin seeder for chunk `index`.
pub fn assign(seeders: &[String], index: usize) -> Option<&str> {
    if seeders.is_empty() {
        return None;
    }
    Some(seeders[index % seeders.len()].as_str())
}
