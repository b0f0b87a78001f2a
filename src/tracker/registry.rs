use crate::message::Torrent;
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// Directory of seeders and the torrents each one advertises.
///
/// The map is only reachable through these methods, so every access takes
/// the lock: lookups share it, registrations hold it exclusively.
#[derive(Debug, Default)]
pub struct Registry {
    seeders: RwLock<HashMap<String, Vec<Torrent>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace everything `seeder_addr` advertises with `torrents`.
    ///
    /// Returns the list that was replaced, if any.
    pub fn register(
        &self,
        seeder_addr: impl Into<String>,
        torrents: Vec<Torrent>,
    ) -> Option<Vec<Torrent>> {
        let seeder_addr = seeder_addr.into();
        debug!(seeder = %seeder_addr, torrents = torrents.len(), "registering seeder");
        self.seeders.write().insert(seeder_addr, torrents)
    }

    /// Seeders advertising a torrent equal to `torrent` in name, size and digest.
    ///
    /// Order is unspecified.
    pub fn find_seeders(&self, torrent: &Torrent) -> Vec<String> {
        self.seeders
            .read()
            .iter()
            .filter(|(_, torrents)| torrents.contains(torrent))
            .map(|(addr, _)| addr.clone())
            .collect()
    }

    /// Owned copy of the whole directory, keyed and sorted by seeder address.
    pub fn snapshot(&self) -> BTreeMap<String, Vec<Torrent>> {
        self.seeders
            .read()
            .iter()
            .map(|(addr, torrents)| (addr.clone(), torrents.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.seeders.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.seeders.read().is_empty()
    }
}
