//! In-process tracker and seeders bound to ephemeral localhost ports.
//!
//! Every server runs on its own task and stops when its token is cancelled
//! or the helper is dropped.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use swarmfetch::{LocalStorage, Registry, Seeder, Torrent, Tracker};

pub struct TestTracker {
    pub addr: String,
    pub web_addr: String,
    pub registry: Arc<Registry>,
    pub shutdown: CancellationToken,
}

impl TestTracker {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let web_listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let web_addr = web_listener.local_addr().unwrap().to_string();

        let tracker = Tracker::new(8);
        let registry = tracker.registry();
        let shutdown = CancellationToken::new();
        let token = shutdown.clone();
        tokio::spawn(async move {
            tracker
                .serve_with_diagnostics(listener, web_listener, token)
                .await
        });

        Self {
            addr,
            web_addr,
            registry,
            shutdown,
        }
    }

    /// Registration is fire-and-forget, so poll until `count` seeders appear.
    pub async fn wait_for_seeders(&self, count: usize) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while self.registry.len() < count {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("seeders did not register in time");
    }
}

impl Drop for TestTracker {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

pub struct TestSeeder {
    pub addr: String,
    pub torrents: Vec<Torrent>,
    pub shutdown: CancellationToken,
}

impl TestSeeder {
    /// Catalog `dir`, announce it to `tracker_addr` and start serving.
    pub async fn start(tracker_addr: &str, dir: &Path) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();

        let seeder = Seeder::new(LocalStorage::shared(), dir, 8);
        let torrents = seeder.catalog().await.unwrap();
        swarmfetch::seeder::announce(tracker_addr, &addr, torrents.clone())
            .await
            .unwrap();

        let shutdown = CancellationToken::new();
        let token = shutdown.clone();
        tokio::spawn(async move { seeder.serve(listener, token).await });

        Self {
            addr,
            torrents,
            shutdown,
        }
    }
}

impl Drop for TestSeeder {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}
