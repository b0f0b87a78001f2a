pub mod client;
pub mod config;
pub mod error;
pub mod logging;
pub mod message;
pub mod metrics;
pub mod rpc;
pub mod seeder;
pub mod server;
pub mod storage;
pub mod tracker;
pub mod wire;

pub use client::{ChunkCoordinator, TransferReport};
pub use config::{CliArgs, Config};
pub use error::{SwarmError, SwarmResult};
pub use message::{ChunkRequest, ChunkResponse, Message, MessageKind, SeederList, Torrent, TorrentList};
pub use seeder::Seeder;
pub use storage::{LocalStorage, SharedStorage, Storage};
pub use tracker::{Registry, Tracker};
