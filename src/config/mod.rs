//! Configuration management for CLI, environment variables, and config files.

use crate::error::{SwarmError, ValidationIssue};
use crate::message::Torrent;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Largest chunk a client may ask for and a seeder will serve.
pub const MAX_CHUNK_SIZE: u64 = 64 * 1024 * 1024;

const MAX_TIMEOUT_SECS: u64 = 3600;
const VALID_LOG_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

/// Main configuration shared by the tracker, seeder and client roles.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub tracker: TrackerConfig,
    #[serde(default)]
    pub seeder: SeederConfig,
    #[serde(default)]
    pub client: ClientConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where the tracker listens. Seeders and clients dial the same address.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    pub host: String,
    pub port: u16,
    /// Port of the JSON diagnostics endpoint.
    pub web_port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SeederConfig {
    pub host: String,
    pub port: u16,
    pub input_dir: PathBuf,
    /// Address registered with the tracker, if different from the bound one.
    pub advertise_addr: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub output_file: PathBuf,
    pub chunk_size: u64,
    /// Deadline for the whole download, in seconds.
    pub timeout_secs: u64,
    pub target: TargetConfig,
}

/// The torrent the client downloads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetConfig {
    pub name: String,
    pub size: u64,
    pub content_hash: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Capacity of the channel carrying per-connection outcomes.
    pub outcome_capacity: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 7070,
            web_port: 7071,
        }
    }
}

impl Default for SeederConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 7080,
            input_dir: PathBuf::from("./shared"),
            advertise_addr: None,
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            output_file: PathBuf::from("./download.bin"),
            chunk_size: 1024 * 1024,
            timeout_secs: 10,
            target: TargetConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            outcome_capacity: 64,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl TrackerConfig {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn web_addr(&self) -> String {
        format!("{}:{}", self.host, self.web_port)
    }
}

impl SeederConfig {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl ClientConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl TargetConfig {
    pub fn to_torrent(&self) -> Torrent {
        Torrent::new(self.name.clone(), self.size, self.content_hash.clone())
    }
}

/// Parse `SWARMFETCH_*` variable `key` into `T`, if it is set.
fn env_parse<T: FromStr>(key: &str) -> Result<Option<T>, SwarmError> {
    match std::env::var(key) {
        Ok(val) => val
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| SwarmError::InvalidArgument(format!("{} has invalid format", key))),
        Err(_) => Ok(None),
    }
}

impl Config {
    pub fn from_file(path: &Path) -> Result<Self, SwarmError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| SwarmError::IoError(format!("{}: {}", path.display(), e)))?;

        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase());
        match ext.as_deref() {
            Some("json") => Ok(serde_json::from_str(&content)?),
            _ => Ok(toml::from_str(&content)?),
        }
    }

    pub fn from_default_locations() -> Result<Self, SwarmError> {
        let config_paths = [
            dirs::config_dir().map(|d| d.join("swarmfetch/config.toml")),
            Some(PathBuf::from("/etc/swarmfetch/config.toml")),
            Some(PathBuf::from("./swarmfetch.toml")),
        ];

        for path in config_paths.iter().flatten() {
            if path.exists() {
                tracing::info!("Loading config from: {}", path.display());
                return Self::from_file(path);
            }
        }

        Ok(Self::default())
    }

    pub fn merge_from_env(mut self) -> Result<Self, SwarmError> {
        if let Ok(val) = std::env::var("SWARMFETCH_TRACKER_HOST") {
            self.tracker.host = val;
        }
        if let Some(port) = env_parse("SWARMFETCH_TRACKER_PORT")? {
            self.tracker.port = port;
        }
        if let Some(port) = env_parse("SWARMFETCH_WEB_PORT")? {
            self.tracker.web_port = port;
        }

        if let Ok(val) = std::env::var("SWARMFETCH_SEEDER_HOST") {
            self.seeder.host = val;
        }
        if let Some(port) = env_parse("SWARMFETCH_SEEDER_PORT")? {
            self.seeder.port = port;
        }
        if let Ok(val) = std::env::var("SWARMFETCH_INPUT_DIR") {
            self.seeder.input_dir = PathBuf::from(val);
        }
        if let Ok(val) = std::env::var("SWARMFETCH_ADVERTISE_ADDR") {
            self.seeder.advertise_addr = Some(val);
        }

        if let Ok(val) = std::env::var("SWARMFETCH_OUTPUT_FILE") {
            self.client.output_file = PathBuf::from(val);
        }
        if let Some(size) = env_parse("SWARMFETCH_CHUNK_SIZE")? {
            self.client.chunk_size = size;
        }
        if let Some(secs) = env_parse("SWARMFETCH_TIMEOUT")? {
            self.client.timeout_secs = secs;
        }
        if let Ok(val) = std::env::var("SWARMFETCH_TARGET_NAME") {
            self.client.target.name = val;
        }
        if let Some(size) = env_parse("SWARMFETCH_TARGET_SIZE")? {
            self.client.target.size = size;
        }
        if let Ok(val) = std::env::var("SWARMFETCH_TARGET_HASH") {
            self.client.target.content_hash = val;
        }

        if let Some(capacity) = env_parse("SWARMFETCH_OUTCOME_CAPACITY")? {
            self.server.outcome_capacity = capacity;
        }
        if let Ok(val) = std::env::var("SWARMFETCH_LOG_LEVEL") {
            self.logging.level = val;
        }

        Ok(self)
    }

    pub fn merge_from_cli(mut self, cli: &CliArgs) -> Self {
        if let Some(ref host) = cli.tracker_host {
            self.tracker.host = host.clone();
        }
        if let Some(port) = cli.tracker_port {
            self.tracker.port = port;
        }
        if let Some(port) = cli.web_port {
            self.tracker.web_port = port;
        }
        if let Some(ref host) = cli.seeder_host {
            self.seeder.host = host.clone();
        }
        if let Some(port) = cli.seeder_port {
            self.seeder.port = port;
        }
        if let Some(ref dir) = cli.input_dir {
            self.seeder.input_dir = dir.clone();
        }
        if let Some(ref addr) = cli.advertise_addr {
            self.seeder.advertise_addr = Some(addr.clone());
        }
        if let Some(ref output) = cli.output_file {
            self.client.output_file = output.clone();
        }
        if let Some(size) = cli.chunk_size {
            self.client.chunk_size = size;
        }
        if let Some(secs) = cli.timeout_secs {
            self.client.timeout_secs = secs;
        }
        if let Some(ref name) = cli.target_name {
            self.client.target.name = name.clone();
        }
        if let Some(size) = cli.target_size {
            self.client.target.size = size;
        }
        if let Some(ref hash) = cli.target_hash {
            self.client.target.content_hash = hash.clone();
        }
        if let Some(ref level) = cli.log_level {
            self.logging.level = level.clone();
        }

        self
    }

    /// Defaults, then the config file, then environment, then CLI flags.
    pub fn load_with_cli(cli: &CliArgs) -> Result<Self, SwarmError> {
        let base = match &cli.config_file {
            Some(path) => Self::from_file(path)?,
            None => Self::from_default_locations()?,
        };
        Ok(base.merge_from_env()?.merge_from_cli(cli))
    }

    pub fn validate(&self) -> Result<(), SwarmError> {
        let mut issues = Vec::new();

        if self.tracker.host.trim().is_empty() {
            issues.push(ValidationIssue {
                field: "tracker.host".to_string(),
                message: "Host cannot be empty".to_string(),
            });
        }
        if self.seeder.host.trim().is_empty() {
            issues.push(ValidationIssue {
                field: "seeder.host".to_string(),
                message: "Host cannot be empty".to_string(),
            });
        }

        if self.client.chunk_size == 0 || self.client.chunk_size > MAX_CHUNK_SIZE {
            issues.push(ValidationIssue {
                field: "client.chunk_size".to_string(),
                message: format!(
                    "Chunk size must be between 1 and {} bytes",
                    MAX_CHUNK_SIZE
                ),
            });
        }

        if self.client.timeout_secs == 0 || self.client.timeout_secs > MAX_TIMEOUT_SECS {
            issues.push(ValidationIssue {
                field: "client.timeout_secs".to_string(),
                message: format!(
                    "Timeout must be between 1 and {} seconds",
                    MAX_TIMEOUT_SECS
                ),
            });
        }

        if self.server.outcome_capacity == 0 {
            issues.push(ValidationIssue {
                field: "server.outcome_capacity".to_string(),
                message: "Capacity must be positive".to_string(),
            });
        }

        if !VALID_LOG_LEVELS.contains(&self.logging.level.as_str()) {
            issues.push(ValidationIssue {
                field: "logging.level".to_string(),
                message: format!(
                    "Invalid log level '{}'. Valid levels: {}",
                    self.logging.level,
                    VALID_LOG_LEVELS.join(", ")
                ),
            });
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(SwarmError::ValidationError(issues))
        }
    }

    /// Checks that only matter when running as a client.
    pub fn validate_target(&self) -> Result<(), SwarmError> {
        let mut issues = Vec::new();
        let target = &self.client.target;

        let mut components = Path::new(&target.name).components();
        let plain = matches!(
            (components.next(), components.next()),
            (Some(std::path::Component::Normal(_)), None)
        );
        if !plain {
            issues.push(ValidationIssue {
                field: "client.target.name".to_string(),
                message: format!("'{}' is not a plain file name", target.name),
            });
        }

        let hash = &target.content_hash;
        if hash.len() != 64 || !hash.chars().all(|c| c.is_ascii_hexdigit()) {
            issues.push(ValidationIssue {
                field: "client.target.content_hash".to_string(),
                message: "Expected 64 hex characters of SHA-256".to_string(),
            });
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(SwarmError::ValidationError(issues))
        }
    }
}

/// Command-line arguments that override configuration values.
#[derive(Debug, Clone, Default)]
pub struct CliArgs {
    pub config_file: Option<PathBuf>,
    pub tracker_host: Option<String>,
    pub tracker_port: Option<u16>,
    pub web_port: Option<u16>,
    pub seeder_host: Option<String>,
    pub seeder_port: Option<u16>,
    pub input_dir: Option<PathBuf>,
    pub advertise_addr: Option<String>,
    pub output_file: Option<PathBuf>,
    pub chunk_size: Option<u64>,
    pub timeout_secs: Option<u64>,
    pub target_name: Option<String>,
    pub target_size: Option<u64>,
    pub target_hash: Option<String>,
    pub log_level: Option<String>,
}
