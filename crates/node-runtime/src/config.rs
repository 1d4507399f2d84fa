//! # Mirror Configuration
//!
//! Loading order: defaults, then the JSON file named by `SM_CONFIG_FILE`
//! (partial files are fine), then `SM_*` environment overrides. The result
//! is validated before anything is wired.
//!
//! | Variable | Field |
//! |----------|-------|
//! | `SM_DATA_DIR` | `data_dir` |
//! | `SM_BUCKET_ROOT` | `bucket_root` |
//! | `SM_ADDRESS_BOOK` | `address_book` |
//! | `SM_STORAGE` | `storage` (`memory` / `rocksdb`) |
//! | `SM_STREAMS` | `streams` (comma-separated kinds) |
//! | `SM_FETCH_FREQUENCY_MS` | `fetcher.frequency_ms` |
//! | `SM_BACKOFF_MIN_MS` / `SM_BACKOFF_MAX_MS` | `fetcher.backoff_*` |
//! | `SM_STAKE_FRACTION` | `quorum` (`"1/3"`) |
//! | `SM_MAX_ITEM_LENGTH` | `decoder.max_item_length` |
//! | `SM_LEASE_TTL_MS` | `leader.lease_ttl_ms` |
//! | `SM_RECONCILIATION_INTERVAL_MS` | `reconciliation.interval_ms` |
//! | `SM_SHUTDOWN_GRACE_MS` | `shutdown_grace_ms` |

use serde::{Deserialize, Serialize};
use shared_types::{FileHash, StreamKind};
use sm_03_quorum_verification::QuorumConfig;
use sm_04_stream_fetcher::FetcherConfig;
use sm_05_stream_decoder::DecoderConfig;
use sm_06_leader_gate::LeaderConfig;
use sm_08_reconciliation::ReconciliationConfig;
use std::collections::BTreeMap;
use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read config file {path}: {reason}")]
    Unreadable { path: PathBuf, reason: String },

    #[error("Invalid config file {path}: {reason}")]
    Malformed { path: PathBuf, reason: String },

    #[error("Invalid value {value:?} for {variable}")]
    InvalidEnv { variable: String, value: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    Memory,
    Rocksdb,
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "rocksdb" => Ok(Self::Rocksdb),
            other => Err(other.to_string()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MirrorConfig {
    /// Database directory (RocksDB backend).
    pub data_dir: PathBuf,
    /// Root of the per-node bucket tree.
    pub bucket_root: PathBuf,
    /// Address book JSON with node ids, public keys and stake.
    pub address_book: PathBuf,
    pub storage: StorageBackend,
    /// Stream kinds with a download loop.
    pub streams: Vec<StreamKind>,
    /// Hex hash the first file of a kind must chain to, when set.
    pub start_hashes: BTreeMap<StreamKind, String>,
    pub fetcher: FetcherConfig,
    pub quorum: QuorumConfig,
    pub decoder: DecoderConfig,
    pub leader: LeaderConfig,
    pub reconciliation: ReconciliationConfig,
    /// How long loops get to finish after shutdown is signalled.
    pub shutdown_grace_ms: u64,
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            bucket_root: PathBuf::from("./buckets"),
            address_book: PathBuf::from("./address-book.json"),
            storage: StorageBackend::Memory,
            streams: StreamKind::ALL.to_vec(),
            start_hashes: BTreeMap::new(),
            fetcher: FetcherConfig::default(),
            quorum: QuorumConfig::default(),
            decoder: DecoderConfig::default(),
            leader: LeaderConfig::default(),
            reconciliation: ReconciliationConfig::default(),
            shutdown_grace_ms: 10_000,
        }
    }
}

impl MirrorConfig {
    /// Defaults, then `SM_CONFIG_FILE`, then environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match env::var("SM_CONFIG_FILE") {
            Ok(path) => Self::from_file(Path::new(&path))?,
            Err(_) => Self::default(),
        };
        config.apply_env(|key| env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Unreadable {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        serde_json::from_str(&text).map_err(|e| ConfigError::Malformed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Apply `SM_*` overrides read through `var`.
    pub fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        fn parse<T: FromStr>(variable: &str, value: String) -> Result<T, ConfigError> {
            value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
                variable: variable.to_string(),
                value,
            })
        }

        if let Some(v) = var("SM_DATA_DIR") {
            self.data_dir = PathBuf::from(v);
        }
        if let Some(v) = var("SM_BUCKET_ROOT") {
            self.bucket_root = PathBuf::from(v);
        }
        if let Some(v) = var("SM_ADDRESS_BOOK") {
            self.address_book = PathBuf::from(v);
        }
        if let Some(v) = var("SM_STORAGE") {
            self.storage = parse("SM_STORAGE", v)?;
        }
        if let Some(v) = var("SM_STREAMS") {
            self.streams = v
                .split(',')
                .filter(|s| !s.trim().is_empty())
                .map(|s| parse("SM_STREAMS", s.to_string()))
                .collect::<Result<_, _>>()?;
        }
        if let Some(v) = var("SM_FETCH_FREQUENCY_MS") {
            self.fetcher.frequency_ms = parse("SM_FETCH_FREQUENCY_MS", v)?;
        }
        if let Some(v) = var("SM_BACKOFF_MIN_MS") {
            self.fetcher.backoff_min_ms = parse("SM_BACKOFF_MIN_MS", v)?;
        }
        if let Some(v) = var("SM_BACKOFF_MAX_MS") {
            self.fetcher.backoff_max_ms = parse("SM_BACKOFF_MAX_MS", v)?;
        }
        if let Some(v) = var("SM_STAKE_FRACTION") {
            let invalid = || ConfigError::InvalidEnv {
                variable: "SM_STAKE_FRACTION".to_string(),
                value: v.clone(),
            };
            let (n, d) = v.split_once('/').ok_or_else(invalid)?;
            self.quorum.stake_numerator = n.trim().parse().map_err(|_| invalid())?;
            self.quorum.stake_denominator = d.trim().parse().map_err(|_| invalid())?;
        }
        if let Some(v) = var("SM_MAX_ITEM_LENGTH") {
            self.decoder.max_item_length = parse("SM_MAX_ITEM_LENGTH", v)?;
        }
        if let Some(v) = var("SM_LEASE_TTL_MS") {
            self.leader.lease_ttl_ms = parse("SM_LEASE_TTL_MS", v)?;
        }
        if let Some(v) = var("SM_RECONCILIATION_INTERVAL_MS") {
            self.reconciliation.interval_ms = parse("SM_RECONCILIATION_INTERVAL_MS", v)?;
        }
        if let Some(v) = var("SM_SHUTDOWN_GRACE_MS") {
            self.shutdown_grace_ms = parse("SM_SHUTDOWN_GRACE_MS", v)?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.fetcher
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        self.quorum
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        self.decoder.validate().map_err(ConfigError::Invalid)?;
        self.leader.validate().map_err(ConfigError::Invalid)?;
        self.reconciliation.validate().map_err(ConfigError::Invalid)?;
        self.start_hashes()?;
        Ok(())
    }

    /// Parsed `start_hashes`.
    pub fn start_hashes(&self) -> Result<Vec<(StreamKind, FileHash)>, ConfigError> {
        self.start_hashes
            .iter()
            .map(|(kind, hex)| {
                FileHash::from_hex(hex)
                    .map(|hash| (*kind, hash))
                    .map_err(|e| ConfigError::Invalid(format!("start hash for {}: {}", kind, e)))
            })
            .collect()
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = MirrorConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.streams.len(), 3);
        assert_eq!(config.quorum.stake_denominator, 3);
        assert!(!config.quorum.inclusive_boundary);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mirror.json");
        std::fs::write(
            &path,
            r#"{"streams": ["balance"], "fetcher": {"frequency_ms": 250}, "storage": "rocksdb"}"#,
        )
        .unwrap();

        let config = MirrorConfig::from_file(&path).unwrap();
        assert_eq!(config.streams, vec![StreamKind::Balance]);
        assert_eq!(config.fetcher.frequency_ms, 250);
        assert_eq!(config.fetcher.backoff_max_ms, 60_000);
        assert_eq!(config.storage, StorageBackend::Rocksdb);
    }

    #[test]
    fn test_env_overrides() {
        let mut config = MirrorConfig::default();
        config
            .apply_env(env_of(&[
                ("SM_STREAMS", "transaction, event"),
                ("SM_STAKE_FRACTION", "2/3"),
                ("SM_LEASE_TTL_MS", "5000"),
                ("SM_STORAGE", "memory"),
            ]))
            .unwrap();
        assert_eq!(config.streams, vec![StreamKind::Transaction, StreamKind::Event]);
        assert_eq!((config.quorum.stake_numerator, config.quorum.stake_denominator), (2, 3));
        assert_eq!(config.leader.lease_ttl_ms, 5_000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_bad_env_value_names_variable() {
        let mut config = MirrorConfig::default();
        let err = config
            .apply_env(env_of(&[("SM_BACKOFF_MIN_MS", "soon")]))
            .unwrap_err();
        assert!(err.to_string().contains("SM_BACKOFF_MIN_MS"));

        assert!(config
            .apply_env(env_of(&[("SM_STAKE_FRACTION", "third")]))
            .is_err());
    }

    #[test]
    fn test_validation_rejects_inconsistent_values() {
        let mut config = MirrorConfig::default();
        config.fetcher.backoff_min_ms = 10_000;
        config.fetcher.backoff_max_ms = 1_000;
        assert!(config.validate().is_err());

        let mut config = MirrorConfig::default();
        config.leader.lease_ttl_ms = 0;
        assert!(config.validate().is_err());

        let mut config = MirrorConfig::default();
        config.quorum.stake_numerator = 3;
        assert!(config.validate().is_err());

        let mut config = MirrorConfig::default();
        config
            .start_hashes
            .insert(StreamKind::Event, "not-hex".to_string());
        assert!(config.validate().is_err());
    }
}
