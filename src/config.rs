//! Configuration for LendingDesk
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

use crate::error::{Result, StoreError};

/// Main configuration for a record store instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Root directory for all data files
    /// Internal structure:
    ///   {data_dir}/
    ///     ├── wal.log          (write-ahead log)
    ///     └── snapshot.bin     (last checkpoint)
    pub data_dir: PathBuf,

    // -------------------------------------------------------------------------
    // WAL Configuration
    // -------------------------------------------------------------------------
    /// Sync strategy: how often to fsync WAL
    pub wal_sync_strategy: WalSyncStrategy,

    /// Number of WAL entries after which a checkpoint is taken
    pub checkpoint_interval: usize,
}

/// WAL sync strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalSyncStrategy {
    /// fsync after every write (safest, slowest)
    EveryWrite,

    /// fsync after N uncommitted entries (balanced durability/performance)
    EveryNEntries { count: usize },
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./lendingdesk_data"),
            wal_sync_strategy: WalSyncStrategy::EveryNEntries { count: 100 },
            checkpoint_interval: 1000,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Reject settings the store cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.checkpoint_interval == 0 {
            return Err(StoreError::Config(
                "checkpoint_interval must be at least 1".to_string(),
            ));
        }
        if let WalSyncStrategy::EveryNEntries { count: 0 } = self.wal_sync_strategy {
            return Err(StoreError::Config(
                "EveryNEntries sync count must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the data directory (root for all storage)
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data_dir = path.into();
        self
    }

    /// Set the WAL sync strategy
    pub fn wal_sync_strategy(mut self, strategy: WalSyncStrategy) -> Self {
        self.config.wal_sync_strategy = strategy;
        self
    }

    /// Set how many WAL entries accumulate before an automatic checkpoint
    pub fn checkpoint_interval(mut self, entries: usize) -> Self {
        self.config.checkpoint_interval = entries;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
