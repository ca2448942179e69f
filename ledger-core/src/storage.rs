//! Storage layer using RocksDB
//!
//! # Column Families
//!
//! - `state` - Raw key-value store: consumed nonces, tally copy, state root
//! - `merkle` - Merkle tree snapshots (key: `node:` || root hash)
//!
//! Both are exposed through [`KvStore`], the byte-string get/set/remove
//! interface the ledger state is written against. [`MemStore`] implements the
//! same interface in memory. [`KvStore::write_batch`] applies a [`StoreBatch`]
//! all at once or not at all.

use crate::{
    error::{Error, Result},
    Config,
};
use parking_lot::RwLock;
use rocksdb::{
    BoundColumnFamily, ColumnFamilyDescriptor, DBCompactionStyle, Options, WriteBatch, DB,
};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Column family for raw state keys
pub const CF_STATE: &str = "state";
/// Column family for merkle tree snapshots
pub const CF_MERKLE: &str = "merkle";

/// Byte-string keyed persistent store
pub trait KvStore: fmt::Debug + Send + Sync {
    /// Read a value
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>>;

    /// Write a value
    fn set(&self, key: &[u8], value: &[u8]) -> Result<()>;

    /// Delete a key; deleting a missing key is not an error
    fn remove(&self, key: &[u8]) -> Result<()>;

    /// Apply every write in `batch` atomically
    fn write_batch(&self, batch: StoreBatch) -> Result<()>;
}

/// Writes queued for one atomic [`KvStore::write_batch`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreBatch {
    puts: Vec<(Vec<u8>, Vec<u8>)>,
}

impl StoreBatch {
    /// Empty batch
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a write; later writes to the same key win
    pub fn put(&mut self, key: &[u8], value: &[u8]) {
        self.puts.push((key.to_vec(), value.to_vec()));
    }

    /// Number of queued writes
    pub fn len(&self) -> usize {
        self.puts.len()
    }

    /// Whether nothing is queued
    pub fn is_empty(&self) -> bool {
        self.puts.is_empty()
    }
}

/// Shared handle to a store
pub type StoreHandle = Arc<dyn KvStore>;

/// Storage wrapper for RocksDB
pub struct Storage {
    db: Arc<DB>,
}

impl Storage {
    /// Open or create database
    pub fn open(config: &Config) -> Result<Self> {
        let path = &config.data_dir;

        // Create directory if not exists
        std::fs::create_dir_all(path)?;

        let mut db_opts = Options::default();
        db_opts.create_if_missing(true);
        db_opts.create_missing_column_families(true);

        db_opts.set_write_buffer_size(config.rocksdb.write_buffer_size_mb * 1024 * 1024);
        db_opts.set_max_write_buffer_number(config.rocksdb.max_write_buffer_number);
        db_opts.set_target_file_size_base(config.rocksdb.target_file_size_mb * 1024 * 1024);
        db_opts.set_max_background_jobs(config.rocksdb.max_background_jobs);
        db_opts.set_level_zero_file_num_compaction_trigger(
            config.rocksdb.level0_file_num_compaction_trigger,
        );
        db_opts.set_compaction_style(DBCompactionStyle::Level);

        if config.rocksdb.enable_statistics {
            db_opts.enable_statistics();
        }

        let cf_descriptors = vec![
            ColumnFamilyDescriptor::new(CF_STATE, Self::cf_options_state()),
            ColumnFamilyDescriptor::new(CF_MERKLE, Self::cf_options_merkle()),
        ];

        let db = DB::open_cf_descriptors(&db_opts, path, cf_descriptors)?;

        tracing::info!(path = ?path, "Opened RocksDB with state and merkle column families");

        Ok(Self { db: Arc::new(db) })
    }

    fn cf_options_state() -> Options {
        let mut opts = Options::default();
        // Nonce lookups are point reads on random keys
        let mut block_opts = rocksdb::BlockBasedOptions::default();
        block_opts.set_bloom_filter(10.0, false);
        opts.set_block_based_table_factory(&block_opts);
        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);
        opts
    }

    fn cf_options_merkle() -> Options {
        let mut opts = Options::default();
        opts.set_compression_type(rocksdb::DBCompressionType::Zstd);
        opts
    }

    /// Raw state store handle
    pub fn state_store(&self) -> StoreHandle {
        Arc::new(Column {
            db: self.db.clone(),
            name: CF_STATE,
        })
    }

    /// Merkle snapshot store handle
    pub fn tree_store(&self) -> StoreHandle {
        Arc::new(Column {
            db: self.db.clone(),
            name: CF_MERKLE,
        })
    }
}

impl fmt::Debug for Storage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Storage")
            .field("path", &self.db.path())
            .finish()
    }
}

/// One RocksDB column family viewed as a [`KvStore`]
pub struct Column {
    db: Arc<DB>,
    name: &'static str,
}

impl Column {
    fn cf(&self) -> Result<Arc<BoundColumnFamily<'_>>> {
        self.db
            .cf_handle(self.name)
            .ok_or_else(|| Error::Storage(format!("Column family {} not found", self.name)))
    }
}

impl KvStore for Column {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let cf = self.cf()?;
        Ok(self.db.get_cf(&cf, key)?)
    }

    fn set(&self, key: &[u8], value: &[u8]) -> Result<()> {
        let cf = self.cf()?;
        self.db.put_cf(&cf, key, value)?;
        Ok(())
    }

    fn remove(&self, key: &[u8]) -> Result<()> {
        let cf = self.cf()?;
        self.db.delete_cf(&cf, key)?;
        Ok(())
    }

    fn write_batch(&self, batch: StoreBatch) -> Result<()> {
        let cf = self.cf()?;
        let mut write_batch = WriteBatch::default();
        for (key, value) in &batch.puts {
            write_batch.put_cf(&cf, key, value);
        }
        self.db.write(write_batch)?;
        Ok(())
    }
}

impl fmt::Debug for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Column").field("name", &self.name).finish()
    }
}

/// In-memory store, for tests and throwaway ledgers
#[derive(Debug, Default)]
pub struct MemStore {
    entries: RwLock<BTreeMap<Vec<u8>, Vec<u8>>>,
}

impl MemStore {
    /// Empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty store behind a shared handle
    pub fn handle() -> StoreHandle {
        Arc::new(Self::new())
    }

    /// Number of keys held
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether the store holds no keys
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl KvStore for MemStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn set(&self, key: &[u8], value: &[u8]) -> Result<()> {
        self.entries.write().insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn remove(&self, key: &[u8]) -> Result<()> {
        self.entries.write().remove(key);
        Ok(())
    }

    fn write_batch(&self, batch: StoreBatch) -> Result<()> {
        let mut entries = self.entries.write();
        for (key, value) in batch.puts {
            entries.insert(key, value);
        }
        Ok(())
    }
}
