//! Storage layer using RocksDB
//!
//! # Column Families
//!
//! - `entries` - Append-only ledger entries (key: entry_id)
//! - `references` - Uniqueness constraint on idempotency references
//!   (key: reference string, value: entry_id)
//! - `requests` - Human-reviewed wallet requests (key: request_id)
//! - `orders` - Order escrow state (key: order_id)
//! - `freezes` - Moderation freeze flags (key: user_id)
//! - `audit` - Audit trail (key: record_id, UUIDv7 so iteration is time-ordered)
//! - `indices` - Secondary index user_id -> entries
//!
//! Multi-record mutations (request review + ledger append, conditional entry
//! insert) go through a single `WriteBatch`, so there is no window where one
//! record is visible without the other.

use crate::{
    error::{Error, Result},
    types::{
        AuditRecord, EntryStatus, LedgerEntry, Order, OrderId, OrderStatus, Reference, UserId,
        WalletFreeze, WalletRequest,
    },
    Config,
};
use rocksdb::{
    ColumnFamily, ColumnFamilyDescriptor, DBCompactionStyle, Direction, IteratorMode, Options,
    WriteBatch, DB,
};
use std::sync::Arc;
use uuid::Uuid;

/// Column family names
const CF_ENTRIES: &str = "entries";
const CF_REFERENCES: &str = "references";
const CF_REQUESTS: &str = "requests";
const CF_ORDERS: &str = "orders";
const CF_FREEZES: &str = "freezes";
const CF_AUDIT: &str = "audit";
const CF_INDICES: &str = "indices";

/// Outcome of a conditional entry insert keyed by reference
#[derive(Debug, Clone)]
pub enum AppendOutcome {
    /// Entry was inserted; the reference was new
    Inserted,
    /// An entry with this reference already exists; nothing was written
    AlreadyExists(LedgerEntry),
}

/// Outcome of the exactly-once pending transition
#[derive(Debug, Clone)]
pub enum SettleOutcome {
    /// Entry transitioned pending -> terminal
    Settled(LedgerEntry),
    /// Entry was already terminal; nothing was written
    AlreadySettled(LedgerEntry),
}

/// Storage wrapper for RocksDB
///
/// Conditional writes (`append_entry_if_absent`, `approve_request_with_entry`)
/// are check-then-batch sequences: callers must serialize them through the
/// single-writer actor for the reference uniqueness constraint to hold.
pub struct Storage {
    db: Arc<DB>,
}

impl Storage {
    /// Open or create database
    pub fn open(config: &Config) -> Result<Self> {
        let path = &config.data_dir;

        std::fs::create_dir_all(path)?;

        let mut db_opts = Options::default();
        db_opts.create_if_missing(true);
        db_opts.create_missing_column_families(true);

        // Tuning from config
        db_opts.set_write_buffer_size(config.rocksdb.write_buffer_size_mb * 1024 * 1024);
        db_opts.set_max_write_buffer_number(config.rocksdb.max_write_buffer_number);
        db_opts.set_target_file_size_base(config.rocksdb.target_file_size_mb * 1024 * 1024);
        db_opts.set_max_background_jobs(config.rocksdb.max_background_jobs);

        // Universal compaction for an append-heavy workload
        db_opts.set_compaction_style(DBCompactionStyle::Universal);

        let cf_descriptors = vec![
            ColumnFamilyDescriptor::new(CF_ENTRIES, Self::cf_options_entries()),
            ColumnFamilyDescriptor::new(CF_REFERENCES, Self::cf_options_keyed()),
            ColumnFamilyDescriptor::new(CF_REQUESTS, Self::cf_options_entries()),
            ColumnFamilyDescriptor::new(CF_ORDERS, Self::cf_options_keyed()),
            ColumnFamilyDescriptor::new(CF_FREEZES, Self::cf_options_keyed()),
            ColumnFamilyDescriptor::new(CF_AUDIT, Self::cf_options_entries()),
            ColumnFamilyDescriptor::new(CF_INDICES, Self::cf_options_indices()),
        ];

        let db = DB::open_cf_descriptors(&db_opts, path, cf_descriptors)?;

        tracing::info!(path = ?path, "Opened wallet store");

        Ok(Self { db: Arc::new(db) })
    }

    // Column family options

    fn cf_options_entries() -> Options {
        let mut opts = Options::default();
        opts.set_compression_type(rocksdb::DBCompressionType::Zstd);
        opts.set_bottommost_compression_type(rocksdb::DBCompressionType::Zstd);
        opts
    }

    fn cf_options_keyed() -> Options {
        let mut opts = Options::default();
        // Point-lookup heavy, use LZ4 for speed
        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);
        opts
    }

    fn cf_options_indices() -> Options {
        let mut opts = Options::default();
        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);
        let mut block_opts = rocksdb::BlockBasedOptions::default();
        block_opts.set_bloom_filter(10.0, false);
        opts.set_block_based_table_factory(&block_opts);
        opts
    }

    fn cf_handle(&self, name: &str) -> Result<&ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| Error::Storage(format!("Column family {} not found", name)))
    }

    // Entry operations

    /// Insert entry if its reference is absent, atomically with the reference
    /// mapping and user index
    pub fn append_entry_if_absent(&self, entry: &LedgerEntry) -> Result<AppendOutcome> {
        if let Some(existing) = self.find_by_reference(&entry.reference)? {
            return Ok(AppendOutcome::AlreadyExists(existing));
        }

        let mut batch = WriteBatch::default();
        self.stage_entry(&mut batch, entry)?;
        self.db.write(batch)?;

        tracing::debug!(
            entry_id = %entry.id,
            reference = %entry.reference,
            user_id = %entry.user_id,
            entry_type = %entry.entry_type,
            amount = entry.amount,
            "Ledger entry appended"
        );

        Ok(AppendOutcome::Inserted)
    }

    /// Stage an entry plus its reference mapping and user index into a batch
    fn stage_entry(&self, batch: &mut WriteBatch, entry: &LedgerEntry) -> Result<()> {
        let cf_entries = self.cf_handle(CF_ENTRIES)?;
        batch.put_cf(cf_entries, entry.id.as_bytes(), bincode::serialize(entry)?);

        let cf_references = self.cf_handle(CF_REFERENCES)?;
        batch.put_cf(
            cf_references,
            entry.reference.as_str().as_bytes(),
            entry.id.as_bytes(),
        );

        let cf_indices = self.cf_handle(CF_INDICES)?;
        batch.put_cf(
            cf_indices,
            Self::index_key_user_entry(&entry.user_id, entry.id),
            &[],
        );

        Ok(())
    }

    /// Get entry by ID
    pub fn get_entry(&self, entry_id: Uuid) -> Result<LedgerEntry> {
        let cf = self.cf_handle(CF_ENTRIES)?;

        let value = self
            .db
            .get_cf(cf, entry_id.as_bytes())?
            .ok_or_else(|| Error::EntryNotFound(entry_id.to_string()))?;

        Ok(bincode::deserialize(&value)?)
    }

    /// Look up an entry by its idempotency reference
    pub fn find_by_reference(&self, reference: &Reference) -> Result<Option<LedgerEntry>> {
        let cf = self.cf_handle(CF_REFERENCES)?;

        let value = match self.db.get_cf(cf, reference.as_str().as_bytes())? {
            Some(value) => value,
            None => return Ok(None),
        };

        let id_bytes: [u8; 16] = value.as_slice().try_into().map_err(|_| {
            Error::Storage(format!("corrupt reference mapping for {}", reference))
        })?;

        Ok(Some(self.get_entry(Uuid::from_bytes(id_bytes))?))
    }

    /// Perform the exactly-once pending -> success/failed transition
    pub fn settle_entry(&self, reference: &Reference, status: EntryStatus) -> Result<SettleOutcome> {
        if !status.is_terminal() {
            return Err(Error::InvalidTransition(
                "settlement must transition to success or failed".to_string(),
            ));
        }

        let mut entry = self
            .find_by_reference(reference)?
            .ok_or_else(|| Error::EntryNotFound(reference.to_string()))?;

        if entry.status.is_terminal() {
            return Ok(SettleOutcome::AlreadySettled(entry));
        }

        entry.status = status;

        let cf = self.cf_handle(CF_ENTRIES)?;
        self.db
            .put_cf(cf, entry.id.as_bytes(), bincode::serialize(&entry)?)?;

        tracing::debug!(reference = %reference, status = %status, "Ledger entry settled");

        Ok(SettleOutcome::Settled(entry))
    }

    /// Get all entries for a user (via index)
    pub fn entries_for_user(&self, user_id: &UserId) -> Result<Vec<LedgerEntry>> {
        let cf_indices = self.cf_handle(CF_INDICES)?;

        let prefix = Self::index_prefix_user(user_id);
        let iter = self
            .db
            .iterator_cf(cf_indices, IteratorMode::From(&prefix, Direction::Forward));

        let mut entries = Vec::new();
        for item in iter {
            let (key, _) = item?;
            if !key.starts_with(&prefix) {
                break;
            }

            // Entry id is the final 16 bytes of the index key
            if key.len() >= prefix.len() + 16 {
                let id = Uuid::from_slice(&key[key.len() - 16..])
                    .map_err(|e| Error::Storage(format!("corrupt index key: {}", e)))?;
                entries.push(self.get_entry(id)?);
            }
        }

        Ok(entries)
    }

    // Wallet request operations

    /// Put wallet request
    pub fn put_request(&self, request: &WalletRequest) -> Result<()> {
        let cf = self.cf_handle(CF_REQUESTS)?;
        self.db
            .put_cf(cf, request.id.as_bytes(), bincode::serialize(request)?)?;
        Ok(())
    }

    /// Get wallet request by ID
    pub fn get_request(&self, request_id: Uuid) -> Result<WalletRequest> {
        let cf = self.cf_handle(CF_REQUESTS)?;

        let value = self
            .db
            .get_cf(cf, request_id.as_bytes())?
            .ok_or_else(|| Error::RequestNotFound(request_id.to_string()))?;

        Ok(bincode::deserialize(&value)?)
    }

    /// Write an approved request and its ledger entry in one batch.
    ///
    /// The request mutation and the ledger append are colocated in a single
    /// storage transaction; a replay that hits an existing reference writes
    /// neither.
    pub fn approve_request_with_entry(
        &self,
        request: &WalletRequest,
        entry: &LedgerEntry,
    ) -> Result<AppendOutcome> {
        if let Some(existing) = self.find_by_reference(&entry.reference)? {
            return Ok(AppendOutcome::AlreadyExists(existing));
        }

        let mut batch = WriteBatch::default();

        let cf_requests = self.cf_handle(CF_REQUESTS)?;
        batch.put_cf(cf_requests, request.id.as_bytes(), bincode::serialize(request)?);

        self.stage_entry(&mut batch, entry)?;

        self.db.write(batch)?;

        tracing::debug!(
            request_id = %request.id,
            reference = %entry.reference,
            "Wallet request approved with ledger entry"
        );

        Ok(AppendOutcome::Inserted)
    }

    // Order operations

    /// Put order
    pub fn put_order(&self, order: &Order) -> Result<()> {
        let cf = self.cf_handle(CF_ORDERS)?;
        self.db
            .put_cf(cf, order.id.as_str().as_bytes(), bincode::serialize(order)?)?;
        Ok(())
    }

    /// Get order by ID
    pub fn get_order(&self, order_id: &OrderId) -> Result<Order> {
        let cf = self.cf_handle(CF_ORDERS)?;

        let value = self
            .db
            .get_cf(cf, order_id.as_str().as_bytes())?
            .ok_or_else(|| Error::OrderNotFound(order_id.to_string()))?;

        Ok(bincode::deserialize(&value)?)
    }

    // Freeze operations

    /// Check moderation freeze flag; absent record means not frozen
    pub fn is_frozen(&self, user_id: &UserId) -> Result<bool> {
        let cf = self.cf_handle(CF_FREEZES)?;

        match self.db.get_cf(cf, user_id.as_str().as_bytes())? {
            Some(value) => {
                let freeze: WalletFreeze = bincode::deserialize(&value)?;
                Ok(freeze.is_active)
            }
            None => Ok(false),
        }
    }

    /// Write freeze flag (moderation ingestion; read-only to the wallet core)
    pub fn set_freeze(&self, freeze: &WalletFreeze) -> Result<()> {
        let cf = self.cf_handle(CF_FREEZES)?;
        self.db.put_cf(
            cf,
            freeze.user_id.as_str().as_bytes(),
            bincode::serialize(freeze)?,
        )?;
        Ok(())
    }

    // Audit operations

    /// Append audit record
    pub fn append_audit(&self, record: &AuditRecord) -> Result<()> {
        let cf = self.cf_handle(CF_AUDIT)?;
        self.db
            .put_cf(cf, record.id.as_bytes(), bincode::serialize(record)?)?;
        Ok(())
    }

    /// Audit records for a target, in time order. Full scan; the audit trail
    /// is low-volume relative to the ledger.
    pub fn audit_for_target(&self, target: &str) -> Result<Vec<AuditRecord>> {
        let cf = self.cf_handle(CF_AUDIT)?;

        let mut records = Vec::new();
        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (_, value) = item?;
            let record: AuditRecord = bincode::deserialize(&value)?;
            if record.target == target {
                records.push(record);
            }
        }

        Ok(records)
    }

    // Reconciliation

    /// Orders whose escrow is released but whose earning entry is missing.
    ///
    /// This is the recovery sweep for the window where the escrow ledger
    /// append failed and the compensating order revert failed too.
    pub fn released_orders_missing_credit(&self) -> Result<Vec<OrderId>> {
        let cf = self.cf_handle(CF_ORDERS)?;

        let mut missing = Vec::new();
        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (_, value) = item?;
            let order: Order = bincode::deserialize(&value)?;

            if order.status != OrderStatus::Completed {
                continue;
            }

            let reference = Reference::escrow_release(&order.id);
            if self.find_by_reference(&reference)?.is_none() {
                missing.push(order.id);
            }
        }

        Ok(missing)
    }

    // Index key helpers

    fn index_prefix_user(user_id: &UserId) -> Vec<u8> {
        let mut key = user_id.as_str().as_bytes().to_vec();
        key.push(b'|'); // Separator
        key
    }

    fn index_key_user_entry(user_id: &UserId, entry_id: Uuid) -> Vec<u8> {
        let mut key = Self::index_prefix_user(user_id);
        key.extend_from_slice(entry_id.as_bytes());
        key
    }
}
