use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;
use thiserror::Error;

use crate::record::{Record, RecordKind};

#[derive(Debug, Error)]
pub enum RecordStoreError {
    #[error("a {kind} record with code {code} already exists")]
    DuplicateCode { kind: RecordKind, code: String },
    #[error("record store lock poisoned")]
    Poisoned,
}

/// The record collections the allocator scans. In production these live in
/// the order-management backend; this seam lets the service run against an
/// in-process stand-in.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn list(&self, kind: RecordKind) -> Result<Vec<Record>, RecordStoreError>;

    /// Store a record. Codes are unique within a kind: a second record
    /// carrying an already-stored code is rejected, which is what makes a
    /// minted code durable exactly once. Records without a code are always
    /// accepted.
    async fn insert(&self, record: Record) -> Result<(), RecordStoreError>;
}

pub struct InMemoryRecordStore {
    records: RwLock<HashMap<RecordKind, Vec<Record>>>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        InMemoryRecordStore {
            records: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn list(&self, kind: RecordKind) -> Result<Vec<Record>, RecordStoreError> {
        let records = self.records.read().map_err(|_| RecordStoreError::Poisoned)?;
        Ok(records.get(&kind).cloned().unwrap_or_default())
    }

    async fn insert(&self, record: Record) -> Result<(), RecordStoreError> {
        let kind = record.kind();
        let mut records = self.records.write().map_err(|_| RecordStoreError::Poisoned)?;
        let bucket = records.entry(kind).or_default();
        if let Some(code) = record.code() {
            if bucket.iter().any(|existing| existing.code() == Some(code)) {
                return Err(RecordStoreError::DuplicateCode {
                    kind,
                    code: code.to_string(),
                });
            }
        }
        bucket.push(record);
        Ok(())
    }
}
