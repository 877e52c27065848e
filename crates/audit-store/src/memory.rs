use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use toolgate_gateway::{AuditQuery, AuditRecord, AuditSink, AuditStats, AuditStoreError};

/// In-memory audit store. Used in tests and embedded deployments where the
/// compliance log does not need to outlive the process.
pub struct MemoryAuditStore {
    records: Mutex<Vec<AuditRecord>>,
}

impl MemoryAuditStore {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }
}

impl Default for MemoryAuditStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AuditSink for MemoryAuditStore {
    async fn append(&self, record: AuditRecord) -> Result<(), AuditStoreError> {
        self.records.lock().push(record);
        Ok(())
    }
}

#[async_trait]
impl AuditQuery for MemoryAuditStore {
    async fn session_history(&self, session_id: &str) -> Result<Vec<AuditRecord>, AuditStoreError> {
        Ok(self
            .records
            .lock()
            .iter()
            .filter(|record| record.session_id == session_id)
            .cloned()
            .collect())
    }

    async fn stats(
        &self,
        tenant_id: &str,
        since: DateTime<Utc>,
    ) -> Result<AuditStats, AuditStoreError> {
        let records = self.records.lock();
        Ok(AuditStats::from_records(records.iter().filter(|record| {
            record.tenant_id == tenant_id && record.created_at >= since
        })))
    }
}
