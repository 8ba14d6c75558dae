use std::collections::{BTreeMap, HashSet};
use std::sync::Mutex;

use super::{BacklogSource, RecordStore, RoomId, RoomRecord, StoreError};

/// In-process store used by tests: full-replace upserts keyed by id, a
/// write log, and optional per-id rejections.
#[derive(Default)]
pub struct MemoryStore {
    backlog: Vec<RoomId>,
    backlog_unavailable: bool,
    rejected_ids: HashSet<String>,
    records: Mutex<BTreeMap<RoomId, RoomRecord>>,
    writes: Mutex<Vec<RoomId>>,
}

impl MemoryStore {
    pub fn with_backlog(ids: &[&str]) -> Self {
        Self {
            backlog: ids.iter().map(|id| RoomId::from(*id)).collect(),
            ..Self::default()
        }
    }

    /// A store whose backlog view cannot be read.
    pub fn unavailable() -> Self {
        Self {
            backlog_unavailable: true,
            ..Self::default()
        }
    }

    /// Upserts for `id` fail with a store-level error.
    pub fn rejecting(mut self, id: &str) -> Self {
        self.rejected_ids.insert(id.to_string());
        self
    }

    pub fn record(&self, id: &str) -> Option<RoomRecord> {
        self.records.lock().unwrap().get(&RoomId::from(id)).cloned()
    }

    pub fn records(&self) -> BTreeMap<RoomId, RoomRecord> {
        self.records.lock().unwrap().clone()
    }

    pub fn writes(&self) -> Vec<RoomId> {
        self.writes.lock().unwrap().clone()
    }
}

impl BacklogSource for MemoryStore {
    async fn pending_rooms(&self) -> Result<Vec<RoomId>, StoreError> {
        if self.backlog_unavailable {
            return Err(StoreError::Rejected {
                status: 503,
                message: "relation \"view_except_rooms\" is unavailable".into(),
            });
        }
        Ok(self.backlog.clone())
    }
}

impl RecordStore for MemoryStore {
    async fn upsert(&self, record: &RoomRecord) -> Result<(), StoreError> {
        self.writes.lock().unwrap().push(record.id.clone());
        if self.rejected_ids.contains(record.id.as_str()) {
            return Err(StoreError::Rejected {
                status: 409,
                message: format!("write conflict for {}", record.id),
            });
        }
        self.records
            .lock()
            .unwrap()
            .insert(record.id.clone(), record.clone());
        Ok(())
    }
}
