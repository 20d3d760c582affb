//! The opaque durability capability `record_settlements` writes through:
//! `put(settlement_id, record)`, `delete(settlement_id)`. Durability
//! semantics are delegated to the store.

use dashmap::DashMap;
use model::{ids::SettlementId, settlement::Settlement};

pub trait RecordStore: Send + Sync {
    fn put(&self, settlement_id: SettlementId, record: Settlement);
    fn delete(&self, settlement_id: SettlementId);
}

/// In-process record store. Production deployments are expected to swap
/// this for a durable store; nothing in the executor depends on the
/// implementation beyond this trait.
#[derive(Default)]
pub struct InMemoryRecordStore {
    records: DashMap<SettlementId, Settlement>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, settlement_id: SettlementId) -> bool {
        self.records.contains_key(&settlement_id)
    }
}

impl RecordStore for InMemoryRecordStore {
    fn put(&self, settlement_id: SettlementId, record: Settlement) {
        self.records.insert(settlement_id, record);
    }

    fn delete(&self, settlement_id: SettlementId) {
        self.records.remove(&settlement_id);
    }
}
