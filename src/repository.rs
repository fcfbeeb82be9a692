//! Persistence abstraction.
//!
//! The core never touches storage directly: it loads and saves entities
//! through these traits and propagates the collaborator's failures. The
//! in-memory implementations back the tests and the demo binary, and
//! enforce the optimistic-concurrency contract: a save whose version does
//! not match the stored row fails with `Conflict` instead of overwriting.

use std::collections::HashMap;

use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{CaseworkError, CaseworkResult};
use crate::query::{paginate, Page, RecordQuery, TransactionQuery};
use crate::records::record::Record;
use crate::records::transaction::Transaction;

#[async_trait::async_trait]
pub trait RecordRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> CaseworkResult<Option<Record>>;

    /// Persist the record, returning the stored row (with its new version).
    async fn save(&self, record: Record) -> CaseworkResult<Record>;

    async fn query(&self, query: &RecordQuery) -> CaseworkResult<Page<Record>>;
}

#[async_trait::async_trait]
pub trait TransactionRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> CaseworkResult<Option<Transaction>>;

    async fn save(&self, transaction: Transaction) -> CaseworkResult<Transaction>;

    async fn query(&self, query: &TransactionQuery) -> CaseworkResult<Page<Transaction>>;
}

/// In-memory record store.
#[derive(Debug, Default)]
pub struct InMemoryRecordRepository {
    rows: RwLock<HashMap<Uuid, Record>>,
}

impl InMemoryRecordRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl RecordRepository for InMemoryRecordRepository {
    async fn find_by_id(&self, id: Uuid) -> CaseworkResult<Option<Record>> {
        Ok(self.rows.read().await.get(&id).cloned())
    }

    async fn save(&self, mut record: Record) -> CaseworkResult<Record> {
        let mut rows = self.rows.write().await;
        if let Some(existing) = rows.get(&record.id) {
            if existing.version != record.version {
                return Err(CaseworkError::Conflict {
                    resource: "record",
                    id: record.id.to_string(),
                });
            }
        }
        record.version += 1;
        rows.insert(record.id, record.clone());
        Ok(record)
    }

    async fn query(&self, query: &RecordQuery) -> CaseworkResult<Page<Record>> {
        let now = Utc::now();
        let rows = self.rows.read().await;
        let mut matches: Vec<Record> = rows
            .values()
            .filter(|r| query.matches(r, now))
            .cloned()
            .collect();
        matches.sort_by(|a, b| query.compare(a, b));
        Ok(paginate(matches, query.page))
    }
}

/// In-memory transaction store.
#[derive(Debug, Default)]
pub struct InMemoryTransactionRepository {
    rows: RwLock<HashMap<Uuid, Transaction>>,
}

impl InMemoryTransactionRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl TransactionRepository for InMemoryTransactionRepository {
    async fn find_by_id(&self, id: Uuid) -> CaseworkResult<Option<Transaction>> {
        Ok(self.rows.read().await.get(&id).cloned())
    }

    async fn save(&self, mut transaction: Transaction) -> CaseworkResult<Transaction> {
        let mut rows = self.rows.write().await;
        if let Some(existing) = rows.get(&transaction.id) {
            if existing.version != transaction.version {
                return Err(CaseworkError::Conflict {
                    resource: "transaction",
                    id: transaction.id.to_string(),
                });
            }
        }
        transaction.version += 1;
        rows.insert(transaction.id, transaction.clone());
        Ok(transaction)
    }

    async fn query(&self, query: &TransactionQuery) -> CaseworkResult<Page<Transaction>> {
        let rows = self.rows.read().await;
        let mut matches: Vec<Transaction> =
            rows.values().filter(|t| query.matches(t)).cloned().collect();
        matches.sort_by(|a, b| query.compare(a, b));
        Ok(paginate(matches, query.page))
    }
}
