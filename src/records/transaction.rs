//! Transaction model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entity::DynamicEntity;

/// Lifecycle status of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    #[default]
    New,
    InProgress,
    Completed,
}

impl std::fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionStatus::New => write!(f, "new"),
            TransactionStatus::InProgress => write!(f, "in_progress"),
            TransactionStatus::Completed => write!(f, "completed"),
        }
    }
}

impl std::str::FromStr for TransactionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(TransactionStatus::New),
            "in_progress" => Ok(TransactionStatus::InProgress),
            "completed" => Ok(TransactionStatus::Completed),
            other => Err(format!("Unknown transaction status: {other}")),
        }
    }
}

/// A transaction: a unit of work that carries a schema-bound payload and
/// owns the records it creates.
#[derive(Debug, Clone)]
pub struct Transaction {
    pub id: Uuid,
    pub transaction_definition_key: String,
    /// Workflow engine correlation id, when one exists.
    pub process_instance_id: Option<String>,
    pub status: TransactionStatus,
    pub created_by: String,
    pub last_updated_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Optimistic-concurrency version checked by the persistence collaborator.
    pub version: u64,
    pub data: DynamicEntity,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_strings() {
        for status in [
            TransactionStatus::New,
            TransactionStatus::InProgress,
            TransactionStatus::Completed,
        ] {
            let parsed: TransactionStatus = status.to_string().parse().unwrap();
            assert_eq!(parsed, status);
        }
        assert!("done".parse::<TransactionStatus>().is_err());
    }
}
