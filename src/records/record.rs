//! Record model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entity::DynamicEntity;

/// Lifecycle status of a record.
///
/// `Expired` is a derived status: it is computed by comparing the clock to
/// the record's `expires` timestamp, never stored by a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    Active,
    Expired,
}

impl std::fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordStatus::Active => write!(f, "active"),
            RecordStatus::Expired => write!(f, "expired"),
        }
    }
}

impl std::str::FromStr for RecordStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(RecordStatus::Active),
            "expired" => Ok(RecordStatus::Expired),
            other => Err(format!("Unknown record status: {other}")),
        }
    }
}

/// A record: a long-lived business entity carrying a schema-bound payload.
#[derive(Debug, Clone)]
pub struct Record {
    pub id: Uuid,
    pub record_definition_key: String,
    pub external_id: Option<String>,
    pub status: RecordStatus,
    /// Derived once at creation from the definition's expiration duration;
    /// never silently recomputed.
    pub expires: DateTime<Utc>,
    /// Transaction that created this record (non-owning reference).
    pub created_from: Option<Uuid>,
    /// Transaction that last updated this record (non-owning reference).
    pub last_updated_from: Option<Uuid>,
    pub created_by: String,
    pub last_updated_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Optimistic-concurrency version checked by the persistence collaborator.
    pub version: u64,
    pub data: DynamicEntity,
}

impl Record {
    /// The status as observed at `now`: a record past its expiration reads
    /// as expired regardless of its stored status.
    pub fn effective_status(&self, now: DateTime<Utc>) -> RecordStatus {
        if self.expires <= now {
            RecordStatus::Expired
        } else {
            self.status
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.effective_status(now) == RecordStatus::Expired
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    use crate::config::CaseworkConfigFile;
    use crate::schema::SchemaSet;

    fn empty_data() -> DynamicEntity {
        let file = CaseworkConfigFile::from_yaml_str(
            "schemas:\n  - key: blank\n    attributes: []\n",
        )
        .unwrap();
        let schemas = SchemaSet::compile(&file.schemas).unwrap();
        DynamicEntity::new(schemas.get("blank").unwrap())
    }

    fn record_expiring_at(expires: DateTime<Utc>) -> Record {
        let now = Utc::now();
        Record {
            id: Uuid::new_v4(),
            record_definition_key: "permit".to_string(),
            external_id: None,
            status: RecordStatus::Active,
            expires,
            created_from: None,
            last_updated_from: None,
            created_by: "tester".to_string(),
            last_updated_by: "tester".to_string(),
            created_at: now,
            updated_at: now,
            version: 0,
            data: empty_data(),
        }
    }

    #[test]
    fn effective_status_derives_expiry() {
        let now = Utc::now();

        let live = record_expiring_at(now + Duration::hours(1));
        assert_eq!(live.effective_status(now), RecordStatus::Active);
        assert!(!live.is_expired(now));

        let stale = record_expiring_at(now - Duration::seconds(1));
        assert_eq!(stale.effective_status(now), RecordStatus::Expired);
        assert!(stale.is_expired(now));
    }

    #[test]
    fn status_parses_from_string() {
        assert_eq!("active".parse::<RecordStatus>().unwrap(), RecordStatus::Active);
        assert_eq!("expired".parse::<RecordStatus>().unwrap(), RecordStatus::Expired);
        assert!("open".parse::<RecordStatus>().is_err());
    }
}
