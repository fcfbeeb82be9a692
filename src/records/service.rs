//! Record and transaction lifecycle services.
//!
//! These services are the only write path into the repositories. Every
//! operation takes the caller's [`UserContext`] explicitly, consults the
//! [`AuthorizationHandler`] before mutating or projecting, and validates
//! payloads through the schema-bound [`DynamicEntity`].

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use serde_json::{Map as JsonMap, Value as JsonValue};
use tracing::info;
use uuid::Uuid;

use crate::auth::{project_entity, Action, AuthorizationHandler, ResourceInstance, ResourceType, UserContext};
use crate::entity::{AttributePatch, DynamicEntity};
use crate::error::{CaseworkError, CaseworkResult, DependencyKind};
use crate::query::{Page, RecordQuery, TransactionQuery};
use crate::records::definition::DefinitionRegistry;
use crate::records::record::{Record, RecordStatus};
use crate::records::transaction::{Transaction, TransactionStatus};
use crate::repository::{RecordRepository, TransactionRepository};
use crate::schema::{AccessLevel, SchemaSet};

/// Payload for creating a transaction.
#[derive(Debug, Clone)]
pub struct CreateTransactionRequest {
    pub transaction_definition_key: String,
    pub process_instance_id: Option<String>,
    pub data: JsonMap<String, JsonValue>,
}

/// Payload for updating a transaction. Only the fields present in the patch
/// are overwritten.
#[derive(Debug, Clone, Default)]
pub struct UpdateTransactionRequest {
    pub patch: AttributePatch,
    pub status: Option<TransactionStatus>,
    /// Whether the caller's role qualifies this as an admin update. Computed
    /// by the caller-facing layer; honored here as a gate, never recomputed.
    pub admin_update: bool,
}

/// Payload for creating a record from a transaction.
#[derive(Debug, Clone)]
pub struct CreateRecordRequest {
    pub record_definition_key: String,
    pub external_id: Option<String>,
    /// The transaction this record is created from.
    pub transaction_id: Uuid,
    pub data: JsonMap<String, JsonValue>,
}

/// Payload for updating a record.
#[derive(Debug, Clone, Default)]
pub struct UpdateRecordRequest {
    pub patch: AttributePatch,
    /// Transaction driving this update, if any.
    pub from_transaction: Option<Uuid>,
    /// Whether the caller's role qualifies this as an admin update. Computed
    /// by the caller-facing layer; honored here as a gate, never recomputed.
    pub admin_update: bool,
}

/// The externally visible shape of a record, with data filtered per the
/// caller's field-level clearance.
#[derive(Debug, Clone, Serialize)]
pub struct RecordProjection {
    pub id: Uuid,
    pub record_definition_key: String,
    pub external_id: Option<String>,
    pub status: RecordStatus,
    pub expires: chrono::DateTime<Utc>,
    pub created_from: Option<Uuid>,
    pub created_by: String,
    pub last_updated_by: String,
    pub created_at: chrono::DateTime<Utc>,
    pub updated_at: chrono::DateTime<Utc>,
    pub data: JsonMap<String, JsonValue>,
}

/// The externally visible shape of a transaction.
#[derive(Debug, Clone, Serialize)]
pub struct TransactionProjection {
    pub id: Uuid,
    pub transaction_definition_key: String,
    pub process_instance_id: Option<String>,
    pub status: TransactionStatus,
    pub created_by: String,
    pub created_at: chrono::DateTime<Utc>,
    pub updated_at: chrono::DateTime<Utc>,
    pub data: JsonMap<String, JsonValue>,
}

/// Lifecycle manager for transactions.
pub struct TransactionService {
    schemas: Arc<SchemaSet>,
    definitions: Arc<DefinitionRegistry>,
    repository: Arc<dyn TransactionRepository>,
    authorizer: Arc<dyn AuthorizationHandler>,
}

impl TransactionService {
    pub fn new(
        schemas: Arc<SchemaSet>,
        definitions: Arc<DefinitionRegistry>,
        repository: Arc<dyn TransactionRepository>,
        authorizer: Arc<dyn AuthorizationHandler>,
    ) -> Self {
        Self {
            schemas,
            definitions,
            repository,
            authorizer,
        }
    }

    pub async fn create(
        &self,
        ctx: &UserContext,
        request: CreateTransactionRequest,
    ) -> CaseworkResult<TransactionProjection> {
        if !self
            .authorizer
            .is_allowed(ctx, Action::Create, ResourceType::Transaction)
        {
            return Err(CaseworkError::forbidden_action("create", "transaction"));
        }

        let definition = self
            .definitions
            .transaction_definition(&request.transaction_definition_key)?;
        let schema = self.schemas.get(&definition.schema_key)?;
        let data = DynamicEntity::from_flat_map(schema, &request.data)?;

        let now = Utc::now();
        let transaction = Transaction {
            id: Uuid::new_v4(),
            transaction_definition_key: definition.key.clone(),
            process_instance_id: request.process_instance_id,
            status: TransactionStatus::New,
            created_by: ctx.user_id.clone(),
            last_updated_by: ctx.user_id.clone(),
            created_at: now,
            updated_at: now,
            version: 0,
            data,
        };

        let saved = self.repository.save(transaction).await?;
        info!(
            transaction_id = %saved.id,
            definition = %definition.key,
            "Created transaction"
        );

        Ok(self.project(ctx, &saved))
    }

    pub async fn get(&self, ctx: &UserContext, id: Uuid) -> CaseworkResult<TransactionProjection> {
        if !self
            .authorizer
            .is_allowed(ctx, Action::View, ResourceType::Transaction)
        {
            return Err(CaseworkError::forbidden_action("view", "transaction"));
        }

        let transaction = self.load(id).await?;
        if !self.authorizer.is_allowed_for_instance(
            ctx,
            Action::View,
            &ResourceInstance::Transaction(&transaction),
        ) {
            return Err(CaseworkError::forbidden_instance("view", "transaction", id));
        }

        Ok(self.project(ctx, &transaction))
    }

    pub async fn update(
        &self,
        ctx: &UserContext,
        id: Uuid,
        request: UpdateTransactionRequest,
    ) -> CaseworkResult<TransactionProjection> {
        if !self
            .authorizer
            .is_allowed(ctx, Action::Update, ResourceType::Transaction)
        {
            return Err(CaseworkError::forbidden_action("update", "transaction"));
        }

        let mut transaction = self.load(id).await?;
        if !self.authorizer.is_allowed_for_instance(
            ctx,
            Action::Update,
            &ResourceInstance::Transaction(&transaction),
        ) {
            return Err(CaseworkError::forbidden_instance("update", "transaction", id));
        }

        guard_admin_fields(&transaction.data, &request.patch, request.admin_update)?;

        transaction.data.apply_patch(&request.patch)?;
        if let Some(status) = request.status {
            transaction.status = status;
        }
        transaction.last_updated_by = ctx.user_id.clone();
        transaction.updated_at = Utc::now();

        let saved = self.repository.save(transaction).await?;
        info!(transaction_id = %saved.id, "Updated transaction");

        Ok(self.project(ctx, &saved))
    }

    pub async fn list(
        &self,
        ctx: &UserContext,
        query: TransactionQuery,
    ) -> CaseworkResult<Page<TransactionProjection>> {
        if !self
            .authorizer
            .is_allowed(ctx, Action::View, ResourceType::Transaction)
        {
            return Err(CaseworkError::forbidden_action("view", "transaction"));
        }

        let page = self.repository.query(&query).await?;
        Ok(page.map(|t| self.project(ctx, &t)))
    }

    async fn load(&self, id: Uuid) -> CaseworkResult<Transaction> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| CaseworkError::NotFound {
                resource: "transaction",
                id: id.to_string(),
            })
    }

    fn project(&self, ctx: &UserContext, transaction: &Transaction) -> TransactionProjection {
        let filter = self
            .authorizer
            .auth_filter(ctx, Action::View, ResourceType::Transaction);
        TransactionProjection {
            id: transaction.id,
            transaction_definition_key: transaction.transaction_definition_key.clone(),
            process_instance_id: transaction.process_instance_id.clone(),
            status: transaction.status,
            created_by: transaction.created_by.clone(),
            created_at: transaction.created_at,
            updated_at: transaction.updated_at,
            data: project_entity(&transaction.data, &filter),
        }
    }
}

/// Lifecycle manager for records.
pub struct RecordService {
    schemas: Arc<SchemaSet>,
    definitions: Arc<DefinitionRegistry>,
    records: Arc<dyn RecordRepository>,
    transactions: Arc<dyn TransactionRepository>,
    authorizer: Arc<dyn AuthorizationHandler>,
}

impl RecordService {
    pub fn new(
        schemas: Arc<SchemaSet>,
        definitions: Arc<DefinitionRegistry>,
        records: Arc<dyn RecordRepository>,
        transactions: Arc<dyn TransactionRepository>,
        authorizer: Arc<dyn AuthorizationHandler>,
    ) -> Self {
        Self {
            schemas,
            definitions,
            records,
            transactions,
            authorizer,
        }
    }

    /// Create a record from a transaction.
    ///
    /// Requires a resolvable record definition and parent transaction (both
    /// dependency failures when absent), view and update permission on the
    /// parent transaction, and a payload valid against the definition's
    /// schema. `expires` is derived here, once.
    pub async fn create(
        &self,
        ctx: &UserContext,
        request: CreateRecordRequest,
    ) -> CaseworkResult<RecordProjection> {
        if !self
            .authorizer
            .is_allowed(ctx, Action::Create, ResourceType::Record)
        {
            return Err(CaseworkError::forbidden_action("create", "record"));
        }

        let definition = self
            .definitions
            .record_definition(&request.record_definition_key)?;

        let transaction = self
            .transactions
            .find_by_id(request.transaction_id)
            .await?
            .ok_or_else(|| CaseworkError::MissingDependency {
                kind: DependencyKind::Transaction,
                reference: request.transaction_id.to_string(),
            })?;

        let instance = ResourceInstance::Transaction(&transaction);
        for action in [Action::View, Action::Update] {
            if !self.authorizer.is_allowed_for_instance(ctx, action, &instance) {
                return Err(CaseworkError::forbidden_instance(
                    "update",
                    "transaction",
                    transaction.id,
                ));
            }
        }

        let schema = self.schemas.get(&definition.schema_key)?;
        let data = DynamicEntity::from_flat_map(schema, &request.data)?;

        let now = Utc::now();
        let record = Record {
            id: Uuid::new_v4(),
            record_definition_key: definition.key.clone(),
            external_id: request.external_id,
            status: RecordStatus::Active,
            expires: now + definition.expiration,
            created_from: Some(transaction.id),
            last_updated_from: Some(transaction.id),
            created_by: ctx.user_id.clone(),
            last_updated_by: ctx.user_id.clone(),
            created_at: now,
            updated_at: now,
            version: 0,
            data,
        };

        let saved = self.records.save(record).await?;
        info!(
            record_id = %saved.id,
            definition = %definition.key,
            transaction_id = %transaction.id,
            "Created record"
        );

        Ok(self.project(ctx, &saved))
    }

    pub async fn get(&self, ctx: &UserContext, id: Uuid) -> CaseworkResult<RecordProjection> {
        if !self
            .authorizer
            .is_allowed(ctx, Action::View, ResourceType::Record)
        {
            return Err(CaseworkError::forbidden_action("view", "record"));
        }

        let record = self.load(id).await?;
        if !self.authorizer.is_allowed_for_instance(
            ctx,
            Action::View,
            &ResourceInstance::Record(&record),
        ) {
            return Err(CaseworkError::forbidden_instance("view", "record", id));
        }

        Ok(self.project(ctx, &record))
    }

    /// Partial update: only the fields present in the patch are overwritten,
    /// and the merged entity is re-validated against its schema. A patch
    /// that explicitly targets an admin-tier attribute is rejected wholesale
    /// unless the request carries the admin-update flag.
    pub async fn update(
        &self,
        ctx: &UserContext,
        id: Uuid,
        request: UpdateRecordRequest,
    ) -> CaseworkResult<RecordProjection> {
        if !self
            .authorizer
            .is_allowed(ctx, Action::Update, ResourceType::Record)
        {
            return Err(CaseworkError::forbidden_action("update", "record"));
        }

        let mut record = self.load(id).await?;
        if !self.authorizer.is_allowed_for_instance(
            ctx,
            Action::Update,
            &ResourceInstance::Record(&record),
        ) {
            return Err(CaseworkError::forbidden_instance("update", "record", id));
        }

        guard_admin_fields(&record.data, &request.patch, request.admin_update)?;

        record.data.apply_patch(&request.patch)?;
        if let Some(from) = request.from_transaction {
            record.last_updated_from = Some(from);
        }
        record.last_updated_by = ctx.user_id.clone();
        record.updated_at = Utc::now();
        // `expires` is intentionally left as derived at creation.

        let saved = self.records.save(record).await?;
        info!(record_id = %saved.id, "Updated record");

        Ok(self.project(ctx, &saved))
    }

    pub async fn list(
        &self,
        ctx: &UserContext,
        query: RecordQuery,
    ) -> CaseworkResult<Page<RecordProjection>> {
        if !self
            .authorizer
            .is_allowed(ctx, Action::View, ResourceType::Record)
        {
            return Err(CaseworkError::forbidden_action("view", "record"));
        }

        let page = self.records.query(&query).await?;
        Ok(page.map(|r| self.project(ctx, &r)))
    }

    async fn load(&self, id: Uuid) -> CaseworkResult<Record> {
        self.records
            .find_by_id(id)
            .await?
            .ok_or_else(|| CaseworkError::NotFound {
                resource: "record",
                id: id.to_string(),
            })
    }

    fn project(&self, ctx: &UserContext, record: &Record) -> RecordProjection {
        let filter = self
            .authorizer
            .auth_filter(ctx, Action::View, ResourceType::Record);
        RecordProjection {
            id: record.id,
            record_definition_key: record.record_definition_key.clone(),
            external_id: record.external_id.clone(),
            status: record.effective_status(Utc::now()),
            expires: record.expires,
            created_from: record.created_from,
            created_by: record.created_by.clone(),
            last_updated_by: record.last_updated_by.clone(),
            created_at: record.created_at,
            updated_at: record.updated_at,
            data: project_entity(&record.data, &filter),
        }
    }
}

/// Reject a patch that explicitly targets admin-tier attributes when the
/// update was not qualified as an admin update. Rejection is wholesale;
/// nothing is silently stripped.
fn guard_admin_fields(
    data: &DynamicEntity,
    patch: &AttributePatch,
    admin_update: bool,
) -> CaseworkResult<()> {
    if admin_update {
        return Ok(());
    }

    let admin_fields: Vec<String> = patch
        .field_names()
        .filter(|name| {
            data.schema()
                .attribute(name)
                .is_some_and(|def| def.access == AccessLevel::Admin)
        })
        .map(str::to_string)
        .collect();

    if admin_fields.is_empty() {
        Ok(())
    } else {
        Err(CaseworkError::forbidden_admin_fields(&admin_fields))
    }
}
