//! Casework demo
//!
//! Loads a casework configuration, seeds in-memory repositories, and runs a
//! transaction -> record round trip, printing the projection each caller
//! tier observes.

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use casework_core::auth::{AuthorizationHandler, RolePolicy, UserContext};
use casework_core::config::CaseworkConfigFile;
use casework_core::entity::AttributePatch;
use casework_core::records::service::{
    CreateRecordRequest, CreateTransactionRequest, UpdateRecordRequest,
};
use casework_core::records::{RecordService, TransactionService};
use casework_core::repository::{
    InMemoryRecordRepository, InMemoryTransactionRepository, RecordRepository,
    TransactionRepository,
};
use casework_core::query::RecordQuery;

/// Default configuration path
const DEFAULT_CONFIG_PATH: &str = "config/casework.yaml";

/// Fallback configuration when no file is present.
const BUILTIN_CONFIG: &str = r#"
schemas:
  - key: permit_application
    attributes:
      - name: applicant_name
        type: string
      - name: unit_count
        type: integer
      - name: inspection_date
        type: date
      - name: reviewer_notes
        type: string
        access: admin

record_definitions:
  - key: permit
    name: Building Permit
    schema: permit_application
    expiration_seconds: 2592000

transaction_definitions:
  - key: permit_request
    schema: permit_application
"#;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "casework_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config_path =
        std::env::var("CASEWORK_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());

    let config = if std::path::Path::new(&config_path).exists() {
        tracing::info!(path = %config_path, "Loading configuration");
        CaseworkConfigFile::from_path(&config_path)?
    } else {
        tracing::info!("No configuration file found, using built-in sample");
        CaseworkConfigFile::from_yaml_str(BUILTIN_CONFIG)?
    };

    let (schemas, definitions) = config.compile()?;

    let record_repo: Arc<dyn RecordRepository> = Arc::new(InMemoryRecordRepository::new());
    let transaction_repo: Arc<dyn TransactionRepository> =
        Arc::new(InMemoryTransactionRepository::new());
    let authorizer: Arc<dyn AuthorizationHandler> = Arc::new(RolePolicy::new());

    let transactions = TransactionService::new(
        Arc::clone(&schemas),
        Arc::clone(&definitions),
        Arc::clone(&transaction_repo),
        Arc::clone(&authorizer),
    );
    let records = RecordService::new(
        schemas,
        definitions,
        record_repo,
        transaction_repo,
        authorizer,
    );

    let citizen = UserContext::public("citizen-42");
    let worker = UserContext::agency("worker-7");
    let admin = UserContext::admin("admin-1");

    // A citizen submits a transaction.
    let submitted = transactions
        .create(
            &citizen,
            CreateTransactionRequest {
                transaction_definition_key: "permit_request".to_string(),
                process_instance_id: Some("proc-1001".to_string()),
                data: serde_json::json!({
                    "applicant_name": "Ada Lovelace",
                    "unit_count": 2,
                })
                .as_object()
                .unwrap()
                .clone(),
            },
        )
        .await?;

    // An agency worker opens a record from it.
    let record = records
        .create(
            &worker,
            CreateRecordRequest {
                record_definition_key: "permit".to_string(),
                external_id: Some("PRM-2026-0042".to_string()),
                transaction_id: submitted.id,
                data: serde_json::json!({
                    "applicant_name": "Ada Lovelace",
                    "unit_count": 2,
                    "inspection_date": "2026-09-15",
                })
                .as_object()
                .unwrap()
                .clone(),
            },
        )
        .await?;

    // An admin annotates the record.
    records
        .update(
            &admin,
            record.id,
            UpdateRecordRequest {
                patch: AttributePatch::from_value(
                    serde_json::json!({"reviewer_notes": "zoning check complete"}),
                )
                .unwrap(),
                admin_update: true,
                ..Default::default()
            },
        )
        .await?;

    // Each tier sees a different projection of the same record.
    for ctx in [&citizen, &worker, &admin] {
        let page = records
            .list(ctx, RecordQuery::new().with_external_id("PRM-2026-0042"))
            .await?;
        println!(
            "as {} ({}): {}",
            ctx.user_id,
            ctx.user_type,
            serde_json::to_string_pretty(&page.items)?
        );
    }

    Ok(())
}
