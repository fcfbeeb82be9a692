//! casework-core: schema-driven record/transaction management.
//!
//! Business entities ("records", "transactions") carry attributes whose
//! shape is defined by externally-configured schemas rather than fixed at
//! build time. This crate provides the runtime type system that validates
//! and stores attribute values against a declared schema, and the
//! authorization-filtered projection layer that redacts those values per
//! the caller's role before they cross the API boundary.
//!
//! ## Architecture
//!
//! ```text
//! YAML config ──► SchemaSet / DefinitionRegistry   (compiled once, shared)
//!                        │
//! raw key-values ──► DynamicEntity (validate + store typed values)
//!                        │
//! RecordService / TransactionService  ──►  repository traits
//!                        │
//! AuthorizationHandler ──► AuthFilter ──► project_entity  (single boundary)
//! ```
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use casework_core::auth::{RolePolicy, UserContext};
//! use casework_core::config::CaseworkConfigFile;
//! use casework_core::records::{RecordService, TransactionService};
//! use casework_core::repository::{InMemoryRecordRepository, InMemoryTransactionRepository};
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = CaseworkConfigFile::from_path("config/casework.yaml")?;
//! let (schemas, definitions) = config.compile()?;
//!
//! let records = Arc::new(InMemoryRecordRepository::new());
//! let transactions = Arc::new(InMemoryTransactionRepository::new());
//! let authorizer = Arc::new(RolePolicy::new());
//!
//! let service = RecordService::new(schemas, definitions, records, transactions, authorizer);
//! let _ctx = UserContext::agency("worker-1");
//! # Ok(())
//! # }
//! ```

// Core error handling
pub mod error;

// Configuration loading (YAML -> compiled registries)
pub mod config;

// Runtime schemas and the attribute type system
pub mod schema;

// Schema-bound value containers
pub mod entity;

// Caller context, permissions, and field-level filtering
pub mod auth;

// Record/transaction definitions, models, and lifecycle services
pub mod records;

// Persistence abstraction and in-memory implementations
pub mod repository;

// Filter/query building and pagination
pub mod query;

// Public re-exports for the main types
pub use auth::{
    Action, AuthFilter, AuthorizationHandler, Permission, ResourceType, RolePolicy, UserContext,
    UserType,
};
pub use config::CaseworkConfigFile;
pub use entity::{AttributePatch, DynamicEntity};
pub use error::{AttributeError, CaseworkError, CaseworkResult, SchemaError};
pub use query::{Page, PageRequest, RecordQuery, SortOrder, TransactionQuery};
pub use records::{
    Record, RecordService, RecordStatus, Transaction, TransactionService, TransactionStatus,
};
pub use repository::{
    InMemoryRecordRepository, InMemoryTransactionRepository, RecordRepository,
    TransactionRepository,
};
pub use schema::{AccessLevel, AttributeType, AttributeValue, Schema, SchemaSet};
