//! Record/transaction lifecycle: definitions, models, and the services
//! that create, update, read, and expire them.

pub mod definition;
pub mod record;
pub mod service;
pub mod transaction;

pub use definition::{DefinitionRegistry, RecordDefinition, TransactionDefinition};
pub use record::{Record, RecordStatus};
pub use service::{
    CreateRecordRequest, CreateTransactionRequest, RecordProjection, RecordService,
    TransactionProjection, TransactionService, UpdateRecordRequest, UpdateTransactionRequest,
};
pub use transaction::{Transaction, TransactionStatus};
