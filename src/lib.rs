//! # Formforge
//!
//! Configuration-driven form scaffolding on the `may` runtime: one
//! [`FormConfiguration`] yields a payload validator, PostgreSQL DDL and a CRUD
//! data-access layer over `may_postgres`.
//!
//! TypeScript generation lives in the `formforge-codegen` crate and database
//! provisioning in `formforge-db`.

pub mod action;
pub mod config;
pub mod connection;
pub mod ddl;
pub mod executor;
pub mod json_helpers;
pub mod metrics;
pub mod pool;
pub mod query;
pub mod raw_sql;
pub mod schema;
pub mod store;
pub mod upload;
pub mod validation;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;

pub use action::{ActionResult, FormActions};
pub use config::{DatabaseConfig, FormforgeConfig, UploadConfig};
pub use connection::{connect, ConnectionError};
pub use ddl::{generate_create_table_sql, DdlScript};
pub use executor::{FormError, FormExecutor, MayPostgresExecutor};
pub use pool::FormPool;
pub use raw_sql::{execute_script, execute_unprepared, query_value};
pub use schema::{FieldDefinition, FieldKind, FormConfiguration, FormRegistry, SchemaError};
pub use store::{FormRecord, FormStore, InsertedRecord, ListOptions, Page, SortOrder, StoreError};
pub use upload::{DiskFileStore, FileStore, FormSubmission, UploadError, UploadedFile};
pub use validation::{FormValidator, ValidationErrors};
