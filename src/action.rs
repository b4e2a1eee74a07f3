//! Server-action boundary.
//!
//! [`FormActions`] combines the validator, the store and the upload handling
//! and reports every outcome as an [`ActionResult`]. Nothing propagates past
//! this layer: validation failures are described field by field, and
//! infrastructure failures are logged and reported with a generic message.

use crate::executor::FormExecutor;
use crate::schema::FormConfiguration;
use crate::store::{parse_id, FormRecord, FormStore, InsertedRecord, ListOptions, Page, StoreError};
use crate::upload::{prepare_payload, FileStore, FormSubmission, UploadError};
use crate::validation::{FormValidator, ValidationErrors};
use serde::Serialize;
use serde_json::{Map, Value};

pub const GENERIC_ERROR: &str = "An unexpected error occurred";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionResult<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ActionResult<T> {
    pub fn ok(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            message: Some(message.into()),
        }
    }

    pub fn fail(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
            message: None,
        }
    }

    fn invalid(errors: &ValidationErrors) -> Self {
        Self::fail(format!("Validation error: {errors}"))
    }
}

/// Actions for one form.
pub struct FormActions<'a, E: FormExecutor + ?Sized> {
    store: FormStore<'a, E>,
    validator: FormValidator,
    files: &'a dyn FileStore,
}

impl<'a, E: FormExecutor + ?Sized> FormActions<'a, E> {
    pub fn new(config: &'a FormConfiguration, executor: &'a E, files: &'a dyn FileStore) -> Self {
        Self {
            store: FormStore::new(config, executor),
            validator: FormValidator::form_facing(config),
            files,
        }
    }

    fn table(&self) -> &str {
        &self.store.config().postgres_table_name
    }

    /// Handle a multipart form post: save uploads, validate, insert.
    pub fn submit(&self, submission: &FormSubmission) -> ActionResult<InsertedRecord> {
        let payload = match prepare_payload(self.store.config(), submission, self.files) {
            Ok(payload) => payload,
            Err(UploadError::UnexpectedFile(field)) => {
                return ActionResult::fail(format!("Validation error: {field}: File uploads are not accepted"))
            }
            Err(e) => return self.infrastructure_failure("submit", &e),
        };
        let result = self.create(&payload);
        if result.success {
            ActionResult {
                message: Some("Form submitted successfully".to_string()),
                ..result
            }
        } else {
            result
        }
    }

    pub fn create(&self, data: &Map<String, Value>) -> ActionResult<InsertedRecord> {
        let cleaned = match self.validator.validate(data) {
            Ok(cleaned) => cleaned,
            Err(errors) => return ActionResult::invalid(&errors),
        };
        match self.store.insert(&cleaned) {
            Ok(record) => ActionResult::ok(record, "Record created successfully"),
            Err(e) => self.store_failure("create", e),
        }
    }

    pub fn list(&self, options: &ListOptions) -> ActionResult<Page> {
        match self.store.get_form_data(options) {
            Ok(page) => {
                let message = format!("Found {} record(s)", page.total);
                ActionResult::ok(page, message)
            }
            Err(e) => self.store_failure("list", e),
        }
    }

    pub fn get_by_id(&self, id: &str) -> ActionResult<FormRecord> {
        let result = parse_id(id).and_then(|id| self.store.get_by_id(id));
        match result {
            Ok(Some(record)) => ActionResult::ok(record, "Record found"),
            Ok(None) => ActionResult::fail("Record not found"),
            Err(e) => self.store_failure("get", e),
        }
    }

    /// Partial update: only the keys present in `data` are validated.
    pub fn update(&self, id: &str, data: &Map<String, Value>) -> ActionResult<FormRecord> {
        let id = match parse_id(id) {
            Ok(id) => id,
            Err(e) => return self.store_failure("update", e),
        };
        let cleaned = match self.validator.validate_partial(data) {
            Ok(cleaned) => cleaned,
            Err(errors) => return ActionResult::invalid(&errors),
        };
        match self.store.update(id, &cleaned) {
            Ok(Some(record)) => ActionResult::ok(record, "Record updated successfully"),
            Ok(None) => ActionResult::fail("Record not found"),
            Err(e) => self.store_failure("update", e),
        }
    }

    pub fn delete(&self, id: &str) -> ActionResult<bool> {
        match parse_id(id).and_then(|id| self.store.delete(id)) {
            Ok(true) => ActionResult::ok(true, "Record deleted successfully"),
            Ok(false) => ActionResult::fail("Record not found"),
            Err(e) => self.store_failure("delete", e),
        }
    }

    /// Caller mistakes are reported as-is; anything else is logged and hidden.
    fn store_failure<T>(&self, operation: &str, err: StoreError) -> ActionResult<T> {
        match err {
            StoreError::InvalidColumn(_) | StoreError::UnknownField(_) | StoreError::InvalidId(_) => {
                ActionResult::fail(err.to_string())
            }
            StoreError::Database(_) | StoreError::Decode(_) => self.infrastructure_failure(operation, &err),
        }
    }

    fn infrastructure_failure<T>(&self, operation: &str, err: &dyn std::error::Error) -> ActionResult<T> {
        log::error!("{} on \"{}\" failed: {}", operation, self.table(), err);
        ActionResult::fail(GENERIC_ERROR)
    }
}
