//! Identifiers shared by the generated modules.

use formforge::schema::identifier::{to_camel_case, to_pascal_case};
use formforge::FormConfiguration;

/// Names derived from a form's table name, e.g. `maintenance_checks`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormNames {
    pub table: String,
    /// `MaintenanceChecks`
    pub pascal: String,
    /// `maintenanceChecks`
    pub camel: String,
}

impl FormNames {
    pub fn new(config: &FormConfiguration) -> Self {
        let table = config.table_name().to_string();
        Self {
            pascal: to_pascal_case(&table),
            camel: to_camel_case(&table),
            table,
        }
    }

    /// Client-side schema: browser `File` objects for uploads.
    pub fn client_schema(&self) -> String {
        format!("{}Schema", self.camel)
    }

    /// Payload schema checked by the server actions.
    pub fn server_schema(&self) -> String {
        format!("{}ServerSchema", self.camel)
    }

    /// Stored-record schema, managed columns included.
    pub fn complete_schema(&self) -> String {
        format!("{}CompleteSchema", self.camel)
    }

    pub fn record_type(&self) -> String {
        self.pascal.clone()
    }

    pub fn input_type(&self) -> String {
        format!("{}Input", self.pascal)
    }

    pub fn form_values_type(&self) -> String {
        format!("{}FormValues", self.pascal)
    }

    pub fn schema_file(&self) -> String {
        format!("{}.schema.ts", self.table)
    }

    pub fn types_file(&self) -> String {
        format!("{}.types.ts", self.table)
    }

    pub fn actions_file(&self) -> String {
        format!("{}.actions.ts", self.table)
    }

    pub fn sql_file(&self) -> String {
        format!("{}.sql", self.table)
    }
}
