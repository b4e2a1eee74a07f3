//! Set of form configurations served by one process.

use crate::schema::{FormConfiguration, SchemaError};
use std::collections::HashMap;

/// Validated, table-name-unique collection of forms.
#[derive(Debug, Clone, Default)]
pub struct FormRegistry {
    forms: Vec<FormConfiguration>,
    by_table: HashMap<String, usize>,
}

impl FormRegistry {
    /// Validate every configuration and reject table names used twice.
    /// Names are compared case-insensitively even though every statement
    /// quotes them, so `Pump_Checks` and `pump_checks` cannot both be served.
    pub fn new(forms: Vec<FormConfiguration>) -> Result<Self, SchemaError> {
        let mut by_table = HashMap::with_capacity(forms.len());
        for (idx, form) in forms.iter().enumerate() {
            form.validate()?;
            for warning in form.lint() {
                log::warn!("{warning}");
            }
            let key = form.postgres_table_name.to_ascii_lowercase();
            if by_table.insert(key, idx).is_some() {
                return Err(SchemaError::DuplicateTable(form.postgres_table_name.clone()));
            }
        }
        log::debug!("Registered {} form configuration(s)", forms.len());
        Ok(Self { forms, by_table })
    }

    pub fn get(&self, table: &str) -> Option<&FormConfiguration> {
        self.by_table
            .get(&table.to_ascii_lowercase())
            .map(|&idx| &self.forms[idx])
    }

    pub fn iter(&self) -> impl Iterator<Item = &FormConfiguration> {
        self.forms.iter()
    }

    pub fn len(&self) -> usize {
        self.forms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forms.is_empty()
    }
}
