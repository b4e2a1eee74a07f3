//! Locating the form configurations a command runs against.

use crate::error::Result;
use formforge::schema::loader::load_forms;
use formforge::{FormConfiguration, FormRegistry};
use std::path::Path;

/// Forms to operate on and where they came from.
pub struct LoadedForms {
    pub registry: FormRegistry,
    /// True when nothing was found and the built-in example stands in.
    pub is_example: bool,
}

/// Load every configuration under `path` (file or directory) and run the
/// duplicate-table check. A missing or empty location yields the built-in
/// example form.
pub fn load_registry(path: &Path) -> Result<LoadedForms> {
    let configs = if path.exists() {
        load_forms(path)?
    } else {
        log::debug!("{} does not exist", path.display());
        Vec::new()
    };

    let is_example = configs.is_empty();
    let configs = if is_example {
        vec![FormConfiguration::example()]
    } else {
        configs
    };

    Ok(LoadedForms {
        registry: FormRegistry::new(configs)?,
        is_example,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DbToolError;
    use formforge::SchemaError;

    fn write_form(dir: &Path, file: &str, table: &str) {
        let mut config = serde_json::to_value(FormConfiguration::example()).unwrap();
        config["postgresTableName"] = serde_json::json!(table);
        std::fs::write(dir.join(file), config.to_string()).unwrap();
    }

    #[test]
    fn test_missing_directory_uses_example() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = load_registry(&dir.path().join("nope")).unwrap();
        assert!(loaded.is_example);
        assert!(loaded.registry.get("maintenance_checks").is_some());
    }

    #[test]
    fn test_empty_directory_uses_example() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = load_registry(dir.path()).unwrap();
        assert!(loaded.is_example);
        assert_eq!(loaded.registry.len(), 1);
    }

    #[test]
    fn test_directory_forms_are_loaded() {
        let dir = tempfile::tempdir().unwrap();
        write_form(dir.path(), "a.json", "pump_checks");
        write_form(dir.path(), "b.json", "valve_checks");
        let loaded = load_registry(dir.path()).unwrap();
        assert!(!loaded.is_example);
        assert_eq!(loaded.registry.len(), 2);
    }

    #[test]
    fn test_duplicate_tables_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        write_form(dir.path(), "a.json", "pump_checks");
        write_form(dir.path(), "b.json", "PUMP_CHECKS");
        let err = load_registry(dir.path()).err().unwrap();
        assert!(matches!(err, DbToolError::Schema(SchemaError::DuplicateTable(_))));
    }
}
