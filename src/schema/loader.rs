//! Reading form configurations from JSON or TOML files.

use crate::schema::{FormConfiguration, SchemaError};
use std::fs;
use std::path::Path;

/// Parse one configuration file; the format is chosen by extension
/// (`.toml`, anything else is JSON).
pub fn load_form(path: &Path) -> Result<FormConfiguration, SchemaError> {
    let content = fs::read_to_string(path)?;
    let parsed = match path.extension().and_then(|e| e.to_str()) {
        Some("toml") => toml::from_str(&content).map_err(|e| e.to_string()),
        _ => serde_json::from_str(&content).map_err(|e| e.to_string()),
    };
    parsed.map_err(|e| SchemaError::Parse(format!("{}: {}", path.display(), e)))
}

/// Load a single file, or every `.json`/`.toml` file in a directory sorted by
/// file name.
pub fn load_forms(path: &Path) -> Result<Vec<FormConfiguration>, SchemaError> {
    if path.is_file() {
        return Ok(vec![load_form(path)?]);
    }

    let mut files = Vec::new();
    for entry in fs::read_dir(path)? {
        let entry_path = entry?.path();
        let is_config = matches!(
            entry_path.extension().and_then(|e| e.to_str()),
            Some("json") | Some("toml")
        );
        if entry_path.is_file() && is_config {
            files.push(entry_path);
        }
    }
    files.sort();

    files.iter().map(|file| load_form(file)).collect()
}
