//! Generator options, optionally read from a TOML file.

use crate::error::{CodegenError, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct CodegenOptions {
    /// Module exporting `insertFormData`, `getFormData`, `getFormDataById`,
    /// `updateFormData` and `deleteFormData`.
    pub data_module: String,
    /// Module exporting `prepareFormData`.
    pub uploads_module: String,
    /// Path revalidated after a write; `/<table>` when unset.
    pub revalidate_path: Option<String>,
    /// Prefix every file with a "generated" comment.
    pub header: bool,
}

impl Default for CodegenOptions {
    fn default() -> Self {
        Self {
            data_module: "@/lib/forms/data".to_string(),
            uploads_module: "@/lib/forms/uploads".to_string(),
            revalidate_path: None,
            header: true,
        }
    }
}

impl CodegenOptions {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        toml::from_str(&text).map_err(|e| CodegenError::Parse(format!("{}: {}", path.display(), e)))
    }

    pub fn revalidate_path_for(&self, table: &str) -> String {
        self.revalidate_path
            .clone()
            .unwrap_or_else(|| format!("/{table}"))
    }
}
