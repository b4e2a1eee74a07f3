//! Generates and writes the per-form artifacts.

use crate::actions::actions_module;
use crate::error::Result;
use crate::names::FormNames;
use crate::options::CodegenOptions;
use crate::types::types_module;
use crate::zod::schema_module;
use formforge::{generate_create_table_sql, FormConfiguration, FormRegistry};
use std::fs;
use std::path::{Path, PathBuf};

/// One generated file, relative to the output directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    pub name: String,
    pub contents: String,
}

#[derive(Debug, Clone, Default)]
pub struct FormWriter {
    options: CodegenOptions,
}

impl FormWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: CodegenOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &CodegenOptions {
        &self.options
    }

    fn header(&self, config: &FormConfiguration) -> Vec<String> {
        if !self.options.header {
            return Vec::new();
        }
        vec![
            format!(
                "Generated by formforge-codegen from \"{}\" ({})",
                config.title,
                config.table_name()
            ),
            "This file is generated - do not edit manually".to_string(),
        ]
    }

    /// `<table>.sql`, `<table>.schema.ts`, `<table>.types.ts` and
    /// `<table>.actions.ts` for one form. The configuration is validated
    /// first.
    pub fn generate_form(&self, config: &FormConfiguration) -> Result<Vec<GeneratedFile>> {
        config.validate()?;
        let names = FormNames::new(config);
        let header = self.header(config);

        let sql_header: String = header.iter().map(|line| format!("-- {line}\n")).collect();
        let sql = if sql_header.is_empty() {
            generate_create_table_sql(config).to_sql()
        } else {
            format!("{}\n{}", sql_header, generate_create_table_sql(config).to_sql())
        };

        Ok(vec![
            GeneratedFile {
                name: names.sql_file(),
                contents: sql,
            },
            GeneratedFile {
                name: names.schema_file(),
                contents: schema_module(config, &names, &header).render(),
            },
            GeneratedFile {
                name: names.types_file(),
                contents: types_module(config, &names, &header).render(),
            },
            GeneratedFile {
                name: names.actions_file(),
                contents: actions_module(config, &names, &self.options, &header).render(),
            },
        ])
    }

    /// Generate every form in the registry into `out_dir`, returning the
    /// written paths.
    pub fn write_all(&self, registry: &FormRegistry, out_dir: &Path) -> Result<Vec<PathBuf>> {
        fs::create_dir_all(out_dir)?;
        let mut written = Vec::new();
        for config in registry.iter() {
            for file in self.generate_form(config)? {
                let path = out_dir.join(&file.name);
                fs::write(&path, file.contents)?;
                log::debug!("Wrote {}", path.display());
                written.push(path);
            }
        }
        Ok(written)
    }
}
