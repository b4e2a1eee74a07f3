//! Tests for the form writer
//!
//! Tests verify that the generated artifacts:
//! - cover every configured form, four files each
//! - carry the DDL produced by the core crate
//! - reject invalid configurations before anything is written

use formforge::schema::{FieldDefinition, FieldKind, PgConfig, PgType};
use formforge::{FormConfiguration, FormRegistry};
use formforge_codegen::{CodegenError, CodegenOptions, FormWriter};

fn inspection_form() -> FormConfiguration {
    let mut config = FormConfiguration::example();
    config.title = "Site inspection".to_string();
    config.postgres_table_name = "site_inspections".to_string();
    let mut metadata = config.sections[1].fields[0].clone();
    metadata.name = "metadata".to_string();
    metadata.label = "Metadata".to_string();
    metadata.kind = FieldKind::Textarea;
    metadata.required = false;
    metadata.default_value = None;
    metadata.pg_config = Some(PgConfig {
        pg_type: Some(PgType::Jsonb),
        ..PgConfig::default()
    });
    config.sections[1].fields.push(metadata);
    config
}

fn file<'a>(files: &'a [formforge_codegen::GeneratedFile], name: &str) -> &'a str {
    &files
        .iter()
        .find(|f| f.name == name)
        .unwrap_or_else(|| panic!("missing {name}"))
        .contents
}

#[test]
fn test_generate_form_produces_four_files() {
    let files = FormWriter::new()
        .generate_form(&FormConfiguration::example())
        .unwrap();
    let names: Vec<&str> = files.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(
        names,
        [
            "maintenance_checks.sql",
            "maintenance_checks.schema.ts",
            "maintenance_checks.types.ts",
            "maintenance_checks.actions.ts",
        ]
    );
}

#[test]
fn test_sql_file_matches_core_ddl() {
    let config = FormConfiguration::example();
    let files = FormWriter::new().generate_form(&config).unwrap();
    let sql = file(&files, "maintenance_checks.sql");
    assert!(sql.starts_with("-- Generated by formforge-codegen from \"Maintenance checklist\""));
    assert!(sql.ends_with(&formforge::generate_create_table_sql(&config).to_sql()));
    assert!(sql.contains("CREATE INDEX IF NOT EXISTS"));
}

#[test]
fn test_header_can_be_disabled() {
    let writer = FormWriter::with_options(CodegenOptions {
        header: false,
        ..CodegenOptions::default()
    });
    let files = writer.generate_form(&FormConfiguration::example()).unwrap();
    for generated in &files {
        assert!(!generated.contents.contains("Generated by"), "{}", generated.name);
    }
    assert!(file(&files, "maintenance_checks.actions.ts").starts_with("\"use server\";"));
}

#[test]
fn test_json_column_gets_json_check() {
    let files = FormWriter::new().generate_form(&inspection_form()).unwrap();
    let schema = file(&files, "site_inspections.schema.ts");
    assert!(schema.contains("function isJson(value: string): boolean {"));
    assert!(schema.contains(".refine(isJson, { message: \"Must be valid JSON\" })"));
    let types = file(&files, "site_inspections.types.ts");
    assert!(types.contains("  metadata?: string | null;\n"));
}

#[test]
fn test_invalid_form_is_rejected() {
    let mut config = FormConfiguration::example();
    let mut clash: FieldDefinition = config.sections[0].fields[0].clone();
    clash.name = "created_at".to_string();
    config.sections[0].fields.push(clash);
    let err = FormWriter::new().generate_form(&config).unwrap_err();
    assert!(matches!(err, CodegenError::InvalidForm(_)));
}

#[test]
fn test_write_all_writes_every_form() {
    let dir = tempfile::tempdir().unwrap();
    let registry = FormRegistry::new(vec![FormConfiguration::example(), inspection_form()]).unwrap();
    let written = FormWriter::new().write_all(&registry, &dir.path().join("out")).unwrap();
    assert_eq!(written.len(), 8);
    for path in &written {
        assert!(path.exists(), "{} not written", path.display());
    }
    let actions = std::fs::read_to_string(dir.path().join("out/site_inspections.actions.ts")).unwrap();
    assert!(actions.contains("export async function submitSiteInspectionsForm(formData: FormData)"));
}
