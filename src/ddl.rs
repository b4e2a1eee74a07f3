//! DDL compiler.
//!
//! Turns a [`FormConfiguration`] into an ordered, idempotent [`DdlScript`]:
//! the table, one index per indexed field, and the `updated_at` trigger.

use crate::executor::{FormError, FormExecutor};
use crate::raw_sql::execute_script;
use crate::schema::{
    index_name, trigger_name, FieldDefinition, FormConfiguration, CREATED_AT_COLUMN, ID_COLUMN,
    UPDATED_AT_COLUMN,
};
use sea_query::{ColumnDef, DynIden, Expr, Index, IndexCreateStatement, PostgresQueryBuilder, Table, TableCreateStatement};
use std::fmt;

/// Shared trigger function; `CREATE OR REPLACE` keeps it idempotent.
pub const TRIGGER_FUNCTION_NAME: &str = "update_updated_at_column";

const TRIGGER_FUNCTION_SQL: &str = "CREATE OR REPLACE FUNCTION update_updated_at_column()
RETURNS TRIGGER AS $$
BEGIN
    NEW.updated_at = NOW();
    RETURN NEW;
END;
$$ LANGUAGE plpgsql";

/// Ordered DDL statements for one form table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DdlScript {
    table: String,
    statements: Vec<String>,
}

impl DdlScript {
    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn statements(&self) -> &[String] {
        &self.statements
    }

    /// The whole script as one `;`-terminated SQL text.
    pub fn to_sql(&self) -> String {
        let mut sql = String::new();
        for statement in &self.statements {
            sql.push_str(statement);
            sql.push_str(";\n\n");
        }
        sql.truncate(sql.trim_end().len());
        sql.push('\n');
        sql
    }

    /// Run every statement in order on `executor`.
    pub fn execute<E: FormExecutor + ?Sized>(&self, executor: &E) -> Result<(), FormError> {
        #[cfg(feature = "tracing")]
        let _span = crate::metrics::tracing_helpers::ensure_table_span(&self.table).entered();

        log::debug!("Ensuring table \"{}\" ({} statements)", self.table, self.statements.len());
        execute_script(executor, &self.statements).map(|_| ())
    }
}

impl fmt::Display for DdlScript {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_sql())
    }
}

pub(crate) fn iden(name: &str) -> DynIden {
    DynIden::from(name.to_string())
}

/// Double-quote an identifier for hand-written SQL.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Compile the DDL script for a form.
///
/// Identifiers are not re-validated here; call
/// [`FormConfiguration::validate`] first. They are always quoted.
pub fn generate_create_table_sql(config: &FormConfiguration) -> DdlScript {
    let table = config.postgres_table_name.as_str();
    let mut statements = vec![create_table_statement(config).build(PostgresQueryBuilder)];

    statements.extend(
        config
            .fields()
            .filter(|f| f.is_indexed())
            .map(|f| create_index_statement(table, &f.name).build(PostgresQueryBuilder)),
    );

    let trigger = trigger_name(table);
    statements.push(TRIGGER_FUNCTION_SQL.to_string());
    statements.push(format!(
        "DROP TRIGGER IF EXISTS {} ON {}",
        quote_ident(&trigger),
        quote_ident(table)
    ));
    statements.push(format!(
        "CREATE TRIGGER {} BEFORE UPDATE ON {} FOR EACH ROW EXECUTE FUNCTION {}()",
        quote_ident(&trigger),
        quote_ident(table),
        TRIGGER_FUNCTION_NAME
    ));

    DdlScript {
        table: table.to_string(),
        statements,
    }
}

fn create_table_statement(config: &FormConfiguration) -> TableCreateStatement {
    let mut stmt = Table::create();
    stmt.table(iden(&config.postgres_table_name))
        .if_not_exists()
        .col(
            ColumnDef::new(iden(ID_COLUMN))
                .custom(iden("UUID"))
                .primary_key()
                .default(Expr::cust("gen_random_uuid()")),
        )
        .col(
            ColumnDef::new(iden(CREATED_AT_COLUMN))
                .custom(iden("TIMESTAMPTZ"))
                .not_null()
                .default(Expr::cust("NOW()")),
        )
        .col(
            ColumnDef::new(iden(UPDATED_AT_COLUMN))
                .custom(iden("TIMESTAMPTZ"))
                .not_null()
                .default(Expr::cust("NOW()")),
        );

    for field in config.fields() {
        stmt.col(column_def(field));
    }
    stmt
}

fn column_def(field: &FieldDefinition) -> ColumnDef {
    let column = field.column_type();
    let mut def = ColumnDef::new(iden(&field.name));
    def.custom(iden(&column.sql()));
    if field.is_nullable() {
        def.null();
    } else {
        def.not_null();
    }
    if field.is_unique() {
        def.unique_key();
    }
    if let Some(default) = field.pg_config.as_ref().and_then(|pg| pg.default_value.as_ref()) {
        def.default(Expr::cust(column.default_literal(default)));
    }
    def
}

fn create_index_statement(table: &str, column: &str) -> IndexCreateStatement {
    Index::create()
        .if_not_exists()
        .name(index_name(table, column))
        .table(iden(table))
        .col(Expr::col(iden(column)))
        .to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn form(fields: serde_json::Value) -> FormConfiguration {
        serde_json::from_value(json!({
            "title": "Test",
            "postgresTableName": "inspections",
            "sections": [{"title": "Main", "fields": fields}]
        }))
        .unwrap()
    }

    #[test]
    fn test_statement_order() {
        let config = form(json!([
            {"name": "site", "label": "Site", "type": "text", "required": true, "pgConfig": {"index": true}},
            {"name": "inspector", "label": "Inspector", "type": "email", "pgConfig": {"index": true}}
        ]));
        let script = generate_create_table_sql(&config);
        let statements = script.statements();
        assert_eq!(statements.len(), 6);
        assert!(statements[0].starts_with("CREATE TABLE IF NOT EXISTS \"inspections\""));
        assert!(statements[1].contains("\"idx_inspections_site\""));
        assert!(statements[2].contains("\"idx_inspections_inspector\""));
        assert!(statements[3].starts_with("CREATE OR REPLACE FUNCTION update_updated_at_column()"));
        assert_eq!(
            statements[4],
            "DROP TRIGGER IF EXISTS \"update_inspections_updated_at\" ON \"inspections\""
        );
        assert!(statements[5].starts_with("CREATE TRIGGER \"update_inspections_updated_at\" BEFORE UPDATE"));
    }

    #[test]
    fn test_managed_and_field_columns() {
        let config = form(json!([
            {"name": "site", "label": "Site", "type": "text", "required": true},
            {"name": "contact", "label": "Contact", "type": "email", "pgConfig": {"unique": true}},
            {"name": "visits", "label": "Visits", "type": "range"},
            {"name": "agreed", "label": "Agreed", "type": "toggle", "pgConfig": {"defaultValue": false}},
            {"name": "settings", "label": "Settings", "type": "textarea",
             "pgConfig": {"type": "JSONB", "defaultValue": {"a": 1}}}
        ]));
        let sql = generate_create_table_sql(&config).statements()[0].clone();
        assert!(sql.contains("\"id\" UUID"), "{sql}");
        assert!(sql.contains("PRIMARY KEY"), "{sql}");
        assert!(sql.contains("DEFAULT gen_random_uuid()"), "{sql}");
        assert!(sql.contains("\"created_at\" TIMESTAMPTZ"), "{sql}");
        assert!(sql.contains("\"updated_at\" TIMESTAMPTZ"), "{sql}");
        assert!(sql.contains("DEFAULT NOW()"), "{sql}");
        assert!(sql.contains("\"site\" TEXT NOT NULL"), "{sql}");
        assert!(sql.contains("\"contact\" VARCHAR(255)"), "{sql}");
        assert!(sql.contains("UNIQUE"), "{sql}");
        assert!(sql.contains("\"visits\" INTEGER NULL"), "{sql}");
        assert!(sql.contains("DEFAULT false"), "{sql}");
        assert!(sql.contains(r#"DEFAULT '{"a":1}'::jsonb"#), "{sql}");
    }

    #[test]
    fn test_no_indexes_still_has_trigger() {
        let config = form(json!([{"name": "note", "label": "Note", "type": "text"}]));
        let script = generate_create_table_sql(&config);
        assert_eq!(script.statements().len(), 4);
        let sql = script.to_sql();
        assert!(sql.ends_with("EXECUTE FUNCTION update_updated_at_column();\n"), "{sql}");
        assert!(sql.contains("$$ LANGUAGE plpgsql;\n\nDROP TRIGGER"));
    }

    #[test]
    fn test_quote_ident() {
        assert_eq!(quote_ident("plain"), "\"plain\"");
        assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
    }
}
