//! Declarative form configuration.
//!
//! A [`FormConfiguration`] is the single source of truth for one form/table
//! pair: the validator, the DDL, the generated TypeScript and the data-access
//! layer are all derived from it.

pub mod identifier;
pub mod kind;
pub mod loader;
pub mod pg_type;
pub mod registry;

use crate::schema::identifier::{check_identifier, index_name, trigger_name};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

pub use identifier::{index_name, is_valid_identifier, trigger_name, IdentifierProblem};
pub use kind::{FieldKind, KindSpec, StringFormat, ValueShape};
pub use pg_type::{ColumnType, PgType, TypeCategory};
pub use registry::FormRegistry;

/// Columns every generated table carries; fields may not reuse these names.
pub const ID_COLUMN: &str = "id";
pub const CREATED_AT_COLUMN: &str = "created_at";
pub const UPDATED_AT_COLUMN: &str = "updated_at";
pub const MANAGED_COLUMNS: [&str; 3] = [ID_COLUMN, CREATED_AT_COLUMN, UPDATED_AT_COLUMN];

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormConfiguration {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub postgres_table_name: String,
    #[serde(default = "default_submit_text")]
    pub submit_button_text: String,
    #[serde(default = "default_reset_text")]
    pub reset_button_text: String,
    #[serde(default)]
    pub sections: Vec<Section>,
}

fn default_submit_text() -> String {
    "Submit".to_string()
}

fn default_reset_text() -> String {
    "Reset".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_columns")]
    pub columns: u8,
    #[serde(default)]
    pub spacing: Spacing,
    #[serde(default)]
    pub fields: Vec<FieldDefinition>,
}

fn default_columns() -> u8 {
    1
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Spacing {
    Small,
    #[default]
    Medium,
    Large,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDefinition {
    pub name: String,
    pub label: String,
    #[serde(rename = "type")]
    pub kind: FieldKind,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub default_value: Option<Value>,
    #[serde(default)]
    pub placeholder: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub options: Vec<FieldOption>,
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
    #[serde(default)]
    pub step: Option<f64>,
    #[serde(default)]
    pub accept: Option<String>,
    #[serde(default)]
    pub multiple: bool,
    #[serde(default)]
    pub rows: Option<u32>,
    #[serde(default)]
    pub zod_config: Option<ZodConfig>,
    #[serde(default)]
    pub pg_config: Option<PgConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldOption {
    pub label: String,
    pub value: String,
}

/// Extra validator constraints layered on the kind's base shape.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZodConfig {
    #[serde(default)]
    pub min_length: Option<usize>,
    #[serde(default)]
    pub max_length: Option<usize>,
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
    #[serde(default)]
    pub int: bool,
    #[serde(default)]
    pub positive: bool,
    #[serde(default)]
    pub regex: Option<String>,
    #[serde(default)]
    pub regex_message: Option<String>,
    #[serde(default)]
    pub email: bool,
    #[serde(default)]
    pub url: bool,
    /// Attached in code; configuration files cannot carry predicates.
    #[serde(skip)]
    pub custom: Option<Refinement>,
}

/// Custom predicate applied after every other constraint.
#[derive(Clone)]
pub struct Refinement {
    pub message: String,
    check: Arc<dyn Fn(&Value) -> bool + Send + Sync>,
}

impl Refinement {
    pub fn new<F>(message: impl Into<String>, check: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        Self {
            message: message.into(),
            check: Arc::new(check),
        }
    }

    pub fn check(&self, value: &Value) -> bool {
        (self.check)(value)
    }
}

impl fmt::Debug for Refinement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Refinement")
            .field("message", &self.message)
            .finish_non_exhaustive()
    }
}

/// SQL column metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PgConfig {
    #[serde(rename = "type", default)]
    pub pg_type: Option<PgType>,
    #[serde(default)]
    pub length: Option<u32>,
    #[serde(default)]
    pub precision: Option<u32>,
    #[serde(default)]
    pub scale: Option<u32>,
    #[serde(default = "default_nullable")]
    pub nullable: bool,
    #[serde(default)]
    pub unique: bool,
    #[serde(default)]
    pub index: bool,
    #[serde(default)]
    pub default_value: Option<Value>,
}

fn default_nullable() -> bool {
    true
}

impl Default for PgConfig {
    fn default() -> Self {
        Self {
            pg_type: None,
            length: None,
            precision: None,
            scale: None,
            nullable: true,
            unique: false,
            index: false,
            default_value: None,
        }
    }
}

/// Configuration errors found by [`FormConfiguration::validate`] and the registry.
#[derive(Debug)]
pub enum SchemaError {
    InvalidIdentifier {
        what: &'static str,
        name: String,
        problem: IdentifierProblem,
    },
    DuplicateField { table: String, field: String },
    ReservedField { table: String, field: String },
    DuplicateTable(String),
    InvalidLayout { section: String, columns: u8 },
    Parse(String),
    Io(std::io::Error),
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaError::InvalidIdentifier { what, name, problem } => {
                write!(f, "Invalid {} name '{}': {}", what, name, problem)
            }
            SchemaError::DuplicateField { table, field } => {
                write!(f, "Duplicate field '{}' in form '{}'", field, table)
            }
            SchemaError::ReservedField { table, field } => write!(
                f,
                "Field '{}' in form '{}' collides with a database-managed column",
                field, table
            ),
            SchemaError::DuplicateTable(table) => {
                write!(f, "Duplicate table name '{}' across form configurations", table)
            }
            SchemaError::InvalidLayout { section, columns } => write!(
                f,
                "Section '{}' has {} columns; expected 1 to 4",
                section, columns
            ),
            SchemaError::Parse(msg) => write!(f, "Failed to parse form configuration: {}", msg),
            SchemaError::Io(e) => write!(f, "Failed to read form configuration: {}", e),
        }
    }
}

impl std::error::Error for SchemaError {}

impl From<std::io::Error> for SchemaError {
    fn from(err: std::io::Error) -> Self {
        SchemaError::Io(err)
    }
}

impl FormConfiguration {
    /// All fields in display order.
    pub fn fields(&self) -> impl Iterator<Item = &FieldDefinition> {
        self.sections.iter().flat_map(|s| s.fields.iter())
    }

    pub fn field(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields().find(|f| f.name == name)
    }

    pub fn table_name(&self) -> &str {
        &self.postgres_table_name
    }

    /// Columns callers may sort and filter on: managed columns plus fields.
    pub fn is_known_column(&self, name: &str) -> bool {
        MANAGED_COLUMNS.contains(&name) || self.field(name).is_some()
    }

    /// Explicit structural check: identifiers, unique and non-reserved field
    /// names, section layout. The compilers never call this themselves.
    pub fn validate(&self) -> Result<(), SchemaError> {
        let table = &self.postgres_table_name;
        check_identifier(table).map_err(|problem| SchemaError::InvalidIdentifier {
            what: "table",
            name: table.clone(),
            problem,
        })?;
        let trigger = trigger_name(table);
        check_identifier(&trigger).map_err(|problem| SchemaError::InvalidIdentifier {
            what: "trigger",
            name: trigger.clone(),
            problem,
        })?;

        for section in &self.sections {
            if !(1..=4).contains(&section.columns) {
                return Err(SchemaError::InvalidLayout {
                    section: section.title.clone(),
                    columns: section.columns,
                });
            }
        }

        let mut seen = HashSet::new();
        for field in self.fields() {
            check_identifier(&field.name).map_err(|problem| SchemaError::InvalidIdentifier {
                what: "field",
                name: field.name.clone(),
                problem,
            })?;
            if MANAGED_COLUMNS.contains(&field.name.as_str()) {
                return Err(SchemaError::ReservedField {
                    table: table.clone(),
                    field: field.name.clone(),
                });
            }
            if !seen.insert(field.name.as_str()) {
                return Err(SchemaError::DuplicateField {
                    table: table.clone(),
                    field: field.name.clone(),
                });
            }
            // PostgreSQL would truncate a longer name and two indexes could
            // end up sharing it.
            if field.is_indexed() {
                let index = index_name(table, &field.name);
                check_identifier(&index).map_err(|problem| SchemaError::InvalidIdentifier {
                    what: "index",
                    name: index.clone(),
                    problem,
                })?;
            }
        }
        Ok(())
    }

    /// Fields whose declared SQL type disagrees with what their kind produces.
    ///
    /// Text and JSON columns can hold any shape and are never reported.
    pub fn lint(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        for field in self.fields() {
            let Some(declared) = field.pg_config.as_ref().and_then(|pg| pg.pg_type.as_ref()) else {
                continue;
            };
            let declared_category = declared.category();
            if matches!(
                declared_category,
                TypeCategory::Text | TypeCategory::Json | TypeCategory::Other
            ) {
                continue;
            }
            let inferred = field.kind.inferred_column();
            let compatible = declared_category == inferred.category()
                || (field.kind.shape() == ValueShape::File && declared_category == TypeCategory::Binary);
            if !compatible {
                warnings.push(format!(
                    "{}.{}: kind '{}' produces {} values but the column is declared {}",
                    self.postgres_table_name,
                    field.name,
                    field.kind,
                    inferred.sql(),
                    declared
                ));
            }
        }
        warnings
    }

    /// Built-in example: a maintenance checklist.
    pub fn example() -> Self {
        let field = |name: &str, label: &str, kind: FieldKind, required: bool| FieldDefinition {
            name: name.to_string(),
            label: label.to_string(),
            kind,
            required,
            default_value: None,
            placeholder: None,
            description: None,
            options: Vec::new(),
            min: None,
            max: None,
            step: None,
            accept: None,
            multiple: false,
            rows: None,
            zod_config: None,
            pg_config: None,
        };

        let mut technician = field("technician_email", "Technician email", FieldKind::Email, true);
        technician.pg_config = Some(PgConfig {
            index: true,
            ..PgConfig::default()
        });

        let mut condition = field("condition", "Condition", FieldKind::Select, true);
        condition.options = ["good", "fair", "poor"]
            .iter()
            .map(|v| FieldOption {
                label: v.to_string(),
                value: v.to_string(),
            })
            .collect();

        let mut hours = field("operating_hours", "Operating hours", FieldKind::Number, false);
        hours.min = Some(0.0);
        hours.pg_config = Some(PgConfig {
            pg_type: Some(PgType::Numeric),
            precision: Some(10),
            scale: Some(2),
            ..PgConfig::default()
        });

        let mut passed = field("passed", "Inspection passed", FieldKind::Checkbox, false);
        passed.default_value = Some(Value::Bool(false));
        passed.pg_config = Some(PgConfig {
            default_value: Some(Value::Bool(false)),
            ..PgConfig::default()
        });

        let mut notes = field("notes", "Notes", FieldKind::Textarea, false);
        notes.zod_config = Some(ZodConfig {
            max_length: Some(2000),
            ..ZodConfig::default()
        });

        Self {
            title: "Maintenance checklist".to_string(),
            description: Some("Routine equipment inspection".to_string()),
            postgres_table_name: "maintenance_checks".to_string(),
            submit_button_text: default_submit_text(),
            reset_button_text: default_reset_text(),
            sections: vec![
                Section {
                    title: "Inspection".to_string(),
                    description: None,
                    columns: 2,
                    spacing: Spacing::Medium,
                    fields: vec![
                        technician,
                        field("equipment_id", "Equipment ID", FieldKind::Text, true),
                        field("inspection_date", "Inspection date", FieldKind::Date, true),
                        condition,
                        hours,
                    ],
                },
                Section {
                    title: "Outcome".to_string(),
                    description: None,
                    columns: 1,
                    spacing: Spacing::Large,
                    fields: vec![
                        passed,
                        notes,
                        field("photos", "Photos", FieldKind::File, false),
                        field("signature", "Signature", FieldKind::Signature, false),
                    ],
                },
            ],
        }
    }
}

impl FieldDefinition {
    /// Resolved column type: the declared pgConfig type wins over the kind's
    /// inferred type; pgConfig modifiers apply to either.
    pub fn column_type(&self) -> ColumnType {
        let pg = self.pg_config.as_ref();
        let mut column = match pg.and_then(|p| p.pg_type.clone()) {
            Some(pg_type) => ColumnType::of(pg_type),
            None => self.kind.inferred_column(),
        };
        if let Some(pg) = pg {
            column.length = pg.length.or(column.length);
            column.precision = pg.precision.or(column.precision);
            column.scale = pg.scale.or(column.scale);
        }
        column
    }

    /// `NOT NULL` unless the field is optional and its column allows null.
    pub fn is_nullable(&self) -> bool {
        !self.required && self.pg_config.as_ref().map_or(true, |pg| pg.nullable)
    }

    pub fn is_unique(&self) -> bool {
        self.pg_config.as_ref().is_some_and(|pg| pg.unique)
    }

    pub fn is_indexed(&self) -> bool {
        self.pg_config.as_ref().is_some_and(|pg| pg.index)
    }

    pub fn option_values(&self) -> Vec<&str> {
        self.options.iter().map(|o| o.value.as_str()).collect()
    }
}
