//! Validator compiler.
//!
//! [`FormValidator`] is compiled from a [`FormConfiguration`] and checks a
//! submitted JSON object field by field, collecting every failure rather than
//! stopping at the first one.

pub mod formats;
pub mod schema;

pub use schema::{ArrayItem, FileEncoding, NumberSchema, Pattern, Schema, StringSchema};

use crate::schema::{
    ColumnType, FieldDefinition, FormConfiguration, PgType, StringFormat, ValueShape, ZodConfig,
    CREATED_AT_COLUMN, ID_COLUMN, UPDATED_AT_COLUMN,
};
use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// One failing field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    pub path: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationErrors {
    pub issues: Vec<ValidationIssue>,
}

impl ValidationErrors {
    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    /// Messages grouped by field name.
    pub fn field_errors(&self) -> BTreeMap<String, Vec<String>> {
        let mut grouped: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for issue in &self.issues {
            grouped
                .entry(issue.path.clone())
                .or_default()
                .push(issue.message.clone());
        }
        grouped
    }

    fn push(&mut self, path: &str, message: String) {
        self.issues.push(ValidationIssue {
            path: path.to_string(),
            message,
        });
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .issues
            .iter()
            .map(|i| format!("{}: {}", i.path, i.message))
            .collect();
        f.write_str(&parts.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

/// Compiled validator for one field.
#[derive(Debug, Clone)]
pub struct FieldValidator {
    pub name: String,
    pub label: String,
    pub schema: Schema,
}

impl FieldValidator {
    /// Check one entry of the payload. `Ok(None)` means the key is omitted
    /// from the cleaned object.
    ///
    /// Absent means a missing key or `null`. Required fields also treat the
    /// empty string as absent.
    pub fn validate(&self, value: Option<&Value>) -> Result<Option<Value>, String> {
        let required = !self.schema.is_optional();
        match value {
            None if required => Err(self.required_message()),
            None => Ok(None),
            Some(Value::Null) if required => Err(self.required_message()),
            Some(Value::Null) => Ok(Some(Value::Null)),
            Some(Value::String(s)) if required && s.is_empty() => Err(self.required_message()),
            Some(v) => self.schema.check(v).map(Some),
        }
    }

    fn required_message(&self) -> String {
        format!("{} is required", self.label)
    }
}

/// Compile a single field definition.
///
/// Never fails: missing options fall back to a plain string and an invalid
/// regex is dropped with a warning.
pub fn compile_field(field: &FieldDefinition) -> FieldValidator {
    let column = field.column_type();
    let zod = field.zod_config.clone().unwrap_or_default();

    let mut schema = match column.pg_type {
        PgType::Json | PgType::Jsonb => Schema::JsonText,
        PgType::TextArray => Schema::Array(ArrayItem::Text),
        PgType::IntegerArray => Schema::Array(ArrayItem::Integer),
        _ => base_schema(field, &column, &zod),
    };
    if let Some(refinement) = zod.custom.clone() {
        schema = Schema::Refined(Box::new(schema), refinement);
    }
    if !field.required {
        schema = Schema::Optional(Box::new(schema));
    }

    FieldValidator {
        name: field.name.clone(),
        label: field.label.clone(),
        schema,
    }
}

fn base_schema(field: &FieldDefinition, column: &ColumnType, zod: &ZodConfig) -> Schema {
    let binary_column = column.pg_type == PgType::Bytea;
    match field.kind.shape() {
        ValueShape::Text(format) => Schema::String(string_schema(field, format, zod)),
        ValueShape::Number { integer } => Schema::Number(NumberSchema {
            integer: integer || zod.int || column.pg_type.is_integer(),
            positive: zod.positive,
            min: field.min.or(zod.min),
            max: field.max.or(zod.max),
        }),
        ValueShape::Boolean => Schema::Boolean,
        ValueShape::File if binary_column => Schema::File(FileEncoding::Base64),
        ValueShape::File => Schema::File(FileEncoding::Reference),
        ValueShape::Choice if !field.options.is_empty() => {
            Schema::Enum(field.options.iter().map(|o| o.value.clone()).collect())
        }
        ValueShape::Choice => Schema::String(string_schema(field, StringFormat::Plain, zod)),
    }
}

fn string_schema(field: &FieldDefinition, format: StringFormat, zod: &ZodConfig) -> StringSchema {
    let format = if zod.email {
        StringFormat::Email
    } else if zod.url {
        StringFormat::Url
    } else {
        format
    };

    let pattern = zod.regex.as_deref().and_then(|source| match Regex::new(source) {
        Ok(regex) => Some(Pattern {
            regex,
            message: zod
                .regex_message
                .clone()
                .unwrap_or_else(|| "Invalid format".to_string()),
        }),
        Err(e) => {
            log::warn!("Ignoring invalid regex for field '{}': {}", field.name, e);
            None
        }
    });

    StringSchema {
        format: (format != StringFormat::Plain).then_some(format),
        min_length: zod.min_length,
        max_length: zod.max_length,
        pattern,
    }
}

/// Object validator over a form's fields.
#[derive(Debug, Clone)]
pub struct FormValidator {
    fields: Vec<FieldValidator>,
}

impl FormValidator {
    /// Validator for submitted payloads; database-managed columns excluded.
    pub fn form_facing(config: &FormConfiguration) -> Self {
        Self {
            fields: config.fields().map(compile_field).collect(),
        }
    }

    /// Validator for stored records: `id`, `created_at`, `updated_at` first,
    /// then every field.
    pub fn complete(config: &FormConfiguration) -> Self {
        let managed = [
            (ID_COLUMN, "ID", Schema::Uuid),
            (CREATED_AT_COLUMN, "Created at", Schema::Timestamp),
            (UPDATED_AT_COLUMN, "Updated at", Schema::Timestamp),
        ];
        let mut fields: Vec<FieldValidator> = managed
            .into_iter()
            .map(|(name, label, schema)| FieldValidator {
                name: name.to_string(),
                label: label.to_string(),
                schema,
            })
            .collect();
        fields.extend(config.fields().map(compile_field));
        Self { fields }
    }

    pub fn fields(&self) -> &[FieldValidator] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldValidator> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Validate a full payload. Unknown keys are dropped from the result.
    pub fn validate(&self, data: &Map<String, Value>) -> Result<Map<String, Value>, ValidationErrors> {
        self.run(data, false)
    }

    /// Validate only the keys present in `data`, for partial updates.
    pub fn validate_partial(&self, data: &Map<String, Value>) -> Result<Map<String, Value>, ValidationErrors> {
        self.run(data, true)
    }

    fn run(&self, data: &Map<String, Value>, partial: bool) -> Result<Map<String, Value>, ValidationErrors> {
        let mut cleaned = Map::new();
        let mut errors = ValidationErrors::default();
        for field in &self.fields {
            let value = data.get(&field.name);
            if partial && value.is_none() {
                continue;
            }
            match field.validate(value) {
                Ok(Some(v)) => {
                    cleaned.insert(field.name.clone(), v);
                }
                Ok(None) => {}
                Err(message) => errors.push(&field.name, message),
            }
        }
        if errors.is_empty() {
            Ok(cleaned)
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldKind, PgConfig, Refinement};
    use serde_json::json;

    fn form(fields: Value) -> FormConfiguration {
        serde_json::from_value(json!({
            "title": "Test",
            "postgresTableName": "test_forms",
            "sections": [{"title": "Main", "fields": fields}]
        }))
        .unwrap()
    }

    fn payload(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_per_kind_examples() {
        let config = form(json!([
            {"name": "email", "label": "Email", "type": "email", "required": true},
            {"name": "color", "label": "Color", "type": "color", "required": true},
            {"name": "week", "label": "Week", "type": "week", "required": true}
        ]));
        let validator = FormValidator::form_facing(&config);

        let ok = validator.validate(&payload(json!({
            "email": "a@b.com", "color": "#1A2B3C", "week": "2024-W05"
        })));
        assert!(ok.is_ok(), "{ok:?}");

        let err = validator
            .validate(&payload(json!({"email": "not-an-email", "color": "red", "week": "2024-5"})))
            .unwrap_err();
        let by_field = err.field_errors();
        assert_eq!(by_field["email"], vec!["Invalid email address"]);
        assert_eq!(by_field["color"], vec!["Invalid color (expected #RRGGBB)"]);
        assert_eq!(by_field["week"], vec!["Invalid week (expected YYYY-Www)"]);

        let err = validator
            .validate(&payload(json!({"email": "a@b.com", "color": "#12", "week": "2024-W05"})))
            .unwrap_err();
        assert_eq!(err.issues.len(), 1);
        assert_eq!(err.to_string(), "color: Invalid color (expected #RRGGBB)");
    }

    #[test]
    fn test_optional_semantics() {
        let config = form(json!([
            {"name": "website", "label": "Website", "type": "url"}
        ]));
        let validator = FormValidator::form_facing(&config);

        assert!(validator.validate(&Map::new()).unwrap().is_empty());
        let cleaned = validator.validate(&payload(json!({"website": null}))).unwrap();
        assert_eq!(cleaned["website"], Value::Null);
        assert!(validator.validate(&payload(json!({"website": "https://x.io"}))).is_ok());
        let err = validator.validate(&payload(json!({"website": "x.io"}))).unwrap_err();
        assert_eq!(err.issues[0].message, "Invalid url");
    }

    #[test]
    fn test_required_rejects_missing_and_empty() {
        let config = form(json!([
            {"name": "full_name", "label": "Full name", "type": "text", "required": true},
            {"name": "age", "label": "Age", "type": "number", "required": true}
        ]));
        let validator = FormValidator::form_facing(&config);
        let err = validator.validate(&payload(json!({"full_name": ""}))).unwrap_err();
        assert_eq!(
            err.issues,
            vec![
                ValidationIssue { path: "full_name".into(), message: "Full name is required".into() },
                ValidationIssue { path: "age".into(), message: "Age is required".into() },
            ]
        );
    }

    #[test]
    fn test_numbers_are_coerced_and_unknown_keys_dropped() {
        let config = form(json!([
            {"name": "qty", "label": "Quantity", "type": "number", "required": true,
             "min": 1, "zodConfig": {"min": 5, "int": true}},
            {"name": "agree", "label": "Agree", "type": "checkbox", "required": true}
        ]));
        let validator = FormValidator::form_facing(&config);
        let cleaned = validator
            .validate(&payload(json!({"qty": "3", "agree": "on", "extra": 1})))
            .unwrap();
        assert_eq!(cleaned, payload(json!({"qty": 3, "agree": true})));

        let err = validator
            .validate(&payload(json!({"qty": "0", "agree": "off"})))
            .unwrap_err();
        assert_eq!(err.issues[0].message, "Must be at least 1");
    }

    #[test]
    fn test_select_without_options_is_plain_string() {
        let config = form(json!([
            {"name": "size", "label": "Size", "type": "select", "required": true,
             "options": [{"label": "Small", "value": "s"}, {"label": "Large", "value": "l"}]},
            {"name": "free", "label": "Free", "type": "radio", "required": true}
        ]));
        let validator = FormValidator::form_facing(&config);
        assert!(matches!(validator.field("size").unwrap().schema, Schema::Enum(_)));
        assert!(matches!(validator.field("free").unwrap().schema, Schema::String(_)));
        assert!(validator.validate(&payload(json!({"size": "l", "free": "anything"}))).is_ok());
        assert!(validator.validate(&payload(json!({"size": "m", "free": "x"}))).is_err());
    }

    #[test]
    fn test_invalid_regex_degrades_to_permissive() {
        let config = form(json!([
            {"name": "code", "label": "Code", "type": "text", "required": true,
             "zodConfig": {"regex": "([unclosed"}}
        ]));
        let validator = FormValidator::form_facing(&config);
        assert!(validator.validate(&payload(json!({"code": "anything"}))).is_ok());
    }

    #[test]
    fn test_storage_type_overrides() {
        let config = form(json!([
            {"name": "meta", "label": "Meta", "type": "textarea", "required": true,
             "pgConfig": {"type": "JSONB"}},
            {"name": "scan", "label": "Scan", "type": "file", "pgConfig": {"type": "BYTEA"}},
            {"name": "doc", "label": "Doc", "type": "file"}
        ]));
        let validator = FormValidator::form_facing(&config);
        assert!(matches!(validator.field("meta").unwrap().schema, Schema::JsonText));
        assert!(matches!(
            validator.field("scan").unwrap().schema.base(),
            Schema::File(FileEncoding::Base64)
        ));
        assert!(matches!(
            validator.field("doc").unwrap().schema.base(),
            Schema::File(FileEncoding::Reference)
        ));
        assert!(validator
            .validate(&payload(json!({"meta": "{\"a\":1}", "scan": "aGk=", "doc": "/uploads/a.pdf,/uploads/b.pdf"})))
            .is_ok());
        assert!(validator.validate(&payload(json!({"meta": "nope"}))).is_err());
    }

    #[test]
    fn test_custom_refinement_and_email_flag() {
        let mut config = form(json!([
            {"name": "contact", "label": "Contact", "type": "text", "required": true,
             "zodConfig": {"email": true}}
        ]));
        let field = &mut config.sections[0].fields[0];
        assert_eq!(field.kind, FieldKind::Text);
        field.zod_config.as_mut().unwrap().custom = Some(Refinement::new(
            "Company addresses only",
            |v| v.as_str().is_some_and(|s| s.ends_with("@example.com")),
        ));
        field.pg_config = Some(PgConfig::default());

        let validator = FormValidator::form_facing(&config);
        assert!(validator.validate(&payload(json!({"contact": "me@example.com"}))).is_ok());
        let err = validator.validate(&payload(json!({"contact": "me@other.org"}))).unwrap_err();
        assert_eq!(err.issues[0].message, "Company addresses only");
        let err = validator.validate(&payload(json!({"contact": "me"}))).unwrap_err();
        assert_eq!(err.issues[0].message, "Invalid email address");
    }

    #[test]
    fn test_partial_and_complete_variants() {
        let config = FormConfiguration::example();
        let form_facing = FormValidator::form_facing(&config);
        let updated = form_facing
            .validate_partial(&payload(json!({"notes": "Replaced filter"})))
            .unwrap();
        assert_eq!(updated.len(), 1);

        let complete = FormValidator::complete(&config);
        let names: Vec<&str> = complete.fields().iter().take(3).map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["id", "created_at", "updated_at"]);
        assert_eq!(complete.fields().len(), form_facing.fields().len() + 3);
    }

    #[test]
    fn test_every_kind_accepts_and_rejects() {
        let cases: [(FieldKind, Value, Value, &str); 23] = [
            (FieldKind::Text, json!("hello"), json!(5), "Expected string"),
            (FieldKind::Textarea, json!("line\nline"), json!([]), "Expected string"),
            (FieldKind::Password, json!("s3cret"), json!(false), "Expected string"),
            (FieldKind::Search, json!("pump"), json!({}), "Expected string"),
            (FieldKind::Hidden, json!("token-1"), json!(true), "Expected string"),
            (FieldKind::Email, json!("a@b.com"), json!("not-an-email"), "Invalid email address"),
            (FieldKind::Url, json!("https://x.io/a"), json!("ftp://x.io"), "Invalid url"),
            (FieldKind::Tel, json!("+1 (555) 010-2030"), json!("12ab"), "Invalid phone number"),
            (FieldKind::Number, json!("2.5"), json!("abc"), "Expected number"),
            (FieldKind::Range, json!("7"), json!("7.5"), "Must be an integer"),
            (FieldKind::Date, json!("2024-02-29"), json!("2023-02-30"), "Invalid date (expected YYYY-MM-DD)"),
            (FieldKind::Time, json!("09:30"), json!("25:00"), "Invalid time (expected HH:MM)"),
            (
                FieldKind::DatetimeLocal,
                json!("2024-05-01T08:15"),
                json!("2024-05-01 08:15"),
                "Invalid date and time (expected YYYY-MM-DDTHH:MM)",
            ),
            (FieldKind::Month, json!("2024-05"), json!("2024-13"), "Invalid month (expected YYYY-MM)"),
            (FieldKind::Week, json!("2024-W05"), json!("2024-5"), "Invalid week (expected YYYY-Www)"),
            (FieldKind::Color, json!("#1A2B3C"), json!("red"), "Invalid color (expected #RRGGBB)"),
            (FieldKind::Select, json!("a"), json!("z"), "Invalid option. Expected one of: a, b"),
            (FieldKind::Radio, json!("b"), json!("z"), "Invalid option. Expected one of: a, b"),
            (FieldKind::Checkbox, json!("on"), json!("maybe"), "Expected boolean"),
            (FieldKind::Toggle, json!(false), json!(2), "Expected boolean"),
            (FieldKind::File, json!("/uploads/a.pdf"), json!(3), "Expected string"),
            (FieldKind::Signature, json!("data:image/png;base64,aGk="), json!(3), "Expected string"),
            (FieldKind::Unknown, json!("x"), json!(3), "Expected string"),
        ];
        assert_eq!(cases.len(), FieldKind::ALL.len());

        for (kind, accepted, rejected, message) in cases {
            let config = form(json!([{
                "name": "value", "label": "Value", "type": kind.as_str(), "required": true,
                "options": [{"label": "A", "value": "a"}, {"label": "B", "value": "b"}]
            }]));
            let validator = FormValidator::form_facing(&config);

            let ok = validator.validate(&payload(json!({ "value": accepted })));
            assert!(ok.is_ok(), "{kind:?} should accept {accepted}: {ok:?}");
            let err = validator
                .validate(&payload(json!({ "value": rejected })))
                .expect_err(kind.as_str());
            assert_eq!(err.issues[0].message, message, "{kind:?} rejecting {rejected}");
        }
    }

    #[test]
    fn test_declared_integer_column_rejects_fractions() {
        let config = form(json!([
            {"name": "hours", "label": "Hours", "type": "number", "required": true,
             "pgConfig": {"type": "INTEGER"}},
            {"name": "reading", "label": "Reading", "type": "number", "required": true}
        ]));
        let validator = FormValidator::form_facing(&config);

        let err = validator
            .validate(&payload(json!({"hours": "2.5", "reading": "2.5"})))
            .unwrap_err();
        assert_eq!(err.to_string(), "hours: Must be an integer");
        let cleaned = validator
            .validate(&payload(json!({"hours": "3", "reading": "2.5"})))
            .unwrap();
        assert_eq!(cleaned, payload(json!({"hours": 3, "reading": 2.5})));
    }

    #[test]
    fn test_array_columns_take_lists() {
        let config = form(json!([
            {"name": "tags", "label": "Tags", "type": "text", "required": true,
             "pgConfig": {"type": "TEXT[]"}},
            {"name": "shifts", "label": "Shifts", "type": "text", "pgConfig": {"type": "INTEGER[]"}}
        ]));
        let validator = FormValidator::form_facing(&config);
        assert!(matches!(validator.field("tags").unwrap().schema, Schema::Array(ArrayItem::Text)));

        let cleaned = validator
            .validate(&payload(json!({"tags": ["pump", "valve"], "shifts": "[1, \"2\"]"})))
            .unwrap();
        assert_eq!(cleaned, payload(json!({"tags": ["pump", "valve"], "shifts": [1, 2]})));

        let err = validator.validate(&payload(json!({"tags": "pump"}))).unwrap_err();
        assert_eq!(err.issues[0].message, "Expected a list");
    }
}
