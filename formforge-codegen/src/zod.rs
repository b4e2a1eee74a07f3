//! Zod schema module generation.
//!
//! The schemas are read off the same [`Schema`] tree the server-side
//! validator runs, so both sides share formats, bounds and messages. Three
//! objects are emitted: the client schema (uploads are browser `File`s), the
//! server schema (uploads are stored references or base64) and the complete
//! record schema.

use crate::names::FormNames;
use crate::ts::{ArrowBody, Expr, Function, Import, Item, Module, Param, Prop, Stmt, TsType};
use formforge::schema::{FieldDefinition, StringFormat};
use formforge::validation::formats;
use formforge::validation::{ArrayItem, FieldValidator, FileEncoding, NumberSchema, Schema, StringSchema};
use formforge::{FormConfiguration, FormValidator};

pub const ZOD_MODULE: &str = "zod";
const REFINEMENTS: &str = "customRefinements";
const IS_JSON: &str = "isJson";
const TO_BOOLEAN: &str = "toBoolean";
const BOOLEAN_STRINGS: &str = "BOOLEAN_STRINGS";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Client,
    Server,
}

fn z() -> Expr {
    Expr::ident("z")
}

/// Build the `<table>.schema.ts` module.
pub fn schema_module(config: &FormConfiguration, names: &FormNames, header: &[String]) -> Module {
    let form = FormValidator::form_facing(config);
    let complete = FormValidator::complete(config);

    let mut items = Vec::new();
    if uses(&complete, |s| matches!(s, Schema::JsonText)) {
        items.push(Item::Function(is_json_helper()));
    }
    if uses(&complete, |s| matches!(s, Schema::Boolean)) {
        items.extend(boolean_helpers());
    }
    let refined: Vec<(&str, &str)> = form
        .fields()
        .iter()
        .filter_map(|f| refinement_message(&f.schema).map(|m| (f.name.as_str(), m)))
        .collect();
    if !refined.is_empty() {
        items.push(refinements_stub(&refined));
    }

    let objects = [
        (names.client_schema(), &form, Target::Client),
        (names.server_schema(), &form, Target::Server),
        (names.complete_schema(), &complete, Target::Server),
    ];
    for (name, validator, target) in objects {
        items.push(Item::Const {
            export: true,
            name,
            ty: None,
            value: object_schema(config, validator, target),
        });
    }
    items.push(Item::TypeAlias {
        export: true,
        name: names.form_values_type(),
        ty: TsType::generic("z.infer", vec![TsType::Typeof(names.client_schema())]),
    });

    Module {
        header: header.to_vec(),
        directive: None,
        imports: vec![Import::named(["z"], ZOD_MODULE)],
        items,
    }
}

fn uses(validator: &FormValidator, pred: impl Fn(&Schema) -> bool) -> bool {
    validator.fields().iter().any(|f| pred(f.schema.base()))
}

fn refinement_message(schema: &Schema) -> Option<&str> {
    match schema {
        Schema::Optional(inner) => refinement_message(inner),
        Schema::Refined(_, refinement) => Some(&refinement.message),
        _ => None,
    }
}

/// `z.object({ ... })` for one validator.
pub fn object_schema(config: &FormConfiguration, validator: &FormValidator, target: Target) -> Expr {
    let props = validator
        .fields()
        .iter()
        .map(|field| {
            let definition = config.field(&field.name);
            Prop::KeyValue(field.name.clone(), field_schema(field, definition, target))
        })
        .collect();
    z().method("object", vec![Expr::Object(props)])
}

/// The Zod expression for one field.
pub fn field_schema(field: &FieldValidator, definition: Option<&FieldDefinition>, target: Target) -> Expr {
    let required = format!("{} is required", field.label);
    let multiple = definition.is_some_and(|d| d.multiple);
    schema_expr(&field.schema, &field.name, &required, multiple, target, true)
}

fn schema_expr(
    schema: &Schema,
    name: &str,
    required: &str,
    multiple: bool,
    target: Target,
    is_required: bool,
) -> Expr {
    match schema {
        Schema::Optional(inner) => {
            let inner = schema_expr(inner, name, required, multiple, target, false);
            let inner = if target == Target::Client && accepts_blank(schema.base()) {
                // Browsers submit "" for untouched optional inputs.
                inner.method("or", vec![z().method("literal", vec![Expr::str("")])])
            } else {
                inner
            };
            inner.method("nullish", vec![])
        }
        Schema::Refined(inner, refinement) => schema_expr(inner, name, required, multiple, target, is_required)
            .method(
                "refine",
                vec![
                    Expr::ident(REFINEMENTS).member(name),
                    Expr::message(refinement.message.clone()),
                ],
            ),
        Schema::String(s) => string_expr(s, required, is_required),
        Schema::Number(n) => number_expr(n, required),
        Schema::Boolean => z().method(
            "preprocess",
            vec![
                Expr::ident(TO_BOOLEAN),
                z().method("boolean", vec![required_error(required)]),
            ],
        ),
        Schema::Enum(options) => z().method(
            "enum",
            vec![
                Expr::Array(options.iter().map(|o| Expr::str(o.clone())).collect()),
                Expr::object([(
                    "errorMap",
                    Expr::arrow(
                        Vec::new(),
                        Expr::message(format!("Invalid option. Expected one of: {}", options.join(", "))),
                    ),
                )]),
            ],
        ),
        Schema::File(_) if target == Target::Client => {
            let file = z().method(
                "instanceof",
                vec![Expr::ident("File"), Expr::message("Expected file")],
            );
            if multiple {
                let files = z().method("array", vec![file]);
                if is_required {
                    files.method("min", vec![Expr::Num(1.0), Expr::message(required)])
                } else {
                    files
                }
            } else {
                file
            }
        }
        Schema::File(FileEncoding::Base64) => required_string(required, is_required)
            .method("base64", vec![Expr::message("Must be base64-encoded")]),
        Schema::File(FileEncoding::Reference) => required_string(required, is_required),
        Schema::Array(item) => {
            let element = match item {
                ArrayItem::Text => z().method("string", vec![]),
                ArrayItem::Integer => z()
                    .member("coerce")
                    .method("number", vec![])
                    .method("int", vec![Expr::message("Must be an integer")]),
            };
            z().method("array", vec![element, required_error(required)])
        }
        Schema::JsonText => required_string(required, is_required)
            .method("refine", vec![Expr::ident(IS_JSON), Expr::message("Must be valid JSON")]),
        Schema::Uuid => z()
            .method("string", vec![required_error(required)])
            .method("uuid", vec![Expr::message("Invalid uuid")]),
        Schema::Timestamp => z().method("string", vec![required_error(required)]).method(
            "datetime",
            vec![Expr::object([
                ("offset", Expr::Bool(true)),
                ("message", Expr::str("Invalid datetime")),
            ])],
        ),
    }
}

fn accepts_blank(schema: &Schema) -> bool {
    matches!(schema, Schema::String(_) | Schema::Enum(_) | Schema::Number(_))
}

fn required_error(message: &str) -> Expr {
    Expr::object([("required_error", Expr::str(message))])
}

/// Required strings reject `""` with the required message.
fn required_string(message: &str, is_required: bool) -> Expr {
    let s = z().method("string", vec![required_error(message)]);
    if is_required {
        s.method("min", vec![Expr::Num(1.0), Expr::message(message)])
    } else {
        s
    }
}

fn string_expr(schema: &StringSchema, required: &str, is_required: bool) -> Expr {
    let mut expr = required_string(required, is_required);
    if let Some(format) = schema.format {
        expr = format_check(expr, format);
    }
    if let Some(min) = schema.min_length {
        expr = expr.method(
            "min",
            vec![
                Expr::Num(min as f64),
                Expr::message(format!("Must be at least {min} characters")),
            ],
        );
    }
    if let Some(max) = schema.max_length {
        expr = expr.method(
            "max",
            vec![
                Expr::Num(max as f64),
                Expr::message(format!("Must be at most {max} characters")),
            ],
        );
    }
    if let Some(pattern) = &schema.pattern {
        expr = expr.method(
            "regex",
            vec![
                Expr::Regex(pattern.regex.as_str().to_string()),
                Expr::message(pattern.message.clone()),
            ],
        );
    }
    expr
}

fn format_check(expr: Expr, format: StringFormat) -> Expr {
    match formats::pattern(format) {
        Some(re) => expr.method(
            "regex",
            vec![
                Expr::Regex(re.as_str().to_string()),
                Expr::message(formats::message(format)),
            ],
        ),
        None => expr,
    }
}

fn number_expr(schema: &NumberSchema, required: &str) -> Expr {
    let mut expr = z().member("coerce").method(
        "number",
        vec![Expr::object([
            ("required_error", Expr::str(required)),
            ("invalid_type_error", Expr::str("Expected number")),
        ])],
    );
    if schema.integer {
        expr = expr.method("int", vec![Expr::message("Must be an integer")]);
    }
    if schema.positive {
        expr = expr.method("positive", vec![Expr::message("Must be positive")]);
    }
    if let Some(min) = schema.min {
        expr = expr.method(
            "min",
            vec![
                Expr::Num(min),
                Expr::message(format!("Must be at least {}", formforge::json_helpers::display_number(min))),
            ],
        );
    }
    if let Some(max) = schema.max {
        expr = expr.method(
            "max",
            vec![
                Expr::Num(max),
                Expr::message(format!("Must be at most {}", formforge::json_helpers::display_number(max))),
            ],
        );
    }
    expr
}

fn is_json_helper() -> Function {
    Function {
        name: IS_JSON.to_string(),
        params: vec![Param::new("value", TsType::string())],
        returns: Some(TsType::named("boolean")),
        body: vec![Stmt::TryCatch {
            body: vec![
                Stmt::Expr(Expr::ident("JSON").method("parse", vec![Expr::ident("value")])),
                Stmt::ret(Expr::Bool(true)),
            ],
            binding: None,
            handler: vec![Stmt::ret(Expr::Bool(false))],
        }],
        ..Function::default()
    }
}

/// Checkbox values arrive as `"on"`, `"true"`, `"1"` and so on.
fn boolean_helpers() -> Vec<Item> {
    let table = Expr::object([
        ("true", Expr::Bool(true)),
        ("on", Expr::Bool(true)),
        ("1", Expr::Bool(true)),
        ("false", Expr::Bool(false)),
        ("off", Expr::Bool(false)),
        ("0", Expr::Bool(false)),
    ]);
    let type_of = |ty: &str| {
        Expr::Unary("typeof", Box::new(Expr::ident("value"))).binary("===", Expr::str(ty))
    };
    let key = Expr::ident("String")
        .call(vec![Expr::ident("value")])
        .method("trim", vec![])
        .method("toLowerCase", vec![]);
    let lookup = Expr::ident(BOOLEAN_STRINGS).index(key).binary("??", Expr::ident("value"));

    vec![
        Item::Const {
            export: false,
            name: BOOLEAN_STRINGS.to_string(),
            ty: Some(TsType::generic(
                "Record",
                vec![TsType::string(), TsType::named("boolean")],
            )),
            value: table,
        },
        Item::Function(Function {
            name: TO_BOOLEAN.to_string(),
            params: vec![Param::new("value", TsType::named("unknown"))],
            returns: Some(TsType::named("unknown")),
            body: vec![
                Stmt::if_then(
                    type_of("string").binary("||", type_of("number")),
                    vec![Stmt::ret(lookup)],
                ),
                Stmt::ret(Expr::ident("value")),
            ],
            ..Function::default()
        }),
    ]
}

/// Refinements are attached in Rust code and cannot be translated; the
/// generated module exports permissive predicates to fill in by hand.
fn refinements_stub(fields: &[(&str, &str)]) -> Item {
    let props = fields
        .iter()
        .map(|(name, _)| {
            Prop::KeyValue(
                (*name).to_string(),
                Expr::Arrow {
                    params: vec![Param::new("_value", TsType::named("unknown"))],
                    body: ArrowBody::Expr(Box::new(Expr::Bool(true))),
                },
            )
        })
        .collect();
    Item::Const {
        export: true,
        name: REFINEMENTS.to_string(),
        ty: None,
        value: Expr::Object(props),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ts::render_expr;
    use formforge::schema::{PgType, Refinement};

    fn example_field(name: &str) -> (FormConfiguration, FieldValidator) {
        let config = FormConfiguration::example();
        let validator = FormValidator::form_facing(&config);
        let field = validator.field(name).cloned().unwrap();
        (config, field)
    }

    fn render_field(name: &str, target: Target) -> String {
        let (config, field) = example_field(name);
        render_expr(&field_schema(&field, config.field(name), target), 0)
    }

    #[test]
    fn test_required_email_uses_shared_pattern() {
        let rendered = render_field("technician_email", Target::Server);
        assert!(rendered.starts_with("z.string({ required_error: \"Technician email is required\" })"));
        assert!(rendered.contains(".min(1, { message: \"Technician email is required\" })"));
        assert!(rendered.contains(r#".regex(/^[^\s@]+@[^\s@]+\.[^\s@]+$/, { message: "Invalid email address" })"#));
        assert!(!rendered.contains("nullish"));
    }

    #[test]
    fn test_optional_number_bounds() {
        let rendered = render_field("operating_hours", Target::Server);
        assert!(rendered.starts_with("z.coerce.number("));
        assert!(rendered.contains(".min(0, { message: \"Must be at least 0\" })"));
        assert!(rendered.ends_with(".nullish()"));
    }

    #[test]
    fn test_client_and_server_file_shapes_differ() {
        let client = render_field("photos", Target::Client);
        let server = render_field("photos", Target::Server);
        assert!(client.contains("z.instanceof(File"));
        assert!(!server.contains("File"));
        assert!(server.starts_with("z.string("));
    }

    #[test]
    fn test_client_optional_text_accepts_blank() {
        let client = render_field("notes", Target::Client);
        assert!(client.ends_with(r#".or(z.literal("")).nullish()"#));
        let server = render_field("notes", Target::Server);
        assert!(!server.contains("literal"));
        assert!(server.contains(".max(2000, { message: \"Must be at most 2000 characters\" })"));
    }

    #[test]
    fn test_array_columns_render_as_arrays() {
        let mut config = FormConfiguration::example();
        let field = &mut config.sections[0].fields[0];
        field.name = "shift_numbers".to_string();
        field.required = true;
        field.pg_config.get_or_insert_with(Default::default).pg_type = Some(PgType::IntegerArray);
        let validator = FormValidator::form_facing(&config);
        let field = validator.field("shift_numbers").unwrap();
        let rendered = render_expr(&field_schema(field, None, Target::Client), 0);
        assert!(
            rendered.starts_with(r#"z.array(z.coerce.number().int({ message: "Must be an integer" }), {"#),
            "{rendered}"
        );
        assert!(!rendered.contains("nullish"));
    }

    #[test]
    fn test_enum_lists_options() {
        let rendered = render_field("condition", Target::Server);
        assert!(rendered.starts_with(r#"z.enum(["good", "fair", "poor"]"#));
    }

    #[test]
    fn test_refinement_references_stub() {
        let mut config = FormConfiguration::example();
        let field = config.sections[0]
            .fields
            .iter_mut()
            .find(|f| f.name == "equipment_id")
            .unwrap();
        let mut zod = field.zod_config.clone().unwrap_or_default();
        zod.custom = Some(Refinement::new("Must start with P-", |v| {
            v.as_str().is_some_and(|s| s.starts_with("P-"))
        }));
        field.zod_config = Some(zod);

        let module = schema_module(&config, &FormNames::new(&config), &[]).render();
        assert!(module.contains("export const customRefinements = { equipment_id: (_value: unknown) => true };"));
        assert!(module.contains(r#".refine(customRefinements.equipment_id, { message: "Must start with P-" })"#));
    }

    #[test]
    fn test_schema_module_layout() {
        let config = FormConfiguration::example();
        let module = schema_module(&config, &FormNames::new(&config), &[]).render();
        assert!(module.starts_with("import { z } from \"zod\";\n"));
        assert!(module.contains("function toBoolean(value: unknown): unknown {"));
        assert!(!module.contains("function isJson"));
        assert!(!module.contains("customRefinements"));
        let client = module.find("export const maintenanceChecksSchema = z.object(").unwrap();
        let server = module.find("export const maintenanceChecksServerSchema = z.object(").unwrap();
        let complete = module.find("export const maintenanceChecksCompleteSchema = z.object(").unwrap();
        assert!(client < server && server < complete);
        assert!(module.contains("id: z.string({ required_error: \"ID is required\" }).uuid("));
        assert!(module.contains(
            "export type MaintenanceChecksFormValues = z.infer<typeof maintenanceChecksSchema>;"
        ));
    }
}
