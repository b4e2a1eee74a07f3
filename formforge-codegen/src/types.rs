//! TypeScript type module generation.

use crate::names::FormNames;
use crate::ts::{Item, Module, PropSig, TsType};
use formforge::schema::{CREATED_AT_COLUMN, ID_COLUMN, UPDATED_AT_COLUMN};
use formforge::validation::{ArrayItem, Schema};
use formforge::{FormConfiguration, FormValidator};

pub const ACTION_RESULT: &str = "ActionResult";
pub const INSERTED_RECORD: &str = "InsertedRecord";
pub const PAGE: &str = "Page";
pub const LIST_OPTIONS: &str = "ListOptions";

/// The TypeScript type a validated value has.
pub fn value_type(schema: &Schema) -> TsType {
    match schema {
        Schema::Optional(inner) => value_type(inner).nullable(),
        Schema::Refined(inner, _) => value_type(inner),
        Schema::Number(_) => TsType::named("number"),
        Schema::Boolean => TsType::named("boolean"),
        Schema::Array(ArrayItem::Text) => TsType::Array(Box::new(TsType::string())),
        Schema::Array(ArrayItem::Integer) => TsType::Array(Box::new(TsType::named("number"))),
        Schema::Enum(options) => TsType::Union(options.iter().cloned().map(TsType::StringLiteral).collect()),
        Schema::String(_) | Schema::File(_) | Schema::JsonText | Schema::Uuid | Schema::Timestamp => {
            TsType::string()
        }
    }
}

/// Build the `<table>.types.ts` module.
pub fn types_module(config: &FormConfiguration, names: &FormNames, header: &[String]) -> Module {
    let form = FormValidator::form_facing(config);
    let complete = FormValidator::complete(config);

    // Payload keys of optional fields may be left out.
    let input_members = form
        .fields()
        .iter()
        .map(|f| PropSig {
            name: f.name.clone(),
            optional: f.schema.is_optional(),
            ty: value_type(&f.schema),
        })
        .collect();
    // Stored rows always carry every column.
    let record_members = complete
        .fields()
        .iter()
        .map(|f| PropSig::new(f.name.clone(), value_type(&f.schema)))
        .collect();
    let columns = TsType::Union(
        complete
            .fields()
            .iter()
            .map(|f| TsType::StringLiteral(f.name.clone()))
            .collect(),
    );
    let column_type = format!("{}Column", names.pascal);
    let string = TsType::string;

    let items = vec![
        Item::Interface {
            export: true,
            name: names.input_type(),
            params: Vec::new(),
            members: input_members,
        },
        Item::Interface {
            export: true,
            name: names.record_type(),
            params: Vec::new(),
            members: record_members,
        },
        Item::TypeAlias {
            export: true,
            name: column_type.clone(),
            ty: columns,
        },
        Item::Interface {
            export: true,
            name: INSERTED_RECORD.to_string(),
            params: Vec::new(),
            members: vec![
                PropSig::new(ID_COLUMN, string()),
                PropSig::new(CREATED_AT_COLUMN, string()),
                PropSig::new(UPDATED_AT_COLUMN, string()),
            ],
        },
        Item::Interface {
            export: true,
            name: LIST_OPTIONS.to_string(),
            params: Vec::new(),
            members: vec![
                PropSig::optional("limit", TsType::named("number")),
                PropSig::optional("offset", TsType::named("number")),
                PropSig::optional("sortBy", TsType::named(column_type)),
                PropSig::optional(
                    "sortOrder",
                    TsType::Union(vec![
                        TsType::StringLiteral("asc".to_string()),
                        TsType::StringLiteral("desc".to_string()),
                    ]),
                ),
                PropSig::optional(
                    "filters",
                    TsType::generic("Partial", vec![TsType::named(names.record_type())]),
                ),
            ],
        },
        Item::Interface {
            export: true,
            name: PAGE.to_string(),
            params: vec!["T".to_string()],
            members: vec![
                PropSig::new("rows", TsType::Array(Box::new(TsType::named("T")))),
                PropSig::new("total", TsType::named("number")),
                PropSig::new("limit", TsType::named("number")),
                PropSig::new("offset", TsType::named("number")),
            ],
        },
        Item::Interface {
            export: true,
            name: ACTION_RESULT.to_string(),
            params: vec!["T".to_string()],
            members: vec![
                PropSig::new("success", TsType::named("boolean")),
                PropSig::optional("data", TsType::named("T")),
                PropSig::optional("error", string()),
                PropSig::optional("message", string()),
            ],
        },
    ];

    Module {
        header: header.to_vec(),
        directive: None,
        imports: Vec::new(),
        items,
    }
}
