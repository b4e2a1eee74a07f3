//! Field kinds and the kind table.
//!
//! Every decision that depends on a field's kind (validator shape and inferred
//! SQL column type) is read from [`KIND_TABLE`]. The validator compiler and the
//! DDL compiler both go through [`FieldKind::spec`], so the two cannot classify
//! a kind differently.

use crate::schema::pg_type::{ColumnType, PgType};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Closed set of input kinds. Unrecognised tags deserialize to `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FieldKind {
    Text,
    Textarea,
    Password,
    Search,
    Hidden,
    Email,
    Url,
    Tel,
    Number,
    Range,
    Date,
    Time,
    DatetimeLocal,
    Month,
    Week,
    Color,
    Select,
    Radio,
    Checkbox,
    #[serde(alias = "switch")]
    Toggle,
    File,
    Signature,
    #[serde(other)]
    Unknown,
}

/// Format constraint on a string value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringFormat {
    Plain,
    Email,
    Url,
    Phone,
    Date,
    Time,
    DateTimeLocal,
    Month,
    Week,
    HexColor,
}

/// Base validator shape selected by a kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueShape {
    Text(StringFormat),
    Number { integer: bool },
    Boolean,
    File,
    /// Closed enumeration over the field's options, plain string without options.
    Choice,
}

#[derive(Debug, Clone, PartialEq)]
pub struct KindSpec {
    pub shape: ValueShape,
    pub column: ColumnType,
}

impl FieldKind {
    pub const ALL: [FieldKind; 23] = [
        FieldKind::Text,
        FieldKind::Textarea,
        FieldKind::Password,
        FieldKind::Search,
        FieldKind::Hidden,
        FieldKind::Email,
        FieldKind::Url,
        FieldKind::Tel,
        FieldKind::Number,
        FieldKind::Range,
        FieldKind::Date,
        FieldKind::Time,
        FieldKind::DatetimeLocal,
        FieldKind::Month,
        FieldKind::Week,
        FieldKind::Color,
        FieldKind::Select,
        FieldKind::Radio,
        FieldKind::Checkbox,
        FieldKind::Toggle,
        FieldKind::File,
        FieldKind::Signature,
        FieldKind::Unknown,
    ];

    pub fn spec(self) -> &'static KindSpec {
        // Every kind is inserted when the table is built.
        &KIND_TABLE[&self]
    }

    pub fn shape(self) -> ValueShape {
        self.spec().shape
    }

    /// Column type used when the field's pgConfig declares none.
    pub fn inferred_column(self) -> ColumnType {
        self.spec().column.clone()
    }

    /// HTML input tag, as written in configuration files.
    pub fn as_str(self) -> &'static str {
        match self {
            FieldKind::Text => "text",
            FieldKind::Textarea => "textarea",
            FieldKind::Password => "password",
            FieldKind::Search => "search",
            FieldKind::Hidden => "hidden",
            FieldKind::Email => "email",
            FieldKind::Url => "url",
            FieldKind::Tel => "tel",
            FieldKind::Number => "number",
            FieldKind::Range => "range",
            FieldKind::Date => "date",
            FieldKind::Time => "time",
            FieldKind::DatetimeLocal => "datetime-local",
            FieldKind::Month => "month",
            FieldKind::Week => "week",
            FieldKind::Color => "color",
            FieldKind::Select => "select",
            FieldKind::Radio => "radio",
            FieldKind::Checkbox => "checkbox",
            FieldKind::Toggle => "toggle",
            FieldKind::File => "file",
            FieldKind::Signature => "signature",
            FieldKind::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for FieldKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

pub static KIND_TABLE: Lazy<HashMap<FieldKind, KindSpec>> = Lazy::new(|| {
    use StringFormat as F;
    use ValueShape as S;

    let text = ColumnType::of(PgType::Text);
    let rows = [
        (FieldKind::Text, S::Text(F::Plain), text.clone()),
        (FieldKind::Textarea, S::Text(F::Plain), text.clone()),
        (FieldKind::Password, S::Text(F::Plain), text.clone()),
        (FieldKind::Search, S::Text(F::Plain), text.clone()),
        (FieldKind::Hidden, S::Text(F::Plain), text.clone()),
        (FieldKind::Email, S::Text(F::Email), ColumnType::with_length(PgType::Varchar, 255)),
        (FieldKind::Url, S::Text(F::Url), text.clone()),
        (FieldKind::Tel, S::Text(F::Phone), ColumnType::with_length(PgType::Varchar, 50)),
        (FieldKind::Number, S::Number { integer: false }, ColumnType::of(PgType::Numeric)),
        (FieldKind::Range, S::Number { integer: true }, ColumnType::of(PgType::Integer)),
        (FieldKind::Date, S::Text(F::Date), ColumnType::of(PgType::Date)),
        (FieldKind::Time, S::Text(F::Time), ColumnType::of(PgType::Time)),
        (FieldKind::DatetimeLocal, S::Text(F::DateTimeLocal), ColumnType::of(PgType::Timestamp)),
        (FieldKind::Month, S::Text(F::Month), ColumnType::with_length(PgType::Varchar, 7)),
        (FieldKind::Week, S::Text(F::Week), ColumnType::with_length(PgType::Varchar, 8)),
        (FieldKind::Color, S::Text(F::HexColor), ColumnType::with_length(PgType::Varchar, 7)),
        (FieldKind::Select, S::Choice, text.clone()),
        (FieldKind::Radio, S::Choice, text.clone()),
        (FieldKind::Checkbox, S::Boolean, ColumnType::of(PgType::Boolean)),
        (FieldKind::Toggle, S::Boolean, ColumnType::of(PgType::Boolean)),
        (FieldKind::File, S::File, text.clone()),
        (FieldKind::Signature, S::Text(F::Plain), text.clone()),
        (FieldKind::Unknown, S::Text(F::Plain), text),
    ];

    rows.into_iter()
        .map(|(kind, shape, column)| (kind, KindSpec { shape, column }))
        .collect()
});
