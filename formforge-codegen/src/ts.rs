//! A small TypeScript document model and its printer.
//!
//! Generators build a [`Module`] (imports, then items; items hold functions,
//! functions hold statements) and call [`Module::render`]. Nothing here knows
//! about forms. Output uses two-space indentation, double quotes and
//! semicolons.

use formforge::json_helpers::display_number;
use formforge::schema::is_valid_identifier;

const INDENT: &str = "  ";
/// Objects and argument lists longer than this are broken across lines.
const INLINE_WIDTH: usize = 72;

#[derive(Debug, Clone, Default)]
pub struct Module {
    /// Leading comment lines, printed as `//` comments.
    pub header: Vec<String>,
    /// `"use server"` and friends.
    pub directive: Option<String>,
    pub imports: Vec<Import>,
    pub items: Vec<Item>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Import {
    pub names: Vec<String>,
    pub from: String,
    pub type_only: bool,
}

impl Import {
    pub fn named<I, S>(names: I, from: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
            from: from.into(),
            type_only: false,
        }
    }

    pub fn types<I, S>(names: I, from: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            type_only: true,
            ..Self::named(names, from)
        }
    }
}

#[derive(Debug, Clone)]
pub enum Item {
    Const {
        export: bool,
        name: String,
        ty: Option<TsType>,
        value: Expr,
    },
    TypeAlias {
        export: bool,
        name: String,
        ty: TsType,
    },
    Interface {
        export: bool,
        name: String,
        /// Type parameters, e.g. `T`.
        params: Vec<String>,
        members: Vec<PropSig>,
    },
    Function(Function),
    Comment(String),
}

#[derive(Debug, Clone, Default)]
pub struct Function {
    pub export: bool,
    pub is_async: bool,
    pub name: String,
    pub params: Vec<Param>,
    pub returns: Option<TsType>,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone)]
pub struct Param {
    pub name: String,
    pub ty: Option<TsType>,
    pub default: Option<Expr>,
}

impl Param {
    pub fn new(name: impl Into<String>, ty: TsType) -> Self {
        Self {
            name: name.into(),
            ty: Some(ty),
            default: None,
        }
    }

    pub fn untyped(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: None,
            default: None,
        }
    }

    pub fn with_default(mut self, default: Expr) -> Self {
        self.default = Some(default);
        self
    }
}

#[derive(Debug, Clone)]
pub enum Stmt {
    Const {
        name: String,
        ty: Option<TsType>,
        value: Expr,
    },
    Expr(Expr),
    Return(Option<Expr>),
    If {
        cond: Expr,
        then: Vec<Stmt>,
        otherwise: Option<Vec<Stmt>>,
    },
    TryCatch {
        body: Vec<Stmt>,
        binding: Option<String>,
        handler: Vec<Stmt>,
    },
}

impl Stmt {
    pub fn constant(name: impl Into<String>, value: Expr) -> Self {
        Stmt::Const {
            name: name.into(),
            ty: None,
            value,
        }
    }

    pub fn ret(value: Expr) -> Self {
        Stmt::Return(Some(value))
    }

    pub fn if_then(cond: Expr, then: Vec<Stmt>) -> Self {
        Stmt::If {
            cond,
            then,
            otherwise: None,
        }
    }
}

#[derive(Debug, Clone)]
pub enum Expr {
    Ident(String),
    Str(String),
    Num(f64),
    Bool(bool),
    Null,
    /// Regular-expression literal; `/` in the source is escaped on output.
    Regex(String),
    Array(Vec<Expr>),
    Object(Vec<Prop>),
    Member(Box<Expr>, String),
    Index(Box<Expr>, Box<Expr>),
    Call {
        callee: Box<Expr>,
        type_args: Vec<TsType>,
        args: Vec<Expr>,
    },
    Arrow {
        params: Vec<Param>,
        body: ArrowBody,
    },
    Await(Box<Expr>),
    Unary(&'static str, Box<Expr>),
    Binary(Box<Expr>, &'static str, Box<Expr>),
    Conditional(Box<Expr>, Box<Expr>, Box<Expr>),
}

#[derive(Debug, Clone)]
pub enum ArrowBody {
    Expr(Box<Expr>),
    Block(Vec<Stmt>),
}

#[derive(Debug, Clone)]
pub enum Prop {
    KeyValue(String, Expr),
    Shorthand(String),
    Spread(Expr),
}

impl Expr {
    pub fn ident(name: impl Into<String>) -> Self {
        Expr::Ident(name.into())
    }

    pub fn str(value: impl Into<String>) -> Self {
        Expr::Str(value.into())
    }

    pub fn object<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, Expr)>,
        K: Into<String>,
    {
        Expr::Object(
            entries
                .into_iter()
                .map(|(k, v)| Prop::KeyValue(k.into(), v))
                .collect(),
        )
    }

    pub fn member(self, property: impl Into<String>) -> Self {
        Expr::Member(Box::new(self), property.into())
    }

    pub fn index(self, index: Expr) -> Self {
        Expr::Index(Box::new(self), Box::new(index))
    }

    pub fn call(self, args: Vec<Expr>) -> Self {
        Expr::Call {
            callee: Box::new(self),
            type_args: Vec::new(),
            args,
        }
    }

    /// `self.name(args)`
    pub fn method(self, name: impl Into<String>, args: Vec<Expr>) -> Self {
        self.member(name).call(args)
    }

    pub fn await_(self) -> Self {
        Expr::Await(Box::new(self))
    }

    pub fn not(self) -> Self {
        Expr::Unary("!", Box::new(self))
    }

    pub fn binary(self, op: &'static str, right: Expr) -> Self {
        Expr::Binary(Box::new(self), op, Box::new(right))
    }

    pub fn conditional(test: Expr, then: Expr, otherwise: Expr) -> Self {
        Expr::Conditional(Box::new(test), Box::new(then), Box::new(otherwise))
    }

    pub fn arrow(params: Vec<Param>, body: Expr) -> Self {
        Expr::Arrow {
            params,
            body: ArrowBody::Expr(Box::new(body)),
        }
    }

    /// `{ message: "..." }`, the options argument most Zod checks take.
    pub fn message(text: impl Into<String>) -> Self {
        Expr::object([("message", Expr::str(text))])
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TsType {
    Named(String),
    Generic(String, Vec<TsType>),
    Array(Box<TsType>),
    Union(Vec<TsType>),
    StringLiteral(String),
    Object(Vec<PropSig>),
    /// `typeof name`
    Typeof(String),
}

impl TsType {
    pub fn named(name: impl Into<String>) -> Self {
        TsType::Named(name.into())
    }

    pub fn generic(name: impl Into<String>, args: Vec<TsType>) -> Self {
        TsType::Generic(name.into(), args)
    }

    pub fn string() -> Self {
        Self::named("string")
    }

    pub fn promise(inner: TsType) -> Self {
        Self::generic("Promise", vec![inner])
    }

    pub fn nullable(self) -> Self {
        match self {
            TsType::Union(mut members) => {
                members.push(Self::named("null"));
                TsType::Union(members)
            }
            other => TsType::Union(vec![other, Self::named("null")]),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PropSig {
    pub name: String,
    pub optional: bool,
    pub ty: TsType,
}

impl PropSig {
    pub fn new(name: impl Into<String>, ty: TsType) -> Self {
        Self {
            name: name.into(),
            optional: false,
            ty,
        }
    }

    pub fn optional(name: impl Into<String>, ty: TsType) -> Self {
        Self {
            optional: true,
            ..Self::new(name, ty)
        }
    }
}

impl Module {
    pub fn render(&self) -> String {
        let mut out = String::new();
        for line in &self.header {
            out.push_str("// ");
            out.push_str(line);
            out.push('\n');
        }
        if !self.header.is_empty() {
            out.push('\n');
        }
        if let Some(directive) = &self.directive {
            out.push_str(&format!("{};\n\n", string_literal(directive)));
        }
        for import in &self.imports {
            out.push_str(&render_import(import));
        }
        if !self.imports.is_empty() {
            out.push('\n');
        }
        let items: Vec<String> = self.items.iter().map(render_item).collect();
        out.push_str(&items.join("\n"));
        out
    }
}

fn render_import(import: &Import) -> String {
    format!(
        "import {}{{ {} }} from {};\n",
        if import.type_only { "type " } else { "" },
        import.names.join(", "),
        string_literal(&import.from)
    )
}

fn export_prefix(export: bool) -> &'static str {
    if export {
        "export "
    } else {
        ""
    }
}

fn render_item(item: &Item) -> String {
    match item {
        Item::Const {
            export,
            name,
            ty,
            value,
        } => format!(
            "{}const {}{} = {};\n",
            export_prefix(*export),
            name,
            type_annotation(ty.as_ref()),
            render_expr(value, 0)
        ),
        Item::TypeAlias { export, name, ty } => {
            format!("{}type {} = {};\n", export_prefix(*export), name, render_type(ty, 0))
        }
        Item::Interface {
            export,
            name,
            params,
            members,
        } => {
            let params = if params.is_empty() {
                String::new()
            } else {
                format!("<{}>", params.join(", "))
            };
            format!(
                "{}interface {}{} {}\n",
                export_prefix(*export),
                name,
                params,
                render_members(members, 0)
            )
        }
        Item::Function(function) => render_function(function),
        Item::Comment(text) => text.lines().map(|l| format!("// {l}\n")).collect(),
    }
}

fn render_function(function: &Function) -> String {
    let mut out = format!(
        "{}{}function {}({}){} {{\n",
        export_prefix(function.export),
        if function.is_async { "async " } else { "" },
        function.name,
        render_params(&function.params),
        type_annotation(function.returns.as_ref()),
    );
    render_block(&mut out, &function.body, 1);
    out.push_str("}\n");
    out
}

fn render_params(params: &[Param]) -> String {
    params
        .iter()
        .map(|p| {
            let mut s = format!("{}{}", p.name, type_annotation(p.ty.as_ref()));
            if let Some(default) = &p.default {
                s.push_str(" = ");
                s.push_str(&render_expr(default, 0));
            }
            s
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn type_annotation(ty: Option<&TsType>) -> String {
    ty.map(|t| format!(": {}", render_type(t, 0))).unwrap_or_default()
}

fn pad(level: usize) -> String {
    INDENT.repeat(level)
}

fn render_block(out: &mut String, stmts: &[Stmt], level: usize) {
    for stmt in stmts {
        render_stmt(out, stmt, level);
    }
}

fn render_stmt(out: &mut String, stmt: &Stmt, level: usize) {
    let p = pad(level);
    match stmt {
        Stmt::Const { name, ty, value } => out.push_str(&format!(
            "{p}const {name}{} = {};\n",
            type_annotation(ty.as_ref()),
            render_expr(value, level)
        )),
        Stmt::Expr(expr) => out.push_str(&format!("{p}{};\n", render_expr(expr, level))),
        Stmt::Return(None) => out.push_str(&format!("{p}return;\n")),
        Stmt::Return(Some(expr)) => {
            out.push_str(&format!("{p}return {};\n", render_expr(expr, level)))
        }
        Stmt::If {
            cond,
            then,
            otherwise,
        } => {
            out.push_str(&format!("{p}if ({}) {{\n", render_expr(cond, level)));
            render_block(out, then, level + 1);
            match otherwise {
                Some(otherwise) => {
                    out.push_str(&format!("{p}}} else {{\n"));
                    render_block(out, otherwise, level + 1);
                    out.push_str(&format!("{p}}}\n"));
                }
                None => out.push_str(&format!("{p}}}\n")),
            }
        }
        Stmt::TryCatch {
            body,
            binding,
            handler,
        } => {
            out.push_str(&format!("{p}try {{\n"));
            render_block(out, body, level + 1);
            match binding {
                Some(binding) => out.push_str(&format!("{p}}} catch ({binding}) {{\n")),
                None => out.push_str(&format!("{p}}} catch {{\n")),
            }
            render_block(out, handler, level + 1);
            out.push_str(&format!("{p}}}\n"));
        }
    }
}

/// Render an expression whose first line starts at indentation `level`.
pub fn render_expr(expr: &Expr, level: usize) -> String {
    match expr {
        Expr::Ident(name) => name.clone(),
        Expr::Str(s) => string_literal(s),
        Expr::Num(n) => display_number(*n),
        Expr::Bool(b) => b.to_string(),
        Expr::Null => "null".to_string(),
        Expr::Regex(source) => format!("/{}/", escape_regex_slashes(source)),
        Expr::Array(items) => {
            let parts: Vec<String> = items.iter().map(|e| render_expr(e, level + 1)).collect();
            wrap_list("[", "]", &parts, level)
        }
        Expr::Object(props) if props.is_empty() => "{}".to_string(),
        Expr::Object(props) => {
            let parts: Vec<String> = props
                .iter()
                .map(|prop| match prop {
                    Prop::KeyValue(key, value) => {
                        format!("{}: {}", property_key(key), render_expr(value, level + 1))
                    }
                    Prop::Shorthand(name) => name.clone(),
                    Prop::Spread(value) => format!("...{}", render_expr(value, level + 1)),
                })
                .collect();
            wrap_list("{ ", " }", &parts, level)
        }
        Expr::Member(object, property) => {
            format!("{}.{}", render_operand(object, level), property)
        }
        Expr::Index(object, index) => {
            format!("{}[{}]", render_operand(object, level), render_expr(index, level))
        }
        Expr::Call {
            callee,
            type_args,
            args,
        } => {
            let type_args = if type_args.is_empty() {
                String::new()
            } else {
                let rendered: Vec<String> = type_args.iter().map(|t| render_type(t, level)).collect();
                format!("<{}>", rendered.join(", "))
            };
            let parts: Vec<String> = args.iter().map(|a| render_expr(a, level)).collect();
            format!("{}{}({})", render_operand(callee, level), type_args, parts.join(", "))
        }
        Expr::Arrow { params, body } => {
            let params = match params.as_slice() {
                [single] if single.ty.is_none() && single.default.is_none() => single.name.clone(),
                _ => format!("({})", render_params(params)),
            };
            match body {
                ArrowBody::Expr(body) => match body.as_ref() {
                    Expr::Object(_) => format!("{params} => ({})", render_expr(body, level)),
                    other => format!("{params} => {}", render_expr(other, level)),
                },
                ArrowBody::Block(stmts) => {
                    let mut out = format!("{params} => {{\n");
                    render_block(&mut out, stmts, level + 1);
                    out.push_str(&pad(level));
                    out.push('}');
                    out
                }
            }
        }
        Expr::Await(inner) => format!("await {}", render_operand(inner, level)),
        Expr::Unary(op, inner) => {
            let sep = if op.chars().all(char::is_alphabetic) { " " } else { "" };
            format!("{op}{sep}{}", render_operand(inner, level))
        }
        Expr::Binary(left, op, right) => format!(
            "{} {} {}",
            render_operand(left, level),
            op,
            render_operand(right, level)
        ),
        Expr::Conditional(test, then, otherwise) => format!(
            "{} ? {} : {}",
            render_operand(test, level),
            render_operand(then, level),
            render_operand(otherwise, level)
        ),
    }
}

/// Compound expressions used as an operand get parentheses.
fn render_operand(expr: &Expr, level: usize) -> String {
    let rendered = render_expr(expr, level);
    match expr {
        Expr::Binary(..) | Expr::Conditional(..) | Expr::Arrow { .. } | Expr::Await(_) => {
            format!("({rendered})")
        }
        _ => rendered,
    }
}

fn wrap_list(open: &str, close: &str, parts: &[String], level: usize) -> String {
    if parts.is_empty() {
        return format!("{}{}", open.trim(), close.trim());
    }
    let inline = parts.join(", ");
    if inline.len() <= INLINE_WIDTH && !inline.contains('\n') {
        return format!("{open}{inline}{close}");
    }
    let inner = pad(level + 1);
    let mut out = format!("{}\n", open.trim_end());
    for part in parts {
        out.push_str(&format!("{inner}{part},\n"));
    }
    out.push_str(&pad(level));
    out.push_str(close.trim_start());
    out
}

pub fn render_type(ty: &TsType, level: usize) -> String {
    match ty {
        TsType::Named(name) => name.clone(),
        TsType::Generic(name, args) => {
            let args: Vec<String> = args.iter().map(|a| render_type(a, level)).collect();
            format!("{}<{}>", name, args.join(", "))
        }
        TsType::Array(inner) => match inner.as_ref() {
            TsType::Union(_) => format!("({})[]", render_type(inner, level)),
            other => format!("{}[]", render_type(other, level)),
        },
        TsType::Union(members) => members
            .iter()
            .map(|m| render_type(m, level))
            .collect::<Vec<_>>()
            .join(" | "),
        TsType::StringLiteral(s) => string_literal(s),
        TsType::Object(members) => render_members(members, level),
        TsType::Typeof(name) => format!("typeof {name}"),
    }
}

fn render_members(members: &[PropSig], level: usize) -> String {
    if members.is_empty() {
        return "{}".to_string();
    }
    let inner = pad(level + 1);
    let mut out = "{\n".to_string();
    for member in members {
        out.push_str(&format!(
            "{inner}{}{}: {};\n",
            property_key(&member.name),
            if member.optional { "?" } else { "" },
            render_type(&member.ty, level + 1)
        ));
    }
    out.push_str(&pad(level));
    out.push('}');
    out
}

fn property_key(key: &str) -> String {
    if is_valid_identifier(key) {
        key.to_string()
    } else {
        string_literal(key)
    }
}

/// Double-quoted string literal. JSON escaping is valid TypeScript.
pub fn string_literal(s: &str) -> String {
    serde_json::Value::String(s.to_string()).to_string()
}

fn escape_regex_slashes(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let mut escaped = false;
    for c in source.chars() {
        if c == '/' && !escaped {
            out.push('\\');
        }
        escaped = c == '\\' && !escaped;
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_chain() {
        let expr = Expr::ident("z")
            .method("string", vec![])
            .method("min", vec![Expr::Num(1.0), Expr::message("Name is required")]);
        assert_eq!(
            render_expr(&expr, 0),
            r#"z.string().min(1, { message: "Name is required" })"#
        );
    }

    #[test]
    fn test_regex_slashes_are_escaped() {
        let expr = Expr::Regex(r"^https?://a\/b$".to_string());
        assert_eq!(render_expr(&expr, 0), r"/^https?:\/\/a\/b$/");
    }

    #[test]
    fn test_long_object_breaks_lines() {
        let expr = Expr::object([
            ("technician_email", Expr::str("tech@example.com")),
            ("equipment_id", Expr::str("P-7")),
            ("inspection_date", Expr::str("2024-05-01")),
        ]);
        let rendered = render_expr(&expr, 0);
        assert!(rendered.starts_with("{\n  technician_email: "));
        assert!(rendered.ends_with(",\n}"));
    }

    #[test]
    fn test_property_keys_are_quoted_when_needed() {
        let expr = Expr::object([("valid_key", Expr::Num(1.0)), ("has-dash", Expr::Num(2.5))]);
        assert_eq!(render_expr(&expr, 0), r#"{ valid_key: 1, "has-dash": 2.5 }"#);
    }

    #[test]
    fn test_function_rendering() {
        let module = Module {
            header: vec!["Generated".to_string()],
            directive: Some("use server".to_string()),
            imports: vec![
                Import::named(["z"], "zod"),
                Import::types(["Row"], "./row.types"),
            ],
            items: vec![Item::Function(Function {
                export: true,
                is_async: true,
                name: "load".to_string(),
                params: vec![Param::new("id", TsType::string())],
                returns: Some(TsType::promise(TsType::named("Row").nullable())),
                body: vec![Stmt::TryCatch {
                    body: vec![Stmt::ret(Expr::ident("fetchRow").call(vec![Expr::ident("id")]).await_())],
                    binding: None,
                    handler: vec![Stmt::ret(Expr::Null)],
                }],
            })],
        };
        let expected = r#"// Generated

"use server";

import { z } from "zod";
import type { Row } from "./row.types";

export async function load(id: string): Promise<Row | null> {
  try {
    return await fetchRow(id);
  } catch {
    return null;
  }
}
"#;
        assert_eq!(module.render(), expected);
    }

    #[test]
    fn test_arrow_and_operators() {
        let expr = Expr::arrow(
            vec![Param::untyped("value")],
            Expr::conditional(
                Expr::Unary("typeof", Box::new(Expr::ident("value"))).binary("===", Expr::str("string")),
                Expr::ident("value").method("trim", vec![]),
                Expr::ident("value"),
            ),
        );
        assert_eq!(
            render_expr(&expr, 0),
            r#"value => (typeof value === "string") ? value.trim() : value"#
        );
    }

    #[test]
    fn test_interface_rendering() {
        let item = Item::Interface {
            export: true,
            name: "Page".to_string(),
            params: vec!["T".to_string()],
            members: vec![
                PropSig::new("rows", TsType::Array(Box::new(TsType::named("T")))),
                PropSig::optional("note", TsType::string().nullable()),
            ],
        };
        assert_eq!(
            render_item(&item),
            "export interface Page<T> {\n  rows: T[];\n  note?: string | null;\n}\n"
        );
    }
}
