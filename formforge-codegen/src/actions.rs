//! Server-action module generation.
//!
//! Emits `create<T>`, `get<T>List`, `get<T>ById`, `update<T>`, `delete<T>`
//! and `submit<T>Form` over the generic data layer named in
//! [`CodegenOptions`]. Every action returns an `ActionResult`; validation
//! failures become `"Validation error: <path>: <message>; ..."`.

use crate::names::FormNames;
use crate::options::CodegenOptions;
use crate::ts::{Expr, Function, Import, Item, Module, Param, Prop, Stmt, TsType};
use crate::types::{ACTION_RESULT, INSERTED_RECORD, LIST_OPTIONS, PAGE};
use formforge::schema::ValueShape;
use formforge::FormConfiguration;

const TABLE_NAME: &str = "TABLE_NAME";
const REVALIDATE_PATH: &str = "REVALIDATE_PATH";
const FILE_FIELDS: &str = "FILE_FIELDS";
const GENERIC_ERROR: &str = "GENERIC_ERROR";
const VALIDATION_ERROR: &str = "validationError";
const FAILURE: &str = "failureMessage";
const INSERT_RECORD: &str = "insertRecord";

const DATA_FUNCTIONS: [&str; 5] = [
    "deleteFormData",
    "getFormData",
    "getFormDataById",
    "insertFormData",
    "updateFormData",
];

fn result_type(inner: TsType) -> TsType {
    TsType::promise(TsType::generic(ACTION_RESULT, vec![inner]))
}

fn ok(data: Expr, message: Expr) -> Stmt {
    Stmt::ret(Expr::object([
        ("success", Expr::Bool(true)),
        ("data", data),
        ("message", message),
    ]))
}

fn fail(error: Expr) -> Stmt {
    Stmt::ret(Expr::object([("success", Expr::Bool(false)), ("error", error)]))
}

fn not_found_guard(value: &str) -> Stmt {
    Stmt::if_then(Expr::ident(value).not(), vec![fail(Expr::str("Record not found"))])
}

fn revalidate() -> Stmt {
    Stmt::Expr(Expr::ident("revalidatePath").call(vec![Expr::ident(REVALIDATE_PATH)]))
}

/// `const <name> = await <callee><T>(TABLE_NAME, ...args);`
fn await_data(name: &str, callee: &str, type_arg: Option<TsType>, args: Vec<Expr>) -> Stmt {
    let mut all = vec![Expr::ident(TABLE_NAME)];
    all.extend(args);
    Stmt::constant(
        name,
        Expr::Call {
            callee: Box::new(Expr::ident(callee)),
            type_args: type_arg.into_iter().collect(),
            args: all,
        }
        .await_(),
    )
}

/// Wrap `body` so infrastructure failures are logged and reported.
fn guarded(action: &str, body: Vec<Stmt>) -> Stmt {
    Stmt::TryCatch {
        body,
        binding: Some("error".to_string()),
        handler: vec![
            Stmt::Expr(Expr::ident("console").method(
                "error",
                vec![Expr::str(format!("{action} failed:")), Expr::ident("error")],
            )),
            fail(Expr::ident(FAILURE).call(vec![Expr::ident("error")])),
        ],
    }
}

/// `const parsed = <schema>.safeParse(data); if (!parsed.success) return ...;`
fn parse_or_fail(schema: Expr) -> Vec<Stmt> {
    vec![
        Stmt::constant("parsed", schema.method("safeParse", vec![Expr::ident("data")])),
        Stmt::if_then(
            Expr::ident("parsed").member("success").not(),
            vec![fail(
                Expr::ident(VALIDATION_ERROR).call(vec![Expr::ident("parsed").member("error")]),
            )],
        ),
    ]
}

/// Build the `<table>.actions.ts` module.
pub fn actions_module(
    config: &FormConfiguration,
    names: &FormNames,
    options: &CodegenOptions,
    header: &[String],
) -> Module {
    let record = TsType::named(names.record_type());
    let schema_path = format!("./{}", names.schema_file().trim_end_matches(".ts"));
    let types_path = format!("./{}", names.types_file().trim_end_matches(".ts"));
    let file_fields: Vec<Expr> = config
        .fields()
        .filter(|f| f.kind.shape() == ValueShape::File)
        .map(|f| Expr::str(f.name.clone()))
        .collect();

    let mut type_names = vec![
        ACTION_RESULT.to_string(),
        INSERTED_RECORD.to_string(),
        LIST_OPTIONS.to_string(),
        PAGE.to_string(),
        names.record_type(),
        names.input_type(),
    ];
    type_names.sort();

    let imports = vec![
        Import::named(["revalidatePath"], "next/cache"),
        Import::types(["ZodError"], crate::zod::ZOD_MODULE),
        Import::named(DATA_FUNCTIONS, options.data_module.clone()),
        Import::named(["prepareFormData"], options.uploads_module.clone()),
        Import::named([names.server_schema()], schema_path),
        Import::types(type_names, types_path),
    ];

    let mut items = vec![
        Item::Const {
            export: false,
            name: TABLE_NAME.to_string(),
            ty: None,
            value: Expr::str(names.table.clone()),
        },
        Item::Const {
            export: false,
            name: REVALIDATE_PATH.to_string(),
            ty: None,
            value: Expr::str(options.revalidate_path_for(&names.table)),
        },
        Item::Const {
            export: false,
            name: FILE_FIELDS.to_string(),
            ty: Some(TsType::Array(Box::new(TsType::string()))),
            value: Expr::Array(file_fields),
        },
        Item::Const {
            export: false,
            name: GENERIC_ERROR.to_string(),
            ty: None,
            value: Expr::str(formforge::action::GENERIC_ERROR),
        },
        Item::Function(validation_error_helper()),
        Item::Function(failure_helper()),
        Item::Function(insert_record(names)),
    ];
    items.extend(
        [
            create_action(names),
            list_action(names, &record),
            get_by_id_action(names, &record),
            update_action(names, &record),
            delete_action(names),
            submit_action(names),
        ]
        .into_iter()
        .map(Item::Function),
    );

    Module {
        header: header.to_vec(),
        directive: Some("use server".to_string()),
        imports,
        items,
    }
}

fn validation_error_helper() -> Function {
    let issue = Expr::ident("issue");
    let line = issue
        .clone()
        .member("path")
        .method("join", vec![Expr::str(".")])
        .binary("+", Expr::str(": "))
        .binary("+", issue.member("message"));
    let joined = Expr::ident("error")
        .member("issues")
        .method("map", vec![Expr::arrow(vec![Param::untyped("issue")], line)])
        .method("join", vec![Expr::str("; ")]);
    Function {
        name: VALIDATION_ERROR.to_string(),
        params: vec![Param::new("error", TsType::named("ZodError"))],
        returns: Some(TsType::string()),
        body: vec![Stmt::ret(Expr::str("Validation error: ").binary("+", joined))],
        ..Function::default()
    }
}

fn failure_helper() -> Function {
    Function {
        name: FAILURE.to_string(),
        params: vec![Param::new("error", TsType::named("unknown"))],
        returns: Some(TsType::string()),
        body: vec![Stmt::ret(Expr::conditional(
            Expr::ident("error").binary("instanceof", Expr::ident("Error")),
            Expr::ident("error").member("message"),
            Expr::ident(GENERIC_ERROR),
        ))],
        ..Function::default()
    }
}

/// Shared by `create<T>` and `submit<T>Form`.
fn insert_record(names: &FormNames) -> Function {
    let mut body = parse_or_fail(Expr::ident(names.server_schema()));
    body.push(guarded(
        &format!("create {}", names.table),
        vec![
            await_data(
                "record",
                "insertFormData",
                None,
                vec![Expr::ident("parsed").member("data")],
            ),
            revalidate(),
            ok(Expr::ident("record"), Expr::str("Record created successfully")),
        ],
    ));
    Function {
        is_async: true,
        name: INSERT_RECORD.to_string(),
        params: vec![Param::new("data", TsType::named("unknown"))],
        returns: Some(result_type(TsType::named(INSERTED_RECORD))),
        body,
        ..Function::default()
    }
}

fn create_action(names: &FormNames) -> Function {
    Function {
        export: true,
        is_async: true,
        name: format!("create{}", names.pascal),
        params: vec![Param::new("data", TsType::named(names.input_type()))],
        returns: Some(result_type(TsType::named(INSERTED_RECORD))),
        body: vec![Stmt::ret(Expr::ident(INSERT_RECORD).call(vec![Expr::ident("data")]))],
    }
}

fn list_action(names: &FormNames, record: &TsType) -> Function {
    let message = Expr::str("Found ")
        .binary("+", Expr::ident("page").member("total"))
        .binary("+", Expr::str(" record(s)"));
    Function {
        export: true,
        is_async: true,
        name: format!("get{}List", names.pascal),
        params: vec![
            Param::new("options", TsType::named(LIST_OPTIONS)).with_default(Expr::Object(Vec::new()))
        ],
        returns: Some(result_type(TsType::generic(PAGE, vec![record.clone()]))),
        body: vec![guarded(
            &format!("list {}", names.table),
            vec![
                await_data("page", "getFormData", Some(record.clone()), vec![Expr::ident("options")]),
                ok(Expr::ident("page"), message),
            ],
        )],
    }
}

fn get_by_id_action(names: &FormNames, record: &TsType) -> Function {
    Function {
        export: true,
        is_async: true,
        name: format!("get{}ById", names.pascal),
        params: vec![Param::new("id", TsType::string())],
        returns: Some(result_type(record.clone())),
        body: vec![guarded(
            &format!("get {}", names.table),
            vec![
                await_data("record", "getFormDataById", Some(record.clone()), vec![Expr::ident("id")]),
                not_found_guard("record"),
                ok(Expr::ident("record"), Expr::str("Record found")),
            ],
        )],
    }
}

fn update_action(names: &FormNames, record: &TsType) -> Function {
    let mut body = parse_or_fail(Expr::ident(names.server_schema()).method("partial", vec![]));
    body.push(guarded(
        &format!("update {}", names.table),
        vec![
            await_data(
                "record",
                "updateFormData",
                Some(record.clone()),
                vec![Expr::ident("id"), Expr::ident("parsed").member("data")],
            ),
            not_found_guard("record"),
            revalidate(),
            ok(Expr::ident("record"), Expr::str("Record updated successfully")),
        ],
    ));
    Function {
        export: true,
        is_async: true,
        name: format!("update{}", names.pascal),
        params: vec![
            Param::new("id", TsType::string()),
            Param::new("data", TsType::generic("Partial", vec![TsType::named(names.input_type())])),
        ],
        returns: Some(result_type(record.clone())),
        body,
    }
}

fn delete_action(names: &FormNames) -> Function {
    Function {
        export: true,
        is_async: true,
        name: format!("delete{}", names.pascal),
        params: vec![Param::new("id", TsType::string())],
        returns: Some(result_type(TsType::named("boolean"))),
        body: vec![guarded(
            &format!("delete {}", names.table),
            vec![
                await_data("deleted", "deleteFormData", None, vec![Expr::ident("id")]),
                not_found_guard("deleted"),
                revalidate(),
                ok(Expr::Bool(true), Expr::str("Record deleted successfully")),
            ],
        )],
    }
}

fn submit_action(names: &FormNames) -> Function {
    let prepare = Stmt::constant(
        "payload",
        Expr::ident("prepareFormData")
            .call(vec![Expr::ident("formData"), Expr::ident(FILE_FIELDS)])
            .await_(),
    );
    let insert = Stmt::constant(
        "result",
        Expr::ident(INSERT_RECORD).call(vec![Expr::ident("payload")]).await_(),
    );
    let submitted = Expr::Object(vec![
        Prop::Spread(Expr::ident("result")),
        Prop::KeyValue("message".to_string(), Expr::str("Form submitted successfully")),
    ]);
    Function {
        export: true,
        is_async: true,
        name: format!("submit{}Form", names.pascal),
        params: vec![Param::new("formData", TsType::named("FormData"))],
        returns: Some(result_type(TsType::named(INSERTED_RECORD))),
        body: vec![guarded(
            &format!("submit {}", names.table),
            vec![
                prepare,
                insert,
                Stmt::if_then(
                    Expr::ident("result").member("success").not(),
                    vec![Stmt::ret(Expr::ident("result"))],
                ),
                Stmt::ret(submitted),
            ],
        )],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rendered() -> String {
        let config = FormConfiguration::example();
        actions_module(&config, &FormNames::new(&config), &CodegenOptions::default(), &[]).render()
    }

    #[test]
    fn test_module_preamble() {
        let module = rendered();
        assert!(module.starts_with("\"use server\";\n\nimport { revalidatePath } from \"next/cache\";\n"));
        assert!(module.contains("import { maintenanceChecksServerSchema } from \"./maintenance_checks.schema\";\n"));
        assert!(module.contains("const TABLE_NAME = \"maintenance_checks\";\n"));
        assert!(module.contains("const FILE_FIELDS: string[] = [\"photos\"];\n"));
        assert!(module.contains("const GENERIC_ERROR = \"An unexpected error occurred\";\n"));
    }

    #[test]
    fn test_every_action_is_exported() {
        let module = rendered();
        for signature in [
            "export async function createMaintenanceChecks(data: MaintenanceChecksInput): Promise<ActionResult<InsertedRecord>> {",
            "export async function getMaintenanceChecksList(options: ListOptions = {}): Promise<ActionResult<Page<MaintenanceChecks>>> {",
            "export async function getMaintenanceChecksById(id: string): Promise<ActionResult<MaintenanceChecks>> {",
            "export async function updateMaintenanceChecks(id: string, data: Partial<MaintenanceChecksInput>): Promise<ActionResult<MaintenanceChecks>> {",
            "export async function deleteMaintenanceChecks(id: string): Promise<ActionResult<boolean>> {",
            "export async function submitMaintenanceChecksForm(formData: FormData): Promise<ActionResult<InsertedRecord>> {",
        ] {
            assert!(module.contains(signature), "missing {signature}");
        }
        assert!(!module.contains("export async function insertRecord"));
    }

    #[test]
    fn test_update_uses_partial_schema() {
        let module = rendered();
        assert!(module.contains("const parsed = maintenanceChecksServerSchema.partial().safeParse(data);"));
        assert!(module.contains(
            "const record = await updateFormData<MaintenanceChecks>(TABLE_NAME, id, parsed.data);"
        ));
    }

    #[test]
    fn test_validation_message_shape() {
        let module = rendered();
        assert!(module.contains(
            r#"return "Validation error: " + error.issues.map(issue => (issue.path.join(".") + ": ") + issue.message).join("; ");"#
        ));
    }

    #[test]
    fn test_custom_revalidate_path() {
        let config = FormConfiguration::example();
        let options = CodegenOptions {
            revalidate_path: Some("/admin/checks".to_string()),
            ..CodegenOptions::default()
        };
        let module = actions_module(&config, &FormNames::new(&config), &options, &[]).render();
        assert!(module.contains("const REVALIDATE_PATH = \"/admin/checks\";"));
    }
}
