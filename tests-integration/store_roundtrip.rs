//! Integration tests for the form store
//!
//! These tests run against a real PostgreSQL database and are skipped unless
//! `TEST_DATABASE_URL` is set.
//!
//! Test flow:
//! 1. Create a uniquely named table from the example form
//! 2. Insert validated payloads
//! 3. Read, list, update and delete them
//! 4. Drop the table

use formforge::schema::FieldDefinition;
use formforge::test_helpers::{unique_table_name, TestDatabase};
use formforge::{
    generate_create_table_sql, ActionResult, FileStore, FormActions, FormConfiguration, FormStore,
    FormValidator, ListOptions, MayPostgresExecutor, SortOrder, UploadError, UploadedFile,
};
use serde_json::{json, Map, Value};
use std::thread::sleep;
use std::time::Duration;

struct Fixture {
    db: TestDatabase,
    executor: MayPostgresExecutor,
    config: FormConfiguration,
}

impl Fixture {
    fn new(prefix: &str) -> Option<Self> {
        let mut db = TestDatabase::from_env()?;
        let executor = db.executor().expect("connect to TEST_DATABASE_URL");
        let mut config = FormConfiguration::example();
        config.postgres_table_name = unique_table_name(prefix);
        db.drop_table(config.table_name()).expect("drop stale table");
        Some(Self { db, executor, config })
    }

    fn store(&self) -> FormStore<'_, MayPostgresExecutor> {
        FormStore::new(&self.config, &self.executor)
    }
}

impl Drop for Fixture {
    fn drop(&mut self) {
        let table = self.config.table_name().to_string();
        if let Err(e) = self.db.drop_table(&table) {
            eprintln!("failed to drop {table}: {e}");
        }
    }
}

fn payload(value: Value) -> Map<String, Value> {
    value.as_object().cloned().expect("object payload")
}

fn inspection(equipment: &str, condition: &str) -> Map<String, Value> {
    payload(json!({
        "technician_email": "tech@example.com",
        "equipment_id": equipment,
        "inspection_date": "2024-05-01",
        "condition": condition,
        "operating_hours": "12.5",
        "passed": "on",
    }))
}

#[test]
fn test_ddl_is_idempotent() {
    let Some(fixture) = Fixture::new("ff_ddl") else {
        return;
    };
    let script = generate_create_table_sql(&fixture.config);
    script.execute(&fixture.executor).unwrap();
    script.execute(&fixture.executor).unwrap();
}

#[test]
fn test_insert_then_read_round_trip() {
    let Some(fixture) = Fixture::new("ff_roundtrip") else {
        return;
    };
    let validator = FormValidator::form_facing(&fixture.config);
    let cleaned = validator.validate(&inspection("P-7", "good")).unwrap();

    let store = fixture.store();
    let inserted = store.insert(&cleaned).unwrap();
    assert_eq!(inserted.created_at, inserted.updated_at);

    let record = store.get_by_id(inserted.id).unwrap().expect("inserted row");
    assert_eq!(record.id, inserted.id);
    assert_eq!(record.values["technician_email"], json!("tech@example.com"));
    assert_eq!(record.values["inspection_date"], json!("2024-05-01"));
    assert_eq!(record.values["condition"], json!("good"));
    assert_eq!(record.values["operating_hours"], json!(12.5));
    assert_eq!(record.values["passed"], json!(true));
    assert_eq!(record.values["notes"], Value::Null);
}

#[test]
fn test_array_columns_round_trip() {
    let Some(mut fixture) = Fixture::new("ff_arrays") else {
        return;
    };
    let extra: Vec<FieldDefinition> = serde_json::from_value(json!([
        {"name": "tags", "label": "Tags", "type": "text", "pgConfig": {"type": "TEXT[]"}},
        {"name": "shifts", "label": "Shifts", "type": "text", "pgConfig": {"type": "INTEGER[]"}}
    ]))
    .unwrap();
    fixture.config.sections[0].fields.extend(extra);

    let mut submitted = inspection("P-9", "fair");
    submitted.insert("tags".into(), json!(["pump", "say \"hi\"", "a,b"]));
    submitted.insert("shifts".into(), json!("[1, \"2\"]"));
    let cleaned = FormValidator::form_facing(&fixture.config).validate(&submitted).unwrap();

    let store = fixture.store();
    let inserted = store.insert(&cleaned).unwrap();
    let record = store.get_by_id(inserted.id).unwrap().expect("inserted row");
    assert_eq!(record.values["tags"], json!(["pump", "say \"hi\"", "a,b"]));
    assert_eq!(record.values["shifts"], json!([1, 2]));

    let options = ListOptions {
        filters: payload(json!({"shifts": [1, 2]})),
        ..ListOptions::default()
    };
    assert_eq!(store.get_form_data(&options).unwrap().total, 1);
}

#[test]
fn test_delete_of_missing_id_is_false() {
    let Some(fixture) = Fixture::new("ff_delete") else {
        return;
    };
    let store = fixture.store();
    store.ensure_table().unwrap();
    assert!(!store.delete(uuid::Uuid::new_v4()).unwrap());

    let validator = FormValidator::form_facing(&fixture.config);
    let inserted = store
        .insert(&validator.validate(&inspection("P-1", "fair")).unwrap())
        .unwrap();
    assert!(store.delete(inserted.id).unwrap());
    assert!(store.get_by_id(inserted.id).unwrap().is_none());
    assert!(!store.delete(inserted.id).unwrap());
}

#[test]
fn test_empty_update_refreshes_only_updated_at() {
    let Some(fixture) = Fixture::new("ff_update") else {
        return;
    };
    let store = fixture.store();
    let validator = FormValidator::form_facing(&fixture.config);
    let inserted = store
        .insert(&validator.validate(&inspection("P-2", "good")).unwrap())
        .unwrap();
    let before = store.get_by_id(inserted.id).unwrap().unwrap();

    sleep(Duration::from_millis(20));
    let after = store.update(inserted.id, &Map::new()).unwrap().unwrap();
    assert!(after.updated_at > before.updated_at);
    assert_eq!(after.created_at, before.created_at);
    assert_eq!(after.values, before.values);

    let partial = validator
        .validate_partial(&payload(json!({"notes": "Bearing replaced"})))
        .unwrap();
    let updated = store.update(inserted.id, &partial).unwrap().unwrap();
    assert_eq!(updated.values["notes"], json!("Bearing replaced"));
    assert_eq!(updated.values["equipment_id"], json!("P-2"));

    assert!(store.update(uuid::Uuid::new_v4(), &Map::new()).unwrap().is_none());
}

#[test]
fn test_list_pagination_and_filters() {
    let Some(fixture) = Fixture::new("ff_list") else {
        return;
    };
    let store = fixture.store();
    let validator = FormValidator::form_facing(&fixture.config);
    for (equipment, condition) in [("P-1", "good"), ("P-2", "poor"), ("P-3", "good")] {
        store
            .insert(&validator.validate(&inspection(equipment, condition)).unwrap())
            .unwrap();
    }

    let all = store.get_form_data(&ListOptions::default()).unwrap();
    assert_eq!(all.total, 3);
    assert_eq!(all.rows.len(), 3);

    let page = store
        .get_form_data(&ListOptions {
            limit: 1,
            offset: 1,
            sort_by: "equipment_id".to_string(),
            sort_order: SortOrder::Asc,
            filters: payload(json!({"condition": "good"})),
        })
        .unwrap();
    assert_eq!(page.total, 2);
    assert_eq!(page.rows.len(), 1);
    assert_eq!(page.rows[0].values["equipment_id"], json!("P-3"));

    let none = store
        .get_form_data(&ListOptions {
            filters: payload(json!({"notes": null})),
            ..ListOptions::default()
        })
        .unwrap();
    assert_eq!(none.total, 3);
}

struct NoUploads;

impl FileStore for NoUploads {
    fn save(&self, field: &str, _file: &UploadedFile) -> Result<String, UploadError> {
        Err(UploadError::UnexpectedFile(field.to_string()))
    }
}

#[test]
fn test_action_boundary() {
    let Some(fixture) = Fixture::new("ff_actions") else {
        return;
    };
    let actions = FormActions::new(&fixture.config, &fixture.executor, &NoUploads);

    let mut invalid = inspection("P-9", "good");
    invalid.insert("technician_email".to_string(), json!("not-an-email"));
    let rejected = actions.create(&invalid);
    assert!(!rejected.success);
    assert_eq!(
        rejected.error.as_deref(),
        Some("Validation error: technician_email: Invalid email address")
    );

    let created = actions.create(&inspection("P-9", "good"));
    assert!(created.success, "{:?}", created.error);
    let id = created.data.expect("inserted record").id.to_string();

    let listed = actions.list(&ListOptions::default());
    assert_eq!(listed.message.as_deref(), Some("Found 1 record(s)"));

    let deleted: ActionResult<bool> = actions.delete(&id);
    assert!(deleted.success);
    assert_eq!(actions.delete(&id).error.as_deref(), Some("Record not found"));
}
