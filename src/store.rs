//! Generic data-access layer.
//!
//! [`FormStore`] performs CRUD against the table named by a
//! [`FormConfiguration`], using whatever [`FormExecutor`] it is given. Values
//! are bound as text and cast to the column's SQL type, so JSON payloads can
//! be stored without per-type Rust conversions.

use crate::ddl::{generate_create_table_sql, iden, DdlScript};
use crate::executor::{FormError, FormExecutor};
use crate::query::{bind_text, bind_value, execute_statement, query_rows, row_to_json};
use crate::schema::{
    ColumnType, FormConfiguration, PgType, CREATED_AT_COLUMN, ID_COLUMN, UPDATED_AT_COLUMN,
};
use chrono::{DateTime, Utc};
use may_postgres::Row;
use sea_query::{Asterisk, Expr, ExprTrait, Order, Query, SelectStatement};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use uuid::Uuid;

pub const DEFAULT_PAGE_SIZE: u64 = 10;

#[derive(Debug)]
pub enum StoreError {
    Database(FormError),
    /// Sort or filter column outside the form's columns.
    InvalidColumn(String),
    /// Payload key that is not a configured field.
    UnknownField(String),
    InvalidId(String),
    Decode(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Database(e) => write!(f, "{e}"),
            StoreError::InvalidColumn(c) => write!(f, "Invalid column: {c}"),
            StoreError::UnknownField(c) => write!(f, "Unknown field: {c}"),
            StoreError::InvalidId(id) => write!(f, "Invalid id: {id}"),
            StoreError::Decode(msg) => write!(f, "Failed to decode row: {msg}"),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<FormError> for StoreError {
    fn from(err: FormError) -> Self {
        StoreError::Database(err)
    }
}

/// Parse a record id.
pub fn parse_id(id: &str) -> Result<Uuid, StoreError> {
    Uuid::parse_str(id.trim()).map_err(|_| StoreError::InvalidId(id.to_string()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

/// Pagination, ordering and equality filters for [`FormStore::get_form_data`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ListOptions {
    pub limit: u64,
    pub offset: u64,
    pub sort_by: String,
    pub sort_order: SortOrder,
    pub filters: Map<String, Value>,
}

impl Default for ListOptions {
    fn default() -> Self {
        Self {
            limit: DEFAULT_PAGE_SIZE,
            offset: 0,
            sort_by: CREATED_AT_COLUMN.to_string(),
            sort_order: SortOrder::Desc,
            filters: Map::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InsertedRecord {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One stored row: managed columns plus the field values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormRecord {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(flatten)]
    pub values: Map<String, Value>,
}

impl FormRecord {
    pub fn from_row(row: &Row) -> Result<Self, StoreError> {
        let mut values = row_to_json(row)?;
        let id = row
            .try_get::<&str, Uuid>(ID_COLUMN)
            .map_err(|e| StoreError::Decode(format!("id: {e}")))?;
        let created_at = row
            .try_get::<&str, DateTime<Utc>>(CREATED_AT_COLUMN)
            .map_err(|e| StoreError::Decode(format!("created_at: {e}")))?;
        let updated_at = row
            .try_get::<&str, DateTime<Utc>>(UPDATED_AT_COLUMN)
            .map_err(|e| StoreError::Decode(format!("updated_at: {e}")))?;
        for managed in [ID_COLUMN, CREATED_AT_COLUMN, UPDATED_AT_COLUMN] {
            values.remove(managed);
        }
        Ok(Self {
            id,
            created_at,
            updated_at,
            values,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page {
    pub rows: Vec<FormRecord>,
    pub total: u64,
    pub limit: u64,
    pub offset: u64,
}

/// CRUD over one form's table.
pub struct FormStore<'a, E: FormExecutor + ?Sized> {
    config: &'a FormConfiguration,
    executor: &'a E,
    ddl: DdlScript,
}

impl<'a, E: FormExecutor + ?Sized> FormStore<'a, E> {
    pub fn new(config: &'a FormConfiguration, executor: &'a E) -> Self {
        Self {
            config,
            executor,
            ddl: generate_create_table_sql(config),
        }
    }

    pub fn config(&self) -> &FormConfiguration {
        self.config
    }

    fn table(&self) -> &str {
        &self.config.postgres_table_name
    }

    /// Create the table, indexes and trigger if they do not exist.
    pub fn ensure_table(&self) -> Result<(), StoreError> {
        self.ddl.execute(self.executor)?;
        Ok(())
    }

    /// Insert a record. Keys must be configured fields; the table is ensured
    /// first on every call.
    pub fn insert(&self, data: &Map<String, Value>) -> Result<InsertedRecord, StoreError> {
        self.ensure_table()?;

        let mut columns = vec![iden(CREATED_AT_COLUMN), iden(UPDATED_AT_COLUMN)];
        let mut values = vec![Expr::cust("NOW()"), Expr::cust("NOW()")];
        for (key, value) in data {
            let column = self.field_column(key)?;
            columns.push(iden(key));
            values.push(bind_value(value, &column)?);
        }

        let mut query = Query::insert();
        query
            .into_table(iden(self.table()))
            .columns(columns)
            .values(values)
            .map_err(|e| FormError::QueryError(e.to_string()))?;
        query.returning(Query::returning().columns([
            iden(ID_COLUMN),
            iden(CREATED_AT_COLUMN),
            iden(UPDATED_AT_COLUMN),
        ]));

        let rows = query_rows(self.executor, &query)?;
        let row = rows
            .first()
            .ok_or_else(|| StoreError::Decode("INSERT returned no row".to_string()))?;
        let record = FormRecord::from_row(row)?;
        log::debug!("Inserted {} into \"{}\"", record.id, self.table());
        Ok(InsertedRecord {
            id: record.id,
            created_at: record.created_at,
            updated_at: record.updated_at,
        })
    }

    /// Paginated list with equality filters and a total count.
    pub fn get_form_data(&self, options: &ListOptions) -> Result<Page, StoreError> {
        if !self.config.is_known_column(&options.sort_by) {
            return Err(StoreError::InvalidColumn(options.sort_by.clone()));
        }

        let mut count = Query::select();
        count.expr(Expr::cust("COUNT(*)")).from(iden(self.table()));
        self.apply_filters(&mut count, &options.filters)?;
        let total = query_rows(self.executor, &count)?
            .first()
            .map(|row| row.try_get::<usize, i64>(0))
            .transpose()
            .map_err(|e| StoreError::Decode(format!("count: {e}")))?
            .unwrap_or(0);

        let order = match options.sort_order {
            SortOrder::Asc => Order::Asc,
            SortOrder::Desc => Order::Desc,
        };
        let mut select = Query::select();
        select
            .column(Asterisk)
            .from(iden(self.table()))
            .order_by(iden(&options.sort_by), order.clone())
            .order_by(iden(ID_COLUMN), order)
            .limit(options.limit)
            .offset(options.offset);
        self.apply_filters(&mut select, &options.filters)?;

        let rows = query_rows(self.executor, &select)?
            .iter()
            .map(FormRecord::from_row)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Page {
            rows,
            total: u64::try_from(total).unwrap_or(0),
            limit: options.limit,
            offset: options.offset,
        })
    }

    pub fn get_by_id(&self, id: Uuid) -> Result<Option<FormRecord>, StoreError> {
        let mut select = Query::select();
        select
            .column(Asterisk)
            .from(iden(self.table()))
            .and_where(Expr::col(iden(ID_COLUMN)).eq(self.bind_id(id)?));
        query_rows(self.executor, &select)?
            .first()
            .map(FormRecord::from_row)
            .transpose()
    }

    /// Partial update. Only keys present in `data` change; `updated_at` is
    /// always refreshed. Returns `None` if no row has this id.
    pub fn update(&self, id: Uuid, data: &Map<String, Value>) -> Result<Option<FormRecord>, StoreError> {
        let mut query = Query::update();
        query
            .table(iden(self.table()))
            .value(iden(UPDATED_AT_COLUMN), Expr::cust("NOW()"));
        for (key, value) in data {
            let column = self.field_column(key)?;
            query.value(iden(key), bind_value(value, &column)?);
        }
        query
            .and_where(Expr::col(iden(ID_COLUMN)).eq(self.bind_id(id)?))
            .returning_all();

        query_rows(self.executor, &query)?
            .first()
            .map(FormRecord::from_row)
            .transpose()
    }

    /// Hard delete. `false` when no row had this id.
    pub fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut query = Query::delete();
        query
            .from_table(iden(self.table()))
            .and_where(Expr::col(iden(ID_COLUMN)).eq(self.bind_id(id)?));
        let affected = execute_statement(self.executor, &query)?;
        Ok(affected > 0)
    }

    fn field_column(&self, name: &str) -> Result<ColumnType, StoreError> {
        self.config
            .field(name)
            .map(|f| f.column_type())
            .ok_or_else(|| StoreError::UnknownField(name.to_string()))
    }

    fn column_type(&self, name: &str) -> Result<ColumnType, StoreError> {
        match name {
            ID_COLUMN => Ok(ColumnType::of(PgType::Uuid)),
            CREATED_AT_COLUMN | UPDATED_AT_COLUMN => Ok(ColumnType::of(PgType::Timestamptz)),
            _ => self
                .field_column(name)
                .map_err(|_| StoreError::InvalidColumn(name.to_string())),
        }
    }

    fn bind_id(&self, id: Uuid) -> Result<Expr, StoreError> {
        Ok(bind_text(Some(id.to_string()), &ColumnType::of(PgType::Uuid))?)
    }

    fn apply_filters(&self, select: &mut SelectStatement, filters: &Map<String, Value>) -> Result<(), StoreError> {
        for (key, value) in filters {
            let column = self.column_type(key)?;
            let condition = match value {
                Value::Null => Expr::col(iden(key)).is_null(),
                value => Expr::col(iden(key)).eq(bind_value(value, &column)?),
            };
            select.and_where(condition);
        }
        Ok(())
    }
}
