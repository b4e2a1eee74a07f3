//! The `setup`, `test` and `sql` commands.

use crate::error::{DbToolError, Result};
use formforge::ddl::quote_ident;
use formforge::{generate_create_table_sql, query_value, FormExecutor, FormPool, FormRegistry};
use std::sync::Arc;

/// Outcome of provisioning one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetupReport {
    pub table: String,
    pub statements: usize,
}

/// Run the DDL script of every form, in registry order. Stops at the first
/// failing table.
pub fn setup<E: FormExecutor + ?Sized>(registry: &FormRegistry, executor: &E) -> Result<Vec<SetupReport>> {
    let mut reports = Vec::with_capacity(registry.len());
    for config in registry.iter() {
        let script = generate_create_table_sql(config);
        script.execute(executor).map_err(|source| DbToolError::Setup {
            table: script.table().to_string(),
            source,
        })?;
        log::info!("Table \"{}\" is ready", script.table());
        reports.push(SetupReport {
            table: script.table().to_string(),
            statements: script.statements().len(),
        });
    }
    Ok(reports)
}

/// The DDL of every form as one SQL text, each script preceded by a comment
/// naming its form.
pub fn sql(registry: &FormRegistry) -> String {
    registry
        .iter()
        .map(|config| {
            format!(
                "-- {} ({})\n{}",
                config.title,
                config.table_name(),
                generate_create_table_sql(config).to_sql()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Row count of one configured table; `None` when it has not been created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableStatus {
    pub table: String,
    pub rows: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestReport {
    pub server_version: String,
    pub healthy_connections: usize,
    pub pool_size: usize,
    pub concurrent_queries: usize,
    pub tables: Vec<TableStatus>,
}

/// Health-check the pool, run `concurrency` `SELECT 1` queries from separate
/// coroutines, and count the rows of each configured table.
pub fn test_database(pool: Arc<FormPool>, registry: &FormRegistry, concurrency: usize) -> Result<TestReport> {
    let healthy = pool.check_health();
    if healthy == 0 {
        return Err(DbToolError::HealthCheck("no connection answered".to_string()));
    }
    let server_version: String = query_value(pool.as_ref(), "SELECT version()", &[])?;

    let handles: Vec<_> = (0..concurrency)
        .map(|_| {
            let pool = Arc::clone(&pool);
            may::go!(move || query_value::<i32, _>(pool.as_ref(), "SELECT 1", &[]))
        })
        .collect();
    for handle in handles {
        let value = handle
            .join()
            .map_err(|_| DbToolError::HealthCheck("query coroutine panicked".to_string()))??;
        if value != 1 {
            return Err(DbToolError::HealthCheck(format!("SELECT 1 returned {value}")));
        }
    }

    let tables = registry
        .iter()
        .map(|config| table_status(pool.as_ref(), config.table_name()))
        .collect::<Result<Vec<_>>>()?;

    Ok(TestReport {
        server_version,
        healthy_connections: healthy,
        pool_size: pool.size(),
        concurrent_queries: concurrency,
        tables,
    })
}

fn table_status<E: FormExecutor + ?Sized>(executor: &E, table: &str) -> Result<TableStatus> {
    let exists: bool = query_value(executor, "SELECT to_regclass($1) IS NOT NULL", &[&quote_ident(table)])?;
    let rows = if exists {
        let count: i64 = query_value(
            executor,
            &format!("SELECT COUNT(*) FROM {}", quote_ident(table)),
            &[],
        )?;
        Some(count)
    } else {
        None
    };
    Ok(TableStatus {
        table: table.to_string(),
        rows,
    })
}
