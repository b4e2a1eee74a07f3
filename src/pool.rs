//! Fixed-size connection pool.
//!
//! `FormPool` opens `max_connections` persistent `may_postgres` connections at
//! startup and hands statements to them round-robin. There is no global pool:
//! callers open one explicitly and close it when they are done.

use crate::config::DatabaseConfig;
use crate::connection::{connect, validate_connection_string, with_connect_timeout, ConnectionError};
use crate::executor::{FormError, FormExecutor, MayPostgresExecutor};
use may_postgres::types::ToSql;
use may_postgres::Row;
use std::sync::atomic::{AtomicUsize, Ordering};

pub struct FormPool {
    connections: Vec<MayPostgresExecutor>,
    next: AtomicUsize,
}

impl FormPool {
    /// Open every connection up front. A `max_connections` of 0 is treated
    /// as 1.
    ///
    /// # Errors
    ///
    /// Returns the first connection failure; connections already opened are
    /// dropped.
    pub fn open(config: &DatabaseConfig) -> Result<Self, ConnectionError> {
        validate_connection_string(&config.url)?;
        let size = config.max_connections.max(1);
        let url = with_connect_timeout(&config.url, config.connect_timeout_seconds);
        let connections = (0..size)
            .map(|_| connect(&url).map(MayPostgresExecutor::new))
            .collect::<Result<Vec<_>, _>>()?;
        log::info!("Opened connection pool with {size} connection(s)");
        Ok(Self::from_executors(connections))
    }

    /// Build a pool over already-open executors.
    pub fn from_executors(connections: Vec<MayPostgresExecutor>) -> Self {
        Self {
            connections,
            next: AtomicUsize::new(0),
        }
    }

    pub fn size(&self) -> usize {
        self.connections.len()
    }

    /// The connection the next statement will use.
    pub fn acquire(&self) -> Result<&MayPostgresExecutor, FormError> {
        if self.connections.is_empty() {
            return Err(FormError::Other("Connection pool is closed or empty".to_string()));
        }
        let idx = self.next.fetch_add(1, Ordering::Relaxed) % self.connections.len();
        Ok(&self.connections[idx])
    }

    /// Health-check every connection; returns the number that answered.
    pub fn check_health(&self) -> usize {
        self.connections
            .iter()
            .filter(|c| matches!(c.check_health(), Ok(true)))
            .count()
    }

    /// Close all connections.
    pub fn close(self) {
        let count = self.connections.len();
        drop(self.connections);
        log::info!("Closed connection pool ({count} connection(s))");
    }
}

impl FormExecutor for FormPool {
    fn execute(&self, query: &str, params: &[&dyn ToSql]) -> Result<u64, FormError> {
        self.acquire()?.execute(query, params)
    }

    fn query_one(&self, query: &str, params: &[&dyn ToSql]) -> Result<Row, FormError> {
        self.acquire()?.query_one(query, params)
    }

    fn query_all(&self, query: &str, params: &[&dyn ToSql]) -> Result<Vec<Row>, FormError> {
        self.acquire()?.query_all(query, params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_pool_reports_error() {
        let pool = FormPool::from_executors(Vec::new());
        assert_eq!(pool.size(), 0);
        let err = pool.execute("SELECT 1", &[]).unwrap_err();
        assert!(err.to_string().contains("closed or empty"));
        assert_eq!(pool.check_health(), 0);
        pool.close();
    }

    #[test]
    fn test_open_rejects_invalid_url() {
        let config = DatabaseConfig {
            url: "not a url".to_string(),
            max_connections: 0,
            connect_timeout_seconds: 1,
        };
        assert!(matches!(
            FormPool::open(&config),
            Err(ConnectionError::InvalidConnectionString(_))
        ));
    }
}
