//! Database access for tests.
//!
//! Tests that need PostgreSQL read `TEST_DATABASE_URL`; when it is unset
//! [`TestDatabase::from_env`] returns `None` and the test skips itself.

use crate::connection::{connect, ConnectionError};
use crate::executor::{FormExecutor, MayPostgresExecutor};
use crate::ddl::quote_ident;

pub const TEST_DATABASE_URL_VAR: &str = "TEST_DATABASE_URL";

pub struct TestDatabase {
    url: String,
    executor: Option<MayPostgresExecutor>,
}

impl TestDatabase {
    /// `None` when `TEST_DATABASE_URL` is not set.
    pub fn from_env() -> Option<Self> {
        match std::env::var(TEST_DATABASE_URL_VAR) {
            Ok(url) if !url.trim().is_empty() => Some(Self { url, executor: None }),
            _ => {
                eprintln!("{TEST_DATABASE_URL_VAR} not set; skipping database test");
                None
            }
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Connect on first use and return the shared executor.
    pub fn executor(&mut self) -> Result<MayPostgresExecutor, ConnectionError> {
        if let Some(executor) = &self.executor {
            return Ok(executor.clone());
        }
        let executor = MayPostgresExecutor::new(connect(&self.url)?);
        self.executor = Some(executor.clone());
        Ok(executor)
    }

    /// Drop a table left over from an earlier run.
    pub fn drop_table(&mut self, table: &str) -> Result<(), ConnectionError> {
        let executor = self.executor()?;
        executor
            .execute(&format!("DROP TABLE IF EXISTS {} CASCADE", quote_ident(table)), &[])
            .map_err(|e| ConnectionError::Other(e.to_string()))?;
        Ok(())
    }
}

/// A table name unlikely to collide with parallel test runs.
pub fn unique_table_name(prefix: &str) -> String {
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!("{}_{}", prefix, &suffix[..12])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::is_valid_identifier;

    #[test]
    fn test_unique_table_name_is_identifier() {
        let name = unique_table_name("formforge_test");
        assert!(is_valid_identifier(&name));
        assert_ne!(name, unique_table_name("formforge_test"));
    }
}
