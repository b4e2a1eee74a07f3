//! Observability hooks.
//!
//! With the `tracing` feature enabled, connection acquisition, statement
//! execution and table provisioning are wrapped in `tracing` spans so a
//! subscriber installed by the host application can time them.

#[cfg(feature = "tracing")]
pub mod tracing_helpers {
    use tracing::{info_span, Span};

    /// Longest statement prefix recorded on a span.
    const MAX_STATEMENT_LEN: usize = 120;

    pub fn acquire_connection_span() -> Span {
        info_span!("formforge.acquire_connection")
    }

    pub fn execute_query_span(query: &str) -> Span {
        info_span!("formforge.execute", statement = %truncate(query))
    }

    pub fn ensure_table_span(table: &str) -> Span {
        info_span!("formforge.ensure_table", table = %table)
    }

    fn truncate(query: &str) -> &str {
        match query.char_indices().nth(MAX_STATEMENT_LEN) {
            Some((idx, _)) => &query[..idx],
            None => query,
        }
    }

}
