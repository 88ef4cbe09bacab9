//! Stateless cursor pagination.
//!
//! A page is every record with `tm_create` strictly before the token, newest
//! first, ties broken by id. The `tm_create` of the last row of a page is the
//! token of the next one.

use std::collections::BTreeMap;

use super::{RepositoryError, Result};
use crate::time::DEFAULT_TIMESTAMP;

/// Filter key restricting a listing to live (or all) records.
pub const DELETED_FILTER: &str = "deleted";

/// Parameters of a list call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    pub size: u64,
    /// `tm_create` upper bound (exclusive). Empty means now.
    pub token: String,
    /// Equality filters, combined with AND.
    pub filters: BTreeMap<String, String>,
}

impl ListQuery {
    pub fn new(size: u64) -> Self {
        Self {
            size,
            ..Self::default()
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = token.into();
        self
    }

    pub fn with_filter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.insert(key.into(), value.into());
        self
    }

    /// Shorthand for `deleted=false`.
    pub fn live_only(self) -> Self {
        self.with_filter(DELETED_FILTER, "false")
    }
}

/// SQL text plus positional text parameters of a list query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListStatement {
    pub sql: String,
    pub params: Vec<String>,
}

/// Appends the WHERE / ORDER BY / LIMIT suffix of a list call to `select`.
///
/// Only columns named in `filterable` may be filtered on; anything else is
/// rejected with `InvalidFilter` rather than interpolated into SQL.
/// `deleted=false` keeps rows whose `tm_delete` is still the sentinel; any
/// other value of `deleted` imposes no constraint.
pub fn build_list_statement(
    select: &str,
    filterable: &[&str],
    query: &ListQuery,
    now: &str,
) -> Result<ListStatement> {
    let token = if query.token.is_empty() {
        now.to_string()
    } else {
        query.token.clone()
    };

    let mut sql = format!("{} WHERE tm_create < ?", select.trim_end());
    let mut params = vec![token];

    for (key, value) in &query.filters {
        if key == DELETED_FILTER {
            if value == "false" {
                sql.push_str(" AND tm_delete >= ?");
                params.push(DEFAULT_TIMESTAMP.to_string());
            }
            continue;
        }

        if !filterable.contains(&key.as_str()) {
            return Err(RepositoryError::InvalidFilter(key.clone()));
        }

        sql.push_str(&format!(" AND {} = ?", key));
        params.push(value.clone());
    }

    sql.push_str(&format!(" ORDER BY tm_create DESC, id DESC LIMIT {}", query.size));

    Ok(ListStatement { sql, params })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SELECT: &str = "SELECT id, name, tm_create FROM accounts";
    const NOW: &str = "2024-05-01 10:00:00.000000";

    #[test]
    fn test_empty_token_defaults_to_now() {
        let statement = build_list_statement(SELECT, &[], &ListQuery::new(10), NOW).unwrap();

        assert_eq!(
            statement.sql,
            "SELECT id, name, tm_create FROM accounts WHERE tm_create < ? \
             ORDER BY tm_create DESC, id DESC LIMIT 10"
        );
        assert_eq!(statement.params, vec![NOW.to_string()]);
    }

    #[test]
    fn test_token_and_filters_are_bound() {
        let query = ListQuery::new(5)
            .with_token("2024-04-01 00:00:00.000000")
            .with_filter("customer_id", "c-1")
            .with_filter("name", "main");

        let statement =
            build_list_statement(SELECT, &["customer_id", "name"], &query, NOW).unwrap();

        assert_eq!(
            statement.sql,
            "SELECT id, name, tm_create FROM accounts WHERE tm_create < ? \
             AND customer_id = ? AND name = ? ORDER BY tm_create DESC, id DESC LIMIT 5"
        );
        assert_eq!(
            statement.params,
            vec!["2024-04-01 00:00:00.000000", "c-1", "main"]
        );
    }

    #[test]
    fn test_deleted_false_restricts_to_live_rows() {
        let query = ListQuery::new(10).live_only();

        let statement = build_list_statement(SELECT, &[], &query, NOW).unwrap();

        assert!(statement.sql.contains("AND tm_delete >= ?"));
        assert_eq!(statement.params[1], DEFAULT_TIMESTAMP);
    }

    #[test]
    fn test_deleted_true_imposes_no_constraint() {
        let query = ListQuery::new(10).with_filter(DELETED_FILTER, "true");

        let statement = build_list_statement(SELECT, &[], &query, NOW).unwrap();

        assert!(!statement.sql.contains("tm_delete"));
        assert_eq!(statement.params.len(), 1);
    }

    #[test]
    fn test_unknown_filter_is_rejected() {
        let query = ListQuery::new(10).with_filter("name; DROP TABLE accounts", "x");

        let result = build_list_statement(SELECT, &["name"], &query, NOW);

        assert_eq!(
            result,
            Err(RepositoryError::InvalidFilter(
                "name; DROP TABLE accounts".to_string()
            ))
        );
    }
}
