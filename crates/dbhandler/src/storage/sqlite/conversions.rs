//! SQLite row conversion functions.
//!
//! Pure functions for converting between SQLite rows and domain types.
//! Structured columns are JSON text; a NULL, empty or `null` column decodes to
//! the empty collection so callers never see absent lists.

use rusqlite::types::Type;
use rusqlite::Row;
use serde::{de::DeserializeOwned, Serialize};
use uuid::Uuid;

use dbhandler_core::models::{Account, Call, Channel, Customer, Queue, SipAuth};
use dbhandler_core::storage::RepositoryError;

// ============================================================================
// Column encoding
// ============================================================================

/// Encodes a structured value as a JSON column.
pub fn json_to_sql<T: Serialize>(value: &T) -> Result<String, RepositoryError> {
    serde_json::to_string(value).map_err(|e| RepositoryError::Marshal(e.to_string()))
}

/// Encodes a unit-like enum as its serde name (`"ringing"`, `"sip-service"`, ...).
pub fn enum_to_sql<T: Serialize>(value: &T) -> Result<String, RepositoryError> {
    match serde_json::to_value(value) {
        Ok(serde_json::Value::String(name)) => Ok(name),
        Ok(other) => Err(RepositoryError::Marshal(format!(
            "expected a string variant, got {other}"
        ))),
        Err(e) => Err(RepositoryError::Marshal(e.to_string())),
    }
}

// ============================================================================
// Column decoding
// ============================================================================

fn conversion_failure(column: &str, err: impl std::fmt::Display) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(0, Type::Text, format!("{column}: {err}").into())
}

/// Parses a UUID column. An empty string reads as the nil UUID.
fn uuid_column(row: &Row, column: &str) -> rusqlite::Result<Uuid> {
    let raw: String = row.get(column)?;
    if raw.is_empty() {
        return Ok(Uuid::nil());
    }
    Uuid::parse_str(&raw).map_err(|e| conversion_failure(column, e))
}

fn enum_column<T: DeserializeOwned>(row: &Row, column: &str) -> rusqlite::Result<T> {
    let raw: String = row.get(column)?;
    serde_json::from_value(serde_json::Value::String(raw)).map_err(|e| conversion_failure(column, e))
}

/// Decodes a JSON column, normalizing NULL, `''` and `null` to `T::default()`.
fn json_column<T: DeserializeOwned + Default>(row: &Row, column: &str) -> rusqlite::Result<T> {
    let raw: Option<String> = row.get(column)?;
    match raw {
        Some(text) if !text.trim().is_empty() => serde_json::from_str::<Option<T>>(&text)
            .map(Option::unwrap_or_default)
            .map_err(|e| conversion_failure(column, e)),
        _ => Ok(T::default()),
    }
}

// ============================================================================
// Row conversions
// ============================================================================

pub fn row_to_account(row: &Row) -> rusqlite::Result<Account> {
    Ok(Account {
        id: uuid_column(row, "id")?,
        customer_id: uuid_column(row, "customer_id")?,
        name: row.get("name")?,
        detail: row.get("detail")?,
        balance: row.get("balance")?,
        tm_create: row.get("tm_create")?,
        tm_update: row.get("tm_update")?,
        tm_delete: row.get("tm_delete")?,
    })
}

pub fn row_to_customer(row: &Row) -> rusqlite::Result<Customer> {
    Ok(Customer {
        id: uuid_column(row, "id")?,
        name: row.get("name")?,
        detail: row.get("detail")?,
        email: row.get("email")?,
        phone_number: row.get("phone_number")?,
        address: row.get("address")?,
        billing_account_id: uuid_column(row, "billing_account_id")?,
        tm_create: row.get("tm_create")?,
        tm_update: row.get("tm_update")?,
        tm_delete: row.get("tm_delete")?,
    })
}

pub fn row_to_queue(row: &Row) -> rusqlite::Result<Queue> {
    Ok(Queue {
        id: uuid_column(row, "id")?,
        customer_id: uuid_column(row, "customer_id")?,
        name: row.get("name")?,
        detail: row.get("detail")?,
        routing_method: enum_column(row, "routing_method")?,
        tag_ids: json_column(row, "tag_ids")?,
        wait_actions: json_column(row, "wait_actions")?,
        wait_timeout: row.get("wait_timeout")?,
        service_timeout: row.get("service_timeout")?,
        wait_queuecall_ids: json_column(row, "wait_queuecall_ids")?,
        service_queuecall_ids: json_column(row, "service_queuecall_ids")?,
        total_incoming_count: row.get("total_incoming_count")?,
        total_serviced_count: row.get("total_serviced_count")?,
        total_abandoned_count: row.get("total_abandoned_count")?,
        total_wait_duration: row.get("total_wait_duration")?,
        total_service_duration: row.get("total_service_duration")?,
        tm_create: row.get("tm_create")?,
        tm_update: row.get("tm_update")?,
        tm_delete: row.get("tm_delete")?,
    })
}

pub fn row_to_call(row: &Row) -> rusqlite::Result<Call> {
    Ok(Call {
        id: uuid_column(row, "id")?,
        customer_id: uuid_column(row, "customer_id")?,
        channel_id: row.get("channel_id")?,
        bridge_id: row.get("bridge_id")?,
        flow_id: uuid_column(row, "flow_id")?,
        call_type: enum_column(row, "type")?,
        status: enum_column(row, "status")?,
        direction: enum_column(row, "direction")?,
        source: json_column(row, "source")?,
        destination: json_column(row, "destination")?,
        data: json_column(row, "data")?,
        master_call_id: uuid_column(row, "master_call_id")?,
        chained_call_ids: json_column(row, "chained_call_ids")?,
        recording_id: uuid_column(row, "recording_id")?,
        recording_ids: json_column(row, "recording_ids")?,
        hangup_by: enum_column(row, "hangup_by")?,
        hangup_reason: enum_column(row, "hangup_reason")?,
        tm_ringing: row.get("tm_ringing")?,
        tm_progressing: row.get("tm_progressing")?,
        tm_hangup: row.get("tm_hangup")?,
        tm_create: row.get("tm_create")?,
        tm_update: row.get("tm_update")?,
        tm_delete: row.get("tm_delete")?,
    })
}

pub fn row_to_channel(row: &Row) -> rusqlite::Result<Channel> {
    Ok(Channel {
        id: row.get("id")?,
        name: row.get("name")?,
        tech: row.get("tech")?,
        bridge_id: row.get("bridge_id")?,
        stasis_name: row.get("stasis_name")?,
        state: enum_column(row, "state")?,
        data: json_column(row, "data")?,
        hangup_cause: row.get("hangup_cause")?,
        tm_answer: row.get("tm_answer")?,
        tm_ringing: row.get("tm_ringing")?,
        tm_end: row.get("tm_end")?,
        tm_create: row.get("tm_create")?,
        tm_update: row.get("tm_update")?,
        tm_delete: row.get("tm_delete")?,
    })
}

pub fn row_to_sip_auth(row: &Row) -> rusqlite::Result<SipAuth> {
    Ok(SipAuth {
        id: uuid_column(row, "id")?,
        auth_types: json_column(row, "auth_types")?,
        realm: row.get("realm")?,
        username: row.get("username")?,
        password: row.get("password")?,
        allowed_ips: json_column(row, "allowed_ips")?,
        tm_create: row.get("tm_create")?,
        tm_update: row.get("tm_update")?,
    })
}

#[cfg(test)]
mod tests {
    use dbhandler_core::models::{CallStatus, HangupReason, RoutingMethod};

    use super::*;

    #[test]
    fn test_enum_to_sql_uses_serde_name() {
        assert_eq!(enum_to_sql(&CallStatus::Progressing).unwrap(), "progressing");
        assert_eq!(enum_to_sql(&HangupReason::NoAnswer).unwrap(), "noanswer");
        assert_eq!(enum_to_sql(&RoutingMethod::None).unwrap(), "");
    }

    #[test]
    fn test_enum_to_sql_rejects_structured_values() {
        let result = enum_to_sql(&vec![1, 2]);
        assert!(matches!(result, Err(RepositoryError::Marshal(_))));
    }

    #[test]
    fn test_json_to_sql_encodes_lists() {
        let ids = vec![Uuid::nil()];
        assert_eq!(
            json_to_sql(&ids).unwrap(),
            r#"["00000000-0000-0000-0000-000000000000"]"#
        );
    }

    fn decode_tag_ids(raw: Option<&str>) -> rusqlite::Result<Vec<Uuid>> {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        conn.query_row("SELECT ?1 AS tag_ids", [raw], |row| {
            json_column::<Vec<Uuid>>(row, "tag_ids")
        })
    }

    #[test]
    fn test_json_column_normalizes_missing_values() {
        assert!(decode_tag_ids(None).unwrap().is_empty());
        assert!(decode_tag_ids(Some("")).unwrap().is_empty());
        assert!(decode_tag_ids(Some("null")).unwrap().is_empty());
        assert!(decode_tag_ids(Some("[]")).unwrap().is_empty());
    }

    #[test]
    fn test_json_column_decodes_values() {
        let ids = decode_tag_ids(Some(r#"["00000000-0000-0000-0000-000000000000"]"#)).unwrap();
        assert_eq!(ids, vec![Uuid::nil()]);
    }

    #[test]
    fn test_json_column_rejects_malformed_json() {
        let result = decode_tag_ids(Some("[not json"));
        assert!(matches!(
            result,
            Err(rusqlite::Error::FromSqlConversionFailure(..))
        ));
    }
}
