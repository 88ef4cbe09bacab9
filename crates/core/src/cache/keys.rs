use crate::record::Keyed;

/// Returns the cache key of a record's primary slot.
pub fn record_key<K: Keyed>(id: &K::Id) -> String {
    format!("{}:{}", K::NAMESPACE, id)
}

/// Returns the cache key of a secondary slot (e.g. `customer:email:a@b.c`).
pub fn secondary_key(namespace: &str, field: &str, value: &str) -> String {
    format!("{}:{}:{}", namespace, field, value)
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;
    use crate::models::{Channel, Queue};

    #[test]
    fn test_record_key_uses_namespace() {
        let id = Uuid::parse_str("7a2cd4f4-33b8-4c0c-9a52-1f6d0c9b2a11").unwrap();
        assert_eq!(
            record_key::<Queue>(&id),
            "queue:7a2cd4f4-33b8-4c0c-9a52-1f6d0c9b2a11"
        );
    }

    #[test]
    fn test_record_key_with_string_id() {
        assert_eq!(
            record_key::<Channel>(&"1700000000.42".to_string()),
            "channel:1700000000.42"
        );
    }

    #[test]
    fn test_secondary_key_format() {
        assert_eq!(
            secondary_key("customer", "email", "ops@example.com"),
            "customer:email:ops@example.com"
        );
    }
}
