use serde::{Deserialize, Deserializer};

/// Deserializes a PATCH-style field into a double option:
/// - absent from the JSON → `None` (keep the stored value)
/// - present as `null` → `Some(None)` (clear the value)
/// - present with a value → `Some(Some(value))`
///
/// Used by update payloads (e.g. clearing a module's assignee) where plain
/// `Option<T>` cannot tell "omitted" and "set to null" apart.
pub fn deserialize_optional_nullable<'de, D, T>(
    deserializer: D,
) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Patch {
        #[serde(default, deserialize_with = "super::deserialize_optional_nullable")]
        assignee_id: Option<Option<u32>>,
    }

    #[test]
    fn distinguishes_absent_null_and_value() {
        let absent: Patch = serde_json::from_str("{}").unwrap();
        assert_eq!(absent.assignee_id, None);

        let cleared: Patch = serde_json::from_str(r#"{"assignee_id": null}"#).unwrap();
        assert_eq!(cleared.assignee_id, Some(None));

        let set: Patch = serde_json::from_str(r#"{"assignee_id": 7}"#).unwrap();
        assert_eq!(set.assignee_id, Some(Some(7)));
    }
}
