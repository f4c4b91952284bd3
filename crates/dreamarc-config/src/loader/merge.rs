//! JSON merge helpers for layered configuration.

use serde_json::Value;

/// Merge overlay values into the base, recursively overriding objects.
///
/// A `null` in the overlay removes the key so the field falls back to its
/// default.
pub(super) fn merge_json_values(base: &mut Value, overlay: &Value) {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, value) in overlay_map {
                if value.is_null() {
                    base_map.remove(key);
                    continue;
                }
                match base_map.get_mut(key) {
                    Some(existing) => merge_json_values(existing, value),
                    None => {
                        base_map.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (base_slot, overlay_value) => {
            *base_slot = overlay_value.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::merge_json_values;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn nested_objects_merge_key_by_key() {
        let mut base = json!({ "backend": { "base_url": "http://a", "timeout_secs": 5 } });
        merge_json_values(&mut base, &json!({ "backend": { "timeout_secs": 9 } }));
        assert_eq!(
            base,
            json!({ "backend": { "base_url": "http://a", "timeout_secs": 9 } })
        );
    }

    #[test]
    fn null_overlay_clears_key() {
        let mut base = json!({ "speech": { "output_path": "/tmp/a.mp3" } });
        merge_json_values(&mut base, &json!({ "speech": { "output_path": null } }));
        assert_eq!(base, json!({ "speech": {} }));
    }
}
