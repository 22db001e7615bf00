//! Change detection between a stored snapshot and a live request.

use serde_json::Value;

use crate::models::{ExcludedField, Request, Snapshot};

/// Whether `new` differs from `old` on any field that matters.
///
/// Only the fields present on `old` are compared, so a field added to the
/// request schema after `old` was captured never counts as a change by
/// itself. Excluded fields are skipped. A missing baseline is a change.
pub fn has_changed(old: Option<&Snapshot>, new: &Request) -> bool {
    let Some(old) = old else {
        return true;
    };

    let new_fields = match new.to_fields() {
        Ok(fields) => fields,
        Err(e) => {
            tracing::warn!("Could not serialize request {} for diffing: {}", new.id, e);
            return true;
        }
    };

    old.fields()
        .filter(|(field, _)| !ExcludedField::contains(field))
        .any(|(field, old_value)| new_fields.get(field).unwrap_or(&Value::Null) != old_value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewRequest, RequestHeader};
    use serde_json::json;

    fn request() -> Request {
        Request::from_new(NewRequest {
            name: Some("A".to_string()),
            url: Some("http://x".to_string()),
            ..Default::default()
        })
    }

    #[test]
    fn test_missing_baseline_is_changed() {
        assert!(has_changed(None, &request()));
    }

    #[test]
    fn test_identical_request_is_unchanged() {
        let r = request();
        let snapshot = Snapshot::capture(&r).unwrap();
        assert!(!has_changed(Some(&snapshot), &r));
    }

    #[test]
    fn test_semantic_field_change_is_detected() {
        let mut r = request();
        let snapshot = Snapshot::capture(&r).unwrap();

        r.url = "http://y".to_string();
        assert!(has_changed(Some(&snapshot), &r));
    }

    #[test]
    fn test_nested_change_is_detected() {
        let mut r = request();
        r.headers.push(RequestHeader {
            name: "Accept".to_string(),
            value: "text/plain".to_string(),
            disabled: false,
        });
        let snapshot = Snapshot::capture(&r).unwrap();

        r.headers[0].disabled = true;
        assert!(has_changed(Some(&snapshot), &r));
    }

    #[test]
    fn test_excluded_fields_are_ignored() {
        let mut r = request();
        let snapshot = Snapshot::capture(&r).unwrap();

        r.name = "B".to_string();
        r.description = "changed".to_string();
        r.modified += 1_000;
        r.meta_sort_key = 42.0;
        r.parent_id = Some("wrk_other".to_string());
        assert!(!has_changed(Some(&snapshot), &r));
    }

    #[test]
    fn test_field_absent_from_old_snapshot_is_not_inspected() {
        let mut r = request();
        let mut old = r.to_fields().unwrap();
        old.remove("settingFollowRedirects");
        let snapshot = Snapshot::from_value(Value::Object(old)).unwrap();

        r.setting_follow_redirects = crate::models::FollowRedirects::Off;
        assert!(!has_changed(Some(&snapshot), &r));

        r.url = "http://y".to_string();
        assert!(has_changed(Some(&snapshot), &r));
    }

    #[test]
    fn test_field_only_on_old_snapshot_compares_against_null() {
        let r = request();
        let mut old = r.to_fields().unwrap();
        old.insert("legacyField".to_string(), json!("value"));
        let snapshot = Snapshot::from_value(Value::Object(old)).unwrap();
        assert!(has_changed(Some(&snapshot), &r));

        let mut old = r.to_fields().unwrap();
        old.insert("legacyField".to_string(), Value::Null);
        let snapshot = Snapshot::from_value(Value::Object(old)).unwrap();
        assert!(!has_changed(Some(&snapshot), &r));
    }
}
