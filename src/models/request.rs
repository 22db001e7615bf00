//! Request model: the mutable entity whose history is recorded.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{generate_id, now_millis};
use crate::errors::AppError;

/// Model discriminator stored in `type`.
pub const REQUEST_TYPE: &str = "Request";

/// Id prefix for requests.
pub const REQUEST_ID_PREFIX: &str = "req";

/// Redirect policy for a single request.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum FollowRedirects {
    #[default]
    Global,
    On,
    Off,
}

/// A header sent with the request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RequestHeader {
    pub name: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub disabled: bool,
}

/// A query string or form parameter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RequestParameter {
    pub name: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub disabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
}

/// Request body. Which fields are set depends on the mime type.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct RequestBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Vec<RequestParameter>>,
}

/// A saved HTTP request definition.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub parent_id: Option<String>,
    pub created: i64,
    pub modified: i64,
    pub meta_sort_key: f64,
    pub name: String,
    pub description: String,
    pub url: String,
    pub method: String,
    #[serde(default)]
    pub body: RequestBody,
    #[serde(default)]
    pub parameters: Vec<RequestParameter>,
    #[serde(default)]
    pub headers: Vec<RequestHeader>,
    #[serde(default)]
    pub authentication: Map<String, Value>,
    #[serde(default)]
    pub is_private: bool,
    #[serde(default = "default_true")]
    pub setting_store_cookies: bool,
    #[serde(default = "default_true")]
    pub setting_send_cookies: bool,
    #[serde(default)]
    pub setting_disable_render_request_body: bool,
    #[serde(default = "default_true")]
    pub setting_encode_url: bool,
    #[serde(default = "default_true")]
    pub setting_rebuild_path: bool,
    #[serde(default)]
    pub setting_follow_redirects: FollowRedirects,
    /// Internal version for optimistic concurrency control. Not part of the
    /// serialized fields, so snapshots and diffs never see it.
    #[serde(skip)]
    pub version: i64,
}

fn default_true() -> bool {
    true
}

impl Request {
    /// Build a fresh request from creation input, assigning id and timestamps.
    pub fn from_new(new: NewRequest) -> Self {
        let now = now_millis();
        Self {
            id: generate_id(REQUEST_ID_PREFIX),
            kind: REQUEST_TYPE.to_string(),
            parent_id: new.parent_id,
            created: now,
            modified: now,
            meta_sort_key: new.meta_sort_key.unwrap_or(-(now as f64)),
            name: new.name.unwrap_or_else(|| "New Request".to_string()),
            description: new.description.unwrap_or_default(),
            url: new.url.unwrap_or_default(),
            method: new.method.unwrap_or_else(|| "GET".to_string()),
            body: new.body.unwrap_or_default(),
            parameters: new.parameters.unwrap_or_default(),
            headers: new.headers.unwrap_or_default(),
            authentication: new.authentication.unwrap_or_default(),
            is_private: new.is_private.unwrap_or(false),
            setting_store_cookies: true,
            setting_send_cookies: true,
            setting_disable_render_request_body: false,
            setting_encode_url: true,
            setting_rebuild_path: true,
            setting_follow_redirects: new.setting_follow_redirects.unwrap_or_default(),
            version: 1,
        }
    }

    /// Whether the discriminator names the request model.
    pub fn is_request_kind(&self) -> bool {
        self.kind == REQUEST_TYPE
    }

    /// All serialized fields of this request as a JSON object.
    pub fn to_fields(&self) -> Result<Map<String, Value>, AppError> {
        match serde_json::to_value(self)? {
            Value::Object(fields) => Ok(fields),
            other => Err(AppError::Internal(format!(
                "Request serialized to a non-object value: {}",
                other
            ))),
        }
    }

    /// Rebuild a request from a field map. The result has version 0.
    pub fn from_fields(fields: Map<String, Value>) -> Result<Self, AppError> {
        serde_json::from_value(Value::Object(fields))
            .map_err(|e| AppError::InvalidArgument(format!("Invalid request fields: {}", e)))
    }
}

/// Request body for creating a new request.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRequest {
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub body: Option<RequestBody>,
    #[serde(default)]
    pub parameters: Option<Vec<RequestParameter>>,
    #[serde(default)]
    pub headers: Option<Vec<RequestHeader>>,
    #[serde(default)]
    pub authentication: Option<Map<String, Value>>,
    #[serde(default)]
    pub meta_sort_key: Option<f64>,
    #[serde(default)]
    pub is_private: Option<bool>,
    #[serde(default)]
    pub setting_follow_redirects: Option<FollowRedirects>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_new_applies_defaults() {
        let request = Request::from_new(NewRequest {
            url: Some("http://x".to_string()),
            ..Default::default()
        });

        assert!(request.id.starts_with("req_"));
        assert!(request.is_request_kind());
        assert_eq!(request.name, "New Request");
        assert_eq!(request.method, "GET");
        assert_eq!(request.created, request.modified);
        assert!(request.meta_sort_key < 0.0);
        assert!(request.setting_send_cookies);
        assert_eq!(request.setting_follow_redirects, FollowRedirects::Global);
        assert_eq!(request.version, 1);
    }

    #[test]
    fn test_version_is_not_serialized() {
        let request = Request::from_new(NewRequest::default());
        assert!(!request.to_fields().unwrap().contains_key("version"));
    }

    #[test]
    fn test_serialized_field_names() {
        let request = Request::from_new(NewRequest::default());
        let fields = request.to_fields().unwrap();

        for key in ["_id", "type", "parentId", "metaSortKey", "settingFollowRedirects"] {
            assert!(fields.contains_key(key), "missing {}", key);
        }
        assert_eq!(fields["type"], json!("Request"));
        assert_eq!(fields["settingFollowRedirects"], json!("global"));
    }

    #[test]
    fn test_fields_round_trip() {
        let mut request = Request::from_new(NewRequest::default());
        request.headers.push(RequestHeader {
            name: "Accept".to_string(),
            value: "*/*".to_string(),
            disabled: true,
        });

        let rebuilt = Request::from_fields(request.to_fields().unwrap()).unwrap();
        assert_eq!(rebuilt.to_fields().unwrap(), request.to_fields().unwrap());
        assert_eq!(rebuilt.version, 0);
    }

    #[test]
    fn test_from_fields_rejects_wrong_types() {
        let mut fields = Request::from_new(NewRequest::default()).to_fields().unwrap();
        fields.insert("url".to_string(), json!(42));

        let err = Request::from_fields(fields).unwrap_err();
        assert!(matches!(err, AppError::InvalidArgument(_)));
    }
}
