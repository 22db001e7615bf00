//! Snapshots of request fields and the partial updates built from them.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::Request;
use crate::errors::AppError;

/// Fields that carry identity or display metadata rather than request
/// semantics. They are ignored when diffing and never overwritten on restore.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExcludedField {
    Id,
    Type,
    Created,
    Modified,
    MetaSortKey,
    Description,
    ParentId,
    Name,
}

impl ExcludedField {
    pub const ALL: [ExcludedField; 8] = [
        ExcludedField::Id,
        ExcludedField::Type,
        ExcludedField::Created,
        ExcludedField::Modified,
        ExcludedField::MetaSortKey,
        ExcludedField::Description,
        ExcludedField::ParentId,
        ExcludedField::Name,
    ];

    /// Serialized field name.
    pub fn as_str(&self) -> &'static str {
        match self {
            ExcludedField::Id => "_id",
            ExcludedField::Type => "type",
            ExcludedField::Created => "created",
            ExcludedField::Modified => "modified",
            ExcludedField::MetaSortKey => "metaSortKey",
            ExcludedField::Description => "description",
            ExcludedField::ParentId => "parentId",
            ExcludedField::Name => "name",
        }
    }

    pub fn parse(field: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.as_str() == field)
    }

    /// Whether a serialized field name belongs to the exclusion set.
    pub fn contains(field: &str) -> bool {
        Self::parse(field).is_some()
    }
}

/// Immutable copy of a request's fields at one point in time.
///
/// Snapshots captured by older builds may lack fields the current
/// [`Request`] has.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot(Map<String, Value>);

impl Snapshot {
    pub fn capture(request: &Request) -> Result<Self, AppError> {
        Ok(Self(request.to_fields()?))
    }

    /// Wrap a decompressed payload. Anything but a JSON object is corrupt.
    pub fn from_value(value: Value) -> Result<Self, AppError> {
        match value {
            Value::Object(fields) => Ok(Self(fields)),
            other => Err(AppError::Codec(format!(
                "Snapshot payload is not an object: {}",
                type_name(&other)
            ))),
        }
    }

    /// The captured request id.
    pub fn id(&self) -> Option<&str> {
        self.0.get(ExcludedField::Id.as_str()).and_then(Value::as_str)
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.0.clone())
    }

    /// Use every captured field as a partial update.
    pub fn into_patch(self) -> RequestPatch {
        RequestPatch(self.0)
    }
}

/// Partial update for a [`Request`]: present fields overwrite, absent
/// fields keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestPatch(Map<String, Value>);

impl RequestPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(field, value);
        self
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(field.into(), value.into());
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Drop the given fields from the patch.
    pub fn without(mut self, fields: &[ExcludedField]) -> Self {
        for field in fields {
            self.0.remove(field.as_str());
        }
        self
    }

    /// Drop every field of the exclusion set from the patch.
    pub fn without_excluded(self) -> Self {
        self.without(&ExcludedField::ALL)
    }

    /// Merge the patch onto `request`, producing the updated request.
    ///
    /// The concurrency version is carried over unchanged.
    pub fn apply_to(&self, request: &Request) -> Result<Request, AppError> {
        let mut merged = request.to_fields()?;
        for (field, value) in &self.0 {
            merged.insert(field.clone(), value.clone());
        }
        let mut updated = Request::from_fields(merged)?;
        updated.version = request.version;
        Ok(updated)
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
