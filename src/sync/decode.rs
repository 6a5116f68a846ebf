//! Remote document decoding
//!
//! Each descriptor field is looked up through its ordered alias list and
//! coerced to the local value type. Unknown document fields are dropped.

use crate::error::DecodeError;
use crate::remote::{Document, FieldMap, FieldValue};

use super::descriptor::{EntityDescriptor, FieldDefault, FieldKind, FieldSpec, Requirement};

/// Bookkeeping field carrying the local id of the writing device
pub const ROOM_ID: &str = "roomId";
pub const ID: &str = "id";
/// Server-assigned write time
pub const LAST_MODIFIED: &str = "lastModified";
/// Server-assigned sync marker
pub const SYNC_TIMESTAMP: &str = "syncTimestamp";

/// First non-null value among `names`
pub fn lookup<'a, 'n>(
    fields: &'a FieldMap,
    names: impl IntoIterator<Item = &'n str>,
) -> Option<&'a FieldValue> {
    names
        .into_iter()
        .filter_map(|name| fields.get(name))
        .find(|value| !value.is_null())
}

/// Local id carried by the document: `roomId`, else `id`, else the key
pub fn document_id(doc: &Document) -> Option<i64> {
    [ROOM_ID, ID]
        .iter()
        .filter_map(|name| doc.get(name))
        .find_map(as_id)
        .or_else(|| doc.key.trim().parse::<i64>().ok())
        .filter(|id| *id > 0)
}

/// Local id from bookkeeping fields only, ignoring the document key
pub fn embedded_id(doc: &Document) -> Option<i64> {
    [ROOM_ID, ID]
        .iter()
        .filter_map(|name| doc.get(name))
        .find_map(as_id)
        .filter(|id| *id > 0)
}

fn as_id(value: &FieldValue) -> Option<i64> {
    match value {
        FieldValue::String(s) => s.trim().parse().ok(),
        other => other.as_i64(),
    }
}

/// Decode every descriptor field of a document into a local field map
pub fn decode_fields(descriptor: &EntityDescriptor, doc: &Document) -> Result<FieldMap, DecodeError> {
    let mut fields = FieldMap::new();
    for spec in descriptor.fields {
        let value = decode_field(spec, &doc.fields)?;
        fields.insert(spec.name.to_string(), value);
    }
    Ok(fields)
}

fn decode_field(spec: &FieldSpec, fields: &FieldMap) -> Result<FieldValue, DecodeError> {
    let value = match lookup(fields, spec.names()) {
        Some(raw) => coerce(spec, raw)?,
        None => default_value(spec.default),
    };

    let satisfied = match spec.requirement {
        Requirement::Optional => true,
        Requirement::NonBlank => value.as_str().is_some_and(|s| !s.trim().is_empty()),
        Requirement::NonZero => value.as_i64().is_some_and(|v| v != 0),
    };

    if satisfied {
        Ok(value)
    } else {
        Err(DecodeError::MissingField(spec.name.to_string()))
    }
}

fn default_value(default: FieldDefault) -> FieldValue {
    match default {
        FieldDefault::Null => FieldValue::Null,
        FieldDefault::Text(s) => FieldValue::from(s),
        FieldDefault::Integer(v) => FieldValue::Integer(v),
        FieldDefault::Real(v) => FieldValue::Double(v),
        FieldDefault::Bool(v) => FieldValue::Bool(v),
    }
}

fn coerce(spec: &FieldSpec, raw: &FieldValue) -> Result<FieldValue, DecodeError> {
    let coerced = match (spec.kind, raw) {
        (FieldKind::Text, FieldValue::String(s)) => Some(FieldValue::String(s.clone())),
        (FieldKind::Text, FieldValue::Integer(v)) => Some(FieldValue::String(v.to_string())),
        (FieldKind::Text, FieldValue::Double(v)) => Some(FieldValue::String(v.to_string())),

        (FieldKind::Integer, FieldValue::String(s)) => s.trim().parse().ok().map(FieldValue::Integer),
        (FieldKind::Integer, other) => other.as_i64().map(FieldValue::Integer),

        (FieldKind::Real, FieldValue::Double(v)) => Some(FieldValue::Double(*v)),
        (FieldKind::Real, FieldValue::Integer(v)) => Some(FieldValue::Double(*v as f64)),
        (FieldKind::Real, FieldValue::String(s)) => s.trim().parse().ok().map(FieldValue::Double),

        (FieldKind::Bool, FieldValue::Bool(b)) => Some(FieldValue::Bool(*b)),
        (FieldKind::Bool, FieldValue::Integer(v)) => Some(FieldValue::Bool(*v != 0)),
        (FieldKind::Bool, FieldValue::String(s)) => match s.trim() {
            "true" | "1" => Some(FieldValue::Bool(true)),
            "false" | "0" => Some(FieldValue::Bool(false)),
            _ => None,
        },

        (FieldKind::Timestamp, other) => other.timestamp_millis().map(FieldValue::Integer),

        _ => None,
    };

    coerced.ok_or_else(|| DecodeError::TypeMismatch {
        field: spec.name.to_string(),
        expected: expected_name(spec.kind),
        found: type_name(raw).to_string(),
    })
}

fn expected_name(kind: FieldKind) -> &'static str {
    match kind {
        FieldKind::Text => "text",
        FieldKind::Integer => "integer",
        FieldKind::Real => "number",
        FieldKind::Bool => "bool",
        FieldKind::Timestamp => "timestamp",
    }
}

fn type_name(value: &FieldValue) -> &'static str {
    match value {
        FieldValue::Null => "null",
        FieldValue::Bool(_) => "bool",
        FieldValue::Integer(_) => "integer",
        FieldValue::Double(_) => "double",
        FieldValue::String(_) => "string",
        FieldValue::Timestamp(_) => "timestamp",
        FieldValue::Array(_) => "array",
        FieldValue::Map(_) => "map",
        FieldValue::ServerTimestamp => "server timestamp",
    }
}
