//! Attribute codec: typed entities to and from store-native items.
//!
//! Entities go through `serde_json::Value` and are converted attribute by
//! attribute according to the entity's [`AttributeTypeMap`]:
//!
//! | type            | store-native                                   |
//! |-----------------|------------------------------------------------|
//! | `String`        | `S`                                            |
//! | `Number`        | `N` (decimal text)                             |
//! | `Json`          | `S` holding compact JSON                       |
//! | `VersionedJson` | `M { "versionId": N, "json": S }`              |
//!
//! The codec never talks to the store; it only builds items and update
//! expressions for callers to submit.

use serde_json::{Map, Number, Value};
use tracing::trace;
use vw_store::{AttributePath, AttributeValue, Attributes, Condition, Item, ItemUpdate};

use crate::attribute::{AttributeType, AttributeTypeMap};
use crate::entity::Entity;
use crate::error::{CodecError, CodecResult};
use crate::versioned::{INITIAL_VERSION, VERSION_FIELD};

/// Key of the JSON payload inside a stored versioned attribute.
pub const VERSIONED_PAYLOAD: &str = "json";

// ---------------------------------------------------------------------------
// Single attributes
// ---------------------------------------------------------------------------

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Encode one in-memory value as its store-native representation.
pub fn encode(attribute: &str, ty: AttributeType, value: &Value) -> CodecResult<AttributeValue> {
    match (ty, value) {
        (AttributeType::String, Value::String(s)) => Ok(AttributeValue::S(s.clone())),
        (AttributeType::Number, Value::Number(n)) => Ok(AttributeValue::N(n.to_string())),
        (AttributeType::Json, value) => Ok(AttributeValue::S(serde_json::to_string(value)?)),
        (AttributeType::VersionedJson, Value::Object(object)) => encode_versioned(attribute, object),
        (expected, value) => Err(CodecError::TypeMismatch {
            attribute: attribute.to_string(),
            expected,
            found: json_kind(value).to_string(),
        }),
    }
}

fn encode_versioned(attribute: &str, object: &Map<String, Value>) -> CodecResult<AttributeValue> {
    let mut payload = object.clone();
    let version = match payload.remove(VERSION_FIELD) {
        None => INITIAL_VERSION,
        Some(v) => v.as_u64().ok_or_else(|| CodecError::MalformedVersioned {
            attribute: attribute.to_string(),
            reason: format!("{VERSION_FIELD} must be a non-negative integer, got {v}"),
        })?,
    };

    let mut stored = Attributes::new();
    stored.insert(VERSION_FIELD.to_string(), AttributeValue::number(version));
    stored.insert(
        VERSIONED_PAYLOAD.to_string(),
        AttributeValue::S(serde_json::to_string(&Value::Object(payload))?),
    );
    Ok(AttributeValue::M(stored))
}

/// Decode one store-native value according to its declared type.
pub fn decode(attribute: &str, ty: AttributeType, value: &AttributeValue) -> CodecResult<Value> {
    match (ty, value) {
        (AttributeType::String, AttributeValue::S(s)) => Ok(Value::String(s.clone())),
        (AttributeType::Number, AttributeValue::N(n)) => parse_number(attribute, n),
        (AttributeType::Json, AttributeValue::S(text)) => Ok(serde_json::from_str(text)?),
        (AttributeType::VersionedJson, AttributeValue::M(stored)) => decode_versioned(attribute, stored),
        (expected, value) => Err(CodecError::TypeMismatch {
            attribute: attribute.to_string(),
            expected,
            found: value.kind().to_string(),
        }),
    }
}

fn parse_number(attribute: &str, text: &str) -> CodecResult<Value> {
    if let Ok(i) = text.parse::<i64>() {
        return Ok(Value::from(i));
    }
    if let Ok(u) = text.parse::<u64>() {
        return Ok(Value::from(u));
    }
    text.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
        .ok_or_else(|| CodecError::InvalidNumber {
            attribute: attribute.to_string(),
            value: text.to_string(),
        })
}

fn decode_versioned(attribute: &str, stored: &Attributes) -> CodecResult<Value> {
    let malformed = |reason: &str| CodecError::MalformedVersioned {
        attribute: attribute.to_string(),
        reason: reason.to_string(),
    };

    let version = stored
        .get(VERSION_FIELD)
        .and_then(AttributeValue::as_n)
        .ok_or_else(|| malformed("missing versionId"))?
        .parse::<u64>()
        .map_err(|_| malformed("versionId is not a non-negative integer"))?;
    let payload = stored
        .get(VERSIONED_PAYLOAD)
        .and_then(AttributeValue::as_s)
        .ok_or_else(|| malformed("missing json payload"))?;

    match serde_json::from_str(payload)? {
        Value::Object(mut object) => {
            object.insert(VERSION_FIELD.to_string(), Value::from(version));
            Ok(Value::Object(object))
        }
        _ => Err(malformed("payload is not an object")),
    }
}

// ---------------------------------------------------------------------------
// Attribute maps
// ---------------------------------------------------------------------------

/// Encode every declared attribute present in `object`.
///
/// Undeclared fields and `null` values are skipped.
pub fn marshal_attributes(types: &AttributeTypeMap, object: &Map<String, Value>) -> CodecResult<Attributes> {
    let mut attributes = Attributes::new();
    for (name, ty) in types.iter() {
        match object.get(name) {
            None | Some(Value::Null) => continue,
            Some(value) => {
                attributes.insert(name.to_string(), encode(name, ty, value)?);
            }
        }
    }
    Ok(attributes)
}

/// Decode every declared attribute present in `attributes` into `target`.
///
/// Missing attributes leave `target` untouched; undeclared ones are ignored.
pub fn unmarshal_attributes(
    types: &AttributeTypeMap,
    attributes: &Attributes,
    target: &mut Map<String, Value>,
) -> CodecResult<()> {
    for (name, ty) in types.iter() {
        if let Some(value) = attributes.get(name) {
            target.insert(name.to_string(), decode(name, ty, value)?);
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Entities
// ---------------------------------------------------------------------------

fn to_object<E: Entity>(entity: &E) -> CodecResult<Map<String, Value>> {
    match serde_json::to_value(entity)? {
        Value::Object(object) => Ok(object),
        _ => Err(CodecError::NotAnObject(E::TYPE_TAG.to_string())),
    }
}

/// Build the store item for `entity`.
pub fn marshal<E: Entity>(entity: &E) -> CodecResult<Item> {
    let object = to_object(entity)?;
    let attributes = marshal_attributes(E::attribute_types(), &object)?;
    Ok(Item {
        key: entity.key(),
        attributes,
    })
}

/// Overwrite the fields of `target` with the attributes present in `item`.
pub fn unmarshal_into<E: Entity>(item: &Item, target: &mut E) -> CodecResult<()> {
    let mut object = to_object(target)?;
    unmarshal_attributes(E::attribute_types(), &item.attributes, &mut object)?;
    *target = serde_json::from_value(Value::Object(object))?;
    Ok(())
}

/// Decode `item` into a fresh entity, starting from `E::default()`.
pub fn unmarshal<E: Entity>(item: &Item) -> CodecResult<E> {
    let mut entity = E::default();
    unmarshal_into(item, &mut entity)?;
    trace!(entity = E::TYPE_TAG, key = %item.key, "unmarshalled item");
    Ok(entity)
}

/// Build a conditional update that overwrites `changes` on the stored copy
/// of `current`.
///
/// The update requires the item to exist. Every versioned attribute in
/// `changes` is written with `versionId = previous + 1` and guarded by
/// `<attribute>.versionId == previous`, where `previous` is the sub-version
/// held by `current`; a concurrent overwrite therefore fails the update
/// instead of being lost.
pub fn marshal_update<E: Entity>(current: &E, changes: &Map<String, Value>) -> CodecResult<ItemUpdate> {
    let types = E::attribute_types();
    let current = to_object(current)?;
    let mut update = ItemUpdate::new().expect(Condition::ItemExists);

    for (name, value) in changes {
        let ty = types
            .get(name)
            .ok_or_else(|| CodecError::UnknownAttribute(name.clone()))?;
        let path = AttributePath::attribute(name.as_str());

        if ty != AttributeType::VersionedJson {
            update = update.set(path, encode(name, ty, value)?);
            continue;
        }

        let Value::Object(next) = value else {
            return Err(CodecError::TypeMismatch {
                attribute: name.clone(),
                expected: ty,
                found: json_kind(value).to_string(),
            });
        };
        let previous = current
            .get(name)
            .and_then(|v| v.get(VERSION_FIELD))
            .and_then(Value::as_u64)
            .unwrap_or(INITIAL_VERSION);
        let bumped = previous
            .checked_add(1)
            .ok_or_else(|| CodecError::MalformedVersioned {
                attribute: name.clone(),
                reason: format!("{VERSION_FIELD} {previous} cannot be incremented"),
            })?;
        let mut next = next.clone();
        next.insert(VERSION_FIELD.to_string(), Value::from(bumped));

        update = update
            .set(path.clone(), encode(name, ty, &Value::Object(next))?)
            .expect(Condition::Equals {
                path: path.child(VERSION_FIELD),
                value: AttributeValue::number(previous),
            });
    }

    Ok(update)
}
