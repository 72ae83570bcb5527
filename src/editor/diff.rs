//! Diff and Payload Building
//!
//! Create sends every mapped field. Update sends only the fields that
//! differ from the baseline, plus derived fields whose sources changed and
//! the record ID.

use serde_json::Value;

use super::schema::{ConstValue, EntitySchema, FieldMap, Mode};
use super::value::FieldValue;
use crate::api::Payload;
use crate::domain::RecordId;
use crate::error::ValidationError;

/// Values the schema cannot know on its own
#[derive(Debug, Clone, Default)]
pub struct PayloadContext {
    pub acting_employee: Option<RecordId>,
}

/// Fields of `draft` whose value differs from `baseline`
///
/// Scalars compare by value. Association fields compare as sequences: same
/// length and same elements in order. Sets are held in ascending order, so
/// this is also set equality.
pub fn diff(baseline: &FieldMap, draft: &FieldMap) -> FieldMap {
    draft
        .iter()
        .filter(|(name, value)| match baseline.get(*name) {
            Some(before) => !same_value(before, value),
            None => true,
        })
        .map(|(name, value)| (*name, value.clone()))
        .collect()
}

fn same_value(a: &FieldValue, b: &FieldValue) -> bool {
    match (a, b) {
        (FieldValue::RefSet(x), FieldValue::RefSet(y)) => x.len() == y.len() && x.iter().eq(y.iter()),
        _ => a == b,
    }
}

fn put_field(payload: &mut Payload, schema: &EntitySchema, mode: Mode, name: &str, value: &FieldValue) {
    if let Some(spec) = schema.field(name) {
        for wire in spec.wire_names(mode) {
            payload.insert(wire.to_string(), value.to_wire(&spec.kind));
        }
    }
}

fn put_constants(
    payload: &mut Payload,
    schema: &EntitySchema,
    mode: Mode,
    context: &PayloadContext,
) -> Result<(), ValidationError> {
    for constant in schema.constants_for(mode) {
        let value = match constant.value {
            ConstValue::Text(text) => Value::from(text),
            ConstValue::Bool(flag) => Value::from(flag),
            ConstValue::ActingEmployee => match &context.acting_employee {
                Some(id) => id.to_json(),
                None => {
                    return Err(ValidationError {
                        missing_fields: vec![constant.wire.to_string()],
                    })
                }
            },
        };
        payload.insert(constant.wire.to_string(), value);
    }
    Ok(())
}

/// Full body for a create request
pub fn create_payload(
    schema: &EntitySchema,
    values: &FieldMap,
    context: &PayloadContext,
) -> Result<Payload, ValidationError> {
    let mut payload = Payload::new();
    for (name, value) in values {
        put_field(&mut payload, schema, Mode::Create, name, value);
    }
    for derived in schema.derived_for(Mode::Create) {
        payload.insert(derived.wire.to_string(), (derived.compose)(values));
    }
    put_constants(&mut payload, schema, Mode::Create, context)?;
    Ok(payload)
}

/// Partial body for an update request, or `None` when nothing would be sent
pub fn update_payload(
    schema: &EntitySchema,
    id: &RecordId,
    changes: &FieldMap,
    values: &FieldMap,
    context: &PayloadContext,
) -> Result<Option<Payload>, ValidationError> {
    let mut payload = Payload::new();
    for (name, value) in changes {
        put_field(&mut payload, schema, Mode::Update, name, value);
    }
    for derived in schema.derived_for(Mode::Update) {
        if derived.sources.iter().any(|source| changes.contains_key(source)) {
            payload.insert(derived.wire.to_string(), (derived.compose)(values));
        }
    }
    if payload.is_empty() {
        return Ok(None);
    }

    put_constants(&mut payload, schema, Mode::Update, context)?;
    payload.insert("id".to_string(), id.to_json());
    Ok(Some(payload))
}
