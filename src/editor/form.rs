//! Form Draft
//!
//! Working copy of one record plus the baseline captured when it was loaded.
//! Only the draft side is ever written to.

use serde_json::Value;

use super::diff::diff;
use super::schema::{EntitySchema, FieldMap, FieldSpec, Mode};
use super::value::{FieldKind, FieldValue};
use crate::domain::RecordId;
use crate::error::{FormError, ValidationError};

#[derive(Debug, Clone)]
pub struct FormDraft {
    schema: &'static EntitySchema,
    baseline: FieldMap,
    values: FieldMap,
}

impl FormDraft {
    /// Schema defaults for an "Add" dialog
    pub fn blank(schema: &'static EntitySchema) -> Self {
        let baseline = schema.blank_values();
        Self {
            schema,
            values: baseline.clone(),
            baseline,
        }
    }

    /// Copy of a server record for an "Edit" dialog
    pub fn from_record(schema: &'static EntitySchema, record: &Value) -> Result<Self, FormError> {
        let mut record = match record {
            Value::Object(map) => map.clone(),
            other => {
                return Err(FormError::InvalidValue {
                    field: schema.kind.to_string(),
                    reason: format!("expected an object, got {}", other),
                })
            }
        };
        if let Some(seed) = schema.seed {
            seed(&mut record);
        }

        let mut baseline = FieldMap::new();
        for field in schema.fields {
            let raw = field.record_keys().into_iter().find_map(|key| record.get(key));
            let value = match raw {
                Some(raw) => field.kind.from_wire(raw).map_err(|reason| FormError::InvalidValue {
                    field: field.name.to_string(),
                    reason,
                })?,
                None => field.kind.blank(),
            };
            baseline.insert(field.name, value);
        }

        Ok(Self {
            schema,
            values: baseline.clone(),
            baseline,
        })
    }

    pub fn schema(&self) -> &'static EntitySchema {
        self.schema
    }

    fn spec(&self, name: &str) -> Result<&'static FieldSpec, FormError> {
        self.schema
            .fields
            .iter()
            .find(|f| f.name == name)
            .ok_or_else(|| FormError::UnknownField(name.to_string()))
    }

    pub fn set_field(&mut self, name: &str, value: FieldValue) -> Result<(), FormError> {
        let spec = self.spec(name)?;
        if !spec.kind.accepts(&value) {
            return Err(FormError::WrongType {
                field: name.to_string(),
                expected: spec.kind.label(),
            });
        }
        let value = canonical(spec, value)?;
        self.values.insert(spec.name, value);
        Ok(())
    }

    /// Set a field from text as typed into its input
    pub fn set_text(&mut self, name: &str, raw: &str) -> Result<(), FormError> {
        let spec = self.spec(name)?;
        let value = spec.kind.parse(raw).map_err(|reason| FormError::InvalidValue {
            field: name.to_string(),
            reason,
        })?;
        self.values.insert(spec.name, value);
        Ok(())
    }

    /// Flip membership of one ID in an association field
    pub fn toggle(&mut self, name: &str, raw_id: &str) -> Result<bool, FormError> {
        let spec = self.spec(name)?;
        match self.values.get_mut(spec.name) {
            Some(FieldValue::RefSet(set)) => set.toggle_raw(raw_id).map_err(|e| FormError::InvalidValue {
                field: name.to_string(),
                reason: e.to_string(),
            }),
            _ => Err(FormError::WrongType {
                field: name.to_string(),
                expected: "reference set",
            }),
        }
    }

    /// Whether an association field holds the ID (checkbox state)
    pub fn is_checked(&self, name: &str, id: &RecordId) -> bool {
        match self.values.get(name) {
            Some(FieldValue::RefSet(set)) => set.contains(id),
            _ => false,
        }
    }

    /// Discard every edit
    pub fn reset(&mut self) {
        self.values = self.baseline.clone();
    }

    pub fn value(&self, name: &str) -> Option<&FieldValue> {
        self.values.get(name)
    }

    pub fn values(&self) -> &FieldMap {
        &self.values
    }

    pub fn baseline(&self) -> &FieldMap {
        &self.baseline
    }

    /// Fields that differ from the baseline
    pub fn changes(&self) -> FieldMap {
        diff(&self.baseline, &self.values)
    }

    pub fn is_dirty(&self) -> bool {
        self.values != self.baseline
    }

    pub fn validate(&self, mode: Mode) -> Result<(), ValidationError> {
        let missing_fields: Vec<String> = self
            .schema
            .required_fields(mode)
            .filter(|f| self.values.get(f.name).map(FieldValue::is_blank).unwrap_or(true))
            .map(|f| f.name.to_string())
            .collect();

        if missing_fields.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { missing_fields })
        }
    }
}

/// Re-key IDs to the field's kind
fn canonical(spec: &FieldSpec, value: FieldValue) -> Result<FieldValue, FormError> {
    let invalid = |reason: String| FormError::InvalidValue {
        field: spec.name.to_string(),
        reason,
    };
    match (spec.kind, value) {
        (FieldKind::Ref(kind), FieldValue::Ref(Some(id))) if id.kind() != kind => kind
            .parse(&id.to_string())
            .map(|id| FieldValue::Ref(Some(id)))
            .map_err(|e| invalid(e.to_string())),
        (FieldKind::RefSet(kind), FieldValue::RefSet(set)) if set.kind() != kind => {
            super::AssociationSet::from_ids(kind, set.iter().cloned())
                .map(FieldValue::RefSet)
                .map_err(|e| invalid(e.to_string()))
        }
        (_, value) => Ok(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::schemas::{DEPARTMENT, EMPLOYEE, PROJECT};
    use serde_json::json;

    fn employee_record() -> Value {
        json!({
            "id": 4,
            "fullName": "Kim Lee",
            "email": "kim@example.com",
            "birthDate": "1990-02-01T00:00:00",
            "nationalIdentificationNumber": "123",
            "roles": ["Employee"]
        })
    }

    #[test]
    fn test_record_loads_into_draft_and_baseline() {
        let draft = FormDraft::from_record(&EMPLOYEE, &employee_record()).unwrap();
        assert_eq!(draft.value("firstName"), Some(&FieldValue::Text("Kim".into())));
        assert_eq!(draft.value("birthDate").unwrap().display(), "1990-02-01");
        assert_eq!(draft.values(), draft.baseline());
        assert!(!draft.is_dirty());
    }

    #[test]
    fn test_reset_restores_baseline() {
        let mut draft = FormDraft::from_record(&EMPLOYEE, &employee_record()).unwrap();
        draft.set_text("firstName", "Jo").unwrap();
        draft.set_text("hireDate", "2020-05-06").unwrap();
        draft.set_text("phone", "555").unwrap();
        draft.set_text("firstName", "Jon").unwrap();
        assert!(draft.is_dirty());

        draft.reset();
        assert_eq!(draft.values(), draft.baseline());
        assert_eq!(draft.value("firstName"), Some(&FieldValue::Text("Kim".into())));
    }

    #[test]
    fn test_baseline_untouched_by_edits() {
        let mut draft = FormDraft::blank(&DEPARTMENT);
        let before = draft.baseline().clone();
        draft.set_text("name", "Ops").unwrap();
        draft.toggle("enrolledEmployeeIds", "3").unwrap();
        assert_eq!(draft.baseline(), &before);
    }

    #[test]
    fn test_missing_first_name_fails_validation() {
        let mut draft = FormDraft::blank(&EMPLOYEE);
        draft.set_text("firstName", "").unwrap();
        draft.set_text("lastName", "Lee").unwrap();
        draft.set_text("email", "a@b.com").unwrap();
        draft.set_text("nationalIdentificationNumber", "123").unwrap();

        let err = draft.validate(Mode::Update).unwrap_err();
        assert_eq!(err.missing_fields, vec!["firstName"]);
    }

    #[test]
    fn test_whitespace_counts_as_blank() {
        let mut draft = FormDraft::blank(&DEPARTMENT);
        draft.set_text("name", "   ").unwrap();
        assert!(draft.validate(Mode::Create).is_err());

        draft.set_text("name", "Ops").unwrap();
        assert!(draft.validate(Mode::Create).is_ok());
    }

    #[test]
    fn test_set_field_checks_type_and_canonicalises() {
        let mut draft = FormDraft::blank(&PROJECT);
        let err = draft.set_field("name", FieldValue::Number(3)).unwrap_err();
        assert_eq!(
            err,
            FormError::WrongType {
                field: "name".into(),
                expected: "text"
            }
        );

        draft
            .set_field("departmentId", FieldValue::Ref(Some(RecordId::Token("7".into()))))
            .unwrap();
        assert_eq!(draft.value("departmentId"), Some(&FieldValue::Ref(Some(RecordId::Num(7)))));

        assert_eq!(
            draft.set_text("nope", "x").unwrap_err(),
            FormError::UnknownField("nope".into())
        );
    }

    #[test]
    fn test_checkbox_state_follows_toggles() {
        let record = json!({"id": 1, "name": "P", "enrolledMembersIds": [2, 3], "guidTasks": ["t-1"]});
        let mut draft = FormDraft::from_record(&PROJECT, &record).unwrap();

        assert!(draft.is_checked("enrolledMembersIds", &RecordId::Token("2".into())));
        assert!(!draft.toggle("enrolledMembersIds", "2").unwrap());
        assert!(!draft.is_checked("enrolledMembersIds", &RecordId::Num(2)));

        assert!(draft.toggle("guidTasks", "t-2").unwrap());
        assert!(draft.is_checked("guidTasks", &RecordId::Token("t-2".into())));

        assert!(draft.toggle("name", "1").is_err());
    }

    #[test]
    fn test_non_object_record_is_rejected() {
        assert!(FormDraft::from_record(&PROJECT, &json!([1, 2])).is_err());
    }
}
