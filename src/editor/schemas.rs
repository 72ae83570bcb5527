//! Concrete schemas for the four editable entities

use serde_json::{Map, Value};

use super::schema::{
    text_of, ConstValue, DerivedField, EntitySchema, FieldMap, FieldSpec, Mode, Required, WireConstant,
};
use super::value::FieldKind;
use crate::domain::{EntityKind, IdKind};

const TEXT: FieldKind = FieldKind::Text;
const DATE: FieldKind = FieldKind::Date { timestamp: false };
const TIMESTAMP: FieldKind = FieldKind::Date { timestamp: true };
const NUMERIC_REF: FieldKind = FieldKind::Ref(IdKind::Numeric);
const NUMERIC_SET: FieldKind = FieldKind::RefSet(IdKind::Numeric);
const TOKEN_SET: FieldKind = FieldKind::RefSet(IdKind::Token);

pub fn schema_for(kind: EntityKind) -> &'static EntitySchema {
    match kind {
        EntityKind::Employee => &EMPLOYEE,
        EntityKind::Department => &DEPARTMENT,
        EntityKind::Project => &PROJECT,
        EntityKind::Task => &TASK,
    }
}

// ========================
// Employee
// ========================

/// Registration takes PascalCase names; edits take camelCase and `fullName`
pub static EMPLOYEE: EntitySchema = EntitySchema {
    kind: EntityKind::Employee,
    fields: &[
        FieldSpec::new("userName", TEXT).required(Required::OnCreate).create_as(&["UserName"]),
        FieldSpec::new("password", TEXT).required(Required::OnCreate).create_as(&["Password"]),
        FieldSpec::new("firstName", TEXT).required(Required::Always).create_as(&["FirstName"]),
        FieldSpec::new("lastName", TEXT).required(Required::Always).create_as(&["LastName"]),
        FieldSpec::new("email", TEXT)
            .required(Required::OnUpdate)
            .create_as(&["Email"])
            .update_as(&["email"]),
        FieldSpec::new("phone", TEXT).create_as(&["Phone"]).update_as(&["phone"]),
        FieldSpec::new("address", TEXT).create_as(&["Address"]).update_as(&["address"]),
        FieldSpec::new("birthDate", TIMESTAMP).create_as(&["BirthDate"]).update_as(&["birthDate"]),
        FieldSpec::new("hireDate", TIMESTAMP).create_as(&["HireDate"]).update_as(&["hireDate"]),
        FieldSpec::new("nationalIdentificationNumber", TEXT)
            .required(Required::OnUpdate)
            .create_as(&["NationalIdentificationNumber"])
            .update_as(&["nationalIdentificationNumber"]),
        FieldSpec::new("imagePath", TEXT).create_as(&["ImagePath"]).update_as(&["imagePath"]),
        FieldSpec::new("departmentId", NUMERIC_REF)
            .required(Required::OnCreate)
            .create_as(&["DepartmentIds"]),
    ],
    references: &[EntityKind::Department],
    constants: &[],
    derived: &[DerivedField {
        mode: Mode::Update,
        wire: "fullName",
        sources: &["firstName", "lastName"],
        compose: full_name,
    }],
    seed: Some(split_full_name),
};

fn full_name(values: &FieldMap) -> Value {
    let first = text_of(values, "firstName").trim();
    let last = text_of(values, "lastName").trim();
    Value::from(format!("{} {}", first, last).trim().to_string())
}

/// Records only carry `fullName`; the form edits its two halves
fn split_full_name(record: &mut Map<String, Value>) {
    let has_part = |record: &Map<String, Value>, key: &str| {
        record
            .get(key)
            .and_then(Value::as_str)
            .map(|s| !s.trim().is_empty())
            .unwrap_or(false)
    };
    if has_part(record, "firstName") || has_part(record, "lastName") {
        return;
    }

    let full = match record.get("fullName").and_then(Value::as_str) {
        Some(full) => full.trim().to_string(),
        None => return,
    };
    let (first, last) = match full.split_once(char::is_whitespace) {
        Some((first, last)) => (first.to_string(), last.trim().to_string()),
        None => (full, String::new()),
    };
    record.insert("firstName".to_string(), Value::from(first));
    record.insert("lastName".to_string(), Value::from(last));
}

// ========================
// Department
// ========================

pub static DEPARTMENT: EntitySchema = EntitySchema {
    kind: EntityKind::Department,
    fields: &[
        FieldSpec::new("name", TEXT).required(Required::Always).sent_as(&["name"]),
        FieldSpec::new("email", TEXT).sent_as(&["email"]),
        FieldSpec::new("phoneNumber", TEXT).sent_as(&["phoneNumber"]),
        FieldSpec::new("teamLeaderId", NUMERIC_REF).sent_as(&["teamLeaderId"]),
        FieldSpec::new("enrolledEmployeeIds", NUMERIC_SET).sent_as(&["enrolledEmployeeIds"]),
    ],
    references: &[EntityKind::Employee],
    constants: &[],
    derived: &[],
    seed: None,
};

// ========================
// Project
// ========================

pub static PROJECT: EntitySchema = EntitySchema {
    kind: EntityKind::Project,
    fields: &[
        FieldSpec::new("name", TEXT)
            .required(Required::Always)
            .create_as(&["projectName"])
            .update_as(&["name"]),
        FieldSpec::new("description", TEXT).sent_as(&["description"]),
        FieldSpec::new("startDate", DATE).sent_as(&["startDate"]),
        FieldSpec::new("endDate", DATE).sent_as(&["endDate"]),
        FieldSpec::new("departmentId", NUMERIC_REF).sent_as(&["departmentId"]),
        FieldSpec::new("enrolledMembersIds", NUMERIC_SET).sent_as(&["enrolledMembersIds"]),
        FieldSpec::new("guidTasks", TOKEN_SET).sent_as(&["guidTasks"]),
    ],
    references: &[EntityKind::Department, EntityKind::Employee, EntityKind::Task],
    constants: &[],
    derived: &[],
    seed: None,
};

// ========================
// Task
// ========================

/// New tasks start pending, accepted, and owned by the acting employee
pub static TASK: EntitySchema = EntitySchema {
    kind: EntityKind::Task,
    fields: &[
        FieldSpec::new("title", TEXT).required(Required::Always).sent_as(&["title"]),
        FieldSpec::new("description", TEXT).sent_as(&["description"]),
        FieldSpec::new("priority", TEXT).sent_as(&["priority"]),
        FieldSpec::new("startDate", DATE).sent_as(&["startDate"]),
        FieldSpec::new("deadLine", DATE).sent_as(&["deadLine", "endDate"]),
        FieldSpec::new("pointsValue", FieldKind::Number { default: 1 }).sent_as(&["pointsValue"]),
        FieldSpec::new("assignedToEmployeeId", NUMERIC_REF).sent_as(&["assignedToEmployeeId"]),
    ],
    references: &[EntityKind::Employee],
    constants: &[
        WireConstant {
            mode: Mode::Create,
            wire: "status",
            value: ConstValue::Text("pending"),
        },
        WireConstant {
            mode: Mode::Create,
            wire: "accepted",
            value: ConstValue::Bool(true),
        },
        WireConstant {
            mode: Mode::Create,
            wire: "createdByEmployeeId",
            value: ConstValue::ActingEmployee,
        },
    ],
    derived: &[],
    seed: None,
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::FieldValue;
    use serde_json::json;

    #[test]
    fn test_schema_kinds_match() {
        for kind in EntityKind::ALL {
            assert_eq!(schema_for(kind).kind, kind);
        }
    }

    #[test]
    fn test_every_field_is_sent_somewhere() {
        for kind in EntityKind::ALL {
            let schema = schema_for(kind);
            for field in schema.fields {
                let derived = schema.derived.iter().any(|d| d.sources.contains(&field.name));
                assert!(
                    !field.create_as.is_empty() || !field.update_as.is_empty() || derived,
                    "{}.{} is never sent",
                    kind,
                    field.name
                );
            }
        }
    }

    #[test]
    fn test_full_name_split_on_first_space() {
        let mut record = json!({"fullName": "Mary Ann Lee"}).as_object().cloned().unwrap();
        split_full_name(&mut record);
        assert_eq!(record["firstName"], "Mary");
        assert_eq!(record["lastName"], "Ann Lee");
    }

    #[test]
    fn test_explicit_name_parts_win() {
        let mut record = json!({"fullName": "X Y", "firstName": "Ana", "lastName": ""})
            .as_object()
            .cloned()
            .unwrap();
        split_full_name(&mut record);
        assert_eq!(record["firstName"], "Ana");
        assert_eq!(record["lastName"], "");
    }

    #[test]
    fn test_full_name_composed_from_parts() {
        let mut values = EMPLOYEE.blank_values();
        values.insert("firstName", FieldValue::Text("Sam".into()));
        assert_eq!(full_name(&values), json!("Sam"));

        values.insert("lastName", FieldValue::Text(" Lee ".into()));
        assert_eq!(full_name(&values), json!("Sam Lee"));
    }
}
