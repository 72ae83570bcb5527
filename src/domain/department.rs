//! Department Record

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::entity::{Entity, EntityKind, RecordId};
use super::{nullable, numeric_id, numeric_ids, optional_numeric_id};

/// A department as listed by `/Departments`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Department {
    #[serde(deserialize_with = "numeric_id")]
    pub id: RecordId,
    #[serde(default, deserialize_with = "nullable")]
    pub name: String,
    #[serde(default, deserialize_with = "nullable")]
    pub email: String,
    #[serde(default, deserialize_with = "nullable")]
    pub phone_number: String,
    #[serde(default, deserialize_with = "optional_numeric_id")]
    pub team_leader_id: Option<RecordId>,
    #[serde(default, deserialize_with = "nullable")]
    pub team_leader_name: String,
    /// Employee names keyed by employee ID
    #[serde(default, deserialize_with = "nullable")]
    pub employees_names_as_dictionary: BTreeMap<String, String>,
    #[serde(default, deserialize_with = "numeric_ids")]
    pub enrolled_employee_ids: Vec<RecordId>,
}

impl Department {
    pub fn employee_names(&self) -> Vec<&str> {
        self.employees_names_as_dictionary
            .values()
            .map(String::as_str)
            .collect()
    }
}

impl Entity for Department {
    fn kind() -> EntityKind {
        EntityKind::Department
    }

    fn id(&self) -> RecordId {
        self.id.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_department_from_wire() {
        let department: Department = serde_json::from_value(json!({
            "id": 4,
            "name": "Research",
            "teamLeaderId": 0,
            "employeesNamesAsDictionary": {"2": "Ann Park", "9": "Omar Haddad"},
            "enrolledEmployeeIds": [2, "9"]
        }))
        .unwrap();

        assert_eq!(department.team_leader_id, None);
        assert_eq!(department.enrolled_employee_ids, vec![RecordId::Num(2), RecordId::Num(9)]);
        assert_eq!(department.employee_names(), vec!["Ann Park", "Omar Haddad"]);
    }
}
