//! Project Record

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::entity::{Entity, EntityKind, RecordId};
use super::{nullable, numeric_id, numeric_ids, optional_numeric_id, token_ids};

/// A project as listed by `/api/Projects`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    #[serde(deserialize_with = "numeric_id")]
    pub id: RecordId,
    #[serde(default, deserialize_with = "nullable")]
    pub name: String,
    #[serde(default, deserialize_with = "nullable")]
    pub description: String,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default, deserialize_with = "optional_numeric_id")]
    pub department_id: Option<RecordId>,
    /// Sent with the single-project read
    #[serde(default)]
    pub department_name: Option<String>,
    #[serde(default, deserialize_with = "numeric_ids")]
    pub enrolled_members_ids: Vec<RecordId>,
    #[serde(default, deserialize_with = "token_ids")]
    pub guid_tasks: Vec<RecordId>,
    /// Member display names
    #[serde(default, deserialize_with = "nullable")]
    pub team_members: Vec<String>,
    /// Linked tasks keyed by task unique identifier
    #[serde(default, deserialize_with = "nullable")]
    pub tasks: BTreeMap<String, Value>,
}

impl Project {
    /// Task identifiers linked to this project, from either representation
    pub fn task_ids(&self) -> Vec<RecordId> {
        let mut ids: Vec<RecordId> = self.guid_tasks.clone();
        for key in self.tasks.keys() {
            let id = RecordId::Token(key.clone());
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        ids
    }
}

impl Entity for Project {
    fn kind() -> EntityKind {
        EntityKind::Project
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
    fn test_project_from_wire() {
        let project: Project = serde_json::from_value(json!({
            "id": 12,
            "name": "Migration",
            "startDate": "2024-03-05T00:00:00",
            "departmentId": "3",
            "enrolledMembersIds": [1, 2],
            "guidTasks": ["a1"],
            "tasks": {"a1": "Plan", "b2": "Ship"},
            "teamMembers": null
        }))
        .unwrap();

        assert_eq!(project.department_id, Some(RecordId::Num(3)));
        assert!(project.team_members.is_empty());
        assert_eq!(
            project.task_ids(),
            vec![RecordId::Token("a1".into()), RecordId::Token("b2".into())]
        );
    }
}
