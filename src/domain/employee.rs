//! Employee Record

use serde::{Deserialize, Serialize};

use super::entity::{Entity, EntityKind, RecordId};
use super::{nullable, numeric_id};

/// An employee as listed by `/api/Employees`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    #[serde(deserialize_with = "numeric_id")]
    pub id: RecordId,
    #[serde(default, deserialize_with = "nullable")]
    pub full_name: String,
    #[serde(default, deserialize_with = "nullable")]
    pub first_name: String,
    #[serde(default, deserialize_with = "nullable")]
    pub last_name: String,
    #[serde(default, deserialize_with = "nullable")]
    pub email: String,
    #[serde(default, deserialize_with = "nullable")]
    pub phone: String,
    #[serde(default, deserialize_with = "nullable")]
    pub address: String,
    #[serde(default)]
    pub birth_date: Option<String>,
    #[serde(default)]
    pub hire_date: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub national_identification_number: String,
    #[serde(default, deserialize_with = "nullable")]
    pub image_path: String,
    #[serde(default, deserialize_with = "nullable")]
    pub roles: Vec<String>,
}

impl Employee {
    /// Name shown in lists; falls back to the split name fields
    pub fn display_name(&self) -> String {
        if !self.full_name.trim().is_empty() {
            return self.full_name.trim().to_string();
        }
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
            .trim()
            .to_string()
    }
}

impl Entity for Employee {
    fn kind() -> EntityKind {
        EntityKind::Employee
    }

    fn id(&self) -> RecordId {
        self.id.clone()
    }
}
