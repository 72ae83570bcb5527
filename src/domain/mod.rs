//! Domain Layer
//!
//! Records mirrored from the staffing backend and the ID rules they share.
//! This layer has no I/O (serde only).

mod entity;
mod employee;
mod department;
mod project;
mod task;

pub use entity::{DomainError, DomainResult, Entity, EntityKind, IdKind, RecordId};
pub use employee::Employee;
pub use department::Department;
pub use project::Project;
pub use task::{Task, TaskStatus};

pub(crate) use entity::{numeric_id, numeric_ids, optional_numeric_id, token_id, token_ids};

use serde::{Deserialize, Deserializer};

/// The backend sends `null` for empty strings and lists alike
pub(crate) fn nullable<'de, D, T>(d: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(d)?.unwrap_or_default())
}
