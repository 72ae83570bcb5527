//! Domain Layer - Core Entity Trait
//!
//! Every record mirrored from the backend has an identity and a kind.
//! IDs are canonicalised here, at the boundary, so membership checks never
//! compare a numeric `3` against the string `"3"`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// Core trait for all mirrored records
pub trait Entity: Sized + Send + Sync + Clone {
    fn kind() -> EntityKind;

    /// The record's canonical identifier
    fn id(&self) -> RecordId;
}

/// Common result type for domain operations
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level errors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DomainError {
    NotFound(String),
    InvalidInput(String),
}

impl fmt::Display for DomainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DomainError::NotFound(msg) => write!(f, "Not found: {}", msg),
            DomainError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
        }
    }
}

impl std::error::Error for DomainError {}

// ========================
// Entity kinds
// ========================

/// The four record types the dashboard edits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityKind {
    Employee,
    Department,
    Project,
    Task,
}

impl EntityKind {
    pub const ALL: [EntityKind; 4] = [
        EntityKind::Employee,
        EntityKind::Department,
        EntityKind::Project,
        EntityKind::Task,
    ];

    /// Collection name used in messages and on the command line
    pub fn collection(&self) -> &'static str {
        match self {
            EntityKind::Employee => "employees",
            EntityKind::Department => "departments",
            EntityKind::Project => "projects",
            EntityKind::Task => "tasks",
        }
    }

    /// Record key holding the ID other records refer to.
    ///
    /// Tasks are referenced by `taskUniqueIdentifier`, not by `id`.
    pub fn reference_key(&self) -> &'static str {
        match self {
            EntityKind::Task => "taskUniqueIdentifier",
            _ => "id",
        }
    }

    /// Record key holding the text shown in selectors
    pub fn label_key(&self) -> &'static str {
        match self {
            EntityKind::Employee => "fullName",
            EntityKind::Department | EntityKind::Project => "name",
            EntityKind::Task => "title",
        }
    }

    /// ID kind of `reference_key`
    pub fn reference_id_kind(&self) -> IdKind {
        match self {
            EntityKind::Task => IdKind::Token,
            _ => IdKind::Numeric,
        }
    }
}

impl FromStr for EntityKind {
    type Err = DomainError;

    /// Singular or plural, any case
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "employee" | "employees" => Ok(EntityKind::Employee),
            "department" | "departments" => Ok(EntityKind::Department),
            "project" | "projects" => Ok(EntityKind::Project),
            "task" | "tasks" => Ok(EntityKind::Task),
            _ => Err(DomainError::InvalidInput(format!("unknown collection: {}", s))),
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.collection())
    }
}

// ========================
// Canonical IDs
// ========================

/// How an ID field is represented once canonicalised
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdKind {
    /// Integer keys (employees, departments, projects, task `id`)
    Numeric,
    /// Opaque string tokens (task `taskUniqueIdentifier`)
    Token,
}

/// A canonical record identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RecordId {
    Num(i64),
    Token(String),
}

impl IdKind {
    /// Convert a wire or user-supplied value into this kind's canonical form
    pub fn canonicalize(&self, value: &Value) -> DomainResult<RecordId> {
        match (self, value) {
            (IdKind::Numeric, Value::Number(n)) => n
                .as_i64()
                .map(RecordId::Num)
                .ok_or_else(|| DomainError::InvalidInput(format!("not an integer id: {}", n))),
            (IdKind::Numeric, Value::String(s)) => self.parse(s),
            (IdKind::Token, Value::String(s)) => self.parse(s),
            (IdKind::Token, Value::Number(n)) => Ok(RecordId::Token(n.to_string())),
            (_, other) => Err(DomainError::InvalidInput(format!("not an id: {}", other))),
        }
    }

    /// Parse text input (checkbox values, command-line arguments)
    pub fn parse(&self, raw: &str) -> DomainResult<RecordId> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(DomainError::InvalidInput("empty id".to_string()));
        }
        match self {
            IdKind::Numeric => raw
                .parse::<i64>()
                .map(RecordId::Num)
                .map_err(|_| DomainError::InvalidInput(format!("not an integer id: {}", raw))),
            IdKind::Token => Ok(RecordId::Token(raw.to_string())),
        }
    }
}

impl RecordId {
    pub fn kind(&self) -> IdKind {
        match self {
            RecordId::Num(_) => IdKind::Numeric,
            RecordId::Token(_) => IdKind::Token,
        }
    }

    pub fn as_num(&self) -> Option<i64> {
        match self {
            RecordId::Num(n) => Some(*n),
            RecordId::Token(_) => None,
        }
    }

    /// Wire representation: numbers stay numbers, tokens stay strings
    pub fn to_json(&self) -> Value {
        match self {
            RecordId::Num(n) => Value::from(*n),
            RecordId::Token(t) => Value::from(t.as_str()),
        }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Num(n) => write!(f, "{}", n),
            RecordId::Token(t) => f.write_str(t),
        }
    }
}

impl From<i64> for RecordId {
    fn from(n: i64) -> Self {
        RecordId::Num(n)
    }
}

impl Serialize for RecordId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            RecordId::Num(n) => serializer.serialize_i64(*n),
            RecordId::Token(t) => serializer.serialize_str(t),
        }
    }
}

// ========================
// Serde helpers for typed records
// ========================

fn canonical<E: serde::de::Error>(kind: IdKind, value: &Value) -> Result<RecordId, E> {
    kind.canonicalize(value).map_err(E::custom)
}

pub(crate) fn numeric_id<'de, D: Deserializer<'de>>(d: D) -> Result<RecordId, D::Error> {
    canonical(IdKind::Numeric, &Value::deserialize(d)?)
}

pub(crate) fn token_id<'de, D: Deserializer<'de>>(d: D) -> Result<RecordId, D::Error> {
    canonical(IdKind::Token, &Value::deserialize(d)?)
}

/// `null`, `""` and `0` all mean "no reference" on this backend
pub(crate) fn optional_numeric_id<'de, D: Deserializer<'de>>(d: D) -> Result<Option<RecordId>, D::Error> {
    match Value::deserialize(d)? {
        Value::Null => Ok(None),
        Value::String(s) if s.trim().is_empty() => Ok(None),
        Value::Number(n) if n.as_i64() == Some(0) => Ok(None),
        other => canonical(IdKind::Numeric, &other).map(Some),
    }
}

fn id_list<'de, D: Deserializer<'de>>(d: D, kind: IdKind) -> Result<Vec<RecordId>, D::Error> {
    match Value::deserialize(d)? {
        Value::Null => Ok(Vec::new()),
        Value::Array(items) => items.iter().map(|v| canonical(kind, v)).collect(),
        other => Err(serde::de::Error::custom(format!("expected id list, got {}", other))),
    }
}

pub(crate) fn numeric_ids<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<RecordId>, D::Error> {
    id_list(d, IdKind::Numeric)
}

pub(crate) fn token_ids<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<RecordId>, D::Error> {
    id_list(d, IdKind::Token)
}
