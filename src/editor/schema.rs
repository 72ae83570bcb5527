//! Entity Schemas
//!
//! Declarative description of one editable entity: its fields, which of them
//! are required, the wire names used on create and on update, and the
//! reference collections its dialog needs.

use std::collections::BTreeMap;
use std::fmt;

use serde_json::{Map, Value};

use super::value::{FieldKind, FieldValue};
use crate::domain::EntityKind;

/// Field values keyed by client field name
pub type FieldMap = BTreeMap<&'static str, FieldValue>;

/// Which write a payload is built for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Create,
    Update,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Required {
    Never,
    OnCreate,
    OnUpdate,
    Always,
}

impl Required {
    pub fn applies(&self, mode: Mode) -> bool {
        match self {
            Required::Never => false,
            Required::OnCreate => mode == Mode::Create,
            Required::OnUpdate => mode == Mode::Update,
            Required::Always => true,
        }
    }
}

/// One client-side field and its wire mapping
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: Required,
    /// Wire names on create; the value is sent under each, none means not sent
    pub create_as: &'static [&'static str],
    pub update_as: &'static [&'static str],
    /// Record keys read when loading, first present wins; empty means `name`
    pub read_as: &'static [&'static str],
}

impl FieldSpec {
    /// Optional and not sent until wire names are given
    pub const fn new(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            required: Required::Never,
            create_as: &[],
            update_as: &[],
            read_as: &[],
        }
    }

    pub const fn required(mut self, required: Required) -> Self {
        self.required = required;
        self
    }

    pub const fn create_as(mut self, names: &'static [&'static str]) -> Self {
        self.create_as = names;
        self
    }

    pub const fn update_as(mut self, names: &'static [&'static str]) -> Self {
        self.update_as = names;
        self
    }

    pub const fn sent_as(self, names: &'static [&'static str]) -> Self {
        self.create_as(names).update_as(names)
    }

    pub const fn read_as(mut self, keys: &'static [&'static str]) -> Self {
        self.read_as = keys;
        self
    }

    pub fn wire_names(&self, mode: Mode) -> &'static [&'static str] {
        match mode {
            Mode::Create => self.create_as,
            Mode::Update => self.update_as,
        }
    }

    pub fn record_keys(&self) -> Vec<&'static str> {
        if self.read_as.is_empty() {
            vec![self.name]
        } else {
            self.read_as.to_vec()
        }
    }
}

/// Fixed value added to every payload of a mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstValue {
    Text(&'static str),
    Bool(bool),
    /// ID of the employee the credential belongs to
    ActingEmployee,
}

#[derive(Debug, Clone, Copy)]
pub struct WireConstant {
    pub mode: Mode,
    pub wire: &'static str,
    pub value: ConstValue,
}

/// Wire field composed from several client fields
#[derive(Clone, Copy)]
pub struct DerivedField {
    pub mode: Mode,
    pub wire: &'static str,
    /// Sent on update when any of these changed
    pub sources: &'static [&'static str],
    pub compose: fn(&FieldMap) -> Value,
}

pub struct EntitySchema {
    pub kind: EntityKind,
    pub fields: &'static [FieldSpec],
    /// Collections fetched when a dialog for this entity opens
    pub references: &'static [EntityKind],
    pub constants: &'static [WireConstant],
    pub derived: &'static [DerivedField],
    /// Adjusts a server record before its fields are read
    pub seed: Option<fn(&mut Map<String, Value>)>,
}

impl fmt::Debug for DerivedField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DerivedField")
            .field("mode", &self.mode)
            .field("wire", &self.wire)
            .field("sources", &self.sources)
            .finish()
    }
}

impl fmt::Debug for EntitySchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntitySchema")
            .field("kind", &self.kind)
            .field("fields", &self.fields)
            .field("references", &self.references)
            .field("constants", &self.constants)
            .field("derived", &self.derived)
            .field("seed", &self.seed.is_some())
            .finish()
    }
}

impl EntitySchema {
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn required_fields(&self, mode: Mode) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter().filter(move |f| f.required.applies(mode))
    }

    pub fn derived_for(&self, mode: Mode) -> impl Iterator<Item = &DerivedField> {
        self.derived.iter().filter(move |d| d.mode == mode)
    }

    pub fn constants_for(&self, mode: Mode) -> impl Iterator<Item = &WireConstant> {
        self.constants.iter().filter(move |c| c.mode == mode)
    }

    /// A blank draft's values
    pub fn blank_values(&self) -> FieldMap {
        self.fields.iter().map(|f| (f.name, f.kind.blank())).collect()
    }
}

/// Text of a field, empty when absent or not text
pub fn text_of<'a>(values: &'a FieldMap, name: &str) -> &'a str {
    match values.get(name) {
        Some(FieldValue::Text(s)) => s.as_str(),
        _ => "",
    }
}
