//! Association Set
//!
//! Set-valued field holding foreign IDs of one canonical kind. Members are
//! kept in ascending order so that the transmitted list is stable and two
//! sets with the same members compare equal element by element.

use std::collections::BTreeSet;

use serde_json::Value;

use crate::domain::{DomainError, DomainResult, IdKind, RecordId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssociationSet {
    kind: IdKind,
    ids: BTreeSet<RecordId>,
}

impl AssociationSet {
    pub fn new(kind: IdKind) -> Self {
        Self {
            kind,
            ids: BTreeSet::new(),
        }
    }

    pub fn from_ids<I>(kind: IdKind, ids: I) -> DomainResult<Self>
    where
        I: IntoIterator<Item = RecordId>,
    {
        let mut set = Self::new(kind);
        for id in ids {
            set.insert(id)?;
        }
        Ok(set)
    }

    pub fn kind(&self) -> IdKind {
        self.kind
    }

    /// Bring an ID into this set's representation (`Token("3")` → `Num(3)`)
    fn admit(&self, id: RecordId) -> DomainResult<RecordId> {
        if id.kind() == self.kind {
            return Ok(id);
        }
        self.kind.parse(&id.to_string())
    }

    /// Returns whether the ID was newly added
    pub fn insert(&mut self, id: RecordId) -> DomainResult<bool> {
        let id = self.admit(id)?;
        Ok(self.ids.insert(id))
    }

    /// Returns whether the ID was present
    pub fn remove(&mut self, id: &RecordId) -> bool {
        match self.admit(id.clone()) {
            Ok(id) => self.ids.remove(&id),
            Err(_) => false,
        }
    }

    /// Remove if present, add if absent. Returns membership after the call.
    pub fn toggle(&mut self, id: RecordId) -> DomainResult<bool> {
        let id = self.admit(id)?;
        if self.ids.remove(&id) {
            Ok(false)
        } else {
            self.ids.insert(id);
            Ok(true)
        }
    }

    /// Toggle an ID given as text (checkbox value, CLI argument)
    pub fn toggle_raw(&mut self, raw: &str) -> DomainResult<bool> {
        let id = self.kind.parse(raw)?;
        self.toggle(id)
    }

    pub fn contains(&self, id: &RecordId) -> bool {
        match self.admit(id.clone()) {
            Ok(id) => self.ids.contains(&id),
            Err(_) => false,
        }
    }

    pub fn contains_raw(&self, raw: &str) -> bool {
        self.kind
            .parse(raw)
            .map(|id| self.ids.contains(&id))
            .unwrap_or(false)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RecordId> {
        self.ids.iter()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Transmitted as a plain list
    pub fn to_json(&self) -> Value {
        Value::Array(self.ids.iter().map(RecordId::to_json).collect())
    }

    /// Parse a wire list, dropping duplicates
    pub fn from_json(kind: IdKind, value: &Value) -> DomainResult<Self> {
        match value {
            Value::Null => Ok(Self::new(kind)),
            Value::Array(items) => {
                let ids = items
                    .iter()
                    .map(|item| kind.canonicalize(item))
                    .collect::<DomainResult<Vec<_>>>()?;
                Self::from_ids(kind, ids)
            }
            other => Err(DomainError::InvalidInput(format!("expected an id list, got {}", other))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn numeric(ids: &[i64]) -> AssociationSet {
        AssociationSet::from_ids(IdKind::Numeric, ids.iter().map(|n| RecordId::Num(*n))).unwrap()
    }

    #[test]
    fn test_double_toggle_restores_set() {
        for start in [numeric(&[]), numeric(&[1, 2]), numeric(&[2, 5, 9])] {
            for x in [1, 2, 7] {
                let mut set = start.clone();
                set.toggle(RecordId::Num(x)).unwrap();
                set.toggle(RecordId::Num(x)).unwrap();
                assert_eq!(set, start);
            }
        }
    }

    #[test]
    fn test_toggle_reports_membership() {
        let mut set = numeric(&[1]);
        assert!(!set.toggle(RecordId::Num(1)).unwrap());
        assert!(set.toggle(RecordId::Num(4)).unwrap());
        assert_eq!(set, numeric(&[4]));
    }

    #[test]
    fn test_string_and_number_ids_are_one_member() {
        let mut set = numeric(&[3]);
        assert!(set.contains_raw("3"));
        assert!(set.contains(&RecordId::Token("3".into())));

        assert!(!set.insert(RecordId::Token("3".into())).unwrap());
        assert_eq!(set.len(), 1);

        assert!(!set.toggle_raw("3").unwrap());
        assert!(set.is_empty());
    }

    #[test]
    fn test_invalid_ids_are_rejected() {
        let mut set = numeric(&[]);
        assert!(set.toggle_raw("abc").is_err());
        assert!(!set.contains_raw("abc"));
        assert!(set.is_empty());
    }

    #[test]
    fn test_wire_list_is_deduplicated_and_ordered() {
        let set = AssociationSet::from_json(IdKind::Numeric, &json!([5, "2", 5])).unwrap();
        assert_eq!(set.to_json(), json!([2, 5]));

        let tokens = AssociationSet::from_json(IdKind::Token, &json!(["b", "a"])).unwrap();
        assert_eq!(tokens.to_json(), json!(["a", "b"]));
    }
}
