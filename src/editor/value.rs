//! Field Kinds and Values
//!
//! Dates are held as calendar dates and shown as `YYYY-MM-DD`. The
//! `YYYY-MM-DDT00:00:00` form only exists in outgoing payloads.

use chrono::NaiveDate;
use serde_json::Value;

use super::association::AssociationSet;
use crate::domain::{IdKind, RecordId};

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIMESTAMP_SUFFIX: &str = "T00:00:00";

/// Declared type of a form field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Number { default: i64 },
    /// `timestamp` fields are expanded to midnight on submit
    Date { timestamp: bool },
    /// Single optional reference (select box)
    Ref(IdKind),
    /// Association field (checkbox list)
    RefSet(IdKind),
}

/// Current value of a form field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    Number(i64),
    Date(Option<NaiveDate>),
    Ref(Option<RecordId>),
    RefSet(AssociationSet),
}

impl FieldKind {
    pub fn label(&self) -> &'static str {
        match self {
            FieldKind::Text => "text",
            FieldKind::Number { .. } => "number",
            FieldKind::Date { .. } => "date",
            FieldKind::Ref(_) => "reference",
            FieldKind::RefSet(_) => "reference set",
        }
    }

    pub fn blank(&self) -> FieldValue {
        match self {
            FieldKind::Text => FieldValue::Text(String::new()),
            FieldKind::Number { default } => FieldValue::Number(*default),
            FieldKind::Date { .. } => FieldValue::Date(None),
            FieldKind::Ref(_) => FieldValue::Ref(None),
            FieldKind::RefSet(kind) => FieldValue::RefSet(AssociationSet::new(*kind)),
        }
    }

    /// Shape check only; IDs are canonicalised by the caller
    pub fn accepts(&self, value: &FieldValue) -> bool {
        matches!(
            (self, value),
            (FieldKind::Text, FieldValue::Text(_))
                | (FieldKind::Number { .. }, FieldValue::Number(_))
                | (FieldKind::Date { .. }, FieldValue::Date(_))
                | (FieldKind::Ref(_), FieldValue::Ref(_))
                | (FieldKind::RefSet(_), FieldValue::RefSet(_))
        )
    }

    /// Parse text typed into an input
    pub fn parse(&self, raw: &str) -> Result<FieldValue, String> {
        match self {
            FieldKind::Text => Ok(FieldValue::Text(raw.to_string())),
            FieldKind::Number { default } => {
                let raw = raw.trim();
                if raw.is_empty() {
                    return Ok(FieldValue::Number(*default));
                }
                raw.parse::<i64>()
                    .map(FieldValue::Number)
                    .map_err(|_| format!("not a number: {}", raw))
            }
            FieldKind::Date { .. } => parse_date(raw).map(FieldValue::Date),
            FieldKind::Ref(kind) => {
                if raw.trim().is_empty() {
                    return Ok(FieldValue::Ref(None));
                }
                kind.parse(raw).map(|id| FieldValue::Ref(Some(id))).map_err(|e| e.to_string())
            }
            FieldKind::RefSet(kind) => {
                let ids = raw
                    .split(',')
                    .filter(|part| !part.trim().is_empty())
                    .map(|part| kind.parse(part))
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(|e| e.to_string())?;
                AssociationSet::from_ids(*kind, ids)
                    .map(FieldValue::RefSet)
                    .map_err(|e| e.to_string())
            }
        }
    }

    /// Read a value from a server record
    pub fn from_wire(&self, value: &Value) -> Result<FieldValue, String> {
        match (self, value) {
            (_, Value::Null) => Ok(self.blank()),
            (FieldKind::Text, Value::String(s)) => Ok(FieldValue::Text(s.clone())),
            (FieldKind::Text, other) => Ok(FieldValue::Text(other.to_string())),
            (FieldKind::Number { .. }, Value::Number(n)) => n
                .as_i64()
                .map(FieldValue::Number)
                .ok_or_else(|| format!("not an integer: {}", n)),
            (FieldKind::Number { .. }, Value::String(s)) => self.parse(s),
            (FieldKind::Date { .. }, Value::String(s)) => parse_date(s).map(FieldValue::Date),
            (FieldKind::Ref(_), Value::Number(n)) if n.as_i64() == Some(0) => Ok(FieldValue::Ref(None)),
            (FieldKind::Ref(_), Value::String(s)) if s.trim().is_empty() => Ok(FieldValue::Ref(None)),
            (FieldKind::Ref(kind), other) => kind
                .canonicalize(other)
                .map(|id| FieldValue::Ref(Some(id)))
                .map_err(|e| e.to_string()),
            (FieldKind::RefSet(kind), other) => AssociationSet::from_json(*kind, other)
                .map(FieldValue::RefSet)
                .map_err(|e| e.to_string()),
            (kind, other) => Err(format!("expected {}, got {}", kind.label(), other)),
        }
    }
}

impl FieldValue {
    /// Empty after trimming, unset, or an empty association
    pub fn is_blank(&self) -> bool {
        match self {
            FieldValue::Text(s) => s.trim().is_empty(),
            FieldValue::Number(_) => false,
            FieldValue::Date(d) => d.is_none(),
            FieldValue::Ref(r) => r.is_none(),
            FieldValue::RefSet(set) => set.is_empty(),
        }
    }

    /// Outgoing representation; timestamp dates are expanded here only
    pub fn to_wire(&self, kind: &FieldKind) -> Value {
        match self {
            FieldValue::Text(s) => Value::from(s.as_str()),
            FieldValue::Number(n) => Value::from(*n),
            FieldValue::Date(None) => Value::Null,
            FieldValue::Date(Some(date)) => {
                let mut text = date.format(DATE_FORMAT).to_string();
                if matches!(kind, FieldKind::Date { timestamp: true }) {
                    text.push_str(TIMESTAMP_SUFFIX);
                }
                Value::from(text)
            }
            FieldValue::Ref(None) => Value::Null,
            FieldValue::Ref(Some(id)) => id.to_json(),
            FieldValue::RefSet(set) => set.to_json(),
        }
    }

    /// Text shown in an input
    pub fn display(&self) -> String {
        match self {
            FieldValue::Text(s) => s.clone(),
            FieldValue::Number(n) => n.to_string(),
            FieldValue::Date(None) | FieldValue::Ref(None) => String::new(),
            FieldValue::Date(Some(date)) => date.format(DATE_FORMAT).to_string(),
            FieldValue::Ref(Some(id)) => id.to_string(),
            FieldValue::RefSet(set) => set.iter().map(|id| id.to_string()).collect::<Vec<_>>().join(","),
        }
    }
}

/// Accepts `YYYY-MM-DD`, or a longer timestamp whose first ten characters are one
pub fn parse_date(raw: &str) -> Result<Option<NaiveDate>, String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    let day = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(day, DATE_FORMAT)
        .map(Some)
        .map_err(|_| format!("not a date: {}", raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_date_expanded_only_on_the_wire() {
        let kind = FieldKind::Date { timestamp: true };
        let value = kind.parse("2024-03-05").unwrap();

        assert_eq!(value.to_wire(&kind), json!("2024-03-05T00:00:00"));
        assert_eq!(value.display(), "2024-03-05");
        assert_eq!(value.to_wire(&FieldKind::Date { timestamp: false }), json!("2024-03-05"));
    }

    #[test]
    fn test_server_timestamps_are_cut_to_days() {
        let kind = FieldKind::Date { timestamp: true };
        let value = kind.from_wire(&json!("2023-11-30T08:15:00")).unwrap();
        assert_eq!(value.display(), "2023-11-30");
    }

    #[test]
    fn test_bad_dates_are_errors() {
        assert!(parse_date("05/03/2024").is_err());
        assert!(parse_date("2024-13-01").is_err());
        assert_eq!(parse_date("  ").unwrap(), None);
    }

    #[test]
    fn test_blankness() {
        assert!(FieldValue::Text("   ".into()).is_blank());
        assert!(!FieldValue::Text(" a ".into()).is_blank());
        assert!(FieldValue::Ref(None).is_blank());
        assert!(FieldValue::RefSet(AssociationSet::new(IdKind::Numeric)).is_blank());
        assert!(!FieldValue::Number(0).is_blank());
    }

    #[test]
    fn test_reference_parsing() {
        let kind = FieldKind::Ref(IdKind::Numeric);
        assert_eq!(kind.parse("").unwrap(), FieldValue::Ref(None));
        assert_eq!(kind.parse("4").unwrap(), FieldValue::Ref(Some(RecordId::Num(4))));
        assert_eq!(kind.from_wire(&json!(0)).unwrap(), FieldValue::Ref(None));
        assert_eq!(kind.from_wire(&json!("7")).unwrap(), FieldValue::Ref(Some(RecordId::Num(7))));
        assert!(kind.parse("x").is_err());
    }

    #[test]
    fn test_number_defaults() {
        let kind = FieldKind::Number { default: 1 };
        assert_eq!(kind.blank(), FieldValue::Number(1));
        assert_eq!(kind.parse("").unwrap(), FieldValue::Number(1));
        assert_eq!(kind.from_wire(&json!("3")).unwrap(), FieldValue::Number(3));
    }
}
