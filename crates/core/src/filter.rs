//! Single-column filters (`field <op> value`).
//!
//! A filter has two renderings: a PostgREST query pair (`created_at=lt.…`)
//! used by the HTTP store adapter, and an in-memory predicate used by the
//! test/dev store. Both must agree on which records match.

use core::cmp::Ordering;
use core::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::clock::iso_timestamp;
use crate::error::DomainError;
use crate::record::Record;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterOp {
    Eq,
    Neq,
    Lt,
    Lte,
    Gt,
    Gte,
}

impl FilterOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOp::Eq => "eq",
            FilterOp::Neq => "neq",
            FilterOp::Lt => "lt",
            FilterOp::Lte => "lte",
            FilterOp::Gt => "gt",
            FilterOp::Gte => "gte",
        }
    }

    fn accepts(&self, ord: Ordering) -> bool {
        match self {
            FilterOp::Eq => ord == Ordering::Equal,
            FilterOp::Neq => ord != Ordering::Equal,
            FilterOp::Lt => ord == Ordering::Less,
            FilterOp::Lte => ord != Ordering::Greater,
            FilterOp::Gt => ord == Ordering::Greater,
            FilterOp::Gte => ord != Ordering::Less,
        }
    }
}

impl FromStr for FilterOp {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "eq" => Ok(FilterOp::Eq),
            "neq" => Ok(FilterOp::Neq),
            "lt" => Ok(FilterOp::Lt),
            "lte" => Ok(FilterOp::Lte),
            "gt" => Ok(FilterOp::Gt),
            "gte" => Ok(FilterOp::Gte),
            other => Err(DomainError::UnknownOperator(other.to_string())),
        }
    }
}

/// `field <op> value` over one top-level field of a record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    pub field: String,
    pub op: FilterOp,
    pub value: Value,
}

impl Filter {
    pub fn new(field: impl Into<String>, op: FilterOp, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            op,
            value: value.into(),
        }
    }

    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, FilterOp::Eq, value)
    }

    pub fn lt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, FilterOp::Lt, value)
    }

    /// `field < at`, with `at` rendered the way timestamp columns are written.
    pub fn before(field: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self::lt(field, iso_timestamp(at))
    }

    /// PostgREST horizontal filter: `(field, "op.value")`.
    pub fn to_query_pair(&self) -> (String, String) {
        let rendered = match &self.value {
            Value::String(s) => s.clone(),
            Value::Null => "null".to_string(),
            other => other.to_string(),
        };
        (self.field.clone(), format!("{}.{}", self.op.as_str(), rendered))
    }

    /// Evaluate against a record. Missing fields and `null`s never match,
    /// mirroring SQL comparison semantics.
    pub fn matches(&self, record: &Record) -> bool {
        let Some(actual) = record.get(&self.field) else {
            return false;
        };
        if actual.is_null() || self.value.is_null() {
            return false;
        }
        match compare_values(actual, &self.value) {
            Some(ord) => self.op.accepts(ord),
            None => match self.op {
                FilterOp::Eq => actual == &self.value,
                FilterOp::Neq => actual != &self.value,
                _ => false,
            },
        }
    }
}

/// Order two JSON scalars. Strings that both parse as RFC-3339 instants are
/// compared chronologically (offsets may differ), other strings lexically.
fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::String(x), Value::String(y)) => {
            match (DateTime::parse_from_rfc3339(x), DateTime::parse_from_rfc3339(y)) {
                (Ok(tx), Ok(ty)) => Some(tx.cmp(&ty)),
                _ => Some(x.cmp(y)),
            }
        }
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn renders_postgrest_pairs() {
        let at = Utc.with_ymd_and_hms(2026, 10, 10, 3, 0, 0).unwrap();
        assert_eq!(
            Filter::before("created_at", at).to_query_pair(),
            ("created_at".to_string(), "lt.2026-10-10T03:00:00.000Z".to_string())
        );
        assert_eq!(
            Filter::eq("is_checked_out", true).to_query_pair(),
            ("is_checked_out".to_string(), "eq.true".to_string())
        );
        assert_eq!(
            Filter::new("total_slots", FilterOp::Gte, 25).to_query_pair(),
            ("total_slots".to_string(), "gte.25".to_string())
        );
    }

    #[test]
    fn timestamps_compare_chronologically_across_offsets() {
        let f = Filter::lt("created_at", "2026-10-10T03:00:00.000Z");
        // 02:30 UTC expressed with a +01:00 offset
        assert!(f.matches(&json!({"created_at": "2026-10-10T03:30:00+01:00"})));
        assert!(!f.matches(&json!({"created_at": "2026-10-10T03:00:00Z"})));
        assert!(!f.matches(&json!({"created_at": "2026-10-11T00:00:00Z"})));
    }

    #[test]
    fn missing_and_null_fields_never_match() {
        let f = Filter::lt("created_at", "2026-10-10T03:00:00.000Z");
        assert!(!f.matches(&json!({"id": 1})));
        assert!(!f.matches(&json!({"created_at": null})));
        assert!(!Filter::new("x", FilterOp::Neq, 1).matches(&json!({"x": null})));
    }

    #[test]
    fn numbers_and_bools() {
        assert!(Filter::new("n", FilterOp::Gt, 2).matches(&json!({"n": 2.5})));
        assert!(Filter::new("n", FilterOp::Lte, 2).matches(&json!({"n": 2})));
        assert!(Filter::eq("flag", true).matches(&json!({"flag": true})));
        assert!(Filter::new("flag", FilterOp::Neq, true).matches(&json!({"flag": false})));
    }

    #[test]
    fn mismatched_types_only_satisfy_neq() {
        assert!(!Filter::lt("n", "5").matches(&json!({"n": 1})));
        assert!(Filter::new("n", FilterOp::Neq, "1").matches(&json!({"n": 1})));
    }

    #[test]
    fn parses_operators() {
        assert_eq!("lte".parse::<FilterOp>().unwrap(), FilterOp::Lte);
        assert!(matches!(
            "like".parse::<FilterOp>(),
            Err(DomainError::UnknownOperator(op)) if op == "like"
        ));
    }
}
