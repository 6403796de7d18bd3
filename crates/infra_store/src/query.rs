//! Typed query model for the record store
//!
//! A query is a conjunction of predicates. Equality may be applied to any
//! number of fields; range constraints may target at most one field, which is
//! all the backing store's composite indexes can serve. Several bounds on the
//! same field are merged into a single range.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;
use std::str::FromStr;
use uuid::Uuid;

use core_kernel::{PortError, UserId};

/// A literal a predicate compares against
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum FieldValue {
    Str(String),
    Int(i64),
    Decimal(Decimal),
    Bool(bool),
    Timestamp(DateTime<Utc>),
    Uuid(Uuid),
}

impl FieldValue {
    /// Orders a stored JSON value relative to this literal.
    ///
    /// Returns `None` when the stored value is missing or cannot be read as
    /// the literal's type; such documents never match.
    pub fn compare_stored(&self, stored: &Value) -> Option<Ordering> {
        match self {
            FieldValue::Str(expected) => stored.as_str().map(|s| s.cmp(expected.as_str())),
            FieldValue::Int(expected) => match stored {
                Value::Number(n) => n
                    .as_i64()
                    .map(|v| v.cmp(expected))
                    .or_else(|| n.as_f64().and_then(|v| v.partial_cmp(&(*expected as f64)))),
                Value::String(s) => s.parse::<i64>().ok().map(|v| v.cmp(expected)),
                _ => None,
            },
            FieldValue::Decimal(expected) => decimal_of(stored).map(|v| v.cmp(expected)),
            FieldValue::Bool(expected) => stored.as_bool().map(|v| v.cmp(expected)),
            FieldValue::Timestamp(expected) => timestamp_of(stored).map(|v| v.cmp(expected)),
            FieldValue::Uuid(expected) => stored
                .as_str()
                .and_then(|s| Uuid::parse_str(s).ok())
                .map(|v| v.cmp(expected)),
        }
    }

    /// The textual form used when binding against a JSONB `->>` projection
    pub fn as_text(&self) -> String {
        match self {
            FieldValue::Str(s) => s.clone(),
            FieldValue::Int(i) => i.to_string(),
            FieldValue::Decimal(d) => d.to_string(),
            FieldValue::Bool(b) => b.to_string(),
            FieldValue::Timestamp(t) => t.to_rfc3339(),
            FieldValue::Uuid(u) => u.to_string(),
        }
    }

    /// SQL type the projected text is cast to before comparing
    pub fn sql_cast(&self) -> &'static str {
        match self {
            FieldValue::Str(_) | FieldValue::Bool(_) => "text",
            FieldValue::Int(_) => "bigint",
            FieldValue::Decimal(_) => "numeric",
            FieldValue::Timestamp(_) => "timestamptz",
            FieldValue::Uuid(_) => "uuid",
        }
    }
}

pub(crate) fn decimal_of(stored: &Value) -> Option<Decimal> {
    match stored {
        Value::String(s) => Decimal::from_str(s).ok(),
        Value::Number(n) => Decimal::from_str(&n.to_string())
            .ok()
            .or_else(|| Decimal::from_scientific(&n.to_string()).ok()),
        _ => None,
    }
}

pub(crate) fn timestamp_of(stored: &Value) -> Option<DateTime<Utc>> {
    stored
        .as_str()
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Str(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Str(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Int(value)
    }
}

impl From<Decimal> for FieldValue {
    fn from(value: Decimal) -> Self {
        FieldValue::Decimal(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(value: DateTime<Utc>) -> Self {
        FieldValue::Timestamp(value)
    }
}

impl From<Uuid> for FieldValue {
    fn from(value: Uuid) -> Self {
        FieldValue::Uuid(value)
    }
}

/// Owner ids are matched as plain text so the `userId` indexes apply
impl From<UserId> for FieldValue {
    fn from(value: UserId) -> Self {
        FieldValue::Str(value.as_uuid().to_string())
    }
}

/// A single constraint on a named field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Predicate {
    /// Field equals the value
    Eq { field: String, value: FieldValue },
    /// Field lies within the inclusive bounds; a missing bound is open
    Range {
        field: String,
        lower: Option<FieldValue>,
        upper: Option<FieldValue>,
    },
}

impl Predicate {
    pub fn field(&self) -> &str {
        match self {
            Predicate::Eq { field, .. } | Predicate::Range { field, .. } => field,
        }
    }

    /// Evaluates the predicate against a document body
    pub fn matches(&self, body: &Value) -> bool {
        let Some(stored) = body.get(self.field()) else {
            return false;
        };
        match self {
            Predicate::Eq { value, .. } => value.compare_stored(stored) == Some(Ordering::Equal),
            Predicate::Range { lower, upper, .. } => {
                let above = lower.as_ref().map_or(true, |lo| {
                    matches!(lo.compare_stored(stored), Some(Ordering::Greater | Ordering::Equal))
                });
                let below = upper.as_ref().map_or(true, |hi| {
                    matches!(hi.compare_stored(stored), Some(Ordering::Less | Ordering::Equal))
                });
                above && below
            }
        }
    }
}

/// A conjunction of predicates
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreQuery {
    predicates: Vec<Predicate>,
}

impl StoreQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an equality constraint
    pub fn eq(mut self, field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.predicates.push(Predicate::Eq {
            field: field.into(),
            value: value.into(),
        });
        self
    }

    /// Adds an inclusive lower bound
    pub fn gte(self, field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.bound(field.into(), Some(value.into()), None)
    }

    /// Adds an inclusive upper bound
    pub fn lte(self, field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.bound(field.into(), None, Some(value.into()))
    }

    /// Adds both inclusive bounds
    pub fn between(
        self,
        field: impl Into<String>,
        lower: impl Into<FieldValue>,
        upper: impl Into<FieldValue>,
    ) -> Self {
        self.bound(field.into(), Some(lower.into()), Some(upper.into()))
    }

    fn bound(mut self, field: String, lower: Option<FieldValue>, upper: Option<FieldValue>) -> Self {
        let existing = self.predicates.iter_mut().find_map(|p| match p {
            Predicate::Range { field: f, lower, upper } if *f == field => Some((lower, upper)),
            _ => None,
        });
        match existing {
            Some((lo, hi)) => {
                if lower.is_some() {
                    *lo = lower;
                }
                if upper.is_some() {
                    *hi = upper;
                }
            }
            None => self.predicates.push(Predicate::Range { field, lower, upper }),
        }
        self
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    /// The field carrying the range constraint, if any
    pub fn range_field(&self) -> Option<&str> {
        self.predicates.iter().find_map(|p| match p {
            Predicate::Range { field, .. } => Some(field.as_str()),
            _ => None,
        })
    }

    /// Rejects queries the backing store cannot serve
    pub fn validate(&self) -> Result<(), PortError> {
        let mut range_field: Option<&str> = None;
        for predicate in &self.predicates {
            if let Predicate::Range { field, .. } = predicate {
                match range_field {
                    Some(first) if first != field => {
                        return Err(PortError::validation_field(
                            format!(
                                "unsupported query: range constraints on both '{}' and '{}'",
                                first, field
                            ),
                            field.clone(),
                        ));
                    }
                    _ => range_field = Some(field),
                }
            }
        }
        Ok(())
    }

    /// Evaluates every predicate against a document body
    pub fn matches(&self, body: &Value) -> bool {
        self.predicates.iter().all(|p| p.matches(body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_bounds_on_same_field_merge() {
        let lo = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let hi = Utc.with_ymd_and_hms(2024, 1, 31, 0, 0, 0).unwrap();
        let query = StoreQuery::new().eq("userId", "u1").gte("date", lo).lte("date", hi);

        assert_eq!(query.predicates().len(), 2);
        assert_eq!(query.range_field(), Some("date"));
        assert!(query.validate().is_ok());
    }

    #[test]
    fn test_range_on_two_fields_is_rejected() {
        let query = StoreQuery::new()
            .gte("date", Utc::now())
            .gte("amount", dec!(10));

        let err = query.validate().unwrap_err();
        assert!(matches!(err, PortError::Validation { field: Some(ref f), .. } if f == "amount"));
    }

    #[test]
    fn test_timestamps_compare_chronologically() {
        let body = json!({"date": "2024-01-05T10:00:00.5Z"});
        let query = StoreQuery::new().between(
            "date",
            Utc.with_ymd_and_hms(2024, 1, 5, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 5, 23, 59, 59).unwrap(),
        );
        assert!(query.matches(&body));

        let later = json!({"date": "2024-01-06T00:00:00+00:00"});
        assert!(!query.matches(&later));
    }

    #[test]
    fn test_decimals_compare_numerically() {
        let query = StoreQuery::new().gte("amount", dec!(50));
        assert!(query.matches(&json!({"amount": "300.00"})));
        assert!(query.matches(&json!({"amount": 50})));
        assert!(!query.matches(&json!({"amount": "7"})));
    }

    #[test]
    fn test_missing_field_never_matches() {
        let query = StoreQuery::new().eq("state", "open");
        assert!(!query.matches(&json!({"userId": "u1"})));
    }

    #[test]
    fn test_uuid_equality() {
        let id = Uuid::new_v4();
        let query = StoreQuery::new().eq("userId", id);
        assert!(query.matches(&json!({"userId": id.to_string()})));
        assert!(!query.matches(&json!({"userId": Uuid::new_v4().to_string()})));
    }
}
