//! Collections that accept query restrictions.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value as JsonValue;

use crate::errors::FilterError;
use crate::lookup::Lookup;
use crate::mapping::LOOKUP_SEP;
use crate::value::FilterValue;

/// One `expression = value` filter.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    /// The de-tupled filter map expression this condition came from.
    pub expression: String,
    pub field: String,
    pub lookup: Lookup,
    pub value: FilterValue,
}

/// Conjunction of conditions applied to a collection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Restriction {
    conditions: Vec<Condition>,
}

impl Restriction {
    pub fn new(conditions: Vec<Condition>) -> Self {
        Self { conditions }
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    /// `expression → value`, the keyword-argument view of the restriction.
    pub fn to_kwargs(&self) -> BTreeMap<String, FilterValue> {
        self.conditions
            .iter()
            .map(|condition| (condition.expression.clone(), condition.value.clone()))
            .collect()
    }
}

/// Anything a restriction can be applied to.
pub trait Collection: Sized {
    fn restrict(self, restriction: &Restriction) -> Result<Self, FilterError>;
}

/// In-memory collection of JSON rows.
///
/// Field paths are resolved by splitting on `__` into nested objects, so
/// `user__first_name` reads `row["user"]["first_name"]`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryCollection {
    rows: Vec<JsonValue>,
}

impl MemoryCollection {
    pub fn new(rows: Vec<JsonValue>) -> Self {
        Self { rows }
    }

    /// Load rows from a JSON array.
    pub fn from_json(text: &str) -> Result<Self, FilterError> {
        let rows: Vec<JsonValue> = serde_json::from_str(text)?;
        Ok(Self::new(rows))
    }

    pub fn rows(&self) -> &[JsonValue] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<JsonValue> {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl Collection for MemoryCollection {
    fn restrict(self, restriction: &Restriction) -> Result<Self, FilterError> {
        let mut kept = Vec::with_capacity(self.rows.len());
        for row in self.rows {
            let mut keep = true;
            for condition in restriction.conditions() {
                if !matches_condition(&row, condition)? {
                    keep = false;
                    break;
                }
            }
            if keep {
                kept.push(row);
            }
        }
        Ok(Self::new(kept))
    }
}

impl Collection for Vec<JsonValue> {
    fn restrict(self, restriction: &Restriction) -> Result<Self, FilterError> {
        MemoryCollection::new(self).restrict(restriction).map(MemoryCollection::into_rows)
    }
}

fn resolve_path<'a>(row: &'a JsonValue, path: &str) -> Option<&'a JsonValue> {
    path.split(LOOKUP_SEP).try_fold(row, |current, segment| current.get(segment))
}

fn matches_condition(row: &JsonValue, condition: &Condition) -> Result<bool, FilterError> {
    let stored = resolve_path(row, &condition.field).filter(|value| !value.is_null());
    let expected = &condition.value;

    let matched = match &condition.lookup {
        Lookup::IsNull => match expected.as_bool() {
            Some(want_null) => stored.is_none() == want_null,
            None => true,
        },
        Lookup::In => match (stored, expected) {
            (Some(stored), FilterValue::List(items)) => {
                items.iter().any(|item| compare(stored, item) == Some(Ordering::Equal))
            }
            _ => false,
        },
        lookup => {
            let Some(stored) = stored else {
                return Ok(false);
            };
            match lookup {
                Lookup::Exact => compare(stored, expected) == Some(Ordering::Equal),
                Lookup::Gt => compare(stored, expected) == Some(Ordering::Greater),
                Lookup::Gte => matches!(compare(stored, expected), Some(Ordering::Greater | Ordering::Equal)),
                Lookup::Lt => compare(stored, expected) == Some(Ordering::Less),
                Lookup::Lte => matches!(compare(stored, expected), Some(Ordering::Less | Ordering::Equal)),
                Lookup::DateGte => {
                    matches!(compare_dates(stored, expected), Some(Ordering::Greater | Ordering::Equal))
                }
                Lookup::DateLte => matches!(compare_dates(stored, expected), Some(Ordering::Less | Ordering::Equal)),
                Lookup::IExact => text_match(stored, expected, true, |s, e| s == e),
                Lookup::Contains => text_match(stored, expected, false, |s, e| s.contains(e)),
                Lookup::IContains => text_match(stored, expected, true, |s, e| s.contains(e)),
                Lookup::StartsWith => text_match(stored, expected, false, |s, e| s.starts_with(e)),
                Lookup::IStartsWith => text_match(stored, expected, true, |s, e| s.starts_with(e)),
                Lookup::EndsWith => text_match(stored, expected, false, |s, e| s.ends_with(e)),
                Lookup::IEndsWith => text_match(stored, expected, true, |s, e| s.ends_with(e)),
                Lookup::Custom(token) => {
                    return Err(FilterError::UnsupportedLookup {
                        field: condition.field.clone(),
                        lookup: token.clone(),
                    });
                }
                Lookup::IsNull | Lookup::In => unreachable!("handled above"),
            }
        }
    };
    Ok(matched)
}

fn text_match(stored: &JsonValue, expected: &FilterValue, fold_case: bool, test: fn(&str, &str) -> bool) -> bool {
    let stored = match stored {
        JsonValue::String(text) => text.clone(),
        other => other.to_string(),
    };
    let expected = expected.to_string();
    if fold_case {
        test(&stored.to_lowercase(), &expected.to_lowercase())
    } else {
        test(&stored, &expected)
    }
}

fn compare(stored: &JsonValue, expected: &FilterValue) -> Option<Ordering> {
    match expected {
        FilterValue::Null | FilterValue::List(_) => None,
        FilterValue::Text(text) => stored.as_str().map(|value| value.cmp(text.as_str())),
        FilterValue::Integer(number) => match (stored.as_i64(), stored.as_u64()) {
            (Some(value), _) => Some(value.cmp(number)),
            (None, Some(_)) => Some(Ordering::Greater),
            (None, None) => stored.as_f64().and_then(|value| value.partial_cmp(&(*number as f64))),
        },
        FilterValue::Float(number) => stored.as_f64().and_then(|value| value.partial_cmp(number)),
        FilterValue::Bool(flag) => stored.as_bool().map(|value| value.cmp(flag)),
        FilterValue::Date(date) => stored_date(stored).map(|value| value.cmp(date)),
        FilterValue::DateTime(moment) => stored_datetime(stored).map(|value| value.cmp(moment)),
        FilterValue::Uuid(id) => stored
            .as_str()
            .and_then(|value| uuid::Uuid::parse_str(value).ok())
            .map(|value| value.cmp(id)),
    }
}

fn compare_dates(stored: &JsonValue, expected: &FilterValue) -> Option<Ordering> {
    let expected = match expected {
        FilterValue::Date(date) => *date,
        FilterValue::DateTime(moment) => moment.date_naive(),
        _ => return None,
    };
    stored_date(stored).map(|value| value.cmp(&expected))
}

fn stored_date(stored: &JsonValue) -> Option<NaiveDate> {
    let text = stored.as_str()?;
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .or_else(|| stored_datetime(stored).map(|moment| moment.date_naive()))
}

fn stored_datetime(stored: &JsonValue) -> Option<DateTime<Utc>> {
    let text = stored.as_str()?;
    if let Ok(moment) = DateTime::parse_from_rfc3339(text) {
        return Some(moment.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S"))
        .ok()
        .map(|naive| naive.and_utc())
        .or_else(|| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
                .map(|naive| naive.and_utc())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn condition(field: &str, lookup: Lookup, value: impl Into<FilterValue>) -> Condition {
        Condition {
            expression: field.to_string(),
            field: field.to_string(),
            lookup,
            value: value.into(),
        }
    }

    fn people() -> MemoryCollection {
        MemoryCollection::new(vec![
            json!({"id": 1, "gender": "Male", "age": 31, "user": {"first_name": "Jo"}, "born": "1993-04-01", "left_at": null}),
            json!({"id": 2, "gender": "Female", "age": 25, "user": {"first_name": "Ana"}, "born": "1999-12-24T08:30:00Z"}),
            json!({"id": 3, "gender": "Male", "age": 47, "user": {"first_name": "joanna"}, "born": "1977-01-15", "left_at": "2020-01-01"}),
        ])
    }

    fn ids(collection: &MemoryCollection) -> Vec<i64> {
        collection.rows().iter().filter_map(|row| row["id"].as_i64()).collect()
    }

    #[test]
    fn large_integers_compare_exactly() {
        let rows = MemoryCollection::new(vec![
            json!({"id": 1, "serial": 9_007_199_254_740_993_i64}),
            json!({"id": 2, "serial": 9_007_199_254_740_992_i64}),
            json!({"id": 3, "serial": u64::MAX}),
        ]);
        let exact = Restriction::new(vec![condition("serial", Lookup::Exact, 9_007_199_254_740_993_i64)]);
        assert_eq!(ids(&rows.clone().restrict(&exact).expect("filters")), [1]);

        let above = Restriction::new(vec![condition("serial", Lookup::Gt, 9_007_199_254_740_992_i64)]);
        assert_eq!(ids(&rows.restrict(&above).expect("filters")), [1, 3]);
    }

    #[test]
    fn conditions_are_conjunctive() {
        let restriction = Restriction::new(vec![
            condition("user__first_name", Lookup::Exact, "Jo"),
            condition("gender", Lookup::Exact, "Male"),
        ]);
        let filtered = people().restrict(&restriction).expect("restriction applies");
        assert_eq!(ids(&filtered), [1]);
    }

    #[test]
    fn range_and_date_lookups() {
        let older = Restriction::new(vec![condition("age", Lookup::Gte, 31i64)]);
        assert_eq!(ids(&people().restrict(&older).expect("applies")), [1, 3]);

        let born_after = NaiveDate::from_ymd_opt(1990, 1, 1).map(FilterValue::Date).unwrap_or(FilterValue::Null);
        let recent = Restriction::new(vec![condition("born", Lookup::DateGte, born_after)]);
        assert_eq!(ids(&people().restrict(&recent).expect("applies")), [1, 2]);
    }

    #[test]
    fn text_and_null_lookups() {
        let prefix = Restriction::new(vec![condition("user__first_name", Lookup::IStartsWith, "JO")]);
        assert_eq!(ids(&people().restrict(&prefix).expect("applies")), [1, 3]);

        let still_here = Restriction::new(vec![condition("left_at", Lookup::IsNull, true)]);
        assert_eq!(ids(&people().restrict(&still_here).expect("applies")), [1, 2]);

        let listed = Restriction::new(vec![condition(
            "age",
            Lookup::In,
            FilterValue::List(vec![FilterValue::Integer(25), FilterValue::Integer(47)]),
        )]);
        assert_eq!(ids(&people().restrict(&listed).expect("applies")), [2, 3]);
    }

    #[test]
    fn custom_lookup_is_rejected() {
        let restriction = Restriction::new(vec![condition("age", Lookup::Custom("regex".into()), "4.")]);
        let err = people().restrict(&restriction).expect_err("custom lookups are not evaluated");
        assert!(matches!(err, FilterError::UnsupportedLookup { ref lookup, .. } if lookup == "regex"));
    }

    #[test]
    fn empty_restriction_keeps_everything() {
        assert_eq!(people().restrict(&Restriction::default()).expect("applies"), people());
    }
}
