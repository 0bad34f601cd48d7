//! Parameter translation: inverting filter maps and narrowing parameters to
//! the ones a map accepts.

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveTime};

use crate::value::FilterValue;

/// Values that count as "not supplied" when selecting parameters.
pub trait Blank {
    fn is_blank(&self) -> bool;
}

impl Blank for str {
    fn is_blank(&self) -> bool {
        self.is_empty()
    }
}

impl Blank for String {
    fn is_blank(&self) -> bool {
        self.is_empty()
    }
}

impl<T: Blank + ?Sized> Blank for &T {
    fn is_blank(&self) -> bool {
        (**self).is_blank()
    }
}

impl<T: Blank> Blank for Option<T> {
    fn is_blank(&self) -> bool {
        self.as_ref().is_none_or(Blank::is_blank)
    }
}

impl Blank for FilterValue {
    fn is_blank(&self) -> bool {
        match self {
            FilterValue::Null => true,
            FilterValue::Text(value) => value.is_empty(),
            _ => false,
        }
    }
}

/// Swap keys and values.
///
/// Values must be unique; when they are not, the last key wins.
pub fn invert<K, V>(mapping: &BTreeMap<K, V>) -> BTreeMap<V, K>
where
    K: Ord + Clone,
    V: Ord + Clone,
{
    mapping.iter().map(|(key, value)| (value.clone(), key.clone())).collect()
}

/// Keep the parameters whose key appears in `mapping`, renamed to the mapped
/// target. Blank values and unknown keys are dropped.
pub fn select_applicable<K, V, I>(params: I, mapping: &BTreeMap<String, String>) -> BTreeMap<String, V>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: Blank,
{
    params
        .into_iter()
        .filter(|(_, value)| !value.is_blank())
        .filter_map(|(key, value)| mapping.get(key.as_ref()).map(|target| (target.clone(), value)))
        .collect()
}

const LEGACY_DATE_KEYS: [&str; 2] = ["start_date", "end_date"];
const LEGACY_APPROVED_KEY: &str = "approved";

/// Coerce the legacy `start_date`, `end_date` and `approved` parameters.
///
/// Date strings are read as `%Y-%m-%d` at UTC midnight and silently dropped
/// when unparseable. `approved` accepts `true|True|1` and `false|False|0`;
/// anything else removes it.
pub fn coerce_legacy_params(mut values: BTreeMap<String, FilterValue>) -> BTreeMap<String, FilterValue> {
    for key in LEGACY_DATE_KEYS {
        let Some(raw) = values.remove(key) else {
            continue;
        };
        let coerced = match raw {
            FilterValue::Date(_) | FilterValue::DateTime(_) => Some(raw),
            FilterValue::Text(text) if !text.is_empty() => parse_legacy_date(&text),
            _ => None,
        };
        match coerced {
            Some(value) => {
                values.insert(key.to_string(), value);
            }
            None => log::debug!("dropping unparseable legacy parameter {key}"),
        }
    }

    if let Some(raw) = values.remove(LEGACY_APPROVED_KEY) {
        let flag = match raw {
            FilterValue::Bool(flag) => Some(flag),
            FilterValue::Text(text) => match text.as_str() {
                "true" | "True" | "1" => Some(true),
                "false" | "False" | "0" => Some(false),
                _ => None,
            },
            _ => None,
        };
        if let Some(flag) = flag {
            values.insert(LEGACY_APPROVED_KEY.to_string(), FilterValue::Bool(flag));
        }
    }

    values
}

fn parse_legacy_date(text: &str) -> Option<FilterValue> {
    let date = NaiveDate::parse_from_str(text, "%Y-%m-%d").ok()?;
    Some(FilterValue::DateTime(date.and_time(NaiveTime::MIN).and_utc()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn invert_swaps_keys_and_values() {
        let input = map(&[("a", "b"), ("c", "d"), ("e", "f")]);
        let inverted = invert(&input);

        assert_eq!(inverted, map(&[("b", "a"), ("d", "c"), ("f", "e")]));
        assert_eq!(invert(&inverted), input);
    }

    #[test]
    fn invert_keeps_last_key_for_duplicate_values() {
        let input = map(&[("a", "same"), ("b", "same")]);
        assert_eq!(invert(&input), map(&[("same", "b")]));
    }

    #[test]
    fn select_applicable_renames_known_keys() {
        let mapping = map(&[("display_name", "field_name")]);
        let selected = select_applicable([("display_name", "value")], &mapping);
        assert_eq!(selected, BTreeMap::from([("field_name".to_string(), "value")]));
    }

    #[test]
    fn select_applicable_drops_blank_values() {
        let mapping = map(&[("display_name", "field_name")]);
        let selected = select_applicable([("display_name", "")], &mapping);
        assert!(selected.is_empty());

        let absent: [(&str, Option<&str>); 1] = [("display_name", None)];
        assert!(select_applicable(absent, &mapping).is_empty());
    }

    #[test]
    fn select_applicable_ignores_unmapped_keys() {
        let mapping = map(&[("name", "company.name"), ("project", "company.project")]);
        let selected = select_applicable(
            [("name", "Aayulogic"), ("project", "filter map"), ("page", "2")],
            &mapping,
        );

        assert_eq!(
            selected,
            BTreeMap::from([
                ("company.name".to_string(), "Aayulogic"),
                ("company.project".to_string(), "filter map"),
            ])
        );
    }

    #[test]
    fn legacy_dates_parse_or_vanish() {
        let values = BTreeMap::from([
            ("start_date".to_string(), FilterValue::text("2024-02-29")),
            ("end_date".to_string(), FilterValue::text("29/02/2024")),
            ("name".to_string(), FilterValue::text("x")),
        ]);

        let coerced = coerce_legacy_params(values);
        let start = NaiveDate::from_ymd_opt(2024, 2, 29).and_then(|d| d.and_hms_opt(0, 0, 0)).map(|d| d.and_utc());
        assert_eq!(coerced.get("start_date"), start.map(FilterValue::DateTime).as_ref());
        assert!(!coerced.contains_key("end_date"));
        assert_eq!(coerced["name"], FilterValue::text("x"));
    }

    #[test]
    fn legacy_approved_accepts_boolean_spellings_only() {
        for (raw, expected) in [("True", Some(true)), ("0", Some(false)), ("yes", None)] {
            let values = BTreeMap::from([("approved".to_string(), FilterValue::text(raw))]);
            let coerced = coerce_legacy_params(values);
            assert_eq!(coerced.get("approved").and_then(FilterValue::as_bool), expected, "input {raw}");
        }
    }
}
