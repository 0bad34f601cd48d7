//! Field expression parsing: `field__lookup` strings into field descriptors.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::mapping::{LOOKUP_SEP, Target};

/// Lookup suffixes stripped from string expressions, longest first so that
/// `date__gte` is not mistaken for `gte`.
const SUFFIX_LOOKUPS: [Lookup; 6] = [
    Lookup::DateGte,
    Lookup::DateLte,
    Lookup::Gte,
    Lookup::Lte,
    Lookup::Gt,
    Lookup::Lt,
];

/// Comparison applied to a field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Lookup {
    Exact,
    IExact,
    Contains,
    IContains,
    StartsWith,
    IStartsWith,
    EndsWith,
    IEndsWith,
    Gt,
    Gte,
    Lt,
    Lte,
    DateGte,
    DateLte,
    In,
    IsNull,
    /// Any other token, carried through untouched.
    Custom(String),
}

impl Lookup {
    pub fn parse(token: &str) -> Self {
        match token {
            "exact" => Lookup::Exact,
            "iexact" => Lookup::IExact,
            "contains" => Lookup::Contains,
            "icontains" => Lookup::IContains,
            "startswith" => Lookup::StartsWith,
            "istartswith" => Lookup::IStartsWith,
            "endswith" => Lookup::EndsWith,
            "iendswith" => Lookup::IEndsWith,
            "gt" => Lookup::Gt,
            "gte" => Lookup::Gte,
            "lt" => Lookup::Lt,
            "lte" => Lookup::Lte,
            "date__gte" => Lookup::DateGte,
            "date__lte" => Lookup::DateLte,
            "in" => Lookup::In,
            "isnull" => Lookup::IsNull,
            other => Lookup::Custom(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Lookup::Exact => "exact",
            Lookup::IExact => "iexact",
            Lookup::Contains => "contains",
            Lookup::IContains => "icontains",
            Lookup::StartsWith => "startswith",
            Lookup::IStartsWith => "istartswith",
            Lookup::EndsWith => "endswith",
            Lookup::IEndsWith => "iendswith",
            Lookup::Gt => "gt",
            Lookup::Gte => "gte",
            Lookup::Lt => "lt",
            Lookup::Lte => "lte",
            Lookup::DateGte => "date__gte",
            Lookup::DateLte => "date__lte",
            Lookup::In => "in",
            Lookup::IsNull => "isnull",
            Lookup::Custom(token) => token,
        }
    }

    /// Lookups that compare the date part of a datetime.
    pub fn is_date_transform(&self) -> bool {
        matches!(self, Lookup::DateGte | Lookup::DateLte)
    }

    fn suffix(&self) -> String {
        format!("{LOOKUP_SEP}{}", self.as_str())
    }
}

impl fmt::Display for Lookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Lookup {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Lookup {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let token = String::deserialize(deserializer)?;
        Ok(Lookup::parse(&token))
    }
}

/// A field expression split into its field path and lookups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub field: String,
    pub lookups: Vec<Lookup>,
}

impl FieldDescriptor {
    pub fn new(field: impl Into<String>, lookup: Lookup) -> Self {
        Self {
            field: field.into(),
            lookups: vec![lookup],
        }
    }

    /// Primary lookup; descriptors always carry at least one.
    pub fn lookup(&self) -> &Lookup {
        self.lookups.first().unwrap_or(&Lookup::Exact)
    }
}

/// Split a filter map target into `(field, [lookup])`.
///
/// Pairs are returned verbatim. String expressions lose the first matching
/// suffix from `date__gte, date__lte, gte, lte, gt, lt`; anything else
/// (including `__isnull`) stays part of the field name with an `exact` lookup.
pub fn parse_field_token(target: &Target) -> FieldDescriptor {
    match target {
        Target::Pair(field, lookup) => FieldDescriptor::new(field.clone(), Lookup::parse(lookup)),
        Target::Expr(expr) => {
            for lookup in SUFFIX_LOOKUPS {
                if let Some(field) = expr.strip_suffix(lookup.suffix().as_str()) {
                    return FieldDescriptor::new(field, lookup);
                }
            }
            FieldDescriptor::new(expr.clone(), Lookup::Exact)
        }
    }
}

/// How parsed field names are matched when collecting their lookups.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Grouping {
    /// Group by parsed field name.
    #[default]
    Exact,
    /// A field collects the lookups of every target whose text contains it.
    /// Over-groups when one field name is a substring of another.
    Containment,
}

/// Real field name to the set of lookups declared for it.
pub type FieldLookups = BTreeMap<String, BTreeSet<Lookup>>;

pub fn group_field_operations<'a, I>(targets: I, grouping: Grouping) -> FieldLookups
where
    I: IntoIterator<Item = &'a Target>,
{
    let parsed: Vec<(&Target, FieldDescriptor)> = targets
        .into_iter()
        .map(|target| (target, parse_field_token(target)))
        .collect();

    let mut grouped = FieldLookups::new();
    match grouping {
        Grouping::Exact => {
            for (_, descriptor) in parsed {
                grouped.entry(descriptor.field).or_default().extend(descriptor.lookups);
            }
        }
        Grouping::Containment => {
            let fields: BTreeSet<&str> = parsed.iter().map(|(_, descriptor)| descriptor.field.as_str()).collect();
            for field in fields {
                let lookups = parsed
                    .iter()
                    .filter(|(target, _)| target.mentions(field))
                    .flat_map(|(_, descriptor)| descriptor.lookups.iter().cloned())
                    .collect();
                grouped.insert(field.to_string(), lookups);
            }
        }
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expr(value: &str) -> Target {
        Target::from(value)
    }

    fn set(lookups: &[Lookup]) -> BTreeSet<Lookup> {
        lookups.iter().cloned().collect()
    }

    #[test]
    fn parses_suffixes_and_pairs() {
        let cases = [
            (expr("field_name"), ("field_name", Lookup::Exact)),
            (expr("field_name__date__gte"), ("field_name", Lookup::DateGte)),
            (expr("field_name__date__lte"), ("field_name", Lookup::DateLte)),
            (expr("field_name__gte"), ("field_name", Lookup::Gte)),
            (expr("field_name__lte"), ("field_name", Lookup::Lte)),
            (expr("field_name__gt"), ("field_name", Lookup::Gt)),
            (expr("field_name__lt"), ("field_name", Lookup::Lt)),
            (expr("field_name__isnull"), ("field_name__isnull", Lookup::Exact)),
            (Target::from(("field_name", "iexact")), ("field_name", Lookup::IExact)),
            (Target::from(("field_name", "exp")), ("field_name", Lookup::Custom("exp".into()))),
        ];

        for (input, (field, lookup)) in cases {
            assert_eq!(parse_field_token(&input), FieldDescriptor::new(field, lookup), "input {input}");
        }
    }

    #[test]
    fn suffix_must_end_the_expression() {
        let parsed = parse_field_token(&expr("price__gte_band"));
        assert_eq!(parsed, FieldDescriptor::new("price__gte_band", Lookup::Exact));
    }

    #[test]
    fn custom_tokens_round_trip_verbatim() {
        assert_eq!(Lookup::parse("regex").as_str(), "regex");
        assert_eq!(Lookup::parse("date__gte").as_str(), "date__gte");
    }

    #[test]
    fn groups_lookups_per_field() {
        let targets = [
            expr("a0"),
            expr("a1__date__gte"),
            expr("a2__lte"),
            Target::from(("a3", "iexact")),
            expr("a4__isnull"),
        ];

        for grouping in [Grouping::Exact, Grouping::Containment] {
            let grouped = group_field_operations(&targets, grouping);
            let expected = FieldLookups::from([
                ("a0".to_string(), set(&[Lookup::Exact])),
                ("a1".to_string(), set(&[Lookup::DateGte])),
                ("a2".to_string(), set(&[Lookup::Lte])),
                ("a3".to_string(), set(&[Lookup::IExact])),
                ("a4__isnull".to_string(), set(&[Lookup::Exact])),
            ]);
            assert_eq!(grouped, expected, "{grouping:?}");
        }
    }

    #[test]
    fn containment_over_groups_substring_names() {
        let targets = [expr("name"), expr("first_name__gte")];

        let exact = group_field_operations(&targets, Grouping::Exact);
        assert_eq!(exact["name"], set(&[Lookup::Exact]));

        let legacy = group_field_operations(&targets, Grouping::Containment);
        assert_eq!(legacy["name"], set(&[Lookup::Exact, Lookup::Gte]));
        assert_eq!(legacy["first_name"], set(&[Lookup::Gte]));
    }

    #[test]
    fn same_field_collects_every_lookup() {
        let targets = [expr("age__gte"), expr("age__lte"), expr("age")];
        let grouped = group_field_operations(&targets, Grouping::Exact);
        assert_eq!(grouped["age"], set(&[Lookup::Exact, Lookup::Gte, Lookup::Lte]));
    }
}
