//! Filter maps: public query parameter names mapped onto field expressions.
//!
//! A [`FilterMap`] is declared once per view and keeps declaration order so
//! rendered forms list fields the way they were written.
//!
//! ```
//! use filtermap::filter_map;
//!
//! let map = filter_map! {
//!     "first_name" => "user__first_name",
//!     "born_after" => ("date_of_birth", "gte"),
//! };
//! assert_eq!(map.plain()["born_after"], "date_of_birth__gte");
//! ```

use std::collections::BTreeMap;
use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Lookup separator shared by field paths and expressions.
pub const LOOKUP_SEP: &str = "__";

/// Right-hand side of a filter map entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Target {
    /// Field expression, optionally carrying a lookup suffix (`created__date__gte`).
    Expr(String),
    /// Explicit `(field, lookup)` pair; the lookup is used verbatim.
    Pair(String, String),
}

impl Target {
    /// De-tupled expression form (`("a", "iexact")` becomes `a__iexact`).
    pub fn plain(&self) -> String {
        match self {
            Target::Expr(expr) => expr.clone(),
            Target::Pair(field, lookup) => format!("{field}{LOOKUP_SEP}{lookup}"),
        }
    }

    /// Legacy membership test used by containment grouping.
    ///
    /// Expressions match on substring; pairs match when either element equals `name`.
    pub(crate) fn mentions(&self, name: &str) -> bool {
        match self {
            Target::Expr(expr) => expr.contains(name),
            Target::Pair(field, lookup) => field == name || lookup == name,
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Expr(expr) => f.write_str(expr),
            Target::Pair(field, lookup) => write!(f, "({field}, {lookup})"),
        }
    }
}

impl From<&str> for Target {
    fn from(value: &str) -> Self {
        Target::Expr(value.to_string())
    }
}

impl From<String> for Target {
    fn from(value: String) -> Self {
        Target::Expr(value)
    }
}

impl From<(&str, &str)> for Target {
    fn from((field, lookup): (&str, &str)) -> Self {
        Target::Pair(field.to_string(), lookup.to_string())
    }
}

impl From<(String, String)> for Target {
    fn from((field, lookup): (String, String)) -> Self {
        Target::Pair(field, lookup)
    }
}

/// Ordered, key-unique mapping from public parameter name to [`Target`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterMap {
    entries: Vec<(String, Target)>,
}

impl FilterMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an entry. Replacing keeps the original position.
    pub fn insert(&mut self, name: impl Into<String>, target: impl Into<Target>) -> Option<Target> {
        let name = name.into();
        let target = target.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, slot)) => Some(std::mem::replace(slot, target)),
            None => {
                self.entries.push((name, target));
                None
            }
        }
    }

    /// Builder-style [`FilterMap::insert`].
    pub fn with(mut self, name: impl Into<String>, target: impl Into<Target>) -> Self {
        self.insert(name, target);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Target> {
        self.entries.iter().find(|(key, _)| key == name).map(|(_, target)| target)
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Target)> {
        self.entries.iter().map(|(name, target)| (name.as_str(), target))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn targets(&self) -> impl Iterator<Item = &Target> {
        self.entries.iter().map(|(_, target)| target)
    }

    /// Translation table: public name to de-tupled expression.
    pub fn plain(&self) -> BTreeMap<String, String> {
        self.entries
            .iter()
            .map(|(name, target)| (name.clone(), target.plain()))
            .collect()
    }

    /// De-tupled expression to public name. Duplicate expressions keep the last name.
    pub fn inverted(&self) -> BTreeMap<String, String> {
        self.entries
            .iter()
            .map(|(name, target)| (target.plain(), name.clone()))
            .collect()
    }
}

impl<K, T> FromIterator<(K, T)> for FilterMap
where
    K: Into<String>,
    T: Into<Target>,
{
    fn from_iter<I: IntoIterator<Item = (K, T)>>(iter: I) -> Self {
        let mut map = FilterMap::new();
        for (name, target) in iter {
            map.insert(name, target);
        }
        map
    }
}

impl<'a> IntoIterator for &'a FilterMap {
    type Item = (&'a str, &'a Target);
    type IntoIter = Box<dyn Iterator<Item = (&'a str, &'a Target)> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}

impl Serialize for FilterMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, target) in &self.entries {
            map.serialize_entry(name, target)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for FilterMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct FilterMapVisitor;

        impl<'de> Visitor<'de> for FilterMapVisitor {
            type Value = FilterMap;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a table of parameter names to field expressions")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<FilterMap, A::Error> {
                let mut map = FilterMap::new();
                while let Some((name, target)) = access.next_entry::<String, Target>()? {
                    map.insert(name, target);
                }
                Ok(map)
            }
        }

        deserializer.deserialize_map(FilterMapVisitor)
    }
}

/// Build a [`FilterMap`] from `name => target` pairs.
///
/// Targets are anything convertible into [`Target`]: a string expression or a
/// `(field, lookup)` tuple.
#[macro_export]
macro_rules! filter_map {
    () => {
        $crate::mapping::FilterMap::new()
    };
    ($($name:expr => $target:expr),+ $(,)?) => {{
        let mut map = $crate::mapping::FilterMap::new();
        $( map.insert($name, $target); )+
        map
    }};
}
