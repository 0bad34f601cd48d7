use serde::{Deserialize, Serialize};

use crate::errors::FilterError;
use crate::mapping::LOOKUP_SEP;

/// Storage type of a model field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    Integer,
    Float,
    Boolean,
    Date,
    #[serde(rename = "datetime")]
    DateTime,
    Uuid,
}

/// `(stored value, display label)`.
pub type Choice = (String, String);

/// A filterable field. Related-model fields use `__`-joined paths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSchema {
    pub path: String,
    pub kind: FieldKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub choices: Option<Vec<Choice>>,
}

impl FieldSchema {
    pub fn new(path: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            path: path.into(),
            kind,
            choices: None,
        }
    }

    pub fn with_choices<I, V, L>(mut self, choices: I) -> Self
    where
        I: IntoIterator<Item = (V, L)>,
        V: Into<String>,
        L: Into<String>,
    {
        self.choices = Some(
            choices
                .into_iter()
                .map(|(value, label)| (value.into(), label.into()))
                .collect(),
        );
        self
    }

}

/// Declarative description of a model's filterable fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelSchema {
    pub name: String,
    #[serde(default)]
    pub fields: Vec<FieldSchema>,
}

impl ModelSchema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    pub fn field(mut self, field: FieldSchema) -> Self {
        self.fields.push(field);
        self
    }

    /// Embed another model's fields under `prefix__`.
    pub fn related(mut self, prefix: &str, related: ModelSchema) -> Self {
        self.fields.extend(related.fields.into_iter().map(|mut field| {
            field.path = format!("{prefix}{LOOKUP_SEP}{}", field.path);
            field
        }));
        self
    }

    pub fn get(&self, path: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|field| field.path == path)
    }

    /// Like [`ModelSchema::get`], failing with [`FilterError::UnknownField`].
    pub fn resolve(&self, path: &str) -> Result<&FieldSchema, FilterError> {
        self.get(path).ok_or_else(|| FilterError::UnknownField {
            model: self.name.clone(),
            field: path.to_string(),
        })
    }
}

/// Types that describe their own filterable schema.
///
/// Implemented by `#[derive(FilterModel)]`.
pub trait Model {
    fn schema() -> ModelSchema;
}
