use std::borrow::Cow;
use std::collections::BTreeMap;

use serde::Serialize;
use thiserror::Error;

#[cfg(feature = "utoipa")]
use utoipa::ToSchema;

/// Top-level error type returned by filtermap operations.
#[derive(Debug, Error)]
pub enum FilterError {
    /// Query parameters failed form validation.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// A mapped field expression does not exist on the model.
    #[error("unknown field '{field}' on model '{model}'")]
    UnknownField { model: String, field: String },

    /// A collection was asked to apply a lookup it cannot evaluate.
    #[error("unsupported lookup '{lookup}' for field '{field}'")]
    UnsupportedLookup { field: String, lookup: String },

    /// Invalid filter map, view or settings declaration.
    #[error("invalid configuration: {message}")]
    Configuration { message: Cow<'static, str> },

    #[error("template error: {0}")]
    Template(#[from] handlebars::TemplateError),

    #[error("render error: {0}")]
    Render(#[from] handlebars::RenderError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl FilterError {
    pub fn configuration(message: impl Into<Cow<'static, str>>) -> Self {
        Self::Configuration { message: message.into() }
    }

    /// Returns the validation error when this is a validation failure.
    pub fn as_validation(&self) -> Option<&ValidationError> {
        match self {
            FilterError::Validation(err) => Some(err),
            _ => None,
        }
    }
}

/// Collection of validation issues raised while cleaning query parameters.
#[derive(Debug, Clone, Error)]
#[error("{}", summarize(.issues))]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

fn summarize(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(|issue| format!("{}: {}", issue.field, issue.message))
        .collect::<Vec<_>>()
        .join("; ")
}

impl ValidationError {
    pub fn new<I>(issues: I) -> Self
    where
        I: IntoIterator<Item = ValidationIssue>,
    {
        Self {
            issues: issues.into_iter().collect(),
        }
    }

    /// Convenience helper for constructing a single-field validation error.
    pub fn single(field: impl Into<String>, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new([ValidationIssue::new(field, code, message)])
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    /// Field-keyed messages, the shape API clients receive.
    pub fn detail(&self) -> ValidationDetail {
        let mut fields: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for issue in &self.issues {
            fields.entry(issue.field.clone()).or_default().push(issue.message.clone());
        }
        ValidationDetail(fields)
    }

    /// Issues reported for a single field.
    pub fn for_field<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a ValidationIssue> + 'a {
        self.issues.iter().filter(move |issue| issue.field == field)
    }
}

/// Detailed validation failure for a single query parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    pub field: String,
    pub code: String,
    pub message: String,
}

impl ValidationIssue {
    pub fn new(field: impl Into<String>, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            code: code.into(),
            message: message.into(),
        }
    }
}

/// Serializable `{ "param": ["message", ...] }` body for a validation failure.
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationDetail(pub BTreeMap<String, Vec<String>>);

impl ValidationDetail {
    pub fn messages(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or(&[])
    }
}

pub type ValidationResult<T> = Result<T, ValidationError>;
