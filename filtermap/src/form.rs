//! Filter forms: one form field per public parameter, labelled and cleaned.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::errors::{ValidationError, ValidationIssue};
use crate::filters::normalizers::{self, NormalizeResult};
use crate::lookup::Lookup;
use crate::params::QueryParams;
use crate::schema::{Choice, FieldKind, FieldSchema};
use crate::value::FilterValue;

const EMPTY_CHOICE_LABEL: &str = "---------";

/// Form field type, chosen from the model field and the lookup applied to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormFieldKind {
    Char,
    Choice(Vec<Choice>),
    Integer,
    Float,
    NullBoolean,
    Date,
    DateTime,
    Uuid,
    /// Comma-separated values of the inner kind.
    List(Box<FormFieldKind>),
}

impl FormFieldKind {
    /// Pick the form field for `lookup` on `field`.
    ///
    /// `isnull` always takes a three-state boolean, `in` a list of the base
    /// kind, date transforms a date, and `exact` on a field with choices a
    /// choice; everything else follows the field's storage kind.
    pub fn for_lookup(field: &FieldSchema, lookup: &Lookup) -> Self {
        match lookup {
            Lookup::IsNull => FormFieldKind::NullBoolean,
            Lookup::In => FormFieldKind::List(Box::new(Self::base(field))),
            lookup if lookup.is_date_transform() => FormFieldKind::Date,
            Lookup::Exact => match &field.choices {
                Some(choices) => FormFieldKind::Choice(choices.clone()),
                None => Self::base(field),
            },
            _ => Self::base(field),
        }
    }

    fn base(field: &FieldSchema) -> Self {
        match field.kind {
            FieldKind::Text => FormFieldKind::Char,
            FieldKind::Integer => FormFieldKind::Integer,
            FieldKind::Float => FormFieldKind::Float,
            FieldKind::Boolean => FormFieldKind::NullBoolean,
            FieldKind::Date => FormFieldKind::Date,
            FieldKind::DateTime => FormFieldKind::DateTime,
            FieldKind::Uuid => FormFieldKind::Uuid,
        }
    }

    /// Short name used by listings and templates.
    pub fn name(&self) -> &'static str {
        match self {
            FormFieldKind::Char => "char",
            FormFieldKind::Choice(_) => "choice",
            FormFieldKind::Integer => "integer",
            FormFieldKind::Float => "float",
            FormFieldKind::NullBoolean => "null_boolean",
            FormFieldKind::Date => "date",
            FormFieldKind::DateTime => "datetime",
            FormFieldKind::Uuid => "uuid",
            FormFieldKind::List(_) => "list",
        }
    }

    /// Clean one raw value. Missing or blank input becomes [`FilterValue::Null`].
    pub fn clean(&self, raw: Option<&str>) -> NormalizeResult {
        let value = match raw.map(str::trim) {
            Some(value) if !value.is_empty() => value,
            _ => return Ok(FilterValue::Null),
        };
        self.normalize(value)
    }

    fn normalize(&self, value: &str) -> NormalizeResult {
        match self {
            FormFieldKind::Char => normalizers::normalize_text(value),
            FormFieldKind::Choice(choices) => normalizers::normalize_choice(value, choices),
            FormFieldKind::Integer => normalizers::normalize_integer(value),
            FormFieldKind::Float => normalizers::normalize_float(value),
            FormFieldKind::NullBoolean => normalizers::normalize_null_boolean(value),
            FormFieldKind::Date => normalizers::normalize_date(value),
            FormFieldKind::DateTime => normalizers::normalize_datetime(value),
            FormFieldKind::Uuid => normalizers::normalize_uuid(value),
            FormFieldKind::List(inner) => normalizers::normalize_list(value, |item| inner.normalize(item)),
        }
    }

    /// Options offered by select widgets, `None` for free-text inputs.
    pub fn options(&self) -> Option<Vec<Choice>> {
        match self {
            FormFieldKind::Choice(choices) => {
                let mut options = vec![(String::new(), EMPTY_CHOICE_LABEL.to_string())];
                options.extend(choices.iter().cloned());
                Some(options)
            }
            FormFieldKind::NullBoolean => Some(vec![
                ("unknown".to_string(), "Unknown".to_string()),
                ("true".to_string(), "Yes".to_string()),
                ("false".to_string(), "No".to_string()),
            ]),
            _ => None,
        }
    }

    pub fn input_type(&self) -> &'static str {
        match self {
            FormFieldKind::Integer | FormFieldKind::Float => "number",
            _ => "text",
        }
    }
}

/// A form field bound to one public parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormField {
    /// Public parameter name; also the input name.
    pub name: String,
    pub label: String,
    pub kind: FormFieldKind,
    /// Model field path the filter applies to.
    pub field: String,
    pub lookup: Lookup,
}

/// Ordered set of form fields generated for a filter map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterForm {
    fields: Vec<FormField>,
}

impl FilterForm {
    pub fn new(fields: Vec<FormField>) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &[FormField] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FormField> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// Clean every field against `params`, keyed by public name.
    ///
    /// All fields are checked before failing so the error lists every bad parameter.
    pub fn clean(&self, params: &QueryParams) -> Result<BTreeMap<String, FilterValue>, ValidationError> {
        let mut cleaned = BTreeMap::new();
        let mut issues = Vec::new();
        for field in &self.fields {
            match field.kind.clean(params.get(&field.name)) {
                Ok(value) => {
                    cleaned.insert(field.name.clone(), value);
                }
                Err(rejection) => issues.push(ValidationIssue::new(&field.name, rejection.code, rejection.message)),
            }
        }
        if issues.is_empty() {
            Ok(cleaned)
        } else {
            Err(ValidationError::new(issues))
        }
    }

    /// Template context for rendering the form bound to `params`.
    pub fn context(&self, params: &QueryParams, errors: Option<&ValidationError>) -> FormContext {
        let fields = self
            .fields
            .iter()
            .map(|field| {
                let value = params.get(&field.name).unwrap_or_default().to_string();
                let options = field.kind.options().map(|options| {
                    options
                        .into_iter()
                        .map(|(option, label)| OptionContext {
                            selected: option == value,
                            value: option,
                            label,
                        })
                        .collect()
                });
                let errors = errors
                    .map(|errors| errors.for_field(&field.name).map(|issue| issue.message.clone()).collect())
                    .unwrap_or_default();
                FieldContext {
                    name: field.name.clone(),
                    id: format!("id_{}", field.name),
                    label: field.label.clone(),
                    kind: field.kind.name(),
                    input_type: field.kind.input_type(),
                    value,
                    options,
                    errors,
                }
            })
            .collect();
        FormContext { fields }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FormContext {
    pub fields: Vec<FieldContext>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FieldContext {
    pub name: String,
    pub id: String,
    pub label: String,
    pub kind: &'static str,
    pub input_type: &'static str,
    pub value: String,
    pub options: Option<Vec<OptionContext>>,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OptionContext {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

/// Human readable label: `first_name` becomes `First name`.
pub fn pretty_name(name: &str) -> String {
    let spaced = name.replace('_', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gender() -> FieldSchema {
        FieldSchema::new("gender", FieldKind::Text).with_choices([("Male", "Male"), ("Female", "Female")])
    }

    fn form() -> FilterForm {
        FilterForm::new(vec![
            FormField {
                name: "gender".into(),
                label: pretty_name("gender"),
                kind: FormFieldKind::for_lookup(&gender(), &Lookup::Exact),
                field: "gender".into(),
                lookup: Lookup::Exact,
            },
            FormField {
                name: "min_age".into(),
                label: pretty_name("min_age"),
                kind: FormFieldKind::Integer,
                field: "age".into(),
                lookup: Lookup::Gte,
            },
        ])
    }

    #[test]
    fn pretty_name_capitalizes_first_word() {
        assert_eq!(pretty_name("first_name"), "First name");
        assert_eq!(pretty_name("DOB"), "Dob");
        assert_eq!(pretty_name(""), "");
    }

    #[test]
    fn kind_follows_lookup_and_field() {
        let dob = FieldSchema::new("dob", FieldKind::DateTime);
        assert_eq!(FormFieldKind::for_lookup(&dob, &Lookup::DateGte), FormFieldKind::Date);
        assert_eq!(FormFieldKind::for_lookup(&dob, &Lookup::Gte), FormFieldKind::DateTime);
        assert_eq!(FormFieldKind::for_lookup(&dob, &Lookup::IsNull), FormFieldKind::NullBoolean);
        assert_eq!(FormFieldKind::for_lookup(&gender(), &Lookup::IExact), FormFieldKind::Char);
        assert_eq!(
            FormFieldKind::for_lookup(&FieldSchema::new("age", FieldKind::Integer), &Lookup::In),
            FormFieldKind::List(Box::new(FormFieldKind::Integer))
        );
    }

    #[test]
    fn clean_collects_every_issue() {
        let params: QueryParams = [("gender", "Robot"), ("min_age", "old")].into_iter().collect();
        let err = form().clean(&params).expect_err("both fields are invalid");

        let detail = err.detail();
        assert_eq!(detail.0.len(), 2);
        assert_eq!(detail.messages("min_age"), ["Enter a whole number.".to_string()]);
    }

    #[test]
    fn clean_maps_missing_to_null() {
        let params: QueryParams = [("gender", "Male")].into_iter().collect();
        let cleaned = form().clean(&params).expect("valid params");

        assert_eq!(cleaned["gender"], FilterValue::text("Male"));
        assert_eq!(cleaned["min_age"], FilterValue::Null);
    }

    #[test]
    fn context_marks_selected_option_and_errors() {
        let params: QueryParams = [("gender", "Female"), ("min_age", "x")].into_iter().collect();
        let form = form();
        let errors = form.clean(&params).err();
        let context = form.context(&params, errors.as_ref());

        let gender = &context.fields[0];
        let options = gender.options.as_ref().expect("choice field has options");
        assert_eq!(options[0].label, "---------");
        assert!(options.iter().any(|option| option.value == "Female" && option.selected));

        let age = &context.fields[1];
        assert_eq!(age.input_type, "number");
        assert_eq!(age.errors, ["Enter a whole number.".to_string()]);
    }
}
