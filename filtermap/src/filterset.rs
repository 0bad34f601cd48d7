//! Filter sets built from a filter map and a model schema.
//!
//! [`FilterSetConfig`] is the per-map configuration: which fields are
//! filtered, with which lookups, under which public names. Binding it to a
//! request's [`QueryParams`] yields a [`FilterSet`] that validates the
//! parameters and turns them into a [`Restriction`].

use std::borrow::Cow;
use std::collections::BTreeMap;

use crate::backend::BackendOptions;
use crate::collection::{Collection, Condition, Restriction};
use crate::errors::{FilterError, ValidationError};
use crate::form::{FilterForm, FormField, FormFieldKind, pretty_name};
use crate::lookup::{FieldDescriptor, FieldLookups, Lookup, group_field_operations};
use crate::mapping::{FilterMap, LOOKUP_SEP};
use crate::params::QueryParams;
use crate::schema::ModelSchema;
use crate::translate::{coerce_legacy_params, select_applicable};
use crate::value::FilterValue;

/// A single generated filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterSpec {
    /// Internal filter name: the field path, suffixed with the lookup unless it is `exact`.
    pub name: String,
    /// Public query parameter the filter reads.
    pub param: String,
    /// De-tupled expression the parameter maps to.
    pub expression: String,
    pub descriptor: FieldDescriptor,
}

impl FilterSpec {
    pub fn lookup(&self) -> &Lookup {
        self.descriptor.lookup()
    }
}

fn filter_name(field: &str, lookup: &Lookup) -> String {
    match lookup {
        Lookup::Exact => field.to_string(),
        lookup => format!("{field}{LOOKUP_SEP}{lookup}"),
    }
}

/// Filter configuration for one filter map over one model.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterSetConfig {
    model: ModelSchema,
    fields: FieldLookups,
    translation: BTreeMap<String, String>,
    filters: Vec<FilterSpec>,
    form: FilterForm,
    legacy_params: bool,
}

impl FilterSetConfig {
    /// Build the configuration for `map` over `model`.
    ///
    /// Fails with [`FilterError::UnknownField`] when a mapped field is not part
    /// of the schema. Filters that no public parameter maps onto (possible
    /// with containment grouping) are skipped.
    pub fn build(map: &FilterMap, model: ModelSchema, options: &BackendOptions) -> Result<Self, FilterError> {
        let fields = group_field_operations(map.targets(), options.grouping);
        let translation = map.plain();
        let public_names = map.inverted();
        let position = |param: &str| map.names().position(|name| name == param).unwrap_or(usize::MAX);

        let mut filters = Vec::new();
        for (field, lookups) in &fields {
            let schema_field = model.resolve(field)?;
            for lookup in lookups {
                let name = filter_name(field, lookup);
                let Some((expression, param)) = public_name(&public_names, field, lookup, &name) else {
                    log::debug!("filter '{name}' on model '{}' has no public parameter, skipping", model.name);
                    continue;
                };
                let kind = FormFieldKind::for_lookup(schema_field, lookup);
                log::trace!("filter '{name}' reads '{param}' as {}", kind.name());
                filters.push((
                    FilterSpec {
                        name,
                        param,
                        expression,
                        descriptor: FieldDescriptor::new(field.clone(), lookup.clone()),
                    },
                    kind,
                ));
            }
        }
        filters.sort_by_key(|(spec, _)| position(&spec.param));

        let form = FilterForm::new(
            filters
                .iter()
                .map(|(spec, kind)| FormField {
                    name: spec.param.clone(),
                    label: pretty_name(&spec.param),
                    kind: kind.clone(),
                    field: spec.descriptor.field.clone(),
                    lookup: spec.lookup().clone(),
                })
                .collect(),
        );

        Ok(Self {
            model,
            fields,
            translation,
            filters: filters.into_iter().map(|(spec, _)| spec).collect(),
            form,
            legacy_params: options.legacy_params,
        })
    }

    pub fn model(&self) -> &ModelSchema {
        &self.model
    }

    /// Grouped `field → lookups` configuration.
    pub fn fields(&self) -> &FieldLookups {
        &self.fields
    }

    /// Public parameter name to de-tupled expression.
    pub fn translation(&self) -> &BTreeMap<String, String> {
        &self.translation
    }

    pub fn filters(&self) -> &[FilterSpec] {
        &self.filters
    }

    pub fn form(&self) -> &FilterForm {
        &self.form
    }

    /// Bind to a request's query parameters.
    pub fn bind(&self, params: &QueryParams) -> FilterSet<'_> {
        FilterSet::new(Cow::Borrowed(self), params)
    }

    /// Like [`FilterSetConfig::bind`], moving the configuration into the filter set.
    pub fn into_bound(self, params: &QueryParams) -> FilterSet<'static> {
        FilterSet::new(Cow::Owned(self), params)
    }

    fn condition(&self, expression: String, value: FilterValue) -> Option<Condition> {
        let spec = self.filters.iter().find(|spec| spec.expression == expression)?;
        Some(Condition {
            field: spec.descriptor.field.clone(),
            lookup: spec.lookup().clone(),
            expression,
            value,
        })
    }
}

/// Finds the public parameter for a filter, returning `(expression, param)`.
///
/// An `exact` filter also answers to an explicit `field__exact` expression.
fn public_name(
    public_names: &BTreeMap<String, String>,
    field: &str,
    lookup: &Lookup,
    name: &str,
) -> Option<(String, String)> {
    let find = |expression: String| public_names.get(&expression).map(|param| (expression, param.clone()));
    find(name.to_string()).or_else(|| match lookup {
        Lookup::Exact => find(format!("{field}{LOOKUP_SEP}exact")),
        _ => None,
    })
}

/// A filter configuration bound to query parameters.
#[derive(Debug, Clone)]
pub struct FilterSet<'a> {
    config: Cow<'a, FilterSetConfig>,
    params: QueryParams,
    cleaned: Result<BTreeMap<String, FilterValue>, ValidationError>,
}

impl<'a> FilterSet<'a> {
    fn new(config: Cow<'a, FilterSetConfig>, params: &QueryParams) -> Self {
        let cleaned = config.form.clean(params);
        if let Err(errors) = &cleaned {
            log::debug!("filter parameters for '{}' are invalid: {errors}", config.model.name);
        }
        Self {
            config,
            params: params.clone(),
            cleaned,
        }
    }

    pub fn config(&self) -> &FilterSetConfig {
        &self.config
    }

    pub fn params(&self) -> &QueryParams {
        &self.params
    }

    pub fn is_valid(&self) -> bool {
        self.cleaned.is_ok()
    }

    pub fn errors(&self) -> Option<&ValidationError> {
        self.cleaned.as_ref().err()
    }

    /// Typed values keyed by public parameter name. `None` when invalid.
    pub fn cleaned_data(&self) -> Option<&BTreeMap<String, FilterValue>> {
        self.cleaned.as_ref().ok()
    }

    /// Restriction for the supplied, non-blank parameters.
    pub fn restriction(&self) -> Result<Restriction, FilterError> {
        let cleaned = self.cleaned.clone()?;
        let cleaned = if self.config.legacy_params {
            coerce_legacy_params(cleaned)
        } else {
            cleaned
        };

        let conditions: Vec<Condition> = select_applicable(cleaned, &self.config.translation)
            .into_iter()
            .filter_map(|(expression, value)| self.config.condition(expression, value))
            .collect();
        log::debug!(
            "restricting '{}' with {} condition(s)",
            self.config.model.name,
            conditions.len()
        );
        Ok(Restriction::new(conditions))
    }

    /// Apply the restriction to `collection`.
    pub fn filter_collection<C: Collection>(&self, collection: C) -> Result<C, FilterError> {
        collection.restrict(&self.restriction()?)
    }
}
