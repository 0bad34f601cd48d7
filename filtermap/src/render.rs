//! HTML rendering of filter forms through Handlebars.

use std::borrow::Cow;
use std::fs;
use std::path::Path;

use handlebars::{Handlebars, Template};
use serde::Serialize;

use crate::errors::FilterError;
use crate::filterset::FilterSet;
use crate::form::FieldContext;

/// Template used when none is configured.
pub const DEFAULT_TEMPLATE: &str = r#"<h2>Field filters</h2>
<form class="form" action="" method="get">
{{#each fields}}
  <div class="form-group{{#if errors}} has-error{{/if}}">
    <label for="{{id}}">{{label}}</label>
    {{#if options}}
    <select name="{{name}}" id="{{id}}">
      {{#each options}}
      <option value="{{value}}"{{#if selected}} selected{{/if}}>{{label}}</option>
      {{/each}}
    </select>
    {{else}}
    <input type="{{input_type}}" name="{{name}}" id="{{id}}" value="{{value}}">
    {{/if}}
    {{#if errors}}
    <ul class="errorlist">
      {{#each errors}}
      <li>{{this}}</li>
      {{/each}}
    </ul>
    {{/if}}
  </div>
{{/each}}
  <button type="submit" class="btn btn-primary">Submit</button>
</form>
"#;

#[derive(Serialize)]
struct RenderContext {
    fields: Vec<FieldContext>,
    valid: bool,
}

/// Renders a bound filter set as an HTML form.
#[derive(Debug, Clone)]
pub struct FormRenderer {
    handlebars: Handlebars<'static>,
    template: Cow<'static, str>,
}

impl FormRenderer {
    pub fn new() -> Self {
        Self {
            handlebars: Handlebars::new(),
            template: Cow::Borrowed(DEFAULT_TEMPLATE),
        }
    }

    /// Use `source` instead of the default template. The source is compiled
    /// once here so syntax errors surface before the first request.
    pub fn with_template(source: impl Into<String>) -> Result<Self, FilterError> {
        let source = source.into();
        Template::compile(&source)?;
        Ok(Self {
            handlebars: Handlebars::new(),
            template: Cow::Owned(source),
        })
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, FilterError> {
        let path = path.as_ref();
        log::debug!("loading form template from {}", path.display());
        Self::with_template(fs::read_to_string(path)?)
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn render(&self, filterset: &FilterSet<'_>) -> Result<String, FilterError> {
        let form = filterset.config().form().context(filterset.params(), filterset.errors());
        let context = RenderContext {
            fields: form.fields,
            valid: filterset.is_valid(),
        };
        Ok(self.handlebars.render_template(&self.template, &context)?)
    }
}

impl Default for FormRenderer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::BackendOptions;
    use crate::filter_map;
    use crate::filterset::FilterSetConfig;
    use crate::params::QueryParams;
    use crate::schema::{FieldKind, FieldSchema, ModelSchema};

    fn config() -> FilterSetConfig {
        let schema = ModelSchema::new("Profile")
            .field(FieldSchema::new("gender", FieldKind::Text).with_choices([("Male", "Male"), ("Female", "Female")]))
            .field(FieldSchema::new("age", FieldKind::Integer));
        let map = filter_map! { "gender" => "gender", "min_age" => "age__gte" };
        FilterSetConfig::build(&map, schema, &BackendOptions::default()).expect("config builds")
    }

    #[test]
    fn default_template_renders_bound_values() {
        let config = config();
        let html = FormRenderer::new()
            .render(&config.bind(&QueryParams::parse("gender=Female&min_age=21")))
            .expect("form renders");

        assert!(html.contains("<h2>Field filters</h2>"));
        assert!(html.contains(r#"<label for="id_min_age">Min age</label>"#));
        assert!(html.contains(r#"<option value="Female" selected>Female</option>"#));
        assert!(html.contains(r#"value="21""#));
        assert!(!html.contains("errorlist"));
    }

    #[test]
    fn errors_are_listed_under_their_field() {
        let config = config();
        let html = FormRenderer::new()
            .render(&config.bind(&QueryParams::parse("min_age=lots")))
            .expect("form renders");

        assert!(html.contains("has-error"));
        assert!(html.contains("<li>Enter a whole number.</li>"));
    }

    #[test]
    fn custom_template_and_escaping() {
        let renderer = FormRenderer::with_template("{{#each fields}}[{{name}}={{value}}]{{/each}} {{valid}}")
            .expect("template compiles");
        let config = config();
        let html = renderer
            .render(&config.bind(&QueryParams::parse("min_age=%3Cb%3E")))
            .expect("form renders");
        assert_eq!(html, "[gender=][min_age=&lt;b&gt;] false");
    }

    #[test]
    fn broken_template_is_rejected_up_front() {
        let err = FormRenderer::with_template("{{#each fields}}").expect_err("unclosed block");
        assert!(matches!(err, FilterError::Template(_)));
    }
}
