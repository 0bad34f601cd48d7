//! TOML configuration: backend settings plus named views with their model
//! schema and filter map.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::backend::{BackendOptions, FilterMapBackend, FilterMapView};
use crate::errors::FilterError;
use crate::filterset::FilterSetConfig;
use crate::mapping::FilterMap;
use crate::render::FormRenderer;
use crate::schema::ModelSchema;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterMapConfig {
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub views: BTreeMap<String, ConfiguredView>,
    /// Directory relative paths are resolved against.
    #[serde(skip)]
    base_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(flatten)]
    pub backend: BackendOptions,
    /// Form template overriding the built-in one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<PathBuf>,
}

/// A view declared in configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfiguredView {
    pub model: ModelSchema,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter_map: Option<FilterMap>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raise_filter_exception: Option<bool>,
}

impl FilterMapView for ConfiguredView {
    fn model_schema(&self) -> ModelSchema {
        self.model.clone()
    }

    fn declared_filter_map(&self) -> Option<FilterMap> {
        self.filter_map.clone()
    }

    fn declared_raise_filter_exception(&self) -> Option<bool> {
        self.raise_filter_exception
    }
}

impl FilterMapConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, FilterError> {
        Ok(toml::from_str(source)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, FilterError> {
        let path = path.as_ref();
        log::debug!("loading filter map config from {}", path.display());
        let mut config = Self::from_toml_str(&fs::read_to_string(path)?)?;
        config.base_dir = path.parent().map(Path::to_path_buf);
        Ok(config)
    }

    pub fn view(&self, name: &str) -> Result<&ConfiguredView, FilterError> {
        self.views
            .get(name)
            .ok_or_else(|| FilterError::configuration(format!("no view named '{name}' in configuration")))
    }

    pub fn template_path(&self) -> Option<PathBuf> {
        let template = self.settings.template.as_ref()?;
        Some(match &self.base_dir {
            Some(base) if template.is_relative() => base.join(template),
            _ => template.clone(),
        })
    }

    /// Backend configured from `[settings]`, loading the template override if any.
    pub fn backend(&self) -> Result<FilterMapBackend, FilterError> {
        let backend = FilterMapBackend::new().with_options(self.settings.backend);
        match self.template_path() {
            Some(path) => Ok(backend.with_renderer(FormRenderer::from_path(path)?)),
            None => Ok(backend),
        }
    }

    /// Build every view's filter set, in view name order. Views without a
    /// filter map are reported with `None`.
    pub fn check(&self) -> Result<Vec<(&str, Option<FilterSetConfig>)>, FilterError> {
        let backend = FilterMapBackend::new().with_options(self.settings.backend);
        self.views
            .iter()
            .map(|(name, view)| {
                let config = backend.get_filterset_config(view).map_err(|err| match err {
                    FilterError::UnknownField { model, field } => {
                        FilterError::configuration(format!("view '{name}': unknown field '{field}' on model '{model}'"))
                    }
                    other => other,
                })?;
                Ok((name.as_str(), config))
            })
            .collect()
    }
}
