//! Filter backend: resolves a view's filter map, validates query parameters
//! and restricts collections.

use serde::{Deserialize, Serialize};

use crate::collection::Collection;
use crate::errors::FilterError;
use crate::filterset::{FilterSet, FilterSetConfig};
use crate::lookup::Grouping;
use crate::mapping::FilterMap;
use crate::params::QueryParams;
use crate::render::FormRenderer;
use crate::schema::ModelSchema;

/// A view that exposes a filter map.
///
/// Views either declare values (`declared_*`) or compute them (`get_*`).
/// Computed values take precedence; both default to `None`.
pub trait FilterMapView {
    /// Schema of the model the view lists.
    fn model_schema(&self) -> ModelSchema;

    fn declared_filter_map(&self) -> Option<FilterMap> {
        None
    }

    fn get_filter_map(&self) -> Option<FilterMap> {
        None
    }

    fn declared_raise_filter_exception(&self) -> Option<bool> {
        None
    }

    fn get_raise_filter_exception(&self) -> Option<bool> {
        None
    }
}

impl<V: FilterMapView + ?Sized> FilterMapView for &V {
    fn model_schema(&self) -> ModelSchema {
        (**self).model_schema()
    }

    fn declared_filter_map(&self) -> Option<FilterMap> {
        (**self).declared_filter_map()
    }

    fn get_filter_map(&self) -> Option<FilterMap> {
        (**self).get_filter_map()
    }

    fn declared_raise_filter_exception(&self) -> Option<bool> {
        (**self).declared_raise_filter_exception()
    }

    fn get_raise_filter_exception(&self) -> Option<bool> {
        (**self).get_raise_filter_exception()
    }
}

/// Backend-wide switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendOptions {
    pub grouping: Grouping,
    /// Coerce `start_date`, `end_date` and `approved` before filtering.
    pub legacy_params: bool,
}

#[derive(Debug, Clone, Default)]
pub struct FilterMapBackend {
    options: BackendOptions,
    renderer: FormRenderer,
}

impl FilterMapBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(mut self, options: BackendOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_renderer(mut self, renderer: FormRenderer) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn options(&self) -> &BackendOptions {
        &self.options
    }

    /// Whether invalid parameters fail the request. Defaults to `true`.
    pub fn get_raise_exception<V: FilterMapView + ?Sized>(&self, view: &V) -> bool {
        view.get_raise_filter_exception()
            .or_else(|| view.declared_raise_filter_exception())
            .unwrap_or(true)
    }

    /// The view's filter map, `None` when it has none.
    ///
    /// A computed map wins over a declared one. An empty map counts as absent.
    pub fn get_filter_map<V: FilterMapView + ?Sized>(&self, view: &V) -> Option<FilterMap> {
        let map = match view.get_filter_map() {
            Some(map) => {
                log::trace!("using computed filter map with {} entries", map.len());
                map
            }
            None => view.declared_filter_map()?,
        };
        (!map.is_empty()).then_some(map)
    }

    pub fn get_filterset_config<V: FilterMapView + ?Sized>(
        &self,
        view: &V,
    ) -> Result<Option<FilterSetConfig>, FilterError> {
        let Some(map) = self.get_filter_map(view) else {
            return Ok(None);
        };
        FilterSetConfig::build(&map, view.model_schema(), &self.options).map(Some)
    }

    /// Filter set bound to `params`, `None` when the view has no filter map.
    pub fn get_filterset<V: FilterMapView + ?Sized>(
        &self,
        params: &QueryParams,
        view: &V,
    ) -> Result<Option<FilterSet<'static>>, FilterError> {
        Ok(self
            .get_filterset_config(view)?
            .map(|config| config.into_bound(params)))
    }

    /// Restrict `collection` by the view's filter map.
    ///
    /// Without a filter map the collection is returned unchanged. Invalid
    /// parameters fail with [`FilterError::Validation`] unless the view turns
    /// that off, in which case the collection is returned unfiltered.
    pub fn filter_collection<C, V>(&self, params: &QueryParams, collection: C, view: &V) -> Result<C, FilterError>
    where
        C: Collection,
        V: FilterMapView + ?Sized,
    {
        let Some(filterset) = self.get_filterset(params, view)? else {
            log::trace!("view has no filter map, passing collection through");
            return Ok(collection);
        };
        if let Some(errors) = filterset.errors() {
            if self.get_raise_exception(view) {
                return Err(FilterError::Validation(errors.clone()));
            }
            log::debug!("ignoring invalid filter parameters: {errors}");
            return Ok(collection);
        }
        filterset.filter_collection(collection)
    }

    /// Render the view's filter form bound to `params`. Empty when the view has no filter map.
    pub fn to_html<V: FilterMapView + ?Sized>(&self, params: &QueryParams, view: &V) -> Result<String, FilterError> {
        match self.get_filterset(params, view)? {
            Some(filterset) => self.renderer.render(&filterset),
            None => Ok(String::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter_map;
    use crate::schema::{FieldKind, FieldSchema};

    #[derive(Default)]
    struct View {
        declared_map: Option<FilterMap>,
        computed_map: Option<FilterMap>,
        declared_raise: Option<bool>,
        computed_raise: Option<bool>,
    }

    impl FilterMapView for View {
        fn model_schema(&self) -> ModelSchema {
            ModelSchema::new("Item").field(FieldSchema::new("a", FieldKind::Text))
        }

        fn declared_filter_map(&self) -> Option<FilterMap> {
            self.declared_map.clone()
        }

        fn get_filter_map(&self) -> Option<FilterMap> {
            self.computed_map.clone()
        }

        fn declared_raise_filter_exception(&self) -> Option<bool> {
            self.declared_raise
        }

        fn get_raise_filter_exception(&self) -> Option<bool> {
            self.computed_raise
        }
    }

    #[test]
    fn raise_exception_resolution() {
        let backend = FilterMapBackend::new();
        let mut view = View::default();
        assert!(backend.get_raise_exception(&view));

        view.declared_raise = Some(false);
        assert!(!backend.get_raise_exception(&view));

        view.computed_raise = Some(true);
        assert!(backend.get_raise_exception(&view));

        view.computed_raise = Some(false);
        assert!(!backend.get_raise_exception(&view));
    }

    #[test]
    fn filter_map_resolution() {
        let backend = FilterMapBackend::new();
        let mut view = View::default();
        assert_eq!(backend.get_filter_map(&view), None);

        view.declared_map = Some(filter_map! { "a" => "b" });
        assert_eq!(backend.get_filter_map(&view), Some(filter_map! { "a" => "b" }));

        view.computed_map = Some(filter_map! { "c" => "d" });
        assert_eq!(backend.get_filter_map(&view), Some(filter_map! { "c" => "d" }));
    }

    #[test]
    fn empty_declared_map_is_absent() {
        let view = View {
            declared_map: Some(FilterMap::new()),
            ..View::default()
        };
        let backend = FilterMapBackend::new();
        assert_eq!(backend.get_filter_map(&view), None);
        assert_eq!(backend.to_html(&QueryParams::new(), &view).expect("renders"), "");
    }

    #[test]
    fn empty_computed_map_is_absent() {
        let view = View {
            declared_map: Some(filter_map! { "a" => "a" }),
            computed_map: Some(FilterMap::new()),
            ..View::default()
        };
        let backend = FilterMapBackend::new();
        assert_eq!(backend.get_filter_map(&view), None);
        assert_eq!(backend.to_html(&QueryParams::parse("a=x"), &view).expect("renders"), "");

        let rows = crate::collection::MemoryCollection::new(vec![serde_json::json!({"a": "x"}), serde_json::json!({"a": "y"})]);
        let filtered = backend
            .filter_collection(&QueryParams::parse("a=x"), rows, &view)
            .expect("passes through");
        assert_eq!(filtered.len(), 2);
    }
}
