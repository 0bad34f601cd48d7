//! Query parameter filter maps.
//!
//! A view declares which public query parameters it accepts and which field
//! expressions they map to. The [`FilterMapBackend`] validates a request's
//! parameters against the model schema, turns them into a [`Restriction`] and
//! applies it to a [`Collection`]. The same map renders as an HTML filter form.
//!
//! ```
//! use filtermap::{FieldKind, FieldSchema, FilterMapBackend, FilterMapView, FilterMap,
//!     MemoryCollection, ModelSchema, QueryParams, filter_map};
//! use serde_json::json;
//!
//! struct Profiles;
//!
//! impl FilterMapView for Profiles {
//!     fn model_schema(&self) -> ModelSchema {
//!         ModelSchema::new("Profile").field(FieldSchema::new("user__first_name", FieldKind::Text))
//!     }
//!
//!     fn declared_filter_map(&self) -> Option<FilterMap> {
//!         Some(filter_map! { "first_name" => "user__first_name" })
//!     }
//! }
//!
//! let rows = MemoryCollection::new(vec![
//!     json!({"user": {"first_name": "Jo"}}),
//!     json!({"user": {"first_name": "Ana"}}),
//! ]);
//! let filtered = FilterMapBackend::new()
//!     .filter_collection(&QueryParams::parse("first_name=Jo"), rows, &Profiles)
//!     .unwrap();
//! assert_eq!(filtered.len(), 1);
//! ```

extern crate self as filtermap;

pub mod backend;
pub mod collection;
pub mod config;
pub mod errors;
pub mod filters;
pub mod filterset;
pub mod form;
pub mod lookup;
pub mod mapping;
pub mod params;
pub mod render;
pub mod schema;
pub mod translate;
pub mod value;

pub use backend::{BackendOptions, FilterMapBackend, FilterMapView};
pub use collection::{Collection, Condition, MemoryCollection, Restriction};
pub use config::{ConfiguredView, FilterMapConfig, Settings};
pub use errors::*;
pub use filterset::{FilterSet, FilterSetConfig, FilterSpec};
pub use form::{FilterForm, FormField, FormFieldKind, pretty_name};
pub use lookup::{FieldDescriptor, FieldLookups, Grouping, Lookup, group_field_operations, parse_field_token};
pub use mapping::{FilterMap, LOOKUP_SEP, Target};
pub use params::QueryParams;
pub use render::FormRenderer;
pub use schema::{Choice, FieldKind, FieldSchema, Model, ModelSchema};
pub use translate::{Blank, coerce_legacy_params, invert, select_applicable};
pub use value::FilterValue;

pub use filtermap_macros::{FilterMapView, FilterModel};
