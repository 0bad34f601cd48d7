//! Loading views from TOML files on disk.

mod support;

use std::fs;

use filtermap::{FilterMapConfig, Grouping};
use support::*;
use tempfile::TempDir;

const PROFILES: &str = r#"
[settings]
grouping = "exact"
template = "form.hbs"

[views.profiles]
raise_filter_exception = true

[views.profiles.model]
name = "Profile"
fields = [
  { path = "user__first_name", kind = "text" },
  { path = "gender", kind = "text", choices = [["Male", "Male"], ["Female", "Female"]] },
  { path = "date_of_birth", kind = "date" },
]

[views.profiles.filter_map]
first_name = "user__first_name"
gender = "gender"
born_after = ["date_of_birth", "gte"]
"#;

fn write_config(dir: &TempDir, config: &str, template: &str) -> std::path::PathBuf {
    let path = dir.path().join("filtermap.toml");
    fs::write(&path, config).expect("config written");
    fs::write(dir.path().join("form.hbs"), template).expect("template written");
    path
}

#[test]
fn configured_view_filters_rows() {
    init_logging();
    let dir = TempDir::new().expect("temp dir");
    let path = write_config(&dir, PROFILES, "{{#each fields}}{{name}};{{/each}}");

    let config = FilterMapConfig::from_path(&path).expect("config loads");
    assert_eq!(config.settings.backend.grouping, Grouping::Exact);
    assert_eq!(config.template_path(), Some(dir.path().join("form.hbs")));

    let backend = config.backend().expect("backend builds");
    let view = config.view("profiles").expect("profiles view");

    let filtered = backend
        .filter_collection(&QueryParams::parse("born_after=1990-01-01&first_name=Jo"), profiles(), view)
        .expect("collection filters");
    assert_eq!(ids(&filtered), [1, 2]);

    let html = backend.to_html(&QueryParams::new(), view).expect("renders");
    assert_eq!(html, "first_name;gender;born_after;");
}

#[test]
fn broken_template_is_reported() {
    let dir = TempDir::new().expect("temp dir");
    let path = write_config(&dir, PROFILES, "{{#if fields}}");

    let config = FilterMapConfig::from_path(&path).expect("config loads");
    let err = config.backend().expect_err("template does not compile");
    assert!(matches!(err, FilterError::Template(_)));
}

#[test]
fn missing_template_file_is_an_io_error() {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("filtermap.toml");
    fs::write(&path, PROFILES).expect("config written");

    let config = FilterMapConfig::from_path(&path).expect("config loads");
    assert!(matches!(config.backend(), Err(FilterError::Io(_))));
}

#[test]
fn malformed_toml_is_rejected() {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("filtermap.toml");
    fs::write(&path, "[views.profiles\nname = 1").expect("config written");

    assert!(matches!(FilterMapConfig::from_path(&path), Err(FilterError::Toml(_))));
    assert!(matches!(
        FilterMapConfig::from_path(dir.path().join("absent.toml")),
        Err(FilterError::Io(_))
    ));
}
