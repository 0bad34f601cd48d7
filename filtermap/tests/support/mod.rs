#![allow(dead_code)]

pub(crate) use chrono::{DateTime, NaiveDate, Utc};
pub(crate) use filtermap::{
    FilterError, FilterMap, FilterMapBackend, FilterMapView, FilterModel, MemoryCollection, QueryParams, filter_map,
};
pub(crate) use serde_json::{Value, json};

pub(crate) const GENDER_CHOICES: [(&str, &str); 3] = [("Male", "Male"), ("Female", "Female"), ("Others", "Others")];

#[derive(FilterModel)]
pub(crate) struct User {
    pub first_name: String,
    pub last_name: String,
    pub last_login: Option<DateTime<Utc>>,
}

#[derive(FilterModel)]
#[filter_model(name = "Profile")]
pub(crate) struct ProfileRecord {
    #[filter_model(related = User)]
    pub user: User,
    pub date_of_birth: NaiveDate,
    #[filter_model(choices = GENDER_CHOICES)]
    pub gender: String,
    pub age: u32,
    #[filter_model(skip)]
    pub avatar: Vec<u8>,
}

/// View with declared values only.
#[derive(Default, FilterMapView)]
#[filter_map(model = ProfileRecord)]
pub(crate) struct ProfileList {
    #[filter_map(map)]
    pub filter_map: Option<FilterMap>,
    #[filter_map(raise_exception)]
    pub raise_filter_exception: Option<bool>,
}

impl ProfileList {
    pub(crate) fn with_map(filter_map: FilterMap) -> Self {
        Self {
            filter_map: Some(filter_map),
            raise_filter_exception: None,
        }
    }
}

/// View computing its filter map and raise flag.
#[derive(FilterMapView)]
#[filter_map(model = ProfileRecord, get_filter_map = "filters", get_raise_filter_exception = "raise_on_invalid")]
pub(crate) struct ComputedProfileList {
    #[filter_map(map)]
    pub declared: FilterMap,
    pub lenient: bool,
}

impl ComputedProfileList {
    fn filters(&self) -> FilterMap {
        filter_map! { "name" => ("user__first_name", "iexact") }
    }

    fn raise_on_invalid(&self) -> bool {
        !self.lenient
    }
}

/// Field-less view whose filter map is chosen per instance type.
#[derive(FilterMapView)]
#[filter_map(model = ProfileRecord, get_filter_map = "filters")]
pub(crate) struct AgeFilterList;

impl AgeFilterList {
    fn filters(&self) -> FilterMap {
        filter_map! { "older_than" => ("age", "gt") }
    }
}

pub(crate) fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub(crate) fn profiles() -> MemoryCollection {
    MemoryCollection::new(vec![
        json!({"id": 1, "user": {"first_name": "Jo", "last_name": "Bloggs"}, "gender": "Male", "age": 31, "date_of_birth": "1993-04-01"}),
        json!({"id": 2, "user": {"first_name": "Jo", "last_name": "March"}, "gender": "Female", "age": 25, "date_of_birth": "1999-12-24"}),
        json!({"id": 3, "user": {"first_name": "Ana", "last_name": "Lima"}, "gender": "Male", "age": 47, "date_of_birth": "1977-01-15"}),
    ])
}

pub(crate) fn ids(collection: &MemoryCollection) -> Vec<i64> {
    collection.rows().iter().filter_map(|row| row["id"].as_i64()).collect()
}
