use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{
    Attribute, Data, DeriveInput, Error, Expr, Fields, Ident, LitStr, Result, Type, TypePath,
    parse_macro_input,
};

mod model;
mod view;

use model::ParsedModel;
use view::ParsedView;

/// Derive `filtermap::Model` from a struct's fields.
///
/// Field types map onto filter kinds (`String` is text, integers are
/// integer, `NaiveDate` is date, and so on). `Option<T>` takes the kind of `T`.
///
/// ```text
/// #[derive(FilterModel)]
/// #[filter_model(name = "Profile")]
/// struct Profile {
///     #[filter_model(related = User)]
///     user: User,
///     #[filter_model(choices = GENDER_CHOICES)]
///     gender: String,
///     date_of_birth: Option<NaiveDate>,
///     #[filter_model(skip)]
///     avatar: Vec<u8>,
/// }
/// ```
#[proc_macro_derive(FilterModel, attributes(filter_model))]
pub fn derive_filter_model(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match ParsedModel::from_input(&input) {
        Ok(parsed) => parsed.emit().into(),
        Err(err) => err.to_compile_error().into(),
    }
}

/// Derive `filtermap::FilterMapView`.
///
/// ```text
/// #[derive(FilterMapView)]
/// #[filter_map(model = Profile, get_raise_filter_exception = "strict")]
/// struct ProfileList {
///     #[filter_map(map)]
///     filters: FilterMap,
/// }
/// ```
#[proc_macro_derive(FilterMapView, attributes(filter_map))]
pub fn derive_filter_map_view(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match ParsedView::from_input(&input) {
        Ok(parsed) => parsed.emit().into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn named_fields<'a>(input: &'a DeriveInput, derive: &str) -> Result<&'a syn::FieldsNamed> {
    match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => Ok(named),
            _ => Err(Error::new(input.ident.span(), format!("{derive} requires named fields"))),
        },
        _ => Err(Error::new(input.ident.span(), format!("{derive} can only be derived for structs"))),
    }
}

fn last_ident_str(path: &TypePath) -> Option<String> {
    path.path.segments.last().map(|seg| seg.ident.to_string())
}

fn unwrap_option(ty: &Type) -> Option<&Type> {
    match ty {
        Type::Path(path) if last_ident_str(path).as_deref() == Some("Option") => {
            match &path.path.segments.last()?.arguments {
                syn::PathArguments::AngleBracketed(args) => args.args.first().and_then(|arg| match arg {
                    syn::GenericArgument::Type(inner) => Some(inner),
                    _ => None,
                }),
                _ => None,
            }
        }
        _ => None,
    }
}
