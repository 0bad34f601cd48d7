use super::*;

pub(crate) struct ParsedView {
    ident: Ident,
    generics: syn::Generics,
    model: Type,
    get_filter_map: Option<Ident>,
    get_raise_filter_exception: Option<Ident>,
    map_field: Option<Ident>,
    raise_field: Option<Ident>,
}

impl ParsedView {
    pub(crate) fn from_input(input: &DeriveInput) -> Result<Self> {
        let mut model: Option<Type> = None;
        let mut get_filter_map = None;
        let mut get_raise_filter_exception = None;

        for attr in &input.attrs {
            if !attr.path().is_ident("filter_map") {
                continue;
            }
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("model") {
                    model = Some(meta.value()?.parse()?);
                } else if meta.path.is_ident("get_filter_map") {
                    get_filter_map = Some(method_ident(meta.value()?.parse()?)?);
                } else if meta.path.is_ident("get_raise_filter_exception") {
                    get_raise_filter_exception = Some(method_ident(meta.value()?.parse()?)?);
                } else {
                    return Err(meta.error(
                        "unsupported filter_map container attribute; expected `model`, `get_filter_map` or `get_raise_filter_exception`",
                    ));
                }
                Ok(())
            })?;
        }

        let model = model.ok_or_else(|| {
            Error::new(
                input.ident.span(),
                "FilterMapView requires #[filter_map(model = Type)] naming a FilterModel type",
            )
        })?;

        let mut map_field = None;
        let mut raise_field = None;
        let fields: Vec<&syn::Field> = match &input.data {
            Data::Struct(data) if matches!(data.fields, Fields::Unit) => Vec::new(),
            _ => named_fields(input, "FilterMapView")?.named.iter().collect(),
        };
        for field in fields {
            let Some(ident) = field.ident.as_ref() else {
                continue;
            };
            for attr in &field.attrs {
                if !attr.path().is_ident("filter_map") {
                    continue;
                }
                attr.parse_nested_meta(|meta| {
                    let slot = if meta.path.is_ident("map") {
                        &mut map_field
                    } else if meta.path.is_ident("raise_exception") {
                        &mut raise_field
                    } else {
                        return Err(meta.error("unsupported filter_map field attribute; expected `map` or `raise_exception`"));
                    };
                    if slot.is_some() {
                        return Err(meta.error("only one field may carry this attribute"));
                    }
                    *slot = Some(ident.clone());
                    Ok(())
                })?;
            }
        }

        Ok(Self {
            ident: input.ident.clone(),
            generics: input.generics.clone(),
            model,
            get_filter_map,
            get_raise_filter_exception,
            map_field,
            raise_field,
        })
    }

    pub(crate) fn emit(&self) -> TokenStream2 {
        let ident = &self.ident;
        let model = &self.model;
        let (impl_generics, ty_generics, where_clause) = self.generics.split_for_impl();

        let declared_filter_map = self.map_field.as_ref().map(|field| {
            quote! {
                fn declared_filter_map(&self) -> ::core::option::Option<::filtermap::mapping::FilterMap> {
                    ::core::convert::Into::<::core::option::Option<::filtermap::mapping::FilterMap>>::into(
                        ::core::clone::Clone::clone(&self.#field),
                    )
                }
            }
        });
        let get_filter_map = self.get_filter_map.as_ref().map(|method| {
            quote! {
                fn get_filter_map(&self) -> ::core::option::Option<::filtermap::mapping::FilterMap> {
                    ::core::convert::Into::<::core::option::Option<::filtermap::mapping::FilterMap>>::into(self.#method())
                }
            }
        });
        let declared_raise = self.raise_field.as_ref().map(|field| {
            quote! {
                fn declared_raise_filter_exception(&self) -> ::core::option::Option<bool> {
                    ::core::convert::Into::<::core::option::Option<bool>>::into(self.#field)
                }
            }
        });
        let get_raise = self.get_raise_filter_exception.as_ref().map(|method| {
            quote! {
                fn get_raise_filter_exception(&self) -> ::core::option::Option<bool> {
                    ::core::convert::Into::<::core::option::Option<bool>>::into(self.#method())
                }
            }
        });

        quote! {
            impl #impl_generics ::filtermap::backend::FilterMapView for #ident #ty_generics #where_clause {
                fn model_schema(&self) -> ::filtermap::schema::ModelSchema {
                    <#model as ::filtermap::schema::Model>::schema()
                }

                #declared_filter_map
                #get_filter_map
                #declared_raise
                #get_raise
            }
        }
    }
}

fn method_ident(name: LitStr) -> Result<Ident> {
    name.parse()
        .map_err(|_| Error::new(name.span(), "expected the name of a method on the view"))
}
