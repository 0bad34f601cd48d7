use super::*;

pub(crate) struct ParsedModel {
    ident: Ident,
    generics: syn::Generics,
    name: String,
    fields: Vec<ModelField>,
}

struct ModelField {
    path: String,
    source: FieldSource,
}

enum FieldSource {
    Scalar {
        kind: Ident,
        choices: Option<Expr>,
    },
    Related(Type),
}

#[derive(Default)]
struct FieldAttrs {
    skip: bool,
    kind: Option<LitStr>,
    choices: Option<Expr>,
    related: Option<Type>,
}

impl ParsedModel {
    pub(crate) fn from_input(input: &DeriveInput) -> Result<Self> {
        let mut name = input.ident.to_string();
        for attr in &input.attrs {
            if attr.path().is_ident("filter_model") {
                attr.parse_nested_meta(|meta| {
                    if meta.path.is_ident("name") {
                        let value: LitStr = meta.value()?.parse()?;
                        name = value.value();
                        Ok(())
                    } else {
                        Err(meta.error("unsupported filter_model container attribute; expected `name`"))
                    }
                })?;
            }
        }

        let mut fields = Vec::new();
        for field in &named_fields(input, "FilterModel")?.named {
            let Some(ident) = field.ident.as_ref() else {
                continue;
            };
            let attrs = FieldAttrs::parse(&field.attrs)?;
            if attrs.skip {
                continue;
            }
            let path = ident.to_string();
            let source = match attrs.related {
                Some(related) => {
                    if attrs.kind.is_some() || attrs.choices.is_some() {
                        return Err(Error::new(
                            ident.span(),
                            "`related` fields take their kinds from the related model",
                        ));
                    }
                    FieldSource::Related(related)
                }
                None => {
                    let inner = unwrap_option(&field.ty).unwrap_or(&field.ty);
                    let kind = match &attrs.kind {
                        Some(kind) => kind_from_name(kind)?,
                        None => kind_from_type(inner)?,
                    };
                    FieldSource::Scalar {
                        kind,
                        choices: attrs.choices,
                    }
                }
            };
            fields.push(ModelField { path, source });
        }

        Ok(Self {
            ident: input.ident.clone(),
            generics: input.generics.clone(),
            name,
            fields,
        })
    }

    pub(crate) fn emit(&self) -> TokenStream2 {
        let ident = &self.ident;
        let name = &self.name;
        let (impl_generics, ty_generics, where_clause) = self.generics.split_for_impl();

        let fields = self.fields.iter().map(|field| {
            let path = &field.path;
            match &field.source {
                FieldSource::Scalar { kind, choices } => {
                    let choices = choices.as_ref().map(|choices| {
                        quote! {
                            .with_choices((#choices).iter().map(|(value, label)| (*value, *label)))
                        }
                    });
                    quote! {
                        let schema = schema.field(
                            ::filtermap::schema::FieldSchema::new(#path, ::filtermap::schema::FieldKind::#kind)
                                #choices
                        );
                    }
                }
                FieldSource::Related(related) => quote! {
                    let schema = schema.related(#path, <#related as ::filtermap::schema::Model>::schema());
                },
            }
        });

        quote! {
            impl #impl_generics ::filtermap::schema::Model for #ident #ty_generics #where_clause {
                fn schema() -> ::filtermap::schema::ModelSchema {
                    let schema = ::filtermap::schema::ModelSchema::new(#name);
                    #(#fields)*
                    schema
                }
            }
        }
    }
}

impl FieldAttrs {
    fn parse(attrs: &[Attribute]) -> Result<Self> {
        let mut parsed = FieldAttrs::default();
        for attr in attrs {
            if !attr.path().is_ident("filter_model") {
                continue;
            }
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("skip") {
                    parsed.skip = true;
                } else if meta.path.is_ident("kind") {
                    parsed.kind = Some(meta.value()?.parse()?);
                } else if meta.path.is_ident("choices") {
                    parsed.choices = Some(meta.value()?.parse()?);
                } else if meta.path.is_ident("related") {
                    parsed.related = Some(meta.value()?.parse()?);
                } else {
                    return Err(meta.error(
                        "unsupported filter_model field attribute; expected `skip`, `kind`, `choices` or `related`",
                    ));
                }
                Ok(())
            })?;
        }
        Ok(parsed)
    }
}

fn kind_from_name(kind: &LitStr) -> Result<Ident> {
    let variant = match kind.value().as_str() {
        "text" => "Text",
        "integer" => "Integer",
        "float" => "Float",
        "boolean" => "Boolean",
        "date" => "Date",
        "datetime" => "DateTime",
        "uuid" => "Uuid",
        other => {
            return Err(Error::new(
                kind.span(),
                format!("unknown filter kind '{other}'; expected text, integer, float, boolean, date, datetime or uuid"),
            ));
        }
    };
    Ok(Ident::new(variant, kind.span()))
}

fn kind_from_type(ty: &Type) -> Result<Ident> {
    let type_name = match ty {
        Type::Path(path) => last_ident_str(path),
        Type::Reference(reference) => match reference.elem.as_ref() {
            Type::Path(path) => last_ident_str(path),
            _ => None,
        },
        _ => None,
    };
    let variant = match type_name.as_deref() {
        Some("String" | "str") => "Text",
        Some(
            "i8" | "i16" | "i32" | "i64" | "i128" | "isize" | "u8" | "u16" | "u32" | "u64" | "u128" | "usize",
        ) => "Integer",
        Some("f32" | "f64") => "Float",
        Some("bool") => "Boolean",
        Some("NaiveDate") => "Date",
        Some("DateTime" | "NaiveDateTime") => "DateTime",
        Some("Uuid") => "Uuid",
        _ => {
            return Err(Error::new_spanned(
                ty,
                "cannot infer a filter kind for this type; add #[filter_model(kind = \"...\")] or #[filter_model(skip)]",
            ));
        }
    };
    Ok(Ident::new(variant, proc_macro2::Span::call_site()))
}
