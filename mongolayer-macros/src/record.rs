use proc_macro2::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Error, Field, Fields, Generics, LitStr, parse_quote};

// derive_record
pub fn derive_record(input: TokenStream) -> TokenStream {
    let input: DeriveInput = match syn::parse2(input) {
        Ok(input) => input,
        Err(err) => return err.to_compile_error(),
    };

    let ident = &input.ident;
    let generics = bound_type_params(&input.generics);
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => &named.named,
            other => {
                return Error::new_spanned(other, "Record can only be derived for structs with named fields")
                    .to_compile_error();
            }
        },
        _ => {
            return Error::new_spanned(ident, "Record can only be derived for structs with named fields")
                .to_compile_error();
        }
    };

    let mut entries = Vec::with_capacity(fields.len());
    for field in fields {
        match RecordField::parse(field) {
            Ok(Some(entry)) => entries.push(entry),
            Ok(None) => {}
            Err(err) => return err.to_compile_error(),
        }
    }

    let field_exprs = entries.iter().map(|entry| {
        let RecordField { ident, name, keep_empty } = entry;

        quote! {
            Field::new(#name, IntoFieldValue::to_field_value(&self.#ident)).keep_empty(#keep_empty)
        }
    });

    let map_entries = entries.iter().map(|entry| {
        let RecordField { ident, name, .. } = entry;

        quote! {
            (::std::string::String::from(#name), IntoFieldValue::to_field_value(&self.#ident))
        }
    });

    quote! {
        impl #impl_generics ::mongolayer::record::Record for #ident #ty_generics #where_clause {
            fn fields(&self) -> ::mongolayer::error::ClientResult<::std::vec::Vec<::mongolayer::record::Field>> {
                #[allow(unused_imports)]
                use ::mongolayer::record::{Field, IntoFieldValue};

                ::std::result::Result::Ok(::std::vec![#(#field_exprs),*])
            }
        }

        impl #impl_generics ::mongolayer::record::IntoFieldValue for #ident #ty_generics #where_clause {
            fn to_field_value(&self) -> ::mongolayer::record::FieldValue {
                #[allow(unused_imports)]
                use ::mongolayer::record::{FieldValue, IntoFieldValue};

                FieldValue::Map(::std::collections::BTreeMap::from([#(#map_entries),*]))
            }
        }
    }
}

/// Requires `IntoFieldValue` of every type parameter.
fn bound_type_params(generics: &Generics) -> Generics {
    let mut generics = generics.clone();
    let params = generics
        .type_params()
        .map(|param| param.ident.clone())
        .collect::<Vec<_>>();

    let where_clause = generics.make_where_clause();
    for param in params {
        where_clause
            .predicates
            .push(parse_quote!(#param: ::mongolayer::record::IntoFieldValue));
    }

    generics
}

///
/// RecordField
///

struct RecordField {
    ident: syn::Ident,
    name: String,
    keep_empty: bool,
}

impl RecordField {
    /// Parses a field and its `#[record(...)]` attributes; skipped fields yield `None`.
    fn parse(field: &Field) -> syn::Result<Option<Self>> {
        let Some(ident) = field.ident.clone() else {
            return Err(Error::new_spanned(field, "expected a named field"));
        };

        // raw identifiers keep their `r#` prefix in `to_string`
        let mut name = ident.to_string().trim_start_matches("r#").to_string();
        let mut keep_empty = false;
        let mut skip = false;

        for attr in field.attrs.iter().filter(|attr| attr.path().is_ident("record")) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("rename") {
                    name = meta.value()?.parse::<LitStr>()?.value();
                    Ok(())
                } else if meta.path.is_ident("skip") {
                    skip = true;
                    Ok(())
                } else if meta.path.is_ident("keep_empty") {
                    keep_empty = true;
                    Ok(())
                } else {
                    Err(meta.error("expected `rename`, `skip` or `keep_empty`"))
                }
            })?;
        }

        Ok((!skip).then_some(Self { ident, name, keep_empty }))
    }
}
