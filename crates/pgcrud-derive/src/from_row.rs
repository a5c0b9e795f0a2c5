//! FromRow derive macro implementation

use proc_macro2::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Fields, LitStr, Result};

enum Source {
    Column(String),
    Default,
}

pub fn expand(input: DeriveInput) -> Result<TokenStream> {
    let name = &input.ident;
    let generics = &input.generics;
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    &input,
                    "FromRow can only be derived for structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                &input,
                "FromRow can only be derived for structs",
            ));
        }
    };

    let mut field_extracts = Vec::with_capacity(fields.len());
    for field in fields {
        let Some(field_name) = field.ident.as_ref() else {
            return Err(syn::Error::new_spanned(field, "expected a named field"));
        };
        let extract = match field_source(field, field_name)? {
            Source::Column(column_name) => quote! {
                #field_name: ::pgcrud::RowExt::try_get_column(row, #column_name)?
            },
            Source::Default => quote! {
                #field_name: ::core::default::Default::default()
            },
        };
        field_extracts.push(extract);
    }

    Ok(quote! {
        impl #impl_generics ::pgcrud::FromRow for #name #ty_generics #where_clause {
            fn from_row(row: &::pgcrud::tokio_postgres::Row) -> ::pgcrud::StoreResult<Self> {
                Ok(Self {
                    #(#field_extracts),*
                })
            }
        }
    })
}

fn field_source(field: &syn::Field, field_name: &syn::Ident) -> Result<Source> {
    let mut column = None;
    let mut use_default = false;

    for attr in &field.attrs {
        if !attr.path().is_ident("pgcrud") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("column") {
                let lit: LitStr = meta.value()?.parse()?;
                column = Some(lit.value());
                Ok(())
            } else if meta.path.is_ident("default") {
                use_default = true;
                Ok(())
            } else {
                Err(meta.error("unsupported pgcrud attribute, expected `column` or `default`"))
            }
        })?;
    }

    match (column, use_default) {
        (Some(_), true) => Err(syn::Error::new_spanned(
            field,
            "`column` and `default` cannot be combined",
        )),
        (_, true) => Ok(Source::Default),
        (Some(column), false) => Ok(Source::Column(column)),
        (None, false) => Ok(Source::Column(
            field_name.to_string().trim_start_matches("r#").to_string(),
        )),
    }
}
