use crate::decode_entity::{EntityMetadata, Shape, decode_case};
use convert_case::Casing;
use proc_macro2::TokenStream;
use quote::quote;
use syn::DeriveInput;

/// Implementation of `Entity` for a shape that cannot be mapped, reflecting it fails.
fn unsupported(input: &DeriveInput, reason: &str) -> TokenStream {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    let message = format!("`{name}` cannot be mapped: {reason}");
    quote! {
        impl #impl_generics ::keel::Entity for #name #ty_generics #where_clause {
            fn record() -> ::keel::Result<::keel::Record<Self>> {
                ::std::result::Result::Err(::keel::Error::mapping(#message))
            }
        }
    }
}

pub fn encode_entity(input: &DeriveInput, metadata: &EntityMetadata) -> TokenStream {
    let variant = match &metadata.shape {
        Shape::Struct => None,
        Shape::Variant(v) => Some(v),
        Shape::Unsupported(reason) => return unsupported(input, reason),
    };
    let name = &input.ident;
    let shape_name = name.to_string();
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    let fields = metadata.fields.iter().map(|f| {
        let ident = &f.ident;
        let ty = &f.ty;
        let name = &f.name;
        // Reference to the field of `e`, shared or unique depending on `e`.
        let access = match variant {
            None => quote!(&e.#ident),
            Some(v) => quote!(match e { Self::#v { #ident, .. } => #ident }),
        };
        if f.embedded {
            quote! {
                ::keel::FieldDef::<Self>::embedded::<#ty>(
                    #name,
                    |e| ::keel::Embed::embedded_id(#access),
                )?
            }
        } else {
            let place = match variant {
                None => quote!(e.#ident),
                Some(v) => quote!(*match e { Self::#v { #ident, .. } => #ident }),
            };
            quote! {
                ::keel::FieldDef::<Self>::value::<#ty>(
                    #name,
                    |e| ::keel::AsDbValue::to_db_value(#access),
                    |e, v| {
                        #place = <#ty as ::keel::AsDbValue>::from_db_value(v)?;
                        ::std::result::Result::Ok(())
                    },
                )
            }
        }
    });
    let values = metadata.fields.iter().map(|f| {
        let ident = &f.ident;
        let ty = &f.ty;
        if f.embedded {
            quote!(#ident: reader.next_embedded::<#ty>()?)
        } else {
            quote!(#ident: reader.next::<#ty>()?)
        }
    });
    let constructor = match variant {
        None => quote!(Self),
        Some(v) => quote!(Self::#v),
    };
    let mut config = quote!(::keel::EntityConfig::new());
    if let Some(table) = &metadata.table {
        config.extend(quote!(.table_name(#table)));
    }
    if let Some(id) = &metadata.id {
        config.extend(quote!(.id_field(#id)));
    }
    if metadata.auto_increment {
        config.extend(quote!(.auto_increment(true)));
    }
    for field in &metadata.fields {
        let column = match (&field.column, &metadata.rename_all) {
            (Some(column), _) => column.clone(),
            (None, Some(case)) => field.name.to_case(decode_case(case)),
            (None, None) => continue,
        };
        if column != field.name {
            let name = &field.name;
            config.extend(quote!(.column(#name, #column)));
        }
    }
    quote! {
        impl #impl_generics ::keel::Entity for #name #ty_generics #where_clause {
            fn record() -> ::keel::Result<::keel::Record<Self>> {
                ::std::result::Result::Ok(::keel::Record::<Self> {
                    name: #shape_name,
                    fields: ::std::vec![#(#fields),*],
                    construct: |reader| {
                        ::std::result::Result::Ok(#constructor {
                            #(#values),*
                        })
                    },
                })
            }

            fn config() -> ::keel::EntityConfig {
                #config
            }
        }
    }
}
