use proc_macro2::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Fields};

pub fn encode_db_enum(input: &DeriveInput) -> TokenStream {
    let name = &input.ident;
    let Data::Enum(data) = &input.data else {
        panic!("`DbEnum` can only be derived for enums, `{name}` is not one");
    };
    let variants: Vec<_> = data
        .variants
        .iter()
        .map(|v| {
            if !matches!(v.fields, Fields::Unit) {
                panic!(
                    "`DbEnum` requires field-less variants, `{name}::{}` has fields",
                    v.ident
                );
            }
            &v.ident
        })
        .collect();
    let ordinals: Vec<_> = (0..variants.len() as i64).collect();
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    quote! {
        impl #impl_generics ::keel::DbEnum for #name #ty_generics #where_clause {
            fn ordinal(&self) -> i64 {
                match self {
                    #(Self::#variants => #ordinals,)*
                }
            }

            fn from_ordinal(ordinal: i64) -> ::std::option::Option<Self> {
                match ordinal {
                    #(#ordinals => ::std::option::Option::Some(Self::#variants),)*
                    _ => ::std::option::Option::None,
                }
            }
        }

        impl #impl_generics ::keel::AsDbValue for #name #ty_generics #where_clause {
            fn field_type() -> ::keel::FieldType {
                ::keel::enum_field_type::<Self>()
            }

            fn to_db_value(&self) -> ::keel::Result<::keel::DbValue> {
                ::keel::encode_enum(self)
            }

            fn from_db_value(value: ::keel::DbValue) -> ::keel::Result<Self> {
                ::keel::decode_enum(value)
            }
        }
    }
}
