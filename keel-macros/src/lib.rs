mod decode_entity;
mod decode_field;
mod encode_db_enum;
mod encode_entity;

use decode_entity::decode_entity;
use encode_db_enum::encode_db_enum;
use encode_entity::encode_entity;
use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

/// Implement `keel::Entity` for a record with named fields.
///
/// Struct attributes: `#[keel(table = "..", id = "..", auto_increment, rename_all = "..")]`.
/// Field attributes: `#[keel(id)]`, `#[keel(column = "..")]`, `#[keel(embedded)]`.
#[proc_macro_derive(Entity, attributes(keel))]
pub fn derive_entity(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let metadata = decode_entity(&input);
    encode_entity(&input, &metadata).into()
}

/// Implement `keel::DbEnum` and `keel::AsDbValue` for a field-less enum, stored by ordinal.
#[proc_macro_derive(DbEnum)]
pub fn derive_db_enum(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    encode_db_enum(&input).into()
}
