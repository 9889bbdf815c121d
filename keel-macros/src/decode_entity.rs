use crate::decode_field::{FieldMetadata, decode_field};
use convert_case::Case;
use quote::ToTokens;
use syn::{Data, DeriveInput, Fields, Ident, LitStr, parse::ParseBuffer};

/// Where the named fields live.
pub(crate) enum Shape {
    Struct,
    /// Enumeration with exactly one variant.
    Variant(Ident),
    /// Anything else, reported when the entity is reflected.
    Unsupported(String),
}

pub(crate) struct EntityMetadata {
    pub(crate) shape: Shape,
    pub(crate) fields: Vec<FieldMetadata>,
    pub(crate) table: Option<String>,
    pub(crate) id: Option<String>,
    pub(crate) auto_increment: bool,
    /// Case conversion applied to the columns not explicitly named.
    pub(crate) rename_all: Option<String>,
}

pub(crate) fn decode_case(value: &str) -> Case {
    match value {
        "snake_case" => Case::Snake,
        "camelCase" => Case::Camel,
        "PascalCase" => Case::Pascal,
        "kebab-case" => Case::Kebab,
        "lowercase" => Case::Lower,
        "UPPERCASE" => Case::Upper,
        _ => panic!(
            "Unknown case `{value}` in `rename_all`, expected one of: snake_case, camelCase, PascalCase, kebab-case, lowercase, UPPERCASE"
        ),
    }
}

fn decode_fields(fields: &Fields, shape: Shape) -> (Shape, Vec<FieldMetadata>) {
    match fields {
        Fields::Named(named) => (shape, named.named.iter().map(decode_field).collect()),
        Fields::Unnamed(..) => (
            Shape::Unsupported("positional fields have no names".into()),
            vec![],
        ),
        Fields::Unit => (Shape::Unsupported("it has no fields".into()), vec![]),
    }
}

pub fn decode_entity(input: &DeriveInput) -> EntityMetadata {
    let (shape, fields) = match &input.data {
        Data::Struct(data) => decode_fields(&data.fields, Shape::Struct),
        Data::Enum(data) if data.variants.len() == 1 => {
            let variant = &data.variants[0];
            decode_fields(&variant.fields, Shape::Variant(variant.ident.clone()))
        }
        Data::Enum(data) => (
            Shape::Unsupported(format!(
                "it has {} variants, only single constructor records can be mapped",
                data.variants.len()
            )),
            vec![],
        ),
        Data::Union(..) => (Shape::Unsupported("unions cannot be mapped".into()), vec![]),
    };
    let mut metadata = EntityMetadata {
        shape,
        fields,
        table: None,
        id: None,
        auto_increment: false,
        rename_all: None,
    };
    for attr in &input.attrs {
        let meta = &attr.meta;
        if meta.path().is_ident("keel") {
            let Ok(list) = meta.require_list() else {
                panic!("Error while parsing `keel`, use it like: `#[keel(attribute = value, ..)]`");
            };
            let _ = list.parse_nested_meta(|arg| {
                if arg.path.is_ident("table") {
                    let Ok(value) = arg.value().and_then(ParseBuffer::parse::<LitStr>) else {
                        panic!(
                            "Error while parsing `table`, use it like: `#[keel(table = \"my_table\")]`"
                        );
                    };
                    metadata.table = Some(value.value());
                } else if arg.path.is_ident("id") {
                    let Ok(value) = arg.value().and_then(ParseBuffer::parse::<LitStr>) else {
                        panic!("Error while parsing `id`, use it like: `#[keel(id = \"field\")]`");
                    };
                    metadata.id = Some(value.value());
                } else if arg.path.is_ident("auto_increment") {
                    let Err(..) = arg.value() else {
                        // value() is Err for Meta::Path
                        panic!(
                            "Error while parsing `auto_increment`, use it like: `#[keel(auto_increment)]`"
                        );
                    };
                    metadata.auto_increment = true;
                } else if arg.path.is_ident("rename_all") {
                    let Ok(value) = arg.value().and_then(ParseBuffer::parse::<LitStr>) else {
                        panic!(
                            "Error while parsing `rename_all`, use it like: `#[keel(rename_all = \"snake_case\")]`"
                        );
                    };
                    let value = value.value();
                    decode_case(&value);
                    metadata.rename_all = Some(value);
                } else {
                    panic!(
                        "Unknown attribute `{}` inside keel macro",
                        arg.path.to_token_stream()
                    );
                }
                Ok(())
            });
        }
    }
    let marked: Vec<_> = metadata
        .fields
        .iter()
        .filter(|f| f.id)
        .map(|f| f.name.clone())
        .collect();
    match (metadata.id.is_some(), marked.len()) {
        (true, 1..) => panic!(
            "The identifier is declared both with `#[keel(id = \"..\")]` and `#[keel(id)]`"
        ),
        (false, 1) => metadata.id = marked.into_iter().next(),
        (false, 2..) => panic!("Only one field can be marked with `#[keel(id)]`"),
        _ => {}
    }
    metadata
}
