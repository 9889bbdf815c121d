use quote::ToTokens;
use syn::{Field, Ident, LitStr, Type, ext::IdentExt, parse::ParseBuffer};

pub(crate) struct FieldMetadata {
    pub(crate) ident: Ident,
    pub(crate) ty: Type,
    /// Field name as seen by the mapping, raw identifier prefix removed.
    pub(crate) name: String,
    pub(crate) column: Option<String>,
    pub(crate) id: bool,
    pub(crate) embedded: bool,
}

pub fn decode_field(field: &Field) -> FieldMetadata {
    let ident = field
        .ident
        .clone()
        .expect("Field is expected to have a name");
    let mut metadata = FieldMetadata {
        name: ident.unraw().to_string(),
        ident,
        ty: field.ty.clone(),
        column: None,
        id: false,
        embedded: false,
    };
    for attr in &field.attrs {
        let meta = &attr.meta;
        if meta.path().is_ident("keel") {
            let Ok(list) = meta.require_list() else {
                panic!("Error while parsing `keel`, use it like: `#[keel(attribute = value, ...)]`");
            };
            let _ = list.parse_nested_meta(|arg| {
                if arg.path.is_ident("column") {
                    let Ok(v) = arg.value().and_then(ParseBuffer::parse::<LitStr>) else {
                        panic!(
                            "Error while parsing `column`, use it like: `#[keel(column = \"my_column\")]`"
                        );
                    };
                    metadata.column = Some(v.value());
                } else if arg.path.is_ident("id") {
                    let Err(..) = arg.value() else {
                        // value() is Err for Meta::Path
                        panic!("Error while parsing `id`, use it like: `#[keel(id)]`");
                    };
                    metadata.id = true;
                } else if arg.path.is_ident("embedded") {
                    let Err(..) = arg.value() else {
                        panic!("Error while parsing `embedded`, use it like: `#[keel(embedded)]`");
                    };
                    metadata.embedded = true;
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
    if metadata.id && metadata.embedded {
        panic!(
            "Field `{}` cannot be both the identifier and an embedded entity",
            metadata.name
        );
    }
    metadata
}
