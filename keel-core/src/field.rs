use crate::TypeInfo;
use std::{
    fmt::{self, Display},
    sync::Arc,
};

/// Declared type of an entity field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldType {
    Int,
    Float,
    Text,
    Bool,
    Blob,
    /// Enumeration stored through its base type (ordinal `Int` unless a converter says otherwise).
    Enum(Box<FieldType>),
    /// Field holding another entity, stored as the nested entity identifier.
    Embedded(Arc<TypeInfo>),
}

impl FieldType {
    /// Type actually stored in the column.
    pub fn storage(&self) -> &FieldType {
        match self {
            FieldType::Enum(base) => base.storage(),
            FieldType::Embedded(info) => info.id_field().field_type.storage(),
            v => v,
        }
    }
}

impl Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Int => f.write_str("Int"),
            FieldType::Float => f.write_str("Float"),
            FieldType::Text => f.write_str("Text"),
            FieldType::Bool => f.write_str("Bool"),
            FieldType::Blob => f.write_str("Blob"),
            FieldType::Enum(base) => write!(f, "Enum({base})"),
            FieldType::Embedded(info) => write!(f, "Embedded({})", info.table_name),
        }
    }
}

/// Reflected description of one entity field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    /// Name of the field in the application value.
    pub field_name: String,
    /// Name of the column in the table, may differ from `field_name`.
    pub column_name: String,
    pub field_type: FieldType,
    pub nullable: bool,
}

impl FieldDescriptor {
    pub fn new(field_name: impl Into<String>, field_type: FieldType) -> Self {
        let field_name = field_name.into();
        Self {
            column_name: field_name.clone(),
            field_name,
            field_type,
            nullable: false,
        }
    }

    pub fn column(mut self, column_name: impl Into<String>) -> Self {
        self.column_name = column_name.into();
        self
    }

    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    pub fn is_embedded(&self) -> bool {
        matches!(self.field_type, FieldType::Embedded(..))
    }
}
