use crate::{Error, FieldDescriptor, FieldType, Result};
use std::collections::HashSet;

/// Per entity overrides, everything not set here is derived from the record shape.
#[derive(Default, Debug, Clone, PartialEq)]
pub struct EntityConfig {
    pub table_name: Option<String>,
    pub id_field: Option<String>,
    /// `(field, column)` pairs remapping field names to column names.
    pub fields_to_columns: Vec<(String, String)>,
    pub auto_increment: bool,
}

impl EntityConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn table_name(mut self, table_name: impl Into<String>) -> Self {
        self.table_name = Some(table_name.into());
        self
    }

    pub fn id_field(mut self, id_field: impl Into<String>) -> Self {
        self.id_field = Some(id_field.into());
        self
    }

    pub fn column(mut self, field: impl Into<String>, column: impl Into<String>) -> Self {
        self.fields_to_columns.push((field.into(), column.into()));
        self
    }

    pub fn auto_increment(mut self, auto_increment: bool) -> Self {
        self.auto_increment = auto_increment;
        self
    }
}

/// Immutable metadata describing how an entity maps to a table.
///
/// Invariants (checked by [`TypeInfo::new`]):
/// * at least one field, field names are unique and non empty
/// * column names are unique
/// * exactly one field is the identifier, it is not embedded
/// * an auto increment identifier is stored as an integer
#[derive(Debug, Clone, PartialEq)]
pub struct TypeInfo {
    pub table_name: String,
    pub fields: Vec<FieldDescriptor>,
    pub auto_increment: bool,
    id_index: usize,
}

impl TypeInfo {
    /// Build the metadata for a record called `shape_name` with the given fields.
    ///
    /// Table name defaults to `shape_name`, the identifier field defaults to
    /// `lowercase(table_name) + "ID"`, column names default to the field names.
    pub fn new(
        shape_name: &str,
        mut fields: Vec<FieldDescriptor>,
        config: &EntityConfig,
    ) -> Result<Self> {
        if fields.is_empty() {
            return Err(Error::mapping(format!(
                "`{shape_name}` has no fields, only records with named fields can be mapped"
            )));
        }
        let mut names = HashSet::new();
        for field in &fields {
            if field.field_name.is_empty() {
                return Err(Error::mapping(format!(
                    "`{shape_name}` has a field without a name, positional fields cannot be mapped"
                )));
            }
            if !names.insert(field.field_name.as_str()) {
                return Err(Error::mapping(format!(
                    "Field `{}` appears more than once in `{shape_name}`",
                    field.field_name
                )));
            }
        }
        let table_name = config
            .table_name
            .clone()
            .unwrap_or_else(|| shape_name.to_string());
        if table_name.is_empty() {
            return Err(Error::mapping(format!(
                "`{shape_name}` resolves to an empty table name"
            )));
        }
        for (field, column) in &config.fields_to_columns {
            let Some(descriptor) = fields.iter_mut().find(|f| f.field_name == *field) else {
                return Err(Error::mapping(format!(
                    "Cannot remap unknown field `{field}` of `{shape_name}` to column `{column}`"
                )));
            };
            descriptor.column_name = column.clone();
        }
        let mut columns = HashSet::new();
        for field in &fields {
            if field.column_name.is_empty() || !columns.insert(field.column_name.as_str()) {
                return Err(Error::mapping(format!(
                    "Column `{}` of `{table_name}` is empty or used by more than one field",
                    field.column_name
                )));
            }
        }
        let id_field = config
            .id_field
            .clone()
            .unwrap_or_else(|| format!("{}ID", table_name.to_lowercase()));
        let Some(id_index) = fields.iter().position(|f| f.field_name == id_field) else {
            return Err(Error::mapping(format!(
                "Identifier field `{id_field}` does not exist in `{shape_name}`"
            )));
        };
        let id = &fields[id_index];
        if id.is_embedded() {
            return Err(Error::mapping(format!(
                "Identifier field `{id_field}` of `{shape_name}` cannot be an embedded entity"
            )));
        }
        if config.auto_increment && *id.field_type.storage() != FieldType::Int {
            return Err(Error::mapping(format!(
                "Auto increment identifier `{id_field}` of `{shape_name}` must be an integer, found {}",
                id.field_type
            )));
        }
        Ok(Self {
            table_name,
            fields,
            auto_increment: config.auto_increment,
            id_index,
        })
    }

    pub fn id_index(&self) -> usize {
        self.id_index
    }

    pub fn id_field(&self) -> &FieldDescriptor {
        &self.fields[self.id_index]
    }

    /// Look up a field by its field name.
    pub fn field(&self, field_name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.field_name == field_name)
    }

    pub fn columns(&self) -> impl ExactSizeIterator<Item = &str> + Clone {
        self.fields.iter().map(|f| f.column_name.as_str())
    }

    /// Fields written by an insert: the identifier is left to the backend when auto incremented.
    pub fn insert_fields(&self) -> impl Iterator<Item = (usize, &FieldDescriptor)> + Clone {
        self.fields
            .iter()
            .enumerate()
            .filter(|(i, _)| !(self.auto_increment && *i == self.id_index))
    }

    /// Every field except the identifier.
    pub fn value_fields(&self) -> impl Iterator<Item = (usize, &FieldDescriptor)> + Clone {
        self.fields
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != self.id_index)
    }
}

#[cfg(test)]
mod tests {
    use super::{EntityConfig, TypeInfo};
    use crate::{Error, FieldDescriptor, FieldType};

    fn person_fields() -> Vec<FieldDescriptor> {
        vec![
            FieldDescriptor::new("personID", FieldType::Int),
            FieldDescriptor::new("name", FieldType::Text),
            FieldDescriptor::new("age", FieldType::Int),
        ]
    }

    #[test]
    fn defaults_from_shape() {
        let info = TypeInfo::new("Person", person_fields(), &EntityConfig::default())
            .expect("Person should be mappable");
        assert_eq!(info.table_name, "Person");
        assert_eq!(info.id_field().field_name, "personID");
        assert_eq!(info.id_index(), 0);
        assert!(!info.auto_increment);
        assert_eq!(
            info.columns().collect::<Vec<_>>(),
            ["personID", "name", "age"]
        );
    }

    #[test]
    fn overrides() {
        let fields = vec![
            FieldDescriptor::new("name", FieldType::Text),
            FieldDescriptor::new("id", FieldType::Int),
        ];
        let config = EntityConfig::new()
            .table_name("people")
            .id_field("id")
            .column("name", "full_name")
            .auto_increment(true);
        let info = TypeInfo::new("Person", fields, &config).unwrap();
        assert_eq!(info.table_name, "people");
        assert_eq!(info.id_index(), 1);
        assert_eq!(info.fields[0].column_name, "full_name");
        assert_eq!(info.fields[0].field_name, "name");
        assert_eq!(
            info.insert_fields().map(|(i, _)| i).collect::<Vec<_>>(),
            [0]
        );
    }

    #[test]
    fn rejected_shapes() {
        let config = EntityConfig::default();
        assert!(matches!(
            TypeInfo::new("Empty", vec![], &config),
            Err(Error::Mapping(..))
        ));
        assert!(matches!(
            TypeInfo::new(
                "Tuple",
                vec![FieldDescriptor::new("", FieldType::Int)],
                &config
            ),
            Err(Error::Mapping(..))
        ));
        assert!(matches!(
            TypeInfo::new(
                "Person",
                vec![FieldDescriptor::new("id", FieldType::Int)],
                &config
            ),
            Err(Error::Mapping(..))
        ));
        assert!(matches!(
            TypeInfo::new(
                "Person",
                person_fields(),
                &EntityConfig::new().column("missing", "x")
            ),
            Err(Error::Mapping(..))
        ));
        assert!(matches!(
            TypeInfo::new(
                "Person",
                person_fields(),
                &EntityConfig::new().column("age", "name")
            ),
            Err(Error::Mapping(..))
        ));
        assert!(matches!(
            TypeInfo::new(
                "Person",
                vec![FieldDescriptor::new("personID", FieldType::Text)],
                &EntityConfig::new().auto_increment(true)
            ),
            Err(Error::Mapping(..))
        ));
    }
}
