use keel_core::{FieldDescriptor, FieldType, SqlWriter, writer::Context};

/// SQLite dialect: quoted identifiers, storage classes as column types.
#[derive(Default, Debug, Clone, Copy)]
pub struct SqliteSqlWriter {}

impl SqliteSqlWriter {
    pub const fn new() -> Self {
        Self {}
    }
}

impl SqlWriter for SqliteSqlWriter {
    fn as_dyn(&self) -> &dyn SqlWriter {
        self
    }

    fn write_identifier(&self, _context: &mut Context, out: &mut String, value: &str) {
        out.push('"');
        for c in value.chars() {
            if c == '"' {
                out.push_str("\"\"");
            } else {
                out.push(c);
            }
        }
        out.push('"');
    }

    fn write_column_type(&self, _context: &mut Context, out: &mut String, field: &FieldDescriptor) {
        out.push_str(match field.field_type.storage() {
            FieldType::Int => "INTEGER",
            FieldType::Bool => "INTEGER",
            FieldType::Float => "REAL",
            FieldType::Text => "TEXT",
            FieldType::Blob => "BLOB",
            v => {
                log::error!("Unexpected storage type {v} for field `{}`", field.field_name);
                "BLOB"
            }
        });
    }

    fn write_auto_increment(&self, _context: &mut Context, out: &mut String) {
        out.push_str(" AUTOINCREMENT");
    }
}

#[cfg(test)]
mod tests {
    use super::SqliteSqlWriter;
    use keel_core::{EntityConfig, FieldDescriptor, FieldType, SqlWriter, TypeInfo};

    fn person() -> TypeInfo {
        TypeInfo::new(
            "Person",
            vec![
                FieldDescriptor::new("id", FieldType::Int),
                FieldDescriptor::new("name", FieldType::Text),
                FieldDescriptor::new("active", FieldType::Bool).nullable(true),
            ],
            &EntityConfig::new().id_field("id").auto_increment(true),
        )
        .expect("Person should be a valid shape")
    }

    #[test]
    fn create_table() {
        let writer = SqliteSqlWriter::new();
        assert_eq!(
            writer.sql_create_table(&person(), true),
            "CREATE TABLE IF NOT EXISTS \"Person\" (\n\
             \"id\" INTEGER PRIMARY KEY AUTOINCREMENT,\n\
             \"name\" TEXT NOT NULL,\n\
             \"active\" INTEGER\n\
             )"
        );
    }

    #[test]
    fn quoted_upsert() {
        let writer = SqliteSqlWriter::new();
        let info = person();
        assert_eq!(
            writer.sql_upsert(&info).sql,
            "INSERT INTO \"Person\" (\"id\", \"name\", \"active\") VALUES (?, ?, ?) \
             ON CONFLICT (\"id\") DO UPDATE SET \"name\" = EXCLUDED.\"name\", \"active\" = EXCLUDED.\"active\""
        );
        assert_eq!(
            writer.sql_insert_returning(&info).sql,
            "INSERT INTO \"Person\" (\"name\", \"active\") VALUES (?, ?) RETURNING \"id\""
        );
    }
}
