use crate::{
    AsDbValue, DbValue, Entity, EntityConfig, Error, FieldDescriptor, FieldType, Result, Row,
    Session, TypeInfo,
};
use std::{fmt, sync::Arc, vec};

/// Accessors of one field of `E`.
pub struct FieldDef<E> {
    pub name: &'static str,
    pub field_type: FieldType,
    pub nullable: bool,
    /// Read and encode the field.
    pub get: fn(&E) -> Result<DbValue>,
    /// Decode and assign the field, absent for embedded fields.
    pub set: Option<fn(&mut E, DbValue) -> Result<()>>,
}

impl<E> FieldDef<E> {
    /// Field stored through the value codec.
    pub fn value<T: AsDbValue>(
        name: &'static str,
        get: fn(&E) -> Result<DbValue>,
        set: fn(&mut E, DbValue) -> Result<()>,
    ) -> Self {
        Self {
            name,
            field_type: T::field_type(),
            nullable: T::NULLABLE,
            get,
            set: Some(set),
        }
    }

    /// Field holding another entity, stored as that entity's identifier.
    pub fn embedded<T: Embed>(name: &'static str, get: fn(&E) -> Result<DbValue>) -> Result<Self> {
        Ok(Self {
            name,
            field_type: FieldType::Embedded(T::target_info()?),
            nullable: T::NULLABLE,
            get,
            set: None,
        })
    }
}

impl<E> fmt::Debug for FieldDef<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDef")
            .field("name", &self.name)
            .field("field_type", &self.field_type)
            .field("nullable", &self.nullable)
            .finish()
    }
}

/// Explicit description of a record type: its fields in order and how to build it back.
///
/// `construct` receives the decoded row through a [`RowReader`] and must read every field in
/// declaration order.
pub struct Record<E> {
    pub name: &'static str,
    pub fields: Vec<FieldDef<E>>,
    pub construct: fn(&mut RowReader<'_, '_>) -> Result<E>,
}

impl<E> fmt::Debug for Record<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Record")
            .field("name", &self.name)
            .field("fields", &self.fields)
            .finish()
    }
}

/// Sequential access to the values of a row while an entity is constructed.
pub struct RowReader<'r, 's> {
    values: vec::IntoIter<DbValue>,
    fields: &'r [FieldDescriptor],
    table: &'r str,
    position: usize,
    session: Option<Session<'s>>,
}

impl<'r, 's> RowReader<'r, 's> {
    pub fn new(row: Row, info: &'r TypeInfo, session: Option<Session<'s>>) -> Self {
        Self {
            values: row.into_iter(),
            fields: &info.fields,
            table: &info.table_name,
            position: 0,
            session,
        }
    }

    fn context(&self, error: Error) -> Error {
        let Some(field) = self.position.checked_sub(1).and_then(|i| self.fields.get(i)) else {
            return error;
        };
        match error {
            Error::Mapping(message) => Error::Mapping(format!(
                "Field `{}` of `{}`: {message}",
                field.field_name, self.table
            )),
            e => e,
        }
    }

    /// Next raw value.
    pub fn next_value(&mut self) -> Result<DbValue> {
        let value = self.values.next().ok_or_else(|| {
            Error::mapping(format!(
                "Row of `{}` has {} values but more were read",
                self.table, self.position
            ))
        })?;
        self.position += 1;
        Ok(value)
    }

    /// Decode the next value.
    pub fn next<T: AsDbValue>(&mut self) -> Result<T> {
        let value = self.next_value()?;
        T::from_db_value(value).map_err(|e| self.context(e))
    }

    /// Load the entity whose identifier is the next value.
    pub fn next_embedded<T: Embed>(&mut self) -> Result<T> {
        let value = self.next_value()?;
        let session = self.session.as_mut().map(Session::reborrow);
        T::resolve(session, value).map_err(|e| self.context(e))
    }

    /// Values not read yet.
    pub fn remaining(&self) -> usize {
        self.values.len()
    }
}

/// Field type that can be embedded in an entity by storing its identifier.
pub trait Embed: Sized {
    const NULLABLE: bool;

    fn target_info() -> Result<Arc<TypeInfo>>;

    /// Identifier stored in the embedding entity's column.
    fn embedded_id(&self) -> Result<DbValue>;

    /// Load the value from its identifier, needs a session to reach the database.
    fn resolve(session: Option<Session<'_>>, id: DbValue) -> Result<Self>;
}

impl<T: Entity> Embed for T {
    const NULLABLE: bool = false;

    fn target_info() -> Result<Arc<TypeInfo>> {
        T::type_info()
    }

    fn embedded_id(&self) -> Result<DbValue> {
        self.id_value()
    }

    fn resolve(session: Option<Session<'_>>, id: DbValue) -> Result<Self> {
        let Some(session) = session else {
            return Err(Error::mapping(format!(
                "Loading the embedded `{}` requires a connection",
                T::type_info()?.table_name
            )));
        };
        crate::load_by_id::<T>(session, id)
    }
}

impl<T: Entity> Embed for Option<T> {
    const NULLABLE: bool = true;

    fn target_info() -> Result<Arc<TypeInfo>> {
        T::type_info()
    }

    fn embedded_id(&self) -> Result<DbValue> {
        match self {
            Some(v) => v.id_value(),
            None => Ok(DbValue::Null),
        }
    }

    fn resolve(session: Option<Session<'_>>, id: DbValue) -> Result<Self> {
        if id.is_null() {
            return Ok(None);
        }
        T::resolve(session, id).map(Some)
    }
}

/// Record of `E` bound to its validated metadata.
pub struct Mapping<E> {
    pub info: Arc<TypeInfo>,
    pub record: Record<E>,
}

impl<E> Mapping<E> {
    pub fn new(record: Record<E>, config: &EntityConfig) -> Result<Self> {
        let fields = record
            .fields
            .iter()
            .map(|f| FieldDescriptor::new(f.name, f.field_type.clone()).nullable(f.nullable))
            .collect();
        let info = TypeInfo::new(record.name, fields, config)?;
        Ok(Self {
            info: Arc::new(info),
            record,
        })
    }

    /// Encode every field in declaration order.
    pub fn encode(&self, entity: &E) -> Result<Row> {
        self.record
            .fields
            .iter()
            .map(|f| {
                (f.get)(entity).map_err(|e| match e {
                    Error::Mapping(message) => Error::Mapping(format!(
                        "Field `{}` of `{}`: {message}",
                        f.name, self.info.table_name
                    )),
                    e => e,
                })
            })
            .collect()
    }

    /// Build an entity from a row, which must have exactly one value per field.
    pub fn decode(&self, row: Row, session: Option<Session<'_>>) -> Result<E> {
        if row.len() != self.info.fields.len() {
            return Err(Error::mapping(format!(
                "`{}` has {} fields but the row has {} values",
                self.info.table_name,
                self.info.fields.len(),
                row.len()
            )));
        }
        let mut reader = RowReader::new(row, &self.info, session);
        let entity = (self.record.construct)(&mut reader)?;
        if reader.remaining() != 0 {
            return Err(Error::mapping(format!(
                "Constructor of `{}` left {} values unread",
                self.info.table_name,
                reader.remaining()
            )));
        }
        Ok(entity)
    }

    pub fn id_value(&self, entity: &E) -> Result<DbValue> {
        (self.record.fields[self.info.id_index()].get)(entity)
    }

    pub fn set_id(&self, entity: &mut E, id: DbValue) -> Result<()> {
        let field = &self.record.fields[self.info.id_index()];
        let Some(set) = field.set else {
            return Err(Error::mapping(format!(
                "Identifier `{}` of `{}` cannot be assigned",
                field.name, self.info.table_name
            )));
        };
        set(entity, id)
    }
}
