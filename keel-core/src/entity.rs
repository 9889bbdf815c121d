use crate::{DbValue, EntityConfig, Mapping, Record, Result, Row, Session, TypeInfo, reflect};
use std::sync::Arc;

/// Type persisted as one table row.
///
/// Only [`Entity::record`] is required, usually generated by `#[derive(Entity)]`. Every other
/// method has a default computed from the record and may be overridden, for example to flatten
/// a nested value into several columns.
pub trait Entity: Sized + 'static {
    /// Fields of the type and how to construct it.
    fn record() -> Result<Record<Self>>;

    /// Overrides of the derived table, identifier and column names.
    fn config() -> EntityConfig {
        EntityConfig::default()
    }

    /// Reflected mapping, computed once per type.
    fn mapping() -> Result<Arc<Mapping<Self>>> {
        reflect::<Self>()
    }

    fn type_info() -> Result<Arc<TypeInfo>> {
        Ok(Self::mapping()?.info.clone())
    }

    /// Encode every field, in field order.
    fn to_row(&self) -> Result<Row> {
        Self::mapping()?.encode(self)
    }

    /// Build the value back from a row. Embedded entities are loaded through `session`.
    fn from_row(row: Row, session: Option<Session<'_>>) -> Result<Self> {
        Self::mapping()?.decode(row, session)
    }

    fn id_value(&self) -> Result<DbValue> {
        Self::mapping()?.id_value(self)
    }

    /// Assign the identifier, used after the backend generated it.
    fn set_id(&mut self, id: DbValue) -> Result<()> {
        Self::mapping()?.set_id(self, id)
    }
}
