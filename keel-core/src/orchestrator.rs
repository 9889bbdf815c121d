use crate::{
    AsDbValue, CommitMode, Conn, Database, DbValue, Entity, Error, NoTrace, Result, Row, Session,
    Statement, TraceSink, TypeInfo, WhereExpr,
};
use std::sync::Arc;

/// Public persistence operations over a [`Conn`].
///
/// Under [`CommitMode::AutoCommit`] every mutating operation runs inside its own transaction,
/// batches commit once at the end and roll back entirely on the first failure. Under
/// [`CommitMode::Manual`] no transaction statement is ever issued.
#[derive(Clone)]
pub struct Orchestrator {
    sink: Arc<dyn TraceSink>,
}

impl Default for Orchestrator {
    fn default() -> Self {
        Self::new()
    }
}

impl Orchestrator {
    pub fn new() -> Self {
        Self {
            sink: Arc::new(NoTrace),
        }
    }

    /// Orchestrator reporting every executed statement to `sink`.
    pub fn with_sink(sink: Arc<dyn TraceSink>) -> Self {
        Self { sink }
    }

    fn session<'a, D: Database>(&'a self, conn: &'a mut Conn<D>) -> Session<'a> {
        Session::new(conn.database_mut(), &*self.sink)
    }

    /// Run `f`, wrapped in a transaction under auto commit.
    fn transaction<D: Database, T>(
        &self,
        conn: &mut Conn<D>,
        f: impl FnOnce(&mut Session<'_>) -> Result<T>,
    ) -> Result<T> {
        let auto_commit = conn.commit_mode() == CommitMode::AutoCommit;
        let mut session = self.session(conn);
        if !auto_commit {
            return f(&mut session);
        }
        session.begin()?;
        match f(&mut session).and_then(|v| session.commit().map(|_| v)) {
            Ok(v) => Ok(v),
            Err(e) => {
                if let Err(rollback) = session.rollback() {
                    log::error!("Rollback after `{e}` failed: {rollback}");
                }
                Err(e)
            }
        }
    }

    /// Load the entity with the given identifier.
    ///
    /// Fails with [`Error::EntityNotFound`] when there is no such row and with
    /// [`Error::NoUniqueKey`] when several rows match.
    pub fn select_by_id<E: Entity, D: Database>(
        &self,
        conn: &mut Conn<D>,
        id: impl AsDbValue,
    ) -> Result<E> {
        load_by_id(self.session(conn), id.to_db_value()?)
    }

    /// Entities matching `condition`, possibly none.
    pub fn select<E: Entity, D: Database>(
        &self,
        conn: &mut Conn<D>,
        condition: &WhereExpr,
    ) -> Result<Vec<E>> {
        let info = E::type_info()?;
        let mut session = self.session(conn);
        let statement = session.sql_writer().sql_select(&info, condition)?;
        let rows = session.query(
            "select",
            &info.table_name,
            &statement.sql,
            &statement.arguments(&[], &DbValue::Null)?,
        )?;
        decode_rows(&mut session, rows)
    }

    /// Number of rows matching the predicate of `condition`.
    pub fn count<E: Entity, D: Database>(
        &self,
        conn: &mut Conn<D>,
        condition: &WhereExpr,
    ) -> Result<u64> {
        let info = E::type_info()?;
        let mut session = self.session(conn);
        let statement = session.sql_writer().sql_count(&info, condition)?;
        let rows = session.query(
            "count",
            &info.table_name,
            &statement.sql,
            &statement.arguments(&[], &DbValue::Null)?,
        )?;
        count_value(&info, rows)
    }

    /// Insert the entity when its identifier is absent, update it when exactly one row has it.
    ///
    /// The existence probe and the write are separate statements: a concurrent writer can insert
    /// the same identifier in between, the backend then reports [`Error::DuplicateInsert`].
    pub fn persist<E: Entity, D: Database>(
        &self,
        conn: &mut Conn<D>,
        entity: &mut E,
    ) -> Result<()> {
        let info = E::type_info()?;
        let row = entity_row(&*entity, &info)?;
        let id = key_of(&row, &info)?;
        self.transaction(conn, |session| {
            let existing = if id.is_null() {
                0
            } else {
                let probe = session.sql_writer().sql_count_by_id(&info);
                let rows = session.query(
                    "persist",
                    &info.table_name,
                    &probe.sql,
                    &probe.arguments(&[], &id)?,
                )?;
                count_value(&info, rows)?
            };
            match existing {
                0 => Inserter::new(session, &info).insert(session, entity, &row),
                1 => Updater::new(session, &info).update(session, &row).map(|_| ()),
                rows => Err(Error::NoUniqueKey {
                    table: info.table_name.clone(),
                    rows: rows as usize,
                }),
            }
        })
    }

    /// Insert unconditionally and return the entity with its identifier populated.
    pub fn insert<E: Entity, D: Database>(&self, conn: &mut Conn<D>, mut entity: E) -> Result<E> {
        let info = E::type_info()?;
        let row = entity_row(&entity, &info)?;
        self.transaction(conn, |session| {
            Inserter::new(session, &info).insert(session, &mut entity, &row)
        })?;
        Ok(entity)
    }

    /// Update every column of the row keyed by the entity identifier, returns the rows affected.
    pub fn update<E: Entity, D: Database>(&self, conn: &mut Conn<D>, entity: &E) -> Result<u64> {
        let info = E::type_info()?;
        let row = entity_row(entity, &info)?;
        self.transaction(conn, |session| {
            Updater::new(session, &info).update(session, &row)
        })
    }

    /// Delete the row keyed by the entity identifier, a missing row is not an error.
    pub fn delete<E: Entity, D: Database>(&self, conn: &mut Conn<D>, entity: &E) -> Result<u64> {
        let id = entity.id_value()?;
        self.delete_key::<E, D>(conn, id)
    }

    pub fn delete_by_id<E: Entity, D: Database>(
        &self,
        conn: &mut Conn<D>,
        id: impl AsDbValue,
    ) -> Result<u64> {
        self.delete_key::<E, D>(conn, id.to_db_value()?)
    }

    fn delete_key<E: Entity, D: Database>(&self, conn: &mut Conn<D>, id: DbValue) -> Result<u64> {
        let info = E::type_info()?;
        self.transaction(conn, |session| {
            Deleter::new(session, &info).delete(session, &id)
        })
    }

    /// Delete every row matching `condition`.
    pub fn delete_where<E: Entity, D: Database>(
        &self,
        conn: &mut Conn<D>,
        condition: &WhereExpr,
    ) -> Result<u64> {
        let info = E::type_info()?;
        self.transaction(conn, |session| {
            let statement = session.sql_writer().sql_delete_where(&info, condition)?;
            session.execute(
                "delete_where",
                &info.table_name,
                &statement.sql,
                &statement.arguments(&[], &DbValue::Null)?,
            )
        })
    }

    /// Insert or update with a single `INSERT ... ON CONFLICT` statement.
    pub fn upsert<E: Entity, D: Database>(&self, conn: &mut Conn<D>, entity: &E) -> Result<u64> {
        let info = E::type_info()?;
        let row = entity_row(entity, &info)?;
        self.transaction(conn, |session| {
            let writer = session.sql_writer();
            if !writer.supports_upsert() {
                return Err(Error::database(format!(
                    "Cannot upsert into `{}`, the backend does not support INSERT ... ON CONFLICT",
                    info.table_name
                )));
            }
            let statement = writer.sql_upsert(&info);
            session
                .execute(
                    "upsert",
                    &info.table_name,
                    &statement.sql,
                    &statement.arguments(&row, &DbValue::Null)?,
                )
                .map_err(|e| with_table(e, &info))
        })
    }

    /// Insert every entity in order, assigning generated identifiers.
    pub fn insert_many<E: Entity, D: Database>(
        &self,
        conn: &mut Conn<D>,
        entities: &mut [E],
    ) -> Result<()> {
        let info = E::type_info()?;
        self.transaction(conn, |session| {
            let inserter = Inserter::new(session, &info);
            session.prepare(&inserter.statement.sql)?;
            for entity in entities.iter_mut() {
                let row = entity_row(&*entity, &info)?;
                inserter.insert(session, entity, &row)?;
            }
            Ok(())
        })
    }

    /// Update every entity in order, returns the total rows affected.
    pub fn update_many<E: Entity, D: Database>(
        &self,
        conn: &mut Conn<D>,
        entities: &[E],
    ) -> Result<u64> {
        let info = E::type_info()?;
        self.transaction(conn, |session| {
            let updater = Updater::new(session, &info);
            if let Some(statement) = &updater.statement {
                session.prepare(&statement.sql)?;
            }
            let mut affected = 0;
            for entity in entities {
                affected += updater.update(session, &entity_row(entity, &info)?)?;
            }
            Ok(affected)
        })
    }

    /// Delete every entity in order, returns the total rows affected.
    pub fn delete_many<E: Entity, D: Database>(
        &self,
        conn: &mut Conn<D>,
        entities: &[E],
    ) -> Result<u64> {
        let info = E::type_info()?;
        self.transaction(conn, |session| {
            let deleter = Deleter::new(session, &info);
            session.prepare(&deleter.statement.sql)?;
            let mut affected = 0;
            for entity in entities {
                affected += deleter.delete(session, &entity.id_value()?)?;
            }
            Ok(affected)
        })
    }

    /// Convert rows fetched elsewhere, they must contain the columns of `E` in field order.
    pub fn entities_from_rows<E: Entity, D: Database>(
        &self,
        conn: &mut Conn<D>,
        rows: Vec<Row>,
    ) -> Result<Vec<E>> {
        decode_rows(&mut self.session(conn), rows)
    }

    pub fn create_table<E: Entity, D: Database>(
        &self,
        conn: &mut Conn<D>,
        if_not_exists: bool,
    ) -> Result<()> {
        let info = E::type_info()?;
        let mut session = self.session(conn);
        let sql = session.sql_writer().sql_create_table(&info, if_not_exists);
        session
            .execute("create_table", &info.table_name, &sql, &[])
            .map(|_| ())
    }

    pub fn drop_table<E: Entity, D: Database>(
        &self,
        conn: &mut Conn<D>,
        if_exists: bool,
    ) -> Result<()> {
        let info = E::type_info()?;
        let mut session = self.session(conn);
        let sql = session.sql_writer().sql_drop_table(&info, if_exists);
        session
            .execute("drop_table", &info.table_name, &sql, &[])
            .map(|_| ())
    }
}

/// Load one entity by identifier through an existing session, used to resolve embedded fields.
pub fn load_by_id<E: Entity>(mut session: Session<'_>, id: DbValue) -> Result<E> {
    let info = E::type_info()?;
    let statement = session.sql_writer().sql_select_by_id(&info);
    let mut rows = session.query(
        "select_by_id",
        &info.table_name,
        &statement.sql,
        &statement.arguments(&[], &id)?,
    )?;
    match rows.len() {
        0 => Err(Error::EntityNotFound {
            table: info.table_name.clone(),
            id,
        }),
        1 => E::from_row(rows.remove(0), Some(session)),
        n => Err(Error::NoUniqueKey {
            table: info.table_name.clone(),
            rows: n,
        }),
    }
}

fn decode_rows<E: Entity>(session: &mut Session<'_>, rows: Vec<Row>) -> Result<Vec<E>> {
    rows.into_iter()
        .map(|row| E::from_row(row, Some(session.reborrow())))
        .collect()
}

fn count_value(info: &TypeInfo, rows: Vec<Row>) -> Result<u64> {
    let value = rows.into_iter().next().and_then(|r| r.into_iter().next());
    match value.as_ref().and_then(DbValue::as_i64) {
        Some(v) => u64::try_from(v).map_err(|_| Error::mapping(format!("Negative count {v}"))),
        None => Err(Error::mapping(format!(
            "Counting rows of `{}` returned {}",
            info.table_name,
            value.unwrap_or_default()
        ))),
    }
}

/// Row of `entity`, rejected when it does not hold one value per mapped field.
fn entity_row<E: Entity>(entity: &E, info: &TypeInfo) -> Result<Row> {
    let row = entity.to_row()?;
    if row.len() != info.fields.len() {
        return Err(Error::mapping(format!(
            "`{}` produced {} values but {} fields are mapped",
            info.table_name,
            row.len(),
            info.fields.len()
        )));
    }
    Ok(row)
}

fn key_of(row: &[DbValue], info: &TypeInfo) -> Result<DbValue> {
    row.get(info.id_index()).cloned().ok_or_else(|| {
        Error::mapping(format!(
            "Row of `{}` has no value for the identifier `{}`",
            info.table_name,
            info.id_field().field_name
        ))
    })
}

/// Drivers cannot know the table a constraint belongs to.
fn with_table(error: Error, info: &TypeInfo) -> Error {
    match error {
        Error::DuplicateInsert { table, message } if table.is_empty() => Error::DuplicateInsert {
            table: info.table_name.clone(),
            message,
        },
        e => e,
    }
}

/// How the identifier of an inserted row is obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyRetrieval {
    /// The caller supplied it.
    Supplied,
    /// `INSERT ... RETURNING`.
    Returning,
    /// Follow up query on the connection.
    LastInsertId,
}

/// Insert statement compiled once and reused for every entity of a batch.
struct Inserter<'i> {
    info: &'i TypeInfo,
    statement: Statement,
    key: KeyRetrieval,
}

impl<'i> Inserter<'i> {
    fn new(session: &Session<'_>, info: &'i TypeInfo) -> Self {
        let writer = session.sql_writer();
        let (statement, key) = match (info.auto_increment, writer.supports_returning()) {
            (false, _) => (writer.sql_insert(info), KeyRetrieval::Supplied),
            (true, true) => (writer.sql_insert_returning(info), KeyRetrieval::Returning),
            (true, false) => (writer.sql_insert(info), KeyRetrieval::LastInsertId),
        };
        Self {
            info,
            statement,
            key,
        }
    }

    fn insert<E: Entity>(
        &self,
        session: &mut Session<'_>,
        entity: &mut E,
        row: &[DbValue],
    ) -> Result<()> {
        let table = &self.info.table_name;
        let arguments = self.statement.arguments(row, &DbValue::Null)?;
        let id = match self.key {
            KeyRetrieval::Supplied => {
                session
                    .execute("insert", table, &self.statement.sql, &arguments)
                    .map_err(|e| with_table(e, self.info))?;
                return Ok(());
            }
            KeyRetrieval::Returning => session
                .execute_returning("insert", table, &self.statement.sql, &arguments)
                .map_err(|e| with_table(e, self.info))?,
            KeyRetrieval::LastInsertId => {
                session
                    .execute("insert", table, &self.statement.sql, &arguments)
                    .map_err(|e| with_table(e, self.info))?;
                session.last_insert_id()?.ok_or_else(|| {
                    Error::database(format!(
                        "The backend did not report the identifier generated for `{table}`"
                    ))
                })?
            }
        };
        entity.set_id(id)
    }
}

struct Updater<'i> {
    info: &'i TypeInfo,
    /// `None` when the entity has no column besides its identifier.
    statement: Option<Statement>,
}

impl<'i> Updater<'i> {
    fn new(session: &Session<'_>, info: &'i TypeInfo) -> Self {
        Self {
            info,
            statement: session.sql_writer().sql_update(info),
        }
    }

    fn update(&self, session: &mut Session<'_>, row: &[DbValue]) -> Result<u64> {
        let Some(statement) = &self.statement else {
            return Ok(0);
        };
        let id = key_of(row, self.info)?;
        session
            .execute(
                "update",
                &self.info.table_name,
                &statement.sql,
                &statement.arguments(row, &id)?,
            )
            .map_err(|e| with_table(e, self.info))
    }
}

struct Deleter<'i> {
    info: &'i TypeInfo,
    statement: Statement,
}

impl<'i> Deleter<'i> {
    fn new(session: &Session<'_>, info: &'i TypeInfo) -> Self {
        Self {
            info,
            statement: session.sql_writer().sql_delete(info),
        }
    }

    fn delete(&self, session: &mut Session<'_>, id: &DbValue) -> Result<u64> {
        session
            .execute(
                "delete",
                &self.info.table_name,
                &self.statement.sql,
                &self.statement.arguments(&[], id)?,
            )
            .map_err(|e| with_table(e, self.info))
    }
}
