use crate::{DbValue, Result, Row, SqlWriter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseKind {
    Sqlite,
    Postgres,
    MySql,
    Generic,
}

/// Who ends transactions.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitMode {
    /// Every mutating operation (or batch) runs in its own transaction.
    #[default]
    AutoCommit,
    /// The caller controls transactions, operations never begin or commit.
    Manual,
}

/// Capability set of a database driver, consumed by the orchestrator.
///
/// Statements arrive with positional placeholders produced by [`Database::sql_writer`] and the
/// parameters in placeholder order.
pub trait Database {
    fn kind(&self) -> DatabaseKind;

    fn sql_writer(&self) -> &dyn SqlWriter;

    /// Hint that `sql` is about to be executed repeatedly.
    fn prepare(&mut self, _sql: &str) -> Result<()> {
        Ok(())
    }

    /// Execute a statement and return the number of rows affected.
    fn execute(&mut self, sql: &str, params: &[DbValue]) -> Result<u64>;

    /// Execute a query and return every row.
    fn query(&mut self, sql: &str, params: &[DbValue]) -> Result<Vec<Row>>;

    /// Execute a statement with a `RETURNING` clause and return the first value produced.
    fn execute_returning(&mut self, sql: &str, params: &[DbValue]) -> Result<DbValue> {
        Ok(self
            .query(sql, params)?
            .into_iter()
            .next()
            .and_then(|row| row.into_iter().next())
            .unwrap_or_default())
    }

    /// Identifier assigned by the last insert on this connection, if the backend tracks it.
    fn last_insert_id(&mut self) -> Result<Option<DbValue>> {
        Ok(None)
    }

    fn begin(&mut self) -> Result<()> {
        let mut sql = String::new();
        self.sql_writer().write_transaction_begin(&mut sql);
        self.execute(&sql, &[]).map(|_| ())
    }

    fn commit(&mut self) -> Result<()> {
        let mut sql = String::new();
        self.sql_writer().write_transaction_commit(&mut sql);
        self.execute(&sql, &[]).map(|_| ())
    }

    fn rollback(&mut self) -> Result<()> {
        let mut sql = String::new();
        self.sql_writer().write_transaction_rollback(&mut sql);
        self.execute(&sql, &[]).map(|_| ())
    }
}

impl<D: Database + ?Sized> Database for &mut D {
    fn kind(&self) -> DatabaseKind {
        (**self).kind()
    }
    fn sql_writer(&self) -> &dyn SqlWriter {
        (**self).sql_writer()
    }
    fn prepare(&mut self, sql: &str) -> Result<()> {
        (**self).prepare(sql)
    }
    fn execute(&mut self, sql: &str, params: &[DbValue]) -> Result<u64> {
        (**self).execute(sql, params)
    }
    fn query(&mut self, sql: &str, params: &[DbValue]) -> Result<Vec<Row>> {
        (**self).query(sql, params)
    }
    fn execute_returning(&mut self, sql: &str, params: &[DbValue]) -> Result<DbValue> {
        (**self).execute_returning(sql, params)
    }
    fn last_insert_id(&mut self) -> Result<Option<DbValue>> {
        (**self).last_insert_id()
    }
    fn begin(&mut self) -> Result<()> {
        (**self).begin()
    }
    fn commit(&mut self) -> Result<()> {
        (**self).commit()
    }
    fn rollback(&mut self) -> Result<()> {
        (**self).rollback()
    }
}

/// A driver handle together with the commit policy applied by the orchestrator.
///
/// Owned by the caller, nothing in this crate closes it.
#[derive(Debug)]
pub struct Conn<D: Database> {
    database: D,
    commit_mode: CommitMode,
}

impl<D: Database> Conn<D> {
    pub fn new(database: D) -> Self {
        Self {
            database,
            commit_mode: CommitMode::AutoCommit,
        }
    }

    pub fn with_commit_mode(mut self, commit_mode: CommitMode) -> Self {
        self.commit_mode = commit_mode;
        self
    }

    pub fn kind(&self) -> DatabaseKind {
        self.database.kind()
    }

    pub fn commit_mode(&self) -> CommitMode {
        self.commit_mode
    }

    pub fn set_commit_mode(&mut self, commit_mode: CommitMode) {
        self.commit_mode = commit_mode;
    }

    pub fn database(&self) -> &D {
        &self.database
    }

    pub fn database_mut(&mut self) -> &mut D {
        &mut self.database
    }

    pub fn into_inner(self) -> D {
        self.database
    }
}
