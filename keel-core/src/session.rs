use crate::{Database, DbValue, Result, Row, SqlWriter, TraceEvent, TraceSink};

/// Borrowed database plus trace sink, handed to every step of an operation.
pub struct Session<'a> {
    database: &'a mut dyn Database,
    sink: &'a dyn TraceSink,
}

impl<'a> Session<'a> {
    pub fn new(database: &'a mut dyn Database, sink: &'a dyn TraceSink) -> Self {
        Self { database, sink }
    }

    /// Shorter lived session on the same database.
    pub fn reborrow(&mut self) -> Session<'_> {
        Session {
            database: &mut *self.database,
            sink: self.sink,
        }
    }

    pub fn sql_writer(&self) -> &dyn SqlWriter {
        self.database.sql_writer()
    }

    pub fn database(&mut self) -> &mut dyn Database {
        &mut *self.database
    }

    fn trace(&self, operation: &'static str, table: &str, sql: &str, params: &[DbValue]) {
        self.sink.trace(&TraceEvent {
            operation,
            table,
            sql,
            params,
        });
    }

    pub fn prepare(&mut self, sql: &str) -> Result<()> {
        self.database.prepare(sql)
    }

    pub fn execute(
        &mut self,
        operation: &'static str,
        table: &str,
        sql: &str,
        params: &[DbValue],
    ) -> Result<u64> {
        self.trace(operation, table, sql, params);
        self.database.execute(sql, params)
    }

    pub fn query(
        &mut self,
        operation: &'static str,
        table: &str,
        sql: &str,
        params: &[DbValue],
    ) -> Result<Vec<Row>> {
        self.trace(operation, table, sql, params);
        self.database.query(sql, params)
    }

    pub fn execute_returning(
        &mut self,
        operation: &'static str,
        table: &str,
        sql: &str,
        params: &[DbValue],
    ) -> Result<DbValue> {
        self.trace(operation, table, sql, params);
        self.database.execute_returning(sql, params)
    }

    pub fn last_insert_id(&mut self) -> Result<Option<DbValue>> {
        self.database.last_insert_id()
    }

    pub fn begin(&mut self) -> Result<()> {
        self.database.begin()
    }

    pub fn commit(&mut self) -> Result<()> {
        self.database.commit()
    }

    pub fn rollback(&mut self) -> Result<()> {
        self.database.rollback()
    }
}
