use crate::{CBox, backend_error, extract::extract_row};
use anyhow::{Error, Result, anyhow};
use keel_core::{DbValue, Row, truncate_long};
use libsqlite3_sys::*;
use std::{
    borrow::Cow,
    ffi::{CStr, c_int},
    fmt::{self, Display},
    os::raw::{c_char, c_void},
};

/// Compiled statement, reset and rebound for every execution.
pub struct SqlitePrepared {
    pub(crate) statement: CBox<*mut sqlite3_stmt>,
}

impl SqlitePrepared {
    pub(crate) fn new(statement: CBox<*mut sqlite3_stmt>) -> Self {
        Self { statement }
    }

    pub(crate) fn sql(&self) -> Cow<'_, str> {
        unsafe {
            let sql = sqlite3_sql(*self.statement);
            if sql.is_null() {
                return Cow::Borrowed("");
            }
            CStr::from_ptr(sql).to_string_lossy()
        }
    }

    /// Replace every binding with `params`, in placeholder order.
    pub(crate) fn bind_all(&mut self, params: &[DbValue]) -> Result<()> {
        unsafe {
            sqlite3_reset(*self.statement);
            sqlite3_clear_bindings(*self.statement);
            let expected = sqlite3_bind_parameter_count(*self.statement) as usize;
            if expected != params.len() {
                return Err(Error::msg(format!(
                    "The query expects {} parameters but {} were provided:\n{}",
                    expected,
                    params.len(),
                    truncate_long!(self.sql())
                )));
            }
        }
        for (i, value) in params.iter().enumerate() {
            self.bind_index(value, i as c_int + 1)?;
        }
        Ok(())
    }

    fn bind_index(&mut self, value: &DbValue, index: c_int) -> Result<()> {
        let length = match value {
            DbValue::Text(v) => bind_length(v.len(), index)?,
            DbValue::Blob(v) => bind_length(v.len(), index)?,
            _ => 0,
        };
        unsafe {
            let rc = match value {
                DbValue::Null => sqlite3_bind_null(*self.statement, index),
                DbValue::Bool(v) => sqlite3_bind_int(*self.statement, index, *v as c_int),
                DbValue::Int64(v) => sqlite3_bind_int64(*self.statement, index, *v),
                DbValue::Float64(v) => sqlite3_bind_double(*self.statement, index, *v),
                DbValue::Text(v) => sqlite3_bind_text(
                    *self.statement,
                    index,
                    v.as_ptr() as *const c_char,
                    length,
                    SQLITE_TRANSIENT(),
                ),
                DbValue::Blob(v) => sqlite3_bind_blob(
                    *self.statement,
                    index,
                    v.as_ptr() as *const c_void,
                    length,
                    SQLITE_TRANSIENT(),
                ),
            };
            if rc != SQLITE_OK {
                let error = Error::new(backend_error(sqlite3_db_handle(*self.statement)))
                    .context(format!(
                        "Cannot bind parameter {} to query:\n{}",
                        index,
                        truncate_long!(self.sql())
                    ));
                return Err(error);
            }
        }
        Ok(())
    }

    /// Step through the statement, collecting the rows it produces.
    pub(crate) fn run(&mut self) -> Result<Vec<Row>> {
        let mut rows = Vec::new();
        let result = loop {
            match unsafe { sqlite3_step(*self.statement) } {
                SQLITE_DONE => break Ok(()),
                SQLITE_ROW => match extract_row(*self.statement) {
                    Ok(row) => rows.push(row),
                    Err(e) => break Err(e),
                },
                _ => {
                    let error = unsafe { backend_error(sqlite3_db_handle(*self.statement)) };
                    break Err(Error::new(error).context(format!(
                        "While executing the query:\n{}",
                        truncate_long!(self.sql())
                    )));
                }
            }
        };
        // Releases the read locks held by a partially stepped statement.
        unsafe {
            sqlite3_reset(*self.statement);
        }
        result.map(|_| rows)
    }
}

impl Display for SqlitePrepared {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:p}", *self.statement)
    }
}

/// Byte length of a text or blob parameter as SQLite expects it.
fn bind_length(length: usize, index: c_int) -> Result<c_int> {
    c_int::try_from(length).map_err(|_| {
        anyhow!("Cannot bind parameter {index}, its {length} bytes exceed what SQLite accepts")
    })
}
