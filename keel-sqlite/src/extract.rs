use anyhow::{Context, Error, Result};
use keel_core::DbValue;
use libsqlite3_sys::*;
use std::{ffi::c_int, slice};

/// Read the column `index` of the current row, SQLite storage classes map one to one.
pub(crate) fn extract_value(statement: *mut sqlite3_stmt, index: c_int) -> Result<DbValue> {
    unsafe {
        let column_type = sqlite3_column_type(statement, index);
        Ok(match column_type {
            SQLITE_NULL => DbValue::Null,
            SQLITE_INTEGER => DbValue::Int64(sqlite3_column_int64(statement, index)),
            SQLITE_FLOAT => DbValue::Float64(sqlite3_column_double(statement, index)),
            SQLITE_BLOB => {
                let ptr = sqlite3_column_blob(statement, index) as *const u8;
                let len = sqlite3_column_bytes(statement, index) as usize;
                DbValue::Blob(if ptr.is_null() {
                    Box::default()
                } else {
                    slice::from_raw_parts(ptr, len).into()
                })
            }
            SQLITE_TEXT => {
                let ptr = sqlite3_column_text(statement, index);
                let len = sqlite3_column_bytes(statement, index) as usize;
                let bytes = if ptr.is_null() {
                    Vec::new()
                } else {
                    slice::from_raw_parts(ptr, len).to_vec()
                };
                DbValue::Text(String::from_utf8(bytes).with_context(|| {
                    format!("Column {} does not contain valid UTF-8 text", index)
                })?)
            }
            _ => {
                return Err(Error::msg(format!(
                    "Unexpected column type {}",
                    column_type
                )));
            }
        })
    }
}

pub(crate) fn extract_row(statement: *mut sqlite3_stmt) -> Result<Vec<DbValue>> {
    let count = unsafe { sqlite3_column_count(statement) };
    (0..count).map(|i| extract_value(statement, i)).collect()
}
