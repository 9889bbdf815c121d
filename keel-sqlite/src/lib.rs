mod cbox;
mod connection;
mod extract;
mod prepared;
mod sql_writer;

use keel_core::Error;
use libsqlite3_sys::{
    SQLITE_CONSTRAINT_PRIMARYKEY, SQLITE_CONSTRAINT_UNIQUE, sqlite3, sqlite3_errmsg,
    sqlite3_extended_errcode,
};
use std::ffi::{CStr, c_char};

pub(crate) use cbox::*;
pub use connection::*;
pub use prepared::*;
pub use sql_writer::*;

pub(crate) fn error_message_from_ptr(ptr: &'_ *const c_char) -> &'_ str {
    unsafe {
        if !ptr.is_null() {
            CStr::from_ptr(*ptr)
                .to_str()
                .unwrap_or("Unknown error (the error message was not a valid C string)")
        } else {
            "Unknown error (could not extract the error message)"
        }
    }
}

/// Last failure reported on `connection`, key conflicts become [`Error::DuplicateInsert`].
///
/// The table is left empty, the caller knows which entity it was inserting.
pub(crate) fn backend_error(connection: *mut sqlite3) -> Error {
    unsafe {
        let message = error_message_from_ptr(&sqlite3_errmsg(connection)).to_string();
        match sqlite3_extended_errcode(connection) {
            SQLITE_CONSTRAINT_PRIMARYKEY | SQLITE_CONSTRAINT_UNIQUE => Error::DuplicateInsert {
                table: String::new(),
                message,
            },
            _ => Error::Database(message),
        }
    }
}

/// Convert the driver's error chain at the collaborator boundary.
///
/// Failures coming from SQLite keep their variant and verbatim message, the context is logged.
pub(crate) fn into_keel_error(error: anyhow::Error) -> Error {
    log::error!("{:#}", error);
    match error.downcast::<Error>() {
        Ok(error) => error,
        Err(error) => Error::Database(error.root_cause().to_string()),
    }
}
