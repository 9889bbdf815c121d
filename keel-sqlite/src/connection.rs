use crate::{CBox, SqlitePrepared, SqliteSqlWriter, backend_error, into_keel_error};
use anyhow::{Context, Error, Result};
use keel_core::{CommitMode, Conn, Database, DatabaseKind, DbValue, Row, SqlWriter, truncate_long};
use libsqlite3_sys::*;
use std::{
    collections::{HashMap, hash_map::Entry},
    ffi::{CString, c_int},
    fmt::{self, Debug},
    ptr,
};
use url::form_urlencoded;

// Not present in the libsqlite3-sys bundled bindings; the bundled library exports it.
unsafe extern "C" {
    fn sqlite3_close_v2(db: *mut sqlite3) -> std::ffi::c_int;
}

/// Compiled statements kept per connection before the cache is flushed.
const STATEMENT_CACHE_CAPACITY: usize = 128;

/// Milliseconds spent waiting on a locked database before giving up.
const BUSY_TIMEOUT: c_int = 5_000;

/// Options decoded from a `sqlite://<path>?mode=..&commit=..` URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqliteConfig {
    /// Database file, `:memory:` for a private in-memory database.
    pub path: String,
    pub flags: c_int,
    pub commit_mode: CommitMode,
}

impl SqliteConfig {
    pub const PREFIX: &'static str = "sqlite://";

    pub fn from_url(url: &str) -> Result<Self> {
        let Some(rest) = url.strip_prefix(Self::PREFIX) else {
            return Err(Error::msg(format!(
                "Expected sqlite connection url to start with `{}`",
                Self::PREFIX
            )));
        };
        let (path, query) = rest.split_once('?').unwrap_or((rest, ""));
        let path = urlencoding::decode(path)
            .with_context(|| format!("Error while decoding the path of `{}`", url))?;
        let mut result = Self {
            path: if path.is_empty() {
                ":memory:".into()
            } else {
                path.into_owned()
            },
            flags: SQLITE_OPEN_READWRITE | SQLITE_OPEN_CREATE,
            commit_mode: CommitMode::AutoCommit,
        };
        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            match (key.as_ref(), value.as_ref()) {
                ("mode", "ro") => result.flags = SQLITE_OPEN_READONLY,
                ("mode", "rw") => result.flags = SQLITE_OPEN_READWRITE,
                ("mode", "rwc") => result.flags = SQLITE_OPEN_READWRITE | SQLITE_OPEN_CREATE,
                ("mode", "memory") => {
                    result.path = ":memory:".into();
                    result.flags = SQLITE_OPEN_READWRITE | SQLITE_OPEN_CREATE;
                }
                ("commit", "auto") => result.commit_mode = CommitMode::AutoCommit,
                ("commit", "manual") => result.commit_mode = CommitMode::Manual,
                (key @ ("mode" | "commit"), value) => {
                    return Err(Error::msg(format!(
                        "Invalid value `{}` for `{}` in `{}`",
                        value, key, url
                    )));
                }
                (key, _) => {
                    log::warn!("Ignoring unknown sqlite connection parameter `{}`", key);
                }
            }
        }
        Ok(result)
    }
}

/// Connection to a SQLite database implementing [`Database`].
///
/// Statements are compiled once and cached by their SQL text, executing the same text again
/// resets and rebinds the cached statement.
pub struct SqliteConnection {
    // Declared first so that statements are finalized before the connection closes.
    statements: HashMap<String, SqlitePrepared>,
    pub(crate) connection: CBox<*mut sqlite3>,
    sql_writer: SqliteSqlWriter,
    config: SqliteConfig,
}

impl SqliteConnection {
    pub fn connect(url: &str) -> keel_core::Result<Self> {
        Self::open(url).map_err(into_keel_error)
    }

    fn open(url: &str) -> Result<Self> {
        let config = SqliteConfig::from_url(url)?;
        let path = CString::new(config.path.as_bytes())
            .with_context(|| format!("Error while decoding connection URL: `{}`", url))?;
        let mut connection = CBox::new(ptr::null_mut(), |p| {
            unsafe { sqlite3_close_v2(p) };
        });
        unsafe {
            let rc = sqlite3_open_v2(path.as_ptr(), &mut *connection, config.flags, ptr::null());
            if rc != SQLITE_OK {
                let error = if connection.is_null() {
                    Error::msg(format!("SQLite could not allocate a connection (code {})", rc))
                } else {
                    Error::new(backend_error(*connection))
                };
                return Err(error.context(format!("Could not open the database `{}`", url)));
            }
            sqlite3_busy_timeout(*connection, BUSY_TIMEOUT);
        }
        log::debug!("Opened sqlite database `{}`", config.path);
        Ok(Self {
            statements: HashMap::new(),
            connection,
            sql_writer: SqliteSqlWriter::new(),
            config,
        })
    }

    pub fn config(&self) -> &SqliteConfig {
        &self.config
    }

    /// Wrap the connection with the commit mode requested by its URL.
    pub fn into_conn(self) -> Conn<Self> {
        let commit_mode = self.config.commit_mode;
        Conn::new(self).with_commit_mode(commit_mode)
    }

    /// Number of compiled statements currently cached.
    pub fn cached_statements(&self) -> usize {
        self.statements.len()
    }

    fn compile(connection: *mut sqlite3, sql: &str) -> Result<SqlitePrepared> {
        let context = || format!("While preparing the query:\n{}", truncate_long!(sql));
        let source = CString::new(sql.as_bytes())
            .context("Could not create a CString from the query String")
            .with_context(context)?;
        let mut statement = CBox::new(ptr::null_mut(), |p| {
            unsafe { sqlite3_finalize(p) };
        });
        unsafe {
            let mut tail = ptr::null();
            let rc = sqlite3_prepare_v2(
                connection,
                source.as_ptr(),
                sql.len() as c_int,
                &mut *statement,
                &mut tail,
            );
            if rc != SQLITE_OK {
                return Err(Error::new(backend_error(connection)).context(context()));
            }
            if statement.is_null() {
                return Err(Error::msg("The query does not contain a statement").context(context()));
            }
            if !tail.is_null() && *tail != 0 {
                return Err(
                    Error::msg("Cannot prepare more than one statement at a time")
                        .context(context()),
                );
            }
        }
        Ok(SqlitePrepared::new(statement))
    }

    /// Cached statement for `sql`, compiled on first use.
    fn statement(&mut self, sql: &str) -> Result<&mut SqlitePrepared> {
        if self.statements.len() >= STATEMENT_CACHE_CAPACITY && !self.statements.contains_key(sql)
        {
            log::debug!("Flushing {} cached sqlite statements", self.statements.len());
            self.statements.clear();
        }
        Ok(match self.statements.entry(sql.to_string()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(Self::compile(*self.connection, sql)?),
        })
    }

    fn run(&mut self, sql: &str, params: &[DbValue]) -> Result<Vec<Row>> {
        let statement = self.statement(sql)?;
        statement.bind_all(params)?;
        statement.run()
    }
}

impl Database for SqliteConnection {
    fn kind(&self) -> DatabaseKind {
        DatabaseKind::Sqlite
    }

    fn sql_writer(&self) -> &dyn SqlWriter {
        self.sql_writer.as_dyn()
    }

    fn prepare(&mut self, sql: &str) -> keel_core::Result<()> {
        self.statement(sql).map(|_| ()).map_err(into_keel_error)
    }

    fn execute(&mut self, sql: &str, params: &[DbValue]) -> keel_core::Result<u64> {
        self.run(sql, params).map_err(into_keel_error)?;
        Ok(unsafe { sqlite3_changes(*self.connection) } as u64)
    }

    fn query(&mut self, sql: &str, params: &[DbValue]) -> keel_core::Result<Vec<Row>> {
        self.run(sql, params).map_err(into_keel_error)
    }

    fn last_insert_id(&mut self) -> keel_core::Result<Option<DbValue>> {
        Ok(Some(DbValue::Int64(unsafe {
            sqlite3_last_insert_rowid(*self.connection)
        })))
    }
}

impl Debug for SqliteConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteConnection")
            .field("connection", &*self.connection)
            .field("statements", &self.statements.len())
            .field("config", &self.config)
            .finish()
    }
}
