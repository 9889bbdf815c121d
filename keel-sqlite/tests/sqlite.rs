#[cfg(test)]
mod tests {
    use keel::{CommitMode, Database, DbValue, Error};
    use keel_sqlite::SqliteConnection;
    use keel_tests::{execute_tests, init_logs, silent_logs};
    use std::{fs, path::Path, sync::Mutex};

    static MUTEX: Mutex<()> = Mutex::new(());

    #[test]
    fn sqlite() {
        init_logs();
        const DB_PATH: &'static str = "../target/debug/tests.sqlite";
        let _guard = MUTEX.lock().unwrap();
        if Path::new(DB_PATH).exists() {
            fs::remove_file(DB_PATH).expect(
                format!("Failed to remove existing test database file {}", DB_PATH).as_str(),
            );
        }
        assert!(
            !Path::new(DB_PATH).exists(),
            "Database file should not exist before test"
        );
        let connection = SqliteConnection::connect(&format!("sqlite://{}?mode=rwc", DB_PATH))
            .expect("Could not open the database");
        assert!(
            Path::new(DB_PATH).exists(),
            "Database file should be created after connection"
        );
        execute_tests(connection.into_conn());
    }

    #[test]
    fn sqlite_in_memory() {
        init_logs();
        let connection =
            SqliteConnection::connect("sqlite://:memory:").expect("Could not open the database");
        assert_eq!(connection.config().commit_mode, CommitMode::AutoCommit);
        execute_tests(connection.into_conn());
    }

    #[test]
    fn read_only_missing_database() {
        init_logs();
        const DB_PATH: &'static str = "../target/debug/missing.sqlite";
        let _guard = MUTEX.lock().unwrap();
        if Path::new(DB_PATH).exists() {
            fs::remove_file(DB_PATH).expect("Failed to remove the missing database file");
        }
        silent_logs! {
            let result = SqliteConnection::connect(&format!("sqlite://{}?mode=ro", DB_PATH));
            assert!(
                matches!(result, Err(Error::Database(..))),
                "Should not be able to open in read only unexisting database"
            );
        }
    }

    #[test]
    fn wrong_url() {
        silent_logs! {
            assert!(SqliteConnection::connect("duckdb://some_value").is_err());
            assert!(SqliteConnection::connect("sqlite://x.sqlite?commit=never").is_err());
        }
    }

    #[test]
    fn manual_commit_url() {
        let connection = SqliteConnection::connect("sqlite://?mode=memory&commit=manual")
            .expect("Could not open the database");
        let conn = connection.into_conn();
        assert_eq!(conn.commit_mode(), CommitMode::Manual);
    }

    #[test]
    fn statement_cache() {
        init_logs();
        let mut connection =
            SqliteConnection::connect("sqlite://:memory:").expect("Could not open the database");
        connection
            .execute("CREATE TABLE numbers (value INTEGER)", &[])
            .expect("Failed to create the table");
        for i in 0..10 {
            assert_eq!(
                connection
                    .execute("INSERT INTO numbers (value) VALUES (?)", &[DbValue::Int64(i)])
                    .expect("Failed to insert a number"),
                1
            );
        }
        assert_eq!(connection.cached_statements(), 2);
        let rows = connection
            .query(
                "SELECT SUM(value), COUNT(*) FROM numbers WHERE value >= ?",
                &[DbValue::Int64(5)],
            )
            .expect("Failed to sum the numbers");
        assert_eq!(rows, [vec![DbValue::Int64(35), DbValue::Int64(5)]]);
        assert_eq!(
            connection.last_insert_id().expect("Failed to read the rowid"),
            Some(DbValue::Int64(10))
        );

        silent_logs! {
            let error = connection.query("SELECT * FROM missing_table", &[]);
            assert!(
                matches!(&error, Err(Error::Database(message)) if message.contains("missing_table")),
                "Unexpected result {:?}",
                error
            );
            let error = connection.execute("INSERT INTO numbers (value) VALUES (?)", &[]);
            assert!(error.is_err(), "Missing parameters are rejected");
        }
    }
}
