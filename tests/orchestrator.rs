#[cfg(test)]
mod tests {
    use keel::{
        AsDbValue, CommitMode, Comparable, Conn, Database, DatabaseKind, DbValue, Entity,
        EntityConfig, Error, FieldDef, GenericSqlWriter, Orchestrator, Record, Result, Row,
        SqlWriter, TraceEvent, TraceSink, all_entries, field,
    };
    use std::{
        collections::VecDeque,
        sync::{Arc, Mutex},
    };

    #[derive(Entity, Debug, Clone, PartialEq)]
    #[keel(id = "id")]
    struct Note {
        id: i64,
        text: String,
    }

    #[derive(Entity, Debug, Clone, PartialEq)]
    #[keel(table = "tickets", auto_increment)]
    struct Ticket {
        #[keel(id)]
        id: Option<i64>,
        title: String,
    }

    #[derive(Entity, Debug, Clone, PartialEq)]
    #[keel(id = "id")]
    struct Author {
        id: i64,
        name: String,
    }

    #[derive(Entity, Debug, Clone, PartialEq)]
    #[keel(id = "id")]
    struct Book {
        id: i64,
        #[keel(embedded)]
        author: Author,
    }

    /// Encodes fewer values than it maps.
    #[derive(Debug, Clone, PartialEq)]
    struct Draft {
        id: i64,
        body: String,
    }

    impl Entity for Draft {
        fn record() -> Result<Record<Self>> {
            Ok(Record {
                name: "Draft",
                fields: vec![
                    FieldDef::<Draft>::value::<i64>(
                        "id",
                        |e| e.id.to_db_value(),
                        |e, v| {
                            e.id = i64::from_db_value(v)?;
                            Ok(())
                        },
                    ),
                    FieldDef::<Draft>::value::<String>(
                        "body",
                        |e| e.body.to_db_value(),
                        |e, v| {
                            e.body = String::from_db_value(v)?;
                            Ok(())
                        },
                    ),
                ],
                construct: |reader| {
                    Ok(Draft {
                        id: reader.next()?,
                        body: reader.next()?,
                    })
                },
            })
        }

        fn config() -> EntityConfig {
            EntityConfig::new().id_field("id")
        }

        fn to_row(&self) -> Result<Row> {
            Ok(vec![])
        }
    }

    /// Writer of a backend without `RETURNING` and `ON CONFLICT`.
    struct Minimal;

    impl SqlWriter for Minimal {
        fn as_dyn(&self) -> &dyn SqlWriter {
            self
        }
        fn supports_returning(&self) -> bool {
            false
        }
        fn supports_upsert(&self) -> bool {
            false
        }
    }

    /// Records every statement and answers queries from a queue.
    #[derive(Default)]
    struct Scripted {
        statements: Vec<(String, Vec<DbValue>)>,
        results: VecDeque<Vec<Row>>,
        /// Position in `statements` of the one that fails.
        fail_at: Option<usize>,
        minimal: bool,
    }

    impl Scripted {
        fn with_results(results: impl IntoIterator<Item = Vec<Row>>) -> Self {
            Self {
                results: results.into_iter().collect(),
                ..Default::default()
            }
        }

        fn sql(&self) -> Vec<&str> {
            self.statements.iter().map(|(sql, _)| sql.as_str()).collect()
        }

        fn record(&mut self, sql: &str, params: &[DbValue]) -> Result<()> {
            self.statements.push((sql.to_string(), params.to_vec()));
            if self.fail_at == Some(self.statements.len() - 1) {
                return Err(Error::DuplicateInsert {
                    table: String::new(),
                    message: "UNIQUE constraint failed".into(),
                });
            }
            Ok(())
        }
    }

    impl Database for Scripted {
        fn kind(&self) -> DatabaseKind {
            DatabaseKind::Generic
        }

        fn sql_writer(&self) -> &dyn SqlWriter {
            if self.minimal {
                &Minimal
            } else {
                &GenericSqlWriter
            }
        }

        fn execute(&mut self, sql: &str, params: &[DbValue]) -> Result<u64> {
            self.record(sql, params)?;
            Ok(1)
        }

        fn query(&mut self, sql: &str, params: &[DbValue]) -> Result<Vec<Row>> {
            self.record(sql, params)?;
            Ok(self.results.pop_front().unwrap_or_default())
        }

        fn last_insert_id(&mut self) -> Result<Option<DbValue>> {
            Ok(Some(DbValue::Int64(7)))
        }
    }

    #[derive(Default)]
    struct Collector {
        events: Mutex<Vec<(&'static str, String, usize)>>,
    }

    impl TraceSink for Collector {
        fn trace(&self, event: &TraceEvent<'_>) {
            self.events.lock().unwrap().push((
                event.operation,
                event.table.to_string(),
                event.params.len(),
            ));
        }
    }

    fn note(id: i64) -> Note {
        Note {
            id,
            text: format!("note {id}"),
        }
    }

    fn count(n: i64) -> Vec<Row> {
        vec![vec![DbValue::Int64(n)]]
    }

    #[test]
    fn persist_inserts_missing_rows() {
        let orchestrator = Orchestrator::new();
        let mut conn = Conn::new(Scripted::with_results([count(0)]));
        orchestrator
            .persist(&mut conn, &mut note(1))
            .expect("Failed to persist the note");
        assert_eq!(
            conn.database().sql(),
            [
                "BEGIN",
                "SELECT COUNT(*) FROM Note WHERE id = ?",
                "INSERT INTO Note (id, text) VALUES (?, ?)",
                "COMMIT",
            ]
        );
        assert_eq!(conn.database().statements[1].1, [DbValue::Int64(1)]);
    }

    #[test]
    fn persist_updates_existing_rows() {
        let orchestrator = Orchestrator::new();
        let mut conn = Conn::new(Scripted::with_results([count(1)]));
        orchestrator
            .persist(&mut conn, &mut note(3))
            .expect("Failed to persist the note");
        let database = conn.database();
        assert_eq!(database.sql()[2], "UPDATE Note SET text = ? WHERE id = ?");
        assert_eq!(
            database.statements[2].1,
            [DbValue::Text("note 3".into()), DbValue::Int64(3)]
        );
        assert_eq!(database.sql()[3], "COMMIT");
    }

    #[test]
    fn persist_rejects_ambiguous_keys() {
        let orchestrator = Orchestrator::new();
        let mut conn = Conn::new(Scripted::with_results([count(2)]));
        assert_eq!(
            orchestrator.persist(&mut conn, &mut note(3)),
            Err(Error::NoUniqueKey {
                table: "Note".into(),
                rows: 2
            })
        );
        assert_eq!(conn.database().sql().last(), Some(&"ROLLBACK"));
    }

    #[test]
    fn failing_batch_rolls_back() {
        let orchestrator = Orchestrator::new();
        let mut conn = Conn::new(Scripted {
            fail_at: Some(2),
            ..Default::default()
        });
        let mut notes = [note(1), note(1), note(2)];
        let result = orchestrator.insert_many(&mut conn, &mut notes);
        assert_eq!(
            result,
            Err(Error::DuplicateInsert {
                table: "Note".into(),
                message: "UNIQUE constraint failed".into(),
            })
        );
        assert_eq!(
            conn.database().sql(),
            [
                "BEGIN",
                "INSERT INTO Note (id, text) VALUES (?, ?)",
                "INSERT INTO Note (id, text) VALUES (?, ?)",
                "ROLLBACK",
            ]
        );
    }

    #[test]
    fn manual_commit_issues_no_transaction() {
        let orchestrator = Orchestrator::new();
        let mut conn =
            Conn::new(Scripted::default()).with_commit_mode(CommitMode::Manual);
        orchestrator
            .insert_many(&mut conn, &mut [note(1), note(2)])
            .expect("Failed to insert the notes");
        assert_eq!(
            orchestrator
                .delete_by_id::<Note, _>(&mut conn, 1)
                .expect("Failed to delete the note"),
            1
        );
        assert_eq!(
            conn.database().sql(),
            [
                "INSERT INTO Note (id, text) VALUES (?, ?)",
                "INSERT INTO Note (id, text) VALUES (?, ?)",
                "DELETE FROM Note WHERE id = ?",
            ]
        );
    }

    #[test]
    fn generated_keys() {
        let orchestrator = Orchestrator::new();
        let mut conn = Conn::new(Scripted::with_results([vec![vec![DbValue::Int64(42)]]]));
        let ticket = orchestrator
            .insert(
                &mut conn,
                Ticket {
                    id: None,
                    title: "Broken build".into(),
                },
            )
            .expect("Failed to insert the ticket");
        assert_eq!(ticket.id, Some(42));
        assert_eq!(
            conn.database().sql()[1],
            "INSERT INTO tickets (title) VALUES (?) RETURNING id"
        );

        let mut conn = Conn::new(Scripted {
            minimal: true,
            ..Default::default()
        });
        let ticket = orchestrator
            .insert(
                &mut conn,
                Ticket {
                    id: None,
                    title: "Flaky test".into(),
                },
            )
            .expect("Failed to insert the ticket");
        assert_eq!(ticket.id, Some(7));
        assert_eq!(
            conn.database().sql()[1],
            "INSERT INTO tickets (title) VALUES (?)"
        );
        assert!(matches!(
            orchestrator.upsert(&mut conn, &ticket),
            Err(Error::Database(..))
        ));
    }

    #[test]
    fn reads() {
        let orchestrator = Orchestrator::new();
        let mut conn = Conn::new(Scripted::default());
        assert_eq!(
            orchestrator.select_by_id::<Note, _>(&mut conn, 5),
            Err(Error::EntityNotFound {
                table: "Note".into(),
                id: DbValue::Int64(5),
            })
        );
        let mut conn = Conn::new(Scripted::with_results([vec![
            vec![DbValue::Int64(5), DbValue::Text("a".into())],
            vec![DbValue::Int64(5), DbValue::Text("b".into())],
        ]]));
        assert_eq!(
            orchestrator.select_by_id::<Note, _>(&mut conn, 5),
            Err(Error::NoUniqueKey {
                table: "Note".into(),
                rows: 2,
            })
        );
        let mut conn = Conn::new(Scripted::with_results([vec![vec![DbValue::Text(
            "many".into(),
        )]]]));
        assert!(matches!(
            orchestrator.count::<Note, _>(&mut conn, &field("id").greater(1)),
            Err(Error::Mapping(..))
        ));
        assert_eq!(conn.database().sql(), ["SELECT COUNT(*) FROM Note WHERE id > ?"]);
    }

    #[test]
    fn embedded_entities_are_loaded() {
        let orchestrator = Orchestrator::new();
        let mut conn = Conn::new(Scripted::with_results([
            vec![vec![DbValue::Int64(1), DbValue::Int64(7)]],
            vec![vec![DbValue::Int64(7), DbValue::Text("Ursula".into())]],
        ]));
        let books: Vec<Book> = orchestrator
            .select(&mut conn, &all_entries())
            .expect("Failed to select the books");
        assert_eq!(
            books,
            [Book {
                id: 1,
                author: Author {
                    id: 7,
                    name: "Ursula".into(),
                },
            }]
        );
        assert_eq!(
            conn.database().sql(),
            [
                "SELECT id, author FROM Book",
                "SELECT id, name FROM Author WHERE id = ?",
            ]
        );
    }

    #[test]
    fn statements_are_traced() {
        let collector = Arc::new(Collector::default());
        let orchestrator = Orchestrator::with_sink(collector.clone());
        let mut conn = Conn::new(Scripted::with_results([count(0)]));
        orchestrator
            .persist(&mut conn, &mut note(1))
            .expect("Failed to persist the note");
        orchestrator
            .delete(&mut conn, &note(1))
            .expect("Failed to delete the note");
        assert_eq!(
            *collector.events.lock().unwrap(),
            [
                ("persist", "Note".to_string(), 1),
                ("insert", "Note".to_string(), 2),
                ("delete", "Note".to_string(), 1),
            ]
        );
    }

    #[test]
    fn short_rows_are_rejected() {
        let orchestrator = Orchestrator::new();
        let mut conn = Conn::new(Scripted::default());
        let mut draft = Draft {
            id: 1,
            body: "unfinished".into(),
        };
        assert!(matches!(
            orchestrator.persist(&mut conn, &mut draft),
            Err(Error::Mapping(..))
        ));
        assert!(matches!(
            orchestrator.update(&mut conn, &draft),
            Err(Error::Mapping(..))
        ));
        assert!(conn.database().sql().is_empty());
        assert!(matches!(
            orchestrator.update_many(&mut conn, &[draft.clone()]),
            Err(Error::Mapping(..))
        ));
        assert_eq!(conn.database().sql(), ["BEGIN", "ROLLBACK"]);
    }

    #[test]
    fn failing_update_names_the_table() {
        let orchestrator = Orchestrator::new();
        let mut conn = Conn::new(Scripted {
            fail_at: Some(1),
            ..Default::default()
        });
        assert_eq!(
            orchestrator.update(&mut conn, &note(4)),
            Err(Error::DuplicateInsert {
                table: "Note".into(),
                message: "UNIQUE constraint failed".into(),
            })
        );
        assert_eq!(
            conn.database().sql(),
            ["BEGIN", "UPDATE Note SET text = ? WHERE id = ?", "ROLLBACK"]
        );
    }
}
