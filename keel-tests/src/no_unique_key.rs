use keel::{Conn, Database, DbValue, Entity, Error, Orchestrator};

/// Mapped on a table created without a primary key.
#[derive(Entity, Debug, Clone, PartialEq)]
#[keel(table = "loose_visit", id = "visit")]
struct Visit {
    visit: i64,
    note: String,
}

pub fn no_unique_key<D: Database>(orchestrator: &Orchestrator, conn: &mut Conn<D>) {
    let database = conn.database_mut();
    database
        .execute("DROP TABLE IF EXISTS loose_visit", &[])
        .expect("Failed to drop loose_visit table");
    database
        .execute("CREATE TABLE loose_visit (visit INTEGER, note TEXT)", &[])
        .expect("Failed to create loose_visit table");
    for note in ["morning", "evening"] {
        database
            .execute(
                "INSERT INTO loose_visit (visit, note) VALUES (1, ?)",
                &[DbValue::Text(note.into())],
            )
            .expect("Failed to insert a visit");
    }

    let loaded = orchestrator.select_by_id::<Visit, _>(conn, 1);
    assert!(
        matches!(
            &loaded,
            Err(Error::NoUniqueKey { table, rows: 2 }) if table == "loose_visit"
        ),
        "Expected two rows for the same key, got {:?}",
        loaded
    );
    let mut visit = Visit {
        visit: 1,
        note: "night".into(),
    };
    let persisted = orchestrator.persist(conn, &mut visit);
    assert!(
        matches!(&persisted, Err(Error::NoUniqueKey { rows: 2, .. })),
        "Expected persist to refuse the ambiguous key, got {:?}",
        persisted
    );
}
