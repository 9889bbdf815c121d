use keel::{Conn, Database, DbValue, Entity, Error, Orchestrator, all_entries};

#[derive(Entity, Debug, Clone, PartialEq)]
#[keel(table = "simple_person")]
struct Person {
    #[keel(id)]
    id: i64,
    name: String,
    age: i32,
}

pub fn simple<D: Database>(orchestrator: &Orchestrator, conn: &mut Conn<D>) {
    // Setup
    orchestrator
        .drop_table::<Person, _>(conn, true)
        .expect("Failed to drop simple_person table");
    orchestrator
        .create_table::<Person, _>(conn, false)
        .expect("Failed to create simple_person table");

    // Insert through persist
    let mut alice = Person {
        id: 1,
        name: "Alice".into(),
        age: 25,
    };
    orchestrator
        .persist(conn, &mut alice)
        .expect("Failed to persist Alice");
    assert_eq!(
        orchestrator
            .select::<Person, _>(conn, &all_entries())
            .expect("Failed to select"),
        [Person {
            id: 1,
            name: "Alice".into(),
            age: 25,
        }]
    );
    let loaded: Person = orchestrator
        .select_by_id(conn, 1)
        .expect("Failed to load Alice");
    assert_eq!(loaded, alice);

    // Update through persist
    alice.age = 26;
    orchestrator
        .persist(conn, &mut alice)
        .expect("Failed to persist Alice again");
    let loaded: Person = orchestrator
        .select_by_id(conn, 1)
        .expect("Failed to load Alice");
    assert_eq!(loaded.age, 26);
    assert_eq!(
        orchestrator
            .count::<Person, _>(conn, &all_entries())
            .expect("Failed to count"),
        1
    );

    // Explicit update leaves other rows untouched
    let bob = orchestrator
        .insert(
            conn,
            Person {
                id: 3,
                name: "Bob".into(),
                age: 40,
            },
        )
        .expect("Failed to insert Bob");
    alice.name = "Alicia".into();
    assert_eq!(
        orchestrator
            .update(conn, &alice)
            .expect("Failed to update Alice"),
        1
    );
    let loaded: Person = orchestrator
        .select_by_id(conn, 1)
        .expect("Failed to load Alicia");
    assert_eq!(loaded.name, "Alicia");
    let loaded: Person = orchestrator
        .select_by_id(conn, 3)
        .expect("Failed to load Bob");
    assert_eq!(loaded, bob);

    // Missing rows
    let missing = orchestrator.select_by_id::<Person, _>(conn, 404);
    assert!(
        matches!(
            &missing,
            Err(Error::EntityNotFound { table, id }) if table == "simple_person" && *id == DbValue::Int64(404)
        ),
        "Unexpected result {:?}",
        missing
    );
    let ghost = Person {
        id: 2,
        name: "Ghost".into(),
        age: 0,
    };
    assert_eq!(
        orchestrator
            .update(conn, &ghost)
            .expect("Updating a missing row should succeed"),
        0
    );

    // Delete is idempotent
    assert_eq!(
        orchestrator
            .delete(conn, &alice)
            .expect("Failed to delete Alice"),
        1
    );
    assert_eq!(
        orchestrator
            .delete(conn, &alice)
            .expect("Deleting again should succeed"),
        0
    );
    assert_eq!(
        orchestrator
            .delete_by_id::<Person, _>(conn, 1)
            .expect("Deleting by id should succeed"),
        0
    );
    assert_eq!(
        orchestrator
            .select::<Person, _>(conn, &all_entries())
            .expect("Failed to select"),
        [bob]
    );
}
