use keel::{Conn, Database, Entity, Orchestrator, all_entries};

#[derive(Entity, Debug, Clone, PartialEq)]
#[keel(table = "auto_ticket", auto_increment)]
struct Ticket {
    #[keel(id)]
    id: Option<i64>,
    title: String,
}

#[derive(Entity, Debug, Clone, PartialEq)]
#[keel(table = "auto_counter", id = "id", auto_increment)]
struct Counter {
    id: i64,
    value: i32,
}

pub fn auto_increment<D: Database>(orchestrator: &Orchestrator, conn: &mut Conn<D>) {
    orchestrator
        .drop_table::<Ticket, _>(conn, true)
        .expect("Failed to drop auto_ticket table");
    orchestrator
        .create_table::<Ticket, _>(conn, true)
        .expect("Failed to create auto_ticket table");

    let first = orchestrator
        .insert(
            conn,
            Ticket {
                id: None,
                title: "First".into(),
            },
        )
        .expect("Failed to insert the first ticket");
    let Some(first_id) = first.id else {
        panic!("The generated identifier was not assigned");
    };

    let mut tickets = vec![
        Ticket {
            id: None,
            title: "Second".into(),
        },
        Ticket {
            id: None,
            title: "Third".into(),
        },
    ];
    orchestrator
        .insert_many(conn, &mut tickets)
        .expect("Failed to insert the tickets");
    let ids: Vec<_> = tickets.iter().map(|t| t.id).collect();
    assert_eq!(ids, [Some(first_id + 1), Some(first_id + 2)]);

    let mut fourth = Ticket {
        id: None,
        title: "Fourth".into(),
    };
    orchestrator
        .persist(conn, &mut fourth)
        .expect("Failed to persist the fourth ticket");
    assert_eq!(fourth.id, Some(first_id + 3));
    fourth.title = "Fourth, renamed".into();
    orchestrator
        .persist(conn, &mut fourth)
        .expect("Failed to persist the fourth ticket again");
    let loaded: Ticket = orchestrator
        .select_by_id(conn, first_id + 3)
        .expect("Failed to load the fourth ticket");
    assert_eq!(loaded, fourth);
    assert_eq!(
        orchestrator
            .count::<Ticket, _>(conn, &all_entries())
            .expect("Failed to count"),
        4
    );

    // Non nullable identifier, zero until the backend assigns one
    orchestrator
        .drop_table::<Counter, _>(conn, true)
        .expect("Failed to drop auto_counter table");
    orchestrator
        .create_table::<Counter, _>(conn, true)
        .expect("Failed to create auto_counter table");
    let mut counter = Counter { id: 0, value: 10 };
    orchestrator
        .persist(conn, &mut counter)
        .expect("Failed to persist the counter");
    assert_ne!(counter.id, 0);
    let loaded: Counter = orchestrator
        .select_by_id(conn, counter.id)
        .expect("Failed to load the counter");
    assert_eq!(loaded, counter);
}
