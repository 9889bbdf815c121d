use keel::{CommitMode, Conn, Database, Entity, Error, Orchestrator, all_entries};

#[derive(Entity, Debug, Clone, PartialEq)]
#[keel(table = "transaction_order", id = "id")]
struct Order {
    id: i64,
    amount: f64,
}

fn orders(range: std::ops::RangeInclusive<i64>) -> Vec<Order> {
    range
        .map(|id| Order {
            id,
            amount: id as f64 * 100.0,
        })
        .collect()
}

fn setup<D: Database>(orchestrator: &Orchestrator, conn: &mut Conn<D>) {
    orchestrator
        .drop_table::<Order, _>(conn, true)
        .expect("Failed to drop transaction_order table");
    orchestrator
        .create_table::<Order, _>(conn, true)
        .expect("Failed to create transaction_order table");
}

fn count<D: Database>(orchestrator: &Orchestrator, conn: &mut Conn<D>) -> u64 {
    orchestrator
        .count::<Order, _>(conn, &all_entries())
        .expect("Failed to count the orders")
}

/// A failing batch under auto commit leaves nothing behind.
pub fn rollback_batch<D: Database>(orchestrator: &Orchestrator, conn: &mut Conn<D>) {
    setup(orchestrator, conn);
    let mut batch = orders(1..=3);
    batch.push(Order {
        id: 2,
        amount: 0.0,
    });
    batch.extend(orders(4..=5));
    let result = orchestrator.insert_many(conn, &mut batch);
    assert!(
        matches!(&result, Err(Error::DuplicateInsert { .. })),
        "Expected the batch to fail on the repeated key, got {:?}",
        result
    );
    assert_eq!(count(orchestrator, conn), 0);

    let mut batch = orders(1..=5);
    orchestrator
        .insert_many(conn, &mut batch)
        .expect("Failed to insert the orders");
    batch[4].amount = -1.0;
    batch.push(Order {
        id: 99,
        amount: 1.0,
    });
    // The missing row updates nothing, the batch still commits
    assert_eq!(
        orchestrator
            .update_many(conn, &batch)
            .expect("Failed to update the orders"),
        5
    );
    let order: Order = orchestrator
        .select_by_id(conn, 5)
        .expect("Failed to load the fifth order");
    assert_eq!(order.amount, -1.0);
}

/// Under manual commit the caller owns the transaction boundaries.
pub fn manual_commit<D: Database>(orchestrator: &Orchestrator, conn: &mut Conn<D>) {
    setup(orchestrator, conn);
    let previous = conn.commit_mode();
    conn.set_commit_mode(CommitMode::Manual);

    conn.database_mut()
        .begin()
        .expect("Failed to begin the transaction");
    let mut batch = orders(1..=3);
    orchestrator
        .insert_many(conn, &mut batch)
        .expect("Failed to insert the orders");
    assert_eq!(count(orchestrator, conn), 3);
    conn.database_mut()
        .rollback()
        .expect("Failed to roll back the transaction");
    assert_eq!(count(orchestrator, conn), 0);

    conn.database_mut()
        .begin()
        .expect("Failed to begin the transaction");
    let mut order = Order {
        id: 7,
        amount: 70.0,
    };
    orchestrator
        .persist(conn, &mut order)
        .expect("Failed to persist the order");
    conn.database_mut()
        .commit()
        .expect("Failed to commit the transaction");
    assert_eq!(count(orchestrator, conn), 1);

    conn.set_commit_mode(previous);
}
