use keel::{Comparable, Conn, Database, Entity, Orchestrator, all_entries, field};

#[derive(Entity, Debug, Clone, PartialEq)]
#[keel(table = "batch_item", id = "sku")]
struct Item {
    sku: String,
    quantity: u32,
    #[keel(column = "unit_price")]
    price: f64,
}

pub fn batch<D: Database>(orchestrator: &Orchestrator, conn: &mut Conn<D>) {
    orchestrator
        .drop_table::<Item, _>(conn, true)
        .expect("Failed to drop batch_item table");
    orchestrator
        .create_table::<Item, _>(conn, true)
        .expect("Failed to create batch_item table");

    let mut items: Vec<_> = (1..=6)
        .map(|i| Item {
            sku: format!("SKU-{i:03}"),
            quantity: i * 10,
            price: i as f64 * 1.5,
        })
        .collect();
    orchestrator
        .insert_many(conn, &mut items)
        .expect("Failed to insert the items");
    assert_eq!(
        orchestrator
            .count::<Item, _>(conn, &all_entries())
            .expect("Failed to count"),
        6
    );

    for item in &mut items {
        item.quantity += 1;
    }
    assert_eq!(
        orchestrator
            .update_many(conn, &items)
            .expect("Failed to update the items"),
        6
    );
    let restocked = orchestrator
        .count::<Item, _>(conn, &field("quantity").greater(30))
        .expect("Failed to count");
    assert_eq!(restocked, 4);
    let item: Item = orchestrator
        .select_by_id(conn, "SKU-004".to_string())
        .expect("Failed to load SKU-004");
    assert_eq!(item, items[3]);

    assert_eq!(
        orchestrator
            .delete_many(conn, &items)
            .expect("Failed to delete the items"),
        6
    );
    assert_eq!(
        orchestrator
            .count::<Item, _>(conn, &all_entries())
            .expect("Failed to count"),
        0
    );
    assert_eq!(
        orchestrator
            .delete_many(conn, &items)
            .expect("Deleting again should succeed"),
        0
    );
}
