use keel::{Conn, Database, Entity, Error, Orchestrator, all_entries};

#[derive(Entity, Debug, Clone, PartialEq)]
#[keel(table = "duplicate_account")]
struct Account {
    #[keel(id)]
    number: i64,
    owner: String,
}

pub fn duplicate<D: Database>(orchestrator: &Orchestrator, conn: &mut Conn<D>) {
    orchestrator
        .drop_table::<Account, _>(conn, true)
        .expect("Failed to drop duplicate_account table");
    orchestrator
        .create_table::<Account, _>(conn, true)
        .expect("Failed to create duplicate_account table");

    let first = Account {
        number: 7,
        owner: "First".into(),
    };
    orchestrator
        .insert(conn, first.clone())
        .expect("Failed to insert the first account");
    let result = orchestrator.insert(
        conn,
        Account {
            number: 7,
            owner: "Second".into(),
        },
    );
    assert!(
        matches!(
            &result,
            Err(Error::DuplicateInsert { table, .. }) if table == "duplicate_account"
        ),
        "Expected a duplicate insert, got {:?}",
        result
    );

    let accounts: Vec<Account> = orchestrator
        .select(conn, &all_entries())
        .expect("Failed to select the accounts");
    assert_eq!(accounts, [first]);
}
