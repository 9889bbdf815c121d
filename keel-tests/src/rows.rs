use keel::{Conn, Database, DbValue, Entity, Error, Orchestrator};

#[derive(Entity, Debug, Clone, PartialEq)]
#[keel(table = "rows_city", rename_all = "UPPERCASE")]
struct City {
    #[keel(id)]
    name: String,
    population: u64,
    capital: bool,
}

pub fn rows<D: Database>(orchestrator: &Orchestrator, conn: &mut Conn<D>) {
    orchestrator
        .drop_table::<City, _>(conn, true)
        .expect("Failed to drop rows_city table");
    orchestrator
        .create_table::<City, _>(conn, true)
        .expect("Failed to create rows_city table");
    let mut cities = [
        City {
            name: "Rome".into(),
            population: 2_750_000,
            capital: true,
        },
        City {
            name: "Milan".into(),
            population: 1_370_000,
            capital: false,
        },
    ];
    orchestrator
        .insert_many(conn, &mut cities)
        .expect("Failed to insert the cities");

    let rows = conn
        .database_mut()
        .query(
            "SELECT NAME, POPULATION, CAPITAL FROM rows_city ORDER BY POPULATION",
            &[],
        )
        .expect("Failed to query the cities");
    let loaded: Vec<City> = orchestrator
        .entities_from_rows(conn, rows)
        .expect("Failed to convert the rows");
    assert_eq!(loaded, [cities[1].clone(), cities[0].clone()]);

    let short = vec![vec![DbValue::Text("Turin".into()), DbValue::Int64(840_000)]];
    let result = orchestrator.entities_from_rows::<City, _>(conn, short);
    assert!(
        matches!(&result, Err(Error::Mapping(..))),
        "A row with missing columns cannot be converted, got {:?}",
        result
    );
    let negative = vec![vec![
        DbValue::Text("Nowhere".into()),
        DbValue::Int64(-1),
        DbValue::Int64(0),
    ]];
    let result = orchestrator.entities_from_rows::<City, _>(conn, negative);
    assert!(
        matches!(&result, Err(Error::Mapping(message)) if message.contains("population")),
        "A negative population does not fit, got {:?}",
        result
    );
}
