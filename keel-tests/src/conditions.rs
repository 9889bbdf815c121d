use keel::{
    Comparable, Conn, Database, Entity, Error, Order, Orchestrator, WhereExpr, all_entries, by_id,
    field, not, sql_function,
};

#[derive(Entity, Debug, Clone, PartialEq)]
#[keel(table = "condition_employee", id = "id")]
struct Employee {
    id: i32,
    name: String,
    age: i32,
    department: Option<String>,
}

fn names(employees: Vec<Employee>) -> Vec<String> {
    employees.into_iter().map(|e| e.name).collect()
}

pub fn conditions<D: Database>(orchestrator: &Orchestrator, conn: &mut Conn<D>) {
    orchestrator
        .drop_table::<Employee, _>(conn, true)
        .expect("Failed to drop condition_employee table");
    orchestrator
        .create_table::<Employee, _>(conn, true)
        .expect("Failed to create condition_employee table");
    let mut employees = [
        ("Alice", 25, Some("sales")),
        ("Bob", 31, Some("sales")),
        ("Carol", 18, None),
        ("Dave", 45, Some("engineering")),
        ("Eve", 30, Some("engineering")),
        ("Frank", 52, None),
    ]
    .into_iter()
    .enumerate()
    .map(|(i, (name, age, department))| Employee {
        id: i as i32 + 1,
        name: name.into(),
        age,
        department: department.map(Into::into),
    })
    .collect::<Vec<_>>();
    orchestrator
        .insert_many(conn, &mut employees)
        .expect("Failed to insert the employees");

    let select = |conn: &mut Conn<D>, condition: WhereExpr| {
        names(
            orchestrator
                .select::<Employee, _>(conn, &condition)
                .unwrap_or_else(|e| panic!("Failed to select with {condition:?}: {e}")),
        )
    };

    assert_eq!(
        select(
            conn,
            field("age").between(18, 30).order_by([field("age").asc()])
        ),
        ["Carol", "Alice", "Eve"]
    );
    assert_eq!(
        select(
            conn,
            (field("department").equals("sales") | field("age").greater(50))
                .order_by(["name"])
        ),
        ["Alice", "Bob", "Frank"]
    );
    assert_eq!(
        select(
            conn,
            field("department")
                .is_null()
                .or(field("name").like("D%"))
                .order_by([("age", Order::Desc)])
        ),
        ["Frank", "Dave", "Carol"]
    );
    assert_eq!(
        select(
            conn,
            not(field("department").is_null()).and(field("age").less_equal(30))
                & field("name").not_equals("Eve")
        ),
        ["Alice"]
    );
    assert_eq!(
        select(
            conn,
            field("id").is_in([2, 4, 6]).order_by([field("id").desc()])
        ),
        ["Frank", "Dave", "Bob"]
    );
    assert!(select(conn, field("id").is_in(Vec::<i32>::new())).is_empty());
    assert_eq!(select(conn, by_id(3)), ["Carol"]);
    assert_eq!(
        select(
            conn,
            sql_function("upper", field("name"))
                .equals("EVE")
                .order_by(["id"])
        ),
        ["Eve"]
    );

    // Modifiers
    assert_eq!(
        select(conn, all_entries().order_by([field("age").asc()]).limit(2)),
        ["Carol", "Alice"]
    );
    assert_eq!(
        select(
            conn,
            all_entries()
                .order_by([field("age").asc()])
                .limit_offset(2, 3)
        ),
        ["Bob", "Dave"]
    );
    assert_eq!(
        orchestrator
            .count::<Employee, _>(conn, &field("age").greater(20).limit(1))
            .expect("Failed to count"),
        5,
        "Counting ignores the limit"
    );

    // Unknown fields never reach the database
    let unknown = orchestrator.select::<Employee, _>(conn, &field("salary").greater(10));
    assert!(
        matches!(&unknown, Err(Error::Mapping(message)) if message.contains("salary")),
        "Unexpected result {:?}",
        unknown
    );

    // Delete with a predicate
    assert_eq!(
        orchestrator
            .delete_where::<Employee, _>(conn, &field("department").equals("engineering"))
            .expect("Failed to delete the engineers"),
        2
    );
    assert!(
        orchestrator
            .delete_where::<Employee, _>(conn, &all_entries().limit(1))
            .is_err(),
        "Deleting with a limit is rejected"
    );
    assert_eq!(
        orchestrator
            .count::<Employee, _>(conn, &all_entries())
            .expect("Failed to count"),
        4
    );
}
