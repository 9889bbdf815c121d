#[cfg(test)]
mod tests {
    use indoc::indoc;
    use keel::{
        Comparable, DbValue, Entity, GenericSqlWriter, NumberedSqlWriter, Slot, SqlWriter,
        all_entries, field,
    };

    #[derive(Entity)]
    #[allow(non_snake_case)]
    struct Person {
        personID: i64,
        name: String,
        age: i32,
        email: Option<String>,
    }

    #[derive(Entity)]
    #[keel(table = "tickets", auto_increment)]
    struct Ticket {
        #[keel(id)]
        id: i64,
        title: String,
        done: bool,
        score: f64,
        attachment: Option<Vec<u8>>,
    }

    #[derive(Entity)]
    #[keel(table = "tags", id = "label")]
    struct Tag {
        label: String,
    }

    #[derive(Entity)]
    #[keel(auto_increment)]
    struct Counter {
        #[keel(id)]
        id: i64,
    }

    const WRITER: GenericSqlWriter = GenericSqlWriter;

    #[test]
    fn create_table() {
        let info = Person::type_info().expect("Person should be mappable");
        assert_eq!(
            WRITER.sql_create_table(&info, false),
            indoc! {"
                CREATE TABLE Person (
                personID BIGINT PRIMARY KEY,
                name VARCHAR NOT NULL,
                age BIGINT NOT NULL,
                email VARCHAR
                )
            "}
            .trim()
        );
        let info = Ticket::type_info().expect("Ticket should be mappable");
        assert_eq!(
            WRITER.sql_create_table(&info, true),
            indoc! {"
                CREATE TABLE IF NOT EXISTS tickets (
                id BIGINT PRIMARY KEY GENERATED BY DEFAULT AS IDENTITY,
                title VARCHAR NOT NULL,
                done BOOLEAN NOT NULL,
                score DOUBLE NOT NULL,
                attachment BLOB
                )
            "}
            .trim()
        );
    }

    #[test]
    fn drop_table() {
        let info = Person::type_info().expect("Person should be mappable");
        assert_eq!(WRITER.sql_drop_table(&info, true), "DROP TABLE IF EXISTS Person");
        assert_eq!(WRITER.sql_drop_table(&info, false), "DROP TABLE Person");
    }

    #[test]
    fn insert() {
        let info = Person::type_info().expect("Person should be mappable");
        let statement = WRITER.sql_insert(&info);
        assert_eq!(
            statement.sql,
            "INSERT INTO Person (personID, name, age, email) VALUES (?, ?, ?, ?)"
        );
        assert_eq!(
            statement.slots,
            [Slot::Field(0), Slot::Field(1), Slot::Field(2), Slot::Field(3)]
        );

        // The generated identifier is left out
        let info = Ticket::type_info().expect("Ticket should be mappable");
        let statement = WRITER.sql_insert(&info);
        assert_eq!(
            statement.sql,
            "INSERT INTO tickets (title, done, score, attachment) VALUES (?, ?, ?, ?)"
        );
        assert_eq!(
            statement.slots,
            [Slot::Field(1), Slot::Field(2), Slot::Field(3), Slot::Field(4)]
        );
        assert_eq!(
            WRITER.sql_insert_returning(&info).sql,
            "INSERT INTO tickets (title, done, score, attachment) VALUES (?, ?, ?, ?) RETURNING id"
        );

        let info = Counter::type_info().expect("Counter should be mappable");
        assert_eq!(
            WRITER.sql_insert(&info).sql,
            "INSERT INTO Counter DEFAULT VALUES"
        );
        assert_eq!(
            WRITER.sql_insert_returning(&info).sql,
            "INSERT INTO Counter DEFAULT VALUES RETURNING id"
        );
    }

    #[test]
    fn update() {
        let info = Person::type_info().expect("Person should be mappable");
        let statement = WRITER.sql_update(&info).expect("Person has columns to set");
        assert_eq!(
            statement.sql,
            "UPDATE Person SET name = ?, age = ?, email = ? WHERE personID = ?"
        );
        assert_eq!(
            statement.slots,
            [Slot::Field(1), Slot::Field(2), Slot::Field(3), Slot::Key]
        );

        let person = Person {
            personID: 1,
            name: "Alice".into(),
            age: 25,
            email: None,
        };
        let row = person.to_row().expect("Failed to encode Alice");
        assert_eq!(
            statement
                .arguments(&row, &row[0])
                .expect("Arguments should match the statement"),
            [
                DbValue::Text("Alice".into()),
                DbValue::Int64(25),
                DbValue::Null,
                DbValue::Int64(1),
            ]
        );

        let info = Tag::type_info().expect("Tag should be mappable");
        assert!(WRITER.sql_update(&info).is_none());
    }

    #[test]
    fn select_and_delete() {
        let info = Person::type_info().expect("Person should be mappable");
        assert_eq!(
            WRITER.sql_select_all(&info).sql,
            "SELECT personID, name, age, email FROM Person"
        );
        let statement = WRITER.sql_select_by_id(&info);
        assert_eq!(
            statement.sql,
            "SELECT personID, name, age, email FROM Person WHERE personID = ?"
        );
        assert_eq!(statement.slots, [Slot::Key]);
        assert_eq!(
            WRITER.sql_count_by_id(&info).sql,
            "SELECT COUNT(*) FROM Person WHERE personID = ?"
        );
        assert_eq!(
            WRITER.sql_delete(&info).sql,
            "DELETE FROM Person WHERE personID = ?"
        );
    }

    #[test]
    fn conditional_statements() {
        let info = Person::type_info().expect("Person should be mappable");
        let condition = field("age")
            .greater(18)
            .and(field("name").like("A%"))
            .order_by([field("age").desc()])
            .limit(10);

        let statement = WRITER
            .sql_select(&info, &condition)
            .expect("Failed to build the select");
        assert_eq!(
            statement.sql,
            "SELECT personID, name, age, email FROM Person WHERE age > ? AND name LIKE ? ORDER BY age DESC LIMIT ?"
        );
        assert_eq!(
            statement.params,
            [
                DbValue::Int64(18),
                DbValue::Text("A%".into()),
                DbValue::Int64(10)
            ]
        );
        assert_eq!(statement.slots, [Slot::Param(0), Slot::Param(1), Slot::Param(2)]);

        let statement = WRITER
            .sql_count(&info, &condition)
            .expect("Failed to build the count");
        assert_eq!(
            statement.sql,
            "SELECT COUNT(*) FROM Person WHERE age > ? AND name LIKE ?"
        );
        assert_eq!(statement.params.len(), 2);

        let statement = WRITER
            .sql_delete_where(&info, &field("email").is_null())
            .expect("Failed to build the delete");
        assert_eq!(statement.sql, "DELETE FROM Person WHERE email IS NULL");
        assert_eq!(
            WRITER
                .sql_delete_where(&info, &all_entries())
                .expect("Failed to build the delete")
                .sql,
            "DELETE FROM Person"
        );
        assert!(WRITER.sql_delete_where(&info, &condition).is_err());
    }

    #[test]
    fn upsert() {
        let info = Person::type_info().expect("Person should be mappable");
        let statement = WRITER.sql_upsert(&info);
        assert_eq!(
            statement.sql,
            "INSERT INTO Person (personID, name, age, email) VALUES (?, ?, ?, ?) \
             ON CONFLICT (personID) DO UPDATE SET name = EXCLUDED.name, age = EXCLUDED.age, email = EXCLUDED.email"
        );
        assert_eq!(statement.slots.len(), 4);

        let info = Tag::type_info().expect("Tag should be mappable");
        assert_eq!(
            WRITER.sql_upsert(&info).sql,
            "INSERT INTO tags (label) VALUES (?) ON CONFLICT (label) DO NOTHING"
        );
    }

    #[test]
    fn numbered_placeholders() {
        let writer = NumberedSqlWriter;
        let info = Person::type_info().expect("Person should be mappable");
        let statement = writer.sql_update(&info).expect("Person has columns to set");
        assert_eq!(
            statement.sql,
            "UPDATE Person SET name = $1, age = $2, email = $3 WHERE personID = $4"
        );
        let statement = writer
            .sql_select(
                &info,
                &field("age").between(18, 30).limit_offset(5, 10),
            )
            .expect("Failed to build the select");
        assert_eq!(
            statement.sql,
            "SELECT personID, name, age, email FROM Person WHERE age BETWEEN $1 AND $2 LIMIT $3 OFFSET $4"
        );
        assert_eq!(
            statement.params,
            [
                DbValue::Int64(18),
                DbValue::Int64(30),
                DbValue::Int64(5),
                DbValue::Int64(10)
            ]
        );
        assert_eq!(
            writer.sql_insert(&info).sql,
            "INSERT INTO Person (personID, name, age, email) VALUES ($1, $2, $3, $4)"
        );
    }
}
