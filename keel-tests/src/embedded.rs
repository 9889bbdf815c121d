use keel::{Conn, Database, DbValue, Entity, Error, Orchestrator};

#[derive(Entity, Debug, Clone, PartialEq)]
#[keel(table = "embedded_author")]
struct Author {
    #[keel(id)]
    id: i64,
    name: String,
}

#[derive(Entity, Debug, Clone, PartialEq)]
#[keel(table = "embedded_book")]
struct Book {
    #[keel(id)]
    id: i64,
    title: String,
    #[keel(embedded, column = "author_id")]
    author: Author,
    #[keel(embedded, column = "editor_id")]
    editor: Option<Author>,
}

pub fn embedded<D: Database>(orchestrator: &Orchestrator, conn: &mut Conn<D>) {
    orchestrator
        .drop_table::<Book, _>(conn, true)
        .expect("Failed to drop embedded_book table");
    orchestrator
        .drop_table::<Author, _>(conn, true)
        .expect("Failed to drop embedded_author table");
    orchestrator
        .create_table::<Author, _>(conn, true)
        .expect("Failed to create embedded_author table");
    orchestrator
        .create_table::<Book, _>(conn, true)
        .expect("Failed to create embedded_book table");

    let tolkien = Author {
        id: 1,
        name: "J. R. R. Tolkien".into(),
    };
    let unwin = Author {
        id: 2,
        name: "Rayner Unwin".into(),
    };
    let mut authors = [tolkien.clone(), unwin.clone()];
    orchestrator
        .insert_many(conn, &mut authors)
        .expect("Failed to insert the authors");

    let mut hobbit = Book {
        id: 10,
        title: "The Hobbit".into(),
        author: tolkien.clone(),
        editor: None,
    };
    let mut lord = Book {
        id: 11,
        title: "The Lord of the Rings".into(),
        author: tolkien.clone(),
        editor: Some(unwin.clone()),
    };
    orchestrator
        .persist(conn, &mut hobbit)
        .expect("Failed to persist The Hobbit");
    orchestrator
        .persist(conn, &mut lord)
        .expect("Failed to persist The Lord of the Rings");

    // Only the identifier is stored
    let row = hobbit.to_row().expect("Failed to encode The Hobbit");
    assert_eq!(
        row,
        [
            DbValue::Int64(10),
            DbValue::Text("The Hobbit".into()),
            DbValue::Int64(1),
            DbValue::Null,
        ]
    );

    let loaded: Book = orchestrator
        .select_by_id(conn, 11)
        .expect("Failed to load The Lord of the Rings");
    assert_eq!(loaded, lord);
    let loaded: Book = orchestrator
        .select_by_id(conn, 10)
        .expect("Failed to load The Hobbit");
    assert_eq!(loaded.editor, None);
    assert_eq!(loaded.author, tolkien);

    // A dangling reference surfaces while decoding
    let ghost = Author {
        id: 99,
        name: "Nobody".into(),
    };
    let mut orphan = Book {
        id: 12,
        title: "Unwritten".into(),
        author: ghost,
        editor: None,
    };
    orchestrator
        .persist(conn, &mut orphan)
        .expect("Failed to persist the orphan book");
    let result = orchestrator.select_by_id::<Book, _>(conn, 12);
    assert!(
        matches!(
            &result,
            Err(Error::EntityNotFound { table, .. }) if table == "embedded_author"
        ),
        "Expected the author to be missing, got {:?}",
        result
    );
    assert!(
        Book::from_row(row, None).is_err(),
        "Embedded fields cannot be resolved without a connection"
    );
}
