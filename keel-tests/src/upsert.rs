use keel::{Conn, Database, Entity, Orchestrator, all_entries};

#[derive(Entity, Debug, Clone, PartialEq)]
#[keel(table = "upsert_setting", id = "key")]
struct Setting {
    key: String,
    value: String,
    revision: i32,
}

/// Marker table holding nothing but its identifier.
#[derive(Entity, Debug, Clone, PartialEq)]
#[keel(table = "upsert_tag", id = "tag")]
struct Tag {
    tag: String,
}

pub fn upsert<D: Database>(orchestrator: &Orchestrator, conn: &mut Conn<D>) {
    orchestrator
        .drop_table::<Setting, _>(conn, true)
        .expect("Failed to drop upsert_setting table");
    orchestrator
        .create_table::<Setting, _>(conn, true)
        .expect("Failed to create upsert_setting table");

    let mut setting = Setting {
        key: "theme".into(),
        value: "light".into(),
        revision: 1,
    };
    orchestrator
        .upsert(conn, &setting)
        .expect("Failed to upsert a new setting");
    setting.value = "dark".into();
    setting.revision = 2;
    orchestrator
        .upsert(conn, &setting)
        .expect("Failed to upsert an existing setting");
    let settings: Vec<Setting> = orchestrator
        .select(conn, &all_entries())
        .expect("Failed to select the settings");
    assert_eq!(settings, [setting]);

    orchestrator
        .drop_table::<Tag, _>(conn, true)
        .expect("Failed to drop upsert_tag table");
    orchestrator
        .create_table::<Tag, _>(conn, true)
        .expect("Failed to create upsert_tag table");
    let mut tag = Tag { tag: "rust".into() };
    for _ in 0..2 {
        orchestrator
            .upsert(conn, &tag)
            .expect("Failed to upsert the tag");
    }
    orchestrator
        .persist(conn, &mut tag)
        .expect("Persisting an existing tag has nothing to update");
    assert_eq!(
        orchestrator
            .update(conn, &tag)
            .expect("Updating a tag has nothing to set"),
        0
    );
    assert_eq!(
        orchestrator
            .count::<Tag, _>(conn, &all_entries())
            .expect("Failed to count"),
        1
    );
}
