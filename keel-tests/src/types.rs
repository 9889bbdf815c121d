use keel::{Conn, Database, DbEnum, Entity, Orchestrator};
use rust_decimal::Decimal;
use std::str::FromStr;
use time::{Date, Month, OffsetDateTime, PrimitiveDateTime, Time, UtcOffset};
use uuid::Uuid;

#[derive(DbEnum, Debug, Clone, Copy, PartialEq)]
enum Status {
    Draft,
    Published,
    Archived,
}

#[derive(Entity, Debug, Clone, PartialEq)]
#[keel(table = "all_types", id = "code", rename_all = "camelCase")]
struct AllTypes {
    code: Uuid,
    tiny: i8,
    small: u16,
    big: i64,
    ratio: f32,
    precise: f64,
    flag: bool,
    maybe_flag: Option<bool>,
    label: String,
    maybe_label: Option<String>,
    payload: Vec<u8>,
    boxed: Box<i32>,
    status: Status,
    maybe_status: Option<Status>,
    price: Decimal,
    day: Date,
    clock: Time,
    local: PrimitiveDateTime,
    instant: OffsetDateTime,
}

pub fn types<D: Database>(orchestrator: &Orchestrator, conn: &mut Conn<D>) {
    orchestrator
        .drop_table::<AllTypes, _>(conn, true)
        .expect("Failed to drop all_types table");
    orchestrator
        .create_table::<AllTypes, _>(conn, true)
        .expect("Failed to create all_types table");

    let day = Date::from_calendar_date(2024, Month::February, 29).expect("Valid date");
    let clock = Time::from_hms_milli(23, 59, 58, 250).expect("Valid time");
    let full = AllTypes {
        code: Uuid::parse_str("5e915574-bb30-4430-98cf-c5854f61fbbd").expect("Valid uuid"),
        tiny: -128,
        small: 65_535,
        big: i64::MIN,
        ratio: 0.5,
        precise: -1234.0625,
        flag: true,
        maybe_flag: Some(false),
        label: "Hello world!".into(),
        maybe_label: Some("ünïcödé".into()),
        payload: vec![0, 1, 2, 254, 255],
        boxed: Box::new(42),
        status: Status::Published,
        maybe_status: Some(Status::Archived),
        price: Decimal::from_str("1234.50").expect("Valid decimal"),
        day,
        clock,
        local: PrimitiveDateTime::new(day, clock),
        instant: PrimitiveDateTime::new(day, clock)
            .assume_offset(UtcOffset::from_hms(2, 0, 0).expect("Valid offset")),
    };
    let empty = AllTypes {
        code: Uuid::parse_str("00000000-0000-0000-0000-000000000001").expect("Valid uuid"),
        tiny: 0,
        small: 0,
        big: 0,
        ratio: 0.0,
        precise: 0.0,
        flag: false,
        maybe_flag: None,
        label: String::new(),
        maybe_label: None,
        payload: vec![],
        boxed: Box::new(0),
        status: Status::Draft,
        maybe_status: None,
        price: Decimal::ZERO,
        day,
        clock: Time::MIDNIGHT,
        local: PrimitiveDateTime::new(day, Time::MIDNIGHT),
        instant: OffsetDateTime::UNIX_EPOCH,
    };
    for entity in [full, empty] {
        let inserted = orchestrator
            .insert(conn, entity.clone())
            .expect("Failed to insert all_types");
        assert_eq!(inserted, entity);
        let loaded: AllTypes = orchestrator
            .select_by_id(conn, entity.code)
            .expect("Failed to load all_types");
        assert_eq!(loaded, entity);
    }
}
