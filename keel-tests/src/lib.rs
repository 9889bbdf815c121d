mod auto_increment;
mod batch;
mod conditions;
mod duplicate;
mod embedded;
mod no_unique_key;
mod rows;
mod simple;
mod transaction;
mod types;
mod upsert;

use crate::{
    auto_increment::auto_increment,
    batch::batch,
    conditions::conditions,
    duplicate::duplicate,
    embedded::embedded,
    no_unique_key::no_unique_key,
    rows::rows,
    simple::simple,
    transaction::{manual_commit, rollback_batch},
    types::types,
    upsert::upsert,
};
use keel::{Conn, Database, LogTrace, Orchestrator};
use log::LevelFilter;
use std::{env, sync::Arc};

pub fn init_logs() {
    let mut logger = env_logger::builder();
    logger
        .is_test(true)
        .format_file(true)
        .format_line_number(true);
    if env::var("RUST_LOG").is_err() {
        logger.filter_level(LevelFilter::Warn);
    }
    let _ = logger.try_init();
}

/// Run every scenario against `conn`, which must start in auto commit mode.
pub fn execute_tests<D: Database>(mut conn: Conn<D>) {
    let orchestrator = Orchestrator::with_sink(Arc::new(LogTrace::default()));
    simple(&orchestrator, &mut conn);
    types(&orchestrator, &mut conn);
    batch(&orchestrator, &mut conn);
    duplicate(&orchestrator, &mut conn);
    no_unique_key(&orchestrator, &mut conn);
    auto_increment(&orchestrator, &mut conn);
    embedded(&orchestrator, &mut conn);
    conditions(&orchestrator, &mut conn);
    upsert(&orchestrator, &mut conn);
    rows(&orchestrator, &mut conn);
    rollback_batch(&orchestrator, &mut conn);
    manual_commit(&orchestrator, &mut conn);
}

#[macro_export]
macro_rules! silent_logs {
    ($($code:tt)+) => {{
        let level = log::max_level();
        log::set_max_level(log::LevelFilter::Off);
        $($code)+
        log::set_max_level(level);
    }};
}
