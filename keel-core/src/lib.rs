mod as_value;
mod converter;
mod database;
mod entity;
mod error;
mod expression;
mod field;
mod orchestrator;
mod record;
mod reflect;
mod session;
mod trace;
mod type_info;
mod util;
mod value;
pub mod writer;

pub use as_value::*;
pub use converter::*;
pub use database::*;
pub use entity::*;
pub use error::*;
pub use expression::*;
pub use field::*;
pub use orchestrator::*;
pub use record::*;
pub use reflect::*;
pub use session::*;
pub use trace::*;
pub use type_info::*;
pub use util::*;
pub use value::*;
pub use writer::{CompiledWhere, GenericSqlWriter, NumberedSqlWriter, Slot, SqlWriter, Statement};
pub(crate) use writer::Fragment;
