use crate::truncate_long;
use std::fmt::{self, Display};

/// Generic database value, the single interchange type between the codec and the driver.
#[derive(Default, Debug, Clone, PartialEq)]
pub enum DbValue {
    #[default]
    Null,
    Int64(i64),
    Float64(f64),
    Text(String),
    Bool(bool),
    Blob(Box<[u8]>),
}

impl DbValue {
    pub fn is_null(&self) -> bool {
        matches!(self, DbValue::Null)
    }

    /// Name of the variant, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            DbValue::Null => "Null",
            DbValue::Int64(..) => "Int64",
            DbValue::Float64(..) => "Float64",
            DbValue::Text(..) => "Text",
            DbValue::Bool(..) => "Bool",
            DbValue::Blob(..) => "Blob",
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            DbValue::Int64(v) => Some(*v),
            DbValue::Bool(v) => Some(*v as i64),
            _ => None,
        }
    }
}

impl Display for DbValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DbValue::Null => f.write_str("NULL"),
            DbValue::Int64(v) => write!(f, "{v}"),
            DbValue::Float64(v) => write!(f, "{v}"),
            DbValue::Text(v) => write!(f, "'{}'", truncate_long!(v)),
            DbValue::Bool(v) => write!(f, "{v}"),
            DbValue::Blob(v) => write!(f, "<{} bytes>", v.len()),
        }
    }
}

/// A row as exchanged with the driver, values are aligned with the field order of the entity.
pub type Row = Vec<DbValue>;
