use crate::{AsDbValue, DbValue, Order, Ordered};

/// One side of a comparison.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// Reference to an entity field by field name, resolved to a column when compiled.
    Field(String),
    /// Server side function applied to an operand, like `lower(name)`.
    Function(String, Box<Operand>),
    /// Literal bound as a parameter.
    Value(DbValue),
    /// Literal that could not be encoded, reported when the expression is compiled.
    Invalid(String),
}

/// Reference to a field, see [`field`].
#[derive(Debug, Clone, PartialEq)]
pub struct Field(pub String);

/// Reference a field by name.
///
/// The name is not checked here: it is validated against the entity metadata when the
/// expression is compiled, so expressions can be built before any entity is reflected.
pub fn field(name: impl Into<String>) -> Field {
    Field(name.into())
}

/// Apply the server side function `name` to an operand.
pub fn sql_function(name: impl Into<String>, operand: impl Into<Operand>) -> Operand {
    Operand::Function(name.into(), Box::new(operand.into()))
}

impl Field {
    pub fn asc(self) -> Ordered {
        Ordered {
            field: self.0,
            order: Order::Asc,
        }
    }

    pub fn desc(self) -> Ordered {
        Ordered {
            field: self.0,
            order: Order::Desc,
        }
    }
}

impl From<Field> for Operand {
    fn from(value: Field) -> Self {
        Operand::Field(value.0)
    }
}

impl<T: AsDbValue> From<T> for Operand {
    fn from(value: T) -> Self {
        match value.to_db_value() {
            Ok(v) => Operand::Value(v),
            Err(e) => Operand::Invalid(e.to_string()),
        }
    }
}

impl From<&str> for Operand {
    fn from(value: &str) -> Self {
        Operand::Value(DbValue::Text(value.into()))
    }
}
