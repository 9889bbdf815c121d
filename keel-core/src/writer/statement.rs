use crate::{DbValue, Error, Result};

/// Source of the value bound to one placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    /// Value of the field at this index of the entity row.
    Field(usize),
    /// The identifier the operation is keyed by.
    Key,
    /// Literal captured from a where expression, index into [`Statement::params`].
    Param(usize),
}

/// Parameterized SQL text with its placeholders listed left to right.
#[derive(Default, Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub slots: Vec<Slot>,
    pub params: Vec<DbValue>,
}

impl Statement {
    pub fn new(sql: String) -> Self {
        Self {
            sql,
            ..Default::default()
        }
    }

    /// Values to bind, in placeholder order.
    ///
    /// `row` is the encoded entity (may be empty for statements keyed only by identifier) and
    /// `key` the identifier value.
    pub fn arguments(&self, row: &[DbValue], key: &DbValue) -> Result<Vec<DbValue>> {
        self.slots
            .iter()
            .map(|slot| match *slot {
                Slot::Field(i) => row.get(i).cloned().ok_or_else(|| {
                    Error::mapping(format!(
                        "Statement expects a value for field {i} but the row has {} values",
                        row.len()
                    ))
                }),
                Slot::Key => Ok(key.clone()),
                Slot::Param(i) => self.params.get(i).cloned().ok_or_else(|| {
                    Error::mapping(format!("Statement has no parameter {i}"))
                }),
            })
            .collect()
    }
}

/// Output of a where expression compilation.
#[derive(Default, Debug, Clone, PartialEq)]
pub struct CompiledWhere {
    /// Clauses starting with `WHERE`, `ORDER BY` or `LIMIT`, empty when the expression matches
    /// every row and has no modifier.
    pub sql: String,
    pub params: Vec<DbValue>,
}

#[cfg(test)]
mod tests {
    use super::{Slot, Statement};
    use crate::{DbValue, Error};

    #[test]
    fn arguments_follow_slots() {
        let statement = Statement {
            sql: "UPDATE t SET b = ?, c = ? WHERE a = ? AND d > ?".into(),
            slots: vec![Slot::Field(1), Slot::Field(2), Slot::Key, Slot::Param(0)],
            params: vec![DbValue::Float64(0.5)],
        };
        let row = [
            DbValue::Int64(7),
            DbValue::Text("x".into()),
            DbValue::Null,
        ];
        assert_eq!(
            statement.arguments(&row, &DbValue::Int64(7)).unwrap(),
            [
                DbValue::Text("x".into()),
                DbValue::Null,
                DbValue::Int64(7),
                DbValue::Float64(0.5),
            ]
        );
        assert!(matches!(
            statement.arguments(&row[..1], &DbValue::Int64(7)),
            Err(Error::Mapping(..))
        ));
    }
}
