use crate::{
    AsDbValue, CompiledWhere, DbValue, Field, GenericSqlWriter, Operand, Ordered, Result,
    SqlWriter, TypeInfo,
};
use std::ops::{BitAnd, BitOr, Not};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Equal,
    NotEqual,
    Less,
    Greater,
    LessEqual,
    GreaterEqual,
    Like,
}

/// Predicate tree restricting the rows an operation applies to.
///
/// Precedence is given by the tree itself. Modifiers (`OrderBy`, `Limit`, `LimitOffset`) wrap
/// the whole predicate and are rendered as suffix clauses: `WHERE`, then `ORDER BY`, then
/// `LIMIT` / `OFFSET`.
#[derive(Debug, Clone, PartialEq)]
pub enum WhereExpr {
    /// Matches every row, compiles to no `WHERE` clause at all.
    AllEntries,
    /// Matches the row whose identifier equals the value.
    ById(DbValue),
    Compare(Operand, CompareOp, Operand),
    /// Inclusive on both bounds.
    Between(Operand, Operand, Operand),
    /// An empty list matches nothing.
    In(Operand, Vec<Operand>),
    IsNull(Operand),
    Not(Box<WhereExpr>),
    And(Box<WhereExpr>, Box<WhereExpr>),
    Or(Box<WhereExpr>, Box<WhereExpr>),
    OrderBy(Box<WhereExpr>, Vec<Ordered>),
    Limit(Box<WhereExpr>, u64),
    LimitOffset(Box<WhereExpr>, u64, u64),
}

pub fn all_entries() -> WhereExpr {
    WhereExpr::AllEntries
}

pub fn by_id(id: impl AsDbValue) -> WhereExpr {
    match id.to_db_value() {
        Ok(id) => WhereExpr::ById(id),
        Err(e) => WhereExpr::IsNull(Operand::Invalid(e.to_string())),
    }
}

pub fn not(expr: WhereExpr) -> WhereExpr {
    WhereExpr::Not(Box::new(expr))
}

/// Comparison constructors shared by field references and function calls.
pub trait Comparable: Into<Operand> + Sized {
    fn equals(self, rhs: impl Into<Operand>) -> WhereExpr {
        WhereExpr::Compare(self.into(), CompareOp::Equal, rhs.into())
    }
    fn not_equals(self, rhs: impl Into<Operand>) -> WhereExpr {
        WhereExpr::Compare(self.into(), CompareOp::NotEqual, rhs.into())
    }
    fn greater(self, rhs: impl Into<Operand>) -> WhereExpr {
        WhereExpr::Compare(self.into(), CompareOp::Greater, rhs.into())
    }
    fn greater_equal(self, rhs: impl Into<Operand>) -> WhereExpr {
        WhereExpr::Compare(self.into(), CompareOp::GreaterEqual, rhs.into())
    }
    fn less(self, rhs: impl Into<Operand>) -> WhereExpr {
        WhereExpr::Compare(self.into(), CompareOp::Less, rhs.into())
    }
    fn less_equal(self, rhs: impl Into<Operand>) -> WhereExpr {
        WhereExpr::Compare(self.into(), CompareOp::LessEqual, rhs.into())
    }
    fn like(self, pattern: impl Into<Operand>) -> WhereExpr {
        WhereExpr::Compare(self.into(), CompareOp::Like, pattern.into())
    }
    fn between(self, low: impl Into<Operand>, high: impl Into<Operand>) -> WhereExpr {
        WhereExpr::Between(self.into(), low.into(), high.into())
    }
    fn is_in<I>(self, values: I) -> WhereExpr
    where
        I: IntoIterator,
        I::Item: Into<Operand>,
    {
        WhereExpr::In(self.into(), values.into_iter().map(Into::into).collect())
    }
    fn is_null(self) -> WhereExpr {
        WhereExpr::IsNull(self.into())
    }
}

impl Comparable for Field {}
impl Comparable for Operand {}

impl WhereExpr {
    pub fn and(self, rhs: WhereExpr) -> WhereExpr {
        WhereExpr::And(Box::new(self), Box::new(rhs))
    }

    pub fn or(self, rhs: WhereExpr) -> WhereExpr {
        WhereExpr::Or(Box::new(self), Box::new(rhs))
    }

    /// Order the results, keys are applied left to right.
    pub fn order_by<I>(self, keys: I) -> WhereExpr
    where
        I: IntoIterator,
        I::Item: Into<Ordered>,
    {
        WhereExpr::OrderBy(Box::new(self), keys.into_iter().map(Into::into).collect())
    }

    pub fn limit(self, limit: u64) -> WhereExpr {
        WhereExpr::Limit(Box::new(self), limit)
    }

    pub fn limit_offset(self, limit: u64, offset: u64) -> WhereExpr {
        WhereExpr::LimitOffset(Box::new(self), limit, offset)
    }

    pub fn is_modifier(&self) -> bool {
        matches!(
            self,
            WhereExpr::OrderBy(..) | WhereExpr::Limit(..) | WhereExpr::LimitOffset(..)
        )
    }

    /// The predicate below any modifier.
    pub fn predicate(&self) -> &WhereExpr {
        match self {
            WhereExpr::OrderBy(v, ..) | WhereExpr::Limit(v, ..) | WhereExpr::LimitOffset(v, ..) => {
                v.predicate()
            }
            v => v,
        }
    }

    /// Compile into a SQL fragment and its parameters using `?` placeholders.
    pub fn compile(&self, info: &TypeInfo) -> Result<CompiledWhere> {
        GenericSqlWriter::new().compile_where(info, self)
    }
}

impl BitAnd for WhereExpr {
    type Output = WhereExpr;
    fn bitand(self, rhs: Self) -> Self::Output {
        self.and(rhs)
    }
}

impl BitOr for WhereExpr {
    type Output = WhereExpr;
    fn bitor(self, rhs: Self) -> Self::Output {
        self.or(rhs)
    }
}

impl Not for WhereExpr {
    type Output = WhereExpr;
    fn not(self) -> Self::Output {
        not(self)
    }
}

impl Default for WhereExpr {
    fn default() -> Self {
        WhereExpr::AllEntries
    }
}
