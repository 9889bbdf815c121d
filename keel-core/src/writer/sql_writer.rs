use crate::{
    CompareOp, CompiledWhere, DbValue, Error, FieldDescriptor, FieldType, Fragment, Operand, Order,
    Ordered, Result, Slot, Statement, TypeInfo, WhereExpr, possibly_parenthesized, separated_by,
    writer::Context,
};
use std::fmt::Write;

/// Dialect printer turning entity metadata and where expressions into parameterized SQL.
///
/// Every value reaches the database through a placeholder, the writer never prints literals.
/// Backends customize the output by overriding the hooks (identifiers, placeholders, column
/// types, auto increment), the statement builders are shared.
pub trait SqlWriter {
    fn as_dyn(&self) -> &dyn SqlWriter;

    /// Whether `INSERT ... RETURNING` is available.
    fn supports_returning(&self) -> bool {
        true
    }

    /// Whether `INSERT ... ON CONFLICT` is available.
    fn supports_upsert(&self) -> bool {
        true
    }

    /// Table and column names are passed through as configured.
    fn write_identifier(&self, _context: &mut Context, out: &mut String, value: &str) {
        out.push_str(value);
    }

    fn write_table(&self, context: &mut Context, out: &mut String, info: &TypeInfo) {
        self.write_identifier(context, out, &info.table_name);
    }

    /// Render a positional placeholder, `context.counter` is the number of placeholders so far.
    fn write_placeholder(&self, context: &mut Context, out: &mut String) {
        context.counter += 1;
        out.push('?');
    }

    /// Render the SQL type storing the field.
    fn write_column_type(&self, _context: &mut Context, out: &mut String, field: &FieldDescriptor) {
        out.push_str(match field.field_type.storage() {
            FieldType::Int => "BIGINT",
            FieldType::Float => "DOUBLE",
            FieldType::Text => "VARCHAR",
            FieldType::Bool => "BOOLEAN",
            FieldType::Blob => "BLOB",
            v => {
                log::error!("Unexpected storage type {v} for field `{}`", field.field_name);
                "BLOB"
            }
        });
    }

    /// Suffix of an auto incremented primary key column.
    fn write_auto_increment(&self, _context: &mut Context, out: &mut String) {
        out.push_str(" GENERATED BY DEFAULT AS IDENTITY");
    }

    /// Render one column definition inside `CREATE TABLE`.
    fn write_create_table_column(
        &self,
        context: &mut Context,
        out: &mut String,
        info: &TypeInfo,
        index: usize,
    ) {
        let field = &info.fields[index];
        self.write_identifier(context, out, &field.column_name);
        out.push(' ');
        self.write_column_type(context, out, field);
        if index == info.id_index() {
            out.push_str(" PRIMARY KEY");
            if info.auto_increment {
                self.write_auto_increment(context, out);
            }
        } else if !field.nullable {
            out.push_str(" NOT NULL");
        }
    }

    /// Precedence used to decide whether a subexpression needs parentheses.
    fn expression_precedence(&self, value: &WhereExpr) -> i32 {
        match value {
            WhereExpr::Or(..) => 100,
            WhereExpr::And(..) => 200,
            WhereExpr::Not(..) => 250,
            _ => 300,
        }
    }

    fn write_compare_op(&self, _context: &mut Context, out: &mut String, value: CompareOp) {
        out.push_str(match value {
            CompareOp::Equal => " = ",
            CompareOp::NotEqual => " <> ",
            CompareOp::Less => " < ",
            CompareOp::Greater => " > ",
            CompareOp::LessEqual => " <= ",
            CompareOp::GreaterEqual => " >= ",
            CompareOp::Like => " LIKE ",
        });
    }

    /// Render the column a field name refers to.
    fn write_field(
        &self,
        context: &mut Context,
        out: &mut String,
        info: &TypeInfo,
        name: &str,
    ) -> Result<()> {
        let Some(field) = info.field(name) else {
            return Err(Error::mapping(format!(
                "Unknown field `{name}` referenced in an expression on `{}`",
                info.table_name
            )));
        };
        self.write_identifier(context, out, &field.column_name);
        Ok(())
    }

    fn write_operand(
        &self,
        context: &mut Context,
        out: &mut String,
        info: &TypeInfo,
        value: &Operand,
        params: &mut Vec<DbValue>,
    ) -> Result<()> {
        match value {
            Operand::Field(name) => self.write_field(context, out, info, name)?,
            Operand::Function(name, arg) => {
                let mut chars = name.chars();
                let valid = chars
                    .next()
                    .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
                    && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
                if !valid {
                    return Err(Error::mapping(format!(
                        "`{name}` is not a valid function name"
                    )));
                }
                out.push_str(name);
                out.push('(');
                self.write_operand(context, out, info, arg, params)?;
                out.push(')');
            }
            Operand::Value(v) => {
                self.write_placeholder(context, out);
                params.push(v.clone());
            }
            Operand::Invalid(message) => return Err(Error::mapping(message.clone())),
        }
        Ok(())
    }

    /// Render a predicate, modifiers are only accepted around the whole expression.
    fn write_condition(
        &self,
        context: &mut Context,
        out: &mut String,
        info: &TypeInfo,
        value: &WhereExpr,
        params: &mut Vec<DbValue>,
    ) -> Result<()> {
        let precedence = self.expression_precedence(value);
        match value {
            WhereExpr::AllEntries => out.push_str("1 = 1"),
            WhereExpr::ById(id) => {
                self.write_identifier(context, out, &info.id_field().column_name);
                out.push_str(" = ");
                self.write_placeholder(context, out);
                params.push(id.clone());
            }
            WhereExpr::Compare(lhs, op, rhs) => {
                self.write_operand(context, out, info, lhs, params)?;
                self.write_compare_op(context, out, *op);
                self.write_operand(context, out, info, rhs, params)?;
            }
            WhereExpr::Between(operand, low, high) => {
                self.write_operand(context, out, info, operand, params)?;
                out.push_str(" BETWEEN ");
                self.write_operand(context, out, info, low, params)?;
                out.push_str(" AND ");
                self.write_operand(context, out, info, high, params)?;
            }
            WhereExpr::In(operand, values) if values.is_empty() => {
                // Operand is validated but never reaches the statement
                let mut scratch = *context;
                let (mut sql, mut discarded) = (String::new(), Vec::new());
                self.write_operand(&mut scratch, &mut sql, info, operand, &mut discarded)?;
                out.push_str("1 = 0");
            }
            WhereExpr::In(operand, values) => {
                self.write_operand(context, out, info, operand, params)?;
                out.push_str(" IN (");
                for (i, v) in values.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    self.write_operand(context, out, info, v, params)?;
                }
                out.push(')');
            }
            WhereExpr::IsNull(operand) => {
                self.write_operand(context, out, info, operand, params)?;
                out.push_str(" IS NULL");
            }
            WhereExpr::Not(arg) => {
                out.push_str("NOT ");
                possibly_parenthesized!(
                    out,
                    self.expression_precedence(arg) <= precedence,
                    self.write_condition(context, out, info, arg, params)?
                );
            }
            WhereExpr::And(lhs, rhs) | WhereExpr::Or(lhs, rhs) => {
                possibly_parenthesized!(
                    out,
                    self.expression_precedence(lhs) < precedence,
                    self.write_condition(context, out, info, lhs, params)?
                );
                out.push_str(if matches!(value, WhereExpr::And(..)) {
                    " AND "
                } else {
                    " OR "
                });
                possibly_parenthesized!(
                    out,
                    self.expression_precedence(rhs) <= precedence,
                    self.write_condition(context, out, info, rhs, params)?
                );
            }
            WhereExpr::OrderBy(..) | WhereExpr::Limit(..) | WhereExpr::LimitOffset(..) => {
                return Err(Error::mapping(
                    "ORDER BY and LIMIT modifiers must wrap the whole expression",
                ));
            }
        }
        Ok(())
    }

    fn write_order_by(
        &self,
        context: &mut Context,
        out: &mut String,
        info: &TypeInfo,
        keys: &[&Ordered],
    ) -> Result<()> {
        out.push_str(" ORDER BY ");
        for (i, key) in keys.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            self.write_field(context, out, info, &key.field)?;
            out.push_str(match key.order {
                Order::Asc => " ASC",
                Order::Desc => " DESC",
            });
        }
        Ok(())
    }

    /// Render the clauses of a where expression, each one preceded by a space.
    ///
    /// Modifiers are peeled from the outside: `ORDER BY` keys of inner wrappers come first and
    /// the outermost limit wins.
    fn write_where(
        &self,
        context: &mut Context,
        out: &mut String,
        info: &TypeInfo,
        value: &WhereExpr,
        params: &mut Vec<DbValue>,
    ) -> Result<()> {
        let mut order_by = Vec::new();
        let mut limit = None;
        let mut predicate = value;
        loop {
            match predicate {
                WhereExpr::OrderBy(inner, keys) => {
                    order_by.push(keys);
                    predicate = inner;
                }
                WhereExpr::Limit(inner, n) => {
                    limit = limit.or(Some((*n, None)));
                    predicate = inner;
                }
                WhereExpr::LimitOffset(inner, n, offset) => {
                    limit = limit.or(Some((*n, Some(*offset))));
                    predicate = inner;
                }
                _ => break,
            }
        }
        if *predicate != WhereExpr::AllEntries {
            out.push_str(" WHERE ");
            let mut context = context.switch_fragment(Fragment::SqlWhere);
            self.write_condition(&mut context.current, out, info, predicate, params)?;
        }
        if !order_by.is_empty() {
            let keys: Vec<_> = order_by.into_iter().rev().flatten().collect();
            let mut context = context.switch_fragment(Fragment::SqlOrderBy);
            self.write_order_by(&mut context.current, out, info, &keys)?;
        }
        if let Some((n, offset)) = limit {
            let mut context = context.switch_fragment(Fragment::SqlLimit);
            let as_param = |v: u64| {
                i64::try_from(v)
                    .map(DbValue::Int64)
                    .map_err(|_| Error::mapping(format!("Limit {v} is out of range")))
            };
            out.push_str(" LIMIT ");
            self.write_placeholder(&mut context.current, out);
            params.push(as_param(n)?);
            if let Some(offset) = offset {
                out.push_str(" OFFSET ");
                self.write_placeholder(&mut context.current, out);
                params.push(as_param(offset)?);
            }
        }
        Ok(())
    }

    /// Compile a where expression on its own, placeholder numbering starts from one.
    fn compile_where(&self, info: &TypeInfo, value: &WhereExpr) -> Result<CompiledWhere> {
        let mut context = Context::new(Fragment::SqlWhere);
        let mut sql = String::with_capacity(64);
        let mut params = Vec::new();
        self.write_where(&mut context, &mut sql, info, value, &mut params)?;
        Ok(CompiledWhere {
            sql: sql.trim_start().to_string(),
            params,
        })
    }

    fn write_transaction_begin(&self, out: &mut String) {
        out.push_str("BEGIN");
    }

    fn write_transaction_commit(&self, out: &mut String) {
        out.push_str("COMMIT");
    }

    fn write_transaction_rollback(&self, out: &mut String) {
        out.push_str("ROLLBACK");
    }

    /// `CREATE TABLE` with one line per column.
    fn sql_create_table(&self, info: &TypeInfo, if_not_exists: bool) -> String {
        let mut context = Context::new(Fragment::SqlCreateTable);
        let mut out = String::with_capacity(64 + info.fields.len() * 32);
        out.push_str("CREATE TABLE ");
        if if_not_exists {
            out.push_str("IF NOT EXISTS ");
        }
        self.write_table(&mut context, &mut out, info);
        out.push_str(" (\n");
        separated_by(
            &mut out,
            0..info.fields.len(),
            |out, i| self.write_create_table_column(&mut context, out, info, i),
            ",\n",
        );
        out.push_str("\n)");
        out
    }

    fn sql_drop_table(&self, info: &TypeInfo, if_exists: bool) -> String {
        let mut context = Context::new(Fragment::SqlDropTable);
        let mut out = String::with_capacity(32 + info.table_name.len());
        out.push_str("DROP TABLE ");
        if if_exists {
            out.push_str("IF EXISTS ");
        }
        self.write_table(&mut context, &mut out, info);
        out
    }

    /// Render `INSERT INTO t (...) VALUES (...)` for the given fields.
    fn write_insert<'a>(
        &self,
        context: &mut Context,
        out: &mut String,
        info: &TypeInfo,
        fields: &mut dyn Iterator<Item = (usize, &'a FieldDescriptor)>,
        slots: &mut Vec<Slot>,
    ) {
        out.push_str("INSERT INTO ");
        self.write_table(context, out, info);
        let fields: Vec<_> = fields.collect();
        if fields.is_empty() {
            out.push_str(" DEFAULT VALUES");
            return;
        }
        out.push_str(" (");
        separated_by(
            out,
            &fields,
            |out, (_, f)| self.write_identifier(context, out, &f.column_name),
            ", ",
        );
        out.push_str(") VALUES (");
        let mut context = context.switch_fragment(Fragment::SqlInsertIntoValues);
        separated_by(
            out,
            &fields,
            |out, (i, _)| {
                self.write_placeholder(&mut context.current, out);
                slots.push(Slot::Field(*i));
            },
            ", ",
        );
        out.push(')');
    }

    /// Insert the fields written by the application, the auto incremented identifier is omitted.
    fn sql_insert(&self, info: &TypeInfo) -> Statement {
        let mut context = Context::new(Fragment::SqlInsertInto);
        let mut result = Statement::default();
        self.write_insert(
            &mut context,
            &mut result.sql,
            info,
            &mut info.insert_fields(),
            &mut result.slots,
        );
        result
    }

    /// Insert returning the identifier assigned by the backend.
    fn sql_insert_returning(&self, info: &TypeInfo) -> Statement {
        let mut result = self.sql_insert(info);
        let mut context = Context::new(Fragment::SqlInsertInto);
        result.sql.push_str(" RETURNING ");
        self.write_identifier(&mut context, &mut result.sql, &info.id_field().column_name);
        result
    }

    /// Insert every field, updating the other columns when the identifier already exists.
    fn sql_upsert(&self, info: &TypeInfo) -> Statement {
        let mut context = Context::new(Fragment::SqlInsertInto);
        let mut result = Statement::default();
        let out = &mut result.sql;
        self.write_insert(
            &mut context,
            out,
            info,
            &mut info.fields.iter().enumerate(),
            &mut result.slots,
        );
        let mut context = context.switch_fragment(Fragment::SqlInsertIntoOnConflict);
        out.push_str(" ON CONFLICT (");
        self.write_identifier(&mut context.current, out, &info.id_field().column_name);
        out.push(')');
        if info.value_fields().next().is_none() {
            out.push_str(" DO NOTHING");
            return result;
        }
        out.push_str(" DO UPDATE SET ");
        separated_by(
            out,
            info.value_fields(),
            |out, (_, f)| {
                self.write_identifier(&mut context.current, out, &f.column_name);
                out.push_str(" = EXCLUDED.");
                self.write_identifier(&mut context.current, out, &f.column_name);
            },
            ", ",
        );
        result
    }

    /// `UPDATE` of every column except the identifier, `None` when there is nothing to set.
    fn sql_update(&self, info: &TypeInfo) -> Option<Statement> {
        if info.value_fields().next().is_none() {
            return None;
        }
        let mut context = Context::new(Fragment::SqlUpdateSet);
        let mut result = Statement::default();
        let out = &mut result.sql;
        out.push_str("UPDATE ");
        self.write_table(&mut context, out, info);
        out.push_str(" SET ");
        separated_by(
            out,
            info.value_fields(),
            |out, (i, f)| {
                self.write_identifier(&mut context, out, &f.column_name);
                out.push_str(" = ");
                self.write_placeholder(&mut context, out);
                result.slots.push(Slot::Field(i));
            },
            ", ",
        );
        self.write_key_condition(&mut context, out, info, &mut result.slots);
        Some(result)
    }

    /// ` WHERE <id> = ?`
    fn write_key_condition(
        &self,
        context: &mut Context,
        out: &mut String,
        info: &TypeInfo,
        slots: &mut Vec<Slot>,
    ) {
        let mut context = context.switch_fragment(Fragment::SqlWhere);
        out.push_str(" WHERE ");
        self.write_identifier(&mut context.current, out, &info.id_field().column_name);
        out.push_str(" = ");
        self.write_placeholder(&mut context.current, out);
        slots.push(Slot::Key);
    }

    fn write_select_columns(&self, context: &mut Context, out: &mut String, info: &TypeInfo) {
        out.push_str("SELECT ");
        separated_by(
            out,
            info.columns(),
            |out, c| self.write_identifier(context, out, c),
            ", ",
        );
        out.push_str(" FROM ");
        self.write_table(context, out, info);
    }

    fn sql_select_all(&self, info: &TypeInfo) -> Statement {
        let mut context = Context::new(Fragment::SqlSelect);
        let mut result = Statement::default();
        self.write_select_columns(&mut context, &mut result.sql, info);
        result
    }

    fn sql_select_by_id(&self, info: &TypeInfo) -> Statement {
        let mut context = Context::new(Fragment::SqlSelect);
        let mut result = Statement::default();
        self.write_select_columns(&mut context, &mut result.sql, info);
        self.write_key_condition(&mut context, &mut result.sql, info, &mut result.slots);
        result
    }

    /// Select the rows matching `condition`, modifiers included.
    fn sql_select(&self, info: &TypeInfo, condition: &WhereExpr) -> Result<Statement> {
        let mut context = Context::new(Fragment::SqlSelect);
        let mut result = Statement::default();
        self.write_select_columns(&mut context, &mut result.sql, info);
        self.write_where(
            &mut context,
            &mut result.sql,
            info,
            condition,
            &mut result.params,
        )?;
        result.slots = (0..result.params.len()).map(Slot::Param).collect();
        Ok(result)
    }

    /// Count the rows matching the predicate, `ORDER BY` and `LIMIT` do not apply.
    fn sql_count(&self, info: &TypeInfo, condition: &WhereExpr) -> Result<Statement> {
        let mut context = Context::new(Fragment::SqlSelect);
        let mut result = Statement::default();
        result.sql.push_str("SELECT COUNT(*) FROM ");
        self.write_table(&mut context, &mut result.sql, info);
        self.write_where(
            &mut context,
            &mut result.sql,
            info,
            condition.predicate(),
            &mut result.params,
        )?;
        result.slots = (0..result.params.len()).map(Slot::Param).collect();
        Ok(result)
    }

    /// Existence probe on the identifier.
    fn sql_count_by_id(&self, info: &TypeInfo) -> Statement {
        let mut context = Context::new(Fragment::SqlSelect);
        let mut result = Statement::default();
        result.sql.push_str("SELECT COUNT(*) FROM ");
        self.write_table(&mut context, &mut result.sql, info);
        self.write_key_condition(&mut context, &mut result.sql, info, &mut result.slots);
        result
    }

    fn sql_delete(&self, info: &TypeInfo) -> Statement {
        let mut context = Context::new(Fragment::SqlDeleteFrom);
        let mut result = Statement::default();
        result.sql.push_str("DELETE FROM ");
        self.write_table(&mut context, &mut result.sql, info);
        self.write_key_condition(&mut context, &mut result.sql, info, &mut result.slots);
        result
    }

    fn sql_delete_where(&self, info: &TypeInfo, condition: &WhereExpr) -> Result<Statement> {
        if condition.is_modifier() {
            return Err(Error::mapping(
                "ORDER BY and LIMIT modifiers are not supported when deleting",
            ));
        }
        let mut context = Context::new(Fragment::SqlDeleteFrom);
        let mut result = Statement::default();
        result.sql.push_str("DELETE FROM ");
        self.write_table(&mut context, &mut result.sql, info);
        self.write_where(
            &mut context,
            &mut result.sql,
            info,
            condition,
            &mut result.params,
        )?;
        result.slots = (0..result.params.len()).map(Slot::Param).collect();
        Ok(result)
    }
}

/// Fallback writer, closest to PostgreSQL conventions but with `?` placeholders.
#[derive(Default, Debug, Clone, Copy)]
pub struct GenericSqlWriter;

impl GenericSqlWriter {
    pub fn new() -> Self {
        Self {}
    }
}

impl SqlWriter for GenericSqlWriter {
    fn as_dyn(&self) -> &dyn SqlWriter {
        self
    }
}

/// Writer using the numbered placeholders `$1`, `$2`, ... of PostgreSQL.
#[derive(Default, Debug, Clone, Copy)]
pub struct NumberedSqlWriter;

impl SqlWriter for NumberedSqlWriter {
    fn as_dyn(&self) -> &dyn SqlWriter {
        self
    }

    fn write_placeholder(&self, context: &mut Context, out: &mut String) {
        context.counter += 1;
        let _ = write!(out, "${}", context.counter);
    }
}
