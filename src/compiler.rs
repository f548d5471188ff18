use log::trace;

use crate::ast::{ComparisonOp, Expr, Operand};
use crate::data_type::DataType;
use crate::error::{Error, Result};
use crate::parser::Parser;
use crate::predicate::{CompareOp, Predicate};
use crate::registry::TypeRegistry;
use crate::table::Schema;
use crate::value::Value;

/// Lowers filter-language text into a [Predicate] bound to one schema.
///
/// Column references, operator/kind combinations and literal parsing are all resolved
/// here, so a compiled predicate never fails on those grounds at scan time.
pub struct QueryCompiler<'a> {
    schema: Schema,
    registry: &'a TypeRegistry,
}

impl<'a> QueryCompiler<'a> {
    pub fn new(schema: Schema, registry: &'a TypeRegistry) -> Self {
        Self { schema, registry }
    }

    /// Parses and compiles `text`.
    ///
    /// # Errors
    /// Returns a compile error for malformed text, unknown columns, operators not defined
    /// for the column's kind, or literals that do not parse as the column's kind.
    pub fn compile(&self, text: &str) -> Result<Predicate> {
        let expr = Parser::parse_str(text)?;
        let predicate = self.lower(&expr)?;
        trace!("compiled {text:?} into {predicate:?}");
        Ok(predicate)
    }

    /// Lowers a parsed expression.
    pub fn lower(&self, expr: &Expr) -> Result<Predicate> {
        match expr {
            Expr::And { left, right } => {
                Ok(Predicate::and(vec![self.lower(left)?, self.lower(right)?]))
            }
            Expr::Or { left, right } => {
                Ok(Predicate::or(vec![self.lower(left)?, self.lower(right)?]))
            }
            Expr::Comparison {
                left,
                op,
                right,
                position,
            } => self.lower_comparison(left, *op, right, *position),
        }
    }

    fn lower_comparison(
        &self,
        left: &Operand,
        op: ComparisonOp,
        right: &Operand,
        position: usize,
    ) -> Result<Predicate> {
        // The left operand names the column; `5 < age` is accepted as `age > 5`.
        let (column, op, literal) = if self.schema.position(&left.text).is_some() {
            (left, op, right)
        } else if self.schema.position(&right.text).is_some() {
            let mirrored = op.mirrored().ok_or_else(|| {
                Error::compile(
                    "'~=' needs the column on its left",
                    op.symbol(),
                    position,
                )
            })?;
            (right, mirrored, left)
        } else {
            return Err(Error::compile(
                format!("no column named {:?}", left.text),
                left.text.clone(),
                left.position,
            ));
        };

        let kind = self
            .schema
            .data_type(&column.text)
            .ok_or_else(|| Error::ColumnNotFound(column.text.clone()))?;
        let name = column.text.as_str();

        match kind {
            DataType::Bool | DataType::Char => {
                let value = self.parse_literal(kind, literal)?;
                match op {
                    ComparisonOp::Eq => Ok(Predicate::equals(name, value)),
                    ComparisonOp::NotEq => Ok(Predicate::not_equals(name, value)),
                    _ => Err(unsupported(op, kind, position)),
                }
            }
            DataType::Text => match op {
                ComparisonOp::Eq => Ok(Predicate::equals(name, literal.text.as_str())),
                ComparisonOp::NotEq => Ok(Predicate::not_equals(name, literal.text.as_str())),
                ComparisonOp::Match => Predicate::matches(name, &literal.text).map_err(|e| {
                    Error::compile(
                        format!("invalid regular expression: {e}"),
                        literal.text.clone(),
                        literal.position,
                    )
                }),
                _ => Err(unsupported(op, kind, position)),
            },
            DataType::Byte
            | DataType::Short
            | DataType::Int
            | DataType::Long
            | DataType::Float
            | DataType::Double => {
                let value = self.parse_numeric_literal(kind, literal)?;
                self.ordered(name, op, value, kind, position)
            }
            DataType::Date | DataType::DateTime => {
                let value = self.parse_literal(kind, literal)?;
                self.ordered(name, op, value, kind, position)
            }
        }
    }

    fn ordered(
        &self,
        column: &str,
        op: ComparisonOp,
        value: Value,
        kind: DataType,
        position: usize,
    ) -> Result<Predicate> {
        let op = match op {
            ComparisonOp::Eq => CompareOp::Eq,
            ComparisonOp::NotEq => CompareOp::Neq,
            ComparisonOp::Gt => CompareOp::Gt,
            ComparisonOp::GtEq => CompareOp::Gte,
            ComparisonOp::Lt => CompareOp::Lt,
            ComparisonOp::LtEq => CompareOp::Lte,
            ComparisonOp::Match => return Err(unsupported(op, kind, position)),
        };
        Ok(Predicate::Compare {
            column: column.to_string(),
            op,
            value,
        })
    }

    fn parse_literal(&self, kind: DataType, literal: &Operand) -> Result<Value> {
        self.registry
            .parse_literal(kind, &literal.text)
            .map_err(|_| invalid_literal(kind, literal))
    }

    /// Maps a numeric literal to the smallest kind that holds it, then checks that this
    /// kind widens to the column's kind. `300` against a byte column is rejected rather
    /// than truncated; `1.5` against an int column is rejected rather than rounded.
    fn parse_numeric_literal(&self, kind: DataType, literal: &Operand) -> Result<Value> {
        let literal_kind = self
            .registry
            .narrowest_numeric_kind(&literal.text)
            .ok_or_else(|| invalid_literal(kind, literal))?;
        if !literal_kind.widens_to(kind) {
            return Err(Error::compile(
                format!("literal needs a {literal_kind} and does not fit a {kind} column"),
                literal.text.clone(),
                literal.position,
            ));
        }
        self.parse_literal(kind, literal)
    }
}

fn unsupported(op: ComparisonOp, kind: DataType, position: usize) -> Error {
    Error::compile(
        format!("operator {} is not defined for {kind} columns", op.symbol()),
        op.symbol(),
        position,
    )
}

fn invalid_literal(kind: DataType, literal: &Operand) -> Error {
    Error::compile(
        format!("literal is not a valid {kind}"),
        literal.text.clone(),
        literal.position,
    )
}
