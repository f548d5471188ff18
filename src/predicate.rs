use std::cmp::Ordering;

use chrono::Datelike;
use regex::Regex;

use crate::data_type::DataType;
use crate::error::{Error, Result};
use crate::table::Table;
use crate::value::Value;

/// Ordering comparators of the compare family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Gt,
    Gte,
    Lt,
    Lte,
    Eq,
    Neq,
}

impl CompareOp {
    fn holds(self, ord: Ordering) -> bool {
        match self {
            Self::Gt => ord == Ordering::Greater,
            Self::Gte => ord != Ordering::Less,
            Self::Lt => ord == Ordering::Less,
            Self::Lte => ord != Ordering::Greater,
            Self::Eq => ord == Ordering::Equal,
            Self::Neq => ord != Ordering::Equal,
        }
    }
}

/// Tests over date and date-time columns.
#[derive(Debug, Clone, PartialEq)]
pub enum TemporalTest {
    /// Month number, 1 to 12.
    InMonth(u32),
    InYear(i32),
    Before(Value),
    After(Value),
    /// Inclusive on both ends.
    Between(Value, Value),
}

/// Tests over string columns.
#[derive(Debug, Clone)]
pub enum TextTest {
    StartsWith(String),
    EndsWith(String),
    Contains(String),
    /// Unanchored regular-expression search.
    Matches(Regex),
}

/// A boolean test over one row of a table.
///
/// Leaf predicates are bound to one column by name; [Predicate::And], [Predicate::Or] and
/// [Predicate::Not] combine them. A leaf evaluated on a missing cell is `false`.
///
/// ```
/// # use colframe::{Column, DataType, Predicate, Table};
/// let ages = Column::from_values("age", DataType::Int, [12, 40, 70]).unwrap();
/// let table = Table::from_columns("people", vec![ages]).unwrap();
///
/// let adults = Predicate::and(vec![Predicate::gte("age", 18), Predicate::lt("age", 65)]);
/// assert!(!adults.evaluate(&table, 0).unwrap());
/// assert!(adults.evaluate(&table, 1).unwrap());
/// ```
#[derive(Debug, Clone)]
pub enum Predicate {
    /// Range comparison over an orderable kind.
    Compare {
        column: String,
        op: CompareOp,
        value: Value,
    },
    /// Inclusive range.
    Between {
        column: String,
        min: Value,
        max: Value,
    },
    /// Structural equality, valid for every kind.
    Equals {
        column: String,
        value: Value,
        negated: bool,
    },
    /// Set membership.
    In {
        column: String,
        values: Vec<Value>,
        negated: bool,
    },
    Temporal {
        column: String,
        test: TemporalTest,
    },
    Text {
        column: String,
        test: TextTest,
    },
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
    Not(Box<Predicate>),
}

impl Predicate {
    fn compare(column: &str, op: CompareOp, value: impl Into<Value>) -> Self {
        Self::Compare {
            column: column.to_string(),
            op,
            value: value.into(),
        }
    }

    pub fn gt(column: &str, value: impl Into<Value>) -> Self {
        Self::compare(column, CompareOp::Gt, value)
    }

    pub fn gte(column: &str, value: impl Into<Value>) -> Self {
        Self::compare(column, CompareOp::Gte, value)
    }

    pub fn lt(column: &str, value: impl Into<Value>) -> Self {
        Self::compare(column, CompareOp::Lt, value)
    }

    pub fn lte(column: &str, value: impl Into<Value>) -> Self {
        Self::compare(column, CompareOp::Lte, value)
    }

    /// Ordered equality; use [Predicate::equals] for non-orderable kinds.
    pub fn eq(column: &str, value: impl Into<Value>) -> Self {
        Self::compare(column, CompareOp::Eq, value)
    }

    pub fn neq(column: &str, value: impl Into<Value>) -> Self {
        Self::compare(column, CompareOp::Neq, value)
    }

    pub fn between(column: &str, min: impl Into<Value>, max: impl Into<Value>) -> Self {
        Self::Between {
            column: column.to_string(),
            min: min.into(),
            max: max.into(),
        }
    }

    pub fn equals(column: &str, value: impl Into<Value>) -> Self {
        Self::Equals {
            column: column.to_string(),
            value: value.into(),
            negated: false,
        }
    }

    pub fn not_equals(column: &str, value: impl Into<Value>) -> Self {
        Self::Equals {
            column: column.to_string(),
            value: value.into(),
            negated: true,
        }
    }

    pub fn is_in<I>(column: &str, values: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        Self::In {
            column: column.to_string(),
            values: values.into_iter().map(Into::into).collect(),
            negated: false,
        }
    }

    pub fn not_in<I>(column: &str, values: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        Self::In {
            column: column.to_string(),
            values: values.into_iter().map(Into::into).collect(),
            negated: true,
        }
    }

    fn temporal(column: &str, test: TemporalTest) -> Self {
        Self::Temporal {
            column: column.to_string(),
            test,
        }
    }

    pub fn is_in_month(column: &str, month: u32) -> Self {
        Self::temporal(column, TemporalTest::InMonth(month))
    }

    pub fn is_in_year(column: &str, year: i32) -> Self {
        Self::temporal(column, TemporalTest::InYear(year))
    }

    pub fn is_before(column: &str, value: impl Into<Value>) -> Self {
        Self::temporal(column, TemporalTest::Before(value.into()))
    }

    pub fn is_after(column: &str, value: impl Into<Value>) -> Self {
        Self::temporal(column, TemporalTest::After(value.into()))
    }

    pub fn is_between(column: &str, start: impl Into<Value>, end: impl Into<Value>) -> Self {
        Self::temporal(column, TemporalTest::Between(start.into(), end.into()))
    }

    fn text(column: &str, test: TextTest) -> Self {
        Self::Text {
            column: column.to_string(),
            test,
        }
    }

    pub fn starts_with(column: &str, prefix: &str) -> Self {
        Self::text(column, TextTest::StartsWith(prefix.to_string()))
    }

    pub fn ends_with(column: &str, suffix: &str) -> Self {
        Self::text(column, TextTest::EndsWith(suffix.to_string()))
    }

    pub fn contains(column: &str, needle: &str) -> Self {
        Self::text(column, TextTest::Contains(needle.to_string()))
    }

    /// # Errors
    /// Returns an error if `pattern` is not a valid regular expression.
    pub fn matches(column: &str, pattern: &str) -> Result<Self> {
        Ok(Self::text(column, TextTest::Matches(Regex::new(pattern)?)))
    }

    /// Conjunction; an empty list is vacuously true.
    pub fn and(predicates: Vec<Predicate>) -> Self {
        Self::And(predicates)
    }

    /// Disjunction; an empty list is vacuously false.
    pub fn or(predicates: Vec<Predicate>) -> Self {
        Self::Or(predicates)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(predicate: Predicate) -> Self {
        Self::Not(Box::new(predicate))
    }

    /// Validates the predicate against `table`'s schema: every referenced column must
    /// exist, and every literal must be comparable with its column's kind.
    ///
    /// # Errors
    /// Returns a schema error for a missing column, or a type error for a kind mismatch.
    pub fn check(&self, table: &Table) -> Result<()> {
        match self {
            Self::And(children) | Self::Or(children) => {
                children.iter().try_for_each(|p| p.check(table))
            }
            Self::Not(inner) => inner.check(table),
            Self::Compare { column, value, .. } => {
                let kind = table.column(column)?.data_type();
                require(kind.is_orderable(), column, kind, "ordered comparison")?;
                require_literal(column, kind, value)
            }
            Self::Between { column, min, max } => {
                let kind = table.column(column)?.data_type();
                require(kind.is_orderable(), column, kind, "between")?;
                require_literal(column, kind, min)?;
                require_literal(column, kind, max)
            }
            Self::Equals { column, value, .. } => {
                let kind = table.column(column)?.data_type();
                require_literal(column, kind, value)
            }
            Self::In { column, values, .. } => {
                let kind = table.column(column)?.data_type();
                values
                    .iter()
                    .try_for_each(|value| require_literal(column, kind, value))
            }
            Self::Temporal { column, test } => {
                let kind = table.column(column)?.data_type();
                require(kind.is_temporal(), column, kind, "temporal test")?;
                match test {
                    TemporalTest::InMonth(month) if !(1..=12).contains(month) => Err(
                        Error::type_mismatch(format!("{month} is not a month number")),
                    ),
                    TemporalTest::InMonth(_) | TemporalTest::InYear(_) => Ok(()),
                    TemporalTest::Before(value) | TemporalTest::After(value) => {
                        require_temporal_literal(column, value)
                    }
                    TemporalTest::Between(start, end) => {
                        require_temporal_literal(column, start)?;
                        require_temporal_literal(column, end)
                    }
                }
            }
            Self::Text { column, .. } => {
                let kind = table.column(column)?.data_type();
                require(kind == DataType::Text, column, kind, "string test")
            }
        }
    }

    /// Evaluates the predicate on row `row_idx` of `table`.
    ///
    /// Logical combinators short-circuit from left to right.
    ///
    /// # Errors
    /// Fails with a schema or type error instead of silently returning `false`.
    pub fn evaluate(&self, table: &Table, row_idx: usize) -> Result<bool> {
        match self {
            Self::And(children) => {
                for child in children {
                    if !child.evaluate(table, row_idx)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Self::Or(children) => {
                for child in children {
                    if child.evaluate(table, row_idx)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            Self::Not(inner) => Ok(!inner.evaluate(table, row_idx)?),
            Self::Compare { column, op, value } => {
                let Some(cell) = cell(table, column, row_idx)? else {
                    return Ok(false);
                };
                Ok(op.holds(range_ordering(column, &cell, value)?))
            }
            Self::Between { column, min, max } => {
                let Some(cell) = cell(table, column, row_idx)? else {
                    return Ok(false);
                };
                Ok(range_ordering(column, &cell, min)? != Ordering::Less
                    && range_ordering(column, &cell, max)? != Ordering::Greater)
            }
            Self::Equals {
                column,
                value,
                negated,
            } => {
                let Some(cell) = cell(table, column, row_idx)? else {
                    return Ok(false);
                };
                let equal = ordering(column, &cell, value)? == Ordering::Equal;
                Ok(equal != *negated)
            }
            Self::In {
                column,
                values,
                negated,
            } => {
                let Some(cell) = cell(table, column, row_idx)? else {
                    return Ok(false);
                };
                let mut found = false;
                for value in values {
                    if ordering(column, &cell, value)? == Ordering::Equal {
                        found = true;
                        break;
                    }
                }
                Ok(found != *negated)
            }
            Self::Temporal { column, test } => {
                let Some(cell) = cell(table, column, row_idx)? else {
                    return Ok(false);
                };
                let Some(moment) = cell.as_date_time() else {
                    return Err(kind_error(column, &cell, "temporal test"));
                };
                match test {
                    TemporalTest::InMonth(month) => Ok(moment.month() == *month),
                    TemporalTest::InYear(year) => Ok(moment.year() == *year),
                    TemporalTest::Before(value) => {
                        Ok(ordering(column, &cell, value)? == Ordering::Less)
                    }
                    TemporalTest::After(value) => {
                        Ok(ordering(column, &cell, value)? == Ordering::Greater)
                    }
                    TemporalTest::Between(start, end) => {
                        Ok(ordering(column, &cell, start)? != Ordering::Less
                            && ordering(column, &cell, end)? != Ordering::Greater)
                    }
                }
            }
            Self::Text { column, test } => {
                let Some(cell) = cell(table, column, row_idx)? else {
                    return Ok(false);
                };
                let Some(text) = cell.as_str() else {
                    return Err(kind_error(column, &cell, "string test"));
                };
                Ok(match test {
                    TextTest::StartsWith(prefix) => text.starts_with(prefix.as_str()),
                    TextTest::EndsWith(suffix) => text.ends_with(suffix.as_str()),
                    TextTest::Contains(needle) => text.contains(needle.as_str()),
                    TextTest::Matches(regex) => regex.is_match(text),
                })
            }
        }
    }
}

/// Fetches a cell, `None` when it is missing.
fn cell(table: &Table, column: &str, row_idx: usize) -> Result<Option<Value>> {
    let column = table.column(column)?;
    let value = column.get(row_idx).ok_or(Error::IndexOutOfBounds {
        index: row_idx,
        len: column.len(),
    })?;
    Ok((!value.is_null()).then_some(value))
}

/// Orders a non-null cell against a literal, failing on incomparable kinds.
fn ordering(column: &str, cell: &Value, literal: &Value) -> Result<Ordering> {
    if literal.is_null() {
        return Err(Error::type_mismatch(format!(
            "cannot compare column {column:?} with a missing value"
        )));
    }
    cell.compare(literal).ok_or_else(|| {
        Error::type_mismatch(format!(
            "cannot compare column {column:?} value {cell:?} with {literal:?}"
        ))
    })
}

/// Like [ordering], for range tests: the cell's kind must have a natural order.
fn range_ordering(column: &str, cell: &Value, literal: &Value) -> Result<Ordering> {
    match cell.data_type() {
        Some(kind) if kind.is_orderable() => ordering(column, cell, literal),
        _ => Err(kind_error(column, cell, "ordered comparison")),
    }
}

fn kind_error(column: &str, cell: &Value, what: &str) -> Error {
    Error::type_mismatch(format!(
        "{what} is not defined for column {column:?} holding {:?}",
        cell.data_type()
    ))
}

fn require(ok: bool, column: &str, kind: DataType, what: &str) -> Result<()> {
    if ok {
        Ok(())
    } else {
        Err(Error::type_mismatch(format!(
            "{what} is not defined for {kind} column {column:?}"
        )))
    }
}

/// A literal is acceptable when it widens to the column kind, or when both sides are
/// numeric (mixed-width numeric comparison is exact).
fn require_literal(column: &str, kind: DataType, literal: &Value) -> Result<()> {
    let Some(literal_kind) = literal.data_type() else {
        return Err(Error::type_mismatch(format!(
            "cannot compare column {column:?} with a missing value"
        )));
    };
    let comparable = literal_kind.widens_to(kind)
        || (literal_kind.is_numeric() && kind.is_numeric())
        || (literal_kind.is_temporal() && kind.is_temporal());
    if comparable {
        Ok(())
    } else {
        Err(Error::type_mismatch(format!(
            "cannot compare {kind} column {column:?} with {literal_kind} value {literal}"
        )))
    }
}

fn require_temporal_literal(column: &str, literal: &Value) -> Result<()> {
    match literal.data_type() {
        Some(kind) if kind.is_temporal() => Ok(()),
        _ => Err(Error::type_mismatch(format!(
            "temporal test on column {column:?} needs a date or date-time, got {literal:?}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::Column;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sample() -> Table {
        Table::from_columns(
            "sample",
            vec![
                Column::from_values("age", DataType::Int, [Some(10), Some(25), None, Some(40)])
                    .unwrap(),
                Column::from_values(
                    "name",
                    DataType::Text,
                    [Some("alice"), Some("bob"), Some("carol"), None],
                )
                .unwrap(),
                Column::from_values("active", DataType::Bool, [true, false, true, true]).unwrap(),
                Column::from_values(
                    "joined",
                    DataType::Date,
                    [date(2020, 1, 15), date(2021, 6, 1), date(2021, 12, 31), date(2022, 6, 5)],
                )
                .unwrap(),
                Column::from_values("grade", DataType::Char, ['a', 'b', 'a', 'c']).unwrap(),
            ],
        )
        .unwrap()
    }

    fn matching(table: &Table, predicate: &Predicate) -> Vec<usize> {
        predicate.check(table).unwrap();
        (0..table.row_count())
            .filter(|i| predicate.evaluate(table, *i).unwrap())
            .collect()
    }

    // ─────────────────────────────────────────────────────────────
    // Test 1 : compare family
    // ─────────────────────────────────────────────────────────────
    #[test]
    fn test_compare() {
        let t = sample();
        assert_eq!(matching(&t, &Predicate::gt("age", 10)), vec![1, 3]);
        assert_eq!(matching(&t, &Predicate::gte("age", 10)), vec![0, 1, 3]);
        assert_eq!(matching(&t, &Predicate::lt("age", 25)), vec![0]);
        assert_eq!(matching(&t, &Predicate::lte("age", 25)), vec![0, 1]);
        assert_eq!(matching(&t, &Predicate::eq("age", 40i64)), vec![3]);
        assert_eq!(matching(&t, &Predicate::neq("age", 40)), vec![0, 1]);
        assert_eq!(matching(&t, &Predicate::between("age", 10, 25)), vec![0, 1]);
        assert_eq!(matching(&t, &Predicate::gt("age", 24.5)), vec![1, 3]);
    }

    // ─────────────────────────────────────────────────────────────
    // Test 2 : equality and membership
    // ─────────────────────────────────────────────────────────────
    #[test]
    fn test_equality_and_membership() {
        let t = sample();
        assert_eq!(matching(&t, &Predicate::equals("active", true)), vec![0, 2, 3]);
        assert_eq!(matching(&t, &Predicate::not_equals("grade", 'a')), vec![1, 3]);
        assert_eq!(matching(&t, &Predicate::is_in("name", ["bob", "carol"])), vec![1, 2]);
        assert_eq!(matching(&t, &Predicate::not_in("age", [10, 40])), vec![1]);
    }

    // ─────────────────────────────────────────────────────────────
    // Test 3 : temporal family
    // ─────────────────────────────────────────────────────────────
    #[test]
    fn test_temporal() {
        let t = sample();
        assert_eq!(matching(&t, &Predicate::is_in_month("joined", 6)), vec![1, 3]);
        assert_eq!(matching(&t, &Predicate::is_in_year("joined", 2021)), vec![1, 2]);
        assert_eq!(
            matching(&t, &Predicate::is_before("joined", date(2021, 6, 1))),
            vec![0]
        );
        assert_eq!(
            matching(&t, &Predicate::is_after("joined", date(2021, 6, 1))),
            vec![2, 3]
        );
        assert_eq!(
            matching(
                &t,
                &Predicate::is_between("joined", date(2021, 6, 1), date(2021, 12, 31))
            ),
            vec![1, 2]
        );
    }

    // ─────────────────────────────────────────────────────────────
    // Test 4 : string family
    // ─────────────────────────────────────────────────────────────
    #[test]
    fn test_text() {
        let t = sample();
        assert_eq!(matching(&t, &Predicate::starts_with("name", "ca")), vec![2]);
        assert_eq!(matching(&t, &Predicate::ends_with("name", "b")), vec![1]);
        assert_eq!(matching(&t, &Predicate::contains("name", "l")), vec![0, 2]);
        let re = Predicate::matches("name", "^[ab]").unwrap();
        assert_eq!(matching(&t, &re), vec![0, 1]);
        assert!(matches!(Predicate::matches("name", "("), Err(Error::Regex(_))));
    }

    // ─────────────────────────────────────────────────────────────
    // Test 5 : logical combinators
    // ─────────────────────────────────────────────────────────────
    #[test]
    fn test_logical() {
        let t = sample();
        assert_eq!(matching(&t, &Predicate::and(vec![])), vec![0, 1, 2, 3]);
        assert!(matching(&t, &Predicate::or(vec![])).is_empty());

        let p = Predicate::or(vec![
            Predicate::equals("grade", 'c'),
            Predicate::and(vec![Predicate::equals("active", true), Predicate::lt("age", 20)]),
        ]);
        assert_eq!(matching(&t, &p), vec![0, 3]);

        // Missing cells fail the leaf, so NOT selects them.
        assert_eq!(matching(&t, &Predicate::not(Predicate::gt("age", 20))), vec![0, 2]);
    }

    // ─────────────────────────────────────────────────────────────
    // Test 6 : short-circuit evaluation skips failing branches
    // ─────────────────────────────────────────────────────────────
    #[test]
    fn test_short_circuit() {
        let t = sample();
        let broken = Predicate::gt("name", 5);
        let p = Predicate::or(vec![Predicate::and(vec![]), broken.clone()]);
        assert!(p.evaluate(&t, 0).unwrap());
        let q = Predicate::and(vec![Predicate::or(vec![]), broken]);
        assert!(!q.evaluate(&t, 0).unwrap());
    }

    // ─────────────────────────────────────────────────────────────
    // Test 7 : mismatched kinds are errors, never silent false
    // ─────────────────────────────────────────────────────────────
    #[test]
    fn test_type_errors() {
        let t = sample();
        let cases = vec![
            Predicate::gt("name", 5),
            Predicate::gt("active", true),
            Predicate::equals("age", "ten"),
            Predicate::is_in_year("age", 2020),
            Predicate::starts_with("age", "1"),
            Predicate::is_in_month("joined", 13),
            Predicate::is_before("joined", 5),
        ];
        for p in cases {
            assert!(matches!(p.check(&t), Err(Error::TypeMismatch(_))), "{p:?}");
        }
        assert!(matches!(
            Predicate::gt("name", 5).evaluate(&t, 0),
            Err(Error::TypeMismatch(_))
        ));
        assert!(matches!(
            Predicate::gt("missing", 5).check(&t),
            Err(Error::ColumnNotFound(_))
        ));
    }

    #[test]
    fn test_range_on_boolean_fails_without_check() {
        let t = sample();
        for p in [
            Predicate::gt("active", false),
            Predicate::lte("active", true),
            Predicate::between("active", false, true),
        ] {
            for row in 0..t.row_count() {
                assert!(matches!(p.evaluate(&t, row), Err(Error::TypeMismatch(_))), "{p:?}");
            }
        }
        // Equality stays defined on booleans.
        assert!(Predicate::equals("active", true).evaluate(&t, 0).unwrap());
    }
}
