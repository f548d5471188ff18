use std::collections::HashMap;
use std::fmt;

use log::debug;

use crate::column::Column;
use crate::data_type::DataType;
use crate::error::{Error, Result};
use crate::table::Table;
use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateKind {
    /// Number of non-missing values.
    Count,
    Sum,
    Mean,
    Min,
    Max,
    /// Sample standard deviation.
    Std,
    TrueCount,
    FalseCount,
}

impl AggregateKind {
    /// Lower-case name used as the output column suffix.
    pub fn name(self) -> &'static str {
        match self {
            Self::Count => "count",
            Self::Sum => "sum",
            Self::Mean => "mean",
            Self::Min => "min",
            Self::Max => "max",
            Self::Std => "std",
            Self::TrueCount => "true_count",
            Self::FalseCount => "false_count",
        }
    }

    fn output_type(self, input: DataType) -> DataType {
        match self {
            Self::Count | Self::TrueCount | Self::FalseCount => DataType::Long,
            Self::Sum if input.is_integral() => DataType::Long,
            Self::Sum | Self::Mean | Self::Std => DataType::Double,
            Self::Min | Self::Max => input,
        }
    }

    fn check(self, column: &Column) -> Result<()> {
        let kind = column.data_type();
        let ok = match self {
            Self::Count => true,
            Self::Sum | Self::Mean | Self::Min | Self::Max | Self::Std => kind.is_numeric(),
            Self::TrueCount | Self::FalseCount => kind == DataType::Bool,
        };
        if ok {
            Ok(())
        } else {
            Err(Error::type_mismatch(format!(
                "{} is not defined for {kind} column {:?}",
                self.name(),
                column.name()
            )))
        }
    }
}

impl fmt::Display for AggregateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A column to aggregate and how. The result column is named `<column>_<kind>`.
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregation {
    pub column: String,
    pub kind: AggregateKind,
}

impl Aggregation {
    pub fn new(column: &str, kind: AggregateKind) -> Self {
        Self {
            column: column.to_string(),
            kind,
        }
    }

    pub fn output_name(&self) -> String {
        format!("{}_{}", self.column, self.kind.name())
    }
}

/// Rows sharing one key tuple.
#[derive(Debug, Clone)]
struct Partition {
    key: Vec<Value>,
    rows: Vec<usize>,
}

/// A table partitioned by a composite key, ready for [GroupedTable::aggregate].
#[derive(Debug)]
pub struct GroupedTable<'a> {
    table: &'a Table,
    keys: Vec<usize>,
    /// In first-occurrence order of their key in the source table.
    partitions: Vec<Partition>,
}

impl Table {
    /// Partitions the rows by the values of `keys`. Missing values form their own key.
    /// With no key at all the whole table is a single partition.
    ///
    /// ```
    /// # use colframe::{AggregateKind, Aggregation, Column, DataType, Table, Value};
    /// let table = Table::from_columns("sales", vec![
    ///     Column::from_values("shop", DataType::Text, ["a", "b", "a"]).unwrap(),
    ///     Column::from_values("amount", DataType::Int, [10, 5, 20]).unwrap(),
    /// ]).unwrap();
    ///
    /// let totals = table
    ///     .group_by(&["shop"]).unwrap()
    ///     .aggregate(&[Aggregation::new("amount", AggregateKind::Sum)]).unwrap();
    /// assert_eq!(totals.column_names(), vec!["shop", "amount_sum"]);
    /// assert_eq!(totals.column("amount_sum").unwrap().get(0), Some(Value::Long(30)));
    /// ```
    ///
    /// # Errors
    /// Returns a schema error if a key column does not exist.
    pub fn group_by(&self, keys: &[&str]) -> Result<GroupedTable<'_>> {
        let keys = keys
            .iter()
            .map(|name| self.column_index(name))
            .collect::<Result<Vec<_>>>()?;

        let mut partitions: Vec<Partition> = Vec::new();
        let mut lookup: HashMap<Vec<Value>, usize> = HashMap::new();
        if keys.is_empty() {
            partitions.push(Partition {
                key: Vec::new(),
                rows: (0..self.row_count()).collect(),
            });
        } else {
            for row in 0..self.row_count() {
                let key: Vec<Value> = keys
                    .iter()
                    .map(|idx| self.columns()[*idx].get(row).unwrap_or(Value::Null))
                    .collect();
                match lookup.get(&key) {
                    Some(pos) => partitions[*pos].rows.push(row),
                    None => {
                        lookup.insert(key.clone(), partitions.len());
                        partitions.push(Partition {
                            key,
                            rows: vec![row],
                        });
                    }
                }
            }
        }

        debug!(
            "group_by on {:?}: {} rows into {} partitions",
            self.name,
            self.row_count(),
            partitions.len()
        );
        Ok(GroupedTable {
            table: self,
            keys,
            partitions,
        })
    }

    /// Aggregates the whole table into a single row.
    pub fn summarize(&self, aggregations: &[Aggregation]) -> Result<Table> {
        self.group_by(&[])?.aggregate(aggregations)
    }
}

impl GroupedTable<'_> {
    /// Number of distinct key tuples.
    pub fn partition_count(&self) -> usize {
        self.partitions.len()
    }

    /// Computes one row per partition: the key columns in the order given to
    /// [Table::group_by], then one column per aggregation, in order.
    ///
    /// # Errors
    /// Returns a schema error for an unknown column or a duplicated output name, and a
    /// type error when a numeric or boolean aggregation meets the wrong kind.
    pub fn aggregate(&self, aggregations: &[Aggregation]) -> Result<Table> {
        let sources = aggregations
            .iter()
            .map(|agg| {
                let column = self.table.column(&agg.column)?;
                agg.kind.check(column)?;
                Ok(column)
            })
            .collect::<Result<Vec<_>>>()?;

        let mut columns = Vec::with_capacity(self.keys.len() + aggregations.len());
        for (pos, idx) in self.keys.iter().enumerate() {
            let source = &self.table.columns()[*idx];
            let mut column =
                Column::with_capacity(source.name(), source.data_type(), self.partitions.len());
            for partition in &self.partitions {
                column.push(partition.key[pos].clone())?;
            }
            columns.push(column);
        }

        for (agg, source) in aggregations.iter().zip(sources) {
            let mut column = Column::with_capacity(
                agg.output_name(),
                agg.kind.output_type(source.data_type()),
                self.partitions.len(),
            );
            for partition in &self.partitions {
                column.push(aggregate_rows(agg.kind, source, &partition.rows)?)?;
            }
            columns.push(column);
        }

        Table::from_columns(self.table.name.clone(), columns)
    }
}

#[allow(clippy::cast_precision_loss)]
fn aggregate_rows(kind: AggregateKind, column: &Column, rows: &[usize]) -> Result<Value> {
    let present: Vec<Value> = rows
        .iter()
        .filter_map(|row| column.get(*row))
        .filter(|value| !value.is_null())
        .collect();

    let count = |wanted: Option<bool>| -> Result<Value> {
        let n = present
            .iter()
            .filter(|v| wanted.is_none() || v.as_bool() == wanted)
            .count();
        Ok(Value::Long(i64::try_from(n).map_err(|_| {
            Error::type_mismatch("count does not fit a long")
        })?))
    };
    let numbers = || -> Vec<f64> { present.iter().filter_map(Value::as_f64).collect() };

    match kind {
        AggregateKind::Count => count(None),
        AggregateKind::TrueCount => count(Some(true)),
        AggregateKind::FalseCount => count(Some(false)),
        AggregateKind::Sum if column.data_type().is_integral() => {
            let mut total: i64 = 0;
            for value in present.iter().filter_map(Value::as_i64) {
                total = total.checked_add(value).ok_or_else(|| {
                    Error::type_mismatch(format!(
                        "sum of column {:?} overflows a long",
                        column.name()
                    ))
                })?;
            }
            Ok(Value::Long(total))
        }
        AggregateKind::Sum => Ok(Value::Double(numbers().iter().sum())),
        AggregateKind::Mean => {
            let values = numbers();
            if values.is_empty() {
                return Ok(Value::Null);
            }
            Ok(Value::Double(values.iter().sum::<f64>() / values.len() as f64))
        }
        AggregateKind::Std => {
            let values = numbers();
            if values.len() < 2 {
                return Ok(Value::Null);
            }
            let n = values.len() as f64;
            let mean = values.iter().sum::<f64>() / n;
            let squares: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
            Ok(Value::Double((squares / (n - 1.0)).sqrt()))
        }
        AggregateKind::Min => Ok(extreme(&present, std::cmp::Ordering::Less)),
        AggregateKind::Max => Ok(extreme(&present, std::cmp::Ordering::Greater)),
    }
}

/// Smallest (`Less`) or largest (`Greater`) value, keeping the source kind.
fn extreme(values: &[Value], wanted: std::cmp::Ordering) -> Value {
    let mut best: Option<&Value> = None;
    for value in values {
        best = match best {
            Some(current) if value.compare(current) != Some(wanted) => Some(current),
            _ => Some(value),
        };
    }
    best.cloned().unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sales() -> Table {
        Table::from_columns(
            "sales",
            vec![
                Column::from_values(
                    "region",
                    DataType::Text,
                    [Some("north"), Some("south"), Some("north"), None, Some("south"), None],
                )
                .unwrap(),
                Column::from_values("year", DataType::Int, [2020, 2020, 2021, 2020, 2020, 2020])
                    .unwrap(),
                Column::from_values(
                    "amount",
                    DataType::Int,
                    [Some(10), Some(4), Some(6), Some(1), None, Some(3)],
                )
                .unwrap(),
                Column::from_values("paid", DataType::Bool, [true, false, true, true, false, false])
                    .unwrap(),
            ],
        )
        .unwrap()
    }

    fn values(table: &Table, name: &str) -> Vec<Value> {
        let column = table.column(name).unwrap();
        (0..column.len()).filter_map(|i| column.get(i)).collect()
    }

    // ─────────────────────────────────────────────────────────────
    // Test 1 : partitions follow first occurrence, nulls group together
    // ─────────────────────────────────────────────────────────────
    #[test]
    fn test_group_order_and_null_partition() {
        let table = sales();
        let grouped = table.group_by(&["region"]).unwrap();
        assert_eq!(grouped.partition_count(), 3);

        let result = grouped
            .aggregate(&[Aggregation::new("amount", AggregateKind::Count)])
            .unwrap();
        assert_eq!(result.column_names(), vec!["region", "amount_count"]);
        assert_eq!(
            values(&result, "region"),
            vec![Value::from("north"), Value::from("south"), Value::Null]
        );
        assert_eq!(
            values(&result, "amount_count"),
            vec![Value::Long(2), Value::Long(1), Value::Long(2)]
        );
    }

    // ─────────────────────────────────────────────────────────────
    // Test 2 : numeric aggregations
    // ─────────────────────────────────────────────────────────────
    #[test]
    fn test_numeric_aggregations() {
        let table = sales();
        let result = table
            .group_by(&["region"])
            .unwrap()
            .aggregate(&[
                Aggregation::new("amount", AggregateKind::Sum),
                Aggregation::new("amount", AggregateKind::Mean),
                Aggregation::new("amount", AggregateKind::Min),
                Aggregation::new("amount", AggregateKind::Max),
                Aggregation::new("amount", AggregateKind::Std),
            ])
            .unwrap();

        assert_eq!(
            result.column_names(),
            vec!["region", "amount_sum", "amount_mean", "amount_min", "amount_max", "amount_std"]
        );
        assert_eq!(
            values(&result, "amount_sum"),
            vec![Value::Long(16), Value::Long(4), Value::Long(4)]
        );
        assert_eq!(
            values(&result, "amount_mean"),
            vec![Value::Double(8.0), Value::Double(4.0), Value::Double(2.0)]
        );
        assert_eq!(
            values(&result, "amount_min"),
            vec![Value::Int(6), Value::Int(4), Value::Int(1)]
        );
        assert_eq!(
            values(&result, "amount_max"),
            vec![Value::Int(10), Value::Int(4), Value::Int(3)]
        );
        let std = values(&result, "amount_std");
        assert!(matches!(std[0], Value::Double(v) if (v - 8f64.sqrt()).abs() < 1e-9));
        assert_eq!(std[1], Value::Null);
    }

    // ─────────────────────────────────────────────────────────────
    // Test 3 : composite keys and boolean counts
    // ─────────────────────────────────────────────────────────────
    #[test]
    fn test_composite_key_and_bool_counts() {
        let table = sales();
        let result = table
            .group_by(&["year", "region"])
            .unwrap()
            .aggregate(&[
                Aggregation::new("paid", AggregateKind::TrueCount),
                Aggregation::new("paid", AggregateKind::FalseCount),
            ])
            .unwrap();

        assert_eq!(
            result.column_names(),
            vec!["year", "region", "paid_true_count", "paid_false_count"]
        );
        assert_eq!(result.row_count(), 4);
        assert_eq!(
            values(&result, "paid_true_count"),
            vec![Value::Long(1), Value::Long(0), Value::Long(1), Value::Long(1)]
        );
        assert_eq!(
            values(&result, "paid_false_count"),
            vec![Value::Long(0), Value::Long(2), Value::Long(0), Value::Long(1)]
        );
    }

    // ─────────────────────────────────────────────────────────────
    // Test 4 : counts over 1000 rows add up
    // ─────────────────────────────────────────────────────────────
    #[test]
    fn test_counts_sum_to_row_count() {
        let flags: Vec<bool> = (0..1000).map(|i| i % 3 == 0).collect();
        let category: Vec<&str> = (0..1000).map(|i| if i % 7 < 3 { "x" } else { "y" }).collect();
        let table = Table::from_columns(
            "big",
            vec![
                Column::from_values("category", DataType::Text, category).unwrap(),
                Column::from_values("flag", DataType::Bool, flags).unwrap(),
            ],
        )
        .unwrap();

        let result = table
            .group_by(&["category"])
            .unwrap()
            .aggregate(&[Aggregation::new("flag", AggregateKind::Count)])
            .unwrap();
        assert_eq!(result.row_count(), 2);
        let total: i64 = values(&result, "flag_count")
            .iter()
            .filter_map(Value::as_i64)
            .sum();
        assert_eq!(total, 1000);
    }

    // ─────────────────────────────────────────────────────────────
    // Test 5 : whole-table summary
    // ─────────────────────────────────────────────────────────────
    #[test]
    fn test_summarize() {
        let result = sales()
            .summarize(&[
                Aggregation::new("amount", AggregateKind::Count),
                Aggregation::new("amount", AggregateKind::Max),
            ])
            .unwrap();
        assert_eq!(result.column_names(), vec!["amount_count", "amount_max"]);
        assert_eq!(result.row_count(), 1);
        assert_eq!(values(&result, "amount_count"), vec![Value::Long(5)]);
        assert_eq!(values(&result, "amount_max"), vec![Value::Int(10)]);
    }

    // ─────────────────────────────────────────────────────────────
    // Test 6 : kind errors
    // ─────────────────────────────────────────────────────────────
    #[test]
    fn test_aggregation_errors() {
        let table = sales();
        let grouped = table.group_by(&["year"]).unwrap();
        assert!(matches!(
            grouped.aggregate(&[Aggregation::new("region", AggregateKind::Sum)]),
            Err(Error::TypeMismatch(_))
        ));
        assert!(matches!(
            grouped.aggregate(&[Aggregation::new("amount", AggregateKind::TrueCount)]),
            Err(Error::TypeMismatch(_))
        ));
        assert!(matches!(
            grouped.aggregate(&[Aggregation::new("nope", AggregateKind::Count)]),
            Err(Error::ColumnNotFound(_))
        ));
        assert!(matches!(
            grouped.aggregate(&[
                Aggregation::new("amount", AggregateKind::Sum),
                Aggregation::new("amount", AggregateKind::Sum),
            ]),
            Err(Error::DuplicateColumn(_))
        ));
        assert!(matches!(table.group_by(&["nope"]), Err(Error::ColumnNotFound(_))));
    }

    // ─────────────────────────────────────────────────────────────
    // Test 7 : integral sums stay exact past 2^53
    // ─────────────────────────────────────────────────────────────
    #[test]
    fn test_integral_sum_is_exact() {
        let big = 9_007_199_254_740_993i64;
        let table = Table::from_columns(
            "big",
            vec![
                Column::from_values("n", DataType::Long, [big, 2]).unwrap(),
                Column::from_values("x", DataType::Double, [0.5, 0.25]).unwrap(),
            ],
        )
        .unwrap();
        let result = table
            .summarize(&[
                Aggregation::new("n", AggregateKind::Sum),
                Aggregation::new("x", AggregateKind::Sum),
            ])
            .unwrap();
        assert_eq!(values(&result, "n_sum"), vec![Value::Long(big + 2)]);
        assert_eq!(values(&result, "x_sum"), vec![Value::Double(0.75)]);

        let empty = table.copy_empty().summarize(&[Aggregation::new("n", AggregateKind::Sum)]);
        assert_eq!(values(&empty.unwrap(), "n_sum"), vec![Value::Long(0)]);

        let overflow = Table::from_columns(
            "overflow",
            vec![Column::from_values("n", DataType::Long, [i64::MAX, 1]).unwrap()],
        )
        .unwrap();
        assert!(matches!(
            overflow.summarize(&[Aggregation::new("n", AggregateKind::Sum)]),
            Err(Error::TypeMismatch(_))
        ));
    }
}
