use std::collections::{HashMap, HashSet};

use log::debug;

use crate::column::Column;
use crate::error::{Error, Result};
use crate::table::Table;
use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
    Right,
    Outer,
}

impl JoinKind {
    fn keeps_unmatched_left(self) -> bool {
        matches!(self, Self::Left | Self::Outer)
    }

    fn keeps_unmatched_right(self) -> bool {
        matches!(self, Self::Right | Self::Outer)
    }
}

/// Describes a join: its kind, the key column pairs and the suffixes used to tell apart
/// non-key columns present on both sides.
///
/// ```
/// # use colframe::{JoinKind, JoinSpec};
/// let spec = JoinSpec::new(JoinKind::Left)
///     .on("id", "user_id")
///     .suffixes("_user", "_order");
/// assert_eq!(spec.keys.len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct JoinSpec {
    pub kind: JoinKind,
    /// (left column, right column) pairs.
    pub keys: Vec<(String, String)>,
    pub left_suffix: String,
    pub right_suffix: String,
}

impl JoinSpec {
    pub fn new(kind: JoinKind) -> Self {
        Self {
            kind,
            keys: Vec::new(),
            left_suffix: String::new(),
            right_suffix: String::new(),
        }
    }

    /// Adds a key pair.
    pub fn on(mut self, left: &str, right: &str) -> Self {
        self.keys.push((left.to_string(), right.to_string()));
        self
    }

    pub fn suffixes(mut self, left: &str, right: &str) -> Self {
        self.left_suffix = left.to_string();
        self.right_suffix = right.to_string();
        self
    }
}

/// Where an output column takes its values from.
enum Source {
    Left(usize),
    Right(usize),
    /// A left key column: filled from the matching right key for right-only rows.
    Key { left: usize, right: usize },
}

impl Table {
    /// Joins `self` (left) with `right` according to `spec`.
    ///
    /// Output columns are every left column in order, then every right column that is not
    /// a key. Rows appear in left order, each expanded by its matches (in right order), or
    /// once with missing right cells for LEFT/OUTER; RIGHT/OUTER then append the right rows
    /// that matched nothing. Missing key values never match.
    ///
    /// ```
    /// # use colframe::{Column, DataType, JoinKind, JoinSpec, Table};
    /// let users = Table::from_columns("users", vec![
    ///     Column::from_values("id", DataType::Int, [1, 2]).unwrap(),
    /// ]).unwrap();
    /// let orders = Table::from_columns("orders", vec![
    ///     Column::from_values("id", DataType::Int, [2, 2, 3]).unwrap(),
    ///     Column::from_values("total", DataType::Double, [9.5, 3.0, 1.0]).unwrap(),
    /// ]).unwrap();
    ///
    /// let joined = users.join(&orders, &JoinSpec::new(JoinKind::Inner).on("id", "id")).unwrap();
    /// assert_eq!(joined.column_names(), vec!["id", "total"]);
    /// assert_eq!(joined.row_count(), 2);
    /// ```
    ///
    /// # Errors
    /// Returns a schema error for an unknown key column or an unresolvable name
    /// collision, and a type error when paired key columns differ in kind.
    pub fn join(&self, right: &Table, spec: &JoinSpec) -> Result<Table> {
        if spec.keys.is_empty() {
            return Err(Error::type_mismatch("a join needs at least one key pair"));
        }

        let mut left_keys = Vec::with_capacity(spec.keys.len());
        let mut right_keys = Vec::with_capacity(spec.keys.len());
        for (left_name, right_name) in &spec.keys {
            let l = self.column_index(left_name)?;
            let r = right.column_index(right_name)?;
            let (lk, rk) = (self.columns()[l].data_type(), right.columns()[r].data_type());
            if lk != rk {
                return Err(Error::type_mismatch(format!(
                    "join key {left_name:?} is {lk} but {right_name:?} is {rk}"
                )));
            }
            left_keys.push(l);
            right_keys.push(r);
        }

        let (names, sources) = self.output_layout(right, spec, &left_keys, &right_keys)?;
        let pairs = match_rows(self, right, &left_keys, &right_keys, spec.kind);

        let mut columns = Vec::with_capacity(sources.len());
        for (name, source) in names.into_iter().zip(&sources) {
            let column = match *source {
                Source::Left(idx) => {
                    let rows: Vec<Option<usize>> = pairs.iter().map(|(l, _)| *l).collect();
                    self.columns()[idx].take(&rows)?
                }
                Source::Right(idx) => {
                    let rows: Vec<Option<usize>> = pairs.iter().map(|(_, r)| *r).collect();
                    right.columns()[idx].take(&rows)?
                }
                Source::Key { left, right: r } => {
                    key_column(&self.columns()[left], &right.columns()[r], &pairs)?
                }
            };
            columns.push(column.renamed(name));
        }

        debug!(
            "{:?} join {:?} ({} rows) with {:?} ({} rows): {} rows",
            spec.kind,
            self.name,
            self.row_count(),
            right.name,
            right.row_count(),
            pairs.len()
        );
        Table::from_columns(format!("{}_{}", self.name, right.name), columns)
    }

    /// Resolves output names and sources, applying suffixes to colliding names.
    fn output_layout(
        &self,
        right: &Table,
        spec: &JoinSpec,
        left_keys: &[usize],
        right_keys: &[usize],
    ) -> Result<(Vec<String>, Vec<Source>)> {
        let right_non_keys: Vec<usize> = (0..right.column_count())
            .filter(|idx| !right_keys.contains(idx))
            .collect();
        let right_names: HashSet<&str> = right_non_keys
            .iter()
            .map(|idx| right.columns()[*idx].name())
            .collect();
        let left_names: HashSet<&str> = self.column_names().into_iter().collect();

        let mut names = Vec::new();
        let mut sources = Vec::new();
        for (idx, column) in self.columns().iter().enumerate() {
            if let Some(pos) = left_keys.iter().position(|k| *k == idx) {
                names.push(column.name().to_string());
                sources.push(Source::Key {
                    left: idx,
                    right: right_keys[pos],
                });
            } else if right_names.contains(column.name()) {
                names.push(format!("{}{}", column.name(), spec.left_suffix));
                sources.push(Source::Left(idx));
            } else {
                names.push(column.name().to_string());
                sources.push(Source::Left(idx));
            }
        }
        for idx in right_non_keys {
            let name = right.columns()[idx].name();
            if left_names.contains(name) {
                names.push(format!("{name}{}", spec.right_suffix));
            } else {
                names.push(name.to_string());
            }
            sources.push(Source::Right(idx));
        }

        let mut seen = HashSet::new();
        for name in &names {
            if !seen.insert(name.as_str()) {
                return Err(Error::AmbiguousColumn(name.clone()));
            }
        }
        Ok((names, sources))
    }
}

/// Pairs of (left row, right row) in output order. `None` marks the missing side.
fn match_rows(
    left: &Table,
    right: &Table,
    left_keys: &[usize],
    right_keys: &[usize],
    kind: JoinKind,
) -> Vec<(Option<usize>, Option<usize>)> {
    // Hash the right side; rows with a missing key cannot match.
    let mut index: HashMap<Vec<Value>, Vec<usize>> = HashMap::new();
    for row in 0..right.row_count() {
        if let Some(key) = key_of(right, right_keys, row) {
            index.entry(key).or_default().push(row);
        }
    }

    let mut pairs = Vec::new();
    let mut right_matched = vec![false; right.row_count()];
    for row in 0..left.row_count() {
        let matches = key_of(left, left_keys, row).and_then(|key| index.get(&key));
        match matches {
            Some(rows) => {
                for r in rows {
                    right_matched[*r] = true;
                    pairs.push((Some(row), Some(*r)));
                }
            }
            None if kind.keeps_unmatched_left() => pairs.push((Some(row), None)),
            None => {}
        }
    }

    if kind.keeps_unmatched_right() {
        pairs.extend(
            right_matched
                .iter()
                .enumerate()
                .filter(|(_, matched)| !**matched)
                .map(|(r, _)| (None, Some(r))),
        );
    }
    pairs
}

fn key_of(table: &Table, keys: &[usize], row: usize) -> Option<Vec<Value>> {
    keys.iter()
        .map(|idx| table.columns()[*idx].get(row).filter(|v| !v.is_null()))
        .collect()
}

/// Left key column where right-only rows take the right key's value.
fn key_column(
    left: &Column,
    right: &Column,
    pairs: &[(Option<usize>, Option<usize>)],
) -> Result<Column> {
    let mut column = Column::with_capacity(left.name(), left.data_type(), pairs.len());
    for pair in pairs {
        let value = match *pair {
            (Some(l), _) => left.get(l),
            (None, Some(r)) => right.get(r),
            (None, None) => None,
        };
        column.push(value.unwrap_or(Value::Null))?;
    }
    Ok(column)
}
