use std::cmp::Ordering;

use log::debug;

use crate::error::{Error, Result};
use crate::table::Table;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SortKey {
    pub column: String,
    pub direction: SortDirection,
}

impl SortKey {
    pub fn asc(column: &str) -> Self {
        Self {
            column: column.to_string(),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(column: &str) -> Self {
        Self {
            column: column.to_string(),
            direction: SortDirection::Desc,
        }
    }

    /// Reads `"-name"` as descending, `"+name"` or `"name"` as ascending.
    ///
    /// ```
    /// # use colframe::{SortDirection, SortKey};
    /// assert_eq!(SortKey::parse("-age").direction, SortDirection::Desc);
    /// assert_eq!(SortKey::parse("age").column, "age");
    /// ```
    pub fn parse(spec: &str) -> Self {
        let spec = spec.trim();
        if let Some(column) = spec.strip_prefix('-') {
            Self::desc(column.trim())
        } else if let Some(column) = spec.strip_prefix('+') {
            Self::asc(column.trim())
        } else {
            Self::asc(spec)
        }
    }
}

impl Table {
    /// Returns a copy sorted by `keys`.
    ///
    /// Keys are compared left to right; the first non-equal comparison decides, and a
    /// descending key flips only its own comparison. Missing values sort before every
    /// other value of the column. The sort is stable: rows that tie on every key keep
    /// their original relative order.
    ///
    /// # Errors
    /// Returns a schema error if a key column does not exist.
    pub fn sort_by(&self, keys: &[SortKey]) -> Result<Table> {
        // save all column indexes on which we have to sort + boolean if we have to reverse order
        let sort = keys
            .iter()
            .map(|key| {
                let idx = self.column_index(&key.column)?;
                Ok((idx, key.direction == SortDirection::Desc))
            })
            .collect::<Result<Vec<(usize, bool)>>>()?;

        // Sort keys as materialised values to avoid repeated column lookups.
        let rows: Vec<Vec<_>> = (0..self.row_count())
            .map(|row| {
                sort.iter()
                    .map(|(idx, _)| self.columns()[*idx].get(row))
                    .collect::<Option<Vec<_>>>()
                    .ok_or(Error::IndexOutOfBounds {
                        index: row,
                        len: self.row_count(),
                    })
            })
            .collect::<Result<_>>()?;

        let mut order: Vec<usize> = (0..self.row_count()).collect();
        // `sort_by` is stable.
        order.sort_by(|a, b| {
            for (pos, (_, is_desc)) in sort.iter().enumerate() {
                let mut ord = rows[*a][pos]
                    .compare(&rows[*b][pos])
                    .unwrap_or(Ordering::Equal);

                if *is_desc {
                    ord = ord.reverse();
                }
                // if it's not equal no need to compare more
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            Ordering::Equal
        });

        debug!("sort on {:?}: {} rows by {} keys", self.name, order.len(), keys.len());
        self.take_rows(&order)
    }
}
