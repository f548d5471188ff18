use std::collections::HashSet;

use log::warn;

use crate::column::Column;
use crate::data_type::DataType;
use crate::error::{Error, Result};
use crate::row::Row;
use crate::value::Value;

/// Column definition in the schema
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDef {
    pub name: String,
    pub data_type: DataType,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    pub columns: Vec<ColumnDef>,
}

impl Schema {
    pub fn position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn data_type(&self, name: &str) -> Option<DataType> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.data_type)
    }
}

/// An ordered set of uniquely named columns of identical length.
///
/// Every transformation (filter, join, group, sort, drop, fill) returns a new table; the
/// input is left untouched. The only in-place mutations require `&mut Table`.
#[derive(Debug, Clone)]
pub struct Table {
    pub name: String,
    columns: Vec<Column>,
    row_count: usize,
}

impl Table {
    /// Creates an empty table following `schema`.
    ///
    /// # Errors
    /// Returns an error if the schema repeats a column name.
    pub fn new(name: impl Into<String>, schema: Schema) -> Result<Self> {
        let columns = schema
            .columns
            .iter()
            .map(|column| Column::new(column.name.clone(), column.data_type))
            .collect();
        Self::from_columns(name, columns)
    }

    /// Assembles a table from already populated columns.
    ///
    /// # Errors
    /// Returns an error if two columns share a name or if the lengths differ.
    pub fn from_columns(name: impl Into<String>, columns: Vec<Column>) -> Result<Self> {
        let mut seen = HashSet::new();
        for column in &columns {
            if !seen.insert(column.name()) {
                return Err(Error::DuplicateColumn(column.name().to_string()));
            }
        }
        let row_count = columns.first().map_or(0, Column::len);
        if let Some(column) = columns.iter().find(|c| c.len() != row_count) {
            return Err(Error::LengthMismatch {
                column: column.name().to_string(),
                expected: row_count,
                actual: column.len(),
            });
        }
        Ok(Self {
            name: name.into(),
            columns,
            row_count,
        })
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.row_count == 0
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(Column::name).collect()
    }

    pub fn schema(&self) -> Schema {
        Schema {
            columns: self
                .columns
                .iter()
                .map(|c| ColumnDef::new(c.name(), c.data_type()))
                .collect(),
        }
    }

    /// insert a new row
    pub fn insert(&mut self, values: Vec<Value>) -> Result<()> {
        if values.len() != self.columns.len() {
            return Err(Error::ArityMismatch {
                expected: self.columns.len(),
                actual: values.len(),
            });
        }
        // Validate every cell first so a failing row leaves the table untouched.
        for (column, value) in self.columns.iter().zip(&values) {
            if value.coerce_to(column.data_type()).is_none() {
                return Err(Error::type_mismatch(format!(
                    "value {value:?} does not fit column {:?} of type {}",
                    column.name(),
                    column.data_type()
                )));
            }
        }
        for (column, value) in self.columns.iter_mut().zip(values) {
            column.push(value)?;
        }
        self.row_count += 1;
        Ok(())
    }

    /// Materialises row `row_idx` as a [Row]. Editing the row does not touch the table
    /// until it is passed to [Table::write_row].
    pub fn get_row(&self, row_idx: usize) -> Option<Row> {
        let values = self.row_values(row_idx)?;
        let names = self.columns.iter().map(|c| c.name().to_string()).collect();
        Some(Row::new(names, values))
    }

    pub fn row_values(&self, row_idx: usize) -> Option<Vec<Value>> {
        if self.row_count <= row_idx {
            return None;
        }
        self.columns
            .iter()
            .map(|col| col.get(row_idx)) // -> Option<Value>
            .collect()
    }

    /// Writes `row` back at `row_idx`. The row may hold any subset of the columns; the
    /// cells it does not mention keep their value.
    pub fn write_row(&mut self, row_idx: usize, row: &Row) -> Result<()> {
        if row_idx >= self.row_count {
            return Err(Error::IndexOutOfBounds {
                index: row_idx,
                len: self.row_count,
            });
        }
        for (name, _) in row.iter() {
            self.column_index(name)?;
        }
        for (name, value) in row.iter() {
            let idx = self.column_index(name)?;
            self.columns[idx].set(row_idx, value)?;
        }
        Ok(())
    }

    pub fn get_col(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|col| col.name() == name)
    }

    /// Looks up a column, failing with a schema error when it does not exist.
    pub fn column(&self, name: &str) -> Result<&Column> {
        self.get_col(name)
            .ok_or_else(|| Error::ColumnNotFound(name.to_string()))
    }

    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|col| col.name() == name)
            .ok_or_else(|| Error::ColumnNotFound(name.to_string()))
    }

    pub(crate) fn column_mut(&mut self, name: &str) -> Result<&mut Column> {
        let idx = self.column_index(name)?;
        Ok(&mut self.columns[idx])
    }

    /// Appends a column. An empty table adopts the column's length.
    pub fn add_column(&mut self, column: Column) -> Result<()> {
        if self.get_col(column.name()).is_some() {
            return Err(Error::DuplicateColumn(column.name().to_string()));
        }
        if !self.columns.is_empty() && column.len() != self.row_count {
            return Err(Error::LengthMismatch {
                column: column.name().to_string(),
                expected: self.row_count,
                actual: column.len(),
            });
        }
        self.row_count = column.len();
        self.columns.push(column);
        Ok(())
    }

    /// Returns a copy without the named columns. Names that do not exist are skipped with
    /// a warning rather than failing.
    pub fn drop_columns(&self, names: &[&str]) -> Table {
        for name in names {
            if self.get_col(name).is_none() {
                warn!("drop_columns: table {:?} has no column {name:?}, skipping", self.name);
            }
        }
        let columns: Vec<Column> = self
            .columns
            .iter()
            .filter(|c| !names.contains(&c.name()))
            .cloned()
            .collect();
        let row_count = if columns.is_empty() { 0 } else { self.row_count };
        Self {
            name: self.name.clone(),
            columns,
            row_count,
        }
    }

    /// Same schema, zero rows.
    pub fn copy_empty(&self) -> Table {
        Self {
            name: self.name.clone(),
            columns: self.columns.iter().map(Column::copy_empty).collect(),
            row_count: 0,
        }
    }

    /// Builds a new table from the rows at `indices`, in that order.
    pub(crate) fn take_rows(&self, indices: &[usize]) -> Result<Table> {
        let indices: Vec<Option<usize>> = indices.iter().copied().map(Some).collect();
        let columns = self
            .columns
            .iter()
            .map(|c| c.take(&indices))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            name: self.name.clone(),
            columns,
            row_count: indices.len(),
        })
    }

    /// Returns `true` if any cell of row `row_idx` is missing.
    pub(crate) fn row_has_missing(&self, row_idx: usize) -> bool {
        self.columns.iter().any(|c| c.is_null(row_idx))
    }
}
