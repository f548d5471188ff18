use std::sync::Arc;

use bitvec::prelude::*;
use chrono::{NaiveDate, NaiveDateTime};

use crate::data_type::DataType;
use crate::error::{Error, Result};
use crate::registry::TypeRegistry;
use crate::value::Value;

/// Physical storage for column data.
/// Each variant wraps a collection of a specific type to ensure contiguous memory
/// allocation (columnar storage).
#[derive(Debug, Clone)]
pub enum ColumnData {
    /// Compact bit-vector for boolean values.
    Bool(BitVec),
    Byte(Vec<i8>),
    Short(Vec<i16>),
    Int(Vec<i32>),
    Long(Vec<i64>),
    Float(Vec<f32>),
    Double(Vec<f64>),
    Char(Vec<char>),
    /// Vector of atomic reference-counted strings.
    Text(Vec<Arc<str>>),
    Date(Vec<NaiveDate>),
    DateTime(Vec<NaiveDateTime>),
}

impl ColumnData {
    fn empty(data_type: DataType, capacity: usize) -> Self {
        match data_type {
            DataType::Bool => Self::Bool(BitVec::with_capacity(capacity)),
            DataType::Byte => Self::Byte(Vec::with_capacity(capacity)),
            DataType::Short => Self::Short(Vec::with_capacity(capacity)),
            DataType::Int => Self::Int(Vec::with_capacity(capacity)),
            DataType::Long => Self::Long(Vec::with_capacity(capacity)),
            DataType::Float => Self::Float(Vec::with_capacity(capacity)),
            DataType::Double => Self::Double(Vec::with_capacity(capacity)),
            DataType::Char => Self::Char(Vec::with_capacity(capacity)),
            DataType::Text => Self::Text(Vec::with_capacity(capacity)),
            DataType::Date => Self::Date(Vec::with_capacity(capacity)),
            DataType::DateTime => Self::DateTime(Vec::with_capacity(capacity)),
        }
    }

    /// Pushes a placeholder so the data vector stays aligned with the null bitmap.
    fn push_placeholder(&mut self) {
        match self {
            Self::Bool(v) => v.push(false),
            Self::Byte(v) => v.push(0),
            Self::Short(v) => v.push(0),
            Self::Int(v) => v.push(0),
            Self::Long(v) => v.push(0),
            Self::Float(v) => v.push(0.0),
            Self::Double(v) => v.push(0.0),
            Self::Char(v) => v.push('\0'),
            Self::Text(v) => v.push(Arc::from("")),
            Self::Date(v) => v.push(NaiveDate::default()),
            Self::DateTime(v) => v.push(NaiveDateTime::default()),
        }
    }

    fn remove(&mut self, row_idx: usize) {
        match self {
            Self::Bool(v) => {
                v.remove(row_idx);
            }
            Self::Byte(v) => {
                v.remove(row_idx);
            }
            Self::Short(v) => {
                v.remove(row_idx);
            }
            Self::Int(v) => {
                v.remove(row_idx);
            }
            Self::Long(v) => {
                v.remove(row_idx);
            }
            Self::Float(v) => {
                v.remove(row_idx);
            }
            Self::Double(v) => {
                v.remove(row_idx);
            }
            Self::Char(v) => {
                v.remove(row_idx);
            }
            Self::Text(v) => {
                v.remove(row_idx);
            }
            Self::Date(v) => {
                v.remove(row_idx);
            }
            Self::DateTime(v) => {
                v.remove(row_idx);
            }
        }
    }
}

/// Represents a named column.
/// It combines metadata (name, type) with actual data and a nullability tracker.
///
/// A column owns its storage exclusively: cloning a column copies it, and every table
/// transformation builds fresh columns.
#[derive(Debug, Clone)]
pub struct Column {
    name: String,
    data_type: DataType,
    data: ColumnData,
    /// A bitmap where a `true` bit indicates that the value at that index is missing.
    null_bitmap: BitVec,
}

impl Column {
    /// Creates a new, empty column with the specified name and data type.
    /// The underlying data storage is initialized according to the data type.
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self::with_capacity(name, data_type, 0)
    }

    pub fn with_capacity(name: impl Into<String>, data_type: DataType, capacity: usize) -> Self {
        Self {
            name: name.into(),
            data_type,
            data: ColumnData::empty(data_type, capacity),
            null_bitmap: BitVec::with_capacity(capacity),
        }
    }

    /// Builds a column from a sequence of values.
    ///
    /// # Errors
    /// Returns a type error if one of the values does not fit the column's data type.
    ///
    /// ```
    /// # use colframe::{Column, DataType, Value};
    /// let col = Column::from_values("age", DataType::Int, [Value::Int(3), Value::Null]).unwrap();
    /// assert_eq!(col.len(), 2);
    /// assert!(col.is_null(1));
    /// ```
    pub fn from_values<I>(name: impl Into<String>, data_type: DataType, values: I) -> Result<Self>
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        let values = values.into_iter();
        let mut column = Self::with_capacity(name, data_type, values.size_hint().0);
        for value in values {
            column.push(value.into())?;
        }
        Ok(column)
    }

    /// Parses text cells through `registry`, the contract ingestion sources follow:
    /// sentinel tokens become missing values, anything else must parse as `data_type`.
    pub fn parse_strings<S: AsRef<str>>(
        name: impl Into<String>,
        data_type: DataType,
        cells: &[S],
        registry: &TypeRegistry,
    ) -> Result<Self> {
        let mut column = Self::with_capacity(name, data_type, cells.len());
        for cell in cells {
            column.push(registry.parse(data_type, cell.as_ref())?)?;
        }
        Ok(column)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The column's value kind.
    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    pub(crate) fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Returns a copy of this column under a different name.
    pub fn renamed(&self, name: impl Into<String>) -> Self {
        let mut column = self.clone();
        column.set_name(name);
        column
    }

    /// Appends a new value to the end of the column.
    ///
    /// # Errors
    /// Returns an error if the value's type does not match the column's data type.
    /// Narrower numeric values are widened to the column type when lossless.
    ///
    /// # Behavior
    /// - If the value is `Null`, a placeholder is pushed to the data vector
    ///   to maintain index alignment with the `null_bitmap`.
    /// - If the value is not `Null`, it is added to the data vector and the bitmap is updated.
    ///
    /// # Example
    /// ```
    /// # use colframe::{Column, DataType, Value};
    /// let mut col = Column::new("age", DataType::Int);
    /// col.push(Value::Int(30)).unwrap();
    /// col.push(Value::Null).unwrap();
    ///
    /// assert_eq!(col.len(), 2);
    /// assert!(col.get(1).unwrap().is_null());
    /// ```
    pub fn push(&mut self, value: Value) -> Result<()> {
        if value.is_null() {
            self.push_null();
            return Ok(());
        }

        let value = self.conform(value)?;
        self.data.push_placeholder();
        self.null_bitmap.push(false);
        let last = self.len() - 1;
        self.write(last, value)
    }

    /// Appends a missing value.
    pub fn push_null(&mut self) {
        self.null_bitmap.push(true);
        self.data.push_placeholder();
    }

    /// Returns the number of rows currently stored in the column.
    pub fn len(&self) -> usize {
        self.null_bitmap.len()
    }

    /// Returns true if there is no row in the column, else false.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` if the value at `row_idx` is missing. Out-of-bounds indices are not null.
    pub fn is_null(&self, row_idx: usize) -> bool {
        row_idx < self.len() && self.null_bitmap[row_idx]
    }

    /// Number of missing values in the column.
    pub fn count_missing(&self) -> usize {
        self.null_bitmap.count_ones()
    }

    /// Retrieves the value at the specified row index.
    ///
    /// Returns `Some(Value)` if the index is valid, or `None` if it is out of bounds.
    /// If the `null_bitmap` indicates a null at the index, `Some(Value::Null)` is returned.
    pub fn get(&self, row_idx: usize) -> Option<Value> {
        if row_idx >= self.len() {
            return None;
        }
        if self.null_bitmap[row_idx] {
            return Some(Value::Null);
        }
        let value = match &self.data {
            ColumnData::Bool(col) => Value::Bool(col[row_idx]),
            ColumnData::Byte(col) => Value::Byte(col[row_idx]),
            ColumnData::Short(col) => Value::Short(col[row_idx]),
            ColumnData::Int(col) => Value::Int(col[row_idx]),
            ColumnData::Long(col) => Value::Long(col[row_idx]),
            ColumnData::Float(col) => Value::Float(col[row_idx]),
            ColumnData::Double(col) => Value::Double(col[row_idx]),
            ColumnData::Char(col) => Value::Char(col[row_idx]),
            ColumnData::Text(col) => Value::Text(Arc::clone(&col[row_idx])),
            ColumnData::Date(col) => Value::Date(col[row_idx]),
            ColumnData::DateTime(col) => Value::DateTime(col[row_idx]),
        };
        Some(value)
    }

    /// Remove the value at the specified row index.
    pub fn remove(&mut self, row_idx: usize) -> Result<()> {
        self.check_index(row_idx)?;
        self.data.remove(row_idx);
        self.null_bitmap.remove(row_idx);
        Ok(())
    }

    /// Replace a value in the column by a new value.
    ///
    /// # Errors
    /// Returns an error if the row_idx is too high or if the value's type does not match the
    /// column's data type.
    ///
    /// # Behavior
    /// - If the new value is `Null`, the previous value is not changed but only the null_bitmap to
    ///   be faster.
    pub fn set(&mut self, row_idx: usize, value: &Value) -> Result<()> {
        self.check_index(row_idx)?;

        if value.is_null() {
            // no need to change the value as null_bitmap is the first value checked at get.
            self.null_bitmap.set(row_idx, true);
            return Ok(());
        }

        let value = self.conform(value.clone())?;
        self.write(row_idx, value)?;
        self.null_bitmap.set(row_idx, false);
        Ok(())
    }

    /// Returns an empty column with the same name and data type.
    pub fn copy_empty(&self) -> Self {
        Self::new(self.name.clone(), self.data_type)
    }

    /// Gathers the rows at `indices` (in that order) into a new column.
    /// Indices may repeat. `None` entries produce missing values.
    pub fn take(&self, indices: &[Option<usize>]) -> Result<Self> {
        let mut column = Self::with_capacity(self.name.clone(), self.data_type, indices.len());
        for idx in indices {
            match idx {
                Some(i) => {
                    let value = self.get(*i).ok_or(Error::IndexOutOfBounds {
                        index: *i,
                        len: self.len(),
                    })?;
                    column.push(value)?;
                }
                None => column.push_null(),
            }
        }
        Ok(column)
    }

    /// Returns a copy in which every missing value is replaced by the registry's default
    /// substitute for this column's kind. The result has no missing values.
    pub fn substituted(&self, registry: &TypeRegistry) -> Self {
        let substitute = registry.substitute(self.data_type);
        let mut column = self.clone();
        for idx in self.null_bitmap.iter_ones() {
            // The registry validates substitute kinds at build time.
            if column.write(idx, substitute.clone()).is_ok() {
                column.null_bitmap.set(idx, false);
            }
        }
        column
    }

    fn check_index(&self, row_idx: usize) -> Result<()> {
        if row_idx >= self.len() {
            return Err(Error::IndexOutOfBounds {
                index: row_idx,
                len: self.len(),
            });
        }
        Ok(())
    }

    /// Converts `value` to the column's data type, widening numerics when lossless.
    fn conform(&self, value: Value) -> Result<Value> {
        value.coerce_to(self.data_type).ok_or_else(|| {
            Error::type_mismatch(format!(
                "value {value:?} has type {:?} while column {:?} has type {}",
                value.data_type(),
                self.name,
                self.data_type
            ))
        })
    }

    /// Writes a non-null value of the column's data type into the data vector.
    fn write(&mut self, row_idx: usize, value: Value) -> Result<()> {
        match (&mut self.data, value) {
            (ColumnData::Bool(col), Value::Bool(v)) => {
                col.set(row_idx, v);
            }
            (ColumnData::Byte(col), Value::Byte(v)) => col[row_idx] = v,
            (ColumnData::Short(col), Value::Short(v)) => col[row_idx] = v,
            (ColumnData::Int(col), Value::Int(v)) => col[row_idx] = v,
            (ColumnData::Long(col), Value::Long(v)) => col[row_idx] = v,
            (ColumnData::Float(col), Value::Float(v)) => col[row_idx] = v,
            (ColumnData::Double(col), Value::Double(v)) => col[row_idx] = v,
            (ColumnData::Char(col), Value::Char(v)) => col[row_idx] = v,
            (ColumnData::Text(col), Value::Text(v)) => col[row_idx] = v,
            (ColumnData::Date(col), Value::Date(v)) => col[row_idx] = v,
            (ColumnData::DateTime(col), Value::DateTime(v)) => col[row_idx] = v,
            (_, value) => {
                return Err(Error::type_mismatch(format!(
                    "internal: {value:?} cannot be stored in a {} column",
                    self.data_type
                )));
            }
        }
        Ok(())
    }
}
