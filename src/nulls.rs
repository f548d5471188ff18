use log::debug;

use crate::error::{Error, Result};
use crate::table::Table;
use crate::value::Value;

/// Which rows [Table::drop_na] removes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropPolicy {
    /// Drop a row holding at least one missing value.
    Any,
    /// Drop a row only when every value is missing.
    All,
}

impl Table {
    /// Returns a copy without the rows selected by `policy`.
    pub fn drop_na(&self, policy: DropPolicy) -> Result<Table> {
        let kept: Vec<usize> = (0..self.row_count())
            .filter(|row| match policy {
                DropPolicy::Any => !self.row_has_missing(*row),
                DropPolicy::All => !self.columns().iter().all(|c| c.is_null(*row)),
            })
            .collect();
        debug!(
            "drop_na({policy:?}) on {:?}: kept {} of {} rows",
            self.name,
            kept.len(),
            self.row_count()
        );
        self.take_rows(&kept)
    }

    /// Returns a copy without the rows that miss a value in any of `columns`.
    ///
    /// # Errors
    /// Returns a schema error if a column does not exist.
    pub fn drop_na_in(&self, columns: &[&str]) -> Result<Table> {
        let targets = columns
            .iter()
            .map(|name| self.column(name))
            .collect::<Result<Vec<_>>>()?;
        let kept: Vec<usize> = (0..self.row_count())
            .filter(|row| !targets.iter().any(|c| c.is_null(*row)))
            .collect();
        self.take_rows(&kept)
    }

    /// Returns a copy where every missing value of `column` is replaced by `value`.
    ///
    /// # Errors
    /// Returns a schema error if the column does not exist, or a type error if `value`
    /// is missing or not assignable to the column's kind.
    pub fn fill_na(&self, column: &str, value: impl Into<Value>) -> Result<Table> {
        let mut filled = self.clone();
        filled.fill_na_in_place(column, value)?;
        Ok(filled)
    }

    /// Replaces in place every missing value of `column` with `value` and returns how many
    /// cells were filled.
    ///
    /// This mutates the table's own storage, so it needs exclusive access: no other
    /// reader may observe the table while it runs.
    pub fn fill_na_in_place(&mut self, column: &str, value: impl Into<Value>) -> Result<usize> {
        let value = value.into();
        let target = self.column_mut(column)?;
        if value.is_null() {
            return Err(Error::type_mismatch(format!(
                "cannot fill column {column:?} with a missing value"
            )));
        }
        let value = value.coerce_to(target.data_type()).ok_or_else(|| {
            Error::type_mismatch(format!(
                "{value:?} is not assignable to {} column {column:?}",
                target.data_type()
            ))
        })?;

        let missing: Vec<usize> = (0..target.len()).filter(|row| target.is_null(*row)).collect();
        for row in &missing {
            target.set(*row, &value)?;
        }
        Ok(missing.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::Column;
    use crate::data_type::DataType;

    fn table() -> Table {
        Table::from_columns(
            "t",
            vec![
                Column::from_values("a", DataType::Int, [Some(1), None, None, Some(4)]).unwrap(),
                Column::from_values("b", DataType::Text, [Some("x"), Some("y"), None, None])
                    .unwrap(),
            ],
        )
        .unwrap()
    }

    fn values(table: &Table, name: &str) -> Vec<Value> {
        let column = table.column(name).unwrap();
        (0..column.len()).filter_map(|i| column.get(i)).collect()
    }

    #[test]
    fn test_drop_any_and_all() {
        let t = table();
        let any = t.drop_na(DropPolicy::Any).unwrap();
        assert_eq!(values(&any, "a"), vec![Value::Int(1)]);

        let all = t.drop_na(DropPolicy::All).unwrap();
        assert_eq!(values(&all, "a"), vec![Value::Int(1), Value::Null, Value::Int(4)]);
        assert_eq!(t.row_count(), 4);
    }

    #[test]
    fn test_drop_na_in_columns() {
        let t = table();
        let result = t.drop_na_in(&["b"]).unwrap();
        assert_eq!(values(&result, "b"), vec![Value::from("x"), Value::from("y")]);
        assert!(matches!(t.drop_na_in(&["nope"]), Err(Error::ColumnNotFound(_))));
    }

    #[test]
    fn test_fill_na() {
        let t = table();
        let filled = t.fill_na("a", 0).unwrap();
        assert_eq!(
            values(&filled, "a"),
            vec![Value::Int(1), Value::Int(0), Value::Int(0), Value::Int(4)]
        );
        // The source keeps its missing values.
        assert_eq!(t.column("a").unwrap().count_missing(), 2);

        let widened = t.fill_na("a", 7i8).unwrap();
        assert_eq!(values(&widened, "a")[1], Value::Int(7));
    }

    #[test]
    fn test_fill_na_errors() {
        let t = table();
        assert!(matches!(t.fill_na("a", "zero"), Err(Error::TypeMismatch(_))));
        assert!(matches!(t.fill_na("a", 5i64), Err(Error::TypeMismatch(_))));
        assert!(matches!(t.fill_na("a", Value::Null), Err(Error::TypeMismatch(_))));
        assert!(matches!(t.fill_na("nope", 1), Err(Error::ColumnNotFound(_))));
    }

    #[test]
    fn test_fill_in_place() {
        let mut t = table();
        assert_eq!(t.fill_na_in_place("b", "z").unwrap(), 2);
        assert_eq!(t.column("b").unwrap().count_missing(), 0);
    }

    #[test]
    fn test_null_round_trip() {
        let t = table();
        let result = t.drop_na(DropPolicy::All).unwrap().fill_na("b", "-").unwrap();
        assert_eq!(result.column("b").unwrap().count_missing(), 0);
    }
}
