use log::debug;

use crate::compiler::QueryCompiler;
use crate::error::Result;
use crate::predicate::Predicate;
use crate::registry::TypeRegistry;
use crate::table::Table;

impl Table {
    /// Returns a new table holding the rows for which `predicate` is true, in their
    /// original order, with the same columns and types.
    ///
    /// The predicate is validated against the schema before the scan, so a kind mismatch
    /// fails even on an empty table.
    ///
    /// # Errors
    /// Returns a schema error for unknown columns or a type error for kind mismatches.
    pub fn filter(&self, predicate: &Predicate) -> Result<Table> {
        predicate.check(self)?;

        let mut kept = Vec::new();
        for row_idx in 0..self.row_count() {
            if predicate.evaluate(self, row_idx)? {
                kept.push(row_idx);
            }
        }

        debug!(
            "filter on {:?}: kept {} of {} rows",
            self.name,
            kept.len(),
            self.row_count()
        );
        self.take_rows(&kept)
    }

    /// Compiles `text` with the global [TypeRegistry] and filters with it.
    ///
    /// # Example
    ///
    /// ```
    /// use colframe::{Column, DataType, Table, Value};
    ///
    /// let table = Table::from_columns(
    ///     "products",
    ///     vec![
    ///         Column::from_values("name", DataType::Text, ["Laptop", "Mouse"]).unwrap(),
    ///         Column::from_values("price", DataType::Int, [1200, 25]).unwrap(),
    ///     ],
    /// )
    /// .unwrap();
    ///
    /// let cheap = table.query("price < 100").unwrap();
    /// assert_eq!(cheap.row_count(), 1);
    /// assert_eq!(cheap.column("name").unwrap().get(0), Some(Value::from("Mouse")));
    /// ```
    ///
    /// # Errors
    /// Returns a compile error if the text is malformed or does not fit the schema; no
    /// table is produced in that case.
    pub fn query(&self, text: &str) -> Result<Table> {
        self.query_with(text, TypeRegistry::global())
    }

    /// Like [Table::query], with an explicit registry.
    pub fn query_with(&self, text: &str, registry: &TypeRegistry) -> Result<Table> {
        let predicate = QueryCompiler::new(self.schema(), registry).compile(text)?;
        self.filter(&predicate)
    }
}

#[cfg(test)]
mod tests {
    use crate::column::Column;
    use crate::data_type::DataType;
    use crate::error::Error;
    use crate::predicate::Predicate;
    use crate::table::Table;
    use crate::value::Value;

    fn people() -> Table {
        Table::from_columns(
            "people",
            vec![
                Column::from_values("id", DataType::Int, [1, 2, 3, 4, 5]).unwrap(),
                Column::from_values(
                    "name",
                    DataType::Text,
                    [Some("ann"), Some("bob"), None, Some("dee"), Some("eve")],
                )
                .unwrap(),
                Column::from_values("age", DataType::Int, [Some(31), Some(17), Some(45), None, Some(17)])
                    .unwrap(),
            ],
        )
        .unwrap()
    }

    fn ids(table: &Table) -> Vec<Value> {
        let column = table.column("id").unwrap();
        (0..column.len()).filter_map(|i| column.get(i)).collect()
    }

    #[test]
    fn test_filter_keeps_order_and_schema() {
        let table = people();
        let result = table.filter(&Predicate::lt("age", 40)).unwrap();

        assert_eq!(result.schema(), table.schema());
        assert_eq!(ids(&result), vec![Value::Int(1), Value::Int(2), Value::Int(5)]);
        assert_eq!(table.row_count(), 5);
    }

    #[test]
    fn test_filter_is_idempotent() {
        let table = people();
        let predicate = Predicate::or(vec![Predicate::gt("age", 20), Predicate::equals("name", "eve")]);

        let once = table.filter(&predicate).unwrap();
        let twice = once.filter(&predicate).unwrap();
        assert_eq!(ids(&once), ids(&twice));
        assert_eq!(once.row_count(), twice.row_count());
    }

    #[test]
    fn test_filter_no_match_and_empty_table() {
        let table = people();
        let none = table.filter(&Predicate::gt("age", 100)).unwrap();
        assert_eq!(none.row_count(), 0);
        assert_eq!(none.column_count(), 3);

        // Kind mismatches fail even without rows to scan.
        assert!(matches!(
            none.filter(&Predicate::gt("name", 1)),
            Err(Error::TypeMismatch(_))
        ));
    }

    #[test]
    fn test_query() {
        let table = people();
        let result = table.query("age = 17 AND name != bob").unwrap();
        assert_eq!(ids(&result), vec![Value::Int(5)]);

        let result = table.query("name = ann OR age > 40").unwrap();
        assert_eq!(ids(&result), vec![Value::Int(1), Value::Int(3)]);
    }

    #[test]
    fn test_query_dsl_precedence_on_table() {
        let table = people();
        // Only the AND branch (age = 17 AND id = 5) selects row 5; the OR branch alone
        // (id = 1) selects row 1.
        let result = table.query("id = 1 OR age = 17 AND id = 5").unwrap();
        assert_eq!(ids(&result), vec![Value::Int(1), Value::Int(5)]);

        let grouped = table.query("(id = 1 OR age = 17) AND id = 5").unwrap();
        assert_eq!(ids(&grouped), vec![Value::Int(5)]);
    }

    #[test]
    fn test_query_compile_failures() {
        let table = people();
        assert!(matches!(table.query("(age > 1"), Err(Error::Compile { .. })));
        assert!(matches!(table.query("height > 1"), Err(Error::Compile { .. })));
        assert!(matches!(table.query("age >> 1"), Err(Error::Compile { .. })));
    }
}
