pub mod ast;
pub mod column;
pub mod compiler;
pub mod data_type;
pub mod error;
pub mod filter;
pub mod group;
pub mod join;
pub mod nulls;
pub mod parser;
pub mod predicate;
pub mod registry;
pub mod row;
pub mod sort;
pub mod table;
pub mod tokenizer;
pub mod value;

pub use column::{Column, ColumnData};
pub use compiler::QueryCompiler;
pub use data_type::DataType;
pub use error::{Error, Result};
pub use group::{AggregateKind, Aggregation, GroupedTable};
pub use join::{JoinKind, JoinSpec};
pub use nulls::DropPolicy;
pub use predicate::{CompareOp, Predicate, TemporalTest, TextTest};
pub use registry::{TypeRegistry, TypeRegistryBuilder};
pub use row::Row;
pub use sort::{SortDirection, SortKey};
pub use table::{ColumnDef, Schema, Table};
pub use value::Value;
