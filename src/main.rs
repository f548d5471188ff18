use colframe::{
    AggregateKind, Aggregation, Column, DataType, DropPolicy, JoinKind, JoinSpec, Result,
    SortKey, Table, TypeRegistry,
};
use log::info;

fn print_table(table: &Table) {
    println!("{} ({} rows)", table.name, table.row_count());
    println!("  {}", table.column_names().join(" | "));
    for row_idx in 0..table.row_count() {
        if let Some(values) = table.row_values(row_idx) {
            let cells: Vec<String> = values.iter().map(|v| v.to_string()).collect();
            println!("  {}", cells.join(" | "));
        }
    }
    println!();
}

fn main() -> Result<()> {
    env_logger::init();

    let registry = TypeRegistry::global();
    let employees = Table::from_columns(
        "employees",
        vec![
            Column::parse_strings("id", DataType::Int, &["1", "2", "3", "4", "5"], registry)?,
            Column::parse_strings(
                "name",
                DataType::Text,
                &["Alice", "Bob", "Carol", "NA", "Eve"],
                registry,
            )?,
            Column::parse_strings("dept", DataType::Int, &["10", "20", "10", "30", ""], registry)?,
            Column::parse_strings(
                "salary",
                DataType::Double,
                &["5200.5", "4100", "6100", "3900", "NaN"],
                registry,
            )?,
        ],
    )?;
    let departments = Table::from_columns(
        "departments",
        vec![
            Column::from_values("dept", DataType::Int, [10, 20, 40])?,
            Column::from_values("title", DataType::Text, ["Research", "Sales", "Legal"])?,
        ],
    )?;
    info!("loaded {} employees", employees.row_count());
    print_table(&employees);

    print_table(&employees.query("salary > 4000 AND dept = 10")?);

    let joined = employees.join(&departments, &JoinSpec::new(JoinKind::Left).on("dept", "dept"))?;
    print_table(&joined);

    let per_dept = employees.group_by(&["dept"])?.aggregate(&[
        Aggregation::new("id", AggregateKind::Count),
        Aggregation::new("salary", AggregateKind::Mean),
    ])?;
    print_table(&per_dept.sort_by(&[SortKey::parse("-salary_mean")])?);

    let cleaned = employees
        .drop_na(DropPolicy::All)?
        .fill_na("name", "unknown")?
        .drop_na_in(&["dept"])?;
    print_table(&cleaned);

    Ok(())
}
