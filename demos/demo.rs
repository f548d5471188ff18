use chrono::NaiveDate;

use colframe::*;

fn show(title: &str, table: &Table) {
    println!("{title}:");
    println!("  {}", table.column_names().join(", "));
    for row_idx in 0..table.row_count() {
        if let Some(row) = table.row_values(row_idx) {
            let cells: Vec<String> = row.iter().map(ToString::to_string).collect();
            println!("  {}", cells.join(", "));
        }
    }
    println!();
}

fn main() -> Result<()> {
    env_logger::init();
    println!("In-Memory Table Demo\n");

    // A registry that also treats "--" as missing and reads day-first dates
    let registry = TypeRegistry::builder()
        .missing_token("--")
        .date_formats(["%d.%m.%Y", "%Y-%m-%d"])
        .build()?;

    let schema = Schema {
        columns: vec![
            ColumnDef::new("id", DataType::Int),
            ColumnDef::new("product", DataType::Text),
            ColumnDef::new("price", DataType::Double),
            ColumnDef::new("sold_on", DataType::Date),
        ],
    };
    let mut orders = Table::new("orders", schema)?;

    println!("Inserting data...");
    let rows = [
        ("1", "Laptop", "1200", "03.01.2024"),
        ("2", "Mouse", "25.5", "17.01.2024"),
        ("3", "Monitor", "--", "02.02.2024"),
        ("4", "Keyboard", "75", "--"),
        ("5", "Laptop Pro", "2100", "28.02.2024"),
    ];
    for (id, product, price, sold_on) in rows {
        orders.insert(vec![
            registry.parse(DataType::Int, id)?,
            registry.parse(DataType::Text, product)?,
            registry.parse(DataType::Double, price)?,
            registry.parse(DataType::Date, sold_on)?,
        ])?;
    }
    show("orders", &orders);

    // Text query
    let expensive = orders.query_with("price >= 100 AND product ~= '^Lap'", &registry)?;
    show("price >= 100 AND product ~= '^Lap'", &expensive);

    // The same kind of filter, built from predicates
    let february = orders.filter(&Predicate::and(vec![
        Predicate::is_in_month("sold_on", 2),
        Predicate::not(Predicate::contains("product", "Pro")),
    ]))?;
    show("sold in February, not a Pro model", &february);

    let early = orders.filter(&Predicate::is_before(
        "sold_on",
        NaiveDate::from_ymd_opt(2024, 2, 1).unwrap_or_default(),
    ))?;
    show("sold before February", &early);

    // Outer join against a stock table
    let stock = Table::from_columns(
        "stock",
        vec![
            Column::from_values("id", DataType::Int, [1, 2, 6])?,
            Column::from_values("price", DataType::Double, [1150.0, 20.0, 9.5])?,
        ],
    )?;
    let spec = JoinSpec::new(JoinKind::Outer)
        .on("id", "id")
        .suffixes("_order", "_stock");
    show("orders OUTER JOIN stock", &orders.join(&stock, &spec)?);

    // Aggregation
    let summary = orders.summarize(&[
        Aggregation::new("price", AggregateKind::Count),
        Aggregation::new("price", AggregateKind::Sum),
        Aggregation::new("price", AggregateKind::Max),
        Aggregation::new("price", AggregateKind::Std),
    ])?;
    show("price summary", &summary);

    // Sort, then clean up missing values
    let sorted = orders.sort_by(&[SortKey::desc("price"), SortKey::asc("id")])?;
    show("by price desc", &sorted);

    let complete = orders.drop_na(DropPolicy::Any)?;
    show("rows without missing values", &complete);

    let filled = orders.fill_na("price", 0.0)?;
    show("price filled with 0", &filled);

    println!("Demo completed!");
    Ok(())
}
