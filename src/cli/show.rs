use std::path::PathBuf;

use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::error::Result;
use crate::store;

pub fn run(file: &str) -> Result<()> {
    let path = PathBuf::from(file);
    let rows = store::read(&path)?;
    let Some((header, records)) = rows.split_first() else {
        println!("{} is empty.", path.display());
        return Ok(());
    };

    let mut table = Table::new();
    table.set_header(header.iter().map(|h| Cell::new(h.bold())));
    for row in records {
        table.add_row(row.iter().map(Cell::new));
    }
    println!("{table}");
    println!("{} record(s)", records.len());
    Ok(())
}
