use anyhow::{Context, Result};
use log::info;

use crate::{
    cli::PreviewArgs,
    columns::normalize_column_name,
    sheet::{self, TableSource},
    table,
};

pub fn execute(args: &PreviewArgs) -> Result<()> {
    let source = TableSource {
        path: args.input.clone(),
        sheet: args.sheet.clone(),
        delimiter: args.delimiter,
        encoding: args.input_encoding.clone(),
    };
    let anchor_key = normalize_column_name(args.anchor.as_str());
    let table = sheet::load_table(&source, &anchor_key)
        .with_context(|| format!("Loading table from {:?}", args.input))?;

    let rows = (0..table.len().min(args.rows))
        .map(|position| table.display_row(position))
        .collect::<Vec<_>>();
    table::print_table(table.headers(), &rows);
    info!(
        "Displayed {} of {} row(s) from {:?}",
        rows.len(),
        table.len(),
        args.input
    );
    Ok(())
}
