//! Raw grid loading and anchored table extraction.
//!
//! A source file (workbook sheet or delimited text) is first read as a plain
//! grid of cells. The table is the region whose top-left corner is the anchor
//! header: it extends right until the first fully blank column and down until
//! the first fully blank row. The same rules are used by the writer when it
//! lays out the target sheet, so row positions agree on both sides.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use calamine::{Data, Reader, open_workbook_auto};
use log::debug;

use crate::{
    columns::normalize_column_name,
    data::{CellValue, Table},
    error::ReconcileError,
    io_utils,
};

pub type Grid = Vec<Vec<CellValue>>;

/// Where to read a table from.
#[derive(Debug, Clone)]
pub struct TableSource {
    pub path: PathBuf,
    /// Worksheet name; the first sheet when absent. Ignored for CSV.
    pub sheet: Option<String>,
    pub delimiter: Option<u8>,
    pub encoding: Option<String>,
}

impl TableSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            sheet: None,
            delimiter: None,
            encoding: None,
        }
    }

    pub fn with_sheet(mut self, sheet: Option<String>) -> Self {
        self.sheet = sheet;
        self
    }
}

/// Header label used for a blank header cell at `offset` columns from the anchor.
pub fn unnamed_header(offset: usize) -> String {
    format!("Unnamed: {offset}")
}

pub fn first_sheet_name(path: &Path) -> Result<String, ReconcileError> {
    let workbook = open_workbook_auto(path).map_err(|e| ReconcileError::Workbook {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| ReconcileError::Workbook {
            path: path.to_path_buf(),
            message: "workbook has no sheets".to_string(),
        })
}

fn convert_cell(data: &Data) -> CellValue {
    match data {
        Data::Empty => CellValue::Empty,
        Data::String(s) => CellValue::from_field(s),
        Data::Float(f) => CellValue::Number(*f),
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Bool(b) => CellValue::text(if *b { "TRUE" } else { "FALSE" }),
        Data::DateTime(dt) => CellValue::Number(dt.as_f64()),
        other => CellValue::Text(other.to_string()),
    }
}

/// Reads one worksheet into a grid addressed from A1, so grid indices are
/// sheet coordinates minus one.
pub fn read_workbook_grid(path: &Path, sheet: Option<&str>) -> Result<Grid, ReconcileError> {
    let mut workbook = open_workbook_auto(path).map_err(|e| ReconcileError::Workbook {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    let name = match sheet {
        Some(name) => name.to_string(),
        None => workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| ReconcileError::Workbook {
                path: path.to_path_buf(),
                message: "workbook has no sheets".to_string(),
            })?,
    };
    if !workbook.sheet_names().contains(&name) {
        return Err(ReconcileError::SheetNotFound(name));
    }
    let range = workbook
        .worksheet_range(&name)
        .map_err(|e| ReconcileError::Workbook {
            path: path.to_path_buf(),
            message: format!("sheet '{name}': {e}"),
        })?;

    let (start_row, start_col) = range.start().unwrap_or((0, 0));
    let mut grid: Grid = vec![Vec::new(); start_row as usize];
    for row in range.rows() {
        let mut cells = vec![CellValue::Empty; start_col as usize];
        cells.extend(row.iter().map(convert_cell));
        grid.push(cells);
    }
    debug!("Read {} grid row(s) from sheet '{name}' of {path:?}", grid.len());
    Ok(grid)
}

pub fn load_grid(source: &TableSource) -> Result<Grid> {
    if io_utils::is_spreadsheet(&source.path) {
        Ok(read_workbook_grid(&source.path, source.sheet.as_deref())?)
    } else {
        let delimiter = io_utils::resolve_input_delimiter(&source.path, source.delimiter);
        let encoding = io_utils::resolve_encoding(source.encoding.as_deref())?;
        io_utils::read_csv_grid(&source.path, delimiter, encoding)
    }
}

/// First cell, in row-major order, whose canonical text equals `anchor_key`.
pub fn locate_anchor(grid: &[Vec<CellValue>], anchor_key: &str) -> Option<(usize, usize)> {
    grid.iter().enumerate().find_map(|(row_idx, row)| {
        row.iter()
            .position(|cell| {
                !cell.is_empty() && normalize_column_name(cell.as_display().as_str()) == anchor_key
            })
            .map(|col_idx| (row_idx, col_idx))
    })
}

fn is_blank(grid: &[Vec<CellValue>], row: usize, col: usize) -> bool {
    grid.get(row)
        .and_then(|cells| cells.get(col))
        .is_none_or(CellValue::is_empty)
}

pub fn extract_table(
    grid: &[Vec<CellValue>],
    anchor_key: &str,
    location: &str,
) -> Result<Table, ReconcileError> {
    let (header_row, anchor_col) =
        locate_anchor(grid, anchor_key).ok_or_else(|| ReconcileError::AnchorNotFound {
            anchor: anchor_key.to_string(),
            location: location.to_string(),
        })?;

    let grid_width = grid.iter().map(Vec::len).max().unwrap_or(0);
    let end_col = (anchor_col..grid_width)
        .find(|&col| (header_row..grid.len()).all(|row| is_blank(grid, row, col)))
        .unwrap_or(grid_width);

    let headers = (anchor_col..end_col)
        .map(|col| {
            if is_blank(grid, header_row, col) {
                unnamed_header(col - anchor_col)
            } else {
                grid[header_row][col].as_display()
            }
        })
        .collect::<Vec<_>>();

    let mut rows = Vec::new();
    for row in header_row + 1..grid.len() {
        if (anchor_col..end_col).all(|col| is_blank(grid, row, col)) {
            break;
        }
        rows.push(
            (anchor_col..end_col)
                .map(|col| {
                    grid[row]
                        .get(col)
                        .cloned()
                        .unwrap_or(CellValue::Empty)
                })
                .collect(),
        );
    }
    debug!(
        "Table at {location}: header row {}, column {}, {} column(s), {} row(s)",
        header_row + 1,
        anchor_col + 1,
        headers.len(),
        rows.len()
    );
    Ok(Table::new(headers, rows))
}

pub fn load_table(source: &TableSource, anchor_key: &str) -> Result<Table> {
    let grid = load_grid(source).with_context(|| format!("Reading {:?}", source.path))?;
    let location = format!("{:?}", source.path);
    Ok(extract_table(&grid, anchor_key, &location)?)
}
