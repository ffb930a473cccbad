//! Cell-by-cell write-back into the target workbook.
//!
//! The target sheet's header row and column positions are discovered by
//! scanning for the anchor header. Each [`CellChange`] is then translated to
//! a 1-based grid coordinate and only that cell's value is replaced; the
//! cell's style record is left as it was. The workbook is saved only when at
//! least one change was applied.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use log::{debug, info};
use umya_spreadsheet::{Spreadsheet, Worksheet, reader, writer};

use crate::{
    columns::normalize_column_name,
    data::CellValue,
    differ::CellChange,
    error::ReconcileError,
    io_utils, sheet,
};

/// A 1-based cell grid that can be scanned as text and written by coordinate.
pub trait CellGrid {
    /// Highest used `(row, column)`, both 1-based; `(0, 0)` for an empty sheet.
    fn extent(&self) -> (u32, u32);
    fn text_at(&self, row: u32, column: u32) -> String;
    fn write_value(&mut self, row: u32, column: u32, value: &CellValue);
}

/// Where the target table sits inside its sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetLayout {
    header_row: u32,
    anchor_column: u32,
    columns: HashMap<String, u32>,
}

impl SheetLayout {
    /// Finds the first cell (row-major) whose canonical text equals `anchor_key`
    /// and maps every header to its right until the first fully blank column.
    pub fn discover<G: CellGrid + ?Sized>(grid: &G, anchor_key: &str) -> Result<Self, ReconcileError> {
        let (max_row, max_col) = grid.extent();
        let (header_row, anchor_column) = (1..=max_row)
            .flat_map(|row| (1..=max_col).map(move |col| (row, col)))
            .find(|&(row, col)| {
                let text = grid.text_at(row, col);
                !text.is_empty() && normalize_column_name(text.as_str()) == anchor_key
            })
            .ok_or_else(|| ReconcileError::AnchorNotFound {
                anchor: anchor_key.to_string(),
                location: "target sheet".to_string(),
            })?;

        let mut columns = HashMap::new();
        for col in anchor_column..=max_col {
            let column_blank = (header_row..=max_row).all(|row| grid.text_at(row, col).is_empty());
            if column_blank {
                break;
            }
            let header = grid.text_at(header_row, col);
            let label = if header.is_empty() {
                sheet::unnamed_header((col - anchor_column) as usize)
            } else {
                header
            };
            columns.insert(normalize_column_name(label.as_str()), col);
        }
        debug!(
            "Target header row {header_row}, anchor column {anchor_column}, {} mapped column(s)",
            columns.len()
        );
        Ok(Self {
            header_row,
            anchor_column,
            columns,
        })
    }

    pub fn header_row(&self) -> u32 {
        self.header_row
    }

    pub fn anchor_column(&self) -> u32 {
        self.anchor_column
    }

    pub fn column(&self, key: &str) -> Option<u32> {
        self.columns.get(key).copied()
    }

    /// Grid row of a 0-based data-region position; the header occupies one row.
    pub fn grid_row(&self, position: usize) -> u32 {
        self.header_row + position as u32 + 1
    }
}

pub struct SelectiveWriter<G: CellGrid> {
    grid: G,
    layout: SheetLayout,
}

impl<G: CellGrid> SelectiveWriter<G> {
    pub fn new(grid: G, anchor_key: &str) -> Result<Self, ReconcileError> {
        let layout = SheetLayout::discover(&grid, anchor_key)?;
        Ok(Self { grid, layout })
    }

    pub fn layout(&self) -> &SheetLayout {
        &self.layout
    }

    /// Writes every change or none: coordinates are resolved for the whole
    /// batch before the first cell is touched. Returns the number applied.
    pub fn apply(&mut self, changes: &[CellChange]) -> Result<usize, ReconcileError> {
        let resolved = changes
            .iter()
            .map(|change| {
                let column = self.layout.column(&change.column).ok_or_else(|| {
                    ReconcileError::UnmappedColumn {
                        column: change.column.clone(),
                    }
                })?;
                Ok((self.layout.grid_row(change.target_row), column, &change.new_value))
            })
            .collect::<Result<Vec<_>, ReconcileError>>()?;

        for (row, column, value) in &resolved {
            debug!("Writing '{value}' at row {row}, column {column}");
            self.grid.write_value(*row, *column, value);
        }
        Ok(resolved.len())
    }

    pub fn into_inner(self) -> G {
        self.grid
    }
}

/// The on-disk target workbook, opened once per run.
pub struct TargetWorkbook {
    path: PathBuf,
    sheet: String,
    book: Spreadsheet,
}

impl TargetWorkbook {
    pub fn open(path: &Path, sheet_name: Option<&str>) -> Result<Self, ReconcileError> {
        let sheet = match sheet_name {
            Some(name) => name.to_string(),
            None => sheet::first_sheet_name(path)?,
        };
        let book = reader::xlsx::read(path).map_err(|e| ReconcileError::Workbook {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        if book.get_sheet_by_name(&sheet).is_none() {
            return Err(ReconcileError::SheetNotFound(sheet));
        }
        Ok(Self {
            path: path.to_path_buf(),
            sheet,
            book,
        })
    }

    pub fn sheet_name(&self) -> &str {
        &self.sheet
    }

    pub fn grid_mut(&mut self) -> Result<WorksheetGrid<'_>, ReconcileError> {
        let sheet = self
            .book
            .get_sheet_by_name_mut(&self.sheet)
            .ok_or_else(|| ReconcileError::SheetNotFound(self.sheet.clone()))?;
        Ok(WorksheetGrid { sheet })
    }

    pub fn save(&self) -> Result<(), ReconcileError> {
        writer::xlsx::write(&self.book, &self.path).map_err(|e| ReconcileError::Persist {
            path: self.path.clone(),
            message: e.to_string(),
        })
    }
}

pub struct WorksheetGrid<'a> {
    sheet: &'a mut Worksheet,
}

impl CellGrid for WorksheetGrid<'_> {
    fn extent(&self) -> (u32, u32) {
        let (max_col, max_row) = self.sheet.get_highest_column_and_row();
        (max_row, max_col)
    }

    fn text_at(&self, row: u32, column: u32) -> String {
        self.sheet.get_value((column, row))
    }

    fn write_value(&mut self, row: u32, column: u32, value: &CellValue) {
        let cell = self.sheet.get_cell_mut((column, row));
        match value {
            CellValue::Empty => {
                cell.set_value("");
            }
            CellValue::Text(text) => {
                cell.set_value_string(text.as_str());
            }
            CellValue::Number(number) => {
                cell.set_value_number(*number);
            }
        }
    }
}

/// Parameters for one write-back pass over the target file.
#[derive(Debug, Clone)]
pub struct WriteRequest<'a> {
    pub path: &'a Path,
    pub sheet: Option<&'a str>,
    pub anchor_key: &'a str,
    /// SHA-256 taken when the target table was read; checked before saving
    pub expected_checksum: Option<&'a str>,
    pub dry_run: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteSummary {
    pub applied: usize,
    pub persisted: bool,
}

pub fn update_target_file(
    request: &WriteRequest<'_>,
    changes: &[CellChange],
) -> Result<WriteSummary, ReconcileError> {
    let mut workbook = TargetWorkbook::open(request.path, request.sheet)?;
    let applied = {
        let grid = workbook.grid_mut()?;
        let mut writer = SelectiveWriter::new(grid, request.anchor_key).map_err(|err| match err {
            ReconcileError::AnchorNotFound { anchor, .. } => ReconcileError::AnchorNotFound {
                anchor,
                location: format!("{:?}", request.path),
            },
            other => other,
        })?;
        writer.apply(changes)?
    };

    if applied == 0 {
        info!("No differences found; {:?} left untouched", request.path);
        return Ok(WriteSummary {
            applied,
            persisted: false,
        });
    }
    if request.dry_run {
        info!(
            "Dry run: {applied} change(s) validated against {:?}, nothing written",
            request.path
        );
        return Ok(WriteSummary {
            applied,
            persisted: false,
        });
    }

    if let Some(expected) = request.expected_checksum {
        let found = io_utils::file_checksum(request.path)?;
        if found != expected {
            return Err(ReconcileError::TargetModified {
                path: request.path.to_path_buf(),
                expected: expected.to_string(),
                found,
            });
        }
    }
    workbook.save()?;
    info!(
        "Wrote {applied} change(s) to sheet '{}' of {:?}",
        workbook.sheet_name(),
        request.path
    );
    Ok(WriteSummary {
        applied,
        persisted: true,
    })
}
