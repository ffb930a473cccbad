#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::{TempDir, tempdir};
use umya_spreadsheet::{Spreadsheet, new_file, reader, writer};

pub const SHEET: &str = "Sheet1";

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    /// Creates a fresh scratch directory for the current test case.
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    /// Returns the root path for all files owned by this workspace.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `contents` into a file under the workspace and returns the path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(contents.as_bytes())
            .expect("write temp file contents");
        path
    }

    /// Builds a single-sheet workbook whose cell (r, c) of `rows` lands at
    /// `origin` + (r, c). Numeric-looking text is stored as a number.
    pub fn write_xlsx(&self, name: &str, origin: (u32, u32), rows: &[&[&str]]) -> PathBuf {
        let mut book = new_file();
        let sheet = book.get_sheet_by_name_mut(SHEET).expect("default sheet");
        for (r, row) in rows.iter().enumerate() {
            for (c, value) in row.iter().enumerate() {
                if value.is_empty() {
                    continue;
                }
                let cell = sheet.get_cell_mut((origin.1 + c as u32, origin.0 + r as u32));
                match value.parse::<f64>() {
                    Ok(number) => {
                        cell.set_value_number(number);
                    }
                    Err(_) => {
                        cell.set_value_string(*value);
                    }
                }
            }
        }
        let path = self.temp_dir.path().join(name);
        save(&book, &path);
        path
    }
}

pub fn open(path: &Path) -> Spreadsheet {
    reader::xlsx::read(path).expect("read workbook")
}

pub fn save(book: &Spreadsheet, path: &Path) {
    writer::xlsx::write(book, path).expect("write workbook");
}

/// Cell text at a 1-based (row, column) coordinate.
pub fn cell_text(path: &Path, row: u32, column: u32) -> String {
    open(path)
        .get_sheet_by_name(SHEET)
        .expect("sheet")
        .get_value((column, row))
}
