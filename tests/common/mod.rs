#![allow(dead_code)]

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use column_mapper::config::AppConfig;
use rust_xlsxwriter::Workbook;
use tempfile::{TempDir, tempdir};

pub const SOURCE_CSV: &str = "Name,Age,City\nJohn,25,NYC\nJane,30,LA\nBob,35,Chicago\n";
pub const DESTINATION_CSV: &str = "Full_Name,Years,Location,Notes\n,,,\n,,,\n,,,\n";

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn join(&self, name: &str) -> PathBuf {
        self.temp_dir.path().join(name)
    }

    /// Writes `contents` into a file under the workspace and returns the path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent directory");
        }
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(contents.as_bytes())
            .expect("write temp file contents");
        path
    }

    /// Writes a single-sheet workbook; empty strings leave the cell blank.
    pub fn write_workbook(&self, name: &str, headers: &[&str], rows: &[Vec<&str>]) -> PathBuf {
        let path = self.join(name);
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        for (col, header) in headers.iter().enumerate() {
            sheet
                .write_string(0, col as u16, *header)
                .expect("write header");
        }
        for (row_idx, row) in rows.iter().enumerate() {
            for (col, value) in row.iter().enumerate() {
                if value.is_empty() {
                    continue;
                }
                let row_number = row_idx as u32 + 1;
                match value.parse::<f64>() {
                    Ok(number) => sheet.write_number(row_number, col as u16, number),
                    Err(_) => sheet.write_string(row_number, col as u16, *value),
                }
                .expect("write cell");
            }
        }
        workbook.save(&path).expect("save workbook");
        path
    }

    /// Source/destination pair used across the end-to-end tests.
    pub fn sample_pair(&self) -> (PathBuf, PathBuf) {
        (
            self.write("source.csv", SOURCE_CSV),
            self.write("destination.csv", DESTINATION_CSV),
        )
    }

    pub fn config(&self) -> AppConfig {
        AppConfig::in_directory(self.path())
    }
}
