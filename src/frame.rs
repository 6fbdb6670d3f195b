//! In-memory table model shared by the loader, profiler, and transfer engine.
//!
//! A [`Table`] stores its cells column-major so whole-column reads and
//! overwrites (the only shapes the transfer engine needs) are slices. Every
//! column always holds exactly `row_count` cells; missing values are `None`.

use crate::data::Cell;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: Vec<String>,
    data: Vec<Vec<Cell>>,
    row_count: usize,
}

impl Table {
    pub fn empty(columns: Vec<String>) -> Self {
        let data = vec![Vec::new(); columns.len()];
        Self {
            columns,
            data,
            row_count: 0,
        }
    }

    /// Builds a table from row-major records. Short rows are padded with nulls
    /// and cells beyond the header width are dropped.
    pub fn from_rows<I>(columns: Vec<String>, rows: I) -> Self
    where
        I: IntoIterator<Item = Vec<Cell>>,
    {
        let mut table = Self::empty(columns);
        for row in rows {
            table.push_row(row);
        }
        table
    }

    pub fn push_row(&mut self, row: Vec<Cell>) {
        let mut cells = row.into_iter();
        for column in &mut self.data {
            column.push(cells.next().flatten());
        }
        self.row_count += 1;
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// First column with this exact name; duplicates beyond the first are unreachable by name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }

    pub fn column(&self, name: &str) -> Option<&[Cell]> {
        self.column_index(name).map(|idx| self.data[idx].as_slice())
    }

    pub fn column_at(&self, index: usize) -> Option<&[Cell]> {
        self.data.get(index).map(Vec::as_slice)
    }

    pub fn cell(&self, row: usize, column: usize) -> Option<&Cell> {
        self.data.get(column).and_then(|values| values.get(row))
    }

    /// Appends `additional` rows of nulls to every column.
    pub fn grow(&mut self, additional: usize) {
        if additional == 0 {
            return;
        }
        let target = self.row_count + additional;
        for column in &mut self.data {
            column.resize(target, None);
        }
        self.row_count = target;
    }

    /// Returns the index of `name`, appending an all-null column when absent.
    pub fn ensure_column(&mut self, name: &str) -> usize {
        if let Some(idx) = self.column_index(name) {
            return idx;
        }
        self.columns.push(name.to_string());
        self.data.push(vec![None; self.row_count]);
        self.columns.len() - 1
    }

    /// Writes `values` into the leading rows of column `index`, leaving later rows untouched.
    pub fn overwrite_prefix(&mut self, index: usize, values: &[Cell]) {
        if values.len() > self.row_count {
            self.grow(values.len() - self.row_count);
        }
        let column = &mut self.data[index];
        column[..values.len()].clone_from_slice(values);
    }

    pub fn row(&self, row: usize) -> Option<Vec<Cell>> {
        (row < self.row_count).then(|| {
            self.data
                .iter()
                .map(|column| column[row].clone())
                .collect()
        })
    }

    pub fn rows(&self) -> impl Iterator<Item = Vec<Cell>> + '_ {
        (0..self.row_count).filter_map(move |idx| self.row(idx))
    }
}
