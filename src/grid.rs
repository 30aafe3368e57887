//! In-memory grid of text cells.
//!
//! A [`RowGrid`] is what sources produce and what sinks are built from: a
//! sequence of rows of string cells. Row `0` of the grid is sheet row `1`.
//!
//! Grids read from files are ragged (trailing empty cells are usually not
//! stored); [`RowGrid::pad`] makes them rectangular before decoding.

use serde::{Deserialize, Serialize};

/// A sequence of text-cell rows.
///
/// Serializes as a plain array of string arrays.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RowGrid {
    rows: Vec<Vec<String>>,
}

impl RowGrid {
    pub fn new(rows: Vec<Vec<String>>) -> Self {
        Self { rows }
    }

    /// Build a grid from anything that yields rows of string-like cells.
    ///
    /// ```
    /// use tabmap::RowGrid;
    /// let grid = RowGrid::from_rows([["Name", "Age"], ["John", "20"]]);
    /// assert_eq!(grid.width(), 2);
    /// ```
    pub fn from_rows<R, C, S>(rows: R) -> Self
    where
        R: IntoIterator<Item = C>,
        C: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            rows: rows
                .into_iter()
                .map(|row| row.into_iter().map(Into::into).collect())
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Width of the widest row.
    pub fn width(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    pub fn row(&self, index: usize) -> Option<&[String]> {
        self.rows.get(index).map(Vec::as_slice)
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<Vec<String>> {
        self.rows
    }

    pub fn push(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    /// Store `cells` at `index`, growing the grid with empty rows as needed.
    pub fn set_row(&mut self, index: usize, cells: Vec<String>) {
        if self.rows.len() <= index {
            self.rows.resize_with(index + 1, Vec::new);
        }
        self.rows[index] = cells;
    }

    /// Pad every row with empty cells to the width of the widest row.
    pub fn pad(&mut self) {
        let width = self.width();
        for row in &mut self.rows {
            row.resize(width, String::new());
        }
    }

    /// Drop trailing rows whose cells are all empty. Whitespace counts as
    /// content.
    pub fn trim_trailing_empty_rows(&mut self) {
        while self.rows.last().is_some_and(|row| is_blank_row(row)) {
            self.rows.pop();
        }
    }

    /// Remove the cell at `column` from every row that has one, shifting the
    /// cells to its right one position left.
    pub fn remove_column(&mut self, column: usize) {
        for row in &mut self.rows {
            if column < row.len() {
                row.remove(column);
            }
        }
    }

    /// Cells of one column, top to bottom (empty for rows that are too short).
    pub fn column(&self, column: usize) -> Vec<&str> {
        self.rows
            .iter()
            .map(|row| row.get(column).map(String::as_str).unwrap_or(""))
            .collect()
    }
}

impl From<Vec<Vec<String>>> for RowGrid {
    fn from(rows: Vec<Vec<String>>) -> Self {
        Self::new(rows)
    }
}

fn is_blank_row(row: &[String]) -> bool {
    row.iter().all(String::is_empty)
}

/// Spreadsheet column letter for a zero-based column index (`0 -> A`,
/// `25 -> Z`, `26 -> AA`).
pub fn column_letter(index: usize) -> String {
    let mut n = index + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}

/// Zero-based column index of a spreadsheet column letter, case-insensitive.
/// Returns `None` for anything that is not a non-empty run of ASCII letters.
pub fn column_index(letter: &str) -> Option<usize> {
    if letter.is_empty() {
        return None;
    }
    let mut n = 0usize;
    for c in letter.chars() {
        if !c.is_ascii_alphabetic() {
            return None;
        }
        let digit = (c.to_ascii_uppercase() as u8 - b'A') as usize + 1;
        n = n.checked_mul(26)?.checked_add(digit)?;
    }
    Some(n - 1)
}
