//! Tabular sources and sinks.
//!
//! The mapping engine never touches files itself. It reads a whole
//! [`RowGrid`] from a [`TabularSource`] and writes a header row, data rows and
//! column removals into a [`TabularSink`]. File formats live behind these two
//! traits:
//! - [`memory`]: in-memory grids, always available.
//! - [`csv`]: comma-separated text (feature `io-csv`).
//! - [`xlsx`]: Office Open XML workbooks (feature `io-xlsx`).
//!
//! All row indices are one-based sheet rows; columns are addressed by
//! spreadsheet letter (`A`, `B`, ..., `AA`).

use crate::grid::RowGrid;
use anyhow::Result;

pub mod memory;

#[cfg_attr(docsrs, doc(cfg(feature = "io-csv")))]
#[cfg(feature = "io-csv")]
pub mod csv;

#[cfg_attr(docsrs, doc(cfg(feature = "io-xlsx")))]
#[cfg(feature = "io-xlsx")]
pub mod xlsx;

/// Supplies the full grid of one sheet, header and data rows included.
pub trait TabularSource {
    /// # Errors
    /// Any failure to read or parse the underlying data.
    fn read_grid(&mut self) -> Result<RowGrid>;
}

/// Receives encoded rows.
///
/// Calls arrive in order: one `write_header_row`, then `write_row` for
/// increasing rows, then zero or more `remove_column` calls (rightmost column
/// first), then `finalize`.
pub trait TabularSink {
    fn write_header_row(&mut self, row: usize, cells: &[String]) -> Result<()>;

    fn write_row(&mut self, row: usize, cells: &[String]) -> Result<()>;

    /// Delete a column, shifting the columns to its right one position left.
    fn remove_column(&mut self, letter: &str) -> Result<()>;

    /// Flush everything written so far to the destination.
    fn finalize(&mut self) -> Result<()>;
}

impl<S: TabularSink + ?Sized> TabularSink for &mut S {
    fn write_header_row(&mut self, row: usize, cells: &[String]) -> Result<()> {
        (**self).write_header_row(row, cells)
    }

    fn write_row(&mut self, row: usize, cells: &[String]) -> Result<()> {
        (**self).write_row(row, cells)
    }

    fn remove_column(&mut self, letter: &str) -> Result<()> {
        (**self).remove_column(letter)
    }

    fn finalize(&mut self) -> Result<()> {
        (**self).finalize()
    }
}

/// A grid buffered by file-backed sinks until they are finalized.
///
/// Shared by the CSV and XLSX sinks: both need every row in hand before
/// columns can be removed.
#[derive(Clone, Debug, Default)]
pub(crate) struct PendingGrid {
    grid: RowGrid,
}

impl PendingGrid {
    pub(crate) fn set_row(&mut self, row: usize, cells: &[String]) -> Result<()> {
        anyhow::ensure!(row >= 1, "row numbers are one-based, got {row}");
        self.grid.set_row(row - 1, cells.to_vec());
        Ok(())
    }

    pub(crate) fn remove_column(&mut self, letter: &str) -> Result<()> {
        let index = crate::grid::column_index(letter)
            .ok_or_else(|| anyhow::anyhow!("invalid column letter {letter:?}"))?;
        self.grid.remove_column(index);
        Ok(())
    }

    pub(crate) fn grid(&self) -> &RowGrid {
        &self.grid
    }

    pub(crate) fn into_grid(self) -> RowGrid {
        self.grid
    }
}
