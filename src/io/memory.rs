//! In-memory source and sink.

use super::{PendingGrid, TabularSink, TabularSource};
use crate::grid::RowGrid;
use anyhow::Result;

/// Serves a grid that is already in memory.
#[derive(Clone, Debug, Default)]
pub struct GridSource {
    grid: RowGrid,
}

impl GridSource {
    pub fn new(grid: RowGrid) -> Self {
        Self { grid }
    }
}

impl From<RowGrid> for GridSource {
    fn from(grid: RowGrid) -> Self {
        Self::new(grid)
    }
}

impl TabularSource for GridSource {
    fn read_grid(&mut self) -> Result<RowGrid> {
        Ok(self.grid.clone())
    }
}

/// Collects written rows into a [`RowGrid`].
///
/// Rows land at their sheet position; rows never written (for example above
/// a header placed on row 3) stay empty.
#[derive(Clone, Debug, Default)]
pub struct GridSink {
    pending: PendingGrid,
    finalized: bool,
}

impl GridSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn grid(&self) -> &RowGrid {
        self.pending.grid()
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    pub fn into_grid(self) -> RowGrid {
        self.pending.into_grid()
    }
}

impl TabularSink for GridSink {
    fn write_header_row(&mut self, row: usize, cells: &[String]) -> Result<()> {
        self.pending.set_row(row, cells)
    }

    fn write_row(&mut self, row: usize, cells: &[String]) -> Result<()> {
        self.pending.set_row(row, cells)
    }

    fn remove_column(&mut self, letter: &str) -> Result<()> {
        self.pending.remove_column(letter)
    }

    fn finalize(&mut self) -> Result<()> {
        self.finalized = true;
        Ok(())
    }
}
