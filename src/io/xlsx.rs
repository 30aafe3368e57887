//! XLSX workbooks: `calamine` for reading, `rust_xlsxwriter` for writing.
//!
//! Every cell is read as text: strings as-is, numbers and booleans through
//! their display form, empty cells as `""`. Written cells are always strings;
//! cells with no text are left unwritten. Styling is not supported.

use super::{PendingGrid, TabularSink, TabularSource};
use crate::field::Record;
use crate::grid::RowGrid;
use crate::options::Options;
use crate::reader::read_source;
use crate::writer::TypeWriter;
use anyhow::{Context, Result, anyhow};
use calamine::{Data, Reader, Xlsx, open_workbook};
use rust_xlsxwriter::Workbook;
use std::fs::{File, create_dir_all};
use std::io::{BufReader, Read, Seek};
use std::path::{Path, PathBuf};

/// Sheet name used when none is configured.
pub const DEFAULT_SHEET: &str = "Sheet1";

/// Reads one worksheet of an XLSX workbook.
pub struct XlsxSource<RS: Read + Seek> {
    workbook: Xlsx<RS>,
    sheet: Option<String>,
}

impl XlsxSource<BufReader<File>> {
    /// # Errors
    /// Returns an error if the file cannot be opened as a workbook.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let workbook: Xlsx<_> =
            open_workbook(path).map_err(|e| anyhow!("open workbook {}: {e}", path.display()))?;
        Ok(Self {
            workbook,
            sheet: None,
        })
    }
}

impl<RS: Read + Seek> XlsxSource<RS> {
    /// # Errors
    /// Returns an error if the stream is not an XLSX workbook.
    pub fn from_reader(reader: RS) -> Result<Self> {
        let workbook = Xlsx::new(reader).map_err(|e| anyhow!("open workbook: {e}"))?;
        Ok(Self {
            workbook,
            sheet: None,
        })
    }

    /// Read the named worksheet instead of the first one.
    #[must_use]
    pub fn with_sheet(mut self, sheet: Option<impl Into<String>>) -> Self {
        self.sheet = sheet.map(Into::into);
        self
    }
}

impl<RS: Read + Seek> TabularSource for XlsxSource<RS> {
    fn read_grid(&mut self) -> Result<RowGrid> {
        let sheet = match &self.sheet {
            Some(sheet) => sheet.clone(),
            None => self
                .workbook
                .sheet_names()
                .first()
                .cloned()
                .context("workbook has no worksheets")?,
        };
        let range = self
            .workbook
            .worksheet_range(&sheet)
            .map_err(|e| anyhow!("read worksheet {sheet:?}: {e}"))?;

        // The range starts at the first used cell, not at A1.
        let (first_row, first_col) = range
            .start()
            .map_or((0, 0), |(r, c)| (r as usize, c as usize));
        let mut grid = RowGrid::default();
        for _ in 0..first_row {
            grid.push(Vec::new());
        }
        for row in range.rows() {
            let mut cells = vec![String::new(); first_col];
            cells.extend(row.iter().map(cell_text));
            grid.push(cells);
        }
        Ok(grid)
    }
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => f.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::Empty => String::new(),
        other => other.to_string(),
    }
}

enum Target {
    File(PathBuf),
    Memory,
}

/// Writes one worksheet, either to a file or to an in-memory buffer.
pub struct XlsxSink {
    target: Target,
    sheet: String,
    pending: PendingGrid,
    buffer: Option<Vec<u8>>,
    saved: bool,
}

impl XlsxSink {
    /// Write to `path` on finalize, creating parent directories now.
    ///
    /// # Errors
    /// Returns an error if the parent directories cannot be created.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            create_dir_all(parent).with_context(|| format!("mkdir -p {}", parent.display()))?;
        }
        Ok(Self::with_target(Target::File(path.to_path_buf())))
    }

    /// Keep the saved workbook in memory; see [`into_buffer`](Self::into_buffer).
    pub fn in_memory() -> Self {
        Self::with_target(Target::Memory)
    }

    fn with_target(target: Target) -> Self {
        Self {
            target,
            sheet: DEFAULT_SHEET.to_string(),
            pending: PendingGrid::default(),
            buffer: None,
            saved: false,
        }
    }

    #[must_use]
    pub fn with_sheet(mut self, sheet: Option<impl Into<String>>) -> Self {
        if let Some(sheet) = sheet {
            self.sheet = sheet.into();
        }
        self
    }

    /// The rows written so far.
    pub fn grid(&self) -> &RowGrid {
        self.pending.grid()
    }

    /// Workbook bytes of an in-memory sink, available after finalize.
    pub fn into_buffer(self) -> Option<Vec<u8>> {
        self.buffer
    }
}

impl TabularSink for XlsxSink {
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
        if self.saved {
            return Ok(());
        }
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet
            .set_name(&self.sheet)
            .map_err(|e| anyhow!("name worksheet {:?}: {e}", self.sheet))?;
        for (r, row) in self.pending.grid().rows().iter().enumerate() {
            let row_num = u32::try_from(r).with_context(|| format!("row {} out of range", r + 1))?;
            for (c, cell) in row.iter().enumerate() {
                if cell.is_empty() {
                    continue;
                }
                let col_num =
                    u16::try_from(c).with_context(|| format!("column {} out of range", c + 1))?;
                worksheet
                    .write_string(row_num, col_num, cell.as_str())
                    .map_err(|e| anyhow!("write cell ({}, {}): {e}", r + 1, c + 1))?;
            }
        }
        match &self.target {
            Target::File(path) => workbook
                .save(path)
                .map_err(|e| anyhow!("save workbook {}: {e}", path.display()))?,
            Target::Memory => {
                let bytes = workbook
                    .save_to_buffer()
                    .map_err(|e| anyhow!("save workbook: {e}"))?;
                self.buffer = Some(bytes);
            }
        }
        self.saved = true;
        Ok(())
    }
}

/// Read an XLSX file into records of `T`, from [`Options::sheet`] or the
/// first worksheet.
///
/// # Errors
/// Returns an error if the workbook cannot be read, or any
/// [`Error`](crate::Error) from decoding.
pub fn read_xlsx_vec<T: Record>(path: impl AsRef<Path>, options: &Options) -> Result<Vec<T>> {
    let path = path.as_ref();
    let mut source = XlsxSource::open(path)?.with_sheet(options.sheet.as_deref());
    let records = read_source::<T, _>(&mut source, options)
        .with_context(|| format!("read records from {}", path.display()))?;
    Ok(records)
}

/// Write records of `T` to an XLSX file, header included.
///
/// # Returns
/// The number of records written.
///
/// # Errors
/// Returns an error if the workbook cannot be saved, or any
/// [`Error`](crate::Error) from encoding.
pub fn write_xlsx_vec<T: Record>(path: impl AsRef<Path>, data: &[T], options: &Options) -> Result<usize> {
    let path = path.as_ref();
    let sink = XlsxSink::create(path)?.with_sheet(options.sheet.as_deref());
    let mut writer = TypeWriter::<T, _>::new(sink, options.clone())?;
    writer
        .write(data)
        .with_context(|| format!("write records to {}", path.display()))?;
    writer
        .finalize()
        .with_context(|| format!("finalize {}", path.display()))?;
    Ok(data.len())
}
