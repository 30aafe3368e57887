//! CSV sources and sinks.
//!
//! This module provides:
//! - [`CsvSource`]: reads every record of a CSV stream as a grid row; the
//!   header is an ordinary row, located later through [`Options::header_row`].
//! - [`CsvSink`]: buffers written rows and serializes them on finalize, after
//!   column pruning.
//! - Typed helpers: [`read_csv_vec`] and [`write_csv_vec`].
//!
//! Rows may be ragged; the reader accepts records of any length and the
//! writer pads every row to the widest one.

use super::{PendingGrid, TabularSink, TabularSource};
use crate::field::Record;
use crate::grid::RowGrid;
use crate::options::Options;
use crate::reader::read_source;
use crate::writer::TypeWriter;
use anyhow::{Context, Result};
use std::fs::{File, create_dir_all};
use std::io::{Read, Write};
use std::path::Path;

/// Reads a CSV stream into a [`RowGrid`].
pub struct CsvSource<R> {
    reader: csv::Reader<R>,
}

impl CsvSource<File> {
    /// # Errors
    /// Returns an error if the file cannot be opened.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let f = File::open(path).with_context(|| format!("open {}", path.display()))?;
        Ok(Self::from_reader(f))
    }
}

impl<R: Read> CsvSource<R> {
    pub fn from_reader(reader: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(reader);
        Self { reader }
    }
}

impl<R: Read> TabularSource for CsvSource<R> {
    fn read_grid(&mut self) -> Result<RowGrid> {
        let mut grid = RowGrid::default();
        for (i, rec) in self.reader.records().enumerate() {
            let rec = rec.with_context(|| format!("parse CSV record #{}", i + 1))?;
            grid.push(rec.iter().map(String::from).collect());
        }
        Ok(grid)
    }
}

/// Writes rows to a CSV stream once finalized.
pub struct CsvSink<W: Write> {
    writer: Option<csv::Writer<W>>,
    pending: PendingGrid,
}

impl CsvSink<File> {
    /// Create (or truncate) `path`, creating parent directories if needed.
    ///
    /// # Errors
    /// Returns an error if the directories or the file cannot be created.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            create_dir_all(parent).with_context(|| format!("mkdir -p {}", parent.display()))?;
        }
        let f = File::create(path).with_context(|| format!("create {}", path.display()))?;
        Ok(Self::from_writer(f))
    }
}

impl<W: Write> CsvSink<W> {
    pub fn from_writer(writer: W) -> Self {
        let writer = csv::WriterBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_writer(writer);
        Self {
            writer: Some(writer),
            pending: PendingGrid::default(),
        }
    }

    /// The rows written so far, before serialization.
    pub fn grid(&self) -> &RowGrid {
        self.pending.grid()
    }

    /// Recover the underlying writer.
    ///
    /// # Errors
    /// Returns an error if buffered output cannot be flushed.
    pub fn into_inner(self) -> Result<W> {
        let writer = self
            .writer
            .context("CSV sink already consumed")?;
        writer
            .into_inner()
            .map_err(|e| anyhow::anyhow!("flush CSV writer: {}", e.error()))
    }
}

impl<W: Write> TabularSink for CsvSink<W> {
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
        let Some(writer) = self.writer.as_mut() else {
            return Ok(());
        };
        let mut grid = std::mem::take(&mut self.pending).into_grid();
        grid.pad();
        for (i, row) in grid.rows().iter().enumerate() {
            writer
                .write_record(row)
                .with_context(|| format!("serialize CSV row #{}", i + 1))?;
        }
        writer.flush()?;
        Ok(())
    }
}

/// Read a CSV file into records of `T`.
///
/// # Errors
/// Returns an error if the file cannot be read, or any
/// [`Error`](crate::Error) from decoding (recoverable with `downcast_ref`).
pub fn read_csv_vec<T: Record>(path: impl AsRef<Path>, options: &Options) -> Result<Vec<T>> {
    let path = path.as_ref();
    let mut source = CsvSource::open(path)?;
    let records = read_source::<T, _>(&mut source, options)
        .with_context(|| format!("read records from {}", path.display()))?;
    Ok(records)
}

/// Write records of `T` to a CSV file, header included.
///
/// Creates parent directories if needed.
///
/// # Returns
/// The number of records written (i.e., `data.len()`).
///
/// # Errors
/// Returns an error if the file/dirs cannot be created, or any
/// [`Error`](crate::Error) from encoding.
pub fn write_csv_vec<T: Record>(path: impl AsRef<Path>, data: &[T], options: &Options) -> Result<usize> {
    let path = path.as_ref();
    let sink = CsvSink::create(path)?;
    let mut writer = TypeWriter::<T, _>::new(sink, options.clone())?;
    writer
        .write(data)
        .with_context(|| format!("write records to {}", path.display()))?;
    writer
        .finalize()
        .with_context(|| format!("finalize {}", path.display()))?;
    Ok(data.len())
}
