//! Writing records into a tabular sink.

use crate::encoder::RowEncoder;
use crate::error::{EncodeError, Result, catch_internal};
use crate::field::Record;
use crate::grid::{RowGrid, column_letter};
use crate::io::TabularSink;
use crate::io::memory::GridSink;
use crate::options::Options;
use crate::schema::{Schema, schema_for};
use anyhow::Context;
use std::sync::Arc;

/// Lifecycle of a [`TypeWriter`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WriterState {
    /// Nothing written yet; the header is still pending.
    Created,
    /// Header written by the first non-empty [`TypeWriter::write`].
    HeaderWritten,
    /// At least one batch of data rows written.
    DataAppended,
    /// Pruned and flushed; no further writes accepted.
    Finalized,
}

/// Encodes batches of records of type `T` into a [`TabularSink`].
///
/// The header row is written lazily on the first non-empty batch. Columns are
/// pruned once, on [`finalize`](Self::finalize), after every batch has been
/// seen.
///
/// ```
/// use tabmap::testing::{Employee, sample_employees};
/// use tabmap::{Options, TypeWriter, io::memory::GridSink};
///
/// # fn main() -> tabmap::Result<()> {
/// let employees = sample_employees();
/// let mut writer = TypeWriter::<Employee, _>::new(GridSink::new(), Options::default())?;
/// writer.write(&employees)?;
/// writer.finalize()?;
/// let grid = writer.into_sink().into_grid();
/// assert_eq!(grid.row(0).map(|h| h[0].as_str()), Some("Name"));
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct TypeWriter<T, S> {
    sink: S,
    encoder: RowEncoder<T>,
    options: Options,
    state: WriterState,
    next_row: usize,
    pruned: bool,
}

impl<T: Record, S: TabularSink> TypeWriter<T, S> {
    /// # Errors
    /// [`Error::InvalidOptions`](crate::Error::InvalidOptions) or
    /// [`Error::Schema`](crate::Error::Schema).
    pub fn new(sink: S, options: Options) -> Result<Self> {
        options.validate()?;
        let schema = schema_for::<T>()?;
        Ok(Self {
            sink,
            encoder: RowEncoder::new(schema),
            next_row: options.data_start_row,
            options,
            state: WriterState::Created,
            pruned: false,
        })
    }

    /// Encode and append a batch. An empty batch is a no-op.
    ///
    /// # Errors
    /// - [`EncodeError::Finalized`] after [`finalize`](Self::finalize).
    /// - [`EncodeError::Sink`] when the sink rejects the header or a row.
    /// - [`Error::Internal`](crate::Error::Internal) when a field
    ///   implementation panics.
    pub fn write(&mut self, records: &[T]) -> Result<()> {
        if self.state == WriterState::Finalized {
            return Err(EncodeError::Finalized.into());
        }
        if records.is_empty() {
            return Ok(());
        }
        let encoder = &mut self.encoder;
        let grid = catch_internal(|| Ok(encoder.encode(records)))?;

        if self.state == WriterState::Created {
            let headers = self.encoder.headers();
            self.sink
                .write_header_row(self.options.header_row, &headers)
                .with_context(|| format!("write header row {}", self.options.header_row))
                .map_err(EncodeError::Sink)?;
            self.state = WriterState::HeaderWritten;
        }
        for row in grid.rows() {
            self.sink
                .write_row(self.next_row, row)
                .with_context(|| format!("write row {}", self.next_row))
                .map_err(EncodeError::Sink)?;
            self.next_row += 1;
        }
        self.state = WriterState::DataAppended;
        log::trace!("appended {} records as {} rows", records.len(), grid.len());
        Ok(())
    }

    /// Prune never-filled columns and flush the sink.
    ///
    /// Calling it again is a no-op.
    ///
    /// # Errors
    /// [`EncodeError::Sink`] when the sink fails to remove a column or flush.
    pub fn finalize(&mut self) -> Result<()> {
        if self.state == WriterState::Finalized {
            return Ok(());
        }
        if !self.pruned && self.state != WriterState::Created {
            let prunable = self.encoder.prunable_columns();
            for &column in prunable.iter().rev() {
                let letter = column_letter(column);
                self.sink
                    .remove_column(&letter)
                    .with_context(|| format!("remove column {letter}"))
                    .map_err(EncodeError::Sink)?;
            }
            if !prunable.is_empty() {
                let headers = self.encoder.headers();
                let names: Vec<&str> = prunable.iter().map(|&x| headers[x].as_str()).collect();
                log::info!("pruned {} empty columns: {}", names.len(), names.join(", "));
            }
            self.pruned = true;
        }
        self.sink
            .finalize()
            .context("finalize sink")
            .map_err(EncodeError::Sink)?;
        self.state = WriterState::Finalized;
        Ok(())
    }

    pub fn state(&self) -> WriterState {
        self.state
    }

    pub fn schema(&self) -> &Arc<Schema> {
        self.encoder.schema()
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }
}

/// Encode `records` into a finalized in-memory grid (header row included).
pub fn write_grid<T: Record>(records: &[T], options: &Options) -> Result<RowGrid> {
    let mut writer = TypeWriter::<T, _>::new(GridSink::new(), options.clone())?;
    writer.write(records)?;
    writer.finalize()?;
    Ok(writer.into_sink().into_grid())
}
