//! Reading records out of a tabular source.

use crate::decoder::RowDecoder;
use crate::error::{DecodeError, Error, Result, RowError, catch_internal};
use crate::field::Record;
use crate::grid::RowGrid;
use crate::io::TabularSource;
use crate::options::Options;
use crate::schema::{Schema, schema_for};
use std::sync::Arc;

/// Decodes the data rows of a grid into records of type `T`.
///
/// Construction does all the up-front work (schema lookup, option and header
/// validation, required-column checks); [`read`](Self::read) then walks the
/// data rows from [`Options::data_start_row`] on.
#[derive(Debug)]
pub struct TypeReader<T> {
    grid: RowGrid,
    decoder: RowDecoder<T>,
    headers: Vec<String>,
    next_row: usize,
}

impl<T: Record> TypeReader<T> {
    /// Bind a grid to the schema of `T`.
    ///
    /// # Errors
    /// - [`Error::InvalidOptions`] for an unusable row layout.
    /// - [`Error::Schema`] when `T` cannot be mapped.
    /// - [`Error::Row`] with [`DecodeError::HeaderOutOfBounds`] when the grid
    ///   has no header row, or [`DecodeError::MissingRequiredColumn`] when a
    ///   required column has no header.
    pub fn new(mut grid: RowGrid, options: &Options) -> Result<Self> {
        options.validate()?;
        let schema = schema_for::<T>()?;
        if options.trim_empty_rows {
            grid.trim_trailing_empty_rows();
        }
        grid.pad();

        let headers = grid
            .row(options.header_row - 1)
            .ok_or_else(|| {
                RowError::non_indexed(DecodeError::HeaderOutOfBounds {
                    header_row: options.header_row,
                    rows: grid.len(),
                })
            })?
            .to_vec();
        let decoder = RowDecoder::new(schema, &headers)?;
        Ok(Self {
            grid,
            decoder,
            headers,
            next_row: options.data_start_row - 1,
        })
    }

    /// Read the whole grid of `source` and bind it.
    ///
    /// # Errors
    /// [`Error::Source`] when the source fails, otherwise as [`new`](Self::new).
    pub fn from_source<S: TabularSource + ?Sized>(source: &mut S, options: &Options) -> Result<Self> {
        let grid = source.read_grid().map_err(Error::Source)?;
        Self::new(grid, options)
    }

    /// Decode every remaining data row.
    ///
    /// Row numbers in errors are one-based sheet rows. A panic raised by a
    /// field implementation is reported as [`Error::Internal`].
    pub fn read(&mut self) -> Result<Vec<T>> {
        let start = self.next_row;
        let end = self.grid.len().max(start);
        let rows = &self.grid.rows()[start.min(self.grid.len())..];
        let decoder = &self.decoder;
        let records = catch_internal(|| {
            decoder
                .decode(
                    rows.iter()
                        .enumerate()
                        .map(|(offset, row)| (start + offset + 1, row.as_slice())),
                )
                .map_err(Error::from)
        })?;
        self.next_row = end;
        log::debug!(
            "read {} records of {} from rows {}..={}",
            records.len(),
            self.decoder.schema().type_tag(),
            start + 1,
            end
        );
        Ok(records)
    }

    /// Header cells as they appear in the sheet.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn schema(&self) -> &Arc<Schema> {
        self.decoder.schema()
    }
}

/// Decode the records of `T` from an in-memory grid.
pub fn read_grid<T: Record>(grid: RowGrid, options: &Options) -> Result<Vec<T>> {
    TypeReader::<T>::new(grid, options)?.read()
}

/// Decode the records of `T` from any tabular source.
pub fn read_source<T: Record, S: TabularSource + ?Sized>(source: &mut S, options: &Options) -> Result<Vec<T>> {
    TypeReader::<T>::from_source(source, options)?.read()
}
