//! Error taxonomy for schema derivation, decoding, and encoding.
//!
//! Every failure surfaced by the engine falls into one of three families:
//! - [`SchemaError`]: the record type cannot be described as a flat column model.
//!   Always fatal and raised before any row is touched.
//! - [`RowError`]: a row (or the header) could not be decoded. Carries the
//!   one-based sheet row number when the failure is tied to a data row.
//! - [`EncodeError`]: a record batch could not be written to its sink.
//!
//! The crate-level [`Error`] wraps all of them, plus source failures and
//! internal faults (panics raised by user field implementations, caught at the
//! batch boundary by [`catch_internal`]).

use std::any::Any;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use thiserror::Error;

/// Convenience result alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Reasons a record type cannot be turned into a [`Schema`](crate::Schema).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("unsupported field type `{type_name}` for field `{field}`")]
    UnsupportedType { field: String, type_name: String },

    #[error("field `{field}` is an optional of an optional, which is not supported")]
    NestedOption { field: String },

    #[error("field `{field}` is an optional collection, which is not supported")]
    OptionalCollection { field: String },

    #[error("field `{field}` is a collection of non-record elements (`{element}`)")]
    NonRecordCollection { field: String, element: String },

    #[error("multiple primary keys are not allowed (`{first}` and `{second}`)")]
    MultiplePrimaryKeys { first: String, second: String },

    #[error("only one collection is allowed (`{first}` and `{second}`)")]
    MultipleCollections { first: String, second: String },

    #[error("duplicate column name `{name}` at depth {depth}")]
    DuplicateColumn { name: String, depth: usize },

    #[error("collection `{collection}` requires a primary key column")]
    PrimaryKeyRequired { collection: String },

    #[error("primary key `{field}` must be a scalar outside the collection")]
    InvalidPrimaryKey { field: String },

    #[error("field `{field}` is nested {depth} levels deep (maximum {max})")]
    ExcessiveNesting { field: String, depth: usize, max: usize },

    #[error("invalid directive `{directive}` on field `{field}`")]
    InvalidDirective { field: String, directive: String },
}

/// A single cell could not be coerced into (or out of) its field type.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CellError {
    #[error("invalid bool value: {0}")]
    InvalidBool(String),

    #[error("invalid integer value: {value} ({reason})")]
    InvalidInt { value: String, reason: String },

    #[error("invalid float value: {value} ({reason})")]
    InvalidFloat { value: String, reason: String },

    #[error("invalid char value: {0}")]
    InvalidChar(String),

    #[error("invalid date/time value: {value} (expected {expected})")]
    InvalidDate { value: String, expected: &'static str },

    #[error("{0}")]
    Custom(String),

    #[error("field does not hold a scalar value")]
    NotScalar,
}

impl CellError {
    /// Build a [`CellError::Custom`] from any displayable message.
    pub fn custom<M: fmt::Display>(message: M) -> Self {
        CellError::Custom(message.to_string())
    }
}

/// Failures while turning text rows into records.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("required column {0} is not present")]
    MissingRequiredColumn(String),

    #[error("required column {0} is empty")]
    EmptyRequiredColumn(String),

    #[error("error parsing cell value {value:?} of column {column}: {source}")]
    InvalidCell {
        column: String,
        value: String,
        #[source]
        source: CellError,
    },

    #[error("header row {header_row} is out of bounds ({rows} rows available)")]
    HeaderOutOfBounds { header_row: usize, rows: usize },
}

/// A [`DecodeError`] tagged with the sheet row it came from.
///
/// `row` is the one-based sheet row number, or `None` when the error is not tied
/// to a single data row (e.g. a required header is missing).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowError {
    pub row: Option<usize>,
    pub source: DecodeError,
}

impl RowError {
    pub fn new(row: usize, source: DecodeError) -> Self {
        Self { row: Some(row), source }
    }

    pub fn non_indexed(source: DecodeError) -> Self {
        Self { row: None, source }
    }
}

impl fmt::Display for RowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.row {
            Some(row) => write!(f, "row {}: {}", row, self.source),
            None => write!(f, "{}", self.source),
        }
    }
}

impl std::error::Error for RowError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

/// Failures while writing records to a sink.
#[derive(Error, Debug)]
pub enum EncodeError {
    #[error(transparent)]
    Sink(#[from] anyhow::Error),

    #[error("writer has already been finalized")]
    Finalized,
}

/// Unified error type returned by the reader and writer front-ends.
#[derive(Error, Debug)]
pub enum Error {
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Row(#[from] RowError),

    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error("tabular source failed: {0:#}")]
    Source(anyhow::Error),

    #[error("invalid options: {0}")]
    InvalidOptions(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// The row number attached to a decode failure, if any.
    pub fn row(&self) -> Option<usize> {
        match self {
            Error::Row(e) => e.row,
            _ => None,
        }
    }
}

/// Run `f`, converting a panic into [`Error::Internal`].
///
/// User-supplied [`Field`](crate::Field) and [`CellValue`](crate::CellValue)
/// implementations run inside derivation and row processing; a panic in one of
/// them must surface as an ordinary error result for batch callers.
pub fn catch_internal<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T>,
{
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(res) => res,
        Err(payload) => Err(Error::Internal(panic_message(payload.as_ref()))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panic: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panic: {s}")
    } else {
        "panic: <non-string payload>".to_string()
    }
}
