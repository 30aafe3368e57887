//! # tabmap
//!
//! A **bidirectional mapping engine** between typed, nested Rust records and
//! header-driven tabular data (rows of text cells), for CSV files, XLSX
//! workbooks, or any grid you can produce yourself.
//!
//! ## Key Features
//!
//! - **Declarative records** - declare a struct with [`tabular!`] and annotate
//!   fields with a small directive language (`column:`, `primary`, `omitempty`, ...)
//! - **Nested records** - nested and optional nested structs flatten into
//!   prefixed columns and come back out again
//! - **One-to-many collections** - a `Vec` of records is spread over repeated
//!   rows on write and regrouped by primary key on read
//! - **Column pruning** - columns that never carry a value can be dropped on write
//! - **File formats** - CSV and XLSX, both optional via feature flags
//!
//! ## Quick Start
//!
//! ```
//! use tabmap::*;
//! # use anyhow::Result;
//!
//! tabular! {
//!     #[derive(Debug, Clone, Default, PartialEq)]
//!     pub struct Job {
//!         pub position: String,
//!         pub years: u32 => "omitempty",
//!     }
//! }
//!
//! tabular! {
//!     #[derive(Debug, Clone, Default, PartialEq)]
//!     pub struct Person {
//!         pub name: String => "primary",
//!         pub age: u32,
//!         pub jobs: Vec<Job> => "prefix:job_",
//!     }
//! }
//!
//! # fn main() -> Result<()> {
//! let people = vec![Person {
//!     name: "John".into(),
//!     age: 20,
//!     jobs: vec![
//!         Job { position: "Engineer".into(), years: 2 },
//!         Job { position: "Manager".into(), years: 0 },
//!     ],
//! }];
//!
//! // Name | Age | Job_position | Job_years
//! // John | 20  | Engineer     | 2
//! // John | 20  | Manager      | 0
//! let grid = write_grid(&people, &Options::default())?;
//!
//! let back: Vec<Person> = read_grid(grid, &Options::default())?;
//! assert_eq!(back, people);
//! # Ok(())
//! # }
//! ```
//!
//! ## Core Concepts
//!
//! ### Schema
//!
//! A [`Schema`] is the ordered column model of a record type, derived once per
//! type by [`schema_for`] and cached. Every column carries the *path* of field
//! indices leading to it from the root record, so rows are read and written by
//! walking those paths instead of re-inspecting the type.
//!
//! ### Decoding
//!
//! [`TypeReader`] binds a grid's header row to the schema (case-insensitive,
//! alias-aware) and decodes every data row with a [`RowDecoder`]. When the
//! record has a collection, consecutive rows with the same primary key fold
//! into one record.
//!
//! ### Encoding
//!
//! [`TypeWriter`] encodes batches with a [`RowEncoder`] into any
//! [`TabularSink`](io::TabularSink): the header is written on the first
//! non-empty batch and never-filled columns are pruned on
//! [`finalize`](TypeWriter::finalize).
//!
//! ## Feature Flags
//!
//! - `io-csv` - CSV sources and sinks
//! - `io-xlsx` - XLSX sources and sinks
//! - `parallel-io` - [`RowEncoder::encode_par`]
//!
//! ## Module Overview
//!
//! - [`field`] / [`macros`] / [`tag`] - how record types describe themselves
//! - [`value`] - text <-> scalar coercion
//! - [`schema`] - schema derivation and caching
//! - [`decoder`] / [`reader`] - rows to records
//! - [`encoder`] / [`writer`] - records to rows
//! - [`io`] - tabular sources and sinks
//! - [`testing`] - fixtures and assertions for tests

mod access;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod field;
pub mod grid;
pub mod io;
#[macro_use]
pub mod macros;
pub mod options;
pub mod reader;
pub mod schema;
pub mod tag;
pub mod testing;
pub mod type_token;
pub mod value;
pub mod writer;

// General re-exports
pub use decoder::RowDecoder;
pub use encoder::RowEncoder;
pub use error::{CellError, DecodeError, EncodeError, Error, Result, RowError, SchemaError};
pub use field::{DynCollection, DynRecord, Field, FieldDef, Nested, Record, Shape, Unsupported};
pub use grid::{RowGrid, column_index, column_letter};
pub use options::Options;
pub use reader::{TypeReader, read_grid, read_source};
pub use schema::{ColumnKind, ColumnSpec, MAX_NESTING_DEPTH, Schema, schema_for};
pub use type_token::TypeTag;
pub use value::CellValue;
pub use writer::{TypeWriter, WriterState, write_grid};

// Gated re-exports
#[cfg(feature = "io-csv")]
pub use io::csv::{CsvSink, CsvSource, read_csv_vec, write_csv_vec};

#[cfg(feature = "io-xlsx")]
pub use io::xlsx::{XlsxSink, XlsxSource, read_xlsx_vec, write_xlsx_vec};
