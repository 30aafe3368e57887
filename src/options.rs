//! Reader and writer configuration.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Layout options shared by [`TypeReader`](crate::TypeReader) and
/// [`TypeWriter`](crate::TypeWriter).
///
/// Row indices are one-based sheet rows. Missing keys in a serialized
/// configuration fall back to their defaults:
///
/// ```
/// use tabmap::Options;
/// # fn main() -> tabmap::Result<()> {
/// let opts = Options::from_json(r#"{ "header_row": 3, "data_start_row": 5 }"#)?;
/// assert_eq!(opts.header_row, 3);
/// assert!(opts.trim_empty_rows);
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Row holding the column names.
    pub header_row: usize,
    /// First data row. Must come after the header row.
    pub data_start_row: usize,
    /// Drop trailing rows whose cells are all empty before decoding.
    pub trim_empty_rows: bool,
    /// Worksheet used by spreadsheet sources and sinks. `None` selects the
    /// first sheet when reading and the default sheet name when writing.
    pub sheet: Option<String>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            header_row: 1,
            data_start_row: 2,
            trim_empty_rows: true,
            sheet: None,
        }
    }
}

impl Options {
    /// Parse options from a JSON document.
    ///
    /// # Errors
    /// [`Error::InvalidOptions`] when the document does not parse or the
    /// resulting options do not [`validate`](Self::validate).
    pub fn from_json(text: &str) -> Result<Self> {
        let opts: Options =
            serde_json::from_str(text).map_err(|e| Error::InvalidOptions(e.to_string()))?;
        opts.validate()?;
        Ok(opts)
    }

    pub fn with_header_row(mut self, row: usize) -> Self {
        self.header_row = row;
        self
    }

    pub fn with_data_start_row(mut self, row: usize) -> Self {
        self.data_start_row = row;
        self
    }

    pub fn with_sheet(mut self, sheet: impl Into<String>) -> Self {
        self.sheet = Some(sheet.into());
        self
    }

    pub fn with_trim_empty_rows(mut self, trim: bool) -> Self {
        self.trim_empty_rows = trim;
        self
    }

    /// Check that the row layout is usable.
    ///
    /// # Errors
    /// [`Error::InvalidOptions`] when `header_row` is zero or `data_start_row`
    /// does not come after it.
    pub fn validate(&self) -> Result<()> {
        if self.header_row == 0 {
            return Err(Error::InvalidOptions(
                "header_row is one-based and must be at least 1".into(),
            ));
        }
        if self.data_start_row <= self.header_row {
            return Err(Error::InvalidOptions(format!(
                "data_start_row ({}) must come after header_row ({})",
                self.data_start_row, self.header_row
            )));
        }
        Ok(())
    }
}
