//! Text rows to records.
//!
//! A [`RowDecoder`] is bound to one header row. Every row decodes into a
//! fresh record; when the schema has a collection, each row also yields at
//! most one collection element, and consecutive rows sharing a primary-key
//! value are folded into a single record.

use crate::access::{collection_at_mut, field_at_mut, prune_untouched};
use crate::error::{CellError, DecodeError, RowError};
use crate::field::{DynRecord, Record};
use crate::schema::{ColumnKind, ColumnSpec, Schema, fold};
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;

/// A schema column bound to its header position.
#[derive(Clone, Debug)]
struct Binding {
    /// Schema position.
    column: usize,
    /// Path from the record the binding is applied to (the root record, or
    /// the collection element for collection members).
    path: Vec<usize>,
    /// Header position, `None` when the sheet has no such column.
    position: Option<usize>,
}

/// Decodes rows laid out under one header row into records of type `T`.
#[derive(Debug)]
pub struct RowDecoder<T> {
    schema: Arc<Schema>,
    root: Vec<Binding>,
    members: Vec<Binding>,
    collection_path: Option<Vec<usize>>,
    root_optionals: Vec<Vec<usize>>,
    member_optionals: Vec<Vec<usize>>,
    _record: PhantomData<fn() -> T>,
}

impl<T: Record> RowDecoder<T> {
    /// Bind `schema` to `headers`.
    ///
    /// Header matching is case-insensitive and ignores surrounding whitespace;
    /// aliases are tried after the column's own name. When a header repeats,
    /// the leftmost occurrence wins.
    ///
    /// # Errors
    /// [`DecodeError::MissingRequiredColumn`] (without a row number) when a
    /// required or primary-key column has no header and no default value.
    pub fn new(schema: Arc<Schema>, headers: &[String]) -> Result<Self, RowError> {
        let mut header_positions: HashMap<String, usize> = HashMap::with_capacity(headers.len());
        for (position, header) in headers.iter().enumerate() {
            header_positions.entry(fold(header)).or_insert(position);
        }

        let collection = schema.collection();
        let member_depth = collection.map_or(0, ColumnSpec::depth);
        let mut root = Vec::new();
        let mut members = Vec::new();

        for (index, column) in schema.columns().iter().enumerate() {
            if column.kind == ColumnKind::Collection {
                continue;
            }
            let position = header_positions.get(&column.key()).copied().or_else(|| {
                column
                    .aliases
                    .iter()
                    .find_map(|alias| header_positions.get(&fold(alias)).copied())
            });
            if position.is_none()
                && (column.required || column.is_primary_key)
                && column.default_value.is_none()
            {
                return Err(RowError::non_indexed(DecodeError::MissingRequiredColumn(
                    column.name.clone(),
                )));
            }
            if schema.is_member_of_collection(column) {
                members.push(Binding {
                    column: index,
                    path: column.path[member_depth..].to_vec(),
                    position,
                });
            } else {
                root.push(Binding {
                    column: index,
                    path: column.path.clone(),
                    position,
                });
            }
        }

        let mut root_optionals = Vec::new();
        let mut member_optionals = Vec::new();
        for spec in schema.nested() {
            if spec.kind != ColumnKind::RecordRef {
                continue;
            }
            if schema.is_member_of_collection(spec) {
                member_optionals.push(spec.path[member_depth..].to_vec());
            } else {
                root_optionals.push(spec.path.clone());
            }
        }

        Ok(Self {
            collection_path: collection.map(|c| c.path.clone()),
            schema,
            root,
            members,
            root_optionals,
            member_optionals,
            _record: PhantomData,
        })
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Decode a single row.
    ///
    /// Returns the record and its normalized primary-key value. For schemas
    /// with a collection, the record's collection holds at most one element:
    /// the one described by this row, present only when at least one member
    /// cell carried a value.
    ///
    /// # Errors
    /// A [`RowError`] tagged with `row_number` when a required cell is empty
    /// or a cell does not coerce into its field type.
    pub fn decode_one(&self, row: &[String], row_number: usize) -> Result<(T, Option<String>), RowError> {
        let mut record = T::default();
        let mut touched: Vec<Vec<usize>> = Vec::new();
        let mut key = None;

        for binding in &self.root {
            let column = &self.schema.columns()[binding.column];
            let Some(text) = cell_text(column, binding, row, row_number)? else {
                continue;
            };
            if column.is_primary_key {
                key = Some(fold(&text));
            }
            assign(&mut record, column, &binding.path, &text, row_number)?;
            touched.push(binding.path.clone());
        }

        if let Some(collection_path) = &self.collection_path
            && let Some(collection) = collection_at_mut(&mut record, collection_path)
        {
            let element = collection.push_default();
            let mut element_touched: Vec<Vec<usize>> = Vec::new();
            for binding in &self.members {
                let column = &self.schema.columns()[binding.column];
                let Some(text) = cell_text(column, binding, row, row_number)? else {
                    continue;
                };
                assign(element, column, &binding.path, &text, row_number)?;
                element_touched.push(binding.path.clone());
            }
            if element_touched.is_empty() {
                collection.pop();
            } else {
                prune_untouched(
                    element,
                    self.member_optionals.iter().map(Vec::as_slice),
                    &element_touched,
                );
                touched.push(collection_path.clone());
            }
        }

        prune_untouched(
            &mut record,
            self.root_optionals.iter().map(Vec::as_slice),
            &touched,
        );
        log::trace!("decoded row {row_number} (key {key:?})");
        Ok((record, key))
    }

    /// Decode a sequence of `(row number, cells)` pairs.
    ///
    /// With a collection in the schema, a row whose key equals the key of the
    /// row immediately before it is merged into the previous record: its
    /// collection element, if any, is appended and the rest of the row is
    /// discarded. Key comparison is on the trimmed, case-folded cell text.
    ///
    /// # Errors
    /// The first row error encountered; no records are returned in that case.
    pub fn decode<'r, I>(&self, rows: I) -> Result<Vec<T>, RowError>
    where
        I: IntoIterator<Item = (usize, &'r [String])>,
    {
        let mut out: Vec<T> = Vec::new();
        let mut previous: Option<String> = None;
        for (row_number, row) in rows {
            let (mut record, key) = self.decode_one(row, row_number)?;
            if let Some(collection_path) = &self.collection_path
                && key.is_some()
                && key == previous
                && let Some(last) = out.last_mut()
            {
                if let (Some(target), Some(source)) = (
                    collection_at_mut(last, collection_path),
                    collection_at_mut(&mut record, collection_path),
                ) {
                    let merged = target.append_from(source);
                    debug_assert!(merged, "collection type differs between rows");
                    if merged {
                        log::debug!(
                            "row {row_number} grouped into record with key {:?} ({} elements)",
                            key.as_deref().unwrap_or_default(),
                            target.len()
                        );
                    } else {
                        log::warn!("row {row_number}: collection element dropped, type mismatch");
                    }
                }
                continue;
            }
            out.push(record);
            previous = key;
        }
        Ok(out)
    }
}

/// Cell text for `binding`, with the column default substituted for absent
/// and empty cells. Whitespace is content, not emptiness. `None` means
/// "leave the field at its default".
fn cell_text(
    column: &ColumnSpec,
    binding: &Binding,
    row: &[String],
    row_number: usize,
) -> Result<Option<String>, RowError> {
    let cell = binding
        .position
        .and_then(|p| row.get(p))
        .filter(|cell| !cell.is_empty());
    if let Some(cell) = cell {
        return Ok(Some(cell.clone()));
    }
    if let Some(default) = column.default_value.as_ref().filter(|d| !d.is_empty()) {
        return Ok(Some(default.clone()));
    }
    if column.required || column.is_primary_key {
        let err = match binding.position {
            Some(_) => DecodeError::EmptyRequiredColumn(column.name.clone()),
            None => DecodeError::MissingRequiredColumn(column.name.clone()),
        };
        return Err(RowError::new(row_number, err));
    }
    Ok(None)
}

fn assign(
    record: &mut dyn DynRecord,
    column: &ColumnSpec,
    path: &[usize],
    text: &str,
    row_number: usize,
) -> Result<(), RowError> {
    let result = match field_at_mut(record, path) {
        Some(field) => field.set_cell(text),
        None => Err(CellError::NotScalar),
    };
    result.map_err(|source| {
        RowError::new(
            row_number,
            DecodeError::InvalidCell {
                column: column.name.clone(),
                value: text.to_string(),
                source,
            },
        )
    })
}
