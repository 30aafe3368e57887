//! Records to text rows.
//!
//! The output layout is the schema's column order with the collection column
//! elided. A record without a collection produces one row. A record with a
//! collection of `N` elements produces `max(N, 1)` rows: scalar columns are
//! repeated on every row and member columns of row `j` come from element `j`.
//!
//! The encoder also remembers, per output column, whether any emitted cell
//! carried a non-blank value. [`RowEncoder::prunable_columns`] turns that into
//! the set of columns a writer drops on finalize.

use crate::access::{collection_at, field_at};
use crate::field::{DynCollection, Field, Record};
use crate::grid::RowGrid;
use crate::schema::{ColumnSpec, Schema};
use std::marker::PhantomData;
use std::sync::Arc;

#[derive(Clone, Debug)]
struct Output {
    /// Schema position.
    column: usize,
    /// Path from the root record, or from the collection element for members.
    path: Vec<usize>,
    member: bool,
}

/// Encodes records of type `T` into rows.
#[derive(Debug)]
pub struct RowEncoder<T> {
    schema: Arc<Schema>,
    outputs: Vec<Output>,
    collection_path: Option<Vec<usize>>,
    seen: Vec<bool>,
    _record: PhantomData<fn(&T)>,
}

impl<T: Record> RowEncoder<T> {
    pub fn new(schema: Arc<Schema>) -> Self {
        let member_depth = schema.collection().map_or(0, ColumnSpec::depth);
        let outputs: Vec<Output> = schema
            .output_columns()
            .into_iter()
            .map(|column| {
                let spec = &schema.columns()[column];
                let member = schema.is_member_of_collection(spec);
                Output {
                    column,
                    path: if member {
                        spec.path[member_depth..].to_vec()
                    } else {
                        spec.path.clone()
                    },
                    member,
                }
            })
            .collect();
        Self {
            collection_path: schema.collection().map(|c| c.path.clone()),
            seen: vec![false; outputs.len()],
            outputs,
            schema,
            _record: PhantomData,
        }
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Capitalized header cells, one per output column.
    pub fn headers(&self) -> Vec<String> {
        self.outputs
            .iter()
            .map(|o| self.schema.columns()[o.column].header())
            .collect()
    }

    /// Rows for a single record.
    pub fn encode_one(&mut self, record: &T) -> Vec<Vec<String>> {
        let mut rows = Vec::new();
        let mut seen = vec![false; self.outputs.len()];
        self.encode_into(record, &mut rows, &mut seen);
        self.merge_seen(&seen);
        rows
    }

    /// Rows for every record, in order. The grid holds data rows only.
    pub fn encode(&mut self, records: &[T]) -> RowGrid {
        let mut rows = Vec::with_capacity(records.len());
        let mut seen = vec![false; self.outputs.len()];
        for record in records {
            self.encode_into(record, &mut rows, &mut seen);
        }
        self.merge_seen(&seen);
        log::trace!("encoded {} records into {} rows", records.len(), rows.len());
        RowGrid::new(rows)
    }

    fn encode_into(&self, record: &T, rows: &mut Vec<Vec<String>>, seen: &mut [bool]) {
        let collection: Option<&dyn DynCollection> = self
            .collection_path
            .as_deref()
            .and_then(|path| collection_at(record, path));
        let count = collection.map_or(1, |c| c.len().max(1));
        let first = rows.len();
        rows.resize_with(first + count, || Vec::with_capacity(self.outputs.len()));
        let block = &mut rows[first..];

        for (x, output) in self.outputs.iter().enumerate() {
            if output.member {
                for (j, row) in block.iter_mut().enumerate() {
                    let field = collection
                        .and_then(|c| c.element(j))
                        .and_then(|element| field_at(element, &output.path));
                    let (text, blank) = project(field);
                    seen[x] |= !blank;
                    row.push(text);
                }
            } else {
                let (text, blank) = project(field_at(record, &output.path));
                seen[x] |= !blank;
                for row in block.iter_mut() {
                    row.push(text.clone());
                }
            }
        }
    }

    /// Fold the flags of a completed batch into the running ones. A batch
    /// that unwinds midway never gets here.
    fn merge_seen(&mut self, batch: &[bool]) {
        for (flag, batch_flag) in self.seen.iter_mut().zip(batch) {
            *flag |= *batch_flag;
        }
    }

    /// Per output column: whether any emitted cell carried a non-blank value.
    pub fn seen(&self) -> &[bool] {
        &self.seen
    }

    /// Output column positions (ascending) to drop on finalize: columns that
    /// never carried a value and are either `omitempty` or nested.
    pub fn prunable_columns(&self) -> Vec<usize> {
        self.outputs
            .iter()
            .enumerate()
            .filter(|(x, output)| {
                let spec = &self.schema.columns()[output.column];
                !self.seen[*x] && (spec.omit_empty || spec.depth() > 1)
            })
            .map(|(x, _)| x)
            .collect()
    }
}

#[cfg(feature = "parallel-io")]
impl<T: Record + Sync> RowEncoder<T> {
    /// Encode contiguous shards of `records` in parallel.
    ///
    /// Shards are concatenated in index order, so the result equals
    /// [`encode`](Self::encode) on the same input. `shards` defaults to twice
    /// the CPU count and is clamped to `[1, records.len()]`.
    pub fn encode_par(&mut self, records: &[T], shards: Option<usize>) -> RowGrid {
        use rayon::prelude::*;

        let n = records.len();
        if n == 0 {
            return RowGrid::default();
        }
        let shard_count = shards
            .unwrap_or_else(|| 2 * num_cpus::get().max(2))
            .clamp(1, n);
        let width = self.outputs.len();
        let this = &*self;
        let mut parts: Vec<(usize, Vec<Vec<String>>, Vec<bool>)> = split_ranges(n, shard_count)
            .into_par_iter()
            .map(|(idx, start, end)| {
                let mut rows = Vec::with_capacity(end - start);
                let mut seen = vec![false; width];
                for record in &records[start..end] {
                    this.encode_into(record, &mut rows, &mut seen);
                }
                (idx, rows, seen)
            })
            .collect();

        parts.sort_by_key(|(idx, _, _)| *idx);

        let mut rows = Vec::with_capacity(n);
        for (_, part, seen) in parts {
            rows.extend(part);
            self.merge_seen(&seen);
        }
        log::trace!("encoded {n} records in {shard_count} shards into {} rows", rows.len());
        RowGrid::new(rows)
    }
}

fn project(field: Option<&dyn Field>) -> (String, bool) {
    match field {
        Some(field) => (field.to_cell().unwrap_or_default(), field.is_blank()),
        None => (String::new(), true),
    }
}

/// Split `[0, len)` into `parts` contiguous, non-empty ranges as
/// `(shard, start, end)`, spreading the remainder over the leading shards.
#[cfg(feature = "parallel-io")]
fn split_ranges(len: usize, parts: usize) -> Vec<(usize, usize, usize)> {
    let parts = parts.max(1).min(len.max(1));
    let base = len / parts;
    let rem = len % parts;

    let mut out = Vec::with_capacity(parts);
    let mut start = 0usize;
    for idx in 0..parts {
        let end = start + base + usize::from(idx < rem);
        if start < end {
            out.push((idx, start, end));
        }
        start = end;
    }
    out
}
