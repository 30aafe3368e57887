//! Path-indexed field addressing.
//!
//! A path is the list of field indices from a record down to one of its
//! (possibly nested) fields, as recorded in [`ColumnSpec::path`](crate::ColumnSpec).
//! Read access stops at absent optional records; write access materializes
//! them on the way down.

use crate::field::{DynCollection, DynRecord, Field};

/// The field at `path`, or `None` when an optional record along the way is
/// absent.
pub(crate) fn field_at<'a>(record: &'a dyn DynRecord, path: &[usize]) -> Option<&'a dyn Field> {
    let (last, parents) = path.split_last()?;
    let mut current = record;
    for &index in parents {
        current = current.field(index)?.as_record()?;
    }
    current.field(*last)
}

/// Mutable access to the field at `path`, materializing absent optional
/// records along the way.
pub(crate) fn field_at_mut<'a>(
    record: &'a mut dyn DynRecord,
    path: &[usize],
) -> Option<&'a mut dyn Field> {
    let (last, parents) = path.split_last()?;
    let mut current = record;
    for &index in parents {
        current = current.field_mut(index)?.as_record_mut()?;
    }
    current.field_mut(*last)
}

/// Like [`field_at_mut`], but returns `None` instead of materializing.
fn existing_field_mut<'a>(
    record: &'a mut dyn DynRecord,
    path: &[usize],
) -> Option<&'a mut dyn Field> {
    let (last, parents) = path.split_last()?;
    let mut current = record;
    for &index in parents {
        let field = current.field_mut(index)?;
        if !field.is_present() {
            return None;
        }
        current = field.as_record_mut()?;
    }
    current.field_mut(*last)
}

pub(crate) fn collection_at<'a>(
    record: &'a dyn DynRecord,
    path: &[usize],
) -> Option<&'a dyn DynCollection> {
    field_at(record, path)?.as_collection()
}

pub(crate) fn collection_at_mut<'a>(
    record: &'a mut dyn DynRecord,
    path: &[usize],
) -> Option<&'a mut dyn DynCollection> {
    field_at_mut(record, path)?.as_collection_mut()
}

/// Roll back every optional record in `optionals` that no path in `touched`
/// reaches into.
///
/// `optionals` must be ordered shallowest first, so that an outer record is
/// reset before its descendants are considered.
pub(crate) fn prune_untouched<'p>(
    record: &mut dyn DynRecord,
    optionals: impl IntoIterator<Item = &'p [usize]>,
    touched: &[Vec<usize>],
) {
    for path in optionals {
        if touched.iter().any(|t| t.starts_with(path)) {
            continue;
        }
        if let Some(field) = existing_field_mut(record, path)
            && field.is_present()
        {
            field.reset();
        }
    }
}
