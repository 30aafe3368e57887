//! Runtime field descriptors and type-erased field access.
//!
//! Rust has no runtime reflection, so record types describe themselves:
//! - [`Record::fields`] lists the declared fields as [`FieldDef`]s, each with
//!   its annotation string and a [`Shape`] computed from the field's type.
//! - [`DynRecord`] gives index-based access to those fields as `dyn Field`.
//! - [`Field`] is the capability set of one field value: scalar cell
//!   projection, nested record access (with lazy materialization of optional
//!   records), and collection access.
//!
//! Struct types get all three through the [`tabular!`](crate::tabular) macro.
//! Scalar types get them through [`CellValue`](crate::CellValue) and
//! [`cell_field!`](crate::cell_field).
//!
//! Descriptors are consulted once, when a [`Schema`](crate::Schema) is derived;
//! rows are processed through the index paths recorded in the schema.

use crate::error::CellError;
use std::any::{Any, type_name};
use std::fmt;

/// Structural classification of a field type.
#[derive(Clone, Copy, Debug)]
pub enum Shape {
    /// A single cell value.
    Scalar,
    /// An optional single cell value (`Option<scalar>`).
    ScalarRef,
    /// A nested record whose fields are flattened into columns.
    Record(Nested),
    /// An optional nested record (`Option<record>`).
    RecordRef(Nested),
    /// A one-to-many collection of records (`Vec<record>`).
    Collection(Nested),
    /// A type that cannot be mapped to columns.
    Unsupported(Unsupported),
}

/// Field types rejected by schema derivation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Unsupported {
    /// `Option<Option<_>>`.
    NestedOption,
    /// `Option<Vec<_>>`.
    OptionalCollection,
    /// `Vec<scalar>`.
    ScalarCollection(&'static str),
    /// A `Vec` whose element is neither a record nor a scalar.
    NonRecordCollection(&'static str),
}

/// A nested record type: its name and a lazily evaluated field list.
#[derive(Clone, Copy)]
pub struct Nested {
    pub type_name: &'static str,
    pub fields: fn() -> Vec<FieldDef>,
}

impl Nested {
    pub fn of<R: Record>() -> Self {
        Self {
            type_name: type_name::<R>(),
            fields: R::fields,
        }
    }
}

impl fmt::Debug for Nested {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Nested")
            .field("type_name", &self.type_name)
            .finish_non_exhaustive()
    }
}

/// One declared field of a record type.
#[derive(Clone, Debug)]
pub struct FieldDef {
    /// Declared field name.
    pub name: &'static str,
    /// Raw annotation string (see [`FieldTag`](crate::tag::FieldTag)).
    pub tag: &'static str,
    /// Declared type name, for error messages.
    pub type_name: &'static str,
    pub shape: Shape,
}

impl FieldDef {
    pub fn new(name: &'static str, tag: &'static str, type_name: &'static str, shape: Shape) -> Self {
        Self {
            name,
            tag,
            type_name,
            shape,
        }
    }
}

/// A record type that can be mapped to and from rows.
///
/// Implemented by [`tabular!`](crate::tabular); `Default` supplies the blank
/// record each decoded row starts from.
pub trait Record: DynRecord + Default + 'static {
    /// The declared fields, in declaration order.
    fn fields() -> Vec<FieldDef>;
}

/// Object-safe, index-based access to the fields of a record value.
pub trait DynRecord {
    fn field(&self, index: usize) -> Option<&dyn Field>;
    fn field_mut(&mut self, index: usize) -> Option<&mut dyn Field>;
}

/// Object-safe access to a collection of records.
pub trait DynCollection {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn element(&self, index: usize) -> Option<&dyn DynRecord>;

    /// Append a default element and return it for population.
    fn push_default(&mut self) -> &mut dyn DynRecord;

    /// Drop the last element.
    fn pop(&mut self);

    /// Move every element of `other` to the end of `self`.
    ///
    /// Returns `false`, leaving both collections untouched, when `other` is a
    /// different collection type.
    #[must_use]
    fn append_from(&mut self, other: &mut dyn DynCollection) -> bool;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// The capability set of a single field value.
///
/// Only [`shape`](Field::shape) is required; every accessor defaults to "not
/// supported by this shape".
pub trait Field {
    fn shape() -> Shape
    where
        Self: Sized;

    /// Cell text of a scalar, `None` when absent or not a scalar.
    fn to_cell(&self) -> Option<String> {
        None
    }

    /// Whether the value counts as empty for column pruning.
    fn is_blank(&self) -> bool {
        true
    }

    /// Assign a scalar from (non-empty) cell text.
    fn set_cell(&mut self, _text: &str) -> Result<(), CellError> {
        Err(CellError::NotScalar)
    }

    fn as_record(&self) -> Option<&dyn DynRecord> {
        None
    }

    /// Mutable access to a nested record, materializing it when optional and
    /// absent.
    fn as_record_mut(&mut self) -> Option<&mut dyn DynRecord> {
        None
    }

    /// Roll an optional value back to absent. No-op for required values.
    fn reset(&mut self) {}

    fn is_present(&self) -> bool {
        true
    }

    fn as_collection(&self) -> Option<&dyn DynCollection> {
        None
    }

    fn as_collection_mut(&mut self) -> Option<&mut dyn DynCollection> {
        None
    }
}

impl<T: Field + Default> Field for Option<T> {
    fn shape() -> Shape {
        match T::shape() {
            Shape::Scalar => Shape::ScalarRef,
            Shape::Record(nested) => Shape::RecordRef(nested),
            Shape::ScalarRef | Shape::RecordRef(_) => Shape::Unsupported(Unsupported::NestedOption),
            Shape::Collection(_) => Shape::Unsupported(Unsupported::OptionalCollection),
            other @ Shape::Unsupported(_) => other,
        }
    }

    fn to_cell(&self) -> Option<String> {
        self.as_ref().and_then(|v| v.to_cell())
    }

    fn is_blank(&self) -> bool {
        self.is_none()
    }

    fn set_cell(&mut self, text: &str) -> Result<(), CellError> {
        let mut value = T::default();
        value.set_cell(text)?;
        *self = Some(value);
        Ok(())
    }

    fn as_record(&self) -> Option<&dyn DynRecord> {
        self.as_ref().and_then(|v| v.as_record())
    }

    fn as_record_mut(&mut self) -> Option<&mut dyn DynRecord> {
        self.get_or_insert_with(T::default).as_record_mut()
    }

    fn reset(&mut self) {
        *self = None;
    }

    fn is_present(&self) -> bool {
        self.is_some()
    }
}

impl<R: Record + Field> Field for Vec<R> {
    fn shape() -> Shape {
        match R::shape() {
            Shape::Record(nested) => Shape::Collection(nested),
            _ => Shape::Unsupported(Unsupported::NonRecordCollection(type_name::<R>())),
        }
    }

    fn as_collection(&self) -> Option<&dyn DynCollection> {
        Some(self)
    }

    fn as_collection_mut(&mut self) -> Option<&mut dyn DynCollection> {
        Some(self)
    }
}

impl<R: Record> DynCollection for Vec<R> {
    fn len(&self) -> usize {
        Vec::len(self)
    }

    fn element(&self, index: usize) -> Option<&dyn DynRecord> {
        self.get(index).map(|r| r as &dyn DynRecord)
    }

    fn push_default(&mut self) -> &mut dyn DynRecord {
        self.push(R::default());
        let last = Vec::len(self) - 1;
        &mut self[last]
    }

    fn pop(&mut self) {
        Vec::pop(self);
    }

    fn append_from(&mut self, other: &mut dyn DynCollection) -> bool {
        match other.as_any_mut().downcast_mut::<Vec<R>>() {
            Some(other) => {
                self.append(other);
                true
            }
            None => false,
        }
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Implement [`Field`] for a type that implements [`CellValue`](crate::CellValue).
///
/// ```
/// use tabmap::{CellError, CellValue, Field, cell_field};
///
/// #[derive(Debug, Default, Clone, PartialEq)]
/// struct Sku(String);
///
/// impl CellValue for Sku {
///     fn from_cell(text: &str) -> Result<Self, CellError> {
///         Ok(Sku(text.to_uppercase()))
///     }
///     fn to_cell(&self) -> String {
///         self.0.clone()
///     }
///     fn is_zero(&self) -> bool {
///         self.0.is_empty()
///     }
/// }
///
/// cell_field!(Sku);
///
/// let mut sku = Sku::default();
/// sku.set_cell("ab-12").unwrap();
/// assert_eq!(Field::to_cell(&sku).as_deref(), Some("AB-12"));
/// ```
#[macro_export]
macro_rules! cell_field {
    ($($t:ty),* $(,)?) => {
        $(
            impl $crate::Field for $t {
                fn shape() -> $crate::Shape {
                    $crate::Shape::Scalar
                }

                fn to_cell(&self) -> ::std::option::Option<::std::string::String> {
                    ::std::option::Option::Some($crate::CellValue::to_cell(self))
                }

                fn is_blank(&self) -> bool {
                    $crate::CellValue::is_zero(self)
                }

                fn set_cell(&mut self, text: &str) -> ::std::result::Result<(), $crate::CellError> {
                    *self = <$t as $crate::CellValue>::from_cell(text)?;
                    ::std::result::Result::Ok(())
                }
            }
        )*
    };
}

/// Built-in scalars additionally reject `Vec<scalar>` with a schema error.
macro_rules! builtin_scalars {
    ($($t:ty),* $(,)?) => {
        cell_field!($($t),*);
        $(
            impl Field for Vec<$t> {
                fn shape() -> Shape {
                    Shape::Unsupported(Unsupported::ScalarCollection(type_name::<$t>()))
                }
            }
        )*
    };
}

builtin_scalars!(
    String,
    bool,
    char,
    i8,
    i16,
    i32,
    i64,
    i128,
    isize,
    u8,
    u16,
    u32,
    u64,
    u128,
    usize,
    f32,
    f64,
    chrono::NaiveDate,
    chrono::NaiveDateTime,
    chrono::NaiveTime,
    chrono::DateTime<chrono::Utc>,
    chrono::DateTime<chrono::FixedOffset>,
);

#[cfg(test)]
mod tests {
    use super::*;

    crate::tabular! {
        #[derive(Debug, Default, PartialEq)]
        struct Left {
            a: u32,
        }
    }

    crate::tabular! {
        #[derive(Debug, Default, PartialEq)]
        struct Right {
            b: u32,
        }
    }

    #[test]
    fn append_from_moves_matching_elements() {
        let mut target = vec![Left { a: 1 }];
        let mut source = vec![Left { a: 2 }, Left { a: 3 }];
        assert!(target.append_from(&mut source));
        assert_eq!(target, [Left { a: 1 }, Left { a: 2 }, Left { a: 3 }]);
        assert!(source.is_empty());
    }

    #[test]
    fn append_from_rejects_another_element_type() {
        let mut target = vec![Left { a: 1 }];
        let mut source = vec![Right { b: 2 }];
        assert!(!target.append_from(&mut source));
        assert_eq!(target.len(), 1);
        assert_eq!(source, [Right { b: 2 }]);
    }

    #[test]
    fn shapes_of_wrappers() {
        assert!(matches!(<Option<u32> as Field>::shape(), Shape::ScalarRef));
        assert!(matches!(<Option<Left> as Field>::shape(), Shape::RecordRef(_)));
        assert!(matches!(<Vec<Left> as Field>::shape(), Shape::Collection(_)));
        assert!(matches!(
            <Option<Vec<Left>> as Field>::shape(),
            Shape::Unsupported(Unsupported::OptionalCollection)
        ));
        assert!(matches!(
            <Vec<String> as Field>::shape(),
            Shape::Unsupported(Unsupported::ScalarCollection(_))
        ));
    }
}
