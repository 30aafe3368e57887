//! Runtime type identity for record types.
//!
//! [`TypeTag`] pairs a `TypeId` with a readable type name. The process-wide
//! schema cache is keyed by it, and schemas carry it so errors and logs can
//! name the record type they were derived from.

use std::any::{TypeId, type_name};
use std::fmt;

/// A lightweight runtime type tag.
///
/// ```
/// use tabmap::type_token::TypeTag;
/// let tag = TypeTag::of::<u32>();
/// assert_eq!(tag.name, "u32");
/// assert_eq!(TypeTag::of::<Vec<u8>>().short_name(), "Vec<u8>");
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TypeTag {
    /// Stable Rust type identifier.
    pub id: TypeId,
    /// Human-readable type name (best-effort).
    pub name: &'static str,
}

impl TypeTag {
    /// Construct a tag for `T`.
    pub fn of<T: 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
        }
    }

    /// The type name without its module path.
    pub fn short_name(&self) -> &'static str {
        let base = self.name.split('<').next().unwrap_or(self.name);
        match base.rfind("::") {
            Some(pos) => &self.name[pos + 2..],
            None => self.name,
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}
