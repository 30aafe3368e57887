//! Schema derivation: from a record type to an ordered column model.
//!
//! [`Schema::derive`] walks the record type breadth-first, starting at the
//! root. Every visited field is classified by its [`Shape`], named from its
//! annotation (see [`tag`](crate::tag)), and addressed by its *path*: the list
//! of field indices leading from the root record to it.
//!
//! Only terminal fields (scalars) and the collection field become columns.
//! Nested records contribute their own fields, with names prefixed by the
//! parent's name (unless suppressed) and paths extended by the parent's index.
//!
//! # Ordering
//! After traversal, the primary key sorts first. Every other column sorts by
//! its *order path*: the `(order, declared index)` pair of each field along
//! its path. Descendants of a nested record therefore land where the record
//! is declared, and a record's own fields keep their declared (or overridden)
//! order. `order` is then renumbered to the final position.
//!
//! # Names
//! Lookups are case-insensitive. When two columns resolve to the same name,
//! the shallower one wins and the deeper one is dropped; two columns at the
//! same depth are a [`SchemaError::DuplicateColumn`].

use crate::error::{Error, Result, SchemaError, catch_internal};
use crate::field::{FieldDef, Record, Shape, Unsupported};
use crate::tag::FieldTag;
use crate::type_token::TypeTag;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

/// Maximum path length of any field: root field, nested record or collection,
/// and one more level of nesting below it.
pub const MAX_NESTING_DEPTH: usize = 3;

/// Structural kind of a column.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ColumnKind {
    Scalar,
    /// Optional scalar.
    ScalarRef,
    /// The one-to-many field; never written as a column of its own.
    Collection,
    Record,
    /// Optional nested record.
    RecordRef,
}

impl ColumnKind {
    pub fn is_scalar(self) -> bool {
        matches!(self, ColumnKind::Scalar | ColumnKind::ScalarRef)
    }
}

/// One addressable field of a schema.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColumnSpec {
    /// Resolved column name, including ancestor prefixes.
    pub name: String,
    /// Extra names accepted on decode (prefixed like `name`).
    pub aliases: Vec<String>,
    /// Field indices from the root record down to this field.
    pub path: Vec<usize>,
    pub kind: ColumnKind,
    /// Final position after sorting (declared or overridden order before).
    pub order: i64,
    pub is_primary_key: bool,
    pub required: bool,
    pub omit_empty: bool,
    pub default_value: Option<String>,
    /// Declared Rust type of the field.
    pub type_name: &'static str,
    order_path: Vec<(i64, usize)>,
}

impl ColumnSpec {
    /// Nesting depth (1 for fields of the root record).
    pub fn depth(&self) -> usize {
        self.path.len()
    }

    /// Case-folded lookup key.
    pub fn key(&self) -> String {
        fold(&self.name)
    }

    /// Header text: the name with its leading character capitalized.
    pub fn header(&self) -> String {
        capitalize(&self.name)
    }

    /// Whether `other` is nested somewhere below this column.
    pub fn is_ancestor_of(&self, other: &ColumnSpec) -> bool {
        other.path.len() > self.path.len() && other.path.starts_with(&self.path)
    }
}

/// The resolved, ordered column model of one record type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Schema {
    type_tag: TypeTag,
    columns: Vec<ColumnSpec>,
    nested: Vec<ColumnSpec>,
    index: HashMap<String, usize>,
    primary_key: Option<usize>,
    collection: Option<usize>,
}

struct Pending {
    fields: fn() -> Vec<FieldDef>,
    path: Vec<usize>,
    order_path: Vec<(i64, usize)>,
    prefix: String,
    in_collection: bool,
}

#[derive(Default)]
struct Builder {
    columns: Vec<ColumnSpec>,
    nested: Vec<ColumnSpec>,
    names: HashMap<String, usize>,
    primary_key: Option<usize>,
    collection: Option<usize>,
}

impl Builder {
    /// Register a terminal column under its name and aliases.
    ///
    /// Returns `Ok(None)` when a shallower column already owns the name.
    fn register(&mut self, mut spec: ColumnSpec) -> std::result::Result<Option<usize>, SchemaError> {
        let depth = spec.depth();
        let key = spec.key();
        if let Some(&owner) = self.names.get(&key) {
            let owner_depth = self.columns[owner].depth();
            if owner_depth == depth {
                return Err(SchemaError::DuplicateColumn {
                    name: spec.name,
                    depth,
                });
            }
            log::debug!(
                "column `{}` at depth {} shadowed by `{}` at depth {}",
                spec.name,
                depth,
                self.columns[owner].name,
                owner_depth
            );
            return Ok(None);
        }

        let position = self.columns.len();
        self.names.insert(key, position);

        let mut kept = Vec::with_capacity(spec.aliases.len());
        for alias in std::mem::take(&mut spec.aliases) {
            let alias_key = fold(&alias);
            match self.names.get(&alias_key) {
                Some(&owner) if owner == position => {}
                Some(&owner) if self.columns[owner].depth() == depth => {
                    return Err(SchemaError::DuplicateColumn { name: alias, depth });
                }
                Some(_) => {
                    log::debug!("alias `{alias}` of `{}` shadowed", spec.name);
                }
                None => {
                    self.names.insert(alias_key, position);
                    kept.push(alias);
                }
            }
        }
        spec.aliases = kept;
        self.columns.push(spec);
        Ok(Some(position))
    }
}

impl Schema {
    /// Derive the schema of `T`.
    ///
    /// Prefer [`schema_for`], which caches the result per type.
    ///
    /// # Errors
    /// Any [`SchemaError`]; derivation never yields a partial schema.
    pub fn derive<T: Record>() -> std::result::Result<Self, SchemaError> {
        Self::derive_from(TypeTag::of::<T>(), T::fields)
    }

    fn derive_from(
        type_tag: TypeTag,
        root: fn() -> Vec<FieldDef>,
    ) -> std::result::Result<Self, SchemaError> {
        let mut b = Builder::default();
        let mut queue = VecDeque::from([Pending {
            fields: root,
            path: Vec::new(),
            order_path: Vec::new(),
            prefix: String::new(),
            in_collection: false,
        }]);

        while let Some(node) = queue.pop_front() {
            for (i, def) in (node.fields)().into_iter().enumerate() {
                let tag = FieldTag::parse(def.name, def.tag)?;
                if tag.ignored {
                    continue;
                }
                let name = format!("{}{}", node.prefix, tag.name(def.name));
                let mut path = node.path.clone();
                path.push(i);
                if path.len() > MAX_NESTING_DEPTH {
                    return Err(SchemaError::ExcessiveNesting {
                        field: name,
                        depth: path.len(),
                        max: MAX_NESTING_DEPTH,
                    });
                }
                let kind = classify(&def, &name)?;
                let order = tag.order.unwrap_or(i as i64);
                let mut order_path = node.order_path.clone();
                order_path.push((order, i));

                let spec = ColumnSpec {
                    aliases: tag
                        .aliases
                        .iter()
                        .map(|a| format!("{}{a}", node.prefix))
                        .collect(),
                    name,
                    path,
                    kind,
                    order,
                    is_primary_key: tag.primary,
                    required: tag.required,
                    omit_empty: tag.omit_empty,
                    default_value: tag.default.clone(),
                    type_name: def.type_name,
                    order_path,
                };

                if tag.primary && (!kind.is_scalar() || node.in_collection) {
                    return Err(SchemaError::InvalidPrimaryKey { field: spec.name });
                }

                match def.shape {
                    Shape::Record(nested) | Shape::RecordRef(nested) => {
                        queue.push_back(Pending {
                            fields: nested.fields,
                            path: spec.path.clone(),
                            order_path: spec.order_path.clone(),
                            prefix: tag.child_prefix(def.name, &node.prefix),
                            in_collection: node.in_collection,
                        });
                        b.nested.push(spec);
                    }
                    Shape::Collection(nested) => {
                        let child = Pending {
                            fields: nested.fields,
                            path: spec.path.clone(),
                            order_path: spec.order_path.clone(),
                            prefix: tag.child_prefix(def.name, &node.prefix),
                            in_collection: true,
                        };
                        let name = spec.name.clone();
                        let Some(position) = b.register(spec)? else {
                            continue;
                        };
                        if let Some(existing) = b.collection {
                            return Err(SchemaError::MultipleCollections {
                                first: b.columns[existing].name.clone(),
                                second: name,
                            });
                        }
                        b.collection = Some(position);
                        queue.push_back(child);
                    }
                    _ => {
                        let primary = spec.is_primary_key;
                        let name = spec.name.clone();
                        let Some(position) = b.register(spec)? else {
                            continue;
                        };
                        if primary {
                            if let Some(existing) = b.primary_key {
                                return Err(SchemaError::MultiplePrimaryKeys {
                                    first: b.columns[existing].name.clone(),
                                    second: name,
                                });
                            }
                            b.primary_key = Some(position);
                        }
                    }
                }
            }
        }

        if let Some(collection) = b.collection
            && b.primary_key.is_none()
        {
            return Err(SchemaError::PrimaryKeyRequired {
                collection: b.columns[collection].name.clone(),
            });
        }

        let schema = Self::assemble(type_tag, b);
        log::debug!(
            "derived schema for {}: {} columns, {} nested records",
            schema.type_tag,
            schema.columns.len(),
            schema.nested.len()
        );
        Ok(schema)
    }

    /// Sort, renumber, and index the collected columns.
    fn assemble(type_tag: TypeTag, b: Builder) -> Self {
        let Builder {
            mut columns,
            mut nested,
            ..
        } = b;
        columns.sort_by(|a, b| {
            b.is_primary_key
                .cmp(&a.is_primary_key)
                .then_with(|| a.order_path.cmp(&b.order_path))
        });
        for (position, column) in columns.iter_mut().enumerate() {
            column.order = position as i64;
        }
        nested.sort_by(|a, b| {
            a.depth()
                .cmp(&b.depth())
                .then_with(|| a.order_path.cmp(&b.order_path))
        });

        let mut index = HashMap::new();
        for (position, column) in columns.iter().enumerate() {
            index.insert(column.key(), position);
            for alias in &column.aliases {
                index.entry(fold(alias)).or_insert(position);
            }
        }
        let primary_key = columns.iter().position(|c| c.is_primary_key);
        let collection = columns
            .iter()
            .position(|c| c.kind == ColumnKind::Collection);

        Self {
            type_tag,
            columns,
            nested,
            index,
            primary_key,
            collection,
        }
    }

    pub fn type_tag(&self) -> TypeTag {
        self.type_tag
    }

    /// Terminal columns and the collection column, in final order.
    pub fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    /// Nested record fields (`Record`/`RecordRef`), shallowest first.
    pub fn nested(&self) -> &[ColumnSpec] {
        &self.nested
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Position of the column named `name` (or aliased as `name`),
    /// case-insensitively.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.index.get(&fold(name)).copied()
    }

    pub fn column(&self, name: &str) -> Option<&ColumnSpec> {
        self.position(name).map(|p| &self.columns[p])
    }

    pub fn primary_key(&self) -> Option<&ColumnSpec> {
        self.primary_key.map(|p| &self.columns[p])
    }

    pub fn collection(&self) -> Option<&ColumnSpec> {
        self.collection.map(|p| &self.columns[p])
    }

    /// Whether `column` lives inside the collection's element type.
    pub fn is_member_of_collection(&self, column: &ColumnSpec) -> bool {
        self.collection()
            .is_some_and(|collection| collection.is_ancestor_of(column))
    }

    /// Schema positions of the columns that appear in output rows: every
    /// column except the collection itself.
    pub fn output_columns(&self) -> Vec<usize> {
        (0..self.columns.len())
            .filter(|&p| Some(p) != self.collection)
            .collect()
    }

    /// Header row for output: capitalized names of [`output_columns`](Self::output_columns).
    pub fn headers(&self) -> Vec<String> {
        self.output_columns()
            .into_iter()
            .map(|p| self.columns[p].header())
            .collect()
    }
}

fn classify(def: &FieldDef, name: &str) -> std::result::Result<ColumnKind, SchemaError> {
    match def.shape {
        Shape::Scalar => Ok(ColumnKind::Scalar),
        Shape::ScalarRef => Ok(ColumnKind::ScalarRef),
        Shape::Record(_) => Ok(ColumnKind::Record),
        Shape::RecordRef(_) => Ok(ColumnKind::RecordRef),
        Shape::Collection(_) => Ok(ColumnKind::Collection),
        Shape::Unsupported(reason) => Err(match reason {
            Unsupported::NestedOption => SchemaError::NestedOption {
                field: name.to_string(),
            },
            Unsupported::OptionalCollection => SchemaError::OptionalCollection {
                field: name.to_string(),
            },
            Unsupported::ScalarCollection(element) => SchemaError::NonRecordCollection {
                field: name.to_string(),
                element: element.to_string(),
            },
            Unsupported::NonRecordCollection(_) => SchemaError::UnsupportedType {
                field: name.to_string(),
                type_name: def.type_name.to_string(),
            },
        }),
    }
}

/// Case-folded form of a column name or header.
pub(crate) fn fold(name: &str) -> String {
    name.trim().to_lowercase()
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

static SCHEMAS: OnceLock<Mutex<HashMap<TypeTag, Arc<Schema>>>> = OnceLock::new();

/// The schema of `T`, derived on first use and cached for the life of the
/// process.
///
/// # Errors
/// [`Error::Schema`] when `T` cannot be mapped; [`Error::Internal`] when a
/// field implementation panics during derivation. Failures are not cached.
pub fn schema_for<T: Record>() -> Result<Arc<Schema>> {
    let tag = TypeTag::of::<T>();
    let cache = SCHEMAS.get_or_init(Default::default);
    if let Some(schema) = cache
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .get(&tag)
    {
        return Ok(Arc::clone(schema));
    }

    let schema = Arc::new(catch_internal(|| Schema::derive::<T>().map_err(Error::from))?);
    let mut guard = cache.lock().unwrap_or_else(PoisonError::into_inner);
    Ok(Arc::clone(guard.entry(tag).or_insert(schema)))
}
