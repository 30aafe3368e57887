//! The per-field annotation mini-language.
//!
//! An annotation is a comma-separated list of directives. Order does not
//! matter; the resolved column name falls back to the declared field name when
//! no `column:` directive is given.
//!
//! | Directive           | Effect                                                    |
//! |---------------------|-----------------------------------------------------------|
//! | `-`                 | field excluded from the schema                            |
//! | `column:<name>`     | explicit column name                                      |
//! | `aliases:<a>\|<b>`  | additional names accepted on decode                       |
//! | `order:<int>`       | explicit sort order                                       |
//! | `primary`           | primary key (row-grouping key)                            |
//! | `required`          | decode fails when the column is absent or empty           |
//! | `omitempty`         | column pruned on encode when it never carries a value     |
//! | `default:<value>`   | value used when the column is absent or empty             |
//! | `prefix:<string>`   | prefix for descendant column names                        |
//! | `noprefix`          | no prefix for descendant column names                     |
//! | `flatten`           | no prefix unless `prefix:` is given                       |

use crate::error::SchemaError;

pub const IGNORE: &str = "-";
pub const PRIMARY: &str = "primary";
pub const REQUIRED: &str = "required";
pub const OMIT_EMPTY: &str = "omitempty";
pub const NO_PREFIX: &str = "noprefix";
pub const FLATTEN: &str = "flatten";
pub const COLUMN: &str = "column:";
pub const ALIASES: &str = "aliases:";
pub const ORDER: &str = "order:";
pub const DEFAULT: &str = "default:";
pub const PREFIX: &str = "prefix:";

const DIRECTIVE_SEPARATOR: char = ',';
const LIST_SEPARATOR: char = '|';

/// Parsed annotation of a single field.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FieldTag {
    pub ignored: bool,
    pub column: Option<String>,
    pub aliases: Vec<String>,
    pub order: Option<i64>,
    pub primary: bool,
    pub required: bool,
    pub omit_empty: bool,
    pub default: Option<String>,
    pub prefix: Option<String>,
    pub no_prefix: bool,
    pub flatten: bool,
}

impl FieldTag {
    /// Parse the annotation of `field`.
    ///
    /// # Errors
    /// Returns [`SchemaError::InvalidDirective`] for unknown directives and
    /// non-integer `order:` values.
    pub fn parse(field: &str, raw: &str) -> Result<Self, SchemaError> {
        let mut tag = FieldTag::default();
        if raw.trim() == IGNORE {
            tag.ignored = true;
            return Ok(tag);
        }
        for directive in raw.split(DIRECTIVE_SEPARATOR) {
            let directive = directive.trim();
            if directive.is_empty() {
                continue;
            }
            let invalid = || SchemaError::InvalidDirective {
                field: field.to_string(),
                directive: directive.to_string(),
            };
            match directive {
                PRIMARY => tag.primary = true,
                REQUIRED => tag.required = true,
                OMIT_EMPTY => tag.omit_empty = true,
                NO_PREFIX => tag.no_prefix = true,
                FLATTEN => tag.flatten = true,
                _ => {
                    if let Some(name) = directive.strip_prefix(COLUMN) {
                        let name = name.trim();
                        if name.is_empty() {
                            return Err(invalid());
                        }
                        tag.column = Some(name.to_string());
                    } else if let Some(list) = directive.strip_prefix(ALIASES) {
                        tag.aliases.extend(
                            list.split(LIST_SEPARATOR)
                                .map(str::trim)
                                .filter(|a| !a.is_empty())
                                .map(String::from),
                        );
                    } else if let Some(order) = directive.strip_prefix(ORDER) {
                        tag.order = Some(order.trim().parse().map_err(|_| invalid())?);
                    } else if let Some(value) = directive.strip_prefix(DEFAULT) {
                        tag.default = Some(value.to_string());
                    } else if let Some(prefix) = directive.strip_prefix(PREFIX) {
                        tag.prefix = Some(prefix.trim().to_string());
                    } else {
                        return Err(invalid());
                    }
                }
            }
        }
        Ok(tag)
    }

    /// Column name for a field declared as `declared`.
    pub fn name<'a>(&'a self, declared: &'a str) -> &'a str {
        self.column.as_deref().unwrap_or(declared)
    }

    /// Name prefix handed down to the fields of a nested record declared under
    /// this field, given the prefix this field itself was reached with.
    pub fn child_prefix(&self, declared: &str, inherited: &str) -> String {
        if self.no_prefix {
            return inherited.to_string();
        }
        match &self.prefix {
            Some(prefix) => format!("{inherited}{prefix}"),
            None if self.flatten => inherited.to_string(),
            None => format!("{inherited}{}.", self.name(declared)),
        }
    }
}
