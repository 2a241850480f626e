//! The field tag grammar.
//!
//! Tags are a semicolon-separated list of `key` or `key:value` pairs attached
//! to a model field:
//!
//! ```text
//! name:user_email;width:255;unique
//! ```
//!
//! Unknown keys are preserved verbatim in the parsed map for forward
//! compatibility. A part with an empty key (a leading `:`) is malformed and
//! rejected; the caller aggregates such errors per field.

use indexmap::IndexMap;
use thiserror::Error;

/// Column name override.
pub const TAG_NAME: &str = "name";
/// Width of variable-length textual columns.
pub const TAG_WIDTH: &str = "width";
/// Character set of the column.
pub const TAG_CHARSET: &str = "charset";
/// Numeric precision.
pub const TAG_PRECISION: &str = "precision";
/// Default value expression.
pub const TAG_DEFAULT: &str = "default";
/// Unique constraint on the column.
pub const TAG_UNIQUE: &str = "unique";
/// Index membership, optionally `index:<name>[,priority:<N>]`.
pub const TAG_INDEX: &str = "index";
/// Primary key flag.
pub const TAG_PRIMARY: &str = "primary";
/// Nullability override.
pub const TAG_NULLABLE: &str = "nullable";
/// Auto-increment flag, optionally with a starting offset.
pub const TAG_AUTO_INCREMENT: &str = "auto_increment";
/// Optimistic-locking version column.
pub const TAG_AUTO_VERSION: &str = "auto_version";
/// Touched-on-update timestamp column.
pub const TAG_UPDATED_AT: &str = "updated_at";
/// Set-on-insert timestamp column.
pub const TAG_CREATED_AT: &str = "created_at";
/// Persist zero values instead of treating them as unset.
pub const TAG_ALLOW_ZERO: &str = "allow_zero";
/// Free-form extra column clause.
pub const TAG_EXTRA: &str = "extra";
/// Skip the field entirely.
pub const TAG_IGNORE: &str = "ignore";

const PART_SEPARATOR: char = ';';
const KEY_VALUE_SEPARATOR: char = ':';

/// Parsed tag metadata, in declaration order.
pub type TagMap = IndexMap<String, String>;

/// A malformed tag string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TagError {
    #[error("tag part {position} has an empty key: {part:?}")]
    EmptyKey { position: usize, part: String },
}

/// Parse a raw tag string into a key/value map.
///
/// Keys without a value map to the empty string. Whitespace around parts is
/// ignored, and empty parts (e.g. a trailing `;`) are skipped. Later
/// occurrences of a key override earlier ones.
///
/// # Example
///
/// ```
/// let tags = converge_schema::parse_tag("name:email;width:255;unique").unwrap();
/// assert_eq!(tags.get("name").map(String::as_str), Some("email"));
/// assert_eq!(tags.get("unique").map(String::as_str), Some(""));
/// ```
pub fn parse_tag(tag: &str) -> Result<TagMap, TagError> {
    let mut map = TagMap::new();
    if tag.is_empty() {
        return Ok(map);
    }
    for (position, part) in tag.split(PART_SEPARATOR).enumerate() {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        match part.split_once(KEY_VALUE_SEPARATOR) {
            Some((key, value)) => {
                let key = key.trim();
                if key.is_empty() {
                    return Err(TagError::EmptyKey {
                        position,
                        part: part.to_string(),
                    });
                }
                map.insert(key.to_string(), value.trim().to_string());
            }
            None => {
                map.insert(part.to_string(), String::new());
            }
        }
    }
    Ok(map)
}

/// Interpret a tag key as a boolean flag.
///
/// Returns `Some(true)` when the key is present with no value, `"true"` or
/// `"1"`; `Some(false)` for `"false"` or `"0"`; `None` when the key is absent
/// or carries an unrecognized value.
pub fn bool_tag(tags: &TagMap, key: &str) -> Option<bool> {
    match tags.get(key).map(String::as_str) {
        Some("") | Some("true") | Some("1") => Some(true),
        Some("false") | Some("0") => Some(false),
        _ => None,
    }
}
