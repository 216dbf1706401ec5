//! Key naming conventions.
//!
//! The store has no schema and no secondary indexes. Callers emulate them
//! with composed keys and prefix scans:
//!
//! - `entity:id` - primary record (`video:42`)
//! - `entity:field:value` - secondary lookup pointing at an id
//!   (`user:email:alice@example.com`)
//! - `entity:list:owner` - array of ids owned by `owner`
//!   (`video:list:alice`)
//!
//! The store itself never validates keys against these shapes.

/// Separator between key segments.
pub const SEPARATOR: char = ':';

/// Segment marking a one-to-many index key.
pub const LIST_SEGMENT: &str = "list";

/// Key of a primary record: `entity:id`.
pub fn record_key(entity: &str, id: &str) -> String {
    format!("{entity}{SEPARATOR}{id}")
}

/// Key of a secondary lookup: `entity:field:value`.
pub fn lookup_key(entity: &str, field: &str, value: &str) -> String {
    format!("{entity}{SEPARATOR}{field}{SEPARATOR}{value}")
}

/// Key of a one-to-many index: `entity:list:owner`.
pub fn list_key(entity: &str, owner: &str) -> String {
    lookup_key(entity, LIST_SEGMENT, owner)
}

/// Prefix matching every key of an entity: `entity:`.
pub fn entity_prefix(entity: &str) -> String {
    format!("{entity}{SEPARATOR}")
}

/// Splits a key into its entity and the remainder.
///
/// Returns `None` for keys without a separator.
///
/// # Examples
///
/// ```
/// use reelkv::services::kv::keys::split_key;
///
/// assert_eq!(split_key("video:42"), Some(("video", "42")));
/// assert_eq!(split_key("video:list:alice"), Some(("video", "list:alice")));
/// assert_eq!(split_key("settings"), None);
/// ```
pub fn split_key(key: &str) -> Option<(&str, &str)> {
    key.split_once(SEPARATOR)
}

/// Entity name of a key, or the whole key when it has no separator.
pub fn entity_of(key: &str) -> &str {
    split_key(key).map_or(key, |(entity, _)| entity)
}
