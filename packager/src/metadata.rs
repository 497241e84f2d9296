//! Deployment metadata whitelist.
//!
//! Metadata shipped under `META-INF/` is limited to the subtrees listed in
//! [`METADATA_RULES`]. Each rule pairs a path pattern, relative to the
//! metadata root, with a validator for the file's content. Adding a new
//! kind of metadata means adding a row here; collection does not change.

use crate::error::{PackagerError, Result};
use serde_json::{Map, Value};

/// One segment of a metadata path pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment {
    /// Matches exactly this directory name.
    Literal(&'static str),
    /// Matches any single name.
    Any,
}

/// A recognized metadata location and the validator for its files.
#[derive(Debug, Clone, Copy)]
pub struct MetadataRule {
    /// Human-readable name of the location.
    pub description: &'static str,
    /// Path pattern; the final segment matches the file name.
    pub pattern: &'static [Segment],
    /// Content validator, given the relative path and file bytes.
    pub validate: fn(&str, &[u8]) -> Result<()>,
}

impl MetadataRule {
    fn matches(&self, segments: &[&str]) -> bool {
        segments.len() == self.pattern.len()
            && self
                .pattern
                .iter()
                .zip(segments)
                .all(|(pattern, segment)| match pattern {
                    Segment::Literal(name) => name == segment,
                    Segment::Any => true,
                })
    }
}

/// Every metadata location accepted in a chaincode package.
pub const METADATA_RULES: &[MetadataRule] = &[
    MetadataRule {
        description: "state database index",
        pattern: &[
            Segment::Literal("statedb"),
            Segment::Literal("couchdb"),
            Segment::Literal("indexes"),
            Segment::Any,
        ],
        validate: validate_couchdb_index,
    },
    MetadataRule {
        description: "private data collection index",
        pattern: &[
            Segment::Literal("statedb"),
            Segment::Literal("couchdb"),
            Segment::Literal("collections"),
            Segment::Any,
            Segment::Literal("indexes"),
            Segment::Any,
        ],
        validate: validate_couchdb_index,
    },
];

/// Validates a metadata file against [`METADATA_RULES`].
///
/// `relative_path` is the `/`-separated path below the metadata root.
///
/// # Errors
///
/// Returns [`PackagerError::UnexpectedMetadata`] if no rule matches the
/// path, or [`PackagerError::InvalidMetadata`] if the matching rule
/// rejects the content.
pub fn validate_metadata_file(relative_path: &str, contents: &[u8]) -> Result<()> {
    let segments: Vec<&str> = relative_path.split('/').collect();
    let rule = METADATA_RULES
        .iter()
        .find(|rule| rule.matches(&segments))
        .ok_or_else(|| PackagerError::UnexpectedMetadata {
            path: relative_path.to_owned(),
        })?;

    (rule.validate)(relative_path, contents)
}

const INDEX_KEYS: [&str; 4] = ["index", "ddoc", "name", "type"];

/// Validates a CouchDB index definition.
fn validate_couchdb_index(path: &str, contents: &[u8]) -> Result<()> {
    if !path.ends_with(".json") {
        return Err(PackagerError::invalid_metadata(
            path,
            "index definitions must have a .json extension",
        ));
    }

    let value: Value = serde_json::from_slice(contents)
        .map_err(|e| PackagerError::invalid_metadata(path, format!("not valid JSON: {e}")))?;
    let definition = value
        .as_object()
        .ok_or_else(|| PackagerError::invalid_metadata(path, "index definition must be an object"))?;

    if let Some(key) = definition.keys().find(|key| !INDEX_KEYS.contains(&key.as_str())) {
        return Err(PackagerError::invalid_metadata(
            path,
            format!("unsupported entry {key:?}"),
        ));
    }

    validate_index_fields(path, definition)?;
    validate_optional_string(path, definition, "ddoc")?;
    validate_optional_string(path, definition, "name")?;

    match definition.get("type") {
        None => Ok(()),
        Some(Value::String(kind)) if kind == "json" => Ok(()),
        Some(other) => Err(PackagerError::invalid_metadata(
            path,
            format!("index type must be \"json\", found {other}"),
        )),
    }
}

fn validate_index_fields(path: &str, definition: &Map<String, Value>) -> Result<()> {
    let fields = definition
        .get("index")
        .and_then(Value::as_object)
        .and_then(|index| index.get("fields"))
        .and_then(Value::as_array)
        .ok_or_else(|| PackagerError::invalid_metadata(path, "missing index.fields array"))?;

    if fields.is_empty() {
        return Err(PackagerError::invalid_metadata(path, "index.fields is empty"));
    }

    fields.iter().try_for_each(|field| validate_sort_field(path, field))
}

/// A sort field is a name, or a single-entry object mapping a name to
/// `"asc"` or `"desc"`.
fn validate_sort_field(path: &str, field: &Value) -> Result<()> {
    match field {
        Value::String(_) => Ok(()),
        Value::Object(entry) if entry.len() == 1 => match entry.values().next() {
            Some(Value::String(direction)) if direction == "asc" || direction == "desc" => Ok(()),
            _ => Err(PackagerError::invalid_metadata(
                path,
                format!("sort direction in {field} must be \"asc\" or \"desc\""),
            )),
        },
        other => Err(PackagerError::invalid_metadata(
            path,
            format!("invalid index field {other}"),
        )),
    }
}

fn validate_optional_string(path: &str, definition: &Map<String, Value>, key: &str) -> Result<()> {
    match definition.get(key) {
        None | Some(Value::String(_)) => Ok(()),
        Some(other) => Err(PackagerError::invalid_metadata(
            path,
            format!("{key} must be a string, found {other}"),
        )),
    }
}
