//! Nested per-field validation messages addressed by the UI.
//!
//! An [`ErrorTree`] is at most two levels deep: top-level keys hold either a
//! list of messages or a group of message lists. Deeper diagnostic paths are
//! flattened into dotted keys by the normaliser before they reach the tree, so
//! the depth bound is carried by the type rather than checked at runtime.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One segment of a diagnostic path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// Named field, e.g. `rates`.
    Key(String),
    /// Positional index, e.g. the `0` in `amenities.0`.
    Index(i64),
}

impl PathSegment {
    /// Whether the segment renders as an empty string.
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Key(key) if key.is_empty())
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(key) => f.write_str(key),
            Self::Index(index) => write!(f, "{index}"),
        }
    }
}

impl From<&str> for PathSegment {
    fn from(value: &str) -> Self {
        Self::Key(value.to_owned())
    }
}

impl From<String> for PathSegment {
    fn from(value: String) -> Self {
        Self::Key(value)
    }
}

impl From<i64> for PathSegment {
    fn from(value: i64) -> Self {
        Self::Index(value)
    }
}

/// Value stored under a top-level [`ErrorTree`] key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ErrorNode {
    /// Messages for a single field, in the order they were reported.
    Messages(Vec<String>),
    /// Messages for the fields of a structured group such as `location`.
    Group(BTreeMap<String, Vec<String>>),
}

/// Structural problems found while building or decoding an [`ErrorTree`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorTreeShapeError {
    /// The encoded tree was not a JSON object.
    NotAnObject,
    /// A key was the empty string.
    EmptyKey,
    /// A top-level entry was neither a message list nor a group.
    InvalidEntry { field: String },
    /// A group member was not a list of strings.
    InvalidGroupMember { group: String, field: String },
    /// Messages were added to a key that already holds a group.
    FieldIsGroup { field: String },
    /// A group was requested for a key that already holds messages.
    GroupIsField { group: String },
}

impl fmt::Display for ErrorTreeShapeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotAnObject => write!(f, "error tree must be an object"),
            Self::EmptyKey => write!(f, "error tree keys must not be empty"),
            Self::InvalidEntry { field } => {
                write!(f, "entry `{field}` must be a list of messages or a group")
            }
            Self::InvalidGroupMember { group, field } => {
                write!(f, "entry `{group}.{field}` must be a list of messages")
            }
            Self::FieldIsGroup { field } => {
                write!(f, "`{field}` already holds nested field errors")
            }
            Self::GroupIsField { group } => {
                write!(f, "`{group}` already holds field-level messages")
            }
        }
    }
}

impl std::error::Error for ErrorTreeShapeError {}

/// Per-field validation messages for a form.
///
/// ## Invariants
/// - No key, at either level, is the empty string.
/// - A group may exist and be empty.
///
/// # Examples
/// ```
/// use rentals::domain::ErrorTree;
///
/// let mut tree = ErrorTree::new();
/// tree.push_message("title", "Title is required")?;
/// tree.push_group_message("rates", "nightly", "Nightly rate must be positive")?;
///
/// assert_eq!(tree.messages("title"), Some(&["Title is required".to_owned()][..]));
/// assert!(tree.group("rates").is_some_and(|group| group.contains_key("nightly")));
/// # Ok::<(), rentals::domain::ErrorTreeShapeError>(())
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ErrorTree(#[serde(deserialize_with = "deserialize_entries")] BTreeMap<String, ErrorNode>);

impl ErrorTree {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether no field has errors recorded.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of top-level entries.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Look up a top-level entry.
    pub fn get(&self, key: &str) -> Option<&ErrorNode> {
        self.0.get(key)
    }

    /// Messages recorded directly under `field`.
    pub fn messages(&self, field: &str) -> Option<&[String]> {
        match self.0.get(field) {
            Some(ErrorNode::Messages(messages)) => Some(messages.as_slice()),
            _ => None,
        }
    }

    /// Member messages recorded under `group`.
    pub fn group(&self, group: &str) -> Option<&BTreeMap<String, Vec<String>>> {
        match self.0.get(group) {
            Some(ErrorNode::Group(members)) => Some(members),
            _ => None,
        }
    }

    /// Iterate over top-level entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ErrorNode)> {
        self.0.iter().map(|(key, node)| (key.as_str(), node))
    }

    /// Append a message to a top-level field, creating the list on first use.
    pub fn push_message(
        &mut self,
        field: impl Into<String>,
        message: impl Into<String>,
    ) -> Result<(), ErrorTreeShapeError> {
        let field = non_empty_key(field.into())?;
        match self
            .0
            .entry(field.clone())
            .or_insert_with(|| ErrorNode::Messages(Vec::new()))
        {
            ErrorNode::Messages(messages) => {
                messages.push(message.into());
                Ok(())
            }
            ErrorNode::Group(_) => Err(ErrorTreeShapeError::FieldIsGroup { field }),
        }
    }

    /// Make sure `group` exists as a (possibly empty) group entry.
    pub fn ensure_group(
        &mut self,
        group: impl Into<String>,
    ) -> Result<&mut BTreeMap<String, Vec<String>>, ErrorTreeShapeError> {
        let group = non_empty_key(group.into())?;
        match self
            .0
            .entry(group.clone())
            .or_insert_with(|| ErrorNode::Group(BTreeMap::new()))
        {
            ErrorNode::Group(members) => Ok(members),
            ErrorNode::Messages(_) => Err(ErrorTreeShapeError::GroupIsField { group }),
        }
    }

    /// Append a message to `group.field`, creating both levels on first use.
    pub fn push_group_message(
        &mut self,
        group: impl Into<String>,
        field: impl Into<String>,
        message: impl Into<String>,
    ) -> Result<(), ErrorTreeShapeError> {
        let field = non_empty_key(field.into())?;
        self.ensure_group(group)?
            .entry(field)
            .or_default()
            .push(message.into());
        Ok(())
    }

    /// Decode a tree from an untrusted JSON value.
    ///
    /// Every leaf must be an array of strings and every key non-empty;
    /// anything else rejects the whole value.
    pub fn from_json(value: &Value) -> Result<Self, ErrorTreeShapeError> {
        let Value::Object(entries) = value else {
            return Err(ErrorTreeShapeError::NotAnObject);
        };

        let mut tree = BTreeMap::new();
        for (key, entry) in entries {
            let key = non_empty_key(key.clone())?;
            let node = match entry {
                Value::Array(items) => ErrorNode::Messages(
                    string_list(items)
                        .ok_or_else(|| ErrorTreeShapeError::InvalidEntry { field: key.clone() })?,
                ),
                Value::Object(members) => ErrorNode::Group(decode_group(&key, members)?),
                _ => return Err(ErrorTreeShapeError::InvalidEntry { field: key }),
            };
            tree.insert(key, node);
        }
        Ok(Self(tree))
    }

    /// Encode the tree as the JSON object consumed by the UI.
    pub fn to_json(&self) -> Value {
        // String-keyed maps of strings always serialise.
        serde_json::to_value(self).unwrap_or_default()
    }
}

fn non_empty_key(key: String) -> Result<String, ErrorTreeShapeError> {
    if key.is_empty() {
        return Err(ErrorTreeShapeError::EmptyKey);
    }
    Ok(key)
}

fn string_list(items: &[Value]) -> Option<Vec<String>> {
    items
        .iter()
        .map(|item| item.as_str().map(str::to_owned))
        .collect()
}

fn decode_group(
    group: &str,
    members: &serde_json::Map<String, Value>,
) -> Result<BTreeMap<String, Vec<String>>, ErrorTreeShapeError> {
    members
        .iter()
        .map(|(field, messages)| {
            let field = non_empty_key(field.clone())?;
            let messages = messages
                .as_array()
                .and_then(|items| string_list(items))
                .ok_or_else(|| ErrorTreeShapeError::InvalidGroupMember {
                    group: group.to_owned(),
                    field: field.clone(),
                })?;
            Ok((field, messages))
        })
        .collect()
}

fn deserialize_entries<'de, D>(deserializer: D) -> Result<BTreeMap<String, ErrorNode>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    ErrorTree::from_json(&value)
        .map(|tree| tree.0)
        .map_err(serde::de::Error::custom)
}
