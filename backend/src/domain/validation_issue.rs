//! Normalisation of schema-validator diagnostics into an [`ErrorTree`].
//!
//! Diagnostics arrive from an external validator and are treated as
//! untrusted. Two failure policies apply:
//!
//! - [`BatchDefect`]: the batch itself is unusable (missing, not a list, or
//!   iteration failed). The whole result collapses to an empty tree, which the
//!   UI renders as a single generic message. A half-built tree is never
//!   returned.
//! - [`IssueDefect`]: one diagnostic is malformed. It is logged and skipped;
//!   the remaining diagnostics are still structured.
//!
//! Paths of one segment become field lists, paths of two segments become
//! groups, and longer paths are joined with `.` into a flat key.

use std::borrow::Borrow;
use std::convert::Infallible;
use std::fmt;

use serde_json::Value;
use tracing::warn;

use super::error_tree::{ErrorTree, ErrorTreeShapeError, PathSegment};

/// A single diagnostic emitted by a schema validator.
///
/// ## Invariants
/// - `message` is non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    path: Vec<PathSegment>,
    message: String,
}

impl ValidationIssue {
    /// Build an issue, rejecting an empty message.
    pub fn new(
        path: impl IntoIterator<Item = PathSegment>,
        message: impl Into<String>,
    ) -> Result<Self, IssueDefect> {
        let message = message.into();
        if message.is_empty() {
            return Err(IssueDefect::EmptyMessage);
        }
        Ok(Self {
            path: path.into_iter().collect(),
            message,
        })
    }

    /// Decode an issue from an untrusted JSON record.
    pub fn from_json(value: &Value) -> Result<Self, IssueDefect> {
        let Value::Object(record) = value else {
            return Err(IssueDefect::NotARecord);
        };

        let path = match record.get("path") {
            None | Some(Value::Null) => return Err(IssueDefect::MissingPath),
            Some(Value::Array(segments)) => segments
                .iter()
                .enumerate()
                .map(|(position, segment)| decode_segment(position, segment))
                .collect::<Result<Vec<_>, _>>()?,
            Some(_) => return Err(IssueDefect::PathNotSequence),
        };

        let message = match record.get("message") {
            None | Some(Value::Null) => return Err(IssueDefect::MissingMessage),
            Some(Value::String(message)) => message.clone(),
            Some(_) => return Err(IssueDefect::MessageNotString),
        };

        Self::new(path, message)
    }

    /// Path segments from the form root to the failing field.
    pub fn path(&self) -> &[PathSegment] {
        self.path.as_slice()
    }

    /// Human-readable diagnostic.
    pub fn message(&self) -> &str {
        self.message.as_str()
    }
}

fn decode_segment(position: usize, segment: &Value) -> Result<PathSegment, IssueDefect> {
    match segment {
        Value::String(key) => Ok(PathSegment::Key(key.clone())),
        Value::Number(number) => number
            .as_i64()
            .map(PathSegment::Index)
            .ok_or(IssueDefect::UnrepresentablePath { position }),
        _ => Err(IssueDefect::UnrepresentablePath { position }),
    }
}

/// Reasons a whole diagnostic batch is discarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchDefect {
    /// No batch was supplied.
    Missing,
    /// The batch was not a list.
    NotAnArray,
    /// The source failed part-way through iteration.
    Iteration { message: String },
}

impl fmt::Display for BatchDefect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing => write!(f, "parameter is null or undefined"),
            Self::NotAnArray => write!(f, "parameter is not an array"),
            Self::Iteration { message } => write!(f, "iterating issues failed: {message}"),
        }
    }
}

impl std::error::Error for BatchDefect {}

/// Reasons a single diagnostic is skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssueDefect {
    /// The item was not a keyed record.
    NotARecord,
    /// The record carried no `path`.
    MissingPath,
    /// `path` was not an ordered sequence.
    PathNotSequence,
    /// `path` had no segments.
    EmptyPath,
    /// A path segment could not be rendered as a key.
    UnrepresentablePath { position: usize },
    /// The record carried no `message`.
    MissingMessage,
    /// `message` was not a string.
    MessageNotString,
    /// `message` was the empty string.
    EmptyMessage,
    /// The issue addressed the tree in a way that conflicts with earlier issues.
    Shape(ErrorTreeShapeError),
}

impl fmt::Display for IssueDefect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotARecord => write!(f, "issue is not an object"),
            Self::MissingPath => write!(f, "issue has no path"),
            Self::PathNotSequence => write!(f, "issue path is not an array"),
            Self::EmptyPath => write!(f, "issue path is empty"),
            Self::UnrepresentablePath { position } => {
                write!(f, "issue path segment {position} is not a string or integer")
            }
            Self::MissingMessage => write!(f, "issue has no message"),
            Self::MessageNotString => write!(f, "issue message is not a string"),
            Self::EmptyMessage => write!(f, "issue message is empty"),
            Self::Shape(error) => write!(f, "issue conflicts with tree shape: {error}"),
        }
    }
}

impl std::error::Error for IssueDefect {}

impl From<ErrorTreeShapeError> for IssueDefect {
    fn from(value: ErrorTreeShapeError) -> Self {
        Self::Shape(value)
    }
}

/// Normalise an untrusted diagnostic batch, falling back to an empty tree.
///
/// # Examples
/// ```
/// use rentals::domain::normalize_issue_batch;
/// use serde_json::json;
///
/// let tree = normalize_issue_batch(&json!([
///     { "path": ["title"], "message": "Title is required" },
///     { "path": ["rates", "nightly"], "message": "Must be positive" },
/// ]));
/// assert_eq!(
///     tree.to_json(),
///     json!({ "title": ["Title is required"], "rates": { "nightly": ["Must be positive"] } })
/// );
/// ```
pub fn normalize_issue_batch(input: &Value) -> ErrorTree {
    or_empty_tree(try_normalize_issue_batch(input))
}

/// Normalise an untrusted diagnostic batch, reporting batch-level defects.
pub fn try_normalize_issue_batch(input: &Value) -> Result<ErrorTree, BatchDefect> {
    match input {
        Value::Null => Err(BatchDefect::Missing),
        Value::Array(items) => structure_items(items.iter().map(Ok::<_, Infallible>)),
        _ => Err(BatchDefect::NotAnArray),
    }
}

/// Normalise diagnostics pulled from a fallible source.
///
/// The first source error discards everything gathered so far.
pub fn normalize_issue_stream<I, V, E>(items: I) -> ErrorTree
where
    I: IntoIterator<Item = Result<V, E>>,
    V: Borrow<Value>,
    E: fmt::Display,
{
    or_empty_tree(structure_items(items))
}

/// Normalise diagnostics that are already typed.
pub fn normalize_issues(issues: &[ValidationIssue]) -> ErrorTree {
    let mut tree = ErrorTree::new();
    for (index, issue) in issues.iter().enumerate() {
        if let Err(defect) = place_issue(&mut tree, issue) {
            skip_issue(index, &defect);
        }
    }
    tree
}

fn or_empty_tree(outcome: Result<ErrorTree, BatchDefect>) -> ErrorTree {
    outcome.unwrap_or_else(|defect| {
        warn!(reason = %defect, "discarding validation issue batch");
        ErrorTree::new()
    })
}

fn skip_issue(index: usize, defect: &IssueDefect) {
    warn!(index, reason = %defect, "skipping malformed validation issue");
}

fn structure_items<I, V, E>(items: I) -> Result<ErrorTree, BatchDefect>
where
    I: IntoIterator<Item = Result<V, E>>,
    V: Borrow<Value>,
    E: fmt::Display,
{
    let mut tree = ErrorTree::new();
    for (index, item) in items.into_iter().enumerate() {
        let item = item.map_err(|error| BatchDefect::Iteration {
            message: error.to_string(),
        })?;
        let placed = ValidationIssue::from_json(item.borrow())
            .and_then(|issue| place_issue(&mut tree, &issue));
        if let Err(defect) = placed {
            skip_issue(index, &defect);
        }
    }
    Ok(tree)
}

fn place_issue(tree: &mut ErrorTree, issue: &ValidationIssue) -> Result<(), IssueDefect> {
    let message = issue.message();
    match issue.path() {
        [] => Err(IssueDefect::EmptyPath),
        [field] => Ok(tree.push_message(field.to_string(), message)?),
        [group, field] => {
            tree.ensure_group(group.to_string())?;
            if !field.is_empty() {
                tree.push_group_message(group.to_string(), field.to_string(), message)?;
            }
            Ok(())
        }
        deep => {
            let key = deep
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(".");
            Ok(tree.push_message(key, message)?)
        }
    }
}
