//! Dotted data paths into a document payload.
//!
//! A path such as `settings.display.theme` names a chain of object members
//! starting at the payload root. Only object members are addressable; arrays
//! and scalars end the walk.

use serde_json::{Map, Value};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

const SEPARATOR: char = '.';

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DataPath {
    segments: Vec<String>,
}

impl DataPath {
    /// Split on `.`. Empty segments are kept and looked up literally.
    pub fn parse(path: &str) -> Self {
        Self {
            segments: path.split(SEPARATOR).map(str::to_string).collect(),
        }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Parent segments and the final member name.
    fn split_last(&self) -> (&[String], &str) {
        match self.segments.split_last() {
            Some((last, parents)) => (parents, last.as_str()),
            None => (&[], ""),
        }
    }
}

impl FromStr for DataPath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl fmt::Display for DataPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("."))
    }
}

/// Change applied to the member a path points at.
#[derive(Clone, Debug, PartialEq)]
pub enum PathOperation {
    /// Shallow-merge into an existing object, otherwise overwrite.
    Append(Value),
    /// Overwrite the member.
    Replace(Value),
    /// Remove the member.
    Delete,
}

/// Walk `path` from `root`, returning the addressed node.
pub fn resolve<'a>(root: &'a Value, path: &DataPath) -> Option<&'a Value> {
    path.segments()
        .iter()
        .try_fold(root, |node, segment| node.as_object()?.get(segment))
}

fn resolve_parent_mut<'a>(root: &'a mut Value, parents: &[String]) -> Option<&'a mut Map<String, Value>> {
    let mut node = root;
    for segment in parents {
        node = node.as_object_mut()?.get_mut(segment)?;
    }
    node.as_object_mut()
}

/// Apply `operation` at `path` inside `root`.
///
/// Returns `false` when the parent of the target is missing or not an
/// object, or when a delete names an absent member. Intermediate objects are
/// never created.
pub fn modify(root: &mut Value, path: &DataPath, operation: PathOperation) -> bool {
    let (parents, member) = path.split_last();
    let Some(parent) = resolve_parent_mut(root, parents) else {
        return false;
    };

    match operation {
        PathOperation::Append(Value::Object(additions))
            if parent.get(member).is_some_and(Value::is_object) =>
        {
            if let Some(Value::Object(existing)) = parent.get_mut(member) {
                existing.extend(additions);
            }
            true
        }
        PathOperation::Append(new_value) | PathOperation::Replace(new_value) => {
            parent.insert(member.to_string(), new_value);
            true
        }
        PathOperation::Delete => parent.remove(member).is_some(),
    }
}
