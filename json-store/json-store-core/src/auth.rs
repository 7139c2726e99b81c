use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeSet;
use std::fmt;

const GROUP_SEPARATOR: char = ',';

/// The authenticated caller of a store operation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Principal {
    pub user_id: String,
    pub admin: bool,
    pub groups: BTreeSet<String>,
}

impl Principal {
    pub fn new(user_id: impl Into<String>, groups: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            user_id: user_id.into(),
            admin: false,
            groups: groups.into_iter().map(Into::into).collect(),
        }
    }

    pub fn admin(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            admin: true,
            groups: BTreeSet::new(),
        }
    }

    pub fn is_admin(&self) -> bool {
        self.admin
    }

    pub fn permission_groups(&self) -> &BTreeSet<String> {
        &self.groups
    }
}

/// Set of permission group names attached to a document.
///
/// Persisted as a single comma-delimited string.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PermissionSet(BTreeSet<String>);

impl PermissionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Split a delimited group string, trimming whitespace and skipping blanks.
    pub fn explode(groups: &str) -> Self {
        Self(
            groups
                .split(GROUP_SEPARATOR)
                .map(str::trim)
                .filter(|g| !g.is_empty())
                .map(str::to_string)
                .collect(),
        )
    }

    pub fn implode(&self) -> String {
        self.0
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(",")
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, group: &str) -> bool {
        self.0.contains(group)
    }

    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.0.iter()
    }

    pub fn intersects(&self, groups: &BTreeSet<String>) -> bool {
        !self.0.is_disjoint(groups)
    }
}

impl<S: Into<String>> FromIterator<S> for PermissionSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .filter_map(|g| {
                    let g: String = g.into();
                    let g = g.trim();
                    (!g.is_empty()).then(|| g.to_string())
                })
                .collect(),
        )
    }
}

impl fmt::Display for PermissionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.implode())
    }
}

impl Serialize for PermissionSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.implode())
    }
}

impl<'de> Deserialize<'de> for PermissionSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::explode(&raw))
    }
}

/// Decides whether a principal satisfies a permission expression.
pub trait PermissionEvaluator: Send + Sync {
    fn has_permission(&self, principal: &Principal, expression: &PermissionSet) -> bool;
}

/// Grants access to admins and to principals sharing at least one group
/// with the expression. An empty expression grants nothing to non-admins.
#[derive(Clone, Copy, Debug, Default)]
pub struct GroupPermissionEvaluator;

impl PermissionEvaluator for GroupPermissionEvaluator {
    fn has_permission(&self, principal: &Principal, expression: &PermissionSet) -> bool {
        if principal.is_admin() {
            return true;
        }
        expression.intersects(principal.permission_groups())
    }
}
