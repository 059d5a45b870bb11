use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use anyhow::{Result, anyhow, ensure};
use serde::{Deserialize, Serialize};

use crate::model::EntityKind;

/// Identifies a node in the displayed tree as `Kind:id`.
///
/// Keys name entities, not paths: an entity reached under two parents shares one key, so
/// expanding it in one place expands it everywhere it appears.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct NodeKey {
    kind: EntityKind,
    id: String,
}

impl NodeKey {
    pub fn new(kind: EntityKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

impl Display for NodeKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

impl FromStr for NodeKey {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        let (kind, id) = value
            .trim()
            .split_once(':')
            .ok_or_else(|| anyhow!("invalid node key `{value}`; expected `Kind:id`"))?;
        let kind = kind.parse::<EntityKind>()?;
        ensure!(!id.is_empty(), "node key `{value}` has an empty id");
        Ok(Self::new(kind, id))
    }
}

impl From<NodeKey> for String {
    fn from(key: NodeKey) -> Self {
        key.to_string()
    }
}

impl TryFrom<String> for NodeKey {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(transparent)]
pub struct ExpansionState {
    expanded: BTreeSet<NodeKey>,
}

impl ExpansionState {
    pub fn toggle(&mut self, key: NodeKey) -> bool {
        if self.expanded.remove(&key) {
            false
        } else {
            self.expanded.insert(key);
            true
        }
    }

    pub fn expand(&mut self, key: NodeKey) {
        self.expanded.insert(key);
    }

    pub fn reset(&mut self) {
        self.expanded.clear();
    }

    pub fn is_expanded(&self, key: &NodeKey) -> bool {
        self.expanded.contains(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &NodeKey> {
        self.expanded.iter()
    }

    pub fn len(&self) -> usize {
        self.expanded.len()
    }

    pub fn is_empty(&self) -> bool {
        self.expanded.is_empty()
    }

    pub fn retain(&mut self, mut keep: impl FnMut(&NodeKey) -> bool) {
        self.expanded.retain(|key| keep(key));
    }
}

impl FromIterator<NodeKey> for ExpansionState {
    fn from_iter<I: IntoIterator<Item = NodeKey>>(iter: I) -> Self {
        Self {
            expanded: iter.into_iter().collect(),
        }
    }
}
