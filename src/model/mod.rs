use std::fmt::{Display, Formatter};
use std::str::FromStr;

use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "String")]
pub enum EntityKind {
    User,
    UserGroup,
    Role,
}

impl EntityKind {
    pub const ALL: [EntityKind; 3] = [Self::User, Self::UserGroup, Self::Role];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "User",
            Self::UserGroup => "UserGroup",
            Self::Role => "Role",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::UserGroup => "user group",
            Self::Role => "role",
        }
    }

    pub fn id_prefix(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::UserGroup => "ug",
            Self::Role => "role",
        }
    }

    pub fn linkable_kinds(self) -> &'static [EntityKind] {
        match self {
            Self::User => &[Self::UserGroup],
            Self::UserGroup => &[Self::User, Self::Role],
            Self::Role => &[Self::UserGroup],
        }
    }

    pub fn links_to(self, other: EntityKind) -> bool {
        self.linkable_kinds().contains(&other)
    }
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "user" | "users" => Ok(Self::User),
            "usergroup" | "user-group" | "user_group" | "user group" | "group" | "usergroups"
            | "groups" => Ok(Self::UserGroup),
            "role" | "roles" => Ok(Self::Role),
            other => Err(anyhow!(
                "invalid entity kind `{other}`; expected `user`, `usergroup`, or `role`"
            )),
        }
    }
}

impl TryFrom<String> for EntityKind {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ViewMode {
    #[default]
    User,
    UserGroup,
    Role,
}

impl ViewMode {
    pub const ALL: [ViewMode; 3] = [Self::User, Self::UserGroup, Self::Role];

    pub fn root_kind(self) -> EntityKind {
        match self {
            Self::User => EntityKind::User,
            Self::UserGroup => EntityKind::UserGroup,
            Self::Role => EntityKind::Role,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::User => "User",
            Self::UserGroup => "User Group",
            Self::Role => "Role",
        }
    }
}

impl From<EntityKind> for ViewMode {
    fn from(kind: EntityKind) -> Self {
        match kind {
            EntityKind::User => Self::User,
            EntityKind::UserGroup => Self::UserGroup,
            EntityKind::Role => Self::Role,
        }
    }
}

impl Display for ViewMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ViewMode {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        value.parse::<EntityKind>().map(Self::from).map_err(|_| {
            anyhow!(
                "invalid view mode `{}`; expected `user`, `usergroup`, or `role`",
                value.trim()
            )
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityRef {
    pub kind: EntityKind,
    pub id: String,
}

impl EntityRef {
    pub fn new(kind: EntityKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }
}

impl Display for EntityRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} `{}`", self.kind, self.id)
    }
}

/// Insertion-ordered set of entity ids.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct IdSet(Vec<String>);

impl IdSet {
    pub fn contains(&self, id: &str) -> bool {
        self.0.iter().any(|existing| existing == id)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub(crate) fn insert(&mut self, id: &str) -> bool {
        if self.contains(id) {
            return false;
        }
        self.0.push(id.to_owned());
        true
    }

    pub(crate) fn remove(&mut self, id: &str) -> bool {
        let before = self.0.len();
        self.0.retain(|existing| existing != id);
        self.0.len() != before
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
enum EntityLinks {
    #[serde(rename_all = "camelCase")]
    User { user_groups: IdSet },
    #[serde(rename_all = "camelCase")]
    UserGroup { users: IdSet, roles: IdSet },
    #[serde(rename_all = "camelCase")]
    Role { user_groups: IdSet },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entity {
    id: String,
    name: String,
    #[serde(flatten)]
    links: EntityLinks,
}

impl Entity {
    pub(crate) fn new(kind: EntityKind, id: impl Into<String>, name: impl Into<String>) -> Self {
        let links = match kind {
            EntityKind::User => EntityLinks::User {
                user_groups: IdSet::default(),
            },
            EntityKind::UserGroup => EntityLinks::UserGroup {
                users: IdSet::default(),
                roles: IdSet::default(),
            },
            EntityKind::Role => EntityLinks::Role {
                user_groups: IdSet::default(),
            },
        };

        Self {
            id: id.into(),
            name: name.into(),
            links,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> EntityKind {
        match self.links {
            EntityLinks::User { .. } => EntityKind::User,
            EntityLinks::UserGroup { .. } => EntityKind::UserGroup,
            EntityLinks::Role { .. } => EntityKind::Role,
        }
    }

    pub fn related(&self, kind: EntityKind) -> &[String] {
        self.related_set(kind).map(IdSet::as_slice).unwrap_or_default()
    }

    pub fn references(&self, kind: EntityKind, id: &str) -> bool {
        self.related_set(kind).is_some_and(|set| set.contains(id))
    }

    pub fn link_count(&self) -> usize {
        match &self.links {
            EntityLinks::User { user_groups } | EntityLinks::Role { user_groups } => {
                user_groups.len()
            }
            EntityLinks::UserGroup { users, roles } => users.len() + roles.len(),
        }
    }

    pub(crate) fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub(crate) fn related_mut(&mut self, kind: EntityKind) -> Option<&mut IdSet> {
        match (&mut self.links, kind) {
            (EntityLinks::User { user_groups }, EntityKind::UserGroup)
            | (EntityLinks::Role { user_groups }, EntityKind::UserGroup) => Some(user_groups),
            (EntityLinks::UserGroup { users, .. }, EntityKind::User) => Some(users),
            (EntityLinks::UserGroup { roles, .. }, EntityKind::Role) => Some(roles),
            _ => None,
        }
    }

    fn related_set(&self, kind: EntityKind) -> Option<&IdSet> {
        match (&self.links, kind) {
            (EntityLinks::User { user_groups }, EntityKind::UserGroup)
            | (EntityLinks::Role { user_groups }, EntityKind::UserGroup) => Some(user_groups),
            (EntityLinks::UserGroup { users, .. }, EntityKind::User) => Some(users),
            (EntityLinks::UserGroup { roles, .. }, EntityKind::Role) => Some(roles),
            _ => None,
        }
    }
}
