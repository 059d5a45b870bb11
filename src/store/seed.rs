use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::GraphError;
use crate::model::EntityKind;

use super::{EntityStore, StoreConfig};

/// Seed file shape. Direct User↔Role arrays found in some exports are ignored, since that
/// association is derived through groups.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedData {
    #[serde(default)]
    pub users: Vec<SeedUser>,
    #[serde(default)]
    pub user_groups: Vec<SeedUserGroup>,
    #[serde(default)]
    pub roles: Vec<SeedRole>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedUser {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub user_groups: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedUserGroup {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub users: Vec<String>,
    #[serde(default)]
    pub roles: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedRole {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub user_groups: Vec<String>,
}

#[derive(Debug, Clone, Copy)]
struct DeclaredLink<'a> {
    owner_kind: EntityKind,
    owner_id: &'a str,
    related_kind: EntityKind,
    related_id: &'a str,
}

impl SeedData {
    fn entities(&self) -> impl Iterator<Item = (EntityKind, &str, &str)> {
        let users = self
            .users
            .iter()
            .map(|user| (EntityKind::User, user.id.as_str(), user.name.as_str()));
        let groups = self
            .user_groups
            .iter()
            .map(|group| (EntityKind::UserGroup, group.id.as_str(), group.name.as_str()));
        let roles = self
            .roles
            .iter()
            .map(|role| (EntityKind::Role, role.id.as_str(), role.name.as_str()));
        users.chain(groups).chain(roles)
    }

    fn declared_links(&self) -> Vec<DeclaredLink<'_>> {
        let mut links = Vec::new();
        for user in &self.users {
            push_links(
                &mut links,
                EntityKind::User,
                &user.id,
                EntityKind::UserGroup,
                &user.user_groups,
            );
        }
        for group in &self.user_groups {
            push_links(
                &mut links,
                EntityKind::UserGroup,
                &group.id,
                EntityKind::User,
                &group.users,
            );
            push_links(
                &mut links,
                EntityKind::UserGroup,
                &group.id,
                EntityKind::Role,
                &group.roles,
            );
        }
        for role in &self.roles {
            push_links(
                &mut links,
                EntityKind::Role,
                &role.id,
                EntityKind::UserGroup,
                &role.user_groups,
            );
        }
        links
    }
}

fn push_links<'a>(
    links: &mut Vec<DeclaredLink<'a>>,
    owner_kind: EntityKind,
    owner_id: &'a str,
    related_kind: EntityKind,
    related_ids: &'a [String],
) {
    links.extend(related_ids.iter().map(|related_id| DeclaredLink {
        owner_kind,
        owner_id,
        related_kind,
        related_id: related_id.as_str(),
    }));
}

impl EntityStore {
    /// Each entity keeps the order its own lists declare; references only declared on one side
    /// are mirrored onto the other side afterwards.
    pub fn from_seed(seed: &SeedData, config: StoreConfig) -> crate::error::Result<Self> {
        let mut store = Self::new(config);
        for (kind, id, name) in seed.entities() {
            store.insert_with_id(kind, id, name)?;
        }

        let declared = seed.declared_links();
        for link in &declared {
            if !store.contains(link.related_kind, link.related_id) {
                return Err(GraphError::InvalidSeed(format!(
                    "{} `{}` references unknown {} `{}`",
                    link.owner_kind, link.owner_id, link.related_kind, link.related_id
                )));
            }
            store
                .related_set_mut(link.owner_kind, link.owner_id, link.related_kind)?
                .insert(link.related_id);
        }
        for link in &declared {
            store.link(
                link.owner_kind,
                link.owner_id,
                link.related_kind,
                link.related_id,
            )?;
        }

        info!(
            users = store.count(EntityKind::User),
            user_groups = store.count(EntityKind::UserGroup),
            roles = store.count(EntityKind::Role),
            links = store.link_count(),
            "loaded seed data"
        );
        Ok(store)
    }
}

pub fn load_seed(path: &Path) -> Result<SeedData> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read seed file `{}`", path.display()))?;
    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    if is_json {
        serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse seed file `{}`", path.display()))
    } else {
        serde_yaml::from_str(&raw)
            .with_context(|| format!("failed to parse seed file `{}`", path.display()))
    }
}

pub fn default_seed() -> SeedData {
    SeedData {
        users: vec![
            seed_user("user-1", "ABC", &["ug-1", "ug-2"]),
            seed_user("user-2", "DEF", &["ug-2", "ug-3"]),
            seed_user("user-3", "GHI", &["ug-1"]),
        ],
        user_groups: vec![
            seed_group("ug-1", "Finance - I", &["user-1", "user-3"], &["role-1", "role-2"]),
            seed_group("ug-2", "Finance - II", &["user-1", "user-2"], &["role-2", "role-3"]),
            seed_group("ug-3", "Payroll - I", &["user-2"], &["role-3"]),
        ],
        roles: vec![
            seed_role("role-1", "Admin", &["ug-1"]),
            seed_role("role-2", "Developer", &["ug-1", "ug-2"]),
            seed_role("role-3", "Team Lead", &["ug-2", "ug-3"]),
        ],
    }
}

fn seed_user(id: &str, name: &str, user_groups: &[&str]) -> SeedUser {
    SeedUser {
        id: id.to_owned(),
        name: name.to_owned(),
        user_groups: owned(user_groups),
    }
}

fn seed_group(id: &str, name: &str, users: &[&str], roles: &[&str]) -> SeedUserGroup {
    SeedUserGroup {
        id: id.to_owned(),
        name: name.to_owned(),
        users: owned(users),
        roles: owned(roles),
    }
}

fn seed_role(id: &str, name: &str, user_groups: &[&str]) -> SeedRole {
    SeedRole {
        id: id.to_owned(),
        name: name.to_owned(),
        user_groups: owned(user_groups),
    }
}

fn owned(ids: &[&str]) -> Vec<String> {
    ids.iter().map(|id| (*id).to_owned()).collect()
}
