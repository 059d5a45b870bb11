use serde::Serialize;
use tracing::debug;

use crate::error::{GraphError, Result};
use crate::model::{Entity, EntityKind};
use crate::resolver::EntityResolver;
use crate::search::filter_by_name;
use crate::stats::RoleReach;
use crate::store::EntityStore;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RoleDrilldown {
    selected_role: Option<String>,
    selected_group: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupEntry {
    pub id: String,
    pub name: String,
    pub users: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberEntry {
    pub id: String,
    pub name: String,
    pub user_groups: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DrilldownSummary {
    pub user_groups: usize,
    pub total_users: usize,
    pub selected_group_users: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleDrilldownView {
    pub roles: Vec<RoleReach>,
    pub selected_role: Option<String>,
    pub selected_group: Option<String>,
    pub groups: Vec<GroupEntry>,
    pub users: Vec<MemberEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<DrilldownSummary>,
}

impl RoleDrilldown {
    pub fn selected_role(&self) -> Option<&str> {
        self.selected_role.as_deref()
    }

    pub fn selected_group(&self) -> Option<&str> {
        self.selected_group.as_deref()
    }

    pub fn select_role<R>(&mut self, resolver: &R, role_id: &str) -> Result<()>
    where
        R: EntityResolver + ?Sized,
    {
        resolver.resolve(EntityKind::Role, role_id)?;
        self.selected_role = Some(role_id.to_owned());
        self.selected_group = None;
        debug!(role_id = %role_id, "selected drill-down role");
        Ok(())
    }

    pub fn select_group<R>(&mut self, resolver: &R, group_id: &str) -> Result<()>
    where
        R: EntityResolver + ?Sized,
    {
        let role = self
            .selected_role
            .as_deref()
            .map(|role_id| resolver.resolve(EntityKind::Role, role_id))
            .transpose()?;
        let belongs = role.is_some_and(|role| role.references(EntityKind::UserGroup, group_id));
        if !belongs {
            return Err(GraphError::not_found(EntityKind::UserGroup, group_id));
        }
        resolver.resolve(EntityKind::UserGroup, group_id)?;

        self.selected_group = Some(group_id.to_owned());
        debug!(group_id = %group_id, "selected drill-down user group");
        Ok(())
    }

    pub fn clear(&mut self) {
        self.selected_role = None;
        self.selected_group = None;
    }

    pub fn prune_missing<R>(&mut self, resolver: &R)
    where
        R: EntityResolver + ?Sized,
    {
        let role = self
            .selected_role
            .as_deref()
            .and_then(|role_id| resolver.resolve(EntityKind::Role, role_id).ok());
        let Some(role) = role else {
            self.clear();
            return;
        };

        let group_still_linked = self.selected_group.as_deref().is_some_and(|group_id| {
            role.references(EntityKind::UserGroup, group_id)
                && resolver.resolve(EntityKind::UserGroup, group_id).is_ok()
        });
        if !group_still_linked {
            self.selected_group = None;
        }
    }

    pub fn view(&self, store: &EntityStore, query: &str) -> Result<RoleDrilldownView> {
        let roles = filter_by_name(store.list(EntityKind::Role), query)
            .into_iter()
            .map(|role| RoleReach::for_role(store, role))
            .collect();

        let role = self
            .selected_role
            .as_deref()
            .map(|role_id| store.resolve(EntityKind::Role, role_id))
            .transpose()?;
        let group = self
            .selected_group
            .as_deref()
            .map(|group_id| store.resolve(EntityKind::UserGroup, group_id))
            .transpose()?;

        let groups = role
            .map(|role| resolved(store, role, EntityKind::UserGroup))
            .unwrap_or_default();
        let users = group
            .map(|group| resolved(store, group, EntityKind::User))
            .unwrap_or_default();

        let summary = role.map(|_| DrilldownSummary {
            user_groups: groups.len(),
            total_users: groups
                .iter()
                .map(|group| group.related(EntityKind::User).len())
                .sum(),
            selected_group_users: group.map(|_| users.len()),
        });

        Ok(RoleDrilldownView {
            roles,
            selected_role: self.selected_role.clone(),
            selected_group: self.selected_group.clone(),
            groups: groups
                .iter()
                .map(|group| GroupEntry {
                    id: group.id().to_owned(),
                    name: group.name().to_owned(),
                    users: group.related(EntityKind::User).len(),
                })
                .collect(),
            users: users
                .iter()
                .map(|user| MemberEntry {
                    id: user.id().to_owned(),
                    name: user.name().to_owned(),
                    user_groups: user.related(EntityKind::UserGroup).len(),
                })
                .collect(),
            summary,
        })
    }
}

fn resolved<'a>(store: &'a EntityStore, entity: &Entity, kind: EntityKind) -> Vec<&'a Entity> {
    entity
        .related(kind)
        .iter()
        .filter_map(|id| store.get(kind, id))
        .collect()
}
