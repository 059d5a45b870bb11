use serde::Serialize;

use crate::error::Result;
use crate::model::{Entity, EntityKind};
use crate::resolver::EntityResolver;
use crate::store::EntityStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreStats {
    pub users: usize,
    pub user_groups: usize,
    pub roles: usize,
    pub total_entities: usize,
    pub links: usize,
}

impl StoreStats {
    pub fn collect(store: &EntityStore) -> Self {
        let users = store.count(EntityKind::User);
        let user_groups = store.count(EntityKind::UserGroup);
        let roles = store.count(EntityKind::Role);
        Self {
            users,
            user_groups,
            roles,
            total_entities: users + user_groups + roles,
            links: store.link_count(),
        }
    }
}

/// How far a role reaches through its groups.
///
/// `total_users` sums group memberships, so a user in two of the role's groups counts twice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleReach {
    pub role_id: String,
    pub role_name: String,
    pub user_groups: usize,
    pub total_users: usize,
}

impl RoleReach {
    pub fn for_role<R>(resolver: &R, role: &Entity) -> Self
    where
        R: EntityResolver + ?Sized,
    {
        let groups = role.related(EntityKind::UserGroup);
        let total_users = groups
            .iter()
            .filter_map(|group_id| resolver.resolve(EntityKind::UserGroup, group_id).ok())
            .map(|group| group.related(EntityKind::User).len())
            .sum();
        Self {
            role_id: role.id().to_owned(),
            role_name: role.name().to_owned(),
            user_groups: groups.len(),
            total_users,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub kind: EntityKind,
    pub count: usize,
    pub names: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntitySummary {
    pub kind: EntityKind,
    pub id: String,
    pub name: String,
    pub connections: Vec<Connection>,
}

impl EntitySummary {
    pub fn describe<R>(resolver: &R, kind: EntityKind, id: &str) -> Result<Self>
    where
        R: EntityResolver + ?Sized,
    {
        let entity = resolver.resolve(kind, id)?;
        let connections = kind
            .linkable_kinds()
            .iter()
            .map(|&related_kind| {
                let ids = entity.related(related_kind);
                Connection {
                    kind: related_kind,
                    count: ids.len(),
                    names: ids
                        .iter()
                        .filter_map(|related_id| resolver.resolve(related_kind, related_id).ok())
                        .map(|related| related.name().to_owned())
                        .collect(),
                }
            })
            .collect();

        Ok(Self {
            kind,
            id: entity.id().to_owned(),
            name: entity.name().to_owned(),
            connections,
        })
    }

    pub fn connected_to(&self) -> String {
        self.connections
            .iter()
            .map(|connection| {
                let label = connection.kind.label();
                if connection.count == 1 {
                    format!("1 {label}")
                } else {
                    format!("{} {label}s", connection.count)
                }
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[cfg(test)]
mod tests {
    use crate::error::GraphError;
    use crate::model::{EntityKind, EntityRef};
    use crate::store::seed::default_seed;
    use crate::store::{EntityStore, StoreConfig};

    use super::{EntitySummary, RoleReach, StoreStats};

    #[test]
    fn store_stats_count_each_kind_and_links() {
        let mut store = seeded_store();
        store
            .create(
                EntityKind::UserGroup,
                "Audit",
                Some(&EntityRef::new(EntityKind::Role, "role-1")),
            )
            .expect("group create should succeed");

        let stats = StoreStats::collect(&store);
        assert_eq!(stats.users, 3);
        assert_eq!(stats.user_groups, 4);
        assert_eq!(stats.roles, 3);
        assert_eq!(stats.total_entities, 10);
        assert_eq!(stats.links, 11);
    }

    #[test]
    fn role_reach_sums_users_without_deduplicating() {
        let store = seeded_store();
        let developer = store
            .get(EntityKind::Role, "role-2")
            .expect("role should exist");

        let reach = RoleReach::for_role(&store, developer);
        assert_eq!(reach.role_name, "Developer");
        assert_eq!(reach.user_groups, 2);
        // ABC sits in both groups and counts twice.
        assert_eq!(reach.total_users, 4);
    }

    #[test]
    fn entity_summary_lists_connections_in_kind_order() {
        let store = seeded_store();
        let summary = EntitySummary::describe(&store, EntityKind::UserGroup, "ug-2")
            .expect("group should be described");

        assert_eq!(summary.name, "Finance - II");
        assert_eq!(summary.connections.len(), 2);
        assert_eq!(summary.connections[0].kind, EntityKind::User);
        assert_eq!(summary.connections[0].names, vec!["ABC", "DEF"]);
        assert_eq!(summary.connections[1].names, vec!["Developer", "Team Lead"]);
        assert_eq!(summary.connected_to(), "2 users, 2 roles");

        let user = EntitySummary::describe(&store, EntityKind::User, "user-3")
            .expect("user should be described");
        assert_eq!(user.connected_to(), "1 user group");
    }

    #[test]
    fn entity_summary_of_missing_entity_is_not_found() {
        let store = seeded_store();
        let error = EntitySummary::describe(&store, EntityKind::Role, "role-9")
            .expect_err("missing role should fail");
        assert_eq!(error, GraphError::not_found(EntityKind::Role, "role-9"));
    }

    fn seeded_store() -> EntityStore {
        EntityStore::from_seed(&default_seed(), StoreConfig::default())
            .expect("default seed should load")
    }
}
