use std::collections::HashMap;

use tracing::debug;

use crate::error::{GraphError, Result};
use crate::model::{Entity, EntityKind, EntityRef, IdSet};

pub mod integrity;
pub mod seed;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StoreConfig {
    pub allow_user_delete: bool,
}

#[derive(Debug, Clone, Default)]
struct EntityTable {
    order: Vec<String>,
    entries: HashMap<String, Entity>,
    next_id: u64,
}

impl EntityTable {
    fn get(&self, id: &str) -> Option<&Entity> {
        self.entries.get(id)
    }

    fn get_mut(&mut self, id: &str) -> Option<&mut Entity> {
        self.entries.get_mut(id)
    }

    fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    fn insert(&mut self, entity: Entity) {
        self.order.push(entity.id().to_owned());
        self.entries.insert(entity.id().to_owned(), entity);
    }

    fn remove(&mut self, id: &str) -> Option<Entity> {
        let removed = self.entries.remove(id)?;
        self.order.retain(|existing| existing != id);
        Some(removed)
    }

    fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.order.iter().filter_map(|id| self.entries.get(id))
    }

    fn iter_mut(&mut self) -> impl Iterator<Item = &mut Entity> {
        self.entries.values_mut()
    }

    fn len(&self) -> usize {
        self.order.len()
    }
}

/// Owner of every User, UserGroup, and Role.
///
/// All mutation goes through this type so relationship sets stay symmetric: whenever A lists B,
/// B lists A. Each public mutation validates before it writes, so a failed call leaves the store
/// untouched.
#[derive(Debug, Clone, Default)]
pub struct EntityStore {
    config: StoreConfig,
    users: EntityTable,
    user_groups: EntityTable,
    roles: EntityTable,
}

impl EntityStore {
    pub fn new(config: StoreConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> StoreConfig {
        self.config
    }

    pub fn list(&self, kind: EntityKind) -> impl Iterator<Item = &Entity> {
        self.table(kind).iter()
    }

    pub fn get(&self, kind: EntityKind, id: &str) -> Option<&Entity> {
        self.table(kind).get(id)
    }

    pub fn contains(&self, kind: EntityKind, id: &str) -> bool {
        self.table(kind).contains(id)
    }

    pub fn count(&self, kind: EntityKind) -> usize {
        self.table(kind).len()
    }

    /// Number of stored edges. Each User↔UserGroup and UserGroup↔Role pair counts once.
    pub fn link_count(&self) -> usize {
        self.user_groups
            .iter()
            .map(|group| {
                group.related(EntityKind::User).len() + group.related(EntityKind::Role).len()
            })
            .sum()
    }

    pub fn create(
        &mut self,
        kind: EntityKind,
        name: &str,
        initial_link: Option<&EntityRef>,
    ) -> Result<String> {
        let name = validate_name(name)?;
        if let Some(parent) = initial_link {
            ensure_linkable(kind, parent.kind)?;
            self.require(parent.kind, &parent.id)?;
        }

        let id = self.allocate_id(kind);
        self.table_mut(kind).insert(Entity::new(kind, id.clone(), name));
        if let Some(parent) = initial_link {
            self.link(kind, &id, parent.kind, &parent.id)?;
        }

        debug!(
            kind = %kind,
            id = %id,
            name = %name,
            linked_to = initial_link.map(|parent| parent.to_string()),
            "created entity"
        );
        Ok(id)
    }

    pub(crate) fn insert_with_id(&mut self, kind: EntityKind, id: &str, name: &str) -> Result<()> {
        if id.trim().is_empty() {
            return Err(GraphError::InvalidSeed(format!("{kind} id cannot be empty")));
        }
        if self.contains(kind, id) {
            return Err(GraphError::DuplicateId {
                kind,
                id: id.to_owned(),
            });
        }

        let name = validate_name(name)?;
        self.table_mut(kind).insert(Entity::new(kind, id, name));
        Ok(())
    }

    pub fn rename(&mut self, kind: EntityKind, id: &str, new_name: &str) -> Result<()> {
        let name = validate_name(new_name)?;
        let entity = self
            .table_mut(kind)
            .get_mut(id)
            .ok_or_else(|| GraphError::not_found(kind, id))?;
        entity.set_name(name);

        debug!(kind = %kind, id = %id, name = %name, "renamed entity");
        Ok(())
    }

    pub fn delete(&mut self, kind: EntityKind, id: &str) -> Result<()> {
        if kind == EntityKind::User && !self.config.allow_user_delete {
            return Err(GraphError::Protected { kind });
        }
        self.table_mut(kind)
            .remove(id)
            .ok_or_else(|| GraphError::not_found(kind, id))?;

        let mut cleaned = 0usize;
        for &related_kind in kind.linkable_kinds() {
            for entity in self.table_mut(related_kind).iter_mut() {
                if entity
                    .related_mut(kind)
                    .is_some_and(|set| set.remove(id))
                {
                    cleaned += 1;
                }
            }
        }

        debug!(
            kind = %kind,
            id = %id,
            cleaned_references = cleaned,
            "deleted entity"
        );
        Ok(())
    }

    pub fn link(
        &mut self,
        kind_a: EntityKind,
        id_a: &str,
        kind_b: EntityKind,
        id_b: &str,
    ) -> Result<bool> {
        ensure_linkable(kind_a, kind_b)?;
        self.require(kind_a, id_a)?;
        self.require(kind_b, id_b)?;

        let forward = self.related_set_mut(kind_a, id_a, kind_b)?.insert(id_b);
        let reverse = self.related_set_mut(kind_b, id_b, kind_a)?.insert(id_a);
        let changed = forward || reverse;

        if changed {
            debug!(
                from_kind = %kind_a,
                from_id = %id_a,
                to_kind = %kind_b,
                to_id = %id_b,
                "linked entities"
            );
        }
        Ok(changed)
    }

    pub fn unlink(
        &mut self,
        kind_a: EntityKind,
        id_a: &str,
        kind_b: EntityKind,
        id_b: &str,
    ) -> Result<bool> {
        ensure_linkable(kind_a, kind_b)?;
        self.require(kind_a, id_a)?;
        self.require(kind_b, id_b)?;

        let forward = self.related_set_mut(kind_a, id_a, kind_b)?.remove(id_b);
        let reverse = self.related_set_mut(kind_b, id_b, kind_a)?.remove(id_a);
        let changed = forward || reverse;

        if changed {
            debug!(
                from_kind = %kind_a,
                from_id = %id_a,
                to_kind = %kind_b,
                to_id = %id_b,
                "unlinked entities"
            );
        }
        Ok(changed)
    }

    fn require(&self, kind: EntityKind, id: &str) -> Result<&Entity> {
        self.get(kind, id)
            .ok_or_else(|| GraphError::not_found(kind, id))
    }

    fn related_set_mut(
        &mut self,
        kind: EntityKind,
        id: &str,
        related_kind: EntityKind,
    ) -> Result<&mut IdSet> {
        self.table_mut(kind)
            .get_mut(id)
            .ok_or_else(|| GraphError::not_found(kind, id))?
            .related_mut(related_kind)
            .ok_or(GraphError::InvalidLink {
                from: kind,
                to: related_kind,
            })
    }

    fn allocate_id(&mut self, kind: EntityKind) -> String {
        let table = self.table_mut(kind);
        loop {
            table.next_id += 1;
            let candidate = format!("{}-{}", kind.id_prefix(), table.next_id);
            if !table.contains(&candidate) {
                return candidate;
            }
        }
    }

    fn table(&self, kind: EntityKind) -> &EntityTable {
        match kind {
            EntityKind::User => &self.users,
            EntityKind::UserGroup => &self.user_groups,
            EntityKind::Role => &self.roles,
        }
    }

    fn table_mut(&mut self, kind: EntityKind) -> &mut EntityTable {
        match kind {
            EntityKind::User => &mut self.users,
            EntityKind::UserGroup => &mut self.user_groups,
            EntityKind::Role => &mut self.roles,
        }
    }

    #[cfg(test)]
    pub(crate) fn entity_mut(&mut self, kind: EntityKind, id: &str) -> Option<&mut Entity> {
        self.table_mut(kind).get_mut(id)
    }
}

fn validate_name(name: &str) -> Result<&str> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(GraphError::InvalidName);
    }
    Ok(trimmed)
}

fn ensure_linkable(from: EntityKind, to: EntityKind) -> Result<()> {
    if from.links_to(to) {
        Ok(())
    } else {
        Err(GraphError::InvalidLink { from, to })
    }
}
