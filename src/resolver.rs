use crate::error::{GraphError, Result};
use crate::model::{Entity, EntityKind};
use crate::store::EntityStore;

/// Turns an `(kind, id)` pair into the entity it names.
///
/// Missing ids are reported as `NotFound`, never replaced by a placeholder.
pub trait EntityResolver {
    fn resolve(&self, kind: EntityKind, id: &str) -> Result<&Entity>;
}

impl EntityResolver for EntityStore {
    fn resolve(&self, kind: EntityKind, id: &str) -> Result<&Entity> {
        self.get(kind, id)
            .ok_or_else(|| GraphError::not_found(kind, id))
    }
}

#[cfg(test)]
mod tests {
    use crate::error::GraphError;
    use crate::model::EntityKind;
    use crate::store::seed::default_seed;
    use crate::store::{EntityStore, StoreConfig};

    use super::EntityResolver;

    #[test]
    fn resolves_by_kind_and_id() {
        let store = EntityStore::from_seed(&default_seed(), StoreConfig::default())
            .expect("default seed should load");
        let role = store
            .resolve(EntityKind::Role, "role-1")
            .expect("role should resolve");
        assert_eq!(role.name(), "Admin");
        assert_eq!(role.kind(), EntityKind::Role);
    }

    #[test]
    fn same_id_under_wrong_kind_is_not_found() {
        let store = EntityStore::from_seed(&default_seed(), StoreConfig::default())
            .expect("default seed should load");
        let error = store
            .resolve(EntityKind::UserGroup, "role-1")
            .expect_err("role id should not resolve as a group");
        assert_eq!(error, GraphError::not_found(EntityKind::UserGroup, "role-1"));
    }
}
