use serde::Serialize;

use crate::model::EntityKind;

use super::EntityStore;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "violation", rename_all = "snake_case")]
pub enum IntegrityViolation {
    Asymmetric {
        from_kind: EntityKind,
        from_id: String,
        to_kind: EntityKind,
        to_id: String,
    },
    Dangling {
        from_kind: EntityKind,
        from_id: String,
        missing_kind: EntityKind,
        missing_id: String,
    },
}

pub fn integrity_violations(store: &EntityStore) -> Vec<IntegrityViolation> {
    let mut violations = Vec::new();

    for kind in EntityKind::ALL {
        for entity in store.list(kind) {
            for &related_kind in kind.linkable_kinds() {
                for related_id in entity.related(related_kind) {
                    let Some(related) = store.get(related_kind, related_id) else {
                        violations.push(IntegrityViolation::Dangling {
                            from_kind: kind,
                            from_id: entity.id().to_owned(),
                            missing_kind: related_kind,
                            missing_id: related_id.clone(),
                        });
                        continue;
                    };

                    if !related.references(kind, entity.id()) {
                        violations.push(IntegrityViolation::Asymmetric {
                            from_kind: kind,
                            from_id: entity.id().to_owned(),
                            to_kind: related_kind,
                            to_id: related_id.clone(),
                        });
                    }
                }
            }
        }
    }

    violations
}

#[cfg(test)]
mod tests {
    use crate::model::EntityKind;
    use crate::store::EntityStore;
    use crate::store::seed::default_seed;

    use super::{IntegrityViolation, integrity_violations};

    #[test]
    fn seeded_store_has_no_violations() {
        let store = EntityStore::from_seed(&default_seed(), Default::default())
            .expect("default seed should load");
        assert!(integrity_violations(&store).is_empty());
    }

    #[test]
    fn reports_one_sided_and_missing_references() {
        let mut store = EntityStore::default();
        store
            .insert_with_id(EntityKind::User, "user-1", "ABC")
            .expect("insert should succeed");
        store
            .insert_with_id(EntityKind::UserGroup, "ug-1", "Finance")
            .expect("insert should succeed");

        let user_groups = store
            .entity_mut(EntityKind::User, "user-1")
            .and_then(|user| user.related_mut(EntityKind::UserGroup))
            .expect("user should hold groups");
        user_groups.insert("ug-1");
        user_groups.insert("ug-404");

        assert_eq!(
            integrity_violations(&store),
            vec![
                IntegrityViolation::Asymmetric {
                    from_kind: EntityKind::User,
                    from_id: "user-1".to_owned(),
                    to_kind: EntityKind::UserGroup,
                    to_id: "ug-1".to_owned(),
                },
                IntegrityViolation::Dangling {
                    from_kind: EntityKind::User,
                    from_id: "user-1".to_owned(),
                    missing_kind: EntityKind::UserGroup,
                    missing_id: "ug-404".to_owned(),
                },
            ]
        );
    }
}
