use hierarchy_explorer::error::GraphError;
use hierarchy_explorer::expansion::{ExpansionState, NodeKey};
use hierarchy_explorer::explorer::Explorer;
use hierarchy_explorer::hierarchy::{build_hierarchy, template_depth};
use hierarchy_explorer::model::{EntityKind, EntityRef, ViewMode};
use hierarchy_explorer::resolver::EntityResolver;
use hierarchy_explorer::store::integrity::integrity_violations;
use hierarchy_explorer::store::seed::{SeedData, default_seed};
use hierarchy_explorer::store::{EntityStore, StoreConfig};

#[test]
fn collapsed_root_shows_has_children_only() {
    let store = chain_store();

    let tree = build_hierarchy(&store, EntityKind::User, "u1", &ExpansionState::default())
        .expect("hierarchy should build");
    assert_eq!(tree.root.id, "u1");
    assert!(tree.root.has_children);
    assert_eq!(tree.root.children, None);

    let group_only = [NodeKey::new(EntityKind::UserGroup, "g1")]
        .into_iter()
        .collect::<ExpansionState>();
    let tree = build_hierarchy(&store, EntityKind::User, "u1", &group_only)
        .expect("hierarchy should build");
    assert!(tree.root.has_children);
    assert_eq!(
        tree.root.children, None,
        "an expanded descendant does not reveal a collapsed root"
    );
}

#[test]
fn deleting_a_group_cascades_to_both_neighbours() {
    let mut store = chain_store();

    store
        .delete(EntityKind::UserGroup, "g1")
        .expect("group delete should succeed");

    let user = store.resolve(EntityKind::User, "u1").expect("user remains");
    let role = store.resolve(EntityKind::Role, "r1").expect("role remains");
    assert!(!user.references(EntityKind::UserGroup, "g1"));
    assert!(!role.references(EntityKind::UserGroup, "g1"));
    assert_eq!(
        store
            .resolve(EntityKind::UserGroup, "g1")
            .expect_err("deleted group should be gone"),
        GraphError::not_found(EntityKind::UserGroup, "g1")
    );
    assert!(integrity_violations(&store).is_empty());
}

#[test]
fn filter_by_name_matches_admin() {
    let explorer = Explorer::new(seeded_store());

    let names = explorer
        .filter_by_name(EntityKind::Role, "adm")
        .into_iter()
        .map(|role| role.name())
        .collect::<Vec<_>>();
    assert_eq!(names, vec!["Admin"]);

    let all = explorer
        .filter_by_name(EntityKind::Role, "")
        .into_iter()
        .map(|role| role.name())
        .collect::<Vec<_>>();
    assert_eq!(all, vec!["Admin", "Developer", "Team Lead"]);
}

#[test]
fn link_then_unlink_restores_the_store() {
    let mut store = chain_store();
    let u2 = store
        .create(EntityKind::User, "Bea", None)
        .expect("second user should be created");
    let before = format!("{store:?}");

    assert!(
        store
            .link(EntityKind::User, &u2, EntityKind::UserGroup, "g1")
            .expect("link should succeed")
    );
    assert!(
        !store
            .link(EntityKind::User, &u2, EntityKind::UserGroup, "g1")
            .expect("repeat link should succeed")
    );
    assert!(
        store
            .unlink(EntityKind::User, &u2, EntityKind::UserGroup, "g1")
            .expect("unlink should succeed")
    );
    assert!(
        !store
            .unlink(EntityKind::User, &u2, EntityKind::UserGroup, "g1")
            .expect("repeat unlink should be a no-op")
    );

    assert_eq!(format!("{store:?}"), before);
}

#[test]
fn create_with_link_is_symmetric_immediately() {
    let mut store = chain_store();

    let id = store
        .create(
            EntityKind::UserGroup,
            "Finance",
            Some(&EntityRef::new(EntityKind::User, "u1")),
        )
        .expect("group create should succeed");

    let group = store
        .resolve(EntityKind::UserGroup, &id)
        .expect("new group should resolve");
    assert_eq!(group.name(), "Finance");
    assert_eq!(group.related(EntityKind::User), ["u1"]);
    let user = store.resolve(EntityKind::User, "u1").expect("user remains");
    assert_eq!(user.related(EntityKind::UserGroup), ["g1", id.as_str()]);
    assert!(integrity_violations(&store).is_empty());
}

#[test]
fn symmetry_holds_across_a_long_mutation_sequence() {
    let mut store = EntityStore::new(StoreConfig {
        allow_user_delete: true,
    });
    let mut rng = Lcg(7);
    let mut ids = vec![Vec::<String>::new(), Vec::new(), Vec::new()];

    for step in 0..400 {
        let kind = EntityKind::ALL[rng.below(3)];
        let slot = kind_slot(kind);
        match rng.below(5) {
            0 | 1 => {
                let link = random_partner(&mut rng, &ids, kind);
                let id = store
                    .create(kind, &format!("entity {step}"), link.as_ref())
                    .expect("create should succeed");
                ids[slot].push(id);
            }
            2 => {
                let Some(id) = pick(&mut rng, &ids[slot]) else {
                    continue;
                };
                if let Some(partner) = random_partner(&mut rng, &ids, kind) {
                    store
                        .link(kind, &id, partner.kind, &partner.id)
                        .expect("link should succeed");
                }
            }
            3 => {
                let Some(id) = pick(&mut rng, &ids[slot]) else {
                    continue;
                };
                if let Some(partner) = random_partner(&mut rng, &ids, kind) {
                    store
                        .unlink(kind, &id, partner.kind, &partner.id)
                        .expect("unlink should succeed");
                }
            }
            _ => {
                let Some(id) = pick(&mut rng, &ids[slot]) else {
                    continue;
                };
                store.delete(kind, &id).expect("delete should succeed");
                ids[slot].retain(|existing| existing != &id);
            }
        }

        let violations = integrity_violations(&store);
        assert!(
            violations.is_empty(),
            "step {step} broke symmetry: {violations:?}"
        );
    }
}

#[test]
fn every_view_mode_stays_within_its_template_depth() {
    let store = seeded_store();
    let everything = EntityKind::ALL
        .into_iter()
        .flat_map(|kind| {
            store
                .list(kind)
                .map(move |entity| NodeKey::new(kind, entity.id()))
                .collect::<Vec<_>>()
        })
        .collect::<ExpansionState>();

    for mode in ViewMode::ALL {
        let kind = mode.root_kind();
        for root in store.list(kind) {
            let tree = build_hierarchy(&store, kind, root.id(), &everything)
                .expect("hierarchy should build");
            assert!(tree.depth() <= template_depth(mode));
            assert!(tree.depth() <= 2);
        }
    }
}

#[test]
fn context_changes_clear_expansion() {
    let mut explorer = Explorer::new(seeded_store());
    explorer
        .select_root("user-1")
        .expect("user should be selectable");
    explorer.toggle_expansion(NodeKey::new(EntityKind::User, "user-1"));
    assert!(!explorer.session().expansion().is_empty());

    explorer.set_view_mode(ViewMode::Role);
    assert!(explorer.session().expansion().is_empty());

    explorer
        .select_root("role-2")
        .expect("role should be selectable");
    explorer.toggle_expansion(NodeKey::new(EntityKind::Role, "role-2"));
    explorer
        .select_root("role-3")
        .expect("role should be selectable");
    assert!(explorer.session().expansion().is_empty());
}

#[test]
fn user_to_role_links_are_rejected() {
    let mut store = seeded_store();
    let error = store
        .link(EntityKind::User, "user-1", EntityKind::Role, "role-1")
        .expect_err("user and role only meet through groups");
    assert_eq!(
        error,
        GraphError::InvalidLink {
            from: EntityKind::User,
            to: EntityKind::Role,
        }
    );
}

struct Lcg(u64);

impl Lcg {
    fn below(&mut self, bound: usize) -> usize {
        self.0 = self
            .0
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        ((self.0 >> 33) % bound as u64) as usize
    }
}

fn kind_slot(kind: EntityKind) -> usize {
    match kind {
        EntityKind::User => 0,
        EntityKind::UserGroup => 1,
        EntityKind::Role => 2,
    }
}

fn pick(rng: &mut Lcg, ids: &[String]) -> Option<String> {
    if ids.is_empty() {
        None
    } else {
        Some(ids[rng.below(ids.len())].clone())
    }
}

fn random_partner(rng: &mut Lcg, ids: &[Vec<String>], kind: EntityKind) -> Option<EntityRef> {
    let partners = kind.linkable_kinds();
    let partner_kind = partners[rng.below(partners.len())];
    pick(rng, &ids[kind_slot(partner_kind)]).map(|id| EntityRef::new(partner_kind, id))
}

fn chain_store() -> EntityStore {
    let seed: SeedData = serde_yaml::from_str(
        r#"
users:
  - id: u1
    name: Ada
    userGroups: [g1]
userGroups:
  - id: g1
    name: Ops
    users: [u1]
    roles: [r1]
roles:
  - id: r1
    name: Admin
    userGroups: [g1]
"#,
    )
    .expect("chain seed should parse");
    EntityStore::from_seed(&seed, StoreConfig::default()).expect("chain seed should load")
}

fn seeded_store() -> EntityStore {
    EntityStore::from_seed(&default_seed(), StoreConfig::default())
        .expect("default seed should load")
}
