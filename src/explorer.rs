use tracing::debug;

use crate::drilldown::{RoleDrilldown, RoleDrilldownView};
use crate::error::Result;
use crate::expansion::{ExpansionState, NodeKey};
use crate::hierarchy::{self, TreeDescription};
use crate::model::{Entity, EntityKind, EntityRef, ViewMode};
use crate::resolver::EntityResolver;
use crate::search;
use crate::session::{SessionAction, SessionState};
use crate::stats::{EntitySummary, StoreStats};
use crate::store::EntityStore;
use crate::store::integrity::{IntegrityViolation, integrity_violations};

#[derive(Debug, Clone, Default)]
pub struct Explorer {
    store: EntityStore,
    session: SessionState,
    drilldown: RoleDrilldown,
}

impl Explorer {
    pub fn new(store: EntityStore) -> Self {
        Self {
            store,
            session: SessionState::default(),
            drilldown: RoleDrilldown::default(),
        }
    }

    pub fn store(&self) -> &EntityStore {
        &self.store
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn drilldown(&self) -> &RoleDrilldown {
        &self.drilldown
    }

    pub fn list_entities(&self, kind: EntityKind) -> Vec<&Entity> {
        self.store.list(kind).collect()
    }

    pub fn resolve(&self, kind: EntityKind, id: &str) -> Result<&Entity> {
        self.store.resolve(kind, id)
    }

    pub fn build_hierarchy(
        &self,
        kind: EntityKind,
        id: &str,
        expansion: &ExpansionState,
    ) -> Result<TreeDescription> {
        hierarchy::build_hierarchy(&self.store, kind, id, expansion)
    }

    pub fn filter_by_name(&self, kind: EntityKind, query: &str) -> Vec<&Entity> {
        search::filter_by_name(self.store.list(kind), query)
    }

    pub fn create(
        &mut self,
        kind: EntityKind,
        name: &str,
        initial_link: Option<&EntityRef>,
    ) -> Result<String> {
        self.store.create(kind, name, initial_link)
    }

    pub fn rename(&mut self, kind: EntityKind, id: &str, new_name: &str) -> Result<()> {
        let old_name = self.store.resolve(kind, id)?.name().to_owned();
        self.store.rename(kind, id, new_name)?;
        let name = self.store.resolve(kind, id)?.name().to_owned();
        self.session.apply(SessionAction::RootRenamed {
            kind,
            id: id.to_owned(),
            old_name,
            name,
        });
        Ok(())
    }

    pub fn delete(&mut self, kind: EntityKind, id: &str) -> Result<()> {
        self.store.delete(kind, id)?;
        self.prune_stale_state();
        Ok(())
    }

    pub fn link(&mut self, from: &EntityRef, to: &EntityRef) -> Result<bool> {
        self.store.link(from.kind, &from.id, to.kind, &to.id)
    }

    pub fn unlink(&mut self, from: &EntityRef, to: &EntityRef) -> Result<bool> {
        let removed = self.store.unlink(from.kind, &from.id, to.kind, &to.id)?;
        if removed {
            self.prune_stale_state();
        }
        Ok(removed)
    }

    /// Returns whether `key` is expanded afterwards.
    pub fn toggle_expansion(&mut self, key: NodeKey) -> bool {
        self.session.apply(SessionAction::ToggleExpansion { key: key.clone() });
        self.session.expansion().is_expanded(&key)
    }

    pub fn reset_expansion(&mut self) {
        self.session.apply(SessionAction::ResetExpansion);
    }

    pub fn set_view_mode(&mut self, mode: ViewMode) {
        self.session.apply(SessionAction::SetViewMode { mode });
    }

    pub fn select_root(&mut self, id: &str) -> Result<()> {
        let kind = self.session.view_mode().root_kind();
        let name = self.store.resolve(kind, id)?.name().to_owned();
        self.session.apply(SessionAction::SelectRoot {
            id: id.to_owned(),
            name,
        });
        Ok(())
    }

    pub fn set_search_text(&mut self, text: impl Into<String>) {
        self.session
            .apply(SessionAction::SetSearchText { text: text.into() });
    }

    pub fn toggle_dropdown(&mut self) {
        self.session.apply(SessionAction::ToggleDropdown);
    }

    pub fn toggle_details(&mut self) {
        self.session.apply(SessionAction::ToggleDetails);
    }

    pub fn candidates(&self) -> Vec<&Entity> {
        self.filter_by_name(
            self.session.view_mode().root_kind(),
            self.session.search_text(),
        )
    }

    pub fn current_tree(&self) -> Result<Option<TreeDescription>> {
        self.session
            .selection()
            .root()
            .map(|(kind, id)| self.build_hierarchy(kind, id, self.session.expansion()))
            .transpose()
    }

    pub fn selected_summary(&self) -> Result<Option<EntitySummary>> {
        self.session
            .selection()
            .root()
            .map(|(kind, id)| EntitySummary::describe(&self.store, kind, id))
            .transpose()
    }

    pub fn select_drilldown_role(&mut self, role_id: &str) -> Result<()> {
        self.drilldown.select_role(&self.store, role_id)
    }

    pub fn select_drilldown_group(&mut self, group_id: &str) -> Result<()> {
        self.drilldown.select_group(&self.store, group_id)
    }

    pub fn drilldown_view(&self, query: &str) -> Result<RoleDrilldownView> {
        self.drilldown.view(&self.store, query)
    }

    pub fn stats(&self) -> StoreStats {
        StoreStats::collect(&self.store)
    }

    pub fn integrity_violations(&self) -> Vec<IntegrityViolation> {
        integrity_violations(&self.store)
    }

    fn prune_stale_state(&mut self) {
        let before = self.session.clone();
        self.session.prune_missing(&self.store);
        self.drilldown.prune_missing(&self.store);
        if before != self.session {
            debug!("pruned session state after store change");
        }
    }
}
