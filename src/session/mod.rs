use serde::Serialize;

use crate::expansion::{ExpansionState, NodeKey};
use crate::model::{EntityKind, ViewMode};
use crate::resolver::EntityResolver;

pub mod actions;

pub use self::actions::SessionAction;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum Selection {
    #[default]
    NoRootSelected,
    RootSelected {
        kind: EntityKind,
        id: String,
    },
}

impl Selection {
    pub fn root(&self) -> Option<(EntityKind, &str)> {
        match self {
            Self::NoRootSelected => None,
            Self::RootSelected { kind, id } => Some((*kind, id.as_str())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    view_mode: ViewMode,
    selection: Selection,
    expansion: ExpansionState,
    search_text: String,
    dropdown_open: bool,
    show_details: bool,
}

impl SessionState {
    pub fn view_mode(&self) -> ViewMode {
        self.view_mode
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn expansion(&self) -> &ExpansionState {
        &self.expansion
    }

    pub fn search_text(&self) -> &str {
        &self.search_text
    }

    pub fn dropdown_open(&self) -> bool {
        self.dropdown_open
    }

    pub fn show_details(&self) -> bool {
        self.show_details
    }

    pub fn apply(&mut self, action: SessionAction) {
        match action {
            SessionAction::SetViewMode { mode } => {
                self.view_mode = mode;
                self.selection = Selection::NoRootSelected;
                self.search_text.clear();
                self.expansion.reset();
                self.dropdown_open = false;
            }
            SessionAction::SelectRoot { id, name } => {
                self.selection = Selection::RootSelected {
                    kind: self.view_mode.root_kind(),
                    id,
                };
                self.search_text = name;
                self.expansion.reset();
                self.dropdown_open = false;
            }
            SessionAction::RootRenamed {
                kind,
                id,
                old_name,
                name,
            } => {
                if self.selection.root() == Some((kind, id.as_str()))
                    && self.search_text == old_name
                {
                    self.search_text = name;
                }
            }
            SessionAction::ToggleExpansion { key } => {
                self.expansion.toggle(key);
            }
            SessionAction::ResetExpansion => self.expansion.reset(),
            SessionAction::SetSearchText { text } => {
                self.search_text = text;
                self.dropdown_open = true;
            }
            SessionAction::SetDropdownOpen { open } => self.dropdown_open = open,
            SessionAction::ToggleDropdown => self.dropdown_open = !self.dropdown_open,
            SessionAction::ToggleDetails => self.show_details = !self.show_details,
        }
    }

    pub fn prune_missing<R>(&mut self, resolver: &R)
    where
        R: EntityResolver + ?Sized,
    {
        if self
            .selection
            .root()
            .is_some_and(|(kind, id)| resolver.resolve(kind, id).is_err())
        {
            self.selection = Selection::NoRootSelected;
        }

        self.expansion
            .retain(|key: &NodeKey| resolver.resolve(key.kind(), key.id()).is_ok());
    }
}
