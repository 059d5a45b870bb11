use crate::expansion::NodeKey;
use crate::model::{EntityKind, ViewMode};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionAction {
    SetViewMode {
        mode: ViewMode,
    },
    SelectRoot {
        id: String,
        name: String,
    },
    /// The entity behind the selected root was renamed. The search text follows the
    /// new name unless the user has typed something else since selecting it.
    RootRenamed {
        kind: EntityKind,
        id: String,
        old_name: String,
        name: String,
    },
    ToggleExpansion {
        key: NodeKey,
    },
    ResetExpansion,
    SetSearchText {
        text: String,
    },
    SetDropdownOpen {
        open: bool,
    },
    ToggleDropdown,
    ToggleDetails,
}
