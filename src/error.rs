use crate::model::EntityKind;

pub type Result<T> = std::result::Result<T, GraphError>;

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum GraphError {
    #[error("{kind} `{id}` not found")]
    NotFound { kind: EntityKind, id: String },

    #[error("{kind} entities cannot be deleted")]
    Protected { kind: EntityKind },

    #[error("{parent_kind} `{parent_id}` references missing {kind} `{id}`")]
    DanglingReference {
        parent_kind: EntityKind,
        parent_id: String,
        kind: EntityKind,
        id: String,
    },

    #[error("{from} cannot be linked to {to}")]
    InvalidLink { from: EntityKind, to: EntityKind },

    #[error("name cannot be empty")]
    InvalidName,

    #[error("duplicate {kind} id `{id}`")]
    DuplicateId { kind: EntityKind, id: String },

    #[error("invalid seed data: {0}")]
    InvalidSeed(String),
}

impl GraphError {
    pub fn not_found(kind: EntityKind, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_client_error(&self) -> bool {
        match self {
            Self::NotFound { .. }
            | Self::Protected { .. }
            | Self::InvalidLink { .. }
            | Self::InvalidName
            | Self::DuplicateId { .. }
            | Self::InvalidSeed(_) => true,
            Self::DanglingReference { .. } => false,
        }
    }
}
