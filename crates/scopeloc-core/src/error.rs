use thiserror::Error;

use crate::host::SceneId;
use crate::scope::ScopeId;

pub type LocatorResult<T> = Result<T, LocatorError>;

/// Locator-wide error.
///
/// Configuration conflicts are also logged by the tree before they are returned;
/// the shared state is never modified when one of these is produced.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LocatorError {
    #[error("service of type '{capability}' not registered")]
    NotRegistered { capability: &'static str },

    #[error("service of type '{capability}' already registered")]
    DuplicateRegistration { capability: &'static str },

    #[error("instance does not implement capability '{capability}'")]
    TypeMismatch { capability: &'static str },

    #[error("scope {rejected} cannot become global: scope {existing} is already global")]
    AlreadyGlobal { existing: ScopeId, rejected: ScopeId },

    #[error("scene {scene} already has scope {existing}; scope {rejected} rejected")]
    DuplicateSceneScope {
        scene: SceneId,
        existing: ScopeId,
        rejected: ScopeId,
    },

    #[error("scope {scope} is not part of any scene")]
    SceneUnavailable { scope: ScopeId },

    #[error("config error: {0}")]
    Config(String),
}
