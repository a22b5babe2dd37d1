use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::LocatorError;

/// Setup of the process-wide global scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlobalRole {
    /// Survive host scene transitions.
    pub persistent: bool,
}

impl Default for GlobalRole {
    fn default() -> Self {
        Self { persistent: true }
    }
}

/// Setup of the scope serving one host scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SceneRole;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapRole {
    Global(GlobalRole),
    Scene(SceneRole),
}

impl BootstrapRole {
    #[inline]
    pub fn global(persistent: bool) -> Self {
        Self::Global(GlobalRole { persistent })
    }

    #[inline]
    pub fn scene() -> Self {
        Self::Scene(SceneRole)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Global(_) => "global",
            Self::Scene(_) => "scene",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapState {
    NotBootstrapped,
    Bootstrapped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootstrapOutcome {
    /// The role setup ran and was committed.
    Configured,
    /// The role setup ran but the tree refused it (already logged).
    Rejected(LocatorError),
    AlreadyBootstrapped,
    /// Plain local scopes carry no role.
    NoRole,
}

/// One-shot role assignment attached to a scope.
#[derive(Debug)]
pub struct Bootstrapper {
    role: BootstrapRole,
    done: AtomicBool,
}

impl Bootstrapper {
    #[inline]
    pub fn new(role: BootstrapRole) -> Self {
        Self {
            role,
            done: AtomicBool::new(false),
        }
    }

    #[inline]
    pub fn role(&self) -> BootstrapRole {
        self.role
    }

    #[inline]
    pub fn is_bootstrapped(&self) -> bool {
        self.done.load(Ordering::Acquire)
    }

    #[inline]
    pub fn state(&self) -> BootstrapState {
        if self.is_bootstrapped() {
            BootstrapState::Bootstrapped
        } else {
            BootstrapState::NotBootstrapped
        }
    }

    /// Performs the `NotBootstrapped -> Bootstrapped` transition.
    ///
    /// Returns true only for the single caller that made it.
    #[inline]
    pub(crate) fn claim(&self) -> bool {
        self.done
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}
