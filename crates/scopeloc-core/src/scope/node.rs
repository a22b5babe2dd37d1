use std::any::Any;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::error::LocatorResult;
use crate::host::HostNodeId;
use crate::registry::{CapabilityKey, Registry};

use super::bootstrap::{BootstrapRole, Bootstrapper};

static NEXT_SCOPE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a scope node.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct ScopeId(u64);

impl ScopeId {
    fn next() -> Self {
        Self(NEXT_SCOPE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "scope#{}", self.0)
    }
}

/// One resolution scope, owned by a host container.
///
/// The parent is never stored; the tree derives it from the host hierarchy on
/// demand. Whether the node is the global scope is likewise answered by the
/// tree (`ScopeTree::is_global`).
pub struct ScopeNode {
    id: ScopeId,
    host: HostNodeId,
    registry: Registry,
    bootstrapper: Option<Bootstrapper>,
}

impl ScopeNode {
    /// A plain local scope: resolvable through containment, never bootstrapped.
    pub fn new(host: HostNodeId) -> Self {
        Self {
            id: ScopeId::next(),
            host,
            registry: Registry::new(),
            bootstrapper: None,
        }
    }

    pub fn with_role(host: HostNodeId, role: BootstrapRole) -> Self {
        Self {
            bootstrapper: Some(Bootstrapper::new(role)),
            ..Self::new(host)
        }
    }

    #[inline]
    pub fn id(&self) -> ScopeId {
        self.id
    }

    #[inline]
    pub fn host(&self) -> HostNodeId {
        self.host
    }

    #[inline]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    #[inline]
    pub fn bootstrapper(&self) -> Option<&Bootstrapper> {
        self.bootstrapper.as_ref()
    }

    #[inline]
    pub fn role(&self) -> Option<BootstrapRole> {
        self.bootstrapper.as_ref().map(Bootstrapper::role)
    }

    /// Role-less scopes report false forever.
    #[inline]
    pub fn is_bootstrapped(&self) -> bool {
        self.bootstrapper
            .as_ref()
            .is_some_and(Bootstrapper::is_bootstrapped)
    }

    /// Registers into this scope only. Chainable.
    pub fn register<T: ?Sized + Send + Sync + 'static>(&self, service: Arc<T>) -> LocatorResult<&Self> {
        self.registry.register(service)?;
        Ok(self)
    }

    pub fn register_erased(
        &self,
        key: CapabilityKey,
        service: Box<dyn Any + Send + Sync>,
    ) -> LocatorResult<&Self> {
        self.registry.register_erased(key, service)?;
        Ok(self)
    }
}

impl fmt::Debug for ScopeNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopeNode")
            .field("id", &self.id)
            .field("host", &self.host)
            .field("role", &self.role())
            .field("bootstrapped", &self.is_bootstrapped())
            .field("registry", &self.registry)
            .finish()
    }
}
