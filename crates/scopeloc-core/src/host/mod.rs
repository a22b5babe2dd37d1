mod memory;

pub use memory::MemoryHost;

use std::fmt;
use std::sync::Arc;

use crate::scope::ScopeNode;

/// Opaque handle of a host container (an object in the host's containment tree).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct HostNodeId(pub u64);

impl fmt::Display for HostNodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "host#{}", self.0)
    }
}

/// Opaque handle of a host scene (a loadable group of root containers).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct SceneId(pub u64);

impl fmt::Display for SceneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "scene#{}", self.0)
    }
}

/// Host-side traversal and container management.
///
/// Supplied by the engine binding. The tree calls into it while holding its own
/// lock, so implementations must never call back into the tree from here.
pub trait HostTopology: Send + Sync {
    /// Scope attached to `node` itself or, failing that, to its nearest ancestor.
    fn nearest_scope(&self, node: HostNodeId) -> Option<Arc<ScopeNode>>;

    /// Scope attached exactly to `node`.
    fn scope_at(&self, node: HostNodeId) -> Option<Arc<ScopeNode>>;

    fn parent_of(&self, node: HostNodeId) -> Option<HostNodeId>;

    /// `None` for containers outside any scene (e.g. persistent ones).
    fn scene_of(&self, node: HostNodeId) -> Option<SceneId>;

    /// Appends the root containers of `scene` to `out`.
    fn roots_of_scene(&self, scene: SceneId, out: &mut Vec<HostNodeId>);

    /// A live container carrying a global-role scope, if the host declared one.
    fn find_declared_global(&self) -> Option<Arc<ScopeNode>>;

    fn create_container(&self, name: &str) -> HostNodeId;

    /// Hands ownership of `scope` to the container it names.
    fn attach_scope(&self, scope: Arc<ScopeNode>);

    /// Keep `node` alive across scene transitions.
    fn mark_persistent(&self, node: HostNodeId);
}

/// Teardown callback every host destruction path must invoke.
pub trait ScopeLifecycle {
    fn on_node_destroyed(&self, node: &ScopeNode);
}
