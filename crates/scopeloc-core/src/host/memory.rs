use log::debug;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::scope::{BootstrapRole, ScopeNode};

use super::{HostNodeId, HostTopology, SceneId, ScopeLifecycle};

const TARGET: &str = "scopeloc::host";

struct Container {
    name: String,
    parent: Option<HostNodeId>,
    children: Vec<HostNodeId>,
    scene: Option<SceneId>,
    persistent: bool,
    scope: Option<Arc<ScopeNode>>,
}

#[derive(Default)]
struct MemoryInner {
    next_node: u64,
    next_scene: u64,
    containers: BTreeMap<HostNodeId, Container>,
    scenes: BTreeMap<SceneId, String>,
    active_scene: Option<SceneId>,
}

impl MemoryInner {
    fn insert(&mut self, name: &str, parent: Option<HostNodeId>, scene: Option<SceneId>) -> HostNodeId {
        self.next_node += 1;
        let id = HostNodeId(self.next_node);
        self.containers.insert(
            id,
            Container {
                name: name.to_string(),
                parent,
                children: Vec::new(),
                scene,
                persistent: false,
                scope: None,
            },
        );
        if let Some(p) = parent.and_then(|p| self.containers.get_mut(&p)) {
            p.children.push(id);
        }
        id
    }

    /// Removes `root` and its whole subtree, collecting the scopes they carried.
    fn remove_subtree(&mut self, root: HostNodeId, scopes: &mut Vec<Arc<ScopeNode>>) {
        let parent = self.containers.get(&root).and_then(|c| c.parent);
        if let Some(p) = parent.and_then(|p| self.containers.get_mut(&p)) {
            p.children.retain(|c| *c != root);
        }

        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let Some(c) = self.containers.remove(&id) else {
                continue;
            };
            stack.extend(c.children);
            if let Some(scope) = c.scope {
                scopes.push(scope);
            }
        }
    }

    fn set_scene_recursive(&mut self, root: HostNodeId, scene: Option<SceneId>) {
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            if let Some(c) = self.containers.get_mut(&id) {
                c.scene = scene;
                stack.extend(c.children.iter().copied());
            }
        }
    }
}

/// In-memory host: a containment tree of named containers grouped into scenes.
///
/// Reference binding for `HostTopology`. New root containers land in the
/// active scene; persistent containers live outside every scene and survive
/// `unload_scene`. Destruction always reports the carried scopes to a
/// `ScopeLifecycle`, after the host lock is released.
#[derive(Default)]
pub struct MemoryHost {
    inner: RwLock<MemoryInner>,
}

impl MemoryHost {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a scene; the first one created becomes active.
    pub fn create_scene(&self, name: &str) -> SceneId {
        let mut g = self.inner.write();
        g.next_scene += 1;
        let id = SceneId(g.next_scene);
        g.scenes.insert(id, name.to_string());
        if g.active_scene.is_none() {
            g.active_scene = Some(id);
        }
        debug!(target: TARGET, "scene.create id={} name='{}'", id, name);
        id
    }

    pub fn set_active_scene(&self, scene: SceneId) {
        self.inner.write().active_scene = Some(scene);
    }

    #[inline]
    pub fn active_scene(&self) -> Option<SceneId> {
        self.inner.read().active_scene
    }

    pub fn spawn_root(&self, scene: SceneId, name: &str) -> HostNodeId {
        self.inner.write().insert(name, None, Some(scene))
    }

    /// Child containers share their parent's scene.
    pub fn spawn_child(&self, parent: HostNodeId, name: &str) -> HostNodeId {
        let mut g = self.inner.write();
        let scene = g.containers.get(&parent).and_then(|c| c.scene);
        g.insert(name, Some(parent), scene)
    }

    /// Attaches a new scope to `node` and returns it.
    pub fn add_scope(&self, node: HostNodeId, role: Option<BootstrapRole>) -> Arc<ScopeNode> {
        let scope = Arc::new(match role {
            Some(role) => ScopeNode::with_role(node, role),
            None => ScopeNode::new(node),
        });
        self.attach_scope(scope.clone());
        scope
    }

    #[inline]
    pub fn contains(&self, node: HostNodeId) -> bool {
        self.inner.read().containers.contains_key(&node)
    }

    pub fn name_of(&self, node: HostNodeId) -> Option<String> {
        self.inner.read().containers.get(&node).map(|c| c.name.clone())
    }

    pub fn is_persistent(&self, node: HostNodeId) -> bool {
        self.inner
            .read()
            .containers
            .get(&node)
            .is_some_and(|c| c.persistent)
    }

    /// Containers named `name`, in creation order.
    pub fn find_by_name(&self, name: &str) -> Vec<HostNodeId> {
        self.inner
            .read()
            .containers
            .iter()
            .filter(|(_, c)| c.name == name)
            .map(|(id, _)| *id)
            .collect()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.inner.read().containers.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.read().containers.is_empty()
    }

    /// Destroys `node` with its subtree and notifies `lifecycle` for each scope.
    pub fn destroy(&self, node: HostNodeId, lifecycle: &dyn ScopeLifecycle) {
        let mut scopes = Vec::new();
        self.inner.write().remove_subtree(node, &mut scopes);

        debug!(target: TARGET, "destroy node={} scopes={}", node, scopes.len());
        for scope in &scopes {
            lifecycle.on_node_destroyed(scope);
        }
    }

    /// Destroys every non-persistent container of `scene`.
    pub fn unload_scene(&self, scene: SceneId, lifecycle: &dyn ScopeLifecycle) {
        let mut scopes = Vec::new();
        {
            let mut g = self.inner.write();
            let roots: Vec<HostNodeId> = g
                .containers
                .iter()
                .filter(|(_, c)| c.parent.is_none() && c.scene == Some(scene))
                .map(|(id, _)| *id)
                .collect();
            for root in roots {
                g.remove_subtree(root, &mut scopes);
            }
            g.scenes.remove(&scene);
            if g.active_scene == Some(scene) {
                g.active_scene = g.scenes.keys().next().copied();
            }
        }

        debug!(target: TARGET, "scene.unload id={} scopes={}", scene, scopes.len());
        for scope in &scopes {
            lifecycle.on_node_destroyed(scope);
        }
    }
}

impl HostTopology for MemoryHost {
    fn nearest_scope(&self, node: HostNodeId) -> Option<Arc<ScopeNode>> {
        let g = self.inner.read();
        let mut cursor = Some(node);
        while let Some(id) = cursor {
            let c = g.containers.get(&id)?;
            if let Some(scope) = &c.scope {
                return Some(scope.clone());
            }
            cursor = c.parent;
        }
        None
    }

    fn scope_at(&self, node: HostNodeId) -> Option<Arc<ScopeNode>> {
        self.inner.read().containers.get(&node)?.scope.clone()
    }

    fn parent_of(&self, node: HostNodeId) -> Option<HostNodeId> {
        self.inner.read().containers.get(&node)?.parent
    }

    fn scene_of(&self, node: HostNodeId) -> Option<SceneId> {
        self.inner.read().containers.get(&node)?.scene
    }

    fn roots_of_scene(&self, scene: SceneId, out: &mut Vec<HostNodeId>) {
        let g = self.inner.read();
        out.extend(
            g.containers
                .iter()
                .filter(|(_, c)| c.parent.is_none() && c.scene == Some(scene))
                .map(|(id, _)| *id),
        );
    }

    fn find_declared_global(&self) -> Option<Arc<ScopeNode>> {
        self.inner
            .read()
            .containers
            .values()
            .filter_map(|c| c.scope.as_ref())
            .find(|s| matches!(s.role(), Some(BootstrapRole::Global(_))))
            .cloned()
    }

    fn create_container(&self, name: &str) -> HostNodeId {
        let mut g = self.inner.write();
        let scene = g.active_scene;
        g.insert(name, None, scene)
    }

    fn attach_scope(&self, scope: Arc<ScopeNode>) {
        let mut g = self.inner.write();
        match g.containers.get_mut(&scope.host()) {
            Some(c) => {
                debug!(target: TARGET, "scope.attach node={} scope={}", scope.host(), scope.id());
                c.scope = Some(scope);
            }
            None => {
                debug!(target: TARGET, "scope.attach ignored: node={} is gone", scope.host());
            }
        }
    }

    /// Detaches the container from its parent and moves its subtree out of every scene.
    fn mark_persistent(&self, node: HostNodeId) {
        let mut g = self.inner.write();
        let Some(parent) = g.containers.get(&node).map(|c| c.parent) else {
            return;
        };
        if let Some(p) = parent.and_then(|p| g.containers.get_mut(&p)) {
            p.children.retain(|c| *c != node);
        }
        if let Some(c) = g.containers.get_mut(&node) {
            c.parent = None;
            c.persistent = true;
        }
        g.set_scene_recursive(node, None);
        debug!(target: TARGET, "node.persistent node={}", node);
    }
}
