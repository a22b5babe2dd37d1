use std::collections::HashMap;
use std::sync::{Arc, Weak};

use crate::host::{HostNodeId, SceneId};

use super::node::{ScopeId, ScopeNode};

/// Non-owning reference kept in the tree's bookkeeping tables.
struct ScopeRef {
    id: ScopeId,
    node: Weak<ScopeNode>,
}

impl ScopeRef {
    fn new(node: &Arc<ScopeNode>) -> Self {
        Self {
            id: node.id(),
            node: Arc::downgrade(node),
        }
    }
}

/// Process-wide scope bookkeeping.
///
/// Starts empty and goes back to empty on `reset`. References whose host
/// already dropped the node are treated as absent and pruned when touched.
#[derive(Default)]
pub(crate) struct ScopeTreeState {
    global: Option<ScopeRef>,
    scenes: HashMap<SceneId, ScopeRef>,
    /// Reused buffer for scene-root scans.
    pub(crate) scratch: Vec<HostNodeId>,
}

impl ScopeTreeState {
    pub(crate) fn global(&mut self) -> Option<Arc<ScopeNode>> {
        let live = self.global.as_ref()?.node.upgrade();
        if live.is_none() {
            self.global = None;
        }
        live
    }

    #[inline]
    pub(crate) fn is_global(&self, node: &ScopeNode) -> bool {
        self.global.as_ref().is_some_and(|r| r.id == node.id())
    }

    #[inline]
    pub(crate) fn set_global(&mut self, node: &Arc<ScopeNode>) {
        self.global = Some(ScopeRef::new(node));
    }

    #[inline]
    pub(crate) fn clear_global(&mut self) {
        self.global = None;
    }

    pub(crate) fn scene(&mut self, scene: SceneId) -> Option<Arc<ScopeNode>> {
        let live = self.scenes.get(&scene)?.node.upgrade();
        if live.is_none() {
            self.scenes.remove(&scene);
        }
        live
    }

    #[inline]
    pub(crate) fn insert_scene(&mut self, scene: SceneId, node: &Arc<ScopeNode>) {
        self.scenes.insert(scene, ScopeRef::new(node));
    }

    /// Drops whichever scene mapping points at `node`.
    pub(crate) fn remove_scene_of(&mut self, node: &ScopeNode) -> Option<SceneId> {
        let scene = self
            .scenes
            .iter()
            .find_map(|(scene, r)| (r.id == node.id()).then_some(*scene))?;
        self.scenes.remove(&scene);
        Some(scene)
    }

    #[inline]
    pub(crate) fn scene_count(&self) -> usize {
        self.scenes.len()
    }

    pub(crate) fn reset(&mut self) {
        self.global = None;
        self.scenes.clear();
        self.scratch.clear();
    }
}
