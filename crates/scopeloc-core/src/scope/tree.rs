use parking_lot::Mutex;
use std::any::type_name;
use std::mem;
use std::sync::Arc;

use crate::config::LocatorConfig;
use crate::error::{LocatorError, LocatorResult};
use crate::events::{EventHub, ScopeEvent, ScopeEvents};
use crate::host::{HostNodeId, HostTopology, SceneId, ScopeLifecycle};
use crate::services::{DefaultServices, Diag, Services};

use super::bootstrap::{BootstrapOutcome, BootstrapRole, GlobalRole};
use super::node::{ScopeId, ScopeNode};
use super::state::ScopeTreeState;

/// Coordinator of every scope in the process.
///
/// Owns the process-wide bookkeeping (global scope, scene scopes) behind one
/// coarse lock. Every public operation takes that lock once; nested steps
/// (bootstrap -> configure, scene lookup -> global) run on the held guard.
pub struct ScopeTree {
    host: Arc<dyn HostTopology>,
    services: Box<dyn Services>,
    config: LocatorConfig,
    state: Mutex<ScopeTreeState>,
    events: EventHub,
}

impl ScopeTree {
    pub fn new(host: Arc<dyn HostTopology>, services: Box<dyn Services>, config: LocatorConfig) -> Self {
        Self {
            host,
            services,
            config,
            state: Mutex::new(ScopeTreeState::default()),
            events: EventHub::default(),
        }
    }

    /// Default config, diagnostics through the `log` facade.
    pub fn with_host(host: Arc<dyn HostTopology>) -> Self {
        Self::new(host, Box::new(DefaultServices::new()), LocatorConfig::default())
    }

    #[inline]
    pub fn config(&self) -> &LocatorConfig {
        &self.config
    }

    #[inline]
    pub fn host(&self) -> &Arc<dyn HostTopology> {
        &self.host
    }

    #[inline]
    pub fn subscribe(&self) -> ScopeEvents {
        self.events.subscribe()
    }

    #[inline]
    fn diag(&self) -> Diag<'_> {
        Diag::new(self.services.logger(), self.config.verbose)
    }

    /* ---------------------------------------------------------------------------------------------
       Lookup of scopes
       ------------------------------------------------------------------------------------------- */

    /// The global scope, bootstrapping or spawning it on first use.
    pub fn global(&self) -> Arc<ScopeNode> {
        let mut st = self.state.lock();
        self.global_locked(&mut st)
    }

    /// Nearest scope in the containment hierarchy, else the scene scope, else global.
    pub fn scope_of(&self, node: HostNodeId) -> Arc<ScopeNode> {
        let mut st = self.state.lock();
        self.scope_of_locked(&mut st, node)
    }

    /// Scene scope of `node`'s scene, else global. Containment is ignored.
    pub fn scope_for_scene_of(&self, node: HostNodeId) -> Arc<ScopeNode> {
        let mut st = self.state.lock();
        self.scene_scope_or_global(&mut st, node, None)
    }

    /// Configured scope of `scene`, without triggering any bootstrap.
    pub fn scene_scope(&self, scene: SceneId) -> Option<Arc<ScopeNode>> {
        self.state.lock().scene(scene)
    }

    pub fn is_global(&self, node: &ScopeNode) -> bool {
        self.state.lock().is_global(node)
    }

    fn global_locked(&self, st: &mut ScopeTreeState) -> Arc<ScopeNode> {
        if let Some(global) = st.global() {
            return global;
        }

        if let Some(declared) = self.host.find_declared_global() {
            self.bootstrap_locked(st, &declared);
            return self.adopt_global(st, declared);
        }

        let host_node = self.host.create_container(&self.config.global_container_name);
        let node = Arc::new(ScopeNode::with_role(
            host_node,
            BootstrapRole::global(self.config.persistent_global),
        ));
        self.host.attach_scope(node.clone());
        self.events.publish(ScopeEvent::GlobalCreated {
            scope: node.id(),
            host: host_node,
        });

        self.bootstrap_locked(st, &node);
        self.diag()
            .info(format_args!("global scope {} created on {}", node.id(), host_node));
        self.adopt_global(st, node)
    }

    /// A declared global bootstrapped before a reset keeps its role but lost its
    /// registration; commit it again instead of leaving the tree without a global.
    fn adopt_global(&self, st: &mut ScopeTreeState, node: Arc<ScopeNode>) -> Arc<ScopeNode> {
        if let Some(global) = st.global() {
            return global;
        }

        let persistent = match node.role() {
            Some(BootstrapRole::Global(GlobalRole { persistent })) => persistent,
            _ => self.config.persistent_global,
        };
        // The only failure is another global, and there is none.
        let _ = self.configure_as_global_locked(st, &node, persistent);
        node
    }

    fn scope_of_locked(&self, st: &mut ScopeTreeState, node: HostNodeId) -> Arc<ScopeNode> {
        if let Some(scope) = self.host.nearest_scope(node) {
            self.diag()
                .info(format_args!("scope_of {}: containment scope {}", node, scope.id()));
            return scope;
        }
        self.scene_scope_or_global(st, node, None)
    }

    fn scene_scope_or_global(
        &self,
        st: &mut ScopeTreeState,
        node: HostNodeId,
        exclude: Option<ScopeId>,
    ) -> Arc<ScopeNode> {
        match self.scene_scope_locked(st, node, exclude) {
            Some(scope) => scope,
            None => {
                self.diag()
                    .warn(format_args!("no scene scope found for {}, using global", node));
                self.global_locked(st)
            }
        }
    }

    /// Scene tier: the configured mapping first, then a scan of the scene's root
    /// containers for a scene-role scope, bootstrapping it on demand.
    fn scene_scope_locked(
        &self,
        st: &mut ScopeTreeState,
        node: HostNodeId,
        exclude: Option<ScopeId>,
    ) -> Option<Arc<ScopeNode>> {
        let scene = self.host.scene_of(node)?;

        if let Some(scope) = st.scene(scene) {
            if Some(scope.id()) != exclude {
                self.diag()
                    .info(format_args!("scene scope {} serves {}", scope.id(), node));
                return Some(scope);
            }
        }

        let mut roots = mem::take(&mut st.scratch);
        roots.clear();
        self.host.roots_of_scene(scene, &mut roots);
        let candidate = roots
            .iter()
            .filter_map(|root| self.host.scope_at(*root))
            .find(|scope| {
                matches!(scope.role(), Some(BootstrapRole::Scene(_))) && Some(scope.id()) != exclude
            });
        roots.clear();
        st.scratch = roots;

        let candidate = candidate?;
        self.bootstrap_locked(st, &candidate);
        if st.scene(scene).is_none() {
            // Bootstrapped before a reset: its mapping is gone, record it again.
            let _ = self.configure_for_scene_locked(st, &candidate);
        }

        self.diag().info(format_args!(
            "bootstrapped scene scope {} for {}",
            candidate.id(),
            node
        ));
        Some(candidate)
    }

    /// Next scope of the resolution walk; `None` past the global scope.
    fn next_in_hierarchy(&self, st: &mut ScopeTreeState, scope: &ScopeNode) -> Option<Arc<ScopeNode>> {
        if st.is_global(scope) {
            return None;
        }

        let ancestor = self
            .host
            .parent_of(scope.host())
            .and_then(|parent| self.host.nearest_scope(parent))
            .filter(|up| up.id() != scope.id());
        if ancestor.is_some() {
            return ancestor;
        }

        Some(self.scene_scope_or_global(st, scope.host(), Some(scope.id())))
    }

    /* ---------------------------------------------------------------------------------------------
       Resolution
       ------------------------------------------------------------------------------------------- */

    pub fn resolve<T: ?Sized + Send + Sync + 'static>(&self, start: &Arc<ScopeNode>) -> LocatorResult<Arc<T>> {
        self.try_resolve::<T>(start).ok_or(LocatorError::NotRegistered {
            capability: type_name::<T>(),
        })
    }

    pub fn try_resolve<T: ?Sized + Send + Sync + 'static>(&self, start: &Arc<ScopeNode>) -> Option<Arc<T>> {
        let mut st = self.state.lock();
        self.walk_locked(&mut st, start, type_name::<T>(), |scope| {
            scope.registry().try_get::<T>()
        })
    }

    /// `scope_of(node)` followed by the resolution walk.
    pub fn resolve_for<T: ?Sized + Send + Sync + 'static>(&self, node: HostNodeId) -> LocatorResult<Arc<T>> {
        self.try_resolve_for::<T>(node).ok_or(LocatorError::NotRegistered {
            capability: type_name::<T>(),
        })
    }

    pub fn try_resolve_for<T: ?Sized + Send + Sync + 'static>(&self, node: HostNodeId) -> Option<Arc<T>> {
        let mut st = self.state.lock();
        let start = self.scope_of_locked(&mut st, node);
        self.walk_locked(&mut st, &start, type_name::<T>(), |scope| {
            scope.registry().try_get::<T>()
        })
    }

    /// Probes `start`, then each next scope, until a hit or past global.
    ///
    /// A scope is probed at most once. If the host hierarchy folds back onto an
    /// already probed scope the walk jumps to global, so it ends after at most
    /// one probe per distinct scope.
    fn walk_locked<R>(
        &self,
        st: &mut ScopeTreeState,
        start: &Arc<ScopeNode>,
        capability: &'static str,
        mut probe: impl FnMut(&ScopeNode) -> Option<R>,
    ) -> Option<R> {
        let mut visited: Vec<ScopeId> = Vec::new();
        let mut current = start.clone();

        loop {
            if let Some(hit) = probe(&*current) {
                self.diag().info(format_args!(
                    "resolved '{}' in {} (start {}, {} hop(s))",
                    capability,
                    current.id(),
                    start.id(),
                    visited.len()
                ));
                return Some(hit);
            }
            visited.push(current.id());

            let Some(next) = self.next_in_hierarchy(st, &current) else {
                self.diag().info(format_args!(
                    "'{}' not found from {} after {} scope(s)",
                    capability,
                    start.id(),
                    visited.len()
                ));
                return None;
            };

            current = if visited.contains(&next.id()) {
                let global = self.global_locked(st);
                if visited.contains(&global.id()) {
                    return None;
                }
                self.diag().warn(format_args!(
                    "scope hierarchy loops back to {} from {}; continuing at global",
                    next.id(),
                    current.id()
                ));
                global
            } else {
                next
            };
        }
    }

    /* ---------------------------------------------------------------------------------------------
       Roles and lifecycle
       ------------------------------------------------------------------------------------------- */

    /// Runs the node's role setup once. Repeat calls are no-ops.
    pub fn bootstrap(&self, node: &Arc<ScopeNode>) -> BootstrapOutcome {
        let mut st = self.state.lock();
        self.bootstrap_locked(&mut st, node)
    }

    fn bootstrap_locked(&self, st: &mut ScopeTreeState, node: &Arc<ScopeNode>) -> BootstrapOutcome {
        let Some(bootstrapper) = node.bootstrapper() else {
            return BootstrapOutcome::NoRole;
        };
        if !bootstrapper.claim() {
            return BootstrapOutcome::AlreadyBootstrapped;
        }

        let res = match bootstrapper.role() {
            BootstrapRole::Global(GlobalRole { persistent }) => {
                self.configure_as_global_locked(st, node, persistent)
            }
            BootstrapRole::Scene(_) => self.configure_for_scene_locked(st, node),
        };

        match res {
            Ok(()) => BootstrapOutcome::Configured,
            Err(e) => BootstrapOutcome::Rejected(e),
        }
    }

    pub fn configure_as_global(&self, node: &Arc<ScopeNode>, persistent: bool) -> LocatorResult<()> {
        let mut st = self.state.lock();
        self.configure_as_global_locked(&mut st, node, persistent)
    }

    fn configure_as_global_locked(
        &self,
        st: &mut ScopeTreeState,
        node: &Arc<ScopeNode>,
        persistent: bool,
    ) -> LocatorResult<()> {
        match st.global() {
            Some(global) if global.id() == node.id() => {
                self.diag()
                    .warn(format_args!("{} is already configured as global", node.id()));
                Ok(())
            }
            Some(global) => {
                self.diag().error(format_args!(
                    "{} cannot become global: {} is already global",
                    node.id(),
                    global.id()
                ));
                Err(LocatorError::AlreadyGlobal {
                    existing: global.id(),
                    rejected: node.id(),
                })
            }
            None => {
                st.set_global(node);
                if persistent {
                    self.host.mark_persistent(node.host());
                }
                self.diag().info(format_args!(
                    "{} configured as global (persistent={})",
                    node.id(),
                    persistent
                ));
                self.events.publish(ScopeEvent::GlobalConfigured {
                    scope: node.id(),
                    persistent,
                });
                Ok(())
            }
        }
    }

    pub fn configure_for_scene(&self, node: &Arc<ScopeNode>) -> LocatorResult<()> {
        let mut st = self.state.lock();
        self.configure_for_scene_locked(&mut st, node)
    }

    fn configure_for_scene_locked(&self, st: &mut ScopeTreeState, node: &Arc<ScopeNode>) -> LocatorResult<()> {
        let Some(scene) = self.host.scene_of(node.host()) else {
            self.diag()
                .error(format_args!("{} is not part of any scene", node.id()));
            return Err(LocatorError::SceneUnavailable { scope: node.id() });
        };

        if let Some(existing) = st.scene(scene) {
            self.diag().error(format_args!(
                "{} rejected: {} is already configured for {}",
                node.id(),
                existing.id(),
                scene
            ));
            return Err(LocatorError::DuplicateSceneScope {
                scene,
                existing: existing.id(),
                rejected: node.id(),
            });
        }

        st.insert_scene(scene, node);
        self.diag()
            .info(format_args!("{} configured for {}", node.id(), scene));
        self.events.publish(ScopeEvent::SceneConfigured {
            scope: node.id(),
            scene,
        });
        Ok(())
    }

    /// Host teardown hook. Must run on every destruction path of a scope's container.
    pub fn on_node_destroyed(&self, node: &ScopeNode) {
        let mut st = self.state.lock();

        if st.is_global(node) {
            st.clear_global();
            self.diag()
                .info(format_args!("global scope {} destroyed", node.id()));
        } else if let Some(scene) = st.remove_scene_of(node) {
            self.diag()
                .info(format_args!("scene scope {} for {} destroyed", node.id(), scene));
        } else {
            return;
        }

        self.events
            .publish(ScopeEvent::ScopeDestroyed { scope: node.id() });
    }

    /// Back to the initial empty state. Nodes themselves are untouched.
    pub fn reset_all(&self) {
        let mut st = self.state.lock();
        let scenes = st.scene_count();
        st.reset();
        self.diag()
            .info(format_args!("scope tree state reset ({} scene scope(s) dropped)", scenes));
        self.events.publish(ScopeEvent::Reset);
    }
}

impl ScopeLifecycle for ScopeTree {
    #[inline]
    fn on_node_destroyed(&self, node: &ScopeNode) {
        ScopeTree::on_node_destroyed(self, node);
    }
}
