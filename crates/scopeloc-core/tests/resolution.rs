mod common;

use std::sync::Arc;

use common::{app_log, feature, fixture, AppLog, Feature};
use scopeloc_core::{BootstrapRole, CapabilityKey, HostTopology, LocatorError};

#[test]
fn global_service_resolves_from_bare_leaf() {
    let fx = fixture();
    let scene = fx.host.create_scene("main");
    let root = fx.host.spawn_root(scene, "root");
    let leaf = fx.host.spawn_child(root, "leaf");

    let log = app_log("global");
    fx.tree.global().register(log.clone()).unwrap();

    let got = fx.tree.resolve_for::<dyn AppLog>(leaf).unwrap();
    assert!(Arc::ptr_eq(&got, &log));

    let start = fx.tree.scope_of(leaf);
    assert!(fx.tree.is_global(&start));
    assert_eq!(fx.tree.resolve::<dyn AppLog>(&start).unwrap().tag(), "global");
}

#[test]
fn scene_service_is_visible_only_inside_its_scene() {
    let fx = fixture();
    let level = fx.host.create_scene("level");
    let other = fx.host.create_scene("other");

    let locator = fx.host.spawn_root(level, "ServiceLocator [Scene]");
    let scene_scope = fx.host.add_scope(locator, Some(BootstrapRole::scene()));
    scene_scope.register(feature(3)).unwrap();

    let inside = fx.host.spawn_child(fx.host.spawn_root(level, "player"), "weapon");
    let outside = fx.host.spawn_root(other, "enemy");
    let floating = fx.host.create_container("floating");
    fx.host.mark_persistent(floating);

    assert_eq!(fx.tree.resolve_for::<dyn Feature>(inside).unwrap().level(), 3);
    assert!(scene_scope.is_bootstrapped());
    assert_eq!(fx.tree.scene_scope(level).unwrap().id(), scene_scope.id());

    for node in [outside, floating] {
        let res = fx.tree.resolve_for::<dyn Feature>(node);
        assert!(matches!(res, Err(LocatorError::NotRegistered { capability }) if capability.contains("Feature")));
    }
}

#[test]
fn scope_of_prefers_containment_then_scene_then_global() {
    let fx = fixture();
    let scene = fx.host.create_scene("main");

    let scene_root = fx.host.spawn_root(scene, "scene locator");
    let scene_scope = fx.host.add_scope(scene_root, Some(BootstrapRole::scene()));

    let holder = fx.host.spawn_root(scene, "holder");
    let local = fx.host.add_scope(holder, None);
    let in_local = fx.host.spawn_child(holder, "child");
    let bare = fx.host.spawn_root(scene, "bare");

    assert_eq!(fx.tree.scope_of(in_local).id(), local.id());
    assert_eq!(fx.tree.scope_of(holder).id(), local.id());
    assert_eq!(fx.tree.scope_of(bare).id(), scene_scope.id());

    // Scene lookup ignores containment.
    assert_eq!(fx.tree.scope_for_scene_of(in_local).id(), scene_scope.id());

    let other = fx.host.create_scene("other");
    let elsewhere = fx.host.spawn_root(other, "elsewhere");
    let global = fx.tree.scope_of(elsewhere);
    assert!(fx.tree.is_global(&global));
    assert!(fx.log.contains(log::Level::Warn, "using global"));
}

#[test]
fn walk_goes_local_to_enclosing_to_scene_to_global() {
    let fx = fixture();
    let scene = fx.host.create_scene("main");

    let scene_root = fx.host.spawn_root(scene, "scene locator");
    let scene_scope = fx.host.add_scope(scene_root, Some(BootstrapRole::scene()));

    let outer = fx.host.spawn_root(scene, "outer");
    let outer_scope = fx.host.add_scope(outer, None);
    let mid = fx.host.spawn_child(outer, "mid");
    let inner = fx.host.spawn_child(mid, "inner");
    let inner_scope = fx.host.add_scope(inner, None);

    inner_scope.register(Arc::new(1u8)).unwrap();
    outer_scope.register(Arc::new(2u16)).unwrap();
    scene_scope.register(Arc::new(3u32)).unwrap();
    fx.tree.global().register(Arc::new(4u64)).unwrap();

    assert_eq!(*fx.tree.resolve::<u8>(&inner_scope).unwrap(), 1);
    assert_eq!(*fx.tree.resolve::<u16>(&inner_scope).unwrap(), 2);
    assert_eq!(*fx.tree.resolve::<u32>(&inner_scope).unwrap(), 3);
    assert_eq!(*fx.tree.resolve::<u64>(&inner_scope).unwrap(), 4);
    assert!(fx.tree.try_resolve::<i8>(&inner_scope).is_none());

    // Walks never descend: the outer scope cannot see the inner binding.
    assert!(fx.tree.try_resolve::<u8>(&outer_scope).is_none());
}

#[test]
fn nearest_binding_shadows_outer_ones() {
    let fx = fixture();
    let scene = fx.host.create_scene("main");

    let scene_root = fx.host.spawn_root(scene, "scene locator");
    let scene_scope = fx.host.add_scope(scene_root, Some(BootstrapRole::scene()));
    let holder = fx.host.spawn_root(scene, "holder");
    let local = fx.host.add_scope(holder, None);
    let leaf = fx.host.spawn_child(holder, "leaf");
    let sibling = fx.host.spawn_root(scene, "sibling");

    fx.tree.global().register(app_log("global")).unwrap();
    scene_scope.register(app_log("scene")).unwrap();
    local.register(app_log("local")).unwrap();

    assert_eq!(fx.tree.resolve_for::<dyn AppLog>(leaf).unwrap().tag(), "local");
    assert_eq!(fx.tree.resolve_for::<dyn AppLog>(sibling).unwrap().tag(), "scene");
    assert_eq!(
        fx.tree.resolve::<dyn AppLog>(&fx.tree.global()).unwrap().tag(),
        "global"
    );
}

#[test]
fn scene_scope_falls_through_to_global() {
    let fx = fixture();
    let scene = fx.host.create_scene("main");
    let scene_root = fx.host.spawn_root(scene, "scene locator");
    let scene_scope = fx.host.add_scope(scene_root, Some(BootstrapRole::scene()));
    fx.tree.bootstrap(&scene_scope);

    fx.tree.global().register(app_log("global")).unwrap();

    assert_eq!(fx.tree.resolve::<dyn AppLog>(&scene_scope).unwrap().tag(), "global");
}

#[test]
fn global_scope_has_no_next_scope() {
    let fx = fixture();
    let global = fx.tree.global();

    let res = fx.tree.resolve::<dyn Feature>(&global);
    assert!(matches!(res, Err(LocatorError::NotRegistered { .. })));
    assert!(fx.tree.try_resolve::<dyn Feature>(&global).is_none());
}

#[test]
fn folded_hierarchy_terminates() {
    let fx = fixture();
    let scene = fx.host.create_scene("main");

    // A local scope on a root container, with the scene scope nested below it:
    // local -> (no ancestor) -> scene scope -> (ancestor) local -> ...
    let root = fx.host.spawn_root(scene, "root");
    let local = fx.host.add_scope(root, None);
    let nested = fx.host.spawn_child(root, "nested scene locator");
    let scene_scope = fx.host.add_scope(nested, Some(BootstrapRole::scene()));
    fx.tree.configure_for_scene(&scene_scope).unwrap();

    fx.tree.global().register(app_log("global")).unwrap();

    assert_eq!(fx.tree.resolve::<dyn AppLog>(&local).unwrap().tag(), "global");
    assert!(fx.tree.try_resolve::<dyn Feature>(&local).is_none());
    assert!(fx.tree.try_resolve::<dyn Feature>(&scene_scope).is_none());
    assert!(fx.log.contains(log::Level::Warn, "loops back"));
}

#[test]
fn erased_registration_resolves_through_generic_lookup() {
    let fx = fixture();
    let global = fx.tree.global();

    global
        .register_erased(CapabilityKey::of::<dyn Feature>(), Box::new(feature(9)))
        .unwrap();
    assert_eq!(fx.tree.resolve::<dyn Feature>(&global).unwrap().level(), 9);

    let err = global
        .register_erased(CapabilityKey::of::<dyn AppLog>(), Box::new(feature(1)))
        .unwrap_err();
    assert!(matches!(err, LocatorError::TypeMismatch { .. }));
    assert!(fx.tree.try_resolve::<dyn AppLog>(&global).is_none());
}

#[test]
fn chained_registration_on_one_scope() {
    let fx = fixture();
    let global = fx.tree.global();

    global
        .register(app_log("a"))
        .and_then(|s| s.register(feature(1)))
        .unwrap();

    let names: Vec<_> = global
        .registry()
        .all_registered()
        .iter()
        .map(|s| s.key())
        .collect();
    assert_eq!(
        names,
        vec![CapabilityKey::of::<dyn AppLog>(), CapabilityKey::of::<dyn Feature>()]
    );

    let err = global.register(app_log("b")).unwrap_err();
    assert!(matches!(err, LocatorError::DuplicateRegistration { .. }));
    assert_eq!(fx.tree.resolve::<dyn AppLog>(&global).unwrap().tag(), "a");
}

#[test]
fn host_topology_is_reachable_from_tree() {
    let fx = fixture();
    let scene = fx.host.create_scene("main");
    let root = fx.host.spawn_root(scene, "root");

    assert_eq!(fx.tree.host().scene_of(root), Some(scene));
}

#[test]
fn walk_probes_each_scope_of_a_deep_chain_once() {
    const DEPTH: usize = 51;

    let fx = fixture();
    let scene = fx.host.create_scene("main");

    let mut node = fx.host.spawn_root(scene, "level-0");
    let mut deepest = fx.host.add_scope(node, None);
    for level in 1..DEPTH {
        node = fx.host.spawn_child(node, &format!("level-{level}"));
        deepest = fx.host.add_scope(node, None);
    }

    // Every local scope, then global.
    assert!(fx.tree.try_resolve::<dyn Feature>(&deepest).is_none());
    assert!(fx.log.contains(log::Level::Info, &format!("after {} scope(s)", DEPTH + 1)));

    fx.tree.global().register(feature(2)).unwrap();
    fx.log.clear();
    assert_eq!(fx.tree.resolve::<dyn Feature>(&deepest).unwrap().level(), 2);
    assert!(fx.log.contains(log::Level::Info, &format!("{DEPTH} hop(s)")));
}
