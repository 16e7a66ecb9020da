use shared::{
    domain::{ContainerId, ViewId, Visibility},
    error::RegistryError,
};

use crate::{registry::ViewRegistry, view::ViewSpec};

fn view(id: &str, container: &str) -> ViewSpec {
    ViewSpec::new(id, container)
}

#[test]
fn duplicate_id_is_rejected_and_first_registration_kept() {
    let mut registry = ViewRegistry::new();
    registry
        .add(view("settings", "root").z_index(3))
        .expect("first add");

    let err = registry.add(view("settings", "root")).unwrap_err();
    assert!(matches!(err, RegistryError::DuplicateId(id) if id.as_str() == "settings"));

    let kept = registry.get(&ViewId::from("settings")).expect("still there");
    assert_eq!(kept.z_index, 3);
    assert_eq!(registry.len(), 1);
}

#[test]
fn sibling_views_come_back_in_document_order() {
    let mut registry = ViewRegistry::new();
    for id in ["home", "feed", "profile"] {
        registry.add(view(id, "root")).expect("add");
    }
    registry.add(view("elsewhere", "other")).expect("add");

    let siblings = registry.sibling_views(&ViewId::from("feed"));
    let ids: Vec<&str> = siblings.iter().map(|v| v.as_str()).collect();
    assert_eq!(ids, vec!["home", "feed", "profile"]);
}

#[test]
fn enclosing_view_walks_the_container_chain() {
    let mut registry = ViewRegistry::new();
    registry.register_container(ContainerId::from("root"), None, None);
    registry.add(view("outer", "root")).expect("add");
    // A pane inside "outer", and a deeper wrapper inside the pane.
    registry.register_container(
        ContainerId::from("outer-pane"),
        Some(ViewId::from("outer")),
        Some(ContainerId::from("root")),
    );
    registry.register_container(
        ContainerId::from("outer-pane-wrap"),
        None,
        Some(ContainerId::from("outer-pane")),
    );
    registry.add(view("inner", "outer-pane-wrap")).expect("add");

    assert_eq!(
        registry.enclosing_view(&ContainerId::from("outer-pane-wrap")),
        Some(ViewId::from("outer"))
    );
    assert_eq!(
        registry.parent_view(&ViewId::from("inner")),
        Some(ViewId::from("outer"))
    );
    assert_eq!(registry.parent_view(&ViewId::from("outer")), None);
    assert!(registry.is_top_level(&ViewId::from("outer")));
    assert!(!registry.is_top_level(&ViewId::from("inner")));
}

#[test]
fn ancestor_visibility_gates_is_visible() {
    let mut registry = ViewRegistry::new();
    registry.add(view("outer", "root")).expect("add");
    registry.register_container(
        ContainerId::from("outer-pane"),
        Some(ViewId::from("outer")),
        None,
    );
    registry.add(view("inner", "outer-pane")).expect("add");

    registry
        .get_mut(&ViewId::from("inner"))
        .expect("inner")
        .visibility = Visibility::Visible;

    assert!(registry.is_visible(&ViewId::from("inner"), false));
    // Outer is still hidden, so the ancestor-aware query says no.
    assert!(!registry.is_visible(&ViewId::from("inner"), true));

    registry
        .get_mut(&ViewId::from("outer"))
        .expect("outer")
        .visibility = Visibility::Visible;
    assert!(registry.is_visible(&ViewId::from("inner"), true));
}

#[test]
fn remove_forgets_the_view() {
    let mut registry = ViewRegistry::new();
    registry.add(view("gone", "root")).expect("add");
    assert!(registry.remove(&ViewId::from("gone")).is_some());
    assert!(!registry.contains(&ViewId::from("gone")));
    assert!(registry.remove(&ViewId::from("gone")).is_none());
}
