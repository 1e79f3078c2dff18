//! Selection reducer and registry behaviour.

use vigil::catalog::ModelCatalog;
use vigil::selection::{reduce, ModelSelectionRegistry, SelectionCommand, SelectionSet};

fn toggle(name: &str) -> SelectionCommand {
    SelectionCommand::Toggle(name.to_owned())
}

#[test]
fn every_model_starts_unselected() {
    let registry = ModelSelectionRegistry::default();
    for entry in registry.catalog().entries() {
        assert!(!registry.selected().contains(entry.name));
    }
    assert!(registry.selected().is_empty());
}

#[test]
fn double_toggle_is_identity_for_every_model() {
    let catalog = ModelCatalog::default();
    let start = reduce(&catalog, &SelectionSet::default(), &toggle("Detect Accident"))
        .expect("known model");

    for entry in catalog.entries() {
        let once = reduce(&catalog, &start, &toggle(entry.name)).expect("known model");
        let twice = reduce(&catalog, &once, &toggle(entry.name)).expect("known model");
        assert_eq!(twice, start, "toggling {} twice changed the set", entry.name);
    }
}

#[test]
fn reducer_does_not_mutate_input_state() {
    let catalog = ModelCatalog::default();
    let state = SelectionSet::default();
    let next = reduce(&catalog, &state, &toggle("Shop Lift")).expect("known model");
    assert!(state.is_empty());
    assert!(next.contains("Shop Lift"));
}

#[test]
fn unknown_model_is_rejected() {
    let catalog = ModelCatalog::default();
    let err = reduce(&catalog, &SelectionSet::default(), &toggle("Licence Plates"))
        .expect_err("unknown");
    assert_eq!(err.to_string(), "unknown detection model: Licence Plates");
}

#[test]
fn toggle_order_does_not_change_resolved_paths() {
    let mut forward = ModelSelectionRegistry::default();
    forward.toggle("Weapon Detection").expect("known model");
    forward.toggle("Shop Lift").expect("known model");

    let mut reverse = ModelSelectionRegistry::default();
    reverse.toggle("Shop Lift").expect("known model");
    reverse.toggle("Weapon Detection").expect("known model");

    let a = forward
        .resolve_artifact_paths(forward.selected())
        .expect("resolve");
    let b = reverse
        .resolve_artifact_paths(reverse.selected())
        .expect("resolve");
    assert_eq!(a, b);
    assert_eq!(a, vec!["shoplift.pt", "weapon_detection.pt"]);
}

#[test]
fn full_selection_resolves_in_catalog_order() {
    let mut registry = ModelSelectionRegistry::default();
    let names: Vec<&str> = registry.catalog().entries().map(|e| e.name).collect();
    for name in names.iter().rev() {
        registry.toggle(name).expect("known model");
    }
    let paths = registry
        .resolve_artifact_paths(registry.selected())
        .expect("resolve");
    assert_eq!(
        paths,
        vec![
            "accident_detection.pt",
            "activity_detection.pt",
            "shoplift.pt",
            "yolov8n-pose.pt",
            "precrime.pt",
            "weapon_detection.pt",
        ]
    );

    registry.apply(&SelectionCommand::Clear).expect("clear");
    assert!(registry.selected().is_empty());
}
