use std::fs;
use std::path::PathBuf;
use std::process;

use graf_wiedzy::knowledge::{FilterPatch, Locale, NodeType};
use graf_wiedzy::state::{
    ContrastMode, GraphStore, LayoutMode, PersistedSettings, RENDER_NODE_CAP_RANGE, ZOOM_RANGE,
};

fn scratch_path(name: &str) -> PathBuf {
    std::env::temp_dir()
        .join(format!("graf-wiedzy-test-{}", process::id()))
        .join(name)
}

#[test]
fn zoom_is_clamped_and_non_finite_levels_are_ignored() {
    let mut store = GraphStore::default();

    store.set_zoom_level(50.0);
    assert_eq!(store.state().viewport.zoom, *ZOOM_RANGE.end());

    store.set_zoom_level(0.0);
    assert_eq!(store.state().viewport.zoom, *ZOOM_RANGE.start());

    let revision = store.revision();
    store.set_zoom_level(f32::NAN);
    store.zoom_about(f32::INFINITY, eframe::egui::Vec2::ZERO);
    assert_eq!(store.state().viewport.zoom, *ZOOM_RANGE.start());
    assert_eq!(store.revision(), revision);
}

#[test]
fn render_cap_is_clamped() {
    let mut store = GraphStore::default();

    store.set_max_render_nodes(0);
    assert_eq!(
        store.state().viewport.render_node_cap,
        *RENDER_NODE_CAP_RANGE.start()
    );

    store.set_max_render_nodes(1_000_000);
    assert_eq!(
        store.state().viewport.render_node_cap,
        *RENDER_NODE_CAP_RANGE.end()
    );
}

#[test]
fn assembly_filter_takes_the_smaller_cap() {
    let mut store = GraphStore::default();
    store.set_filters(FilterPatch::max_nodes(300));
    store.set_max_render_nodes(120);
    assert_eq!(store.state().assembly_filter().max_nodes, 120);

    store.set_max_render_nodes(900);
    assert_eq!(store.state().assembly_filter().max_nodes, 300);
}

#[test]
fn selection_toggles_and_retains_present_ids() {
    let mut store = GraphStore::default();
    store.toggle_select_node("a");
    store.toggle_select_node("b");
    store.toggle_select_node("a");
    assert!(!store.state().is_selected("a"));
    assert!(store.state().is_selected("b"));

    store.expand_node("c");
    store.set_highlight_node(Some("c"));
    store.retain_present(|id| id == "b");

    let state = store.state();
    assert!(state.is_selected("b"));
    assert!(state.expanded.is_empty());
    assert_eq!(state.highlighted, None);
}

#[test]
fn settings_survive_a_save_and_load() {
    let path = scratch_path("settings.json");
    let mut store = GraphStore::default();
    store.set_filters(FilterPatch::node_types([NodeType::Herb, NodeType::Adaptogen]));
    store.set_filters(FilterPatch::search("ashwagandha"));
    store.set_layout(LayoutMode::Radial);
    store.set_enable_physics(false);
    store.set_max_render_nodes(250);
    store.set_locale(Locale::Pl);
    store.set_contrast(ContrastMode::GreenBlack);
    store.add_selected_node("not-persisted");

    let settings = store.state().persisted();
    settings.save(&path).expect("settings are written");
    let loaded = PersistedSettings::load(&path)
        .expect("settings are read")
        .expect("settings file exists");
    assert_eq!(loaded, settings);

    let restored = GraphStore::from_settings(loaded);
    assert_eq!(restored.state().viewport.layout, LayoutMode::Radial);
    assert_eq!(restored.state().locale, Locale::Pl);
    assert_eq!(restored.state().contrast, ContrastMode::GreenBlack);
    assert_eq!(restored.state().filters.search_term, "ashwagandha");
    assert!(restored.state().selected.is_empty());

    let _ = fs::remove_file(&path);
}

#[test]
fn contrast_mode_is_stored_in_kebab_case() {
    let settings = PersistedSettings {
        contrast: ContrastMode::BlueYellow,
        ..PersistedSettings::default()
    };
    let encoded = serde_json::to_string(&settings).expect("settings encode");
    assert!(encoded.contains(r#""contrast":"blue-yellow""#), "{encoded}");

    let legacy: PersistedSettings =
        serde_json::from_str(r#"{ "locale": "pl" }"#).expect("older settings still load");
    assert_eq!(legacy.contrast, ContrastMode::Standard);
}

#[test]
fn missing_or_corrupt_settings_fall_back_to_defaults() {
    let missing = scratch_path("missing.json");
    assert_eq!(PersistedSettings::load(&missing).expect("not an error"), None);
    assert_eq!(
        PersistedSettings::load_or_default(&missing),
        PersistedSettings::default()
    );

    let corrupt = scratch_path("corrupt.json");
    fs::create_dir_all(corrupt.parent().expect("has a parent")).expect("scratch dir");
    fs::write(&corrupt, "{ not json").expect("scratch file");
    assert!(PersistedSettings::load(&corrupt).is_err());
    assert_eq!(
        PersistedSettings::load_or_default(&corrupt),
        PersistedSettings::default()
    );
    let _ = fs::remove_file(&corrupt);
}
