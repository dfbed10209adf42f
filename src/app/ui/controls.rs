use std::collections::BTreeSet;
use std::path::Path;

use eframe::egui::{self, Ui};
use tracing::warn;

use crate::knowledge::{
    EvidenceLevel, FilterPatch, Locale, MAX_NODES_RANGE, NodeType, RelationshipType, import_path,
};
use crate::state::{ContrastMode, LayoutMode, RENDER_NODE_CAP_RANGE};

use super::super::ViewModel;

/// Checkbox over set membership. Returns whether the set changed.
fn membership_checkbox<T: Ord + Copy>(
    ui: &mut Ui,
    set: &mut BTreeSet<T>,
    value: T,
    label: &str,
) -> bool {
    let mut checked = set.contains(&value);
    if !ui.checkbox(&mut checked, label).changed() {
        return false;
    }
    if checked {
        set.insert(value);
    } else {
        set.remove(&value);
    }
    true
}

impl ViewModel {
    pub(in crate::app) fn draw_controls(&mut self, ui: &mut Ui) {
        ui.heading("Graph Controls");
        ui.separator();
        ui.add_space(4.0);

        egui::ScrollArea::vertical()
            .id_salt("controls_scroll")
            .auto_shrink([false, false])
            .show(ui, |ui| {
                self.draw_search(ui);
                ui.separator();
                self.draw_filters(ui);
                ui.separator();
                self.draw_view_controls(ui);
                ui.separator();
                self.draw_focus_controls(ui);
                ui.separator();
                self.draw_transfer_controls(ui);
            });
    }

    fn draw_search(&mut self, ui: &mut Ui) {
        ui.label("Search (name, description or tag)")
            .on_hover_text("Only nodes matching every word stay in the graph.");
        let search_response = ui.text_edit_singleline(&mut self.search);
        if search_response.changed() {
            self.session
                .store_mut()
                .set_filters(FilterPatch::search(self.search.clone()));
        }
    }

    fn draw_filters(&mut self, ui: &mut Ui) {
        let state = self.session.store().snapshot();
        let locale = state.locale;
        let filters = &state.filters;

        let mut node_types = filters.node_types.clone();
        let mut evidence_levels = filters.evidence_levels.clone();
        let mut relationship_types = filters.relationship_types.clone();
        let mut categories = filters.categories.clone();
        let mut patch = FilterPatch::default();

        egui::CollapsingHeader::new("Node types")
            .default_open(false)
            .show(ui, |ui| {
                ui.small("Nothing checked shows every type.");
                let mut changed = false;
                for node_type in NodeType::ALL {
                    changed |=
                        membership_checkbox(ui, &mut node_types, node_type, node_type.label(locale));
                }
                if changed {
                    patch.node_types = Some(node_types);
                }
            });

        egui::CollapsingHeader::new("Evidence")
            .default_open(false)
            .show(ui, |ui| {
                let mut changed = false;
                for level in EvidenceLevel::ALL {
                    changed |=
                        membership_checkbox(ui, &mut evidence_levels, level, level.label(locale));
                }
                if changed {
                    patch.evidence_levels = Some(evidence_levels);
                }
            });

        egui::CollapsingHeader::new("Relationship types")
            .default_open(false)
            .show(ui, |ui| {
                let mut changed = false;
                for kind in RelationshipType::ALL {
                    changed |=
                        membership_checkbox(ui, &mut relationship_types, kind, kind.label(locale));
                }
                if changed {
                    patch.relationship_types = Some(relationship_types);
                }
            });

        let known_categories = self
            .session
            .dataset()
            .nodes
            .iter()
            .filter(|node| !node.category.is_empty())
            .map(|node| node.category.clone())
            .collect::<BTreeSet<_>>();
        if !known_categories.is_empty() {
            egui::CollapsingHeader::new("Categories")
                .default_open(false)
                .show(ui, |ui| {
                    let mut changed = false;
                    for category in &known_categories {
                        let mut checked = categories.contains(category);
                        if ui.checkbox(&mut checked, category.as_str()).changed() {
                            changed = true;
                            if checked {
                                categories.insert(category.clone());
                            } else {
                                categories.remove(category);
                            }
                        }
                    }
                    if changed {
                        patch.categories = Some(categories);
                    }
                });
        }

        let mut min_strength = filters.min_strength;
        let mut max_strength = filters.max_strength;
        let min_changed = ui
            .add(egui::Slider::new(&mut min_strength, 0.0..=1.0).text("Min strength"))
            .on_hover_text("Hide relationships weaker than this.")
            .changed();
        let max_changed = ui
            .add(egui::Slider::new(&mut max_strength, 0.0..=1.0).text("Max strength"))
            .on_hover_text("Hide relationships stronger than this.")
            .changed();
        if min_changed || max_changed {
            patch.min_strength = Some(min_strength);
            patch.max_strength = Some(max_strength);
        }

        let mut max_nodes = filters.max_nodes;
        let max_nodes_slider = ui
            .add(
                egui::Slider::new(&mut max_nodes, MAX_NODES_RANGE)
                    .logarithmic(true)
                    .text("Max nodes"),
            )
            .on_hover_text("Keep only the most important nodes above this count.");
        if max_nodes_slider.changed() {
            patch.max_nodes = Some(max_nodes);
        }

        let mut show_labels = filters.show_labels;
        if ui.checkbox(&mut show_labels, "Show labels").changed() {
            patch.show_labels = Some(show_labels);
        }

        if patch != FilterPatch::default() {
            self.session.store_mut().set_filters(patch);
        }

        if ui.button("Reset filters").clicked() {
            self.session.store_mut().reset_filters();
            self.search.clear();
        }
    }

    fn draw_view_controls(&mut self, ui: &mut Ui) {
        let viewport = self.session.store().state().viewport.clone();

        let mut layout = viewport.layout;
        ui.horizontal_wrapped(|ui| {
            for mode in LayoutMode::ALL {
                ui.selectable_value(&mut layout, mode, mode.label());
            }
        });
        if layout != viewport.layout {
            self.session.store_mut().set_layout(layout);
        }

        ui.horizontal(|ui| {
            let play_label = if viewport.playing { "Pause" } else { "Play" };
            if ui
                .button(play_label)
                .on_hover_text("Pause or resume the layout simulation.")
                .clicked()
            {
                self.session.store_mut().toggle_play();
            }
            if ui.button("Reset view").clicked() {
                self.session.store_mut().reset_view();
            }
            ui.label(format!("zoom {:.2}x", viewport.zoom));
        });

        let mut physics_enabled = viewport.physics_enabled;
        if ui
            .checkbox(&mut physics_enabled, "Live physics simulation")
            .on_hover_text("Continuously simulate layout forces while viewing the graph.")
            .changed()
        {
            self.session.store_mut().set_enable_physics(physics_enabled);
        }

        let mut render_cap = viewport.render_node_cap;
        if ui
            .add(
                egui::Slider::new(&mut render_cap, RENDER_NODE_CAP_RANGE)
                    .logarithmic(true)
                    .text("Max rendered nodes"),
            )
            .on_hover_text("Nodes drawn per frame; the rest are sampled out.")
            .changed()
        {
            self.session.store_mut().set_max_render_nodes(render_cap);
        }

        let mut show_partition = self.session.engine().show_partition();
        if ui
            .checkbox(&mut show_partition, "Show quadtree overlay")
            .on_hover_text("Draw the active quadtree partitions over the graph canvas.")
            .changed()
        {
            self.session
                .engine_mut()
                .set_partition_overlay(show_partition);
        }

        ui.checkbox(&mut self.show_fps_bar, "FPS Display")
            .on_hover_text("Show a live FPS readout in the header.");

        let current_locale = self.session.store().state().locale;
        let mut locale = current_locale;
        ui.horizontal(|ui| {
            ui.label("Language");
            for option in [Locale::En, Locale::Pl] {
                ui.selectable_value(&mut locale, option, option.label());
            }
        });
        if locale != current_locale {
            self.session.store_mut().set_locale(locale);
        }

        let current_contrast = self.session.store().state().contrast;
        let mut contrast = current_contrast;
        egui::ComboBox::from_label("Contrast")
            .selected_text(contrast.label())
            .show_ui(ui, |ui| {
                for mode in ContrastMode::ALL {
                    ui.selectable_value(&mut contrast, mode, mode.label());
                }
            })
            .response
            .on_hover_text("High-contrast colour schemes for the graph canvas.");
        if contrast != current_contrast {
            self.session.store_mut().set_contrast(contrast);
        }
    }

    fn draw_focus_controls(&mut self, ui: &mut Ui) {
        ui.label("Find node")
            .on_hover_text("Moves keyboard focus to the best matching node.");
        let find_response = ui.text_edit_singleline(&mut self.find_query);
        if find_response.changed() {
            let found = self
                .session
                .focus_mut()
                .find(&self.find_query)
                .map(str::to_owned);
            if let Some(id) = found {
                self.session.focus_node(&id);
            }
        }

        let mut include_relationships = self.session.focus().includes_relationships();
        if ui
            .checkbox(&mut include_relationships, "Relationships in focus order")
            .on_hover_text("Tab also visits relationships after the nodes.")
            .changed()
        {
            self.session.set_focus_relationships(include_relationships);
        }
        ui.small("Click the graph, then use Tab, arrows, Enter, E and Escape. H lists the keys.");
    }

    fn draw_transfer_controls(&mut self, ui: &mut Ui) {
        egui::CollapsingHeader::new("Export / import")
            .default_open(false)
            .show(ui, |ui| {
                ui.label("File (JSON)");
                ui.text_edit_singleline(&mut self.transfer_path);
                let path = Path::new(self.transfer_path.trim());

                ui.horizontal(|ui| {
                    if ui
                        .button("Export view")
                        .on_hover_text("Write the nodes and relationships now shown, with the filters.")
                        .clicked()
                    {
                        let export = self.session.export_render_set();
                        self.transfer_status = Some(match export.save(path) {
                            Ok(()) => format!(
                                "Exported {} nodes, {} relationships.",
                                export.metadata.node_count, export.metadata.relationship_count
                            ),
                            Err(error) => {
                                warn!(error = %format!("{error:#}"), "export failed");
                                format!("Export failed: {error:#}")
                            }
                        });
                    }

                    if ui
                        .button("Import")
                        .on_hover_text("Replace the graph with a previously exported file.")
                        .clicked()
                    {
                        self.transfer_status = Some(match import_path(path) {
                            Ok(imported) => {
                                let summary = format!(
                                    "Imported {} nodes, {} warnings.",
                                    imported.dataset.nodes.len(),
                                    imported.warnings.len()
                                );
                                self.search = imported.filters.search_term.clone();
                                self.session.import_graph(imported);
                                summary
                            }
                            Err(error) => {
                                warn!(error = %format!("{error:#}"), "import failed");
                                format!("Import failed: {error:#}")
                            }
                        });
                    }
                });

                if let Some(status) = &self.transfer_status {
                    ui.small(status.as_str());
                }
            });
    }
}
