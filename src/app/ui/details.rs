use eframe::egui::{self, RichText, Ui};

use crate::a11y::FocusKind;
use crate::knowledge::Locale;

use super::super::ViewModel;

const MAX_LISTED_ISSUES: usize = 50;

impl ViewModel {
    pub(in crate::app) fn draw_details(&mut self, ui: &mut Ui) {
        ui.heading("Selection Details");
        ui.add_space(6.0);

        if let Some(description) = self.session.focus().description() {
            ui.label(RichText::new("Focused").strong());
            ui.label(description);
            ui.separator();
        }

        let Some(index) = self.detail_node_index() else {
            ui.label("Select a node from the graph, or focus one with the keyboard.");
            self.draw_diagnostics(ui);
            return;
        };

        egui::ScrollArea::vertical()
            .id_salt("details_scroll")
            .auto_shrink([false, false])
            .show(ui, |ui| {
                self.draw_node_details(ui, index);
                self.draw_selection_list(ui);
                self.draw_diagnostics(ui);
            });
    }

    /// The focused node wins over the selection.
    fn detail_node_index(&self) -> Option<usize> {
        let graph = self.session.engine().graph();
        let focused = self
            .session
            .focus()
            .focused_entry()
            .filter(|entry| entry.kind == FocusKind::Node)
            .and_then(|entry| graph.node_index(&entry.id));
        focused.or_else(|| {
            self.session
                .store()
                .state()
                .selected
                .iter()
                .find_map(|id| graph.node_index(id))
        })
    }

    fn draw_node_details(&mut self, ui: &mut Ui, index: usize) {
        let state = self.session.store().snapshot();
        let locale = state.locale;
        let graph = self.session.engine().graph();
        let Some(node) = graph.node(index) else {
            return;
        };
        let meta = node.meta().clone();

        let relationships = graph
            .incident_edges(index)
            .iter()
            .map(|&edge_index| {
                let edge = &graph.edges()[edge_index];
                let other = if edge.source == index {
                    edge.target
                } else {
                    edge.source
                };
                let source = graph.nodes()[edge.source].meta().display_name(locale);
                let target = graph.nodes()[edge.target].meta().display_name(locale);
                let label = format!(
                    "{source} {} {target} ({:.0}%)",
                    edge.meta.relationship_type.verb(locale),
                    edge.meta.strength * 100.0
                );
                (graph.nodes()[other].id().to_owned(), label, edge.meta.mechanism.clone())
            })
            .collect::<Vec<_>>();

        let supplement = self
            .session
            .payload()
            .supplements
            .iter()
            .find(|supplement| supplement.id == meta.id)
            .cloned();

        ui.label(RichText::new(meta.display_name(locale)).strong());
        if locale == Locale::En && !meta.localized_name.is_empty() {
            ui.small(meta.localized_name.as_str());
        } else if locale == Locale::Pl && !meta.localized_name.is_empty() {
            ui.small(meta.name.as_str());
        }
        ui.small(meta.id.as_str());
        ui.add_space(6.0);

        ui.label(format!("Type: {}", meta.node_type.label(locale)));
        ui.label(format!("Evidence: {}", meta.evidence_level.label(locale)));
        if !meta.category.is_empty() {
            ui.label(format!("Category: {}", meta.category));
        }
        ui.label(format!("Importance: {:.2}", meta.importance));
        if !meta.description.is_empty() {
            ui.add_space(4.0);
            ui.label(meta.description.as_str());
        }
        if !meta.tags.is_empty() {
            ui.small(format!("Tags: {}", meta.tags.join(", ")));
        }

        ui.add_space(6.0);
        let is_selected = state.is_selected(&meta.id);
        let is_expanded = state.expanded.contains(&meta.id);
        let mut toggle_selection = false;
        let mut toggle_expansion = false;
        ui.horizontal(|ui| {
            let select_label = if is_selected { "Deselect" } else { "Select" };
            toggle_selection = ui.button(select_label).clicked();
            let expand_label = if is_expanded { "Collapse" } else { "Expand" };
            toggle_expansion = ui
                .button(expand_label)
                .on_hover_text("Expanded nodes always show their label.")
                .clicked();
        });
        if toggle_selection {
            self.session.store_mut().toggle_select_node(&meta.id);
        }
        if toggle_expansion {
            if is_expanded {
                self.session.store_mut().collapse_node(&meta.id);
            } else {
                self.session.store_mut().expand_node(&meta.id);
            }
        }

        if let Some(supplement) = supplement {
            ui.separator();
            ui.label(RichText::new("Supplement").strong());
            ui.label(format!(
                "Evidence: {}",
                supplement.evidence_level.label(locale)
            ));
            if !supplement.category.is_empty() {
                ui.label(format!("Category: {}", supplement.category));
            }
            if !supplement.active_compounds.is_empty() {
                ui.label(format!(
                    "Active compounds: {}",
                    supplement.active_compounds.join(", ")
                ));
            }
        }

        ui.separator();
        ui.label(RichText::new(format!("Relationships ({})", relationships.len())).strong());
        if relationships.is_empty() {
            ui.label("No relationships in the current view.");
        }
        let mut focus_target = None;
        for (other_id, label, mechanism) in &relationships {
            let link = ui.link(label.as_str());
            let link = if mechanism.is_empty() {
                link
            } else {
                link.on_hover_text(mechanism.as_str())
            };
            if link.clicked() {
                focus_target = Some(other_id.clone());
            }
        }
        if let Some(id) = focus_target {
            self.session.focus_node(&id);
        }
    }

    fn draw_selection_list(&mut self, ui: &mut Ui) {
        let state = self.session.store().snapshot();
        if state.selected.is_empty() {
            return;
        }

        ui.separator();
        ui.horizontal(|ui| {
            ui.label(RichText::new(format!("Selected ({})", state.selected.len())).strong());
            if ui.small_button("Clear").clicked() {
                self.session.store_mut().clear_selected_nodes();
            }
        });

        let mut focus_target = None;
        let graph = self.session.engine().graph();
        for id in &state.selected {
            let name = graph
                .node_index(id)
                .map(|index| graph.nodes()[index].meta().display_name(state.locale))
                .unwrap_or(id.as_str());
            if ui.link(name).clicked() {
                focus_target = Some(id.clone());
            }
        }
        if let Some(id) = focus_target {
            self.session.focus_node(&id);
        }
    }

    fn draw_diagnostics(&self, ui: &mut Ui) {
        let diagnostics = &self.session.payload().diagnostics;
        if diagnostics.is_empty() {
            return;
        }

        ui.separator();
        egui::CollapsingHeader::new(format!("Data issues ({})", diagnostics.len()))
            .default_open(false)
            .show(ui, |ui| {
                for issue in diagnostics.iter().take(MAX_LISTED_ISSUES) {
                    ui.small(issue.to_string());
                }
                if diagnostics.len() > MAX_LISTED_ISSUES {
                    ui.small(format!(
                        "... and {} more",
                        diagnostics.len() - MAX_LISTED_ISSUES
                    ));
                }
            });
    }
}
