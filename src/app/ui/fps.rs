use eframe::egui::{RichText, Ui};

use crate::knowledge::Locale;

use super::super::ViewModel;

impl ViewModel {
    pub(in crate::app) fn fps_display_text(&self) -> Option<String> {
        if !self.show_fps_bar {
            return None;
        }

        let budget = self.session.engine().budget();
        let summary = budget.fps().summary();
        if summary.is_empty() {
            return None;
        }
        Some(format!(
            "{summary} | substeps {} | cap x{:.2}",
            budget.substeps(),
            budget.cap_scale()
        ))
    }

    pub(in crate::app) fn render_set_text(&self) -> Option<String> {
        let stats = self.session.last_stats()?;
        let graph = self.session.engine().graph();
        Some(format!(
            "drawn: {} / {} nodes, {} / {} relationships, {} sampled out | {}",
            stats.drawn_nodes,
            graph.len(),
            stats.drawn_edges,
            graph.edges().len(),
            stats.sampled_out,
            self.session.engine().phase().label(),
        ))
    }

    /// Bottom bar: the render-set summary and the latest announcement, the
    /// text channel assistive technology reads.
    pub(in crate::app) fn draw_status(&mut self, ui: &mut Ui, locale: Locale) {
        if let Some(message) = self.session.focus_mut().take_announcement() {
            self.last_announcement = Some(message);
        }

        ui.horizontal(|ui| {
            ui.label(self.session.focus().describe_render_set());
            if let Some(message) = &self.last_announcement {
                ui.separator();
                ui.label(RichText::new(message.as_str()).strong());
            }
            if self.session.focus().keyboard_navigation() {
                ui.separator();
                ui.small(match locale {
                    Locale::En => "keyboard navigation",
                    Locale::Pl => "nawigacja klawiaturą",
                });
            }
        });
    }
}
