use eframe::egui::{self, RichText, Sense, Ui, vec2};

use crate::engine::{EguiSurface, EngineError, SimulationPhase};

use super::super::ViewModel;

impl ViewModel {
    pub(in crate::app) fn draw_graph(&mut self, ui: &mut Ui) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());

        self.handle_graph_keys(ui, &response);
        self.handle_graph_zoom(ui, rect, &response);
        self.handle_graph_pan(&response);
        self.handle_graph_pointer(ui, &response);

        let painter = ui.painter_at(rect);
        let mut surface = EguiSurface::new(&painter);
        let frame = self.session.frame(&mut surface, rect);

        match frame {
            Ok(_) => {
                let moving = self.session.engine().phase() == SimulationPhase::Simulating;
                if moving || response.dragged() {
                    ui.ctx().request_repaint();
                }
            }
            Err(error) => self.draw_surface_banner(ui, rect, &error),
        }
    }

    /// Recoverable "rendering unavailable" state; the engine stays
    /// suspended until Retry.
    fn draw_surface_banner(&mut self, ui: &mut Ui, rect: egui::Rect, error: &EngineError) {
        let mut retry = false;
        let banner = egui::Rect::from_center_size(rect.center(), vec2(380.0, 96.0));
        ui.put(banner, |ui: &mut Ui| {
            ui.vertical_centered(|ui| {
                ui.label(RichText::new(error.to_string()).strong());
                ui.add_space(8.0);
                retry = ui.button("Retry").clicked();
            })
            .response
        });

        if retry {
            self.session.retry_surface();
            ui.ctx().request_repaint();
        }
    }
}
