use eframe::egui::{self, Align, Context, Layout};
use tracing::warn;

use crate::session::Session;
use crate::state::{GraphStore, PersistedSettings};

use super::super::{AppConfig, ViewModel};
use crate::knowledge::Dataset;

/// Seconds the persisted subset must stay unchanged before it is written.
const SETTINGS_SAVE_DELAY_SECS: f64 = 1.0;
const DEFAULT_EXPORT_PATH: &str = "graf-wiedzy-export.json";

impl ViewModel {
    pub(in crate::app) fn new(dataset: Dataset, config: &AppConfig) -> Self {
        let mut settings = PersistedSettings::load_or_default(&config.settings_path);
        if let Some(locale) = config.locale {
            settings.locale = locale;
        }
        let saved_settings = settings.clone();
        let search = settings.filters.search_term.clone();

        Self {
            session: Session::new(dataset, GraphStore::from_settings(settings)),
            settings_path: config.settings_path.clone(),
            saved_settings,
            settings_changed_at: None,
            search,
            find_query: String::new(),
            show_fps_bar: true,
            dragging: None,
            last_announcement: None,
            transfer_path: DEFAULT_EXPORT_PATH.to_owned(),
            transfer_status: None,
        }
    }

    pub(in crate::app) fn show(
        &mut self,
        ctx: &Context,
        reload_requested: &mut bool,
        is_loading: bool,
    ) {
        let locale = self.session.store().state().locale;

        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("graf wiedzy");
                    ui.separator();
                    let dataset = self.session.dataset();
                    ui.label(format!("nodes: {}", dataset.nodes.len()));
                    ui.label(format!("relationships: {}", dataset.relationships.len()));
                    ui.label(format!("supplements: {}", dataset.supplements.len()));
                    let reload_button =
                        ui.add_enabled(!is_loading, egui::Button::new("Reload data"));
                    if reload_button.clicked() {
                        *reload_requested = true;
                    }
                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        if let Some(render_set_text) = self.render_set_text() {
                            ui.label(render_set_text);
                        }
                        if let Some(fps_text) = self.fps_display_text() {
                            ui.label(fps_text);
                        }
                    });
                });
            });

        egui::TopBottomPanel::bottom("announcements")
            .resizable(false)
            .show(ctx, |ui| self.draw_status(ui, locale));

        egui::SidePanel::left("controls")
            .resizable(true)
            .default_width(330.0)
            .show(ctx, |ui| self.draw_controls(ui));

        egui::SidePanel::right("details")
            .resizable(true)
            .default_width(340.0)
            .show(ctx, |ui| self.draw_details(ui));

        egui::CentralPanel::default().show(ctx, |ui| self.draw_graph(ui));

        let now = ctx.input(|input| input.time);
        self.persist_settings_if_stable(now);
    }

    /// Writes the persisted subset once it has been stable for a moment.
    fn persist_settings_if_stable(&mut self, now: f64) {
        let current = self.session.store().state().persisted();
        if current == self.saved_settings {
            self.settings_changed_at = None;
            return;
        }

        let changed_at = *self.settings_changed_at.get_or_insert(now);
        if now - changed_at >= SETTINGS_SAVE_DELAY_SECS {
            self.save_settings(current);
        }
    }

    pub(in crate::app) fn flush_settings(&mut self) {
        let current = self.session.store().state().persisted();
        if current != self.saved_settings {
            self.save_settings(current);
        }
    }

    fn save_settings(&mut self, settings: PersistedSettings) {
        if let Err(error) = settings.save(&self.settings_path) {
            warn!(error = %format!("{error:#}"), "failed to save settings");
        }
        self.saved_settings = settings;
        self.settings_changed_at = None;
    }
}
