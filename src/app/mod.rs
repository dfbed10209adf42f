use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use eframe::egui::{self, Context};
use tracing::error;

use crate::knowledge::{Dataset, Locale, SourceSpec};
use crate::session::Session;
use crate::state::PersistedSettings;

mod graph;
mod ui;

/// Start-up options resolved from the command line.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub source: SourceSpec,
    pub settings_path: PathBuf,
    pub locale: Option<Locale>,
}

pub struct GrafApp {
    config: AppConfig,
    state: AppState,
    reload_rx: Option<Receiver<Result<Dataset, String>>>,
}

enum AppState {
    Loading {
        rx: Receiver<Result<Dataset, String>>,
    },
    Ready(Box<ViewModel>),
    Error(String),
}

struct ViewModel {
    session: Session,
    settings_path: PathBuf,
    saved_settings: PersistedSettings,
    settings_changed_at: Option<f64>,
    search: String,
    find_query: String,
    show_fps_bar: bool,
    dragging: Option<usize>,
    last_announcement: Option<String>,
    transfer_path: String,
    transfer_status: Option<String>,
}

impl GrafApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, config: AppConfig) -> Self {
        let state = Self::start_load(config.source.clone());
        Self {
            config,
            state,
            reload_rx: None,
        }
    }

    fn spawn_load(source: SourceSpec) -> Receiver<Result<Dataset, String>> {
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let result = source.load().map_err(|error| format!("{error:#}"));
            if let Err(message) = &result {
                error!(error = %message, "failed to load knowledge graph");
            }
            let _ = tx.send(result);
        });

        rx
    }

    fn start_load(source: SourceSpec) -> AppState {
        AppState::Loading {
            rx: Self::spawn_load(source),
        }
    }

    fn ready(&self, dataset: Dataset) -> AppState {
        AppState::Ready(Box::new(ViewModel::new(dataset, &self.config)))
    }
}

impl eframe::App for GrafApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        let mut transition = None;

        match &mut self.state {
            AppState::Loading { rx } => {
                match rx.try_recv() {
                    Ok(Ok(dataset)) => transition = Some(Ok(dataset)),
                    Ok(Err(error)) => transition = Some(Err(error)),
                    Err(TryRecvError::Empty) => {}
                    Err(TryRecvError::Disconnected) => {
                        transition = Some(Err("Background load worker disconnected".to_owned()));
                    }
                }

                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(120.0);
                        ui.heading("Loading knowledge graph...");
                        ui.add_space(8.0);
                        ui.spinner();
                    });
                });
                ctx.request_repaint();
            }
            AppState::Error(error) => {
                let mut retry = false;
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.heading("Failed to load the knowledge graph");
                    ui.add_space(6.0);
                    ui.label(error.as_str());
                    ui.add_space(10.0);
                    retry = ui.button("Retry").clicked();
                });
                if retry {
                    self.state = Self::start_load(self.config.source.clone());
                    return;
                }
            }
            AppState::Ready(model) => {
                let mut reload_requested = false;
                let is_reloading = self.reload_rx.is_some();
                model.show(ctx, &mut reload_requested, is_reloading);

                if reload_requested && self.reload_rx.is_none() {
                    self.reload_rx = Some(Self::spawn_load(self.config.source.clone()));
                }

                if let Some(rx) = self.reload_rx.take() {
                    match rx.try_recv() {
                        Ok(Ok(dataset)) => model.session.replace_dataset(dataset),
                        Ok(Err(error)) => transition = Some(Err(error)),
                        Err(TryRecvError::Empty) => {
                            self.reload_rx = Some(rx);
                        }
                        Err(TryRecvError::Disconnected) => {
                            transition =
                                Some(Err("Background load worker disconnected".to_owned()));
                        }
                    }
                }
            }
        }

        if let Some(outcome) = transition {
            self.reload_rx = None;
            self.state = match outcome {
                Ok(dataset) => self.ready(dataset),
                Err(error) => AppState::Error(error),
            };
        }
    }
}

impl Drop for ViewModel {
    fn drop(&mut self) {
        self.flush_settings();
    }
}
