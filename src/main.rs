use std::path::PathBuf;

use anyhow::{Result, anyhow};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use graf_wiedzy::app::{AppConfig, GrafApp};
use graf_wiedzy::headless;
use graf_wiedzy::knowledge::{Locale, SourceSpec};
use graf_wiedzy::state::PersistedSettings;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Graph document (JSON). Defaults to the bundled sample graph.
    #[arg(long, conflicts_with = "synthetic")]
    data: Option<PathBuf>,

    /// Generate a synthetic graph with this many nodes instead.
    #[arg(long)]
    synthetic: Option<usize>,

    #[arg(long, default_value = "graf-wiedzy-settings.json")]
    settings: PathBuf,

    /// Overrides the saved display language.
    #[arg(long, value_enum)]
    locale: Option<Locale>,

    /// Run this many frames without a window and print a summary.
    #[arg(long, value_name = "FRAMES")]
    headless: Option<usize>,
}

impl Args {
    fn source(&self) -> SourceSpec {
        match (&self.data, self.synthetic) {
            (Some(path), _) => SourceSpec::Json(path.clone()),
            (None, Some(count)) => SourceSpec::Synthetic(count),
            (None, None) => SourceSpec::Bundled,
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("graf_wiedzy=info")),
        )
        .init();

    let args = Args::parse();
    let config = AppConfig {
        source: args.source(),
        settings_path: args.settings.clone(),
        locale: args.locale,
    };

    if let Some(frames) = args.headless {
        return run_headless(&config, frames);
    }

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1440.0, 920.0]),
        ..Default::default()
    };

    eframe::run_native(
        "graf wiedzy",
        options,
        Box::new(move |cc| Ok(Box::new(GrafApp::new(cc, config)))),
    )
    .map_err(|error| anyhow!("failed to run the graph window: {error}"))
}

fn run_headless(config: &AppConfig, frames: usize) -> Result<()> {
    let dataset = config.source.load()?;
    let mut settings = PersistedSettings::load_or_default(&config.settings_path);
    if let Some(locale) = config.locale {
        settings.locale = locale;
    }

    let report = headless::run(dataset, settings, frames, headless::DEFAULT_CANVAS)?;
    println!(
        "{} frames, {} nodes, {} relationships, drew {} ({} sampled out), settled at {}, {:.2} ms/frame",
        report.frames,
        report.nodes,
        report.relationships,
        report.drawn_nodes,
        report.sampled_out,
        report
            .settled_at
            .map_or_else(|| "never".to_owned(), |frame| format!("frame {frame}")),
        report.average_frame.as_secs_f64() * 1000.0,
    );
    if !report.budget.is_empty() {
        println!("{}", report.budget);
    }
    Ok(())
}
