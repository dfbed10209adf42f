//! Windowless frame loop over a [`CommandList`], for profiling runs and
//! smoke checks on machines without a display.

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use eframe::egui::{Pos2, Rect, Vec2};
use tracing::{debug, info};

use crate::engine::{CommandList, SimulationPhase};
use crate::knowledge::Dataset;
use crate::session::Session;
use crate::state::{GraphStore, PersistedSettings};

pub const DEFAULT_CANVAS: Vec2 = Vec2::new(1280.0, 800.0);

#[derive(Clone, Debug, PartialEq)]
pub struct HeadlessReport {
    pub frames: usize,
    pub nodes: usize,
    pub relationships: usize,
    pub drawn_nodes: usize,
    pub sampled_out: usize,
    /// First frame that ended with the layout settled, if any.
    pub settled_at: Option<usize>,
    pub average_frame: Duration,
    pub budget: String,
}

/// Drives `frames` frames of a fresh session and reports what the last one
/// drew.
pub fn run(
    dataset: Dataset,
    settings: PersistedSettings,
    frames: usize,
    canvas: Vec2,
) -> Result<HeadlessReport> {
    let mut session = Session::new(dataset, GraphStore::from_settings(settings));
    let mut surface = CommandList::new();
    let canvas = Rect::from_min_size(Pos2::ZERO, canvas);

    let mut settled_at = None;
    let mut total = Duration::ZERO;
    let mut last = None;
    for frame in 0..frames {
        let started = Instant::now();
        let stats = session
            .frame(&mut surface, canvas)
            .with_context(|| format!("headless frame {frame} failed"))?;
        total += started.elapsed();

        if settled_at.is_none() && session.engine().phase() == SimulationPhase::Settled {
            debug!(frame, ticks = session.engine().total_ticks(), "layout settled");
            settled_at = Some(frame);
        }
        last = Some(stats);
    }

    let graph = session.engine().graph();
    let report = HeadlessReport {
        frames,
        nodes: graph.len(),
        relationships: graph.edges().len(),
        drawn_nodes: last.map_or(0, |stats| stats.drawn_nodes),
        sampled_out: last.map_or(0, |stats| stats.sampled_out),
        settled_at,
        average_frame: total
            .checked_div(u32::try_from(frames.max(1)).unwrap_or(u32::MAX))
            .unwrap_or_default(),
        budget: session.engine().budget().fps().summary(),
    };

    info!(
        frames = report.frames,
        nodes = report.nodes,
        relationships = report.relationships,
        drawn = report.drawn_nodes,
        sampled_out = report.sampled_out,
        settled_at = ?report.settled_at,
        average_ms = report.average_frame.as_secs_f64() * 1000.0,
        "headless run finished"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge::SourceSpec;

    #[test]
    fn synthetic_run_draws_and_settles() {
        let dataset = SourceSpec::Synthetic(60).load().expect("synthetic data loads");
        let report = run(dataset, PersistedSettings::default(), 600, DEFAULT_CANVAS)
            .expect("headless run succeeds");

        assert_eq!(report.frames, 600);
        assert!(report.nodes > 0);
        assert!(report.drawn_nodes > 0);
        assert!(report.settled_at.is_some(), "layout never settled: {report:?}");
    }

    #[test]
    fn empty_dataset_runs_without_nodes() {
        let report = run(Dataset::default(), PersistedSettings::default(), 3, DEFAULT_CANVAS)
            .expect("headless run succeeds");

        assert_eq!(report.nodes, 0);
        assert_eq!(report.drawn_nodes, 0);
    }
}
