use std::collections::VecDeque;
use std::time::Duration;

use tracing::{info, warn};

pub const FRAME_BUDGET: Duration = Duration::from_micros(16_667);
pub const MAX_SUBSTEPS: usize = 2;

const FPS_SAMPLE_WINDOW: usize = 180;
const DEGRADE_AFTER: usize = 12;
const RECOVER_AFTER: usize = 180;
const RECOVER_HEADROOM: f32 = 0.6;
const CAP_SCALE_STEP: f32 = 0.8;
const MIN_CAP_SCALE: f32 = 0.25;

/// Rolling frame-rate samples for the status bar.
#[derive(Clone, Debug, Default)]
pub struct FpsWindow {
    current: f32,
    samples: VecDeque<f32>,
}

impl FpsWindow {
    pub fn record(&mut self, frame_time: Duration) {
        let seconds = frame_time.as_secs_f32();
        if seconds <= f32::EPSILON {
            return;
        }

        self.current = (1.0 / seconds).clamp(0.0, 1000.0);
        self.samples.push_back(self.current);
        while self.samples.len() > FPS_SAMPLE_WINDOW {
            self.samples.pop_front();
        }
    }

    pub fn current(&self) -> f32 {
        self.current
    }

    pub fn average(&self) -> Option<f32> {
        (!self.samples.is_empty())
            .then(|| self.samples.iter().sum::<f32>() / self.samples.len() as f32)
    }

    pub fn low(&self) -> Option<f32> {
        self.samples.iter().copied().reduce(f32::min)
    }

    pub fn high(&self) -> Option<f32> {
        self.samples.iter().copied().reduce(f32::max)
    }

    pub fn frame_ms(&self) -> Option<f32> {
        (self.current > f32::EPSILON).then(|| 1000.0 / self.current)
    }

    pub fn summary(&self) -> String {
        let mut parts = vec![format!("FPS {:.0}", self.current)];
        if let Some(average) = self.average() {
            parts.push(format!("avg {average:.1}"));
        }
        if let Some(low) = self.low() {
            parts.push(format!("low {low:.0}"));
        }
        if let Some(high) = self.high() {
            parts.push(format!("high {high:.0}"));
        }
        if let Some(frame_ms) = self.frame_ms() {
            parts.push(format!("{frame_ms:.1} ms"));
        }
        parts.join(" | ")
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum BudgetAdjustment {
    Unchanged,
    FewerSubsteps(usize),
    SmallerRenderCap(f32),
    LargerRenderCap(f32),
    MoreSubsteps(usize),
}

/// Tracks frame cost against a fixed budget and decides how much work the
/// next frames may do. Substeps go first, the render cap second; recovery
/// happens in the opposite order.
#[derive(Clone, Debug)]
pub struct FrameBudget {
    target: Duration,
    substeps: usize,
    cap_scale: f32,
    over_streak: usize,
    under_streak: usize,
    fps: FpsWindow,
}

impl Default for FrameBudget {
    fn default() -> Self {
        Self::new(FRAME_BUDGET)
    }
}

impl FrameBudget {
    pub fn new(target: Duration) -> Self {
        Self {
            target,
            substeps: MAX_SUBSTEPS,
            cap_scale: 1.0,
            over_streak: 0,
            under_streak: 0,
            fps: FpsWindow::default(),
        }
    }

    pub fn target(&self) -> Duration {
        self.target
    }

    pub fn substeps(&self) -> usize {
        self.substeps
    }

    pub fn cap_scale(&self) -> f32 {
        self.cap_scale
    }

    pub fn fps(&self) -> &FpsWindow {
        &self.fps
    }

    /// Render cap after degradation; never below one node.
    pub fn effective_cap(&self, cap: usize) -> usize {
        ((cap as f32 * self.cap_scale).round() as usize).max(1)
    }

    pub fn record(&mut self, frame_time: Duration) -> BudgetAdjustment {
        self.fps.record(frame_time);

        if frame_time > self.target {
            self.under_streak = 0;
            self.over_streak += 1;
            if self.over_streak >= DEGRADE_AFTER {
                self.over_streak = 0;
                return self.degrade(frame_time);
            }
        } else {
            self.over_streak = 0;
            if frame_time.as_secs_f32() < self.target.as_secs_f32() * RECOVER_HEADROOM {
                self.under_streak += 1;
                if self.under_streak >= RECOVER_AFTER {
                    self.under_streak = 0;
                    return self.recover();
                }
            } else {
                self.under_streak = 0;
            }
        }
        BudgetAdjustment::Unchanged
    }

    fn degrade(&mut self, frame_time: Duration) -> BudgetAdjustment {
        if self.substeps > 1 {
            self.substeps -= 1;
            warn!(
                frame_ms = frame_time.as_secs_f32() * 1000.0,
                substeps = self.substeps,
                "frame budget exceeded, reducing physics substeps"
            );
            return BudgetAdjustment::FewerSubsteps(self.substeps);
        }

        if self.cap_scale > MIN_CAP_SCALE {
            self.cap_scale = (self.cap_scale * CAP_SCALE_STEP).max(MIN_CAP_SCALE);
            warn!(
                frame_ms = frame_time.as_secs_f32() * 1000.0,
                cap_scale = self.cap_scale,
                "frame budget exceeded, reducing render cap"
            );
            return BudgetAdjustment::SmallerRenderCap(self.cap_scale);
        }
        BudgetAdjustment::Unchanged
    }

    fn recover(&mut self) -> BudgetAdjustment {
        if self.cap_scale < 1.0 {
            self.cap_scale = (self.cap_scale / CAP_SCALE_STEP).min(1.0);
            info!(cap_scale = self.cap_scale, "frame budget recovered, raising render cap");
            return BudgetAdjustment::LargerRenderCap(self.cap_scale);
        }

        if self.substeps < MAX_SUBSTEPS {
            self.substeps += 1;
            info!(substeps = self.substeps, "frame budget recovered, adding physics substep");
            return BudgetAdjustment::MoreSubsteps(self.substeps);
        }
        BudgetAdjustment::Unchanged
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fps_window_is_bounded() {
        let mut fps = FpsWindow::default();
        for _ in 0..(FPS_SAMPLE_WINDOW + 40) {
            fps.record(Duration::from_millis(20));
        }
        assert_eq!(fps.samples.len(), FPS_SAMPLE_WINDOW);
        assert!((fps.current() - 50.0).abs() < 0.01);
        assert!(fps.summary().starts_with("FPS 50"));
    }

    #[test]
    fn isolated_slow_frames_do_not_degrade() {
        let mut budget = FrameBudget::default();
        for _ in 0..50 {
            budget.record(Duration::from_millis(30));
            budget.record(Duration::from_millis(5));
        }
        assert_eq!(budget.substeps(), MAX_SUBSTEPS);
        assert_eq!(budget.cap_scale(), 1.0);
    }

    #[test]
    fn recovery_restores_cap_before_substeps() {
        let mut budget = FrameBudget::default();
        for _ in 0..(DEGRADE_AFTER * 3) {
            budget.record(Duration::from_millis(40));
        }
        assert_eq!(budget.substeps(), 1);
        assert!(budget.cap_scale() < 1.0);

        let mut adjustments = Vec::new();
        for _ in 0..(RECOVER_AFTER * 6) {
            let adjustment = budget.record(Duration::from_millis(2));
            if adjustment != BudgetAdjustment::Unchanged {
                adjustments.push(adjustment);
            }
        }
        assert!(matches!(adjustments[0], BudgetAdjustment::LargerRenderCap(_)));
        assert_eq!(
            adjustments.last(),
            Some(&BudgetAdjustment::MoreSubsteps(MAX_SUBSTEPS))
        );
        assert_eq!(budget.cap_scale(), 1.0);
    }
}
