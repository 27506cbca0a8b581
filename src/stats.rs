//! Acceptance statistics and progress reporting for a running chain.

use indicatif::{ProgressBar, ProgressStyle};
use std::collections::VecDeque;

/// Number of recent proposals the windowed acceptance rate is computed over.
pub const ACCEPTANCE_WINDOW: usize = 100;

/// Tracks overall and recent acceptance of Metropolis decisions.
#[derive(Debug, Clone, PartialEq)]
pub struct AcceptanceTracker {
    proposals: usize,
    accepted: usize,
    window: VecDeque<bool>,
    window_accepted: usize,
}

impl Default for AcceptanceTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl AcceptanceTracker {
    pub fn new() -> Self {
        Self {
            proposals: 0,
            accepted: 0,
            window: VecDeque::with_capacity(ACCEPTANCE_WINDOW),
            window_accepted: 0,
        }
    }

    pub fn record(&mut self, accepted: bool) {
        self.proposals += 1;
        self.accepted += accepted as usize;
        self.window.push_back(accepted);
        self.window_accepted += accepted as usize;
        if self.window.len() > ACCEPTANCE_WINDOW {
            if let Some(true) = self.window.pop_front() {
                self.window_accepted -= 1;
            }
        }
    }

    pub fn proposals(&self) -> usize {
        self.proposals
    }

    pub fn accepted(&self) -> usize {
        self.accepted
    }

    /// Fraction of all proposals accepted so far, 0 before the first one.
    pub fn acceptance_rate(&self) -> f64 {
        if self.proposals == 0 {
            0.0
        } else {
            self.accepted as f64 / self.proposals as f64
        }
    }

    /// Acceptance rate over the last [`ACCEPTANCE_WINDOW`] proposals.
    pub fn recent_acceptance_rate(&self) -> f64 {
        if self.window.is_empty() {
            0.0
        } else {
            self.window_accepted as f64 / self.window.len() as f64
        }
    }
}

/// Receives progress notifications from the sampler.
///
/// `()` is the silent implementation.
pub trait Progress {
    /// Called once before the first proposal.
    fn start(&mut self, _total_proposals: usize) {}

    /// Called after every completed proposal with the statistics so far.
    fn update(&mut self, _acceptance: &AcceptanceTracker) {}

    /// Called once after the final flush, also when the run was interrupted.
    fn finish(&mut self, _acceptance: &AcceptanceTracker, _interrupted: bool) {}
}

impl Progress for () {}

/// Terminal progress bar showing the recent acceptance rate.
#[derive(Debug, Default)]
pub struct IndicatifProgress {
    pb: Option<ProgressBar>,
}

impl IndicatifProgress {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Progress for IndicatifProgress {
    fn start(&mut self, total_proposals: usize) {
        let pb = ProgressBar::new(total_proposals as u64);
        if let Ok(style) =
            ProgressStyle::default_bar().template("{prefix:8} {bar:40.white} ETA {eta:3} | {msg}")
        {
            pb.set_style(style.progress_chars("=>-"));
        }
        pb.set_prefix("HMC");
        self.pb = Some(pb);
    }

    fn update(&mut self, acceptance: &AcceptanceTracker) {
        if let Some(pb) = &self.pb {
            pb.inc(1);
            pb.set_message(format!(
                "p(accept)≈{:.2}",
                acceptance.recent_acceptance_rate()
            ));
        }
    }

    fn finish(&mut self, acceptance: &AcceptanceTracker, interrupted: bool) {
        if let Some(pb) = self.pb.take() {
            let status = if interrupted { "Interrupted" } else { "Done!" };
            pb.finish_with_message(format!(
                "{status} p(accept)≈{:.2}",
                acceptance.acceptance_rate()
            ));
        }
    }
}
