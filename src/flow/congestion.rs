//! Congestion-control state for a sending flow: TCP Tahoe or FAST TCP.

use crate::constants::MIN_WINDOW;

#[derive(Debug, Clone)]
pub enum CongestionControl {
    Tahoe(Tahoe),
    Fast(Fast),
}

#[derive(Debug, Clone)]
pub struct Tahoe {
    pub ssthresh: f64,
    pub is_ca: bool,
}

impl Tahoe {
    pub fn new() -> Self {
        Tahoe { ssthresh: 64.0, is_ca: false }
    }

    /// Applies one segment's worth of AIMD growth.
    pub fn on_segment_acked(&mut self, window: &mut f64) {
        if self.is_ca {
            *window += 1.0 / *window;
        } else {
            *window += 1.0;
        }
        if *window >= self.ssthresh {
            self.is_ca = true;
        }
    }

    pub fn on_loss(&mut self, window: &mut f64) {
        self.ssthresh = (*window / 2.0).max(2.0);
        *window = MIN_WINDOW;
        self.is_ca = false;
    }
}

#[derive(Debug, Clone)]
pub struct Fast {
    pub alpha: f64,
    pub fast_interval_ms: f64,
    pub base_rtt_ms: Option<f64>,
}

impl Fast {
    pub fn new(alpha: f64, fast_interval_ms: f64) -> Self {
        Fast { alpha, fast_interval_ms, base_rtt_ms: None }
    }

    pub fn on_rtt_sample(&mut self, rtt_ms: f64) {
        self.base_rtt_ms = Some(self.base_rtt_ms.map_or(rtt_ms, |b| b.min(rtt_ms)));
    }

    /// `window := window * base_rtt/rtt_latest + alpha`, run on each `FastTimer` tick.
    pub fn update_window(&self, window: &mut f64, rtt_latest_ms: f64) {
        let Some(base_rtt) = self.base_rtt_ms else { return };
        if rtt_latest_ms <= 0.0 {
            return;
        }
        *window = (*window * base_rtt / rtt_latest_ms + self.alpha).max(MIN_WINDOW);
    }
}

impl CongestionControl {
    pub fn tahoe() -> Self {
        CongestionControl::Tahoe(Tahoe::new())
    }

    pub fn fast(alpha: f64, fast_interval_ms: f64) -> Self {
        CongestionControl::Fast(Fast::new(alpha, fast_interval_ms))
    }

    pub fn record_rtt_sample(&mut self, rtt_ms: f64) {
        if let CongestionControl::Fast(f) = self {
            f.on_rtt_sample(rtt_ms);
        }
    }
}

pub const DEFAULT_FAST_ALPHA: f64 = 2.0;
pub const DEFAULT_FAST_INTERVAL_MS: f64 = 20.0;
