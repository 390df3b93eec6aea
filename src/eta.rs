//! Remaining-time estimation for scan progress
//!
//! Per-item durations are smoothed with an exponential moving average so
//! the estimate follows the current mix of cache hits and network calls
//! without jumping on individual spikes. State resets whenever the phase
//! or its total changes, since a new phase has a different per-item cost.

use std::time::{Duration, Instant};

/// Gaps at least this long are treated as pauses, not samples
const PAUSE_THRESHOLD: Duration = Duration::from_secs(30);

const ALMOST_DONE: &str = "Almost done...";
const CALCULATING: &str = "Calculating...";

/// Phase key of a progress label: `"Checking: Alien"` is `"Checking"`
pub fn phase_key(label: &str) -> &str {
    label.split_once(": ").map_or(label, |(key, _)| key)
}

/// Format seconds with precision that shrinks as the estimate grows
///
/// Negative input is treated as zero. Halfway values round to even, so
/// 85s reads `~1m 20s`.
pub fn format_seconds(seconds: f64) -> String {
    let seconds = seconds.max(0.0);

    if seconds < 10.0 {
        let s = (seconds.round_ties_even() as u64).max(1);
        format!("~{}s remaining", s)
    } else if seconds < 60.0 {
        let s = (((seconds / 5.0).round_ties_even() * 5.0) as u64).max(5);
        format!("~{}s remaining", s)
    } else if seconds < 3600.0 {
        let total = seconds as u64;
        let mut mins = total / 60;
        let mut secs = ((total % 60) as f64 / 10.0).round_ties_even() as u64 * 10;
        if secs == 60 {
            mins += 1;
            secs = 0;
        }
        if secs > 0 {
            format!("~{}m {}s remaining", mins, secs)
        } else {
            format!("~{}m remaining", mins)
        }
    } else {
        let total = seconds as u64;
        let hours = total / 3600;
        let mins = (total % 3600) / 60;
        if mins > 0 {
            format!("~{}h {}m remaining", hours, mins)
        } else {
            format!("~{}h remaining", hours)
        }
    }
}

/// EMA-based remaining-time estimator
#[derive(Debug, Clone)]
pub struct EtaEstimator {
    alpha: f64,
    min_samples: usize,
    min_update_interval: Duration,

    ema_duration: f64,
    samples: usize,
    last_tick: Option<Instant>,
    phase: String,
    total: Option<usize>,
    remaining: Option<f64>,
    last_render: Option<(Instant, String)>,
}

impl Default for EtaEstimator {
    fn default() -> Self {
        Self::new()
    }
}

impl EtaEstimator {
    /// Estimator with alpha 0.15, 5 warm-up samples and a 2s display throttle
    pub fn new() -> Self {
        Self {
            alpha: 0.15,
            min_samples: 5,
            min_update_interval: Duration::from_secs(2),
            ema_duration: 0.0,
            samples: 0,
            last_tick: None,
            phase: String::new(),
            total: None,
            remaining: None,
            last_render: None,
        }
    }

    pub fn with_min_samples(mut self, min_samples: usize) -> Self {
        self.min_samples = min_samples;
        self
    }

    pub fn with_min_update_interval(mut self, interval: Duration) -> Self {
        self.min_update_interval = interval;
        self
    }

    /// Forget everything, including the last rendered text
    pub fn reset(&mut self) {
        self.reset_phase();
        self.phase.clear();
        self.total = None;
        self.last_render = None;
    }

    fn reset_phase(&mut self) {
        self.ema_duration = 0.0;
        self.samples = 0;
        self.last_tick = None;
        self.remaining = None;
    }

    /// Record a progress tick now
    pub fn update(&mut self, label: &str, current: usize, total: Option<usize>) {
        self.update_at(label, current, total, Instant::now());
    }

    /// Record a progress tick observed at `now`
    pub fn update_at(&mut self, label: &str, current: usize, total: Option<usize>, now: Instant) {
        let key = phase_key(label);
        if key != self.phase || total != self.total {
            self.reset_phase();
            self.phase = key.to_string();
            self.total = total;
        }

        if let Some(last) = self.last_tick {
            let dt = now.saturating_duration_since(last);
            if dt < PAUSE_THRESHOLD {
                let dt = dt.as_secs_f64();
                self.ema_duration = if self.samples == 0 {
                    dt
                } else {
                    self.alpha * dt + (1.0 - self.alpha) * self.ema_duration
                };
                self.samples += 1;
            }
        }
        self.last_tick = Some(now);

        self.remaining = match total {
            Some(total) if total > 0 && self.samples >= self.min_samples => {
                Some(self.ema_duration * total.saturating_sub(current) as f64)
            }
            _ => None,
        };
    }

    /// Estimated seconds left, once enough samples exist
    pub fn remaining_seconds(&self) -> Option<f64> {
        self.remaining
    }

    /// Number of valid samples in the current phase
    pub fn samples(&self) -> usize {
        self.samples
    }

    /// Smoothed per-item duration in seconds
    pub fn ema_duration(&self) -> f64 {
        self.ema_duration
    }

    /// Display text, throttled to one change per update interval
    pub fn format_remaining(&mut self) -> String {
        self.format_remaining_at(Instant::now())
    }

    pub fn format_remaining_at(&mut self, now: Instant) -> String {
        let text = match self.remaining {
            None if self.samples == 0 => return String::new(),
            None => CALCULATING.to_string(),
            Some(remaining) if remaining < 1.0 => ALMOST_DONE.to_string(),
            Some(remaining) => format_seconds(remaining),
        };

        if let Some((rendered_at, shown)) = &self.last_render {
            if now.saturating_duration_since(*rendered_at) < self.min_update_interval {
                return shown.clone();
            }
        }

        self.last_render = Some((now, text.clone()));
        text
    }
}
