//! Timing and counters for one scan
//!
//! Shared by the source clients (API calls, cache lookups) and the CLI
//! (phases). Handed around as `Arc<ScanStatistics>`.

use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// A completed scan phase
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhaseStats {
    pub name: String,
    pub duration: Duration,
    pub items: usize,
}

#[derive(Debug)]
struct OpenPhase {
    name: String,
    started: Instant,
    items: usize,
}

#[derive(Debug, Default)]
struct Timing {
    started: Option<Instant>,
    stopped: Option<Instant>,
    current: Option<OpenPhase>,
    phases: Vec<PhaseStats>,
    api_calls: BTreeMap<String, u64>,
}

/// Counters collected during a scan
#[derive(Debug, Default)]
pub struct ScanStatistics {
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
    inner: Mutex<Timing>,
}

impl ScanStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    fn timing(&self) -> std::sync::MutexGuard<'_, Timing> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn start(&self) {
        let mut timing = self.timing();
        timing.started = Some(Instant::now());
        timing.stopped = None;
    }

    /// Stop timing and close the open phase
    pub fn stop(&self) {
        let mut timing = self.timing();
        close_phase(&mut timing);
        timing.stopped = Some(Instant::now());
    }

    /// Wall time between `start` and `stop` (or now, while running)
    pub fn elapsed(&self) -> Duration {
        let timing = self.timing();
        match (timing.started, timing.stopped) {
            (Some(start), Some(stop)) => stop.saturating_duration_since(start),
            (Some(start), None) => start.elapsed(),
            _ => Duration::ZERO,
        }
    }

    /// Begin a phase; an open phase with a different name is ended first
    pub fn begin_phase(&self, name: &str) {
        let mut timing = self.timing();
        if timing.current.as_ref().is_some_and(|p| p.name == name) {
            return;
        }
        close_phase(&mut timing);
        timing.current = Some(OpenPhase {
            name: name.to_string(),
            started: Instant::now(),
            items: 0,
        });
    }

    /// Record items processed in the open phase
    pub fn set_phase_items(&self, items: usize) {
        if let Some(phase) = self.timing().current.as_mut() {
            phase.items = items;
        }
    }

    pub fn end_phase(&self) {
        close_phase(&mut self.timing());
    }

    pub fn phases(&self) -> Vec<PhaseStats> {
        self.timing().phases.clone()
    }

    pub fn record_api_call(&self, kind: &str) {
        *self.timing().api_calls.entry(kind.to_string()).or_default() += 1;
    }

    /// API calls by endpoint kind
    pub fn api_calls(&self) -> BTreeMap<String, u64> {
        self.timing().api_calls.clone()
    }

    pub fn total_api_calls(&self) -> u64 {
        self.timing().api_calls.values().sum()
    }

    pub fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_miss(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn cache_hits(&self) -> u64 {
        self.cache_hits.load(Ordering::Relaxed)
    }

    pub fn cache_misses(&self) -> u64 {
        self.cache_misses.load(Ordering::Relaxed)
    }

    /// Cache hit rate in percent; 0 when nothing was looked up
    pub fn cache_hit_rate(&self) -> f64 {
        let hits = self.cache_hits();
        let total = hits + self.cache_misses();
        if total == 0 {
            return 0.0;
        }
        hits as f64 / total as f64 * 100.0
    }
}

fn close_phase(timing: &mut Timing) {
    if let Some(phase) = timing.current.take() {
        timing.phases.push(PhaseStats {
            name: phase.name,
            duration: phase.started.elapsed(),
            items: phase.items,
        });
    }
}
