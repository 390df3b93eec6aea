//! Progress indicators with CI fallback

use super::context::UiContext;
use crate::eta::{phase_key, EtaEstimator};
use crate::gaps::ProgressEvent;
use crate::stats::ScanStatistics;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;

/// A task spinner with CI fallback
pub struct TaskSpinner {
    spinner: Option<cliclack::ProgressBar>,
    interactive: bool,
}

impl TaskSpinner {
    /// Create a new spinner (shows immediately in interactive mode)
    pub fn new(ctx: &UiContext) -> Self {
        Self {
            spinner: None,
            interactive: ctx.use_fancy_output(),
        }
    }

    /// Start the spinner with a message
    pub fn start(&mut self, message: &str) {
        if self.interactive {
            let spinner = cliclack::spinner();
            spinner.start(message);
            self.spinner = Some(spinner);
        } else {
            println!("{} {}", style("...").dim(), message);
        }
    }

    /// Stop with success message
    pub fn stop(&mut self, message: &str) {
        if let Some(spinner) = self.spinner.take() {
            spinner.stop(message);
        } else {
            println!("{} {}", style("[OK]").green(), message);
        }
    }

    /// Stop with error message
    pub fn stop_error(&mut self, message: &str) {
        if let Some(spinner) = self.spinner.take() {
            spinner.error(message);
        } else {
            println!("{} {}", style("[FAIL]").red(), message);
        }
    }
}

/// Scan progress display fed by [`ProgressEvent`]s.
///
/// Interactive terminals get an indicatif bar with the remaining-time
/// estimate; plain mode prints one line per phase on stderr. Phase
/// changes are also recorded in the scan statistics.
pub struct ScanProgress {
    bar: Option<ProgressBar>,
    plain: bool,
    eta: EtaEstimator,
    phase: Option<String>,
    determinate: Option<bool>,
    stats: Arc<ScanStatistics>,
}

impl ScanProgress {
    pub fn new(ctx: &UiContext, stats: Arc<ScanStatistics>) -> Self {
        let bar = (ctx.show_progress() && ctx.use_fancy_output()).then(|| {
            let bar = ProgressBar::new(0);
            bar.enable_steady_tick(Duration::from_millis(120));
            bar
        });
        Self {
            bar,
            plain: ctx.show_progress() && !ctx.use_fancy_output(),
            eta: EtaEstimator::new(),
            phase: None,
            determinate: None,
            stats,
        }
    }

    /// Apply one progress event
    pub fn handle(&mut self, event: &ProgressEvent) {
        let phase = phase_key(&event.label).to_string();
        let phase_changed = self.phase.as_deref() != Some(phase.as_str());
        if phase_changed {
            self.stats.begin_phase(&phase);
        }
        self.stats.set_phase_items(event.current);

        self.eta.update(&event.label, event.current, event.total);
        let remaining = self.eta.format_remaining();

        if self.bar.is_some() {
            self.apply_style(event.total.is_some());
        }
        if let Some(bar) = &self.bar {
            if let Some(total) = event.total {
                bar.set_length(total as u64);
                bar.set_position(event.current as u64);
            }
            bar.set_prefix(phase.clone());
            let detail = event
                .label
                .split_once(": ")
                .map_or("", |(_, detail)| detail);
            if remaining.is_empty() {
                bar.set_message(detail.to_string());
            } else {
                bar.set_message(format!("{}  {}", detail, remaining));
            }
        } else if self.plain && phase_changed {
            match event.total {
                Some(total) => eprintln!("{} {} ({} items)", style("...").dim(), phase, total),
                None => eprintln!("{} {}", style("...").dim(), event.label),
            }
        }

        self.phase = Some(phase);
    }

    fn apply_style(&mut self, determinate: bool) {
        if self.determinate == Some(determinate) {
            return;
        }
        self.determinate = Some(determinate);
        let Some(bar) = &self.bar else {
            return;
        };

        let template = if determinate {
            "  {spinner:.magenta} {prefix:.bold} {bar:24.magenta/dim} {pos}/{len} {wide_msg:.dim}"
        } else {
            "  {spinner:.magenta} {prefix:.bold} {wide_msg:.dim}"
        };
        let bar_style = ProgressStyle::default_bar()
            .template(template)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ ")
            .progress_chars("━╸─");
        bar.set_style(bar_style);
    }

    /// Clear the bar and close the open phase
    pub fn finish(&self) {
        if let Some(bar) = &self.bar {
            bar.disable_steady_tick();
            bar.finish_and_clear();
        }
        self.stats.end_phase();
    }

    /// Drain `events` on a background task until every sender is dropped
    pub fn spawn(mut self, mut events: UnboundedReceiver<ProgressEvent>) -> JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                self.handle(&event);
            }
            self.finish();
        })
    }
}
