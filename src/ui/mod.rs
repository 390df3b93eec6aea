//! UI module for consistent CLI output
//!
//! Uses `cliclack` for prompts and status lines and `indicatif` for scan
//! progress, with automatic fallback to plain output in CI and
//! non-interactive environments.
//!
//! # Example
//!
//! ```rust,ignore
//! use reelgap::ui::{self, ScanProgress, UiContext};
//!
//! let ctx = UiContext::detect().with_quiet(cli.quiet);
//! let (tx, rx) = reelgap::gaps::progress::channel();
//! let consumer = ScanProgress::new(&ctx, stats.clone()).spawn(rx);
//!
//! let report = finder.with_progress(tx).find_gaps("Movies").await?;
//! consumer.await.ok();
//!
//! ui::verdict(&ctx, ui::Status::Ok, "Scan complete");
//! ```

mod context;
mod output;
mod progress;
mod prompts;
mod theme;

pub use context::UiContext;
pub use output::{
    banner, completion_heading, count_of, field, field_scored, remark, section, status,
    status_hint, verdict, Status,
};
pub use progress::{ScanProgress, TaskSpinner};
pub use prompts::confirm;
pub use theme::{init_theme, ReelgapTheme};
