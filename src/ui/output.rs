//! Status lines and report fragments on stdout
//!
//! Interactive terminals get `cliclack` log lines; pipes and CI get plain
//! `[OK]`/`[WARN]` tags so saved output stays greppable. Machine-readable
//! reports (JSON, CSV) are printed by the commands directly and never mixed
//! with these helpers.

use super::context::UiContext;
use super::theme::score_style;
use console::{style, StyledObject};

/// Outcome attached to a status line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    Warn,
    Fail,
    Info,
}

impl Status {
    fn tag(self) -> StyledObject<&'static str> {
        match self {
            Self::Ok => style("[OK]").green(),
            Self::Warn => style("[WARN]").yellow(),
            Self::Fail => style("[FAIL]").red(),
            Self::Info => style("[INFO]").cyan(),
        }
    }

    fn log(self, message: String) {
        let _ = match self {
            Self::Ok => cliclack::log::success(message),
            Self::Warn => cliclack::log::warning(message),
            Self::Fail => cliclack::log::error(message),
            Self::Info => cliclack::log::info(message),
        };
    }
}

/// Title line opening a multi-step command such as a dry run
pub fn banner(ctx: &UiContext, title: &str) {
    let title = style(title).magenta().bold();
    if ctx.use_fancy_output() {
        cliclack::intro(title).ok();
    } else {
        println!("{}\n", title);
    }
}

/// Closing line of a multi-step command
pub fn verdict(ctx: &UiContext, status: Status, message: &str) {
    if ctx.use_fancy_output() {
        let message = match status {
            Status::Ok => style(message).green().bold(),
            _ => style(message).yellow().bold(),
        };
        cliclack::outro(message).ok();
    } else {
        println!("\n{} {}", status.tag(), message);
    }
}

pub fn section(ctx: &UiContext, title: &str) {
    println!();
    if ctx.use_fancy_output() {
        cliclack::log::info(style(title).bold()).ok();
    } else {
        println!("{}", style(title).bold());
    }
}

/// One status line
pub fn status(ctx: &UiContext, status: Status, message: &str) {
    if ctx.use_fancy_output() {
        status.log(message.to_string());
    } else {
        println!("  {} {}", status.tag(), message);
    }
}

/// Status line followed by what to do about it
pub fn status_hint(ctx: &UiContext, status: Status, message: &str, hint: &str) {
    if ctx.use_fancy_output() {
        status.log(format!("{} - {}", message, style(hint).dim()));
    } else {
        println!("  {} {} - {}", status.tag(), message, hint);
    }
}

pub fn remark(ctx: &UiContext, message: &str) {
    if ctx.use_fancy_output() {
        cliclack::log::remark(message).ok();
    } else {
        println!("  {}", style(message).dim());
    }
}

/// Indented `label: value` line in a summary block
pub fn field(ctx: &UiContext, label: &str, value: &str) {
    if ctx.use_fancy_output() {
        println!("  {}: {}", style(label).dim(), value);
    } else {
        println!("  {}: {}", label, value);
    }
}

/// Summary line whose value is colored by how good `percent` is
pub fn field_scored(ctx: &UiContext, label: &str, value: &str, percent: f64) {
    if ctx.use_fancy_output() {
        println!(
            "  {}: {}",
            style(label).dim(),
            score_style(percent).apply_to(value)
        );
    } else {
        println!("  {}: {}", label, value);
    }
}

/// Heading for one incomplete collection or show, e.g.
/// `Alien Collection (2/4 - 50%)`
pub fn completion_heading(name: &str, owned: usize, total: usize, percent: f64) -> String {
    format!(
        "{} ({}/{} - {})",
        style(name).bold(),
        owned,
        total,
        score_style(percent).apply_to(format!("{:.0}%", percent))
    )
}

/// `1 expired entry`, `3 expired entries`
pub fn count_of(count: usize, singular: &str, plural: &str) -> String {
    format!("{} {}", count, if count == 1 { singular } else { plural })
}
