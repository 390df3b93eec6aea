//! Scaffolding shared by the `movies` and `episodes` commands

use crate::cache::TtlCache;
use crate::cli::args::{GlobalOptions, ReportFormat, ScanArgs};
use crate::cli::commands::report;
use crate::config::{self, Config, ConfigManager};
use crate::error::{ReelgapError, ReelgapResult, SourceError};
use crate::gaps::{progress, Library, LibraryKind, LibrarySource, ProgressSender};
use crate::sources::PlexClient;
use crate::stats::ScanStatistics;
use crate::ui::{self, ScanProgress, Status, TaskSpinner, UiContext};
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Per-invocation state for a scan command
pub struct ScanSession {
    pub ctx: UiContext,
    pub stats: Arc<ScanStatistics>,
    pub cache: TtlCache,
    pub format: ReportFormat,
    pub verbose: bool,
}

impl ScanSession {
    pub fn new(config: &Config, globals: GlobalOptions, args: &ScanArgs) -> Self {
        let enabled = config.cache.enabled && !globals.no_cache;
        if !enabled {
            debug!("Metadata cache disabled for this run");
        }

        let stats = Arc::new(ScanStatistics::new());
        stats.start();

        Self {
            ctx: UiContext::detect().with_quiet(globals.quiet),
            stats,
            cache: TtlCache::new(ConfigManager::cache_dir(config)).with_enabled(enabled),
            format: args.format,
            verbose: globals.verbose > 0,
        }
    }

    /// Whether stdout carries a JSON or CSV document
    pub fn machine_output(&self) -> bool {
        self.format != ReportFormat::Text
    }

    /// Status lines are suppressed in quiet mode and for machine output
    pub fn chatty(&self) -> bool {
        !self.ctx.is_quiet() && !self.machine_output()
    }

    /// Run a connection check behind a spinner
    pub async fn connect<F>(&self, service: &str, check: F) -> ReelgapResult<()>
    where
        F: Future<Output = Result<(), SourceError>>,
    {
        if !self.chatty() {
            return check.await.map_err(ReelgapError::from);
        }

        let mut spinner = TaskSpinner::new(&self.ctx);
        spinner.start(&format!("Connecting to {}...", service));
        match check.await {
            Ok(()) => {
                spinner.stop(&format!("Connected to {}", service));
                Ok(())
            }
            Err(e) => {
                spinner.stop_error(&e.friendly_message());
                Err(e.into())
            }
        }
    }

    /// Libraries to scan.
    ///
    /// Returns an empty list after printing the available libraries when
    /// none were requested. Unknown names are an error.
    pub async fn resolve_libraries(
        &self,
        plex: &PlexClient,
        requested: &[String],
        kind: LibraryKind,
        command: &str,
    ) -> ReelgapResult<Vec<String>> {
        let all = plex
            .list_libraries()
            .await
            .map_err(ReelgapError::LibraryUnavailable)?;
        let available: Vec<&Library> = all.iter().filter(|l| l.kind == kind).collect();
        let label = kind_label(kind);

        if requested.is_empty() {
            report::list_libraries(&self.ctx, &available, label, command);
            return Ok(Vec::new());
        }

        for name in requested {
            if !available.iter().any(|l| &l.title == name) {
                report::list_libraries(&self.ctx, &available, label, command);
                return Err(ReelgapError::LibraryNotFound(name.clone()));
            }
        }
        Ok(requested.to_vec())
    }

    /// Start the progress consumer for one library scan
    pub fn start_progress(&self) -> (ProgressSender, JoinHandle<()>) {
        let (tx, rx) = progress::channel();
        let consumer = ScanProgress::new(&self.ctx, self.stats.clone()).spawn(rx);
        (tx, consumer)
    }

    /// Banner shown before each library when several are scanned
    pub fn announce(&self, library: &str, count: usize) {
        info!(library, "Scanning library");
        if count > 1 && self.chatty() {
            ui::section(&self.ctx, &format!("Scanning library: {}", library));
        }
    }

    /// Print the statistics block in verbose text mode
    pub fn finish(&self) {
        self.stats.stop();
        if self.verbose && self.chatty() {
            report::print_statistics(&self.ctx, &self.stats);
        }
    }
}

fn kind_label(kind: LibraryKind) -> &'static str {
    match kind {
        LibraryKind::Movie => "movie",
        LibraryKind::Show => "TV",
        LibraryKind::Other => "other",
    }
}

/// Directory saved CSV reports go to
pub fn output_dir(args: &ScanArgs) -> ReelgapResult<PathBuf> {
    match &args.output_dir {
        Some(dir) => Ok(dir.clone()),
        None => std::env::current_dir().map_err(|e| ReelgapError::io("getting current directory", e)),
    }
}

/// Validate configuration and connections without scanning.
///
/// Problems with keys under `unused_section` (the metadata service the
/// command does not talk to) are ignored.
pub async fn dry_run<F>(
    session: &ScanSession,
    config: &Config,
    unused_section: &str,
    connect: F,
) -> ReelgapResult<()>
where
    F: Future<Output = ReelgapResult<()>>,
{
    let ctx = &session.ctx;
    ui::banner(ctx, "reelgap dry run");

    let prefix = format!("{}.", unused_section);
    let issues: Vec<String> = config::validate(config)
        .into_iter()
        .filter(|issue| !issue.starts_with(&prefix))
        .collect();
    if !issues.is_empty() {
        for issue in &issues {
            ui::status(ctx, Status::Fail, issue);
        }
        ui::verdict(ctx, Status::Warn, "Configuration has problems");
        return Err(ReelgapError::User(format!(
            "{} configuration problem(s) found",
            issues.len()
        )));
    }
    ui::status(ctx, Status::Ok, "Configuration is valid");

    connect.await?;

    ui::field(
        ctx,
        "Cache",
        &if session.cache.is_enabled() {
            session.cache.root().display().to_string()
        } else {
            "disabled".to_string()
        },
    );
    ui::verdict(ctx, Status::Ok, "Ready to scan");
    Ok(())
}
