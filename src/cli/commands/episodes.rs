//! Episodes command - find episodes missing from TVDB series

use crate::cli::args::{EpisodesArgs, GlobalOptions, ReportFormat};
use crate::cli::commands::report;
use crate::cli::commands::scan::{self, ScanSession};
use crate::config::Config;
use crate::error::ReelgapResult;
use crate::gaps::{EpisodeGapFinder, EpisodePolicy, LibraryKind};
use crate::sources::{PlexClient, TvdbClient};
use crate::ui;
use chrono::Local;
use std::sync::Arc;

/// Execute the episodes command
pub async fn execute(
    args: EpisodesArgs,
    config: &Config,
    globals: GlobalOptions,
) -> ReelgapResult<()> {
    let session = ScanSession::new(config, globals, &args.scan);

    if args.scan.dry_run {
        return scan::dry_run(&session, config, "tmdb", async {
            let plex = PlexClient::from_config(config, session.stats.clone())?;
            session.connect("Plex", plex.test_connection()).await?;
            let tvdb = TvdbClient::from_config(config, session.cache.clone(), session.stats.clone())?;
            session.connect("TVDB", tvdb.test_connection()).await
        })
        .await;
    }

    let plex = Arc::new(PlexClient::from_config(config, session.stats.clone())?);
    session.connect("Plex", plex.test_connection()).await?;

    let libraries = session
        .resolve_libraries(&plex, &args.scan.libraries, LibraryKind::Show, "episodes")
        .await?;
    if libraries.is_empty() {
        return Ok(());
    }

    let tvdb = Arc::new(TvdbClient::from_config(
        config,
        session.cache.clone(),
        session.stats.clone(),
    )?);
    session.connect("TVDB", tvdb.test_connection()).await?;

    let policy = policy_for(config, &args);

    for library in &libraries {
        session.announce(library, libraries.len());

        let (progress, consumer) = session.start_progress();
        let finder = EpisodeGapFinder::new(plex.clone(), tvdb.clone(), policy.clone())
            .with_progress(progress);
        let result = finder.find_gaps(library).await;
        drop(finder);
        consumer.await.ok();
        let report = result?;

        match session.format {
            ReportFormat::Json => report::print_json(&report::episodes_json(&report))?,
            ReportFormat::Csv => report::write_episodes_csv(&report, report::stdout())?,
            ReportFormat::Text => {
                report::episodes_text(&session.ctx, &report, session.verbose);
                if !args.scan.no_csv && !report.shows_with_gaps.is_empty() {
                    let name = report::csv_file_name(library, "episode", Local::now().date_naive());
                    let path = report::save_csv(&scan::output_dir(&args.scan)?, &name, |file| {
                        report::write_episodes_csv(&report, file)
                    })?;
                    ui::remark(&session.ctx, &format!("CSV saved to {}", path.display()));
                }
            }
        }
    }

    session.finish();
    Ok(())
}

/// Config policy with command-line overrides applied
fn policy_for(config: &Config, args: &EpisodesArgs) -> EpisodePolicy {
    let mut policy = EpisodePolicy::from_config(config);
    if args.scan.include_future {
        policy.include_future = true;
    }
    if args.include_specials {
        policy.include_specials = true;
    }
    if let Some(hours) = args.recent_threshold {
        policy.recent_threshold_hours = hours;
    }
    policy.excluded_shows.extend(args.exclude_shows.iter().cloned());
    policy
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::args::{Cli, Commands};
    use clap::Parser;

    fn episodes_args(argv: &[&str]) -> EpisodesArgs {
        let mut full = vec!["reelgap", "episodes"];
        full.extend_from_slice(argv);
        match Cli::parse_from(full).command {
            Commands::Episodes(args) => args,
            _ => panic!("expected Episodes command"),
        }
    }

    #[test]
    fn flags_override_config_policy() {
        let config = Config::default();
        let policy = policy_for(
            &config,
            &episodes_args(&[
                "--include-specials",
                "--recent-threshold",
                "0",
                "--exclude-show",
                "Lost",
            ]),
        );

        assert!(policy.include_specials);
        assert!(!policy.include_future);
        assert_eq!(policy.recent_threshold_hours, 0);
        assert!(policy.is_excluded("Lost"));
    }

    #[test]
    fn config_policy_kept_without_flags() {
        let mut config = Config::default();
        config.options.exclude_specials = false;
        let policy = policy_for(&config, &episodes_args(&[]));
        assert!(policy.include_specials);
        assert_eq!(policy, EpisodePolicy::from_config(&config));
    }
}
