//! Movies command - find movies missing from TMDB collections

use crate::cli::args::{GlobalOptions, MoviesArgs, ReportFormat};
use crate::cli::commands::report;
use crate::cli::commands::scan::{self, ScanSession};
use crate::config::Config;
use crate::error::ReelgapResult;
use crate::gaps::{LibraryKind, MovieGapFinder, MoviePolicy};
use crate::sources::{PlexClient, TmdbClient};
use crate::ui;
use chrono::Local;
use std::sync::Arc;

/// Execute the movies command
pub async fn execute(args: MoviesArgs, config: &Config, globals: GlobalOptions) -> ReelgapResult<()> {
    let session = ScanSession::new(config, globals, &args.scan);

    if args.scan.dry_run {
        return scan::dry_run(&session, config, "tvdb", async {
            let plex = PlexClient::from_config(config, session.stats.clone())?;
            session.connect("Plex", plex.test_connection()).await?;
            let tmdb = TmdbClient::from_config(config, session.cache.clone(), session.stats.clone())?;
            session.connect("TMDB", tmdb.test_connection()).await
        })
        .await;
    }

    let plex = Arc::new(PlexClient::from_config(config, session.stats.clone())?);
    session.connect("Plex", plex.test_connection()).await?;

    let libraries = session
        .resolve_libraries(&plex, &args.scan.libraries, LibraryKind::Movie, "movies")
        .await?;
    if libraries.is_empty() {
        return Ok(());
    }

    let tmdb = Arc::new(TmdbClient::from_config(
        config,
        session.cache.clone(),
        session.stats.clone(),
    )?);
    session.connect("TMDB", tmdb.test_connection()).await?;

    let policy = policy_for(config, &args);

    for library in &libraries {
        session.announce(library, libraries.len());

        let (progress, consumer) = session.start_progress();
        let finder = MovieGapFinder::new(plex.clone(), tmdb.clone(), policy.clone())
            .with_progress(progress);
        let result = finder.find_gaps(library).await;
        // Dropping the finder closes the channel so the consumer finishes
        drop(finder);
        consumer.await.ok();
        let report = result?;

        match session.format {
            ReportFormat::Json => report::print_json(&report::movies_json(&report))?,
            ReportFormat::Csv => report::write_movies_csv(&report, report::stdout())?,
            ReportFormat::Text => {
                report::movies_text(&session.ctx, &report);
                if !args.scan.no_csv && !report.collections_with_gaps.is_empty() {
                    let name = report::csv_file_name(library, "movie", Local::now().date_naive());
                    let path = report::save_csv(&scan::output_dir(&args.scan)?, &name, |file| {
                        report::write_movies_csv(&report, file)
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
fn policy_for(config: &Config, args: &MoviesArgs) -> MoviePolicy {
    let mut policy = MoviePolicy::from_config(config);
    if args.scan.include_future {
        policy.include_future = true;
    }
    if let Some(size) = args.min_collection_size {
        policy.min_collection_size = size;
    }
    if let Some(owned) = args.min_owned {
        policy.min_owned = owned;
    }
    policy
        .excluded_collections
        .extend(args.exclude_collections.iter().cloned());
    policy
}
