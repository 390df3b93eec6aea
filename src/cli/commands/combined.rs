//! Scan command - movie collections first, then TV episodes

use crate::cli::args::{EpisodesArgs, GlobalOptions, MoviesArgs, ReportFormat, ScanArgs};
use crate::cli::commands::{episodes, movies};
use crate::config::Config;
use crate::error::{ReelgapError, ReelgapResult};
use crate::gaps::{Library, LibraryKind, LibrarySource};
use crate::sources::PlexClient;
use crate::stats::ScanStatistics;
use crate::ui::{self, UiContext};
use std::sync::Arc;
use tracing::debug;

/// Execute the scan command
pub async fn execute(args: ScanArgs, config: &Config, globals: GlobalOptions) -> ReelgapResult<()> {
    let ctx = UiContext::detect().with_quiet(globals.quiet);
    let chatty = !ctx.is_quiet() && args.format == ReportFormat::Text;

    // Named libraries go to the command matching their type
    let (movie_libraries, show_libraries) = if args.libraries.is_empty() || args.dry_run {
        (args.libraries.clone(), args.libraries.clone())
    } else {
        let plex = PlexClient::from_config(config, Arc::new(ScanStatistics::new()))?;
        let available = plex
            .list_libraries()
            .await
            .map_err(ReelgapError::LibraryUnavailable)?;
        split_libraries(&args.libraries, &available)?
    };

    let run_movies = args.libraries.is_empty() || args.dry_run || !movie_libraries.is_empty();
    let run_episodes = args.libraries.is_empty() || args.dry_run || !show_libraries.is_empty();

    if run_movies {
        if chatty {
            ui::section(&ctx, "Movie Collections");
        }
        let movies_args = MoviesArgs {
            scan: ScanArgs {
                libraries: movie_libraries,
                ..args.clone()
            },
            min_collection_size: None,
            min_owned: None,
            exclude_collections: Vec::new(),
        };
        movies(movies_args, config, globals).await?;
    } else {
        debug!("No movie libraries requested");
    }

    if run_episodes {
        if chatty {
            ui::section(&ctx, "TV Episodes");
        }
        let episodes_args = EpisodesArgs {
            scan: ScanArgs {
                libraries: show_libraries,
                ..args
            },
            include_specials: false,
            recent_threshold: None,
            exclude_shows: Vec::new(),
        };
        episodes(episodes_args, config, globals).await?;
    } else {
        debug!("No TV libraries requested");
    }

    Ok(())
}

/// Partition requested names into movie and show libraries
fn split_libraries(
    requested: &[String],
    available: &[Library],
) -> ReelgapResult<(Vec<String>, Vec<String>)> {
    let mut movie_libraries = Vec::new();
    let mut show_libraries = Vec::new();

    for name in requested {
        match available.iter().find(|l| &l.title == name).map(|l| l.kind) {
            Some(LibraryKind::Movie) => movie_libraries.push(name.clone()),
            Some(LibraryKind::Show) => show_libraries.push(name.clone()),
            _ => return Err(ReelgapError::LibraryNotFound(name.clone())),
        }
    }
    Ok((movie_libraries, show_libraries))
}
