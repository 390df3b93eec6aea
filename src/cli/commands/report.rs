//! Report rendering shared by the scan commands
//!
//! Text goes through the `ui` helpers, JSON is a pretty `serde_json`
//! document and CSV rows are written with the `csv` crate, either to
//! stdout or to a dated file next to the text report.

use crate::error::{ReelgapError, ReelgapResult};
use crate::gaps::{EpisodeGapReport, Library, MovieGapReport};
use crate::stats::ScanStatistics;
use crate::ui::{self, Status, UiContext};
use chrono::NaiveDate;
use console::style;
use serde_json::{json, Value};
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Missing episodes listed per season before summarizing
const EPISODES_PER_SEASON: usize = 5;

const MOVIE_CSV_HEADER: [&str; 5] = ["Collection", "Movie Title", "Year", "TMDB ID", "Release Date"];
const EPISODE_CSV_HEADER: [&str; 6] = ["Show", "Season", "Episode", "Title", "TVDB ID", "Aired"];

/// Print the libraries a scan could target
pub fn list_libraries(ctx: &UiContext, libraries: &[&Library], kind: &str, command: &str) {
    if libraries.is_empty() {
        ui::status(
            ctx,
            Status::Warn,
            &format!("No {} libraries found on this Plex server", kind),
        );
        return;
    }

    ui::section(ctx, &format!("Available {} libraries", kind));
    for (i, library) in libraries.iter().enumerate() {
        println!(
            "  {:>2}  {}  {}",
            style(i + 1).dim(),
            library.title,
            style(library.kind).dim()
        );
    }
    println!();
    ui::remark(
        ctx,
        &format!(
            "Use --library to choose one. Example: reelgap {} --library \"{}\"",
            command, libraries[0].title
        ),
    );
}

/// Human-readable movie report
pub fn movies_text(ctx: &UiContext, report: &MovieGapReport) {
    ui::section(ctx, &format!("Movie Collection Gaps - {}", report.library_name));
    ui::field(ctx, "Movies scanned", &report.total_movies_scanned.to_string());
    ui::field(ctx, "With TMDB ID", &report.movies_with_tmdb_id.to_string());
    ui::field(ctx, "In collections", &report.movies_in_collections.to_string());
    ui::field(ctx, "Unique collections", &report.unique_collections.to_string());
    println!();

    if report.collections_with_gaps.is_empty() {
        ui::status(ctx, Status::Ok, "All collections are complete");
        return;
    }

    ui::status(
        ctx,
        Status::Warn,
        &format!(
            "Found {} missing movies in {} collections",
            report.total_missing(),
            report.collections_with_gaps.len()
        ),
    );
    println!();

    for gap in &report.collections_with_gaps {
        println!(
            "{}",
            ui::completion_heading(
                &gap.collection_name,
                gap.owned_movies,
                gap.total_movies,
                gap.completion_percent()
            )
        );
        for movie in &gap.missing_movies {
            let year = movie
                .year()
                .map_or_else(|| "TBA".to_string(), |y| y.to_string());
            println!("  {:<48} {}", movie.title, style(year).dim());
        }
        println!();
    }
}

/// Human-readable episode report; `verbose` lists every missing episode
pub fn episodes_text(ctx: &UiContext, report: &EpisodeGapReport, verbose: bool) {
    ui::section(ctx, &format!("TV Episode Gaps - {}", report.library_name));
    ui::field(ctx, "Episodes scanned", &report.total_episodes_scanned.to_string());
    ui::field(ctx, "With TVDB ID", &report.episodes_with_tvdb_id.to_string());
    ui::field(ctx, "Unique shows", &report.unique_shows.to_string());
    println!();

    if report.shows_with_gaps.is_empty() {
        ui::status(ctx, Status::Ok, "All shows are complete");
        return;
    }

    ui::status(
        ctx,
        Status::Warn,
        &format!(
            "Found {} missing episodes in {} shows",
            report.total_missing(),
            report.shows_with_gaps.len()
        ),
    );
    println!();

    for show in &report.shows_with_gaps {
        println!(
            "{}",
            ui::completion_heading(
                &show.show_title,
                show.owned_episodes,
                show.total_episodes,
                show.completion_percent()
            )
        );

        for season in &show.seasons_with_gaps {
            println!("  {}", style(format!("Season {}:", season.season_number)).dim());

            let shown = if verbose {
                season.missing_episodes.len()
            } else {
                EPISODES_PER_SEASON.min(season.missing_episodes.len())
            };
            for episode in &season.missing_episodes[..shown] {
                if episode.title.is_empty() {
                    println!("    {}", episode.episode_code());
                } else {
                    println!("    {} - {}", episode.episode_code(), episode.title);
                }
            }

            let remaining = season.missing_episodes.len() - shown;
            if remaining > 0 {
                println!("    {}", style(format!("... and {} more", remaining)).dim());
            }
        }
        println!();
    }
}

/// JSON document for a movie report
pub fn movies_json(report: &MovieGapReport) -> Value {
    let collections: Vec<Value> = report
        .collections_with_gaps
        .iter()
        .map(|gap| {
            json!({
                "id": gap.collection_id,
                "name": gap.collection_name,
                "total": gap.total_movies,
                "owned": gap.owned_movies,
                "completion_percent": gap.completion_percent(),
                "missing": gap.missing_movies.iter().map(|m| json!({
                    "tmdb_id": m.tmdb_id,
                    "title": m.title,
                    "year": m.year(),
                    "release_date": m.release_date,
                })).collect::<Vec<_>>(),
            })
        })
        .collect();

    json!({
        "library_name": report.library_name,
        "total_movies_scanned": report.total_movies_scanned,
        "movies_with_tmdb_id": report.movies_with_tmdb_id,
        "movies_in_collections": report.movies_in_collections,
        "unique_collections": report.unique_collections,
        "total_missing": report.total_missing(),
        "collections": collections,
    })
}

/// JSON document for an episode report
pub fn episodes_json(report: &EpisodeGapReport) -> Value {
    let shows: Vec<Value> = report
        .shows_with_gaps
        .iter()
        .map(|show| {
            let seasons: Vec<Value> = show
                .seasons_with_gaps
                .iter()
                .map(|season| {
                    json!({
                        "season": season.season_number,
                        "total": season.total_episodes,
                        "owned": season.owned_episodes,
                        "missing": season.missing_episodes.iter().map(|e| json!({
                            "tvdb_id": e.tvdb_id,
                            "episode_code": e.episode_code(),
                            "title": e.title,
                            "aired": e.aired,
                        })).collect::<Vec<_>>(),
                    })
                })
                .collect();
            json!({
                "tvdb_id": show.tvdb_id,
                "title": show.show_title,
                "total_episodes": show.total_episodes,
                "owned_episodes": show.owned_episodes,
                "completion_percent": show.completion_percent(),
                "seasons": seasons,
            })
        })
        .collect();

    json!({
        "library_name": report.library_name,
        "total_episodes_scanned": report.total_episodes_scanned,
        "episodes_with_tvdb_id": report.episodes_with_tvdb_id,
        "episodes_in_shows": report.episodes_in_shows,
        "unique_shows": report.unique_shows,
        "total_missing": report.total_missing(),
        "shows": shows,
    })
}

/// Print a JSON document to stdout
pub fn print_json(value: &Value) -> ReelgapResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn date_cell(date: Option<NaiveDate>) -> String {
    date.map(|d| d.to_string()).unwrap_or_default()
}

/// Write movie gap rows as CSV
pub fn write_movies_csv<W: Write>(report: &MovieGapReport, out: W) -> ReelgapResult<()> {
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(MOVIE_CSV_HEADER)?;

    for gap in &report.collections_with_gaps {
        for movie in &gap.missing_movies {
            writer.write_record([
                gap.collection_name.clone(),
                movie.title.clone(),
                movie.year().map(|y| y.to_string()).unwrap_or_default(),
                movie.tmdb_id.clone(),
                date_cell(movie.release_date),
            ])?;
        }
    }

    writer.flush().map_err(|e| ReelgapError::io("writing CSV", e))
}

/// Write episode gap rows as CSV
pub fn write_episodes_csv<W: Write>(report: &EpisodeGapReport, out: W) -> ReelgapResult<()> {
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(EPISODE_CSV_HEADER)?;

    for show in &report.shows_with_gaps {
        for season in &show.seasons_with_gaps {
            for episode in &season.missing_episodes {
                writer.write_record([
                    show.show_title.clone(),
                    season.season_number.to_string(),
                    episode.episode_code(),
                    episode.title.clone(),
                    episode.tvdb_id.clone(),
                    date_cell(episode.aired),
                ])?;
            }
        }
    }

    writer.flush().map_err(|e| ReelgapError::io("writing CSV", e))
}

/// File name for a saved report: `<Library>_<kind>_gaps_<date>.csv`
///
/// Characters other than alphanumerics, `-` and `_` become `_`.
pub fn csv_file_name(library_name: &str, kind: &str, date: NaiveDate) -> String {
    let safe: String = library_name
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("{}_{}_gaps_{}.csv", safe, kind, date.format("%Y-%m-%d"))
}

/// Create the CSV report file in `dir` and hand it to `write`
pub fn save_csv<F>(dir: &Path, file_name: &str, write: F) -> ReelgapResult<PathBuf>
where
    F: FnOnce(File) -> ReelgapResult<()>,
{
    std::fs::create_dir_all(dir)
        .map_err(|e| ReelgapError::io(format!("creating {}", dir.display()), e))?;
    let path = dir.join(file_name);
    let file = File::create(&path)
        .map_err(|e| ReelgapError::io(format!("creating {}", path.display()), e))?;
    write(file)?;
    Ok(path)
}

/// Stdout handle for CSV output
pub fn stdout() -> io::StdoutLock<'static> {
    io::stdout().lock()
}

/// Timing, API and cache figures for a finished scan
pub fn print_statistics(ctx: &UiContext, stats: &ScanStatistics) {
    ui::section(ctx, "Scan statistics");
    ui::field(ctx, "Duration", &format!("{:.1}s", stats.elapsed().as_secs_f64()));

    for phase in stats.phases() {
        ui::field(
            ctx,
            &format!("  {}", phase.name),
            &format!("{:.1}s ({} items)", phase.duration.as_secs_f64(), phase.items),
        );
    }

    ui::field(ctx, "API calls", &stats.total_api_calls().to_string());
    for (kind, count) in stats.api_calls() {
        ui::field(ctx, &format!("  {}", kind), &count.to_string());
    }

    let lookups = stats.cache_hits() + stats.cache_misses();
    if lookups > 0 {
        let rate = stats.cache_hit_rate();
        ui::field_scored(
            ctx,
            "Cache",
            &format!(
                "{} hits, {} misses ({:.0}% hit rate)",
                stats.cache_hits(),
                stats.cache_misses(),
                rate
            ),
            rate,
        );
    }
}
