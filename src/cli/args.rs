//! CLI argument definitions using clap derive

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// reelgap - find missing movies and episodes in a Plex library
///
/// Compares what a library owns against TMDB collections and TVDB
/// series and reports the gaps.
#[derive(Parser, Debug)]
#[command(name = "reelgap")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Suppress progress output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Configuration file path
    #[arg(short, long, global = true, env = "REELGAP_CONFIG")]
    pub config: Option<PathBuf>,

    /// Bypass the metadata cache for this run
    #[arg(long, global = true)]
    pub no_cache: bool,
}

impl Cli {
    /// Flags that apply to every subcommand
    pub fn globals(&self) -> GlobalOptions {
        GlobalOptions {
            verbose: self.verbose,
            quiet: self.quiet,
            no_cache: self.no_cache,
        }
    }
}

/// Global flags passed down to commands
#[derive(Debug, Clone, Copy, Default)]
pub struct GlobalOptions {
    pub verbose: u8,
    pub quiet: bool,
    pub no_cache: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Find movies missing from collections
    Movies(MoviesArgs),

    /// Find episodes missing from series
    Episodes(EpisodesArgs),

    /// Scan movie and TV libraries in one run
    Scan(ScanArgs),

    /// Show or edit configuration
    Config(ConfigArgs),

    /// Manage the metadata cache
    Cache(CacheArgs),
}

/// Options shared by the scan commands
#[derive(Parser, Debug, Clone)]
pub struct ScanArgs {
    /// Library to scan (repeatable; lists libraries when omitted)
    #[arg(short, long = "library")]
    pub libraries: Vec<String>,

    /// Count unreleased items as missing
    #[arg(long)]
    pub include_future: bool,

    /// Output format
    #[arg(short, long, default_value = "text")]
    pub format: ReportFormat,

    /// Do not save a CSV report next to text output
    #[arg(long)]
    pub no_csv: bool,

    /// Directory for saved CSV reports (defaults to current directory)
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Validate configuration and connections without scanning
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for the movies command
#[derive(Parser, Debug)]
pub struct MoviesArgs {
    #[command(flatten)]
    pub scan: ScanArgs,

    /// Ignore collections with fewer movies than this
    #[arg(long)]
    pub min_collection_size: Option<usize>,

    /// Only report collections with at least this many owned movies
    #[arg(long)]
    pub min_owned: Option<usize>,

    /// Collection name to skip (repeatable, adds to config exclusions)
    #[arg(long = "exclude-collection")]
    pub exclude_collections: Vec<String>,
}

/// Arguments for the episodes command
#[derive(Parser, Debug)]
pub struct EpisodesArgs {
    #[command(flatten)]
    pub scan: ScanArgs,

    /// Count season 0 specials
    #[arg(long)]
    pub include_specials: bool,

    /// Hours after airing before an episode counts as missing
    #[arg(long)]
    pub recent_threshold: Option<u32>,

    /// Show title to skip (repeatable, adds to config exclusions)
    #[arg(long = "exclude-show")]
    pub exclude_shows: Vec<String>,
}

/// Report output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// Human-readable report
    Text,
    /// JSON document
    Json,
    /// CSV rows on stdout
    Csv,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Subcommand for config
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Initialize default configuration
    Init {
        /// Overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Check configuration and report problems
    Validate,

    /// Set a configuration value
    Set {
        /// Configuration key (e.g., options.min_owned)
        key: String,
        /// Value to set
        value: String,
    },
}

/// Arguments for the cache command
#[derive(Parser, Debug)]
pub struct CacheArgs {
    /// Subcommand for cache
    #[command(subcommand)]
    pub action: CacheAction,
}

/// Cache subcommands
#[derive(Subcommand, Debug)]
pub enum CacheAction {
    /// Show cache statistics
    Stats,

    /// Delete cached entries
    Clear {
        /// Only clear one namespace (tmdb, tvdb)
        #[arg(short, long)]
        namespace: Option<String>,

        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Delete expired and corrupt entries
    Sweep,

    /// Show cache directory
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_movies() {
        let cli = Cli::parse_from([
            "reelgap",
            "movies",
            "-l",
            "Movies",
            "--library",
            "4K Movies",
            "--min-owned",
            "1",
            "--format",
            "json",
        ]);
        match cli.command {
            Commands::Movies(args) => {
                assert_eq!(args.scan.libraries, vec!["Movies", "4K Movies"]);
                assert_eq!(args.min_owned, Some(1));
                assert_eq!(args.min_collection_size, None);
                assert_eq!(args.scan.format, ReportFormat::Json);
            }
            _ => panic!("expected Movies command"),
        }
    }

    #[test]
    fn cli_parses_episodes() {
        let cli = Cli::parse_from([
            "reelgap",
            "episodes",
            "--include-specials",
            "--recent-threshold",
            "48",
            "--exclude-show",
            "Lost",
        ]);
        match cli.command {
            Commands::Episodes(args) => {
                assert!(args.include_specials);
                assert_eq!(args.recent_threshold, Some(48));
                assert_eq!(args.exclude_shows, vec!["Lost"]);
                assert!(args.scan.libraries.is_empty());
                assert_eq!(args.scan.format, ReportFormat::Text);
            }
            _ => panic!("expected Episodes command"),
        }
    }

    #[test]
    fn cli_parses_scan() {
        let cli = Cli::parse_from(["reelgap", "scan", "-l", "Movies", "-l", "TV Shows", "--no-csv"]);
        match cli.command {
            Commands::Scan(args) => {
                assert_eq!(args.libraries, vec!["Movies", "TV Shows"]);
                assert!(args.no_csv);
            }
            _ => panic!("expected Scan command"),
        }
    }

    #[test]
    fn cli_parses_cache_clear() {
        let cli = Cli::parse_from(["reelgap", "cache", "clear", "--namespace", "tmdb", "-y"]);
        match cli.command {
            Commands::Cache(CacheArgs {
                action: CacheAction::Clear { namespace, yes },
            }) => {
                assert_eq!(namespace.as_deref(), Some("tmdb"));
                assert!(yes);
            }
            _ => panic!("expected Cache Clear command"),
        }
    }

    #[test]
    fn cli_parses_config_validate() {
        let cli = Cli::parse_from(["reelgap", "config", "validate"]);
        assert!(matches!(
            cli.command,
            Commands::Config(ConfigArgs {
                action: Some(ConfigAction::Validate)
            })
        ));
    }

    #[test]
    fn cli_global_flags() {
        let cli = Cli::parse_from(["reelgap", "--no-cache", "cache", "stats"]);
        assert!(cli.no_cache);
        assert!(cli.globals().no_cache);

        let cli = Cli::parse_from(["reelgap", "movies", "-q"]);
        assert!(cli.quiet);
    }

    #[test]
    fn cli_verbose_levels() {
        let cli = Cli::parse_from(["reelgap", "cache", "path"]);
        assert_eq!(cli.verbose, 0);

        let cli = Cli::parse_from(["reelgap", "-v", "cache", "path"]);
        assert_eq!(cli.verbose, 1);

        let cli = Cli::parse_from(["reelgap", "-vv", "cache", "path"]);
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn quiet_conflicts_with_verbose() {
        assert!(Cli::try_parse_from(["reelgap", "-q", "-v", "cache", "path"]).is_err());
    }
}
