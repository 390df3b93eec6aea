//! Config command - show or edit configuration

use crate::cli::args::{ConfigAction, ConfigArgs};
use crate::config::{self, Config, ConfigManager};
use crate::error::{ReelgapError, ReelgapResult};
use crate::ui::{self, Status, UiContext};

/// Keys accepted by `config set`
const VALID_KEYS: &[&str] = &[
    "general.log_format",
    "general.request_timeout_secs",
    "plex.url",
    "plex.token",
    "tmdb.api_key",
    "tvdb.api_key",
    "tvdb.pin",
    "options.exclude_future",
    "options.exclude_specials",
    "options.recent_threshold_hours",
    "options.min_collection_size",
    "options.min_owned",
    "exclusions.shows",
    "exclusions.collections",
    "cache.enabled",
    "cache.dir",
    "cache.movie_ttl_hours",
    "cache.collection_ttl_hours",
    "cache.episode_ttl_hours",
    "retry.max_retries",
    "retry.base_delay_ms",
    "retry.max_delay_ms",
    "retry.multiplier",
];

/// Execute the config command
pub async fn execute(args: ConfigArgs, config: &Config, manager: &ConfigManager) -> ReelgapResult<()> {
    match args.action {
        None | Some(ConfigAction::Show) => show_config(config)?,
        Some(ConfigAction::Path) => show_path(manager),
        Some(ConfigAction::Init { force }) => init_config(manager, force).await?,
        Some(ConfigAction::Validate) => validate_config(config, manager)?,
        Some(ConfigAction::Set { key, value }) => set_value(manager, &key, &value).await?,
    }

    Ok(())
}

fn show_config(config: &Config) -> ReelgapResult<()> {
    println!("{}", toml::to_string_pretty(&redacted(config))?);
    Ok(())
}

/// Copy of the configuration with credentials masked
fn redacted(config: &Config) -> Config {
    let mut shown = config.clone();
    shown.plex.token = mask_secret(&shown.plex.token);
    shown.tmdb.api_key = mask_secret(&shown.tmdb.api_key);
    shown.tvdb.api_key = mask_secret(&shown.tvdb.api_key);
    shown.tvdb.pin = mask_secret(&shown.tvdb.pin);
    shown
}

/// Keep the last four characters of a secret
fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.is_empty() {
        return String::new();
    }
    if chars.len() <= 4 {
        return "****".to_string();
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("****{}", tail)
}

fn show_path(manager: &ConfigManager) {
    println!("{}", manager.path().display());
}

async fn init_config(manager: &ConfigManager, force: bool) -> ReelgapResult<()> {
    let ctx = UiContext::detect();
    let path = manager.path();

    if path.exists() && !force {
        ui::status_hint(
            &ctx,
            Status::Warn,
            &format!("Config already exists at {}", path.display()),
            "Use --force to overwrite",
        );
        return Ok(());
    }

    manager.save(&Config::default()).await?;

    ui::status(&ctx, Status::Ok, &format!("Configuration initialized at {}", path.display()));
    ui::remark(&ctx, "Set plex.token, tmdb.api_key and tvdb.api_key before scanning");

    Ok(())
}

fn validate_config(config: &Config, manager: &ConfigManager) -> ReelgapResult<()> {
    let ctx = UiContext::detect();
    let issues = config::validate(config);

    if issues.is_empty() {
        ui::status(&ctx, Status::Ok, &format!("{} is valid", manager.path().display()));
        return Ok(());
    }

    for issue in &issues {
        ui::status(&ctx, Status::Fail, issue);
    }
    Err(ReelgapError::User(format!(
        "{} has {} problem(s)",
        manager.path().display(),
        issues.len()
    )))
}

/// Set one key in the file on disk.
///
/// The value is type-checked against the schema, then written into the
/// raw document so `$VAR` references elsewhere in the file are kept.
async fn set_value(manager: &ConfigManager, key: &str, value: &str) -> ReelgapResult<()> {
    let ctx = UiContext::detect();

    let mut typed = Config::default();
    apply_value(&mut typed, key, value)?;
    let typed = toml::Value::try_from(&typed)?;

    let mut doc = manager.load_document().await?;
    set_toml_value(&mut doc, key, lookup(&typed, key).cloned())?;
    manager.save_document(&doc).await?;

    ui::status(&ctx, Status::Ok, &format!("Set {} = {}", key, value));
    Ok(())
}

fn lookup<'a>(value: &'a toml::Value, key: &str) -> Option<&'a toml::Value> {
    key.split('.').try_fold(value, |current, part| current.get(part))
}

/// Set (or remove, for `None`) a dot-separated key in a TOML value
/// tree, creating intermediate tables as needed.
fn set_toml_value(doc: &mut toml::Value, key: &str, value: Option<toml::Value>) -> ReelgapResult<()> {
    let (path, leaf) = key.rsplit_once('.').unwrap_or(("", key));
    let mut current = doc;

    for part in path.split('.').filter(|p| !p.is_empty()) {
        current = current
            .as_table_mut()
            .ok_or_else(|| ReelgapError::User(format!("Expected table at key: {}", part)))?
            .entry(part)
            .or_insert_with(|| toml::Value::Table(toml::map::Map::new()));
    }

    let table = current
        .as_table_mut()
        .ok_or_else(|| ReelgapError::User(format!("Expected table for key: {}", key)))?;
    match value {
        Some(value) => {
            table.insert(leaf.to_string(), value);
        }
        None => {
            table.remove(leaf);
        }
    }
    Ok(())
}

/// Apply a dot-separated key to the configuration
fn apply_value(config: &mut Config, key: &str, value: &str) -> ReelgapResult<()> {
    let parts: Vec<&str> = key.split('.').collect();

    match parts.as_slice() {
        ["general", "log_format"] => config.general.log_format = value.to_string(),
        ["general", "request_timeout_secs"] => {
            config.general.request_timeout_secs = parse_number(value)?
        }

        ["plex", "url"] => config.plex.url = value.to_string(),
        ["plex", "token"] => config.plex.token = value.to_string(),
        ["tmdb", "api_key"] => config.tmdb.api_key = value.to_string(),
        ["tvdb", "api_key"] => config.tvdb.api_key = value.to_string(),
        ["tvdb", "pin"] => config.tvdb.pin = value.to_string(),

        ["options", "exclude_future"] => config.options.exclude_future = parse_bool(value)?,
        ["options", "exclude_specials"] => config.options.exclude_specials = parse_bool(value)?,
        ["options", "recent_threshold_hours"] => {
            config.options.recent_threshold_hours = parse_number(value)?
        }
        ["options", "min_collection_size"] => {
            config.options.min_collection_size = parse_number(value)?
        }
        ["options", "min_owned"] => config.options.min_owned = parse_number(value)?,

        ["exclusions", "shows"] => config.exclusions.shows = parse_list(value),
        ["exclusions", "collections"] => config.exclusions.collections = parse_list(value),

        ["cache", "enabled"] => config.cache.enabled = parse_bool(value)?,
        ["cache", "dir"] => {
            config.cache.dir = (!value.is_empty()).then(|| value.into());
        }
        ["cache", "movie_ttl_hours"] => config.cache.movie_ttl_hours = parse_number(value)?,
        ["cache", "collection_ttl_hours"] => {
            config.cache.collection_ttl_hours = parse_number(value)?
        }
        ["cache", "episode_ttl_hours"] => config.cache.episode_ttl_hours = parse_number(value)?,

        ["retry", "max_retries"] => config.retry.max_retries = parse_number(value)?,
        ["retry", "base_delay_ms"] => config.retry.base_delay_ms = parse_number(value)?,
        ["retry", "max_delay_ms"] => config.retry.max_delay_ms = parse_number(value)?,
        ["retry", "multiplier"] => config.retry.multiplier = parse_number(value)?,

        _ => {
            return Err(ReelgapError::User(format!(
                "Unknown config key: {}. Valid keys: {}",
                key,
                VALID_KEYS.join(", ")
            )))
        }
    }

    Ok(())
}

/// Comma-separated list; titles containing commas are not supported here
fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse_bool(value: &str) -> ReelgapResult<bool> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(ReelgapError::User(format!(
            "Invalid boolean value: {}. Use true/false",
            value
        ))),
    }
}

fn parse_number<T: std::str::FromStr>(value: &str) -> ReelgapResult<T> {
    value
        .trim()
        .parse()
        .map_err(|_| ReelgapError::User(format!("Invalid number: {}", value)))
}
