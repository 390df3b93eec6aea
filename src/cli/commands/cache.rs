//! Cache command - inspect and clean the metadata cache

use crate::cache::{TtlCache, CAT_COLLECTIONS, CAT_EPISODES, CAT_MOVIES, NS_TMDB, NS_TVDB};
use crate::cli::args::{CacheAction, CacheArgs};
use crate::config::{Config, ConfigManager};
use crate::error::{ReelgapError, ReelgapResult};
use crate::ui::{self, Status, UiContext};

/// Execute the cache command
pub async fn execute(args: CacheArgs, config: &Config) -> ReelgapResult<()> {
    let cache = TtlCache::new(ConfigManager::cache_dir(config));

    match args.action {
        CacheAction::Stats => show_stats(&cache),
        CacheAction::Clear { namespace, yes } => clear(&cache, namespace.as_deref(), yes).await,
        CacheAction::Sweep => sweep(&cache),
        CacheAction::Path => {
            println!("{}", cache.root().display());
            Ok(())
        }
    }
}

fn show_stats(cache: &TtlCache) -> ReelgapResult<()> {
    let ctx = UiContext::detect();
    let stats = cache.stats();

    ui::section(&ctx, "Metadata cache");
    ui::field(&ctx, "Location", &cache.root().display().to_string());

    if stats.total_entries == 0 {
        ui::remark(&ctx, "Cache is empty");
        return Ok(());
    }

    ui::field(&ctx, "Entries", &stats.total_entries.to_string());
    ui::field(&ctx, "Size", &format_bytes(stats.total_size_bytes));
    for (label, ns, cat) in [
        ("TMDB movies", NS_TMDB, CAT_MOVIES),
        ("TMDB collections", NS_TMDB, CAT_COLLECTIONS),
        ("TVDB series", NS_TVDB, CAT_EPISODES),
    ] {
        ui::field(&ctx, label, &stats.count(ns, cat).to_string());
    }

    if let Some(oldest) = stats.oldest_cached_at {
        ui::field(&ctx, "Oldest", &oldest.format("%Y-%m-%d %H:%M UTC").to_string());
    }
    if let Some(newest) = stats.newest_cached_at {
        ui::field(&ctx, "Newest", &newest.format("%Y-%m-%d %H:%M UTC").to_string());
    }

    let expired = cache.expired_count();
    if expired > 0 {
        ui::status_hint(
            &ctx,
            Status::Warn,
            &ui::count_of(expired, "expired entry", "expired entries"),
            "Run `reelgap cache sweep` to remove them",
        );
    }

    Ok(())
}

async fn clear(cache: &TtlCache, namespace: Option<&str>, yes: bool) -> ReelgapResult<()> {
    let ctx = UiContext::detect().with_auto_yes(yes);

    if let Some(ns) = namespace {
        if ns != NS_TMDB && ns != NS_TVDB {
            return Err(ReelgapError::User(format!(
                "Unknown cache namespace: {}. Use {} or {}",
                ns, NS_TMDB, NS_TVDB
            )));
        }
    }

    let target = namespace.map_or_else(|| "all cached metadata".to_string(), |ns| {
        format!("cached {} metadata", ns)
    });

    // Destructive, so the non-interactive default is "no"
    if !ui::confirm(&ctx, &format!("Delete {}?", target), false).await? {
        ui::status(&ctx, Status::Info, "Aborted. Pass --yes to skip confirmation");
        return Ok(());
    }

    let removed = cache.clear(namespace)?;
    ui::status(
        &ctx,
        Status::Ok,
        &format!("Removed {}", ui::count_of(removed, "cache entry", "cache entries")),
    );
    Ok(())
}

fn sweep(cache: &TtlCache) -> ReelgapResult<()> {
    let ctx = UiContext::detect();
    let removed = cache.sweep_expired()?;

    if removed == 0 {
        ui::status(&ctx, Status::Ok, "No expired entries");
    } else {
        ui::status(
            &ctx,
            Status::Ok,
            &format!("Swept {}", ui::count_of(removed, "expired entry", "expired entries")),
        );
    }
    Ok(())
}

/// Format bytes as human-readable size (e.g., "1.5 MB")
fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
