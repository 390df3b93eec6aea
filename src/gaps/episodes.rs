//! Missing episodes in series

use crate::clock::{self, Clock};
use crate::error::ReelgapResult;
use crate::gaps::models::{
    CanonicalItem, EpisodeGapReport, MissingEpisode, SeasonGap, ShowGap,
};
use crate::gaps::policy::EpisodePolicy;
use crate::gaps::progress::ProgressSender;
use crate::gaps::source::{LibrarySource, MetadataSource};
use crate::gaps::{collect_groups, diff_missing, fetch_canonical, is_future};
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Finds episodes missing from series the user owns
pub struct EpisodeGapFinder {
    library: Arc<dyn LibrarySource>,
    metadata: Arc<dyn MetadataSource>,
    policy: EpisodePolicy,
    clock: Arc<dyn Clock>,
    progress: ProgressSender,
}

impl EpisodeGapFinder {
    pub fn new(
        library: Arc<dyn LibrarySource>,
        metadata: Arc<dyn MetadataSource>,
        policy: EpisodePolicy,
    ) -> Self {
        Self {
            library,
            metadata,
            policy,
            clock: clock::system(),
            progress: ProgressSender::silent(),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_progress(mut self, progress: ProgressSender) -> Self {
        self.progress = progress;
        self
    }

    pub fn policy(&self) -> &EpisodePolicy {
        &self.policy
    }

    /// Scan one TV library and report series with missing episodes
    pub async fn find_gaps(&self, library_name: &str) -> ReelgapResult<EpisodeGapReport> {
        info!(library = library_name, "Scanning TV library");

        let owned = collect_groups(
            self.library.as_ref(),
            self.metadata.as_ref(),
            library_name,
            "episodes",
            &self.progress,
        )
        .await?;

        let now = self.clock.now();
        let total_groups = owned.groups.len();
        let mut shows_with_gaps = Vec::new();

        for (i, (group, _items)) in owned.groups.iter().enumerate() {
            self.progress
                .emit(format!("Analyzing: {}", group.name), i + 1, Some(total_groups));

            if self.policy.is_excluded(&group.name) {
                debug!(show = %group.name, "Excluded show");
                continue;
            }

            let Some(set) = fetch_canonical(self.metadata.as_ref(), group).await? else {
                continue;
            };

            let canonical: Vec<&CanonicalItem> = set
                .items
                .iter()
                .filter(|item| self.keep(item, now))
                .collect();

            let missing = diff_missing(&canonical, &owned.owned_ids);
            if missing.is_empty() {
                continue;
            }

            let seasons = bucket_by_season(&canonical, &missing);
            shows_with_gaps.push(ShowGap {
                tvdb_id: group.id.clone(),
                show_title: group.name.clone(),
                total_episodes: canonical.len(),
                owned_episodes: canonical.len() - missing.len(),
                seasons_with_gaps: seasons,
            });
        }

        let report = EpisodeGapReport {
            library_name: library_name.to_string(),
            total_episodes_scanned: owned.total_scanned,
            episodes_with_tvdb_id: owned.with_external_id,
            episodes_in_shows: owned.in_groups,
            unique_shows: total_groups,
            shows_with_gaps,
        };

        info!(
            library = library_name,
            shows = report.unique_shows,
            missing = report.total_missing(),
            "Episode scan complete"
        );
        Ok(report)
    }

    fn keep(&self, item: &CanonicalItem, now: DateTime<Utc>) -> bool {
        if !self.policy.include_specials && item.season == Some(0) {
            return false;
        }
        if !self.policy.include_future && is_future(item.date, now.date_naive()) {
            return false;
        }
        !aired_recently(item.date, now, self.policy.recent_threshold_hours)
    }
}

/// Aired less than `threshold_hours` before `now`
fn aired_recently(aired: Option<NaiveDate>, now: DateTime<Utc>, threshold_hours: u32) -> bool {
    let Some(aired) = aired else {
        return false;
    };
    let age = now - aired.and_time(NaiveTime::MIN).and_utc();
    age >= Duration::zero() && age < Duration::hours(i64::from(threshold_hours))
}

/// Group missing episodes by season, ascending; seasons without gaps are omitted
fn bucket_by_season(canonical: &[&CanonicalItem], missing: &[&CanonicalItem]) -> Vec<SeasonGap> {
    let mut totals: BTreeMap<u32, usize> = BTreeMap::new();
    for item in canonical {
        *totals.entry(item.season.unwrap_or(0)).or_default() += 1;
    }

    let mut gaps: BTreeMap<u32, Vec<MissingEpisode>> = BTreeMap::new();
    for item in missing {
        gaps.entry(item.season.unwrap_or(0))
            .or_default()
            .push(MissingEpisode::from(*item));
    }

    gaps.into_iter()
        .map(|(season, missing_episodes)| {
            let total = totals.get(&season).copied().unwrap_or(0);
            SeasonGap {
                season_number: season,
                total_episodes: total,
                owned_episodes: total - missing_episodes.len(),
                missing_episodes,
            }
        })
        .collect()
}
