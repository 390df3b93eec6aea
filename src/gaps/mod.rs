//! Gap detection between owned items and canonical sets
//!
//! A scan lists what a library owns, resolves each item to its group
//! (a TMDB collection or a TVDB series), fetches the full group and
//! diffs the two by external id. Movies and episodes share the first
//! steps; episodes additionally bucket gaps by season.

pub mod episodes;
pub mod models;
pub mod movies;
pub mod policy;
pub mod progress;
pub mod source;

#[cfg(test)]
pub(crate) mod testing;

pub use episodes::EpisodeGapFinder;
pub use models::{
    CanonicalItem, CanonicalSet, CollectionGap, EpisodeGapReport, GroupRef, MissingEpisode,
    MissingMovie, MovieGapReport, OwnedItem, ScoreRating, SeasonGap, ShowGap,
};
pub use movies::MovieGapFinder;
pub use policy::{EpisodePolicy, MoviePolicy};
pub use progress::{ProgressEvent, ProgressSender};
pub use source::{Library, LibraryKind, LibrarySource, MetadataSource};

use crate::error::{ReelgapError, ReelgapResult, SourceError};
use chrono::NaiveDate;
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

/// Owned items grouped by canonical group, in first-appearance order
#[derive(Debug, Default)]
pub(crate) struct OwnedGroups {
    pub total_scanned: usize,
    pub with_external_id: usize,
    pub in_groups: usize,
    pub owned_ids: HashSet<String>,
    pub groups: Vec<(GroupRef, Vec<OwnedItem>)>,
}

/// List owned items and resolve each to its group (scan steps 1 to 3)
pub(crate) async fn collect_groups(
    library: &dyn LibrarySource,
    metadata: &dyn MetadataSource,
    library_name: &str,
    kind_label: &str,
    progress: &ProgressSender,
) -> ReelgapResult<OwnedGroups> {
    progress.emit(
        format!("Fetching {} from {}", kind_label, library.name()),
        0,
        None,
    );

    let items = library
        .list_owned(library_name)
        .await
        .map_err(|e| match e {
            SourceError::NotFound { .. } => ReelgapError::LibraryNotFound(library_name.to_string()),
            other => ReelgapError::LibraryUnavailable(other),
        })?;

    let mut result = OwnedGroups {
        total_scanned: items.len(),
        ..Default::default()
    };

    let resolvable: Vec<OwnedItem> = items
        .into_iter()
        .filter(|item| item.external_id().is_some())
        .collect();
    result.with_external_id = resolvable.len();
    result.owned_ids = resolvable
        .iter()
        .filter_map(|item| item.external_id().map(str::to_string))
        .collect();

    debug!(
        total = result.total_scanned,
        with_id = result.with_external_id,
        "Listed owned items"
    );

    let total = resolvable.len();
    let mut index: HashMap<String, usize> = HashMap::new();

    for (i, item) in resolvable.into_iter().enumerate() {
        progress.emit(format!("Checking: {}", item.title), i + 1, Some(total));

        let group = match metadata.resolve_group(&item).await {
            Ok(Some(group)) => group,
            Ok(None) => continue,
            Err(e) => {
                skip_or_abort(e, &item.title)?;
                continue;
            }
        };

        result.in_groups += 1;
        match index.get(&group.id) {
            Some(&slot) => result.groups[slot].1.push(item),
            None => {
                index.insert(group.id.clone(), result.groups.len());
                result.groups.push((group, vec![item]));
            }
        }
    }

    Ok(result)
}

/// Fetch a group's canonical set, skipping transient failures
pub(crate) async fn fetch_canonical(
    metadata: &dyn MetadataSource,
    group: &GroupRef,
) -> ReelgapResult<Option<CanonicalSet>> {
    match metadata.fetch_group(&group.id).await {
        Ok(set) => Ok(Some(set)),
        Err(e) => {
            skip_or_abort(e, &group.name)?;
            Ok(None)
        }
    }
}

/// Abort on fatal metadata errors, log and continue on the rest
fn skip_or_abort(err: SourceError, subject: &str) -> ReelgapResult<()> {
    if err.is_fatal() {
        return Err(ReelgapError::MetadataUnavailable(err));
    }
    warn!(subject, error = %err, "Skipping after metadata lookup failed");
    Ok(())
}

/// Undated items count as future
pub(crate) fn is_future(date: Option<NaiveDate>, today: NaiveDate) -> bool {
    date.is_none_or(|d| d > today)
}

/// Canonical items not owned, in canonical order
pub(crate) fn diff_missing<'a>(
    canonical: &[&'a CanonicalItem],
    owned_ids: &HashSet<String>,
) -> Vec<&'a CanonicalItem> {
    canonical
        .iter()
        .copied()
        .filter(|item| !owned_ids.contains(&item.id))
        .collect()
}
