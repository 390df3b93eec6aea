//! Missing movies in collections

use crate::clock::{self, Clock};
use crate::error::ReelgapResult;
use crate::gaps::models::{CanonicalItem, CollectionGap, MissingMovie, MovieGapReport};
use crate::gaps::policy::MoviePolicy;
use crate::gaps::progress::ProgressSender;
use crate::gaps::source::{LibrarySource, MetadataSource};
use crate::gaps::{collect_groups, diff_missing, fetch_canonical, is_future};
use std::sync::Arc;
use tracing::{debug, info};

/// Finds movies missing from collections the user has started
pub struct MovieGapFinder {
    library: Arc<dyn LibrarySource>,
    metadata: Arc<dyn MetadataSource>,
    policy: MoviePolicy,
    clock: Arc<dyn Clock>,
    progress: ProgressSender,
}

impl MovieGapFinder {
    pub fn new(
        library: Arc<dyn LibrarySource>,
        metadata: Arc<dyn MetadataSource>,
        policy: MoviePolicy,
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

    pub fn policy(&self) -> &MoviePolicy {
        &self.policy
    }

    /// Scan one movie library and report incomplete collections
    pub async fn find_gaps(&self, library_name: &str) -> ReelgapResult<MovieGapReport> {
        info!(library = library_name, "Scanning movie library");

        let owned = collect_groups(
            self.library.as_ref(),
            self.metadata.as_ref(),
            library_name,
            "movies",
            &self.progress,
        )
        .await?;

        let today = self.clock.now().date_naive();
        let total_groups = owned.groups.len();
        let mut collections_with_gaps = Vec::new();

        for (i, (group, _items)) in owned.groups.iter().enumerate() {
            self.progress
                .emit(format!("Analyzing: {}", group.name), i + 1, Some(total_groups));

            if self.policy.is_excluded(&group.name) {
                debug!(collection = %group.name, "Excluded collection");
                continue;
            }

            let Some(set) = fetch_canonical(self.metadata.as_ref(), group).await? else {
                continue;
            };

            let canonical: Vec<&CanonicalItem> = set
                .items
                .iter()
                .filter(|item| self.policy.include_future || !is_future(item.date, today))
                .collect();

            if canonical.len() < self.policy.min_collection_size {
                debug!(
                    collection = %group.name,
                    size = canonical.len(),
                    "Collection below minimum size"
                );
                continue;
            }

            let missing = diff_missing(&canonical, &owned.owned_ids);
            if missing.is_empty() {
                continue;
            }

            let owned_movies = canonical.len() - missing.len();
            if owned_movies < self.policy.min_owned {
                debug!(
                    collection = %group.name,
                    owned = owned_movies,
                    "Too few owned movies to report"
                );
                continue;
            }

            collections_with_gaps.push(CollectionGap {
                collection_id: group.id.clone(),
                collection_name: set.name.clone(),
                total_movies: canonical.len(),
                owned_movies,
                missing_movies: missing.into_iter().map(MissingMovie::from).collect(),
            });
        }

        let report = MovieGapReport {
            library_name: library_name.to_string(),
            total_movies_scanned: owned.total_scanned,
            movies_with_tmdb_id: owned.with_external_id,
            movies_in_collections: owned.in_groups,
            unique_collections: total_groups,
            collections_with_gaps,
        };

        info!(
            library = library_name,
            collections = report.unique_collections,
            missing = report.total_missing(),
            "Movie scan complete"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::error::{ReelgapError, Service, SourceError};
    use crate::gaps::progress;
    use crate::gaps::testing::{canonical, FakeLibrary, FakeMetadata};
    use chrono::{TimeZone, Utc};

    fn clock() -> Arc<dyn Clock> {
        Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2025, 1, 25, 12, 0, 0).unwrap(),
        ))
    }

    fn alien_metadata() -> FakeMetadata {
        FakeMetadata::default()
            .with_membership("348", "8091", "Alien Collection")
            .with_set(
                "8091",
                "Alien Collection",
                vec![
                    canonical("348", "Alien", "1979-05-25"),
                    canonical("679", "Aliens", "1986-07-18"),
                    canonical("8077", "Alien³", "1992-05-22"),
                ],
            )
    }

    fn finder(library: FakeLibrary, metadata: FakeMetadata, policy: MoviePolicy) -> MovieGapFinder {
        MovieGapFinder::new(Arc::new(library), Arc::new(metadata), policy).with_clock(clock())
    }

    fn lenient() -> MoviePolicy {
        MoviePolicy {
            min_owned: 1,
            ..MoviePolicy::default()
        }
    }

    #[tokio::test]
    async fn reports_missing_movies_in_canonical_order() {
        let library = FakeLibrary::movies(&[("348", "Alien")]);
        let report = finder(library, alien_metadata(), lenient())
            .find_gaps("Movies")
            .await
            .unwrap();

        assert_eq!(report.total_movies_scanned, 1);
        assert_eq!(report.movies_in_collections, 1);
        assert_eq!(report.unique_collections, 1);
        assert_eq!(report.collections_with_gaps.len(), 1);

        let gap = &report.collections_with_gaps[0];
        assert_eq!(gap.collection_name, "Alien Collection");
        assert_eq!((gap.owned_movies, gap.total_movies), (1, 3));
        let ids: Vec<&str> = gap.missing_movies.iter().map(|m| m.tmdb_id.as_str()).collect();
        assert_eq!(ids, vec!["679", "8077"]);
        assert_eq!(gap.owned_movies + gap.missing_count(), gap.total_movies);
        assert_eq!(report.total_missing(), 2);
    }

    #[tokio::test]
    async fn future_movies_are_dropped_unless_included() {
        let metadata = || {
            FakeMetadata::default()
                .with_membership("348", "1", "Saga")
                .with_set(
                    "1",
                    "Saga",
                    vec![
                        canonical("348", "Alien", "1979-05-25"),
                        canonical("999", "Sequel", "2099-12-31"),
                    ],
                )
        };
        let policy = MoviePolicy {
            min_collection_size: 1,
            min_owned: 1,
            ..MoviePolicy::default()
        };

        let excluded = finder(FakeLibrary::movies(&[("348", "Alien")]), metadata(), policy.clone())
            .find_gaps("Movies")
            .await
            .unwrap();
        assert!(excluded.collections_with_gaps.is_empty());
        assert_eq!(excluded.total_missing(), 0);

        let included = finder(
            FakeLibrary::movies(&[("348", "Alien")]),
            metadata(),
            MoviePolicy {
                include_future: true,
                ..policy
            },
        )
        .find_gaps("Movies")
        .await
        .unwrap();
        let gap = &included.collections_with_gaps[0];
        assert_eq!(gap.missing_movies.len(), 1);
        assert_eq!(gap.missing_movies[0].title, "Sequel");
        assert_eq!(gap.total_movies, 2);
    }

    #[tokio::test]
    async fn empty_library_yields_empty_report() {
        let report = finder(FakeLibrary::movies(&[]), FakeMetadata::default(), lenient())
            .find_gaps("Movies")
            .await
            .unwrap();

        assert_eq!(report.total_movies_scanned, 0);
        assert_eq!(report.unique_collections, 0);
        assert!(report.collections_with_gaps.is_empty());
    }

    #[tokio::test]
    async fn movies_without_ids_or_collections_are_counted_only() {
        let library = FakeLibrary::movies(&[("", "Home Video"), ("550", "Fight Club")]);
        let report = finder(library, FakeMetadata::default(), lenient())
            .find_gaps("Movies")
            .await
            .unwrap();

        assert_eq!(report.total_movies_scanned, 2);
        assert_eq!(report.movies_with_tmdb_id, 1);
        assert_eq!(report.movies_in_collections, 0);
        assert_eq!(report.unique_collections, 0);
    }

    #[tokio::test]
    async fn complete_collection_has_no_gap_record() {
        let library = FakeLibrary::movies(&[("348", "Alien"), ("679", "Aliens"), ("8077", "Alien³")]);
        let metadata = alien_metadata()
            .with_membership("679", "8091", "Alien Collection")
            .with_membership("8077", "8091", "Alien Collection");

        let report = finder(library, metadata, lenient())
            .find_gaps("Movies")
            .await
            .unwrap();

        assert_eq!(report.unique_collections, 1);
        assert!(report.collections_with_gaps.is_empty());
        assert_eq!(report.complete_collections(), 1);
    }

    #[tokio::test]
    async fn min_owned_suppresses_barely_started_collections() {
        let library = FakeLibrary::movies(&[("348", "Alien")]);
        let report = finder(library, alien_metadata(), MoviePolicy::default())
            .find_gaps("Movies")
            .await
            .unwrap();

        assert_eq!(report.unique_collections, 1);
        assert!(report.collections_with_gaps.is_empty());
    }

    #[tokio::test]
    async fn min_collection_size_uses_filtered_list() {
        let metadata = FakeMetadata::default()
            .with_membership("1", "10", "Duology")
            .with_set(
                "10",
                "Duology",
                vec![canonical("1", "First", "2000-01-01"), canonical("2", "Second", "2099-01-01")],
            );
        let report = finder(FakeLibrary::movies(&[("1", "First")]), metadata, lenient())
            .find_gaps("Movies")
            .await
            .unwrap();

        assert!(report.collections_with_gaps.is_empty());
    }

    #[tokio::test]
    async fn excluded_collections_are_never_fetched() {
        let metadata = alien_metadata();
        let policy = MoviePolicy {
            excluded_collections: ["Alien Collection".to_string()].into_iter().collect(),
            ..lenient()
        };
        let metadata = Arc::new(metadata);
        let finder = MovieGapFinder::new(
            Arc::new(FakeLibrary::movies(&[("348", "Alien")])),
            metadata.clone(),
            policy,
        )
        .with_clock(clock());

        let report = finder.find_gaps("Movies").await.unwrap();
        assert!(report.collections_with_gaps.is_empty());
        assert!(metadata.fetched().is_empty());
    }

    #[tokio::test]
    async fn transient_failures_skip_the_item() {
        let library = FakeLibrary::movies(&[("1", "Broken"), ("348", "Alien")]);
        let metadata = alien_metadata().with_resolve_error(
            "1",
            SourceError::Timeout {
                service: Service::Tmdb,
            },
        );

        let report = finder(library, metadata, lenient())
            .find_gaps("Movies")
            .await
            .unwrap();
        assert_eq!(report.movies_with_tmdb_id, 2);
        assert_eq!(report.movies_in_collections, 1);
        assert_eq!(report.collections_with_gaps.len(), 1);
    }

    #[tokio::test]
    async fn connection_reset_skips_the_item() {
        let library = FakeLibrary::movies(&[("1", "Broken"), ("348", "Alien")]);
        let metadata = alien_metadata().with_resolve_error(
            "1",
            SourceError::Interrupted {
                service: Service::Tmdb,
                reason: "connection reset by peer".into(),
            },
        );

        let report = finder(library, metadata, lenient())
            .find_gaps("Movies")
            .await
            .unwrap();
        assert_eq!(report.collections_with_gaps.len(), 1);
    }

    #[tokio::test]
    async fn transient_group_failure_skips_the_group() {
        let metadata = alien_metadata().with_fetch_error(
            "8091",
            SourceError::Http {
                service: Service::Tmdb,
                status: 502,
            },
        );
        let report = finder(FakeLibrary::movies(&[("348", "Alien")]), metadata, lenient())
            .find_gaps("Movies")
            .await
            .unwrap();

        assert_eq!(report.unique_collections, 1);
        assert!(report.collections_with_gaps.is_empty());
    }

    #[tokio::test]
    async fn fatal_metadata_failure_aborts_scan() {
        let metadata = alien_metadata().with_resolve_error(
            "348",
            SourceError::Unauthorized {
                service: Service::Tmdb,
            },
        );
        let err = finder(FakeLibrary::movies(&[("348", "Alien")]), metadata, lenient())
            .find_gaps("Movies")
            .await
            .unwrap_err();

        assert!(matches!(err, ReelgapError::MetadataUnavailable(_)));
    }

    #[tokio::test]
    async fn unreachable_library_aborts_scan() {
        let library = FakeLibrary::failing(SourceError::Unreachable {
            service: Service::Plex,
            reason: "connection refused".into(),
        });
        let err = finder(library, alien_metadata(), lenient())
            .find_gaps("Movies")
            .await
            .unwrap_err();

        assert!(matches!(err, ReelgapError::LibraryUnavailable(_)));
    }

    #[tokio::test]
    async fn progress_events_cover_every_phase() {
        let (tx, mut rx) = progress::channel();
        let library = FakeLibrary::movies(&[("348", "Alien"), ("550", "Fight Club")]);
        let finder = finder(library, alien_metadata(), lenient()).with_progress(tx);

        finder.find_gaps("Movies").await.unwrap();
        drop(finder);

        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push((event.label, event.current, event.total));
        }

        assert_eq!(
            events,
            vec![
                ("Fetching movies from Fake Plex".to_string(), 0, None),
                ("Checking: Alien".to_string(), 1, Some(2)),
                ("Checking: Fight Club".to_string(), 2, Some(2)),
                ("Analyzing: Alien Collection".to_string(), 1, Some(1)),
            ]
        );
    }
}
