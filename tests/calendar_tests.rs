//! Calendar cache behaviour through the public service API.

use chrono::{Duration, NaiveDate, TimeZone, Utc};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tvcal::calendar::{ChangeNotifier, EpisodeSource, SourceError};
use tvcal::config::CalendarConfig;
use tvcal::domain::events::CalendarNotification;
use tvcal::domain::{CalendarMode, DayKey, EpisodeId, SeriesId};
use tvcal::library::JsonLibrary;
use tvcal::models::{EpisodeRecord, SeriesRecord};
use tvcal::{CalendarService, SetDateOutcome};

/// Wraps a library and records every range it is asked for.
struct CountingSource {
    inner: Arc<JsonLibrary>,
    calls: AtomicUsize,
    ranges: Mutex<Vec<(i64, i64)>>,
}

#[async_trait::async_trait]
impl EpisodeSource for CountingSource {
    async fn fetch_range(
        &self,
        start_ms: i64,
        end_ms: i64,
    ) -> Result<Vec<EpisodeRecord>, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.ranges.lock().unwrap().push((start_ms, end_ms));
        self.inner.fetch_range(start_ms, end_ms).await
    }
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn series(id: i64, title: &str) -> SeriesRecord {
    SeriesRecord {
        id: SeriesId::new(id),
        title: title.to_string(),
        network: None,
        fanart: None,
    }
}

fn episode(id: i64, series_id: i64, number: i32, aired: chrono::DateTime<Utc>) -> EpisodeRecord {
    EpisodeRecord {
        id: EpisodeId::new(id),
        series_id: SeriesId::new(series_id),
        firstaired: Some(aired.timestamp_millis()),
        firstaired_iso: Some(aired.to_rfc3339()),
        seasonnumber: 1,
        episodenumber: number,
        title: Some(format!("Episode {number}")),
        watched: false,
    }
}

fn evening(y: i32, m: u32, d: u32) -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 20, 0, 0).unwrap()
}

fn default_series() -> Vec<SeriesRecord> {
    vec![
        series(1, "Dark"),
        series(2, "Lost"),
        series(3, "Atlanta"),
    ]
}

fn default_episodes() -> Vec<EpisodeRecord> {
    let t = evening(2020, 6, 10);
    vec![
        episode(101, 1, 4, t),
        episode(102, 1, 3, t),
        episode(201, 2, 1, t),
        episode(301, 3, 7, t),
        episode(302, 3, 8, evening(2020, 6, 12)),
        // outside any week window around 10 June
        episode(303, 3, 9, evening(2020, 8, 1)),
    ]
}

fn service_with(
    series: Vec<SeriesRecord>,
    episodes: Vec<EpisodeRecord>,
) -> (CalendarService, Arc<CountingSource>) {
    let library = Arc::new(JsonLibrary::in_memory(series, episodes));
    let source = Arc::new(CountingSource {
        inner: library.clone(),
        calls: AtomicUsize::new(0),
        ranges: Mutex::new(Vec::new()),
    });
    let service = CalendarService::new(
        CalendarConfig::default(),
        source.clone(),
        library,
        ChangeNotifier::new(64),
    )
    .expect("valid calendar config");
    (service, source)
}

fn ids(events: &[tvcal::CalendarEvent]) -> Vec<i64> {
    events.iter().map(|e| e.episode_id.value()).collect()
}

#[tokio::test]
async fn empty_before_first_fetch_and_after_clear() {
    let (service, _) = service_with(default_series(), default_episodes());
    let day = date(2020, 6, 10);

    assert!(!service.has_event(day).await);
    assert!(service.get_events(day).await.is_empty());

    service.set_date(day, None).await.unwrap();
    assert!(service.has_event(day).await);

    service.clear_cache().await;
    assert!(!service.has_event(day).await);
    assert!(service.get_events(day).await.is_empty());
    assert_eq!(service.last_resolved_start().await, None);
}

#[tokio::test]
async fn set_date_fetches_week_window_and_sorts_buckets() {
    let (service, source) = service_with(default_series(), default_episodes());

    let outcome = service.set_date(date(2020, 6, 10), None).await.unwrap();
    let SetDateOutcome::Fetched { window, stats } = outcome else {
        panic!("expected a fetch");
    };
    assert_eq!(window.start, date(2020, 5, 31));
    assert_eq!(window.end, date(2020, 6, 17));
    assert_eq!(stats.inserted, 5);

    let ranges = source.ranges.lock().unwrap().clone();
    assert_eq!(
        ranges,
        vec![(
            Utc.with_ymd_and_hms(2020, 5, 31, 0, 0, 0).unwrap().timestamp_millis(),
            Utc.with_ymd_and_hms(2020, 6, 17, 0, 0, 0).unwrap().timestamp_millis(),
        )]
    );

    // Same instant: Atlanta < Dark < Lost by title, Dark episodes by number.
    let bucket = service.get_events(date(2020, 6, 10)).await;
    assert_eq!(ids(&bucket), vec![301, 102, 101, 201]);

    assert_eq!(ids(&service.get_events(date(2020, 6, 12)).await), vec![302]);
    assert!(!service.has_event(date(2020, 8, 1)).await);
}

#[tokio::test]
async fn anchors_resolving_to_same_start_fetch_once() {
    let (service, source) = service_with(default_series(), default_episodes());

    service.set_date(date(2020, 6, 8), None).await.unwrap();
    let again = service.set_date(date(2020, 6, 13), None).await.unwrap();

    assert!(matches!(again, SetDateOutcome::AlreadyResolved { .. }));
    assert_eq!(source.calls.load(Ordering::SeqCst), 1);

    service.set_date(date(2020, 6, 14), None).await.unwrap();
    assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    assert_eq!(
        service.last_resolved_start().await,
        Some(DayKey::from(date(2020, 6, 7)))
    );

    // Back to the first week: the guard only remembers the last start.
    service.set_date(date(2020, 6, 10), None).await.unwrap();
    assert_eq!(source.calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn concurrent_requests_for_one_window_fetch_once() {
    let (service, source) = service_with(default_series(), default_episodes());

    let (a, b) = tokio::join!(
        service.set_date(date(2020, 6, 10), None),
        service.set_date(date(2020, 6, 11), None),
    );
    a.unwrap();
    b.unwrap();

    assert_eq!(source.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn month_mode_uses_wide_window() {
    let (service, source) = service_with(default_series(), default_episodes());

    let outcome = service
        .set_date(date(2020, 6, 10), Some(CalendarMode::Month))
        .await
        .unwrap();
    let SetDateOutcome::Fetched { window, .. } = outcome else {
        panic!("expected a fetch");
    };
    assert_eq!(window.start, date(2020, 4, 14));
    assert_eq!(window.end, date(2020, 7, 10));
    assert_eq!(source.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn refetching_same_range_does_not_duplicate() {
    let (service, source) = service_with(default_series(), default_episodes());
    let outcome = service.set_date(date(2020, 6, 10), None).await.unwrap();
    let SetDateOutcome::Fetched { window, .. } = outcome else {
        panic!("expected a fetch");
    };

    let stats = service.get_events_for_date_range(window).await.unwrap();

    assert_eq!(stats.inserted, 0);
    assert_eq!(stats.updated, 5);
    assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    assert_eq!(service.get_events(date(2020, 6, 10)).await.len(), 4);
}

#[tokio::test]
async fn merged_batch_is_broadcast_as_is() {
    let (service, _) = service_with(default_series(), default_episodes());
    let mut rx = service.subscribe();

    service.set_date(date(2020, 6, 10), None).await.unwrap();

    match rx.recv().await.unwrap() {
        CalendarNotification::EventsMerged { events } => {
            let mut got = ids(&events);
            got.sort_unstable();
            assert_eq!(got, vec![101, 102, 201, 301, 302]);
        }
        other => panic!("unexpected notification: {other:?}"),
    }

    service.clear_cache().await;
    assert!(matches!(
        rx.recv().await.unwrap(),
        CalendarNotification::CacheCleared
    ));
}

#[tokio::test]
async fn episode_update_moves_between_days() {
    let (service, _) = service_with(default_series(), default_episodes());
    service.set_date(date(2020, 6, 10), None).await.unwrap();
    let mut rx = service.subscribe();

    // E1 = 102 (Dark, episode 3) gets pushed back a day.
    let moved = episode(102, 1, 3, evening(2020, 6, 10) + Duration::days(1));
    let stats = service.apply_episode_update(moved).await.unwrap();

    assert_eq!(stats.moved, 1);
    assert_eq!(ids(&service.get_events(date(2020, 6, 10)).await), vec![301, 101, 201]);

    let next_day = service.get_events(date(2020, 6, 11)).await;
    assert_eq!(ids(&next_day), vec![102]);
    assert_eq!(next_day[0].episode_number, 3);
    assert_eq!(next_day[0].series_title, "Dark");

    match rx.recv().await.unwrap() {
        CalendarNotification::EventsMerged { events } => assert_eq!(ids(&events), vec![102]),
        other => panic!("unexpected notification: {other:?}"),
    }
}

#[tokio::test]
async fn watched_toggle_updates_in_place() {
    let (service, _) = service_with(default_series(), default_episodes());
    service.set_date(date(2020, 6, 10), None).await.unwrap();

    let mut toggled = episode(201, 2, 1, evening(2020, 6, 10));
    toggled.watched = true;
    let stats = service.apply_episode_update(toggled.clone()).await.unwrap();
    assert_eq!(stats.updated, 1);

    service.apply_episode_update(toggled).await.unwrap();

    let bucket = service.get_events(date(2020, 6, 10)).await;
    assert_eq!(ids(&bucket), vec![301, 102, 101, 201]);
    let lost: Vec<_> = bucket.iter().filter(|e| e.episode_id.value() == 201).collect();
    assert_eq!(lost.len(), 1);
    assert!(lost[0].episode.watched);
}

#[tokio::test]
async fn malformed_update_is_rejected_without_touching_cache() {
    let (service, _) = service_with(default_series(), default_episodes());
    service.set_date(date(2020, 6, 10), None).await.unwrap();

    let mut broken = episode(101, 1, 4, evening(2020, 6, 10));
    broken.firstaired = None;
    broken.firstaired_iso = None;

    assert!(service.apply_episode_update(broken).await.is_err());
    assert_eq!(
        service.locate(EpisodeId::new(101)).await,
        Some(DayKey::from(date(2020, 6, 10)))
    );
}

#[tokio::test]
async fn no_followed_series_skips_fetch() {
    let (service, source) = service_with(Vec::new(), default_episodes());

    let outcome = service.set_date(date(2020, 6, 10), None).await.unwrap();

    assert_eq!(outcome, SetDateOutcome::NoSeries);
    assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    assert_eq!(service.last_resolved_start().await, None);
}

#[tokio::test]
async fn favorites_changed_clears_and_refetches_today() {
    let (service, source) = service_with(default_series(), default_episodes());
    service.set_date(date(2020, 6, 10), None).await.unwrap();

    let outcome = service.favorites_changed(date(2020, 6, 10)).await.unwrap();

    assert!(matches!(outcome, SetDateOutcome::Fetched { .. }));
    assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    assert_eq!(service.get_events(date(2020, 6, 10)).await.len(), 4);
}

#[tokio::test]
async fn file_backed_library_feeds_the_calendar() {
    let path = std::env::temp_dir().join(format!("tvcal-library-{}.json", uuid::Uuid::new_v4()));
    let json = r#"{
        "series": [{ "TVDB_ID": 1, "title": "Dark" }],
        "episodes": [
            { "TVDB_ID": 11, "ID_Serie": 1, "firstaired_iso": "2020-06-10T20:00:00Z",
              "seasonnumber": 1, "episodenumber": 2 },
            { "TVDB_ID": 12, "ID_Serie": 1, "seasonnumber": 1, "episodenumber": 3 }
        ]
    }"#;
    tokio::fs::write(&path, json).await.unwrap();

    let library = Arc::new(JsonLibrary::open(&path).await.unwrap());
    let service = CalendarService::new(
        CalendarConfig::default(),
        library.clone(),
        library.clone(),
        ChangeNotifier::new(8),
    )
    .unwrap();

    service.set_date(date(2020, 6, 10), None).await.unwrap();
    assert_eq!(ids(&service.get_events(date(2020, 6, 10)).await), vec![11]);

    let updated = library.set_watched(EpisodeId::new(11), true).await.unwrap();
    library.save().await.unwrap();
    service.apply_episode_update(updated).await.unwrap();
    assert!(service.get_events(date(2020, 6, 10)).await[0].episode.watched);

    let reopened = JsonLibrary::open(&path).await.unwrap();
    tokio::fs::remove_file(&path).await.ok();
    assert_eq!(reopened.series_count().await, 1);
    let found = reopened
        .fetch_range(
            Utc.with_ymd_and_hms(2020, 6, 10, 0, 0, 0).unwrap().timestamp_millis(),
            Utc.with_ymd_and_hms(2020, 6, 11, 0, 0, 0).unwrap().timestamp_millis(),
        )
        .await
        .unwrap();
    assert!(found[0].watched);
}

#[tokio::test]
async fn refresh_library_picks_up_newly_followed_series() {
    let path = std::env::temp_dir().join(format!("tvcal-library-{}.json", uuid::Uuid::new_v4()));
    let before = r#"{
        "series": [{ "TVDB_ID": 1, "title": "Dark" }],
        "episodes": [
            { "TVDB_ID": 11, "ID_Serie": 1, "firstaired_iso": "2020-06-10T20:00:00Z",
              "seasonnumber": 1, "episodenumber": 2 }
        ]
    }"#;
    tokio::fs::write(&path, before).await.unwrap();

    let library = Arc::new(JsonLibrary::open(&path).await.unwrap());
    let state = tvcal::state::SharedState::from_library(tvcal::Config::default(), library).unwrap();
    state.calendar.set_date(date(2020, 6, 10), None).await.unwrap();
    assert_eq!(ids(&state.calendar.get_events(date(2020, 6, 10)).await), vec![11]);

    let after = r#"{
        "series": [{ "TVDB_ID": 1, "title": "Dark" }, { "TVDB_ID": 2, "title": "Lost" }],
        "episodes": [
            { "TVDB_ID": 11, "ID_Serie": 1, "firstaired_iso": "2020-06-10T20:00:00Z",
              "seasonnumber": 1, "episodenumber": 2 },
            { "TVDB_ID": 21, "ID_Serie": 2, "firstaired_iso": "2020-06-10T20:00:00Z",
              "seasonnumber": 4, "episodenumber": 1 }
        ]
    }"#;
    tokio::fs::write(&path, after).await.unwrap();

    let outcome = state.refresh_library(date(2020, 6, 10)).await.unwrap();
    tokio::fs::remove_file(&path).await.ok();

    assert!(matches!(outcome, SetDateOutcome::Fetched { .. }));
    assert_eq!(ids(&state.calendar.get_events(date(2020, 6, 10)).await), vec![11, 21]);
    assert_eq!(state.config.calendar.default_mode, CalendarMode::Week);
}
