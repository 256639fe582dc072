//! Checkpoint invariants: completed/pending coverage of the original URL
//! set, and resume-round-trip equivalence of the resulting cookie set.

use compliance_scanner::checkpoint::CheckpointStore;
use compliance_scanner::model::{AggregatedCookie, Checkpoint, CookieExpiry, SameSite, ScanMetrics};

fn cookie(name: &str) -> AggregatedCookie {
    AggregatedCookie {
        name: name.into(),
        domain: "example.com".into(),
        path: "/".into(),
        expires: CookieExpiry::Session,
        http_only: false,
        secure: true,
        same_site: SameSite::Lax,
        size: 4,
        found_on_pages: vec!["https://example.com/".into()],
    }
}

#[tokio::test]
async fn completed_and_pending_cover_the_input_set_without_overlap() {
    let dir = tempfile::tempdir().unwrap();
    let store = CheckpointStore::new(dir.path());

    let input_urls = vec!["https://example.com/a", "https://example.com/b", "https://example.com/c"];
    let checkpoint = Checkpoint {
        scan_id: "scan_resume_cov".into(),
        domain: "example.com".into(),
        total_urls: input_urls.len(),
        completed_urls: vec![input_urls[0].into()],
        pending_urls: vec![input_urls[1].into(), input_urls[2].into()],
        cookies: vec![cookie("_ga")],
        metrics: ScanMetrics::default(),
        timestamp: chrono::Utc::now(),
    };

    store.save(&checkpoint).await.unwrap();
    let loaded = store.load("scan_resume_cov").await.unwrap();

    let covered: std::collections::HashSet<_> = loaded.completed_urls.iter().chain(loaded.pending_urls.iter()).collect();
    let input_set: std::collections::HashSet<_> = input_urls.iter().map(|s| s.to_string()).collect();
    for url in &input_set {
        assert!(covered.contains(url));
    }

    let completed_set: std::collections::HashSet<_> = loaded.completed_urls.iter().collect();
    let pending_set: std::collections::HashSet<_> = loaded.pending_urls.iter().collect();
    assert!(completed_set.is_disjoint(&pending_set));
}

#[tokio::test]
async fn resuming_from_a_checkpoint_preserves_previously_seen_cookies() {
    use compliance_scanner::model::{CookieObservation, PageResult, StorageSnapshot};
    use compliance_scanner::scanner::aggregate::{ordered_fold, Aggregator};

    let dir = tempfile::tempdir().unwrap();
    let store = CheckpointStore::new(dir.path());

    let checkpoint = Checkpoint {
        scan_id: "scan_resume_eq".into(),
        domain: "example.com".into(),
        total_urls: 2,
        completed_urls: vec!["https://example.com/a".into()],
        pending_urls: vec!["https://example.com/b".into()],
        cookies: vec![cookie("_ga")],
        metrics: ScanMetrics::default(),
        timestamp: chrono::Utc::now(),
    };
    store.save(&checkpoint).await.unwrap();
    let loaded = store.load("scan_resume_eq").await.unwrap();

    // Resuming seeds an aggregator with the checkpoint's cookies, then folds
    // in results for the still-pending URLs.
    let mut resumed = Aggregator::new();
    resumed.seed(loaded.cookies.clone());
    let remaining = PageResult {
        url: "https://example.com/b".into(),
        success: true,
        cookies: vec![CookieObservation {
            name: "session_id".into(),
            value: "v".into(),
            domain: "example.com".into(),
            path: "/".into(),
            expires: CookieExpiry::Session,
            http_only: true,
            secure: true,
            same_site: SameSite::Strict,
            size: 10,
        }],
        storage: StorageSnapshot::default(),
        duration_seconds: 0.1,
        retries: 0,
        error: None,
    };
    ordered_fold(&mut resumed, vec![(1, remaining.url.clone(), remaining)]);

    // A scan run straight through over both URLs with the same cookies
    // present yields an equivalent cookie set.
    let mut straight_through = Aggregator::new();
    let a = PageResult { url: "https://example.com/a".into(), success: true, cookies: vec![CookieObservation { name: "_ga".into(), value: "v".into(), domain: "example.com".into(), path: "/".into(), expires: CookieExpiry::Session, http_only: false, secure: true, same_site: SameSite::Lax, size: 4 }], storage: StorageSnapshot::default(), duration_seconds: 0.1, retries: 0, error: None };
    let b = PageResult { url: "https://example.com/b".into(), success: true, cookies: vec![CookieObservation { name: "session_id".into(), value: "v".into(), domain: "example.com".into(), path: "/".into(), expires: CookieExpiry::Session, http_only: true, secure: true, same_site: SameSite::Strict, size: 10 }], storage: StorageSnapshot::default(), duration_seconds: 0.1, retries: 0, error: None };
    ordered_fold(&mut straight_through, vec![(0, a.url.clone(), a), (1, b.url.clone(), b)]);

    let (resumed_cookies, ..) = resumed.into_parts();
    let (straight_cookies, ..) = straight_through.into_parts();

    let mut resumed_names: Vec<_> = resumed_cookies.iter().map(|c| c.name.clone()).collect();
    let mut straight_names: Vec<_> = straight_cookies.iter().map(|c| c.name.clone()).collect();
    resumed_names.sort();
    straight_names.sort();
    assert_eq!(resumed_names, straight_names);
}
