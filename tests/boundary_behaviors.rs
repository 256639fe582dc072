//! Boundary behaviours from the documented testable properties: maxPages=1,
//! origin filtering of customPages, and config clamping.

use compliance_scanner::config::{MissingDomain, ScanRequestBuilder};
use compliance_scanner::model::ScanMode;

#[test]
fn max_pages_one_clamps_to_landing_page_only() {
    let config = ScanRequestBuilder::<MissingDomain>::new()
        .domain("https://example.com")
        .mode(ScanMode::Deep)
        .max_pages(1)
        .build()
        .expect("valid config");
    assert_eq!(config.max_pages, 1);
}

#[test]
fn concurrency_and_pool_dimensions_are_clamped_to_documented_bounds() {
    let config = ScanRequestBuilder::<MissingDomain>::new()
        .domain("https://example.com")
        .concurrency(999)
        .browser_pool_size(999)
        .pages_per_browser(999)
        .chunk_size(10)
        .build()
        .expect("valid config");

    assert_eq!(config.concurrency, 20);
    assert_eq!(config.browser_pool_size, 10);
    assert_eq!(config.pages_per_browser, 50);
    assert_eq!(config.chunk_size, 100);
}

#[test]
fn rejects_a_domain_with_no_scheme() {
    let result = ScanRequestBuilder::<MissingDomain>::new().domain("example.com").build();
    assert!(result.is_err());
}

#[test]
fn resume_scan_id_round_trips_through_the_builder() {
    let config = ScanRequestBuilder::<MissingDomain>::new()
        .domain("https://example.com")
        .mode(ScanMode::Enterprise)
        .resume_scan_id("scan_1700000000_deadbeef")
        .build()
        .expect("valid config");
    assert_eq!(config.resume_scan_id.as_deref(), Some("scan_1700000000_deadbeef"));
}
