//! Static vendor/domain tables of well-known analytics, advertising, and
//! CDN hosts, used both directly for vendor lookup and as feature inputs
//! to the rule engine and ML scorer.

use once_cell::sync::Lazy;
use std::collections::HashSet;

use crate::model::CookieCategory;

pub static KNOWN_ANALYTICS_DOMAINS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "google-analytics.com",
        "googletagmanager.com",
        "doubleclick.net",
        "analytics.google.com",
        "hotjar.com",
        "mixpanel.com",
        "segment.com",
        "heap.io",
        "amplitude.com",
        "matomo.org",
    ]
    .into_iter()
    .collect()
});

pub static KNOWN_ADVERTISING_DOMAINS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "facebook.com",
        "facebook.net",
        "doubleclick.net",
        "googlesyndication.com",
        "adnxs.com",
        "adsrvr.org",
        "advertising.com",
        "criteo.com",
        "taboola.com",
        "outbrain.com",
    ]
    .into_iter()
    .collect()
});

pub static KNOWN_CDN_DOMAINS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    ["cloudflare.com", "cloudfront.net", "akamai.net", "fastly.net", "cdn77.com"]
        .into_iter()
        .collect()
});

/// (cookie name, registrable domain suffix) -> category, for well-known
/// vendor cookies whose purpose is unambiguous regardless of site context.
pub static VENDOR_LIST: Lazy<Vec<(&'static str, &'static str, CookieCategory)>> = Lazy::new(|| {
    vec![
        ("_ga", "google-analytics.com", CookieCategory::Analytics),
        ("_gid", "google-analytics.com", CookieCategory::Analytics),
        ("_gat", "google-analytics.com", CookieCategory::Analytics),
        ("_hjid", "hotjar.com", CookieCategory::Analytics),
        ("_hjSessionUser", "hotjar.com", CookieCategory::Analytics),
        ("_clck", "clarity.ms", CookieCategory::Analytics),
        ("_clsk", "clarity.ms", CookieCategory::Analytics),
        ("_fbp", "facebook.com", CookieCategory::Advertising),
        ("_fbc", "facebook.com", CookieCategory::Advertising),
        ("fr", "facebook.com", CookieCategory::Advertising),
        ("IDE", "doubleclick.net", CookieCategory::Advertising),
        ("test_cookie", "doubleclick.net", CookieCategory::Advertising),
        ("bcookie", "linkedin.com", CookieCategory::Advertising),
        ("lidc", "linkedin.com", CookieCategory::Advertising),
    ]
});

pub fn is_cdn_domain(registrable_domain: &str) -> bool {
    KNOWN_CDN_DOMAINS.contains(registrable_domain)
}

pub fn domain_has_suffix(domain: &str, suffix: &str) -> bool {
    let domain = domain.trim_start_matches('.');
    domain == suffix || domain.ends_with(&format!(".{suffix}"))
}

pub fn lookup(name: &str, domain: &str) -> Option<CookieCategory> {
    VENDOR_LIST
        .iter()
        .find(|(n, d, _)| *n == name && domain_has_suffix(domain, d))
        .map(|(_, _, c)| *c)
}
