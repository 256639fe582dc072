//! Deterministic feature-weighted scorer fulfilling the same
//! `(category, probabilities[4])` inference contract a trained model would.
//!
//! Training pipelines are out of scope; this ships a 29-dimension feature
//! vector and a fixed weighting derived from the same vendor/pattern tables
//! a trained model would have learned from, so `classify()` stays pure and
//! testable without a model-file dependency.

use crate::classifier::rules::{
    matches_advertising_pattern, matches_analytics_pattern, matches_functional_pattern, matches_necessary_pattern,
};
use crate::classifier::vendor::{is_cdn_domain, KNOWN_ADVERTISING_DOMAINS, KNOWN_ANALYTICS_DOMAINS};
use crate::model::{AggregatedCookie, CookieCategory, CookieExpiry, SameSite};
use crate::utils::constants::{DURATION_LONG_DAYS, DURATION_SHORT_DAYS};
use crate::utils::domain::{is_third_party, registrable_domain};

const KNOWN_TLDS: &[&str] = &["com", "net", "org", "io", "co", "gov", "edu"];

/// Named feature vector: name (8), domain (7), duration (3), security (4),
/// behavioral (3), pattern-matching (4) dimensions — 29 total, matching the
/// original ML config's `FEATURE_NAMES` shape.
#[derive(Debug, Clone, Copy)]
pub struct FeatureVector {
    pub name_length: f64,
    pub has_underscore: f64,
    pub has_numbers: f64,
    pub has_uppercase: f64,
    pub name_entropy: f64,
    pub name_prefix_encoded: f64,
    pub name_suffix_encoded: f64,
    pub vendor_fingerprint: f64,
    pub is_third_party: f64,
    pub domain_levels: f64,
    pub tld_encoded: f64,
    pub is_cdn: f64,
    pub is_known_analytics: f64,
    pub is_known_advertising: f64,
    pub domain_entropy: f64,
    pub is_session: f64,
    pub duration_days: f64,
    pub duration_category_encoded: f64,
    pub http_only: f64,
    pub secure: f64,
    pub same_site_encoded: f64,
    pub security_score: f64,
    pub size: f64,
    pub set_after_accept: f64,
    pub path_is_root: f64,
    pub matches_analytics_pattern: f64,
    pub matches_advertising_pattern: f64,
    pub matches_necessary_pattern: f64,
    pub matches_functional_pattern: f64,
}

fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }
    let mut counts = std::collections::HashMap::new();
    for c in s.chars() {
        *counts.entry(c).or_insert(0u32) += 1;
    }
    let len = s.chars().count() as f64;
    -counts.values().map(|&c| {
        let p = c as f64 / len;
        p * p.log2()
    }).sum::<f64>()
}

/// Cheap non-cryptographic string hash (FNV-1a), used only to turn a bounded
/// categorical value into a stable `f64` feature — never for identity or
/// security purposes.
fn fnv1a(s: &str) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for b in s.bytes() {
        hash ^= b as u64;
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}

/// Cookie names are conventionally `prefix_suffix` (`_ga_id`, `sess_token`);
/// encode each half separately so the scorer can pick up on vendor-specific
/// naming conventions without needing the full name.
fn name_prefix_encoded(name: &str) -> f64 {
    let prefix = name.split('_').find(|s| !s.is_empty()).unwrap_or(name);
    (fnv1a(prefix) % 997) as f64 / 997.0
}

fn name_suffix_encoded(name: &str) -> f64 {
    let suffix = name.rsplit('_').find(|s| !s.is_empty()).unwrap_or(name);
    (fnv1a(suffix) % 997) as f64 / 997.0
}

/// Non-zero only for domains already present in one of the known vendor
/// sets: distinguishes *which* known vendor a cookie's domain belongs to,
/// rather than just whether it's third-party.
fn vendor_fingerprint(registrable: &str) -> f64 {
    if is_cdn_domain(registrable) || KNOWN_ANALYTICS_DOMAINS.contains(registrable) || KNOWN_ADVERTISING_DOMAINS.contains(registrable) {
        (fnv1a(registrable) % 1000) as f64 / 1000.0
    } else {
        0.0
    }
}

fn tld_encoded(domain: &str) -> f64 {
    let tld = domain.rsplit('.').next().unwrap_or("");
    match KNOWN_TLDS.iter().position(|&t| t == tld) {
        Some(idx) => (idx + 1) as f64 / (KNOWN_TLDS.len() + 1) as f64,
        None => 0.0,
    }
}

fn duration_category_encoded(is_session: bool, duration_days: f64) -> f64 {
    if is_session {
        0.0
    } else if duration_days <= DURATION_SHORT_DAYS as f64 {
        1.0 / 3.0
    } else if duration_days <= DURATION_LONG_DAYS as f64 {
        2.0 / 3.0
    } else {
        1.0
    }
}

fn same_site_encoded(same_site: SameSite) -> f64 {
    match same_site {
        SameSite::Strict => 1.0,
        SameSite::Lax => 2.0 / 3.0,
        SameSite::None => 1.0 / 3.0,
        SameSite::Unspecified => 0.0,
    }
}

pub fn extract_features(cookie: &AggregatedCookie, scan_target_host: &str, now: chrono::DateTime<chrono::Utc>) -> FeatureVector {
    let registrable = registrable_domain(&cookie.domain);
    let duration_days = cookie.expires.duration_days(now).unwrap_or(0) as f64;
    let is_session = matches!(cookie.expires, CookieExpiry::Session);

    FeatureVector {
        name_length: cookie.name.chars().count() as f64,
        has_underscore: f64::from(cookie.name.contains('_')),
        has_numbers: f64::from(cookie.name.chars().any(|c| c.is_ascii_digit())),
        has_uppercase: f64::from(cookie.name.chars().any(|c| c.is_ascii_uppercase())),
        name_entropy: shannon_entropy(&cookie.name),
        name_prefix_encoded: name_prefix_encoded(&cookie.name),
        name_suffix_encoded: name_suffix_encoded(&cookie.name),
        vendor_fingerprint: vendor_fingerprint(&registrable),
        is_third_party: f64::from(is_third_party(&cookie.domain, scan_target_host)),
        domain_levels: cookie.domain.split('.').count() as f64,
        tld_encoded: tld_encoded(&cookie.domain),
        is_cdn: f64::from(is_cdn_domain(&registrable)),
        is_known_analytics: f64::from(KNOWN_ANALYTICS_DOMAINS.contains(registrable.as_str())),
        is_known_advertising: f64::from(KNOWN_ADVERTISING_DOMAINS.contains(registrable.as_str())),
        domain_entropy: shannon_entropy(&cookie.domain),
        is_session: f64::from(is_session),
        duration_days,
        duration_category_encoded: duration_category_encoded(is_session, duration_days),
        http_only: f64::from(cookie.http_only),
        secure: f64::from(cookie.secure),
        same_site_encoded: same_site_encoded(cookie.same_site),
        security_score: f64::from(cookie.http_only) + f64::from(cookie.secure) + f64::from(matches!(cookie.same_site, SameSite::Strict)),
        size: cookie.size as f64,
        set_after_accept: f64::from(cookie.set_after_accept),
        path_is_root: f64::from(cookie.path == "/"),
        matches_analytics_pattern: f64::from(matches_analytics_pattern(&cookie.name)),
        matches_advertising_pattern: f64::from(matches_advertising_pattern(&cookie.name)),
        matches_necessary_pattern: f64::from(matches_necessary_pattern(&cookie.name)),
        matches_functional_pattern: f64::from(matches_functional_pattern(&cookie.name)),
    }
}

fn from_bool(v: f64) -> bool {
    v >= 0.5
}

/// Deterministic probability estimate over [Necessary, Functional, Analytics,
/// Advertising], summing to 1.0. Weights favor direct pattern/vendor
/// evidence, with security posture and duration as secondary signals.
pub fn score(features: &FeatureVector) -> [f64; 4] {
    let mut scores = [0.2_f64; 4]; // Necessary, Functional, Analytics, Advertising priors

    if from_bool(features.matches_necessary_pattern) {
        scores[0] += 0.6;
    }
    if from_bool(features.matches_functional_pattern) {
        scores[1] += 0.5;
    }
    if from_bool(features.matches_analytics_pattern) || from_bool(features.is_known_analytics) {
        scores[2] += 0.55;
    }
    if from_bool(features.matches_advertising_pattern) || from_bool(features.is_known_advertising) {
        scores[3] += 0.55;
    }

    if from_bool(features.is_third_party) {
        scores[2] += 0.1;
        scores[3] += 0.15;
    }
    if features.duration_days > DURATION_LONG_DAYS as f64 {
        scores[3] += 0.1;
    } else if features.duration_days > 0.0 && features.duration_days <= DURATION_SHORT_DAYS as f64 {
        scores[0] += 0.05;
    }
    if features.security_score >= 2.0 {
        scores[0] += 0.1;
    }
    if from_bool(features.is_cdn) {
        scores[0] += 0.05;
    }
    if from_bool(features.set_after_accept) {
        scores[0] -= 0.05;
        scores[2] += 0.025;
        scores[3] += 0.025;
    }

    let total: f64 = scores.iter().sum();
    scores.map(|s| s / total)
}

pub fn top_category(probabilities: [f64; 4]) -> (CookieCategory, f64) {
    let categories = [
        CookieCategory::Necessary,
        CookieCategory::Functional,
        CookieCategory::Analytics,
        CookieCategory::Advertising,
    ];
    let (idx, &p) = probabilities
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
        .expect("non-empty probability array");
    (categories[idx], p)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cookie(name: &str, domain: &str, expires: CookieExpiry) -> AggregatedCookie {
        AggregatedCookie {
            name: name.to_string(),
            domain: domain.to_string(),
            path: "/".to_string(),
            expires,
            http_only: false,
            secure: true,
            same_site: SameSite::Lax,
            size: 16,
            set_after_accept: false,
            found_on_pages: vec!["https://example.com/".to_string()],
        }
    }

    #[test]
    fn probabilities_sum_to_one() {
        let c = cookie("_ga", "google-analytics.com", CookieExpiry::At(chrono::Utc::now().timestamp() + 400 * 86_400));
        let f = extract_features(&c, "example.com", chrono::Utc::now());
        let probs = score(&f);
        let sum: f64 = probs.iter().sum();
        assert!((sum - 1.0).abs() < 1e-9);
    }

    #[test]
    fn known_analytics_cookie_scores_highest_on_analytics() {
        let c = cookie("_ga", "google-analytics.com", CookieExpiry::At(chrono::Utc::now().timestamp() + 400 * 86_400));
        let f = extract_features(&c, "example.com", chrono::Utc::now());
        let (cat, conf) = top_category(score(&f));
        assert_eq!(cat, CookieCategory::Analytics);
        assert!(conf > 0.4);
    }

    #[test]
    fn vendor_fingerprint_is_zero_for_unknown_domains() {
        let c = cookie("xk19qzpwm", "example.com", CookieExpiry::Session);
        let f = extract_features(&c, "example.com", chrono::Utc::now());
        assert_eq!(f.vendor_fingerprint, 0.0);
    }

    #[test]
    fn vendor_fingerprint_is_nonzero_for_known_vendor() {
        let c = cookie("_ga", "google-analytics.com", CookieExpiry::Session);
        let f = extract_features(&c, "example.com", chrono::Utc::now());
        assert!(f.vendor_fingerprint > 0.0);
    }

    #[test]
    fn path_is_root_reflects_cookie_path() {
        let mut c = cookie("sess", "example.com", CookieExpiry::Session);
        c.path = "/account".to_string();
        let f = extract_features(&c, "example.com", chrono::Utc::now());
        assert_eq!(f.path_is_root, 0.0);
    }

    #[test]
    fn duration_category_encoded_distinguishes_buckets() {
        let now = chrono::Utc::now();
        let session = cookie("a", "example.com", CookieExpiry::Session);
        let short = cookie("b", "example.com", CookieExpiry::At(now.timestamp() + 5 * 86_400));
        let long = cookie("c", "example.com", CookieExpiry::At(now.timestamp() + 400 * 86_400));

        let fs = extract_features(&session, "example.com", now);
        let fshort = extract_features(&short, "example.com", now);
        let flong = extract_features(&long, "example.com", now);

        assert_eq!(fs.duration_category_encoded, 0.0);
        assert!(fshort.duration_category_encoded < flong.duration_category_encoded);
    }
}
