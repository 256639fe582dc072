//! Regex-and-domain-set rule engine, the second-to-last resolution layer
//! before the ML scorer. Seeded from the same pattern lists the feature
//! extractor uses, so rule-based and model-based classification agree on
//! what "looks like" an analytics or advertising cookie.

use once_cell::sync::Lazy;
use regex::RegexSet;

use crate::model::CookieCategory;
use crate::utils::domain::registrable_domain;

use super::vendor::{KNOWN_ADVERTISING_DOMAINS, KNOWN_ANALYTICS_DOMAINS};

pub const ANALYTICS_PATTERNS: &[&str] = &[
    "_ga", "_gid", "_gat", "ga_", "_utm", "_hjid", "_hjSessionUser", "_hjSession", "mp_", "mixpanel", "ajs_",
    "analytics", "heap", "_hp2_",
];

pub const ADVERTISING_PATTERNS: &[&str] = &[
    "_fbp", "_fbc", "fr", "IDE", "test_cookie", "_gcl", "criteo", "uid", "uuid", "anj", "sess",
];

pub const NECESSARY_PATTERNS: &[&str] = &[
    "session", "csrf", "xsrf", "auth", "token", "login", "consent", "cookie_consent", "PHPSESSID", "JSESSIONID",
];

pub const FUNCTIONAL_PATTERNS: &[&str] = &[
    "lang", "language", "locale", "theme", "currency", "timezone", "tz", "preference", "pref",
];

fn to_regex_set(patterns: &[&str]) -> RegexSet {
    let escaped: Vec<String> = patterns.iter().map(|p| format!("(?i){}", regex::escape(p))).collect();
    RegexSet::new(escaped).expect("static rule patterns are valid regexes")
}

static ANALYTICS_SET: Lazy<RegexSet> = Lazy::new(|| to_regex_set(ANALYTICS_PATTERNS));
static ADVERTISING_SET: Lazy<RegexSet> = Lazy::new(|| to_regex_set(ADVERTISING_PATTERNS));
static NECESSARY_SET: Lazy<RegexSet> = Lazy::new(|| to_regex_set(NECESSARY_PATTERNS));
static FUNCTIONAL_SET: Lazy<RegexSet> = Lazy::new(|| to_regex_set(FUNCTIONAL_PATTERNS));

pub fn matches_analytics_pattern(name: &str) -> bool {
    ANALYTICS_SET.is_match(name)
}

pub fn matches_advertising_pattern(name: &str) -> bool {
    ADVERTISING_SET.is_match(name)
}

pub fn matches_necessary_pattern(name: &str) -> bool {
    NECESSARY_SET.is_match(name)
}

pub fn matches_functional_pattern(name: &str) -> bool {
    FUNCTIONAL_SET.is_match(name)
}

/// Rule-engine classification: name-pattern matches first (most specific to
/// least), then domain-set membership as a fallback for cookies whose name
/// carries no signal but whose domain is a known analytics/advertising host.
pub fn classify_by_rule(name: &str, domain: &str) -> Option<(CookieCategory, Vec<String>)> {
    let mut evidence = Vec::new();
    let registrable = registrable_domain(domain);

    if matches_necessary_pattern(name) {
        evidence.push(format!("cookie name '{name}' matches a necessary-cookie pattern"));
        return Some((CookieCategory::Necessary, evidence));
    }
    if matches_advertising_pattern(name) {
        evidence.push(format!("cookie name '{name}' matches an advertising-cookie pattern"));
        return Some((CookieCategory::Advertising, evidence));
    }
    if matches_analytics_pattern(name) {
        evidence.push(format!("cookie name '{name}' matches an analytics-cookie pattern"));
        return Some((CookieCategory::Analytics, evidence));
    }
    if matches_functional_pattern(name) {
        evidence.push(format!("cookie name '{name}' matches a functional-cookie pattern"));
        return Some((CookieCategory::Functional, evidence));
    }

    if KNOWN_ANALYTICS_DOMAINS.contains(registrable.as_str()) {
        evidence.push(format!("cookie domain '{registrable}' is a known analytics vendor"));
        return Some((CookieCategory::Analytics, evidence));
    }
    if KNOWN_ADVERTISING_DOMAINS.contains(registrable.as_str()) {
        evidence.push(format!("cookie domain '{registrable}' is a known advertising vendor"));
        return Some((CookieCategory::Advertising, evidence));
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ga_cookie_classifies_analytics() {
        let (cat, evidence) = classify_by_rule("_ga", "example.com").expect("should match");
        assert_eq!(cat, CookieCategory::Analytics);
        assert!(!evidence.is_empty());
    }

    #[test]
    fn session_cookie_classifies_necessary() {
        let (cat, _) = classify_by_rule("sessionid", "example.com").expect("should match");
        assert_eq!(cat, CookieCategory::Necessary);
    }

    #[test]
    fn unknown_cookie_falls_through() {
        assert!(classify_by_rule("xk19qz", "example.com").is_none());
    }
}
