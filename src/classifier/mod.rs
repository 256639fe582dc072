//! Cookie Classifier: resolves a single cookie to a category, confidence,
//! source, and evidence trail. Never fails — internal errors degrade to
//! `Unknown`/`Fallback` per the propagation policy.

pub mod ml;
pub mod rules;
pub mod vendor;

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::Utc;

use crate::model::{AggregatedCookie, ClassificationSource, ClassifiedCookie, CookieCategory};
use crate::utils::constants::{CONFIDENCE_HIGH, CONFIDENCE_MEDIUM};

/// Key: (domain_config_id, cookie_name, cookie_domain).
type OverrideKey = (String, String, String);

/// Per-domain override table, the highest-priority resolution layer.
#[derive(Debug, Default)]
pub struct OverrideTable {
    entries: RwLock<HashMap<OverrideKey, CookieCategory>>,
}

impl OverrideTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, domain_config_id: &str, cookie_name: &str, cookie_domain: &str, category: CookieCategory) {
        self.entries.write().expect("override table lock poisoned").insert(
            (domain_config_id.to_string(), cookie_name.to_string(), cookie_domain.to_string()),
            category,
        );
    }

    fn get(&self, domain_config_id: &str, cookie_name: &str, cookie_domain: &str) -> Option<CookieCategory> {
        self.entries
            .read()
            .expect("override table lock poisoned")
            .get(&(domain_config_id.to_string(), cookie_name.to_string(), cookie_domain.to_string()))
            .copied()
    }
}

#[derive(Debug, Default)]
pub struct CookieClassifier {
    overrides: OverrideTable,
}

impl CookieClassifier {
    pub fn new() -> Self {
        Self { overrides: OverrideTable::new() }
    }

    pub fn overrides(&self) -> &OverrideTable {
        &self.overrides
    }

    /// Classify one cookie against a scan target host, following the
    /// resolution order: override -> vendor list -> rule engine -> ML scorer.
    pub fn classify(&self, cookie: &AggregatedCookie, domain_config_id: &str, scan_target_host: &str) -> ClassifiedCookie {
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            self.classify_inner(cookie, domain_config_id, scan_target_host)
        }));

        match result {
            Ok(classified) => classified,
            Err(_) => ClassifiedCookie {
                cookie: cookie.clone(),
                category: CookieCategory::Unknown,
                confidence: 0.0,
                source: ClassificationSource::Fallback,
                evidence: vec!["internal classifier error".to_string()],
                requires_review: true,
            },
        }
    }

    fn classify_inner(&self, cookie: &AggregatedCookie, domain_config_id: &str, scan_target_host: &str) -> ClassifiedCookie {
        if let Some(category) = self.overrides.get(domain_config_id, &cookie.name, &cookie.domain) {
            return finish(cookie, category, 1.0, ClassificationSource::Override, vec!["matched per-domain override".into()]);
        }

        if let Some(category) = vendor::lookup(&cookie.name, &cookie.domain) {
            return finish(
                cookie,
                category,
                1.0,
                ClassificationSource::VendorList,
                vec![format!("'{}' matches the embedded vendor registry", cookie.name)],
            );
        }

        if let Some((category, evidence)) = rules::classify_by_rule(&cookie.name, &cookie.domain) {
            return finish(cookie, category, 0.95, ClassificationSource::Rule, evidence);
        }

        let features = ml::extract_features(cookie, scan_target_host, Utc::now());
        let probabilities = ml::score(&features);
        let (category, confidence) = ml::top_category(probabilities);

        let evidence = vec![format!(
            "ml scorer top feature weights: entropy={:.2} third_party={} duration_days={:.0}",
            features.name_entropy, features.is_third_party >= 0.5, features.duration_days
        )];

        if confidence >= CONFIDENCE_HIGH {
            finish(cookie, category, confidence, ClassificationSource::Ml, evidence)
        } else if confidence >= CONFIDENCE_MEDIUM {
            let mut classified = finish(cookie, category, confidence, ClassificationSource::Ml, evidence);
            classified.requires_review = true;
            classified
        } else {
            finish(
                cookie,
                CookieCategory::Unknown,
                confidence,
                ClassificationSource::Fallback,
                vec!["no resolution layer reached sufficient confidence".into()],
            )
        }
    }
}

fn finish(
    cookie: &AggregatedCookie,
    category: CookieCategory,
    confidence: f64,
    source: ClassificationSource,
    evidence: Vec<String>,
) -> ClassifiedCookie {
    let requires_review = confidence < CONFIDENCE_MEDIUM || category == CookieCategory::Unknown;
    ClassifiedCookie {
        cookie: cookie.clone(),
        category,
        confidence,
        source,
        evidence,
        requires_review,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CookieExpiry, SameSite};

    fn sample_cookie(name: &str, domain: &str) -> AggregatedCookie {
        AggregatedCookie {
            name: name.into(),
            domain: domain.into(),
            path: "/".into(),
            expires: CookieExpiry::Session,
            http_only: false,
            secure: true,
            same_site: SameSite::Lax,
            size: 8,
            set_after_accept: false,
            found_on_pages: vec!["https://example.com/".into()],
        }
    }

    #[test]
    fn override_wins_over_everything() {
        let classifier = CookieClassifier::new();
        classifier.overrides().set("cfg-1", "mystery", "example.com", CookieCategory::Necessary);
        let result = classifier.classify(&sample_cookie("mystery", "example.com"), "cfg-1", "example.com");
        assert_eq!(result.category, CookieCategory::Necessary);
        assert_eq!(result.source, ClassificationSource::Override);
        assert_eq!(result.confidence, 1.0);
    }

    #[test]
    fn vendor_cookie_classifies_without_rules() {
        let classifier = CookieClassifier::new();
        let result = classifier.classify(&sample_cookie("_fbp", "facebook.com"), "cfg-1", "example.com");
        assert_eq!(result.category, CookieCategory::Advertising);
        assert_eq!(result.source, ClassificationSource::VendorList);
    }

    #[test]
    fn evidence_always_present() {
        let classifier = CookieClassifier::new();
        let result = classifier.classify(&sample_cookie("xk19qzpwm", "example.com"), "cfg-1", "example.com");
        assert!(!result.evidence.is_empty());
    }

    #[test]
    fn requires_review_matches_invariant() {
        let classifier = CookieClassifier::new();
        let result = classifier.classify(&sample_cookie("xk19qzpwm", "example.com"), "cfg-1", "example.com");
        assert_eq!(result.requires_review, result.confidence < CONFIDENCE_MEDIUM || result.category == CookieCategory::Unknown);
    }

    #[test]
    fn classify_is_pure() {
        let classifier = CookieClassifier::new();
        let cookie = sample_cookie("_ga", "google-analytics.com");
        let a = classifier.classify(&cookie, "cfg-1", "example.com");
        let b = classifier.classify(&cookie, "cfg-1", "example.com");
        assert_eq!(a.category, b.category);
        assert_eq!(a.confidence, b.confidence);
    }
}
