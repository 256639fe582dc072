//! Deterministic aggregation of per-page results into one scan's cookie set
//! and storage snapshot.
//!
//! Canonical cookie = first-by-url-index, not first-by-completion — results
//! arrive out of order under concurrency, so callers must feed `(url_index,
//! PageResult)` pairs; this module sorts by index before folding.

use std::collections::HashMap;

use crate::model::{AggregatedCookie, CookieObservation, PageFailure, StorageSnapshot};

#[derive(Debug, Default)]
pub struct Aggregator {
    cookies: HashMap<(String, String), AggregatedCookie>,
    storage: StorageSnapshot,
    pages_visited: Vec<String>,
    pages_failed: Vec<PageFailure>,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the aggregator from a prior checkpoint's partial aggregation, so
    /// resumed scans build on what was already observed.
    pub fn seed(&mut self, cookies: Vec<AggregatedCookie>) {
        for cookie in cookies {
            self.cookies.insert(cookie.identity_key(), cookie);
        }
    }

    /// Folds one page's result in. `ordered` results (sorted by url_index
    /// ascending, ties broken lexicographically by URL) must be fed in that
    /// order for the first-seen rule to be deterministic regardless of the
    /// concurrent completion order they were produced in.
    pub fn fold(&mut self, url: &str, result: &crate::model::PageResult) {
        if result.success {
            self.pages_visited.push(url.to_string());
            for cookie in &result.cookies {
                self.fold_cookie(url, cookie);
            }
            merge_storage(&mut self.storage, &result.storage);
        } else {
            self.pages_failed.push(PageFailure {
                url: url.to_string(),
                error: result.error.clone().unwrap_or_else(|| "unknown error".to_string()),
            });
        }
    }

    fn fold_cookie(&mut self, url: &str, cookie: &CookieObservation) {
        let key = (cookie.name.clone(), cookie.domain.clone());
        self.cookies
            .entry(key)
            .and_modify(|existing| existing.found_on_pages.push(url.to_string()))
            .or_insert_with(|| AggregatedCookie {
                name: cookie.name.clone(),
                domain: cookie.domain.clone(),
                path: cookie.path.clone(),
                expires: cookie.expires,
                http_only: cookie.http_only,
                secure: cookie.secure,
                same_site: cookie.same_site,
                size: cookie.size,
                set_after_accept: cookie.set_after_accept,
                found_on_pages: vec![url.to_string()],
            });
    }

    pub fn len_hint(&self) -> usize {
        self.cookies.len()
    }

    /// Non-consuming snapshot of the current aggregation, for checkpointing
    /// mid-scan without giving up ownership of the running aggregator.
    pub fn snapshot(&self) -> Vec<AggregatedCookie> {
        let mut cookies: Vec<AggregatedCookie> = self.cookies.values().cloned().collect();
        cookies.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.domain.cmp(&b.domain)));
        cookies
    }

    pub fn into_parts(self) -> (Vec<AggregatedCookie>, StorageSnapshot, Vec<String>, Vec<PageFailure>) {
        let mut cookies: Vec<AggregatedCookie> = self.cookies.into_values().collect();
        cookies.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.domain.cmp(&b.domain)));
        (cookies, self.storage, self.pages_visited, self.pages_failed)
    }
}

/// Last-writer-wins shallow merge: storage is reported as observed, not
/// canonicalized, so the order results are folded in only matters for which
/// value "wins" on a key collision across pages.
fn merge_storage(into: &mut StorageSnapshot, from: &StorageSnapshot) {
    for (k, v) in &from.local_storage {
        into.local_storage.insert(k.clone(), v.clone());
    }
    for (k, v) in &from.session_storage {
        into.session_storage.insert(k.clone(), v.clone());
    }
}

/// Sorts completed (url_index, url, PageResult) triples into deterministic
/// fold order: by url_index ascending, ties (shouldn't occur with unique
/// indices) broken lexicographically by URL.
pub fn ordered_fold(aggregator: &mut Aggregator, mut results: Vec<(usize, String, crate::model::PageResult)>) {
    results.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));
    for (_, url, result) in &results {
        aggregator.fold(url, result);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CookieExpiry, PageResult, SameSite};

    fn observation(name: &str, domain: &str) -> CookieObservation {
        CookieObservation {
            name: name.into(),
            value: "v".into(),
            domain: domain.into(),
            path: "/".into(),
            expires: CookieExpiry::Session,
            http_only: false,
            secure: true,
            same_site: SameSite::Lax,
            size: 4,
            set_after_accept: false,
        }
    }

    #[test]
    fn aggregation_is_order_independent() {
        let mut a = Aggregator::new();
        let mut b = Aggregator::new();

        let r1 = PageResult { url: "https://example.com/1".into(), success: true, cookies: vec![observation("_ga", "example.com")], storage: StorageSnapshot::default(), duration_seconds: 0.1, retries: 0, error: None };
        let r2 = PageResult { url: "https://example.com/2".into(), success: true, cookies: vec![observation("_ga", "example.com")], storage: StorageSnapshot::default(), duration_seconds: 0.1, retries: 0, error: None };

        ordered_fold(&mut a, vec![(0, r1.url.clone(), r1.clone()), (1, r2.url.clone(), r2.clone())]);
        ordered_fold(&mut b, vec![(1, r2.url.clone(), r2.clone()), (0, r1.url.clone(), r1.clone())]);

        let (cookies_a, ..) = a.into_parts();
        let (cookies_b, ..) = b.into_parts();
        assert_eq!(cookies_a.len(), 1);
        assert_eq!(cookies_a[0].found_on_pages, cookies_b[0].found_on_pages);
    }

    #[test]
    fn failed_page_recorded_without_cookies() {
        let mut a = Aggregator::new();
        let failed = PageResult::failed("https://example.com/broken", "timeout", 2, 1.0);
        a.fold(&failed.url.clone(), &failed);
        let (cookies, _storage, visited, failed_pages) = a.into_parts();
        assert!(cookies.is_empty());
        assert!(visited.is_empty());
        assert_eq!(failed_pages.len(), 1);
    }
}
