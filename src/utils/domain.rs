//! Registrable-domain approximation used to decide first- vs third-party cookies.
//!
//! This is deliberately not a full Public Suffix List implementation (that
//! would be a dependency the corpus this crate grew from never pulls in for
//! this purpose) — it takes the last two DNS labels, with a short list of
//! common two-label public suffixes (`co.uk`, `com.au`, ...) bumped to three,
//! which covers the vendor/rule tables the classifier ships with.

const TWO_LABEL_SUFFIXES: &[&str] = &[
    "co.uk", "org.uk", "ac.uk", "gov.uk", "com.au", "net.au", "org.au", "co.jp", "co.nz",
];

/// Returns the registrable domain for a hostname, e.g. `www.example.com` -> `example.com`.
pub fn registrable_domain(host: &str) -> String {
    let host = host.trim_end_matches('.').to_ascii_lowercase();
    let labels: Vec<&str> = host.split('.').collect();
    if labels.len() <= 2 {
        return host;
    }

    let last_two = labels[labels.len() - 2..].join(".");
    if TWO_LABEL_SUFFIXES.contains(&last_two.as_str()) && labels.len() >= 3 {
        return labels[labels.len() - 3..].join(".");
    }
    last_two
}

/// True if `cookie_domain` is not on the same registrable domain as `scan_target_host`.
pub fn is_third_party(cookie_domain: &str, scan_target_host: &str) -> bool {
    let cookie_domain = cookie_domain.trim_start_matches('.');
    registrable_domain(cookie_domain) != registrable_domain(scan_target_host)
}

/// Extract the host from a URL string, returning `None` if it does not parse.
pub fn host_of(url: &str) -> Option<String> {
    url::Url::parse(url).ok().and_then(|u| u.host_str().map(str::to_owned))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_subdomain() {
        assert_eq!(registrable_domain("www.example.com"), "example.com");
        assert_eq!(registrable_domain("a.b.c.example.com"), "example.com");
    }

    #[test]
    fn handles_two_label_suffix() {
        assert_eq!(registrable_domain("www.example.co.uk"), "example.co.uk");
    }

    #[test]
    fn detects_third_party() {
        assert!(is_third_party("doubleclick.net", "example.com"));
        assert!(!is_third_party(".example.com", "www.example.com"));
    }
}
