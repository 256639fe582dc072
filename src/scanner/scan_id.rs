//! Scan identifier generation: `scan_<unixSeconds>_<8-hex digest of domain>`.
//!
//! No md5 dependency exists in this crate's stack, so the digest uses the
//! `xxhash-rust` crate already pulled in for content hashing elsewhere —
//! same purpose (a short, stable, non-cryptographic fingerprint for log
//! correlation), different algorithm.

use xxhash_rust::xxh3::xxh3_64;

pub fn generate_scan_id(domain: &str) -> String {
    generate_scan_id_at(domain, chrono::Utc::now())
}

pub fn generate_scan_id_at(domain: &str, now: chrono::DateTime<chrono::Utc>) -> String {
    let digest = xxh3_64(domain.as_bytes());
    format!("scan_{}_{:08x}", now.timestamp(), digest as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn format_matches_documented_shape() {
        let at = chrono::Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let id = generate_scan_id_at("https://example.com", at);
        assert!(id.starts_with("scan_1700000000_"));
        assert_eq!(id.len(), "scan_1700000000_".len() + 8);
    }

    #[test]
    fn deterministic_for_same_domain_and_second() {
        let at = chrono::Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let a = generate_scan_id_at("https://example.com", at);
        let b = generate_scan_id_at("https://example.com", at);
        assert_eq!(a, b);
    }

    proptest::proptest! {
        #[test]
        fn always_matches_shape_for_any_domain_and_timestamp(
            domain in "[a-z.]{1,40}",
            secs in 0i64..4_000_000_000,
        ) {
            let at = chrono::Utc.timestamp_opt(secs, 0).unwrap();
            let id = generate_scan_id_at(&domain, at);
            let prefix = format!("scan_{secs}_");
            proptest::prop_assert!(id.starts_with(&prefix));
            proptest::prop_assert_eq!(id.len(), prefix.len() + 8);
            proptest::prop_assert!(id[prefix.len()..].chars().all(|c| c.is_ascii_hexdigit()));
        }
    }
}
