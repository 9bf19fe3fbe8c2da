//! Base URL validation and route joining.

use std::sync::LazyLock;

use regex::Regex;

/// Domain every hosted model is served under.
pub const RECOGNIZED_DOMAIN: &str = "runwayml.cloud";

static V1_URL: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::unwrap_used)]
    Regex::new(r"^https?://.+\.runwayml\.cloud/v1").unwrap()
});

/// Checks that `url` looks like `http(s)://<host>.runwayml.cloud/v1...`.
///
/// Anything may follow `/v1`.
pub fn is_valid_v1_url(url: &str) -> bool {
    V1_URL.is_match(url)
}

/// Joins a route onto the base URL without doubling slashes.
pub(crate) fn join(base: &str, route: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        route.trim_start_matches('/')
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_urls() {
        assert!(is_valid_v1_url("https://my-model.hosted-models.runwayml.cloud/v1"));
        assert!(is_valid_v1_url("https://my-model.hosted-models.runwayml.cloud/v1/"));
        assert!(is_valid_v1_url("http://lotr.hosted-models.runwayml.cloud/v1"));
        assert!(is_valid_v1_url("https://a.runwayml.cloud/v1"));
    }

    #[test]
    fn test_invalid_urls() {
        assert!(!is_valid_v1_url("http://example.com/"));
        assert!(!is_valid_v1_url("https://runwayml.cloud/v1"));
        assert!(!is_valid_v1_url("https://.runwayml.cloud/v1"));
        assert!(!is_valid_v1_url("ftp://m.hosted-models.runwayml.cloud/v1"));
        assert!(!is_valid_v1_url("https://m.hosted-models.runwayml.cloud/v2"));
        assert!(!is_valid_v1_url("https://m.hosted-models.runwayml.cloud"));
        assert!(!is_valid_v1_url("my-model.hosted-models.runwayml.cloud/v1"));
        assert!(!is_valid_v1_url(""));
    }

    #[test]
    fn test_host_must_be_single_line() {
        assert!(!is_valid_v1_url("https://my\nmodel.runwayml.cloud/v1"));
        assert!(is_valid_v1_url("https://my-model.runwayml.cloud/v1?x=\n"));
    }

    #[test]
    fn test_pattern_is_anchored_at_scheme() {
        assert!(!is_valid_v1_url(" https://my-model.runwayml.cloud/v1"));
        assert!(!is_valid_v1_url("see https://my-model.runwayml.cloud/v1"));
    }

    #[test]
    fn test_join() {
        let base = "https://m.hosted-models.runwayml.cloud/v1";
        assert_eq!(join(base, "/"), "https://m.hosted-models.runwayml.cloud/v1/");
        assert_eq!(join(base, "/info"), "https://m.hosted-models.runwayml.cloud/v1/info");
        assert_eq!(
            join("https://m.hosted-models.runwayml.cloud/v1/", "/query"),
            "https://m.hosted-models.runwayml.cloud/v1/query"
        );
    }
}
