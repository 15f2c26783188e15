// Risk tagging
//
// Every rule with a keyword at the start of a path segment ("/keyword") contributes its
// tag; the endpoint's risk is the highest level among matching rules (Low when nothing
// matches).

use crate::models::{Endpoint, RiskLevel};

struct TagRule {
    risk: RiskLevel,
    tag: &'static str,
    keywords: &'static [&'static str],
}

const fn rule(risk: RiskLevel, tag: &'static str, keywords: &'static [&'static str]) -> TagRule {
    TagRule {
        risk,
        tag,
        keywords,
    }
}

const RULES: &[TagRule] = &[
    // Critical
    rule(RiskLevel::Critical, "auth", &["auth", "login", "signin", "oauth"]),
    rule(RiskLevel::Critical, "admin", &["admin"]),
    rule(RiskLevel::Critical, "file-upload", &["upload", "import"]),
    rule(RiskLevel::Critical, "password", &["password", "passwd", "pwd"]),
    rule(RiskLevel::Critical, "token", &["token", "jwt", "refresh"]),
    rule(RiskLevel::Critical, "payment", &["payment", "checkout", "billing"]),
    rule(RiskLevel::Critical, "sensitive-file", &[".env", "config.", "debug"]),
    rule(RiskLevel::Critical, "graphql", &["graphql"]),
    // High
    rule(RiskLevel::High, "pii", &["user", "profile", "account"]),
    rule(RiskLevel::High, "data-export", &["export", "download"]),
    rule(RiskLevel::High, "secrets", &["api-key", "api_key", "apikey", "secret", "credential"]),
    rule(RiskLevel::High, "config", &["config", "setting"]),
    rule(RiskLevel::High, "internal", &["internal", "private"]),
    // Medium
    rule(RiskLevel::Medium, "injection-point", &["search", "query", "filter"]),
    rule(RiskLevel::Medium, "enumeration", &["list", "all"]),
];

/// Any URL with a query string exposes injectable parameters
const PARAMS_TAG: &str = "params";

/// Set risk and add tags for one endpoint. Existing tags are kept.
pub fn tag(ep: &mut Endpoint) {
    let haystack = format!("{} {}", ep.normalized_path, ep.url).to_lowercase();
    let mut risk = RiskLevel::Low;

    let mut add = |tags: &mut Vec<String>, level: RiskLevel, name: &str| {
        if level > risk {
            risk = level;
        }
        if !tags.iter().any(|t| t == name) {
            tags.push(name.to_string());
        }
    };

    for r in RULES {
        if r.keywords
            .iter()
            .any(|kw| haystack.contains(&format!("/{}", kw)))
        {
            add(&mut ep.tags, r.risk, r.tag);
        }
    }
    if ep.url.contains('?') || !ep.query_params.is_empty() {
        add(&mut ep.tags, RiskLevel::Medium, PARAMS_TAG);
    }
    ep.risk = risk;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tagged(url: &str, normalized: &str) -> Endpoint {
        let mut ep = Endpoint::new(url, "test");
        ep.normalized_path = normalized.to_string();
        tag(&mut ep);
        ep
    }

    #[test]
    fn critical_match_dominates() {
        let ep = tagged("https://x.com/api/admin/users", "/api/admin/users");
        assert_eq!(ep.risk, RiskLevel::Critical);
        assert_eq!(ep.tags, vec!["admin", "pii"]);
    }

    #[test]
    fn all_matching_tags_are_collected() {
        let ep = tagged(
            "https://x.com/api/search?q=1",
            "/api/search",
        );
        assert_eq!(ep.risk, RiskLevel::Medium);
        assert_eq!(ep.tags, vec!["injection-point", "params"]);
    }

    #[test]
    fn unmatched_is_low() {
        let ep = tagged("https://x.com/api/v1/widgets", "/api/v1/widgets");
        assert_eq!(ep.risk, RiskLevel::Low);
        assert!(ep.tags.is_empty());
    }

    #[test]
    fn keywords_must_start_a_segment() {
        let ep = tagged("https://x.com/api/v1/wallets", "/api/v1/wallets");
        assert_eq!(ep.risk, RiskLevel::Low);
        assert!(ep.tags.is_empty());

        let ep = tagged("https://mall.example.com/api/v1/widgets", "/api/v1/widgets");
        assert_eq!(ep.risk, RiskLevel::Low);

        let ep = tagged("https://x.com/api/v1/all", "/api/v1/all");
        assert_eq!(ep.tags, vec!["enumeration"]);
    }

    #[test]
    fn api_key_spellings_are_secrets() {
        for path in ["/api/v1/apikey", "/api/v1/api_key", "/api/v1/api-key"] {
            let ep = tagged(&format!("https://x.com{}", path), path);
            assert_eq!(ep.risk, RiskLevel::High, "{}", path);
            assert_eq!(ep.tags, vec!["secrets"], "{}", path);
        }
    }

    #[test]
    fn tagging_twice_does_not_duplicate() {
        let mut ep = tagged("https://x.com/.env", "/.env");
        assert_eq!(ep.risk, RiskLevel::Critical);
        tag(&mut ep);
        assert_eq!(ep.tags, vec!["sensitive-file"]);
    }
}
