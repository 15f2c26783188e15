// Resource grouping
// "/api/v1/users/{userId}" belongs to "Users"; exporters emit one folder/tag per group.

use super::{pluralize, singularize};
use crate::models::Endpoint;
use serde::Serialize;
use std::collections::BTreeMap;

pub const OTHER_GROUP: &str = "Other";

#[derive(Debug, Clone, Serialize)]
pub struct EndpointGroup {
    pub name: String,
    pub endpoints: Vec<Endpoint>,
}

/// api, rest and anything starting with "v" (v1, v2, but also videos, vendors)
fn is_prefix_segment(segment: &str) -> bool {
    segment.eq_ignore_ascii_case("api")
        || segment.eq_ignore_ascii_case("rest")
        || segment.starts_with(['v', 'V'])
}

/// Group name of a normalized path.
///
/// When every segment is a prefix the first one names the group ("/api/v1" is "Apis").
pub fn group_name(normalized_path: &str) -> String {
    let segments: Vec<&str> = normalized_path.split('/').filter(|s| !s.is_empty()).collect();
    let Some(segment) = segments
        .iter()
        .find(|s| !is_prefix_segment(s))
        .or_else(|| segments.first())
    else {
        return OTHER_GROUP.to_string();
    };
    if segment.starts_with('{') {
        return OTHER_GROUP.to_string();
    }
    let plural = pluralize(&singularize(&segment.to_lowercase()));
    let mut chars = plural.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => OTHER_GROUP.to_string(),
    }
}

/// Groups sorted by name; endpoints inside a group by normalized path, then URL
pub fn group(endpoints: &[Endpoint]) -> Vec<EndpointGroup> {
    let mut groups: BTreeMap<String, Vec<Endpoint>> = BTreeMap::new();
    for ep in endpoints {
        groups
            .entry(group_name(&ep.normalized_path))
            .or_default()
            .push(ep.clone());
    }
    groups
        .into_iter()
        .map(|(name, mut endpoints)| {
            endpoints.sort_by(|a, b| {
                a.normalized_path
                    .cmp(&b.normalized_path)
                    .then_with(|| a.url.cmp(&b.url))
            });
            EndpointGroup { name, endpoints }
        })
        .collect()
}
