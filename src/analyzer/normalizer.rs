// Endpoint normalization
//
// Rewrites variable path segments (numeric ids, UUIDs, object ids, dates, prefixed ids)
// into named placeholders and collapses URLs sharing host + normalized path into one
// endpoint.
//
// Example:
//   https://x.com/api/v1/users/42/posts/7?page=2
//   -> /api/v1/users/{userId}/posts/{postId}
//      path:  userId (integer), postId (integer)
//      query: page (string, example "2")

use super::singularize;
use crate::models::{Endpoint, ParamType, Parameter};
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashMap;
use tracing::debug;
use url::Url;

/// One whole-segment detector
struct Detector {
    pattern: Regex,
    default_name: &'static str,
    param_type: ParamType,
}

lazy_static! {
    // Precedence order
    static ref DETECTORS: Vec<Detector> = vec![
        Detector {
            pattern: Regex::new(r"^\d+$").unwrap(),
            default_name: "id",
            param_type: ParamType::Integer,
        },
        Detector {
            pattern: Regex::new(
                r"(?i)^[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}$"
            ).unwrap(),
            default_name: "uuid",
            param_type: ParamType::String,
        },
        Detector {
            pattern: Regex::new(r"(?i)^[0-9a-f]{24}$").unwrap(),
            default_name: "objectId",
            param_type: ParamType::String,
        },
        Detector {
            pattern: Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap(),
            default_name: "date",
            param_type: ParamType::String,
        },
        Detector {
            pattern: Regex::new(r"^(usr|user|org|team|proj)_[A-Za-z0-9]+$").unwrap(),
            default_name: "prefixedId",
            param_type: ParamType::String,
        },
    ];
}

fn is_placeholder(segment: &str) -> bool {
    segment.starts_with('{') && segment.ends_with('}')
}

fn is_variable(segment: &str) -> bool {
    DETECTORS.iter().any(|d| d.pattern.is_match(segment))
}

/// Parameter name derived from the literal segment before a variable one
fn name_from_segment(segment: &str) -> Option<String> {
    if segment.is_empty() || is_placeholder(segment) || is_variable(segment) {
        return None;
    }
    let singular = singularize(&segment.to_ascii_lowercase());
    let mut name = String::new();
    for (i, part) in singular
        .split(|c| c == '-' || c == '_')
        .filter(|p| !p.is_empty())
        .enumerate()
    {
        let clean: String = part.chars().filter(|c| c.is_ascii_alphanumeric()).collect();
        let mut chars = clean.chars();
        let Some(first) = chars.next() else { continue };
        if i == 0 {
            name.push(first);
        } else {
            name.push(first.to_ascii_uppercase());
        }
        name.extend(chars);
    }
    if name.is_empty() || name.starts_with(|c: char| c.is_ascii_digit()) {
        return None;
    }
    name.push_str("Id");
    Some(name)
}

/// Replace variable segments with placeholders; returns the rewritten path and its
/// path parameters in detection order (one per distinct name).
pub fn normalize_path(path: &str) -> (String, Vec<Parameter>) {
    let mut segments: Vec<String> = path.split('/').map(str::to_string).collect();
    let mut params: Vec<Parameter> = Vec::new();

    for detector in DETECTORS.iter() {
        for i in 0..segments.len() {
            let segment = &segments[i];
            if segment.is_empty() || is_placeholder(segment) || !detector.pattern.is_match(segment)
            {
                continue;
            }
            let name = i
                .checked_sub(1)
                .and_then(|prev| name_from_segment(&segments[prev]))
                .unwrap_or_else(|| detector.default_name.to_string());
            if !params.iter().any(|p| p.name == name) {
                params.push(Parameter::path(name.clone(), detector.param_type));
            }
            segments[i] = format!("{{{}}}", name);
        }
    }
    (segments.join("/"), params)
}

/// Canonical normalized path: trailing slash stripped, root kept as "/"
fn canonical(path: &str) -> String {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        trimmed.to_string()
    }
}

fn host_key(url: &Url) -> String {
    match (url.host_str(), url.port()) {
        (Some(h), Some(p)) => format!("{}:{}", h, p),
        (Some(h), None) => h.to_string(),
        _ => String::new(),
    }
}

fn merge_query_params(into: &mut Vec<Parameter>, url: &Url) {
    for (name, value) in url.query_pairs() {
        if name.is_empty() {
            continue;
        }
        // First occurrence of a name fixes its example, an empty value included
        if into.iter().any(|p| p.name == name) {
            continue;
        }
        let example = Some(value.into_owned()).filter(|v| !v.is_empty());
        into.push(Parameter::query(name.into_owned(), example));
    }
}

/// Collapse endpoints by (host, normalized path).
///
/// The first endpoint seen for a key is kept as-is (URL, source, timestamp); later ones
/// only add query parameter names it has not seen yet. Output keeps first-seen key order.
pub fn normalize(endpoints: Vec<Endpoint>) -> Vec<Endpoint> {
    let mut out: Vec<Endpoint> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for mut ep in endpoints {
        let url = match Url::parse(&ep.url) {
            Ok(u) => u,
            Err(e) => {
                debug!("skipping unparseable URL {}: {}", ep.url, e);
                continue;
            }
        };
        let (normalized, params) = normalize_path(url.path());
        let normalized = canonical(&normalized);
        let key = format!("{}{}", host_key(&url), normalized);

        match index.get(&key) {
            Some(&pos) => merge_query_params(&mut out[pos].query_params, &url),
            None => {
                ep.path = url.path().to_string();
                ep.normalized_path = normalized;
                ep.parameters = params;
                merge_query_params(&mut ep.query_params, &url);
                index.insert(key, out.len());
                out.push(ep);
            }
        }
    }
    out
}
