// HTTP method inference
// Only used when discovery produced no method evidence for an endpoint.

use crate::models::Method;
use crate::models::Method::*;

/// Ordered keyword rules, first match wins. Keywords match as "/keyword" substrings.
const RULES: &[(&[&str], &[Method])] = &[
    (&["login", "signin", "authenticate"], &[POST]),
    (&["logout", "signout"], &[POST]),
    (&["register", "signup"], &[POST]),
    (&["upload"], &[POST]),
    (&["download"], &[GET]),
    (&["export"], &[GET, POST]),
    (&["import"], &[POST]),
    (&["search"], &[GET, POST]),
    (&["delete"], &[POST, DELETE]),
    (&["create"], &[POST]),
    (&["update"], &[POST, PUT, PATCH]),
    (&["activate", "enable"], &[POST]),
    (&["deactivate", "disable"], &[POST]),
    (&["verify", "confirm"], &[POST, GET]),
    (&["reset"], &[POST]),
    (&["callback", "webhook"], &[POST]),
];

const ITEM_METHODS: &[Method] = &[GET, PUT, PATCH, DELETE];
const COLLECTION_METHODS: &[Method] = &[GET, POST];

/// Likely methods for a normalized path
pub fn infer_methods(normalized_path: &str) -> Vec<Method> {
    let path = normalized_path.to_lowercase();
    for (keywords, methods) in RULES {
        if keywords
            .iter()
            .any(|kw| path.contains(&format!("/{}", kw)))
        {
            return methods.to_vec();
        }
    }
    // Lower-cased, so "{userId}" reads as "{userid}"
    let trimmed = path.trim_end_matches('/');
    if trimmed.ends_with("id}") {
        ITEM_METHODS.to_vec()
    } else {
        COLLECTION_METHODS.to_vec()
    }
}
