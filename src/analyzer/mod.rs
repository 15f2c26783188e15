// Endpoint analysis pipeline
//
//   normalizer.rs  raw URLs -> canonical endpoints with path/query parameters
//   inferrer.rs    likely HTTP methods from path keywords
//   tagger.rs      risk level and tags from an ordered rule catalogue
//   grouper.rs     resource groups for exporters
//
// Every stage is a pure function of its input so that identical URL sets always
// produce identical output.

pub mod grouper;
pub mod inferrer;
pub mod normalizer;
pub mod tagger;

pub use grouper::{group, group_name, EndpointGroup};
pub use inferrer::infer_methods;
pub use normalizer::{normalize, normalize_path};
pub use tagger::tag;

use crate::models::Endpoint;

/// Infer methods, tag and sort by (normalized path, URL).
pub fn classify(endpoints: &mut [Endpoint]) {
    for ep in endpoints.iter_mut() {
        if ep.methods.is_empty() {
            ep.methods = infer_methods(&ep.normalized_path);
        }
        tag(ep);
    }
    endpoints.sort_by(|a, b| {
        a.normalized_path
            .cmp(&b.normalized_path)
            .then_with(|| a.url.cmp(&b.url))
    });
}

/// "categories" -> "category", "users" -> "user"; words ending in "ss" are left alone
pub(crate) fn singularize(word: &str) -> String {
    if let Some(stem) = word.strip_suffix("ies") {
        if !stem.is_empty() {
            return format!("{}y", stem);
        }
    }
    if word.ends_with("ss") {
        return word.to_string();
    }
    match word.strip_suffix('s') {
        Some(stem) if !stem.is_empty() => stem.to_string(),
        _ => word.to_string(),
    }
}

pub(crate) fn pluralize(word: &str) -> String {
    if word.ends_with('y') && !word.ends_with("ay") && !word.ends_with("ey") && !word.ends_with("oy")
    {
        format!("{}ies", &word[..word.len() - 1])
    } else if word.ends_with('s')
        || word.ends_with('x')
        || word.ends_with("ch")
        || word.ends_with("sh")
    {
        format!("{}es", word)
    } else {
        format!("{}s", word)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Method;

    #[test]
    fn singular_and_plural_forms() {
        assert_eq!(singularize("users"), "user");
        assert_eq!(singularize("categories"), "category");
        assert_eq!(singularize("address"), "address");
        assert_eq!(singularize("s"), "s");
        assert_eq!(pluralize("user"), "users");
        assert_eq!(pluralize("category"), "categories");
        assert_eq!(pluralize("key"), "keys");
        assert_eq!(pluralize("box"), "boxes");
    }

    #[test]
    fn classify_sorts_and_keeps_explicit_methods() {
        let mut eps = vec![
            Endpoint::new("https://x.com/b", "test"),
            Endpoint::new("https://x.com/a", "test"),
        ];
        eps[0].normalized_path = "/b".into();
        eps[1].normalized_path = "/a".into();
        eps[0].methods = vec![Method::OPTIONS];
        classify(&mut eps);
        assert_eq!(eps[0].normalized_path, "/a");
        assert_eq!(eps[0].methods, vec![Method::GET, Method::POST]);
        assert_eq!(eps[1].methods, vec![Method::OPTIONS]);
    }
}
