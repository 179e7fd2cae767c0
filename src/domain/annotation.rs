//! Whole-token matching of Type names inside annotation text.

use regex::Regex;
use tracing::debug;

/// One boundary-anchored pattern per known Type name.
pub struct TypeMatcher {
    patterns: Vec<(String, Regex)>,
}

impl TypeMatcher {
    pub fn new<'a>(type_names: impl IntoIterator<Item = &'a str>) -> Self {
        let mut patterns: Vec<(String, Regex)> = type_names
            .into_iter()
            .filter_map(|name| {
                match Regex::new(&format!(r"\b{}\b", regex::escape(name))) {
                    Ok(re) => Some((name.to_string(), re)),
                    Err(e) => {
                        debug!(type_name = name, error = %e, "skipping unmatchable type name");
                        None
                    }
                }
            })
            .collect();
        patterns.sort_by(|a, b| a.0.cmp(&b.0));
        patterns.dedup_by(|a, b| a.0 == b.0);
        Self { patterns }
    }

    /// Type names occurring as whole tokens in `annotation`, in name order.
    pub fn matches<'s>(&'s self, annotation: &'s str) -> impl Iterator<Item = &'s str> + 's {
        self.patterns
            .iter()
            .filter(move |(_, re)| re.is_match(annotation))
            .map(|(name, _)| name.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}
