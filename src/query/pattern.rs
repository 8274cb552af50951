// src/query/pattern.rs
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::sync::RwLock;

/// Compiled regexes shared by every query in the process. Entries are never
/// mutated after insertion; queries clone them out.
static PATTERN_CACHE: Lazy<RwLock<HashMap<String, Regex>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

const PATTERN_CACHE_CAPACITY: usize = 256;

fn cached_regex(source: &str) -> Result<Regex, regex::Error> {
    if let Ok(cache) = PATTERN_CACHE.read() {
        if let Some(regex) = cache.get(source) {
            return Ok(regex.clone());
        }
    }

    let regex = Regex::new(source)?;

    // A poisoned lock only costs us the cache entry
    if let Ok(mut cache) = PATTERN_CACHE.write() {
        if cache.len() >= PATTERN_CACHE_CAPACITY {
            // Compiled queries own their regexes, so dropping every entry
            // only costs later compiles a cache miss
            cache.clear();
        }
        cache.insert(source.to_string(), regex.clone());
    }
    Ok(regex)
}

/// Condition pattern: a regular expression searched anywhere in the text.
///
/// Named groups (`(?P<name>...)`) that take part in a match are reported by
/// [`Pattern::captures`] so the executor can bind them as variables.
#[derive(Debug, Clone)]
pub struct Pattern {
    regex: Regex,
    groups: Vec<String>,
}

impl Pattern {
    pub fn new(source: &str) -> Result<Self, regex::Error> {
        let regex = cached_regex(source)?;
        let groups = regex
            .capture_names()
            .flatten()
            .map(str::to_string)
            .collect();
        Ok(Pattern { regex, groups })
    }

    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    /// Names of the pattern's named capture groups, in pattern order
    pub fn groups(&self) -> &[String] {
        &self.groups
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }

    /// `None` when the pattern does not match. On a match, the named groups
    /// that participated, with the text they captured.
    pub fn captures(&self, text: &str) -> Option<Vec<(String, String)>> {
        if self.groups.is_empty() {
            return self.regex.is_match(text).then(Vec::new);
        }

        let caps = self.regex.captures(text)?;
        Some(
            self.groups
                .iter()
                .filter_map(|name| {
                    caps.name(name)
                        .map(|m| (name.clone(), m.as_str().to_string()))
                })
                .collect(),
        )
    }
}
