use ahash::AHashMap;
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Mutex;

/// Compiled patterns keyed by their source. Failures are cached too, so a
/// malformed pattern is not recompiled on every evaluation.
static PATTERNS: Lazy<Mutex<AHashMap<String, Result<Regex, String>>>> =
    Lazy::new(|| Mutex::new(AHashMap::new()));

/// Compiles `pattern` once per process; later calls return a cheap clone.
pub fn compile_pattern(pattern: &str) -> Result<Regex, String> {
    let Ok(mut cache) = PATTERNS.lock() else {
        return Regex::new(pattern).map_err(|e| e.to_string());
    };
    cache
        .entry(pattern.to_string())
        .or_insert_with(|| Regex::new(pattern).map_err(|e| e.to_string()))
        .clone()
}
