use crate::error::{Error, Result};
use crate::types::{PreferenceEntry, PreferenceSet};
use glob::Pattern;

/// Query preferences by glob patterns (OR logic)
/// Returns entries matching any of the provided patterns, in set order
pub fn query_preferences<'a>(
    set: &'a PreferenceSet,
    patterns: &[&str],
) -> Result<Vec<&'a PreferenceEntry>> {
    // Compile all patterns first to fail fast on invalid patterns
    let compiled_patterns: Vec<Pattern> = patterns
        .iter()
        .map(|p| {
            Pattern::new(p).map_err(|e| Error::InvalidGlobPattern(format!("'{}': {}", p, e)))
        })
        .collect::<Result<Vec<_>>>()?;

    let queried: Vec<&PreferenceEntry> = set
        .iter()
        .filter(|entry| {
            compiled_patterns
                .iter()
                .any(|pattern| pattern.matches(&entry.key))
        })
        .collect();

    tracing::debug!(
        patterns = patterns.len(),
        matched = queried.len(),
        "queried preferences"
    );
    Ok(queried)
}
