/// Name lookup in manifest maps, with "did you mean" suggestions.
use std::collections::BTreeMap;

use nucleo_matcher::{
    Matcher, Utf32Str,
    pattern::{CaseMatching, Normalization, Pattern},
};

use crate::exec::CpuError;

/// Maximum number of suggestions attached to an unknown-name error.
const MAX_SUGGESTIONS: usize = 5;

/// Look up `name` in `entries`.
///
/// # Errors
///
/// Returns `CpuError::UnknownProgram` with close matches when `name` is absent.
pub fn require<'a, T>(
    entries: &'a BTreeMap<String, T>,
    name: &str,
    kind: &'static str,
) -> Result<&'a T, CpuError> {
    entries.get(name).ok_or_else(|| CpuError::UnknownProgram {
        kind,
        name: name.to_owned(),
        candidates: suggest(entries.keys().map(String::as_str), name),
    })
}

/// Mutable variant of [`require`].
///
/// # Errors
///
/// Returns `CpuError::UnknownProgram` with close matches when `name` is absent.
pub fn require_mut<'a, T>(
    entries: &'a mut BTreeMap<String, T>,
    name: &str,
    kind: &'static str,
) -> Result<&'a mut T, CpuError> {
    require(entries, name, kind)?;
    entries.get_mut(name).ok_or_else(|| CpuError::UnknownProgram {
        kind,
        name: name.to_owned(),
        candidates: Vec::new(),
    })
}

/// Check that every name in `names` is registered.
///
/// # Errors
///
/// Returns the error for the first unknown name.
pub fn require_all<T>(
    entries: &BTreeMap<String, T>,
    names: &[String],
    kind: &'static str,
) -> Result<(), CpuError> {
    names
        .iter()
        .try_for_each(|name| require(entries, name, kind).map(|_| ()))
}

/// Registered names that fuzzily match `query`, best first.
#[must_use]
pub fn suggest<'a>(names: impl Iterator<Item = &'a str>, query: &str) -> Vec<String> {
    if query.is_empty() {
        return Vec::new();
    }
    let pattern = Pattern::parse(query, CaseMatching::Smart, Normalization::Smart);
    let mut matcher = Matcher::new(nucleo_matcher::Config::DEFAULT);

    let mut scored: Vec<(String, u32)> = names
        .filter_map(|name| {
            let mut buf = Vec::new();
            let haystack = Utf32Str::new(name, &mut buf);
            pattern
                .score(haystack, &mut matcher)
                .map(|score| (name.to_owned(), score))
        })
        .collect();

    scored.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    scored.truncate(MAX_SUGGESTIONS);
    scored.into_iter().map(|(name, _)| name).collect()
}
