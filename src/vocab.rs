//! Tag canonicalization and display ordering
//!
//! Tag listings are not plain lexicographic: a small curated vocabulary
//! of priority tags always sorts first, in its predefined order, so the
//! most relevant tags surface at the top of tag pickers. Everything else
//! follows in `str`'s total order (Unicode code-point order), which is a
//! stable, documented tie-break. The ordering is purely cosmetic and has
//! no effect on search semantics.

use std::collections::BTreeSet;

/// Curated priority vocabulary, in display order
pub const PRIORITY_TAGS: &[&str] = &[
    "風景",
    "ポートレート",
    "夜景",
    "街角",
    "自然",
    "建物",
    "動物",
    "花",
    "食べ物",
    "旅行",
];

/// Canonicalize a tag list for storage
///
/// Trims surrounding whitespace, drops empty entries, deduplicates and
/// sorts. Every persisted tag set goes through this, so all three
/// storage tiers hold the same canonical form regardless of input
/// ordering or duplicates.
#[must_use]
pub fn canonicalize<I, S>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let set: BTreeSet<String> = tags
        .into_iter()
        .map(|t| t.as_ref().trim().to_string())
        .filter(|t| !t.is_empty())
        .collect();
    set.into_iter().collect()
}

/// Order tags for display: priority vocabulary first, rest lexicographic
///
/// Deduplicates the input. Priority tags appear in the fixed order of
/// [`PRIORITY_TAGS`]; the remainder follows sorted.
#[must_use]
pub fn display_order<I, S>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut rest: BTreeSet<String> = tags.into_iter().map(|t| t.as_ref().to_string()).collect();

    let mut ordered = Vec::with_capacity(rest.len());
    for priority in PRIORITY_TAGS {
        if rest.remove(*priority) {
            ordered.push((*priority).to_string());
        }
    }
    ordered.extend(rest);
    ordered
}
