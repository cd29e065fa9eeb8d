// ── String helpers shared by normalizers, classifiers and rules ──
//
// Tolerance helpers return byte offsets suitable for the prefix-reduction
// matcher: "position + 1" style helpers point just past the delimiter so
// the delimiter itself is part of the required prefix.

use std::sync::OnceLock;

use regex::Regex;

use crate::constants::RIS_DELIMITER;

/// Compile `pattern` once into `cell`. Patterns are literals in this crate.
pub(crate) fn cached_regex(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).expect("static pattern compiles"))
}

pub(crate) fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| haystack.contains(n))
}

pub(crate) fn contains_all(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().all(|n| haystack.contains(n))
}

pub(crate) fn starts_with_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| haystack.starts_with(n))
}

/// Position just past the first `ch`, if any.
pub(crate) fn after_char(haystack: &str, ch: char) -> Option<usize> {
    haystack.find(ch).map(|pos| pos + ch.len_utf8())
}

/// Position just past the first `/`.
pub(crate) fn first_slash(haystack: &str) -> Option<usize> {
    after_char(haystack, '/')
}

/// Position just past the first space.
pub(crate) fn first_space(haystack: &str) -> Option<usize> {
    after_char(haystack, ' ')
}

/// Position just past the first `)`.
pub(crate) fn first_close_paren(haystack: &str) -> Option<usize> {
    after_char(haystack, ')')
}

/// Index of `needle` at or after `start`, or the string length.
pub(crate) fn index_of_or_length(haystack: &str, needle: &str, start: usize) -> usize {
    haystack
        .get(start..)
        .and_then(|tail| tail.find(needle))
        .map_or(haystack.len(), |pos| pos + start)
}

/// Lowest index of any of `needles` at or after `start`, or the length.
pub(crate) fn index_of_any_or_length(haystack: &str, needles: &[&str], start: usize) -> usize {
    needles
        .iter()
        .map(|n| index_of_or_length(haystack, n, start))
        .min()
        .unwrap_or(haystack.len())
}

/// Position just past the reserved vendor-token delimiter.
pub(crate) fn after_ris_delimiter(haystack: &str) -> Option<usize> {
    haystack
        .find(RIS_DELIMITER)
        .map(|pos| pos + RIS_DELIMITER.len())
}

/// Position just past the `major` version digits that follow `marker`,
/// e.g. `through_major_version("Chrome/41.0", "Chrome/")` → 9.
pub(crate) fn through_major_version(haystack: &str, marker: &str) -> Option<usize> {
    let start = haystack.find(marker)? + marker.len();
    let digits = haystack[start..]
        .bytes()
        .take_while(u8::is_ascii_digit)
        .count();
    (digits > 0).then_some(start + digits)
}

/// Digits immediately following `marker`, parsed.
pub(crate) fn major_version_after(haystack: &str, marker: &str) -> Option<u32> {
    let start = haystack.find(marker)? + marker.len();
    let end = through_major_version(haystack, marker)?;
    haystack[start..end].parse().ok()
}
