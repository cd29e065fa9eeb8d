// ── Edit-distance matcher ──
//
// Levenshtein distance against every candidate whose length is within the
// window. Ties go to the shortest candidate, then the lexicographically
// smallest, so the result does not depend on iteration order.

/// Best candidate within `max_distance` edits of `target`.
///
/// `length_window` prunes candidates whose length (in chars) differs from
/// the target's by more than the window before any distance is computed.
pub fn edit_distance_match<'a, I>(
    candidates: I,
    target: &str,
    max_distance: usize,
    length_window: Option<usize>,
) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    let target_len = target.chars().count();

    candidates
        .into_iter()
        .filter(|candidate| {
            length_window.is_none_or(|window| {
                candidate.chars().count().abs_diff(target_len) <= window
            })
        })
        .map(|candidate| (strsim::levenshtein(target, candidate), candidate))
        .filter(|(distance, _)| *distance <= max_distance)
        .min_by(|(da, a), (db, b)| {
            da.cmp(db)
                .then_with(|| a.chars().count().cmp(&b.chars().count()))
                .then_with(|| a.cmp(b))
        })
        .map(|(_, candidate)| candidate)
}
