// ── Prefix-reduction matcher ──
//
// Starting at the caller's tolerance, look for candidates sharing the
// target's first `T` bytes; shrink `T` one step at a time until something
// matches or the floor is reached. Among candidates sharing a prefix the
// lexicographically greatest wins. Each probe is a range query on the
// sorted key set, so a probe costs O(log n).

use std::collections::{BTreeMap, BTreeSet};
use std::ops::Bound;

/// A key set that can answer "greatest key starting with `prefix`".
pub trait SortedKeys {
    fn greatest_with_prefix(&self, prefix: &str) -> Option<&str>;

    /// The stored key equal to `key`, if present.
    fn exact_key(&self, key: &str) -> Option<&str>;
}

impl<V> SortedKeys for BTreeMap<String, V> {
    fn greatest_with_prefix(&self, prefix: &str) -> Option<&str> {
        match prefix_successor(prefix) {
            Some(upper) => self
                .range::<str, _>((Bound::Included(prefix), Bound::Excluded(upper.as_str())))
                .next_back()
                .map(|(k, _)| k.as_str()),
            None => self
                .range::<str, _>((Bound::Included(prefix), Bound::Unbounded))
                .next_back()
                .map(|(k, _)| k.as_str())
                .filter(|k| k.starts_with(prefix)),
        }
    }

    fn exact_key(&self, key: &str) -> Option<&str> {
        self.get_key_value(key).map(|(k, _)| k.as_str())
    }
}

impl SortedKeys for BTreeSet<String> {
    fn greatest_with_prefix(&self, prefix: &str) -> Option<&str> {
        match prefix_successor(prefix) {
            Some(upper) => self
                .range::<str, _>((Bound::Included(prefix), Bound::Excluded(upper.as_str())))
                .next_back()
                .map(String::as_str),
            None => self
                .range::<str, _>((Bound::Included(prefix), Bound::Unbounded))
                .next_back()
                .map(String::as_str)
                .filter(|k| k.starts_with(prefix)),
        }
    }

    fn exact_key(&self, key: &str) -> Option<&str> {
        self.get(key).map(String::as_str)
    }
}

/// Smallest string greater than every string that starts with `prefix`.
/// `None` when no such string exists (empty prefix or all `char::MAX`).
fn prefix_successor(prefix: &str) -> Option<String> {
    let mut chars: Vec<char> = prefix.chars().collect();
    while let Some(last) = chars.pop() {
        if let Some(next) = next_char(last) {
            chars.push(next);
            return Some(chars.into_iter().collect());
        }
    }
    None
}

fn next_char(c: char) -> Option<char> {
    let mut n = u32::from(c) + 1;
    if (0xD800..=0xDFFF).contains(&n) {
        n = 0xE000;
    }
    char::from_u32(n)
}

/// Prefix-reduction match shrinking all the way down to one byte.
///
/// `tolerance` is clamped to the target length; a tolerance of zero never
/// matches. When the probe covers the whole target and the target itself
/// is a key, that key wins over longer keys extending it.
pub fn prefix_reduction<'a, K>(keys: &'a K, target: &str, tolerance: usize) -> Option<&'a str>
where
    K: SortedKeys + ?Sized,
{
    prefix_reduction_with_floor(keys, target, tolerance, 1)
}

/// Prefix-reduction match that gives up once the shared prefix would drop
/// below `floor` bytes. A floor equal to the tolerance probes exactly once.
pub fn prefix_reduction_with_floor<'a, K>(
    keys: &'a K,
    target: &str,
    tolerance: usize,
    floor: usize,
) -> Option<&'a str>
where
    K: SortedKeys + ?Sized,
{
    let floor = floor.max(1);
    let mut t = tolerance.min(target.len());
    if t == target.len() && t >= floor {
        if let Some(hit) = keys.exact_key(target) {
            return Some(hit);
        }
    }
    while t >= floor {
        if target.is_char_boundary(t) {
            if let Some(hit) = keys.greatest_with_prefix(&target[..t]) {
                return Some(hit);
            }
        }
        t -= 1;
    }
    None
}
