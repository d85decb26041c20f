//! Ordered-scan planning over the sorted key list.
//!
//! A scan is described by an optional anchor (`from`), a direction, an
//! offset, and a limit. The anchor is interpreted in two modes:
//!
//! - **Prefix**: `from` ends in `*` — the result is keys starting with the
//!   prefix (the `*` stripped), the prefix itself included when present.
//! - **Exact seek**: any other `from` — the scan starts strictly after (or
//!   before, descending) the anchor key, which must exist; a missing anchor
//!   yields an empty result. The anchor itself is never returned.

/// An ordered key scan request.
///
/// `limit` of 0 means unlimited. `offset` skips results in the scan
/// direction before any are collected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanQuery {
    pub from: Option<Vec<u8>>,
    pub limit: u32,
    pub offset: u32,
    pub ascending: bool,
}

#[derive(Clone, Copy)]
enum Anchor<'a> {
    None,
    Exact(&'a [u8]),
    Prefix(&'a [u8]),
}

impl<'a> Anchor<'a> {
    fn parse(from: Option<&'a [u8]>) -> Anchor<'a> {
        match from {
            None => Anchor::None,
            Some(f) => match f.split_last() {
                Some((&b'*', prefix)) => Anchor::Prefix(prefix),
                _ => Anchor::Exact(f),
            },
        }
    }
}

/// Produces the result slice of a scan over `keys` (which must be in
/// ascending byte order).
pub(crate) fn plan(keys: &[Vec<u8>], query: &ScanQuery) -> Vec<Vec<u8>> {
    let anchor = Anchor::parse(query.from.as_deref());

    let start = match locate_start(keys, &anchor, query.ascending) {
        Some(start) => start,
        None => return Vec::new(),
    };

    // The offset moves the start further in the scan direction.
    let start = if query.ascending {
        start + query.offset as usize
    } else {
        match start.checked_sub(query.offset as usize) {
            Some(s) => s,
            None => return Vec::new(),
        }
    };
    if start >= keys.len() {
        return Vec::new();
    }

    let limit = if query.limit == 0 {
        usize::MAX
    } else {
        query.limit as usize
    };

    let mut result = Vec::new();
    let mut i = start;
    loop {
        if result.len() >= limit {
            break;
        }
        if let Anchor::Prefix(prefix) = anchor {
            if !keys[i].starts_with(prefix) {
                break;
            }
        }
        result.push(keys[i].clone());
        if query.ascending {
            i += 1;
            if i >= keys.len() {
                break;
            }
        } else {
            match i.checked_sub(1) {
                Some(prev) => i = prev,
                None => break,
            }
        }
    }
    result
}

/// Index of the first key included in the walk, or `None` for an empty
/// result. Exact anchors are excluded (start is the position one past the
/// anchor in the scan direction); prefix anchors are included.
fn locate_start(keys: &[Vec<u8>], anchor: &Anchor, ascending: bool) -> Option<usize> {
    let n = keys.len();
    match anchor {
        Anchor::None => {
            if ascending {
                Some(0) // empty list handled by the start >= len check
            } else {
                n.checked_sub(1)
            }
        }
        Anchor::Exact(from) => {
            let i = keys.partition_point(|k| k.as_slice() < *from);
            if i >= n || keys[i].as_slice() != *from {
                return None;
            }
            if ascending {
                Some(i + 1)
            } else {
                i.checked_sub(1)
            }
        }
        Anchor::Prefix(prefix) => {
            if ascending {
                let i = keys.partition_point(|k| k.as_slice() < *prefix);
                (i < n && keys[i].starts_with(prefix)).then_some(i)
            } else {
                // Highest index whose key carries the prefix.
                keys.iter().rposition(|k| k.starts_with(prefix))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(list: &[&str]) -> Vec<Vec<u8>> {
        list.iter().map(|s| s.as_bytes().to_vec()).collect()
    }

    fn run(list: &[&str], from: Option<&str>, limit: u32, offset: u32, asc: bool) -> Vec<String> {
        let query = ScanQuery {
            from: from.map(|s| s.as_bytes().to_vec()),
            limit,
            offset,
            ascending: asc,
        };
        plan(&keys(list), &query)
            .into_iter()
            .map(|k| String::from_utf8(k).unwrap())
            .collect()
    }

    const ABC: &[&str] = &["a", "b", "c"];
    const PREFIXED: &[&str] = &["ab1", "ab2", "ac1"];

    // -------------------- Unanchored --------------------

    #[test]
    fn full_scan_both_directions() {
        assert_eq!(run(ABC, None, 0, 0, true), ["a", "b", "c"]);
        assert_eq!(run(ABC, None, 0, 0, false), ["c", "b", "a"]);
    }

    #[test]
    fn empty_list_yields_empty() {
        assert!(run(&[], None, 0, 0, true).is_empty());
        assert!(run(&[], None, 0, 0, false).is_empty());
        assert!(run(&[], Some("x"), 0, 0, true).is_empty());
        assert!(run(&[], Some("x*"), 0, 0, false).is_empty());
    }

    #[test]
    fn limit_caps_results() {
        assert_eq!(run(ABC, None, 2, 0, true), ["a", "b"]);
        assert_eq!(run(ABC, None, 2, 0, false), ["c", "b"]);
        assert_eq!(run(ABC, None, 9, 0, true), ["a", "b", "c"]);
    }

    #[test]
    fn offset_skips_in_scan_direction() {
        assert_eq!(run(ABC, None, 0, 1, true), ["b", "c"]);
        assert_eq!(run(ABC, None, 0, 1, false), ["b", "a"]);
        assert_eq!(run(ABC, None, 1, 1, true), ["b"]);
        assert!(run(ABC, None, 0, 3, true).is_empty());
        assert!(run(ABC, None, 0, 5, false).is_empty());
    }

    // -------------------- Exact seek --------------------

    #[test]
    fn exact_seek_excludes_anchor() {
        assert_eq!(run(PREFIXED, Some("ab1"), 0, 0, true), ["ab2", "ac1"]);
        assert_eq!(run(PREFIXED, Some("ab2"), 0, 0, false), ["ab1"]);
    }

    #[test]
    fn exact_seek_from_boundary_keys() {
        assert!(run(ABC, Some("c"), 0, 0, true).is_empty());
        assert!(run(ABC, Some("a"), 0, 0, false).is_empty());
        assert_eq!(run(ABC, Some("a"), 0, 0, true), ["b", "c"]);
        assert_eq!(run(ABC, Some("c"), 0, 0, false), ["b", "a"]);
    }

    #[test]
    fn exact_seek_missing_anchor_yields_empty() {
        assert!(run(ABC, Some("bb"), 0, 0, true).is_empty());
        assert!(run(ABC, Some("bb"), 0, 0, false).is_empty());
        assert!(run(ABC, Some("z"), 0, 0, true).is_empty());
        assert!(run(ABC, Some("0"), 0, 0, false).is_empty());
    }

    #[test]
    fn exact_seek_with_offset_and_limit() {
        let list = &["a", "b", "c", "d", "e"];
        assert_eq!(run(list, Some("a"), 2, 1, true), ["c", "d"]);
        assert_eq!(run(list, Some("e"), 2, 1, false), ["c", "b"]);
    }

    // -------------------- Prefix mode --------------------

    #[test]
    fn prefix_includes_matches_both_directions() {
        assert_eq!(run(PREFIXED, Some("ab*"), 0, 0, true), ["ab1", "ab2"]);
        assert_eq!(run(PREFIXED, Some("ab*"), 0, 0, false), ["ab2", "ab1"]);
        assert_eq!(run(PREFIXED, Some("a*"), 0, 0, true), ["ab1", "ab2", "ac1"]);
    }

    #[test]
    fn prefix_equal_key_is_included() {
        let list = &["ab", "ab1", "b"];
        assert_eq!(run(list, Some("ab*"), 0, 0, true), ["ab", "ab1"]);
        assert_eq!(run(list, Some("ab*"), 0, 0, false), ["ab1", "ab"]);
    }

    #[test]
    fn prefix_with_no_matches_yields_empty() {
        assert!(run(PREFIXED, Some("zz*"), 0, 0, true).is_empty());
        assert!(run(PREFIXED, Some("zz*"), 0, 0, false).is_empty());
    }

    #[test]
    fn prefix_stops_at_first_non_match() {
        let list = &["ab1", "ab2", "ac1", "ad1"];
        assert_eq!(run(list, Some("ab*"), 0, 0, true), ["ab1", "ab2"]);
    }

    #[test]
    fn bare_star_scans_everything() {
        assert_eq!(run(ABC, Some("*"), 0, 0, true), ["a", "b", "c"]);
        assert_eq!(run(ABC, Some("*"), 0, 0, false), ["c", "b", "a"]);
    }

    #[test]
    fn prefix_with_offset_walks_past_prefix_boundary() {
        // Offsetting past the last prefixed key lands on a non-match, which
        // ends the walk immediately.
        assert_eq!(run(PREFIXED, Some("ab*"), 0, 1, true), ["ab2"]);
        assert!(run(PREFIXED, Some("ab*"), 0, 2, true).is_empty());
    }

    #[test]
    fn prefix_limit_caps_results() {
        assert_eq!(run(PREFIXED, Some("a*"), 2, 0, true), ["ab1", "ab2"]);
        assert_eq!(run(PREFIXED, Some("a*"), 2, 0, false), ["ac1", "ab2"]);
    }
}
