//! WinGet-style version comparison
//!
//! Dotted version strings are compared segment by segment: numeric when both
//! segments parse as integers, case-insensitive ordinal otherwise. This mixed
//! policy matches how WinGet itself orders versions, so "24.09" < "24.10" and
//! "2.0" > "1.9.9" while a segment like "0-beta" falls back to string
//! comparison against its numeric counterpart.

use std::cmp::Ordering;

/// Compare two dotted version strings.
///
/// A leading `v`/`V` prefix is ignored; the shorter version is padded with
/// `"0"` segments. The first non-equal segment decides.
pub fn compare(a: &str, b: &str) -> Ordering {
    let a = strip_prefix(a);
    let b = strip_prefix(b);
    let left: Vec<&str> = a.split('.').collect();
    let right: Vec<&str> = b.split('.').collect();

    for i in 0..left.len().max(right.len()) {
        let x = left.get(i).copied().unwrap_or("0");
        let y = right.get(i).copied().unwrap_or("0");

        // Numeric only when both sides parse; otherwise ordinal on the raw
        // segment text
        let ord = match (x.parse::<u64>(), y.parse::<u64>()) {
            (Ok(nx), Ok(ny)) => nx.cmp(&ny),
            _ => x.to_lowercase().cmp(&y.to_lowercase()),
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }

    Ordering::Equal
}

/// Pick the highest version under [`compare`]. Returns `None` for empty
/// input; first-seen wins on exact ties.
pub fn latest(versions: &[String]) -> Option<&str> {
    versions
        .iter()
        .map(String::as_str)
        .reduce(|best, v| if compare(v, best) == Ordering::Greater { v } else { best })
}

fn strip_prefix(v: &str) -> &str {
    v.strip_prefix(['v', 'V']).unwrap_or(v)
}
