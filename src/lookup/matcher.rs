//! Candidate match resolution
//!
//! Given the raw candidate list from a search query plus optional publisher
//! and package-id hints, pick at most one best package. Scoring is additive:
//! every bonus that applies is added, so an exact `Publisher.Name` id match
//! cannot be shadowed by an unrelated product whose id merely contains the
//! search term as a substring.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::config::MIN_MATCH_SCORE;
use crate::lookup::types::{MatchResult, PackageCandidate};

/// Tokens that are just a dotted numeric version, e.g. "7" or "3.12.1"
static VERSION_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+(\.\d+)*$").expect("invalid version token pattern"));

/// Resolve the single best candidate for `term`.
///
/// With `package_id_filter` set, only an exact (case-sensitive) id match
/// counts and no scoring happens. Otherwise candidates are filtered for
/// relevance, scored, and the highest scorer above the minimum threshold
/// wins; ties go to the first-seen candidate.
pub fn resolve(
    candidates: &[PackageCandidate],
    term: &str,
    publisher_filter: Option<&str>,
    package_id_filter: Option<&str>,
) -> MatchResult {
    if let Some(wanted) = package_id_filter {
        return match candidates.iter().find(|c| c.id == wanted) {
            Some(candidate) => MatchResult {
                candidate: Some(candidate.clone()),
                score: 0,
            },
            None => MatchResult::not_found(),
        };
    }

    let term = term.trim().to_lowercase();
    let primary = primary_word(&term);

    let mut best: Option<(i64, &PackageCandidate)> = None;
    for candidate in candidates {
        if !is_relevant(candidate, &primary, publisher_filter) {
            continue;
        }
        let score = score_candidate(candidate, &term, &primary, publisher_filter);
        if score < MIN_MATCH_SCORE {
            continue;
        }
        if best.as_ref().is_none_or(|(top, _)| score > *top) {
            best = Some((score, candidate));
        }
    }

    match best {
        Some((score, candidate)) => {
            debug!(id = %candidate.id, score, "resolved best candidate");
            MatchResult {
                candidate: Some(candidate.clone()),
                score,
            }
        }
        None => MatchResult::not_found(),
    }
}

/// First token of the lowercased term that is neither empty nor a dotted
/// numeric version; falls back to the whole term
fn primary_word(term: &str) -> String {
    term.split_whitespace()
        .find(|token| !VERSION_TOKEN.is_match(token))
        .unwrap_or(term)
        .to_string()
}

fn is_relevant(
    candidate: &PackageCandidate,
    primary: &str,
    publisher_filter: Option<&str>,
) -> bool {
    let id = candidate.id.to_lowercase();
    let name = lower_or_empty(candidate.display_name.as_deref());
    let publisher = lower_or_empty(candidate.publisher.as_deref());

    if !id.contains(primary) && !name.contains(primary) && !publisher.contains(primary) {
        return false;
    }

    if let Some(filter) = publisher_filter {
        let filter = filter.trim().to_lowercase();
        if !publisher.contains(&filter) {
            return false;
        }
    }

    true
}

fn score_candidate(
    candidate: &PackageCandidate,
    term: &str,
    primary: &str,
    publisher_filter: Option<&str>,
) -> i64 {
    let id = candidate.id.to_lowercase();
    let name = lower_or_empty(candidate.display_name.as_deref());

    // Base relevance for surviving the filter
    let mut score = 10;

    if let Some(upstream) = candidate.search_score {
        score += (upstream * 0.5).floor() as i64;
    }
    if id == format!("{term}.{term}") {
        score += 100;
    }
    if let Some(filter) = publisher_filter {
        let filter = filter.trim().to_lowercase();
        let publisher = lower_or_empty(candidate.publisher.as_deref());
        if !publisher.is_empty() && publisher == filter {
            score += 75;
        }
    }
    if !name.is_empty() {
        if name == term {
            score += 50;
        }
        if name == primary {
            score += 30;
        }
        if name.starts_with(term) {
            score += 25;
        }
        if name.starts_with(primary) {
            score += 20;
        }
    }
    if id.starts_with(term) {
        score += 15;
    }
    if id.ends_with(&format!(".{term}")) || id.starts_with(&format!("{term}.")) {
        score += 10;
    }

    score
}

fn lower_or_empty(s: Option<&str>) -> String {
    s.unwrap_or_default().to_lowercase()
}
