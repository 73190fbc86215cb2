//! Evidence merge: concat → dynamic score floor → dedupe → rank → cap.
//!
//! Pure and synchronous; runs only after every branch has completed or
//! definitively failed. The floor is relative to the best item so a single
//! uniformly-low-confidence branch isn't wiped out just because it was the
//! only one that ran; the cap bounds synthesis input size.

use crate::evidence::{EvidenceItem, SourceType};
use std::collections::HashSet;

/// Absolute minimum score an item needs to survive the merge.
const FLOOR_ABSOLUTE: f64 = 0.12;
/// Relative floor as a fraction of the best item's score.
const FLOOR_RATIO: f64 = 0.4;

/// Merge per-branch evidence lists into one ranked, deduplicated list.
///
/// Invariants on the output: descending by score, no duplicate
/// `(source_type, source_id)` pairs, length ≤ `max_results`, and every score
/// ≥ `max(0.12, top_score * 0.4)`.
pub fn merge(branches: Vec<Vec<EvidenceItem>>, max_results: usize) -> Vec<EvidenceItem> {
    let combined: Vec<EvidenceItem> = branches.into_iter().flatten().collect();
    if combined.is_empty() {
        return Vec::new();
    }

    let top_score = combined
        .iter()
        .map(|item| item.score)
        .fold(0.0_f64, f64::max);
    let min_score = FLOOR_ABSOLUTE.max(top_score * FLOOR_RATIO);

    // Dedupe before sorting: items are pre-sorted within a branch, so the
    // first occurrence of a key is that source's best-scored copy.
    let mut seen: HashSet<(SourceType, String)> = HashSet::new();
    let mut merged: Vec<EvidenceItem> = Vec::new();
    for item in combined {
        if item.score < min_score {
            continue;
        }
        if seen.insert((item.source_type, item.source_id.clone())) {
            merged.push(item);
        }
    }

    merged.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.source_id.cmp(&b.source_id))
    });
    merged.truncate(max_results);
    merged
}
