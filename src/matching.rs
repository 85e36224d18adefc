//! Pairs markings across the left and right collections.
//!
//! Both strategies are pure and read only their inputs, so they can be called on the
//! live stores or on a [`MarkingsStore::snapshot`](crate::state::MarkingsStore::snapshot).

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::marking::Marking;

/// Upper bound on features listed in one report.
pub const MAX_REPORT_FEATURES: usize = 24;

/// A left marking and its counterpart on the right image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchedFeature {
    pub id: String,
    pub left: Marking,
    pub right: Marking,
}

/// Pairs markings sharing a correlation id, once per `(left.label, right.label)`.
///
/// The pair keeps the first id of the left marking that matched. Sorted by left label.
pub fn get_matched_features(left: &[Marking], right: &[Marking]) -> Vec<MatchedFeature> {
    let mut by_id: HashMap<&str, &Marking> = HashMap::new();
    for marking in right {
        for id in &marking.ids {
            by_id.insert(id.as_str(), marking);
        }
    }

    let mut seen = HashSet::new();
    let mut features = Vec::new();
    for left_marking in left {
        for id in &left_marking.ids {
            let Some(right_marking) = by_id.get(id.as_str()) else {
                continue;
            };
            if seen.insert((left_marking.label, right_marking.label)) {
                features.push(MatchedFeature {
                    id: id.clone(),
                    left: left_marking.clone(),
                    right: (*right_marking).clone(),
                });
            }
        }
    }

    features.sort_by_key(|feature| feature.left.label);
    features
}

/// Pairs markings carrying the same label. Left markings without a counterpart are dropped.
pub fn get_paired_by_label(left: &[Marking], right: &[Marking]) -> Vec<MatchedFeature> {
    let by_label: HashMap<u32, &Marking> = right.iter().map(|m| (m.label, m)).collect();

    let mut features: Vec<MatchedFeature> = left
        .iter()
        .filter_map(|left_marking| {
            let right_marking = by_label.get(&left_marking.label)?;
            let id = left_marking
                .ids
                .first()
                .cloned()
                .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
            Some(MatchedFeature {
                id,
                left: left_marking.clone(),
                right: (*right_marking).clone(),
            })
        })
        .collect();

    features.sort_by_key(|feature| feature.left.label);
    features
}

/// Features to list in a report: correlated ones only, or everything paired by label.
pub fn select_report_features(left: &[Marking], right: &[Marking], include_matched_only: bool) -> Vec<MatchedFeature> {
    let mut features = if include_matched_only {
        get_matched_features(left, right)
    } else {
        get_paired_by_label(left, right)
    };
    if features.len() > MAX_REPORT_FEATURES {
        log::warn!(
            "Report lists {} features, keeping the first {}",
            features.len(),
            MAX_REPORT_FEATURES
        );
        features.truncate(MAX_REPORT_FEATURES);
    }
    features
}

/// Live counts for the toolbar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeatureCounts {
    pub left: usize,
    pub right: usize,
    pub matched: usize,
    pub paired: usize,
}

/// Matching results memoized on the revisions of the two stores.
#[derive(Debug, Default)]
pub struct MatchCache {
    key: Option<(u64, u64)>,
    matched: Vec<MatchedFeature>,
    paired: usize,
}

impl MatchCache {
    /// Returns the matched features, recomputing only when a revision changed.
    pub fn matched(&mut self, revisions: (u64, u64), left: &[Marking], right: &[Marking]) -> &[MatchedFeature] {
        self.refresh(revisions, left, right);
        &self.matched
    }

    pub fn counts(&mut self, revisions: (u64, u64), left: &[Marking], right: &[Marking]) -> FeatureCounts {
        self.refresh(revisions, left, right);
        FeatureCounts {
            left: left.len(),
            right: right.len(),
            matched: self.matched.len(),
            paired: self.paired,
        }
    }

    pub fn invalidate(&mut self) {
        self.key = None;
        self.matched.clear();
        self.paired = 0;
    }

    fn refresh(&mut self, revisions: (u64, u64), left: &[Marking], right: &[Marking]) {
        if self.key == Some(revisions) {
            return;
        }
        self.matched = get_matched_features(left, right);
        self.paired = get_paired_by_label(left, right).len();
        self.key = Some(revisions);
    }
}
