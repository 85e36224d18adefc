use egui::pos2;
use forensic_markings::marking::Marking;
use forensic_markings::matching::{MatchedFeature, get_matched_features, get_paired_by_label};
use std::collections::BTreeSet;

fn marking(label: u32, ids: &[&str]) -> Marking {
    Marking::point(label, pos2(0.0, label as f32), "point").with_ids(ids.iter().copied())
}

fn pair_set(features: &[MatchedFeature]) -> BTreeSet<(u32, u32)> {
    features.iter().map(|f| (f.left.label, f.right.label)).collect()
}

fn fixtures() -> (Vec<Marking>, Vec<Marking>) {
    let left = vec![
        marking(1, &["a"]),
        marking(2, &["b", "c"]),
        marking(3, &[]),
        marking(4, &["d"]),
        marking(5, &["x"]),
    ];
    let right = vec![
        marking(11, &["c", "b"]),
        marking(12, &["a"]),
        marking(13, &["d"]),
        marking(3, &[]),
    ];
    (left, right)
}

#[test]
fn test_matching_ignores_input_order() {
    let (left, right) = fixtures();
    let expected = get_matched_features(&left, &right);
    assert_eq!(pair_set(&expected), BTreeSet::from([(1, 12), (2, 11), (4, 13)]));

    let mut left_rev = left.clone();
    left_rev.reverse();
    let mut right_rot = right.clone();
    right_rot.rotate_left(2);

    for (l, r) in [(&left_rev, &right), (&left, &right_rot), (&left_rev, &right_rot)] {
        let features = get_matched_features(l, r);
        assert_eq!(pair_set(&features), pair_set(&expected));
        let labels: Vec<u32> = features.iter().map(|f| f.left.label).collect();
        assert_eq!(labels, vec![1, 2, 4]);
    }
}

#[test]
fn test_matching_is_idempotent() {
    let (left, right) = fixtures();
    assert_eq!(get_matched_features(&left, &right), get_matched_features(&left, &right));
}

#[test]
fn test_paired_by_label_membership() {
    let (left, right) = fixtures();
    let features = get_paired_by_label(&left, &right);

    assert_eq!(pair_set(&features), BTreeSet::from([(3, 3)]));
    for label in [1, 2, 4, 5] {
        assert!(features.iter().all(|f| f.left.label != label));
    }
}

#[test]
fn test_empty_collections() {
    assert!(get_matched_features(&[], &[]).is_empty());
    assert!(get_paired_by_label(&[marking(1, &[])], &[]).is_empty());
}
