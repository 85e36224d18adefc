use egui::{Pos2, Rect, Vec2};

use super::{distance, Point};
use crate::marking::{Marking, MarkingShape};

/// World length of the ray stem used for hit testing, in multiples of the tolerance.
const RAY_STEM_FACTOR: f32 = 3.0;

pub fn distance_to_line_segment(point: Point, line_start: Point, line_end: Point) -> f32 {
    let line_vec = line_end - line_start;
    let point_vec = point - line_start;

    let line_len = line_vec.length();
    if line_len == 0.0 {
        return point_vec.length();
    }

    let t = (point_vec.dot(line_vec) / line_len).clamp(0.0, line_len);
    let projection = line_start + line_vec * t / line_len;
    (point - projection).length()
}

/// Even-odd test against the closed outline through `points`.
pub fn polygon_contains(points: &[Point], point: Point) -> bool {
    if points.len() < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = points.len() - 1;
    for i in 0..points.len() {
        let (a, b) = (points[i], points[j]);
        if (a.y > point.y) != (b.y > point.y) && point.x < (b.x - a.x) * (point.y - a.y) / (b.y - a.y) + a.x {
            inside = !inside;
        }
        j = i;
    }
    inside
}

fn distance_to_outline(points: &[Point], point: Point) -> f32 {
    if polygon_contains(points, point) {
        return 0.0;
    }
    let Some(last) = points.last() else {
        return f32::INFINITY;
    };
    let mut previous = *last;
    let mut best = f32::INFINITY;
    for current in points {
        best = best.min(distance_to_line_segment(point, previous, *current));
        previous = *current;
    }
    best
}

/// Distance from `point` to the drawn geometry of `marking`, zero inside closed shapes.
///
/// `stem` is the world length of a ray's direction stroke.
pub fn distance_to_marking(marking: &Marking, point: Point, stem: f32) -> f32 {
    match &marking.shape {
        MarkingShape::Point => distance(point, marking.origin),
        MarkingShape::Ray { angle_rad } => {
            let tip = marking.origin + Vec2::angled(*angle_rad) * stem;
            distance_to_line_segment(point, marking.origin, tip)
        }
        MarkingShape::LineSegment { endpoint } => distance_to_line_segment(point, marking.origin, *endpoint),
        MarkingShape::BoundingBox { endpoint } => {
            let rect = Rect::from_two_pos(marking.origin, *endpoint);
            if rect.contains(point) {
                0.0
            } else {
                rect.distance_to_pos(point)
            }
        }
        MarkingShape::Rectangle { points } | MarkingShape::Polygon { points } => distance_to_outline(points, point),
    }
}

/// Label of the marking closest to `point`, among those within their tolerance.
///
/// Later markings win ties, matching draw order.
pub fn pick_marking<F>(markings: &[Marking], point: Pos2, tolerance_of: F) -> Option<u32>
where
    F: Fn(&Marking) -> f32,
{
    let mut best: Option<(f32, u32)> = None;
    for marking in markings {
        let tolerance = tolerance_of(marking);
        let d = distance_to_marking(marking, point, tolerance * RAY_STEM_FACTOR);
        if d <= tolerance && best.map_or(true, |(best_d, _)| d <= best_d) {
            best = Some((d, marking.label));
        }
    }
    best.map(|(_, label)| label)
}
