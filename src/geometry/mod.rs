//! Coordinate transforms between screen, normalized and world space.
//!
//! Screen positions handed to this module are *normalized*: relative to the top-left
//! corner of the canvas they were captured on. World positions live in the fixed frame
//! of the loaded image. The viewport rotation is applied on the screen side, around the
//! center of the canvas, so markings follow the rotated picture rather than the
//! unrotated world grid.

pub mod hit_testing;

use egui::{Pos2, Vec2};
use serde::{Deserialize, Serialize};
use std::f32::consts::{PI, TAU};

/// A world-space coordinate.
pub type Point = Pos2;

pub const MIN_SCALE: f32 = 0.05;
pub const MAX_SCALE: f32 = 40.0;

/// Rotates `point` around `(center_x, center_y)` by `rotation` radians.
///
/// A rotation of exactly zero returns the input untouched.
pub fn transform_point(point: Point, rotation: f32, center_x: f32, center_y: f32) -> Point {
    if rotation == 0.0 {
        return point;
    }
    let (sin, cos) = rotation.sin_cos();
    let x = point.x - center_x;
    let y = point.y - center_y;
    Pos2::new(x * cos - y * sin + center_x, x * sin + y * cos + center_y)
}

/// Undoes [`transform_point`] for the same rotation and center.
pub fn inverse_transform_point(point: Point, rotation: f32, center_x: f32, center_y: f32) -> Point {
    transform_point(point, -rotation, center_x, center_y)
}

/// Direction of the vector `reference -> target`, in radians.
pub fn angle_between(target: Point, reference: Point) -> f32 {
    (target.y - reference.y).atan2(target.x - reference.x)
}

pub fn distance(a: Point, b: Point) -> f32 {
    a.distance(b)
}

/// Folds an angle difference into `[-PI, PI]`.
pub fn normalize_angle_delta(delta: f32) -> f32 {
    let mut delta = delta;
    if delta > PI {
        delta -= TAU;
    }
    if delta < -PI {
        delta += TAU;
    }
    delta
}

/// Pan, zoom and rotation of one canvas.
///
/// `offset` is the screen position of the world origin and `scale` the number of
/// screen units per world unit. The canvas owns this state; capture code only reads it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub screen_size: Vec2,
    pub world_size: Vec2,
    pub offset: Vec2,
    pub scale: f32,
    pub rotation: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            screen_size: Vec2::new(800.0, 600.0),
            world_size: Vec2::ZERO,
            offset: Vec2::ZERO,
            scale: 1.0,
            rotation: 0.0,
        }
    }
}

impl Viewport {
    pub fn new(screen_size: Vec2, world_size: Vec2) -> Self {
        Self {
            screen_size,
            world_size,
            ..Self::default()
        }
    }

    pub fn screen_center(&self) -> Pos2 {
        (self.screen_size / 2.0).to_pos2()
    }

    /// Size of the world as currently drawn on screen.
    pub fn screen_world_size(&self) -> Vec2 {
        self.world_size * self.scale
    }

    /// Maps an unrotated screen position to world space.
    pub fn to_world(&self, screen: Pos2) -> Pos2 {
        ((screen.to_vec2() - self.offset) / self.scale).to_pos2()
    }

    /// Maps a world position to an unrotated screen position.
    pub fn to_screen(&self, world: Pos2) -> Pos2 {
        (world.to_vec2() * self.scale + self.offset).to_pos2()
    }

    pub fn pan(&mut self, delta: Vec2) {
        self.offset += delta;
    }

    /// Zooms by `factor` keeping the world point under `anchor` in place.
    pub fn zoom_at(&mut self, anchor: Pos2, factor: f32) {
        let world = self.to_world(anchor);
        self.scale = (self.scale * factor).clamp(MIN_SCALE, MAX_SCALE);
        self.offset = anchor.to_vec2() - world.to_vec2() * self.scale;
    }

    /// Scales and centers the world so it fits the screen.
    pub fn fit_world(&mut self) {
        if self.world_size.x <= 0.0 || self.world_size.y <= 0.0 {
            self.scale = 1.0;
            self.offset = Vec2::ZERO;
            return;
        }
        let scale = (self.screen_size.x / self.world_size.x).min(self.screen_size.y / self.world_size.y);
        self.scale = scale.clamp(MIN_SCALE, MAX_SCALE);
        self.offset = (self.screen_size - self.screen_world_size()) / 2.0;
    }
}

/// Maps a normalized pointer position to world space, compensating for `rotation`.
pub fn get_adjusted_position(screen_point: Pos2, rotation: f32, viewport: &Viewport) -> Point {
    let center = viewport.screen_center();
    let unrotated = inverse_transform_point(screen_point, rotation, center.x, center.y);
    viewport.to_world(unrotated)
}

/// Screen-per-world ratios along each axis.
///
/// Panning leaves these unchanged, so canvases recompute them on zoom only.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewportRatios {
    pub width: f32,
    pub height: f32,
}

impl Default for ViewportRatios {
    fn default() -> Self {
        Self { width: 1.0, height: 1.0 }
    }
}

impl ViewportRatios {
    pub fn from_viewport(viewport: &Viewport) -> Self {
        let screen_world = viewport.screen_world_size();
        Self {
            width: ratio(screen_world.x, viewport.world_size.x, viewport.scale),
            height: ratio(screen_world.y, viewport.world_size.y, viewport.scale),
        }
    }
}

fn ratio(screen: f32, world: f32, fallback: f32) -> f32 {
    if world > 0.0 { screen / world } else { fallback }
}

/// Forward world -> rotated screen mapping used when drawing markings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderTransform {
    pub ratios: ViewportRatios,
    pub offset: Vec2,
    pub rotation: f32,
    pub center: Pos2,
}

impl RenderTransform {
    pub fn new(ratios: ViewportRatios, viewport: &Viewport) -> Self {
        Self {
            ratios,
            offset: viewport.offset,
            rotation: viewport.rotation,
            center: viewport.screen_center(),
        }
    }

    /// Scaled position without pan or rotation.
    pub fn viewport_position(&self, world: Point) -> Pos2 {
        Pos2::new(world.x * self.ratios.width, world.y * self.ratios.height)
    }

    pub fn apply(&self, world: Point) -> Pos2 {
        let screen = self.viewport_position(world) + self.offset;
        transform_point(screen, self.rotation, self.center.x, self.center.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-3;

    fn assert_close(a: Pos2, b: Pos2) {
        assert!((a.x - b.x).abs() < EPS && (a.y - b.y).abs() < EPS, "{a:?} != {b:?}");
    }

    #[test]
    fn test_zero_rotation_is_identity() {
        let p = Pos2::new(0.1 + 0.2, 17.3);
        let out = transform_point(p, 0.0, 123.4, -56.7);
        assert_eq!(out.x.to_bits(), p.x.to_bits());
        assert_eq!(out.y.to_bits(), p.y.to_bits());
    }

    #[test]
    fn test_rotation_round_trips() {
        let points = [Pos2::new(0.0, 0.0), Pos2::new(10.0, -3.5), Pos2::new(812.0, 455.0)];
        for step in -12..=12 {
            let theta = step as f32 * PI / 6.0 + 0.013;
            for p in points {
                let rotated = transform_point(p, theta, 400.0, 300.0);
                assert_close(transform_point(rotated, -theta, 400.0, 300.0), p);
                assert_close(inverse_transform_point(rotated, theta, 400.0, 300.0), p);
            }
        }
    }

    #[test]
    fn test_quarter_turn_rotates_counter_clockwise_in_math_frame() {
        let p = transform_point(Pos2::new(1.0, 0.0), PI / 2.0, 0.0, 0.0);
        assert_close(p, Pos2::new(0.0, 1.0));
    }

    #[test]
    fn test_adjusted_position_inverts_render_transform() {
        let mut viewport = Viewport::new(Vec2::new(800.0, 600.0), Vec2::new(1200.0, 900.0));
        viewport.fit_world();
        viewport.zoom_at(Pos2::new(250.0, 140.0), 1.7);
        viewport.pan(Vec2::new(-33.0, 12.0));
        viewport.rotation = 0.8;

        let render = RenderTransform::new(ViewportRatios::from_viewport(&viewport), &viewport);
        for screen in [Pos2::new(10.0, 10.0), Pos2::new(400.0, 300.0), Pos2::new(777.0, 20.0)] {
            let world = get_adjusted_position(screen, viewport.rotation, &viewport);
            assert_close(render.apply(world), screen);
        }
    }

    #[test]
    fn test_unrotated_identity_viewport_maps_screen_to_world() {
        let viewport = Viewport::new(Vec2::new(800.0, 600.0), Vec2::new(800.0, 600.0));
        let p = Pos2::new(120.0, 45.0);
        assert_eq!(get_adjusted_position(p, 0.0, &viewport), p);
    }

    #[test]
    fn test_zoom_keeps_anchor_fixed() {
        let mut viewport = Viewport::new(Vec2::new(800.0, 600.0), Vec2::new(400.0, 400.0));
        let anchor = Pos2::new(300.0, 200.0);
        let before = viewport.to_world(anchor);
        viewport.zoom_at(anchor, 2.5);
        assert_close(viewport.to_world(anchor), before);
        assert!((viewport.scale - 2.5).abs() < EPS);
    }

    #[test]
    fn test_ratios_follow_zoom() {
        let mut viewport = Viewport::new(Vec2::new(800.0, 600.0), Vec2::new(400.0, 200.0));
        viewport.zoom_at(Pos2::ZERO, 3.0);
        let ratios = ViewportRatios::from_viewport(&viewport);
        assert!((ratios.width - 3.0).abs() < EPS);
        assert!((ratios.height - 3.0).abs() < EPS);
    }

    #[test]
    fn test_angle_points_from_reference_to_target() {
        let origin = Pos2::new(5.0, 5.0);
        assert!((angle_between(Pos2::new(10.0, 5.0), origin)).abs() < EPS);
        assert!((angle_between(Pos2::new(5.0, 10.0), origin) - PI / 2.0).abs() < EPS);
    }

    #[test]
    fn test_angle_delta_is_folded() {
        assert!((normalize_angle_delta(1.5 * PI) + 0.5 * PI).abs() < EPS);
        assert!((normalize_angle_delta(-1.5 * PI) - 0.5 * PI).abs() < EPS);
        assert_eq!(normalize_angle_delta(0.25), 0.25);
    }
}
