use egui::Pos2;

use crate::geometry::{angle_between, normalize_angle_delta};

/// Drag-to-rotate tracking while the rotate key is held.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ManualRotation {
    last_angle: Option<f32>,
}

impl ManualRotation {
    /// Feeds the pointer position and returns the rotation since the previous one.
    ///
    /// The first position after a release only seeds the tracker.
    pub fn track(&mut self, position: Pos2, center: Pos2) -> Option<f32> {
        let angle = angle_between(position, center);
        let delta = self.last_angle.map(|last| normalize_angle_delta(angle - last));
        self.last_angle = Some(angle);
        delta
    }

    pub fn release(&mut self) {
        self.last_angle = None;
    }

    pub fn is_tracking(&self) -> bool {
        self.last_angle.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use egui::pos2;
    use std::f32::consts::{FRAC_PI_2, PI};

    #[test]
    fn test_first_position_seeds() {
        let mut rotation = ManualRotation::default();
        assert_eq!(rotation.track(pos2(10.0, 0.0), pos2(0.0, 0.0)), None);
        assert!(rotation.is_tracking());

        let delta = rotation.track(pos2(0.0, 10.0), pos2(0.0, 0.0)).unwrap();
        assert!((delta - FRAC_PI_2).abs() < 1e-5);
    }

    #[test]
    fn test_delta_wraps_across_pi() {
        let mut rotation = ManualRotation::default();
        let center = pos2(0.0, 0.0);
        rotation.track(pos2(-10.0, 0.1), center);
        let delta = rotation.track(pos2(-10.0, -0.1), center).unwrap();
        assert!(delta.abs() < 0.1);
        assert!(delta.abs() <= PI);
    }

    #[test]
    fn test_release_resets() {
        let mut rotation = ManualRotation::default();
        rotation.track(pos2(10.0, 0.0), pos2(0.0, 0.0));
        rotation.release();
        assert_eq!(rotation.track(pos2(0.0, 10.0), pos2(0.0, 0.0)), None);
    }
}
