//! User settings, persisted by the shell through eframe storage.

use serde::{Deserialize, Serialize};

use crate::capture::POLYGON_SNAP_DISTANCE;
use crate::marking::MarkingTypeRegistry;

/// What a primary click on a canvas does.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CursorMode {
    /// Clicks select existing markings.
    #[default]
    Selection,
    /// Clicks capture new markings of the selected type.
    Marking,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub cursor_mode: CursorMode,
    /// Rotating one canvas rotates the other by the same amount.
    pub rotation_sync: bool,
    pub show_labels: bool,
    /// World-space distance within which a click closes a polygon.
    pub polygon_snap_distance: f32,
    /// Reports list only features matched by correlation id.
    pub include_matched_only: bool,
    pub marking_types: MarkingTypeRegistry,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            cursor_mode: CursorMode::default(),
            rotation_sync: false,
            show_labels: true,
            polygon_snap_distance: POLYGON_SNAP_DISTANCE,
            include_matched_only: true,
            marking_types: MarkingTypeRegistry::default(),
        }
    }
}
