use egui::{Pos2, Vec2};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::capture::MarkingCapture;
use crate::geometry::{RenderTransform, Viewport, ViewportRatios};
use crate::input::ManualRotation;

use super::MarkingsStore;

/// Which of the two side-by-side images a canvas shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CanvasId {
    Left,
    Right,
}

impl CanvasId {
    pub const BOTH: [CanvasId; 2] = [CanvasId::Left, CanvasId::Right];

    pub fn opposite(self) -> Self {
        match self {
            CanvasId::Left => CanvasId::Right,
            CanvasId::Right => CanvasId::Left,
        }
    }
}

impl fmt::Display for CanvasId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CanvasId::Left => f.write_str("left"),
            CanvasId::Right => f.write_str("right"),
        }
    }
}

/// Everything one canvas owns: its markings, view and capture state.
#[derive(Debug)]
pub struct CanvasState {
    pub id: CanvasId,
    pub store: MarkingsStore,
    pub capture: MarkingCapture,
    pub(crate) rotation_tracker: ManualRotation,
    viewport: Viewport,
    ratios: ViewportRatios,
    image_loaded: bool,
}

impl CanvasState {
    pub fn new(id: CanvasId) -> Self {
        let viewport = Viewport::default();
        Self {
            id,
            store: MarkingsStore::new(),
            capture: MarkingCapture::default(),
            rotation_tracker: ManualRotation::default(),
            ratios: ViewportRatios::from_viewport(&viewport),
            viewport,
            image_loaded: false,
        }
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// Cached screen/world ratios, refreshed on zoom and resize only.
    pub fn ratios(&self) -> ViewportRatios {
        self.ratios
    }

    pub fn render_transform(&self) -> RenderTransform {
        RenderTransform::new(self.ratios, &self.viewport)
    }

    pub fn has_image(&self) -> bool {
        self.image_loaded
    }

    pub fn rotation(&self) -> f32 {
        self.viewport.rotation
    }

    pub fn set_rotation(&mut self, rotation: f32) {
        self.viewport.rotation = rotation;
    }

    pub fn set_screen_size(&mut self, size: Vec2) {
        if self.viewport.screen_size != size {
            self.viewport.screen_size = size;
            self.refresh_ratios();
        }
    }

    pub fn pan(&mut self, delta: Vec2) {
        self.viewport.pan(delta);
    }

    pub fn zoom_at(&mut self, anchor: Pos2, factor: f32) {
        self.viewport.zoom_at(anchor, factor);
        self.refresh_ratios();
    }

    /// Shows a freshly loaded image of `world_size` and drops everything drawn on the old one.
    pub fn load_image(&mut self, world_size: Vec2) {
        self.viewport.world_size = world_size;
        self.viewport.rotation = 0.0;
        self.viewport.fit_world();
        self.refresh_ratios();
        self.store.reset();
        self.capture.interrupt(&mut self.store);
        self.image_loaded = true;
    }

    fn refresh_ratios(&mut self) {
        self.ratios = ViewportRatios::from_viewport(&self.viewport);
    }
}

/// The left and right canvases.
#[derive(Debug)]
pub struct Canvases {
    pub left: CanvasState,
    pub right: CanvasState,
}

impl Default for Canvases {
    fn default() -> Self {
        Self {
            left: CanvasState::new(CanvasId::Left),
            right: CanvasState::new(CanvasId::Right),
        }
    }
}

impl Canvases {
    pub fn get(&self, id: CanvasId) -> &CanvasState {
        match id {
            CanvasId::Left => &self.left,
            CanvasId::Right => &self.right,
        }
    }

    pub fn get_mut(&mut self, id: CanvasId) -> &mut CanvasState {
        match id {
            CanvasId::Left => &mut self.left,
            CanvasId::Right => &mut self.right,
        }
    }

    pub fn store(&self, id: CanvasId) -> &MarkingsStore {
        &self.get(id).store
    }

    pub fn store_mut(&mut self, id: CanvasId) -> &mut MarkingsStore {
        &mut self.get_mut(id).store
    }

    /// Rotates `id` by `delta`, and the opposite canvas by the same amount when `sync` is on.
    pub fn apply_rotation_delta(&mut self, id: CanvasId, delta: f32, sync: bool) {
        let canvas = self.get_mut(id);
        canvas.set_rotation(canvas.rotation() + delta);
        if sync {
            let opposite = self.get_mut(id.opposite());
            opposite.set_rotation(opposite.rotation() + delta);
        }
    }

    /// Puts `id` back to zero rotation; a synced opposite canvas is turned back by the same amount.
    pub fn reset_rotation(&mut self, id: CanvasId, sync: bool) {
        let current = self.get(id).rotation();
        self.get_mut(id).set_rotation(0.0);
        if sync {
            let opposite = self.get_mut(id.opposite());
            opposite.set_rotation(opposite.rotation() - current);
        }
    }
}
