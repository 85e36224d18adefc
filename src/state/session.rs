use egui::Vec2;

use super::{CanvasId, CanvasState, Canvases, MarkingsSnapshot, PersistenceResult};
use crate::capture::{CaptureContext, CaptureOutcome, InterruptSignal};
use crate::command::{Command, CommandHistory, CommandResult};
use crate::config::{CursorMode, Settings};
use crate::error::MarkingResult;
use crate::event::{EventBus, MarkingEvent};
use crate::geometry::{get_adjusted_position, hit_testing};
use crate::input::{KeyState, PointerEvent, PointerEventKind, Shortcut};
use crate::marking::{Marking, MarkingType};
use crate::matching::{self, FeatureCounts, MatchCache, MatchedFeature};

/// Tolerance used for markings whose type is gone.
const FALLBACK_HIT_SIZE: f32 = 10.0;

/// Everything one examination session owns.
///
/// Created at startup and reset on a new session. Pointer and keyboard input is routed
/// through here so the history and the held-key flags have a single owner.
#[derive(Debug)]
pub struct Session {
    canvases: Canvases,
    history: CommandHistory,
    settings: Settings,
    keys: KeyState,
    events: EventBus,
    interrupt: InterruptSignal,
    match_cache: MatchCache,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(Settings::default())
    }
}

impl Session {
    pub fn new(settings: Settings) -> Self {
        Self {
            canvases: Canvases::default(),
            history: CommandHistory::new(),
            settings,
            keys: KeyState::default(),
            events: EventBus::new(),
            interrupt: InterruptSignal::default(),
            match_cache: MatchCache::default(),
        }
    }

    pub fn canvases(&self) -> &Canvases {
        &self.canvases
    }

    pub fn canvas(&self, id: CanvasId) -> &CanvasState {
        self.canvases.get(id)
    }

    /// Mutable canvas access for view changes (pan, zoom, resize).
    pub fn canvas_mut(&mut self, id: CanvasId) -> &mut CanvasState {
        self.canvases.get_mut(id)
    }

    pub fn markings(&self, id: CanvasId) -> &[Marking] {
        self.canvases.store(id).markings()
    }

    pub fn history(&self) -> &CommandHistory {
        &self.history
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// A handle other components can raise to stop any running capture.
    pub fn interrupt_signal(&self) -> InterruptSignal {
        self.interrupt.clone()
    }

    pub fn key_state(&self) -> KeyState {
        self.keys
    }

    pub fn set_key_state(&mut self, keys: KeyState) {
        if self.keys.rotate_key_held && !keys.rotate_key_held {
            for id in CanvasId::BOTH {
                self.canvases.get_mut(id).rotation_tracker.release();
            }
        }
        self.keys = keys;
    }

    pub fn cursor_mode(&self) -> CursorMode {
        self.settings.cursor_mode
    }

    /// Switches between selection and marking. Any running capture is dropped.
    pub fn set_cursor_mode(&mut self, mode: CursorMode) {
        if self.settings.cursor_mode == mode {
            return;
        }
        self.interrupt_marking();
        self.settings.cursor_mode = mode;
        log::debug!("Cursor mode set to {:?}", mode);
    }

    pub fn selected_marking_type(&self) -> Option<&MarkingType> {
        self.settings.marking_types.selected_type()
    }

    pub fn select_marking_type(&mut self, id: &str) -> bool {
        self.settings.marking_types.select(id)
    }

    /// Marking type of `marking`, if it is still defined.
    pub fn marking_type_of(&self, marking: &Marking) -> Option<&MarkingType> {
        self.settings.marking_types.find(&marking.type_id)
    }

    /// Routes one pointer event on `id` to rotation, selection or capture.
    pub fn handle_pointer(&mut self, id: CanvasId, event: PointerEvent) {
        self.poll_interrupt();

        if self.keys.rotate_key_held {
            if event.kind != PointerEventKind::Move {
                return;
            }
            // Moves still reach a running capture.
            self.track_manual_rotation(id, event);
        }

        match self.settings.cursor_mode {
            CursorMode::Selection => {
                if event.kind == PointerEventKind::Down && event.is_primary() {
                    self.select_at(id, event);
                }
            }
            CursorMode::Marking => {
                if let Err(err) = self.route_marking(id, event) {
                    log::error!("Marking capture on the {} canvas failed: {}", id, err);
                }
            }
        }
    }

    fn route_marking(&mut self, id: CanvasId, event: PointerEvent) -> MarkingResult<()> {
        let gate_open = !self.keys.blocks_marking() && event.is_primary();
        let canvas = self.canvases.get_mut(id);
        let has_image = canvas.has_image();
        let viewport = *canvas.viewport();
        let mut ctx = CaptureContext::new(&mut canvas.store, &viewport)
            .with_snap_distance(self.settings.polygon_snap_distance);

        let outcome = match event.kind {
            PointerEventKind::Move => {
                canvas.capture.pointer_move(&mut ctx, event.position)?;
                return Ok(());
            }
            PointerEventKind::Down if gate_open && has_image => {
                if canvas.capture.is_active() {
                    canvas.capture.pointer_down(&mut ctx, event.position)?
                } else {
                    let marking_type = self.settings.marking_types.selected_type();
                    if canvas.capture.begin(&mut ctx, marking_type, event.position) {
                        if let (Some(marking_type), Some(temporary)) = (marking_type, ctx.store.temporary()) {
                            self.events.emit(MarkingEvent::CaptureStarted {
                                canvas: id,
                                class: marking_type.marking_class,
                                label: temporary.label,
                            });
                        }
                    }
                    CaptureOutcome::Pending
                }
            }
            PointerEventKind::Up if gate_open && has_image => canvas.capture.pointer_up(&mut ctx, event.position)?,
            _ => return Ok(()),
        };

        if let CaptureOutcome::Committed(marking) = outcome {
            self.commit(id, marking);
        }
        Ok(())
    }

    fn commit(&mut self, id: CanvasId, marking: Marking) {
        let label = marking.label;
        let command = Command::add_or_update(id, marking, self.canvases.store(id));
        match self.execute(command) {
            Ok(()) => {
                log::info!("Committed marking {} on the {} canvas", label, id);
                self.events.emit(MarkingEvent::MarkingCommitted { canvas: id, label });
            }
            Err(err) => log::error!("Failed to commit marking {}: {}", label, err),
        }
    }

    fn execute(&mut self, command: Command) -> CommandResult {
        self.history.execute(command, &mut self.canvases)?;
        self.emit_history_changed();
        Ok(())
    }

    fn emit_history_changed(&self) {
        self.events.emit(MarkingEvent::HistoryChanged {
            can_undo: self.history.can_undo(),
            can_redo: self.history.can_redo(),
        });
    }

    pub fn undo(&mut self) -> bool {
        match self.history.undo(&mut self.canvases) {
            Ok(true) => {
                log::info!("Undo");
                self.emit_history_changed();
                true
            }
            Ok(false) => false,
            Err(err) => {
                log::error!("Undo failed: {}", err);
                false
            }
        }
    }

    pub fn redo(&mut self) -> bool {
        match self.history.redo(&mut self.canvases) {
            Ok(true) => {
                log::info!("Redo");
                self.emit_history_changed();
                true
            }
            Ok(false) => false,
            Err(err) => {
                log::error!("Redo failed: {}", err);
                false
            }
        }
    }

    pub fn handle_shortcut(&mut self, shortcut: Shortcut) -> bool {
        match shortcut {
            Shortcut::Undo => self.undo(),
            Shortcut::Redo => self.redo(),
        }
    }

    /// Drops the captures running on both canvases.
    pub fn interrupt_marking(&mut self) {
        for id in CanvasId::BOTH {
            let canvas = self.canvases.get_mut(id);
            if canvas.capture.interrupt(&mut canvas.store) {
                self.events.emit(MarkingEvent::CaptureInterrupted { canvas: id });
            }
        }
    }

    /// Applies a pending [`InterruptSignal`]. Returns whether one was raised.
    pub fn poll_interrupt(&mut self) -> bool {
        let raised = self.interrupt.take();
        if raised {
            self.interrupt_marking();
        }
        raised
    }

    fn select_at(&mut self, id: CanvasId, event: PointerEvent) {
        let registry = &self.settings.marking_types;
        let canvas = self.canvases.get_mut(id);
        let viewport = *canvas.viewport();
        let world = get_adjusted_position(event.position, viewport.rotation, &viewport);
        let picked = hit_testing::pick_marking(canvas.store.markings(), world, |marking| {
            let size = registry.find(&marking.type_id).map_or(FALLBACK_HIT_SIZE, |t| t.size);
            size / viewport.scale
        });
        canvas.store.select(picked);
        log::debug!("Selected {:?} on the {} canvas", picked, id);
    }

    pub fn selected_label(&self, id: CanvasId) -> Option<u32> {
        self.canvases.store(id).selected_label()
    }

    pub fn select_marking(&mut self, id: CanvasId, label: Option<u32>) {
        self.canvases.store_mut(id).select(label);
    }

    /// Removes a committed marking through the history.
    pub fn remove_marking(&mut self, id: CanvasId, label: u32) -> CommandResult {
        let command = Command::remove(id, label, self.canvases.store(id))?;
        self.execute(command)?;
        log::info!("Removed marking {} from the {} canvas", label, id);
        self.events.emit(MarkingEvent::MarkingRemoved { canvas: id, label });
        Ok(())
    }

    /// Removes the selected marking of `id`, if any.
    pub fn delete_selected(&mut self, id: CanvasId) -> bool {
        let Some(label) = self.selected_label(id) else {
            return false;
        };
        match self.remove_marking(id, label) {
            Ok(()) => true,
            Err(err) => {
                log::warn!("{}", err);
                false
            }
        }
    }

    fn track_manual_rotation(&mut self, id: CanvasId, event: PointerEvent) {
        let canvas = self.canvases.get_mut(id);
        if !canvas.has_image() {
            return;
        }
        let center = canvas.viewport().screen_center();
        if let Some(delta) = canvas.rotation_tracker.track(event.position, center) {
            self.rotate_canvas(id, delta);
        }
    }

    /// Rotates `id` by `delta` radians, honoring rotation sync.
    pub fn rotate_canvas(&mut self, id: CanvasId, delta: f32) {
        let sync = self.settings.rotation_sync;
        self.canvases.apply_rotation_delta(id, delta, sync);
        self.emit_rotation(id, sync);
    }

    pub fn reset_rotation(&mut self, id: CanvasId) {
        let sync = self.settings.rotation_sync;
        self.canvases.reset_rotation(id, sync);
        self.emit_rotation(id, sync);
    }

    fn emit_rotation(&self, id: CanvasId, sync: bool) {
        let affected: &[CanvasId] = if sync { &CanvasId::BOTH } else { std::slice::from_ref(&id) };
        for canvas in affected {
            self.events.emit(MarkingEvent::RotationChanged {
                canvas: *canvas,
                rotation: self.canvases.get(*canvas).rotation(),
            });
        }
    }

    /// Shows a new image of `world_size` on `id`.
    ///
    /// The canvas starts over, and the history is cleared since its commands refer to the old markings.
    pub fn load_image(&mut self, id: CanvasId, world_size: Vec2) {
        if self.canvases.get(id).capture.is_active() {
            self.events.emit(MarkingEvent::CaptureInterrupted { canvas: id });
        }
        self.canvases.get_mut(id).load_image(world_size);
        self.history.clear();
        log::info!("Loaded a {}x{} image on the {} canvas", world_size.x, world_size.y, id);
        self.events.emit(MarkingEvent::CollectionReset { canvas: id });
        self.emit_history_changed();
    }

    /// Starts a new session: empty collections, empty history.
    pub fn reset(&mut self) {
        self.interrupt_marking();
        for id in CanvasId::BOTH {
            self.canvases.store_mut(id).reset();
            self.events.emit(MarkingEvent::CollectionReset { canvas: id });
        }
        self.history.clear();
        self.match_cache.invalidate();
        self.emit_history_changed();
    }

    fn revisions(&self) -> (u64, u64) {
        (
            self.canvases.store(CanvasId::Left).revision(),
            self.canvases.store(CanvasId::Right).revision(),
        )
    }

    pub fn matched_features(&mut self) -> &[MatchedFeature] {
        let revisions = self.revisions();
        self.match_cache
            .matched(revisions, self.canvases.left.store.markings(), self.canvases.right.store.markings())
    }

    pub fn paired_features(&self) -> Vec<MatchedFeature> {
        matching::get_paired_by_label(self.markings(CanvasId::Left), self.markings(CanvasId::Right))
    }

    pub fn feature_counts(&mut self) -> FeatureCounts {
        let revisions = self.revisions();
        self.match_cache
            .counts(revisions, self.canvases.left.store.markings(), self.canvases.right.store.markings())
    }

    pub fn report_features(&self) -> Vec<MatchedFeature> {
        matching::select_report_features(
            self.markings(CanvasId::Left),
            self.markings(CanvasId::Right),
            self.settings.include_matched_only,
        )
    }

    pub fn snapshot(&self) -> MarkingsSnapshot {
        MarkingsSnapshot::capture(&self.canvases)
    }

    /// Replaces both collections with `snapshot`. The history is cleared.
    pub fn restore(&mut self, snapshot: MarkingsSnapshot) -> PersistenceResult<()> {
        snapshot.restore(&mut self.canvases)?;
        self.history.clear();
        for id in CanvasId::BOTH {
            self.events.emit(MarkingEvent::CollectionReset { canvas: id });
        }
        self.emit_history_changed();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventLog;
    use egui::pos2;
    use std::f32::consts::FRAC_PI_2;

    fn marking_session() -> Session {
        let mut session = Session::default();
        session.set_cursor_mode(CursorMode::Marking);
        session.load_image(CanvasId::Left, Vec2::new(800.0, 600.0));
        session.load_image(CanvasId::Right, Vec2::new(800.0, 600.0));
        session
    }

    fn click(session: &mut Session, id: CanvasId, x: f32, y: f32) {
        let pos = pos2(x, y);
        session.handle_pointer(id, PointerEvent::moved(pos));
        session.handle_pointer(id, PointerEvent::down(pos, egui::PointerButton::Primary));
        session.handle_pointer(id, PointerEvent::up(pos, egui::PointerButton::Primary));
    }

    #[test]
    fn test_pan_key_blocks_capture() {
        let mut session = marking_session();
        session.select_marking_type("point");
        session.set_key_state(KeyState {
            pan_key_held: true,
            rotate_key_held: false,
        });
        click(&mut session, CanvasId::Left, 10.0, 10.0);
        assert!(session.markings(CanvasId::Left).is_empty());
        assert!(session.canvas(CanvasId::Left).store.temporary().is_none());
    }

    #[test]
    fn test_no_capture_without_image() {
        let mut session = Session::default();
        session.set_cursor_mode(CursorMode::Marking);
        session.select_marking_type("point");
        click(&mut session, CanvasId::Left, 10.0, 10.0);
        assert!(session.markings(CanvasId::Left).is_empty());
    }

    #[test]
    fn test_secondary_button_ignored() {
        let mut session = marking_session();
        session.select_marking_type("point");
        session.handle_pointer(
            CanvasId::Left,
            PointerEvent::down(pos2(5.0, 5.0), egui::PointerButton::Secondary),
        );
        assert!(!session.canvas(CanvasId::Left).capture.is_active());
    }

    #[test]
    fn test_cursor_mode_change_interrupts() {
        let mut session = marking_session();
        session.select_marking_type("polygon");
        session.handle_pointer(CanvasId::Right, PointerEvent::down(pos2(5.0, 5.0), egui::PointerButton::Primary));
        assert!(session.canvas(CanvasId::Right).capture.is_active());

        session.set_cursor_mode(CursorMode::Selection);
        assert!(!session.canvas(CanvasId::Right).capture.is_active());
        assert!(session.canvas(CanvasId::Right).store.temporary().is_none());
        assert!(!session.history().can_undo());
    }

    #[test]
    fn test_raised_signal_interrupts_on_next_event() {
        let mut session = marking_session();
        session.select_marking_type("line-segment");
        session.handle_pointer(CanvasId::Left, PointerEvent::down(pos2(5.0, 5.0), egui::PointerButton::Primary));
        session.interrupt_signal().raise();
        session.handle_pointer(CanvasId::Left, PointerEvent::moved(pos2(9.0, 9.0)));
        assert!(!session.canvas(CanvasId::Left).capture.is_active());
        assert!(session.canvas(CanvasId::Left).store.temporary().is_none());
    }

    #[test]
    fn test_selection_and_delete_are_undoable() {
        let mut session = marking_session();
        session.select_marking_type("point");
        click(&mut session, CanvasId::Left, 100.0, 100.0);
        let world = session.markings(CanvasId::Left)[0].origin;
        let screen = session.canvas(CanvasId::Left).viewport().to_screen(world);

        session.set_cursor_mode(CursorMode::Selection);
        session.handle_pointer(CanvasId::Left, PointerEvent::down(screen, egui::PointerButton::Primary));
        assert_eq!(session.selected_label(CanvasId::Left), Some(1));

        assert!(session.delete_selected(CanvasId::Left));
        assert!(session.markings(CanvasId::Left).is_empty());
        assert!(session.undo());
        assert_eq!(session.markings(CanvasId::Left).len(), 1);
    }

    #[test]
    fn test_moves_reach_capture_while_rotating() {
        let mut session = marking_session();
        session.select_marking_type("bounding-box");
        session.handle_pointer(CanvasId::Left, PointerEvent::down(pos2(10.0, 10.0), egui::PointerButton::Primary));
        session.handle_pointer(CanvasId::Left, PointerEvent::up(pos2(10.0, 10.0), egui::PointerButton::Primary));

        session.set_key_state(KeyState {
            pan_key_held: false,
            rotate_key_held: true,
        });
        session.handle_pointer(CanvasId::Left, PointerEvent::moved(pos2(200.0, 200.0)));

        let viewport = *session.canvas(CanvasId::Left).viewport();
        let expected = get_adjusted_position(pos2(200.0, 200.0), viewport.rotation, &viewport);
        let endpoint = session.canvas(CanvasId::Left).store.temporary().and_then(|m| m.endpoint());
        assert_eq!(endpoint, Some(expected));

        // Presses stay blocked while R is held.
        session.handle_pointer(CanvasId::Left, PointerEvent::down(pos2(200.0, 200.0), egui::PointerButton::Primary));
        assert!(session.canvas(CanvasId::Left).capture.is_active());
        assert!(session.markings(CanvasId::Left).is_empty());
    }

    #[test]
    fn test_abandoned_capture_leaves_history_empty() {
        let mut session = marking_session();
        session.select_marking_type("bounding-box");
        session.handle_pointer(CanvasId::Left, PointerEvent::down(pos2(10.0, 10.0), egui::PointerButton::Primary));
        session.canvas_mut(CanvasId::Left).store.set_temporary(None);
        session.handle_pointer(CanvasId::Left, PointerEvent::down(pos2(50.0, 50.0), egui::PointerButton::Primary));

        assert!(!session.canvas(CanvasId::Left).capture.is_active());
        assert!(session.markings(CanvasId::Left).is_empty());
        assert!(!session.history().can_undo());
    }

    #[test]
    fn test_manual_rotation_syncs_opposite_canvas() {
        let mut session = marking_session();
        session.settings_mut().rotation_sync = true;
        session.set_key_state(KeyState {
            pan_key_held: false,
            rotate_key_held: true,
        });
        let center = session.canvas(CanvasId::Left).viewport().screen_center();
        session.handle_pointer(CanvasId::Left, PointerEvent::moved(center + Vec2::new(10.0, 0.0)));
        session.handle_pointer(CanvasId::Left, PointerEvent::moved(center + Vec2::new(0.0, 10.0)));

        assert!((session.canvas(CanvasId::Left).rotation() - FRAC_PI_2).abs() < 1e-5);
        assert!((session.canvas(CanvasId::Right).rotation() - FRAC_PI_2).abs() < 1e-5);

        session.reset_rotation(CanvasId::Left);
        assert_eq!(session.canvas(CanvasId::Left).rotation(), 0.0);
        assert!(session.canvas(CanvasId::Right).rotation().abs() < 1e-5);
    }

    #[test]
    fn test_events_follow_capture() {
        let mut session = marking_session();
        let log = EventLog::default();
        session.events().subscribe(Box::new(log.clone()));
        session.select_marking_type("point");
        click(&mut session, CanvasId::Left, 20.0, 20.0);

        let events = log.events();
        assert!(events.contains(&MarkingEvent::CaptureStarted {
            canvas: CanvasId::Left,
            class: crate::marking::MarkingClass::Point,
            label: 1,
        }));
        assert!(events.contains(&MarkingEvent::HistoryChanged {
            can_undo: true,
            can_redo: false,
        }));
        assert_eq!(
            log.last(),
            Some(MarkingEvent::MarkingCommitted {
                canvas: CanvasId::Left,
                label: 1,
            })
        );
    }

    #[test]
    fn test_counts_track_commits() {
        let mut session = marking_session();
        session.select_marking_type("point");
        click(&mut session, CanvasId::Left, 20.0, 20.0);
        click(&mut session, CanvasId::Right, 30.0, 30.0);
        let counts = session.feature_counts();
        assert_eq!((counts.left, counts.right, counts.paired, counts.matched), (1, 1, 1, 0));
    }
}
