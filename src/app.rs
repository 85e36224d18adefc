use eframe::egui::{self, Key, PointerButton, Rect, Sense};
use std::collections::HashMap;
use std::f32::consts::FRAC_PI_2;

use crate::config::{CursorMode, Settings};
use crate::event::StatusLine;
use crate::file_handler::FileHandler;
use crate::geometry::inverse_transform_point;
use crate::input::{InputHandler, KeyState, Shortcut};
use crate::renderer::Renderer;
use crate::state::{CanvasId, Session};

const SETTINGS_KEY: &str = "forensic_markings_settings";
/// Zoom factor per scrolled point.
const ZOOM_SPEED: f32 = 0.002;

/// Two canvases side by side with a toolbar on top.
pub struct MarkingApp {
    session: Session,
    renderer: Renderer,
    file_handler: FileHandler,
    inputs: HashMap<CanvasId, InputHandler>,
    canvas_rects: HashMap<CanvasId, Rect>,
    status: StatusLine,
}

impl MarkingApp {
    /// Called once before the first frame.
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        let settings: Settings = cc
            .storage
            .and_then(|storage| eframe::get_value(storage, SETTINGS_KEY))
            .unwrap_or_default();

        let session = Session::new(settings);
        let status = StatusLine::default();
        session.events().subscribe(Box::new(status.clone()));

        Self {
            session,
            renderer: Renderer::new(cc),
            file_handler: FileHandler::new(),
            inputs: HashMap::new(),
            canvas_rects: HashMap::new(),
            status,
        }
    }

    fn handle_keyboard(&mut self, ctx: &egui::Context) {
        if let Some(shortcut) = ctx.input_mut(Shortcut::consume) {
            self.session.handle_shortcut(shortcut);
        }

        let (delete, escape) = ctx.input(|i| {
            (
                i.key_pressed(Key::Delete) || i.key_pressed(Key::Backspace),
                i.key_pressed(Key::Escape),
            )
        });
        self.session.set_key_state(ctx.input(KeyState::from_input));
        if ctx.wants_keyboard_input() {
            return;
        }
        if delete {
            for id in CanvasId::BOTH {
                self.session.delete_selected(id);
            }
        }
        if escape {
            self.session.interrupt_marking();
        }
    }

    /// Shows dropped images on the canvas under the pointer, or the first empty one.
    fn handle_dropped_files(&mut self, ctx: &egui::Context) {
        self.file_handler.preview_files_being_dropped(ctx);
        if !self.file_handler.check_for_dropped_files(ctx) {
            return;
        }

        let hovered = ctx.input(|i| i.pointer.hover_pos()).and_then(|pos| {
            CanvasId::BOTH
                .into_iter()
                .find(|id| self.canvas_rects.get(id).is_some_and(|rect| rect.contains(pos)))
        });

        for image in self.file_handler.take_images() {
            let target = hovered
                .or_else(|| CanvasId::BOTH.into_iter().find(|id| !self.session.canvas(*id).has_image()))
                .unwrap_or(CanvasId::Left);
            let world_size = image.world_size();
            self.renderer.set_image(target, image.pixels, &image.name);
            self.session.load_image(target, world_size);
        }
        ctx.request_repaint();
    }

    fn toolbar(&mut self, ui: &mut egui::Ui) {
        ui.horizontal_wrapped(|ui| {
            let mode = self.session.cursor_mode();
            if ui.selectable_label(mode == CursorMode::Selection, "Select").clicked() {
                self.session.set_cursor_mode(CursorMode::Selection);
            }
            if ui.selectable_label(mode == CursorMode::Marking, "Mark").clicked() {
                self.session.set_cursor_mode(CursorMode::Marking);
            }

            ui.separator();

            let selected_name = self
                .session
                .selected_marking_type()
                .map_or_else(|| "No type".to_owned(), |t| t.display_name.clone());
            let mut chosen = None;
            egui::ComboBox::from_id_salt("marking_type")
                .selected_text(selected_name)
                .show_ui(ui, |ui| {
                    for marking_type in self.session.settings().marking_types.types() {
                        let label = format!("{} ({})", marking_type.display_name, marking_type.marking_class);
                        if ui.selectable_label(false, label).clicked() {
                            chosen = Some(marking_type.id.clone());
                        }
                    }
                });
            if let Some(id) = chosen {
                self.session.select_marking_type(&id);
            }

            ui.separator();

            let can_undo = self.session.history().can_undo();
            let can_redo = self.session.history().can_redo();
            if ui.add_enabled(can_undo, egui::Button::new("Undo")).clicked() {
                self.session.undo();
            }
            if ui.add_enabled(can_redo, egui::Button::new("Redo")).clicked() {
                self.session.redo();
            }

            ui.separator();

            ui.checkbox(&mut self.session.settings_mut().rotation_sync, "Sync rotation");
            ui.checkbox(&mut self.session.settings_mut().show_labels, "Labels");
            ui.checkbox(&mut self.session.settings_mut().include_matched_only, "Matched only in report");

            ui.separator();

            if ui.button("New session").clicked() {
                self.session.reset();
            }

            ui.separator();

            let counts = self.session.feature_counts();
            ui.label(format!(
                "Left: {}  Right: {}  Matched: {}  Paired: {}",
                counts.left, counts.right, counts.matched, counts.paired
            ));
        });
    }

    fn canvas_controls(&mut self, ui: &mut egui::Ui, id: CanvasId) {
        ui.horizontal(|ui| {
            ui.strong(format!("{} image", id));
            if ui.small_button("⟲").clicked() {
                self.session.rotate_canvas(id, -FRAC_PI_2);
            }
            if ui.small_button("⟳").clicked() {
                self.session.rotate_canvas(id, FRAC_PI_2);
            }
            if ui.small_button("Reset rotation").clicked() {
                self.session.reset_rotation(id);
            }
            ui.label(format!("{:.1}°", self.session.canvas(id).rotation().to_degrees()));
        });
    }

    fn show_canvas(&mut self, ui: &mut egui::Ui, id: CanvasId) {
        self.canvas_controls(ui, id);

        let (response, painter) = ui.allocate_painter(ui.available_size(), Sense::click_and_drag());
        let rect = response.rect;
        self.canvas_rects.insert(id, rect);
        self.session.canvas_mut(id).set_screen_size(rect.size());

        let keys = self.session.key_state();
        let panning = response.dragged_by(PointerButton::Middle)
            || (keys.pan_key_held && response.dragged_by(PointerButton::Primary));
        if panning {
            self.session.canvas_mut(id).pan(response.drag_delta());
        }

        if let Some(hover) = response.hover_pos() {
            let scroll = ui.input(|i| i.smooth_scroll_delta.y);
            if scroll != 0.0 {
                let canvas = self.session.canvas_mut(id);
                let center = canvas.viewport().screen_center();
                let local = (hover - rect.min).to_pos2();
                let anchor = inverse_transform_point(local, canvas.rotation(), center.x, center.y);
                canvas.zoom_at(anchor, (scroll * ZOOM_SPEED).exp());
            }
        }

        let events = self
            .inputs
            .entry(id)
            .or_default()
            .process_input(ui.ctx(), rect);
        for event in events {
            self.session.handle_pointer(id, event);
        }

        if !self.session.canvas(id).has_image() {
            painter.text(
                rect.center(),
                egui::Align2::CENTER_CENTER,
                "Drop an image here",
                egui::FontId::proportional(16.0),
                ui.visuals().weak_text_color(),
            );
        }

        let show_labels = self.session.settings().show_labels;
        self.renderer.render_canvas(
            &painter,
            rect,
            self.session.canvas(id),
            &self.session.settings().marking_types,
            show_labels,
        );
    }
}

impl eframe::App for MarkingApp {
    /// Called by the framework to save state before shutdown.
    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        eframe::set_value(storage, SETTINGS_KEY, self.session.settings());
    }

    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.handle_keyboard(ctx);
        self.handle_dropped_files(ctx);

        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            self.toolbar(ui);
        });

        egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
            ui.label(self.status.message().unwrap_or_else(|| "Ready".to_owned()));
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.columns(2, |columns| {
                for (ui, id) in columns.iter_mut().zip(CanvasId::BOTH) {
                    self.show_canvas(ui, id);
                }
            });
        });
    }
}
