use eframe::egui::{self, Align2, Color32, FontId, Mesh, Painter, Pos2, Rect, Shape, Stroke, TextureHandle, Vec2};
use egui::epaint::Vertex;
use std::collections::HashMap;

use crate::marking::{Marking, MarkingClass, MarkingType, MarkingTypeRegistry, ScreenGeometry};
use crate::state::{CanvasId, CanvasState};

const STROKE_WIDTH: f32 = 2.0;
const SELECTED_STROKE_WIDTH: f32 = 4.0;
/// Ray stem length in multiples of the marking size.
const RAY_LENGTH_FACTOR: f32 = 3.0;

/// Draws the images and markings of both canvases.
pub struct Renderer {
    ctx: egui::Context,
    textures: HashMap<CanvasId, TextureHandle>,
}

impl std::fmt::Debug for Renderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Renderer")
            .field("textures", &self.textures.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Renderer {
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        Self::from_context(cc.egui_ctx.clone())
    }

    pub fn from_context(ctx: egui::Context) -> Self {
        Self {
            ctx,
            textures: HashMap::new(),
        }
    }

    /// Uploads `image` as the picture shown on `canvas`, replacing the previous one.
    pub fn set_image(&mut self, canvas: CanvasId, image: egui::ColorImage, name: &str) {
        let handle = self.ctx.load_texture(name, image, egui::TextureOptions::LINEAR);
        self.textures.insert(canvas, handle);
    }

    /// Paints `canvas` into `rect`: image first, then committed markings, then the temporary one.
    pub fn render_canvas(
        &self,
        painter: &Painter,
        rect: Rect,
        canvas: &CanvasState,
        registry: &MarkingTypeRegistry,
        show_labels: bool,
    ) {
        painter.rect_filled(rect, 0.0, Color32::from_gray(24));

        if let Some(texture) = self.textures.get(&canvas.id) {
            painter.add(image_mesh(texture.id(), rect, canvas));
        }

        let transform = canvas.render_transform();
        let offset = rect.min.to_vec2();
        let selected = canvas.store.selected_label();

        for marking in canvas.store.markings() {
            let Some(marking_type) = registry.find(&marking.type_id) else {
                log::trace!("Skipping marking {} with unknown type {}", marking.label, marking.type_id);
                continue;
            };
            let geometry = marking.screen_geometry(&transform);
            let style = MarkingStyle::new(marking_type, selected == Some(marking.label), false);
            painter.extend(marking_shapes(&geometry, offset, &style));
            if show_labels {
                paint_label(painter, &geometry, offset, marking, marking_type);
            }
        }

        if let Some(temporary) = canvas.store.temporary() {
            if let Some(marking_type) = registry.find(&temporary.type_id) {
                let geometry = temporary.screen_geometry(&transform);
                let style = MarkingStyle::new(marking_type, false, true);
                painter.extend(marking_shapes(&geometry, offset, &style));
            }
        }
    }
}

/// The loaded image as a textured quad following the canvas zoom, pan and rotation.
fn image_mesh(texture_id: egui::TextureId, rect: Rect, canvas: &CanvasState) -> Mesh {
    let transform = canvas.render_transform();
    let size = canvas.viewport().world_size;
    let offset = rect.min.to_vec2();
    let corners = [
        (Pos2::ZERO, egui::pos2(0.0, 0.0)),
        (egui::pos2(size.x, 0.0), egui::pos2(1.0, 0.0)),
        (egui::pos2(size.x, size.y), egui::pos2(1.0, 1.0)),
        (egui::pos2(0.0, size.y), egui::pos2(0.0, 1.0)),
    ];

    let mut mesh = Mesh::with_texture(texture_id);
    for (world, uv) in corners {
        mesh.vertices.push(Vertex {
            pos: transform.apply(world) + offset,
            uv,
            color: Color32::WHITE,
        });
    }
    mesh.add_triangle(0, 1, 2);
    mesh.add_triangle(0, 2, 3);
    mesh
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct MarkingStyle {
    stroke: Stroke,
    size: f32,
    class: MarkingClass,
    /// In-progress polygons stay open.
    temporary: bool,
}

impl MarkingStyle {
    fn new(marking_type: &MarkingType, selected: bool, temporary: bool) -> Self {
        let width = if selected { SELECTED_STROKE_WIDTH } else { STROKE_WIDTH };
        Self {
            stroke: Stroke::new(width, marking_type.background_color),
            size: marking_type.size,
            class: marking_type.marking_class,
            temporary,
        }
    }
}

fn marking_shapes(geometry: &ScreenGeometry, offset: Vec2, style: &MarkingStyle) -> Vec<Shape> {
    let stroke = style.stroke;
    match geometry {
        ScreenGeometry::Point { center } => vec![
            Shape::circle_stroke(*center + offset, style.size, stroke),
            Shape::circle_filled(*center + offset, stroke.width, stroke.color),
        ],
        ScreenGeometry::Ray { origin, angle } => {
            let origin = *origin + offset;
            let tip = origin + Vec2::angled(*angle) * style.size * RAY_LENGTH_FACTOR;
            vec![
                Shape::circle_stroke(origin, style.size, stroke),
                Shape::line_segment([origin, tip], stroke),
            ]
        }
        ScreenGeometry::Segment { origin, endpoint } => {
            let (origin, endpoint) = (*origin + offset, *endpoint + offset);
            vec![
                Shape::line_segment([origin, endpoint], stroke),
                Shape::circle_filled(origin, stroke.width * 1.5, stroke.color),
                Shape::circle_filled(endpoint, stroke.width * 1.5, stroke.color),
            ]
        }
        ScreenGeometry::Box { origin, endpoint } => {
            vec![Shape::rect_stroke(
                Rect::from_two_pos(*origin + offset, *endpoint + offset),
                0.0,
                stroke,
            )]
        }
        ScreenGeometry::Polygon { points, .. } => {
            let points: Vec<Pos2> = points.iter().map(|p| *p + offset).collect();
            if style.temporary && style.class == MarkingClass::Polygon {
                vec![Shape::line(points, stroke)]
            } else {
                vec![Shape::closed_line(points, stroke)]
            }
        }
    }
}

fn anchor(geometry: &ScreenGeometry) -> Pos2 {
    match geometry {
        ScreenGeometry::Point { center } => *center,
        ScreenGeometry::Ray { origin, .. }
        | ScreenGeometry::Segment { origin, .. }
        | ScreenGeometry::Box { origin, .. }
        | ScreenGeometry::Polygon { origin, .. } => *origin,
    }
}

fn paint_label(painter: &Painter, geometry: &ScreenGeometry, offset: Vec2, marking: &Marking, marking_type: &MarkingType) {
    let pos = anchor(geometry) + offset + Vec2::new(marking_type.size, -marking_type.size);
    let galley = painter.layout_no_wrap(marking.label.to_string(), FontId::proportional(12.0), marking_type.text_color);
    let text_rect = Align2::LEFT_BOTTOM.anchor_size(pos, galley.size()).expand(2.0);
    painter.rect_filled(text_rect, 2.0, marking_type.background_color);
    painter.galley(text_rect.min + Vec2::splat(2.0), galley, marking_type.text_color);
}

#[cfg(test)]
mod tests {
    use super::*;
    use egui::pos2;

    fn style(class: MarkingClass, temporary: bool) -> MarkingStyle {
        MarkingStyle::new(&MarkingType::new("t", "T", class), false, temporary)
    }

    #[test]
    fn test_shapes_are_offset_into_canvas() {
        let geometry = ScreenGeometry::Segment {
            origin: pos2(0.0, 0.0),
            endpoint: pos2(10.0, 0.0),
        };
        let shapes = marking_shapes(&geometry, Vec2::new(100.0, 50.0), &style(MarkingClass::LineSegment, false));
        let Shape::LineSegment { points, .. } = &shapes[0] else {
            panic!("expected a line segment");
        };
        assert_eq!(points, &[pos2(100.0, 50.0), pos2(110.0, 50.0)]);
    }

    #[test]
    fn test_temporary_polygon_stays_open() {
        let geometry = ScreenGeometry::Polygon {
            origin: pos2(0.0, 0.0),
            points: vec![pos2(0.0, 0.0), pos2(5.0, 0.0), pos2(5.0, 5.0)],
        };
        let open = marking_shapes(&geometry, Vec2::ZERO, &style(MarkingClass::Polygon, true));
        assert!(matches!(&open[0], Shape::Path(path) if !path.closed));
        let closed = marking_shapes(&geometry, Vec2::ZERO, &style(MarkingClass::Polygon, false));
        assert!(matches!(&closed[0], Shape::Path(path) if path.closed));
    }

    #[test]
    fn test_render_skips_markings_without_type() {
        let ctx = egui::Context::default();
        let renderer = Renderer::from_context(ctx.clone());
        let rect = Rect::from_min_size(pos2(0.0, 0.0), egui::vec2(100.0, 100.0));
        let painter = Painter::new(ctx, egui::LayerId::background(), rect);

        let mut canvas = CanvasState::new(CanvasId::Left);
        canvas.store.add_one(Marking::point(1, pos2(5.0, 5.0), "missing"));
        renderer.render_canvas(&painter, rect, &canvas, &MarkingTypeRegistry::default(), false);
    }
}
