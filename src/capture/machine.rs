//! One capture state machine for every marking class.
//!
//! The class tag picks a row of function pointers from a static table; the shared
//! [`Capture`] state carries the stage, a cached anchor and the polygon vertices.

use egui::Pos2;

use crate::error::MarkingResult;
use crate::geometry::{angle_between, distance, get_adjusted_position, Point, Viewport};
use crate::marking::{Marking, MarkingClass, MarkingPatch};
use crate::state::MarkingsStore;

/// Closing distance between a click and the first polygon vertex.
pub const POLYGON_SNAP_DISTANCE: f32 = 20.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    First,
    Second,
}

/// What the controller does after a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Continue,
    Commit,
}

/// Borrowed view of the canvas a capture runs on.
pub struct CaptureContext<'a> {
    pub store: &'a mut MarkingsStore,
    pub viewport: &'a Viewport,
    pub snap_distance: f32,
}

impl<'a> CaptureContext<'a> {
    pub fn new(store: &'a mut MarkingsStore, viewport: &'a Viewport) -> Self {
        Self {
            store,
            viewport,
            snap_distance: POLYGON_SNAP_DISTANCE,
        }
    }

    pub fn with_snap_distance(mut self, snap_distance: f32) -> Self {
        self.snap_distance = snap_distance;
        self
    }

    fn to_world(&self, screen: Pos2) -> Point {
        get_adjusted_position(screen, self.viewport.rotation, self.viewport)
    }

    fn update(&mut self, patch: MarkingPatch) -> MarkingResult<()> {
        self.store.update_temporary(patch).map(|_| ())
    }
}

/// Identity of the marking a capture creates.
#[derive(Debug, Clone, Copy)]
pub struct Seed<'a> {
    pub label: u32,
    pub type_id: &'a str,
}

type BeginFn = fn(&mut Capture, &CaptureContext<'_>, Pos2, Seed<'_>) -> Marking;
type EventFn = fn(&mut Capture, &mut CaptureContext<'_>, Pos2) -> MarkingResult<Step>;

struct Transitions {
    begin: BeginFn,
    pointer_move: EventFn,
    pointer_up: EventFn,
    pointer_down: EventFn,
}

static POINT: Transitions = Transitions {
    begin: point_begin,
    pointer_move: track_origin,
    pointer_up: commit,
    pointer_down: ignore,
};

static RAY: Transitions = Transitions {
    begin: ray_begin,
    pointer_move: ray_move,
    pointer_up: freeze_origin,
    pointer_down: commit_in_second_stage,
};

static LINE_SEGMENT: Transitions = Transitions {
    begin: line_segment_begin,
    pointer_move: line_segment_move,
    pointer_up: freeze_origin,
    pointer_down: commit_in_second_stage,
};

static BOUNDING_BOX: Transitions = Transitions {
    begin: bounding_box_begin,
    pointer_move: track_endpoint,
    pointer_up: ignore,
    pointer_down: commit,
};

static RECTANGLE: Transitions = Transitions {
    begin: rectangle_begin,
    pointer_move: rectangle_move,
    pointer_up: ignore,
    pointer_down: rectangle_down,
};

static POLYGON: Transitions = Transitions {
    begin: polygon_begin,
    pointer_move: polygon_move,
    pointer_up: ignore,
    pointer_down: polygon_down,
};

fn transitions(class: MarkingClass) -> &'static Transitions {
    match class {
        MarkingClass::Point => &POINT,
        MarkingClass::Ray => &RAY,
        MarkingClass::LineSegment => &LINE_SEGMENT,
        MarkingClass::BoundingBox => &BOUNDING_BOX,
        MarkingClass::Rectangle => &RECTANGLE,
        MarkingClass::Polygon => &POLYGON,
    }
}

/// In-progress capture of one marking.
#[derive(Debug, Clone, PartialEq)]
pub struct Capture {
    class: MarkingClass,
    stage: Stage,
    /// Ray: world reference cached on mouse-up. Rectangle: screen-space origin.
    anchor: Option<Point>,
    vertices: Vec<Point>,
}

impl Capture {
    /// Starts capturing a marking of `class` at `screen` and returns the temporary marking.
    pub fn begin(class: MarkingClass, ctx: &CaptureContext<'_>, screen: Pos2, seed: Seed<'_>) -> (Self, Marking) {
        let mut capture = Self {
            class,
            stage: Stage::First,
            anchor: None,
            vertices: Vec::new(),
        };
        let marking = (transitions(class).begin)(&mut capture, ctx, screen, seed);
        (capture, marking)
    }

    pub fn class(&self) -> MarkingClass {
        self.class
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn vertices(&self) -> &[Point] {
        &self.vertices
    }

    pub fn pointer_move(&mut self, ctx: &mut CaptureContext<'_>, screen: Pos2) -> MarkingResult<Step> {
        (transitions(self.class).pointer_move)(self, ctx, screen)
    }

    pub fn pointer_up(&mut self, ctx: &mut CaptureContext<'_>, screen: Pos2) -> MarkingResult<Step> {
        (transitions(self.class).pointer_up)(self, ctx, screen)
    }

    pub fn pointer_down(&mut self, ctx: &mut CaptureContext<'_>, screen: Pos2) -> MarkingResult<Step> {
        (transitions(self.class).pointer_down)(self, ctx, screen)
    }
}

fn ignore(_: &mut Capture, _: &mut CaptureContext<'_>, _: Pos2) -> MarkingResult<Step> {
    Ok(Step::Continue)
}

fn commit(_: &mut Capture, _: &mut CaptureContext<'_>, _: Pos2) -> MarkingResult<Step> {
    Ok(Step::Commit)
}

fn track_origin(_: &mut Capture, ctx: &mut CaptureContext<'_>, screen: Pos2) -> MarkingResult<Step> {
    let origin = ctx.to_world(screen);
    ctx.update(MarkingPatch::Origin(origin))?;
    Ok(Step::Continue)
}

fn track_endpoint(_: &mut Capture, ctx: &mut CaptureContext<'_>, screen: Pos2) -> MarkingResult<Step> {
    let endpoint = ctx.to_world(screen);
    ctx.update(MarkingPatch::Endpoint(endpoint))?;
    Ok(Step::Continue)
}

/// Ends the first stage of a two-stage capture and caches the release position.
fn freeze_origin(capture: &mut Capture, ctx: &mut CaptureContext<'_>, screen: Pos2) -> MarkingResult<Step> {
    if capture.stage == Stage::First {
        capture.stage = Stage::Second;
        capture.anchor = Some(ctx.to_world(screen));
    }
    Ok(Step::Continue)
}

fn commit_in_second_stage(capture: &mut Capture, _: &mut CaptureContext<'_>, _: Pos2) -> MarkingResult<Step> {
    match capture.stage {
        Stage::First => Ok(Step::Continue),
        Stage::Second => Ok(Step::Commit),
    }
}

fn point_begin(_: &mut Capture, ctx: &CaptureContext<'_>, screen: Pos2, seed: Seed<'_>) -> Marking {
    Marking::point(seed.label, ctx.to_world(screen), seed.type_id)
}

fn ray_begin(_: &mut Capture, ctx: &CaptureContext<'_>, screen: Pos2, seed: Seed<'_>) -> Marking {
    Marking::ray(seed.label, ctx.to_world(screen), seed.type_id, 0.0)
}

fn ray_move(capture: &mut Capture, ctx: &mut CaptureContext<'_>, screen: Pos2) -> MarkingResult<Step> {
    let pos = ctx.to_world(screen);
    match (capture.stage, capture.anchor) {
        (Stage::First, _) => ctx.update(MarkingPatch::Origin(pos))?,
        (Stage::Second, Some(reference)) => ctx.update(MarkingPatch::AngleRad(angle_between(pos, reference)))?,
        (Stage::Second, None) => {}
    }
    Ok(Step::Continue)
}

fn line_segment_begin(_: &mut Capture, ctx: &CaptureContext<'_>, screen: Pos2, seed: Seed<'_>) -> Marking {
    let pos = ctx.to_world(screen);
    Marking::line_segment(seed.label, pos, seed.type_id, pos)
}

fn line_segment_move(capture: &mut Capture, ctx: &mut CaptureContext<'_>, screen: Pos2) -> MarkingResult<Step> {
    let pos = ctx.to_world(screen);
    match capture.stage {
        Stage::First => ctx.update(MarkingPatch::Origin(pos))?,
        Stage::Second => ctx.update(MarkingPatch::Endpoint(pos))?,
    }
    Ok(Step::Continue)
}

fn bounding_box_begin(_: &mut Capture, ctx: &CaptureContext<'_>, screen: Pos2, seed: Seed<'_>) -> Marking {
    let pos = ctx.to_world(screen);
    Marking::bounding_box(seed.label, pos, seed.type_id, pos)
}

/// Corners of the screen-aligned rectangle spanned by `origin` and `cursor`, in world space.
fn rectangle_corners(ctx: &CaptureContext<'_>, origin: Pos2, cursor: Pos2) -> Vec<Point> {
    [origin, Pos2::new(origin.x, cursor.y), cursor, Pos2::new(cursor.x, origin.y)]
        .into_iter()
        .map(|corner| ctx.to_world(corner))
        .collect()
}

fn rectangle_begin(capture: &mut Capture, ctx: &CaptureContext<'_>, screen: Pos2, seed: Seed<'_>) -> Marking {
    capture.anchor = Some(screen);
    let pos = ctx.to_world(screen);
    Marking::rectangle(seed.label, pos, seed.type_id, vec![pos; 4])
}

fn rectangle_move(capture: &mut Capture, ctx: &mut CaptureContext<'_>, screen: Pos2) -> MarkingResult<Step> {
    if let Some(origin) = capture.anchor {
        let corners = rectangle_corners(ctx, origin, screen);
        ctx.update(MarkingPatch::Points(corners))?;
    }
    Ok(Step::Continue)
}

fn rectangle_down(capture: &mut Capture, ctx: &mut CaptureContext<'_>, screen: Pos2) -> MarkingResult<Step> {
    let Some(origin) = capture.anchor else {
        return Ok(Step::Continue);
    };
    let corners = rectangle_corners(ctx, origin, screen);
    let world_origin = ctx.to_world(origin);
    ctx.update(MarkingPatch::Points(corners))?;
    ctx.update(MarkingPatch::Origin(world_origin))?;
    Ok(Step::Commit)
}

fn polygon_begin(capture: &mut Capture, ctx: &CaptureContext<'_>, screen: Pos2, seed: Seed<'_>) -> Marking {
    let pos = ctx.to_world(screen);
    capture.vertices = vec![pos];
    Marking::polygon(seed.label, pos, seed.type_id, vec![pos, pos])
}

fn with_rubber_band(vertices: &[Point], pos: Point) -> Vec<Point> {
    let mut points = Vec::with_capacity(vertices.len() + 1);
    points.extend_from_slice(vertices);
    points.push(pos);
    points
}

fn polygon_move(capture: &mut Capture, ctx: &mut CaptureContext<'_>, screen: Pos2) -> MarkingResult<Step> {
    let pos = ctx.to_world(screen);
    ctx.update(MarkingPatch::Points(with_rubber_band(&capture.vertices, pos)))?;
    Ok(Step::Continue)
}

fn polygon_down(capture: &mut Capture, ctx: &mut CaptureContext<'_>, screen: Pos2) -> MarkingResult<Step> {
    let pos = ctx.to_world(screen);
    let closes = capture.vertices.len() > 2
        && capture
            .vertices
            .first()
            .is_some_and(|first| distance(pos, *first) < ctx.snap_distance);

    if closes {
        ctx.update(MarkingPatch::Points(capture.vertices.clone()))?;
        return Ok(Step::Commit);
    }

    capture.vertices.push(pos);
    ctx.update(MarkingPatch::Points(with_rubber_band(&capture.vertices, pos)))?;
    Ok(Step::Continue)
}
