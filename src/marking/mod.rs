//! Marking entities: one tagged shape per [`MarkingClass`] plus the fields every
//! marking shares.

mod label;
mod types;

pub use label::{LabelGenerator, SequentialLabels};
pub use types::{MarkingType, MarkingTypeRegistry};

use egui::{Pos2, Rect};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{MarkingError, MarkingResult};
use crate::geometry::{Point, RenderTransform, ViewportRatios};

/// The closed set of geometric primitives an examiner can place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum MarkingClass {
    Point,
    Ray,
    LineSegment,
    BoundingBox,
    Rectangle,
    Polygon,
}

impl MarkingClass {
    pub const ALL: [MarkingClass; 6] = [
        MarkingClass::Point,
        MarkingClass::Ray,
        MarkingClass::LineSegment,
        MarkingClass::BoundingBox,
        MarkingClass::Rectangle,
        MarkingClass::Polygon,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MarkingClass::Point => "point",
            MarkingClass::Ray => "ray",
            MarkingClass::LineSegment => "line_segment",
            MarkingClass::BoundingBox => "bounding_box",
            MarkingClass::Rectangle => "rectangle",
            MarkingClass::Polygon => "polygon",
        }
    }
}

impl fmt::Display for MarkingClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MarkingClass {
    type Err = MarkingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MarkingClass::ALL
            .into_iter()
            .find(|class| class.as_str() == s)
            .ok_or_else(|| MarkingError::UnsupportedMarkingClass(s.to_owned()))
    }
}

impl TryFrom<String> for MarkingClass {
    type Error = MarkingError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<MarkingClass> for String {
    fn from(class: MarkingClass) -> Self {
        class.as_str().to_owned()
    }
}

/// Class-specific geometry of a marking, in world space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "marking_class", rename_all = "snake_case")]
pub enum MarkingShape {
    Point,
    Ray { angle_rad: f32 },
    LineSegment { endpoint: Point },
    BoundingBox { endpoint: Point },
    Rectangle { points: Vec<Point> },
    Polygon { points: Vec<Point> },
}

/// A single annotation placed on one image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Marking {
    pub label: u32,
    pub type_id: String,
    /// Circle center, ray tail, first rectangle corner or first polygon vertex.
    pub origin: Point,
    /// Correlation ids shared with the counterpart on the other image.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ids: Vec<String>,
    #[serde(flatten)]
    pub shape: MarkingShape,
}

/// A partial update applied to the marking under capture.
#[derive(Debug, Clone, PartialEq)]
pub enum MarkingPatch {
    Origin(Point),
    AngleRad(f32),
    Endpoint(Point),
    Points(Vec<Point>),
}

impl MarkingPatch {
    pub fn field_name(&self) -> &'static str {
        match self {
            MarkingPatch::Origin(_) => "origin",
            MarkingPatch::AngleRad(_) => "angle_rad",
            MarkingPatch::Endpoint(_) => "endpoint",
            MarkingPatch::Points(_) => "points",
        }
    }
}

impl Marking {
    fn new(label: u32, origin: Point, type_id: impl Into<String>, shape: MarkingShape) -> Self {
        Self {
            label,
            type_id: type_id.into(),
            origin,
            ids: Vec::new(),
            shape,
        }
    }

    pub fn point(label: u32, origin: Point, type_id: impl Into<String>) -> Self {
        Self::new(label, origin, type_id, MarkingShape::Point)
    }

    pub fn ray(label: u32, origin: Point, type_id: impl Into<String>, angle_rad: f32) -> Self {
        Self::new(label, origin, type_id, MarkingShape::Ray { angle_rad })
    }

    pub fn line_segment(label: u32, origin: Point, type_id: impl Into<String>, endpoint: Point) -> Self {
        Self::new(label, origin, type_id, MarkingShape::LineSegment { endpoint })
    }

    pub fn bounding_box(label: u32, origin: Point, type_id: impl Into<String>, endpoint: Point) -> Self {
        Self::new(label, origin, type_id, MarkingShape::BoundingBox { endpoint })
    }

    pub fn rectangle(label: u32, origin: Point, type_id: impl Into<String>, points: Vec<Point>) -> Self {
        Self::new(label, origin, type_id, MarkingShape::Rectangle { points })
    }

    pub fn polygon(label: u32, origin: Point, type_id: impl Into<String>, points: Vec<Point>) -> Self {
        Self::new(label, origin, type_id, MarkingShape::Polygon { points })
    }

    pub fn with_ids<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ids = ids.into_iter().map(Into::into).collect();
        self
    }

    pub fn marking_class(&self) -> MarkingClass {
        match self.shape {
            MarkingShape::Point => MarkingClass::Point,
            MarkingShape::Ray { .. } => MarkingClass::Ray,
            MarkingShape::LineSegment { .. } => MarkingClass::LineSegment,
            MarkingShape::BoundingBox { .. } => MarkingClass::BoundingBox,
            MarkingShape::Rectangle { .. } => MarkingClass::Rectangle,
            MarkingShape::Polygon { .. } => MarkingClass::Polygon,
        }
    }

    pub fn angle_rad(&self) -> Option<f32> {
        match self.shape {
            MarkingShape::Ray { angle_rad } => Some(angle_rad),
            _ => None,
        }
    }

    pub fn endpoint(&self) -> Option<Point> {
        match self.shape {
            MarkingShape::LineSegment { endpoint } | MarkingShape::BoundingBox { endpoint } => Some(endpoint),
            _ => None,
        }
    }

    pub fn points(&self) -> &[Point] {
        match &self.shape {
            MarkingShape::Rectangle { points } | MarkingShape::Polygon { points } => points,
            _ => &[],
        }
    }

    /// Applies `patch`, failing when this class carries no such field.
    pub fn apply(&mut self, patch: MarkingPatch) -> MarkingResult<()> {
        let class = self.marking_class();
        match (patch, &mut self.shape) {
            (MarkingPatch::Origin(origin), _) => self.origin = origin,
            (MarkingPatch::AngleRad(angle), MarkingShape::Ray { angle_rad }) => *angle_rad = angle,
            (
                MarkingPatch::Endpoint(point),
                MarkingShape::LineSegment { endpoint } | MarkingShape::BoundingBox { endpoint },
            ) => *endpoint = point,
            (
                MarkingPatch::Points(new_points),
                MarkingShape::Rectangle { points } | MarkingShape::Polygon { points },
            ) => *points = new_points,
            (patch, _) => {
                return Err(MarkingError::FieldNotSupported {
                    class,
                    field: patch.field_name(),
                });
            }
        }
        Ok(())
    }

    /// World-space bounding rectangle of every coordinate the marking carries.
    pub fn bounds(&self) -> Rect {
        let mut rect = Rect::from_min_max(self.origin, self.origin);
        if let Some(endpoint) = self.endpoint() {
            rect.extend_with(endpoint);
        }
        for point in self.points() {
            rect.extend_with(*point);
        }
        rect
    }

    pub fn origin_viewport_position(&self, ratios: ViewportRatios) -> Pos2 {
        scale(self.origin, ratios)
    }

    pub fn endpoint_viewport_position(&self, ratios: ViewportRatios) -> Option<Pos2> {
        self.endpoint().map(|endpoint| scale(endpoint, ratios))
    }

    pub fn points_viewport_position(&self, ratios: ViewportRatios) -> Vec<Pos2> {
        self.points().iter().map(|point| scale(*point, ratios)).collect()
    }

    /// Where this marking lands on screen under `transform`.
    pub fn screen_geometry(&self, transform: &RenderTransform) -> ScreenGeometry {
        let origin = transform.apply(self.origin);
        match &self.shape {
            MarkingShape::Point => ScreenGeometry::Point { center: origin },
            MarkingShape::Ray { angle_rad } => ScreenGeometry::Ray {
                origin,
                angle: angle_rad + transform.rotation,
            },
            MarkingShape::LineSegment { endpoint } => ScreenGeometry::Segment {
                origin,
                endpoint: transform.apply(*endpoint),
            },
            MarkingShape::BoundingBox { endpoint } => ScreenGeometry::Box {
                origin,
                endpoint: transform.apply(*endpoint),
            },
            MarkingShape::Rectangle { points } | MarkingShape::Polygon { points } => ScreenGeometry::Polygon {
                origin,
                points: points.iter().map(|p| transform.apply(*p)).collect(),
            },
        }
    }
}

fn scale(point: Point, ratios: ViewportRatios) -> Pos2 {
    Pos2::new(point.x * ratios.width, point.y * ratios.height)
}

/// Screen-space render positions of a marking.
#[derive(Debug, Clone, PartialEq)]
pub enum ScreenGeometry {
    Point { center: Pos2 },
    Ray { origin: Pos2, angle: f32 },
    Segment { origin: Pos2, endpoint: Pos2 },
    Box { origin: Pos2, endpoint: Pos2 },
    Polygon { origin: Pos2, points: Vec<Pos2> },
}
