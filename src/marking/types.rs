use egui::Color32;
use serde::{Deserialize, Serialize};

use super::MarkingClass;

/// User-defined appearance and class of a marking, referenced by id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkingType {
    pub id: String,
    pub display_name: String,
    pub name: String,
    pub marking_class: MarkingClass,
    pub category: String,
    pub background_color: Color32,
    pub text_color: Color32,
    pub size: f32,
}

impl MarkingType {
    pub fn new(id: impl Into<String>, name: impl Into<String>, marking_class: MarkingClass) -> Self {
        let name = name.into();
        Self {
            id: id.into(),
            display_name: name.clone(),
            name,
            marking_class,
            category: "default".to_owned(),
            background_color: Color32::from_rgb(0x3b, 0x82, 0xf6),
            text_color: Color32::WHITE,
            size: 10.0,
        }
    }

    pub fn with_colors(mut self, background: Color32, text: Color32) -> Self {
        self.background_color = background;
        self.text_color = text;
        self
    }
}

/// The defined marking types and the one currently active for capture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkingTypeRegistry {
    types: Vec<MarkingType>,
    selected: Option<String>,
}

impl Default for MarkingTypeRegistry {
    fn default() -> Self {
        Self::new(default_types())
    }
}

impl MarkingTypeRegistry {
    pub fn new(types: Vec<MarkingType>) -> Self {
        Self { types, selected: None }
    }

    pub fn types(&self) -> &[MarkingType] {
        &self.types
    }

    pub fn find(&self, id: &str) -> Option<&MarkingType> {
        self.types.iter().find(|t| t.id == id)
    }

    /// Activates the type with `id`. Unknown ids leave the selection untouched.
    pub fn select(&mut self, id: &str) -> bool {
        if self.find(id).is_none() {
            log::warn!("Cannot select unknown marking type {id}");
            return false;
        }
        self.selected = Some(id.to_owned());
        true
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    pub fn selected_id(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// The active type, if it is still defined.
    pub fn selected_type(&self) -> Option<&MarkingType> {
        self.selected.as_deref().and_then(|id| self.find(id))
    }

    /// Adds or replaces a type by id.
    pub fn upsert(&mut self, marking_type: MarkingType) {
        match self.types.iter_mut().find(|t| t.id == marking_type.id) {
            Some(existing) => *existing = marking_type,
            None => self.types.push(marking_type),
        }
    }

    pub fn remove(&mut self, id: &str) -> Option<MarkingType> {
        let index = self.types.iter().position(|t| t.id == id)?;
        if self.selected.as_deref() == Some(id) {
            self.selected = None;
        }
        Some(self.types.remove(index))
    }
}

fn default_types() -> Vec<MarkingType> {
    vec![
        MarkingType::new("point", "Point", MarkingClass::Point),
        MarkingType::new("ray", "Minutia", MarkingClass::Ray)
            .with_colors(Color32::from_rgb(0xef, 0x44, 0x44), Color32::WHITE),
        MarkingType::new("line-segment", "Segment", MarkingClass::LineSegment)
            .with_colors(Color32::from_rgb(0x22, 0xc5, 0x5e), Color32::BLACK),
        MarkingType::new("bounding-box", "Area", MarkingClass::BoundingBox)
            .with_colors(Color32::from_rgb(0xea, 0xb3, 0x08), Color32::BLACK),
        MarkingType::new("rectangle", "Rectangle", MarkingClass::Rectangle)
            .with_colors(Color32::from_rgb(0xa8, 0x55, 0xf7), Color32::WHITE),
        MarkingType::new("polygon", "Region", MarkingClass::Polygon)
            .with_colors(Color32::from_rgb(0x06, 0xb6, 0xd4), Color32::BLACK),
    ]
}
