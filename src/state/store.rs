use serde::{Deserialize, Serialize};

use crate::error::MarkingResult;
use crate::marking::{LabelGenerator, Marking, MarkingPatch, SequentialLabels};

/// Committed markings of one canvas plus the marking under capture.
///
/// The temporary marking is never part of [`MarkingsStore::markings`]; it only joins
/// the collection when a command commits it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MarkingsStore {
    markings: Vec<Marking>,
    labels: SequentialLabels,
    #[serde(skip)]
    temporary: Option<Marking>,
    #[serde(skip)]
    selected_label: Option<u32>,
    #[serde(skip)]
    revision: u64,
}

impl MarkingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn markings(&self) -> &[Marking] {
        &self.markings
    }

    pub fn len(&self) -> usize {
        self.markings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markings.is_empty()
    }

    /// Bumped on every change to the committed collection.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// An owned copy for consumers that outlive the current event.
    pub fn snapshot(&self) -> Vec<Marking> {
        self.markings.clone()
    }

    pub fn find_by_label(&self, label: u32) -> Option<&Marking> {
        self.markings.iter().find(|m| m.label == label)
    }

    /// Inserts `marking`, replacing any marking with the same label in place.
    ///
    /// Returns the replaced marking.
    pub fn add_one(&mut self, marking: Marking) -> Option<Marking> {
        self.labels.reserve(marking.label);
        self.revision += 1;
        match self.markings.iter_mut().find(|m| m.label == marking.label) {
            Some(existing) => Some(std::mem::replace(existing, marking)),
            None => {
                self.markings.push(marking);
                None
            }
        }
    }

    pub fn remove_one_by_label(&mut self, label: u32) -> Option<Marking> {
        let index = self.markings.iter().position(|m| m.label == label)?;
        if self.selected_label == Some(label) {
            self.selected_label = None;
        }
        self.revision += 1;
        Some(self.markings.remove(index))
    }

    /// Replaces the whole collection, e.g. after an import.
    pub fn replace_all(&mut self, markings: Vec<Marking>) {
        self.labels.reset();
        for marking in &markings {
            self.labels.reserve(marking.label);
        }
        self.markings = markings;
        self.temporary = None;
        self.selected_label = None;
        self.revision += 1;
    }

    /// Empties the store for a new image or session.
    pub fn reset(&mut self) {
        self.replace_all(Vec::new());
    }

    pub fn labels_mut(&mut self) -> &mut dyn LabelGenerator {
        &mut self.labels
    }

    pub fn temporary(&self) -> Option<&Marking> {
        self.temporary.as_ref()
    }

    pub fn set_temporary(&mut self, marking: Option<Marking>) {
        self.temporary = marking;
    }

    pub fn take_temporary(&mut self) -> Option<Marking> {
        self.temporary.take()
    }

    /// Patches the temporary marking. Returns `Ok(false)` when there is none.
    pub fn update_temporary(&mut self, patch: MarkingPatch) -> MarkingResult<bool> {
        match self.temporary.as_mut() {
            Some(marking) => marking.apply(patch).map(|()| true),
            None => Ok(false),
        }
    }

    pub fn selected_label(&self) -> Option<u32> {
        self.selected_label
    }

    pub fn select(&mut self, label: Option<u32>) {
        self.selected_label = label.filter(|l| self.find_by_label(*l).is_some());
    }
}
