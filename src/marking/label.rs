use serde::{Deserialize, Serialize};

/// Hands out labels for newly created markings.
///
/// Uniqueness is the generator's business; capture code just asks for the next one.
pub trait LabelGenerator {
    fn get_label(&mut self) -> u32;

    /// Makes sure labels up to and including `label` are never handed out again.
    fn reserve(&mut self, label: u32);

    fn reset(&mut self);
}

/// Counts up from 1, one counter per canvas.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequentialLabels {
    next: u32,
}

impl Default for SequentialLabels {
    fn default() -> Self {
        Self { next: 1 }
    }
}

impl SequentialLabels {
    pub fn peek(&self) -> u32 {
        self.next
    }
}

impl LabelGenerator for SequentialLabels {
    fn get_label(&mut self) -> u32 {
        let label = self.next;
        self.next = self.next.saturating_add(1);
        label
    }

    fn reserve(&mut self, label: u32) {
        if label >= self.next {
            self.next = label.saturating_add(1);
        }
    }

    fn reset(&mut self) {
        self.next = 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_are_sequential_and_reservable() {
        let mut labels = SequentialLabels::default();
        assert_eq!(labels.get_label(), 1);
        assert_eq!(labels.get_label(), 2);
        labels.reserve(10);
        assert_eq!(labels.get_label(), 11);
        labels.reserve(3);
        assert_eq!(labels.peek(), 12);
        labels.reset();
        assert_eq!(labels.get_label(), 1);
    }
}
