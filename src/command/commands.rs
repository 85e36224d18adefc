use serde::{Deserialize, Serialize};

use super::{CommandError, CommandResult};
use crate::marking::Marking;
use crate::state::{CanvasId, Canvases, MarkingsStore};

/// Reversible mutations of a marking collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Command {
    /// Upsert a marking by label
    AddOrUpdateMarking {
        canvas: CanvasId,
        marking: Marking,
        /// The version the upsert replaced, restored on undo
        previous: Option<Marking>,
    },
    /// Delete a marking by label
    RemoveMarking { canvas: CanvasId, marking: Marking },
}

impl Command {
    /// Builds an upsert, capturing whatever `store` currently holds under the same label.
    pub fn add_or_update(canvas: CanvasId, marking: Marking, store: &MarkingsStore) -> Self {
        let previous = store.find_by_label(marking.label).cloned();
        Command::AddOrUpdateMarking {
            canvas,
            marking,
            previous,
        }
    }

    /// Builds a removal of the marking labelled `label`.
    pub fn remove(canvas: CanvasId, label: u32, store: &MarkingsStore) -> CommandResult<Self> {
        let marking = store
            .find_by_label(label)
            .cloned()
            .ok_or(CommandError::MarkingNotFound { canvas, label })?;
        Ok(Command::RemoveMarking { canvas, marking })
    }

    pub fn canvas(&self) -> CanvasId {
        match self {
            Command::AddOrUpdateMarking { canvas, .. } | Command::RemoveMarking { canvas, .. } => *canvas,
        }
    }

    pub fn label(&self) -> u32 {
        match self {
            Command::AddOrUpdateMarking { marking, .. } | Command::RemoveMarking { marking, .. } => marking.label,
        }
    }

    /// Execute the command against the canvas it targets
    pub fn execute(&self, canvases: &mut Canvases) -> CommandResult {
        match self {
            Command::AddOrUpdateMarking { canvas, marking, .. } => {
                canvases.store_mut(*canvas).add_one(marking.clone());
                Ok(())
            }
            Command::RemoveMarking { canvas, marking } => canvases
                .store_mut(*canvas)
                .remove_one_by_label(marking.label)
                .map(|_| ())
                .ok_or(CommandError::MarkingNotFound {
                    canvas: *canvas,
                    label: marking.label,
                }),
        }
    }

    /// Reverse a previous [`Command::execute`]
    pub fn un_execute(&self, canvases: &mut Canvases) -> CommandResult {
        match self {
            Command::AddOrUpdateMarking {
                canvas,
                marking,
                previous,
            } => {
                let store = canvases.store_mut(*canvas);
                match previous {
                    Some(previous) => {
                        store.add_one(previous.clone());
                    }
                    None => {
                        store.remove_one_by_label(marking.label);
                    }
                }
                Ok(())
            }
            Command::RemoveMarking { canvas, marking } => {
                canvases.store_mut(*canvas).add_one(marking.clone());
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use egui::pos2;

    #[test]
    fn test_upsert_undo_restores_previous_version() {
        let mut canvases = Canvases::default();
        canvases.store_mut(CanvasId::Left).add_one(Marking::point(1, pos2(1.0, 1.0), "t"));

        let moved = Marking::point(1, pos2(5.0, 5.0), "t");
        let command = Command::add_or_update(CanvasId::Left, moved, canvases.store(CanvasId::Left));
        command.execute(&mut canvases).unwrap();
        assert_eq!(canvases.left.store.markings()[0].origin, pos2(5.0, 5.0));

        command.un_execute(&mut canvases).unwrap();
        assert_eq!(canvases.left.store.markings()[0].origin, pos2(1.0, 1.0));
        assert_eq!(canvases.left.store.len(), 1);
    }

    #[test]
    fn test_remove_of_missing_marking_fails() {
        let canvases = Canvases::default();
        let err = Command::remove(CanvasId::Right, 4, canvases.store(CanvasId::Right)).unwrap_err();
        assert_eq!(
            err,
            CommandError::MarkingNotFound {
                canvas: CanvasId::Right,
                label: 4
            }
        );
    }

    #[test]
    fn test_remove_round_trip() {
        let mut canvases = Canvases::default();
        canvases.store_mut(CanvasId::Right).add_one(Marking::point(3, pos2(0.0, 0.0), "t"));
        let command = Command::remove(CanvasId::Right, 3, canvases.store(CanvasId::Right)).unwrap();

        command.execute(&mut canvases).unwrap();
        assert!(canvases.right.store.is_empty());
        assert!(command.execute(&mut canvases).is_err());

        command.un_execute(&mut canvases).unwrap();
        assert_eq!(canvases.right.store.find_by_label(3).map(|m| m.label), Some(3));
    }
}
