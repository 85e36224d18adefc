use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

use super::{CanvasId, Canvases};
use crate::marking::Marking;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("Failed to (de)serialize markings: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Failed to access markings file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Duplicate label {label} on the {canvas} canvas")]
    DuplicateLabel { canvas: CanvasId, label: u32 },
}

pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// Committed markings of both canvases, as exported to disk or handed to a report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkingsSnapshot {
    pub version: String,
    /// Seconds since the UNIX epoch.
    pub timestamp: u64,
    pub left: Vec<Marking>,
    pub right: Vec<Marking>,
}

impl MarkingsSnapshot {
    pub fn capture(canvases: &Canvases) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_owned(),
            timestamp: timestamp_secs(),
            left: canvases.store(CanvasId::Left).snapshot(),
            right: canvases.store(CanvasId::Right).snapshot(),
        }
    }

    pub fn markings(&self, canvas: CanvasId) -> &[Marking] {
        match canvas {
            CanvasId::Left => &self.left,
            CanvasId::Right => &self.right,
        }
    }

    /// Rejects snapshots whose labels are not unique per canvas.
    pub fn validate(&self) -> PersistenceResult<()> {
        for canvas in CanvasId::BOTH {
            let mut labels = std::collections::HashSet::new();
            for marking in self.markings(canvas) {
                if !labels.insert(marking.label) {
                    return Err(PersistenceError::DuplicateLabel {
                        canvas,
                        label: marking.label,
                    });
                }
            }
        }
        Ok(())
    }

    /// Replaces the committed markings of both canvases.
    pub fn restore(self, canvases: &mut Canvases) -> PersistenceResult<()> {
        self.validate()?;
        if self.version != env!("CARGO_PKG_VERSION") {
            log::warn!(
                "Snapshot version {} differs from current version {}",
                self.version,
                env!("CARGO_PKG_VERSION")
            );
        }
        for canvas in CanvasId::BOTH {
            let state = canvases.get_mut(canvas);
            state.capture.interrupt(&mut state.store);
        }
        canvases.store_mut(CanvasId::Left).replace_all(self.left);
        canvases.store_mut(CanvasId::Right).replace_all(self.right);
        Ok(())
    }

    pub fn to_json(&self) -> PersistenceResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> PersistenceResult<Self> {
        let snapshot: Self = serde_json::from_str(json)?;
        snapshot.validate()?;
        Ok(snapshot)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> PersistenceResult<()> {
        let path = path.as_ref();
        if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        fs::write(path, self.to_json()?)?;
        log::info!("Saved markings to {}", path.display());
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> PersistenceResult<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}

fn timestamp_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use egui::pos2;

    #[test]
    fn test_restore_replaces_both_collections() {
        let mut canvases = Canvases::default();
        canvases
            .store_mut(CanvasId::Left)
            .add_one(Marking::point(4, pos2(1.0, 1.0), "point"));

        let snapshot = MarkingsSnapshot {
            version: env!("CARGO_PKG_VERSION").to_owned(),
            timestamp: 0,
            left: vec![Marking::point(1, pos2(2.0, 2.0), "point")],
            right: vec![Marking::line_segment(7, pos2(0.0, 0.0), "line-segment", pos2(5.0, 5.0))],
        };
        let json = snapshot.to_json().unwrap();
        MarkingsSnapshot::from_json(&json).unwrap().restore(&mut canvases).unwrap();

        assert_eq!(canvases.store(CanvasId::Left).len(), 1);
        assert!(canvases.store(CanvasId::Left).find_by_label(4).is_none());
        assert!(canvases.store(CanvasId::Right).find_by_label(7).is_some());
    }

    #[test]
    fn test_duplicate_labels_rejected() {
        let snapshot = MarkingsSnapshot {
            version: String::new(),
            timestamp: 0,
            left: vec![],
            right: vec![
                Marking::point(2, pos2(0.0, 0.0), "point"),
                Marking::point(2, pos2(1.0, 0.0), "point"),
            ],
        };
        assert!(matches!(
            snapshot.validate(),
            Err(PersistenceError::DuplicateLabel { canvas: CanvasId::Right, label: 2 })
        ));
    }

    #[test]
    fn test_malformed_json_is_an_error() {
        assert!(matches!(
            MarkingsSnapshot::from_json("{ not json"),
            Err(PersistenceError::Serialization(_))
        ));
    }
}
