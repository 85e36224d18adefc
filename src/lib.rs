#![warn(clippy::all, rust_2018_idioms)]

pub mod app;
pub mod capture;
pub mod command;
pub mod config;
pub mod error;
pub mod event;
pub mod file_handler;
pub mod geometry;
pub mod input;
pub mod marking;
pub mod matching;
pub mod renderer;
pub mod state;

pub use app::MarkingApp;
pub use capture::{CaptureOutcome, MarkingCapture};
pub use command::{Command, CommandError, CommandHistory};
pub use config::{CursorMode, Settings};
pub use error::{MarkingError, MarkingResult};
pub use marking::{Marking, MarkingClass, MarkingType, MarkingTypeRegistry};
pub use matching::{MatchedFeature, get_matched_features, get_paired_by_label};
pub use state::{CanvasId, MarkingsStore, Session};
