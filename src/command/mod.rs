mod commands;
mod history;

use thiserror::Error;

use crate::state::CanvasId;

pub use commands::Command;
pub use history::CommandHistory;

/// Result type for command operations
pub type CommandResult<T = ()> = Result<T, CommandError>;

/// Errors that can occur during command execution
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    /// The command targets a marking that is not in the collection
    #[error("No marking with label {label} on the {canvas} canvas")]
    MarkingNotFound { canvas: CanvasId, label: u32 },
}
