use super::{Command, CommandResult};
use crate::state::Canvases;

/// Manages the history of executed commands for undo/redo functionality
///
/// There is no branching: executing a command after an undo drops the redo stack.
#[derive(Debug, Default)]
pub struct CommandHistory {
    /// Stack of commands that can be undone
    undo_stack: Vec<Command>,
    /// Stack of commands that can be redone
    redo_stack: Vec<Command>,
}

impl CommandHistory {
    /// Creates a new empty command history
    pub fn new() -> Self {
        Self::default()
    }

    /// Execute a command and add it to the history if successful
    pub fn execute(&mut self, command: Command, canvases: &mut Canvases) -> CommandResult {
        command.execute(canvases)?;
        log::debug!("Executed command for label {} on the {} canvas", command.label(), command.canvas());
        self.undo_stack.push(command);
        self.redo_stack.clear();
        Ok(())
    }

    /// Undo the last executed command. Returns `false` when there was nothing to undo.
    pub fn undo(&mut self, canvases: &mut Canvases) -> CommandResult<bool> {
        let Some(command) = self.undo_stack.pop() else {
            return Ok(false);
        };
        if let Err(err) = command.un_execute(canvases) {
            self.undo_stack.push(command);
            return Err(err);
        }
        self.redo_stack.push(command);
        Ok(true)
    }

    /// Redo the last undone command. Returns `false` when there was nothing to redo.
    pub fn redo(&mut self, canvases: &mut Canvases) -> CommandResult<bool> {
        let Some(command) = self.redo_stack.pop() else {
            return Ok(false);
        };
        if let Err(err) = command.execute(canvases) {
            self.redo_stack.push(command);
            return Err(err);
        }
        self.undo_stack.push(command);
        Ok(true)
    }

    /// Returns true if there are commands that can be undone
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Returns true if there are commands that can be redone
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo_stack.len()
    }

    /// Clear the command history
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}
