mod canvas;
pub mod persistence;
mod session;
mod store;

pub use canvas::{CanvasId, CanvasState, Canvases};
pub use persistence::{MarkingsSnapshot, PersistenceError, PersistenceResult};
pub use session::Session;
pub use store::MarkingsStore;
