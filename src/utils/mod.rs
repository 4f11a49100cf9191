//! Utility module - logging, formatting, progress and styling helpers

pub mod format;
pub mod logging;
pub mod progress;
pub mod styling;

pub use format::*;
pub use logging::*;
pub use progress::*;
pub use styling::*;
