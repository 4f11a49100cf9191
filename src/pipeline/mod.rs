//! Pipeline module - discovery, merge and output of KML files

pub mod discovery;
pub mod error;
pub mod merger;
pub mod writer;

pub use discovery::*;
pub use error::*;
pub use merger::*;
pub use writer::*;
