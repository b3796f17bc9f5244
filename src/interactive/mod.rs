//! Interactive visualization module for exploring fields of view in real time.

mod viewer;

pub use viewer::{InteractiveViewer, ViewerConfig};
