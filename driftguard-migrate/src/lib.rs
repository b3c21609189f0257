//! driftguard migration generator
//!
//! This library turns differences between a live schema and its migration
//! history into migration source files. The CLI tool (main.rs) uses this
//! library.

pub mod comparator;
pub mod dependency_ordering;
pub mod generator;
pub mod journal;
pub mod planner;
pub mod renderer;
pub mod snapshot_loader;
pub mod writer;

pub use comparator::compare;
pub use generator::{BatchReport, Generator, Outcome, TableOutcome};
pub use renderer::Renderer;
