//! Structural change plans
//!
//! A [`Blueprint`] is the unit the renderer consumes: one table's ordered
//! [`Change`]s plus their inverses.

pub mod blueprint;
pub mod change;

pub use blueprint::Blueprint;
pub use change::Change;
