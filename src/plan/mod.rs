//! Rolling work plan construction.
//!
//! [`build`] nests a flat, pre-ordered item list into projects, phases,
//! tasks and subtasks. [`summarize`] then annotates phases and tasks with
//! completion roll-ups computed from the full item set, so finished work
//! that was filtered out of the tree still shows up as a count.

pub mod builder;
pub mod summary;

pub use builder::build;
pub use summary::summarize;
