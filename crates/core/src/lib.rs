//! Completion detection and command gating for interactive git lessons.
//!
//! A [`level::Level`] counts the commands a learner issues, compares the live
//! tree with the level's goal after each one, and holds the command pipeline
//! until the success animation has played. [`session::LevelSession`] wires a
//! level between the permission chain and the interpreter.

pub mod classifier;
pub mod command;
pub mod compare;
pub mod definition;
pub mod error;
pub mod level;
pub mod permission;
pub mod registry;
pub mod session;
pub mod signal;
pub mod tree;
pub mod visuals;

pub use error::LevelError;
