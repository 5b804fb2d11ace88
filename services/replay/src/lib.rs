//! Level Replay Service
//!
//! Drives a recorded solution script through a level, standing in for the
//! interactive host: it owns the permission chain, plays the interpreter by
//! replaying recorded trees, and plays the visualization by waiting out a
//! configurable animation. The `gitlevel-replay` binary is a thin wrapper.

pub mod config;
pub mod engine;
pub mod replay;
pub mod script;
