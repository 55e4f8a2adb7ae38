//! Maze-chase game core: maze generation, pursuit AI and the session state
//! machine. The terminal front-end in `main.rs` is one consumer.

pub mod config;
pub mod domain;
pub mod sim;
