//! Request handlers owned by the bootstrap itself.

pub mod health;

pub use health::*;
