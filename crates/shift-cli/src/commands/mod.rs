//! CLI commands module.

pub mod down;
pub mod new;
pub mod status;
pub mod up;
