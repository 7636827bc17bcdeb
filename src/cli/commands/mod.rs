//! Command implementations

pub mod completions;
pub mod map;
pub mod onboard;
pub mod preview;
pub mod submit;
pub mod template;
pub mod validate;
