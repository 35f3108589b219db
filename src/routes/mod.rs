//! Route definitions.

pub mod api;
pub mod media;
