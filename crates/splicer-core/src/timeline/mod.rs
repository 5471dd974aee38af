//! Timeline Module
//!
//! The timeline document value type: tracks, clips, gaps and markers.

mod models;

pub use models::*;
