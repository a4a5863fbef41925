//! Core types, resources, and utilities shared across the application.

pub mod cache;
pub mod config;
pub mod model;
pub mod playback;
pub mod resources;
pub mod scales;
pub mod spatial;
pub mod transition;
