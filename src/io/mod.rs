//! Dataset providers and the headless bake export.

pub mod dataset;
pub mod demo;
pub mod export;
