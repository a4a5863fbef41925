//! Immediate-mode UI via bevy_egui.

pub mod timeline;
