//! Gizmo rendering of the animated layout.

pub mod bubbles;
pub mod guides;
