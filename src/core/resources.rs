//! Long-lived resources shared by the layout, playback, and viewer systems.

use bevy::prelude::*;

use crate::core::cache::ContinuityCache;
use crate::core::model::{LayoutSnapshot, Timeline};
use crate::core::scales::ScaleMapper;

/// Seconds a status message stays visible in the timeline bar.
pub const STATUS_MESSAGE_SECS: f32 = 4.0;

/// Drawable area in layout units. Changing it invalidates every baked snapshot.
#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct CanvasSize {
    pub width: f32,
    pub height: f32,
}

impl CanvasSize {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width: width.max(1.0),
            height: height.max(1.0),
        }
    }

    /// True when either dimension moved by more than half a unit.
    pub fn differs_from(&self, width: f32, height: f32) -> bool {
        (self.width - width).abs() > 0.5 || (self.height - height).abs() > 0.5
    }

    /// Layout space (origin bottom-left) to world space (origin at canvas center).
    pub fn to_world(&self, p: Vec2) -> Vec2 {
        Vec2::new(p.x - self.width * 0.5, p.y - self.height * 0.5)
    }
}

impl Default for CanvasSize {
    fn default() -> Self {
        Self::new(1280.0, 720.0)
    }
}

/// The dataset currently being visualized. Replacing it triggers a re-bake.
#[derive(Resource, Default)]
pub struct ActiveDataset {
    pub timeline: Timeline,
    /// Human-readable origin (file path, "stdin", "sample").
    pub source: String,
}

/// Every snapshot's layout, baked eagerly, plus the continuity cache that produced it.
#[derive(Resource, Default)]
pub struct BakedLayout {
    pub snapshots: Vec<LayoutSnapshot>,
    pub cache: ContinuityCache,
    pub scales: Option<ScaleMapper>,
}

impl BakedLayout {
    pub fn snapshot(&self, index: usize) -> Option<&LayoutSnapshot> {
        self.snapshots.get(index)
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

/// Transient status / error message displayed in the timeline bar.
/// `timer` counts down in seconds; the message is visible while `timer > 0`.
#[derive(Resource, Default)]
pub struct StatusMessage {
    pub text: String,
    pub timer: f32,
}

impl StatusMessage {
    pub fn set(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.timer = STATUS_MESSAGE_SECS;
    }

    pub fn is_visible(&self) -> bool {
        self.timer > 0.0 && !self.text.is_empty()
    }
}

/// Counts the status message down and clears it once expired.
pub fn status_message_tick_system(time: Res<Time>, mut status: ResMut<StatusMessage>) {
    if status.timer <= 0.0 {
        return;
    }
    status.timer -= time.delta_secs();
    if status.timer <= 0.0 {
        status.timer = 0.0;
        status.text.clear();
    }
}
