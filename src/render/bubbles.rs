//! Animated bubbles: one gizmo circle per entity, eased between the resting
//! positions of consecutive snapshots.
//!
//! Whenever the scheduler's index or the baked layout changes, a new set of
//! transitions is planned. Entities already on screen start from wherever
//! they are currently drawn, so an interrupted animation never jumps.

use bevy::prelude::*;
use std::collections::HashMap;
use std::time::Duration;

use crate::core::config::SectorflowConfig;
use crate::core::model::CategoryId;
use crate::core::playback::PlaybackScheduler;
use crate::core::resources::{BakedLayout, CanvasSize};
use crate::core::transition::{plan_transitions, Transition};

/// Muted, distinct (r, g, b) triples, one per category column.
const PALETTE: &[(f32, f32, f32)] = &[
    (0.25, 0.50, 0.90), // blue
    (0.60, 0.22, 0.80), // purple
    (0.85, 0.35, 0.25), // red-orange
    (0.20, 0.72, 0.42), // green
    (0.15, 0.68, 0.72), // teal
    (0.88, 0.68, 0.18), // gold
    (0.55, 0.55, 0.60), // slate
    (0.75, 0.50, 0.12), // amber
    (0.55, 0.40, 0.30), // brown
    (0.35, 0.35, 0.78), // indigo
    (0.85, 0.45, 0.65), // pink
];

/// The (r,g,b) palette entry for a category, shared with the timeline legend.
pub fn category_rgb(category: CategoryId) -> (f32, f32, f32) {
    PALETTE[category.0 % PALETTE.len()]
}

fn bubble_color(category: CategoryId) -> Color {
    let (r, g, b) = category_rgb(category);
    Color::srgba(r, g, b, 0.85)
}

/// Transitions currently on screen.
#[derive(Resource, Default)]
pub struct BubbleAnimation {
    pub transitions: Vec<Transition>,
    pub started: Duration,
    pub duration: Duration,
    /// Snapshot index the transitions lead to.
    pub shown: Option<usize>,
}

impl BubbleAnimation {
    pub fn progress(&self, now: Duration) -> f32 {
        if self.duration.is_zero() {
            return 1.0;
        }
        (now.saturating_sub(self.started).as_secs_f32() / self.duration.as_secs_f32()).min(1.0)
    }

    /// Position and radius of every entity as drawn at `now`.
    pub fn samples(&self, now: Duration) -> HashMap<String, (Vec2, f32)> {
        let p = self.progress(now);
        self.transitions
            .iter()
            .map(|t| (t.id.clone(), t.sample(p)))
            .collect()
    }

    /// Replace the running transitions with `plan`, starting each entity that
    /// is currently drawn from its drawn position and radius. Exits for
    /// entities that are not on screen are dropped.
    pub fn retarget(&mut self, plan: Vec<Transition>, to: usize, now: Duration, duration: Duration) {
        let p = self.progress(now);
        let plan: Vec<Transition> = {
            let drawn: HashMap<&str, (Vec2, f32, bool)> = self
                .transitions
                .iter()
                .map(|t| {
                    let (pos, radius) = t.sample(p);
                    (t.id.as_str(), (pos, radius, t.is_exit()))
                })
                .collect();
            plan.into_iter()
                .filter_map(|mut t| match drawn.get(t.id.as_str()) {
                    Some(&(_, radius, true)) if t.is_exit() && radius <= 0.0 => None,
                    Some(&(pos, radius, _)) => {
                        t.from = pos;
                        t.from_radius = radius;
                        if t.is_exit() {
                            t.to = pos;
                        }
                        Some(t)
                    }
                    None if t.is_exit() => None,
                    None => Some(t),
                })
                .collect()
        };
        self.transitions = plan;
        self.started = now;
        self.duration = duration;
        self.shown = Some(to);
    }

    pub fn clear(&mut self) {
        self.transitions.clear();
        self.shown = None;
    }
}

/// Plans a new transition when the scheduler moved or the layout was re-baked.
pub fn bubble_transition_system(
    time: Res<Time>,
    scheduler: Res<PlaybackScheduler>,
    baked: Res<BakedLayout>,
    config: Res<SectorflowConfig>,
    mut anim: ResMut<BubbleAnimation>,
) {
    let index = scheduler.current_index();
    let rebaked = baked.is_changed();
    if !rebaked && anim.shown == Some(index) {
        return;
    }
    let Some(to) = baked.snapshot(index) else {
        anim.clear();
        return;
    };
    let from = if rebaked {
        None
    } else {
        anim.shown.and_then(|i| baked.snapshot(i))
    };
    let plan = plan_transitions(&baked.cache, from, to);
    debug!(
        "[RENDER] {} transitions toward {} ({})",
        plan.len(),
        to.label,
        index
    );
    anim.retarget(plan, index, time.elapsed(), config.playback.transition_duration());
}

pub fn draw_bubbles_system(
    time: Res<Time>,
    anim: Res<BubbleAnimation>,
    canvas: Res<CanvasSize>,
    mut gizmos: Gizmos,
) {
    let p = anim.progress(time.elapsed());
    for t in &anim.transitions {
        let (pos, radius) = t.sample(p);
        if radius <= 0.0 {
            continue;
        }
        gizmos.circle_2d(
            Isometry2d::from_translation(canvas.to_world(pos)),
            radius,
            bubble_color(t.category),
        );
    }
}
