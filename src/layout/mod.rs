//! Temporal force-directed layout.
//!
//! Each snapshot is resolved independently: category pull on x, value pull on
//! y, same-category clustering and collision, for a fixed iteration budget
//! with decaying alpha, followed by an overlap sweep. Every body is confined
//! to its category column and to its value's side of the zero line
//! throughout. Start positions come from the continuity cache for the *same*
//! time index, else from a deterministic id-derived seed.

pub mod forces;
pub mod seed;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::core::cache::ContinuityCache;
use crate::core::config::SectorflowConfig;
use crate::core::model::{LayoutSnapshot, PositionedEntity, SnapshotInput, Timeline};
use crate::core::resources::{ActiveDataset, BakedLayout, CanvasSize};
use crate::core::scales::{RadiusScale, ScaleMapper, ScaleParams};

use forces::{Region, SimNode};

/// Minimum distance between a body center and the zero line.
const ZERO_LINE_GAP: f32 = 0.5;

/// Tunable simulation parameters (`[layout]` in `~/.sectorflowrc`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutParams {
    /// Fixed number of outer iterations per snapshot.
    pub iterations: usize,
    /// Starting convergence energy.
    pub alpha: f32,
    /// Fraction of alpha lost each iteration.
    pub alpha_decay: f32,
    /// Fraction of velocity lost each iteration before integrating.
    pub velocity_decay: f32,
    pub category_strength: f32,
    pub value_strength: f32,
    pub cluster_strength: f32,
    pub collision_strength: f32,
    /// Collision sub-passes per iteration.
    pub collision_passes: usize,
    /// Gap kept between neighbouring bubbles.
    pub collision_padding: f32,
    /// Overlap sweeps allowed after the iteration budget, before one more
    /// per body is added.
    pub settle_sweeps: usize,
    /// Overlap depth accepted by the final sweep.
    pub settle_tolerance: f32,
    /// Amplitude of the id-derived offset for uncached entities.
    pub seed_jitter: f32,
}

impl Default for LayoutParams {
    fn default() -> Self {
        Self {
            iterations: 150,
            alpha: 0.8,
            alpha_decay: 0.01,
            velocity_decay: 0.4,
            category_strength: 0.6,
            value_strength: 0.8,
            cluster_strength: 0.2,
            collision_strength: 0.7,
            collision_passes: 3,
            collision_padding: 1.5,
            settle_sweeps: 120,
            settle_tolerance: 0.5,
            seed_jitter: 12.0,
        }
    }
}

/// Scales plus parameters for one dataset and canvas size.
#[derive(Debug, Clone)]
pub struct LayoutEngine {
    pub scales: ScaleMapper,
    pub params: LayoutParams,
    category_count: usize,
}

impl LayoutEngine {
    pub fn new(timeline: &Timeline, canvas: CanvasSize, scale: &ScaleParams, params: LayoutParams) -> Self {
        Self {
            scales: ScaleMapper::new(&timeline.categories, canvas, scale),
            params,
            category_count: timeline.categories.len(),
        }
    }

    pub fn from_config(timeline: &Timeline, canvas: CanvasSize, config: &SectorflowConfig) -> Self {
        Self::new(timeline, canvas, &config.scale, config.layout.clone())
    }

    /// Lay out one snapshot, seeding from and writing back to `cache` under its
    /// own time index only.
    pub fn layout_snapshot(&self, snapshot: &SnapshotInput, cache: &mut ContinuityCache) -> LayoutSnapshot {
        let t = snapshot.time_index;
        let radius = self.scales.radius_scale(&snapshot.records);
        let entities = self.simulate(snapshot, &radius, |id| cache.get(t, id));
        for e in &entities {
            cache.set(t, e.id.clone(), Vec2::new(e.x, e.y));
        }
        LayoutSnapshot {
            time_index: t,
            label: snapshot.label.clone(),
            entities,
        }
    }

    /// The force relaxation itself. Pure: the node arena is local to this call.
    pub fn simulate(
        &self,
        snapshot: &SnapshotInput,
        radius: &RadiusScale,
        seeds: impl Fn(&str) -> Option<Vec2>,
    ) -> Vec<PositionedEntity> {
        if snapshot.records.is_empty() {
            return Vec::new();
        }
        let p = &self.params;
        let zero_line = self.scales.value.center();

        let mut nodes: Vec<SimNode> = snapshot
            .records
            .iter()
            .map(|r| {
                let target = Vec2::new(
                    self.scales.category_position(r.category),
                    self.scales.value_position(r.value),
                );
                let body_radius = radius.radius(r.magnitude);
                let region = Region::for_body(
                    self.scales.category.span(r.category),
                    body_radius,
                    zero_line,
                    target.y,
                    ZERO_LINE_GAP,
                );
                let pos = seeds(&r.id).unwrap_or_else(|| seed::seed_position(&r.id, target, p.seed_jitter));
                SimNode {
                    pos: region.clamp(pos),
                    vel: Vec2::ZERO,
                    target,
                    radius: body_radius,
                    category: r.category.0,
                    region,
                }
            })
            .collect();

        let decay = 1.0 - p.alpha_decay.clamp(0.0, 1.0);
        let mut alpha = p.alpha;
        for _ in 0..p.iterations {
            forces::category_force(&mut nodes, p.category_strength, alpha);
            forces::value_force(&mut nodes, p.value_strength, alpha);
            forces::cluster_force(&mut nodes, self.category_count, p.cluster_strength, alpha);
            forces::collision_force(
                &mut nodes,
                p.collision_padding,
                p.collision_strength,
                p.collision_passes,
            );
            forces::integrate(&mut nodes, p.velocity_decay);
            alpha *= decay;
        }
        let settled = forces::settle_overlaps(&mut nodes, p.collision_padding, p.settle_tolerance, p.settle_sweeps);
        if settled.placed_outward {
            debug!(
                "[LAYOUT] {} ({} entities): sweep budget of {} ran out, placed outward",
                snapshot.label,
                nodes.len(),
                settled.sweeps
            );
        }

        snapshot
            .records
            .iter()
            .zip(nodes)
            .map(|(r, n)| PositionedEntity {
                id: r.id.clone(),
                category: r.category,
                value: r.value,
                magnitude: r.magnitude,
                radius: n.radius,
                x: n.pos.x,
                y: n.pos.y,
            })
            .collect()
    }

    /// Eagerly lay out every snapshot, in order, against `cache`.
    pub fn bake(&self, timeline: &Timeline, cache: &mut ContinuityCache) -> Vec<LayoutSnapshot> {
        timeline
            .snapshots
            .iter()
            .map(|s| self.layout_snapshot(s, cache))
            .collect()
    }
}

/// Bake a whole timeline against a fresh cache.
pub fn bake_timeline(timeline: &Timeline, canvas: CanvasSize, config: &SectorflowConfig) -> BakedLayout {
    let started = Instant::now();
    let engine = LayoutEngine::from_config(timeline, canvas, config);
    let mut cache = ContinuityCache::new();
    let snapshots = engine.bake(timeline, &mut cache);
    info!(
        "[LAYOUT] Baked {} snapshots ({} entities) at {}x{} in {:.1?}",
        snapshots.len(),
        timeline.record_count(),
        canvas.width,
        canvas.height,
        started.elapsed()
    );
    BakedLayout {
        snapshots,
        cache,
        scales: Some(engine.scales),
    }
}

/// Re-bake whenever the dataset or canvas size changes. Both invalidate every
/// cached position, so the cache is rebuilt from scratch.
pub fn rebake_layout_system(
    dataset: Res<ActiveDataset>,
    canvas: Res<CanvasSize>,
    config: Res<SectorflowConfig>,
    mut baked: ResMut<BakedLayout>,
) {
    if !dataset.is_changed() && !canvas.is_changed() {
        return;
    }
    *baked = bake_timeline(&dataset.timeline, *canvas, &config);
}
