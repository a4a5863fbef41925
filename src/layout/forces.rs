//! The four layout forces plus the final overlap sweep.
//!
//! Forces only add to velocities, so their order within one iteration does not
//! matter. Positions move once per iteration, in [`integrate`], and are then
//! projected into each body's [`Region`].

use bevy::math::Vec2;

use crate::core::spatial::SpatialGrid;
use crate::layout::seed::separation_direction;

/// Per-entity simulation state. Lives for one snapshot's convergence only.
#[derive(Debug, Clone)]
pub struct SimNode {
    pub pos: Vec2,
    pub vel: Vec2,
    pub target: Vec2,
    pub radius: f32,
    pub category: usize,
    pub region: Region,
}

/// Where a body may sit: an x interval and a y interval. Unbounded sides are
/// infinite, so there is always room to move away from the zero line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Region {
    pub x: (f32, f32),
    pub y: (f32, f32),
}

impl Region {
    pub const FREE: Region = Region {
        x: (f32::NEG_INFINITY, f32::INFINITY),
        y: (f32::NEG_INFINITY, f32::INFINITY),
    };

    /// Region for a body of `radius` in the column `span`, kept on the side of
    /// `zero_line` that `target_y` is on, at least `gap` away from it. A target
    /// exactly on the line leaves y free. Columns narrower than the body pin x
    /// to the column center.
    pub fn for_body(span: (f32, f32), radius: f32, zero_line: f32, target_y: f32, gap: f32) -> Self {
        let (lo, hi) = (span.0 + radius, span.1 - radius);
        let x = if lo <= hi {
            (lo, hi)
        } else {
            let mid = (span.0 + span.1) * 0.5;
            (mid, mid)
        };
        let y = if target_y > zero_line {
            (zero_line + gap, f32::INFINITY)
        } else if target_y < zero_line {
            (f32::NEG_INFINITY, zero_line - gap)
        } else {
            Region::FREE.y
        };
        Self { x, y }
    }

    pub fn clamp(&self, p: Vec2) -> Vec2 {
        Vec2::new(p.x.clamp(self.x.0, self.x.1), p.y.clamp(self.y.0, self.y.1))
    }

    fn unbounded_above(&self) -> bool {
        self.y.1 == f32::INFINITY
    }
}

/// Outcome of [`settle_overlaps`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SettleReport {
    pub sweeps: usize,
    /// Deepest overlap left when the sweep stopped.
    pub worst: f32,
    /// The sweep budget ran out and bodies were placed outward one by one.
    pub placed_outward: bool,
}

/// Pull x toward the category column.
pub fn category_force(nodes: &mut [SimNode], strength: f32, alpha: f32) {
    let k = strength * alpha;
    for node in nodes {
        node.vel.x += (node.target.x - node.pos.x) * k;
    }
}

/// Pull y toward the value axis position.
pub fn value_force(nodes: &mut [SimNode], strength: f32, alpha: f32) {
    let k = strength * alpha;
    for node in nodes {
        node.vel.y += (node.target.y - node.pos.y) * k;
    }
}

/// Nudge members of each category toward that category's current centroid.
/// Categories with a single member are skipped.
pub fn cluster_force(nodes: &mut [SimNode], category_count: usize, strength: f32, alpha: f32) {
    if nodes.len() < 2 || strength == 0.0 {
        return;
    }
    let buckets = category_count.max(nodes.iter().map(|n| n.category + 1).max().unwrap_or(0));
    let mut sums = vec![(Vec2::ZERO, 0usize); buckets];
    for node in nodes.iter() {
        let slot = &mut sums[node.category];
        slot.0 += node.pos;
        slot.1 += 1;
    }
    let k = strength * alpha;
    for node in nodes.iter_mut() {
        let (sum, count) = sums[node.category];
        if count < 2 {
            continue;
        }
        let centroid = sum / count as f32;
        node.vel += (centroid - node.pos) * k;
    }
}

/// Push apart bodies whose predicted positions (`pos + vel`) overlap.
/// Runs `passes` sub-passes; each overlap is resolved by `strength` of its depth,
/// split so the smaller body moves more.
pub fn collision_force(nodes: &mut [SimNode], padding: f32, strength: f32, passes: usize) {
    if nodes.len() < 2 {
        return;
    }
    let cell = collision_cell_size(nodes, padding);
    for _ in 0..passes {
        let grid = SpatialGrid::build(cell, nodes.iter().map(|n| n.pos + n.vel));
        for i in 0..nodes.len() {
            let probe = nodes[i].pos + nodes[i].vel;
            for j in grid.neighbours(probe) {
                if j <= i {
                    continue;
                }
                let pi = nodes[i].pos + nodes[i].vel;
                let pj = nodes[j].pos + nodes[j].vel;
                let reach = nodes[i].radius + nodes[j].radius + padding;
                let Some((normal, depth)) = overlap(pi, pj, reach, i, j) else {
                    continue;
                };
                let (share_i, share_j) = shares(nodes[i].radius, nodes[j].radius);
                let push = normal * depth * strength;
                nodes[i].vel += push * share_i;
                nodes[j].vel -= push * share_j;
            }
        }
    }
}

/// Damp velocities, then move. A body pushed against its region keeps no
/// velocity along the blocked axis.
pub fn integrate(nodes: &mut [SimNode], velocity_decay: f32) {
    let keep = 1.0 - velocity_decay.clamp(0.0, 1.0);
    for node in nodes {
        node.vel *= keep;
        let moved = node.pos + node.vel;
        node.pos = node.region.clamp(moved);
        if node.pos.x != moved.x {
            node.vel.x = 0.0;
        }
        if node.pos.y != moved.y {
            node.vel.y = 0.0;
        }
    }
}

/// Position-based overlap resolution run after the iteration budget.
///
/// Every correction is projected back into the body's region. A pair that the
/// projection keeps overlapping is stacked vertically instead: the upper body
/// moves up, or the lower one down when the upper cannot. Both directions
/// lead away from the zero line, so there is always somewhere to go.
///
/// Sweeps until no pair overlaps by more than `tolerance`, for at most
/// `min_sweeps` plus one sweep per body. The result is then checked pair by
/// pair; if anything still overlaps, the bodies are placed outward one at a
/// time, which always ends overlap-free.
pub fn settle_overlaps(nodes: &mut [SimNode], padding: f32, tolerance: f32, min_sweeps: usize) -> SettleReport {
    for node in nodes.iter_mut() {
        node.pos = node.region.clamp(node.pos);
    }
    if nodes.len() < 2 {
        return SettleReport {
            sweeps: 0,
            worst: 0.0,
            placed_outward: false,
        };
    }
    let budget = min_sweeps.max(1) + nodes.len();
    let cell = collision_cell_size(nodes, padding);
    let mut sweeps = budget;
    for sweep in 0..budget {
        let grid = SpatialGrid::build(cell, nodes.iter().map(|n| n.pos));
        let mut worst = 0.0f32;
        for i in 0..nodes.len() {
            let probe = nodes[i].pos;
            for j in grid.neighbours(probe) {
                if j <= i {
                    continue;
                }
                let reach = nodes[i].radius + nodes[j].radius + padding;
                let Some((normal, depth)) = overlap(nodes[i].pos, nodes[j].pos, reach, i, j) else {
                    continue;
                };
                worst = worst.max(depth);
                let (share_i, share_j) = shares(nodes[i].radius, nodes[j].radius);
                nodes[i].pos = nodes[i].region.clamp(nodes[i].pos + normal * depth * share_i);
                nodes[j].pos = nodes[j].region.clamp(nodes[j].pos - normal * depth * share_j);
                if nodes[i].pos.distance(nodes[j].pos) < reach - CONTACT_SLACK {
                    stack_vertically(nodes, i, j, reach);
                }
            }
        }
        if worst <= tolerance {
            sweeps = sweep + 1;
            break;
        }
    }

    let worst = deepest_overlap(nodes, padding);
    if worst <= tolerance {
        return SettleReport {
            sweeps,
            worst,
            placed_outward: false,
        };
    }
    place_outward(nodes, padding);
    SettleReport {
        sweeps,
        worst: deepest_overlap(nodes, padding),
        placed_outward: true,
    }
}

/// Distance below contact that still counts as touching.
const CONTACT_SLACK: f32 = 0.01;

/// Separate a pair along y only, keeping both x positions.
fn stack_vertically(nodes: &mut [SimNode], i: usize, j: usize, reach: f32) {
    let (upper, lower) = if nodes[i].pos.y >= nodes[j].pos.y { (i, j) } else { (j, i) };
    let rise = rise_clear_of(nodes[upper].pos, nodes[lower].pos, reach);
    if nodes[upper].region.unbounded_above() {
        nodes[upper].pos.y = nodes[lower].pos.y + rise;
    } else {
        nodes[lower].pos.y = nodes[upper].pos.y - rise;
    }
}

/// Vertical offset at which two bodies `dx` apart just touch.
fn rise_clear_of(a: Vec2, b: Vec2, reach: f32) -> f32 {
    let dx = (a.x - b.x).abs();
    (reach * reach - dx * dx).max(0.0).sqrt()
}

/// Place bodies one at a time, nearest the zero line first. A body that
/// touches an already placed one moves further out along y until it is
/// clear. Moves are monotone, so each placed body blocks at most once.
fn place_outward(nodes: &mut [SimNode], padding: f32) {
    let mut order: Vec<usize> = (0..nodes.len()).collect();
    order.sort_by(|&a, &b| {
        line_distance(&nodes[a])
            .total_cmp(&line_distance(&nodes[b]))
            .then(a.cmp(&b))
    });
    for k in 0..order.len() {
        let i = order[k];
        loop {
            let blocker = order[..k].iter().copied().find(|&j| {
                let reach = nodes[i].radius + nodes[j].radius + padding;
                nodes[i].pos.distance(nodes[j].pos) < reach - CONTACT_SLACK
            });
            let Some(j) = blocker else {
                break;
            };
            let reach = nodes[i].radius + nodes[j].radius + padding;
            let rise = rise_clear_of(nodes[i].pos, nodes[j].pos, reach);
            nodes[i].pos.y = if nodes[i].region.unbounded_above() {
                nodes[j].pos.y + rise
            } else {
                nodes[j].pos.y - rise
            };
        }
    }
}

/// How far a body sits from the line its region is bounded by.
fn line_distance(node: &SimNode) -> f32 {
    let (lo, hi) = node.region.y;
    if lo.is_finite() {
        node.pos.y - lo
    } else if hi.is_finite() {
        hi - node.pos.y
    } else {
        node.pos.y
    }
}

fn deepest_overlap(nodes: &[SimNode], padding: f32) -> f32 {
    let mut worst = 0.0f32;
    for (i, a) in nodes.iter().enumerate() {
        for b in &nodes[i + 1..] {
            let reach = a.radius + b.radius + padding;
            worst = worst.max(reach - a.pos.distance(b.pos));
        }
    }
    worst
}

/// Largest collision diameter: two bodies that can touch always share a
/// cell or sit in adjacent cells.
fn collision_cell_size(nodes: &[SimNode], padding: f32) -> f32 {
    let max_r = nodes.iter().map(|n| n.radius).fold(0.0f32, f32::max);
    (2.0 * max_r + padding).max(1.0)
}

/// Unit normal from `b` to `a` and penetration depth, if the disks overlap.
fn overlap(a: Vec2, b: Vec2, reach: f32, i: usize, j: usize) -> Option<(Vec2, f32)> {
    let delta = a - b;
    let d2 = delta.length_squared();
    if d2 >= reach * reach {
        return None;
    }
    let d = d2.sqrt();
    if d <= 1e-6 {
        return Some((separation_direction(i, j), reach));
    }
    Some((delta / d, reach - d))
}

/// Split of a correction between two bodies, weighted by the other's area.
fn shares(ri: f32, rj: f32) -> (f32, f32) {
    let ai = ri * ri;
    let aj = rj * rj;
    let total = ai + aj;
    if total <= f32::EPSILON {
        return (0.5, 0.5);
    }
    (aj / total, ai / total)
}
