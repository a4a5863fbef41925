//! Enter / update / exit planning between two baked snapshots.

use bevy::math::Vec2;
use std::collections::HashSet;

use crate::core::cache::ContinuityCache;
use crate::core::model::{CategoryId, LayoutSnapshot, PositionedEntity};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionKind {
    /// Present only in the destination: grows in place from radius 0.
    Enter,
    /// Present in both: moves and resizes.
    Update,
    /// Present only in the source: shrinks in place to radius 0.
    Exit,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub id: String,
    pub category: CategoryId,
    pub kind: TransitionKind,
    pub from: Vec2,
    pub to: Vec2,
    pub from_radius: f32,
    pub to_radius: f32,
}

impl Transition {
    /// Position and radius at `progress` in `[0, 1]`, eased.
    pub fn sample(&self, progress: f32) -> (Vec2, f32) {
        let t = ease_cubic_in_out(progress.clamp(0.0, 1.0));
        (
            self.from.lerp(self.to, t),
            self.from_radius + (self.to_radius - self.from_radius) * t,
        )
    }

    pub fn is_exit(&self) -> bool {
        self.kind == TransitionKind::Exit
    }
}

pub fn ease_cubic_in_out(t: f32) -> f32 {
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        let u = -2.0 * t + 2.0;
        1.0 - u * u * u / 2.0
    }
}

/// Plan every transition from `from` (if any) to `to`. Resting points are read
/// from the cache under each snapshot's own time index, falling back to the
/// snapshot's stored coordinates.
pub fn plan_transitions(
    cache: &ContinuityCache,
    from: Option<&LayoutSnapshot>,
    to: &LayoutSnapshot,
) -> Vec<Transition> {
    let resting = |snap: &LayoutSnapshot, e: &PositionedEntity| {
        cache
            .get(snap.time_index, &e.id)
            .unwrap_or(Vec2::new(e.x, e.y))
    };

    let mut out = Vec::with_capacity(to.len());
    for e in &to.entities {
        let dest = resting(to, e);
        let prior = from.and_then(|f| f.get(&e.id).map(|p| (resting(f, p), p.radius)));
        out.push(match prior {
            Some((start, start_radius)) => Transition {
                id: e.id.clone(),
                category: e.category,
                kind: TransitionKind::Update,
                from: start,
                to: dest,
                from_radius: start_radius,
                to_radius: e.radius,
            },
            None => Transition {
                id: e.id.clone(),
                category: e.category,
                kind: TransitionKind::Enter,
                from: dest,
                to: dest,
                from_radius: 0.0,
                to_radius: e.radius,
            },
        });
    }

    if let Some(f) = from {
        let present: HashSet<&str> = to.entities.iter().map(|e| e.id.as_str()).collect();
        for e in f.entities.iter().filter(|e| !present.contains(e.id.as_str())) {
            let start = resting(f, e);
            out.push(Transition {
                id: e.id.clone(),
                category: e.category,
                kind: TransitionKind::Exit,
                from: start,
                to: start,
                from_radius: e.radius,
                to_radius: 0.0,
            });
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(id: &str, x: f32, y: f32, r: f32) -> PositionedEntity {
        PositionedEntity {
            id: id.into(),
            category: CategoryId(0),
            value: 0.0,
            magnitude: 1.0,
            radius: r,
            x,
            y,
        }
    }

    fn snapshot(t: usize, entities: Vec<PositionedEntity>) -> LayoutSnapshot {
        LayoutSnapshot {
            time_index: t,
            label: format!("t{t}"),
            entities,
        }
    }

    #[test]
    fn classifies_enter_update_exit() {
        let mut cache = ContinuityCache::new();
        let a = snapshot(0, vec![entity("KEEP", 10.0, 10.0, 5.0), entity("GONE", 50.0, 50.0, 4.0)]);
        let b = snapshot(1, vec![entity("KEEP", 20.0, 30.0, 6.0), entity("NEW", 70.0, 70.0, 3.0)]);
        for s in [&a, &b] {
            for e in &s.entities {
                cache.set(s.time_index, e.id.clone(), Vec2::new(e.x, e.y));
            }
        }
        let plan = plan_transitions(&cache, Some(&a), &b);
        assert_eq!(plan.len(), 3);

        let keep = plan.iter().find(|t| t.id == "KEEP").unwrap();
        assert_eq!(keep.kind, TransitionKind::Update);
        assert_eq!((keep.from, keep.to), (Vec2::new(10.0, 10.0), Vec2::new(20.0, 30.0)));
        assert_eq!((keep.from_radius, keep.to_radius), (5.0, 6.0));

        let new = plan.iter().find(|t| t.id == "NEW").unwrap();
        assert_eq!(new.kind, TransitionKind::Enter);
        assert_eq!(new.from, new.to);
        assert_eq!(new.from_radius, 0.0);

        let gone = plan.iter().find(|t| t.id == "GONE").unwrap();
        assert!(gone.is_exit());
        assert_eq!(gone.to_radius, 0.0);
        assert_eq!(gone.from, Vec2::new(50.0, 50.0));
    }

    #[test]
    fn without_source_everything_enters() {
        let cache = ContinuityCache::new();
        let b = snapshot(2, vec![entity("A", 1.0, 2.0, 3.0)]);
        let plan = plan_transitions(&cache, None, &b);
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].kind, TransitionKind::Enter);
        assert_eq!(plan[0].to, Vec2::new(1.0, 2.0));
    }

    #[test]
    fn sample_endpoints_and_easing() {
        let t = Transition {
            id: "A".into(),
            category: CategoryId(0),
            kind: TransitionKind::Update,
            from: Vec2::ZERO,
            to: Vec2::new(100.0, 0.0),
            from_radius: 0.0,
            to_radius: 10.0,
        };
        assert_eq!(t.sample(0.0), (Vec2::ZERO, 0.0));
        assert_eq!(t.sample(1.0), (Vec2::new(100.0, 0.0), 10.0));
        assert_eq!(t.sample(2.0), (Vec2::new(100.0, 0.0), 10.0));
        let (mid, r) = t.sample(0.5);
        assert!((mid.x - 50.0).abs() < 1e-4);
        assert!((r - 5.0).abs() < 1e-4);
        assert!(t.sample(0.25).0.x < 25.0);
    }
}
