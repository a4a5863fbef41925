//! Layout properties over whole snapshots: column containment, value sign,
//! collision, determinism, and continuity cache isolation.

use bevy::math::Vec2;
use sectorflow::core::cache::ContinuityCache;
use sectorflow::core::config::SectorflowConfig;
use sectorflow::core::model::{CategoryId, CategorySet, EntityRecord, LayoutSnapshot, SnapshotInput, Timeline};
use sectorflow::core::resources::CanvasSize;
use sectorflow::core::scales::ScaleParams;
use sectorflow::io::demo::sample_timeline;
use sectorflow::core::resources::BakedLayout;
use sectorflow::layout::seed::stable_hash;
use sectorflow::layout::{bake_timeline, LayoutEngine, LayoutParams};

fn assert_no_overlap(snapshot: &LayoutSnapshot, eps: f32) {
    let e = &snapshot.entities;
    for i in 0..e.len() {
        for j in (i + 1)..e.len() {
            let d = Vec2::new(e[i].x, e[i].y).distance(Vec2::new(e[j].x, e[j].y));
            let min = e[i].radius + e[j].radius;
            assert!(
                d >= min - eps,
                "{} / {} overlap at t={}: {} < {}",
                e[i].id,
                e[j].id,
                snapshot.time_index,
                d,
                min
            );
        }
    }
}

fn assert_in_columns(baked: &BakedLayout) {
    let scales = baked.scales.as_ref().unwrap();
    for snap in &baked.snapshots {
        for e in &snap.entities {
            let (lo, hi) = scales.category.span(e.category);
            assert!(
                e.x >= lo - 1e-3 && e.x <= hi + 1e-3,
                "{} at t={}: x={} not in [{lo}, {hi}]",
                e.id,
                snap.time_index,
                e.x
            );
        }
    }
}

/// Entities with a value of exactly zero may sit on either side.
fn assert_value_sides(baked: &BakedLayout) {
    let center = baked.scales.as_ref().unwrap().value.center();
    for snap in &baked.snapshots {
        for e in snap.entities.iter().filter(|e| e.value != 0.0) {
            assert_eq!(
                (e.y - center).signum(),
                e.value.signum(),
                "{} at t={}: value {} but y {} vs center {}",
                e.id,
                snap.time_index,
                e.value,
                e.y,
                center
            );
        }
    }
}

/// `count` entities spread over the default sectors, values in (-20, 20)
/// and magnitudes over four decades, all derived from the id.
fn hashed_timeline(count: usize) -> Timeline {
    let categories = SectorflowConfig::default().category_set();
    let records = (0..count)
        .map(|i| {
            let id = format!("S{i}");
            let h = stable_hash(&id);
            let value = ((h % 4001) as f32 - 2000.0) / 100.0;
            let value = if value == 0.0 { 0.5 } else { value };
            let magnitude = 10f32.powf(((h >> 16) % 400) as f32 / 100.0);
            EntityRecord::new(id, CategoryId((h >> 40) as usize % categories.len()), value, magnitude)
        })
        .collect();
    Timeline {
        categories,
        snapshots: vec![SnapshotInput::new(0, "t0", records)],
    }
}

/// Three entities per category, values well away from zero.
fn spread_timeline() -> Timeline {
    let categories = CategorySet::new(["Tech", "Health", "Energy", "Utilities"]);
    let values = [8.0, -6.0, 4.0];
    let magnitudes = [100.0, 40.0, 10.0];
    let records = (0..categories.len())
        .flat_map(|c| {
            (0..3).map(move |k| {
                EntityRecord::new(
                    format!("E{c}{k}"),
                    CategoryId(c),
                    values[(c + k) % 3],
                    magnitudes[k] * (c + 1) as f32,
                )
            })
        })
        .collect();
    Timeline {
        categories,
        snapshots: vec![SnapshotInput::new(0, "t0", records)],
    }
}

#[test]
fn example_scenario_tech_pair_clusters_apart_from_energy() {
    let timeline = Timeline {
        categories: CategorySet::new(["Tech", "Energy"]),
        snapshots: vec![SnapshotInput::new(
            0,
            "t0",
            vec![
                EntityRecord::new("T1", CategoryId(0), 10.0, 100.0),
                EntityRecord::new("T2", CategoryId(0), -5.0, 50.0),
                EntityRecord::new("E1", CategoryId(1), 2.0, 10.0),
            ],
        )],
    };
    let baked = bake_timeline(&timeline, CanvasSize::new(800.0, 600.0), &SectorflowConfig::default());
    let snap = &baked.snapshots[0];
    let x = |id: &str| snap.get(id).unwrap().x;

    let tech_gap = (x("T1") - x("T2")).abs();
    assert!(tech_gap < (x("T1") - x("E1")).abs());
    assert!(tech_gap < (x("T2") - x("E1")).abs());
    assert_no_overlap(snap, 0.01);
}

#[test]
fn entities_stay_in_their_column() {
    let timeline = sample_timeline(&SectorflowConfig::default().category_set());
    let config = SectorflowConfig::default();
    let baked = bake_timeline(&timeline, config.canvas(), &config);
    assert_in_columns(&baked);
    assert_value_sides(&baked);
}

#[test]
fn vertical_side_matches_value_sign() {
    let timeline = spread_timeline();
    let canvas = CanvasSize::new(1200.0, 700.0);
    let baked = bake_timeline(&timeline, canvas, &SectorflowConfig::default());
    assert_value_sides(&baked);
}

#[test]
fn near_zero_values_keep_their_side_in_a_crowded_column() {
    let categories = CategorySet::new(["Tech", "Energy", "Utilities"]);
    let records = (0..40)
        .map(|k| {
            let size = 0.1 + k as f32 * 0.9 / 39.0;
            let value = if k % 2 == 0 { size } else { -size };
            EntityRecord::new(format!("T{k}"), CategoryId(0), value, 10.0 + (k * 37 % 90) as f32)
        })
        .chain((0..6).map(|k| EntityRecord::new(format!("E{k}"), CategoryId(1), 0.2 - k as f32 * 0.1 + 0.05, 50.0)))
        .collect();
    let timeline = Timeline {
        categories,
        snapshots: vec![SnapshotInput::new(0, "t0", records)],
    };
    let baked = bake_timeline(&timeline, CanvasSize::new(900.0, 600.0), &SectorflowConfig::default());
    assert_value_sides(&baked);
    assert_in_columns(&baked);
    assert_no_overlap(&baked.snapshots[0], 0.5);
}

#[test]
fn five_hundred_entities_on_default_canvas() {
    let config = SectorflowConfig::default();
    let timeline = hashed_timeline(500);
    let baked = bake_timeline(&timeline, config.canvas(), &config);
    assert_eq!(baked.snapshots[0].len(), 500);
    assert_in_columns(&baked);
    assert_value_sides(&baked);
    assert_no_overlap(&baked.snapshots[0], 0.5);
}

#[test]
fn no_pair_overlaps_in_any_sample_snapshot() {
    let config = SectorflowConfig::default();
    let timeline = sample_timeline(&config.category_set());
    let baked = bake_timeline(&timeline, config.canvas(), &config);
    assert_eq!(baked.len(), timeline.len());
    for snap in &baked.snapshots {
        assert_no_overlap(snap, 0.5);
    }
}

#[test]
fn repeated_bakes_are_identical() {
    let config = SectorflowConfig::default();
    let timeline = sample_timeline(&config.category_set());
    let a = bake_timeline(&timeline, config.canvas(), &config);
    let b = bake_timeline(&timeline, config.canvas(), &config);
    assert_eq!(a.snapshots, b.snapshots);
}

#[test]
fn other_period_entries_never_seed() {
    let timeline = spread_timeline();
    let engine = LayoutEngine::new(
        &timeline,
        CanvasSize::new(1000.0, 600.0),
        &ScaleParams::default(),
        LayoutParams::default(),
    );
    let mut shifted = timeline.snapshots[0].clone();
    shifted.time_index = 1;

    let mut clean = ContinuityCache::new();
    let expected = engine.layout_snapshot(&shifted, &mut clean);

    let mut cache = ContinuityCache::new();
    for r in &timeline.snapshots[0].records {
        cache.set(0, r.id.clone(), Vec2::new(10.0, 20.0));
    }
    let actual = engine.layout_snapshot(&shifted, &mut cache);

    assert_eq!(expected, actual);
    assert_eq!(cache.get(0, "E00"), Some(Vec2::new(10.0, 20.0)));
    assert_eq!(cache.period_len(1), shifted.records.len());
}

#[test]
fn resize_moves_columns_with_canvas() {
    let config = SectorflowConfig::default();
    let timeline = spread_timeline();
    let narrow = bake_timeline(&timeline, CanvasSize::new(600.0, 600.0), &config);
    let wide = bake_timeline(&timeline, CanvasSize::new(1600.0, 600.0), &config);
    let last = |b: &sectorflow::core::resources::BakedLayout| {
        b.snapshots[0].entities.iter().map(|e| e.x).fold(f32::MIN, f32::max)
    };
    assert!(last(&wide) > last(&narrow));
}
