//! Static guides: category column dividers, the zero line, and value domain edges.

use bevy::prelude::*;

use crate::core::model::CategoryId;
use crate::core::resources::{BakedLayout, CanvasSize};
use crate::core::scales::ScaleMapper;

const COLUMN_COLOR: Color = Color::srgba(1.0, 1.0, 1.0, 0.06);
const ZERO_COLOR: Color = Color::srgba(1.0, 1.0, 1.0, 0.35);
const DOMAIN_COLOR: Color = Color::srgba(1.0, 1.0, 1.0, 0.15);

/// Guide segments in layout space, as (start, end, color).
pub fn guide_segments(scales: &ScaleMapper, canvas: CanvasSize) -> Vec<(Vec2, Vec2, Color)> {
    let (bottom, top) = scales.value.range();
    let mut segments = Vec::new();

    // Dividers between neighbouring columns.
    for i in 1..scales.category.count() {
        let x = scales.category.span(CategoryId(i)).0;
        segments.push((Vec2::new(x, bottom), Vec2::new(x, top), COLUMN_COLOR));
    }

    let (lo, hi) = scales.value.domain();
    for (v, color) in [(lo, DOMAIN_COLOR), (hi, DOMAIN_COLOR), (0.0, ZERO_COLOR)] {
        if v < lo || v > hi {
            continue;
        }
        let y = scales.value.position(v);
        segments.push((Vec2::new(0.0, y), Vec2::new(canvas.width, y), color));
    }
    segments
}

pub fn draw_guides_system(baked: Res<BakedLayout>, canvas: Res<CanvasSize>, mut gizmos: Gizmos) {
    let Some(scales) = &baked.scales else {
        return;
    };
    for (a, b, color) in guide_segments(scales, *canvas) {
        gizmos.line_2d(canvas.to_world(a), canvas.to_world(b), color);
    }
}
