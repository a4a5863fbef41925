//! Scale mapping: category → x, value → y, magnitude → radius.
//!
//! Category and value scales are fixed for a whole dataset and canvas size.
//! The radius scale is rebuilt per snapshot because magnitude extrema drift.

use serde::{Deserialize, Serialize};

use crate::core::model::{CategoryId, CategorySet, EntityRecord};
use crate::core::resources::CanvasSize;

/// Tunable scale parameters (`[scale]` in `~/.sectorflowrc`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScaleParams {
    /// Lower edge of the value domain, in percent.
    pub value_min: f32,
    /// Upper edge of the value domain, in percent.
    pub value_max: f32,
    pub radius_min: f32,
    pub radius_max: f32,
    /// Horizontal padding so the outermost columns are not clipped.
    pub edge_padding: f32,
    /// Vertical padding above and below the value range.
    pub vertical_padding: f32,
}

impl Default for ScaleParams {
    fn default() -> Self {
        Self {
            value_min: -20.0,
            value_max: 20.0,
            radius_min: 3.0,
            radius_max: 25.0,
            edge_padding: 60.0,
            vertical_padding: 60.0,
        }
    }
}

/// Evenly spaced category columns across the canvas width.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryScale {
    count: usize,
    start: f32,
    step: f32,
    center: f32,
}

impl CategoryScale {
    pub fn new(count: usize, width: f32, edge_padding: f32) -> Self {
        let width = width.max(0.0);
        let pad = edge_padding.clamp(0.0, width * 0.5);
        let span = width - 2.0 * pad;
        let step = match count {
            0 | 1 => span,
            n => span / (n - 1) as f32,
        };
        Self {
            count,
            start: pad,
            step,
            center: width * 0.5,
        }
    }

    /// Column center for a category. Unknown ids fall back to the canvas center.
    pub fn position(&self, category: CategoryId) -> f32 {
        match self.count {
            0 | 1 => self.center,
            n if category.0 < n => self.start + category.0 as f32 * self.step,
            _ => self.center,
        }
    }

    /// Horizontal extent owned by a category: one step wide, centered on its column.
    pub fn span(&self, category: CategoryId) -> (f32, f32) {
        let x = self.position(category);
        let half = self.step * 0.5;
        (x - half, x + half)
    }

    pub fn count(&self) -> usize {
        self.count
    }
}

/// Clamped linear value → y mapping. Larger values sit higher (y up).
#[derive(Debug, Clone, PartialEq)]
pub struct ValueScale {
    domain: (f32, f32),
    range: (f32, f32),
}

impl ValueScale {
    pub fn new(domain: (f32, f32), height: f32, vertical_padding: f32) -> Self {
        let height = height.max(0.0);
        let pad = vertical_padding.clamp(0.0, height * 0.5);
        let (lo, hi) = if domain.0 <= domain.1 {
            domain
        } else {
            (domain.1, domain.0)
        };
        Self {
            domain: (lo, hi),
            range: (pad, height - pad),
        }
    }

    pub fn position(&self, value: f32) -> f32 {
        let (d0, d1) = self.domain;
        let (r0, r1) = self.range;
        if d1 - d0 <= f32::EPSILON {
            return self.center();
        }
        let v = if value.is_finite() { value.clamp(d0, d1) } else { 0.0f32.clamp(d0, d1) };
        r0 + (v - d0) / (d1 - d0) * (r1 - r0)
    }

    /// Vertical position of the domain midpoint (0% for a symmetric domain).
    pub fn center(&self) -> f32 {
        (self.range.0 + self.range.1) * 0.5
    }

    pub fn domain(&self) -> (f32, f32) {
        self.domain
    }

    pub fn range(&self) -> (f32, f32) {
        self.range
    }
}

/// Square-root magnitude → radius scale, so bubble area tracks magnitude.
#[derive(Debug, Clone, PartialEq)]
pub struct RadiusScale {
    sqrt_domain: (f32, f32),
    range: (f32, f32),
}

impl RadiusScale {
    pub fn new(min_magnitude: f32, max_magnitude: f32, range: (f32, f32)) -> Self {
        let lo = sanitize_magnitude(min_magnitude).sqrt();
        let hi = sanitize_magnitude(max_magnitude).sqrt();
        Self {
            sqrt_domain: (lo.min(hi), lo.max(hi)),
            range,
        }
    }

    /// Build from the magnitude extrema of one snapshot.
    pub fn for_records(records: &[EntityRecord], range: (f32, f32)) -> Self {
        let (min, max) = records.iter().fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), r| {
            (lo.min(r.magnitude), hi.max(r.magnitude))
        });
        if records.is_empty() {
            return Self::new(0.0, 0.0, range);
        }
        Self::new(min, max, range)
    }

    pub fn radius(&self, magnitude: f32) -> f32 {
        let (d0, d1) = self.sqrt_domain;
        let (r0, r1) = self.range;
        if d1 - d0 <= f32::EPSILON {
            // Zero-variance snapshot.
            return (r0 + r1) * 0.5;
        }
        let s = sanitize_magnitude(magnitude).sqrt().clamp(d0, d1);
        r0 + (s - d0) / (d1 - d0) * (r1 - r0)
    }
}

fn sanitize_magnitude(m: f32) -> f32 {
    if m.is_finite() {
        m.max(0.0)
    } else {
        0.0
    }
}

/// Dataset-wide scales for one canvas size.
#[derive(Debug, Clone, PartialEq)]
pub struct ScaleMapper {
    pub category: CategoryScale,
    pub value: ValueScale,
    radius_range: (f32, f32),
}

impl ScaleMapper {
    pub fn new(categories: &CategorySet, canvas: CanvasSize, params: &ScaleParams) -> Self {
        Self {
            category: CategoryScale::new(categories.len(), canvas.width, params.edge_padding),
            value: ValueScale::new(
                (params.value_min, params.value_max),
                canvas.height,
                params.vertical_padding,
            ),
            radius_range: (params.radius_min, params.radius_max),
        }
    }

    pub fn category_position(&self, category: CategoryId) -> f32 {
        self.category.position(category)
    }

    pub fn value_position(&self, value: f32) -> f32 {
        self.value.position(value)
    }

    /// Per-snapshot radius scale.
    pub fn radius_scale(&self, records: &[EntityRecord]) -> RadiusScale {
        RadiusScale::for_records(records, self.radius_range)
    }
}
