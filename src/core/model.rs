//! Timeline data model: categories, entity records, and laid-out snapshots.

use serde::{Deserialize, Serialize};

/// Index into the ordered [`CategorySet`]. Only valid for the set it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CategoryId(pub usize);

/// Fixed, ordered set of categories (sectors). Order drives horizontal placement.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategorySet {
    names: Vec<String>,
}

impl CategorySet {
    /// Build from an ordered list of names. Blank and repeated names are skipped.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut set = Self::default();
        for name in names {
            let name: String = name.into();
            let trimmed = name.trim();
            if trimmed.is_empty() || set.id_of(trimmed).is_some() {
                continue;
            }
            set.names.push(trimmed.to_string());
        }
        set
    }

    pub fn id_of(&self, name: &str) -> Option<CategoryId> {
        self.names.iter().position(|n| n == name.trim()).map(CategoryId)
    }

    pub fn name(&self, id: CategoryId) -> Option<&str> {
        self.names.get(id.0).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (CategoryId, &str)> {
        self.names
            .iter()
            .enumerate()
            .map(|(i, n)| (CategoryId(i), n.as_str()))
    }
}

/// One entity's state at one time index, after input normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityRecord {
    pub id: String,
    pub category: CategoryId,
    /// Signed percentage (e.g. percent change).
    pub value: f32,
    /// Non-negative size driver (e.g. market capitalization).
    pub magnitude: f32,
}

impl EntityRecord {
    pub fn new(id: impl Into<String>, category: CategoryId, value: f32, magnitude: f32) -> Self {
        Self {
            id: id.into(),
            category,
            value: if value.is_finite() { value } else { 0.0 },
            magnitude: if magnitude.is_finite() { magnitude.max(0.0) } else { 0.0 },
        }
    }
}

/// All records sharing one time index, ordered by descending magnitude then id.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotInput {
    pub time_index: usize,
    pub label: String,
    pub records: Vec<EntityRecord>,
}

impl SnapshotInput {
    pub fn new(time_index: usize, label: impl Into<String>, mut records: Vec<EntityRecord>) -> Self {
        sort_by_magnitude(&mut records, |r| (r.magnitude, r.id.as_str()));
        Self {
            time_index,
            label: label.into(),
            records,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// The full ordered list of snapshots plus the category set they draw from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Timeline {
    pub categories: CategorySet,
    pub snapshots: Vec<SnapshotInput>,
}

impl Timeline {
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Total record count across every snapshot.
    pub fn record_count(&self) -> usize {
        self.snapshots.iter().map(|s| s.records.len()).sum()
    }
}

/// A record with its resolved resting position in layout space (origin bottom-left, y up).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionedEntity {
    pub id: String,
    pub category: CategoryId,
    pub value: f32,
    pub magnitude: f32,
    pub radius: f32,
    pub x: f32,
    pub y: f32,
}

/// A finalized snapshot layout. Immutable once baked.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutSnapshot {
    pub time_index: usize,
    pub label: String,
    pub entities: Vec<PositionedEntity>,
}

impl LayoutSnapshot {
    pub fn get(&self, id: &str) -> Option<&PositionedEntity> {
        self.entities.iter().find(|e| e.id == id)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

/// Descending magnitude, ties broken by ascending id for a stable draw order.
pub(crate) fn sort_by_magnitude<T>(items: &mut [T], key: impl Fn(&T) -> (f32, &str)) {
    items.sort_by(|a, b| {
        let (ma, ia) = key(a);
        let (mb, ib) = key(b);
        mb.total_cmp(&ma).then_with(|| ia.cmp(ib))
    });
}
