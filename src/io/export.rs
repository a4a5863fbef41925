//! Headless bake: `--bake out.json` lays out every snapshot and writes the
//! resting positions without opening a window.

use serde::Serialize;
use std::path::Path;

use crate::core::config::SectorflowConfig;
use crate::core::model::{CategorySet, LayoutSnapshot, Timeline};
use crate::layout::bake_timeline;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportedSnapshot {
    pub time_index: usize,
    pub label: String,
    pub entities: Vec<ExportedEntity>,
}

#[derive(Serialize)]
pub struct ExportedEntity {
    pub id: String,
    pub category: String,
    pub value: f32,
    pub magnitude: f32,
    pub radius: f32,
    pub x: f32,
    pub y: f32,
}

pub fn export_snapshots(categories: &CategorySet, snapshots: &[LayoutSnapshot]) -> Vec<ExportedSnapshot> {
    snapshots
        .iter()
        .map(|s| ExportedSnapshot {
            time_index: s.time_index,
            label: s.label.clone(),
            entities: s
                .entities
                .iter()
                .map(|e| ExportedEntity {
                    id: e.id.clone(),
                    category: categories.name(e.category).unwrap_or_default().to_string(),
                    value: e.value,
                    magnitude: e.magnitude,
                    radius: e.radius,
                    x: e.x,
                    y: e.y,
                })
                .collect(),
        })
        .collect()
}

/// Bake `timeline` at the configured canvas size and write it to `path`.
/// Returns the number of snapshots written.
pub fn bake_to_path(timeline: &Timeline, config: &SectorflowConfig, path: &Path) -> Result<usize, String> {
    let baked = bake_timeline(timeline, config.canvas(), config);
    let out = export_snapshots(&timeline.categories, &baked.snapshots);
    let json = serde_json::to_string_pretty(&out).map_err(|e| e.to_string())?;
    std::fs::write(path, json).map_err(|e| e.to_string())?;
    Ok(out.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::{CategoryId, EntityRecord, SnapshotInput};

    #[test]
    fn bake_writes_named_categories() {
        let timeline = Timeline {
            categories: CategorySet::new(["Technology", "Energy"]),
            snapshots: vec![
                SnapshotInput::new(0, "Jan", vec![EntityRecord::new("XOM", CategoryId(1), 2.0, 10.0)]),
                SnapshotInput::new(1, "Feb", vec![]),
            ],
        };
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("baked.json");
        let written = bake_to_path(&timeline, &SectorflowConfig::default(), &path).unwrap();
        assert_eq!(written, 2);

        let json: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json[0]["timeIndex"], 0);
        assert_eq!(json[0]["label"], "Jan");
        assert_eq!(json[0]["entities"][0]["id"], "XOM");
        assert_eq!(json[0]["entities"][0]["category"], "Energy");
        assert!(json[0]["entities"][0]["x"].as_f64().is_some());
        assert_eq!(json[1]["entities"].as_array().map(Vec::len), Some(0));
    }

    #[test]
    fn bake_reports_unwritable_path() {
        let timeline = Timeline::default();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("no_such_dir").join("out.json");
        assert!(bake_to_path(&timeline, &SectorflowConfig::default(), &path).is_err());
    }
}
