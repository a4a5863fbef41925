//! JSON dataset loading: file, stdin, or the native file dialog.
//!
//! Two shapes are accepted. Either `snapshots`, each with an optional
//! `timestamp` and an `entities` list, or a flat `records` list whose items
//! carry `timeIndex` and are grouped by it. Numeric fields are lenient:
//! numbers, numeric strings, `null` and absence are all accepted.

use bevy::prelude::*;
use serde::Deserialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::mpsc;

use crate::core::config::SectorflowConfig;
use crate::core::model::{CategorySet, EntityRecord, SnapshotInput, Timeline};
use crate::core::playback::PlaybackCommand;
use crate::core::resources::{ActiveDataset, StatusMessage};

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct RawDataset {
    #[serde(default)]
    categories: Option<Vec<String>>,
    #[serde(default)]
    snapshots: Option<Vec<RawSnapshot>>,
    #[serde(default)]
    records: Option<Vec<RawRecord>>,
}

#[derive(Deserialize)]
struct RawSnapshot {
    #[serde(default)]
    timestamp: Option<String>,
    #[serde(default)]
    entities: Vec<RawRecord>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawRecord {
    id: String,
    category: String,
    #[serde(default)]
    value: Value,
    #[serde(default)]
    magnitude: Value,
    #[serde(default)]
    time_index: Value,
    #[serde(default)]
    timestamp: Option<String>,
}

/// Numbers, numeric strings, `null` and absence; anything else is 0.
fn lenient_number(v: &Value) -> f32 {
    let parsed = match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.map(|n| n as f32).filter(|n| n.is_finite()).unwrap_or(0.0)
}

fn lenient_index(v: &Value) -> usize {
    let n = lenient_number(v);
    if n > 0.0 { n as usize } else { 0 }
}

/// Parse a dataset document. `fallback` supplies the category order when the
/// document does not declare one. Flat records are grouped by `timeIndex`
/// and the groups numbered densely in index order, so gaps and huge indices
/// never produce empty snapshots.
pub fn parse_timeline(json: &str, fallback: &CategorySet) -> Result<Timeline, String> {
    let raw: RawDataset = serde_json::from_str(json).map_err(|e| e.to_string())?;

    let categories = match raw.categories {
        Some(names) if !names.is_empty() => CategorySet::new(names),
        _ => fallback.clone(),
    };
    if categories.is_empty() {
        return Err("dataset declares no categories".to_string());
    }

    let groups: Vec<(Option<String>, Vec<RawRecord>)> = match (raw.snapshots, raw.records) {
        (Some(snapshots), _) => snapshots.into_iter().map(|s| (s.timestamp, s.entities)).collect(),
        (None, Some(records)) => {
            // `timeIndex` only orders the groups; they are renumbered 0..n.
            let mut by_index: BTreeMap<usize, Vec<RawRecord>> = BTreeMap::new();
            for r in records {
                by_index.entry(lenient_index(&r.time_index)).or_default().push(r);
            }
            by_index.into_values().map(|records| (None, records)).collect()
        }
        (None, None) => return Err("dataset has neither `snapshots` nor `records`".to_string()),
    };

    let mut dropped_unknown = 0usize;
    let snapshots = groups
        .into_iter()
        .enumerate()
        .map(|(t, (timestamp, raw_records))| {
            let label = timestamp
                .or_else(|| raw_records.iter().find_map(|r| r.timestamp.clone()))
                .unwrap_or_else(|| format!("t{t}"));
            let mut seen = HashSet::new();
            let mut records = Vec::with_capacity(raw_records.len());
            for r in raw_records {
                let Some(category) = categories.id_of(&r.category) else {
                    dropped_unknown += 1;
                    warn!("[DATASET] {}: unknown category {:?} at t={}, dropped", r.id, r.category, t);
                    continue;
                };
                if !seen.insert(r.id.clone()) {
                    warn!("[DATASET] duplicate id {} at t={}, keeping the first", r.id, t);
                    continue;
                }
                records.push(EntityRecord::new(
                    r.id,
                    category,
                    lenient_number(&r.value),
                    lenient_number(&r.magnitude),
                ));
            }
            SnapshotInput::new(t, label, records)
        })
        .collect();

    if dropped_unknown > 0 {
        warn!("[DATASET] dropped {} records with unknown categories", dropped_unknown);
    }
    Ok(Timeline { categories, snapshots })
}

/// Read and parse a dataset file.
pub fn load_timeline(path: &Path, config: &SectorflowConfig) -> Result<Timeline, String> {
    let contents = std::fs::read_to_string(path).map_err(|e| e.to_string())?;
    parse_timeline(&contents, &config.category_set())
}

/// Request to replace the active dataset with the file at the given path.
#[derive(Message, Debug, Clone)]
pub struct LoadDataset(pub PathBuf);

/// Install a freshly loaded timeline and rewind playback.
pub fn install_dataset(
    dataset: &mut ActiveDataset,
    timeline: Timeline,
    source: impl Into<String>,
    playback: &mut MessageWriter<PlaybackCommand>,
) {
    let snapshot_count = timeline.len();
    dataset.timeline = timeline;
    dataset.source = source.into();
    playback.write(PlaybackCommand::Reload { snapshot_count });
}

pub fn process_dataset_requests_system(
    mut requests: MessageReader<LoadDataset>,
    config: Res<SectorflowConfig>,
    mut dataset: ResMut<ActiveDataset>,
    mut status: ResMut<StatusMessage>,
    mut playback: MessageWriter<PlaybackCommand>,
) {
    for LoadDataset(path) in requests.read() {
        match load_timeline(path, &config) {
            Ok(timeline) => {
                info!(
                    "[DATASET] Loaded {} ({} snapshots, {} records)",
                    path.display(),
                    timeline.len(),
                    timeline.record_count()
                );
                let name = path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .unwrap_or("dataset")
                    .to_string();
                status.set(format!("Loaded {name}"));
                install_dataset(&mut dataset, timeline, path.display().to_string(), &mut playback);
            }
            Err(e) => {
                error!("[DATASET] {}: {}", path.display(), e);
                status.set(format!("Failed to load: {e}"));
            }
        }
    }
}

/// Pending file dialog result from background thread. Check each frame.
/// Wrapped in Mutex because Receiver is Send but not Sync.
#[derive(Resource, Default)]
pub struct PendingFileDialog(pub std::sync::Mutex<Option<mpsc::Receiver<PathBuf>>>);

impl PendingFileDialog {
    /// Open the native picker on a background thread. No-op if one is already open.
    pub fn open(&self) {
        let Ok(mut guard) = self.0.try_lock() else {
            return;
        };
        if guard.is_some() {
            return;
        }
        let (tx, rx) = mpsc::channel();
        std::thread::spawn(move || {
            if let Some(path) = rfd::FileDialog::new()
                .add_filter("dataset", &["json"])
                .pick_file()
            {
                let _ = tx.send(path);
            }
        });
        *guard = Some(rx);
    }
}

/// Forwards the picked path, if any, as a [`LoadDataset`] request.
pub fn process_pending_file_dialog_system(
    pending_dialog: Res<PendingFileDialog>,
    mut requests: MessageWriter<LoadDataset>,
) {
    let mut guard = match pending_dialog.0.try_lock() {
        Ok(g) => g,
        Err(_) => return,
    };
    let Some(rx) = guard.as_ref() else {
        return;
    };
    match rx.try_recv() {
        Ok(path) => {
            *guard = None;
            requests.write(LoadDataset(path));
        }
        Err(mpsc::TryRecvError::Empty) => {}
        Err(mpsc::TryRecvError::Disconnected) => {
            *guard = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::CategoryId;

    fn sectors() -> CategorySet {
        CategorySet::new(["Technology", "Energy"])
    }

    #[test]
    fn parses_snapshot_shape() {
        let json = r#"{
            "categories": ["Technology", "Energy"],
            "snapshots": [
                { "timestamp": "2024-01", "entities": [
                    { "id": "XOM", "category": "Energy", "value": -1.5, "magnitude": 4.5e11 },
                    { "id": "AAPL", "category": "Technology", "value": 3.2, "magnitude": 2.9e12 }
                ] },
                { "entities": [] }
            ]
        }"#;
        let tl = parse_timeline(json, &CategorySet::default()).unwrap();
        assert_eq!(tl.len(), 2);
        assert_eq!(tl.snapshots[0].label, "2024-01");
        assert_eq!(tl.snapshots[1].label, "t1");
        assert_eq!(tl.snapshots[0].records[0].id, "AAPL");
        assert_eq!(tl.snapshots[0].records[1].category, CategoryId(1));
        assert!(tl.snapshots[1].is_empty());
    }

    #[test]
    fn parses_flat_records_grouped_by_time_index() {
        let json = r#"{ "records": [
            { "id": "A", "category": "Energy", "value": 1, "magnitude": 5, "timeIndex": 2, "timestamp": "Mar" },
            { "id": "B", "category": "Technology", "value": 2, "magnitude": 3, "timeIndex": "0" }
        ] }"#;
        let tl = parse_timeline(json, &sectors()).unwrap();
        assert_eq!(tl.len(), 2);
        assert_eq!(tl.snapshots[0].records[0].id, "B");
        assert_eq!(tl.snapshots[0].label, "t0");
        assert_eq!(tl.snapshots[1].label, "Mar");
        assert_eq!(tl.snapshots[1].time_index, 1);
    }

    #[test]
    fn huge_time_indices_are_renumbered() {
        let json = r#"{ "records": [
            { "id": "A", "category": "Energy", "value": 1, "magnitude": 1, "timeIndex": 1e30 },
            { "id": "B", "category": "Energy", "value": 1, "magnitude": 1, "timeIndex": 4e9 },
            { "id": "C", "category": "Energy", "value": 1, "magnitude": 1, "timeIndex": -3 }
        ] }"#;
        let tl = parse_timeline(json, &sectors()).unwrap();
        let ids: Vec<_> = tl.snapshots.iter().map(|s| s.records[0].id.as_str()).collect();
        assert_eq!(ids, ["C", "B", "A"]);
        assert_eq!(tl.snapshots[2].time_index, 2);
    }

    #[test]
    fn lenient_numerics() {
        let json = r#"{ "snapshots": [ { "entities": [
            { "id": "A", "category": "Energy", "value": "2.5", "magnitude": null },
            { "id": "B", "category": "Energy", "value": "n/a", "magnitude": -10 },
            { "id": "C", "category": "Energy", "magnitude": true }
        ] } ] }"#;
        let tl = parse_timeline(json, &sectors()).unwrap();
        let recs = &tl.snapshots[0].records;
        let a = recs.iter().find(|r| r.id == "A").unwrap();
        let b = recs.iter().find(|r| r.id == "B").unwrap();
        let c = recs.iter().find(|r| r.id == "C").unwrap();
        assert_eq!((a.value, a.magnitude), (2.5, 0.0));
        assert_eq!((b.value, b.magnitude), (0.0, 0.0));
        assert_eq!((c.value, c.magnitude), (0.0, 0.0));
    }

    #[test]
    fn drops_unknown_categories_and_duplicate_ids() {
        let json = r#"{ "snapshots": [ { "entities": [
            { "id": "A", "category": "Energy", "value": 1, "magnitude": 1 },
            { "id": "A", "category": "Technology", "value": 9, "magnitude": 9 },
            { "id": "Z", "category": "Crypto", "value": 1, "magnitude": 1 }
        ] } ] }"#;
        let tl = parse_timeline(json, &sectors()).unwrap();
        let recs = &tl.snapshots[0].records;
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].category, CategoryId(1));
        assert_eq!(recs[0].value, 1.0);
    }

    #[test]
    fn rejects_malformed_documents() {
        assert!(parse_timeline("not json", &sectors()).is_err());
        assert!(parse_timeline("{}", &sectors()).is_err());
        assert!(parse_timeline(r#"{ "snapshots": [] }"#, &CategorySet::default()).is_err());
    }

    #[test]
    fn load_timeline_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");
        std::fs::write(
            &path,
            r#"{ "snapshots": [ { "timestamp": "Q1", "entities": [
                { "id": "XOM", "category": "Energy", "value": 1, "magnitude": 1 }
            ] } ] }"#,
        )
        .unwrap();
        let config = SectorflowConfig::default();
        let tl = load_timeline(&path, &config).unwrap();
        assert_eq!(tl.categories.len(), config.categories.len());
        assert_eq!(tl.snapshots[0].records[0].category, config.category_set().id_of("Energy").unwrap());

        assert!(load_timeline(&dir.path().join("missing.json"), &config).is_err());
    }
}
