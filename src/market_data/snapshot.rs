// =============================================================================
// JSON snapshot of exported symbol histories
// =============================================================================
//
// File layout (one entry per symbol):
//
//   {
//     "NVDA": {
//       "meta": { "last_updated": "2024-05-01 18:00:00", "longName": "NVIDIA Corporation" },
//       "data": [ { "date": "2024-04-30", "open": 1.0, ..., "volume": 123 }, ... ]
//     }
//   }
//
// Persistence uses the same tmp + rename pattern as the runtime config.
// =============================================================================

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::types::Bar;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SnapshotMeta {
    #[serde(default)]
    pub last_updated: Option<String>,
    #[serde(default, rename = "longName")]
    pub long_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotEntry {
    #[serde(default)]
    pub meta: SnapshotMeta,
    pub data: Vec<Bar>,
}

/// All exported symbols, keyed by ticker.
pub type Snapshot = BTreeMap<String, SnapshotEntry>;

/// Read a snapshot file. Each symbol's bars are re-sorted by date.
pub fn load_snapshot(path: impl AsRef<Path>) -> Result<Snapshot> {
    let path = path.as_ref();

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read snapshot from {}", path.display()))?;

    let mut snapshot: Snapshot = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse snapshot from {}", path.display()))?;

    for entry in snapshot.values_mut() {
        entry.data.sort_by_key(|b| b.date);
    }

    info!(
        path = %path.display(),
        symbols = snapshot.len(),
        "snapshot loaded"
    );
    Ok(snapshot)
}

/// One exported bar: prices rounded to cents, volume in whole shares.
#[derive(Debug, Clone, Serialize)]
pub struct ExportRow {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExportEntry {
    pub meta: SnapshotMeta,
    pub data: Vec<ExportRow>,
}

/// Snapshot file contents as written by [`save_snapshot`].
pub type ExportFile = BTreeMap<String, ExportEntry>;

/// Build an export entry stamped with the local time. A missing long name
/// falls back to the symbol itself.
pub fn export_entry(symbol: &str, long_name: Option<String>, bars: &[Bar]) -> ExportEntry {
    let data = bars
        .iter()
        .map(|b| ExportRow {
            date: b.date,
            open: round2(b.open),
            high: round2(b.high),
            low: round2(b.low),
            close: round2(b.close),
            volume: b.volume.max(0.0).trunc() as u64,
        })
        .collect();

    ExportEntry {
        meta: SnapshotMeta {
            last_updated: Some(Local::now().format("%Y-%m-%d %H:%M:%S").to_string()),
            long_name: Some(long_name.unwrap_or_else(|| symbol.to_string())),
        },
        data,
    }
}

/// Write `snapshot` to `path` atomically (write `.tmp`, then rename).
pub fn save_snapshot(path: impl AsRef<Path>, snapshot: &ExportFile) -> Result<()> {
    let path = path.as_ref();

    let content = serde_json::to_string(snapshot).context("failed to serialise snapshot")?;

    let tmp_path = path.with_extension("json.tmp");
    std::fs::write(&tmp_path, &content)
        .with_context(|| format!("failed to write tmp snapshot to {}", tmp_path.display()))?;
    std::fs::rename(&tmp_path, path)
        .with_context(|| format!("failed to rename tmp snapshot to {}", path.display()))?;

    info!(path = %path.display(), symbols = snapshot.len(), "snapshot saved (atomic)");
    Ok(())
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(day: u32, close: f64) -> Bar {
        Bar {
            date: NaiveDate::from_ymd_opt(2024, 3, day).unwrap(),
            open: close,
            high: close,
            low: close,
            close,
            volume: 1000.7,
        }
    }

    #[test]
    fn parses_export_format_and_sorts() {
        let json = r#"{
            "NVDA": {
                "meta": { "last_updated": "2024-03-05 10:00:00", "longName": "NVIDIA Corporation" },
                "data": [
                    { "date": "2024-03-04", "open": 2.0, "high": 2.0, "low": 2.0, "close": 2.0, "volume": 10 },
                    { "date": "2024-03-01", "open": 1.0, "high": 1.0, "low": 1.0, "close": 1.0, "volume": 5 }
                ]
            }
        }"#;
        let path = std::env::temp_dir().join(format!("snapshot_parse_{}.json", std::process::id()));
        std::fs::write(&path, json).unwrap();

        let snap = load_snapshot(&path).unwrap();
        let entry = &snap["NVDA"];
        assert_eq!(entry.meta.long_name.as_deref(), Some("NVIDIA Corporation"));
        assert_eq!(entry.data[0].date, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert!((entry.data[1].volume - 10.0).abs() < f64::EPSILON);

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn export_rounds_values() {
        let entry = export_entry("NVDA", None, &[bar(1, 12.3456)]);
        assert!((entry.data[0].close - 12.35).abs() < 1e-10);
        assert_eq!(entry.data[0].volume, 1000);
        assert!(entry.meta.last_updated.is_some());
    }

    #[test]
    fn export_json_has_integer_volume_and_long_name() {
        let mut b = bar(4, 481.675);
        b.volume = 41_125_400.7;
        let mut file = ExportFile::new();
        file.insert("NVDA".into(), export_entry("NVDA", None, &[b]));

        let json = serde_json::to_string(&file).unwrap();
        assert!(json.contains("\"volume\":41125400}"), "{json}");
        assert!(json.contains("\"longName\":\"NVDA\""), "{json}");
        assert!(json.contains("\"date\":\"2024-03-04\""), "{json}");
        assert!(!json.contains("null"), "{json}");
    }

    #[test]
    fn export_clamps_negative_volume() {
        let mut b = bar(1, 1.0);
        b.volume = -5.0;
        assert_eq!(export_entry("X", None, &[b]).data[0].volume, 0);
    }

    #[test]
    fn save_then_load() {
        let path = std::env::temp_dir().join(format!("snapshot_save_{}.json", std::process::id()));
        let mut snap = ExportFile::new();
        snap.insert(
            "AAPL".into(),
            export_entry("AAPL", Some("Apple Inc.".into()), &[bar(2, 1.0), bar(1, 2.0)]),
        );

        save_snapshot(&path, &snap).unwrap();
        let loaded = load_snapshot(&path).unwrap();
        assert_eq!(loaded["AAPL"].data.len(), 2);
        assert!(loaded["AAPL"].data[0].date < loaded["AAPL"].data[1].date);
        assert!((loaded["AAPL"].data[0].volume - 1000.0).abs() < f64::EPSILON);
        assert_eq!(loaded["AAPL"].meta.long_name.as_deref(), Some("Apple Inc."));

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn missing_file_is_error() {
        assert!(load_snapshot("/definitely/not/here.json").is_err());
    }
}
