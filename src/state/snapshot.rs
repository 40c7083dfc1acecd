//! Approved parameter snapshots, appended as JSON lines

use std::collections::BTreeMap;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Where an approved model is placed in the scene, on the ground plane
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

/// One approved parameter set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    /// Milliseconds since epoch at capture time
    pub id: i64,
    /// Morph weight by target name
    pub morph_targets: BTreeMap<String, f32>,
    /// Hue in degrees
    pub color: f32,
    /// Scale factor (percentage / 100)
    pub scale: f32,
    /// Missing in files written before placement was recorded
    #[serde(default)]
    pub position: Position,
    /// RFC 3339 local time
    pub timestamp: String,
}

/// Append-only snapshot file
#[derive(Debug, Clone)]
pub struct SnapshotLog {
    path: PathBuf,
}

impl SnapshotLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one snapshot as a single JSON line
    pub fn append(&self, snapshot: &Snapshot) -> Result<()> {
        let line = serde_json::to_string(snapshot).context("Failed to serialize snapshot")?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open snapshot file: {}", self.path.display()))?;
        writeln!(file, "{}", line)
            .with_context(|| format!("Failed to write snapshot file: {}", self.path.display()))?;

        info!(
            "📸 Snapshot {} saved to {}",
            snapshot.id,
            self.path.display()
        );
        Ok(())
    }

    /// Read every snapshot in the file, oldest first
    pub fn read_all(&self) -> Result<Vec<Snapshot>> {
        let contents = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read snapshot file: {}", self.path.display()))?;
        contents
            .lines()
            .filter(|l| !l.trim().is_empty())
            .map(|l| serde_json::from_str(l).context("Failed to parse snapshot line"))
            .collect()
    }
}
