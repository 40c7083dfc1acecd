//! Configuration management for morphdeck
//!
//! Handles loading, parsing, and validation of the YAML configuration file.
//! Every section is optional; a missing file means all defaults.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tokio::fs;
use tracing::info;

use crate::router::RoutingTable;
use crate::scene::ModelMetadata;
use crate::widgets::ButtonAction;

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub midi: MidiConfig,
    #[serde(default)]
    pub render: RenderConfig,
    #[serde(default)]
    pub routing: RoutingConfig,
    /// Model metadata for hosts without a loader (the headless binary)
    #[serde(default)]
    pub model: ModelMetadata,
    #[serde(default)]
    pub snapshots: SnapshotConfig,
}

/// MIDI input configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MidiConfig {
    /// Client name announced to the MIDI backend
    #[serde(default = "default_client_name")]
    pub client_name: String,
    /// Only open inputs whose name contains this (case-insensitive)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_filter: Option<String>,
    /// Events drained per device per poll
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

/// Frame scheduling and motion constants
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RenderConfig {
    #[serde(default = "default_frame_interval_ms")]
    pub frame_interval_ms: u64,
    /// Fixed animation clock step per frame, independent of wall time
    #[serde(default = "default_animation_step_ms")]
    pub animation_step_ms: u64,
    #[serde(default = "default_auto_rotate_speed")]
    pub auto_rotate_speed: f32,
    /// Radians per frame while spinning
    #[serde(default = "default_spin_velocity")]
    pub spin_velocity: f32,
    #[serde(default = "default_spin_duration_ms")]
    pub spin_duration_ms: u64,
}

/// CC / note routing
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RoutingConfig {
    /// First CC of the morph span (`morph[cc - base]`)
    #[serde(default = "default_morph_base_cc")]
    pub morph_base_cc: u8,
    /// Number of morph CCs
    #[serde(default = "default_morph_slots")]
    pub morph_slots: u8,
    #[serde(default = "default_hue_cc")]
    pub hue_cc: u8,
    #[serde(default = "default_scale_cc")]
    pub scale_cc: u8,
    /// Note On triggers for button actions
    #[serde(default = "default_note_bindings")]
    pub notes: Vec<NoteBinding>,
}

/// Note On (velocity > 0) → button action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct NoteBinding {
    pub note: u8,
    pub action: ButtonAction,
}

/// Approved snapshot output
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SnapshotConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_snapshot_path")]
    pub path: String,
}

impl Default for MidiConfig {
    fn default() -> Self {
        Self {
            client_name: default_client_name(),
            device_filter: None,
            batch_size: default_batch_size(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            frame_interval_ms: default_frame_interval_ms(),
            animation_step_ms: default_animation_step_ms(),
            auto_rotate_speed: default_auto_rotate_speed(),
            spin_velocity: default_spin_velocity(),
            spin_duration_ms: default_spin_duration_ms(),
        }
    }
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            morph_base_cc: default_morph_base_cc(),
            morph_slots: default_morph_slots(),
            hue_cc: default_hue_cc(),
            scale_cc: default_scale_cc(),
            notes: default_note_bindings(),
        }
    }
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            path: default_snapshot_path(),
        }
    }
}

impl RenderConfig {
    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }

    pub fn animation_step(&self) -> Duration {
        Duration::from_millis(self.animation_step_ms)
    }

    /// Spin length in frames
    pub fn spin_frames(&self) -> u32 {
        (self.spin_duration_ms / self.animation_step_ms.max(1)) as u32
    }
}

impl MidiConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl AppConfig {
    /// Load configuration from file with validation
    pub async fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config file: {}", path))?;

        let config: AppConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("Failed to parse YAML config: {}", path))?;

        config.validate()?;

        Ok(config)
    }

    /// Load the file if it exists, otherwise use defaults
    pub async fn load_or_default(path: &str) -> Result<Self> {
        if Path::new(path).exists() {
            Self::load(path).await
        } else {
            info!("Config file {} not found, using defaults", path);
            Ok(Self::default())
        }
    }

    /// Save configuration to file
    pub async fn save(&self, path: &str) -> Result<()> {
        let yaml = serde_yaml::to_string(self).context("Failed to serialize config to YAML")?;

        fs::write(path, yaml)
            .await
            .with_context(|| format!("Failed to write config file: {}", path))?;

        Ok(())
    }

    /// Validate configuration for correctness and consistency
    pub fn validate(&self) -> Result<()> {
        if self.midi.client_name.is_empty() {
            anyhow::bail!("midi.client_name cannot be empty");
        }
        if self.midi.batch_size == 0 {
            anyhow::bail!("midi.batch_size must be at least 1");
        }
        if self.midi.poll_interval_ms == 0 {
            anyhow::bail!("midi.poll_interval_ms must be at least 1");
        }
        if self.render.frame_interval_ms == 0 {
            anyhow::bail!("render.frame_interval_ms must be at least 1");
        }
        if self.render.animation_step_ms == 0 {
            anyhow::bail!("render.animation_step_ms must be at least 1");
        }

        // Table construction checks CC ranges and overlaps
        RoutingTable::from_config(&self.routing).context("Invalid routing table")?;

        let mut seen = std::collections::HashSet::new();
        for binding in &self.routing.notes {
            if binding.note > 127 {
                anyhow::bail!("Note binding {} is invalid (must be 0-127)", binding.note);
            }
            if !seen.insert(binding.note) {
                anyhow::bail!("Note {} is bound more than once", binding.note);
            }
        }

        if self.snapshots.enabled && self.snapshots.path.is_empty() {
            anyhow::bail!("snapshots.path cannot be empty when snapshots are enabled");
        }

        Ok(())
    }
}

// Default value functions
fn default_client_name() -> String { "morphdeck".to_string() }
fn default_batch_size() -> usize { 1 }
fn default_poll_interval_ms() -> u64 { 1 }
fn default_frame_interval_ms() -> u64 { 16 }
fn default_animation_step_ms() -> u64 { 16 }
fn default_auto_rotate_speed() -> f32 { 2.0 }
fn default_spin_velocity() -> f32 { 0.02 }
fn default_spin_duration_ms() -> u64 { 2000 }
fn default_morph_base_cc() -> u8 { 110 }
fn default_morph_slots() -> u8 { 6 }
fn default_hue_cc() -> u8 { 116 }
fn default_scale_cc() -> u8 { 117 }
fn default_true() -> bool { true }
fn default_snapshot_path() -> String { "snapshots.jsonl".to_string() }
fn default_note_bindings() -> Vec<NoteBinding> {
    vec![
        NoteBinding { note: 25, action: ButtonAction::Spin },
        NoteBinding { note: 26, action: ButtonAction::ToggleWireframe },
        NoteBinding { note: 27, action: ButtonAction::Approve },
    ]
}
