//! Scene seam
//!
//! The 3D runtime is an external collaborator reached through [`SceneSink`].
//! Model metadata arrives once at load time and is resolved into a
//! [`SceneContext`] with capability-tagged material slots.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// Saturation used for hue-driven material color
pub const MATERIAL_SATURATION: f32 = 0.7;
/// Lightness used for hue-driven material color
pub const MATERIAL_LIGHTNESS: f32 = 0.5;

/// Linear RGB, components in 0..=1
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

/// HSL → RGB, all inputs in 0..=1 (hue wraps)
pub fn hsl_to_rgb(h: f32, s: f32, l: f32) -> Rgb {
    let h = h.rem_euclid(1.0);
    if s == 0.0 {
        return Rgb { r: l, g: l, b: l };
    }

    let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0 * l - q;

    fn channel(p: f32, q: f32, t: f32) -> f32 {
        let t = t.rem_euclid(1.0);
        if t < 1.0 / 6.0 {
            p + (q - p) * 6.0 * t
        } else if t < 0.5 {
            q
        } else if t < 2.0 / 3.0 {
            p + (q - p) * 6.0 * (2.0 / 3.0 - t)
        } else {
            p
        }
    }

    Rgb {
        r: channel(p, q, h + 1.0 / 3.0),
        g: channel(p, q, h),
        b: channel(p, q, h - 1.0 / 3.0),
    }
}

/// Material color for a hue in degrees
pub fn hue_color(hue_degrees: f32) -> Rgb {
    hsl_to_rgb(hue_degrees / 360.0, MATERIAL_SATURATION, MATERIAL_LIGHTNESS)
}

/// Material families reported by the loader
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaterialKind {
    Standard,
    Physical,
    Basic,
    Lambert,
    Phong,
    Toon,
    /// Normal-map visualization: no color
    Normal,
    /// Depth visualization: no color
    Depth,
    /// Point sprites: color, no wireframe
    Points,
}

impl MaterialKind {
    pub fn has_color(&self) -> bool {
        !matches!(self, MaterialKind::Normal | MaterialKind::Depth)
    }

    pub fn has_wireframe(&self) -> bool {
        !matches!(self, MaterialKind::Points)
    }
}

/// Material with capabilities resolved at load time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaterialSlot {
    pub kind: MaterialKind,
    pub color: bool,
    pub wireframe: bool,
}

impl From<MaterialKind> for MaterialSlot {
    fn from(kind: MaterialKind) -> Self {
        Self {
            kind,
            color: kind.has_color(),
            wireframe: kind.has_wireframe(),
        }
    }
}

/// Fields to set on one material; `None` means "not supported, leave alone"
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaterialUpdate {
    pub color: Option<Rgb>,
    pub wireframe: Option<bool>,
}

/// What the loader reports when a model finishes loading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    #[serde(default = "default_model_name")]
    pub name: String,
    #[serde(default)]
    pub morph_target_names: Vec<String>,
    /// Display labels for the morph sliders, by index. Missing or empty
    /// entries fall back to the target name.
    #[serde(default)]
    pub morph_labels: Vec<String>,
    #[serde(default)]
    pub has_animations: bool,
    #[serde(default)]
    pub animation_clips: Vec<String>,
    /// Materials of the main mesh, in slot order
    #[serde(default = "default_materials")]
    pub materials: Vec<MaterialKind>,
}

impl Default for ModelMetadata {
    fn default() -> Self {
        Self {
            name: default_model_name(),
            morph_target_names: Vec::new(),
            morph_labels: Vec::new(),
            has_animations: false,
            animation_clips: Vec::new(),
            materials: default_materials(),
        }
    }
}

fn default_model_name() -> String {
    "modelo.glb".to_string()
}

fn default_materials() -> Vec<MaterialKind> {
    vec![MaterialKind::Standard]
}

/// Identifies a mesh in the external scene graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MeshId(pub usize);

/// Loaded model, as seen by the render loop
#[derive(Debug, Clone, PartialEq)]
pub struct SceneContext {
    pub main_mesh: MeshId,
    pub materials: Vec<MaterialSlot>,
    /// First clip, if the model is animated
    pub active_clip: Option<String>,
}

impl SceneContext {
    pub fn from_metadata(metadata: &ModelMetadata) -> Self {
        let active_clip = if metadata.has_animations {
            metadata
                .animation_clips
                .first()
                .cloned()
                .or_else(|| Some("clip0".to_string()))
        } else {
            None
        };

        Self {
            main_mesh: MeshId(0),
            materials: metadata.materials.iter().copied().map(MaterialSlot::from).collect(),
            active_clip,
        }
    }
}

/// Consumer interface of the external 3D runtime
pub trait SceneSink {
    /// Advance orbit controls
    fn update_controls(&mut self, auto_rotate: bool, auto_rotate_speed: f32);
    fn apply_material(&mut self, mesh: MeshId, slot: usize, update: MaterialUpdate);
    fn apply_scale(&mut self, mesh: MeshId, scale: f32);
    fn set_morph_weight(&mut self, mesh: MeshId, index: usize, weight: f32);
    fn set_animation_playing(&mut self, playing: bool);
    fn set_animation_paused(&mut self, paused: bool);
    fn advance_animation(&mut self, dt: Duration);
    fn rotate_y(&mut self, mesh: MeshId, radians: f32);
    fn render_frame(&mut self) -> anyhow::Result<()>;
}

/// Headless scene host that logs every call
#[derive(Debug, Default)]
pub struct LogScene {
    frames: u64,
    animation_time: Duration,
    rotation_y: f32,
}

impl LogScene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl SceneSink for LogScene {
    fn update_controls(&mut self, auto_rotate: bool, auto_rotate_speed: f32) {
        if auto_rotate {
            trace!("orbit auto-rotate at {}", auto_rotate_speed);
        }
    }

    fn apply_material(&mut self, mesh: MeshId, slot: usize, update: MaterialUpdate) {
        debug!("🎨 mesh {} material {} → {:?}", mesh.0, slot, update);
    }

    fn apply_scale(&mut self, mesh: MeshId, scale: f32) {
        debug!("📏 mesh {} scale → {:.2}", mesh.0, scale);
    }

    fn set_morph_weight(&mut self, mesh: MeshId, index: usize, weight: f32) {
        debug!("🧬 mesh {} morph[{}] → {:.3}", mesh.0, index, weight);
    }

    fn set_animation_playing(&mut self, playing: bool) {
        debug!("▶️  animation playing: {}", playing);
    }

    fn set_animation_paused(&mut self, paused: bool) {
        debug!("⏸️  animation paused: {}", paused);
    }

    fn advance_animation(&mut self, dt: Duration) {
        self.animation_time += dt;
    }

    fn rotate_y(&mut self, mesh: MeshId, radians: f32) {
        self.rotation_y += radians;
        trace!("mesh {} rotation.y = {:.3}", mesh.0, self.rotation_y);
    }

    fn render_frame(&mut self) -> anyhow::Result<()> {
        self.frames += 1;
        trace!(
            "frame {} (animation t={:.3}s)",
            self.frames,
            self.animation_time.as_secs_f32()
        );
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Rgb, b: Rgb) -> bool {
        (a.r - b.r).abs() < 1e-4 && (a.g - b.g).abs() < 1e-4 && (a.b - b.b).abs() < 1e-4
    }

    #[test]
    fn test_primary_hues() {
        let red = hsl_to_rgb(0.0, 1.0, 0.5);
        assert!(close(red, Rgb { r: 1.0, g: 0.0, b: 0.0 }));

        let green = hsl_to_rgb(1.0 / 3.0, 1.0, 0.5);
        assert!(close(green, Rgb { r: 0.0, g: 1.0, b: 0.0 }));

        let grey = hsl_to_rgb(0.4, 0.0, 0.25);
        assert!(close(grey, Rgb { r: 0.25, g: 0.25, b: 0.25 }));
    }

    #[test]
    fn test_hue_360_wraps_to_red() {
        assert!(close(hue_color(360.0), hue_color(0.0)));
        let c = hue_color(0.0);
        assert!((c.r - 0.85).abs() < 1e-4);
        assert!((c.g - 0.15).abs() < 1e-4);
    }

    #[test]
    fn test_material_capabilities() {
        let normal = MaterialSlot::from(MaterialKind::Normal);
        assert!(!normal.color);
        assert!(normal.wireframe);

        let points = MaterialSlot::from(MaterialKind::Points);
        assert!(points.color);
        assert!(!points.wireframe);
    }

    #[test]
    fn test_context_from_metadata() {
        let metadata = ModelMetadata {
            has_animations: true,
            animation_clips: vec!["Idle".to_string(), "Walk".to_string()],
            materials: vec![MaterialKind::Standard, MaterialKind::Depth],
            ..ModelMetadata::default()
        };
        let ctx = SceneContext::from_metadata(&metadata);
        assert_eq!(ctx.active_clip.as_deref(), Some("Idle"));
        assert_eq!(ctx.materials.len(), 2);
        assert!(!ctx.materials[1].color);

        let still = SceneContext::from_metadata(&ModelMetadata::default());
        assert_eq!(still.active_clip, None);
    }
}
