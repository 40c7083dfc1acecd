//! ParameterStore - mutable scene parameters with dirty tracking
//!
//! Single-threaded, single-consumer: any writer may write any field, and each
//! write marks the matching dirty flag for the render loop to pick up.

use rand::Rng;
use tracing::{debug, warn};

use super::snapshot::{Position, Snapshot};

/// Scale percentage at startup and after reset
pub const DEFAULT_SCALE_PERCENT: f32 = 100.0;

/// Approved models are scattered within this distance of the origin on X and Z
pub const PLACEMENT_SPREAD: f32 = 10.0;

/// Which scene aspects need re-applying on the next frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Dirty {
    /// Color or wireframe
    pub material: bool,
    pub scale: bool,
    pub morph: bool,
    pub animation: bool,
}

impl Dirty {
    pub fn any(&self) -> bool {
        self.material || self.scale || self.morph || self.animation
    }

    /// Everything dirty, used once the model is loaded
    pub fn all() -> Self {
        Self {
            material: true,
            scale: true,
            morph: true,
            animation: true,
        }
    }
}

/// Animation playback flags
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnimationState {
    /// The model has at least one clip
    pub available: bool,
    pub playing: bool,
    pub paused: bool,
}

impl AnimationState {
    /// The clock should advance this frame
    pub fn is_running(&self) -> bool {
        self.playing && !self.paused
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParameterStore {
    /// Hue in degrees; CC routing can produce exactly 360
    hue: f32,
    /// Scale in percent; the scene receives `scale_percent / 100`
    scale_percent: f32,
    wireframe: bool,
    morph_weights: Vec<f32>,
    morph_sized: bool,
    animation: AnimationState,
    auto_rotate: bool,
    /// Frames of Y spin still to apply
    spin_frames: u32,
    dirty: Dirty,
}

impl Default for ParameterStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ParameterStore {
    pub fn new() -> Self {
        Self {
            hue: 0.0,
            scale_percent: DEFAULT_SCALE_PERCENT,
            wireframe: false,
            morph_weights: Vec::new(),
            morph_sized: false,
            animation: AnimationState::default(),
            auto_rotate: false,
            spin_frames: 0,
            dirty: Dirty::default(),
        }
    }

    // ----- model load -----

    /// Size the morph weight table once model metadata is known.
    ///
    /// Returns `false` (store unchanged) if it was already sized.
    pub fn resize_morph_targets(&mut self, count: usize) -> bool {
        if self.morph_sized {
            warn!(
                "Ignoring morph target resize to {} (already sized to {})",
                count,
                self.morph_weights.len()
            );
            return false;
        }
        self.morph_weights = vec![0.0; count];
        self.morph_sized = true;
        self.dirty.morph = true;
        debug!("Morph weight table sized to {}", count);
        true
    }

    pub fn set_animation_available(&mut self, available: bool) {
        self.animation.available = available;
        self.dirty.animation = true;
    }

    // ----- color / scale / wireframe -----

    pub fn hue(&self) -> f32 {
        self.hue
    }

    pub fn set_hue(&mut self, hue: f32) {
        self.hue = hue;
        self.dirty.material = true;
    }

    pub fn scale_percent(&self) -> f32 {
        self.scale_percent
    }

    /// Uniform scale factor for the scene
    pub fn scale(&self) -> f32 {
        self.scale_percent / 100.0
    }

    pub fn set_scale_percent(&mut self, percent: f32) {
        self.scale_percent = percent;
        self.dirty.scale = true;
    }

    pub fn wireframe(&self) -> bool {
        self.wireframe
    }

    pub fn set_wireframe(&mut self, wireframe: bool) {
        self.wireframe = wireframe;
        self.dirty.material = true;
    }

    /// Flip wireframe mode and return the new value
    pub fn toggle_wireframe(&mut self) -> bool {
        self.set_wireframe(!self.wireframe);
        self.wireframe
    }

    // ----- morph targets -----

    pub fn morph_weights(&self) -> &[f32] {
        &self.morph_weights
    }

    pub fn morph_count(&self) -> usize {
        self.morph_weights.len()
    }

    /// Whether a model has sized the weight table, even to zero targets
    pub fn morph_sized(&self) -> bool {
        self.morph_sized
    }

    pub fn morph_weight(&self, index: usize) -> Option<f32> {
        self.morph_weights.get(index).copied()
    }

    /// Write one weight. Out-of-range indices are a no-op returning `false`.
    pub fn set_morph_weight(&mut self, index: usize, weight: f32) -> bool {
        match self.morph_weights.get_mut(index) {
            Some(slot) => {
                *slot = weight;
                self.dirty.morph = true;
                true
            }
            None => false,
        }
    }

    // ----- animation / camera -----

    pub fn animation(&self) -> AnimationState {
        self.animation
    }

    /// First call starts playback, later calls toggle pause.
    ///
    /// Returns `false` when the model has no animation.
    pub fn toggle_animation(&mut self) -> bool {
        if !self.animation.available {
            return false;
        }
        if !self.animation.playing {
            self.animation.playing = true;
        } else {
            self.animation.paused = !self.animation.paused;
        }
        self.dirty.animation = true;
        true
    }

    pub fn auto_rotate(&self) -> bool {
        self.auto_rotate
    }

    pub fn toggle_auto_rotate(&mut self) -> bool {
        self.auto_rotate = !self.auto_rotate;
        self.auto_rotate
    }

    /// Schedule a Y spin; a new request restarts the countdown
    pub fn start_spin(&mut self, frames: u32) {
        self.spin_frames = frames;
    }

    pub fn spin_frames(&self) -> u32 {
        self.spin_frames
    }

    /// Consume one spin frame; `true` if the model should rotate this frame
    pub fn take_spin_frame(&mut self) -> bool {
        if self.spin_frames == 0 {
            return false;
        }
        self.spin_frames -= 1;
        true
    }

    // ----- bulk -----

    /// Zero the morph weights, hue 0, scale 100%, wireframe off
    pub fn reset(&mut self) {
        self.morph_weights.iter_mut().for_each(|w| *w = 0.0);
        self.hue = 0.0;
        self.scale_percent = DEFAULT_SCALE_PERCENT;
        self.wireframe = false;
        self.dirty.morph = true;
        self.dirty.material = true;
        self.dirty.scale = true;
    }

    /// Capture the current parameters, keyed by morph target name, with a
    /// random placement on the ground plane
    pub fn snapshot(&self, morph_names: &[String]) -> Snapshot {
        let now = chrono::Local::now();
        let mut rng = rand::rng();
        Snapshot {
            id: now.timestamp_millis(),
            morph_targets: morph_names
                .iter()
                .cloned()
                .zip(self.morph_weights.iter().copied())
                .collect(),
            color: self.hue,
            scale: self.scale(),
            position: Position {
                x: rng.random_range(-PLACEMENT_SPREAD..PLACEMENT_SPREAD),
                y: 0.0,
                z: rng.random_range(-PLACEMENT_SPREAD..PLACEMENT_SPREAD),
            },
            timestamp: now.to_rfc3339(),
        }
    }

    pub fn dirty(&self) -> Dirty {
        self.dirty
    }

    /// Force a full scene sync on the next frame
    pub fn mark_all_dirty(&mut self) {
        self.dirty = Dirty::all();
    }

    /// Return and clear the dirty flags
    pub fn take_dirty(&mut self) -> Dirty {
        std::mem::take(&mut self.dirty)
    }
}
