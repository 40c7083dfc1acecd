//! Per-frame scene synchronization
//!
//! `Idle` until the first tick, then `Running` for the rest of the process.
//! Each tick advances controls and animation, applies whatever the store has
//! marked dirty, and renders exactly one frame.

use std::time::Duration;

use tracing::{info, warn};

use crate::config::RenderConfig;
use crate::scene::{hue_color, MaterialUpdate, SceneContext, SceneSink};
use crate::state::{Dirty, ParameterStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    Running,
}

#[derive(Debug)]
pub struct RenderLoop {
    state: LoopState,
    animation_step: Duration,
    auto_rotate_speed: f32,
    spin_velocity: f32,
    frames: u64,
    failed_frames: u64,
}

impl RenderLoop {
    pub fn new(config: &RenderConfig) -> Self {
        Self {
            state: LoopState::Idle,
            animation_step: config.animation_step(),
            auto_rotate_speed: config.auto_rotate_speed,
            spin_velocity: config.spin_velocity,
            frames: 0,
            failed_frames: 0,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    /// Frames rendered successfully
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn failed_frames(&self) -> u64 {
        self.failed_frames
    }

    /// Run one frame against the scene
    pub fn tick(&mut self, store: &mut ParameterStore, ctx: &SceneContext, scene: &mut dyn SceneSink) {
        if self.state == LoopState::Idle {
            info!("🖼️  Render loop running");
            self.state = LoopState::Running;
        }

        scene.update_controls(store.auto_rotate(), self.auto_rotate_speed);

        // Fixed nominal step, not wall time
        if store.animation().is_running() {
            scene.advance_animation(self.animation_step);
        }

        if store.take_spin_frame() {
            scene.rotate_y(ctx.main_mesh, self.spin_velocity);
        }

        let dirty = store.take_dirty();
        if dirty.any() {
            Self::apply(store, dirty, ctx, scene);
        }

        match scene.render_frame() {
            Ok(()) => self.frames += 1,
            Err(e) => {
                self.failed_frames += 1;
                warn!("⚠️  Frame render failed: {:#}", e);
            }
        }
    }

    fn apply(store: &ParameterStore, dirty: Dirty, ctx: &SceneContext, scene: &mut dyn SceneSink) {
        let mesh = ctx.main_mesh;

        if dirty.material {
            let color = hue_color(store.hue());
            for (slot, material) in ctx.materials.iter().enumerate() {
                let update = MaterialUpdate {
                    color: material.color.then_some(color),
                    wireframe: material.wireframe.then_some(store.wireframe()),
                };
                if update.color.is_some() || update.wireframe.is_some() {
                    scene.apply_material(mesh, slot, update);
                }
            }
        }

        if dirty.scale {
            scene.apply_scale(mesh, store.scale());
        }

        if dirty.morph {
            for (index, weight) in store.morph_weights().iter().enumerate() {
                scene.set_morph_weight(mesh, index, *weight);
            }
        }

        if dirty.animation && ctx.active_clip.is_some() {
            let animation = store.animation();
            scene.set_animation_playing(animation.playing);
            scene.set_animation_paused(animation.paused);
        }
    }
}
