//! Router module - maps control input onto scene parameters
//!
//! The Router is the single entry point for everything a performer does:
//! - Control Change messages resolved through the [`RoutingTable`]
//! - Note On messages bound to button actions
//! - Widget events (slider drags, button presses), with echo suppression
//!
//! Routing only writes the ParameterStore (which marks it dirty) and mirrors
//! values into widgets. Rendering is left to the render loop.

mod buttons;
mod midi_input;
mod table;
mod widget_input;

pub use table::{ParameterRef, RoutingEntry, RoutingTable};

#[cfg(test)]
mod tests;

use std::collections::HashMap;

use anyhow::Result;

use crate::config::RoutingConfig;
use crate::midi::ChannelVoiceMessage;
use crate::state::{ParameterStore, Snapshot};
use crate::widgets::{ButtonAction, WidgetEvent, WidgetPanel};

/// Anything the router accepts
#[derive(Debug, Clone, PartialEq)]
pub enum ControlInput {
    Midi(ChannelVoiceMessage),
    Widget(WidgetEvent),
}

impl From<ChannelVoiceMessage> for ControlInput {
    fn from(message: ChannelVoiceMessage) -> Self {
        ControlInput::Midi(message)
    }
}

impl From<WidgetEvent> for ControlInput {
    fn from(event: WidgetEvent) -> Self {
        ControlInput::Widget(event)
    }
}

/// A single parameter write, in target units
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParameterUpdate {
    /// Degrees, 0-360
    Hue(f32),
    /// Percent, 50-150
    ScalePercent(f32),
    MorphWeight { index: usize, weight: f32 },
}

/// Result of routing one input. Routing never fails.
#[derive(Debug, Clone, PartialEq)]
pub enum RouteOutcome {
    Applied(ParameterUpdate),
    Pressed(ButtonAction),
    /// No mapping, unbound note, or target out of range
    Ignored,
    /// Widget re-fired a value the router just wrote to it
    EchoSuppressed,
    /// Snapshot taken; the store has been reset
    Approved(Snapshot),
}

/// Mutable state a route may touch
pub struct Surfaces<'a> {
    pub store: &'a mut ParameterStore,
    pub widgets: &'a mut WidgetPanel,
}

/// Main router
#[derive(Debug, Clone)]
pub struct Router {
    pub(crate) table: RoutingTable,
    /// Note number → action for Note On with velocity > 0
    pub(crate) notes: HashMap<u8, ButtonAction>,
    /// Frames one spin lasts
    pub(crate) spin_frames: u32,
}

impl Router {
    /// Build a router from the routing section of the config
    pub fn from_config(config: &RoutingConfig, spin_frames: u32) -> Result<Self> {
        let table = RoutingTable::from_config(config)?;
        let notes = config.notes.iter().map(|b| (b.note, b.action)).collect();

        Ok(Self {
            table,
            notes,
            spin_frames,
        })
    }

    pub fn table(&self) -> &RoutingTable {
        &self.table
    }

    /// Action bound to a note, if any
    pub fn note_action(&self, note: u8) -> Option<ButtonAction> {
        self.notes.get(&note).copied()
    }

    /// Route one input against the store and widgets
    pub fn route(&self, input: impl Into<ControlInput>, surfaces: &mut Surfaces<'_>) -> RouteOutcome {
        match input.into() {
            ControlInput::Midi(message) => self.route_midi(&message, surfaces),
            ControlInput::Widget(event) => self.route_widget(event, surfaces),
        }
    }

    /// Write one update into the store. `false` if the target does not exist.
    pub(crate) fn write_store(store: &mut ParameterStore, update: ParameterUpdate) -> bool {
        match update {
            ParameterUpdate::Hue(hue) => {
                store.set_hue(hue);
                true
            }
            ParameterUpdate::ScalePercent(percent) => {
                store.set_scale_percent(percent);
                true
            }
            ParameterUpdate::MorphWeight { index, weight } => store.set_morph_weight(index, weight),
        }
    }
}
