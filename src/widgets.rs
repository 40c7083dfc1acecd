//! On-screen control widgets and the morph slider registry
//!
//! Widgets mirror ParameterStore scalars. `set_value` is the programmatic path
//! (router → widget) and never produces an input event; `accept_input` is the
//! user path (widget → router). A host whose toolkit re-fires input on
//! programmatic changes has that echo recognized and dropped.

use serde::{Deserialize, Serialize};

use crate::state::{ParameterStore, DEFAULT_SCALE_PERCENT};

/// Addressable slider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SliderId {
    /// Hue, 0-360
    Color,
    /// Scale percentage, 50-150
    Size,
    /// Morph target weight by model index, 0-1
    Morph(usize),
}

/// Button actions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ButtonAction {
    ToggleWireframe,
    /// Play on first press, toggle pause afterwards
    ToggleAnimation,
    ToggleAutoRotate,
    /// Rotate the model about Y for a short while
    Spin,
    Reset,
    /// Snapshot the current parameters, then reset
    Approve,
}

/// Input produced by a widget
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WidgetEvent {
    /// Slider moved; `value` is already in target units
    Slider { id: SliderId, value: f32 },
    Button(ButtonAction),
}

/// What a slider made of one user input
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SliderInput {
    /// Value to route, clamped into the slider range
    Accepted(f32),
    /// Host re-fired the last programmatic value
    Echo,
    /// NaN or infinite
    Invalid,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SliderWidget {
    label: String,
    min: f32,
    max: f32,
    step: f32,
    value: f32,
    /// Last programmatic value not yet echoed back by the host
    pending_echo: Option<f32>,
    /// Number of programmatic refreshes
    refreshes: u64,
}

impl SliderWidget {
    pub fn new(label: impl Into<String>, min: f32, max: f32, step: f32, value: f32) -> Self {
        Self {
            label: label.into(),
            min,
            max,
            step,
            value,
            pending_echo: None,
            refreshes: 0,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn range(&self) -> (f32, f32) {
        (self.min, self.max)
    }

    pub fn step(&self) -> f32 {
        self.step
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    pub fn refreshes(&self) -> u64 {
        self.refreshes
    }

    /// Programmatic update (store → widget). Does not emit input.
    pub fn set_value(&mut self, value: f32) {
        self.value = value;
        self.pending_echo = Some(value);
        self.refreshes += 1;
    }

    /// User input (widget → store). An echo of the last programmatic value
    /// and non-finite values must not be routed.
    pub fn accept_input(&mut self, value: f32) -> SliderInput {
        if !value.is_finite() {
            return SliderInput::Invalid;
        }
        if self.pending_echo.take() == Some(value) {
            return SliderInput::Echo;
        }
        self.value = value.clamp(self.min, self.max);
        SliderInput::Accepted(self.value)
    }
}

/// Registry record binding one morph slider to its weight index
#[derive(Debug, Clone, PartialEq)]
pub struct MorphBinding {
    pub index: usize,
    pub name: String,
    pub widget: SliderWidget,
}

/// Morph sliders, created from model metadata in declared order
#[derive(Debug, Clone, Default)]
pub struct SliderRegistry {
    bindings: Vec<MorphBinding>,
}

impl SliderRegistry {
    /// Create one slider per name. Duplicate names give duplicate sliders.
    /// Returns the number of sliders created.
    pub fn register(&mut self, names: &[String]) -> usize {
        self.register_labeled(names, &[])
    }

    /// Like [`register`](Self::register), showing `labels[i]` on slider `i`
    /// where one is given. Bindings keep the target name.
    pub fn register_labeled(&mut self, names: &[String], labels: &[String]) -> usize {
        for (i, name) in names.iter().enumerate() {
            let label = labels
                .get(i)
                .filter(|l| !l.trim().is_empty())
                .unwrap_or(name);
            let index = self.bindings.len();
            self.bindings.push(MorphBinding {
                index,
                name: name.clone(),
                widget: SliderWidget::new(label.clone(), 0.0, 1.0, 0.01, 0.0),
            });
        }
        names.len()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&MorphBinding> {
        self.bindings.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut MorphBinding> {
        self.bindings.get_mut(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &MorphBinding> {
        self.bindings.iter()
    }

    pub fn names(&self) -> Vec<String> {
        self.bindings.iter().map(|b| b.name.clone()).collect()
    }
}

/// Every widget on screen
#[derive(Debug, Clone)]
pub struct WidgetPanel {
    color: SliderWidget,
    size: SliderWidget,
    morph: SliderRegistry,
}

impl Default for WidgetPanel {
    fn default() -> Self {
        Self::new()
    }
}

impl WidgetPanel {
    pub fn new() -> Self {
        Self {
            color: SliderWidget::new("Color", 0.0, 360.0, 1.0, 0.0),
            size: SliderWidget::new("Size", 50.0, 150.0, 1.0, DEFAULT_SCALE_PERCENT),
            morph: SliderRegistry::default(),
        }
    }

    pub fn morph_registry(&self) -> &SliderRegistry {
        &self.morph
    }

    pub fn morph_registry_mut(&mut self) -> &mut SliderRegistry {
        &mut self.morph
    }

    pub fn slider(&self, id: SliderId) -> Option<&SliderWidget> {
        match id {
            SliderId::Color => Some(&self.color),
            SliderId::Size => Some(&self.size),
            SliderId::Morph(i) => self.morph.get(i).map(|b| &b.widget),
        }
    }

    pub fn slider_mut(&mut self, id: SliderId) -> Option<&mut SliderWidget> {
        match id {
            SliderId::Color => Some(&mut self.color),
            SliderId::Size => Some(&mut self.size),
            SliderId::Morph(i) => self.morph.get_mut(i).map(|b| &mut b.widget),
        }
    }

    /// Push every store value into its widget (after reset)
    pub fn mirror_all(&mut self, store: &ParameterStore) {
        self.color.set_value(store.hue());
        self.size.set_value(store.scale_percent());
        for binding in self.morph.bindings.iter_mut() {
            if let Some(weight) = store.morph_weight(binding.index) {
                binding.widget.set_value(weight);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_registry_keeps_declared_order_and_duplicates() {
        let mut registry = SliderRegistry::default();
        assert_eq!(registry.register(&names(&["Horns", "Tail", "Horns"])), 3);
        assert_eq!(registry.len(), 3);

        let indices: Vec<_> = registry.iter().map(|b| b.index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
        assert_eq!(registry.get(2).map(|b| b.name.as_str()), Some("Horns"));
        assert_eq!(registry.get(0).unwrap().widget.range(), (0.0, 1.0));
    }

    #[test]
    fn test_labels_override_display_only() {
        let mut registry = SliderRegistry::default();
        registry.register_labeled(&names(&["Key 1", "Key 2", "Key 3"]), &names(&["Cuernos", ""]));

        let labels: Vec<_> = registry.iter().map(|b| b.widget.label().to_string()).collect();
        assert_eq!(labels, vec!["Cuernos", "Key 2", "Key 3"]);
        assert_eq!(registry.names(), names(&["Key 1", "Key 2", "Key 3"]));
    }

    #[test]
    fn test_set_value_marks_echo() {
        let mut slider = SliderWidget::new("Color", 0.0, 360.0, 1.0, 0.0);
        slider.set_value(120.0);
        assert_eq!(slider.refreshes(), 1);

        // Host toolkit re-fires the programmatic value
        assert_eq!(slider.accept_input(120.0), SliderInput::Echo);
        // A real drag afterwards goes through
        assert_eq!(slider.accept_input(121.0), SliderInput::Accepted(121.0));
        assert_eq!(slider.value(), 121.0);
    }

    #[test]
    fn test_accept_input_different_value_clears_echo() {
        let mut slider = SliderWidget::new("Size", 50.0, 150.0, 1.0, 100.0);
        slider.set_value(80.0);
        assert_eq!(slider.accept_input(90.0), SliderInput::Accepted(90.0));
        assert_eq!(slider.accept_input(80.0), SliderInput::Accepted(80.0));
    }

    #[test]
    fn test_accept_input_clamps_to_range() {
        let mut slider = SliderWidget::new("Size", 50.0, 150.0, 1.0, 100.0);
        assert_eq!(slider.accept_input(400.0), SliderInput::Accepted(150.0));
        assert_eq!(slider.accept_input(-3.0), SliderInput::Accepted(50.0));
        assert_eq!(slider.value(), 50.0);
    }

    #[test]
    fn test_accept_input_rejects_non_finite() {
        let mut slider = SliderWidget::new("Tail", 0.0, 1.0, 0.01, 0.3);
        assert_eq!(slider.accept_input(f32::NAN), SliderInput::Invalid);
        assert_eq!(slider.accept_input(f32::INFINITY), SliderInput::Invalid);
        assert_eq!(slider.value(), 0.3);
    }

    #[test]
    fn test_panel_lookup() {
        let mut panel = WidgetPanel::new();
        panel.morph_registry_mut().register(&names(&["A"]));
        assert!(panel.slider(SliderId::Morph(0)).is_some());
        assert!(panel.slider(SliderId::Morph(1)).is_none());
        assert_eq!(panel.slider(SliderId::Size).unwrap().value(), 100.0);
    }

    #[test]
    fn test_mirror_all() {
        let mut panel = WidgetPanel::new();
        panel.morph_registry_mut().register(&names(&["A", "B"]));

        let mut store = ParameterStore::new();
        store.resize_morph_targets(2);
        store.set_morph_weight(1, 0.4);
        store.set_hue(33.0);

        panel.mirror_all(&store);
        assert_eq!(panel.slider(SliderId::Color).unwrap().value(), 33.0);
        assert_eq!(panel.slider(SliderId::Morph(1)).unwrap().value(), 0.4);
    }
}
