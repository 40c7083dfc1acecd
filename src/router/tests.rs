//! Tests for Router module

use super::*;
use crate::config::{NoteBinding, RoutingConfig};
use crate::widgets::SliderId;
use proptest::prelude::*;

struct Rig {
    router: Router,
    store: ParameterStore,
    widgets: WidgetPanel,
}

impl Rig {
    fn new(morph_names: &[&str]) -> Self {
        let router = Router::from_config(&RoutingConfig::default(), 125).unwrap();
        let names: Vec<String> = morph_names.iter().map(|s| s.to_string()).collect();

        let mut store = ParameterStore::new();
        store.resize_morph_targets(names.len());
        let mut widgets = WidgetPanel::new();
        widgets.morph_registry_mut().register(&names);
        store.take_dirty();

        Self {
            router,
            store,
            widgets,
        }
    }

    /// No model loaded yet: the store has never been sized
    fn unloaded() -> Self {
        Self {
            router: Router::from_config(&RoutingConfig::default(), 125).unwrap(),
            store: ParameterStore::new(),
            widgets: WidgetPanel::new(),
        }
    }

    fn route(&mut self, input: impl Into<ControlInput>) -> RouteOutcome {
        let mut surfaces = Surfaces {
            store: &mut self.store,
            widgets: &mut self.widgets,
        };
        self.router.route(input, &mut surfaces)
    }

    fn cc(&mut self, cc: u8, value: u8) -> RouteOutcome {
        self.route(ChannelVoiceMessage::control_change(0, cc, value))
    }

    fn slider(&self, id: SliderId) -> f32 {
        self.widgets.slider(id).unwrap().value()
    }
}

#[test]
fn test_three_morph_targets_cc_112() {
    let mut rig = Rig::new(&["Horns", "Tail", "Wings"]);
    assert_eq!(rig.widgets.morph_registry().len(), 3);

    let outcome = rig.cc(112, 64);
    assert_eq!(
        outcome,
        RouteOutcome::Applied(ParameterUpdate::MorphWeight {
            index: 2,
            weight: 64.0 / 127.0
        })
    );
    assert!((rig.slider(SliderId::Morph(2)) - 0.504).abs() < 1e-3);
    assert_eq!(rig.widgets.slider(SliderId::Morph(2)).unwrap().refreshes(), 1);
    assert!(rig.store.dirty().morph);
}

#[test]
fn test_morph_cc_past_model_targets_is_ignored() {
    let mut rig = Rig::new(&["Horns", "Tail"]);
    let before = rig.store.clone();

    assert_eq!(rig.cc(114, 100), RouteOutcome::Ignored);
    assert_eq!(rig.store, before);
}

#[test]
fn test_hue_and_scale_mirror_widgets() {
    let mut rig = Rig::new(&[]);

    rig.cc(116, 127);
    assert_eq!(rig.store.hue(), 360.0);
    assert_eq!(rig.slider(SliderId::Color), 360.0);

    rig.cc(117, 0);
    assert_eq!(rig.store.scale_percent(), 50.0);
    assert_eq!(rig.store.scale(), 0.5);
    assert_eq!(rig.slider(SliderId::Size), 50.0);

    let dirty = rig.store.take_dirty();
    assert!(dirty.material && dirty.scale);
}

#[test]
fn test_non_cc_messages_are_ignored() {
    let mut rig = Rig::new(&["A"]);
    let before = rig.store.clone();

    assert_eq!(rig.route(ChannelVoiceMessage::decode(&[0xE0, 0x00, 0x40])), RouteOutcome::Ignored);
    assert_eq!(rig.route(ChannelVoiceMessage::decode(&[0xC0, 0x05])), RouteOutcome::Ignored);
    assert_eq!(rig.route(ChannelVoiceMessage::decode(&[0xF8])), RouteOutcome::Ignored);
    // Incomplete CC
    assert_eq!(rig.route(ChannelVoiceMessage::decode(&[0xB0, 116])), RouteOutcome::Ignored);
    assert_eq!(rig.store, before);
}

#[test]
fn test_cc_on_any_channel_routes() {
    let mut rig = Rig::new(&[]);
    rig.route(ChannelVoiceMessage::control_change(9, 116, 0x7F));
    assert_eq!(rig.store.hue(), 360.0);
}

#[test]
fn test_note_bindings() {
    let mut rig = Rig::new(&["A"]);

    assert_eq!(
        rig.route(ChannelVoiceMessage::note_on(0, 26, 100)),
        RouteOutcome::Pressed(ButtonAction::ToggleWireframe)
    );
    assert!(rig.store.wireframe());

    // Velocity 0 is a note off
    assert_eq!(rig.route(ChannelVoiceMessage::note_on(0, 26, 0)), RouteOutcome::Ignored);
    assert!(rig.store.wireframe());

    rig.route(ChannelVoiceMessage::note_on(0, 25, 1));
    assert_eq!(rig.store.spin_frames(), 125);

    assert_eq!(rig.route(ChannelVoiceMessage::note_on(0, 60, 100)), RouteOutcome::Ignored);
}

#[test]
fn test_custom_note_binding() {
    let config = RoutingConfig {
        notes: vec![NoteBinding {
            note: 60,
            action: ButtonAction::ToggleAutoRotate,
        }],
        ..RoutingConfig::default()
    };
    let router = Router::from_config(&config, 10).unwrap();
    assert_eq!(router.note_action(60), Some(ButtonAction::ToggleAutoRotate));
    assert_eq!(router.note_action(25), None);
}

#[test]
fn test_note_approve_snapshots_and_resets() {
    let mut rig = Rig::new(&["Horns", "Tail"]);
    rig.cc(111, 127);
    rig.cc(116, 64);

    let RouteOutcome::Approved(snapshot) = rig.route(ChannelVoiceMessage::note_on(0, 27, 90)) else {
        panic!("expected an approved snapshot");
    };
    assert_eq!(snapshot.morph_targets.get("Tail"), Some(&1.0));
    assert_eq!(snapshot.color, 181.0);

    assert_eq!(rig.store.morph_weights(), &[0.0, 0.0]);
    assert_eq!(rig.store.hue(), 0.0);
    assert_eq!(rig.slider(SliderId::Morph(1)), 0.0);
}

#[test]
fn test_widget_slider_writes_store_without_refresh() {
    let mut rig = Rig::new(&["A"]);

    let outcome = rig.route(WidgetEvent::Slider {
        id: SliderId::Size,
        value: 120.0,
    });
    assert_eq!(outcome, RouteOutcome::Applied(ParameterUpdate::ScalePercent(120.0)));
    assert_eq!(rig.store.scale_percent(), 120.0);
    // The widget is the source; no programmatic refresh
    assert_eq!(rig.widgets.slider(SliderId::Size).unwrap().refreshes(), 0);
    assert_eq!(rig.slider(SliderId::Size), 120.0);
}

#[test]
fn test_mirror_echo_is_suppressed() {
    let mut rig = Rig::new(&["A"]);
    rig.cc(116, 127);
    rig.store.take_dirty();

    // Host toolkit fires the value the router just pushed
    let outcome = rig.route(WidgetEvent::Slider {
        id: SliderId::Color,
        value: 360.0,
    });
    assert_eq!(outcome, RouteOutcome::EchoSuppressed);
    assert!(!rig.store.dirty().any());

    // A real drag goes through
    let outcome = rig.route(WidgetEvent::Slider {
        id: SliderId::Color,
        value: 300.0,
    });
    assert_eq!(outcome, RouteOutcome::Applied(ParameterUpdate::Hue(300.0)));
    assert_eq!(rig.store.hue(), 300.0);
}

#[test]
fn test_widget_morph_out_of_range() {
    let mut rig = Rig::new(&["A"]);
    let outcome = rig.route(WidgetEvent::Slider {
        id: SliderId::Morph(3),
        value: 0.5,
    });
    assert_eq!(outcome, RouteOutcome::Ignored);
}

#[test]
fn test_widget_values_are_clamped_to_slider_range() {
    let mut rig = Rig::new(&["Horns"]);

    let outcome = rig.route(WidgetEvent::Slider {
        id: SliderId::Morph(0),
        value: 5.0,
    });
    assert_eq!(
        outcome,
        RouteOutcome::Applied(ParameterUpdate::MorphWeight {
            index: 0,
            weight: 1.0
        })
    );
    assert_eq!(rig.store.morph_weight(0), Some(1.0));

    rig.route(WidgetEvent::Slider {
        id: SliderId::Color,
        value: 999.0,
    });
    assert_eq!(rig.store.hue(), 360.0);

    rig.route(WidgetEvent::Slider {
        id: SliderId::Size,
        value: 10.0,
    });
    assert_eq!(rig.store.scale_percent(), 50.0);
    assert_eq!(rig.slider(SliderId::Size), 50.0);
}

#[test]
fn test_non_finite_widget_value_is_ignored() {
    let mut rig = Rig::new(&["Horns"]);
    let before = rig.store.clone();

    for id in [SliderId::Color, SliderId::Size, SliderId::Morph(0)] {
        let outcome = rig.route(WidgetEvent::Slider { id, value: f32::NAN });
        assert_eq!(outcome, RouteOutcome::Ignored);
    }
    assert_eq!(
        rig.route(WidgetEvent::Slider {
            id: SliderId::Size,
            value: f32::NEG_INFINITY,
        }),
        RouteOutcome::Ignored
    );
    assert_eq!(rig.store, before);
    assert!(!rig.store.dirty().any());
}

#[test]
fn test_approve_before_model_load_is_ignored() {
    let mut rig = Rig::unloaded();
    rig.cc(116, 64);
    let hue = rig.store.hue();

    assert_eq!(
        rig.route(WidgetEvent::Button(ButtonAction::Approve)),
        RouteOutcome::Ignored
    );
    assert_eq!(
        rig.route(ChannelVoiceMessage::note_on(0, 27, 90)),
        RouteOutcome::Ignored
    );
    // Nothing was reset either
    assert_eq!(rig.store.hue(), hue);

    rig.store.resize_morph_targets(0);
    assert!(matches!(
        rig.route(WidgetEvent::Button(ButtonAction::Approve)),
        RouteOutcome::Approved(_)
    ));
}

#[test]
fn test_animation_toggle_without_clips() {
    let mut rig = Rig::new(&[]);
    assert_eq!(
        rig.route(WidgetEvent::Button(ButtonAction::ToggleAnimation)),
        RouteOutcome::Ignored
    );

    rig.store.set_animation_available(true);
    assert_eq!(
        rig.route(WidgetEvent::Button(ButtonAction::ToggleAnimation)),
        RouteOutcome::Pressed(ButtonAction::ToggleAnimation)
    );
    assert!(rig.store.animation().is_running());
}

#[test]
fn test_reset_button_mirrors_widgets() {
    let mut rig = Rig::new(&["A"]);
    rig.route(WidgetEvent::Slider {
        id: SliderId::Size,
        value: 140.0,
    });
    rig.route(WidgetEvent::Button(ButtonAction::Reset));

    assert_eq!(rig.store.scale_percent(), 100.0);
    assert_eq!(rig.slider(SliderId::Size), 100.0);
}

#[test]
fn test_last_write_wins_in_arrival_order() {
    let mut rig = Rig::new(&["A"]);
    rig.cc(110, 10);
    rig.cc(110, 127);
    assert_eq!(rig.store.morph_weight(0), Some(1.0));
}

proptest! {
    #[test]
    fn prop_morph_cc_writes_exact_weight(slot in 0u8..6, value in 0u8..=127) {
        let mut rig = Rig::new(&["a", "b", "c", "d", "e", "f"]);
        rig.cc(110 + slot, value);
        prop_assert_eq!(
            rig.store.morph_weight(usize::from(slot)),
            Some(f32::from(value) / 127.0)
        );
    }

    #[test]
    fn prop_unmapped_cc_leaves_store_unchanged(cc in 0u8..=127, value in 0u8..=127) {
        prop_assume!(!(110..=117).contains(&cc));
        let mut rig = Rig::new(&["a", "b"]);
        let before = rig.store.clone();
        prop_assert_eq!(rig.cc(cc, value), RouteOutcome::Ignored);
        prop_assert_eq!(rig.store, before);
    }
}
