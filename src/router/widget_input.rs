//! Widget-originated routing
//!
//! Slider values arrive in target units and go into the store clamped to the
//! slider range. A value equal to the one the router last pushed into that
//! slider is the host re-firing a programmatic change and is dropped, and so
//! is anything that is not a finite number.

use tracing::{debug, trace};

use super::{ParameterUpdate, RouteOutcome, Surfaces};
use crate::widgets::{SliderId, SliderInput, WidgetEvent};

impl super::Router {
    pub(crate) fn route_widget(&self, event: WidgetEvent, surfaces: &mut Surfaces<'_>) -> RouteOutcome {
        match event {
            WidgetEvent::Slider { id, value } => Self::route_slider(id, value, surfaces),
            WidgetEvent::Button(action) => self.press(action, surfaces),
        }
    }

    fn route_slider(id: SliderId, value: f32, surfaces: &mut Surfaces<'_>) -> RouteOutcome {
        if let SliderId::Morph(index) = id {
            if index >= surfaces.store.morph_count() {
                return RouteOutcome::Ignored;
            }
        }

        let Some(widget) = surfaces.widgets.slider_mut(id) else {
            return RouteOutcome::Ignored;
        };
        let value = match widget.accept_input(value) {
            SliderInput::Accepted(value) => value,
            SliderInput::Echo => {
                trace!("Echo from {:?} dropped ({})", id, value);
                return RouteOutcome::EchoSuppressed;
            }
            SliderInput::Invalid => {
                debug!("Non-finite value from {:?} dropped", id);
                return RouteOutcome::Ignored;
            }
        };

        let update = match id {
            SliderId::Color => ParameterUpdate::Hue(value),
            SliderId::Size => ParameterUpdate::ScalePercent(value),
            SliderId::Morph(index) => ParameterUpdate::MorphWeight {
                index,
                weight: value,
            },
        };
        if !Self::write_store(surfaces.store, update) {
            return RouteOutcome::Ignored;
        }
        RouteOutcome::Applied(update)
    }
}
