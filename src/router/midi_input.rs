//! MIDI-originated routing
//!
//! Only Control Change drives parameters. Note On with velocity > 0 fires a
//! bound button action. Everything else is display-only.

use tracing::{debug, trace};

use super::{ParameterUpdate, RouteOutcome, Surfaces};
use crate::midi::ChannelVoiceMessage;
use crate::widgets::SliderId;

impl super::Router {
    pub(crate) fn route_midi(
        &self,
        message: &ChannelVoiceMessage,
        surfaces: &mut Surfaces<'_>,
    ) -> RouteOutcome {
        if let Some((cc, value)) = message.as_control_change() {
            return self.route_cc(cc, value, surfaces);
        }

        if let Some((note, velocity)) = message.as_note_on() {
            if velocity == 0 {
                return RouteOutcome::Ignored;
            }
            return match self.note_action(note) {
                Some(action) => {
                    debug!("🎹 Note {} → {:?}", note, action);
                    self.press(action, surfaces)
                }
                None => RouteOutcome::Ignored,
            };
        }

        trace!("Not routed: {}", message);
        RouteOutcome::Ignored
    }

    fn route_cc(&self, cc: u8, value: u8, surfaces: &mut Surfaces<'_>) -> RouteOutcome {
        let Some(update) = self.table.resolve(cc, value) else {
            trace!("CC {} unmapped", cc);
            return RouteOutcome::Ignored;
        };

        if !Self::write_store(surfaces.store, update) {
            // Morph index past the loaded model's targets
            trace!("CC {} target out of range: {:?}", cc, update);
            return RouteOutcome::Ignored;
        }

        Self::mirror(update, surfaces);
        trace!("CC {}={} → {:?}", cc, value, update);
        RouteOutcome::Applied(update)
    }

    /// Move the on-screen slider to a value written from MIDI
    fn mirror(update: ParameterUpdate, surfaces: &mut Surfaces<'_>) {
        let (id, value) = match update {
            ParameterUpdate::Hue(hue) => (SliderId::Color, hue),
            ParameterUpdate::ScalePercent(percent) => (SliderId::Size, percent),
            ParameterUpdate::MorphWeight { index, weight } => (SliderId::Morph(index), weight),
        };
        if let Some(widget) = surfaces.widgets.slider_mut(id) {
            widget.set_value(value);
        }
    }
}
