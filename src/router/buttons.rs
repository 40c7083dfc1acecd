//! Button actions, shared by widget presses and bound Note On messages

use tracing::{debug, info};

use super::{RouteOutcome, Surfaces};
use crate::widgets::ButtonAction;

impl super::Router {
    pub(crate) fn press(&self, action: ButtonAction, surfaces: &mut Surfaces<'_>) -> RouteOutcome {
        let store = &mut *surfaces.store;

        match action {
            ButtonAction::ToggleWireframe => {
                let on = store.toggle_wireframe();
                debug!("Wireframe {}", if on { "on" } else { "off" });
            }
            ButtonAction::ToggleAnimation => {
                if !store.toggle_animation() {
                    debug!("Model has no animation, toggle ignored");
                    return RouteOutcome::Ignored;
                }
            }
            ButtonAction::ToggleAutoRotate => {
                let on = store.toggle_auto_rotate();
                debug!("Auto-rotate {}", if on { "on" } else { "off" });
            }
            ButtonAction::Spin => {
                store.start_spin(self.spin_frames);
            }
            ButtonAction::Reset => {
                store.reset();
                surfaces.widgets.mirror_all(store);
                info!("🔄 Parameters reset");
            }
            ButtonAction::Approve => {
                if !store.morph_sized() {
                    debug!("No model loaded, approve ignored");
                    return RouteOutcome::Ignored;
                }
                let names = surfaces.widgets.morph_registry().names();
                let snapshot = store.snapshot(&names);
                store.reset();
                surfaces.widgets.mirror_all(store);
                info!("✅ Approved snapshot {}", snapshot.id);
                return RouteOutcome::Approved(snapshot);
            }
        }

        RouteOutcome::Pressed(action)
    }
}
