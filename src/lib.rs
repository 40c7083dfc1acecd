//! morphdeck - MIDI control surfaces for a live 3D model
//!
//! Hardware controllers and on-screen widgets drive morph target weights,
//! material hue, scale and a few toggles of a loaded model. All state lives
//! in one [`session::Session`] driven by a single cooperative loop.

pub mod config;
pub mod console;
pub mod error;
pub mod midi;
pub mod monitor;
pub mod multiplexer;
pub mod render_loop;
pub mod router;
pub mod scene;
pub mod session;
pub mod state;
pub mod transport;
pub mod widgets;

pub use config::AppConfig;
pub use error::{ControlError, ControlResult};
pub use midi::{ChannelVoiceMessage, MessageKind};
pub use router::{ControlInput, RouteOutcome, Router};
pub use scene::{ModelMetadata, SceneSink};
pub use session::Session;
pub use state::ParameterStore;
pub use transport::{MidiTransport, MidirTransport};
