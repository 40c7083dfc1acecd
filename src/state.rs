//! Scene parameter state
//!
//! The [`ParameterStore`] holds every live scene parameter written by the
//! router and read by the render loop. Approved parameter sets are appended to
//! a JSON-lines [`SnapshotLog`].

mod snapshot;
mod store;

pub use snapshot::{Position, Snapshot, SnapshotLog};
pub use store::{AnimationState, Dirty, ParameterStore, DEFAULT_SCALE_PERCENT, PLACEMENT_SPREAD};
