#![forbid(unsafe_code)]
//! ar_placement: gate, raycast and place characters on AR-tracked surfaces.
//!
//! Modules:
//! - surfaces: poses, surface hits and the collaborator traits an AR backend implements
//! - placement: the touch-driven spawner, the single-slot controller and the spawn-mode gate
//! - sim: an in-memory AR session and entity ledger for tests and headless runs
//!
//! All placement logic is synchronous and engine-agnostic. Engine integrations
//! implement [`surfaces::ArSurfaces`], [`surfaces::EntityHost`] and
//! [`surfaces::UiHitTest`] and pass them in through [`surfaces::ArContext`].
pub mod error;
pub mod placement;
pub mod sim;
pub mod surfaces;

/// Convenient re-exports for common types. Import with `use ar_placement::prelude::*;`.
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::placement::events::{
        EventSink, FnSink, PlacementEvent, RejectReason, SpawnTrigger, VecSink,
    };
    pub use crate::placement::gate::SpawnModeGate;
    pub use crate::placement::single_slot::{
        Guidance, GuidanceText, PlacementConfig, PlacementIndicator, PlacementOutcome,
        PlacementState, SingleSlotController,
    };
    pub use crate::placement::spawner::{
        SpawnOccurred, SpawnSubscription, SpawnerConfig, SpawnerState, TouchOutcome,
        TouchSpawner, DEFAULT_MAX_COUNT,
    };
    pub use crate::sim::{SimCamera, SimEntities, SimEntity, SimPlane, SimulatedSession};
    pub use crate::surfaces::input::{ScreenRect, Touch, TouchPhase};
    pub use crate::surfaces::{
        Anchor, AnchorId, ArContext, ArSurfaces, EntityHost, EntityId, Parent, Pose, SurfaceHit,
        SurfaceId, TrackableFilter, TrackedImageId, TrackedImagesChanged, UiHitTest,
    };
}
