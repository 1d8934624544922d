//! Event types and sinks for observing placement decisions.
//!
//! Every state transition of [`crate::placement::spawner::TouchSpawner`] and
//! [`crate::placement::single_slot::SingleSlotController`] is reported as a
//! [`PlacementEvent`] to the [`EventSink`] passed into the operation. Pass `&mut ()`
//! to ignore events.
use glam::Vec2;

use crate::placement::single_slot::Guidance;
use crate::surfaces::{AnchorId, EntityId, Pose, TrackedImageId};

/// Why a placement request was dropped without a raycast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// The touch landed on an interactive UI element.
    OverUi,
    /// Spawn mode is currently off.
    SpawnModeInactive,
    /// The population cap has been reached.
    CapReached,
    /// The touch is not in its finger-lift phase.
    NotReleased,
    /// The slot is taken and repositioning is disabled.
    RepositionDisabled,
}

/// What caused a spawn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SpawnTrigger {
    /// A tap on a detected surface at this screen point.
    Touch { point: Vec2 },
    /// A newly recognized marker image.
    Marker { image: TrackedImageId },
}

/// Describes events emitted by placement operations.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq)]
pub enum PlacementEvent {
    /// A request was dropped by the UI, mode or count gate.
    Rejected {
        point: Option<Vec2>,
        reason: RejectReason,
    },

    /// A raycast found no surface under the point.
    RaycastMissed { point: Vec2 },

    /// The touch spawner created an entity.
    Spawned {
        entity: EntityId,
        trigger: SpawnTrigger,
        /// Population counter after the spawn.
        count: usize,
    },

    /// The population counter reached the configured maximum.
    CapReached { count: usize },

    /// Spawn mode was switched.
    SpawnModeChanged { active: bool },

    /// Surface discovery and surface activation were switched together.
    SurfaceAvailabilityChanged { available: bool },

    /// A marker change that placement does not act on.
    MarkerIgnored { image: TrackedImageId },

    /// The single-slot controller placed its entity.
    Placed {
        entity: EntityId,
        pose: Pose,
        anchor: Option<AnchorId>,
    },

    /// The single-slot controller moved its entity.
    Repositioned { entity: EntityId, pose: Pose },

    /// The single-slot controller destroyed its entity.
    Removed { entity: EntityId },

    /// The placement indicator changed visibility or pose.
    IndicatorChanged { visible: bool, pose: Option<Pose> },

    /// The guidance text state changed.
    GuidanceChanged { guidance: Guidance },
}

/// A generic event sink that accepts [`PlacementEvent`]s.
pub trait EventSink {
    fn send(&mut self, event: PlacementEvent);
}

/// A no-op event sink.
impl EventSink for () {
    #[inline]
    fn send(&mut self, _event: PlacementEvent) {}
}

/// An event sink that forwards to a user-provided closure.
pub struct FnSink<F>
where
    F: FnMut(PlacementEvent),
{
    f: F,
}

impl<F> FnSink<F>
where
    F: FnMut(PlacementEvent),
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> EventSink for FnSink<F>
where
    F: FnMut(PlacementEvent),
{
    #[inline]
    fn send(&mut self, event: PlacementEvent) {
        (self.f)(event);
    }
}

/// An event sink that collects all events in a `Vec`.
#[derive(Default)]
pub struct VecSink {
    events: Vec<PlacementEvent>,
}

impl VecSink {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn into_inner(self) -> Vec<PlacementEvent> {
        self.events
    }

    pub fn as_slice(&self) -> &[PlacementEvent] {
        &self.events
    }

    /// Removes and returns all collected events.
    pub fn drain(&mut self) -> std::vec::Drain<'_, PlacementEvent> {
        self.events.drain(..)
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl EventSink for VecSink {
    #[inline]
    fn send(&mut self, event: PlacementEvent) {
        self.events.push(event);
    }
}
