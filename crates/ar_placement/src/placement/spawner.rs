//! Touch-driven spawner: taps and marker images create characters up to a population cap.
//!
//! Touches pass three gates before any raycast happens: the point must not be
//! over interactive UI, spawn mode must be on and the cap must not be reached.
//! Marker images use a separate channel that, by default, bypasses the mode and
//! count gates (see [`SpawnerConfig::marker_bypasses_gate`]).
//!
//! Every spawn goes through one creation path that bumps the counter, withdraws
//! surface availability when the cap is hit and notifies subscribers.
use crossbeam_channel::{Receiver, Sender};
use glam::Vec2;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::placement::events::{EventSink, PlacementEvent, RejectReason, SpawnTrigger};
use crate::surfaces::{
    ArContext, ArSurfaces, EntityHost, EntityId, Parent, Pose, TrackableFilter,
    TrackedImagesChanged,
};

/// Population cap used by [`SpawnerConfig::default`].
pub const DEFAULT_MAX_COUNT: usize = 5;

/// Configuration for a [`TouchSpawner`].
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq)]
pub struct SpawnerConfig {
    /// Maximum number of characters the spawner may ever create.
    pub max_count: usize,
    /// Spawn mode at construction time.
    pub initial_spawn_mode: bool,
    /// Trackables considered by touch raycasts.
    pub surface_filter: TrackableFilter,
    /// When set, marker images spawn regardless of spawn mode and cap.
    pub marker_bypasses_gate: bool,
}

impl Default for SpawnerConfig {
    fn default() -> Self {
        Self {
            max_count: DEFAULT_MAX_COUNT,
            initial_spawn_mode: true,
            surface_filter: TrackableFilter::PlaneWithinPolygon,
            marker_bypasses_gate: true,
        }
    }
}

impl SpawnerConfig {
    pub fn new(max_count: usize) -> Self {
        Self {
            max_count,
            ..Default::default()
        }
    }

    pub fn with_initial_spawn_mode(mut self, active: bool) -> Self {
        self.initial_spawn_mode = active;
        self
    }

    pub fn with_surface_filter(mut self, filter: TrackableFilter) -> Self {
        self.surface_filter = filter;
        self
    }

    pub fn with_marker_bypasses_gate(mut self, bypass: bool) -> Self {
        self.marker_bypasses_gate = bypass;
        self
    }

    /// Validates the configuration, returning an error if invalid.
    pub fn validate(&self) -> Result<()> {
        if self.max_count == 0 {
            return Err(Error::InvalidConfig("max_count must be > 0".into()));
        }
        Ok(())
    }
}

/// Gate flags and counter owned by a [`TouchSpawner`]. Read-only outside the spawner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpawnerState {
    spawn_mode_active: bool,
    cap_reached: bool,
    spawned_count: usize,
}

impl SpawnerState {
    fn new(spawn_mode_active: bool) -> Self {
        Self {
            spawn_mode_active,
            cap_reached: false,
            spawned_count: 0,
        }
    }

    pub fn spawn_mode_active(&self) -> bool {
        self.spawn_mode_active
    }

    pub fn cap_reached(&self) -> bool {
        self.cap_reached
    }

    pub fn spawned_count(&self) -> usize {
        self.spawned_count
    }
}

/// Result of a touch handed to [`TouchSpawner::handle_finger_down`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchOutcome {
    Spawned(EntityId),
    Rejected(RejectReason),
    Missed,
}

/// Notification sent to every live [`SpawnSubscription`] after a spawn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnOccurred {
    pub entity: EntityId,
    pub trigger: SpawnTrigger,
}

/// Scoped subscription to a spawner's spawn notifications.
///
/// Dropping it detaches the listener; the spawner prunes it on the next
/// notification. [`TouchSpawner::unsubscribe`] detaches immediately.
#[derive(Debug)]
pub struct SpawnSubscription {
    id: u64,
    rx: Receiver<SpawnOccurred>,
}

impl SpawnSubscription {
    /// Returns the next pending notification, if any.
    pub fn try_next(&self) -> Option<SpawnOccurred> {
        self.rx.try_recv().ok()
    }

    /// Takes all pending notifications.
    pub fn drain(&self) -> Vec<SpawnOccurred> {
        self.rx.try_iter().collect()
    }

    pub fn pending(&self) -> usize {
        self.rx.len()
    }
}

/// Creates characters from touches and marker images, enforcing a population cap.
#[derive(Debug)]
pub struct TouchSpawner {
    config: SpawnerConfig,
    state: SpawnerState,
    listeners: Vec<Listener>,
    next_subscription: u64,
}

#[derive(Debug)]
struct Listener {
    id: u64,
    tx: Sender<SpawnOccurred>,
    disarms: bool,
}

impl TouchSpawner {
    pub fn try_new(config: SpawnerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::new(config))
    }

    pub fn new(config: SpawnerConfig) -> Self {
        debug_assert!(config.max_count > 0, "max_count must be > 0");
        Self {
            state: SpawnerState::new(config.initial_spawn_mode),
            config,
            listeners: Vec::new(),
            next_subscription: 0,
        }
    }

    pub fn config(&self) -> &SpawnerConfig {
        &self.config
    }

    pub fn state(&self) -> SpawnerState {
        self.state
    }

    pub fn spawn_mode_active(&self) -> bool {
        self.state.spawn_mode_active
    }

    pub fn cap_reached(&self) -> bool {
        self.state.cap_reached
    }

    pub fn spawned_count(&self) -> usize {
        self.state.spawned_count
    }

    /// Registers a listener for spawn notifications.
    pub fn subscribe(&mut self) -> SpawnSubscription {
        self.register(false)
    }

    /// Registers a listener whose presence makes every spawn switch spawn
    /// mode off before the next touch or marker is handled.
    pub fn subscribe_disarming(&mut self) -> SpawnSubscription {
        self.register(true)
    }

    fn register(&mut self, disarms: bool) -> SpawnSubscription {
        let (tx, rx) = crossbeam_channel::unbounded();
        let id = self.next_subscription;
        self.next_subscription += 1;
        self.listeners.push(Listener { id, tx, disarms });
        SpawnSubscription { id, rx }
    }

    /// Detaches a listener immediately.
    pub fn unsubscribe(&mut self, subscription: SpawnSubscription) {
        self.listeners.retain(|listener| listener.id != subscription.id);
    }

    pub fn subscriber_count(&self) -> usize {
        self.listeners.len()
    }

    /// Handles a finger touching down at `point`.
    pub fn handle_finger_down(
        &mut self,
        point: Vec2,
        ctx: &mut ArContext<'_>,
        sink: &mut dyn EventSink,
    ) -> TouchOutcome {
        let reason = if ctx.ui.is_over_interactive_ui(point) {
            Some(RejectReason::OverUi)
        } else if !self.state.spawn_mode_active {
            Some(RejectReason::SpawnModeInactive)
        } else if self.state.cap_reached {
            Some(RejectReason::CapReached)
        } else {
            None
        };

        if let Some(reason) = reason {
            debug!("Touch at {:?} rejected: {:?}.", point, reason);
            sink.send(PlacementEvent::Rejected {
                point: Some(point),
                reason,
            });
            return TouchOutcome::Rejected(reason);
        }

        self.try_place_on_surface(point, ctx, sink)
    }

    /// Raycasts at `point` and spawns on the nearest hit.
    fn try_place_on_surface(
        &mut self,
        point: Vec2,
        ctx: &mut ArContext<'_>,
        sink: &mut dyn EventSink,
    ) -> TouchOutcome {
        let hits = ctx.surfaces.raycast(point, self.config.surface_filter);
        let Some(hit) = hits.first() else {
            info!("Character did not spawn: no surface under {:?}.", point);
            sink.send(PlacementEvent::RaycastMissed { point });
            return TouchOutcome::Missed;
        };

        let pose = Pose::from_position(hit.pose.position);
        let entity = self.spawn(
            Some(pose),
            SpawnTrigger::Touch { point },
            ctx.surfaces,
            ctx.entities,
            sink,
        );
        info!("Character spawned at {:?}.", pose.position);
        TouchOutcome::Spawned(entity)
    }

    /// Spawns one character per added marker, parented to the marker.
    ///
    /// Updated and removed markers are reported as [`PlacementEvent::MarkerIgnored`].
    pub fn handle_tracked_images(
        &mut self,
        batch: &TrackedImagesChanged,
        surfaces: &mut dyn ArSurfaces,
        entities: &mut dyn EntityHost,
        sink: &mut dyn EventSink,
    ) -> Vec<EntityId> {
        let mut spawned = Vec::with_capacity(batch.added.len());
        for &image in &batch.added {
            if !self.config.marker_bypasses_gate {
                let reason = if !self.state.spawn_mode_active {
                    Some(RejectReason::SpawnModeInactive)
                } else if self.state.cap_reached {
                    Some(RejectReason::CapReached)
                } else {
                    None
                };
                if let Some(reason) = reason {
                    debug!("Marker {:?} rejected: {:?}.", image, reason);
                    sink.send(PlacementEvent::Rejected {
                        point: None,
                        reason,
                    });
                    continue;
                }
            }

            let trigger = SpawnTrigger::Marker { image };
            let entity = self.spawn(None, trigger, surfaces, entities, sink);
            entities.set_parent(entity, Parent::TrackedImage(image));
            info!("Character spawned on marker {:?}.", image);
            spawned.push(entity);
        }

        for &image in batch.updated.iter().chain(batch.removed.iter()) {
            debug!("Marker {:?} changed; no placement action.", image);
            sink.send(PlacementEvent::MarkerIgnored { image });
        }

        spawned
    }

    /// Sets spawn mode and switches surface availability to match.
    pub fn set_spawn_mode(
        &mut self,
        active: bool,
        surfaces: &mut dyn ArSurfaces,
        sink: &mut dyn EventSink,
    ) {
        self.state.spawn_mode_active = active;
        debug!("Spawn mode {}.", if active { "on" } else { "off" });
        sink.send(PlacementEvent::SpawnModeChanged { active });
        set_surface_availability(surfaces, active, sink);
    }

    fn spawn(
        &mut self,
        pose: Option<Pose>,
        trigger: SpawnTrigger,
        surfaces: &mut dyn ArSurfaces,
        entities: &mut dyn EntityHost,
        sink: &mut dyn EventSink,
    ) -> EntityId {
        let entity = entities.instantiate(pose);

        let was_capped = self.state.cap_reached;
        self.state.spawned_count = (self.state.spawned_count + 1).min(self.config.max_count);
        sink.send(PlacementEvent::Spawned {
            entity,
            trigger,
            count: self.state.spawned_count,
        });

        if !was_capped && self.state.spawned_count == self.config.max_count {
            self.state.cap_reached = true;
            info!(
                "Maximum character count {} reached; withdrawing surfaces.",
                self.config.max_count
            );
            sink.send(PlacementEvent::CapReached {
                count: self.state.spawned_count,
            });
            set_surface_availability(surfaces, false, sink);
        }

        self.notify(SpawnOccurred { entity, trigger });
        if self.state.spawn_mode_active && self.listeners.iter().any(|l| l.disarms) {
            debug!("Spawn mode disarmed after spawning {:?}.", entity);
            self.set_spawn_mode(false, surfaces, sink);
        }
        entity
    }

    fn notify(&mut self, notice: SpawnOccurred) {
        self.listeners.retain(|listener| listener.tx.send(notice).is_ok());
    }
}

fn set_surface_availability(
    surfaces: &mut dyn ArSurfaces,
    available: bool,
    sink: &mut dyn EventSink,
) {
    surfaces.set_surfaces_active(available);
    surfaces.set_discovery_enabled(available);
    sink.send(PlacementEvent::SurfaceAvailabilityChanged { available });
}
