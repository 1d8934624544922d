//! One-shot arming of the touch spawner from a binary UI toggle.
use tracing::debug;

use crate::placement::events::EventSink;
use crate::placement::spawner::{SpawnSubscription, TouchSpawner};
use crate::surfaces::ArSurfaces;

/// Adapter between a UI toggle and [`TouchSpawner::set_spawn_mode`].
///
/// While active it holds a disarming [`SpawnSubscription`], so the spawner
/// switches spawn mode off as part of every spawn and each placement needs a
/// fresh re-enable. [`SpawnModeGate::sync`] then reflects that in the toggle.
#[derive(Debug)]
pub struct SpawnModeGate {
    toggle_on: bool,
    subscription: Option<SpawnSubscription>,
}

impl SpawnModeGate {
    pub fn new(toggle_on: bool) -> Self {
        Self {
            toggle_on,
            subscription: None,
        }
    }

    /// Whether the UI toggle should be shown as on.
    pub fn is_on(&self) -> bool {
        self.toggle_on
    }

    pub fn is_active(&self) -> bool {
        self.subscription.is_some()
    }

    /// Subscribes to spawn notifications. Does nothing if already active.
    pub fn activate(&mut self, spawner: &mut TouchSpawner) {
        if self.subscription.is_none() {
            self.subscription = Some(spawner.subscribe_disarming());
        }
    }

    /// Releases the subscription. Pending notifications are discarded.
    pub fn deactivate(&mut self, spawner: &mut TouchSpawner) {
        if let Some(subscription) = self.subscription.take() {
            spawner.unsubscribe(subscription);
        }
    }

    /// Forwards a toggle change to the spawner.
    ///
    /// Switching on discards notifications from spawns that preceded the arm.
    pub fn set_toggle(
        &mut self,
        on: bool,
        spawner: &mut TouchSpawner,
        surfaces: &mut dyn ArSurfaces,
        sink: &mut dyn EventSink,
    ) {
        if on {
            if let Some(subscription) = &self.subscription {
                subscription.drain();
            }
        }
        self.toggle_on = on;
        spawner.set_spawn_mode(on, surfaces, sink);
    }

    /// Turns the toggle off after spawns. Returns the number of notifications consumed.
    pub fn sync(
        &mut self,
        spawner: &mut TouchSpawner,
        surfaces: &mut dyn ArSurfaces,
        sink: &mut dyn EventSink,
    ) -> usize {
        let Some(subscription) = &self.subscription else {
            return 0;
        };

        let consumed = subscription.drain().len();
        if consumed > 0 {
            debug!("{} spawn(s) observed; toggle off.", consumed);
            self.toggle_on = false;
            if spawner.spawn_mode_active() {
                spawner.set_spawn_mode(false, surfaces, sink);
            }
        }
        consumed
    }
}

#[cfg(test)]
mod tests {
    use glam::{Vec2, Vec3};

    use super::*;
    use crate::placement::events::{PlacementEvent, RejectReason, VecSink};
    use crate::placement::spawner::{SpawnerConfig, TouchOutcome};
    use crate::sim::{SimEntities, SimPlane, SimulatedSession};
    use crate::surfaces::{ArContext, SurfaceId, TrackedImageId, TrackedImagesChanged};

    const CENTER: Vec2 = Vec2::new(540.0, 960.0);

    fn setup() -> (TouchSpawner, SpawnModeGate, SimulatedSession, SimEntities) {
        let mut session = SimulatedSession::default();
        session.discover_plane(SimPlane::horizontal(
            SurfaceId(1),
            Vec3::new(0.0, -1.5, -2.0),
            Vec2::splat(4.0),
        ));
        let config = SpawnerConfig::default().with_initial_spawn_mode(false);
        let mut spawner = TouchSpawner::new(config);
        let mut gate = SpawnModeGate::new(false);
        gate.activate(&mut spawner);
        (spawner, gate, session, SimEntities::default())
    }

    fn tap(
        spawner: &mut TouchSpawner,
        session: &mut SimulatedSession,
        entities: &mut SimEntities,
    ) -> TouchOutcome {
        let mut ctx = ArContext::new(session, entities, &());
        spawner.handle_finger_down(CENTER, &mut ctx, &mut ())
    }

    #[test]
    fn every_spawn_requires_a_fresh_arm() {
        let (mut spawner, mut gate, mut session, mut entities) = setup();

        assert!(matches!(
            tap(&mut spawner, &mut session, &mut entities),
            TouchOutcome::Rejected(_)
        ));

        gate.set_toggle(true, &mut spawner, &mut session, &mut ());
        assert!(spawner.spawn_mode_active());
        let mut sink = VecSink::new();
        let mut ctx = ArContext::new(&mut session, &mut entities, &());
        assert!(matches!(
            spawner.handle_finger_down(CENTER, &mut ctx, &mut sink),
            TouchOutcome::Spawned(_)
        ));
        assert!(!spawner.spawn_mode_active());
        assert!(!session.discovery_enabled());
        assert!(sink
            .as_slice()
            .contains(&PlacementEvent::SpawnModeChanged { active: false }));

        let mut sink = VecSink::new();
        assert_eq!(gate.sync(&mut spawner, &mut session, &mut sink), 1);
        assert!(!gate.is_on());
        assert!(sink.is_empty());

        assert!(matches!(
            tap(&mut spawner, &mut session, &mut entities),
            TouchOutcome::Rejected(_)
        ));
        assert_eq!(entities.alive_count(), 1);
    }

    #[test]
    fn sync_without_spawns_leaves_toggle_alone() {
        let (mut spawner, mut gate, mut session, _) = setup();
        gate.set_toggle(true, &mut spawner, &mut session, &mut ());

        assert_eq!(gate.sync(&mut spawner, &mut session, &mut ()), 0);
        assert!(gate.is_on());
        assert!(spawner.spawn_mode_active());
    }

    #[test]
    fn marker_spawns_also_disarm() {
        let (mut spawner, mut gate, mut session, mut entities) = setup();
        gate.set_toggle(true, &mut spawner, &mut session, &mut ());

        let batch = TrackedImagesChanged::new().with_added(TrackedImageId(4));
        spawner.handle_tracked_images(&batch, &mut session, &mut entities, &mut ());
        assert!(!spawner.spawn_mode_active());

        assert_eq!(gate.sync(&mut spawner, &mut session, &mut ()), 1);
        assert!(!gate.is_on());
    }

    #[test]
    fn second_tap_before_sync_is_rejected() {
        let (mut spawner, mut gate, mut session, mut entities) = setup();
        gate.set_toggle(true, &mut spawner, &mut session, &mut ());

        let first = tap(&mut spawner, &mut session, &mut entities);
        let second = tap(&mut spawner, &mut session, &mut entities);

        assert!(matches!(first, TouchOutcome::Spawned(_)));
        assert_eq!(
            second,
            TouchOutcome::Rejected(RejectReason::SpawnModeInactive)
        );
        assert_eq!(gate.sync(&mut spawner, &mut session, &mut ()), 1);
        assert_eq!(entities.alive_count(), 1);
    }

    #[test]
    fn rearming_discards_notices_from_earlier_spawns() {
        let (mut spawner, mut gate, mut session, mut entities) = setup();
        gate.set_toggle(true, &mut spawner, &mut session, &mut ());
        tap(&mut spawner, &mut session, &mut entities);

        gate.set_toggle(true, &mut spawner, &mut session, &mut ());
        assert_eq!(gate.sync(&mut spawner, &mut session, &mut ()), 0);
        assert!(gate.is_on());
        assert!(spawner.spawn_mode_active());
    }

    #[test]
    fn deactivated_gate_stops_listening() {
        let (mut spawner, mut gate, mut session, mut entities) = setup();
        assert!(gate.is_active());
        assert_eq!(spawner.subscriber_count(), 1);

        gate.deactivate(&mut spawner);
        assert!(!gate.is_active());
        assert_eq!(spawner.subscriber_count(), 0);

        gate.set_toggle(true, &mut spawner, &mut session, &mut ());
        tap(&mut spawner, &mut session, &mut entities);
        assert_eq!(gate.sync(&mut spawner, &mut session, &mut ()), 0);
        assert!(gate.is_on());
        assert!(spawner.spawn_mode_active());

        gate.activate(&mut spawner);
        gate.activate(&mut spawner);
        assert_eq!(spawner.subscriber_count(), 1);
    }
}
