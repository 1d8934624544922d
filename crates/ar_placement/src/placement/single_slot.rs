//! Single-slot placement: one character, placed on release and optionally moved afterwards.
//!
//! The controller is a two-state machine (`Unplaced` / `Placed`). A completed
//! touch over a surface places the character the first time and, if allowed,
//! repositions it afterwards. A separate per-frame update drives a preview
//! indicator from a viewport-center raycast and keeps the guidance text in sync.
use glam::{Vec2, Vec3};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::placement::events::{EventSink, PlacementEvent, RejectReason};
use crate::surfaces::input::{Touch, TouchPhase};
use crate::surfaces::{
    AnchorId, ArContext, ArSurfaces, EntityHost, EntityId, Parent, Pose, SurfaceHit,
    TrackableFilter,
};

/// Guidance shown to the user while placing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Guidance {
    /// No surface under the viewport center yet.
    Scanning,
    /// A surface is under the viewport center; a tap will place.
    TapToPlace,
    Placed,
    Repositioned,
}

/// Message text for each [`Guidance`] state.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuidanceText {
    pub scanning: String,
    pub tap_to_place: String,
    pub placed: String,
    pub repositioned: String,
}

impl Default for GuidanceText {
    fn default() -> Self {
        Self {
            scanning: "Scan the floor by pointing the camera at it...".into(),
            tap_to_place: "Tap the screen to place the character".into(),
            placed: "Character placed. Move closer to talk.".into(),
            repositioned: "Character repositioned.".into(),
        }
    }
}

impl GuidanceText {
    pub fn message(&self, guidance: Guidance) -> &str {
        match guidance {
            Guidance::Scanning => &self.scanning,
            Guidance::TapToPlace => &self.tap_to_place,
            Guidance::Placed => &self.placed,
            Guidance::Repositioned => &self.repositioned,
        }
    }
}

/// Configuration for a [`SingleSlotController`].
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq)]
pub struct PlacementConfig {
    /// Whether later touches move the placed character.
    pub allow_reposition: bool,
    /// Offset added to the hit position.
    pub offset: Vec3,
    /// Trackables considered by raycasts.
    pub surface_filter: TrackableFilter,
    /// Whether a preview indicator is driven each frame.
    pub indicator_enabled: bool,
    pub guidance: GuidanceText,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            allow_reposition: true,
            offset: Vec3::ZERO,
            surface_filter: TrackableFilter::PlaneWithinPolygon,
            indicator_enabled: true,
            guidance: GuidanceText::default(),
        }
    }
}

impl PlacementConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_allow_reposition(mut self, allow: bool) -> Self {
        self.allow_reposition = allow;
        self
    }

    pub fn with_offset(mut self, offset: Vec3) -> Self {
        self.offset = offset;
        self
    }

    pub fn with_surface_filter(mut self, filter: TrackableFilter) -> Self {
        self.surface_filter = filter;
        self
    }

    pub fn with_indicator_enabled(mut self, enabled: bool) -> Self {
        self.indicator_enabled = enabled;
        self
    }

    pub fn with_guidance(mut self, guidance: GuidanceText) -> Self {
        self.guidance = guidance;
        self
    }

    /// Validates the configuration, returning an error if invalid.
    pub fn validate(&self) -> Result<()> {
        if !self.offset.is_finite() {
            return Err(Error::InvalidConfig("offset must be finite".into()));
        }
        Ok(())
    }
}

/// Preview proxy mirroring the latest viewport-center hit.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PlacementIndicator {
    pub visible: bool,
    /// Last pose the indicator was moved to.
    pub pose: Option<Pose>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlacementState {
    #[default]
    Unplaced,
    Placed {
        entity: EntityId,
        anchor: Option<AnchorId>,
    },
}

/// Result of a touch handed to [`SingleSlotController::handle_touch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementOutcome {
    Placed(EntityId),
    Repositioned(EntityId),
    Rejected(RejectReason),
    Missed,
}

/// Manages exactly one placeable character.
#[derive(Debug, Clone)]
pub struct SingleSlotController {
    config: PlacementConfig,
    state: PlacementState,
    indicator: PlacementIndicator,
    guidance: Guidance,
}

impl SingleSlotController {
    pub fn try_new(config: PlacementConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::new(config))
    }

    pub fn new(config: PlacementConfig) -> Self {
        debug_assert!(config.offset.is_finite(), "offset must be finite");
        Self {
            config,
            state: PlacementState::Unplaced,
            indicator: PlacementIndicator::default(),
            guidance: Guidance::Scanning,
        }
    }

    pub fn config(&self) -> &PlacementConfig {
        &self.config
    }

    pub fn state(&self) -> PlacementState {
        self.state
    }

    pub fn is_placed(&self) -> bool {
        matches!(self.state, PlacementState::Placed { .. })
    }

    pub fn current_entity(&self) -> Option<EntityId> {
        match self.state {
            PlacementState::Placed { entity, .. } => Some(entity),
            PlacementState::Unplaced => None,
        }
    }

    pub fn indicator(&self) -> PlacementIndicator {
        self.indicator
    }

    pub fn guidance(&self) -> Guidance {
        self.guidance
    }

    /// Current guidance as display text.
    pub fn guidance_message(&self) -> &str {
        self.config.guidance.message(self.guidance)
    }

    /// Handles one touch sample. Only the finger-lift phase can place.
    pub fn handle_touch(
        &mut self,
        touch: Touch,
        ctx: &mut ArContext<'_>,
        sink: &mut dyn EventSink,
    ) -> PlacementOutcome {
        let reason = if self.is_placed() && !self.config.allow_reposition {
            Some(RejectReason::RepositionDisabled)
        } else if ctx.ui.is_over_interactive_ui(touch.position) {
            Some(RejectReason::OverUi)
        } else if touch.phase != TouchPhase::Ended {
            Some(RejectReason::NotReleased)
        } else {
            None
        };

        if let Some(reason) = reason {
            sink.send(PlacementEvent::Rejected {
                point: Some(touch.position),
                reason,
            });
            return PlacementOutcome::Rejected(reason);
        }

        let hits = ctx
            .surfaces
            .raycast(touch.position, self.config.surface_filter);
        let Some(hit) = hits.first().copied() else {
            debug!("No surface under {:?}.", touch.position);
            sink.send(PlacementEvent::RaycastMissed {
                point: touch.position,
            });
            return PlacementOutcome::Missed;
        };

        match self.state {
            PlacementState::Unplaced => self.place(hit, ctx, sink),
            PlacementState::Placed { entity, .. } => self.reposition(entity, hit, ctx, sink),
        }
    }

    fn place(
        &mut self,
        hit: SurfaceHit,
        ctx: &mut ArContext<'_>,
        sink: &mut dyn EventSink,
    ) -> PlacementOutcome {
        let pose = hit.pose.offset_by(self.config.offset);
        let entity = ctx.entities.instantiate(Some(pose));

        let anchor = ctx.surfaces.attach_anchor(hit.surface, hit.pose);
        if let Some(anchor) = anchor {
            ctx.entities.set_parent(entity, Parent::Anchor(anchor));
        } else {
            debug!("No anchor available on {:?}; placing unanchored.", hit.surface);
        }

        let anchor = anchor.map(|a| a.id);
        self.state = PlacementState::Placed { entity, anchor };
        info!("Character placed at {:?}.", pose.position);
        sink.send(PlacementEvent::Placed {
            entity,
            pose,
            anchor,
        });
        self.set_guidance(Guidance::Placed, sink);
        PlacementOutcome::Placed(entity)
    }

    fn reposition(
        &mut self,
        entity: EntityId,
        hit: SurfaceHit,
        ctx: &mut ArContext<'_>,
        sink: &mut dyn EventSink,
    ) -> PlacementOutcome {
        let pose = hit.pose.offset_by(self.config.offset);
        ctx.entities.set_pose(entity, pose);
        info!("Character repositioned to {:?}.", pose.position);
        sink.send(PlacementEvent::Repositioned { entity, pose });
        self.set_guidance(Guidance::Repositioned, sink);
        PlacementOutcome::Repositioned(entity)
    }

    /// Per-frame indicator update from a raycast at the viewport center.
    pub fn update_indicator(
        &mut self,
        viewport_size: Vec2,
        surfaces: &mut dyn ArSurfaces,
        sink: &mut dyn EventSink,
    ) -> PlacementIndicator {
        if !self.config.indicator_enabled {
            return self.indicator;
        }

        if self.is_placed() {
            self.hide_indicator(sink);
            return self.indicator;
        }

        let center = viewport_size * 0.5;
        match surfaces.raycast(center, self.config.surface_filter).first() {
            Some(hit) => {
                let changed = !self.indicator.visible || self.indicator.pose != Some(hit.pose);
                self.indicator = PlacementIndicator {
                    visible: true,
                    pose: Some(hit.pose),
                };
                if changed {
                    sink.send(PlacementEvent::IndicatorChanged {
                        visible: true,
                        pose: Some(hit.pose),
                    });
                }
                self.set_guidance(Guidance::TapToPlace, sink);
            }
            None => {
                self.hide_indicator(sink);
                self.set_guidance(Guidance::Scanning, sink);
            }
        }

        self.indicator
    }

    /// Destroys the placed character and returns to `Unplaced`.
    pub fn remove_entity(
        &mut self,
        entities: &mut dyn EntityHost,
        sink: &mut dyn EventSink,
    ) -> Option<EntityId> {
        let PlacementState::Placed { entity, .. } = self.state else {
            return None;
        };

        entities.destroy(entity);
        self.state = PlacementState::Unplaced;
        info!("Character {:?} removed.", entity);
        sink.send(PlacementEvent::Removed { entity });
        self.set_guidance(Guidance::Scanning, sink);
        Some(entity)
    }

    fn hide_indicator(&mut self, sink: &mut dyn EventSink) {
        if self.indicator.visible {
            self.indicator.visible = false;
            sink.send(PlacementEvent::IndicatorChanged {
                visible: false,
                pose: self.indicator.pose,
            });
        }
    }

    fn set_guidance(&mut self, guidance: Guidance, sink: &mut dyn EventSink) {
        if self.guidance != guidance {
            self.guidance = guidance;
            sink.send(PlacementEvent::GuidanceChanged { guidance });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::placement::events::VecSink;
    use crate::sim::{SimEntities, SimPlane, SimulatedSession};
    use crate::surfaces::input::ScreenRect;
    use crate::surfaces::SurfaceId;

    const VIEWPORT: Vec2 = Vec2::new(1080.0, 1920.0);
    const CENTER: Vec2 = Vec2::new(540.0, 960.0);

    fn floor_session() -> SimulatedSession {
        let mut session = SimulatedSession::default();
        session.discover_plane(SimPlane::horizontal(
            SurfaceId(7),
            Vec3::new(0.0, -1.5, -2.0),
            Vec2::new(4.0, 4.0),
        ));
        session
    }

    fn release(
        controller: &mut SingleSlotController,
        session: &mut SimulatedSession,
        entities: &mut SimEntities,
        point: Vec2,
    ) -> PlacementOutcome {
        let ui: Vec<ScreenRect> = Vec::new();
        let mut ctx = ArContext::new(session, entities, &ui);
        controller.handle_touch(Touch::ended(point), &mut ctx, &mut ())
    }

    #[test]
    fn first_release_places_with_offset_and_anchor() {
        let offset = Vec3::new(0.0, 0.1, 0.0);
        let mut controller = SingleSlotController::new(PlacementConfig::new().with_offset(offset));
        let mut session = floor_session().with_anchor_support(true);
        let mut entities = SimEntities::default();

        let outcome = release(&mut controller, &mut session, &mut entities, CENTER);
        let PlacementOutcome::Placed(entity) = outcome else {
            panic!("expected placement, got {outcome:?}");
        };

        assert!(controller.is_placed());
        assert_eq!(controller.current_entity(), Some(entity));
        assert_eq!(controller.guidance(), Guidance::Placed);

        let record = entities.get(entity).unwrap();
        assert!((record.pose.position.y - (-1.5 + 0.1)).abs() < 1e-4);
        let Some(Parent::Anchor(anchor)) = record.parent else {
            panic!("expected an anchor parent");
        };
        assert_eq!(anchor.surface, SurfaceId(7));
        assert!(matches!(
            controller.state(),
            PlacementState::Placed { anchor: Some(id), .. } if id == anchor.id
        ));
    }

    #[test]
    fn missing_anchor_support_still_places() {
        let mut controller = SingleSlotController::new(PlacementConfig::default());
        let mut session = floor_session();
        let mut entities = SimEntities::default();

        let outcome = release(&mut controller, &mut session, &mut entities, CENTER);
        let PlacementOutcome::Placed(entity) = outcome else {
            panic!("expected placement");
        };
        assert_eq!(entities.get(entity).unwrap().parent, None);
        assert!(matches!(
            controller.state(),
            PlacementState::Placed { anchor: None, .. }
        ));
    }

    #[test]
    fn second_release_repositions_same_entity() {
        let mut controller = SingleSlotController::new(PlacementConfig::default());
        let mut session = floor_session().with_anchor_support(true);
        let mut entities = SimEntities::default();

        let PlacementOutcome::Placed(entity) =
            release(&mut controller, &mut session, &mut entities, CENTER)
        else {
            panic!("expected placement");
        };
        let first = entities.get(entity).unwrap().pose;

        let outcome = release(
            &mut controller,
            &mut session,
            &mut entities,
            Vec2::new(700.0, 1400.0),
        );
        assert_eq!(outcome, PlacementOutcome::Repositioned(entity));
        assert_eq!(entities.alive_count(), 1);
        assert_eq!(session.anchor_count(), 1);
        assert_ne!(entities.get(entity).unwrap().pose, first);
        assert_eq!(controller.guidance(), Guidance::Repositioned);
    }

    #[test]
    fn reposition_disabled_is_a_no_op_without_raycast() {
        let config = PlacementConfig::new().with_allow_reposition(false);
        let mut controller = SingleSlotController::new(config);
        let mut session = floor_session();
        let mut entities = SimEntities::default();

        let PlacementOutcome::Placed(entity) =
            release(&mut controller, &mut session, &mut entities, CENTER)
        else {
            panic!("expected placement");
        };
        let pose = entities.get(entity).unwrap().pose;
        let raycasts = session.raycast_count();

        let outcome = release(
            &mut controller,
            &mut session,
            &mut entities,
            Vec2::new(700.0, 1400.0),
        );
        assert_eq!(
            outcome,
            PlacementOutcome::Rejected(RejectReason::RepositionDisabled)
        );
        assert_eq!(session.raycast_count(), raycasts);
        assert_eq!(entities.get(entity).unwrap().pose, pose);
        assert_eq!(entities.alive_count(), 1);
    }

    #[test]
    fn only_finger_lift_outside_ui_places() {
        let mut controller = SingleSlotController::new(PlacementConfig::default());
        let mut session = floor_session();
        let mut entities = SimEntities::default();
        let ui = vec![ScreenRect::from_origin_size(
            Vec2::new(0.0, 1700.0),
            Vec2::new(1080.0, 220.0),
        )];

        for phase in [
            TouchPhase::Began,
            TouchPhase::Moved,
            TouchPhase::Stationary,
            TouchPhase::Canceled,
        ] {
            let mut ctx = ArContext::new(&mut session, &mut entities, &ui);
            let outcome = controller.handle_touch(Touch::new(CENTER, phase), &mut ctx, &mut ());
            assert_eq!(outcome, PlacementOutcome::Rejected(RejectReason::NotReleased));
        }

        let mut ctx = ArContext::new(&mut session, &mut entities, &ui);
        let outcome =
            controller.handle_touch(Touch::ended(Vec2::new(540.0, 1800.0)), &mut ctx, &mut ());
        assert_eq!(outcome, PlacementOutcome::Rejected(RejectReason::OverUi));

        assert_eq!(session.raycast_count(), 0);
        assert!(!controller.is_placed());
    }

    #[test]
    fn release_over_empty_space_misses() {
        let mut controller = SingleSlotController::new(PlacementConfig::default());
        let mut session = SimulatedSession::default();
        let mut entities = SimEntities::default();

        let outcome = release(&mut controller, &mut session, &mut entities, CENTER);
        assert_eq!(outcome, PlacementOutcome::Missed);
        assert!(!controller.is_placed());
        assert_eq!(entities.alive_count(), 0);
    }

    #[test]
    fn indicator_follows_center_hits_until_placed() {
        let mut controller = SingleSlotController::new(PlacementConfig::default());
        let mut session = SimulatedSession::default();
        let mut entities = SimEntities::default();
        let mut sink = VecSink::new();

        let indicator = controller.update_indicator(VIEWPORT, &mut session, &mut sink);
        assert!(!indicator.visible);
        assert_eq!(controller.guidance(), Guidance::Scanning);
        assert!(sink.is_empty());

        session.discover_plane(SimPlane::horizontal(
            SurfaceId(1),
            Vec3::new(0.0, -1.5, -2.0),
            Vec2::new(4.0, 4.0),
        ));
        let indicator = controller.update_indicator(VIEWPORT, &mut session, &mut sink);
        assert!(indicator.visible);
        let pose = indicator.pose.expect("indicator pose");
        assert!((pose.position.y - -1.5).abs() < 1e-4);
        assert_eq!(controller.guidance(), Guidance::TapToPlace);
        assert_eq!(
            controller.guidance_message(),
            "Tap the screen to place the character"
        );

        release(&mut controller, &mut session, &mut entities, CENTER);
        sink.clear();
        let indicator = controller.update_indicator(VIEWPORT, &mut session, &mut sink);
        assert!(!indicator.visible);
        assert_eq!(controller.guidance(), Guidance::Placed);
        assert_eq!(
            sink.as_slice(),
            &[PlacementEvent::IndicatorChanged {
                visible: false,
                pose: Some(pose),
            }]
        );
    }

    #[test]
    fn indicator_reverts_to_scanning_when_surface_is_lost() {
        let mut controller = SingleSlotController::new(PlacementConfig::default());
        let mut session = floor_session();

        controller.update_indicator(VIEWPORT, &mut session, &mut ());
        assert!(controller.indicator().visible);

        session.set_surfaces_active(false);
        controller.update_indicator(VIEWPORT, &mut session, &mut ());
        assert!(!controller.indicator().visible);
        assert_eq!(controller.guidance(), Guidance::Scanning);
    }

    #[test]
    fn disabled_indicator_skips_the_update() {
        let config = PlacementConfig::new().with_indicator_enabled(false);
        let mut controller = SingleSlotController::new(config);
        let mut session = floor_session();

        controller.update_indicator(VIEWPORT, &mut session, &mut ());
        assert_eq!(session.raycast_count(), 0);
        assert!(!controller.indicator().visible);
        assert_eq!(controller.guidance(), Guidance::Scanning);
    }

    #[test]
    fn remove_destroys_and_resets() {
        let mut controller = SingleSlotController::new(PlacementConfig::default());
        let mut session = floor_session();
        let mut entities = SimEntities::default();

        assert_eq!(controller.remove_entity(&mut entities, &mut ()), None);

        let PlacementOutcome::Placed(entity) =
            release(&mut controller, &mut session, &mut entities, CENTER)
        else {
            panic!("expected placement");
        };

        let mut sink = VecSink::new();
        assert_eq!(
            controller.remove_entity(&mut entities, &mut sink),
            Some(entity)
        );
        assert!(!controller.is_placed());
        assert_eq!(controller.current_entity(), None);
        assert_eq!(controller.guidance(), Guidance::Scanning);
        assert!(!entities.get(entity).unwrap().alive);
        assert_eq!(sink.as_slice()[0], PlacementEvent::Removed { entity });

        let outcome = release(&mut controller, &mut session, &mut entities, CENTER);
        assert!(matches!(outcome, PlacementOutcome::Placed(e) if e != entity));
        assert_eq!(entities.alive_count(), 1);
    }

    #[test]
    fn config_rejects_non_finite_offset() {
        let config = PlacementConfig::new().with_offset(Vec3::new(f32::NAN, 0.0, 0.0));
        assert!(matches!(
            SingleSlotController::try_new(config),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn guidance_text_maps_every_state() {
        let text = GuidanceText::default();
        assert_eq!(text.message(Guidance::Placed), text.placed);
        assert_eq!(text.message(Guidance::Scanning), text.scanning);
        assert_eq!(text.message(Guidance::Repositioned), text.repositioned);
    }
}
