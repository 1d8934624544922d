//! Poses, surface hits and the collaborator traits the placement logic consumes.
//!
//! The AR backend (plane detection, marker tracking, raycasting) and the host
//! engine (instantiation, parenting, destruction) stay outside this crate. They
//! are reached only through [`ArSurfaces`], [`EntityHost`] and [`UiHitTest`],
//! bundled per call in an [`ArContext`].
use glam::{Quat, Vec2, Vec3};

pub mod input;

/// Opaque id of an entity created through an [`EntityHost`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u64);

/// Opaque id of a detected surface (plane trackable).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SurfaceId(pub u64);

/// Opaque id of a recognized marker image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TrackedImageId(pub u64);

/// Opaque id of a stability anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AnchorId(pub u64);

/// Position and orientation in tracking space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Default for Pose {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Pose {
    /// The tracking-space origin with no rotation.
    pub const IDENTITY: Pose = Pose {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
    };

    pub fn new(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation }
    }

    /// A pose at `position` with identity rotation.
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            rotation: Quat::IDENTITY,
        }
    }

    /// Returns this pose translated by `offset` in tracking space.
    pub fn offset_by(self, offset: Vec3) -> Self {
        Self {
            position: self.position + offset,
            rotation: self.rotation,
        }
    }

    /// Builds a pose from backend-native `mint` types.
    pub fn from_mint(position: mint::Vector3<f32>, rotation: mint::Quaternion<f32>) -> Self {
        Self {
            position: position.into(),
            rotation: rotation.into(),
        }
    }

    /// Splits this pose into `mint` position and rotation.
    pub fn to_mint(self) -> (mint::Vector3<f32>, mint::Quaternion<f32>) {
        (self.position.into(), self.rotation.into())
    }
}

/// Which trackables a raycast may hit.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrackableFilter {
    /// Planes, only inside their detected boundary polygon.
    #[default]
    PlaneWithinPolygon,
    /// Planes, treated as infinite.
    PlaneWithinInfinity,
}

/// A single raycast result against a detected surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceHit {
    /// Hit pose; the rotation is the surface orientation at the hit.
    pub pose: Pose,
    /// The surface that was hit.
    pub surface: SurfaceId,
    /// Distance from the ray origin.
    pub distance: f32,
}

/// A stability anchor pinned to a surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Anchor {
    pub id: AnchorId,
    pub surface: SurfaceId,
    pub pose: Pose,
}

/// What a spawned entity may be attached to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Parent {
    /// Follows the live pose of a recognized marker image.
    TrackedImage(TrackedImageId),
    /// Follows a stability anchor.
    Anchor(Anchor),
}

/// One batch of marker tracking changes, delivered atomically.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackedImagesChanged {
    pub added: Vec<TrackedImageId>,
    pub updated: Vec<TrackedImageId>,
    pub removed: Vec<TrackedImageId>,
}

impl TrackedImagesChanged {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_added(mut self, image: TrackedImageId) -> Self {
        self.added.push(image);
        self
    }

    pub fn with_updated(mut self, image: TrackedImageId) -> Self {
        self.updated.push(image);
        self
    }

    pub fn with_removed(mut self, image: TrackedImageId) -> Self {
        self.removed.push(image);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.updated.is_empty() && self.removed.is_empty()
    }
}

/// Surface services of the AR tracking backend.
pub trait ArSurfaces {
    /// Raycasts from a screen point against detected surfaces, nearest hit first.
    fn raycast(&mut self, point: Vec2, filter: TrackableFilter) -> Vec<SurfaceHit>;

    /// Enables or disables discovery of new surfaces.
    fn set_discovery_enabled(&mut self, enabled: bool);

    /// Activates or deactivates every currently tracked surface.
    /// Inactive surfaces produce no raycast hits.
    fn set_surfaces_active(&mut self, active: bool);

    /// Attaches a stability anchor to `surface` at `pose`.
    ///
    /// Anchoring is optional; the default reports it as unavailable.
    fn attach_anchor(&mut self, surface: SurfaceId, pose: Pose) -> Option<Anchor> {
        let _ = (surface, pose);
        None
    }
}

/// Host-side entity management. The placement logic never renders anything;
/// it only asks the host to create, move, parent and destroy.
pub trait EntityHost {
    /// Instantiates the character. `None` places it at the origin.
    fn instantiate(&mut self, pose: Option<Pose>) -> EntityId;

    fn set_pose(&mut self, entity: EntityId, pose: Pose);

    fn set_parent(&mut self, entity: EntityId, parent: Parent);

    fn destroy(&mut self, entity: EntityId);
}

/// Answers whether a screen point lies over an interactive UI element.
pub trait UiHitTest {
    fn is_over_interactive_ui(&self, point: Vec2) -> bool;
}

/// No UI: nothing ever blocks a touch.
impl UiHitTest for () {
    #[inline]
    fn is_over_interactive_ui(&self, _point: Vec2) -> bool {
        false
    }
}

/// Collaborators handed to placement operations for the duration of one call.
pub struct ArContext<'a> {
    pub surfaces: &'a mut dyn ArSurfaces,
    pub entities: &'a mut dyn EntityHost,
    pub ui: &'a dyn UiHitTest,
}

impl<'a> ArContext<'a> {
    pub fn new(
        surfaces: &'a mut dyn ArSurfaces,
        entities: &'a mut dyn EntityHost,
        ui: &'a dyn UiHitTest,
    ) -> Self {
        Self {
            surfaces,
            entities,
            ui,
        }
    }
}
