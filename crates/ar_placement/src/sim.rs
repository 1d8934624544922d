//! In-memory AR session and entity ledger.
//!
//! [`SimulatedSession`] stands in for a real tracking backend: a pinhole camera
//! looking at horizontal planes. It honours discovery and activation switches,
//! optionally supports anchors and counts raycasts. [`SimEntities`] records
//! everything placement asks of the host. Both are deterministic, which makes
//! them the backbone of the tests, benches and headless examples.
use std::collections::BTreeMap;

use glam::{Quat, Vec2, Vec3};
use rand::Rng;
use tracing::debug;

use crate::error::{Error, Result};
use crate::surfaces::{
    Anchor, AnchorId, ArSurfaces, EntityHost, EntityId, Parent, Pose, SurfaceHit, SurfaceId,
    TrackableFilter,
};

/// Pinhole camera used to turn screen points into rays.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimCamera {
    pub pose: Pose,
    /// Vertical field of view in radians.
    pub vertical_fov: f32,
    /// Viewport size in pixels.
    pub viewport: Vec2,
}

impl Default for SimCamera {
    fn default() -> Self {
        Self {
            pose: Pose::new(
                Vec3::ZERO,
                Quat::from_rotation_x(-std::f32::consts::FRAC_PI_4),
            ),
            vertical_fov: 60f32.to_radians(),
            viewport: Vec2::new(1080.0, 1920.0),
        }
    }
}

impl SimCamera {
    pub fn try_new(pose: Pose, vertical_fov: f32, viewport: Vec2) -> Result<Self> {
        if !(vertical_fov > 0.0 && vertical_fov < std::f32::consts::PI) {
            return Err(Error::InvalidConfig(
                "vertical_fov must be in (0, pi)".into(),
            ));
        }
        if viewport.x <= 0.0 || viewport.y <= 0.0 {
            return Err(Error::InvalidConfig(
                "viewport must be > 0 in both components".into(),
            ));
        }
        Ok(Self {
            pose,
            vertical_fov,
            viewport,
        })
    }

    /// World-space ray through a screen point (pixels, origin top-left).
    pub fn ray(&self, point: Vec2) -> (Vec3, Vec3) {
        let ndc = Vec2::new(
            2.0 * point.x / self.viewport.x - 1.0,
            1.0 - 2.0 * point.y / self.viewport.y,
        );
        let tan = (self.vertical_fov * 0.5).tan();
        let aspect = self.viewport.x / self.viewport.y;
        let local = Vec3::new(ndc.x * tan * aspect, ndc.y * tan, -1.0).normalize();
        (self.pose.position, self.pose.rotation * local)
    }
}

/// A detected horizontal plane: a rectangle of `size` rotated by `yaw` around +Y.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimPlane {
    pub id: SurfaceId,
    pub center: Vec3,
    pub size: Vec2,
    pub yaw: f32,
    pub active: bool,
}

impl SimPlane {
    pub fn horizontal(id: SurfaceId, center: Vec3, size: Vec2) -> Self {
        Self {
            id,
            center,
            size,
            yaw: 0.0,
            active: true,
        }
    }

    pub fn with_yaw(mut self, yaw: f32) -> Self {
        self.yaw = yaw;
        self
    }

    fn rotation(&self) -> Quat {
        Quat::from_rotation_y(self.yaw)
    }

    fn intersect(&self, origin: Vec3, dir: Vec3, filter: TrackableFilter) -> Option<SurfaceHit> {
        if dir.y.abs() <= f32::EPSILON {
            return None;
        }
        let t = (self.center.y - origin.y) / dir.y;
        if t <= 0.0 {
            return None;
        }

        let point = origin + dir * t;
        if filter == TrackableFilter::PlaneWithinPolygon {
            let local = self.rotation().inverse() * (point - self.center);
            let half = self.size * 0.5;
            if local.x.abs() > half.x || local.z.abs() > half.y {
                return None;
            }
        }

        Some(SurfaceHit {
            pose: Pose::new(point, self.rotation()),
            surface: self.id,
            distance: t,
        })
    }
}

/// In-memory AR tracking backend.
#[derive(Debug, Clone)]
pub struct SimulatedSession {
    camera: SimCamera,
    planes: Vec<SimPlane>,
    discovery_enabled: bool,
    surfaces_active: bool,
    anchor_support: bool,
    anchors: Vec<Anchor>,
    raycasts: usize,
}

impl Default for SimulatedSession {
    fn default() -> Self {
        Self::new(SimCamera::default())
    }
}

impl SimulatedSession {
    pub fn new(camera: SimCamera) -> Self {
        Self {
            camera,
            planes: Vec::new(),
            discovery_enabled: true,
            surfaces_active: true,
            anchor_support: false,
            anchors: Vec::new(),
            raycasts: 0,
        }
    }

    pub fn with_anchor_support(mut self, supported: bool) -> Self {
        self.anchor_support = supported;
        self
    }

    pub fn camera(&self) -> &SimCamera {
        &self.camera
    }

    pub fn set_camera(&mut self, camera: SimCamera) {
        self.camera = camera;
    }

    /// Adds a plane if discovery is enabled. Returns whether it was added.
    pub fn discover_plane(&mut self, mut plane: SimPlane) -> bool {
        if !self.discovery_enabled {
            debug!("Discovery disabled; ignoring plane {:?}.", plane.id);
            return false;
        }
        plane.active = self.surfaces_active;
        self.planes.push(plane);
        true
    }

    /// Discovers `count` random planes around `center` within `spread` on X/Z.
    pub fn scatter_planes(
        &mut self,
        count: usize,
        center: Vec3,
        spread: Vec2,
        rng: &mut dyn Rng,
    ) -> usize {
        let mut added = 0;
        for _ in 0..count {
            let id = SurfaceId(self.planes.len() as u64 + 1);
            let offset = Vec3::new(
                (rand01(rng) - 0.5) * spread.x,
                0.0,
                (rand01(rng) - 0.5) * spread.y,
            );
            let size = Vec2::new(0.5 + rand01(rng) * 2.0, 0.5 + rand01(rng) * 2.0);
            let yaw = rand01(rng) * std::f32::consts::TAU;
            if self.discover_plane(SimPlane::horizontal(id, center + offset, size).with_yaw(yaw)) {
                added += 1;
            }
        }
        added
    }

    pub fn planes(&self) -> &[SimPlane] {
        &self.planes
    }

    pub fn discovery_enabled(&self) -> bool {
        self.discovery_enabled
    }

    pub fn surfaces_active(&self) -> bool {
        self.surfaces_active
    }

    pub fn anchors(&self) -> &[Anchor] {
        &self.anchors
    }

    pub fn anchor_count(&self) -> usize {
        self.anchors.len()
    }

    /// Number of raycasts performed so far.
    pub fn raycast_count(&self) -> usize {
        self.raycasts
    }
}

impl ArSurfaces for SimulatedSession {
    fn raycast(&mut self, point: Vec2, filter: TrackableFilter) -> Vec<SurfaceHit> {
        self.raycasts += 1;
        let (origin, dir) = self.camera.ray(point);
        let mut hits: Vec<SurfaceHit> = self
            .planes
            .iter()
            .filter(|plane| plane.active)
            .filter_map(|plane| plane.intersect(origin, dir, filter))
            .collect();
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits
    }

    fn set_discovery_enabled(&mut self, enabled: bool) {
        self.discovery_enabled = enabled;
    }

    fn set_surfaces_active(&mut self, active: bool) {
        self.surfaces_active = active;
        for plane in &mut self.planes {
            plane.active = active;
        }
    }

    fn attach_anchor(&mut self, surface: SurfaceId, pose: Pose) -> Option<Anchor> {
        if !self.anchor_support || !self.planes.iter().any(|p| p.id == surface) {
            return None;
        }
        let anchor = Anchor {
            id: AnchorId(self.anchors.len() as u64 + 1),
            surface,
            pose,
        };
        self.anchors.push(anchor);
        Some(anchor)
    }
}

/// What the host knows about one entity.
#[derive(Debug, Clone, PartialEq)]
pub struct SimEntity {
    pub pose: Pose,
    pub parent: Option<Parent>,
    pub alive: bool,
}

/// Entity ledger implementing [`EntityHost`]. Destroyed entities stay listed with `alive = false`.
#[derive(Debug, Clone, Default)]
pub struct SimEntities {
    entities: BTreeMap<EntityId, SimEntity>,
    next_id: u64,
}

impl SimEntities {
    pub fn get(&self, entity: EntityId) -> Option<&SimEntity> {
        self.entities.get(&entity)
    }

    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &SimEntity)> {
        self.entities.iter().map(|(id, e)| (*id, e))
    }

    pub fn alive_count(&self) -> usize {
        self.entities.values().filter(|e| e.alive).count()
    }
}

impl EntityHost for SimEntities {
    fn instantiate(&mut self, pose: Option<Pose>) -> EntityId {
        self.next_id += 1;
        let id = EntityId(self.next_id);
        self.entities.insert(
            id,
            SimEntity {
                pose: pose.unwrap_or_default(),
                parent: None,
                alive: true,
            },
        );
        id
    }

    fn set_pose(&mut self, entity: EntityId, pose: Pose) {
        if let Some(e) = self.entities.get_mut(&entity) {
            e.pose = pose;
        }
    }

    fn set_parent(&mut self, entity: EntityId, parent: Parent) {
        if let Some(e) = self.entities.get_mut(&entity) {
            e.parent = Some(parent);
        }
    }

    fn destroy(&mut self, entity: EntityId) {
        if let Some(e) = self.entities.get_mut(&entity) {
            e.alive = false;
        }
    }
}

/// Generate a random float in the range [0, 1).
#[inline]
fn rand01(rng: &mut dyn Rng) -> f32 {
    (rng.next_u32() as f32) / ((u32::MAX as f32) + 1.0)
}
