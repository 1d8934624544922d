//! Commands-backed [`EntityHost`] and the AR backend resource.
use std::collections::HashMap;

use ar_placement::prelude::*;
use bevy::prelude::*;

/// The AR tracking backend every placement system raycasts against.
///
/// There is no default; insert one before the first `Update`.
#[derive(Resource)]
pub struct ArBackend(pub Box<dyn ArSurfaces + Send + Sync>);

impl ArBackend {
    pub fn new(surfaces: impl ArSurfaces + Send + Sync + 'static) -> Self {
        Self(Box::new(surfaces))
    }

    pub fn surfaces_mut(&mut self) -> &mut dyn ArSurfaces {
        self.0.as_mut()
    }
}

/// Marks entities created by a placement strategy.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct PlacedCharacter;

/// Put on the entity that follows a tracked marker image. Marker spawns are
/// parented under it.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TrackedImage(pub TrackedImageId);

/// An anchor entity created for an anchored placement.
#[derive(Component, Debug, Clone, Copy)]
pub struct ArAnchor(pub Anchor);

pub(crate) fn entity_id(entity: Entity) -> EntityId {
    EntityId(entity.to_bits())
}

pub(crate) fn bevy_entity(id: EntityId) -> Entity {
    Entity::from_bits(id.0)
}

pub(crate) fn pose_transform(pose: Pose) -> Transform {
    Transform::from_translation(pose.position).with_rotation(pose.rotation)
}

/// Expresses a tracking-space pose relative to `frame`.
pub(crate) fn local_transform(frame: Pose, world: Pose) -> Transform {
    let inverse = frame.rotation.inverse();
    Transform::from_translation(inverse * (world.position - frame.position))
        .with_rotation(inverse * world.rotation)
}

/// `(character, anchor entity, anchor pose)` for every anchored character.
pub(crate) fn anchored_characters(
    characters: &Query<(Entity, &ChildOf), With<PlacedCharacter>>,
    anchors: &Query<&ArAnchor>,
) -> Vec<(Entity, Entity, Pose)> {
    characters
        .iter()
        .filter_map(|(entity, child_of)| {
            let parent = child_of.parent();
            anchors
                .get(parent)
                .ok()
                .map(|anchor| (entity, parent, anchor.0.pose))
        })
        .collect()
}

/// Turns placement requests into deferred commands for one system run.
pub(crate) struct CommandsHost<'a, 'w, 's> {
    commands: &'a mut Commands<'w, 's>,
    prefab: Option<Handle<Scene>>,
    images: HashMap<TrackedImageId, Entity>,
    anchored: HashMap<Entity, (Entity, Pose)>,
    poses: HashMap<Entity, Pose>,
}

impl<'a, 'w, 's> CommandsHost<'a, 'w, 's> {
    pub(crate) fn new(commands: &'a mut Commands<'w, 's>, prefab: Option<Handle<Scene>>) -> Self {
        Self {
            commands,
            prefab,
            images: HashMap::new(),
            anchored: HashMap::new(),
            poses: HashMap::new(),
        }
    }

    pub(crate) fn with_images<'q>(
        mut self,
        images: impl IntoIterator<Item = (Entity, &'q TrackedImage)>,
    ) -> Self {
        self.images
            .extend(images.into_iter().map(|(entity, image)| (image.0, entity)));
        self
    }

    pub(crate) fn with_anchored(mut self, anchored: Vec<(Entity, Entity, Pose)>) -> Self {
        self.anchored.extend(
            anchored
                .into_iter()
                .map(|(entity, anchor, pose)| (entity, (anchor, pose))),
        );
        self
    }
}

impl EntityHost for CommandsHost<'_, '_, '_> {
    fn instantiate(&mut self, pose: Option<Pose>) -> EntityId {
        let pose = pose.unwrap_or_default();
        let mut character = self.commands.spawn((
            Name::new("Placed Character"),
            PlacedCharacter,
            pose_transform(pose),
            Visibility::default(),
        ));
        if let Some(prefab) = &self.prefab {
            character.insert(SceneRoot(prefab.clone()));
        }
        let entity = character.id();
        self.poses.insert(entity, pose);
        entity_id(entity)
    }

    fn set_pose(&mut self, entity: EntityId, pose: Pose) {
        let entity = bevy_entity(entity);
        let transform = match self.anchored.get(&entity) {
            Some(&(_, frame)) => local_transform(frame, pose),
            None => pose_transform(pose),
        };
        self.poses.insert(entity, pose);
        self.commands.entity(entity).insert(transform);
    }

    fn set_parent(&mut self, entity: EntityId, parent: Parent) {
        let entity = bevy_entity(entity);
        match parent {
            Parent::TrackedImage(image) => {
                let Some(&marker) = self.images.get(&image) else {
                    warn!(
                        "No entity carries {:?}; {:?} stays unparented.",
                        image, entity
                    );
                    return;
                };
                self.commands.entity(entity).insert(ChildOf(marker));
            }
            Parent::Anchor(anchor) => {
                let anchor_entity = self
                    .commands
                    .spawn((
                        Name::new("AR Anchor"),
                        ArAnchor(anchor),
                        pose_transform(anchor.pose),
                        Visibility::default(),
                    ))
                    .id();
                let world = self.poses.get(&entity).copied().unwrap_or(anchor.pose);
                self.commands
                    .entity(entity)
                    .insert((ChildOf(anchor_entity), local_transform(anchor.pose, world)));
                self.anchored.insert(entity, (anchor_entity, anchor.pose));
            }
        }
    }

    fn destroy(&mut self, entity: EntityId) {
        let entity = bevy_entity(entity);
        self.poses.remove(&entity);
        match self.anchored.remove(&entity) {
            // Despawning the anchor takes its child along.
            Some((anchor, _)) => self.commands.entity(anchor).despawn(),
            None => self.commands.entity(entity).despawn(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_ids_round_trip() {
        let mut world = World::new();
        let entity = world.spawn_empty().id();
        assert_eq!(bevy_entity(entity_id(entity)), entity);
    }

    #[test]
    fn local_transform_recovers_world_pose() {
        let frame = Pose::new(Vec3::new(1.0, -1.5, -2.0), Quat::from_rotation_y(0.7));
        let world = Pose::new(Vec3::new(0.5, -1.5, -1.0), Quat::from_rotation_y(1.2));
        let local = local_transform(frame, world);

        let position = frame.position + frame.rotation * local.translation;
        let rotation = frame.rotation * local.rotation;
        assert!(position.abs_diff_eq(world.position, 1e-5));
        assert!(rotation.abs_diff_eq(world.rotation, 1e-5));
    }
}
