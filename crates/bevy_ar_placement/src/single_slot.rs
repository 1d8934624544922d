//! Single-slot placement: one character, placed on finger lift and moved by
//! later lifts, with a preview indicator and guidance text.
use ar_placement::prelude::*;
use bevy::prelude::*;

use crate::events::write_messages;
use crate::host::{anchored_characters, pose_transform, ArAnchor, CommandsHost, PlacedCharacter};
use crate::{
    register_shared, ArBackend, ArViewport, CharacterPrefab, PlacementMessage, PlacementTouch,
    RemovePlacedCharacter, UiOcclusion,
};

/// The controller driven by [`SingleSlotPlacementPlugin`].
#[derive(Resource, Debug)]
pub struct CharacterSlot(pub SingleSlotController);

/// Current guidance for the user, kept in step with [`CharacterSlot`].
#[derive(Resource, Debug, Clone, PartialEq, Eq)]
pub struct PlacementGuidance {
    pub guidance: Guidance,
    pub message: String,
}

impl PlacementGuidance {
    fn from_controller(controller: &SingleSlotController) -> Self {
        Self {
            guidance: controller.guidance(),
            message: controller.guidance_message().to_owned(),
        }
    }
}

/// The preview entity posed on the surface under the viewport center.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct PlacementIndicatorMarker;

#[derive(Clone, Debug, Default)]
pub struct SingleSlotPlacementPlugin {
    pub config: PlacementConfig,
}

impl SingleSlotPlacementPlugin {
    pub fn new(config: PlacementConfig) -> Self {
        Self { config }
    }
}

impl Plugin for SingleSlotPlacementPlugin {
    fn build(&self, app: &mut App) {
        let controller = match SingleSlotController::try_new(self.config.clone()) {
            Ok(controller) => controller,
            Err(err) => panic!("SingleSlotPlacementPlugin: {err}"),
        };
        let guidance = PlacementGuidance::from_controller(&controller);

        register_shared(app);
        app.insert_resource(CharacterSlot(controller))
            .insert_resource(guidance)
            .add_systems(Startup, spawn_placement_indicator)
            .add_systems(
                Update,
                (
                    place_from_touches,
                    remove_placed_character,
                    update_placement_indicator,
                    sync_guidance,
                )
                    .chain(),
            );
    }
}

fn spawn_placement_indicator(mut commands: Commands, slot: Res<CharacterSlot>) {
    if !slot.0.config().indicator_enabled {
        return;
    }
    commands.spawn((
        Name::new("Placement Indicator"),
        PlacementIndicatorMarker,
        Transform::default(),
        Visibility::Hidden,
    ));
}

#[allow(clippy::too_many_arguments)]
pub(crate) fn place_from_touches(
    mut commands: Commands,
    mut touches: MessageReader<PlacementTouch>,
    mut slot: ResMut<CharacterSlot>,
    mut backend: ResMut<ArBackend>,
    ui: Res<UiOcclusion>,
    prefab: Res<CharacterPrefab>,
    characters: Query<(Entity, &ChildOf), With<PlacedCharacter>>,
    anchors: Query<&ArAnchor>,
    mut messages: MessageWriter<PlacementMessage>,
) {
    let mut sink = VecSink::new();
    {
        let mut host = CommandsHost::new(&mut commands, prefab.0.clone())
            .with_anchored(anchored_characters(&characters, &anchors));
        for touch in touches.read() {
            let mut ctx = ArContext::new(backend.surfaces_mut(), &mut host, &*ui);
            slot.0
                .handle_touch(Touch::new(touch.position, touch.phase), &mut ctx, &mut sink);
        }
    }
    write_messages(sink, &mut messages);
}

fn remove_placed_character(
    mut commands: Commands,
    mut requests: MessageReader<RemovePlacedCharacter>,
    mut slot: ResMut<CharacterSlot>,
    characters: Query<(Entity, &ChildOf), With<PlacedCharacter>>,
    anchors: Query<&ArAnchor>,
    mut messages: MessageWriter<PlacementMessage>,
) {
    if requests.read().count() == 0 {
        return;
    }

    let mut sink = VecSink::new();
    {
        let mut host = CommandsHost::new(&mut commands, None)
            .with_anchored(anchored_characters(&characters, &anchors));
        slot.0.remove_entity(&mut host, &mut sink);
    }
    write_messages(sink, &mut messages);
}

fn update_placement_indicator(
    mut slot: ResMut<CharacterSlot>,
    mut backend: ResMut<ArBackend>,
    viewport: Res<ArViewport>,
    mut indicators: Query<(&mut Transform, &mut Visibility), With<PlacementIndicatorMarker>>,
    mut messages: MessageWriter<PlacementMessage>,
) {
    let mut sink = VecSink::new();
    let indicator = slot
        .0
        .update_indicator(viewport.0, backend.surfaces_mut(), &mut sink);

    for (mut transform, mut visibility) in &mut indicators {
        if let Some(pose) = indicator.pose {
            transform.set_if_neq(pose_transform(pose));
        }
        visibility.set_if_neq(if indicator.visible {
            Visibility::Inherited
        } else {
            Visibility::Hidden
        });
    }
    write_messages(sink, &mut messages);
}

fn sync_guidance(slot: Res<CharacterSlot>, mut guidance: ResMut<PlacementGuidance>) {
    if guidance.guidance != slot.0.guidance() || guidance.message != slot.0.guidance_message() {
        *guidance = PlacementGuidance::from_controller(&slot.0);
    }
}
