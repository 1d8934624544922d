//! Bevy plugin for ar_placement providing resources, message types, and systems.
#![forbid(unsafe_code)]

use ar_placement::prelude::*;
#[cfg(feature = "ron")]
pub use assets::{PlacementSettings, PlacementSettingsAsset, PlacementSettingsAssetLoader};
use bevy::input::touch::TouchInput;
use bevy::prelude::*;
pub use events::PlacementMessage;
pub use host::{ArAnchor, ArBackend, PlacedCharacter, TrackedImage};
pub use single_slot::{
    CharacterSlot, PlacementGuidance, PlacementIndicatorMarker, SingleSlotPlacementPlugin,
};
pub use spawner::{CharacterSpawner, SpawnGate, TouchSpawnerPlugin};

#[cfg(feature = "ron")]
mod assets;
mod events;
mod host;
mod input;
mod single_slot;
mod spawner;

/// Convenient re-exports for common types. Import with `use bevy_ar_placement::prelude::*;`.
pub mod prelude {
    pub use ar_placement::prelude::*;

    #[cfg(feature = "ron")]
    pub use crate::assets::{
        PlacementSettings, PlacementSettingsAsset, PlacementSettingsAssetLoader,
    };
    pub use crate::events::PlacementMessage;
    pub use crate::host::{ArAnchor, ArBackend, PlacedCharacter, TrackedImage};
    pub use crate::single_slot::{
        CharacterSlot, PlacementGuidance, PlacementIndicatorMarker, SingleSlotPlacementPlugin,
    };
    pub use crate::spawner::{CharacterSpawner, SpawnGate, TouchSpawnerPlugin};
    pub use crate::{
        ArPlacementPlugin, ArViewport, CharacterPrefab, CharacterSpawned, PlacementTouch,
        RemovePlacedCharacter, SpawnModeToggled, TrackedImagesUpdate, UiOcclusion,
    };
}

/// Bevy plugin providing the shared resources, message types, the touch input
/// bridge and the settings asset. Add one of [`TouchSpawnerPlugin`] or
/// [`SingleSlotPlacementPlugin`] on top, and insert an [`ArBackend`].
pub struct ArPlacementPlugin;

/// Viewport size in pixels; the single-slot indicator raycasts from its center.
#[derive(Resource, Clone, Copy, Debug)]
pub struct ArViewport(pub Vec2);

impl Default for ArViewport {
    fn default() -> Self {
        Self(Vec2::new(1080.0, 1920.0))
    }
}

/// Scene instantiated for every placed character. `None` spawns bare transforms.
#[derive(Resource, Clone, Default)]
pub struct CharacterPrefab(pub Option<Handle<Scene>>);

/// Screen rectangles covered by interactive UI. Touches inside are ignored.
#[derive(Resource, Clone, Default, Debug)]
pub struct UiOcclusion(pub Vec<Rect>);

impl UiHitTest for UiOcclusion {
    fn is_over_interactive_ui(&self, point: Vec2) -> bool {
        self.0.iter().any(|rect| rect.contains(point))
    }
}

/// A touch sample in screen pixels, fed to the active placement strategy.
#[derive(Message, Debug, Clone, Copy)]
pub struct PlacementTouch {
    pub position: Vec2,
    pub phase: TouchPhase,
}

impl PlacementTouch {
    pub fn new(position: Vec2, phase: TouchPhase) -> Self {
        Self { position, phase }
    }
}

/// One batch of marker tracking changes from the AR backend.
#[derive(Message, Debug, Clone, Default)]
pub struct TrackedImagesUpdate(pub TrackedImagesChanged);

/// The spawn-mode UI toggle changed.
#[derive(Message, Debug, Clone, Copy)]
pub struct SpawnModeToggled(pub bool);

/// Asks the single-slot strategy to remove its character.
#[derive(Message, Debug, Clone, Copy, Default)]
pub struct RemovePlacedCharacter;

/// [`EntityEvent`] triggered for every character the touch spawner creates.
#[non_exhaustive]
#[derive(EntityEvent, Debug, Clone)]
pub struct CharacterSpawned {
    /// The spawned character.
    pub entity: Entity,
    /// What caused the spawn.
    pub trigger: SpawnTrigger,
}

impl Plugin for ArPlacementPlugin {
    fn build(&self, app: &mut App) {
        register_shared(app);
        app.add_message::<TouchInput>()
            .add_systems(PreUpdate, input::forward_touch_input);

        #[cfg(feature = "ron")]
        app.init_asset::<PlacementSettingsAsset>()
            .init_asset_loader::<PlacementSettingsAssetLoader>()
            .add_systems(
                Update,
                assets::apply_placement_settings
                    .run_if(resource_exists::<PlacementSettings>)
                    .before(spawner::apply_spawn_mode_toggles)
                    .before(single_slot::place_from_touches),
            );
    }
}

/// Messages and resources every strategy relies on. Safe to call repeatedly.
fn register_shared(app: &mut App) {
    app.add_message::<PlacementTouch>()
        .add_message::<TrackedImagesUpdate>()
        .add_message::<SpawnModeToggled>()
        .add_message::<RemovePlacedCharacter>()
        .add_message::<PlacementMessage>()
        .init_resource::<ArViewport>()
        .init_resource::<CharacterPrefab>()
        .init_resource::<UiOcclusion>();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ui_occlusion_blocks_points_inside_rects() {
        let ui = UiOcclusion(vec![Rect::new(0.0, 1700.0, 1080.0, 1920.0)]);
        assert!(ui.is_over_interactive_ui(Vec2::new(540.0, 1800.0)));
        assert!(!ui.is_over_interactive_ui(Vec2::new(540.0, 960.0)));
    }
}
