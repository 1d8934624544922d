use core::result::Result;

use ar_placement::prelude::*;
use bevy::asset::io::Reader;
use bevy::asset::{AssetLoader, LoadContext};
use bevy::prelude::*;
use bevy::reflect::TypePath;
use bevy::tasks::ConditionalSendFuture;
use serde::{Deserialize, Serialize};

use crate::events::write_messages;
use crate::single_slot::CharacterSlot;
use crate::spawner::{CharacterSpawner, SpawnGate};
use crate::{ArBackend, PlacementMessage};

/// Asset carrying placement settings. Sections left out keep the plugin's
/// configuration.
#[derive(Asset, TypePath, Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementSettingsAsset {
    pub spawner: Option<SpawnerConfig>,
    pub placement: Option<PlacementConfig>,
}

/// Points the placement plugins at a [`PlacementSettingsAsset`].
///
/// The asset is applied once, as soon as it has loaded, and only to a
/// strategy that has not placed anything yet.
#[derive(Resource, Clone, Debug)]
pub struct PlacementSettings {
    pub handle: Handle<PlacementSettingsAsset>,
    applied: bool,
}

impl PlacementSettings {
    pub fn new(handle: Handle<PlacementSettingsAsset>) -> Self {
        Self {
            handle,
            applied: false,
        }
    }

    pub fn is_applied(&self) -> bool {
        self.applied
    }
}

pub(crate) fn apply_placement_settings(
    mut settings: ResMut<PlacementSettings>,
    assets: Res<Assets<PlacementSettingsAsset>>,
    spawner: Option<ResMut<CharacterSpawner>>,
    gate: Option<ResMut<SpawnGate>>,
    slot: Option<ResMut<CharacterSlot>>,
    backend: Option<ResMut<ArBackend>>,
    mut messages: MessageWriter<PlacementMessage>,
) {
    if settings.applied {
        return;
    }
    let Some(asset) = assets.get(&settings.handle) else {
        return;
    };
    settings.applied = true;

    let mut sink = VecSink::new();
    if let (Some(config), Some(mut spawner), Some(mut gate), Some(mut backend)) =
        (&asset.spawner, spawner, gate, backend)
    {
        apply_spawner_config(
            config,
            &mut spawner.0,
            &mut gate.0,
            backend.surfaces_mut(),
            &mut sink,
        );
    }
    if let (Some(config), Some(mut slot)) = (&asset.placement, slot) {
        apply_placement_config(config, &mut slot.0);
    }
    write_messages(sink, &mut messages);
}

fn apply_spawner_config(
    config: &SpawnerConfig,
    spawner: &mut TouchSpawner,
    gate: &mut SpawnModeGate,
    surfaces: &mut dyn ArSurfaces,
    sink: &mut dyn EventSink,
) {
    if spawner.spawned_count() > 0 {
        warn!("Spawner settings loaded after the first spawn; keeping the current configuration.");
        return;
    }
    let mut replacement = match TouchSpawner::try_new(config.clone()) {
        Ok(spawner) => spawner,
        Err(err) => {
            warn!("Ignoring spawner settings: {err}");
            return;
        }
    };

    gate.deactivate(spawner);
    *gate = SpawnModeGate::new(config.initial_spawn_mode);
    gate.activate(&mut replacement);
    replacement.set_spawn_mode(config.initial_spawn_mode, surfaces, sink);
    *spawner = replacement;
    info!("Applied spawner settings (max_count = {}).", config.max_count);
}

fn apply_placement_config(config: &PlacementConfig, slot: &mut SingleSlotController) {
    if slot.is_placed() {
        warn!("Placement settings loaded after placement; keeping the current configuration.");
        return;
    }
    match SingleSlotController::try_new(config.clone()) {
        Ok(controller) => {
            *slot = controller;
            info!("Applied placement settings.");
        }
        Err(err) => warn!("Ignoring placement settings: {err}"),
    }
}

/// Asset loader for [`PlacementSettingsAsset`] using RON files with `.placement` extension.
#[derive(TypePath)]
pub struct PlacementSettingsAssetLoader;

impl AssetLoader for PlacementSettingsAssetLoader {
    type Asset = PlacementSettingsAsset;
    type Settings = ();
    type Error = anyhow::Error;

    fn extensions(&self) -> &[&str] {
        &["placement"]
    }

    fn load(
        &self,
        reader: &mut dyn Reader,
        _settings: &Self::Settings,
        _context: &mut LoadContext,
    ) -> impl ConditionalSendFuture<Output = Result<Self::Asset, Self::Error>> {
        Box::pin(async move {
            let mut bytes = Vec::new();
            reader.read_to_end(&mut bytes).await?;
            let asset: PlacementSettingsAsset =
                ron::de::from_bytes(&bytes).map_err(|e| anyhow::anyhow!(e))?;
            Ok(asset)
        })
    }
}

impl FromWorld for PlacementSettingsAssetLoader {
    fn from_world(_: &mut World) -> Self {
        PlacementSettingsAssetLoader
    }
}
