//! Touch and marker driven spawning, armed one placement at a time by the
//! spawn-mode toggle.
use ar_placement::prelude::*;
use bevy::prelude::*;

use crate::events::write_messages;
use crate::host::{bevy_entity, CommandsHost, TrackedImage};
use crate::{
    register_shared, ArBackend, CharacterPrefab, CharacterSpawned, PlacementMessage,
    PlacementTouch, SpawnModeToggled, TrackedImagesUpdate, UiOcclusion,
};

/// The touch spawner driven by [`TouchSpawnerPlugin`].
#[derive(Resource, Debug)]
pub struct CharacterSpawner(pub TouchSpawner);

/// The spawn-mode gate. `is_on` mirrors the UI toggle.
#[derive(Resource, Debug)]
pub struct SpawnGate(pub SpawnModeGate);

/// Spawns a character for every accepted finger-down and every new marker.
///
/// Systems run in `Update` in this order: toggle changes, touch spawning,
/// marker spawning, gate sync.
#[derive(Clone, Debug, Default)]
pub struct TouchSpawnerPlugin {
    pub config: SpawnerConfig,
}

impl TouchSpawnerPlugin {
    pub fn new(config: SpawnerConfig) -> Self {
        Self { config }
    }
}

impl Plugin for TouchSpawnerPlugin {
    fn build(&self, app: &mut App) {
        let mut spawner = match TouchSpawner::try_new(self.config.clone()) {
            Ok(spawner) => spawner,
            Err(err) => panic!("TouchSpawnerPlugin: {err}"),
        };
        let mut gate = SpawnModeGate::new(self.config.initial_spawn_mode);
        gate.activate(&mut spawner);

        register_shared(app);
        app.insert_resource(CharacterSpawner(spawner))
            .insert_resource(SpawnGate(gate))
            .add_systems(
                Update,
                (
                    apply_spawn_mode_toggles,
                    spawn_from_touches,
                    spawn_from_tracked_images,
                    sync_spawn_gate,
                )
                    .chain(),
            );
    }
}

pub(crate) fn apply_spawn_mode_toggles(
    mut toggles: MessageReader<SpawnModeToggled>,
    mut spawner: ResMut<CharacterSpawner>,
    mut gate: ResMut<SpawnGate>,
    mut backend: ResMut<ArBackend>,
    mut messages: MessageWriter<PlacementMessage>,
) {
    let mut sink = VecSink::new();
    for toggled in toggles.read() {
        gate.0
            .set_toggle(toggled.0, &mut spawner.0, backend.surfaces_mut(), &mut sink);
    }
    write_messages(sink, &mut messages);
}

fn spawn_from_touches(
    mut commands: Commands,
    mut touches: MessageReader<PlacementTouch>,
    mut spawner: ResMut<CharacterSpawner>,
    mut backend: ResMut<ArBackend>,
    ui: Res<UiOcclusion>,
    prefab: Res<CharacterPrefab>,
    mut messages: MessageWriter<PlacementMessage>,
) {
    let mut sink = VecSink::new();
    {
        let mut host = CommandsHost::new(&mut commands, prefab.0.clone());
        for touch in touches.read().filter(|t| t.phase == TouchPhase::Began) {
            let mut ctx = ArContext::new(backend.surfaces_mut(), &mut host, &*ui);
            spawner.0.handle_finger_down(touch.position, &mut ctx, &mut sink);
        }
    }
    announce_spawns(&mut commands, &sink);
    write_messages(sink, &mut messages);
}

fn spawn_from_tracked_images(
    mut commands: Commands,
    mut updates: MessageReader<TrackedImagesUpdate>,
    mut spawner: ResMut<CharacterSpawner>,
    mut backend: ResMut<ArBackend>,
    prefab: Res<CharacterPrefab>,
    images: Query<(Entity, &TrackedImage)>,
    mut messages: MessageWriter<PlacementMessage>,
) {
    let mut sink = VecSink::new();
    {
        let mut host = CommandsHost::new(&mut commands, prefab.0.clone()).with_images(&images);
        for update in updates.read() {
            spawner.0.handle_tracked_images(
                &update.0,
                backend.surfaces_mut(),
                &mut host,
                &mut sink,
            );
        }
    }
    announce_spawns(&mut commands, &sink);
    write_messages(sink, &mut messages);
}

fn sync_spawn_gate(
    mut spawner: ResMut<CharacterSpawner>,
    mut gate: ResMut<SpawnGate>,
    mut backend: ResMut<ArBackend>,
    mut messages: MessageWriter<PlacementMessage>,
) {
    let mut sink = VecSink::new();
    gate.0
        .sync(&mut spawner.0, backend.surfaces_mut(), &mut sink);
    write_messages(sink, &mut messages);
}

fn announce_spawns(commands: &mut Commands, sink: &VecSink) {
    for event in sink.as_slice() {
        if let PlacementEvent::Spawned {
            entity, trigger, ..
        } = event
        {
            commands.trigger(CharacterSpawned {
                entity: bevy_entity(*entity),
                trigger: *trigger,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PlacedCharacter;

    const CENTER: Vec2 = Vec2::new(540.0, 960.0);

    fn floor_backend() -> ArBackend {
        let mut session = SimulatedSession::default();
        session.discover_plane(SimPlane::horizontal(
            SurfaceId(1),
            Vec3::new(0.0, -1.5, -2.0),
            Vec2::splat(4.0),
        ));
        ArBackend::new(session)
    }

    fn setup_app(config: SpawnerConfig) -> App {
        let mut app = App::new();
        app.add_plugins(TouchSpawnerPlugin::new(config));
        app.insert_resource(floor_backend());
        app
    }

    fn tap(app: &mut App, position: Vec2) {
        app.world_mut()
            .resource_mut::<Messages<PlacementTouch>>()
            .write(PlacementTouch::new(position, TouchPhase::Began));
    }

    fn toggle(app: &mut App, on: bool) {
        app.world_mut()
            .resource_mut::<Messages<SpawnModeToggled>>()
            .write(SpawnModeToggled(on));
    }

    fn character_count(app: &mut App) -> usize {
        app.world_mut()
            .query_filtered::<Entity, With<PlacedCharacter>>()
            .iter(app.world())
            .count()
    }

    #[test]
    fn tap_spawns_once_then_disarms() {
        let mut app = setup_app(SpawnerConfig::default());

        tap(&mut app, CENTER);
        app.update();
        assert_eq!(character_count(&mut app), 1);
        assert!(!app.world().resource::<SpawnGate>().0.is_on());
        assert!(!app.world().resource::<CharacterSpawner>().0.spawn_mode_active());

        tap(&mut app, CENTER);
        app.update();
        assert_eq!(character_count(&mut app), 1);
    }

    #[test]
    fn toggle_rearms_before_touches_in_the_same_frame() {
        let mut app = setup_app(SpawnerConfig::default());
        tap(&mut app, CENTER);
        app.update();

        toggle(&mut app, true);
        tap(&mut app, Vec2::new(700.0, 1400.0));
        app.update();

        assert_eq!(character_count(&mut app), 2);
        assert_eq!(
            app.world().resource::<CharacterSpawner>().0.spawned_count(),
            2
        );
    }

    #[test]
    fn two_touches_in_one_frame_spawn_once() {
        let mut app = setup_app(SpawnerConfig::default());

        tap(&mut app, CENTER);
        tap(&mut app, Vec2::new(700.0, 1400.0));
        app.update();

        assert_eq!(character_count(&mut app), 1);
        assert_eq!(
            app.world().resource::<CharacterSpawner>().0.spawned_count(),
            1
        );
        assert!(!app.world().resource::<SpawnGate>().0.is_on());
    }

    #[test]
    fn lifted_fingers_do_not_spawn() {
        let mut app = setup_app(SpawnerConfig::default());
        app.world_mut()
            .resource_mut::<Messages<PlacementTouch>>()
            .write(PlacementTouch::new(CENTER, TouchPhase::Ended));
        app.update();
        assert_eq!(character_count(&mut app), 0);
        assert!(app.world().resource::<SpawnGate>().0.is_on());
    }

    #[test]
    fn taps_over_ui_are_ignored() {
        let mut app = setup_app(SpawnerConfig::default());
        app.insert_resource(UiOcclusion(vec![Rect::from_center_size(
            CENTER,
            Vec2::splat(100.0),
        )]));

        tap(&mut app, CENTER);
        app.update();

        assert_eq!(character_count(&mut app), 0);
        assert!(app.world().resource::<SpawnGate>().0.is_on());
    }

    #[test]
    fn stops_at_population_cap() {
        let mut app = setup_app(SpawnerConfig::new(2));
        for _ in 0..3 {
            toggle(&mut app, true);
            tap(&mut app, CENTER);
            app.update();
        }

        assert_eq!(character_count(&mut app), 2);
        assert!(app.world().resource::<CharacterSpawner>().0.cap_reached());
    }

    #[test]
    fn marker_spawn_is_parented_to_tracked_image() {
        let mut app = setup_app(SpawnerConfig::default().with_initial_spawn_mode(false));
        let image = TrackedImageId(7);
        let marker = app
            .world_mut()
            .spawn((TrackedImage(image), Transform::from_xyz(0.3, -1.0, -1.0)))
            .id();

        app.world_mut()
            .resource_mut::<Messages<TrackedImagesUpdate>>()
            .write(TrackedImagesUpdate(TrackedImagesChanged::new().with_added(image)));
        app.update();

        let parents: Vec<Entity> = app
            .world_mut()
            .query_filtered::<&ChildOf, With<PlacedCharacter>>()
            .iter(app.world())
            .map(|child_of| child_of.parent())
            .collect();
        assert_eq!(parents, vec![marker]);
    }

    #[derive(Resource, Default)]
    struct SpawnLog(Vec<(Entity, SpawnTrigger)>);

    #[test]
    fn triggers_character_spawned() {
        let mut app = setup_app(SpawnerConfig::default());
        app.init_resource::<SpawnLog>();
        app.add_observer(|spawned: On<CharacterSpawned>, mut log: ResMut<SpawnLog>| {
            log.0.push((spawned.entity, spawned.trigger));
        });

        tap(&mut app, CENTER);
        app.update();

        let log = &app.world().resource::<SpawnLog>().0;
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].1, SpawnTrigger::Touch { point: CENTER });
        assert!(app.world().get::<PlacedCharacter>(log[0].0).is_some());
    }
}
