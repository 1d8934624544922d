use bevy::prelude::*;
use bevy::window::PrimaryWindow;
use bevy_ar_placement::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

const VIEWPORT: Vec2 = Vec2::new(540.0, 960.0);

/// Planes known to the simulated session, for drawing.
#[derive(Resource)]
struct DetectedPlanes(Vec<SimPlane>);

#[derive(Resource)]
struct Visuals {
    character_mesh: Handle<Mesh>,
    character_material: Handle<StandardMaterial>,
    marker_mesh: Handle<Mesh>,
    marker_material: Handle<StandardMaterial>,
}

fn main() {
    let session = simulated_session();
    let planes = DetectedPlanes(session.planes().to_vec());

    App::new()
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: "touch spawner".into(),
                resolution: (VIEWPORT.x as u32, VIEWPORT.y as u32).into(),
                ..default()
            }),
            ..default()
        }))
        .add_plugins(ArPlacementPlugin)
        .add_plugins(TouchSpawnerPlugin::new(SpawnerConfig::new(5)))
        .insert_resource(ArBackend::new(session))
        .insert_resource(ArViewport(VIEWPORT))
        // Bottom strip stands in for the toggle button.
        .insert_resource(UiOcclusion(vec![Rect::new(
            0.0,
            VIEWPORT.y - 120.0,
            VIEWPORT.x,
            VIEWPORT.y,
        )]))
        .insert_resource(planes)
        .add_systems(Startup, (setup_scene, load_settings))
        .add_systems(PreUpdate, show_marker)
        .add_systems(Update, (mouse_as_touch, toggle_spawn_mode, log_placement))
        .add_observer(dress_character)
        .run();
}

fn simulated_session() -> SimulatedSession {
    let camera = SimCamera {
        viewport: VIEWPORT,
        ..default()
    };
    let mut session = SimulatedSession::new(camera);
    session.discover_plane(SimPlane::horizontal(
        SurfaceId(1),
        Vec3::new(0.0, -1.5, -2.5),
        Vec2::new(3.0, 4.0),
    ));
    let mut rng = StdRng::seed_from_u64(42);
    session.scatter_planes(4, Vec3::new(0.0, -1.5, -5.0), Vec2::new(6.0, 4.0), &mut rng);
    session
}

fn setup_scene(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    planes: Res<DetectedPlanes>,
) {
    // Matches the default pose and field of view of `SimCamera`.
    commands.spawn((
        Camera3d::default(),
        Projection::from(PerspectiveProjection {
            fov: 60f32.to_radians(),
            ..default()
        }),
        Transform::from_rotation(Quat::from_rotation_x(-std::f32::consts::FRAC_PI_4)),
    ));
    commands.spawn((
        DirectionalLight::default(),
        Transform::from_xyz(2.0, 4.0, 1.0).looking_at(Vec3::new(0.0, -1.5, -3.0), Vec3::Y),
    ));

    let plane_material = materials.add(StandardMaterial {
        base_color: Color::srgba(0.3, 0.6, 0.9, 0.6),
        alpha_mode: AlphaMode::Blend,
        ..default()
    });
    for plane in &planes.0 {
        commands.spawn((
            Mesh3d(meshes.add(Plane3d::default().mesh().size(plane.size.x, plane.size.y))),
            MeshMaterial3d(plane_material.clone()),
            Transform::from_translation(plane.center)
                .with_rotation(Quat::from_rotation_y(plane.yaw)),
        ));
    }

    commands.insert_resource(Visuals {
        character_mesh: meshes.add(Capsule3d::new(0.1, 0.3)),
        character_material: materials.add(Color::srgb(0.95, 0.55, 0.2)),
        marker_mesh: meshes.add(Cuboid::new(0.3, 0.02, 0.3)),
        marker_material: materials.add(Color::srgb(0.2, 0.8, 0.3)),
    });
}

fn load_settings(mut commands: Commands, assets: Res<AssetServer>) {
    commands.insert_resource(PlacementSettings::new(assets.load("demo.placement")));
}

/// Left mouse button down and up become touch phases.
fn mouse_as_touch(
    buttons: Res<ButtonInput<MouseButton>>,
    window: Single<&Window, With<PrimaryWindow>>,
    mut touches: MessageWriter<PlacementTouch>,
) {
    let Some(position) = window.cursor_position() else {
        return;
    };
    if buttons.just_pressed(MouseButton::Left) {
        touches.write(PlacementTouch::new(position, TouchPhase::Began));
    }
    if buttons.just_released(MouseButton::Left) {
        touches.write(PlacementTouch::new(position, TouchPhase::Ended));
    }
}

/// Space flips the spawn-mode toggle.
fn toggle_spawn_mode(
    keys: Res<ButtonInput<KeyCode>>,
    gate: Res<SpawnGate>,
    mut toggles: MessageWriter<SpawnModeToggled>,
) {
    if keys.just_pressed(KeyCode::Space) {
        toggles.write(SpawnModeToggled(!gate.0.is_on()));
    }
}

/// M shows a marker image; the spawner puts a character on it.
fn show_marker(
    mut commands: Commands,
    mut next_id: Local<u64>,
    keys: Res<ButtonInput<KeyCode>>,
    visuals: Option<Res<Visuals>>,
    mut updates: MessageWriter<TrackedImagesUpdate>,
) {
    let Some(visuals) = visuals else {
        return;
    };
    if !keys.just_pressed(KeyCode::KeyM) {
        return;
    }

    *next_id += 1;
    let image = TrackedImageId(*next_id);
    let x = (*next_id as f32 * 0.4) % 2.0 - 1.0;
    commands.spawn((
        TrackedImage(image),
        Mesh3d(visuals.marker_mesh.clone()),
        MeshMaterial3d(visuals.marker_material.clone()),
        Transform::from_xyz(x, -1.5, -2.0),
    ));
    updates.write(TrackedImagesUpdate(TrackedImagesChanged::new().with_added(image)));
}

fn dress_character(spawned: On<CharacterSpawned>, mut commands: Commands, visuals: Res<Visuals>) {
    commands.entity(spawned.entity).insert((
        Mesh3d(visuals.character_mesh.clone()),
        MeshMaterial3d(visuals.character_material.clone()),
    ));
}

fn log_placement(mut reader: MessageReader<PlacementMessage>, spawner: Res<CharacterSpawner>) {
    for message in reader.read() {
        match &message.event {
            PlacementEvent::Spawned { trigger, count, .. } => {
                info!("Spawned via {:?} ({count}/{})", trigger, spawner.0.config().max_count);
            }
            PlacementEvent::CapReached { count } => {
                info!("Cap reached at {count}; surfaces hidden.");
            }
            PlacementEvent::Rejected { reason, .. } => info!("Rejected: {:?}", reason),
            PlacementEvent::RaycastMissed { point } => info!("No surface under {:?}", point),
            _ => {}
        }
    }
}
