use bevy::prelude::*;
use bevy::window::PrimaryWindow;
use bevy_ar_placement::prelude::*;

const VIEWPORT: Vec2 = Vec2::new(540.0, 960.0);

#[derive(Component)]
struct GuidanceLabel;

/// The one plane the session knows about, for drawing.
#[derive(Resource)]
struct Floor(SimPlane);

fn main() {
    let mut session = SimulatedSession::new(SimCamera {
        viewport: VIEWPORT,
        ..default()
    })
    .with_anchor_support(true);
    session.discover_plane(SimPlane::horizontal(
        SurfaceId(1),
        Vec3::new(0.0, -1.5, -2.5),
        Vec2::new(3.0, 4.0),
    ));
    let floor = Floor(session.planes()[0]);

    App::new()
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: "single-slot placement".into(),
                resolution: (VIEWPORT.x as u32, VIEWPORT.y as u32).into(),
                ..default()
            }),
            ..default()
        }))
        .add_plugins(ArPlacementPlugin)
        .add_plugins(SingleSlotPlacementPlugin::new(
            PlacementConfig::new().with_offset(Vec3::new(0.0, 0.15, 0.0)),
        ))
        .insert_resource(ArBackend::new(session))
        .insert_resource(ArViewport(VIEWPORT))
        .insert_resource(floor)
        .add_systems(Startup, setup_scene)
        .add_systems(Update, (mouse_as_touch, remove_on_key, show_guidance, dress_indicator))
        .add_observer(dress_character)
        .run();
}

fn setup_scene(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    floor: Res<Floor>,
) {
    let floor = floor.0;
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
        Transform::from_xyz(2.0, 4.0, 1.0).looking_at(floor.center, Vec3::Y),
    ));
    commands.spawn((
        Mesh3d(meshes.add(Plane3d::default().mesh().size(floor.size.x, floor.size.y))),
        MeshMaterial3d(materials.add(Color::srgba(0.3, 0.6, 0.9, 0.6))),
        Transform::from_translation(floor.center),
    ));
    commands.spawn((
        GuidanceLabel,
        Text::new(""),
        Node {
            position_type: PositionType::Absolute,
            top: Val::Px(24.0),
            left: Val::Px(24.0),
            ..default()
        },
    ));
}

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

/// R removes the placed character.
fn remove_on_key(
    keys: Res<ButtonInput<KeyCode>>,
    mut requests: MessageWriter<RemovePlacedCharacter>,
) {
    if keys.just_pressed(KeyCode::KeyR) {
        requests.write(RemovePlacedCharacter);
    }
}

fn show_guidance(
    guidance: Res<PlacementGuidance>,
    mut label: Single<&mut Text, With<GuidanceLabel>>,
) {
    if guidance.is_changed() {
        label.0 = guidance.message.clone();
    }
}

fn dress_indicator(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    indicators: Query<Entity, Added<PlacementIndicatorMarker>>,
) {
    for indicator in &indicators {
        commands.entity(indicator).insert((
            Mesh3d(meshes.add(Torus::new(0.12, 0.15))),
            MeshMaterial3d(materials.add(Color::WHITE)),
        ));
    }
}

fn dress_character(
    added: On<Add, PlacedCharacter>,
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    commands.entity(added.entity).insert((
        Mesh3d(meshes.add(Capsule3d::new(0.1, 0.3))),
        MeshMaterial3d(materials.add(Color::srgb(0.95, 0.55, 0.2))),
    ));
}
