use ar_placement::prelude::*;
use ar_placement_examples::{demo_session, event_logger, init_tracing, VIEWPORT};
use glam::Vec2;
use tracing::info;

fn main() -> anyhow::Result<()> {
    init_tracing();

    let mut session = demo_session(2025, 6);
    let mut entities = SimEntities::default();
    let mut events = event_logger();

    // Three characters at most; markers ignore the gate.
    let mut spawner = TouchSpawner::try_new(SpawnerConfig::new(3))?;
    let mut gate = SpawnModeGate::new(true);
    gate.activate(&mut spawner);

    // A button strip along the bottom edge swallows touches.
    let buttons = vec![ScreenRect::from_origin_size(
        Vec2::new(0.0, VIEWPORT.y - 160.0),
        Vec2::new(VIEWPORT.x, 160.0),
    )];

    let taps = [
        Vec2::new(540.0, 1850.0), // on the button strip
        VIEWPORT * 0.5,
        Vec2::new(700.0, 1400.0), // spawn mode is off again
    ];
    for point in taps {
        let mut ctx = ArContext::new(&mut session, &mut entities, &buttons);
        let outcome = spawner.handle_finger_down(point, &mut ctx, &mut events);
        info!("tap at {point:?}: {outcome:?}");
        gate.sync(&mut spawner, &mut session, &mut events);
    }

    // Re-arm for every further tap until the cap closes the surfaces.
    for point in [Vec2::new(700.0, 1400.0), Vec2::new(400.0, 1200.0), VIEWPORT * 0.5] {
        gate.set_toggle(true, &mut spawner, &mut session, &mut events);
        let mut ctx = ArContext::new(&mut session, &mut entities, &buttons);
        let outcome = spawner.handle_finger_down(point, &mut ctx, &mut events);
        info!("tap at {point:?}: {outcome:?}");
        gate.sync(&mut spawner, &mut session, &mut events);
    }

    let markers = TrackedImagesChanged::new()
        .with_added(TrackedImageId(1))
        .with_updated(TrackedImageId(1));
    spawner.handle_tracked_images(&markers, &mut session, &mut entities, &mut events);
    gate.sync(&mut spawner, &mut session, &mut events);

    info!(
        "{} character(s), counter {} of {}, surfaces active: {}",
        entities.alive_count(),
        spawner.spawned_count(),
        spawner.config().max_count,
        session.surfaces_active()
    );

    gate.deactivate(&mut spawner);
    Ok(())
}
