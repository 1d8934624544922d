use ar_placement::prelude::*;
use ar_placement_examples::{demo_session, event_logger, init_tracing, VIEWPORT};
use glam::{Vec2, Vec3};
use tracing::info;

fn main() -> anyhow::Result<()> {
    init_tracing();

    let mut session = demo_session(7, 3).with_anchor_support(true);
    let mut entities = SimEntities::default();
    let mut events = event_logger();

    let config = PlacementConfig::new().with_offset(Vec3::new(0.0, 0.05, 0.0));
    let mut slot = SingleSlotController::try_new(config)?;

    let indicator = slot.update_indicator(VIEWPORT, &mut session, &mut events);
    info!("indicator: {indicator:?}, guidance: {}", slot.guidance_message());

    let touches = [
        Touch::began(VIEWPORT * 0.5),
        Touch::ended(VIEWPORT * 0.5),
        Touch::ended(Vec2::new(700.0, 1400.0)),
    ];
    for touch in touches {
        let mut ctx = ArContext::new(&mut session, &mut entities, &());
        let outcome = slot.handle_touch(touch, &mut ctx, &mut events);
        info!("{:?} at {:?}: {outcome:?}", touch.phase, touch.position);
        slot.update_indicator(VIEWPORT, &mut session, &mut events);
    }
    info!("guidance: {}", slot.guidance_message());

    if let Some(entity) = slot.current_entity() {
        let placed = entities.get(entity).map(|e| e.pose.position);
        info!("{:?} at {:?} with {} anchor(s)", entity, placed, session.anchor_count());
    }

    slot.remove_entity(&mut entities, &mut events);
    slot.update_indicator(VIEWPORT, &mut session, &mut events);
    info!("after removal: {} alive, guidance: {}", entities.alive_count(), slot.guidance_message());

    Ok(())
}
