#![forbid(unsafe_code)]

use ar_placement::prelude::*;
use glam::{Vec2, Vec3};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Screen size used by every walkthrough.
pub const VIEWPORT: Vec2 = Vec2::new(1080.0, 1920.0);

/// Installs a `fmt` subscriber honoring `RUST_LOG`, defaulting to `info`.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// A simulated session with a floor plane ahead of the camera and a few
/// seeded random planes around it.
pub fn demo_session(seed: u64, extra_planes: usize) -> SimulatedSession {
    let mut session = SimulatedSession::default();
    session.discover_plane(SimPlane::horizontal(
        SurfaceId(1),
        Vec3::new(0.0, -1.5, -2.0),
        Vec2::splat(4.0),
    ));
    let mut rng = StdRng::seed_from_u64(seed);
    session.scatter_planes(
        extra_planes,
        Vec3::new(0.0, -1.5, -4.0),
        Vec2::new(8.0, 6.0),
        &mut rng,
    );
    session
}

/// Event sink that logs one line per event as it is emitted.
pub fn event_logger() -> FnSink<fn(PlacementEvent)> {
    FnSink::new(log_event as fn(PlacementEvent))
}

fn log_event(event: PlacementEvent) {
    match event {
        PlacementEvent::Spawned {
            entity,
            trigger,
            count,
        } => info!("spawned {:?} via {:?} (count {count})", entity, trigger),
        PlacementEvent::Placed { entity, pose, .. } => {
            info!("placed {:?} at {:?}", entity, pose.position)
        }
        PlacementEvent::Repositioned { entity, pose } => {
            info!("moved {:?} to {:?}", entity, pose.position)
        }
        PlacementEvent::Rejected { point, reason } => {
            info!("rejected {:?}: {:?}", point, reason)
        }
        other => info!("{:?}", other),
    }
}
