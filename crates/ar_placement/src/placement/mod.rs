//! Placement strategies and the gate that arms them.
//!
//! - [`spawner::TouchSpawner`]: many characters from taps and markers, capped
//! - [`single_slot::SingleSlotController`]: one character, placed then optionally moved
//! - [`gate::SpawnModeGate`]: one-shot arming of the spawner from a UI toggle
//! - [`events`]: the event stream every strategy reports into
pub mod events;
pub mod gate;
pub mod single_slot;
pub mod spawner;
