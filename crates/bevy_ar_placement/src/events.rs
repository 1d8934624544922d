use ar_placement::prelude::{PlacementEvent, VecSink};
use bevy::prelude::*;

/// Bevy message wrapping one [`PlacementEvent`] from either placement strategy.
#[derive(Message, Debug, Clone)]
pub struct PlacementMessage {
    pub event: PlacementEvent,
}

/// Writes buffered events as messages, preserving their order.
///
/// Systems collect into a [`VecSink`] while the entity host holds `Commands`,
/// then flush once the host is gone.
pub(crate) fn write_messages(sink: VecSink, writer: &mut MessageWriter<PlacementMessage>) {
    for event in sink.into_inner() {
        writer.write(PlacementMessage { event });
    }
}
