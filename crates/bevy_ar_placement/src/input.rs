use ar_placement::prelude::TouchPhase;
use bevy::input::touch::{TouchInput, TouchPhase as InputTouchPhase};
use bevy::prelude::*;

use crate::PlacementTouch;

/// Forwards raw touch input as [`PlacementTouch`] messages.
pub(crate) fn forward_touch_input(
    mut input: MessageReader<TouchInput>,
    mut touches: MessageWriter<PlacementTouch>,
) {
    for touch in input.read() {
        touches.write(PlacementTouch::new(touch.position, touch_phase(touch.phase)));
    }
}

pub(crate) fn touch_phase(phase: InputTouchPhase) -> TouchPhase {
    match phase {
        InputTouchPhase::Started => TouchPhase::Began,
        InputTouchPhase::Moved => TouchPhase::Moved,
        InputTouchPhase::Ended => TouchPhase::Ended,
        InputTouchPhase::Canceled => TouchPhase::Canceled,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_input_phases() {
        assert_eq!(touch_phase(InputTouchPhase::Started), TouchPhase::Began);
        assert_eq!(touch_phase(InputTouchPhase::Ended), TouchPhase::Ended);
        assert_eq!(touch_phase(InputTouchPhase::Canceled), TouchPhase::Canceled);
    }

    #[test]
    fn forwards_touch_input_in_order() {
        let mut app = App::new();
        app.add_message::<TouchInput>()
            .add_message::<PlacementTouch>()
            .add_systems(Update, forward_touch_input);

        let window = app.world_mut().spawn_empty().id();
        let mut input = app.world_mut().resource_mut::<Messages<TouchInput>>();
        for (phase, x) in [(InputTouchPhase::Started, 10.0), (InputTouchPhase::Ended, 20.0)] {
            input.write(TouchInput {
                phase,
                position: Vec2::new(x, 5.0),
                window,
                force: None,
                id: 0,
            });
        }

        app.update();

        let forwarded: Vec<PlacementTouch> = app
            .world_mut()
            .resource_mut::<Messages<PlacementTouch>>()
            .drain()
            .collect();
        assert_eq!(forwarded.len(), 2);
        assert_eq!(forwarded[0].phase, TouchPhase::Began);
        assert_eq!(forwarded[1].position, Vec2::new(20.0, 5.0));
    }
}
