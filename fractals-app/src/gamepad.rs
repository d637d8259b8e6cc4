//! `gilrs` backend for the engine's gamepad input.

use std::collections::HashMap;

use gilrs::{Axis, EventType, Gamepad, Gilrs};
use tracing::{debug, warn};

use fractals_engine::{GamepadEvent, GamepadSource};

/// Polls `gilrs` once per scheduler tick.
///
/// Axes are reported in the browser Gamepad API layout the engine expects:
/// `[left x, left y, right x, right y]` with y pointing down.
pub(crate) struct GilrsGamepad {
    gilrs: Option<Gilrs>,
    axes: HashMap<usize, Vec<f64>>,
    /// Pads already plugged in at startup, reported on the first drain.
    pending: Vec<GamepadEvent>,
}

impl GilrsGamepad {
    /// `None` when the platform has no gamepad support.
    pub(crate) fn new() -> Option<Self> {
        let gilrs = match Gilrs::new() {
            Ok(g) => g,
            Err(e) => {
                warn!("Gamepad support unavailable: {e}");
                return None;
            }
        };
        let pending = gilrs
            .gamepads()
            .map(|(id, pad)| GamepadEvent::Connected {
                index: usize::from(id),
                device_id: pad.name().to_string(),
            })
            .collect();
        debug!("Gamepad backend ready");
        Some(Self {
            gilrs: Some(gilrs),
            axes: HashMap::new(),
            pending,
        })
    }
}

/// Map raw stick positions to the engine's axis order.
pub(crate) fn engine_axes(left_x: f32, left_y: f32, right_x: f32, right_y: f32) -> Vec<f64> {
    vec![
        left_x as f64,
        -(left_y as f64),
        right_x as f64,
        -(right_y as f64),
    ]
}

fn read_axes(pad: &Gamepad<'_>) -> Vec<f64> {
    engine_axes(
        pad.value(Axis::LeftStickX),
        pad.value(Axis::LeftStickY),
        pad.value(Axis::RightStickX),
        pad.value(Axis::RightStickY),
    )
}

impl GamepadSource for GilrsGamepad {
    fn drain_events(&mut self) -> Vec<GamepadEvent> {
        let Some(gilrs) = self.gilrs.as_mut() else {
            return Vec::new();
        };

        let mut events = std::mem::take(&mut self.pending);
        while let Some(event) = gilrs.next_event() {
            let index = usize::from(event.id);
            match event.event {
                EventType::Connected => events.push(GamepadEvent::Connected {
                    index,
                    device_id: gilrs.gamepad(event.id).name().to_string(),
                }),
                EventType::Disconnected => {
                    self.axes.remove(&index);
                    events.push(GamepadEvent::Disconnected {
                        index,
                        device_id: gilrs.gamepad(event.id).name().to_string(),
                    });
                }
                _ => {}
            }
        }

        for (id, pad) in gilrs.gamepads() {
            self.axes.insert(usize::from(id), read_axes(&pad));
        }
        events
    }

    fn axes(&self, index: usize) -> Option<&[f64]> {
        self.axes.get(&index).map(Vec::as_slice)
    }

    fn release(&mut self) {
        self.gilrs = None;
        self.axes.clear();
        self.pending.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sticks_map_to_engine_layout() {
        let axes = engine_axes(0.5, 0.25, -0.75, 1.0);
        assert_eq!(axes, vec![0.5, -0.25, -0.75, -1.0]);
    }

    #[test]
    fn right_stick_up_zooms_in() {
        // The engine zooms in on a negative axis 3.
        let axes = engine_axes(0.0, 0.0, 0.0, 0.8);
        assert!(axes[3] < 0.0);
    }
}
