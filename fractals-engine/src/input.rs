use std::collections::HashMap;
use std::sync::mpsc::{self, Receiver, Sender};

use tracing::{debug, info};

use fractals_core::ViewportTransform;

use crate::settings::GamepadTuning;

// ---------------------------------------------------------------------------
// Gamepad source
// ---------------------------------------------------------------------------

/// Connection change reported by a gamepad backend.
#[derive(Debug, Clone, PartialEq)]
pub enum GamepadEvent {
    Connected { index: usize, device_id: String },
    Disconnected { index: usize, device_id: String },
}

/// Connection change surfaced to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GamepadConnection {
    pub device_id: String,
    pub connected: bool,
}

/// A polled gamepad backend, injected into [`InputAdapter`].
pub trait GamepadSource {
    /// Connection events since the previous call.
    fn drain_events(&mut self) -> Vec<GamepadEvent>;

    /// Current axis positions of pad `index`, in `[-1, 1]`.
    fn axes(&self, index: usize) -> Option<&[f64]>;

    /// Stop listening. Called once on shutdown.
    fn release(&mut self) {}
}

/// Message sent into a [`ChannelGamepad`].
#[derive(Debug, Clone)]
enum GamepadMessage {
    Connected { index: usize, device_id: String },
    Disconnected { index: usize, device_id: String },
    Axes { index: usize, axes: Vec<f64> },
}

/// A [`GamepadSource`] fed over a channel, for backends that run on another
/// thread and for tests.
pub struct ChannelGamepad {
    rx: Option<Receiver<GamepadMessage>>,
    axes: HashMap<usize, Vec<f64>>,
}

/// Sending half of a [`ChannelGamepad`].
#[derive(Debug, Clone)]
pub struct GamepadFeed {
    tx: Sender<GamepadMessage>,
}

impl ChannelGamepad {
    pub fn new() -> (Self, GamepadFeed) {
        let (tx, rx) = mpsc::channel();
        (
            Self {
                rx: Some(rx),
                axes: HashMap::new(),
            },
            GamepadFeed { tx },
        )
    }
}

impl GamepadFeed {
    /// Returns `false` once the source has been released.
    pub fn connect(&self, index: usize, device_id: impl Into<String>) -> bool {
        self.tx
            .send(GamepadMessage::Connected {
                index,
                device_id: device_id.into(),
            })
            .is_ok()
    }

    pub fn disconnect(&self, index: usize, device_id: impl Into<String>) -> bool {
        self.tx
            .send(GamepadMessage::Disconnected {
                index,
                device_id: device_id.into(),
            })
            .is_ok()
    }

    pub fn set_axes(&self, index: usize, axes: Vec<f64>) -> bool {
        self.tx.send(GamepadMessage::Axes { index, axes }).is_ok()
    }
}

impl GamepadSource for ChannelGamepad {
    fn drain_events(&mut self) -> Vec<GamepadEvent> {
        let Some(rx) = &self.rx else {
            return Vec::new();
        };
        let mut events = Vec::new();
        for message in rx.try_iter() {
            match message {
                GamepadMessage::Axes { index, axes } => {
                    self.axes.insert(index, axes);
                }
                GamepadMessage::Connected { index, device_id } => {
                    events.push(GamepadEvent::Connected { index, device_id });
                }
                GamepadMessage::Disconnected { index, device_id } => {
                    self.axes.remove(&index);
                    events.push(GamepadEvent::Disconnected { index, device_id });
                }
            }
        }
        events
    }

    fn axes(&self, index: usize) -> Option<&[f64]> {
        self.axes.get(&index).map(Vec::as_slice)
    }

    fn release(&mut self) {
        self.rx = None;
        self.axes.clear();
    }
}

// ---------------------------------------------------------------------------
// Input adapter
// ---------------------------------------------------------------------------

/// Turns pointer, wheel, and gamepad input into viewport pan and zoom.
///
/// Only one gamepad is followed at a time: the most recently connected one.
pub struct InputAdapter {
    tuning: GamepadTuning,
    dragging: bool,
    gamepad: Option<Box<dyn GamepadSource>>,
    active_pad: Option<usize>,
}

impl InputAdapter {
    pub fn new(tuning: GamepadTuning) -> Self {
        Self {
            tuning,
            dragging: false,
            gamepad: None,
            active_pad: None,
        }
    }

    pub fn with_gamepad(mut self, source: Box<dyn GamepadSource>) -> Self {
        self.gamepad = Some(source);
        self
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    pub fn active_pad(&self) -> Option<usize> {
        self.active_pad
    }

    pub fn pointer_pressed(&mut self) {
        self.dragging = true;
    }

    pub fn pointer_released(&mut self) {
        self.dragging = false;
    }

    /// Pan by the pointer movement while a button is held. Returns whether
    /// the viewport changed.
    pub fn pointer_moved(&mut self, dx: f64, dy: f64, viewport: &mut ViewportTransform) -> bool {
        if !self.dragging || (dx == 0.0 && dy == 0.0) {
            return false;
        }
        viewport.pan(dx, dy);
        true
    }

    pub fn wheel(&mut self, delta_y: f64, viewport: &mut ViewportTransform) -> bool {
        viewport.zoom(delta_y)
    }

    /// Process connection changes, then apply the followed pad's sticks.
    ///
    /// Left stick pans against its deflection; right stick vertical zooms.
    pub fn poll_gamepad(&mut self, viewport: &mut ViewportTransform) -> Vec<GamepadConnection> {
        let Some(source) = self.gamepad.as_mut() else {
            return Vec::new();
        };

        let mut connections = Vec::new();
        for event in source.drain_events() {
            match event {
                GamepadEvent::Connected { index, device_id } => {
                    info!(index, device_id = %device_id, "Gamepad connected");
                    self.active_pad = Some(index);
                    connections.push(GamepadConnection {
                        device_id,
                        connected: true,
                    });
                }
                GamepadEvent::Disconnected { index, device_id } => {
                    info!(index, device_id = %device_id, "Gamepad disconnected");
                    if self.active_pad == Some(index) {
                        self.active_pad = None;
                    }
                    connections.push(GamepadConnection {
                        device_id,
                        connected: false,
                    });
                }
            }
        }

        let Some(index) = self.active_pad else {
            return connections;
        };
        let Some(axes) = source.axes(index) else {
            return connections;
        };
        let axis = |i: usize| axes.get(i).copied().unwrap_or(0.0);
        let live = |v: f64| if v.abs() > self.tuning.dead_zone { v } else { 0.0 };

        let x_move = live(axis(0)) * self.tuning.move_modifier;
        let y_move = live(axis(1)) * self.tuning.move_modifier;
        if x_move != 0.0 || y_move != 0.0 {
            viewport.pan(-x_move, -y_move);
        }

        let zoom = live(axis(3));
        if zoom != 0.0 {
            viewport.zoom(zoom * self.tuning.scroll_modifier);
        }

        connections
    }

    /// Detach from the gamepad backend. Idempotent.
    pub fn release_gamepad(&mut self) {
        if let Some(mut source) = self.gamepad.take() {
            source.release();
            self.active_pad = None;
            debug!("Gamepad source released");
        }
    }
}

impl Drop for InputAdapter {
    fn drop(&mut self) {
        self.release_gamepad();
    }
}

impl std::fmt::Debug for InputAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InputAdapter")
            .field("dragging", &self.dragging)
            .field("has_gamepad", &self.gamepad.is_some())
            .field("active_pad", &self.active_pad)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fractals_core::{NavigationLimits, Tiling};

    fn vt() -> ViewportTransform {
        ViewportTransform::new(800, 600, Tiling::new(2, 4).unwrap(), NavigationLimits::default())
            .unwrap()
    }

    fn adapter_with_pad() -> (InputAdapter, GamepadFeed) {
        let (pad, feed) = ChannelGamepad::new();
        let adapter = InputAdapter::new(GamepadTuning::default()).with_gamepad(Box::new(pad));
        (adapter, feed)
    }

    #[test]
    fn drag_pans_only_while_pressed() {
        let mut input = InputAdapter::new(GamepadTuning::default());
        let mut vt = vt();
        let before = vt.plane();
        assert!(!input.pointer_moved(10.0, 0.0, &mut vt));
        assert_eq!(vt.plane(), before);

        input.pointer_pressed();
        assert!(input.pointer_moved(10.0, 0.0, &mut vt));
        assert!((vt.plane().x_min - (before.x_min - 0.04)).abs() < 1e-12);

        input.pointer_released();
        assert!(!input.is_dragging());
        assert!(!input.pointer_moved(10.0, 0.0, &mut vt));
    }

    #[test]
    fn wheel_zooms() {
        let mut input = InputAdapter::new(GamepadTuning::default());
        let mut vt = vt();
        let before = vt.plane();
        assert!(input.wheel(-5.0, &mut vt));
        assert!(vt.plane().width() < before.width());
    }

    #[test]
    fn connect_and_disconnect_are_reported() {
        let (mut input, feed) = adapter_with_pad();
        let mut vt = vt();
        feed.connect(2, "pad-a");
        let events = input.poll_gamepad(&mut vt);
        assert_eq!(
            events,
            vec![GamepadConnection {
                device_id: "pad-a".into(),
                connected: true
            }]
        );
        assert_eq!(input.active_pad(), Some(2));

        feed.disconnect(7, "other");
        input.poll_gamepad(&mut vt);
        assert_eq!(input.active_pad(), Some(2), "non-matching disconnect keeps pad");

        feed.disconnect(2, "pad-a");
        let events = input.poll_gamepad(&mut vt);
        assert!(!events[0].connected);
        assert_eq!(input.active_pad(), None);
    }

    #[test]
    fn dead_zone_filters_small_deflection() {
        let (mut input, feed) = adapter_with_pad();
        let mut vt = vt();
        feed.connect(0, "pad");
        feed.set_axes(0, vec![0.05, -0.1, 0.9, 0.08]);
        input.poll_gamepad(&mut vt);
        vt.take_dirty();
        let before = vt.plane();
        input.poll_gamepad(&mut vt);
        assert_eq!(vt.plane(), before);
        assert!(!vt.is_dirty());
    }

    #[test]
    fn left_stick_pans_against_deflection() {
        let (mut input, feed) = adapter_with_pad();
        let mut vt = vt();
        feed.connect(0, "pad");
        feed.set_axes(0, vec![0.5, 0.0]);
        let before = vt.plane();
        input.poll_gamepad(&mut vt);
        // pan(-12.5, 0): x shifts by +0.005 × 12.5 × 0.8 = +0.05.
        assert!((vt.plane().x_min - (before.x_min + 0.05)).abs() < 1e-12);
        assert_eq!(vt.plane().y_min, before.y_min);
    }

    #[test]
    fn right_stick_zooms() {
        let (mut input, feed) = adapter_with_pad();
        let mut vt = vt();
        feed.connect(0, "pad");
        feed.set_axes(0, vec![0.0, 0.0, 0.0, -1.0]);
        let before = vt.plane();
        input.poll_gamepad(&mut vt);
        assert!(vt.plane().width() < before.width());
    }

    #[test]
    fn release_stops_the_feed() {
        let (mut input, feed) = adapter_with_pad();
        input.release_gamepad();
        assert!(!feed.connect(0, "late"));
        assert!(input.poll_gamepad(&mut vt()).is_empty());
    }
}
