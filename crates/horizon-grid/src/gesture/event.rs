//! Input event types consumed by the gesture state machines.
//!
//! Events are plain values in client (viewport) coordinates. The embedding
//! layer translates its native pointer and keyboard events into these and
//! feeds them to [`DragContext`](super::DragContext) or
//! [`ResizeHelper`](super::ResizeHelper).

use std::time::Duration;

use horizon_grid_core::Point;

use super::host::ElementId;

/// Modifier keys held while an event fired.
///
/// Drag contexts fold `meta` into `control`, so Cmd-drag on macOS behaves
/// like Ctrl-drag elsewhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct KeyboardModifiers {
    pub shift: bool,
    pub control: bool,
    /// Option on macOS.
    pub alt: bool,
    /// Cmd on macOS, Windows key elsewhere.
    pub meta: bool,
}

impl KeyboardModifiers {
    pub const NONE: Self = Self {
        shift: false,
        control: false,
        alt: false,
        meta: false,
    };
    pub const CTRL: Self = Self {
        control: true,
        ..Self::NONE
    };
    pub const ALT: Self = Self {
        alt: true,
        ..Self::NONE
    };
    pub const META: Self = Self {
        meta: true,
        ..Self::NONE
    };

    pub fn any(&self) -> bool {
        *self != Self::NONE
    }
}

/// Mouse buttons. Only the primary button grabs resize handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MouseButton {
    #[default]
    Left,
    Right,
    Middle,
}

/// The device that produced a pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PointerKind {
    #[default]
    Mouse,
    Touch,
    Pen,
}

/// Phase of a pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerPhase {
    Down,
    Move,
    Up,
}

/// A pointer (mouse, touch or pen) event.
#[derive(Debug, Clone, PartialEq)]
pub struct PointerEvent {
    pub kind: PointerKind,
    pub phase: PointerPhase,
    /// Position relative to the viewport.
    pub client: Point,
    /// Element the event was dispatched to.
    pub target: Option<ElementId>,
    pub button: MouseButton,
    pub modifiers: KeyboardModifiers,
    /// Number of active touch points.
    pub touches: usize,
    /// Time stamp relative to an arbitrary, fixed origin.
    pub time: Duration,
    /// Set on a replayed move caused by a modifier key change.
    pub is_key: bool,
    /// Set on a replayed move caused by auto scrolling.
    pub is_scroll: bool,
}

impl PointerEvent {
    /// Create an event of `kind` and `phase` at `(x, y)`.
    pub fn new(kind: PointerKind, phase: PointerPhase, x: f32, y: f32) -> Self {
        Self {
            kind,
            phase,
            client: Point::new(x, y),
            target: None,
            button: MouseButton::Left,
            modifiers: KeyboardModifiers::NONE,
            touches: usize::from(kind == PointerKind::Touch),
            time: Duration::ZERO,
            is_key: false,
            is_scroll: false,
        }
    }

    pub fn mouse_down(x: f32, y: f32) -> Self {
        Self::new(PointerKind::Mouse, PointerPhase::Down, x, y)
    }

    pub fn mouse_move(x: f32, y: f32) -> Self {
        Self::new(PointerKind::Mouse, PointerPhase::Move, x, y)
    }

    pub fn mouse_up(x: f32, y: f32) -> Self {
        Self::new(PointerKind::Mouse, PointerPhase::Up, x, y)
    }

    pub fn touch_start(x: f32, y: f32) -> Self {
        Self::new(PointerKind::Touch, PointerPhase::Down, x, y)
    }

    pub fn touch_move(x: f32, y: f32) -> Self {
        Self::new(PointerKind::Touch, PointerPhase::Move, x, y)
    }

    pub fn touch_end(x: f32, y: f32) -> Self {
        Self::new(PointerKind::Touch, PointerPhase::Up, x, y)
    }

    /// Set the target element.
    pub fn target(mut self, target: ElementId) -> Self {
        self.target = Some(target);
        self
    }

    /// Set the pressed button.
    pub fn button(mut self, button: MouseButton) -> Self {
        self.button = button;
        self
    }

    /// Set the held modifiers.
    pub fn modifiers(mut self, modifiers: KeyboardModifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Set the number of touch points.
    pub fn touches(mut self, touches: usize) -> Self {
        self.touches = touches;
        self
    }

    /// Set the time stamp.
    pub fn at(mut self, time: Duration) -> Self {
        self.time = time;
        self
    }

    /// Returns `true` for touch events.
    pub fn is_touch(&self) -> bool {
        self.kind == PointerKind::Touch
    }

    /// Euclidean distance between the positions of two events.
    pub fn distance_to(&self, other: &PointerEvent) -> f32 {
        self.client.distance_to(other.client)
    }
}

/// Keys the gesture state machines react to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    Escape,
    Control,
    Alt,
    Shift,
    Meta,
    /// Any other key, by name.
    Other(String),
}

/// A key press or release.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyEvent {
    pub key: Key,
    /// `true` for key down, `false` for key up.
    pub pressed: bool,
    pub modifiers: KeyboardModifiers,
}

impl KeyEvent {
    /// A key press.
    pub fn down(key: Key) -> Self {
        Self {
            key,
            pressed: true,
            modifiers: KeyboardModifiers::NONE,
        }
    }

    /// A key release.
    pub fn up(key: Key) -> Self {
        Self {
            key,
            pressed: false,
            modifiers: KeyboardModifiers::NONE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_builders() {
        let event = PointerEvent::touch_move(3.0, 4.0)
            .target(ElementId::from_raw(7))
            .at(Duration::from_millis(40));
        assert!(event.is_touch());
        assert_eq!(event.touches, 1);
        assert_eq!(event.target, Some(ElementId::from_raw(7)));
        assert_eq!(event.distance_to(&PointerEvent::mouse_down(0.0, 0.0)), 5.0);
    }

    #[test]
    fn test_modifiers_any() {
        assert!(!KeyboardModifiers::NONE.any());
        assert!(KeyboardModifiers::ALT.any());
    }
}
