//! Process-wide input bookkeeping.
//!
//! [`InputState`] remembers what the user is currently holding and where the
//! pointer last was. The embedding layer owns one instance per UI root,
//! attaches it when the root is shown and feeds it every raw input event;
//! gesture helpers read from it instead of keeping hidden global state.

use std::collections::HashSet;

use horizon_grid_core::Point;
use horizon_grid_core::logging::targets;

use super::event::{Key, KeyEvent, KeyboardModifiers, PointerEvent, PointerKind, PointerPhase};

/// Current modifier, key and pointer state of one UI root.
#[derive(Debug, Clone, Default)]
pub struct InputState {
    attached: bool,
    modifiers: KeyboardModifiers,
    pressed_keys: HashSet<Key>,
    last_pointer: Option<Point>,
    last_pointer_kind: Option<PointerKind>,
    touch_start: Option<PointerEvent>,
    hoverable_device: bool,
}

impl InputState {
    /// A detached state. `hoverable_device` seeds the hover capability
    /// until a mouse move proves it.
    pub fn new(hoverable_device: bool) -> Self {
        Self {
            hoverable_device,
            ..Self::default()
        }
    }

    /// Start tracking input.
    pub fn attach(&mut self) {
        if !self.attached {
            self.attached = true;
            tracing::trace!(target: targets::INPUT, "input state attached");
        }
    }

    /// Stop tracking input and forget everything transient.
    pub fn detach(&mut self) {
        self.attached = false;
        self.modifiers = KeyboardModifiers::NONE;
        self.pressed_keys.clear();
        self.touch_start = None;
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    /// Record a pointer event.
    pub fn handle_pointer(&mut self, event: &PointerEvent) {
        if !self.attached {
            return;
        }
        self.modifiers = event.modifiers;
        self.last_pointer = Some(event.client);
        self.last_pointer_kind = Some(event.kind);
        match (event.kind, event.phase) {
            (PointerKind::Touch, PointerPhase::Down) => self.touch_start = Some(event.clone()),
            (PointerKind::Touch, PointerPhase::Up) => self.touch_start = None,
            (PointerKind::Mouse, PointerPhase::Move) => self.hoverable_device = true,
            _ => {}
        }
    }

    /// Record a key event.
    pub fn handle_key(&mut self, event: &KeyEvent) {
        if !self.attached {
            return;
        }
        if event.pressed {
            self.pressed_keys.insert(event.key.clone());
        } else {
            self.pressed_keys.remove(&event.key);
        }
        let held = event.pressed;
        match event.key {
            Key::Control => self.modifiers.control = held,
            Key::Alt => self.modifiers.alt = held,
            Key::Shift => self.modifiers.shift = held,
            Key::Meta => self.modifiers.meta = held,
            _ => {}
        }
    }

    /// Modifiers currently held.
    pub fn modifiers(&self) -> KeyboardModifiers {
        self.modifiers
    }

    pub fn is_key_pressed(&self, key: &Key) -> bool {
        self.pressed_keys.contains(key)
    }

    pub fn last_pointer(&self) -> Option<Point> {
        self.last_pointer
    }

    pub fn last_pointer_kind(&self) -> Option<PointerKind> {
        self.last_pointer_kind
    }

    /// The touch start of the touch gesture in progress.
    pub fn touch_start(&self) -> Option<&PointerEvent> {
        self.touch_start.as_ref()
    }

    /// Whether the primary input device can hover.
    pub fn is_hoverable_device(&self) -> bool {
        self.hoverable_device
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detached_state_ignores_input() {
        let mut input = InputState::new(false);
        input.handle_key(&KeyEvent::down(Key::Control));
        assert!(!input.modifiers().control);
        assert!(input.last_pointer().is_none());
    }

    #[test]
    fn test_tracks_keys_and_pointer() {
        let mut input = InputState::new(false);
        input.attach();

        input.handle_key(&KeyEvent::down(Key::Control));
        assert!(input.modifiers().control);
        assert!(input.is_key_pressed(&Key::Control));
        input.handle_key(&KeyEvent::up(Key::Control));
        assert!(!input.modifiers().control);

        input.handle_pointer(&PointerEvent::touch_start(4.0, 5.0));
        assert_eq!(input.touch_start().map(|e| e.client), Some(Point::new(4.0, 5.0)));
        assert!(!input.is_hoverable_device());

        input.handle_pointer(&PointerEvent::mouse_move(10.0, 10.0));
        assert!(input.is_hoverable_device());
        assert_eq!(input.last_pointer_kind(), Some(PointerKind::Mouse));

        input.detach();
        assert!(input.touch_start().is_none());
    }
}
