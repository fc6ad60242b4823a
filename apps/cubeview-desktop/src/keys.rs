use cubeview_input::{Direction, KeyState, ViewerEvent};
use std::collections::HashSet;
use winit::keyboard::KeyCode;

/// Movement binding for a physical key: WASD and the arrow keys.
pub fn direction_for(key: KeyCode) -> Option<Direction> {
    match key {
        KeyCode::KeyW | KeyCode::ArrowUp => Some(Direction::Forward),
        KeyCode::KeyS | KeyCode::ArrowDown => Some(Direction::Backward),
        KeyCode::KeyA | KeyCode::ArrowLeft => Some(Direction::Left),
        KeyCode::KeyD | KeyCode::ArrowRight => Some(Direction::Right),
        _ => None,
    }
}

/// Physical keys currently held, tracked from press/release events.
#[derive(Debug, Default)]
pub struct HeldKeys {
    held: HashSet<KeyCode>,
}

impl HeldKeys {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: KeyCode, pressed: bool) {
        if pressed {
            self.held.insert(key);
        } else {
            self.held.remove(&key);
        }
    }

    /// Track a keyboard event and return the viewer event it produces.
    ///
    /// Synthetic events (winit replays held keys when focus returns) update
    /// the held set but never count as a press.
    pub fn key_event(&mut self, key: KeyCode, pressed: bool, synthetic: bool) -> Option<ViewerEvent> {
        self.set(key, pressed);
        (pressed && !synthetic).then_some(ViewerEvent::KeyPressed)
    }

    /// Forget everything, e.g. when focus is lost and releases go unseen.
    pub fn clear(&mut self) {
        self.held.clear();
    }
}

impl KeyState for HeldKeys {
    fn is_down(&self, direction: Direction) -> bool {
        self.held
            .iter()
            .any(|key| direction_for(*key) == Some(direction))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wasd_and_arrows_map_alike() {
        assert_eq!(direction_for(KeyCode::KeyW), direction_for(KeyCode::ArrowUp));
        assert_eq!(direction_for(KeyCode::KeyS), direction_for(KeyCode::ArrowDown));
        assert_eq!(direction_for(KeyCode::KeyA), direction_for(KeyCode::ArrowLeft));
        assert_eq!(direction_for(KeyCode::KeyD), direction_for(KeyCode::ArrowRight));
        assert_eq!(direction_for(KeyCode::KeyQ), None);
    }

    #[test]
    fn sample_reflects_held_keys() {
        let mut keys = HeldKeys::new();
        keys.set(KeyCode::KeyW, true);
        keys.set(KeyCode::ArrowLeft, true);
        keys.set(KeyCode::Space, true);

        let sampled = keys.sample();
        assert_eq!(sampled.len(), 2);
        assert!(sampled.contains(Direction::Forward));
        assert!(sampled.contains(Direction::Left));
    }

    #[test]
    fn release_removes_key() {
        let mut keys = HeldKeys::new();
        keys.set(KeyCode::KeyD, true);
        keys.set(KeyCode::KeyD, false);
        assert!(keys.sample().is_empty());
    }

    #[test]
    fn both_bindings_held_count_once() {
        let mut keys = HeldKeys::new();
        keys.set(KeyCode::KeyS, true);
        keys.set(KeyCode::ArrowDown, true);
        assert_eq!(keys.sample().len(), 1);

        keys.set(KeyCode::KeyS, false);
        assert!(keys.is_down(Direction::Backward));
        keys.clear();
        assert!(!keys.is_down(Direction::Backward));
    }

    #[test]
    fn synthetic_press_on_refocus_is_not_a_key_press() {
        let mut keys = HeldKeys::new();

        assert_eq!(keys.key_event(KeyCode::KeyW, true, true), None);
        assert!(keys.is_down(Direction::Forward));

        assert_eq!(
            keys.key_event(KeyCode::KeyW, true, false),
            Some(ViewerEvent::KeyPressed)
        );
        assert_eq!(keys.key_event(KeyCode::KeyW, false, false), None);
        assert!(!keys.is_down(Direction::Forward));
    }
}
