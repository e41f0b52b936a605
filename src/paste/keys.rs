//! Key operations and the two injection phases of a paste gesture.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::collaborators::KeyStateSource;

/// Logical key identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    LeftCtrl,
    RightCtrl,
    LeftShift,
    RightShift,
    LeftAlt,
    Insert,
    V,
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyDirection {
    Down,
    Up,
}

/// One synthetic key event. A phase is an ordered batch of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyOperation {
    pub key: Key,
    pub direction: KeyDirection,
}

impl KeyOperation {
    pub fn down(key: Key) -> Self {
        Self {
            key,
            direction: KeyDirection::Down,
        }
    }

    pub fn up(key: Key) -> Self {
        Self {
            key,
            direction: KeyDirection::Up,
        }
    }
}

impl fmt::Display for KeyOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.direction {
            KeyDirection::Down => write!(f, "{} down", self.key),
            KeyDirection::Up => write!(f, "{} up", self.key),
        }
    }
}

/// Key states observed at the start of one paste cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CapturedKeys {
    pub modifier_down: bool,
    pub letter_down: bool,
}

impl CapturedKeys {
    pub fn any_down(&self) -> bool {
        self.modifier_down || self.letter_down
    }
}

/// Modifier and letter that make up the paste shortcut.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasteGesture {
    pub modifier: Key,
    pub letter: Key,
}

impl Default for PasteGesture {
    fn default() -> Self {
        Self {
            modifier: Key::LeftCtrl,
            letter: Key::V,
        }
    }
}

impl PasteGesture {
    pub fn new(modifier: Key, letter: Key) -> Self {
        Self { modifier, letter }
    }

    pub fn capture(&self, source: &dyn KeyStateSource) -> CapturedKeys {
        CapturedKeys {
            modifier_down: source.is_key_down(self.modifier),
            letter_down: source.is_key_down(self.letter),
        }
    }

    /// Operations that press the shortcut.
    ///
    /// The modifier goes down only if it is not held already; the letter is
    /// always sent as a down/up pair. Nothing here releases the modifier, and
    /// when no key was held [`second_phase`](Self::second_phase) is empty, so
    /// a `KeySender` is left with the modifier logically down.
    pub fn first_phase(&self, captured: CapturedKeys) -> Vec<KeyOperation> {
        let mut operations = Vec::with_capacity(3);
        if !captured.modifier_down {
            operations.push(KeyOperation::down(self.modifier));
        }
        operations.push(KeyOperation::down(self.letter));
        operations.push(KeyOperation::up(self.letter));
        operations
    }

    /// Operations that put back keys the user was holding when the cycle
    /// began. Empty when nothing was held.
    pub fn second_phase(&self, captured: CapturedKeys) -> Vec<KeyOperation> {
        let mut operations = Vec::with_capacity(2);
        if captured.modifier_down {
            operations.push(KeyOperation::down(self.modifier));
        }
        if captured.letter_down {
            operations.push(KeyOperation::down(self.letter));
        }
        operations
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn captured(modifier_down: bool, letter_down: bool) -> CapturedKeys {
        CapturedKeys {
            modifier_down,
            letter_down,
        }
    }

    #[test]
    fn test_both_up() {
        let gesture = PasteGesture::default();
        let state = captured(false, false);
        assert_eq!(
            gesture.first_phase(state),
            vec![
                KeyOperation::down(Key::LeftCtrl),
                KeyOperation::down(Key::V),
                KeyOperation::up(Key::V),
            ]
        );
        assert!(gesture.second_phase(state).is_empty());
        assert!(!state.any_down());
    }

    #[test]
    fn test_modifier_held() {
        let gesture = PasteGesture::default();
        let state = captured(true, false);
        assert_eq!(
            gesture.first_phase(state),
            vec![KeyOperation::down(Key::V), KeyOperation::up(Key::V)]
        );
        assert_eq!(gesture.second_phase(state), vec![KeyOperation::down(Key::LeftCtrl)]);
    }

    #[test]
    fn test_letter_held() {
        let gesture = PasteGesture::default();
        let state = captured(false, true);
        assert_eq!(
            gesture.first_phase(state),
            vec![
                KeyOperation::down(Key::LeftCtrl),
                KeyOperation::down(Key::V),
                KeyOperation::up(Key::V),
            ]
        );
        assert_eq!(gesture.second_phase(state), vec![KeyOperation::down(Key::V)]);
    }

    #[test]
    fn test_both_held_restores_modifier_first() {
        let gesture = PasteGesture::new(Key::LeftShift, Key::Insert);
        let state = captured(true, true);
        assert_eq!(
            gesture.first_phase(state),
            vec![KeyOperation::down(Key::Insert), KeyOperation::up(Key::Insert)]
        );
        assert_eq!(
            gesture.second_phase(state),
            vec![KeyOperation::down(Key::LeftShift), KeyOperation::down(Key::Insert)]
        );
    }

    #[test]
    fn test_operation_display() {
        assert_eq!(KeyOperation::down(Key::LeftCtrl).to_string(), "LeftCtrl down");
        assert_eq!(KeyOperation::up(Key::V).to_string(), "V up");
    }
}
