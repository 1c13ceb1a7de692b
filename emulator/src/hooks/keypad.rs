use crate::constants::KEY_COUNT;

use super::InputHook;

/// State of the 16-key hexadecimal keypad
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Keypad {
    keys: [bool; KEY_COUNT],
}

impl Keypad {
    /// Press or release a key. Codes above `0xF` are ignored.
    pub fn set(&mut self, code: u8, pressed: bool) {
        if let Some(key) = self.keys.get_mut(usize::from(code)) {
            *key = pressed;
        }
    }

    pub fn press(&mut self, code: u8) {
        self.set(code, true);
    }

    pub fn release(&mut self, code: u8) {
        self.set(code, false);
    }

    pub fn release_all(&mut self) {
        self.keys = [false; KEY_COUNT];
    }

    /// Codes of the keys currently held down
    pub fn pressed(&self) -> impl Iterator<Item = u8> + '_ {
        (0u8..).zip(self.keys).filter_map(|(code, down)| down.then_some(code))
    }
}

impl InputHook for Keypad {
    fn is_key_pressed(&self, code: u8) -> bool {
        self.keys.get(usize::from(code)).copied().unwrap_or(false)
    }
}
