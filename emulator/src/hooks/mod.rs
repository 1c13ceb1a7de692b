//! Capabilities the machine calls outward through.
//!
//! The interpreter does not own a screen nor a keyboard: sprite drawing and key queries are
//! delegated to a [`DisplayHook`] and an [`InputHook`] given to each
//! [`Computer::step`](crate::runtime::Computer::step). Diagnostics go to a [`TraceSink`] owned by
//! the machine.

mod framebuffer;
mod keypad;
mod trace;

pub use self::framebuffer::Framebuffer;
pub use self::keypad::Keypad;
pub use self::trace::{RecordingSink, TraceSink, TracingSink};

pub trait DisplayHook {
    /// Turn every pixel off
    fn clear_screen(&mut self);

    /// XOR a sprite onto the screen with its top-left corner at (`x`, `y`). Each byte of
    /// `sprite` is one 8-pixel row, most significant bit on the left.
    ///
    /// Returns `true` if any lit pixel was turned off.
    fn draw_sprite(&mut self, x: u8, y: u8, sprite: &[u8]) -> bool;
}

pub trait InputHook {
    /// Whether the key `code` (`0x0..=0xF`) is currently held down
    fn is_key_pressed(&self, code: u8) -> bool;
}

impl<T: DisplayHook + ?Sized> DisplayHook for &mut T {
    fn clear_screen(&mut self) {
        (**self).clear_screen();
    }

    fn draw_sprite(&mut self, x: u8, y: u8, sprite: &[u8]) -> bool {
        (**self).draw_sprite(x, y, sprite)
    }
}

impl<T: InputHook + ?Sized> InputHook for &T {
    fn is_key_pressed(&self, code: u8) -> bool {
        (**self).is_key_pressed(code)
    }
}
