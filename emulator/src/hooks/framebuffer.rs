use crate::constants::{DISPLAY_HEIGHT, DISPLAY_WIDTH};

use super::DisplayHook;

/// Headless monochrome screen.
///
/// The sprite origin wraps around the screen, pixels going past the right or bottom edge are
/// clipped.
#[derive(Clone, PartialEq, Eq)]
pub struct Framebuffer {
    pixels: [[bool; DISPLAY_WIDTH]; DISPLAY_HEIGHT],
}

impl Default for Framebuffer {
    fn default() -> Self {
        Self {
            pixels: [[false; DISPLAY_WIDTH]; DISPLAY_HEIGHT],
        }
    }
}

impl std::fmt::Debug for Framebuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Framebuffer {{ lit: {} }}", self.lit())
    }
}

impl Framebuffer {
    /// State of the pixel at (`x`, `y`), `None` if off-screen
    #[must_use]
    pub fn pixel(&self, x: usize, y: usize) -> Option<bool> {
        self.pixels.get(y)?.get(x).copied()
    }

    /// Number of lit pixels
    #[must_use]
    pub fn lit(&self) -> usize {
        self.pixels.iter().flatten().filter(|p| **p).count()
    }

    /// Rows of the screen, top first
    pub fn rows(&self) -> impl Iterator<Item = &[bool; DISPLAY_WIDTH]> + '_ {
        self.pixels.iter()
    }
}

impl std::fmt::Display for Framebuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for row in &self.pixels {
            let line: String = row.iter().map(|&p| if p { '#' } else { '.' }).collect();
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}

impl DisplayHook for Framebuffer {
    fn clear_screen(&mut self) {
        for row in &mut self.pixels {
            row.fill(false);
        }
    }

    fn draw_sprite(&mut self, x: u8, y: u8, sprite: &[u8]) -> bool {
        let x0 = usize::from(x) % DISPLAY_WIDTH;
        let y0 = usize::from(y) % DISPLAY_HEIGHT;
        let mut collided = false;

        for (dy, byte) in sprite.iter().enumerate() {
            let Some(row) = self.pixels.get_mut(y0 + dy) else {
                break;
            };

            for dx in 0..8 {
                if byte & (0x80 >> dx) == 0 {
                    continue;
                }
                let Some(pixel) = row.get_mut(x0 + dx) else {
                    break;
                };
                collided |= *pixel;
                *pixel = !*pixel;
            }
        }

        collided
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn xor_and_collision_test() {
        let mut fb = Framebuffer::default();
        assert!(!fb.draw_sprite(0, 0, &[0b1100_0000]));
        assert_eq!(fb.pixel(0, 0), Some(true));
        assert_eq!(fb.pixel(1, 0), Some(true));
        assert_eq!(fb.lit(), 2);

        // Overlaps on (1, 0) only
        assert!(fb.draw_sprite(1, 0, &[0b1000_0000]));
        assert_eq!(fb.pixel(1, 0), Some(false));
        assert_eq!(fb.lit(), 1);

        fb.clear_screen();
        assert_eq!(fb.lit(), 0);
    }

    #[test]
    fn wrap_and_clip_test() {
        let mut fb = Framebuffer::default();
        // Origin wraps: (66, 33) is (2, 1)
        fb.draw_sprite(66, 33, &[0x80]);
        assert_eq!(fb.pixel(2, 1), Some(true));

        // The right half of this row is clipped
        fb.clear_screen();
        fb.draw_sprite(60, 31, &[0xFF, 0xFF]);
        assert_eq!(fb.lit(), 4);
        assert_eq!(fb.pixel(63, 31), Some(true));
    }

    #[test]
    fn render_test() {
        let mut fb = Framebuffer::default();
        fb.draw_sprite(0, 0, &[0xA0]);
        let first = fb.to_string().lines().next().unwrap().to_owned();
        assert_eq!(&first[..4], "#.#.");
        assert_eq!(first.len(), DISPLAY_WIDTH);
    }
}
