pub type Address = u16;
pub type Word = u8;
pub type Opcode = u16;

/// Total size of the machine memory
pub const MEMORY_SIZE: usize = 4096;

/// Highest valid address
pub const MAX_ADDRESS: Address = 0xFFF;

/// Default place to store the beginning of the program
pub const PROGRAM_START: Address = 0x200;

/// Largest program image that fits between [`PROGRAM_START`] and the end of memory
pub const MAX_PROGRAM_SIZE: usize = MEMORY_SIZE - PROGRAM_START as usize;

/// Number of general purpose registers
pub const REGISTER_COUNT: usize = 16;

/// Depth of the call stack
pub const STACK_DEPTH: usize = 16;

/// Address of the first hexadecimal digit glyph
pub const FONT_START: Address = 0x050;

/// Size in bytes of a single glyph
pub const FONT_GLYPH_SIZE: Address = 5;

/// Number of keys on the hexadecimal keypad
pub const KEY_COUNT: usize = 16;

pub const DISPLAY_WIDTH: usize = 64;
pub const DISPLAY_HEIGHT: usize = 32;

/// Rate at which the delay and sound timers are decremented, in Hz
pub const TIMER_FREQUENCY: u32 = 60;

/// Built-in sprites for the hexadecimal digits `0` to `F`
pub const FONT: [Word; 16 * FONT_GLYPH_SIZE as usize] = [
    0xF0, 0x90, 0x90, 0x90, 0xF0, // 0
    0x20, 0x60, 0x20, 0x20, 0x70, // 1
    0xF0, 0x10, 0xF0, 0x80, 0xF0, // 2
    0xF0, 0x10, 0xF0, 0x10, 0xF0, // 3
    0x90, 0x90, 0xF0, 0x10, 0x10, // 4
    0xF0, 0x80, 0xF0, 0x10, 0xF0, // 5
    0xF0, 0x80, 0xF0, 0x90, 0xF0, // 6
    0xF0, 0x10, 0x20, 0x40, 0x40, // 7
    0xF0, 0x90, 0xF0, 0x90, 0xF0, // 8
    0xF0, 0x90, 0xF0, 0x10, 0xF0, // 9
    0xF0, 0x90, 0xF0, 0x90, 0x90, // A
    0xE0, 0x90, 0xE0, 0x90, 0xE0, // B
    0xF0, 0x80, 0x80, 0x80, 0xF0, // C
    0xE0, 0x90, 0x90, 0x90, 0xE0, // D
    0xF0, 0x80, 0xF0, 0x80, 0xF0, // E
    0xF0, 0x80, 0xF0, 0x80, 0x80, // F
];
