//! Memory-mapped peripherals reached through the address space.

/// Keyboard input queue.
pub mod keyboard;
/// Video buffer and text screen layout.
pub mod video;

pub use keyboard::KeyboardBuffer;
pub use video::{ScreenGeometry, VideoBuffer, DEFAULT_SCREEN_HEIGHT, DEFAULT_SCREEN_WIDTH};
