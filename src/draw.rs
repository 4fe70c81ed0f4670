// Window wrapper + software drawing utilities.
//
// The window shows the composited video; the helpers below draw the tip
// indicator and the HUD status line directly into the pixel buffer.

use font8x8::{BASIC_FONTS, UnicodeFonts};
use minifb::{Key, KeyRepeat, Window, WindowOptions};

use crate::error::Error;
use crate::types::Frame;

/// One user action decoded from the keyboard, polled once per tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Control {
    SelectColor(usize),
    BrushUp,
    BrushDown,
    ToggleDrawing,
    ToggleMask,
    Undo,
    Clear,
    Save,
}

pub struct Drawer {
    window: Window,
}

impl Drawer {
    /// Create a window sized to the camera feed.
    pub fn new(title: &str, width: usize, height: usize) -> Result<Self, Error> {
        let mut window = Window::new(title, width, height, WindowOptions::default())
            .map_err(|e| Error::WindowInit(e.to_string()))?;
        window.set_target_fps(60);
        Ok(Self { window })
    }

    /// Push the pixels for this frame to the screen.
    pub fn present(&mut self, frame: &Frame) -> Result<(), Error> {
        self.window
            .update_with_buffer(&frame.pixels, frame.width, frame.height)
            .map_err(|e| Error::WindowUpdate(e.to_string()))?;
        Ok(())
    }

    /// Returns false when the user closes the window.
    pub fn is_open(&self) -> bool {
        self.window.is_open()
    }

    pub fn esc_pressed(&self) -> bool {
        self.window.is_key_down(Key::Escape)
    }

    /// Collect the controls pressed since the last tick. Brush sizing
    /// repeats while held; everything else fires once per press.
    pub fn controls(&self) -> Vec<Control> {
        let mut out = Vec::new();
        const COLOR_KEYS: [Key; 6] =
            [Key::Key1, Key::Key2, Key::Key3, Key::Key4, Key::Key5, Key::Key6];
        for (i, key) in COLOR_KEYS.iter().enumerate() {
            if self.window.is_key_pressed(*key, KeyRepeat::No) {
                out.push(Control::SelectColor(i));
            }
        }
        if self.window.is_key_pressed(Key::RightBracket, KeyRepeat::Yes) {
            out.push(Control::BrushUp);
        }
        if self.window.is_key_pressed(Key::LeftBracket, KeyRepeat::Yes) {
            out.push(Control::BrushDown);
        }
        if self.window.is_key_pressed(Key::D, KeyRepeat::No) {
            out.push(Control::ToggleDrawing);
        }
        if self.window.is_key_pressed(Key::M, KeyRepeat::No) {
            out.push(Control::ToggleMask);
        }
        if self.window.is_key_pressed(Key::U, KeyRepeat::No) {
            out.push(Control::Undo);
        }
        if self.window.is_key_pressed(Key::C, KeyRepeat::No) {
            out.push(Control::Clear);
        }
        if self.window.is_key_pressed(Key::S, KeyRepeat::No) {
            out.push(Control::Save);
        }
        out
    }
}

/* ---------- Software drawing: pixels, circles, HUD text ---------- */

#[inline]
pub fn put_pixel(fb: &mut Frame, x: i32, y: i32, color: u32) {
    if x < 0 || y < 0 {
        return;
    }
    let (x, y) = (x as usize, y as usize);
    if x >= fb.width || y >= fb.height {
        return;
    }
    fb.pixels[y * fb.width + x] = color;
}

/// Circle outline, two pixels thick.
pub fn draw_circle(fb: &mut Frame, cx: i32, cy: i32, radius: i32, color: u32) {
    let inner = (radius - 1) * (radius - 1);
    let outer = (radius + 1) * (radius + 1);
    for dy in -radius - 1..=radius + 1 {
        for dx in -radius - 1..=radius + 1 {
            let d2 = dx * dx + dy * dy;
            if d2 >= inner && d2 <= outer {
                put_pixel(fb, cx + dx, cy + dy, color);
            }
        }
    }
}

/// Filled disc.
pub fn fill_circle(fb: &mut Frame, cx: i32, cy: i32, radius: i32, color: u32) {
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if dx * dx + dy * dy <= radius * radius {
                put_pixel(fb, cx + dx, cy + dy, color);
            }
        }
    }
}

/// Draw a text string with 8x8 glyphs plus a 1-pixel shadow for contrast.
pub fn draw_text(fb: &mut Frame, x: i32, y: i32, text: &str, color: u32) {
    let mut cursor = x;
    for ch in text.chars() {
        if let Some(glyph) = BASIC_FONTS.get(ch).or_else(|| BASIC_FONTS.get('?')) {
            for (row_idx, row) in glyph.iter().enumerate() {
                for col in 0..8 {
                    if (row >> col) & 1 != 0 {
                        let (gx, gy) = (cursor + col, y + row_idx as i32);
                        put_pixel(fb, gx + 1, gy + 1, 0x0000_0000);
                        put_pixel(fb, gx, gy, color);
                    }
                }
            }
        }
        cursor += 8;
    }
}
