// Core pixel-buffer types shared across the pipeline.

/// One camera frame as seen on screen.
#[derive(Clone)]
pub struct Frame {
    pub width: usize,     // frame width in pixels
    pub height: usize,    // frame height in pixels
    pub pixels: Vec<u32>, // each entry is 0x00RRGGBB for minifb
}

impl Frame {
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height, pixels: vec![0u32; width * height] }
    }
}

/// Binary mask marking pixels inside the selected color's HSV range.
/// Entries are 0 (background) or 255 (marker).
#[derive(Clone)]
pub struct Mask {
    pub width: usize,
    pub height: usize,
    pub bits: Vec<u8>, // length = width * height
}

impl Mask {
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height, bits: vec![0u8; width * height] }
    }
}

/// Persistent drawing surface. Strokes accumulate here across the session.
/// Entries are 0xAARRGGBB; alpha 0 means "show whatever is underneath".
#[derive(Clone, PartialEq)]
pub struct Canvas {
    pub width: usize,
    pub height: usize,
    pub pixels: Vec<u32>,
}

impl Canvas {
    /// Fully transparent canvas.
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height, pixels: vec![0u32; width * height] }
    }
}

/// Detected marker centroid in frame coordinates.
pub type Point = (i32, i32);
