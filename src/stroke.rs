// Stroke engine: turns per-tick tip positions into committed canvas pixels.
//
// Owns the persistent canvas and the bounded undo history. Runs exactly once
// per display tick; the capture thread never touches it.

use std::collections::VecDeque;
use std::path::Path;

use crate::error::Error;
use crate::types::{Canvas, Point};

/// Maximum canvas snapshots kept for undo. Oldest is evicted first.
pub const UNDO_CAP: usize = 30;

pub const BRUSH_MIN: u32 = 1;
pub const BRUSH_MAX: u32 = 30;
pub const BRUSH_DEFAULT: u32 = 4;

pub struct StrokeEngine {
    canvas: Canvas,
    undo: VecDeque<Canvas>,
    prev: Option<Point>,
    pen_down: bool,
}

impl StrokeEngine {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            canvas: Canvas::new(width, height),
            undo: VecDeque::new(),
            prev: None,
            pen_down: false,
        }
    }

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    pub fn pen_down(&self) -> bool {
        self.pen_down
    }

    pub fn prev_point(&self) -> Option<Point> {
        self.prev
    }

    pub fn undo_depth(&self) -> usize {
        self.undo.len()
    }

    /// Advance the state machine by one display tick.
    ///
    /// A fresh pen-down snapshots the canvas and records the contact point
    /// without drawing; while the pen stays down, each tick commits one
    /// segment from the previous tip to the current one. Losing the tip or
    /// disabling drawing lifts the pen, so a reappearing marker starts a new
    /// stroke instead of bridging the gap.
    pub fn tick(&mut self, drawing: bool, tip: Option<Point>, color: u32, brush: u32) {
        match tip {
            Some(p) if drawing => {
                if !self.pen_down {
                    // First contact: snapshot before the stroke, no line yet.
                    self.snapshot();
                    self.pen_down = true;
                    self.prev = Some(p);
                } else {
                    if let Some(prev) = self.prev {
                        draw_segment(&mut self.canvas, prev, p, color, brush);
                    }
                    self.prev = Some(p);
                }
            }
            _ => self.lift_pen(),
        }
    }

    /// Reset tracking without touching the canvas. Called when drawing is
    /// disabled, the marker vanishes, or the color selection changes.
    pub fn lift_pen(&mut self) {
        self.prev = None;
        self.pen_down = false;
    }

    fn snapshot(&mut self) {
        self.undo.push_back(self.canvas.clone());
        if self.undo.len() > UNDO_CAP {
            self.undo.pop_front();
        }
    }

    /// Restore the most recent snapshot. Silently ignored when the history
    /// is empty.
    pub fn undo(&mut self) {
        if let Some(snap) = self.undo.pop_back() {
            self.canvas = snap;
            self.lift_pen();
        }
    }

    /// Blank the canvas. The pre-clear content is snapshotted first, so a
    /// clear is undoable.
    pub fn clear(&mut self) {
        self.snapshot();
        self.canvas = Canvas::new(self.canvas.width, self.canvas.height);
        self.lift_pen();
    }

    /// Write the canvas as an opaque PNG, strokes composited over white by
    /// their alpha.
    pub fn save(&self, path: &Path) -> Result<(), Error> {
        let w = self.canvas.width as u32;
        let h = self.canvas.height as u32;
        let mut out = image::RgbImage::from_pixel(w, h, image::Rgb([255, 255, 255]));
        for (i, px) in self.canvas.pixels.iter().enumerate() {
            let a = (px >> 24) & 0xFF;
            if a == 0 {
                continue;
            }
            let r = (px >> 16) & 0xFF;
            let g = (px >> 8) & 0xFF;
            let b = px & 0xFF;
            let blend = |c: u32| ((c * a + 255 * (255 - a)) / 255) as u8;
            let x = (i % self.canvas.width) as u32;
            let y = (i / self.canvas.width) as u32;
            out.put_pixel(x, y, image::Rgb([blend(r), blend(g), blend(b)]));
        }
        out.save(path)?;
        Ok(())
    }
}

/// Stamp a filled disc along a Bresenham walk from `p0` to `p1`.
/// Round caps keep consecutive segments seamless at webcam frame rates.
fn draw_segment(canvas: &mut Canvas, p0: Point, p1: Point, color: u32, brush: u32) {
    let radius = (brush.clamp(BRUSH_MIN, BRUSH_MAX) / 2) as i32;
    let (mut x0, mut y0) = p0;
    let (x1, y1) = p1;
    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;
    loop {
        stamp_disc(canvas, x0, y0, radius, color);
        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

fn stamp_disc(canvas: &mut Canvas, cx: i32, cy: i32, radius: i32, color: u32) {
    let w = canvas.width as i32;
    let h = canvas.height as i32;
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if dx * dx + dy * dy > radius * radius {
                continue;
            }
            let x = cx + dx;
            let y = cy + dy;
            if x < 0 || y < 0 || x >= w || y >= h {
                continue;
            }
            canvas.pixels[y as usize * canvas.width + x as usize] = color;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: u32 = 0xFFE74C3C;

    fn painted(c: &Canvas) -> usize {
        c.pixels.iter().filter(|&&p| p >> 24 != 0).count()
    }

    #[test]
    fn pen_down_frame_draws_nothing() {
        let mut eng = StrokeEngine::new(320, 240);
        eng.tick(true, Some((100, 100)), RED, 4);
        assert!(eng.pen_down());
        assert_eq!(eng.prev_point(), Some((100, 100)));
        assert_eq!(painted(eng.canvas()), 0);
        assert_eq!(eng.undo_depth(), 1);
    }

    #[test]
    fn second_frame_draws_one_segment() {
        let mut eng = StrokeEngine::new(320, 240);
        eng.tick(true, Some((100, 100)), RED, 4);
        eng.tick(true, Some((120, 100)), RED, 4);
        // Segment runs along y=100 from x=100 to x=120.
        for x in 100..=120 {
            assert_eq!(eng.canvas().pixels[100 * 320 + x], RED, "gap at x={x}");
        }
        // Nothing outside the brush envelope.
        assert_eq!(eng.canvas().pixels[150 * 320 + 50] >> 24, 0);
    }

    #[test]
    fn drawing_disabled_lifts_pen() {
        let mut eng = StrokeEngine::new(320, 240);
        eng.tick(true, Some((10, 10)), RED, 4);
        eng.tick(false, Some((50, 50)), RED, 4);
        assert!(!eng.pen_down());
        assert_eq!(eng.prev_point(), None);
        assert_eq!(painted(eng.canvas()), 0);
    }

    #[test]
    fn tip_gap_starts_a_new_stroke() {
        let mut eng = StrokeEngine::new(320, 240);
        eng.tick(true, Some((10, 10)), RED, 1);
        eng.tick(true, Some((20, 10)), RED, 1);
        eng.tick(true, None, RED, 1);
        assert!(!eng.pen_down());
        let before = painted(eng.canvas());
        // Reappearing far away must not bridge the gap.
        eng.tick(true, Some((200, 10)), RED, 1);
        assert_eq!(painted(eng.canvas()), before);
        assert_eq!(eng.canvas().pixels[10 * 320 + 100] >> 24, 0);
    }

    #[test]
    fn straight_line_scenario() {
        let mut eng = StrokeEngine::new(320, 240);
        for (i, x) in [100, 125, 150, 175, 200].iter().enumerate() {
            eng.tick(true, Some((*x, 100)), RED, 4);
            if i == 0 {
                assert_eq!(painted(eng.canvas()), 0);
            }
        }
        for x in 100..=200 {
            assert_eq!(eng.canvas().pixels[100 * 320 + x], RED, "gap at x={x}");
        }
        assert!(eng.pen_down());
        assert_eq!(eng.prev_point(), Some((200, 100)));
    }

    #[test]
    fn undo_cap_evicts_oldest() {
        let mut eng = StrokeEngine::new(64, 64);
        for i in 0..(UNDO_CAP + 5) {
            // Each pen-down pushes one snapshot.
            eng.tick(true, Some((i as i32 % 60, 10)), RED, 1);
            eng.tick(true, None, RED, 1);
        }
        assert_eq!(eng.undo_depth(), UNDO_CAP);
    }

    #[test]
    fn undo_on_empty_stack_is_a_no_op() {
        let mut eng = StrokeEngine::new(64, 64);
        eng.tick(true, Some((10, 10)), RED, 2);
        eng.undo(); // drains the single snapshot
        let canvas_before = eng.canvas().clone();
        let pen_before = eng.pen_down();
        eng.undo();
        assert!(eng.canvas() == &canvas_before);
        assert_eq!(eng.pen_down(), pen_before);
        assert_eq!(eng.undo_depth(), 0);
    }

    #[test]
    fn clear_then_undo_restores_exactly() {
        let mut eng = StrokeEngine::new(64, 64);
        eng.tick(true, Some((10, 10)), RED, 6);
        eng.tick(true, Some((40, 40)), RED, 6);
        let before = eng.canvas().clone();
        assert!(painted(&before) > 0);

        eng.clear();
        assert_eq!(painted(eng.canvas()), 0);
        assert!(!eng.pen_down());

        eng.undo();
        assert!(eng.canvas() == &before, "undo after clear must restore pixel-for-pixel");
    }

    #[test]
    fn save_writes_opaque_white_backed_png() {
        let mut eng = StrokeEngine::new(80, 60);
        eng.tick(true, Some((20, 20)), RED, 4);
        eng.tick(true, Some((40, 20)), RED, 4);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.png");
        eng.save(&path).unwrap();

        let img = image::open(&path).unwrap().to_rgb8();
        assert_eq!(img.dimensions(), (80, 60));
        // Untouched region renders as the white background.
        assert_eq!(img.get_pixel(5, 50), &image::Rgb([255, 255, 255]));
        // Stroke pixels carry the stroke color.
        assert_eq!(img.get_pixel(30, 20), &image::Rgb([231, 76, 60]));
    }
}
