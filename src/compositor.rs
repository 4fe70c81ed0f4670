// Per-tick display composition: base layer, canvas overlay, tip indicator.

use crate::draw::{draw_circle, fill_circle};
use crate::palette::ColorProfile;
use crate::types::{Canvas, Frame, Mask, Point};

const INDICATOR_OUTLINE: u32 = 0x00FF_FFFF;

/// Build the displayable image for this tick into `screen`.
///
/// The base is either the camera frame or, in mask view, the binary mask
/// spread to grayscale. The canvas is alpha-blended on top; zero-alpha
/// canvas pixels leave the base untouched. When a tip is present, two
/// concentric circles sized off the brush width mark the detected position.
pub fn compose(
    screen: &mut Frame,
    frame: &Frame,
    mask: &Mask,
    canvas: &Canvas,
    tip: Option<Point>,
    show_mask: bool,
    profile: &ColorProfile,
    brush: u32,
) {
    if show_mask {
        for (dst, bit) in screen.pixels.iter_mut().zip(mask.bits.iter()) {
            let v = *bit as u32;
            *dst = (v << 16) | (v << 8) | v;
        }
    } else {
        screen.pixels.copy_from_slice(&frame.pixels);
    }

    overlay(screen, canvas);

    if let Some((x, y)) = tip {
        let brush = brush as i32;
        draw_circle(screen, x, y, brush + 6, INDICATOR_OUTLINE);
        fill_circle(screen, x, y, brush + 2, profile.rgb_u32());
    }
}

/// Alpha-blend the canvas over the base image.
fn overlay(screen: &mut Frame, canvas: &Canvas) {
    for (dst, src) in screen.pixels.iter_mut().zip(canvas.pixels.iter()) {
        let a = src >> 24;
        if a == 0 {
            continue;
        }
        if a == 255 {
            *dst = src & 0x00FF_FFFF;
            continue;
        }
        let inv = 255 - a;
        let blend = |s: u32, d: u32| (s * a + d * inv) / 255;
        let r = blend((src >> 16) & 0xFF, (*dst >> 16) & 0xFF);
        let g = blend((src >> 8) & 0xFF, (*dst >> 8) & 0xFF);
        let b = blend(src & 0xFF, *dst & 0xFF);
        *dst = (r << 16) | (g << 8) | b;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::PALETTE;

    fn setup(w: usize, h: usize) -> (Frame, Frame, Mask, Canvas) {
        (Frame::new(w, h), Frame::new(w, h), Mask::new(w, h), Canvas::new(w, h))
    }

    #[test]
    fn transparent_canvas_leaves_base_untouched() {
        let (mut screen, mut frame, mask, canvas) = setup(16, 16);
        frame.pixels.fill(0x00123456);
        compose(&mut screen, &frame, &mask, &canvas, None, false, &PALETTE[0], 4);
        assert!(screen.pixels.iter().all(|&p| p == 0x00123456));
    }

    #[test]
    fn opaque_canvas_pixels_replace_base() {
        let (mut screen, mut frame, mask, mut canvas) = setup(16, 16);
        frame.pixels.fill(0x00123456);
        canvas.pixels[5] = 0xFFAA0000;
        compose(&mut screen, &frame, &mask, &canvas, None, false, &PALETTE[0], 4);
        assert_eq!(screen.pixels[5], 0x00AA0000);
        assert_eq!(screen.pixels[6], 0x00123456);
    }

    #[test]
    fn mask_view_renders_grayscale() {
        let (mut screen, frame, mut mask, canvas) = setup(16, 16);
        mask.bits[3] = 255;
        compose(&mut screen, &frame, &mask, &canvas, None, true, &PALETTE[0], 4);
        assert_eq!(screen.pixels[3], 0x00FFFFFF);
        assert_eq!(screen.pixels[4], 0x00000000);
    }

    #[test]
    fn tip_indicator_is_drawn() {
        let (mut screen, frame, mask, canvas) = setup(64, 64);
        compose(&mut screen, &frame, &mask, &canvas, Some((32, 32)), false, &PALETTE[0], 4);
        // Filled inner circle carries the active color at the tip.
        assert_eq!(screen.pixels[32 * 64 + 32], PALETTE[0].rgb_u32());
        // Outline ring at radius brush+6.
        assert_eq!(screen.pixels[32 * 64 + 42], INDICATOR_OUTLINE);
    }
}
