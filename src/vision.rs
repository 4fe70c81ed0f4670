// Color segmentation and marker-tip detection.
//
// Pipeline per frame: RGB -> HSV threshold against the selected profile,
// morphological close + open to knock out speckle, then largest-region
// centroid extraction. Everything here is pure pixel math with no side
// effects, so it all runs on the capture thread.

use crate::palette::ColorProfile;
use crate::types::{Frame, Mask, Point};

/// Regions smaller than this (in pixels) are treated as noise, not a marker.
pub const MIN_AREA: usize = 400;

/// Structuring-element radius for the close/open smoothing (7x7 square).
pub const MORPH_RADIUS: i32 = 3;

/// Convert one packed 0x00RRGGBB pixel to byte-scaled HSV.
/// Hue is 0..=180 (half-degrees), saturation and value 0..=255.
pub fn rgb_to_hsv(px: u32) -> (u8, u8, u8) {
    let r = ((px >> 16) & 0xFF) as f32 / 255.0;
    let g = ((px >> 8) & 0xFF) as f32 / 255.0;
    let b = (px & 0xFF) as f32 / 255.0;

    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let mut h = if delta <= f32::EPSILON {
        0.0
    } else if max == r {
        60.0 * (((g - b) / delta) % 6.0)
    } else if max == g {
        60.0 * ((b - r) / delta + 2.0)
    } else {
        60.0 * ((r - g) / delta + 4.0)
    };
    if h < 0.0 {
        h += 360.0;
    }

    let s = if max <= 0.0 { 0.0 } else { delta / max };
    let v = max;

    (
        (h / 2.0).round().min(180.0) as u8,
        (s * 255.0).round() as u8,
        (v * 255.0).round() as u8,
    )
}

/// Threshold `frame` against the profile's HSV range(s) into `mask`.
/// A pixel is set when it falls in the primary range or, for wrap-around
/// hues like red, the secondary range. Never fails; the mask may be empty.
pub fn threshold(frame: &Frame, profile: &ColorProfile, mask: &mut Mask) {
    debug_assert_eq!(frame.pixels.len(), mask.bits.len());
    for (px, bit) in frame.pixels.iter().zip(mask.bits.iter_mut()) {
        let (h, s, v) = rgb_to_hsv(*px);
        let hit = profile.range.contains(h, s, v)
            || profile.wrap.is_some_and(|w| w.contains(h, s, v));
        *bit = if hit { 255 } else { 0 };
    }
}

/// One separable min/max pass along rows. `dilate` picks max (any set pixel
/// in the window sets the output), erode picks min. Pixels outside the frame
/// count as unset.
fn pass_rows(src: &Mask, dst: &mut Mask, r: i32, dilate: bool) {
    let w = src.width as i32;
    for y in 0..src.height {
        let row = y * src.width;
        for x in 0..w {
            let mut hit = !dilate;
            for k in -r..=r {
                let sx = x + k;
                let v = if sx < 0 || sx >= w { 0 } else { src.bits[row + sx as usize] };
                if dilate {
                    if v != 0 {
                        hit = true;
                        break;
                    }
                } else if v == 0 {
                    hit = false;
                    break;
                }
            }
            dst.bits[row + x as usize] = if hit { 255 } else { 0 };
        }
    }
}

/// Same pass along columns.
fn pass_cols(src: &Mask, dst: &mut Mask, r: i32, dilate: bool) {
    let h = src.height as i32;
    for x in 0..src.width {
        for y in 0..h {
            let mut hit = !dilate;
            for k in -r..=r {
                let sy = y + k;
                let v = if sy < 0 || sy >= h {
                    0
                } else {
                    src.bits[sy as usize * src.width + x]
                };
                if dilate {
                    if v != 0 {
                        hit = true;
                        break;
                    }
                } else if v == 0 {
                    hit = false;
                    break;
                }
            }
            dst.bits[y as usize * src.width + x] = if hit { 255 } else { 0 };
        }
    }
}

fn dilate(mask: &mut Mask, scratch: &mut Mask, r: i32) {
    pass_rows(mask, scratch, r, true);
    pass_cols(scratch, mask, r, true);
}

fn erode(mask: &mut Mask, scratch: &mut Mask, r: i32) {
    pass_rows(mask, scratch, r, false);
    pass_cols(scratch, mask, r, false);
}

/// Morphological close (fill small holes) then open (drop small specks),
/// both with the fixed square structuring element. `scratch` must match the
/// mask dimensions; it is overwritten.
pub fn smooth(mask: &mut Mask, scratch: &mut Mask) {
    debug_assert_eq!(mask.bits.len(), scratch.bits.len());
    // close = dilate then erode
    dilate(mask, scratch, MORPH_RADIUS);
    erode(mask, scratch, MORPH_RADIUS);
    // open = erode then dilate
    erode(mask, scratch, MORPH_RADIUS);
    dilate(mask, scratch, MORPH_RADIUS);
}

/// Find the marker tip: the centroid of the largest connected region in the
/// mask, or `None` when nothing big enough is present.
///
/// Regions are 4-connected and labeled with an explicit-stack flood fill.
/// The largest one must clear [`MIN_AREA`] to count; smaller blobs are
/// reflections and skin tones, not the marker.
pub fn detect_tip(mask: &Mask) -> Option<Point> {
    let w = mask.width;
    let h = mask.height;
    let mut visited = vec![false; w * h];
    let mut stack: Vec<usize> = Vec::new();

    let mut best_area = 0usize;
    let mut best_sum = (0u64, 0u64);

    for start in 0..w * h {
        if mask.bits[start] == 0 || visited[start] {
            continue;
        }

        let mut area = 0usize;
        let mut sum_x = 0u64;
        let mut sum_y = 0u64;

        visited[start] = true;
        stack.push(start);
        while let Some(idx) = stack.pop() {
            let x = idx % w;
            let y = idx / w;
            area += 1;
            sum_x += x as u64;
            sum_y += y as u64;

            if x > 0 && mask.bits[idx - 1] != 0 && !visited[idx - 1] {
                visited[idx - 1] = true;
                stack.push(idx - 1);
            }
            if x + 1 < w && mask.bits[idx + 1] != 0 && !visited[idx + 1] {
                visited[idx + 1] = true;
                stack.push(idx + 1);
            }
            if y > 0 && mask.bits[idx - w] != 0 && !visited[idx - w] {
                visited[idx - w] = true;
                stack.push(idx - w);
            }
            if y + 1 < h && mask.bits[idx + w] != 0 && !visited[idx + w] {
                visited[idx + w] = true;
                stack.push(idx + w);
            }
        }

        if area > best_area {
            best_area = area;
            best_sum = (sum_x, sum_y);
        }
    }

    // Zero area also guards the moment division below.
    if best_area < MIN_AREA {
        return None;
    }
    Some((
        (best_sum.0 / best_area as u64) as i32,
        (best_sum.1 / best_area as u64) as i32,
    ))
}
