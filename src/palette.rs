// Fixed marker palette: HSV detection ranges plus the RGB each color draws in.
//
// Hue runs 0..180 (half-degrees), saturation and value 0..255, so thresholds
// stay comparable with the usual computer-vision conventions. Red needs a
// second range because its hue band straddles the 0/180 wrap point.

/// Inclusive lower/upper HSV bounds.
#[derive(Clone, Copy)]
pub struct HsvRange {
    pub lo: (u8, u8, u8),
    pub hi: (u8, u8, u8),
}

impl HsvRange {
    pub fn contains(&self, h: u8, s: u8, v: u8) -> bool {
        h >= self.lo.0
            && h <= self.hi.0
            && s >= self.lo.1
            && s <= self.hi.1
            && v >= self.lo.2
            && v <= self.hi.2
    }
}

/// One selectable marker color.
pub struct ColorProfile {
    pub name: &'static str,
    pub range: HsvRange,
    /// Secondary range for hues that wrap around 0/180 (red).
    pub wrap: Option<HsvRange>,
    /// Color the strokes are drawn in.
    pub rgb: (u8, u8, u8),
}

impl ColorProfile {
    /// Stroke color packed for the canvas, full opacity.
    pub fn argb(&self) -> u32 {
        let (r, g, b) = self.rgb;
        0xFF00_0000 | ((r as u32) << 16) | ((g as u32) << 8) | b as u32
    }

    /// Stroke color packed for the display buffer.
    pub fn rgb_u32(&self) -> u32 {
        let (r, g, b) = self.rgb;
        ((r as u32) << 16) | ((g as u32) << 8) | b as u32
    }
}

pub const PALETTE: [ColorProfile; 6] = [
    ColorProfile {
        name: "Blue",
        range: HsvRange { lo: (100, 150, 50), hi: (130, 255, 255) },
        wrap: None,
        rgb: (30, 120, 255),
    },
    ColorProfile {
        name: "Green",
        range: HsvRange { lo: (40, 100, 50), hi: (75, 255, 255) },
        wrap: None,
        rgb: (46, 204, 71),
    },
    ColorProfile {
        name: "Red",
        range: HsvRange { lo: (0, 150, 50), hi: (12, 255, 255) },
        wrap: Some(HsvRange { lo: (168, 150, 50), hi: (180, 255, 255) }),
        rgb: (231, 76, 60),
    },
    ColorProfile {
        name: "Yellow",
        range: HsvRange { lo: (20, 100, 100), hi: (35, 255, 255) },
        wrap: None,
        rgb: (241, 196, 15),
    },
    ColorProfile {
        name: "Purple",
        range: HsvRange { lo: (130, 100, 50), hi: (160, 255, 255) },
        wrap: None,
        rgb: (155, 89, 182),
    },
    ColorProfile {
        name: "Orange",
        range: HsvRange { lo: (12, 150, 80), hi: (20, 255, 255) },
        wrap: None,
        rgb: (230, 126, 34),
    },
];
