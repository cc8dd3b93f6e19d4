use eframe::egui::Color32;
use palette::{LinSrgb, Mix, Srgb};

// ---------------------------------------------------------------------------
// Sequential colour ramps
// ---------------------------------------------------------------------------

/// Anchor stops of a sequential ramp, dark to light, as sRGB bytes.
pub type Stops = &'static [(u8, u8, u8)];

/// Purple → teal → yellow, for the brand popularity bars.
pub const VIRIDIS: Stops = &[
    (68, 1, 84),
    (59, 82, 139),
    (33, 145, 140),
    (94, 201, 98),
    (253, 231, 37),
];

/// Black → magenta → cream, for the category boxes.
pub const MAGMA: Stops = &[
    (0, 0, 4),
    (81, 18, 124),
    (183, 55, 121),
    (252, 137, 97),
    (252, 253, 191),
];

fn linear((r, g, b): (u8, u8, u8)) -> LinSrgb {
    Srgb::new(r, g, b).into_format::<f32>().into_linear()
}

/// Sample the ramp at `t` in `[0, 1]`, interpolating in linear light.
pub fn sample(stops: Stops, t: f32) -> Color32 {
    let t = t.clamp(0.0, 1.0);
    let segments = stops.len().saturating_sub(1);
    let rgb = if segments == 0 {
        stops.first().map(|&s| linear(s)).unwrap_or_default()
    } else {
        let pos = t * segments as f32;
        let i = (pos.floor() as usize).min(segments - 1);
        linear(stops[i]).mix(linear(stops[i + 1]), pos - i as f32)
    };
    let out = Srgb::<f32>::from_linear(rgb).into_format::<u8>();
    Color32::from_rgb(out.red, out.green, out.blue)
}

/// `n` colours spread evenly along the ramp, dark first.
pub fn generate_palette(stops: Stops, n: usize) -> Vec<Color32> {
    match n {
        0 => Vec::new(),
        1 => vec![sample(stops, 0.5)],
        _ => (0..n)
            .map(|i| sample(stops, i as f32 / (n - 1) as f32))
            .collect(),
    }
}
