//! Color maps and value-to-color scaling.

use image::Rgba;

/// Color at a normalized position in a color map.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorStop {
    /// Position in `[0, 1]`.
    pub position: f64,
    pub color: Rgba<u8>,
}

impl ColorStop {
    fn from_hex(position: f64, hex: &str) -> Self {
        Self {
            position,
            color: parse_color(hex),
        }
    }
}

/// Piecewise-linear color map over `[0, 1]`.
#[derive(Debug, Clone)]
pub struct Colormap {
    name: &'static str,
    stops: Vec<ColorStop>,
}

impl Colormap {
    /// Perceptually uniform viridis, sampled at nine evenly spaced stops.
    pub fn viridis() -> Self {
        const HEX: [&str; 9] = [
            "#440154", "#472d7b", "#3b528b", "#2c728e", "#21918c", "#28ae80", "#5ec962",
            "#addc30", "#fde725",
        ];
        let last = (HEX.len() - 1) as f64;
        let stops = HEX
            .iter()
            .enumerate()
            .map(|(i, hex)| ColorStop::from_hex(i as f64 / last, hex))
            .collect();
        Self {
            name: "viridis",
            stops,
        }
    }

    pub fn name(&self) -> &str {
        self.name
    }

    /// Color at normalized position `t`. Values outside `[0, 1]` are clamped.
    pub fn color_at(&self, t: f64) -> Rgba<u8> {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };

        let first = &self.stops[0];
        if t <= first.position {
            return first.color;
        }

        for pair in self.stops.windows(2) {
            let (lower, upper) = (&pair[0], &pair[1]);
            if t <= upper.position {
                let span = upper.position - lower.position;
                if span <= 0.0 {
                    return upper.color;
                }
                return interpolate_color(lower.color, upper.color, (t - lower.position) / span);
            }
        }

        self.stops[self.stops.len() - 1].color
    }
}

/// Linear mapping from data values onto `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorScale {
    pub vmin: f64,
    pub vmax: f64,
}

impl ColorScale {
    /// Scale for the unmasked value range of a window.
    ///
    /// No valid values gives a placeholder `[0, 1]`; a constant window is
    /// widened to `[v - 0.5, v + 0.5]`.
    pub fn from_range(range: Option<(f64, f64)>) -> Self {
        match range {
            None => Self { vmin: 0.0, vmax: 1.0 },
            Some((lo, hi)) if hi > lo => Self { vmin: lo, vmax: hi },
            Some((v, _)) => Self {
                vmin: v - 0.5,
                vmax: v + 0.5,
            },
        }
    }

    /// Position of `value` on the scale (not clamped).
    pub fn normalize(&self, value: f64) -> f64 {
        (value - self.vmin) / (self.vmax - self.vmin)
    }
}

/// Linear color interpolation
fn interpolate_color(color1: Rgba<u8>, color2: Rgba<u8>, t: f64) -> Rgba<u8> {
    let t = t.clamp(0.0, 1.0);
    let mix = |a: u8, b: u8| (a as f64 + t * (b as f64 - a as f64)).round() as u8;
    Rgba([
        mix(color1[0], color2[0]),
        mix(color1[1], color2[1]),
        mix(color1[2], color2[2]),
        mix(color1[3], color2[3]),
    ])
}

/// Parse hex color string to RGBA
fn parse_color(hex: &str) -> Rgba<u8> {
    let hex = hex.trim_start_matches('#');
    if hex.len() != 6 {
        return Rgba([0, 0, 0, 255]);
    }

    let r = u8::from_str_radix(&hex[0..2], 16).unwrap_or(0);
    let g = u8::from_str_radix(&hex[2..4], 16).unwrap_or(0);
    let b = u8::from_str_radix(&hex[4..6], 16).unwrap_or(0);

    Rgba([r, g, b, 255])
}
