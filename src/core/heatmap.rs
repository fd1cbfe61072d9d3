//! Color mapping for correlation heatmaps.
//!
//! Values map onto a red-yellow-blue diverging scale with a fixed domain of
//! [-1, 1], centred at 0.

/// An sRGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// Eleven evenly spaced stops from -1 (red) to +1 (blue).
const RDYLBU: [Rgb; 11] = [
    Rgb::new(165, 0, 38),
    Rgb::new(215, 48, 39),
    Rgb::new(244, 109, 67),
    Rgb::new(253, 174, 97),
    Rgb::new(254, 224, 144),
    Rgb::new(255, 255, 191),
    Rgb::new(224, 243, 248),
    Rgb::new(171, 217, 233),
    Rgb::new(116, 173, 209),
    Rgb::new(69, 117, 180),
    Rgb::new(49, 54, 149),
];

/// Background for cells without a defined correlation.
pub const UNDEFINED: Rgb = Rgb::new(128, 128, 128);

/// |value| at or above which labels switch to light text.
pub const LIGHT_TEXT_THRESHOLD: f64 = 0.7;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelTone {
    Light,
    Dark,
}

/// Display data for one heatmap cell.
#[derive(Debug, Clone, PartialEq)]
pub struct HeatCell {
    pub background: Rgb,
    pub tone: LabelTone,
    pub label: String,
}

pub fn color_for(value: f64) -> Rgb {
    if !value.is_finite() {
        return UNDEFINED;
    }
    let t = (value.clamp(-1.0, 1.0) + 1.0) / 2.0;
    let scaled = t * (RDYLBU.len() - 1) as f64;
    let lower = (scaled.floor() as usize).min(RDYLBU.len() - 2);
    let frac = scaled - lower as f64;

    let (a, b) = (RDYLBU[lower], RDYLBU[lower + 1]);
    let lerp = |x: u8, y: u8| (f64::from(x) + (f64::from(y) - f64::from(x)) * frac).round() as u8;
    Rgb::new(lerp(a.r, b.r), lerp(a.g, b.g), lerp(a.b, b.b))
}

pub fn label_tone(value: f64) -> LabelTone {
    if value.abs() >= LIGHT_TEXT_THRESHOLD {
        LabelTone::Light
    } else {
        LabelTone::Dark
    }
}

/// Two-decimal label, or `N/A` for undefined values.
pub fn format_value(value: f64) -> String {
    if value.is_finite() {
        format!("{value:.2}")
    } else {
        "N/A".to_string()
    }
}

pub fn heat_cell(value: f64) -> HeatCell {
    HeatCell {
        background: color_for(value),
        tone: if value.is_finite() {
            label_tone(value)
        } else {
            LabelTone::Dark
        },
        label: format_value(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scale_endpoints_and_centre() {
        assert_eq!(color_for(-1.0), Rgb::new(165, 0, 38));
        assert_eq!(color_for(0.0), Rgb::new(255, 255, 191));
        assert_eq!(color_for(1.0), Rgb::new(49, 54, 149));
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        assert_eq!(color_for(1.5), color_for(1.0));
        assert_eq!(color_for(-3.0), color_for(-1.0));
        assert_eq!(color_for(f64::NAN), UNDEFINED);
    }

    #[test]
    fn interpolates_between_stops() {
        assert_eq!(color_for(0.2), Rgb::new(224, 243, 248));
        // A quarter of the way from the 0.0 stop to the 0.2 stop.
        assert_eq!(color_for(0.05), Rgb::new(247, 252, 205));
    }

    #[test]
    fn label_contrast_switches_at_threshold() {
        assert_eq!(label_tone(0.7), LabelTone::Light);
        assert_eq!(label_tone(-0.85), LabelTone::Light);
        assert_eq!(label_tone(0.69), LabelTone::Dark);
        assert_eq!(label_tone(-0.2), LabelTone::Dark);
    }

    #[test]
    fn labels_use_two_decimals() {
        let cell = heat_cell(0.12345);
        assert_eq!(cell.label, "0.12");
        assert_eq!(heat_cell(f64::NAN).label, "N/A");
    }
}
