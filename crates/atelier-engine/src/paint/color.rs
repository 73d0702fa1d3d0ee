use crate::coords::eq_eps;

/// Color model tag.
///
/// Components are interpreted per model:
/// - `Rgb`: red/green/blue in 0..255, alpha in 0..100
/// - `Hsl`: hue in 0..360, saturation/lightness in 0..100, alpha in 0..100
/// - `Cmyk`: cyan/magenta/yellow/key in 0..100, no alpha
/// - `Tone`: tone in 0..100 (0 = white, 100 = black), alpha in 0..100
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ColorModel {
    Rgb,
    Hsl,
    Cmyk,
    Tone,
}

impl ColorModel {
    /// One-character tag used in serialized color strings.
    #[inline]
    pub fn tag(self) -> char {
        match self {
            ColorModel::Rgb => 'R',
            ColorModel::Hsl => 'H',
            ColorModel::Cmyk => 'K',
            ColorModel::Tone => 'T',
        }
    }

    fn from_tag(tag: char) -> Option<Self> {
        match tag {
            'R' => Some(ColorModel::Rgb),
            'H' => Some(ColorModel::Hsl),
            'K' => Some(ColorModel::Cmyk),
            'T' => Some(ColorModel::Tone),
            _ => None,
        }
    }
}

/// Document color value: a model tag plus four numeric components.
///
/// Colors are immutable values; mutation in the document goes through
/// property setters which replace the whole value. Equality is epsilon-based
/// per component so round-trips through serialization compare equal.
#[derive(Debug, Copy, Clone)]
pub struct Color {
    pub model: ColorModel,
    pub components: [f32; 4],
}

impl Color {
    pub const BLACK: Color = Color::rgb(0.0, 0.0, 0.0);
    pub const WHITE: Color = Color::rgb(255.0, 255.0, 255.0);
    pub const TRANSPARENT: Color = Color::rgba(0.0, 0.0, 0.0, 0.0);

    #[inline]
    pub const fn new(model: ColorModel, components: [f32; 4]) -> Self {
        Self { model, components }
    }

    #[inline]
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self::new(ColorModel::Rgb, [r, g, b, 100.0])
    }

    #[inline]
    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self::new(ColorModel::Rgb, [r, g, b, a])
    }

    /// Straight-alpha RGBA in 0..1, resolving the color model.
    pub fn to_rgba(self) -> [f32; 4] {
        let c = self.components;
        match self.model {
            ColorModel::Rgb => [c[0] / 255.0, c[1] / 255.0, c[2] / 255.0, c[3] / 100.0],
            ColorModel::Hsl => {
                let (r, g, b) = hsl_to_rgb(c[0], c[1] / 100.0, c[2] / 100.0);
                [r, g, b, c[3] / 100.0]
            }
            ColorModel::Cmyk => {
                let k = c[3] / 100.0;
                [
                    (1.0 - c[0] / 100.0) * (1.0 - k),
                    (1.0 - c[1] / 100.0) * (1.0 - k),
                    (1.0 - c[2] / 100.0) * (1.0 - k),
                    1.0,
                ]
            }
            ColorModel::Tone => {
                let v = 1.0 - c[0] / 100.0;
                [v, v, v, c[1] / 100.0]
            }
        }
    }

    /// Premultiplied RGBA in 0..1 (the pixmap working format).
    #[inline]
    pub fn to_premul(self) -> [f32; 4] {
        let [r, g, b, a] = self.to_rgba();
        [r * a, g * a, b * a, a]
    }

    #[inline]
    pub fn is_transparent(self) -> bool {
        self.to_rgba()[3] <= 0.0
    }

    /// CSS color string (`rgb(..)` or `rgba(..)`).
    pub fn as_css_string(self) -> String {
        let [r, g, b, a] = self.to_rgba();
        let (r, g, b) = (
            (r * 255.0).round() as u8,
            (g * 255.0).round() as u8,
            (b * 255.0).round() as u8,
        );
        if a >= 1.0 {
            format!("rgb({r},{g},{b})")
        } else {
            format!("rgba({r},{g},{b},{a})")
        }
    }

    /// Serialized form: model tag plus comma-separated components.
    pub fn as_string(self) -> String {
        let c = self.components;
        format!("{}{},{},{},{}", self.model.tag(), c[0], c[1], c[2], c[3])
    }

    /// Parses the serialized form produced by [`as_string`](Self::as_string).
    pub fn parse(string: &str) -> Option<Color> {
        let mut chars = string.chars();
        let model = ColorModel::from_tag(chars.next()?)?;
        let rest: &str = chars.as_str();

        let mut components = [0.0f32; 4];
        let mut count = 0;
        for part in rest.split(',') {
            if count >= 4 {
                return None;
            }
            components[count] = part.trim().parse().ok()?;
            count += 1;
        }
        if count != 4 {
            return None;
        }

        Some(Color::new(model, components))
    }

    /// Epsilon equality; colors of different models are never equal.
    pub fn almost_eq(self, other: Color) -> bool {
        self.model == other.model
            && self
                .components
                .iter()
                .zip(other.components.iter())
                .all(|(a, b)| eq_eps(*a, *b))
    }
}

fn hsl_to_rgb(h: f32, s: f32, l: f32) -> (f32, f32, f32) {
    let h = h.rem_euclid(360.0) / 360.0;
    if s <= 0.0 {
        return (l, l, l);
    }

    let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0 * l - q;

    let hue = |mut t: f32| {
        if t < 0.0 {
            t += 1.0;
        }
        if t > 1.0 {
            t -= 1.0;
        }
        if t < 1.0 / 6.0 {
            p + (q - p) * 6.0 * t
        } else if t < 1.0 / 2.0 {
            q
        } else if t < 2.0 / 3.0 {
            p + (q - p) * (2.0 / 3.0 - t) * 6.0
        } else {
            p
        }
    };

    (hue(h + 1.0 / 3.0), hue(h), hue(h - 1.0 / 3.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── conversion ────────────────────────────────────────────────────────

    #[test]
    fn rgb_components_resolve() {
        let [r, g, b, a] = Color::rgba(255.0, 0.0, 127.5, 50.0).to_rgba();
        assert!((r - 1.0).abs() < 1e-6);
        assert!(g.abs() < 1e-6);
        assert!((b - 0.5).abs() < 1e-6);
        assert!((a - 0.5).abs() < 1e-6);
    }

    #[test]
    fn tone_is_grayscale() {
        let [r, g, b, _] = Color::new(ColorModel::Tone, [100.0, 100.0, 0.0, 0.0]).to_rgba();
        assert_eq!((r, g, b), (0.0, 0.0, 0.0));
    }

    #[test]
    fn hsl_red() {
        let [r, g, b, _] = Color::new(ColorModel::Hsl, [0.0, 100.0, 50.0, 100.0]).to_rgba();
        assert!((r - 1.0).abs() < 1e-4 && g.abs() < 1e-4 && b.abs() < 1e-4);
    }

    // ── css ───────────────────────────────────────────────────────────────

    #[test]
    fn css_string_opaque_and_translucent() {
        assert_eq!(Color::rgb(255.0, 0.0, 0.0).as_css_string(), "rgb(255,0,0)");
        assert_eq!(
            Color::rgba(0.0, 0.0, 0.0, 50.0).as_css_string(),
            "rgba(0,0,0,0.5)"
        );
    }

    // ── serialization ─────────────────────────────────────────────────────

    #[test]
    fn string_round_trip() {
        let c = Color::new(ColorModel::Cmyk, [10.0, 20.0, 30.0, 40.0]);
        let parsed = Color::parse(&c.as_string()).unwrap();
        assert!(c.almost_eq(parsed));
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(Color::parse("").is_none());
        assert!(Color::parse("X1,2,3,4").is_none());
        assert!(Color::parse("R1,2,3").is_none());
    }

    // ── equality ──────────────────────────────────────────────────────────

    #[test]
    fn equality_is_epsilon_based() {
        let a = Color::rgb(100.0, 100.0, 100.0);
        let b = Color::rgb(100.0 + 1e-6, 100.0, 100.0);
        assert!(a.almost_eq(b));
    }

    #[test]
    fn different_models_never_equal() {
        let a = Color::new(ColorModel::Rgb, [0.0; 4]);
        let b = Color::new(ColorModel::Hsl, [0.0; 4]);
        assert!(!a.almost_eq(b));
    }
}
