use super::color::Color;
use super::gradient::Gradient;

/// Checkerboard backdrop used for paint previews, as an inline SVG url.
/// Transparent and translucent paints are shown composited over it.
const CHESSBOARD_CSS: &str = "url('data:image/svg+xml;utf8,\
<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"16\" height=\"16\">\
<rect width=\"16\" height=\"16\" fill=\"white\"/>\
<rect width=\"8\" height=\"8\" fill=\"silver\"/>\
<rect x=\"8\" y=\"8\" width=\"8\" height=\"8\" fill=\"silver\"/>\
</svg>')";

/// Paint value: a closed variant over the supported paint kinds.
///
/// Patterns are immutable once constructed; equality is structural and
/// cross-variant comparisons are always unequal.
#[derive(Debug, Clone)]
pub enum Pattern {
    Color(Color),
    Gradient(Gradient),
    /// Reference to a texture image by source name.
    Texture(String),
    Noise,
}

impl Pattern {
    /// One-character tag prefixing the serialized payload.
    #[inline]
    pub fn tag(&self) -> char {
        match self {
            Pattern::Color(_) => 'C',
            Pattern::Gradient(_) => 'G',
            Pattern::Texture(_) => 'T',
            Pattern::Noise => 'N',
        }
    }

    /// Serialized form: type tag + payload.
    pub fn as_string(&self) -> String {
        match self {
            Pattern::Color(color) => format!("C{}", color.as_string()),
            Pattern::Gradient(gradient) => format!("G{}", gradient.as_string()),
            Pattern::Texture(source) => format!("T{source}"),
            Pattern::Noise => "N".to_string(),
        }
    }

    /// Parses the serialized form produced by [`as_string`](Self::as_string).
    pub fn parse(string: &str) -> Option<Pattern> {
        let mut chars = string.chars();
        let tag = chars.next()?;
        let payload = chars.as_str();
        match tag {
            'C' => Color::parse(payload).map(Pattern::Color),
            'G' => Gradient::parse(payload).map(Pattern::Gradient),
            'T' => Some(Pattern::Texture(payload.to_string())),
            'N' if payload.is_empty() => Some(Pattern::Noise),
            _ => None,
        }
    }

    /// Structural equality with epsilon numeric comparison.
    pub fn almost_eq(&self, other: &Pattern) -> bool {
        match (self, other) {
            (Pattern::Color(a), Pattern::Color(b)) => a.almost_eq(*b),
            (Pattern::Gradient(a), Pattern::Gradient(b)) => a.almost_eq(b),
            (Pattern::Texture(a), Pattern::Texture(b)) => a == b,
            (Pattern::Noise, Pattern::Noise) => true,
            _ => false,
        }
    }

    /// Optional-pattern equality; two `None`s compare equal.
    pub fn almost_eq_opt(a: Option<&Pattern>, b: Option<&Pattern>) -> bool {
        match (a, b) {
            (None, None) => true,
            (Some(a), Some(b)) => a.almost_eq(b),
            _ => false,
        }
    }

    /// CSS background for a paint swatch. `None` or a fully transparent
    /// color shows the bare checkerboard; anything else is layered over it.
    pub fn as_css_background(pattern: Option<&Pattern>) -> String {
        let css = match pattern {
            None => None,
            Some(Pattern::Color(color)) if color.is_transparent() => None,
            Some(Pattern::Color(color)) => {
                // Uniform paints still get the checkerboard underneath so
                // translucency stays visible in the swatch.
                Some(format!(
                    "linear-gradient({0},{0})",
                    color.as_css_string()
                ))
            }
            Some(Pattern::Gradient(gradient)) => Some(gradient.as_css_string()),
            Some(Pattern::Texture(source)) => Some(format!("url('{source}')")),
            Some(Pattern::Noise) => Some("repeating-linear-gradient(45deg,gray 0,silver 2px)".to_string()),
        };

        match css {
            Some(css) => format!("{css},{CHESSBOARD_CSS}"),
            None => CHESSBOARD_CSS.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paint::gradient::GradientKind;

    // ── serialization ─────────────────────────────────────────────────────

    #[test]
    fn color_round_trip() {
        let p = Pattern::Color(Color::rgba(12.0, 34.0, 56.0, 78.0));
        let parsed = Pattern::parse(&p.as_string()).unwrap();
        assert!(p.almost_eq(&parsed));
    }

    #[test]
    fn gradient_round_trip() {
        let p = Pattern::Gradient(Gradient::default_stops(GradientKind::Radial));
        let parsed = Pattern::parse(&p.as_string()).unwrap();
        assert!(p.almost_eq(&parsed));
    }

    #[test]
    fn texture_and_noise_round_trip() {
        for p in [Pattern::Texture("wood.png".to_string()), Pattern::Noise] {
            assert!(p.almost_eq(&Pattern::parse(&p.as_string()).unwrap()));
        }
    }

    #[test]
    fn parse_rejects_unknown_tag() {
        assert!(Pattern::parse("Z123").is_none());
        assert!(Pattern::parse("").is_none());
    }

    // ── equality ──────────────────────────────────────────────────────────

    #[test]
    fn cross_variant_comparison_is_unequal() {
        let c = Pattern::Color(Color::BLACK);
        let g = Pattern::Gradient(Gradient::default_stops(GradientKind::Linear));
        assert!(!c.almost_eq(&g));
    }

    #[test]
    fn optional_equality() {
        assert!(Pattern::almost_eq_opt(None, None));
        assert!(!Pattern::almost_eq_opt(Some(&Pattern::Noise), None));
    }

    // ── css preview ───────────────────────────────────────────────────────

    #[test]
    fn no_paint_shows_bare_checkerboard() {
        let css = Pattern::as_css_background(None);
        assert!(css.starts_with("url("));
    }

    #[test]
    fn transparent_color_shows_bare_checkerboard() {
        let css = Pattern::as_css_background(Some(&Pattern::Color(Color::TRANSPARENT)));
        assert!(css.starts_with("url("));
    }

    #[test]
    fn solid_color_layers_over_checkerboard() {
        let css = Pattern::as_css_background(Some(&Pattern::Color(Color::rgb(255.0, 0.0, 0.0))));
        assert!(css.starts_with("linear-gradient"));
        assert!(css.contains("url("));
    }
}
