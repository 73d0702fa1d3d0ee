use super::color::Color;
use crate::coords::eq_eps;
use smallvec::SmallVec;

/// Gradient shape.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub enum GradientKind {
    #[default]
    Linear,
    Radial,
}

/// Single gradient stop: position in 0..100 plus a color.
#[derive(Debug, Copy, Clone)]
pub struct GradientStop {
    pub position: f32,
    pub color: Color,
}

impl GradientStop {
    #[inline]
    pub const fn new(position: f32, color: Color) -> Self {
        Self { position, color }
    }

    #[inline]
    pub fn almost_eq(self, other: GradientStop) -> bool {
        eq_eps(self.position, other.position) && self.color.almost_eq(other.color)
    }
}

/// Immutable gradient value: a kind plus an ordered stop list.
///
/// Stops are sorted by position at construction; positions are clamped
/// to 0..100. Most gradients carry two or three stops, hence the inline
/// capacity.
#[derive(Debug, Clone)]
pub struct Gradient {
    kind: GradientKind,
    stops: SmallVec<[GradientStop; 4]>,
}

impl Gradient {
    pub fn new(kind: GradientKind, stops: impl IntoIterator<Item = GradientStop>) -> Self {
        let mut stops: SmallVec<[GradientStop; 4]> = stops
            .into_iter()
            .map(|s| GradientStop::new(s.position.clamp(0.0, 100.0), s.color))
            .collect();
        stops.sort_by(|a, b| a.position.total_cmp(&b.position));

        if stops.is_empty() {
            stops.push(GradientStop::new(0.0, Color::BLACK));
        }

        Self { kind, stops }
    }

    /// Default two-stop black-to-white gradient.
    pub fn default_stops(kind: GradientKind) -> Self {
        Self::new(
            kind,
            [
                GradientStop::new(0.0, Color::BLACK),
                GradientStop::new(100.0, Color::WHITE),
            ],
        )
    }

    #[inline]
    pub fn kind(&self) -> GradientKind {
        self.kind
    }

    #[inline]
    pub fn stops(&self) -> &[GradientStop] {
        &self.stops
    }

    /// Samples the gradient at `t` in 0..1, returning straight-alpha RGBA.
    pub fn sample(&self, t: f32) -> [f32; 4] {
        let pos = t.clamp(0.0, 1.0) * 100.0;

        let first = self.stops[0];
        if pos <= first.position {
            return first.color.to_rgba();
        }
        let last = self.stops[self.stops.len() - 1];
        if pos >= last.position {
            return last.color.to_rgba();
        }

        for pair in self.stops.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if pos <= b.position {
                let span = b.position - a.position;
                let f = if span <= 0.0 { 0.0 } else { (pos - a.position) / span };
                let ca = a.color.to_rgba();
                let cb = b.color.to_rgba();
                return [
                    ca[0] + (cb[0] - ca[0]) * f,
                    ca[1] + (cb[1] - ca[1]) * f,
                    ca[2] + (cb[2] - ca[2]) * f,
                    ca[3] + (cb[3] - ca[3]) * f,
                ];
            }
        }

        last.color.to_rgba()
    }

    /// CSS gradient string over the stop list.
    pub fn as_css_string(&self) -> String {
        let stops: Vec<String> = self
            .stops
            .iter()
            .map(|s| format!("{} {}%", s.color.as_css_string(), s.position))
            .collect();
        match self.kind {
            GradientKind::Linear => format!("linear-gradient(90deg,{})", stops.join(",")),
            GradientKind::Radial => format!("radial-gradient(circle,{})", stops.join(",")),
        }
    }

    /// Serialized form: kind tag then `position:color` pairs joined by `;`.
    pub fn as_string(&self) -> String {
        let tag = match self.kind {
            GradientKind::Linear => 'L',
            GradientKind::Radial => 'R',
        };
        let stops: Vec<String> = self
            .stops
            .iter()
            .map(|s| format!("{}:{}", s.position, s.color.as_string()))
            .collect();
        format!("{tag}{}", stops.join(";"))
    }

    /// Parses the serialized form produced by [`as_string`](Self::as_string).
    pub fn parse(string: &str) -> Option<Gradient> {
        let mut chars = string.chars();
        let kind = match chars.next()? {
            'L' => GradientKind::Linear,
            'R' => GradientKind::Radial,
            _ => return None,
        };

        let mut stops = Vec::new();
        for part in chars.as_str().split(';') {
            let (pos, color) = part.split_once(':')?;
            stops.push(GradientStop::new(
                pos.trim().parse().ok()?,
                Color::parse(color)?,
            ));
        }
        if stops.is_empty() {
            return None;
        }

        Some(Gradient::new(kind, stops))
    }

    /// Ordered stop-list equality with epsilon positions.
    pub fn almost_eq(&self, other: &Gradient) -> bool {
        self.kind == other.kind
            && self.stops.len() == other.stops.len()
            && self
                .stops
                .iter()
                .zip(other.stops.iter())
                .all(|(a, b)| a.almost_eq(*b))
    }
}
