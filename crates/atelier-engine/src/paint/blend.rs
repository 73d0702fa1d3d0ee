//! Compositing math on premultiplied RGBA in 0..1.
//!
//! Porter-Duff operators work directly on premultiplied components.
//! Blend modes unpremultiply, blend in straight color, and composite the
//! result source-over, which matches the CSS compositing model.

/// Porter-Duff compositing operator.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub enum CompositeOperator {
    #[default]
    SourceOver,
    SourceIn,
    SourceOut,
    SourceAtop,
    DestinationOver,
    DestinationIn,
    DestinationOut,
    DestinationAtop,
    Lighter,
    Copy,
    Xor,
    /// Legacy component-wise darken of source against destination.
    Darker,
}

/// Separable and non-separable CSS blend modes.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub enum BlendMode {
    #[default]
    Normal,
    Multiply,
    Screen,
    Overlay,
    Darken,
    Lighten,
    ColorDodge,
    ColorBurn,
    HardLight,
    SoftLight,
    Difference,
    Exclusion,
    Hue,
    Saturation,
    Color,
    Luminosity,
}

/// Compositing mode: either a raw operator or a blend mode.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum CompositeMode {
    Operator(CompositeOperator),
    Blend(BlendMode),
}

impl Default for CompositeMode {
    #[inline]
    fn default() -> Self {
        CompositeMode::Operator(CompositeOperator::SourceOver)
    }
}

impl From<CompositeOperator> for CompositeMode {
    #[inline]
    fn from(op: CompositeOperator) -> Self {
        CompositeMode::Operator(op)
    }
}

impl From<BlendMode> for CompositeMode {
    #[inline]
    fn from(mode: BlendMode) -> Self {
        CompositeMode::Blend(mode)
    }
}

/// Composites premultiplied `src` over premultiplied `dst`.
pub fn composite(dst: [f32; 4], src: [f32; 4], mode: CompositeMode) -> [f32; 4] {
    match mode {
        CompositeMode::Operator(op) => composite_operator(dst, src, op),
        CompositeMode::Blend(BlendMode::Normal) => {
            composite_operator(dst, src, CompositeOperator::SourceOver)
        }
        CompositeMode::Blend(mode) => composite_blend(dst, src, mode),
    }
}

fn composite_operator(dst: [f32; 4], src: [f32; 4], op: CompositeOperator) -> [f32; 4] {
    let sa = src[3];
    let da = dst[3];

    // Source and destination coefficients of the Porter-Duff equation.
    let (fa, fb) = match op {
        CompositeOperator::SourceOver => (1.0, 1.0 - sa),
        CompositeOperator::SourceIn => (da, 0.0),
        CompositeOperator::SourceOut => (1.0 - da, 0.0),
        CompositeOperator::SourceAtop => (da, 1.0 - sa),
        CompositeOperator::DestinationOver => (1.0 - da, 1.0),
        CompositeOperator::DestinationIn => (0.0, sa),
        CompositeOperator::DestinationOut => (0.0, 1.0 - sa),
        CompositeOperator::DestinationAtop => (1.0 - da, sa),
        CompositeOperator::Lighter => (1.0, 1.0),
        CompositeOperator::Copy => (1.0, 0.0),
        CompositeOperator::Xor => (1.0 - da, 1.0 - sa),
        CompositeOperator::Darker => {
            return [
                src[0].min(dst[0]),
                src[1].min(dst[1]),
                src[2].min(dst[2]),
                (sa + da * (1.0 - sa)).min(1.0),
            ];
        }
    };

    [
        (src[0] * fa + dst[0] * fb).min(1.0),
        (src[1] * fa + dst[1] * fb).min(1.0),
        (src[2] * fa + dst[2] * fb).min(1.0),
        (sa * fa + da * fb).min(1.0),
    ]
}

fn composite_blend(dst: [f32; 4], src: [f32; 4], mode: BlendMode) -> [f32; 4] {
    let sa = src[3];
    let da = dst[3];
    if sa <= 0.0 {
        return dst;
    }

    let cs = unpremultiply(src);
    let cb = unpremultiply(dst);

    let blended = match mode {
        BlendMode::Hue | BlendMode::Saturation | BlendMode::Color | BlendMode::Luminosity => {
            blend_nonseparable(cb, cs, mode)
        }
        _ => [
            blend_channel(cb[0], cs[0], mode),
            blend_channel(cb[1], cs[1], mode),
            blend_channel(cb[2], cs[2], mode),
        ],
    };

    // Mix the blend result toward the raw source where the backdrop is
    // transparent, then composite source-over.
    let mix = |s: f32, b: f32| (1.0 - da) * s + da * b;
    let out_a = sa + da * (1.0 - sa);
    [
        mix(cs[0], blended[0]) * sa + dst[0] * (1.0 - sa),
        mix(cs[1], blended[1]) * sa + dst[1] * (1.0 - sa),
        mix(cs[2], blended[2]) * sa + dst[2] * (1.0 - sa),
        out_a,
    ]
}

#[inline]
fn unpremultiply(c: [f32; 4]) -> [f32; 3] {
    if c[3] <= 0.0 {
        [0.0, 0.0, 0.0]
    } else {
        [c[0] / c[3], c[1] / c[3], c[2] / c[3]]
    }
}

fn blend_channel(b: f32, s: f32, mode: BlendMode) -> f32 {
    match mode {
        BlendMode::Multiply => b * s,
        BlendMode::Screen => b + s - b * s,
        BlendMode::Overlay => blend_channel(s, b, BlendMode::HardLight),
        BlendMode::Darken => b.min(s),
        BlendMode::Lighten => b.max(s),
        BlendMode::ColorDodge => {
            if b <= 0.0 {
                0.0
            } else if s >= 1.0 {
                1.0
            } else {
                (b / (1.0 - s)).min(1.0)
            }
        }
        BlendMode::ColorBurn => {
            if b >= 1.0 {
                1.0
            } else if s <= 0.0 {
                0.0
            } else {
                1.0 - ((1.0 - b) / s).min(1.0)
            }
        }
        BlendMode::HardLight => {
            if s <= 0.5 {
                b * (2.0 * s)
            } else {
                let s = 2.0 * s - 1.0;
                b + s - b * s
            }
        }
        BlendMode::SoftLight => {
            if s <= 0.5 {
                b - (1.0 - 2.0 * s) * b * (1.0 - b)
            } else {
                let d = if b <= 0.25 {
                    ((16.0 * b - 12.0) * b + 4.0) * b
                } else {
                    b.sqrt()
                };
                b + (2.0 * s - 1.0) * (d - b)
            }
        }
        BlendMode::Difference => (b - s).abs(),
        BlendMode::Exclusion => b + s - 2.0 * b * s,
        _ => s,
    }
}

fn blend_nonseparable(cb: [f32; 3], cs: [f32; 3], mode: BlendMode) -> [f32; 3] {
    match mode {
        BlendMode::Hue => set_lum(set_sat(cs, sat(cb)), lum(cb)),
        BlendMode::Saturation => set_lum(set_sat(cb, sat(cs)), lum(cb)),
        BlendMode::Color => set_lum(cs, lum(cb)),
        BlendMode::Luminosity => set_lum(cb, lum(cs)),
        _ => cs,
    }
}

#[inline]
fn lum(c: [f32; 3]) -> f32 {
    0.3 * c[0] + 0.59 * c[1] + 0.11 * c[2]
}

#[inline]
fn sat(c: [f32; 3]) -> f32 {
    c[0].max(c[1]).max(c[2]) - c[0].min(c[1]).min(c[2])
}

fn clip_color(c: [f32; 3]) -> [f32; 3] {
    let l = lum(c);
    let n = c[0].min(c[1]).min(c[2]);
    let x = c[0].max(c[1]).max(c[2]);
    let mut out = c;
    if n < 0.0 {
        for v in &mut out {
            *v = l + (*v - l) * l / (l - n);
        }
    }
    if x > 1.0 {
        for v in &mut out {
            *v = l + (*v - l) * (1.0 - l) / (x - l);
        }
    }
    out
}

fn set_lum(c: [f32; 3], l: f32) -> [f32; 3] {
    let d = l - lum(c);
    clip_color([c[0] + d, c[1] + d, c[2] + d])
}

fn set_sat(c: [f32; 3], s: f32) -> [f32; 3] {
    let mut idx = [0usize, 1, 2];
    idx.sort_by(|&a, &b| c[a].total_cmp(&c[b]));
    let (min_i, mid_i, max_i) = (idx[0], idx[1], idx[2]);

    let mut out = [0.0f32; 3];
    if c[max_i] > c[min_i] {
        out[mid_i] = (c[mid_i] - c[min_i]) * s / (c[max_i] - c[min_i]);
        out[max_i] = s;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: [f32; 4], b: [f32; 4]) -> bool {
        a.iter().zip(b.iter()).all(|(x, y)| (x - y).abs() < 1e-4)
    }

    // ── operators ─────────────────────────────────────────────────────────

    #[test]
    fn source_over_opaque_replaces() {
        let dst = [0.0, 0.5, 0.0, 1.0];
        let src = [1.0, 0.0, 0.0, 1.0];
        assert!(close(composite(dst, src, CompositeMode::default()), src));
    }

    #[test]
    fn source_over_half_alpha_mixes() {
        let dst = [0.0, 0.0, 0.0, 1.0];
        let src = [0.5, 0.0, 0.0, 0.5]; // premultiplied red at 50%
        let out = composite(dst, src, CompositeMode::default());
        assert!(close(out, [0.5, 0.0, 0.0, 1.0]));
    }

    #[test]
    fn destination_in_keeps_overlap_only() {
        let dst = [0.2, 0.4, 0.6, 1.0];
        let src = [0.0, 0.0, 0.0, 0.5];
        let out = composite(dst, src, CompositeOperator::DestinationIn.into());
        assert!(close(out, [0.1, 0.2, 0.3, 0.5]));
    }

    #[test]
    fn copy_ignores_destination() {
        let dst = [1.0, 1.0, 1.0, 1.0];
        let src = [0.25, 0.0, 0.0, 0.25];
        assert!(close(composite(dst, src, CompositeOperator::Copy.into()), src));
    }

    #[test]
    fn lighter_adds_and_clamps() {
        let dst = [0.8, 0.0, 0.0, 1.0];
        let src = [0.8, 0.0, 0.0, 1.0];
        let out = composite(dst, src, CompositeOperator::Lighter.into());
        assert!(close(out, [1.0, 0.0, 0.0, 1.0]));
    }

    // ── blend modes ───────────────────────────────────────────────────────

    #[test]
    fn multiply_darkens() {
        let dst = [0.5, 0.5, 0.5, 1.0];
        let src = [0.5, 0.5, 0.5, 1.0];
        let out = composite(dst, src, BlendMode::Multiply.into());
        assert!(close(out, [0.25, 0.25, 0.25, 1.0]));
    }

    #[test]
    fn screen_lightens() {
        let dst = [0.5, 0.5, 0.5, 1.0];
        let src = [0.5, 0.5, 0.5, 1.0];
        let out = composite(dst, src, BlendMode::Screen.into());
        assert!(close(out, [0.75, 0.75, 0.75, 1.0]));
    }

    #[test]
    fn normal_blend_equals_source_over() {
        let dst = [0.1, 0.2, 0.3, 0.8];
        let src = [0.3, 0.1, 0.0, 0.5];
        assert!(close(
            composite(dst, src, BlendMode::Normal.into()),
            composite(dst, src, CompositeOperator::SourceOver.into()),
        ));
    }

    #[test]
    fn blend_over_transparent_backdrop_is_source() {
        let dst = [0.0, 0.0, 0.0, 0.0];
        let src = [0.4, 0.2, 0.0, 0.8];
        let out = composite(dst, src, BlendMode::Multiply.into());
        assert!(close(out, src));
    }

    #[test]
    fn luminosity_preserves_backdrop_hue() {
        let dst = [1.0, 0.0, 0.0, 1.0]; // red
        let src = [0.5, 0.5, 0.5, 1.0]; // gray, lum 0.5
        let out = composite(dst, src, BlendMode::Luminosity.into());
        // Output stays redder than green/blue.
        assert!(out[0] > out[1] && out[0] > out[2]);
    }
}
