//! Color ramps for layers.

use glam::{Vec3, Vec4};

/// A color ramp mapping a normalized value in `[0, 1]` to RGBA.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorRamp {
    /// Ramp name.
    pub name: String,
    /// Color samples (evenly spaced from 0 to 1).
    pub colors: Vec<Vec4>,
}

impl ColorRamp {
    /// Creates a new color ramp.
    pub fn new(name: impl Into<String>, colors: Vec<Vec4>) -> Self {
        Self {
            name: name.into(),
            colors,
        }
    }

    /// Creates an opaque ramp from RGB samples.
    pub fn opaque(name: impl Into<String>, colors: &[Vec3]) -> Self {
        Self::new(name, colors.iter().map(|c| c.extend(1.0)).collect())
    }

    /// A ramp from fully transparent to `color`, used for subset layers.
    pub fn fade_in(color: Vec3) -> Self {
        Self::new("fade", vec![color.extend(0.0), color.extend(1.0)])
    }

    /// Returns a copy whose alpha grows linearly from 0 at the low end.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn translucent(&self) -> Self {
        let n = self.colors.len().saturating_sub(1).max(1) as f32;
        let colors = self
            .colors
            .iter()
            .enumerate()
            .map(|(i, c)| Vec4::new(c.x, c.y, c.z, c.w * i as f32 / n))
            .collect();
        Self::new(format!("{}_translucent", self.name), colors)
    }

    /// Samples the ramp at a given value (0 to 1).
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    pub fn sample(&self, t: f32) -> Vec4 {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };

        match self.colors.len() {
            0 => Vec4::ZERO,
            1 => self.colors[0],
            len => {
                let n = len - 1;
                let idx = ((t * n as f32).floor() as usize).min(n - 1);
                let frac = t * n as f32 - idx as f32;
                self.colors[idx].lerp(self.colors[idx + 1], frac)
            }
        }
    }
}

/// The built-in ramps, in cycling order.
pub fn builtin_ramps() -> Vec<ColorRamp> {
    vec![
        ColorRamp::opaque(
            "viridis",
            &[
                Vec3::new(0.267, 0.004, 0.329),
                Vec3::new(0.253, 0.265, 0.529),
                Vec3::new(0.163, 0.471, 0.558),
                Vec3::new(0.134, 0.658, 0.517),
                Vec3::new(0.477, 0.821, 0.318),
                Vec3::new(0.993, 0.906, 0.144),
            ],
        ),
        ColorRamp::opaque("grays", &[Vec3::ZERO, Vec3::ONE]),
        ColorRamp::opaque(
            "reds",
            &[
                Vec3::new(1.000, 0.961, 0.941),
                Vec3::new(0.988, 0.573, 0.447),
                Vec3::new(0.796, 0.094, 0.114),
                Vec3::new(0.404, 0.000, 0.051),
            ],
        ),
        ColorRamp::opaque(
            "greens",
            &[
                Vec3::new(0.969, 0.988, 0.961),
                Vec3::new(0.631, 0.851, 0.608),
                Vec3::new(0.255, 0.671, 0.365),
                Vec3::new(0.000, 0.267, 0.106),
            ],
        ),
        ColorRamp::opaque(
            "blues",
            &[
                Vec3::new(0.969, 0.984, 1.000),
                Vec3::new(0.620, 0.792, 0.882),
                Vec3::new(0.129, 0.443, 0.710),
                Vec3::new(0.031, 0.188, 0.420),
            ],
        ),
        ColorRamp::opaque(
            "purples",
            &[
                Vec3::new(0.988, 0.984, 0.992),
                Vec3::new(0.737, 0.741, 0.863),
                Vec3::new(0.502, 0.490, 0.729),
                Vec3::new(0.247, 0.000, 0.490),
            ],
        ),
    ]
}

/// Cycles through a fixed list of ramps, e.g. to give each new volume layer a
/// distinct default.
///
/// Owned by whichever component hands out defaults; there is no shared cursor.
#[derive(Debug, Clone)]
pub struct ColorRampSequence {
    ramps: Vec<ColorRamp>,
    cursor: usize,
}

impl ColorRampSequence {
    /// Creates a sequence over the given ramps.
    pub fn new(ramps: Vec<ColorRamp>) -> Self {
        Self { ramps, cursor: 0 }
    }

    /// Returns the next ramp, wrapping around at the end.
    ///
    /// Returns `None` only for an empty sequence.
    pub fn next_ramp(&mut self) -> Option<ColorRamp> {
        if self.ramps.is_empty() {
            return None;
        }
        let ramp = self.ramps[self.cursor].clone();
        self.cursor = (self.cursor + 1) % self.ramps.len();
        Some(ramp)
    }

    /// Restarts the cycle from the first ramp.
    pub fn reset(&mut self) {
        self.cursor = 0;
    }

    /// Returns the number of ramps in the cycle.
    pub fn len(&self) -> usize {
        self.ramps.len()
    }

    /// Returns true if the cycle is empty.
    pub fn is_empty(&self) -> bool {
        self.ramps.is_empty()
    }
}

impl Default for ColorRampSequence {
    fn default() -> Self {
        Self::new(builtin_ramps())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_endpoints() {
        let ramp = ColorRamp::new("bw", vec![Vec4::ZERO, Vec4::ONE]);
        assert_eq!(ramp.sample(0.0), Vec4::ZERO);
        assert_eq!(ramp.sample(1.0), Vec4::ONE);
        assert!((ramp.sample(0.25) - Vec4::splat(0.25)).length() < 1e-6);
        assert_eq!(ramp.sample(-3.0), Vec4::ZERO);
        assert_eq!(ramp.sample(f32::NAN), Vec4::ZERO);
    }

    #[test]
    fn test_degenerate_ramps() {
        assert_eq!(ColorRamp::new("empty", vec![]).sample(0.5), Vec4::ZERO);
        let single = ColorRamp::new("one", vec![Vec4::X]);
        assert_eq!(single.sample(0.9), Vec4::X);
    }

    #[test]
    fn test_fade_in_and_translucent() {
        let fade = ColorRamp::fade_in(Vec3::X);
        assert!(fade.sample(0.0).w.abs() < 1e-6);
        assert!((fade.sample(1.0).w - 1.0).abs() < 1e-6);

        let translucent = builtin_ramps()[0].translucent();
        assert!(translucent.sample(0.0).w.abs() < 1e-6);
        assert!((translucent.sample(1.0).w - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_sequence_cycles() {
        let mut seq = ColorRampSequence::default();
        let n = seq.len();
        let first = seq.next_ramp().unwrap();
        for _ in 1..n {
            seq.next_ramp();
        }
        assert_eq!(seq.next_ramp().unwrap(), first);

        seq.reset();
        assert_eq!(seq.next_ramp().unwrap().name, "viridis");
    }

    #[test]
    fn test_independent_sequences() {
        let mut a = ColorRampSequence::default();
        let mut b = ColorRampSequence::default();
        a.next_ramp();
        assert_eq!(b.next_ramp().unwrap().name, "viridis");
        assert_eq!(a.next_ramp().unwrap().name, "grays");
    }

    #[test]
    fn test_empty_sequence() {
        let mut seq = ColorRampSequence::new(Vec::new());
        assert!(seq.is_empty());
        assert!(seq.next_ramp().is_none());
    }
}
