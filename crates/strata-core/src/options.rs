//! Configuration options for strata compositors and selection.

use glam::Vec4;
use serde::{Deserialize, Serialize};

use crate::error::{Result, StrataError};

/// Tunable constants shared by the compositors and the selection code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Width of the transparent gap between adjacent volume bands. Must be
    /// finite and non-negative.
    pub guard_gap: f32,

    /// Upper bound of the normalized base-layer intensity. Must lie in
    /// `(0, 1)` so that base cells are never mistaken for claimed band cells.
    pub base_ceiling: f32,

    /// Stride applied on every axis while a volume compositor is downsampled.
    pub downsample_factor: usize,

    /// Default element budget per chunk for volume mask evaluation.
    pub chunk_budget: usize,

    /// Size used for point layers that have no valid size set.
    pub default_point_size: f32,

    /// Color used for point layers that have no valid color set.
    pub default_point_color: Vec4,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            guard_gap: 0.2,
            base_ceiling: 0.99,
            downsample_factor: 2,
            chunk_budget: 1 << 22,
            default_point_size: 10.0,
            default_point_color: Vec4::ONE,
        }
    }
}

impl Options {
    /// Parses options from a JSON document. Missing fields take their defaults.
    ///
    /// The parsed values are checked with [`Options::validate`].
    pub fn from_json_str(json: &str) -> Result<Self> {
        let options: Self = serde_json::from_str(json)?;
        options.validate()?;
        Ok(options)
    }

    /// Checks that every value lies in its allowed range.
    ///
    /// `base_ceiling` must be in `(0, 1)`, `guard_gap` must be finite and
    /// non-negative, and `downsample_factor` must be at least 1.
    pub fn validate(&self) -> Result<()> {
        if !(self.base_ceiling > 0.0 && self.base_ceiling < 1.0) {
            return Err(StrataError::InvalidOptions(format!(
                "base_ceiling must be in (0, 1), got {}",
                self.base_ceiling
            )));
        }
        if !(self.guard_gap.is_finite() && self.guard_gap >= 0.0) {
            return Err(StrataError::InvalidOptions(format!(
                "guard_gap must be finite and >= 0, got {}",
                self.guard_gap
            )));
        }
        if self.downsample_factor == 0 {
            return Err(StrataError::InvalidOptions(
                "downsample_factor must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Serializes the options to pretty-printed JSON.
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Distance between the starts of two consecutive volume bands.
    #[must_use]
    pub fn band_stride(&self) -> f32 {
        1.0 + self.guard_gap
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = Options::default();
        assert!((options.guard_gap - 0.2).abs() < 1e-6);
        assert!((options.band_stride() - 1.2).abs() < 1e-6);
        assert!(options.base_ceiling < 1.0);
    }

    #[test]
    fn test_partial_json() {
        let options = Options::from_json_str(r#"{ "guard_gap": 0.5, "chunk_budget": 64 }"#)
            .expect("valid json");
        assert!((options.guard_gap - 0.5).abs() < 1e-6);
        assert_eq!(options.chunk_budget, 64);
        assert_eq!(options.downsample_factor, 2);
    }

    #[test]
    fn test_json_roundtrip() {
        let options = Options {
            downsample_factor: 4,
            ..Options::default()
        };
        let json = options.to_json_string().unwrap();
        assert_eq!(Options::from_json_str(&json).unwrap(), options);
    }

    #[test]
    fn test_bad_json() {
        assert!(Options::from_json_str("{ not json").is_err());
    }

    #[test]
    fn test_out_of_range_json_rejected() {
        for json in [
            r#"{ "base_ceiling": 1.0 }"#,
            r#"{ "base_ceiling": 1.5 }"#,
            r#"{ "base_ceiling": 0.0 }"#,
            r#"{ "guard_gap": -0.1 }"#,
            r#"{ "downsample_factor": 0 }"#,
        ] {
            assert!(
                matches!(
                    Options::from_json_str(json),
                    Err(StrataError::InvalidOptions(_))
                ),
                "{json} should be rejected"
            );
        }
        assert!(Options::from_json_str(r#"{ "guard_gap": 0.0, "base_ceiling": 0.5 }"#).is_ok());
    }

    #[test]
    fn test_validate_non_finite() {
        let options = Options {
            guard_gap: f32::INFINITY,
            ..Options::default()
        };
        assert!(options.validate().is_err());
        let options = Options {
            base_ceiling: f32::NAN,
            ..Options::default()
        };
        assert!(options.validate().is_err());
        assert!(Options::default().validate().is_ok());
    }
}
