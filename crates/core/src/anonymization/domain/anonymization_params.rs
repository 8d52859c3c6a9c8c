use serde::{Deserialize, Serialize};

use crate::shared::constants::{
    DEFAULT_MASK_SCALE, DEFAULT_MOSAIC_SIZE, DEFAULT_THRESHOLD, NO_DOWNSCALE,
};

/// Masking style drawn over each detected face.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnonymizationMethod {
    #[default]
    Blur,
    /// Solid filled box.
    Box,
    Mosaic,
}

impl AnonymizationMethod {
    pub const ALL: &[AnonymizationMethod] = &[
        AnonymizationMethod::Blur,
        AnonymizationMethod::Box,
        AnonymizationMethod::Mosaic,
    ];
}

impl std::fmt::Display for AnonymizationMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnonymizationMethod::Blur => write!(f, "Blur"),
            AnonymizationMethod::Box => write!(f, "Solid box"),
            AnonymizationMethod::Mosaic => write!(f, "Mosaic"),
        }
    }
}

impl std::str::FromStr for AnonymizationMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "blur" => Ok(AnonymizationMethod::Blur),
            "box" | "solid" => Ok(AnonymizationMethod::Box),
            "mosaic" => Ok(AnonymizationMethod::Mosaic),
            other => Err(format!(
                "unknown anonymization method '{other}' (expected blur, box or mosaic)"
            )),
        }
    }
}

/// Parameters handed to the anonymizer for every file of a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnonymizationParams {
    pub method: AnonymizationMethod,
    /// Detection confidence threshold in `0.0..=1.0`.
    pub threshold: f64,
    /// Multiplier applied to each detected face box before masking.
    pub mask_scale: f64,
    /// Detection runs on the media size divided by this factor (`>= 1.0`).
    pub downscale: f64,
    /// Rectangular masks instead of ellipses.
    pub box_shape: bool,
    pub draw_scores: bool,
    /// Cell size in pixels, only used by [`AnonymizationMethod::Mosaic`].
    pub mosaic_size: u32,
}

impl Default for AnonymizationParams {
    fn default() -> Self {
        Self {
            method: AnonymizationMethod::Blur,
            threshold: DEFAULT_THRESHOLD,
            mask_scale: DEFAULT_MASK_SCALE,
            downscale: NO_DOWNSCALE,
            box_shape: false,
            draw_scores: false,
            mosaic_size: DEFAULT_MOSAIC_SIZE,
        }
    }
}

impl AnonymizationParams {
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(format!(
                "Threshold must be between 0.0 and 1.0, got {}",
                self.threshold
            ));
        }
        if !(self.mask_scale > 0.0) {
            return Err(format!(
                "Mask scale must be positive, got {}",
                self.mask_scale
            ));
        }
        if !(self.downscale >= 1.0) {
            return Err(format!(
                "Downscale factor must be at least 1.0, got {}",
                self.downscale
            ));
        }
        if self.mosaic_size == 0 {
            return Err("Mosaic size must be at least 1 pixel".to_string());
        }
        Ok(())
    }

    /// Detection size for media of `width`x`height`, or `None` at full resolution.
    pub fn detection_size(&self, width: u32, height: u32) -> Option<(u32, u32)> {
        if self.downscale <= NO_DOWNSCALE {
            return None;
        }
        let scale = |v: u32| ((v as f64 / self.downscale).round() as u32).max(1);
        Some((scale(width), scale(height)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_defaults_match_deface() {
        let params = AnonymizationParams::default();
        assert_eq!(params.method, AnonymizationMethod::Blur);
        approx::assert_relative_eq!(params.threshold, 0.2);
        approx::assert_relative_eq!(params.mask_scale, 1.3);
        approx::assert_relative_eq!(params.downscale, 1.0);
        assert!(!params.box_shape);
        assert!(!params.draw_scores);
        assert_eq!(params.mosaic_size, 20);
        assert!(params.validate().is_ok());
    }

    #[rstest]
    #[case("blur", AnonymizationMethod::Blur)]
    #[case("BOX", AnonymizationMethod::Box)]
    #[case("solid", AnonymizationMethod::Box)]
    #[case("Mosaic", AnonymizationMethod::Mosaic)]
    fn test_method_from_str(#[case] input: &str, #[case] expected: AnonymizationMethod) {
        assert_eq!(input.parse::<AnonymizationMethod>().unwrap(), expected);
    }

    #[test]
    fn test_method_from_str_rejects_unknown() {
        let err = "pixelate".parse::<AnonymizationMethod>().unwrap_err();
        assert!(err.contains("pixelate"));
    }

    #[test]
    fn test_params_serialize_method_lowercase() {
        let params = AnonymizationParams {
            method: AnonymizationMethod::Mosaic,
            ..Default::default()
        };
        let json = serde_json::to_string(&params).unwrap();
        assert!(json.contains("\"method\":\"mosaic\""));

        let back: AnonymizationParams = serde_json::from_str(&json).unwrap();
        assert_eq!(back, params);
    }

    #[rstest]
    #[case(-0.1, 1.3, 1.0, 20)]
    #[case(1.5, 1.3, 1.0, 20)]
    #[case(0.2, 0.0, 1.0, 20)]
    #[case(0.2, 1.3, 0.5, 20)]
    #[case(0.2, 1.3, f64::NAN, 20)]
    #[case(0.2, 1.3, 1.0, 0)]
    fn test_validate_rejects(
        #[case] threshold: f64,
        #[case] mask_scale: f64,
        #[case] downscale: f64,
        #[case] mosaic_size: u32,
    ) {
        let params = AnonymizationParams {
            threshold,
            mask_scale,
            downscale,
            mosaic_size,
            ..Default::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_detection_size_none_without_downscale() {
        let params = AnonymizationParams::default();
        assert_eq!(params.detection_size(1920, 1080), None);
    }

    #[test]
    fn test_detection_size_divides_and_rounds() {
        let params = AnonymizationParams {
            downscale: 2.0,
            ..Default::default()
        };
        assert_eq!(params.detection_size(1920, 1080), Some((960, 540)));

        let params = AnonymizationParams {
            downscale: 3.0,
            ..Default::default()
        };
        assert_eq!(params.detection_size(1000, 500), Some((333, 167)));
    }

    #[test]
    fn test_detection_size_never_zero() {
        let params = AnonymizationParams {
            downscale: 100.0,
            ..Default::default()
        };
        assert_eq!(params.detection_size(10, 10), Some((1, 1)));
    }
}
