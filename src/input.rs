//! Tower input - the parameters the calculator turns into geometry

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CrossSection {
    #[default]
    Square,
    Triangular,
}

/// Wind exposure category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExposureCategory {
    B,
    C,
    D,
}

/// Tower description as collected by the input form.
///
/// Field names follow the calculator's JSON keys. Form-level validation
/// happens before a value of this type is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TowerInput {
    pub tower_id: String,
    #[serde(rename = "Tower Base Width")]
    pub base_width: f64,
    #[serde(rename = "Top Width")]
    pub top_width: f64,
    #[serde(rename = "Height")]
    pub height: f64,
    #[serde(rename = "Variable Segments")]
    pub variable_segments: u32,
    #[serde(rename = "Constant Segments")]
    pub constant_segments: u32,
    #[serde(rename = "Cross Section", default)]
    pub cross_section: CrossSection,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exposure_category: Option<ExposureCategory>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub importance_factor: Option<f64>,
    /// Service wind speed in m/s
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wind_speed_service: Option<f64>,
    /// Ultimate wind speed in m/s
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wind_speed_ultimate: Option<f64>,
}

impl TowerInput {
    /// Geometry-only input; wind parameters left unset
    pub fn new(
        tower_id: impl Into<String>,
        base_width: f64,
        top_width: f64,
        height: f64,
        variable_segments: u32,
        constant_segments: u32,
    ) -> Self {
        Self {
            tower_id: tower_id.into(),
            base_width,
            top_width,
            height,
            variable_segments,
            constant_segments,
            cross_section: CrossSection::Square,
            exposure_category: None,
            importance_factor: None,
            wind_speed_service: None,
            wind_speed_ultimate: None,
        }
    }

    pub fn with_cross_section(mut self, cross_section: CrossSection) -> Self {
        self.cross_section = cross_section;
        self
    }

    pub fn with_wind(mut self, exposure: ExposureCategory, importance: f64, service: f64, ultimate: f64) -> Self {
        self.exposure_category = Some(exposure);
        self.importance_factor = Some(importance);
        self.wind_speed_service = Some(service);
        self.wind_speed_ultimate = Some(ultimate);
        self
    }

    pub fn section_count(&self) -> u32 {
        self.variable_segments + self.constant_segments
    }

    pub fn segment_height(&self) -> f64 {
        self.height / self.section_count().max(1) as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_serializes_with_calculator_keys() {
        let input = TowerInput::new("tower_29.3", 3.6, 2.0, 29.3, 8, 2);
        let value = serde_json::to_value(&input).unwrap();
        assert_eq!(value["Tower Base Width"], json!(3.6));
        assert_eq!(value["Variable Segments"], json!(8));
        assert_eq!(value["Cross Section"], json!("Square"));
        assert!(value.get("importance_factor").is_none());
    }

    #[test]
    fn test_segment_height() {
        let input = TowerInput::new("t", 3.6, 2.0, 30.0, 8, 2);
        assert_eq!(input.section_count(), 10);
        assert!((input.segment_height() - 3.0).abs() < 1e-12);
    }
}
