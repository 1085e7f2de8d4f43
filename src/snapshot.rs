//! Clipboard export of the current tower, geometry and assignments

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::assignment::AssignmentPayload;
use crate::error::ViewerResult;
use crate::input::TowerInput;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub tower: TowerInput,
    /// Geometry payload in wire form, `null` before the first calculation
    #[serde(default)]
    pub geometry: Value,
    #[serde(default)]
    pub element_sections: AssignmentPayload,
}

impl Snapshot {
    /// Pretty JSON with two-space indentation
    pub fn to_pretty_json(&self) -> ViewerResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(text: &str) -> ViewerResult<Self> {
        Ok(serde_json::from_str(text)?)
    }
}
