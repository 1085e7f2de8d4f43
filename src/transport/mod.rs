//! Calculator transport - the boundary to the remote calculation service

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::assignment::AssignmentPayload;
use crate::error::{ViewerError, ViewerResult};
use crate::input::TowerInput;
use crate::library::ProfileLibrary;

#[cfg(feature = "http")]
mod http;
mod local;

#[cfg(feature = "http")]
pub use http::HttpCalculator;
pub use local::LocalCalculator;

/// Everything the viewer needs from the calculator.
///
/// Timeouts are the implementation's concern; callers only see success or
/// a [`ViewerError::Transport`] / [`ViewerError::Domain`] failure.
#[allow(async_fn_in_trait)]
pub trait CalculatorTransport {
    async fn fetch_profile_library(&self) -> ViewerResult<ProfileLibrary>;

    /// Returns the raw geometry payload; validation is the caller's job.
    async fn recalculate(&self, input: &TowerInput, assignments: &AssignmentPayload) -> ViewerResult<Value>;

    async fn fetch_geometry(&self, tower_id: &str) -> ViewerResult<Value>;
}

/// Body of a recalculation request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecalculationRequest {
    #[serde(flatten)]
    pub tower: TowerInput,
    #[serde(default)]
    pub element_sections: AssignmentPayload,
}

/// Reply of the calculator's `/health` endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// Classify a failed response. A JSON `{"error": ..}` body is the
/// calculator rejecting the request; anything else is a transport failure.
pub fn classify_failure(status: u16, body: &str) -> ViewerError {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody { error }) => ViewerError::Domain(error),
        Err(_) => ViewerError::Transport(format!("HTTP {}: {}", status, body.trim())),
    }
}

/// Saved calculations come wrapped as `{ "message", "tower_id", "data": {..} }`;
/// direct calculations return the geometry itself.
pub fn unwrap_geometry(value: Value) -> Value {
    match value {
        Value::Object(mut map) if !map.contains_key("coordinates") && map.contains_key("data") => {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_error_body_is_domain_error() {
        match classify_failure(500, r#"{"error": "invalid profile"}"#) {
            ViewerError::Domain(msg) => assert_eq!(msg, "invalid profile"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_plain_failure_is_transport_error() {
        assert!(matches!(
            classify_failure(502, "Bad Gateway"),
            ViewerError::Transport(_)
        ));
    }

    #[test]
    fn test_unwrap_saved_geometry() {
        let wrapped = json!({ "message": "ok", "tower_id": "t", "data": { "coordinates": [], "elements": [] } });
        assert_eq!(unwrap_geometry(wrapped), json!({ "coordinates": [], "elements": [] }));

        let direct = json!({ "coordinates": [1], "elements": [2], "data": 3 });
        assert_eq!(unwrap_geometry(direct.clone()), direct);
    }

    #[test]
    fn test_request_body_flattens_tower_input() {
        let mut sections = AssignmentPayload::new();
        sections.insert("1".into(), [("M1".to_string(), "RD 2in".to_string())].into());
        let request = RecalculationRequest {
            tower: TowerInput::new("tower_30", 3.6, 2.0, 30.0, 8, 2),
            element_sections: sections,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["Height"], json!(30.0));
        assert_eq!(value["element_sections"]["1"]["M1"], json!("RD 2in"));

        let back: RecalculationRequest = serde_json::from_value(value).unwrap();
        assert_eq!(back, request);
    }
}
