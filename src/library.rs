//! Profile library - the catalogue of round and angular member sections

use serde::{Deserialize, Serialize};

/// Profile family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfileKind {
    Round,
    Angular,
}

impl ProfileKind {
    /// The calculator names round bars with an `RD` prefix; everything else
    /// is treated as an angle section.
    pub fn infer_from_name(name: &str) -> Self {
        if name.starts_with("RD") {
            ProfileKind::Round
        } else {
            ProfileKind::Angular
        }
    }
}

/// One catalogue entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileDescriptor {
    pub name: String,
    /// Cross-sectional area in mm²
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cross_area: Option<f64>,
    /// Width exposed to wind in m
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub projected_width: Option<f64>,
    /// Moment of inertia in mm⁴
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub moment_of_inertia: Option<f64>,
}

impl ProfileDescriptor {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cross_area: None,
            projected_width: None,
            moment_of_inertia: None,
        }
    }
}

/// A choice offered by the profile picker. The empty name is the default.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileOption {
    pub name: String,
    pub label: String,
    pub kind: Option<ProfileKind>,
}

/// Read-only mirror of the remote catalogue. Replaced wholesale on refresh.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProfileLibrary {
    #[serde(default)]
    pub round: Vec<ProfileDescriptor>,
    #[serde(default)]
    pub angular: Vec<ProfileDescriptor>,
}

impl ProfileLibrary {
    pub fn new(round: Vec<ProfileDescriptor>, angular: Vec<ProfileDescriptor>) -> Self {
        Self { round, angular }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.round.is_empty() && self.angular.is_empty()
    }

    pub fn len(&self) -> usize {
        self.round.len() + self.angular.len()
    }

    pub fn profiles(&self, kind: ProfileKind) -> &[ProfileDescriptor] {
        match kind {
            ProfileKind::Round => &self.round,
            ProfileKind::Angular => &self.angular,
        }
    }

    /// Find a profile by name in either family
    pub fn find(&self, name: &str) -> Option<(ProfileKind, &ProfileDescriptor)> {
        self.round
            .iter()
            .find(|p| p.name == name)
            .map(|p| (ProfileKind::Round, p))
            .or_else(|| {
                self.angular
                    .iter()
                    .find(|p| p.name == name)
                    .map(|p| (ProfileKind::Angular, p))
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    /// Picker entries: "Default" first, then round, then angular names.
    /// An empty library still offers "Default".
    pub fn options(&self) -> Vec<ProfileOption> {
        let mut options = vec![ProfileOption {
            name: String::new(),
            label: "Default".to_string(),
            kind: None,
        }];
        for kind in [ProfileKind::Round, ProfileKind::Angular] {
            options.extend(self.profiles(kind).iter().map(|p| ProfileOption {
                name: p.name.clone(),
                label: p.name.clone(),
                kind: Some(kind),
            }));
        }
        options
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn library() -> ProfileLibrary {
        serde_json::from_value(json!({
            "round": [{ "name": "RD 2in", "cross_area": 2026.8, "projected_width": 0.0508 }],
            "angular": [{ "name": "L2x2x3/16" }, { "name": "L3x3x1/4" }]
        }))
        .unwrap()
    }

    #[test]
    fn test_find_across_families() {
        let lib = library();
        assert_eq!(lib.find("RD 2in").map(|(k, _)| k), Some(ProfileKind::Round));
        assert_eq!(lib.find("L3x3x1/4").map(|(k, _)| k), Some(ProfileKind::Angular));
        assert!(lib.find("W12x26").is_none());
        assert_eq!(lib.len(), 3);
    }

    #[test]
    fn test_options_start_with_default() {
        let options = library().options();
        assert_eq!(options.len(), 4);
        assert_eq!(options[0].name, "");
        assert_eq!(options[1].kind, Some(ProfileKind::Round));
    }

    #[test]
    fn test_empty_library_degrades_to_default_only() {
        let lib: ProfileLibrary = serde_json::from_value(json!({})).unwrap();
        assert!(lib.is_empty());
        let options = lib.options();
        assert_eq!(options.len(), 1);
        assert_eq!(options[0].label, "Default");
    }

    #[test]
    fn test_kind_inferred_from_prefix() {
        assert_eq!(ProfileKind::infer_from_name("RD 1.5in"), ProfileKind::Round);
        assert_eq!(ProfileKind::infer_from_name("L2x2"), ProfileKind::Angular);
    }
}
