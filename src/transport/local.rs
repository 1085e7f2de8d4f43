//! In-process calculator producing panel geometry for a tapered lattice tower.
//!
//! Each section is one face panel with seven nodes:
//!
//! ```text
//!   c ------- d
//!   |\       /|
//!   | \     / |
//!   e--- g ---f
//!   | /     \ |
//!   |/       \|
//!   a ------- b
//! ```
//!
//! Variable sections taper linearly from the base width to the top width;
//! constant sections keep the top width. Legs run a-e-c and b-f-d,
//! diagonals join g to the four corners and horizontals join g to e and f.

use serde_json::{json, Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use super::CalculatorTransport;
use crate::assignment::AssignmentPayload;
use crate::config::{GroupLayout, LayoutTable};
use crate::error::{ViewerError, ViewerResult};
use crate::geometry::GroupClass;
use crate::input::TowerInput;
use crate::library::{ProfileKind, ProfileLibrary};

/// Used for members left on the default profile
const DEFAULT_CROSS_AREA: f64 = 1222.6; // mm²
const DEFAULT_PROJECTED_WIDTH: f64 = 0.0508; // m

const MEMBERS: [(GroupClass, &str, &str); 10] = [
    (GroupClass::Leg, "a", "e"),
    (GroupClass::Leg, "e", "c"),
    (GroupClass::Leg, "b", "f"),
    (GroupClass::Leg, "f", "d"),
    (GroupClass::Diagonal, "a", "g"),
    (GroupClass::Diagonal, "g", "d"),
    (GroupClass::Diagonal, "g", "b"),
    (GroupClass::Diagonal, "g", "c"),
    (GroupClass::Horizontal, "g", "e"),
    (GroupClass::Horizontal, "g", "f"),
];

type Panel = BTreeMap<&'static str, [f64; 2]>;

pub struct LocalCalculator {
    library: ProfileLibrary,
    layouts: LayoutTable,
    saved: Mutex<HashMap<String, Value>>,
}

impl LocalCalculator {
    pub fn new(library: ProfileLibrary) -> Self {
        Self {
            library,
            layouts: LayoutTable::default(),
            saved: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_layouts(mut self, layouts: LayoutTable) -> Self {
        self.layouts = layouts;
        self
    }

    pub fn library(&self) -> &ProfileLibrary {
        &self.library
    }

    /// Compute the geometry payload and keep it for [`Self::saved_geometry`]
    pub fn calculate(&self, input: &TowerInput, assignments: &AssignmentPayload) -> ViewerResult<Value> {
        check_input(input)?;
        self.check_assignments(assignments)?;

        let layout = self.layouts.for_cross_section(input.cross_section);
        let panels = panel_coordinates(input);

        let coordinates: Vec<Value> = panels
            .iter()
            .map(|(section, panel)| {
                let mut map = Map::new();
                map.insert("section".to_string(), json!(section));
                for (key, point) in panel {
                    map.insert(key.to_string(), json!(point));
                }
                Value::Object(map)
            })
            .collect();

        let elements: Vec<Value> = panels
            .iter()
            .map(|(section, panel)| {
                let row = assignments.get(&section.to_string());
                json!({
                    "section": section,
                    "elements": self.panel_members(panel, layout, row),
                })
            })
            .collect();

        let payload = json!({ "coordinates": coordinates, "elements": elements });
        log::info!(
            "Calculated {} sections for tower '{}'",
            panels.len(),
            input.tower_id
        );

        self.saved
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(input.tower_id.clone(), payload.clone());
        Ok(payload)
    }

    /// Last geometry calculated for a tower
    pub fn saved_geometry(&self, tower_id: &str) -> ViewerResult<Value> {
        self.saved
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(tower_id)
            .cloned()
            .ok_or_else(|| ViewerError::Domain(format!("Tower '{}' not found", tower_id)))
    }

    fn check_assignments(&self, assignments: &AssignmentPayload) -> ViewerResult<()> {
        for (section, row) in assignments {
            for (group, name) in row {
                if !name.is_empty() && !self.library.contains(name) {
                    return Err(ViewerError::Domain(format!(
                        "invalid profile '{}' for section {} group {}",
                        name, section, group
                    )));
                }
            }
        }
        Ok(())
    }

    fn panel_members(
        &self,
        panel: &Panel,
        layout: GroupLayout,
        assigned: Option<&BTreeMap<String, String>>,
    ) -> Vec<Value> {
        let mut ordinals: HashMap<GroupClass, usize> = HashMap::new();
        MEMBERS
            .iter()
            .map(|(class, from, to)| {
                let ordinal = ordinals.entry(*class).or_insert(0);
                let label = layout.slot(*class, *ordinal).label();
                *ordinal += 1;

                let node_i = panel[from];
                let node_j = panel[to];
                let length = round3(((node_j[0] - node_i[0]).powi(2) + (node_j[1] - node_i[1]).powi(2)).sqrt());

                let name = assigned
                    .and_then(|row| row.get(&label))
                    .filter(|name| !name.is_empty());
                let kind = name.map_or(ProfileKind::Round, |n| ProfileKind::infer_from_name(n));
                let profile = name.and_then(|n| self.library.find(n)).map(|(_, p)| p);
                let cross_area = profile.and_then(|p| p.cross_area).unwrap_or(DEFAULT_CROSS_AREA);
                let projected_width = profile
                    .and_then(|p| p.projected_width)
                    .unwrap_or(DEFAULT_PROJECTED_WIDTH);

                json!({
                    "element": label,
                    "node_i": node_i,
                    "node_j": node_j,
                    "length": length,
                    "section_type": kind,
                    "cross_area": cross_area,
                    "projected_width": projected_width,
                    "projected_area": round3(projected_width * length),
                })
            })
            .collect()
    }
}

impl CalculatorTransport for LocalCalculator {
    async fn fetch_profile_library(&self) -> ViewerResult<ProfileLibrary> {
        Ok(self.library.clone())
    }

    async fn recalculate(&self, input: &TowerInput, assignments: &AssignmentPayload) -> ViewerResult<Value> {
        self.calculate(input, assignments)
    }

    async fn fetch_geometry(&self, tower_id: &str) -> ViewerResult<Value> {
        self.saved_geometry(tower_id)
    }
}

fn round3(v: f64) -> f64 {
    (v * 1000.0).round() / 1000.0
}

fn check_input(input: &TowerInput) -> ViewerResult<()> {
    let reject = |msg: &str| Err(ViewerError::Domain(msg.to_string()));
    if input.variable_segments == 0 {
        return reject("Variable Segments must be at least 1");
    }
    if !(input.height > 0.0 && input.base_width > 0.0 && input.top_width > 0.0) {
        return reject("Height, Tower Base Width and Top Width must be positive");
    }
    if input.top_width > input.base_width {
        return reject("Top Width must not exceed Tower Base Width");
    }
    Ok(())
}

/// Panel node positions per section, numbered from 1
fn panel_coordinates(input: &TowerInput) -> Vec<(u32, Panel)> {
    let segment_height = input.segment_height();
    let taper = (input.base_width - input.top_width) / 2.0;
    let alpha = (taper / (input.variable_segments as f64 * segment_height)).atan();
    let delta = alpha.tan() * segment_height;

    let mut panels = Vec::with_capacity(input.section_count() as usize);
    let mut width = input.base_width;
    let (mut x0, mut y0) = (0.0, 0.0);

    for _ in 0..input.variable_segments {
        let phi = (segment_height / (width - delta)).atan();
        let g_height = phi.tan() * (width / 2.0);
        let g_offset = g_height * alpha.tan();

        let panel = Panel::from([
            ("a", [round3(x0), round3(y0)]),
            ("b", [round3(width + x0), round3(y0)]),
            ("c", [round3(delta + x0), round3(segment_height + y0)]),
            ("d", [round3(width - delta + x0), round3(segment_height + y0)]),
            ("e", [round3(g_offset + x0), round3(g_height + y0)]),
            ("f", [round3(width - g_offset + x0), round3(g_height + y0)]),
            ("g", [round3(width / 2.0 + x0), round3(g_height + y0)]),
        ]);
        panels.push((panels.len() as u32 + 1, panel));

        width -= delta * 2.0;
        x0 += round3(delta);
        y0 += round3(segment_height);
    }

    for _ in 0..input.constant_segments {
        let mid = segment_height / 2.0;
        let panel = Panel::from([
            ("a", [round3(x0), round3(y0)]),
            ("b", [round3(width + x0), round3(y0)]),
            ("c", [round3(x0), round3(segment_height + y0)]),
            ("d", [round3(width + x0), round3(segment_height + y0)]),
            ("e", [round3(x0), round3(mid + y0)]),
            ("f", [round3(width + x0), round3(mid + y0)]),
            ("g", [round3(width / 2.0 + x0), round3(mid + y0)]),
        ]);
        panels.push((panels.len() as u32 + 1, panel));
        y0 += round3(segment_height);
    }

    panels
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::GeometryModel;
    use crate::input::CrossSection;
    use crate::library::ProfileDescriptor;
    use approx::assert_relative_eq;

    fn calculator() -> LocalCalculator {
        LocalCalculator::new(ProfileLibrary::new(
            vec![ProfileDescriptor::named("RD 2in")],
            vec![ProfileDescriptor::named("L2x2x3/16")],
        ))
    }

    fn tower() -> TowerInput {
        TowerInput::new("tower_29.3", 3.6, 2.0, 29.3, 8, 2)
    }

    #[test]
    fn test_generated_payload_is_valid_geometry() {
        let payload = calculator().calculate(&tower(), &AssignmentPayload::new()).unwrap();
        let model = GeometryModel::build(&payload).unwrap();
        assert_eq!(model.sections().len(), 10);
        assert_eq!(model.element_count(), 100);
        assert_eq!(model.group_slots().len(), 100);
    }

    #[test]
    fn test_tapers_to_top_width() {
        let panels = panel_coordinates(&tower());
        let (_, base) = &panels[0];
        assert_relative_eq!(base["b"][0] - base["a"][0], 3.6, epsilon = 1e-9);

        let (_, top) = panels.last().unwrap();
        assert_relative_eq!(top["b"][0] - top["a"][0], 2.0, epsilon = 0.01);
        assert_relative_eq!(top["c"][1], 29.3, epsilon = 0.01);
    }

    #[test]
    fn test_by_class_layout_for_triangular() {
        let input = tower().with_cross_section(CrossSection::Triangular);
        let payload = calculator().calculate(&input, &AssignmentPayload::new()).unwrap();
        let model = GeometryModel::build(&payload).unwrap();
        let labels: Vec<String> = model.section(1).unwrap().groups().iter().map(|g| g.label()).collect();
        assert_eq!(labels, vec!["M", "D", "C"]);
    }

    #[test]
    fn test_unknown_profile_is_domain_error() {
        let mut assignments = AssignmentPayload::new();
        assignments.insert("1".into(), [("M1".to_string(), "W12x26".to_string())].into());
        match calculator().calculate(&tower(), &assignments) {
            Err(ViewerError::Domain(msg)) => assert!(msg.contains("invalid profile")),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_assigned_profile_reported_on_element() {
        let mut assignments = AssignmentPayload::new();
        assignments.insert("2".into(), [("D1".to_string(), "L2x2x3/16".to_string())].into());
        let payload = calculator().calculate(&tower(), &assignments).unwrap();
        let d1 = &payload["elements"][1]["elements"][4];
        assert_eq!(d1["element"], "D1");
        assert_eq!(d1["section_type"], "angular");
    }

    #[test]
    fn test_rejects_degenerate_input() {
        let input = TowerInput::new("t", 3.6, 2.0, 29.3, 0, 2);
        assert!(matches!(
            calculator().calculate(&input, &AssignmentPayload::new()),
            Err(ViewerError::Domain(_))
        ));
    }

    #[test]
    fn test_saved_geometry_by_tower_id() {
        let calc = calculator();
        assert!(calc.saved_geometry("tower_29.3").is_err());
        let payload = calc.calculate(&tower(), &AssignmentPayload::new()).unwrap();
        assert_eq!(calc.saved_geometry("tower_29.3").unwrap(), payload);
    }
}
