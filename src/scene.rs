//! Scene composition - turns geometry and selection into drawable primitives
//!
//! The composer owns no renderer state. Every call builds a complete scene
//! description from its inputs; nothing about previous selections is kept.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::config::{MemberShape, SceneStyle};
use crate::geometry::{Bounds, Element, ElementGroup, ElementKey, GeometryModel, Position};
use crate::selection::{Selection, SelectionState};

/// One drawn member
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberPrimitive {
    pub key: ElementKey,
    pub group: Option<ElementGroup>,
    pub start: Position,
    pub end: Position,
    pub shape: MemberShape,
    pub color: String,
    pub highlighted: bool,
}

/// One drawn node, shared by every section that has a node at this position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeMarker {
    /// Key of the first node found at this position
    pub key: String,
    pub section: u32,
    pub position: Position,
    pub radius: f64,
    pub color: String,
    pub highlighted: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum LabelTarget {
    Node,
    Element(ElementKey),
}

/// Floating text attached to the current selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Label {
    pub target: LabelTarget,
    pub anchor: Position,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneDescription {
    pub members: Vec<MemberPrimitive>,
    pub nodes: Vec<NodeMarker>,
    pub labels: Vec<Label>,
    pub bounds: Option<Bounds>,
}

impl SceneDescription {
    pub fn member(&self, key: ElementKey) -> Option<&MemberPrimitive> {
        self.members.iter().find(|m| m.key == key)
    }

    pub fn highlighted_count(&self) -> usize {
        self.members.iter().filter(|m| m.highlighted).count()
            + self.nodes.iter().filter(|n| n.highlighted).count()
    }
}

/// Result of composing: either something to draw or an explicit "no data"
/// so the caller can show a warning instead of an empty canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Scene {
    NoData,
    Ready(SceneDescription),
}

impl Scene {
    pub fn is_no_data(&self) -> bool {
        matches!(self, Scene::NoData)
    }

    pub fn description(&self) -> Option<&SceneDescription> {
        match self {
            Scene::Ready(desc) => Some(desc),
            Scene::NoData => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SceneComposer {
    style: SceneStyle,
}

impl SceneComposer {
    pub fn new(style: SceneStyle) -> Self {
        Self { style }
    }

    pub fn style(&self) -> &SceneStyle {
        &self.style
    }

    pub fn compose(&self, geometry: &GeometryModel, selection: &SelectionState) -> Scene {
        if geometry.is_empty() {
            return Scene::NoData;
        }

        let mut members = Vec::with_capacity(geometry.element_count());
        for (position, section) in geometry.sections().iter().enumerate() {
            let base = &self.style.section_colors[position % 2];
            for element in &section.elements {
                let highlighted = selection.is_element_highlighted(element.key());
                members.push(MemberPrimitive {
                    key: element.key(),
                    group: element.group,
                    start: element.node_i,
                    end: element.node_j,
                    shape: self.style.member_shape,
                    color: self.pick_color(base, highlighted),
                    highlighted,
                });
            }
        }

        let mut seen = HashSet::new();
        let nodes: Vec<NodeMarker> = geometry
            .nodes()
            .filter(|n| seen.insert(n.position.key()))
            .map(|n| {
                let highlighted = selection.is_node_selected(&n.position);
                NodeMarker {
                    key: n.key.clone(),
                    section: n.section,
                    position: n.position,
                    radius: self.style.node_radius,
                    color: self.pick_color(&self.style.node_color, highlighted),
                    highlighted,
                }
            })
            .collect();

        let labels = selection_label(geometry, selection).into_iter().collect();

        Scene::Ready(SceneDescription {
            members,
            nodes,
            labels,
            bounds: geometry.bounds(),
        })
    }

    fn pick_color(&self, base: &str, highlighted: bool) -> String {
        if highlighted {
            self.style.highlight_color.clone()
        } else {
            base.to_string()
        }
    }
}

/// Compose with the default style
pub fn compose(geometry: &GeometryModel, selection: &SelectionState) -> Scene {
    SceneComposer::default().compose(geometry, selection)
}

fn selection_label(geometry: &GeometryModel, selection: &SelectionState) -> Option<Label> {
    match selection.selection() {
        Selection::None => None,
        Selection::Node { key, position } => {
            geometry.node_at(position)?;
            Some(Label {
                target: LabelTarget::Node,
                anchor: *position,
                text: format!("{} ({:.3}, {:.3}, {:.3})", key, position.x, position.y, position.z),
            })
        }
        Selection::Element(key) => {
            let element = geometry.element(*key)?;
            Some(Label {
                target: LabelTarget::Element(*key),
                anchor: element.midpoint(),
                text: element_text(element),
            })
        }
    }
}

fn element_text(element: &Element) -> String {
    format!(
        "Section {} {}: L = {:.3} m",
        element.section,
        element.display_name(),
        element.length()
    )
}
