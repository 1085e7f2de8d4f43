//! Geometry model - the validated lattice built from a calculator payload

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::{BTreeMap, BTreeSet, HashSet};

use super::group::ElementGroup;
use super::position::{Bounds, Position, PositionKey};
use crate::error::ValidationError;

/// Reserved key carrying the section number inside a payload section object
const SECTION_KEY: &str = "section";

/// A named point of one section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub key: String,
    pub position: Position,
    pub section: u32,
}

/// Identifies an element by its section and its place in that section's list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ElementKey {
    pub section: u32,
    pub index: usize,
}

impl ElementKey {
    pub fn new(section: u32, index: usize) -> Self {
        Self { section, index }
    }
}

/// A structural member between two positions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub section: u32,
    pub index: usize,
    /// Name as sent by the calculator, e.g. "M1"
    pub name: Option<String>,
    pub group: Option<ElementGroup>,
    pub node_i: Position,
    pub node_j: Position,
}

impl Element {
    pub fn key(&self) -> ElementKey {
        ElementKey::new(self.section, self.index)
    }

    pub fn length(&self) -> f64 {
        self.node_i.distance_to(&self.node_j)
    }

    pub fn midpoint(&self) -> Position {
        self.node_i.midpoint(&self.node_j)
    }

    pub fn display_name(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("#{}", self.index + 1))
    }
}

/// One band of the tower
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub index: u32,
    pub nodes: Vec<Node>,
    pub elements: Vec<Element>,
}

impl Section {
    /// Position of a node of this section by key
    pub fn position(&self, key: &str) -> Option<Position> {
        self.nodes.iter().find(|n| n.key == key).map(|n| n.position)
    }

    /// Distinct element groups present in this section
    pub fn groups(&self) -> BTreeSet<ElementGroup> {
        self.elements.iter().filter_map(|e| e.group).collect()
    }
}

/// The validated tower geometry.
///
/// Built wholesale from a payload and never mutated afterwards; a
/// recalculation produces a new model that replaces the old one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeometryModel {
    sections: Vec<Section>,
}

impl GeometryModel {
    /// Validate a loosely-typed calculator payload.
    ///
    /// Expected shape: `{ "coordinates": [{ "section"?: n, key: [x, y(, z)] }, ..],
    /// "elements": [{ "section"?: n, "elements": [{ "element"?: name,
    /// "node_i": [..], "node_j": [..] }] }, ..] }` with index-aligned arrays.
    ///
    /// `"section"` is reserved in both mappings and always read as the
    /// section number, so no node can be keyed `"section"`. Nodes keep the
    /// order of their keys in the payload.
    pub fn build(payload: &Value) -> Result<Self, ValidationError> {
        let obj = payload.as_object().ok_or(ValidationError::NotAnObject)?;
        let coordinates = non_empty_array(obj.get("coordinates")).ok_or(ValidationError::MissingCoordinates)?;
        let elements = non_empty_array(obj.get("elements")).ok_or(ValidationError::MissingElements)?;

        if coordinates.len() != elements.len() {
            return Err(ValidationError::SectionCountMismatch {
                coordinates: coordinates.len(),
                elements: elements.len(),
            });
        }

        let mut sections = Vec::with_capacity(coordinates.len());
        let mut seen = HashSet::new();

        for (position, (coords, elems)) in coordinates.iter().zip(elements).enumerate() {
            let coords = coords.as_object().ok_or(ValidationError::MalformedSection(position))?;
            let elems = elems.as_object().ok_or(ValidationError::MalformedSection(position))?;

            let index = match (section_index(coords, position)?, section_index(elems, position)?) {
                (Some(c), Some(e)) if c != e => {
                    return Err(ValidationError::SectionIndexMismatch {
                        position,
                        coordinates: c,
                        elements: e,
                    })
                }
                (Some(c), _) | (None, Some(c)) => c,
                // Sections are numbered from 1 when the payload omits the number
                (None, None) => position as u32 + 1,
            };
            if !seen.insert(index) {
                return Err(ValidationError::DuplicateSection(index));
            }

            sections.push(Section {
                index,
                nodes: parse_nodes(coords, index)?,
                elements: parse_elements(elems, index, position)?,
            });
        }

        let known: HashSet<PositionKey> = sections
            .iter()
            .flat_map(|s| s.nodes.iter())
            .map(|n| n.position.key())
            .collect();

        for element in sections.iter().flat_map(|s| s.elements.iter()) {
            if !known.contains(&element.node_i.key()) || !known.contains(&element.node_j.key()) {
                return Err(ValidationError::UnresolvedEndpoint {
                    section: element.section,
                    index: element.index,
                });
            }
        }

        let model = Self { sections };
        log::debug!(
            "Built geometry: {} sections, {} nodes, {} elements",
            model.sections.len(),
            model.node_count(),
            model.element_count()
        );
        Ok(model)
    }

    /// Serialize back into the calculator payload shape.
    ///
    /// `GeometryModel::build(&model.to_payload())` yields an equal model.
    pub fn to_payload(&self) -> Value {
        let coordinates: Vec<Value> = self
            .sections
            .iter()
            .map(|s| {
                let mut map = Map::new();
                map.insert(SECTION_KEY.to_string(), json!(s.index));
                for node in &s.nodes {
                    map.insert(node.key.clone(), json!(node.position.coords()));
                }
                Value::Object(map)
            })
            .collect();

        let elements: Vec<Value> = self
            .sections
            .iter()
            .map(|s| {
                let list: Vec<Value> = s
                    .elements
                    .iter()
                    .map(|e| {
                        let mut map = Map::new();
                        if let Some(name) = &e.name {
                            map.insert("element".to_string(), json!(name));
                        }
                        map.insert("node_i".to_string(), json!(e.node_i.coords()));
                        map.insert("node_j".to_string(), json!(e.node_j.coords()));
                        Value::Object(map)
                    })
                    .collect();
                json!({ "section": s.index, "elements": list })
            })
            .collect();

        json!({ "coordinates": coordinates, "elements": elements })
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn section(&self, index: u32) -> Option<&Section> {
        self.sections.iter().find(|s| s.index == index)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.sections.iter().flat_map(|s| s.nodes.iter())
    }

    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.sections.iter().flat_map(|s| s.elements.iter())
    }

    pub fn element(&self, key: ElementKey) -> Option<&Element> {
        self.section(key.section)?.elements.get(key.index)
    }

    /// First node found at exactly this position
    pub fn node_at(&self, position: &Position) -> Option<&Node> {
        let key = position.key();
        self.nodes().find(|n| n.position.key() == key)
    }

    /// Distinct positions across all sections, in first-seen order
    pub fn unique_positions(&self) -> Vec<Position> {
        let mut seen = HashSet::new();
        self.nodes()
            .map(|n| n.position)
            .filter(|p| seen.insert(p.key()))
            .collect()
    }

    /// Groups per section. Every section is present, including those
    /// without any grouped elements.
    pub fn section_groups(&self) -> BTreeMap<u32, BTreeSet<ElementGroup>> {
        self.sections.iter().map(|s| (s.index, s.groups())).collect()
    }

    /// All assignable `(section, group)` slots
    pub fn group_slots(&self) -> BTreeSet<(u32, ElementGroup)> {
        self.elements()
            .filter_map(|e| e.group.map(|g| (e.section, g)))
            .collect()
    }

    pub fn node_count(&self) -> usize {
        self.sections.iter().map(|s| s.nodes.len()).sum()
    }

    pub fn element_count(&self) -> usize {
        self.sections.iter().map(|s| s.elements.len()).sum()
    }

    /// True when there is nothing to draw
    pub fn is_empty(&self) -> bool {
        self.node_count() == 0 && self.element_count() == 0
    }

    pub fn bounds(&self) -> Option<Bounds> {
        let positions: Vec<Position> = self.nodes().map(|n| n.position).collect();
        Bounds::from_positions(&positions)
    }
}

fn non_empty_array(value: Option<&Value>) -> Option<&Vec<Value>> {
    value.and_then(Value::as_array).filter(|a| !a.is_empty())
}

fn section_index(obj: &Map<String, Value>, position: usize) -> Result<Option<u32>, ValidationError> {
    match obj.get(SECTION_KEY) {
        None => Ok(None),
        Some(v) => v
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .map(Some)
            .ok_or(ValidationError::InvalidSectionIndex { position }),
    }
}

fn parse_nodes(coords: &Map<String, Value>, section: u32) -> Result<Vec<Node>, ValidationError> {
    coords
        .iter()
        .filter(|(key, _)| key.as_str() != SECTION_KEY)
        .map(|(key, value)| {
            let position = Position::from_json(value).ok_or_else(|| ValidationError::InvalidPosition {
                section,
                key: key.clone(),
            })?;
            Ok(Node {
                key: key.clone(),
                position,
                section,
            })
        })
        .collect()
}

fn parse_elements(
    elems: &Map<String, Value>,
    section: u32,
    position: usize,
) -> Result<Vec<Element>, ValidationError> {
    let list = elems
        .get("elements")
        .and_then(Value::as_array)
        .ok_or(ValidationError::MalformedSection(position))?;

    list.iter()
        .enumerate()
        .map(|(index, raw)| {
            let malformed = |reason: &str| ValidationError::MalformedElement {
                section,
                index,
                reason: reason.to_string(),
            };
            let obj = raw.as_object().ok_or_else(|| malformed("not an object"))?;
            let node_i = obj
                .get("node_i")
                .and_then(Position::from_json)
                .ok_or_else(|| malformed("node_i is not a numeric 2- or 3-tuple"))?;
            let node_j = obj
                .get("node_j")
                .and_then(Position::from_json)
                .ok_or_else(|| malformed("node_j is not a numeric 2- or 3-tuple"))?;
            let name = obj.get("element").and_then(Value::as_str).map(str::to_string);
            let group = name.as_deref().and_then(|n| n.parse().ok());

            Ok(Element {
                section,
                index,
                name,
                group,
                node_i,
                node_j,
            })
        })
        .collect()
}
