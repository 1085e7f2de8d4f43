//! Assignment store - which structural profile each element group uses

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::geometry::{ElementGroup, GeometryModel};

/// Wire form sent with a recalculation:
/// `{ "<section>": { "<group label>": "<profile name or empty>" } }`
pub type AssignmentPayload = BTreeMap<String, BTreeMap<String, String>>;

/// Profile name per `(section, group)`. An empty name means "use the
/// calculator's default profile".
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AssignmentStore {
    slots: BTreeMap<u32, BTreeMap<ElementGroup, String>>,
}

impl AssignmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Align the store with the sections and groups of `geometry`.
    ///
    /// Surviving slots keep their value, new slots start empty, vanished
    /// slots are dropped. Reconciling twice against the same geometry is a
    /// no-op the second time.
    pub fn reconcile(&self, geometry: &GeometryModel) -> AssignmentStore {
        let mut dropped = 0usize;
        let slots: BTreeMap<u32, BTreeMap<ElementGroup, String>> = geometry
            .section_groups()
            .into_iter()
            .map(|(section, groups)| {
                let prior = self.slots.get(&section);
                let row = groups
                    .into_iter()
                    .map(|group| {
                        let name = prior
                            .and_then(|row| row.get(&group))
                            .cloned()
                            .unwrap_or_default();
                        (group, name)
                    })
                    .collect();
                (section, row)
            })
            .collect();

        for (section, row) in &self.slots {
            for group in row.keys() {
                if !slots.get(section).is_some_and(|r| r.contains_key(group)) {
                    dropped += 1;
                }
            }
        }
        if dropped > 0 {
            log::debug!("Reconcile dropped {} assignment slot(s) no longer in the geometry", dropped);
        }

        AssignmentStore { slots }
    }

    /// Set one slot. The name is not checked against the profile library;
    /// the calculator decides whether it is valid.
    pub fn set_profile(&self, section: u32, group: ElementGroup, name: impl Into<String>) -> AssignmentStore {
        let mut next = self.clone();
        next.slots
            .entry(section)
            .or_default()
            .insert(group, name.into());
        next
    }

    pub fn profile(&self, section: u32, group: ElementGroup) -> Option<&str> {
        self.slots.get(&section)?.get(&group).map(String::as_str)
    }

    /// Every slot, including unassigned ones (as empty strings)
    pub fn to_recalculation_payload(&self) -> AssignmentPayload {
        self.slots
            .iter()
            .map(|(section, row)| {
                let row = row
                    .iter()
                    .map(|(group, name)| (group.label(), name.clone()))
                    .collect();
                (section.to_string(), row)
            })
            .collect()
    }

    /// Restore from the wire form. Keys that do not parse are skipped.
    pub fn from_payload(payload: &AssignmentPayload) -> AssignmentStore {
        let mut slots: BTreeMap<u32, BTreeMap<ElementGroup, String>> = BTreeMap::new();
        for (section, row) in payload {
            let Ok(section_index) = section.parse::<u32>() else {
                log::warn!("Skipping assignments for unparseable section '{}'", section);
                continue;
            };
            let entry = slots.entry(section_index).or_default();
            for (label, name) in row {
                match label.parse::<ElementGroup>() {
                    Ok(group) => {
                        entry.insert(group, name.clone());
                    }
                    Err(err) => log::warn!("Skipping assignment in section {}: {}", section_index, err),
                }
            }
        }
        AssignmentStore { slots }
    }

    pub fn sections(&self) -> impl Iterator<Item = u32> + '_ {
        self.slots.keys().copied()
    }

    pub fn slots(&self) -> impl Iterator<Item = (u32, ElementGroup, &str)> + '_ {
        self.slots.iter().flat_map(|(section, row)| {
            row.iter()
                .map(move |(group, name)| (*section, *group, name.as_str()))
        })
    }

    /// Number of slots with a non-default profile
    pub fn assigned_count(&self) -> usize {
        self.slots().filter(|(_, _, name)| !name.is_empty()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
