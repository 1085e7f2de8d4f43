//! Selection state - which single node or element is being inspected

use serde::{Deserialize, Serialize};

use crate::geometry::{ElementKey, Position};

/// The current pick. A node and an element are never selected together.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum Selection {
    #[default]
    None,
    Node { key: String, position: Position },
    Element(ElementKey),
}

/// Selection plus the transient hover highlight.
///
/// Hover only affects colouring; it never counts as a selection.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SelectionState {
    selection: Selection,
    hovered: Option<ElementKey>,
}

impl SelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Select a node, or clear the selection if this position is already selected.
    ///
    /// Nodes are compared by position: boundary nodes shared by adjacent
    /// sections may carry the same key string.
    pub fn toggle_node(&self, key: impl Into<String>, position: Position) -> SelectionState {
        let selection = match &self.selection {
            Selection::Node { position: current, .. } if current.key() == position.key() => Selection::None,
            _ => Selection::Node {
                key: key.into(),
                position,
            },
        };
        SelectionState {
            selection,
            hovered: self.hovered,
        }
    }

    /// Select an element, or clear the selection if it is already selected
    pub fn toggle_element(&self, section: u32, index: usize) -> SelectionState {
        let key = ElementKey::new(section, index);
        let selection = match self.selection {
            Selection::Element(current) if current == key => Selection::None,
            _ => Selection::Element(key),
        };
        SelectionState {
            selection,
            hovered: self.hovered,
        }
    }

    pub fn with_hover(&self, hovered: Option<ElementKey>) -> SelectionState {
        SelectionState {
            selection: self.selection.clone(),
            hovered,
        }
    }

    pub fn clear(&self) -> SelectionState {
        SelectionState::default()
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn hovered(&self) -> Option<ElementKey> {
        self.hovered
    }

    pub fn is_empty(&self) -> bool {
        self.selection == Selection::None
    }

    pub fn selected_element(&self) -> Option<ElementKey> {
        match self.selection {
            Selection::Element(key) => Some(key),
            _ => None,
        }
    }

    pub fn selected_node(&self) -> Option<(&str, Position)> {
        match &self.selection {
            Selection::Node { key, position } => Some((key.as_str(), *position)),
            _ => None,
        }
    }

    pub fn is_node_selected(&self, position: &Position) -> bool {
        self.selected_node()
            .is_some_and(|(_, p)| p.key() == position.key())
    }

    /// Selected or hovered
    pub fn is_element_highlighted(&self, key: ElementKey) -> bool {
        self.selected_element() == Some(key) || self.hovered == Some(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin() -> Position {
        Position::new(0.0, 0.0, 0.0)
    }

    #[test]
    fn test_toggle_node_twice_is_empty() {
        let state = SelectionState::new().toggle_node("a", origin());
        assert!(state.is_node_selected(&origin()));
        let state = state.toggle_node("a", origin());
        assert!(state.is_empty());
    }

    #[test]
    fn test_node_identity_is_positional() {
        // Same key in another section at another position is a different node
        let state = SelectionState::new()
            .toggle_node("c", origin())
            .toggle_node("c", Position::new(0.0, 3.0, 0.0));
        assert_eq!(state.selected_node().map(|(_, p)| p), Some(Position::new(0.0, 3.0, 0.0)));

        // Different key, same position: toggles off
        let state = state.toggle_node("a", Position::new(0.0, 3.0, 0.0));
        assert!(state.is_empty());
    }

    #[test]
    fn test_selecting_element_clears_node() {
        let state = SelectionState::new()
            .toggle_node("a", origin())
            .toggle_element(1, 2);
        assert_eq!(state.selected_element(), Some(ElementKey::new(1, 2)));
        assert!(state.selected_node().is_none());

        let state = state.toggle_node("a", origin());
        assert!(state.selected_element().is_none());
        assert!(state.selected_node().is_some());
    }

    #[test]
    fn test_never_both_for_any_sequence() {
        let mut state = SelectionState::new();
        let ops: [(bool, u32); 8] = [
            (true, 0), (false, 1), (false, 1), (true, 1),
            (true, 1), (false, 2), (true, 0), (false, 2),
        ];
        for (is_node, n) in ops {
            state = if is_node {
                state.toggle_node(format!("n{n}"), Position::new(n as f64, 0.0, 0.0))
            } else {
                state.toggle_element(n, 0)
            };
            assert!(!(state.selected_node().is_some() && state.selected_element().is_some()));
        }
    }

    #[test]
    fn test_hover_is_not_selection() {
        let state = SelectionState::new().with_hover(Some(ElementKey::new(1, 0)));
        assert!(state.is_empty());
        assert!(state.is_element_highlighted(ElementKey::new(1, 0)));
        assert!(!state.is_element_highlighted(ElementKey::new(1, 1)));
    }
}
