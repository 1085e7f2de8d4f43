//! Tower Viewer - geometry, selection and section assignment for lattice towers
//!
//! This library holds the state behind an interactive tower viewer:
//! - Validated geometry built from a calculator's JSON payload
//! - Node and element selection with hover highlighting
//! - Profile assignment per section and element group
//! - Scene descriptions ready for a 3D renderer
//! - Single-flight recalculation against a remote or in-process calculator
//!
//! ## Example
//! ```rust
//! use tower_viewer::prelude::*;
//! use serde_json::json;
//!
//! let geometry = GeometryModel::build(&json!({
//!     "coordinates": [{ "section": 1, "a": [0.0, 0.0], "b": [1.0, 0.0] }],
//!     "elements": [{ "section": 1, "elements": [
//!         { "element": "C1", "node_i": [0.0, 0.0], "node_j": [1.0, 0.0] }
//!     ]}]
//! }))
//! .unwrap();
//!
//! let selection = SelectionState::new().toggle_element(1, 0);
//! let scene = SceneComposer::default().compose(&geometry, &selection);
//! assert_eq!(scene.description().unwrap().labels.len(), 1);
//!
//! let assignments = AssignmentStore::new().reconcile(&geometry);
//! assert_eq!(assignments.slots().count(), 1);
//! ```

pub mod assignment;
pub mod config;
pub mod error;
pub mod geometry;
pub mod input;
pub mod library;
pub mod recalc;
pub mod scene;
pub mod selection;
#[cfg(feature = "server")]
pub mod server;
pub mod session;
pub mod snapshot;
pub mod transport;

// Re-export common types
pub mod prelude {
    pub use crate::assignment::{AssignmentPayload, AssignmentStore};
    pub use crate::config::{GroupLayout, LayoutTable, MemberShape, SceneStyle, ViewerConfig};
    pub use crate::error::{ValidationError, ViewerError, ViewerResult};
    pub use crate::geometry::{
        Bounds, Element, ElementGroup, ElementKey, GeometryModel, GroupClass, Node, Position, Section,
    };
    pub use crate::input::{CrossSection, ExposureCategory, TowerInput};
    pub use crate::library::{ProfileDescriptor, ProfileKind, ProfileLibrary, ProfileOption};
    pub use crate::recalc::{RecalcState, RecalculationController};
    pub use crate::scene::{Label, LabelTarget, MemberPrimitive, NodeMarker, Scene, SceneComposer, SceneDescription};
    pub use crate::selection::{Selection, SelectionState};
    pub use crate::session::{Session, ViewerEvent};
    pub use crate::snapshot::Snapshot;
    #[cfg(feature = "http")]
    pub use crate::transport::HttpCalculator;
    pub use crate::transport::{CalculatorTransport, LocalCalculator};
}
