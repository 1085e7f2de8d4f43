//! Viewer session - page-level state for one tower
//!
//! The session owns the geometry, assignments, selection and profile
//! library. Geometry only changes through [`Session::load_geometry`] or a
//! completed recalculation, and a failed step never leaves anything half
//! applied.

use serde_json::Value;

use crate::assignment::{AssignmentPayload, AssignmentStore};
use crate::config::SceneStyle;
use crate::error::{ViewerError, ViewerResult};
use crate::geometry::{ElementGroup, ElementKey, GeometryModel, Position};
use crate::input::TowerInput;
use crate::library::{ProfileLibrary, ProfileOption};
use crate::recalc::{RecalculationController, Ticket};
use crate::scene::{Scene, SceneComposer};
use crate::selection::SelectionState;
use crate::snapshot::Snapshot;
use crate::transport::CalculatorTransport;

/// Things the user can do to the viewer
#[derive(Debug, Clone, PartialEq)]
pub enum ViewerEvent {
    NodeClicked { key: String, position: Position },
    ElementClicked(ElementKey),
    ElementHovered(Option<ElementKey>),
    ClearSelection,
    ProfileChosen {
        section: u32,
        group: ElementGroup,
        name: String,
    },
    InputChanged(TowerInput),
    NavigatedAway,
}

/// A recalculation that has been started but not completed.
///
/// Carries the input and assignments as they were when it began.
#[derive(Debug)]
pub struct PendingRecalculation {
    ticket: Ticket,
    input: TowerInput,
    payload: AssignmentPayload,
}

impl PendingRecalculation {
    pub fn input(&self) -> &TowerInput {
        &self.input
    }

    pub fn payload(&self) -> &AssignmentPayload {
        &self.payload
    }
}

/// Marker for an in-flight library refresh
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LibraryRequest {
    generation: u64,
}

#[derive(Debug, Clone)]
pub struct Session {
    input: TowerInput,
    geometry: Option<GeometryModel>,
    assignments: AssignmentStore,
    selection: SelectionState,
    library: ProfileLibrary,
    controller: RecalculationController,
    composer: SceneComposer,
}

impl Session {
    pub fn new(input: TowerInput) -> Self {
        Self {
            input,
            geometry: None,
            assignments: AssignmentStore::new(),
            selection: SelectionState::new(),
            library: ProfileLibrary::empty(),
            controller: RecalculationController::new(),
            composer: SceneComposer::default(),
        }
    }

    pub fn with_style(mut self, style: SceneStyle) -> Self {
        self.composer = SceneComposer::new(style);
        self
    }

    pub fn input(&self) -> &TowerInput {
        &self.input
    }

    pub fn geometry(&self) -> Option<&GeometryModel> {
        self.geometry.as_ref()
    }

    pub fn assignments(&self) -> &AssignmentStore {
        &self.assignments
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn library(&self) -> &ProfileLibrary {
        &self.library
    }

    pub fn controller(&self) -> &RecalculationController {
        &self.controller
    }

    pub fn profile_options(&self) -> Vec<ProfileOption> {
        self.library.options()
    }

    /// Replace the geometry with a validated payload.
    ///
    /// Assignments are reconciled against the new geometry and the
    /// selection is cleared. On a validation error nothing changes.
    pub fn load_geometry(&mut self, payload: &Value) -> ViewerResult<()> {
        let geometry = GeometryModel::build(payload)?;
        self.assignments = self.assignments.reconcile(&geometry);
        self.selection = self.selection.clear();
        log::info!(
            "Loaded geometry: {} sections, {} elements",
            geometry.sections().len(),
            geometry.element_count()
        );
        self.geometry = Some(geometry);
        Ok(())
    }

    pub fn begin_recalculation(&mut self) -> ViewerResult<PendingRecalculation> {
        let ticket = self.controller.begin()?;
        Ok(PendingRecalculation {
            ticket,
            input: self.input.clone(),
            payload: self.assignments.to_recalculation_payload(),
        })
    }

    /// Apply the calculator's answer to a pending recalculation.
    ///
    /// A stale response is dropped with [`ViewerError::Stale`]. A failed
    /// response is returned unchanged and leaves the session as it was.
    pub fn complete_recalculation(
        &mut self,
        pending: PendingRecalculation,
        response: ViewerResult<Value>,
    ) -> ViewerResult<()> {
        self.controller.finish(pending.ticket)?;
        let payload = response.inspect_err(|e| log::warn!("Recalculation failed: {}", e))?;
        self.load_geometry(&payload)
    }

    /// Send the current input and assignments to the calculator and load the result
    ///
    /// Dropping the returned future while it waits on the transport abandons
    /// the request; the next submit is not blocked by it.
    pub async fn submit<T: CalculatorTransport>(&mut self, transport: &T) -> ViewerResult<()> {
        let pending = self.begin_recalculation()?;
        let in_flight = self.controller.guard(&pending.ticket);
        let response = transport.recalculate(&pending.input, &pending.payload).await;
        in_flight.settle();
        self.complete_recalculation(pending, response)
    }

    /// Give up on a pending recalculation without applying anything
    pub fn cancel_recalculation(&mut self, pending: PendingRecalculation) {
        self.controller.abandon(pending.ticket);
    }

    pub fn begin_library_refresh(&self) -> LibraryRequest {
        LibraryRequest {
            generation: self.controller.generation(),
        }
    }

    /// Replace the library wholesale. Failures degrade to an empty library.
    ///
    /// Returns false if the view was invalidated since the request began.
    pub fn apply_library(&mut self, request: LibraryRequest, response: ViewerResult<ProfileLibrary>) -> bool {
        if request.generation != self.controller.generation() {
            log::info!("Discarding profile library from generation {}", request.generation);
            return false;
        }
        self.library = match response {
            Ok(library) => library,
            Err(e) => {
                log::warn!("Profile library unavailable, using defaults only: {}", e);
                ProfileLibrary::empty()
            }
        };
        true
    }

    pub async fn refresh_library<T: CalculatorTransport>(&mut self, transport: &T) {
        let request = self.begin_library_refresh();
        let response = transport.fetch_profile_library().await;
        self.apply_library(request, response);
    }

    /// Load a previously calculated tower by id
    pub async fn fetch_geometry<T: CalculatorTransport>(&mut self, transport: &T, tower_id: &str) -> ViewerResult<()> {
        let payload = transport.fetch_geometry(tower_id).await?;
        self.load_geometry(&payload)
    }

    /// Drop any in-flight work; late responses will be discarded
    pub fn invalidate(&mut self) {
        self.controller.invalidate();
    }

    pub fn dispatch(&mut self, event: ViewerEvent) {
        log::debug!("Dispatching {:?}", event);
        match event {
            ViewerEvent::NodeClicked { key, position } => {
                self.selection = self.selection.toggle_node(key, position);
            }
            ViewerEvent::ElementClicked(key) => {
                self.selection = self.selection.toggle_element(key.section, key.index);
            }
            ViewerEvent::ElementHovered(hovered) => {
                self.selection = self.selection.with_hover(hovered);
            }
            ViewerEvent::ClearSelection => {
                self.selection = self.selection.clear();
            }
            ViewerEvent::ProfileChosen { section, group, name } => {
                self.assignments = self.assignments.set_profile(section, group, name);
            }
            ViewerEvent::InputChanged(input) => {
                self.input = input;
            }
            ViewerEvent::NavigatedAway => {
                self.invalidate();
                self.selection = self.selection.clear();
            }
        }
    }

    pub fn scene(&self) -> Scene {
        match &self.geometry {
            Some(geometry) => self.composer.compose(geometry, &self.selection),
            None => Scene::NoData,
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            tower: self.input.clone(),
            geometry: self
                .geometry
                .as_ref()
                .map(GeometryModel::to_payload)
                .unwrap_or(Value::Null),
            element_sections: self.assignments.to_recalculation_payload(),
        }
    }

    /// Restore input, geometry and assignments from a snapshot
    pub fn restore(&mut self, snapshot: &Snapshot) -> ViewerResult<()> {
        let geometry = match &snapshot.geometry {
            Value::Null => None,
            payload => Some(GeometryModel::build(payload)?),
        };
        let stored = AssignmentStore::from_payload(&snapshot.element_sections);
        self.assignments = match &geometry {
            Some(g) => stored.reconcile(g),
            None => stored,
        };
        self.input = snapshot.tower.clone();
        self.geometry = geometry;
        self.selection = self.selection.clear();
        Ok(())
    }

    /// Geometry or [`ViewerError::NoGeometry`]
    pub fn require_geometry(&self) -> ViewerResult<&GeometryModel> {
        self.geometry.as_ref().ok_or(ViewerError::NoGeometry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::GroupClass;
    use crate::library::ProfileDescriptor;
    use crate::selection::Selection;
    use crate::transport::LocalCalculator;

    struct Rejecting;

    impl CalculatorTransport for Rejecting {
        async fn fetch_profile_library(&self) -> ViewerResult<ProfileLibrary> {
            Err(ViewerError::Transport("connection refused".into()))
        }

        async fn recalculate(&self, _: &TowerInput, _: &AssignmentPayload) -> ViewerResult<Value> {
            Err(ViewerError::Domain("invalid profile".into()))
        }

        async fn fetch_geometry(&self, _: &str) -> ViewerResult<Value> {
            Err(ViewerError::Domain("Tower not found".into()))
        }
    }

    /// Never answers
    struct Hanging;

    impl CalculatorTransport for Hanging {
        async fn fetch_profile_library(&self) -> ViewerResult<ProfileLibrary> {
            std::future::pending().await
        }

        async fn recalculate(&self, _: &TowerInput, _: &AssignmentPayload) -> ViewerResult<Value> {
            std::future::pending().await
        }

        async fn fetch_geometry(&self, _: &str) -> ViewerResult<Value> {
            std::future::pending().await
        }
    }

    fn calculator() -> LocalCalculator {
        LocalCalculator::new(ProfileLibrary::new(
            vec![ProfileDescriptor::named("RD 2in")],
            vec![ProfileDescriptor::named("L2x2x3/16")],
        ))
    }

    fn tower() -> TowerInput {
        TowerInput::new("tower_12", 2.4, 1.2, 12.0, 3, 1)
    }

    async fn loaded() -> Session {
        let mut session = Session::new(tower());
        session.submit(&calculator()).await.unwrap();
        session
    }

    #[tokio::test]
    async fn test_submit_loads_geometry_and_reconciles() {
        let session = loaded().await;
        let geometry = session.require_geometry().unwrap();
        assert_eq!(geometry.sections().len(), 4);
        assert_eq!(session.assignments().slots().count(), 40);
        assert!(!session.controller().is_requesting());
        assert!(!session.scene().is_no_data());
    }

    #[tokio::test]
    async fn test_domain_error_leaves_state_identical() {
        let mut session = loaded().await;
        session.dispatch(ViewerEvent::ProfileChosen {
            section: 1,
            group: ElementGroup::new(GroupClass::Leg, 1),
            name: "W12x26".into(),
        });
        session.dispatch(ViewerEvent::ElementClicked(ElementKey::new(1, 0)));
        let geometry = session.geometry().cloned();
        let assignments = session.assignments().clone();
        let selection = session.selection().clone();

        match session.submit(&Rejecting).await {
            Err(ViewerError::Domain(msg)) => assert_eq!(msg, "invalid profile"),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(session.geometry().cloned(), geometry);
        assert_eq!(session.assignments(), &assignments);
        assert_eq!(session.selection(), &selection);
        assert!(!session.controller().is_requesting());
    }

    #[tokio::test]
    async fn test_submit_while_requesting_is_noop() {
        let mut session = Session::new(tower());
        let pending = session.begin_recalculation().unwrap();
        let started = session.controller().started();

        assert!(matches!(session.submit(&calculator()).await, Err(ViewerError::Busy)));
        assert!(session.geometry().is_none());
        assert_eq!(session.controller().started(), started);

        let response = calculator().calculate(pending.input(), pending.payload());
        session.complete_recalculation(pending, response).unwrap();
        assert!(session.geometry().is_some());
    }

    #[tokio::test]
    async fn test_dropped_submit_does_not_block_next() {
        let mut session = Session::new(tower());
        tokio::select! {
            biased;
            _ = session.submit(&Hanging) => panic!("transport never answers"),
            _ = std::future::ready(()) => {}
        }
        assert!(!session.controller().is_requesting());
        assert!(session.geometry().is_none());

        session.submit(&calculator()).await.unwrap();
        assert!(session.geometry().is_some());
    }

    #[test]
    fn test_cancelled_recalculation_releases_controller() {
        let mut session = Session::new(tower());
        let pending = session.begin_recalculation().unwrap();
        session.cancel_recalculation(pending);
        assert!(!session.controller().is_requesting());
        assert!(session.begin_recalculation().is_ok());
    }

    #[test]
    fn test_response_after_navigation_is_discarded() {
        let mut session = Session::new(tower());
        let pending = session.begin_recalculation().unwrap();
        session.dispatch(ViewerEvent::NavigatedAway);

        let response = calculator().calculate(pending.input(), pending.payload());
        assert!(matches!(
            session.complete_recalculation(pending, response),
            Err(ViewerError::Stale)
        ));
        assert!(session.geometry().is_none());
        assert!(session.scene().is_no_data());
    }

    #[test]
    fn test_invalid_payload_is_not_applied() {
        let mut session = Session::new(tower());
        let payload = calculator().calculate(&tower(), &AssignmentPayload::new()).unwrap();
        session.load_geometry(&payload).unwrap();
        let before = session.geometry().cloned();

        let result = session.load_geometry(&serde_json::json!({ "coordinates": [] }));
        assert!(matches!(result, Err(ViewerError::Validation(_))));
        assert_eq!(session.geometry().cloned(), before);
    }

    #[tokio::test]
    async fn test_library_failure_degrades_to_empty() {
        let mut session = Session::new(tower());
        session.refresh_library(&calculator()).await;
        assert_eq!(session.library().len(), 2);
        assert_eq!(session.profile_options().len(), 3);

        session.refresh_library(&Rejecting).await;
        assert!(session.library().is_empty());
        assert_eq!(session.profile_options()[0].label, "Default");
    }

    #[test]
    fn test_stale_library_is_ignored() {
        let mut session = Session::new(tower());
        let request = session.begin_library_refresh();
        session.invalidate();
        let applied = session.apply_library(request, Ok(calculator().library().clone()));
        assert!(!applied);
        assert!(session.library().is_empty());
    }

    #[tokio::test]
    async fn test_selection_events() {
        let mut session = loaded().await;
        let node = session.require_geometry().unwrap().nodes().next().cloned().unwrap();

        session.dispatch(ViewerEvent::NodeClicked {
            key: node.key.clone(),
            position: node.position,
        });
        assert!(session.selection().selected_node().is_some());

        session.dispatch(ViewerEvent::ElementClicked(ElementKey::new(2, 3)));
        assert_eq!(session.selection().selected_element(), Some(ElementKey::new(2, 3)));
        assert!(session.selection().selected_node().is_none());

        session.dispatch(ViewerEvent::ElementClicked(ElementKey::new(2, 3)));
        assert_eq!(session.selection().selection(), &Selection::None);
    }

    #[tokio::test]
    async fn test_fetch_geometry_by_id() {
        let calc = calculator();
        calc.calculate(&tower(), &AssignmentPayload::new()).unwrap();

        let mut session = Session::new(tower());
        session.fetch_geometry(&calc, "tower_12").await.unwrap();
        assert!(session.geometry().is_some());

        assert!(matches!(
            session.fetch_geometry(&Rejecting, "missing").await,
            Err(ViewerError::Domain(_))
        ));
        assert!(session.geometry().is_some());
    }

    #[tokio::test]
    async fn test_snapshot_restore() {
        let mut session = loaded().await;
        session.dispatch(ViewerEvent::ProfileChosen {
            section: 2,
            group: ElementGroup::new(GroupClass::Diagonal, 1),
            name: "L2x2x3/16".into(),
        });
        let snapshot = session.snapshot();

        let mut restored = Session::new(TowerInput::new("other", 1.0, 1.0, 1.0, 1, 0));
        restored.restore(&snapshot).unwrap();
        assert_eq!(restored.input(), session.input());
        assert_eq!(restored.geometry(), session.geometry());
        assert_eq!(restored.assignments(), session.assignments());
    }
}
