//! The topology coordinator: one partition tree per display, kept in sync
//! with geometry and configuration.
//!
//! [`TopologyCoordinator`] owns the display → tree mapping and the single
//! active [`NavigationSession`]. Topology and configuration changes rebuild
//! the affected trees synchronously and cancel any session that reads them,
//! so no keystroke is ever processed against a stale tree. Rebuilding with
//! unchanged inputs is a no-op and disturbs nothing.
//!
//! The coordinator is generic over any [`PointerDriver`] implementation,
//! keeping it independent of the platform's event-injection API.

use crate::geometry::{DisplayId, Region};
use crate::grid::PartitionTree;
use crate::keys::{Alphabet, KeyPress, Scheme};
use crate::session::{KeyOutcome, NavigationSession, SelectionHint};
use crate::traits::{OverlayEvent, PointerDriver};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::mpsc;
use std::sync::Arc;

/// Process-wide engine settings.
///
/// Changing either field invalidates every partition tree, so the
/// coordinator rebuilds all of them when a new configuration is applied.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Requested cell side length in pixels; actual cells approximate it.
    pub target_cell_side: f64,
    /// Active keybinding scheme (decides the label alphabet).
    pub scheme: Scheme,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            target_cell_side: 60.0,
            scheme: Scheme::Emacs,
        }
    }
}

/// Possible errors from the coordinator.
#[derive(Debug, thiserror::Error)]
pub enum CoordinatorError {
    /// The display id is not registered.
    #[error("unknown display: {0}")]
    UnknownDisplay(DisplayId),

    /// Freestyle activation with an empty topology.
    #[error("no displays registered")]
    NoDisplays,

    /// A partition build rejected its inputs.
    #[error(transparent)]
    Partition(#[from] crate::grid::PartitionError),

    /// The pointer driver returned an error.
    #[error("pointer driver error: {0}")]
    Pointer(String),
}

#[derive(Debug)]
struct DisplayEntry {
    region: Region,
    tree: Arc<PartitionTree>,
}

/// Owns the per-display partition trees and the active navigation session.
///
/// # Typical usage
///
/// ```ignore
/// let mut coordinator = TopologyCoordinator::new(driver, EngineConfig::default());
/// coordinator.register_display(DisplayId::new("DP-1"), region)?;
/// coordinator.activate_grid(&DisplayId::new("DP-1"))?;
/// coordinator.handle_key(&KeyPress::char('a'));
/// ```
pub struct TopologyCoordinator<P: PointerDriver> {
    driver: P,
    config: EngineConfig,
    alphabet: Alphabet,
    displays: BTreeMap<DisplayId, DisplayEntry>,
    overlay_tx: Option<mpsc::Sender<OverlayEvent>>,
    session: Option<NavigationSession>,
}

impl<P: PointerDriver> TopologyCoordinator<P> {
    /// Create a coordinator with an empty topology.
    pub fn new(driver: P, config: EngineConfig) -> Self {
        Self {
            driver,
            alphabet: Alphabet::for_scheme(config.scheme),
            config,
            displays: BTreeMap::new(),
            overlay_tx: None,
            session: None,
        }
    }

    /// Attach an overlay event channel.
    ///
    /// The coordinator will send [`OverlayEvent::Show`] on activation and
    /// after every narrowing/backtracking keystroke, and
    /// [`OverlayEvent::Hide`] when the activation finishes.
    pub fn set_overlay(&mut self, tx: mpsc::Sender<OverlayEvent>) {
        self.overlay_tx = Some(tx);
    }

    //  Accessors

    pub fn config(&self) -> EngineConfig {
        self.config
    }

    /// Registered display ids, in order.
    pub fn displays(&self) -> impl Iterator<Item = &DisplayId> {
        self.displays.keys()
    }

    /// The region assigned to a display.
    pub fn region_of(&self, id: &DisplayId) -> Option<Region> {
        self.displays.get(id).map(|e| e.region)
    }

    /// The current partition tree of a display.
    pub fn tree(&self, id: &DisplayId) -> Option<Arc<PartitionTree>> {
        self.displays.get(id).map(|e| Arc::clone(&e.tree))
    }

    /// Whether an activation is in flight.
    pub fn has_active_session(&self) -> bool {
        self.session.is_some()
    }

    //  Topology

    /// Register (or re-register) a display and build its tree.
    pub fn register_display(
        &mut self,
        id: DisplayId,
        region: Region,
    ) -> Result<(), CoordinatorError> {
        let tree = Arc::new(PartitionTree::build(
            region,
            self.config.target_cell_side,
            &self.alphabet,
        )?);
        info!(
            "display {} registered: {} -> {}x{} cells, depth {}",
            id,
            region,
            tree.dimensions().0,
            tree.dimensions().1,
            tree.depth()
        );
        self.displays.insert(id.clone(), DisplayEntry { region, tree });
        self.cancel_sessions_touching(&id);
        Ok(())
    }

    /// Replace a display's region and rebuild its tree.
    ///
    /// A call with the region the display already has is a no-op: the
    /// existing tree is identical to what a rebuild would produce, and any
    /// in-flight session keeps running.
    pub fn update_display(
        &mut self,
        id: &DisplayId,
        region: Region,
    ) -> Result<(), CoordinatorError> {
        let entry = self
            .displays
            .get(id)
            .ok_or_else(|| CoordinatorError::UnknownDisplay(id.clone()))?;
        if entry.region == region {
            debug!("display {} geometry unchanged, keeping tree", id);
            return Ok(());
        }
        let tree = Arc::new(PartitionTree::build(
            region,
            self.config.target_cell_side,
            &self.alphabet,
        )?);
        info!("display {} resized to {}", id, region);
        self.displays.insert(id.clone(), DisplayEntry { region, tree });
        self.cancel_sessions_touching(id);
        Ok(())
    }

    /// Drop a display and its tree.
    pub fn remove_display(&mut self, id: &DisplayId) -> Result<(), CoordinatorError> {
        if self.displays.remove(id).is_none() {
            return Err(CoordinatorError::UnknownDisplay(id.clone()));
        }
        info!("display {} removed", id);
        self.cancel_sessions_touching(id);
        Ok(())
    }

    /// Apply a new engine configuration, rebuilding every display's tree.
    ///
    /// All trees are rebuilt before any is swapped in, so a failure leaves
    /// the previous state intact. An unchanged configuration is a no-op.
    pub fn set_configuration(&mut self, config: EngineConfig) -> Result<(), CoordinatorError> {
        if config == self.config {
            debug!("configuration unchanged, keeping trees");
            return Ok(());
        }
        let alphabet = Alphabet::for_scheme(config.scheme);
        let mut rebuilt = BTreeMap::new();
        for (id, entry) in &self.displays {
            let tree = Arc::new(PartitionTree::build(
                entry.region,
                config.target_cell_side,
                &alphabet,
            )?);
            rebuilt.insert(
                id.clone(),
                DisplayEntry {
                    region: entry.region,
                    tree,
                },
            );
        }
        info!(
            "configuration applied: cell side {}, {} scheme",
            config.target_cell_side, config.scheme
        );
        self.displays = rebuilt;
        self.config = config;
        self.alphabet = alphabet;
        self.end_session();
        Ok(())
    }

    //  Activation

    /// Start grid-based navigation on one display.
    pub fn activate_grid(&mut self, id: &DisplayId) -> Result<SelectionHint, CoordinatorError> {
        let entry = self
            .displays
            .get(id)
            .ok_or_else(|| CoordinatorError::UnknownDisplay(id.clone()))?;
        let session =
            NavigationSession::grid(id.clone(), Arc::clone(&entry.tree), self.alphabet.clone());
        Ok(self.begin(session))
    }

    /// Start element-based navigation over candidate rectangles supplied by
    /// the accessibility collaborator.
    pub fn activate_elements(
        &mut self,
        id: &DisplayId,
        targets: &[Region],
    ) -> Result<SelectionHint, CoordinatorError> {
        if !self.displays.contains_key(id) {
            return Err(CoordinatorError::UnknownDisplay(id.clone()));
        }
        let tree = Arc::new(PartitionTree::from_targets(targets, &self.alphabet)?);
        let session = NavigationSession::elements(id.clone(), tree, self.alphabet.clone());
        Ok(self.begin(session))
    }

    /// Start freestyle navigation across every registered display.
    pub fn activate_freestyle(&mut self) -> Result<SelectionHint, CoordinatorError> {
        if self.displays.is_empty() {
            return Err(CoordinatorError::NoDisplays);
        }
        let targets = self
            .displays
            .iter()
            .map(|(id, e)| (id.clone(), Arc::clone(&e.tree)))
            .collect();
        let session = NavigationSession::freestyle(targets, self.alphabet.clone());
        Ok(self.begin(session))
    }

    fn begin(&mut self, session: NavigationSession) -> SelectionHint {
        self.end_session();
        info!("activated {} navigation", session.mode());
        let hint = session.hint();
        self.session = Some(session);
        self.send_overlay(OverlayEvent::Show(hint.clone()));
        hint
    }

    /// Dismiss the current activation without acting, if one exists.
    pub fn cancel_activation(&mut self) {
        if self.session.is_some() {
            info!("activation cancelled");
            self.end_session();
        }
    }

    //  Keystrokes

    /// Feed one key press to the active session.
    ///
    /// With no activation in flight this is a no-op returning
    /// [`KeyOutcome::Inactive`]. On resolution the pointer driver is invoked
    /// (failures logged, not propagated) and the session is destroyed.
    pub fn handle_key(&mut self, press: &KeyPress) -> KeyOutcome {
        let Some(session) = self.session.as_mut() else {
            return KeyOutcome::Inactive;
        };
        let outcome = session.key(press);

        match &outcome {
            KeyOutcome::Pending(hint) => {
                self.send_overlay(OverlayEvent::Show(hint.clone()));
            }
            KeyOutcome::Resolved(resolution) => {
                info!("resolved to {} on {}", resolution.point, resolution.display);
                if let Err(e) = self.driver.move_to(&resolution.display, resolution.point) {
                    warn!("pointer driver move failed: {}", e);
                }
                self.send_overlay(OverlayEvent::Hide);
                self.session = None;
            }
            KeyOutcome::Cancelled => {
                self.send_overlay(OverlayEvent::Hide);
                self.session = None;
            }
            KeyOutcome::InvalidSequence => debug!("{}: no such cell", press),
            KeyOutcome::UnrecognizedKey => debug!("{}: not bound", press),
            KeyOutcome::Inactive => {}
        }
        outcome
    }

    /// Synthesize a click at the current pointer position.
    pub fn click(&self) -> Result<(), CoordinatorError> {
        self.driver
            .click()
            .map_err(|e| CoordinatorError::Pointer(e.to_string()))
    }

    //  Internal

    /// Cancel the active session if it reads `id`'s tree.
    fn cancel_sessions_touching(&mut self, id: &DisplayId) {
        if self.session.as_ref().is_some_and(|s| s.touches(id)) {
            info!("cancelling in-flight session: display {} changed", id);
            self.end_session();
        }
    }

    /// Cancel and drop the active session, dismissing the overlay.
    fn end_session(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.cancel();
            self.send_overlay(OverlayEvent::Hide);
        }
    }

    fn send_overlay(&self, event: OverlayEvent) {
        if let Some(tx) = &self.overlay_tx {
            let _ = tx.send(event);
        }
    }
}

//  Tests

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;
    use std::cell::RefCell;

    /// Record-keeping mock pointer driver.
    #[derive(Debug, Default)]
    struct RecorderPointer {
        moves: RefCell<Vec<(DisplayId, Point)>>,
        clicks: RefCell<u32>,
    }

    #[derive(Debug, thiserror::Error)]
    #[error("recorder error")]
    struct RecorderErr;

    impl PointerDriver for RecorderPointer {
        type Error = RecorderErr;

        fn move_to(&self, display: &DisplayId, point: Point) -> Result<(), RecorderErr> {
            self.moves.borrow_mut().push((display.clone(), point));
            Ok(())
        }

        fn click(&self) -> Result<(), RecorderErr> {
            *self.clicks.borrow_mut() += 1;
            Ok(())
        }
    }

    fn dp1() -> DisplayId {
        DisplayId::new("DP-1")
    }

    fn hdmi() -> DisplayId {
        DisplayId::new("HDMI-A-1")
    }

    /// Coordinator with one 1200x800 display and a 100px cell side.
    fn make_coordinator() -> TopologyCoordinator<RecorderPointer> {
        let config = EngineConfig {
            target_cell_side: 100.0,
            scheme: Scheme::Emacs,
        };
        let mut c = TopologyCoordinator::new(RecorderPointer::default(), config);
        c.register_display(dp1(), Region::new(0.0, 0.0, 1200.0, 800.0))
            .unwrap();
        c
    }

    #[test]
    fn grid_resolution_drives_the_pointer() {
        let mut c = make_coordinator();
        c.activate_grid(&dp1()).unwrap();
        c.handle_key(&KeyPress::char('a'));
        let outcome = c.handle_key(&KeyPress::char('a'));
        assert!(matches!(outcome, KeyOutcome::Resolved(_)));

        let moves = c.driver.moves.borrow();
        assert_eq!(moves.len(), 1);
        assert_eq!(moves[0], (dp1(), Point::new(50.0, 50.0)));
        assert!(!c.has_active_session(), "session is destroyed on resolution");
    }

    #[test]
    fn keystroke_without_activation_is_inactive() {
        let mut c = make_coordinator();
        assert_eq!(c.handle_key(&KeyPress::char('a')), KeyOutcome::Inactive);
        assert!(c.driver.moves.borrow().is_empty());
    }

    #[test]
    fn update_display_cancels_session_on_that_display() {
        let mut c = make_coordinator();
        c.activate_grid(&dp1()).unwrap();
        c.handle_key(&KeyPress::char('a'));

        c.update_display(&dp1(), Region::new(0.0, 0.0, 1600.0, 900.0))
            .unwrap();
        assert!(!c.has_active_session());
        // Subsequent keystrokes are no-ops.
        assert_eq!(c.handle_key(&KeyPress::char('a')), KeyOutcome::Inactive);
        assert!(c.driver.moves.borrow().is_empty());
    }

    #[test]
    fn unchanged_update_keeps_session_running() {
        let mut c = make_coordinator();
        c.activate_grid(&dp1()).unwrap();
        c.update_display(&dp1(), Region::new(0.0, 0.0, 1200.0, 800.0))
            .unwrap();
        assert!(c.has_active_session());
        assert!(matches!(
            c.handle_key(&KeyPress::char('a')),
            KeyOutcome::Pending(_)
        ));
    }

    #[test]
    fn update_unknown_display_fails() {
        let mut c = make_coordinator();
        let err = c
            .update_display(&hdmi(), Region::new(0.0, 0.0, 100.0, 100.0))
            .unwrap_err();
        assert!(matches!(err, CoordinatorError::UnknownDisplay(_)));
    }

    #[test]
    fn remove_display_cancels_its_session() {
        let mut c = make_coordinator();
        c.activate_grid(&dp1()).unwrap();
        c.remove_display(&dp1()).unwrap();
        assert!(!c.has_active_session());
        assert!(c.displays().next().is_none());
    }

    #[test]
    fn register_on_other_display_keeps_grid_session() {
        let mut c = make_coordinator();
        c.activate_grid(&dp1()).unwrap();
        c.register_display(hdmi(), Region::new(1200.0, 0.0, 1920.0, 1080.0))
            .unwrap();
        assert!(c.has_active_session(), "grid session on DP-1 is unaffected");
    }

    #[test]
    fn register_cancels_freestyle_session() {
        let mut c = make_coordinator();
        c.activate_freestyle().unwrap();
        c.register_display(hdmi(), Region::new(1200.0, 0.0, 1920.0, 1080.0))
            .unwrap();
        assert!(!c.has_active_session(), "freestyle spans the whole topology");
    }

    #[test]
    fn set_configuration_rebuilds_and_cancels() {
        let mut c = make_coordinator();
        c.activate_grid(&dp1()).unwrap();

        let before = c.tree(&dp1()).unwrap();
        assert_eq!(before.dimensions(), (12, 8));

        c.set_configuration(EngineConfig {
            target_cell_side: 200.0,
            scheme: Scheme::Emacs,
        })
        .unwrap();

        let after = c.tree(&dp1()).unwrap();
        assert_eq!(after.dimensions(), (6, 4));
        assert!(!c.has_active_session());
    }

    #[test]
    fn scheme_change_swaps_the_alphabet() {
        let mut c = make_coordinator();
        c.set_configuration(EngineConfig {
            target_cell_side: 100.0,
            scheme: Scheme::Vi,
        })
        .unwrap();
        assert_eq!(c.tree(&dp1()).unwrap().symbols().len(), 22);
        // 'h' is not a vi label symbol.
        c.activate_grid(&dp1()).unwrap();
        assert_eq!(
            c.handle_key(&KeyPress::char('h')),
            KeyOutcome::UnrecognizedKey
        );
    }

    #[test]
    fn unchanged_configuration_is_a_noop() {
        let mut c = make_coordinator();
        c.activate_grid(&dp1()).unwrap();
        let config = c.config();
        c.set_configuration(config).unwrap();
        assert!(c.has_active_session());
    }

    #[test]
    fn freestyle_needs_at_least_one_display() {
        let mut c = TopologyCoordinator::new(RecorderPointer::default(), EngineConfig::default());
        assert!(matches!(
            c.activate_freestyle(),
            Err(CoordinatorError::NoDisplays)
        ));
    }

    #[test]
    fn freestyle_spans_all_displays() {
        let mut c = make_coordinator();
        c.register_display(hdmi(), Region::new(1200.0, 0.0, 1920.0, 1080.0))
            .unwrap();
        let hint = c.activate_freestyle().unwrap();
        assert_eq!(hint.selections.len(), 2);
    }

    #[test]
    fn element_activation_resolves_at_candidate_centers() {
        let mut c = make_coordinator();
        let targets = vec![
            Region::new(10.0, 10.0, 100.0, 30.0),
            Region::new(200.0, 10.0, 60.0, 30.0),
        ];
        let hint = c.activate_elements(&dp1(), &targets).unwrap();
        assert_eq!(hint.selections[0].rects.len(), 2);

        let outcome = c.handle_key(&KeyPress::char('s'));
        assert!(matches!(outcome, KeyOutcome::Resolved(_)));
        let moves = c.driver.moves.borrow();
        assert_eq!(moves[0].1, Point::new(230.0, 25.0));
    }

    #[test]
    fn degenerate_region_is_rejected_at_registration() {
        let mut c = make_coordinator();
        let err = c
            .register_display(hdmi(), Region::new(0.0, 0.0, 0.0, 100.0))
            .unwrap_err();
        assert!(matches!(err, CoordinatorError::Partition(_)));
        assert_eq!(c.displays().count(), 1);
    }

    #[test]
    fn element_activation_requires_known_display() {
        let mut c = make_coordinator();
        let err = c
            .activate_elements(&hdmi(), &[Region::new(0.0, 0.0, 10.0, 10.0)])
            .unwrap_err();
        assert!(matches!(err, CoordinatorError::UnknownDisplay(_)));
    }

    #[test]
    fn click_delegates_to_the_driver() {
        let c = make_coordinator();
        c.click().unwrap();
        assert_eq!(*c.driver.clicks.borrow(), 1);
    }

    //  Overlay integration

    /// Attach an overlay channel and collect the events emitted by `f`.
    fn collect_overlay_events(
        f: impl FnOnce(&mut TopologyCoordinator<RecorderPointer>),
    ) -> Vec<OverlayEvent> {
        let mut c = make_coordinator();
        let (tx, rx) = mpsc::channel();
        c.set_overlay(tx);
        f(&mut c);
        rx.try_iter().collect()
    }

    #[test]
    fn activation_and_resolution_emit_show_then_hide() {
        let events = collect_overlay_events(|c| {
            c.activate_grid(&dp1()).unwrap();
            c.handle_key(&KeyPress::char('a'));
            c.handle_key(&KeyPress::char('a'));
        });
        assert!(
            matches!(
                events.as_slice(),
                [
                    OverlayEvent::Show(_),
                    OverlayEvent::Show(_),
                    OverlayEvent::Hide
                ]
            ),
            "expected Show, Show, Hide; got {:?}",
            events
        );
    }

    #[test]
    fn cancellation_emits_hide() {
        let events = collect_overlay_events(|c| {
            c.activate_grid(&dp1()).unwrap();
            c.cancel_activation();
        });
        assert!(
            matches!(events.as_slice(), [OverlayEvent::Show(_), OverlayEvent::Hide]),
            "expected Show, Hide; got {:?}",
            events
        );
    }

    #[test]
    fn invalid_sequence_emits_no_overlay_event() {
        let events = collect_overlay_events(|c| {
            c.activate_grid(&dp1()).unwrap();
            c.handle_key(&KeyPress::char('1'));
        });
        assert_eq!(events.len(), 1, "only the activation Show: {:?}", events);
    }
}
