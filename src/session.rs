//! Per-activation navigation state machine.
//!
//! A [`NavigationSession`] is created when the user activates navigation and
//! consumes one [`KeyPress`] at a time, narrowing the selection until a
//! point is resolved or the activation is cancelled. Every keystroke returns
//! a [`KeyOutcome`]; nothing here panics or unwinds across the keystroke
//! boundary.
//!
//! Grid and element modes run over a single display's tree. Freestyle mode
//! runs one session over every display's tree in lockstep: the shared
//! prefix is applied to all trees, displays whose tree does not accept the
//! prefix drop out of the selection hint (and come back on backtrack), and
//! the first tree to reach a leaf wins.

use crate::geometry::{DisplayId, Point, Region};
use crate::grid::PartitionTree;
use crate::keys::{Alphabet, KeyClass, KeyPress};
use log::debug;
use std::fmt;
use std::sync::Arc;

/// Which navigation mode a session is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Uniform grid over one display.
    Grid,
    /// Caller-supplied candidate rectangles on one display.
    Element,
    /// All displays' grids at once.
    Freestyle,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Grid => write!(f, "grid"),
            Mode::Element => write!(f, "element"),
            Mode::Freestyle => write!(f, "freestyle"),
        }
    }
}

/// A resolved navigation: where the pointer should go.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub display: DisplayId,
    /// Global coordinates.
    pub point: Point,
}

/// The remaining candidate rectangles on one display.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplaySelection {
    pub display: DisplayId,
    pub rects: Vec<Region>,
}

/// Snapshot of the current selection, for overlay redraw.
///
/// Only displays whose tree still matches the typed prefix appear in
/// `selections`.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionHint {
    /// The typed-so-far label prefix, rendered as symbols.
    pub prefix: String,
    pub selections: Vec<DisplaySelection>,
}

/// Outcome of feeding one key press to a session.
#[derive(Debug, Clone, PartialEq)]
pub enum KeyOutcome {
    /// The selection narrowed (or backtracked); session still active.
    Pending(SelectionHint),
    /// Terminal: a point was resolved.
    Resolved(Resolution),
    /// Terminal: the activation was aborted.
    Cancelled,
    /// The symbol has no cell under it (dead-end label); state unchanged.
    InvalidSequence,
    /// The key means nothing to the active alphabet; state unchanged.
    UnrecognizedKey,
    /// The session already finished; the keystroke was a no-op.
    Inactive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionState {
    Active,
    Resolved,
    Cancelled,
}

#[derive(Debug, Clone)]
struct SessionTarget {
    display: DisplayId,
    tree: Arc<PartitionTree>,
}

/// One end-to-end navigation attempt.
///
/// Created on activation, finished on resolution or cancellation. Once
/// finished, every further keystroke returns [`KeyOutcome::Inactive`], so a
/// stale handle (e.g. after the coordinator cancelled the session under a
/// topology change) is harmless.
#[derive(Debug, Clone)]
pub struct NavigationSession {
    mode: Mode,
    alphabet: Alphabet,
    targets: Vec<SessionTarget>,
    prefix: Vec<usize>,
    state: SessionState,
}

impl NavigationSession {
    /// Grid-based session over one display's tree.
    pub fn grid(display: DisplayId, tree: Arc<PartitionTree>, alphabet: Alphabet) -> Self {
        Self::with_targets(Mode::Grid, vec![SessionTarget { display, tree }], alphabet)
    }

    /// Element-based session over a tree built from candidate rectangles.
    pub fn elements(display: DisplayId, tree: Arc<PartitionTree>, alphabet: Alphabet) -> Self {
        Self::with_targets(Mode::Element, vec![SessionTarget { display, tree }], alphabet)
    }

    /// Freestyle session spanning every display's tree.
    ///
    /// `targets` must be in the display order that should win resolution
    /// ties.
    pub fn freestyle(targets: Vec<(DisplayId, Arc<PartitionTree>)>, alphabet: Alphabet) -> Self {
        let targets = targets
            .into_iter()
            .map(|(display, tree)| SessionTarget { display, tree })
            .collect();
        Self::with_targets(Mode::Freestyle, targets, alphabet)
    }

    fn with_targets(mode: Mode, targets: Vec<SessionTarget>, alphabet: Alphabet) -> Self {
        Self {
            mode,
            alphabet,
            targets,
            prefix: Vec::new(),
            state: SessionState::Active,
        }
    }

    //  Accessors

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn is_active(&self) -> bool {
        self.state == SessionState::Active
    }

    /// The typed-so-far prefix, rendered as label symbols.
    pub fn prefix(&self) -> String {
        self.prefix
            .iter()
            .filter_map(|&i| self.alphabet.symbol(i))
            .collect()
    }

    /// Whether this session reads the given display's tree.
    ///
    /// Freestyle sessions span the whole topology, so they touch every
    /// display (including ones registered after activation).
    pub fn touches(&self, display: &DisplayId) -> bool {
        match self.mode {
            Mode::Freestyle => true,
            _ => self.targets.iter().any(|t| &t.display == display),
        }
    }

    /// Current selection snapshot for the overlay.
    pub fn hint(&self) -> SelectionHint {
        let selections = self
            .targets
            .iter()
            .filter_map(|t| {
                let node = t.tree.node_at(&self.prefix)?;
                Some(DisplaySelection {
                    display: t.display.clone(),
                    rects: node.descendant_rects(),
                })
            })
            .collect();
        SelectionHint {
            prefix: self.prefix(),
            selections,
        }
    }

    //  Transitions

    /// Cancel the session (idempotent). Used when a rebuild invalidates
    /// the tree under an in-flight activation.
    pub fn cancel(&mut self) {
        if self.state == SessionState::Active {
            self.state = SessionState::Cancelled;
        }
    }

    /// Feed one key press.
    pub fn key(&mut self, press: &KeyPress) -> KeyOutcome {
        if self.state != SessionState::Active {
            return KeyOutcome::Inactive;
        }

        match self.alphabet.classify(press) {
            KeyClass::Cancel => {
                if self.prefix.is_empty() {
                    debug!("{} session cancelled by {}", self.mode, press);
                    self.state = SessionState::Cancelled;
                    KeyOutcome::Cancelled
                } else {
                    self.prefix.pop();
                    debug!("backtracked to prefix {:?}", self.prefix());
                    KeyOutcome::Pending(self.hint())
                }
            }

            KeyClass::Commit => match self.narrowed_center() {
                Some(resolution) => {
                    debug!(
                        "committed at prefix {:?} -> {} on {}",
                        self.prefix(),
                        resolution.point,
                        resolution.display
                    );
                    self.state = SessionState::Resolved;
                    KeyOutcome::Resolved(resolution)
                }
                // No target matches the prefix; cannot happen while the
                // descend path below maintains its invariant.
                None => KeyOutcome::InvalidSequence,
            },

            KeyClass::Label(index) => self.descend(index),

            KeyClass::Other => KeyOutcome::UnrecognizedKey,
        }
    }

    /// Descend one level on symbol `index`, across all targets.
    fn descend(&mut self, index: usize) -> KeyOutcome {
        let mut accepted = false;

        for target in &self.targets {
            let Some(node) = target.tree.node_at(&self.prefix) else {
                continue;
            };
            let Some(child) = node.child(index) else {
                continue;
            };
            accepted = true;
            if let Some(cell) = child.as_leaf() {
                // First tree to reach a leaf wins the activation.
                debug!("resolved {:?} -> {} on {}", cell.label, cell.center, target.display);
                let resolution = Resolution {
                    display: target.display.clone(),
                    point: cell.center,
                };
                self.state = SessionState::Resolved;
                return KeyOutcome::Resolved(resolution);
            }
        }

        if !accepted {
            return KeyOutcome::InvalidSequence;
        }
        self.prefix.push(index);
        KeyOutcome::Pending(self.hint())
    }

    /// Center of the narrowed region on the first target still matching
    /// the prefix (display order).
    fn narrowed_center(&self) -> Option<Resolution> {
        self.targets.iter().find_map(|t| {
            let node = t.tree.node_at(&self.prefix)?;
            let bounds = node.bounding_rect()?;
            Some(Resolution {
                display: t.display.clone(),
                point: bounds.center(),
            })
        })
    }
}

//  Tests
