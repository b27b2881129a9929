//! Commands accepted over the external command surface.
//!
//! This module defines the vocabulary that collaborators use to drive the
//! engine: the display-enumeration collaborator feeds topology commands,
//! the settings owner feeds configuration updates, the hotkey/input layer
//! feeds activations and raw key presses.
//!
//! Every command is JSON on the wire; keys and schemes use forgiving string
//! forms (`{"Key":"ctrl+g"}`, `{"Configure":{"scheme":"vi"}}`).

use crate::geometry::{DisplayId, Region};
use crate::keys::{KeyPress, Scheme};
use serde::{Deserialize, Serialize};

/// Partial engine-configuration update.
///
/// Absent fields keep their current values, so the settings owner can push
/// a single changed slider without re-sending everything.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ConfigUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_cell_side: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheme: Option<Scheme>,
}

/// Every action the engine can be asked to perform.
///
/// Commands are produced by [`CommandSource`](crate::traits::CommandSource)
/// implementations and consumed by the
/// [`TopologyCoordinator`](crate::coordinator::TopologyCoordinator).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Command {
    /// A display appeared (or re-announced itself) with the given region.
    RegisterDisplay { display: DisplayId, region: Region },

    /// A display's geometry changed.
    UpdateDisplay { display: DisplayId, region: Region },

    /// A display disappeared.
    RemoveDisplay { display: DisplayId },

    /// Apply configuration changes (rebuilds every tree if anything
    /// actually changed).
    Configure(ConfigUpdate),

    /// Start grid-based navigation on one display.
    ActivateGrid { display: DisplayId },

    /// Start element-based navigation over candidate rectangles on one
    /// display.
    ///
    /// The accessibility collaborator supplies the candidates; the engine
    /// labels them in reading order.
    ActivateElements {
        display: DisplayId,
        targets: Vec<Region>,
    },

    /// Start freestyle navigation across every registered display.
    ///
    /// On the wire this is encoded as the JSON string
    /// `"ActivateFreestyle"`.
    ActivateFreestyle,

    /// One key press for the active navigation session.
    Key(KeyPress),

    /// Dismiss the current activation without moving the pointer.
    Cancel,

    /// Synthesize a primary-button click at the current pointer position.
    Click,
}

//  Tests
