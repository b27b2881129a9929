//! **gridjump** — a keyboard-driven pointer navigator.
//!
//! Every display's region is partitioned into a decision tree of labeled
//! cells; the user types a short key sequence and the engine narrows the
//! selection one keystroke at a time until a single point is resolved, then
//! hands that point to the pointer backend.
//!
//! # Architecture
//!
//! The crate is organised around two core traits:
//!
//! * [`traits::PointerDriver`] — abstracts pointer movement and click
//!   synthesis so the navigation logic is not coupled to any specific
//!   platform API.
//! * [`traits::CommandSource`] — abstracts the transport that delivers
//!   user intent (a Unix socket, a test harness, …) so the main loop is not
//!   coupled to any specific IPC mechanism.
//!
//! Navigation itself is layered: [`grid`] builds labeled partition trees,
//! [`session`] walks one tree (or several, in freestyle mode) per
//! keystroke, and [`coordinator`] keeps one tree per display in sync with
//! topology and configuration changes, cancelling in-flight sessions
//! whenever a tree they read is rebuilt.

pub mod command;
pub mod config;
pub mod coordinator;
pub mod geometry;
pub mod grid;
pub mod ipc;
pub mod keys;
pub mod overlay;
pub mod session;
pub mod traits;
