//! Transport implementations for the command surface.
//!
//! The [`listener::SocketListener`] accepts newline-delimited JSON
//! [`Command`](crate::command::Command)s over a Unix stream socket; it is
//! the transport the display-enumeration, settings, and input collaborators
//! talk to the daemon through.

pub mod listener;
