//! Core traits that decouple gridjump from any specific pointer backend or
//! transport mechanism.
//!
//! Every concrete collaborator (an OS pointer backend, a Unix-socket
//! listener, a test harness, …) implements one of these traits. The
//! [`TopologyCoordinator`](crate::coordinator::TopologyCoordinator) only
//! depends on these abstractions.

use crate::command::Command;
use crate::geometry::{DisplayId, Point};
use crate::session::SelectionHint;
use std::sync::mpsc;

/// Abstraction over the OS facility that moves the pointer and synthesizes
/// clicks.
///
/// An implementation might call the platform's event-injection API, or it
/// might be a recording stub used in tests.
pub trait PointerDriver {
    /// The error type produced by this driver.
    type Error: std::error::Error + Send + 'static;

    /// Warp the pointer to `point` (global coordinates) on `display`.
    ///
    /// The coordinator treats this as fire-and-forget: failures are logged,
    /// never surfaced to the keystroke path.
    fn move_to(&self, display: &DisplayId, point: Point) -> Result<(), Self::Error>;

    /// Synthesize a primary-button click at the current pointer position.
    fn click(&self) -> Result<(), Self::Error>;
}

/// Events sent from the coordinator to an external overlay over an
/// [`mpsc`](std::sync::mpsc) channel.
///
/// The receiver end can be owned by any independent listener — a compositor
/// overlay, a debug logger, etc. The overlay renders the remaining cell
/// rectangles itself; the coordinator only describes *what* is selected.
#[derive(Debug, Clone)]
pub enum OverlayEvent {
    /// Show (or update) the overlay with the current selection.
    ///
    /// Sent on activation and after every keystroke that narrows or
    /// backtracks the selection.
    Show(SelectionHint),

    /// Dismiss the overlay: the activation resolved or was cancelled.
    Hide,
}

/// A source of [`Command`]s.
///
/// Implementations listen on some transport — a Unix socket, an in-memory
/// channel, … — and forward parsed commands into the provided
/// [`mpsc::Sender`].
///
/// # Contract
///
/// * [`run`](CommandSource::run) **blocks** until the source is exhausted or
///   an unrecoverable error occurs.
/// * Each received command must be sent through `sink` exactly once.
/// * Implementations must be [`Send`] so they can run on a dedicated thread.
pub trait CommandSource: Send {
    /// The error type produced by this source.
    type Error: std::error::Error + Send + 'static;

    /// Start listening and forward every incoming [`Command`] into `sink`.
    ///
    /// This method blocks the calling thread. To run multiple sources
    /// concurrently, spawn each one on its own thread.
    fn run(&mut self, sink: mpsc::Sender<Command>) -> Result<(), Self::Error>;
}

//  Tests

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::Command;
    use crate::keys::KeyPress;
    use std::cell::RefCell;

    /// A test double that records every pointer call made to it.
    #[derive(Debug, Default)]
    struct MockPointer {
        moves: RefCell<Vec<(DisplayId, Point)>>,
        clicks: RefCell<u32>,
    }

    #[derive(Debug, thiserror::Error)]
    #[error("mock error")]
    struct MockError;

    impl PointerDriver for MockPointer {
        type Error = MockError;

        fn move_to(&self, display: &DisplayId, point: Point) -> Result<(), MockError> {
            self.moves.borrow_mut().push((display.clone(), point));
            Ok(())
        }

        fn click(&self) -> Result<(), MockError> {
            *self.clicks.borrow_mut() += 1;
            Ok(())
        }
    }

    #[test]
    fn mock_pointer_records_moves() {
        let p = MockPointer::default();
        p.move_to(&DisplayId::new("DP-1"), Point::new(10.0, 20.0))
            .unwrap();
        p.click().unwrap();
        assert_eq!(p.moves.borrow().len(), 1);
        assert_eq!(*p.clicks.borrow(), 1);
    }

    /// A test double that emits a fixed sequence of commands.
    struct MockSource {
        commands: Vec<Command>,
    }

    impl CommandSource for MockSource {
        type Error = MockError;

        fn run(&mut self, sink: mpsc::Sender<Command>) -> Result<(), MockError> {
            for cmd in self.commands.drain(..) {
                let _ = sink.send(cmd);
            }
            Ok(())
        }
    }

    #[test]
    fn mock_source_emits_commands() {
        let mut src = MockSource {
            commands: vec![
                Command::ActivateFreestyle,
                Command::Key(KeyPress::char('a')),
            ],
        };
        let (tx, rx) = mpsc::channel();
        src.run(tx).unwrap();
        let cmds: Vec<Command> = rx.try_iter().collect();
        assert_eq!(cmds.len(), 2);
        assert_eq!(cmds[0], Command::ActivateFreestyle);
        assert_eq!(cmds[1], Command::Key(KeyPress::char('a')));
    }
}
