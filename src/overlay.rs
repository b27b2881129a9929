//! Debug overlay sink.
//!
//! The real overlay (grid lines, labels, highlight rectangles) is an
//! external collaborator; this module ships the logging listener used when
//! no renderer is attached, so `RUST_LOG=debug gridjump` shows the full
//! selection flow.

use crate::config::OverlayConfig;
use crate::traits::OverlayEvent;
use log::debug;
use std::sync::mpsc;

/// Consume overlay events from `rx` until the sender hangs up, logging each
/// one.
///
/// Blocks the calling thread; run it on its own thread. The overlay config
/// is only used to mirror what a renderer would show (label logging is
/// suppressed when labels are turned off).
pub fn run_logger(rx: mpsc::Receiver<OverlayEvent>, config: OverlayConfig) {
    debug!(
        "overlay logger up (colors {}/{}, lines {}, labels {})",
        config.primary_color,
        config.secondary_color,
        config.show_grid_lines,
        config.show_grid_labels
    );
    for event in rx {
        match event {
            OverlayEvent::Show(hint) => {
                let remaining: usize = hint.selections.iter().map(|s| s.rects.len()).sum();
                if config.show_grid_labels {
                    debug!(
                        "overlay: prefix {:?}, {} cells remaining on {} display(s)",
                        hint.prefix,
                        remaining,
                        hint.selections.len()
                    );
                } else {
                    debug!(
                        "overlay: {} cells remaining on {} display(s)",
                        remaining,
                        hint.selections.len()
                    );
                }
            }
            OverlayEvent::Hide => debug!("overlay: hide"),
        }
    }
    debug!("overlay logger down");
}

//  Tests

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn logger_drains_the_channel_and_returns() {
        let (tx, rx) = mpsc::channel();
        tx.send(OverlayEvent::Hide).unwrap();
        drop(tx);
        // Must terminate once the sender is gone.
        run_logger(rx, OverlayConfig::default());
    }
}
