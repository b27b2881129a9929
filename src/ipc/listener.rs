//! Unix-socket [`CommandSource`] implementation.
//!
//! Binds a Unix stream socket and accepts one connection at a time. Each
//! line received is parsed as a JSON-encoded [`Command`]; malformed lines
//! are logged and skipped so a buggy collaborator cannot take the daemon
//! down.
//!
//! # Wire format
//!
//! Every message is a single line of JSON followed by `\n`:
//!
//! ```json
//! {"RegisterDisplay":{"display":"DP-1","region":{"x":0.0,"y":0.0,"width":1920.0,"height":1080.0}}}
//! {"ActivateGrid":{"display":"DP-1"}}
//! {"Key":"a"}
//! {"Key":"ctrl+g"}
//! "ActivateFreestyle"
//! "Cancel"
//! ```

use crate::command::Command;
use crate::traits::CommandSource;
use log::{debug, error, info};
use std::io::{BufRead, BufReader};
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::{Path, PathBuf};
use std::sync::mpsc;

/// A [`CommandSource`] that listens on a Unix stream socket for
/// JSON-encoded commands.
///
/// Each accepted connection can send multiple newline-delimited commands.
/// When the connection closes, the listener waits for the next one.
pub struct SocketListener {
    path: PathBuf,
}

/// Errors produced by the socket listener.
#[derive(Debug, thiserror::Error)]
pub enum SocketError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json parse error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SocketListener {
    /// Create a new listener bound to `path`.
    ///
    /// The socket file is created when [`run`](CommandSource::run) is
    /// called; a stale file from a previous run is removed first.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// The filesystem path of the socket.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read commands from one connected client until it disconnects.
    ///
    /// Returns `false` when the sink has closed and the listener should
    /// shut down.
    fn serve_client(stream: UnixStream, sink: &mpsc::Sender<Command>) -> bool {
        let reader = BufReader::new(stream);
        for line in reader.lines() {
            let text = match line {
                Ok(text) => text,
                Err(e) => {
                    error!("read error: {}", e);
                    return true;
                }
            };
            if text.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<Command>(&text) {
                Ok(cmd) => {
                    debug!("received {:?}", cmd);
                    if sink.send(cmd).is_err() {
                        info!("sink closed, shutting down");
                        return false;
                    }
                }
                Err(e) => error!("bad command: {} ({})", text, e),
            }
        }
        debug!("client disconnected");
        true
    }
}

impl CommandSource for SocketListener {
    type Error = SocketError;

    /// Bind the socket and start accepting connections.
    ///
    /// This method **blocks** indefinitely. Run it on a dedicated thread.
    fn run(&mut self, sink: mpsc::Sender<Command>) -> Result<(), Self::Error> {
        // Remove stale socket if present.
        let _ = std::fs::remove_file(&self.path);

        let listener = UnixListener::bind(&self.path)?;
        info!("listening on {}", self.path.display());

        for stream in listener.incoming() {
            match stream {
                Ok(stream) => {
                    debug!("client connected");
                    if !Self::serve_client(stream, &sink) {
                        return Ok(());
                    }
                }
                Err(e) => error!("accept error: {}", e),
            }
        }
        Ok(())
    }
}

//  Tests
