//! Entry point for the **gridjump** daemon.
//!
//! Spawns the configured [`CommandSource`](gridjump::traits::CommandSource)s
//! on background threads and processes incoming commands on the main
//! thread. Displays are registered by the display-enumeration collaborator
//! over the command socket; until then the topology is empty and every
//! activation fails with a logged error.
//!
//! The pointer backend shipped here only logs — wiring a real
//! [`PointerDriver`](gridjump::traits::PointerDriver) is the platform
//! integration's job.

use gridjump::command::Command;
use gridjump::config::Config;
use gridjump::coordinator::TopologyCoordinator;
use gridjump::ipc::listener::SocketListener;
use gridjump::traits::CommandSource;
use log::{error, info, warn};
use std::sync::mpsc;

use log_pointer::LogPointer;

/// Default socket path for the command listener.
fn default_socket_path() -> String {
    let runtime = std::env::var("XDG_RUNTIME_DIR").unwrap_or_else(|_| "/tmp".into());
    format!("{}/gridjump.sock", runtime)
}

/// Resolve the config directory (`$XDG_CONFIG_HOME/gridjump`).
fn config_dir() -> std::path::PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME").unwrap_or_else(|_| {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
        format!("{}/.config", home)
    });
    std::path::PathBuf::from(base).join("gridjump")
}

/// Try to load the config from `$XDG_CONFIG_HOME/gridjump/config.json`,
/// falling back to compiled-in defaults.
fn load_config() -> Config {
    let path = config_dir().join("config.json");
    match Config::load(&path) {
        Ok(cfg) => {
            info!("loaded config from {}", path.display());
            cfg
        }
        Err(e) => {
            info!("no config file ({}), using defaults", e);
            Config::default()
        }
    }
}

//  Logging pointer backend

mod log_pointer {
    use gridjump::geometry::{DisplayId, Point};
    use gridjump::traits::PointerDriver;
    use log::info;

    /// Stand-in pointer backend that logs instead of moving the pointer.
    pub struct LogPointer;

    #[derive(Debug, thiserror::Error)]
    #[error("log pointer error")]
    pub struct LogPointerError;

    impl PointerDriver for LogPointer {
        type Error = LogPointerError;

        fn move_to(&self, display: &DisplayId, point: Point) -> Result<(), LogPointerError> {
            info!("pointer -> {} on {}", point, display);
            Ok(())
        }

        fn click(&self) -> Result<(), LogPointerError> {
            info!("pointer click");
            Ok(())
        }
    }
}

//  Main

fn main() {
    env_logger::init();

    let config = load_config();

    let mut coordinator = TopologyCoordinator::new(LogPointer, config.engine);

    let (overlay_tx, overlay_rx) = mpsc::channel();
    coordinator.set_overlay(overlay_tx);
    let overlay_config = config.overlay.clone();
    std::thread::spawn(move || {
        gridjump::overlay::run_logger(overlay_rx, overlay_config);
    });

    let (cmd_tx, cmd_rx) = mpsc::channel::<Command>();
    spawn_command_sources(cmd_tx);

    info!("gridjump running; waiting for display registration");
    for cmd in cmd_rx {
        apply(&mut coordinator, cmd);
    }
    info!("all command sources closed, exiting");
}

/// Dispatch one command into the coordinator, logging failures.
///
/// Command errors never stop the daemon: a misbehaving collaborator gets
/// its mistake logged and the loop moves on.
fn apply(coordinator: &mut TopologyCoordinator<LogPointer>, cmd: Command) {
    match cmd {
        Command::RegisterDisplay { display, region } => {
            if let Err(e) = coordinator.register_display(display, region) {
                error!("register display failed: {}", e);
            }
        }

        Command::UpdateDisplay { display, region } => {
            if let Err(e) = coordinator.update_display(&display, region) {
                error!("update display failed: {}", e);
            }
        }

        Command::RemoveDisplay { display } => {
            if let Err(e) = coordinator.remove_display(&display) {
                warn!("remove display failed: {}", e);
            }
        }

        Command::Configure(update) => {
            let mut config = coordinator.config();
            if let Some(side) = update.target_cell_side {
                config.target_cell_side = side;
            }
            if let Some(scheme) = update.scheme {
                config.scheme = scheme;
            }
            if let Err(e) = coordinator.set_configuration(config) {
                error!("configuration rejected: {}", e);
            }
        }

        Command::ActivateGrid { display } => {
            if let Err(e) = coordinator.activate_grid(&display) {
                error!("grid activation failed: {}", e);
            }
        }

        Command::ActivateElements { display, targets } => {
            if let Err(e) = coordinator.activate_elements(&display, &targets) {
                error!("element activation failed: {}", e);
            }
        }

        Command::ActivateFreestyle => {
            if let Err(e) = coordinator.activate_freestyle() {
                error!("freestyle activation failed: {}", e);
            }
        }

        Command::Key(press) => {
            // Outcomes (including invalid sequences) are logged by the
            // coordinator; nothing to do with the return value here.
            coordinator.handle_key(&press);
        }

        Command::Cancel => coordinator.cancel_activation(),

        Command::Click => {
            if let Err(e) = coordinator.click() {
                warn!("click failed: {}", e);
            }
        }
    }
}

//  Helpers

fn spawn_command_sources(tx: mpsc::Sender<Command>) {
    let path = default_socket_path();
    std::thread::spawn(move || {
        let mut source = SocketListener::new(&path);
        if let Err(e) = source.run(tx) {
            error!("socket listener error: {}", e);
        }
    });
}
