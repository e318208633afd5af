//! Compositor bridges
//!
//! Translate compositor-native focus notifications into the window-context
//! query contract. Two bridges exist: a Wayland protocol client for
//! wlroots-based compositors ([`wlr`]) and a KWin relay-script installer for
//! KDE Plasma ([`kwin`]). Only one runs per session.

pub mod kwin;
pub mod wlr;

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tracing::{error, info};
use wayland_client::{globals::registry_queue_init, protocol::wl_registry, Connection};

/// Focus change reported by a compositor bridge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FocusEvent {
    /// A window became the active one, or the active window's metadata
    /// changed. Last write wins.
    Focused { app_id: String, title: String },
    /// The active window closed with nothing to replace it.
    Cleared,
}

/// Spawn a dedicated thread for Wayland protocol dispatch.
///
/// Connects to the Wayland display, verifies that the foreign-toplevel
/// manager global is advertised, and spawns a thread running the protocol
/// event loop. Focus events are sent back over an unbounded mpsc channel and
/// applied in arrival order by the caller's event loop.
///
/// # Errors
///
/// Returns an error when no Wayland display is reachable, or when the
/// compositor never advertises `zwlr_foreign_toplevel_manager_v1` in the
/// initial registry roundtrip - that environment is unsupported and the
/// bridge should exit rather than wait forever.
pub fn spawn_compositor_thread() -> Result<mpsc::UnboundedReceiver<FocusEvent>> {
    let conn = Connection::connect_to_env()
        .context("Failed to connect to Wayland display. Is a Wayland compositor running?")?;

    info!("Connected to Wayland display");

    detect_toplevel_manager(&conn)?;

    let (tx, rx) = mpsc::unbounded_channel();

    std::thread::spawn(move || {
        if let Err(e) = wlr::run_event_loop(conn, tx) {
            error!("Wayland event loop error: {:#}", e);
        }
    });

    Ok(rx)
}

/// Check the registry for the foreign-toplevel manager global.
///
/// One bounded roundtrip: after it, the compositor has advertised every
/// global it has, so absence means the protocol is unsupported.
fn detect_toplevel_manager(conn: &Connection) -> Result<()> {
    use wayland_client::globals::GlobalListContents;

    #[derive(Default)]
    struct RegistryState;

    impl wayland_client::Dispatch<wl_registry::WlRegistry, GlobalListContents> for RegistryState {
        fn event(
            _state: &mut Self,
            _proxy: &wl_registry::WlRegistry,
            _event: wl_registry::Event,
            _data: &GlobalListContents,
            _conn: &Connection,
            _qh: &wayland_client::QueueHandle<Self>,
        ) {
            // Globals are collected by the GlobalList itself
        }
    }

    let (globals, mut event_queue) = registry_queue_init::<RegistryState>(conn)
        .context("Failed to initialize Wayland registry")?;

    let mut state = RegistryState;
    event_queue
        .roundtrip(&mut state)
        .context("Failed to roundtrip registry")?;

    let mut found = false;
    globals.contents().with_list(|list| {
        for global in list {
            if global.interface == "zwlr_foreign_toplevel_manager_v1" {
                found = true;
            }
        }
    });

    if found {
        return Ok(());
    }

    anyhow::bail!(
        "Compositor does not advertise zwlr_foreign_toplevel_manager_v1.\n\
         \n\
         This bridge supports wlroots-based compositors (Sway, Hyprland, Niri,\n\
         River, Wayfire, labwc, dwl, hikari). For KDE Plasma run the kwin\n\
         bridge instead. GNOME/Mutter exposes no window management protocol\n\
         and is not supported."
    )
}
