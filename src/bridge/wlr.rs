//! wlr-foreign-toplevel-management protocol client
//!
//! Maintains a per-handle window table and reports which window currently
//! holds the "activated" state bit. Supported by Sway, Hyprland, Wayfire,
//! River, labwc, dwl, hikari, Niri, and other wlroots-based compositors.

use anyhow::{Context, Result};
use std::collections::HashMap;
use tokio::sync::mpsc;
use tracing::{debug, trace, warn};
use wayland_client::{
    globals::{registry_queue_init, GlobalListContents},
    protocol::{wl_output, wl_registry, wl_seat},
    Connection, Dispatch, Proxy, QueueHandle,
};
use wayland_protocols_wlr::foreign_toplevel::v1::client::{
    zwlr_foreign_toplevel_handle_v1::{self, ZwlrForeignToplevelHandleV1},
    zwlr_foreign_toplevel_manager_v1::{self, ZwlrForeignToplevelManagerV1},
};

use super::FocusEvent;

/// Per-handle bookkeeping, separated from protocol dispatch so the event
/// ordering semantics can be tested without a compositor.
#[derive(Debug, Default)]
pub struct ToplevelTracker {
    /// Tracked toplevels (handle protocol id -> window state). Created
    /// lazily on the first event naming a handle, removed on `closed`.
    toplevels: HashMap<u32, Toplevel>,
    /// The handle currently holding the activated bit, if any. A new
    /// activation supersedes the previous one with no explicit deactivation.
    active: Option<u32>,
}

#[derive(Debug, Default)]
struct Toplevel {
    app_id: String,
    title: String,
}

impl ToplevelTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A new toplevel was advertised by the manager.
    pub fn on_new(&mut self, handle: u32) {
        trace!("New toplevel handle: {}", handle);
        self.toplevels.entry(handle).or_default();
    }

    /// The handle's application id changed.
    pub fn on_app_id(&mut self, handle: u32, app_id: String) -> Option<FocusEvent> {
        trace!("Toplevel {} app_id: {}", handle, app_id);
        self.toplevels.entry(handle).or_default().app_id = app_id;
        self.focused_if_active(handle)
    }

    /// The handle's title changed.
    pub fn on_title(&mut self, handle: u32, title: String) -> Option<FocusEvent> {
        trace!("Toplevel {} title: {}", handle, title);
        self.toplevels.entry(handle).or_default().title = title;
        self.focused_if_active(handle)
    }

    /// The handle's state array changed; only the activated bit is consulted.
    /// Losing the bit is not a deactivation - the fact stands until another
    /// window activates or the active one closes.
    pub fn on_state(&mut self, handle: u32, activated: bool) -> Option<FocusEvent> {
        if !activated {
            return None;
        }
        if self.active != Some(handle) {
            debug!("Toplevel {} activated", handle);
        }
        self.active = Some(handle);
        let window = self.toplevels.entry(handle).or_default();
        Some(FocusEvent::Focused {
            app_id: window.app_id.clone(),
            title: window.title.clone(),
        })
    }

    /// The handle is gone. If it was the active one and no other window is
    /// known to be active, the active-window fact reverts to "no data".
    pub fn on_closed(&mut self, handle: u32) -> Option<FocusEvent> {
        debug!("Toplevel {} closed", handle);
        self.toplevels.remove(&handle);
        if self.active == Some(handle) {
            self.active = None;
            Some(FocusEvent::Cleared)
        } else {
            None
        }
    }

    fn focused_if_active(&self, handle: u32) -> Option<FocusEvent> {
        if self.active != Some(handle) {
            return None;
        }
        let window = self.toplevels.get(&handle)?;
        Some(FocusEvent::Focused {
            app_id: window.app_id.clone(),
            title: window.title.clone(),
        })
    }
}

/// Dispatch state for the Wayland event queue.
struct WlrBridgeState {
    tx: mpsc::UnboundedSender<FocusEvent>,
    tracker: ToplevelTracker,
}

impl WlrBridgeState {
    fn send(&self, event: Option<FocusEvent>) {
        if let Some(event) = event {
            if let Err(e) = self.tx.send(event) {
                warn!("Failed to send focus event (receiver dropped): {}", e);
            }
        }
    }
}

impl Dispatch<ZwlrForeignToplevelManagerV1, ()> for WlrBridgeState {
    fn event(
        state: &mut Self,
        _proxy: &ZwlrForeignToplevelManagerV1,
        event: zwlr_foreign_toplevel_manager_v1::Event,
        _data: &(),
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
    ) {
        use zwlr_foreign_toplevel_manager_v1::Event;

        match event {
            Event::Toplevel { toplevel } => {
                state.tracker.on_new(toplevel.id().protocol_id());
            }
            Event::Finished => {
                debug!("Toplevel manager finished");
            }
            _ => {}
        }
    }

    wayland_client::event_created_child!(WlrBridgeState, ZwlrForeignToplevelManagerV1, [
        zwlr_foreign_toplevel_manager_v1::EVT_TOPLEVEL_OPCODE => (ZwlrForeignToplevelHandleV1, ())
    ]);
}

impl Dispatch<ZwlrForeignToplevelHandleV1, ()> for WlrBridgeState {
    fn event(
        state: &mut Self,
        proxy: &ZwlrForeignToplevelHandleV1,
        event: zwlr_foreign_toplevel_handle_v1::Event,
        _data: &(),
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
    ) {
        use zwlr_foreign_toplevel_handle_v1::Event;

        let handle = proxy.id().protocol_id();

        match event {
            Event::AppId { app_id } => {
                let update = state.tracker.on_app_id(handle, app_id);
                state.send(update);
            }
            Event::Title { title } => {
                let update = state.tracker.on_title(handle, title);
                state.send(update);
            }
            Event::State { state: bits } => {
                let update = state.tracker.on_state(handle, state_has_activated(&bits));
                state.send(update);
            }
            Event::Closed => {
                let update = state.tracker.on_closed(handle);
                state.send(update);
            }
            Event::Done => {
                // Property batches are applied as they arrive; nothing to
                // flush here.
                trace!("Toplevel {} done", handle);
            }
            Event::OutputEnter { output: _ } | Event::OutputLeave { output: _ } => {
                trace!("Toplevel {} output change ignored", handle);
            }
            Event::Parent { .. } => {
                trace!("Toplevel {} parent change ignored", handle);
            }
            _ => {}
        }
    }
}

// Stub implementations required by the event queue for registry/output/seat
// objects we never listen to.
impl Dispatch<wl_registry::WlRegistry, GlobalListContents> for WlrBridgeState {
    fn event(
        _state: &mut Self,
        _proxy: &wl_registry::WlRegistry,
        _event: wl_registry::Event,
        _data: &GlobalListContents,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
    ) {
    }
}

impl Dispatch<wl_output::WlOutput, ()> for WlrBridgeState {
    fn event(
        _state: &mut Self,
        _proxy: &wl_output::WlOutput,
        _event: wl_output::Event,
        _data: &(),
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
    ) {
    }
}

impl Dispatch<wl_seat::WlSeat, ()> for WlrBridgeState {
    fn event(
        _state: &mut Self,
        _proxy: &wl_seat::WlSeat,
        _event: wl_seat::Event,
        _data: &(),
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
    ) {
    }
}

/// Decode the wire-format state array (native-endian u32s) and report whether
/// the activated bit is present.
fn state_has_activated(state: &[u8]) -> bool {
    let activated = zwlr_foreign_toplevel_handle_v1::State::Activated as u32;
    state.chunks_exact(4).any(|chunk| {
        let mut bytes = [0u8; 4];
        bytes.copy_from_slice(chunk);
        u32::from_ne_bytes(bytes) == activated
    })
}

/// Run the Wayland event loop for wlr-foreign-toplevel-management.
///
/// Runs on a dedicated thread and dispatches protocol events until the
/// compositor disconnects or the event receiver is dropped.
pub fn run_event_loop(conn: Connection, tx: mpsc::UnboundedSender<FocusEvent>) -> Result<()> {
    let (globals, mut event_queue) = registry_queue_init::<WlrBridgeState>(&conn)
        .context("Failed to initialize Wayland registry")?;

    let qh = event_queue.handle();

    let _manager: ZwlrForeignToplevelManagerV1 = globals
        .bind(&qh, 1..=3, ())
        .context("zwlr_foreign_toplevel_manager_v1 protocol not available")?;

    debug!("Bound wlr-foreign-toplevel-management");

    let mut state = WlrBridgeState {
        tx,
        tracker: ToplevelTracker::new(),
    };

    loop {
        match event_queue.blocking_dispatch(&mut state) {
            Ok(_) => {
                if state.tx.is_closed() {
                    debug!("Event receiver dropped, shutting down Wayland thread");
                    return Ok(());
                }
            }
            Err(e) => {
                debug!("Wayland event dispatch ended: {}", e);
                return Err(e).context("Wayland event dispatch failed");
            }
        }
    }
}
