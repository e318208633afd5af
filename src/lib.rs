//! kbctx - keyboard window-context bridges
//!
//! Publishes the "what window is active" facts that keyboard remapping rules
//! match on, across Wayland compositors that expose no common window API.
//!
//! # Features
//! - Predicate rules over window class, title, device name, and lock LEDs,
//!   compiled once at config load
//! - wlroots bridge: `zwlr_foreign_toplevel_manager_v1` protocol client
//! - KWin bridge: injected compositor script relaying over D-Bus
//! - One shared `org.kbctx.WindowContext` query interface for both bridges
//!
//! # Supported Compositors
//! - Sway, Hyprland, Niri, River, Wayfire, labwc, dwl, hikari (via wlr-foreign-toplevel)
//! - KDE Plasma/KWin (via the relay script)

pub mod bridge;
pub mod cli;
pub mod commands;
pub mod config;
pub mod context;
pub mod daemon;
pub mod ipc;
pub mod keystate;
pub mod notification;
pub mod rules;
pub mod session;

// Re-export commonly used types for convenience
pub use cli::Args;
pub use config::Config;
pub use context::WindowContext;
pub use rules::{CompiledRule, MatchRule};
