//! Command-line interface definitions
//!
//! Uses clap for argument parsing with derive macros.

use clap::{Parser, Subcommand};

/// kbctx - keyboard window-context bridges
///
/// Publish the active-window context that keyboard remapping rules match on.
#[derive(Parser)]
#[command(name = "kbctx")]
#[command(version)]
#[command(about = "Window-context bridges and rule engine for keyboard remapping")]
#[command(after_help = "\
BEHAVIOR:
  - A bridge daemon tracks the active window and serves it over D-Bus
  - Remapping rules match on window class, title, device name, and lock LEDs
  - Both bridges expose the same interface, consumers never care which runs
  - Queries answer immediately; before any focus event they return NO_DATA

BRIDGE DAEMONS:
  kbctx wlr-bridge         For wlroots compositors (Sway, Hyprland, Niri, ...)
  kbctx kwin-bridge        For KDE Plasma Wayland (installs a KWin script)

QUERY COMMANDS:
  kbctx query              Show the current active-window context
  kbctx validate           Validate config file (local, no daemon needed)

TEST COMMANDS:
  kbctx test-rule          Evaluate configured rules against a synthetic context

D-BUS NAMES:
  org.kbctx.Wlroots at /org/kbctx/Wlroots
  org.kbctx.Plasma  at /org/kbctx/Plasma
  Shared interface: org.kbctx.WindowContext")]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available subcommands
#[derive(Subcommand)]
pub enum Command {
    /// Run the wlroots bridge daemon (foreign-toplevel protocol client)
    WlrBridge,

    /// Run the KWin bridge daemon (relay-script D-Bus receiver)
    KwinBridge,

    /// Install and enable the KWin relay script without starting the daemon
    InstallKwinScript,

    /// Query the running bridge for the active window
    Query {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Validate config file and print a summary
    Validate,

    /// Evaluate all configured rules against a synthetic window context
    TestRule {
        /// Window class (omit to simulate an unidentified class)
        #[arg(long)]
        class: Option<String>,

        /// Window title (omit to simulate an unidentified title)
        #[arg(long)]
        title: Option<String>,

        /// Keyboard device name
        #[arg(long, default_value = "Generic USB Keyboard")]
        device: String,

        /// NumLock LED state
        #[arg(long)]
        numlock: bool,

        /// CapsLock LED state
        #[arg(long)]
        capslock: bool,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
}
