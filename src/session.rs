//! Session environment detection
//!
//! Each bridge checks at startup that it matches the running session and
//! exits quickly otherwise, so a service manager can start both unit files
//! and let the wrong one self-select out.

use std::env;

use anyhow::{bail, Result};
use tracing::debug;

/// What the login session environment says about the compositor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionInfo {
    pub session_type: String,
    pub desktop: String,
}

impl SessionInfo {
    /// Read session facts from the standard XDG environment variables.
    #[must_use]
    pub fn detect() -> Self {
        let info = Self {
            session_type: env::var("XDG_SESSION_TYPE").unwrap_or_default(),
            desktop: env::var("XDG_CURRENT_DESKTOP").unwrap_or_default(),
        };
        debug!(
            "Session: type='{}', desktop='{}'",
            info.session_type, info.desktop
        );
        info
    }

    #[must_use]
    pub fn is_wayland(&self) -> bool {
        self.session_type.eq_ignore_ascii_case("wayland")
    }

    /// KDE Plasma sessions set `XDG_CURRENT_DESKTOP=KDE`, possibly in a
    /// colon-separated list.
    #[must_use]
    pub fn is_kde(&self) -> bool {
        self.desktop
            .split(':')
            .any(|d| d.eq_ignore_ascii_case("kde"))
    }

    /// Bail unless this is a Wayland session.
    pub fn require_wayland(&self) -> Result<()> {
        if self.is_wayland() {
            return Ok(());
        }
        bail!(
            "Not a Wayland session (XDG_SESSION_TYPE='{}'). \
             Both bridges require Wayland.",
            self.session_type
        )
    }

    /// Bail unless this is a KDE Plasma Wayland session.
    pub fn require_kde_wayland(&self) -> Result<()> {
        self.require_wayland()?;
        if self.is_kde() {
            return Ok(());
        }
        bail!(
            "Not a KDE Plasma session (XDG_CURRENT_DESKTOP='{}'). \
             Run the wlr bridge for wlroots-based compositors.",
            self.desktop
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(session_type: &str, desktop: &str) -> SessionInfo {
        SessionInfo {
            session_type: session_type.to_string(),
            desktop: desktop.to_string(),
        }
    }

    #[test]
    fn wayland_session_detected_case_insensitively() {
        assert!(session("wayland", "").is_wayland());
        assert!(session("Wayland", "").is_wayland());
        assert!(!session("x11", "").is_wayland());
        assert!(!session("", "").is_wayland());
    }

    #[test]
    fn kde_detected_in_colon_separated_list() {
        assert!(session("wayland", "KDE").is_kde());
        assert!(session("wayland", "kde").is_kde());
        assert!(session("wayland", "plasmashell:KDE").is_kde());
        assert!(!session("wayland", "sway").is_kde());
        assert!(!session("wayland", "GNOME").is_kde());
    }

    #[test]
    fn kde_wayland_requirement_rejects_x11_plasma() {
        assert!(session("x11", "KDE").require_kde_wayland().is_err());
        assert!(session("wayland", "KDE").require_kde_wayland().is_ok());
        assert!(session("wayland", "Hyprland").require_kde_wayland().is_err());
    }
}
