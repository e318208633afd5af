//! Window-context snapshot evaluated against match rules
//!
//! A `WindowContext` is rebuilt per keystroke from whatever the active bridge
//! currently reports plus the facts tied to the key event itself (device name,
//! lock-key LED states). The rule evaluator never mutates it.

/// Sentinel reported by a bridge before any focus event has arrived, and again
/// after the only known active window closes.
pub const NO_DATA: &str = "NO_DATA";

/// The fact set a rule is evaluated against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowContext {
    /// Application class of the focused window, if any is known.
    pub wm_class: Option<String>,
    /// Title of the focused window, if any is known.
    pub wm_name: Option<String>,
    /// Name of the physical input device generating the current key event.
    /// Always populated - it comes from the event, not from focus.
    pub device_name: String,
    pub numlock_on: bool,
    pub capslock_on: bool,
}

impl WindowContext {
    /// Build a context from a bridge reply plus per-event facts.
    ///
    /// Sentinel or empty bridge fields become `None`, so rules treat an
    /// unidentified window as guaranteed-non-matching rather than matching
    /// patterns against the sentinel text.
    pub fn from_bridge_reply(
        app_class: &str,
        title: &str,
        device_name: impl Into<String>,
        numlock_on: bool,
        capslock_on: bool,
    ) -> Self {
        Self {
            wm_class: known_field(app_class),
            wm_name: known_field(title),
            device_name: device_name.into(),
            numlock_on,
            capslock_on,
        }
    }
}

fn known_field(value: &str) -> Option<String> {
    if value.is_empty() || value == NO_DATA {
        None
    } else {
        Some(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinel_fields_become_none() {
        let ctx = WindowContext::from_bridge_reply(NO_DATA, "", "kbd", false, false);
        assert_eq!(ctx.wm_class, None);
        assert_eq!(ctx.wm_name, None);
        assert_eq!(ctx.device_name, "kbd");
    }

    #[test]
    fn real_fields_are_kept() {
        let ctx = WindowContext::from_bridge_reply("firefox", "GitHub", "kbd", true, false);
        assert_eq!(ctx.wm_class.as_deref(), Some("firefox"));
        assert_eq!(ctx.wm_name.as_deref(), Some("GitHub"));
        assert!(ctx.numlock_on);
    }
}
