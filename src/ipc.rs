//! D-Bus context query service
//!
//! Both bridges expose the same `org.kbctx.WindowContext` interface, so the
//! remapping engine is polymorphic over whichever bridge is running. The KWin
//! bridge additionally accepts `NotifyActiveWindow` pushes from the relay
//! script running inside the compositor.

use tracing::{debug, trace};
use zbus::zvariant::{DeserializeDict, SerializeDict, Type};

use crate::context::NO_DATA;

/// Bus name and object path for the KWin bridge.
pub const KWIN_BUS_NAME: &str = "org.kbctx.Plasma";
pub const KWIN_OBJECT_PATH: &str = "/org/kbctx/Plasma";

/// Bus name and object path for the wlroots bridge.
pub const WLR_BUS_NAME: &str = "org.kbctx.Wlroots";
pub const WLR_OBJECT_PATH: &str = "/org/kbctx/Wlroots";

/// Reply to `GetActiveWindow`, marshalled as `a{sv}`.
#[derive(Debug, Clone, SerializeDict, DeserializeDict, Type)]
#[zvariant(signature = "a{sv}")]
pub struct ActiveWindowReply {
    pub app_class: String,
    pub title: String,
}

impl ActiveWindowReply {
    /// The defined "no data yet observed" reply. Returned instead of blocking
    /// or erroring when no focus event has ever arrived, and again after the
    /// only known active window closes.
    #[must_use]
    pub fn no_data() -> Self {
        Self {
            app_class: NO_DATA.to_string(),
            title: NO_DATA.to_string(),
        }
    }
}

/// The shared service object behind both bridges.
///
/// Owned by the bridge's event loop; the loop is the only writer, through the
/// object server's interface handle, so queries never observe a half-applied
/// update.
pub struct ContextService {
    app_class: String,
    title: String,
    /// Resource name reported by the KWin script, kept for log output only.
    resource_name: String,
}

impl Default for ContextService {
    fn default() -> Self {
        Self {
            app_class: NO_DATA.to_string(),
            title: NO_DATA.to_string(),
            resource_name: NO_DATA.to_string(),
        }
    }
}

impl ContextService {
    /// Replace the active-window fact (last-write-wins).
    pub fn set_active(&mut self, app_class: &str, title: &str) {
        trace!("Active window: class='{}', title='{}'", app_class, title);
        self.app_class = app_class.to_string();
        self.title = title.to_string();
    }

    /// Revert to the no-data sentinel (the active window closed with nothing
    /// to replace it).
    pub fn clear_active(&mut self) {
        debug!("Active window closed with no replacement, reverting to sentinel");
        self.app_class = NO_DATA.to_string();
        self.title = NO_DATA.to_string();
        self.resource_name = NO_DATA.to_string();
    }
}

#[zbus::interface(name = "org.kbctx.WindowContext")]
impl ContextService {
    /// Query the current active-window fact. Idempotent and side-effect-free.
    async fn get_active_window(&self) -> ActiveWindowReply {
        ActiveWindowReply {
            app_class: self.app_class.clone(),
            title: self.title.clone(),
        }
    }

    /// Push endpoint for the KWin relay script. Argument order matches the
    /// script's `callDBus` invocation: caption first.
    async fn notify_active_window(
        &mut self,
        caption: String,
        resource_class: String,
        resource_name: String,
    ) {
        trace!(
            "NotifyActiveWindow: caption='{}', class='{}', name='{}'",
            caption,
            resource_class,
            resource_name
        );
        self.app_class = resource_class;
        self.title = caption;
        self.resource_name = resource_name;
    }
}

#[zbus::proxy(interface = "org.kbctx.WindowContext", gen_blocking = false)]
pub trait WindowContext {
    fn get_active_window(&self) -> zbus::Result<ActiveWindowReply>;
}

/// Query whichever bridge is up, wlroots first.
///
/// IPC failures (no bridge running, transient bus trouble) degrade to the
/// sentinel reply so the caller treats the context as unidentified instead of
/// erroring; the caller simply retries on the next keystroke.
pub async fn query_active_window(conn: &zbus::Connection) -> ActiveWindowReply {
    for (bus_name, path) in [
        (WLR_BUS_NAME, WLR_OBJECT_PATH),
        (KWIN_BUS_NAME, KWIN_OBJECT_PATH),
    ] {
        match query_bridge(conn, bus_name, path).await {
            Ok(reply) => return reply,
            Err(e) => debug!("No answer from {}: {}", bus_name, e),
        }
    }
    ActiveWindowReply::no_data()
}

async fn query_bridge(
    conn: &zbus::Connection,
    bus_name: &str,
    path: &str,
) -> zbus::Result<ActiveWindowReply> {
    let proxy = WindowContextProxy::builder(conn)
        .destination(bus_name.to_string())?
        .path(path.to_string())?
        .build()
        .await?;
    proxy.get_active_window().await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_starts_with_sentinel() {
        let service = ContextService::default();
        assert_eq!(service.app_class, NO_DATA);
        assert_eq!(service.title, NO_DATA);
    }

    #[test]
    fn set_active_is_last_write_wins() {
        let mut service = ContextService::default();
        service.set_active("kitty", "~/home");
        service.set_active("firefox", "GitHub");
        assert_eq!(service.app_class, "firefox");
        assert_eq!(service.title, "GitHub");
    }

    #[test]
    fn clear_active_reverts_to_sentinel_not_stale_data() {
        let mut service = ContextService::default();
        service.set_active("kitty", "~/home");
        service.clear_active();
        assert_eq!(service.app_class, NO_DATA);
        assert_eq!(service.title, NO_DATA);
    }
}
