//! Bridge daemons
//!
//! Each bridge runs one long-lived event loop: own the D-Bus service object,
//! feed it focus facts from its compositor source, and answer
//! `GetActiveWindow` queries until shutdown. Both serve the identical
//! interface, so consumers never care which one is running.

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info, warn};

use crate::bridge::{self, kwin, FocusEvent};
use crate::config::Config;
use crate::ipc::{
    ContextService, KWIN_BUS_NAME, KWIN_OBJECT_PATH, WLR_BUS_NAME, WLR_OBJECT_PATH,
};
use crate::notification::notify_error;
use crate::session::SessionInfo;

/// Initialize logging with the configured log level.
///
/// Filter format: "kbctx=LEVEL" ensures only our crate logs at the configured
/// level; RUST_LOG still overrides when set.
fn init_logging(config: &Config) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(format!("kbctx={}", config.settings.log_level))
    });

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Claim a bus name and serve the context interface at `path`.
async fn serve_context(bus_name: &str, path: &str) -> Result<zbus::Connection> {
    zbus::connection::Builder::session()
        .context("Failed to connect to the session bus")?
        .serve_at(path, ContextService::default())
        .context("Failed to register the context service object")?
        .name(bus_name.to_string())
        .with_context(|| format!("Failed to claim bus name {bus_name} (already running?)"))?
        .build()
        .await
        .context("Failed to set up the D-Bus service")
}

fn notify_ready() {
    // No-op outside a systemd unit
    let _ = sd_notify::notify(false, &[sd_notify::NotifyState::Ready]);
}

/// Run the wlroots bridge daemon.
pub async fn run_wlr_bridge(config: Config) -> Result<()> {
    init_logging(&config);

    info!("Starting wlroots window-context bridge");
    SessionInfo::detect().require_wayland()?;

    let mut focus_events = bridge::spawn_compositor_thread()?;
    info!("Compositor event thread started");

    let conn = serve_context(WLR_BUS_NAME, WLR_OBJECT_PATH).await?;
    info!("Serving {} at {}", WLR_BUS_NAME, WLR_OBJECT_PATH);

    notify_ready();

    loop {
        tokio::select! {
            result = focus_events.recv() => {
                match result {
                    Some(event) => apply_focus_event(&conn, event).await?,
                    None => {
                        error!("Compositor event thread exited");
                        anyhow::bail!("Lost connection to the compositor");
                    }
                }
            }

            _ = signal::ctrl_c() => {
                info!("Shutting down");
                break;
            }
        }
    }

    Ok(())
}

/// Apply one focus event to the served context object.
async fn apply_focus_event(conn: &zbus::Connection, event: FocusEvent) -> Result<()> {
    let iface = conn
        .object_server()
        .interface::<_, ContextService>(WLR_OBJECT_PATH)
        .await
        .context("Context service object disappeared")?;

    match event {
        FocusEvent::Focused { app_id, title } => {
            iface.get_mut().await.set_active(&app_id, &title);
        }
        FocusEvent::Cleared => {
            iface.get_mut().await.clear_active();
        }
    }
    Ok(())
}

/// Run the KWin bridge daemon.
///
/// The compositor source here is the relay script: it pushes
/// `NotifyActiveWindow` calls straight into the served object, so the loop
/// itself only waits for shutdown. Script installation failure degrades to
/// serving the sentinel rather than exiting, a restart of the Plasma session
/// usually resolves it.
pub async fn run_kwin_bridge(config: Config) -> Result<()> {
    init_logging(&config);

    info!("Starting KWin window-context bridge");
    SessionInfo::detect().require_kde_wayland()?;

    let conn = serve_context(KWIN_BUS_NAME, KWIN_OBJECT_PATH).await?;
    info!("Serving {} at {}", KWIN_BUS_NAME, KWIN_OBJECT_PATH);

    if let Err(e) = kwin::ensure_script_installed(&conn).await {
        warn!("Relay script setup failed: {:#}", e);
        notify_error(
            "kbctx: KWin script not loaded",
            "Window context queries will return no data until the relay \
             script loads. Try logging out and back in.",
        );
    }

    notify_ready();

    signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;
    info!("Shutting down");

    Ok(())
}
