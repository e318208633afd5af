//! Desktop notifications
//!
//! Used sparingly: only for conditions the user must act on, like a relay
//! script that never loaded. A failed notification is logged and ignored, the
//! daemon never dies because a notification server is missing.

use notify_rust::Notification;
use tracing::warn;

pub fn notify_error(summary: &str, body: &str) {
    let result = Notification::new()
        .appname("kbctx")
        .summary(summary)
        .body(body)
        .icon("input-keyboard")
        .show();
    if let Err(e) = result {
        warn!("Failed to send notification: {}", e);
    }
}
