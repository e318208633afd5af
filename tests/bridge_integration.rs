//! Integration tests for the wlroots toplevel tracker
//!
//! Drives the tracker through realistic compositor event sequences, including
//! interleaved events from multiple windows, and checks the focus facts it
//! would publish.

use kbctx::bridge::wlr::ToplevelTracker;
use kbctx::bridge::FocusEvent;
use pretty_assertions::assert_eq;

fn focused(app_id: &str, title: &str) -> FocusEvent {
    FocusEvent::Focused {
        app_id: app_id.to_string(),
        title: title.to_string(),
    }
}

#[test]
fn full_window_lifecycle() {
    let mut tracker = ToplevelTracker::new();

    // new -> app_id -> title -> activated
    tracker.on_new(7);
    assert_eq!(tracker.on_app_id(7, "kitty".to_string()), None);
    assert_eq!(tracker.on_title(7, "~/home".to_string()), None);
    assert_eq!(tracker.on_state(7, true), Some(focused("kitty", "~/home")));

    // Closing the only active window clears the fact instead of leaving the
    // stale "kitty" record
    assert_eq!(tracker.on_closed(7), Some(FocusEvent::Cleared));
}

#[test]
fn activation_moves_between_windows() {
    let mut tracker = ToplevelTracker::new();

    tracker.on_new(1);
    tracker.on_app_id(1, "kitty".to_string());
    tracker.on_title(1, "~".to_string());
    tracker.on_state(1, true);

    tracker.on_new(2);
    tracker.on_app_id(2, "firefox".to_string());
    tracker.on_title(2, "GitHub".to_string());

    // The compositor usually deactivates the old window first; that alone
    // must not clear or change the published fact
    assert_eq!(tracker.on_state(1, false), None);
    assert_eq!(tracker.on_state(2, true), Some(focused("firefox", "GitHub")));

    // Closing the previously focused window is now a no-op
    assert_eq!(tracker.on_closed(1), None);
}

#[test]
fn title_change_of_active_window_republishes() {
    let mut tracker = ToplevelTracker::new();

    tracker.on_new(3);
    tracker.on_app_id(3, "firefox".to_string());
    tracker.on_title(3, "GitHub".to_string());
    tracker.on_state(3, true);

    // Tab switch: same window, new title
    assert_eq!(
        tracker.on_title(3, "Rust Playground".to_string()),
        Some(focused("firefox", "Rust Playground"))
    );
}

#[test]
fn inactive_window_updates_are_silent() {
    let mut tracker = ToplevelTracker::new();

    tracker.on_new(1);
    tracker.on_app_id(1, "kitty".to_string());
    tracker.on_state(1, true);

    tracker.on_new(2);
    assert_eq!(tracker.on_app_id(2, "mpv".to_string()), None);
    assert_eq!(tracker.on_title(2, "video.mkv".to_string()), None);
    assert_eq!(tracker.on_closed(2), None);
}

#[test]
fn events_for_unannounced_handles_are_tolerated() {
    // Compositors may emit metadata before the manager's toplevel event is
    // processed; the tracker creates records lazily rather than dropping data
    let mut tracker = ToplevelTracker::new();
    assert_eq!(tracker.on_app_id(9, "kitty".to_string()), None);
    assert_eq!(tracker.on_state(9, true), Some(focused("kitty", "")));
}
