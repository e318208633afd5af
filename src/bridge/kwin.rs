//! KWin relay-script packaging and installation
//!
//! KWin exposes no window-management Wayland protocol, so the bridge injects
//! a small script into the compositor that calls back over D-Bus on every
//! window activation. The package is embedded in the binary, staged to a
//! temporary directory, and handed to `kpackagetool`; installation is skipped
//! when the installed copy is byte-identical.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use tracing::{debug, info, warn};

/// Package id, also the kwinrc plugin key and the installed directory name.
pub const SCRIPT_NAME: &str = "kbctx-notify-active-window";

const SCRIPT_MAIN_JS: &str = include_str!("../../resources/kwin-script/main.js");
const SCRIPT_METADATA: &str = include_str!("../../resources/kwin-script/metadata.json");

/// How many times to poll `isScriptLoaded` before giving up, and how long to
/// wait between polls. KWin reloads scripts asynchronously after
/// `reconfigure`, usually within a second or two.
const VERIFY_MAX_ATTEMPTS: u32 = 6;
const VERIFY_INTERVAL: Duration = Duration::from_secs(2);

/// Write the package layout `kpackagetool` expects into `dir`.
///
/// ```text
/// dir/
///   metadata.json
///   contents/code/main.js
/// ```
pub fn stage_package(dir: &Path) -> Result<()> {
    let code_dir = dir.join("contents").join("code");
    fs::create_dir_all(&code_dir)
        .with_context(|| format!("Failed to create {}", code_dir.display()))?;
    fs::write(dir.join("metadata.json"), SCRIPT_METADATA)
        .context("Failed to write metadata.json")?;
    fs::write(code_dir.join("main.js"), SCRIPT_MAIN_JS).context("Failed to write main.js")?;
    Ok(())
}

/// Where `kpackagetool` installs KWin scripts for this user.
fn installed_package_dir() -> Result<PathBuf> {
    let data_dir = dirs::data_dir().context("Could not determine XDG data directory")?;
    Ok(data_dir.join("kwin").join("scripts").join(SCRIPT_NAME))
}

/// Compare the installed package against the embedded one, byte for byte.
///
/// Any read failure (not installed yet, partial install, permission trouble)
/// counts as "not current" and triggers a reinstall.
pub fn package_matches_installed(installed_dir: &Path) -> bool {
    let metadata_matches = fs::read_to_string(installed_dir.join("metadata.json"))
        .map(|s| s == SCRIPT_METADATA)
        .unwrap_or(false);
    let main_js_matches =
        fs::read_to_string(installed_dir.join("contents").join("code").join("main.js"))
            .map(|s| s == SCRIPT_MAIN_JS)
            .unwrap_or(false);
    metadata_matches && main_js_matches
}

/// Run the first available variant of a KDE CLI tool (KDE 6 name first).
///
/// Plasma 6 renamed the tools with a `6` suffix while Plasma 5 installs keep
/// the `5` suffix, so both are tried before failing.
fn run_kde_tool(names: &[&str], args: &[&str]) -> Result<()> {
    for name in names {
        let output = match Command::new(name).args(args).output() {
            Ok(output) => output,
            Err(e) if e.kind() == ErrorKind::NotFound => continue,
            Err(e) => return Err(e).with_context(|| format!("Failed to run {name}")),
        };
        if output.status.success() {
            debug!("{} {} succeeded", name, args.join(" "));
            return Ok(());
        }
        bail!(
            "{} {} failed: {}",
            name,
            args.join(" "),
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }
    bail!(
        "None of {} found in PATH. Is this a KDE Plasma session?",
        names.join(", ")
    )
}

/// Install or upgrade the relay script package via `kpackagetool`.
fn install_package() -> Result<()> {
    let staging = tempfile::tempdir().context("Failed to create staging directory")?;
    stage_package(staging.path())?;

    let already_present = installed_package_dir()?.exists();
    let mode = if already_present { "-u" } else { "-i" };
    let path = staging.path().to_string_lossy().to_string();

    run_kde_tool(
        &["kpackagetool6", "kpackagetool5"],
        &["-t", "KWin/Script", mode, path.as_str()],
    )?;
    info!(
        "{} relay script package",
        if already_present { "Upgraded" } else { "Installed" }
    );
    Ok(())
}

/// Mark the script enabled in kwinrc so KWin loads it on reconfigure.
fn enable_script() -> Result<()> {
    let key = format!("{SCRIPT_NAME}Enabled");
    run_kde_tool(
        &["kwriteconfig6", "kwriteconfig5"],
        &["--file", "kwinrc", "--group", "Plugins", "--key", &key, "true"],
    )
}

/// Ask KWin to reread its configuration, which (re)loads enabled scripts.
async fn reconfigure(conn: &zbus::Connection) -> Result<()> {
    conn.call_method(
        Some("org.kde.KWin"),
        "/KWin",
        Some("org.kde.KWin"),
        "reconfigure",
        &(),
    )
    .await
    .context("Failed to call org.kde.KWin.reconfigure")?;
    Ok(())
}

/// Ask KWin's scripting interface whether the relay script is loaded.
async fn is_script_loaded(conn: &zbus::Connection) -> Result<bool> {
    let reply = conn
        .call_method(
            Some("org.kde.KWin"),
            "/Scripting",
            Some("org.kde.kwin.Scripting"),
            "isScriptLoaded",
            &SCRIPT_NAME,
        )
        .await
        .context("Failed to call org.kde.kwin.Scripting.isScriptLoaded")?;
    reply
        .body()
        .deserialize()
        .context("Unexpected isScriptLoaded reply")
}

/// Install, enable, and verify the relay script. Idempotent.
///
/// When the installed package already matches the embedded one the
/// kpackagetool step is skipped, but enablement and the load check still run:
/// the package being on disk says nothing about whether KWin loaded it.
///
/// # Errors
///
/// Returns an error when no kpackagetool/kwriteconfig variant exists, when
/// they report failure, or when KWin never reports the script loaded within
/// the polling window. In the last case the bridge still serves queries, it
/// just answers with the sentinel until a session restart loads the script.
pub async fn ensure_script_installed(conn: &zbus::Connection) -> Result<()> {
    let installed_dir = installed_package_dir()?;
    if package_matches_installed(&installed_dir) {
        debug!("Relay script package already current, skipping install");
    } else {
        install_package()?;
    }

    enable_script()?;

    for attempt in 1..=VERIFY_MAX_ATTEMPTS {
        reconfigure(conn).await?;
        tokio::time::sleep(VERIFY_INTERVAL).await;
        match is_script_loaded(conn).await {
            Ok(true) => {
                info!("Relay script loaded (attempt {})", attempt);
                return Ok(());
            }
            Ok(false) => debug!(
                "Relay script not loaded yet (attempt {}/{})",
                attempt, VERIFY_MAX_ATTEMPTS
            ),
            Err(e) => warn!("Script load check failed: {:#}", e),
        }
    }

    bail!(
        "KWin never reported the relay script loaded after {} attempts. \
         Window context will be unavailable until the script loads \
         (try logging out and back in).",
        VERIFY_MAX_ATTEMPTS
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn staged_package_has_expected_layout() {
        let dir = tempfile::tempdir().unwrap();
        stage_package(dir.path()).unwrap();

        assert!(dir.path().join("metadata.json").is_file());
        assert!(dir
            .path()
            .join("contents")
            .join("code")
            .join("main.js")
            .is_file());
    }

    #[test]
    fn staged_package_matches_itself() {
        let dir = tempfile::tempdir().unwrap();
        stage_package(dir.path()).unwrap();
        assert!(package_matches_installed(dir.path()));
    }

    #[test]
    fn missing_install_does_not_match() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!package_matches_installed(&dir.path().join("nonexistent")));
    }

    #[test]
    fn modified_install_does_not_match() {
        let dir = tempfile::tempdir().unwrap();
        stage_package(dir.path()).unwrap();
        fs::write(dir.path().join("metadata.json"), "{}").unwrap();
        assert!(!package_matches_installed(dir.path()));
    }

    #[test]
    fn embedded_metadata_names_the_package() {
        assert!(SCRIPT_METADATA.contains(SCRIPT_NAME));
        assert!(SCRIPT_MAIN_JS.contains("NotifyActiveWindow"));
    }
}
