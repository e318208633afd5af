//! CLI commands
//!
//! One-shot commands: query the running bridge, install the KWin relay
//! script, and evaluate configured rules against a synthetic context. Config
//! validation is handled by `Config::print_summary` directly.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use crate::config::Config;
use crate::context::{WindowContext, NO_DATA};
use crate::ipc;
use crate::session::SessionInfo;

/// Query whichever bridge is running and print the active-window context.
///
/// # Errors
/// Returns an error when the session bus is unreachable. A missing bridge is
/// not an error, the reply degrades to the `NO_DATA` sentinel.
pub async fn query(json_output: bool) -> Result<()> {
    let conn = zbus::Connection::session()
        .await
        .context("Failed to connect to the session bus")?;
    let reply = ipc::query_active_window(&conn).await;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&reply)?);
        return Ok(());
    }

    if reply.app_class == NO_DATA && reply.title == NO_DATA {
        println!("No window context available (is a bridge running?)");
    } else {
        println!("Class: {}", reply.app_class);
        println!("Title: {}", reply.title);
    }
    Ok(())
}

/// Install, enable, and verify the KWin relay script without starting the
/// bridge daemon.
pub async fn install_kwin_script() -> Result<()> {
    SessionInfo::detect().require_kde_wayland()?;

    let conn = zbus::Connection::session()
        .await
        .context("Failed to connect to the session bus")?;
    crate::bridge::kwin::ensure_script_installed(&conn).await?;

    info!("KWin relay script installed and loaded");
    println!("Relay script installed and loaded");
    Ok(())
}

#[derive(Serialize)]
struct RuleResultJson {
    index: usize,
    label: Option<String>,
    matched: bool,
}

#[derive(Serialize)]
struct TestRuleJson {
    context: ContextJson,
    results: Vec<RuleResultJson>,
}

#[derive(Serialize)]
struct ContextJson {
    wm_class: Option<String>,
    wm_name: Option<String>,
    device_name: String,
    numlock_on: bool,
    capslock_on: bool,
}

/// Evaluate every configured rule against a synthetic window context.
pub fn test_rule(config: &Config, ctx: &WindowContext, json_output: bool) -> Result<()> {
    let results: Vec<RuleResultJson> = config
        .rules
        .iter()
        .enumerate()
        .map(|(index, rule)| RuleResultJson {
            index,
            label: rule.label.clone(),
            matched: rule.matches(ctx),
        })
        .collect();

    if json_output {
        let output = TestRuleJson {
            context: ContextJson {
                wm_class: ctx.wm_class.clone(),
                wm_name: ctx.wm_name.clone(),
                device_name: ctx.device_name.clone(),
                numlock_on: ctx.numlock_on,
                capslock_on: ctx.capslock_on,
            },
            results,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!(
        "Context: class={:?}, title={:?}, device='{}', numlock={}, capslock={}",
        ctx.wm_class, ctx.wm_name, ctx.device_name, ctx.numlock_on, ctx.capslock_on
    );
    println!();

    let mut matched_count = 0;
    for result in &results {
        let marker = if result.matched { "MATCH" } else { "     " };
        let label = result.label.as_deref().unwrap_or("(unlabeled)");
        println!("  [{marker}] rule {}: {label}", result.index);
        if result.matched {
            matched_count += 1;
        }
    }

    println!();
    println!("{matched_count} of {} rules matched", results.len());
    Ok(())
}
