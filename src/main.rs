//! kbctx binary entry point
//!
//! Dispatches to a bridge daemon or a one-shot subcommand based on CLI
//! arguments.

use anyhow::Result;
use clap::Parser;
use kbctx::cli::{Args, Command};
use kbctx::config::Config;
use kbctx::context::WindowContext;
use kbctx::{commands, daemon};

/// Initialize logging for one-shot commands.
///
/// Bridge daemons initialize their own logging after loading the config, so
/// the configured log level is respected.
fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    match args.command {
        // No subcommand - show the current context
        None => {
            init_logging();
            commands::query(false).await
        }

        Some(Command::WlrBridge) => {
            let config = Config::load()?;
            daemon::run_wlr_bridge(config).await
        }

        Some(Command::KwinBridge) => {
            let config = Config::load()?;
            daemon::run_kwin_bridge(config).await
        }

        Some(Command::InstallKwinScript) => {
            init_logging();
            commands::install_kwin_script().await
        }

        Some(Command::Query { json }) => {
            init_logging();
            commands::query(json).await
        }

        Some(Command::Validate) => {
            init_logging();
            let config = Config::load()?;
            config.print_summary();
            Ok(())
        }

        Some(Command::TestRule {
            class,
            title,
            device,
            numlock,
            capslock,
            json,
        }) => {
            init_logging();
            let config = Config::load()?;
            let ctx = WindowContext {
                wm_class: class,
                wm_name: title,
                device_name: device,
                numlock_on: numlock,
                capslock_on: capslock,
            };
            commands::test_rule(&config, &ctx, json)
        }
    }
}
