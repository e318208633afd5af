//! Configuration management
//!
//! Loads, parses, and validates the TOML configuration file: global settings
//! plus the window-match rule records, which are compiled into normalized
//! predicate trees at load time.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::rules::{self, CompiledRule, RawRule};

/// Main configuration structure with compiled rules.
#[derive(Debug, Clone)]
pub struct Config {
    pub settings: Settings,
    pub rules: Vec<CompiledRule>,
}

/// Global settings
#[derive(Debug, Clone)]
pub struct Settings {
    pub log_level: String,
}

// ============================================================================
// Config File Deserialization (TOML)
// ============================================================================

#[derive(Debug, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    settings: SettingsFile,
    #[serde(default)]
    rules: Vec<RawRule>,
}

#[derive(Debug, Deserialize)]
struct SettingsFile {
    #[serde(default = "default_log_level")]
    log_level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for SettingsFile {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

// ============================================================================
// Config Implementation
// ============================================================================

impl Config {
    /// Load configuration from the default XDG config path, creating a
    /// commented default file on first run.
    pub fn load() -> Result<Self> {
        let config_path = Self::get_config_path()?;

        if !config_path.exists() {
            info!("Creating default config at {:?}", config_path);
            Self::create_default_config(&config_path)?;
        }

        Self::load_from_path(&config_path)
    }

    /// Load configuration from an explicit path.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {path:?}"))?;

        Self::from_toml_str(&contents).with_context(|| format!("Failed to load config: {path:?}"))
    }

    /// Parse and compile a config from TOML text.
    ///
    /// All rule validation happens here: unknown field names, mistyped
    /// booleans, empty records, mixed positive/negative fields, and invalid
    /// regexes are fatal, never deferred to evaluation time.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config_file: ConfigFile =
            toml::from_str(contents).context("Failed to parse config")?;

        let settings = Settings {
            log_level: config_file.settings.log_level,
        };
        Self::validate_settings(&settings)?;

        let mut compiled = Vec::with_capacity(config_file.rules.len());
        for (i, raw) in config_file.rules.iter().enumerate() {
            let rule = rules::compile(raw)
                .with_context(|| format!("Invalid rule {} in config", i + 1))?;
            compiled.push(rule);
        }

        Ok(Config {
            settings,
            rules: compiled,
        })
    }

    fn validate_settings(settings: &Settings) -> Result<()> {
        match settings.log_level.as_str() {
            "error" | "warn" | "info" | "debug" | "trace" => Ok(()),
            level => anyhow::bail!(
                "Invalid log_level '{level}'. Must be: error, warn, info, debug, or trace"
            ),
        }
    }

    /// Get the XDG config path for kbctx
    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Could not determine config directory")?
            .join("kbctx");
        fs::create_dir_all(&config_dir)
            .with_context(|| format!("Failed to create config dir: {config_dir:?}"))?;
        Ok(config_dir.join("config.toml"))
    }

    fn create_default_config(path: &PathBuf) -> Result<()> {
        fs::write(path, DEFAULT_CONFIG)
            .with_context(|| format!("Failed to write config: {path:?}"))?;

        eprintln!("Created default config at: {path:?}");
        eprintln!();
        eprintln!("Next steps:");
        eprintln!("  1. Edit the config file to add window-match rules");
        eprintln!("  2. Run 'kbctx validate' to check your config");
        eprintln!("  3. Run 'kbctx wlr-bridge' or 'kbctx kwin-bridge' for your compositor");
        eprintln!();

        Ok(())
    }

    /// Print a human-readable summary of the configuration
    pub fn print_summary(&self) {
        println!("✓ Configuration valid\n");

        println!("Settings:");
        println!("  log_level: {}", self.settings.log_level);

        if self.rules.is_empty() {
            println!("\nNo rules configured.");
        } else {
            println!("\nRules ({}):", self.rules.len());
            for (i, rule) in self.rules.iter().enumerate() {
                let label = rule.label.as_deref().unwrap_or("(unlabeled)");
                println!("  {}. {}", i + 1, label);
            }
        }

        if let Ok(path) = Self::get_config_path() {
            println!("\nConfig: {path:?}");
        }
    }
}

pub(crate) const DEFAULT_CONFIG: &str = r#"# kbctx configuration
#
# Window-match rules for the keyboard remapping engine. Each rule is a
# predicate over the current window context: application class, window
# title, input device name, and lock-key LED states.
#
# Recognized rule fields:
#   clas / name / devn             regex match on class / title / device
#   not_clas / not_name / not_devn same, but matches when NOT found
#   numlk / capslk                 required LED state (true or false)
#   cse                            case-sensitive matching (default false)
#   lst / not_lst                  OR / NOR over a list of sub-records
#   dbg                            diagnostic label shown in logs
#
# Matching is case-insensitive unless cse = true. Unknown field names are
# a fatal error at load time.

[settings]
log_level = "info"         # error, warn, info, debug, trace

[[rules]]
dbg = "browsers"
lst = [
    { clas = "^firefox$" },
    { clas = "^chromium(-browser)?$" },
]

[[rules]]
dbg = "terminal with external keyboard"
clas = "^(kitty|alacritty)$"
not_devn = "AT Translated"

# [[rules]]
# dbg = "numpad macros"
# name = "Spreadsheet"
# numlk = true
"#;
