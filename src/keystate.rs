//! Per-engine keyboard state
//!
//! State that a remapping engine mutates while keys are in flight: the
//! device-name keyboard-type cache, the Enter-key output latch, and the
//! pending dead-key accent. Each is an owned struct passed through the engine
//! rather than process-wide mutable state, so two engines (or a test) never
//! share or clobber each other's state.

use std::collections::HashMap;

use anyhow::{Context, Result};
use regex::{Regex, RegexBuilder};
use tracing::{debug, warn};

/// Hardware layout family a keyboard device belongs to. Decides which
/// modifier remaps apply for that device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyboardType {
    Ibm,
    Chromebook,
    Windows,
    Apple,
}

impl KeyboardType {
    pub const ALL: [KeyboardType; 4] = [
        KeyboardType::Ibm,
        KeyboardType::Chromebook,
        KeyboardType::Windows,
        KeyboardType::Apple,
    ];

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyboardType::Ibm => "IBM",
            KeyboardType::Chromebook => "Chromebook",
            KeyboardType::Windows => "Windows",
            KeyboardType::Apple => "Apple",
        }
    }
}

/// Known device names per type. Spaces match loosely, so vendor-prefix
/// variants ("Apple Inc. Magic Keyboard" vs "Magic Keyboard") still hit.
const IBM_KEYBOARDS: &[&str] = &["IBM Enhanced (101/102-key) Keyboard", "IBM Space Saver II"];
const CHROMEBOOK_KEYBOARDS: &[&str] = &["Google Chromebook", "AT Translated Set 2 keyboard"];
const WINDOWS_KEYBOARDS: &[&str] = &["Microsoft Natural Ergonomic Keyboard", "Das Keyboard"];
const APPLE_KEYBOARDS: &[&str] = &[
    "Mitsumi Electric Apple Extended USB Keyboard",
    "Magic Keyboard with Numeric Keypad",
    "Magic Keyboard",
    "MX Keys Mac Keyboard",
];

/// Classifies keyboard devices by name and remembers the verdict per device.
///
/// Resolution order: configured override, per-device cache, user-supplied
/// custom mapping, known-device patterns, type name appearing in the device
/// name, then `Windows` as the default for unrecognized hardware.
pub struct KeyboardClassifier {
    override_type: Option<KeyboardType>,
    custom: HashMap<String, KeyboardType>,
    patterns: Vec<(KeyboardType, Regex)>,
    cache: HashMap<String, KeyboardType>,
}

impl KeyboardClassifier {
    pub fn new(
        override_type: Option<KeyboardType>,
        custom_devices: HashMap<String, KeyboardType>,
    ) -> Result<Self> {
        let lists = [
            (KeyboardType::Ibm, IBM_KEYBOARDS),
            (KeyboardType::Chromebook, CHROMEBOOK_KEYBOARDS),
            (KeyboardType::Windows, WINDOWS_KEYBOARDS),
            (KeyboardType::Apple, APPLE_KEYBOARDS),
        ];
        let mut patterns = Vec::with_capacity(lists.len());
        for (kb_type, names) in lists {
            let alternation = names
                .iter()
                .map(|n| n.replace(' ', ".*"))
                .collect::<Vec<_>>()
                .join("|");
            let regex = RegexBuilder::new(&alternation)
                .case_insensitive(true)
                .build()
                .with_context(|| format!("Bad device pattern for {}", kb_type.as_str()))?;
            patterns.push((kb_type, regex));
        }

        let custom = custom_devices
            .into_iter()
            .map(|(name, kb_type)| (name.to_lowercase(), kb_type))
            .collect();

        Ok(Self {
            override_type,
            custom,
            patterns,
            cache: HashMap::new(),
        })
    }

    /// Classify a device by name. Verdicts are cached per device name, the
    /// override is not cached so clearing it restores per-device adaptation.
    pub fn classify(&mut self, device_name: &str) -> KeyboardType {
        if let Some(kb_type) = self.override_type {
            warn!(
                "Keyboard type override '{}' applied to '{}'",
                kb_type.as_str(),
                device_name
            );
            return kb_type;
        }

        if let Some(&kb_type) = self.cache.get(device_name) {
            return kb_type;
        }

        let kb_type = self.classify_uncached(device_name);
        debug!(
            "Classified keyboard '{}' as {}",
            device_name,
            kb_type.as_str()
        );
        self.cache.insert(device_name.to_string(), kb_type);
        kb_type
    }

    fn classify_uncached(&self, device_name: &str) -> KeyboardType {
        let name_lower = device_name.to_lowercase();

        if let Some(&kb_type) = self.custom.get(&name_lower) {
            return kb_type;
        }

        for (kb_type, regex) in &self.patterns {
            if regex.is_match(&name_lower) {
                return *kb_type;
            }
        }

        for kb_type in KeyboardType::ALL {
            if name_lower.contains(&kb_type.as_str().to_lowercase()) {
                return kb_type;
            }
        }

        KeyboardType::Windows
    }
}

/// Latch deciding whether the next Enter press emits the alternate output
/// (the Finder-style "Enter to rename" simulation).
///
/// Starts latched on. `consume` reports the current mode and advances it;
/// the keep flags pin the mode instead of flipping it.
#[derive(Debug)]
pub struct EnterKeyLatch {
    alternate: bool,
}

impl Default for EnterKeyLatch {
    fn default() -> Self {
        Self { alternate: true }
    }
}

impl EnterKeyLatch {
    /// Force the latch to a mode without consuming it.
    pub fn latch(&mut self, alternate: bool) {
        self.alternate = alternate;
    }

    #[must_use]
    pub fn is_alternate(&self) -> bool {
        self.alternate
    }

    /// Report the current mode and advance the latch.
    pub fn consume(&mut self, keep_if_alternate: bool, keep_if_normal: bool) -> bool {
        let was_alternate = self.alternate;
        if was_alternate {
            if !keep_if_alternate {
                self.alternate = false;
            }
        } else if !keep_if_normal {
            self.alternate = true;
        }
        was_alternate
    }
}

/// Pending dead-key accent, armed by an accent combo and consumed by the next
/// character key.
#[derive(Debug, Default)]
pub struct DeadKeyState {
    pending: Option<char>,
}

impl DeadKeyState {
    pub fn arm(&mut self, accent: char) {
        self.pending = Some(accent);
    }

    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.pending.is_some()
    }

    /// Take the pending accent, disarming the state.
    pub fn take(&mut self) -> Option<char> {
        self.pending.take()
    }
}
