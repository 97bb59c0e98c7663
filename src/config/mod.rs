// Demo-binary configuration: the core itself is parameter-free at
// runtime (all sizes are compile-time constants); this is only the
// circuit description the demo binary reads to exercise the core.
use std::path::Path;
use serde::{Deserialize, Serialize};

use crate::logging::LoggingConfig;

/// One relay in a demo circuit: where to reach it and its long-term
/// public key, SEC1-uncompressed-encoded as hex.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayEntry {
    pub address: String,
    pub public_key_hex: String,
}

/// The circuit a demo run constructs a packet for, plus its logging
/// configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CircuitConfig {
    pub relays: Vec<RelayEntry>,
    pub final_address: String,
    pub logging: LoggingConfig,
}

impl Default for CircuitConfig {
    fn default() -> Self {
        Self {
            relays: Vec::new(),
            final_address: String::new(),
            logging: LoggingConfig::default(),
        }
    }
}

impl CircuitConfig {
    /// Loads a YAML circuit description from `path`, falling back to
    /// [`CircuitConfig::default`] if the file is missing or malformed.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => serde_yaml::from_str(&contents).unwrap_or_default(),
            Err(_) => Self::default(),
        }
    }
}
