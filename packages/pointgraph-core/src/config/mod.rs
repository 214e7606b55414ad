//! Analysis configuration.
//!
//! [`AnalysisOptions`] is a string-keyed map; the core reads a single key,
//! [`TAINT_CONFIG_KEY`], naming the taint configuration file.

use rustc_hash::FxHashMap;

use crate::errors::Result;
use crate::features::taint_analysis::domain::{ResolvedTaintConfig, TaintConfig};
use crate::shared::models::Program;

/// Option naming the taint configuration file path.
pub const TAINT_CONFIG_KEY: &str = "taint-config";

/// String-keyed analysis options.
#[derive(Debug, Clone, Default)]
pub struct AnalysisOptions {
    values: FxHashMap<String, String>,
}

impl AnalysisOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: &str, value: &str) -> &mut Self {
        self.values.insert(key.to_string(), value.to_string());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Load and resolve the taint configuration named by
    /// [`TAINT_CONFIG_KEY`]. An absent key yields an empty configuration,
    /// turning the overlay into a no-op; a present but unreadable or
    /// malformed file is an error.
    pub fn load_taint_config(&self, program: &mut Program) -> Result<ResolvedTaintConfig> {
        match self.get(TAINT_CONFIG_KEY) {
            Some(path) => Ok(TaintConfig::load(path)?.resolve(program)),
            None => Ok(ResolvedTaintConfig::default()),
        }
    }
}
