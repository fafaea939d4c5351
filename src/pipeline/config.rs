//! Compiler configuration
//!
//! Per-pipeline switches for assembly and optimization.

use serde::{Deserialize, Serialize};

/// Pipeline configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompilerConfig {
    /// Emit `$thing`, `$id` and `$thingType` on every object (default: true)
    #[serde(default = "default_metadata")]
    pub metadata: bool,

    /// Keep absent fields as null and collapse empty results to null (default: false)
    #[serde(default)]
    pub return_nulls: bool,

    /// Run the optimizer between building and compiling (default: true)
    #[serde(default = "default_optimize")]
    pub optimize: bool,
}

fn default_metadata() -> bool {
    true
}

fn default_optimize() -> bool {
    true
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            metadata: default_metadata(),
            return_nulls: false,
            optimize: default_optimize(),
        }
    }
}

impl CompilerConfig {
    /// Parses a JSON configuration object; missing keys take their defaults
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn with_metadata(mut self, metadata: bool) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn with_return_nulls(mut self, return_nulls: bool) -> Self {
        self.return_nulls = return_nulls;
        self
    }

    pub fn with_optimize(mut self, optimize: bool) -> Self {
        self.optimize = optimize;
        self
    }

    /// Skips the optimizer, other settings at their defaults
    pub fn unoptimized() -> Self {
        Self {
            optimize: false,
            ..Default::default()
        }
    }
}
