use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Persisted snapshot of one broadcast run. Loaded at startup, mutated in
/// place as each stage completes, and saved at the end of the run whether or
/// not the pipeline reached the finish line, so partial progress survives.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunRecord {
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub events: Vec<String>,
    #[serde(default)]
    pub script_prompt: String,
    #[serde(default)]
    pub script: String,
    #[serde(default)]
    pub audio_file: String,
    #[serde(default)]
    pub error: String,
}

pub const RECORD_PATH: &str = "broadcast.json";

impl RunRecord {
    /// Load prior state. An absent or malformed file means "no prior state",
    /// never a fatal error.
    pub fn load(path: &Path) -> Self {
        let Ok(raw) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        serde_json::from_str(&raw).unwrap_or_default()
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}
