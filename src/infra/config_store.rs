// ============================================================
// Layer 6 — Config Store
// ============================================================
// Saves and restores PipelineConfig as pretty-printed JSON.
//
// The stream command writes the effective configuration into
// the vocabulary directory before the first batch, so the
// exact run can be repeated with `--config`.

use std::fs;
use std::path::Path;

use crate::application::config::PipelineConfig;
use crate::domain::error::Result;

pub const CONFIG_FILE: &str = "pipeline_config.json";

pub fn save_config(dir: &Path, cfg: &PipelineConfig) -> Result<()> {
    fs::create_dir_all(dir)?;
    let path = dir.join(CONFIG_FILE);
    fs::write(&path, serde_json::to_string_pretty(cfg)?)?;
    tracing::debug!("Saved pipeline config to '{}'", path.display());
    Ok(())
}

/// Load a config file and validate it.
pub fn load_config(path: &Path) -> Result<PipelineConfig> {
    let json = fs::read_to_string(path)?;
    let cfg: PipelineConfig = serde_json::from_str(&json)?;
    cfg.validate()?;
    Ok(cfg)
}
