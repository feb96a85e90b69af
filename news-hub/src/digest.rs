use crate::types::{PipelineOutput, Result};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

pub const ITEMS_FILE: &str = "items.json";
pub const TOPICS_FILE: &str = "topics.json";
pub const META_FILE: &str = "meta.json";

/// Writes `items.json`, `topics.json` and `meta.json` into `out_dir`,
/// creating it if needed. Returns the written paths.
pub fn write_digest(out_dir: &Path, output: &PipelineOutput) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(out_dir)?;

    let written = vec![
        write_json(&out_dir.join(ITEMS_FILE), &output.items)?,
        write_json(&out_dir.join(TOPICS_FILE), &output.topics)?,
        write_json(&out_dir.join(META_FILE), &output.summary)?,
    ];

    info!("Wrote digest to {}", out_dir.display());
    Ok(written)
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<PathBuf> {
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json)?;
    Ok(path.to_path_buf())
}
