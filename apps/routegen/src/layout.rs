//! Where each mode writes its artifacts.
//!
//! ```text
//! {save}/{label}/coordinates/coordinates.json
//! {save}/{label}/routes/routes_{n}_samples.json
//! {save}/fixed_origins/{timestamp}.json
//! {error_dir}/errors_{timestamp}.csv | .json
//! {dir of routes_path}/congestion.json
//! ```
//!
//! Every output directory also gets `last_checkpoint.json`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use rg_output::{ArtifactNames, ArtifactWriter, CsvWriter, JsonWriter};

use crate::config::{Format, RunConfig};

pub const CHECKPOINT_FILE: &str = "last_checkpoint.json";

pub fn coordinates_dir(save: &Path, label: &str) -> PathBuf {
    save.join(label).join("coordinates")
}

pub fn routes_dir(save: &Path, label: &str) -> PathBuf {
    save.join(label).join("routes")
}

pub fn fixed_origins_dir(save: &Path) -> PathBuf {
    save.join("fixed_origins")
}

pub fn routes_stem(n: usize) -> String {
    format!("routes_{n}_samples")
}

pub fn error_stem(stamp: &str) -> String {
    format!("errors_{stamp}")
}

/// Local wall-clock `YYYYMMDD_HHMMSS`.
pub fn timestamp() -> String {
    chrono::Local::now().format("%Y%m%d_%H%M%S").to_string()
}

pub fn prepare(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))
}

pub fn save_dir(config: &RunConfig) -> Result<&Path> {
    config.save_directory.as_deref().context("save_directory is not set")
}

/// Effective configuration, without the API token.
pub fn write_checkpoint(dir: &Path, config: &RunConfig) -> Result<()> {
    let path = dir.join(CHECKPOINT_FILE);
    rg_output::write_json(&path, config).with_context(|| format!("writing {}", path.display()))
}

/// One writer per configured format; JSON is always first.
pub fn writers(config: &RunConfig, dir: &Path, names: ArtifactNames) -> Result<Vec<Box<dyn ArtifactWriter>>> {
    let mut out: Vec<Box<dyn ArtifactWriter>> = vec![Box::new(JsonWriter::with_names(dir, names.clone()))];
    if config.wants(Format::Csv) {
        out.push(Box::new(CsvWriter::with_names(dir, names)));
    }
    #[cfg(feature = "sqlite")]
    if config.wants(Format::Sqlite) {
        out.push(Box::new(rg_output::SqliteWriter::new(dir)?));
    }
    Ok(out)
}

/// Run `write` against every writer for `dir`, then finish them.
pub fn emit<F>(config: &RunConfig, dir: &Path, names: ArtifactNames, mut write: F) -> Result<()>
where
    F: FnMut(&mut dyn ArtifactWriter) -> rg_output::OutputResult<()>,
{
    prepare(dir)?;
    for mut w in writers(config, dir, names)? {
        write(&mut *w).with_context(|| format!("writing artifacts to {}", dir.display()))?;
        w.finish()?;
    }
    write_checkpoint(dir, config)
}
