use std::{fs, path::PathBuf};

use anyhow::{Context, Result};

use crate::config::DirectoryConfig;

#[derive(Debug, Clone)]
pub struct ResolvedPaths {
    pub logs_dir: PathBuf,
    pub results_dir: PathBuf,
}

/// Creates the log and result directories and checks that results can be written.
pub fn ensure_directories(cfg: &DirectoryConfig) -> Result<ResolvedPaths> {
    let logs_dir = ensure_dir(&cfg.logs_dir)?;
    let results_dir = ensure_dir(&cfg.results_dir)?;

    let probe = results_dir.join(".write-test");
    fs::write(&probe, b"ok")
        .with_context(|| format!("results directory {} is not writable", results_dir.display()))?;
    fs::remove_file(&probe)?;

    Ok(ResolvedPaths {
        logs_dir,
        results_dir,
    })
}

fn ensure_dir(path: &str) -> Result<PathBuf> {
    let dir = PathBuf::from(path);
    fs::create_dir_all(&dir).with_context(|| format!("failed to create directory {path}"))?;
    Ok(dir.canonicalize().unwrap_or(dir))
}
