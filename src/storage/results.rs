use std::{
    fs::File,
    io::{BufRead, BufReader, BufWriter, Write},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use serde::Serialize;
use serde_json::Value;

use crate::domain::ClassificationResult;

/// Timestamp used to pair a results file with its validation report.
pub fn run_stamp(now: DateTime<Local>) -> String {
    now.format("%Y%m%d_%H%M%S").to_string()
}

/// Writes one compact JSON object per line.
pub fn write_results(
    results_dir: &Path,
    results: &[ClassificationResult],
    stamp: &str,
) -> Result<PathBuf> {
    let path = results_dir.join(format!(
        "ai_moderation_results_{}_{stamp}.jsonl",
        results.len()
    ));
    let file =
        File::create(&path).with_context(|| format!("failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    for result in results {
        serde_json::to_writer(&mut writer, result)?;
        writer.write_all(b"\n")?;
    }
    writer
        .flush()
        .with_context(|| format!("failed to write {}", path.display()))?;

    tracing::info!(target: "storage", path = %path.display(), records = results.len(), "results saved");
    Ok(path)
}

/// Reads a JSONL file back as raw records, skipping blank lines.
pub fn read_records(path: &Path) -> Result<Vec<Value>> {
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let mut records = Vec::new();
    for (index, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let record = serde_json::from_str(&line)
            .with_context(|| format!("line {} of {} is not valid JSON", index + 1, path.display()))?;
        records.push(record);
    }
    Ok(records)
}

pub fn write_report<R: Serialize>(
    results_dir: &Path,
    report: &R,
    samples: usize,
    stamp: &str,
) -> Result<PathBuf> {
    let path = results_dir.join(format!("validation_report_{samples}_{stamp}.json"));
    let file =
        File::create(&path).with_context(|| format!("failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, report)?;
    writer.flush()?;
    tracing::info!(target: "storage", path = %path.display(), "validation report saved");
    Ok(path)
}
