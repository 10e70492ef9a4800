use super::store::AnalysisRun;
use crate::determinism::ids::sha256_hex;
use crate::error::{OversightError, OversightResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

pub const ZERO_HASH_64: &str =
    "0000000000000000000000000000000000000000000000000000000000000000";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub analysis_id: String,
    pub executed_at: String,
    pub risk_level: String,
    pub confidence: f64,
    pub processed_records: usize,
    pub issues_identified: usize,
    pub prev_entry_hash: String,
    pub entry_hash: String,
}

// Hash input is a fixed field concatenation rather than the JSON bytes
// so the hash does not depend on serializer key order or float
// formatting quirks.
fn compute_entry_hash(entry: &HistoryEntry) -> String {
    let combined = format!(
        "{}|{}|{}|{:.6}|{}|{}|{}",
        entry.analysis_id,
        entry.executed_at,
        entry.risk_level,
        entry.confidence,
        entry.processed_records,
        entry.issues_identified,
        entry.prev_entry_hash,
    );
    sha256_hex(combined.as_bytes())
}

/// Append-only JSONL log of analysis runs. Each line carries the hash
/// of the previous line, so truncation or edits anywhere in the file
/// break `verify`.
pub struct HistoryLog {
    path: std::path::PathBuf,
    last_hash: String,
}

impl HistoryLog {
    pub fn open_or_create(path: impl AsRef<Path>) -> OversightResult<Self> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            File::create(&path)?;
            return Ok(Self {
                path,
                last_hash: ZERO_HASH_64.to_string(),
            });
        }

        let file = File::open(&path)?;
        let reader = BufReader::new(file);
        let mut last_hash = ZERO_HASH_64.to_string();
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let v: Value = serde_json::from_str(&line)?;
            let hash = v
                .get("entry_hash")
                .and_then(|x| x.as_str())
                .ok_or_else(|| {
                    OversightError::InvalidInput(
                        "history log line missing entry_hash".to_string(),
                    )
                })?;
            last_hash = hash.to_string();
        }
        Ok(Self { path, last_hash })
    }

    pub fn append(&mut self, run: &AnalysisRun) -> OversightResult<HistoryEntry> {
        let executed_at = run
            .executed_at
            .format(&time::format_description::well_known::Rfc3339)
            .map_err(|e| OversightError::Date(e.to_string()))?;
        let mut entry = HistoryEntry {
            analysis_id: run.analysis_id.clone(),
            executed_at,
            risk_level: run.risk_level.as_str().to_string(),
            confidence: run.confidence,
            processed_records: run.processed_records,
            issues_identified: run.issues_identified,
            prev_entry_hash: self.last_hash.clone(),
            entry_hash: String::new(),
        };
        entry.entry_hash = compute_entry_hash(&entry);

        let line = serde_json::to_string(&entry)?;
        let mut f = OpenOptions::new().append(true).open(&self.path)?;
        f.write_all(line.as_bytes())?;
        f.write_all(b"\n")?;
        self.last_hash = entry.entry_hash.clone();
        Ok(entry)
    }

    /// Walk the whole file and recompute the chain.
    pub fn verify(path: impl AsRef<Path>) -> OversightResult<usize> {
        let file = File::open(path.as_ref())?;
        let reader = BufReader::new(file);
        let mut expected_prev = ZERO_HASH_64.to_string();
        let mut count = 0;
        for (n, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let entry: HistoryEntry = serde_json::from_str(&line)?;
            if entry.prev_entry_hash != expected_prev {
                return Err(OversightError::InvalidInput(format!(
                    "history log line {}: chain broken",
                    n
                )));
            }
            if compute_entry_hash(&entry) != entry.entry_hash {
                return Err(OversightError::InvalidInput(format!(
                    "history log line {}: entry hash mismatch",
                    n
                )));
            }
            expected_prev = entry.entry_hash;
            count += 1;
        }
        Ok(count)
    }
}
