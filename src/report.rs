use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::extract::ReferenceNumber;

/// One processed unit (a whole upload or a split chunk) and the name it got.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenameResult {
    pub source: String,
    pub output: String,
    pub reference: Option<ReferenceNumber>,
    pub sha256: String,
}

impl RenameResult {
    pub fn is_resolved(&self) -> bool {
        self.reference.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureStage {
    Upload,
    Split,
    Copy,
}

impl FailureStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureStage::Upload => "upload",
            FailureStage::Split => "split",
            FailureStage::Copy => "copy",
        }
    }
}

/// A unit that produced no output file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitFailure {
    pub source: String,
    pub stage: FailureStage,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchOutcome {
    pub results: Vec<RenameResult>,
    pub failures: Vec<UnitFailure>,
    pub archive: PathBuf,
    pub archive_entries: Vec<String>,
}

impl BatchOutcome {
    /// Units written under a fallback `UNKNOWN_` name.
    pub fn unresolved(&self) -> usize {
        self.results.iter().filter(|r| !r.is_resolved()).count()
    }

    pub fn resolved(&self) -> usize {
        self.results.len() - self.unresolved()
    }
}

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("WriteFailed: {0}")]
    WriteFailed(String),
}

/// Atomically write the outcome as pretty JSON.
pub fn emit_report(outcome: &BatchOutcome, path: &Path) -> Result<(), ReportError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| ReportError::WriteFailed(e.to_string()))?;
    }
    let body = serde_json::json!({
        "archive": outcome.archive,
        "archive_entries": outcome.archive_entries,
        "resolved": outcome.resolved(),
        "unresolved": outcome.unresolved(),
        "failed": outcome.failures.len(),
        "results": outcome.results,
        "failures": outcome.failures,
    });
    let bytes = serde_json::to_vec_pretty(&body).map_err(|e| ReportError::WriteFailed(e.to_string()))?;

    let tmp = path.with_extension(format!("json.tmp.{}", std::process::id()));
    std::fs::write(&tmp, bytes).map_err(|e| ReportError::WriteFailed(e.to_string()))?;
    std::fs::rename(&tmp, path).map_err(|e| ReportError::WriteFailed(e.to_string()))?;
    Ok(())
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let out = hasher.finalize();
    out.iter().map(|b| format!("{:02x}", b)).collect()
}
