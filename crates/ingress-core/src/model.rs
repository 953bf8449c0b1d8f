use chrono::{DateTime, Local};
use serde::Serialize;

use crate::enumeration::LocalFile;
use crate::errors::TransferStage;
use crate::executor::TransferOutcome;

/// What happened to one recorded attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AttemptOutcome {
    Uploaded {
        bytes: u64,
        elapsed_ms: u64,
    },
    UploadFailed {
        stage: TransferStage,
        cause: String,
        transient: bool,
    },
    /// The session for the batch run could not be opened.
    ConnectionFailed { cause: String },
    /// The local directory could not be listed for the batch run.
    ListingFailed { cause: String },
}

/// One numbered line of the test report. Immutable once recorded.
#[derive(Debug, Clone, Serialize)]
pub struct TransferAttempt {
    pub ordinal: u64,
    /// Local file name. For connection failures this is the file that was
    /// next in line when the batch run was abandoned (empty if none).
    pub source: String,
    pub remote_path: Option<String>,
    pub outcome: AttemptOutcome,
    pub at: DateTime<Local>,
}

impl TransferAttempt {
    pub fn from_transfer(
        ordinal: u64,
        file: &LocalFile,
        remote_path: String,
        outcome: TransferOutcome,
        at: DateTime<Local>,
    ) -> Self {
        let outcome = match outcome {
            TransferOutcome::Success { bytes, elapsed } => AttemptOutcome::Uploaded {
                bytes,
                elapsed_ms: elapsed.as_millis().min(u64::MAX as u128) as u64,
            },
            TransferOutcome::Failure(err) => AttemptOutcome::UploadFailed {
                stage: err.stage,
                cause: err.cause,
                transient: err.transient,
            },
        };
        Self {
            ordinal,
            source: file.name.clone(),
            remote_path: Some(remote_path),
            outcome,
            at,
        }
    }

    pub fn connection_failure(
        ordinal: u64,
        source: impl Into<String>,
        cause: impl Into<String>,
        at: DateTime<Local>,
    ) -> Self {
        Self {
            ordinal,
            source: source.into(),
            remote_path: None,
            outcome: AttemptOutcome::ConnectionFailed {
                cause: cause.into(),
            },
            at,
        }
    }

    pub fn listing_failure(
        ordinal: u64,
        local_dir: impl Into<String>,
        cause: impl Into<String>,
        at: DateTime<Local>,
    ) -> Self {
        Self {
            ordinal,
            source: local_dir.into(),
            remote_path: None,
            outcome: AttemptOutcome::ListingFailed {
                cause: cause.into(),
            },
            at,
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self.outcome, AttemptOutcome::Uploaded { .. })
    }

    /// Human-readable description used as the TAP test description.
    pub fn description(&self) -> String {
        match &self.outcome {
            AttemptOutcome::Uploaded { .. } => format!("Successfully uploaded {}", self.source),
            AttemptOutcome::UploadFailed { cause, .. } => {
                format!("Error uploading {}: {}", self.source, cause)
            }
            AttemptOutcome::ConnectionFailed { cause } => format!("Connection error: {cause}"),
            AttemptOutcome::ListingFailed { cause } => {
                format!("Error listing {}: {}", self.source, cause)
            }
        }
    }
}

/// Hands out ordinal test ids for one run: 1, 2, 3, ... with no gaps.
#[derive(Debug)]
pub struct OrdinalCounter {
    next: u64,
}

impl OrdinalCounter {
    pub fn new() -> Self {
        Self { next: 1 }
    }

    pub fn next_id(&mut self) -> u64 {
        let id = self.next;
        self.next += 1;
        id
    }

    /// Number of ids handed out so far.
    pub fn issued(&self) -> u64 {
        self.next - 1
    }
}

impl Default for OrdinalCounter {
    fn default() -> Self {
        Self::new()
    }
}

/// All attempts recorded for one configured batch size.
#[derive(Debug, Clone, Serialize)]
pub struct BatchRun {
    pub multiplier: u32,
    pub file_count: usize,
    pub expected_total: u64,
    pub attempts: Vec<TransferAttempt>,
    /// Set when the session could not be opened or the directory could not
    /// be listed, so no file was attempted.
    pub truncated: bool,
}

impl BatchRun {
    pub fn new(multiplier: u32, file_count: usize) -> Self {
        Self {
            multiplier,
            file_count,
            expected_total: expected_total(file_count, multiplier),
            attempts: Vec::new(),
            truncated: false,
        }
    }

    pub fn recorded(&self) -> u64 {
        self.attempts.len() as u64
    }

    /// Every file was attempted the configured number of times.
    pub fn is_complete(&self) -> bool {
        !self.truncated && self.recorded() == self.expected_total
    }

    pub fn succeeded(&self) -> u64 {
        self.attempts.iter().filter(|a| a.is_ok()).count() as u64
    }

    pub fn failed(&self) -> u64 {
        self.recorded() - self.succeeded()
    }

    pub fn bytes_uploaded(&self) -> u64 {
        self.attempts
            .iter()
            .map(|a| match a.outcome {
                AttemptOutcome::Uploaded { bytes, .. } => bytes,
                _ => 0,
            })
            .sum()
    }
}

pub fn expected_total(file_count: usize, multiplier: u32) -> u64 {
    (file_count as u64).saturating_mul(u64::from(multiplier))
}

/// Everything the engine recorded across all batch sizes.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    pub batches: Vec<BatchRun>,
}

impl RunSummary {
    pub fn attempts(&self) -> impl Iterator<Item = &TransferAttempt> {
        self.batches.iter().flat_map(|b| b.attempts.iter())
    }

    pub fn recorded(&self) -> u64 {
        self.batches.iter().map(BatchRun::recorded).sum()
    }

    pub fn succeeded(&self) -> u64 {
        self.batches.iter().map(BatchRun::succeeded).sum()
    }

    pub fn failed(&self) -> u64 {
        self.batches.iter().map(BatchRun::failed).sum()
    }

    pub fn connection_failures(&self) -> u64 {
        self.attempts()
            .filter(|a| matches!(a.outcome, AttemptOutcome::ConnectionFailed { .. }))
            .count() as u64
    }

    pub fn listing_failures(&self) -> u64 {
        self.attempts()
            .filter(|a| matches!(a.outcome, AttemptOutcome::ListingFailed { .. }))
            .count() as u64
    }

    pub fn transient_failures(&self) -> u64 {
        self.attempts()
            .filter(|a| {
                matches!(
                    a.outcome,
                    AttemptOutcome::UploadFailed {
                        transient: true,
                        ..
                    }
                )
            })
            .count() as u64
    }

    pub fn bytes_uploaded(&self) -> u64 {
        self.batches.iter().map(BatchRun::bytes_uploaded).sum()
    }

    pub fn all_passed(&self) -> bool {
        self.failed() == 0
    }
}
