use std::time::{Duration, Instant};

use log::debug;

use crate::enumeration::LocalFile;
use crate::errors::{TransferError, TransferStage};
use crate::session::TransferSession;

/// Outcome of one upload. Failures are values; nothing escapes the executor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferOutcome {
    Success { bytes: u64, elapsed: Duration },
    Failure(TransferError),
}

impl TransferOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, TransferOutcome::Success { .. })
    }
}

/// Uploads a single local file over an open session.
#[derive(Debug, Default, Clone, Copy)]
pub struct TransferExecutor;

impl TransferExecutor {
    pub fn new() -> Self {
        Self
    }

    /// Partial remote files left by a failed upload are not cleaned up.
    pub fn upload<S: TransferSession + ?Sized>(
        &self,
        session: &mut S,
        file: &LocalFile,
        remote_path: &str,
    ) -> TransferOutcome {
        if !session.is_open() {
            return TransferOutcome::Failure(TransferError::new(
                file.name.clone(),
                TransferStage::CreateRemote,
                "session is closed",
            ));
        }

        let started = Instant::now();
        match session.upload(&file.path, remote_path) {
            Ok(bytes) => {
                let elapsed = started.elapsed();
                debug!(
                    "uploaded {} -> {} ({} bytes in {:?})",
                    file.name, remote_path, bytes, elapsed
                );
                TransferOutcome::Success { bytes, elapsed }
            }
            Err(mut err) => {
                // Report against the enumerated name, whatever the session saw.
                err.file = file.name.clone();
                debug!(
                    "upload of {} -> {} failed during {}: {}",
                    file.name, remote_path, err.stage, err.cause
                );
                TransferOutcome::Failure(err)
            }
        }
    }
}
