//! Batch upload load-test engine.
//!
//! For each configured batch size the engine enumerates the local directory,
//! opens one session, replays the full file list `multiplier` times, and
//! records every attempt with the next ordinal id. A failed upload is
//! recorded and the next file is attempted; a failed session open records a
//! single connection failure and ends that batch run only. The same holds when
//! the directory cannot be listed for a batch size.

use std::io::Write;

use chrono::Local;
use eyre::{Context, Result};
use log::{info, warn};

use crate::config::LoadTestConfig;
use crate::enumeration::enumerate_files;
use crate::executor::TransferExecutor;
use crate::model::{BatchRun, OrdinalCounter, RunSummary, TransferAttempt};
use crate::naming::{remote_path, SequenceContext};
use crate::report::{TapReporter, TAP_VERSION};
use crate::schedule::Pause;
use crate::session::{SessionGuard, SessionProvider};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Idle,
    SessionOpen,
    Uploading,
    Recorded,
    SessionClosed,
    Finished,
}

/// Hooks for progress display and state tracing. All methods default to
/// no-ops.
pub trait EngineObserver {
    fn batch_started(&mut self, _batch: &BatchRun) {}
    fn attempt_recorded(&mut self, _attempt: &TransferAttempt) {}
    fn batch_finished(&mut self, _batch: &BatchRun) {}
    fn state_changed(&mut self, _state: EngineState) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl EngineObserver for NoopObserver {}

pub struct LoadTestEngine<P, Z> {
    provider: P,
    pause: Z,
    config: LoadTestConfig,
    executor: TransferExecutor,
    state: EngineState,
}

impl<P, Z> LoadTestEngine<P, Z>
where
    P: SessionProvider,
    Z: Pause,
{
    pub fn new(provider: P, pause: Z, config: LoadTestConfig) -> Self {
        Self {
            provider,
            pause,
            config,
            executor: TransferExecutor::new(),
            state: EngineState::Idle,
        }
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn config(&self) -> &LoadTestConfig {
        &self.config
    }

    /// Run every configured batch size in order, streaming results into
    /// `reporter`. Only report I/O and local enumeration errors are returned;
    /// connection and upload failures become report lines.
    pub fn run<W: Write>(
        &mut self,
        reporter: &mut TapReporter<W>,
        observer: &mut dyn EngineObserver,
    ) -> Result<RunSummary> {
        reporter
            .write_header(TAP_VERSION)
            .context("failed to write report header")?;

        let mut ordinals = OrdinalCounter::new();
        let mut summary = RunSummary::default();
        let batch_sizes = self.config.batch_sizes.clone();

        for (index, multiplier) in batch_sizes.iter().copied().enumerate() {
            self.enter(EngineState::Idle, observer);
            let batch = self.run_batch(multiplier, &mut ordinals, reporter, observer)?;
            observer.batch_finished(&batch);
            summary.batches.push(batch);

            let more = index + 1 < batch_sizes.len();
            if more && !self.config.interval.is_zero() {
                info!(
                    "waiting {:?} before batch size {}",
                    self.config.interval,
                    batch_sizes[index + 1]
                );
                self.pause.pause(self.config.interval);
            }
        }

        self.enter(EngineState::Finished, observer);
        info!(
            "load test finished: {} attempt(s), {} ok, {} failed, {} byte(s) uploaded",
            summary.recorded(),
            summary.succeeded(),
            summary.failed(),
            summary.bytes_uploaded()
        );
        Ok(summary)
    }

    fn run_batch<W: Write>(
        &mut self,
        multiplier: u32,
        ordinals: &mut OrdinalCounter,
        reporter: &mut TapReporter<W>,
        observer: &mut dyn EngineObserver,
    ) -> Result<BatchRun> {
        let files = match enumerate_files(&self.config.local_dir, &self.config.filter) {
            Ok(files) => files,
            Err(err) => {
                return self.record_listing_failure(multiplier, err, ordinals, reporter, observer)
            }
        };
        let mut batch = BatchRun::new(multiplier, files.len());

        reporter
            .write_batch_comment(multiplier, batch.expected_total)
            .context("failed to write batch comment")?;
        observer.batch_started(&batch);
        info!(
            "batch size {}: {} file(s) x {} = {} upload(s) to {}",
            multiplier,
            files.len(),
            multiplier,
            batch.expected_total,
            self.config.endpoint
        );

        let session = match self
            .provider
            .open(&self.config.endpoint, &self.config.credential)
        {
            Ok(session) => session,
            Err(err) => {
                warn!(
                    "batch size {}: connection to {} failed: {}",
                    multiplier, self.config.endpoint, err
                );
                let next_file = files.first().map(|f| f.name.clone()).unwrap_or_default();
                let attempt = TransferAttempt::connection_failure(
                    ordinals.next_id(),
                    next_file,
                    err.to_string(),
                    Local::now(),
                );
                self.record(attempt, &mut batch, reporter, observer)?;
                batch.truncated = true;
                self.enter(EngineState::SessionClosed, observer);
                return Ok(batch);
            }
        };

        let mut session = SessionGuard::new(session);
        self.enter(EngineState::SessionOpen, observer);

        for _repetition in 1..=multiplier {
            for file in &files {
                let ordinal = ordinals.next_id();
                let at = Local::now();
                let name = self
                    .config
                    .naming
                    .remote_name(&file.name, &SequenceContext::new(at, ordinal));
                let target = remote_path(&self.config.remote_dir, &name);

                self.enter(EngineState::Uploading, observer);
                let outcome = self.executor.upload(&mut *session, file, &target);
                let attempt = TransferAttempt::from_transfer(ordinal, file, target, outcome, at);
                self.record(attempt, &mut batch, reporter, observer)?;
            }
        }

        session.close();
        self.enter(EngineState::SessionClosed, observer);

        if batch.recorded() != batch.expected_total {
            warn!(
                "batch size {}: recorded {} attempt(s) but expected {}",
                multiplier,
                batch.recorded(),
                batch.expected_total
            );
        }
        info!(
            "batch size {}: {} ok, {} failed",
            multiplier,
            batch.succeeded(),
            batch.failed()
        );
        Ok(batch)
    }

    /// The directory could not be listed for this batch size: announce zero
    /// tests, record one failing attempt and let the next batch size run.
    fn record_listing_failure<W: Write>(
        &mut self,
        multiplier: u32,
        err: eyre::Report,
        ordinals: &mut OrdinalCounter,
        reporter: &mut TapReporter<W>,
        observer: &mut dyn EngineObserver,
    ) -> Result<BatchRun> {
        warn!(
            "batch size {}: listing {} failed: {:#}",
            multiplier,
            self.config.local_dir.display(),
            err
        );
        let mut batch = BatchRun::new(multiplier, 0);
        reporter
            .write_batch_comment(multiplier, batch.expected_total)
            .context("failed to write batch comment")?;
        observer.batch_started(&batch);

        let attempt = TransferAttempt::listing_failure(
            ordinals.next_id(),
            self.config.local_dir.display().to_string(),
            format!("{err:#}"),
            Local::now(),
        );
        self.record(attempt, &mut batch, reporter, observer)?;
        batch.truncated = true;
        Ok(batch)
    }

    fn enter(&mut self, state: EngineState, observer: &mut dyn EngineObserver) {
        self.state = state;
        observer.state_changed(state);
    }

    fn record<W: Write>(
        &mut self,
        attempt: TransferAttempt,
        batch: &mut BatchRun,
        reporter: &mut TapReporter<W>,
        observer: &mut dyn EngineObserver,
    ) -> Result<()> {
        reporter
            .write_result(&attempt)
            .with_context(|| format!("failed to write result {}", attempt.ordinal))?;
        observer.attempt_recorded(&attempt);
        batch.attempts.push(attempt);
        self.enter(EngineState::Recorded, observer);
        Ok(())
    }
}
