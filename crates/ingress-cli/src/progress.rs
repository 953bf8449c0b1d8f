use indicatif::{ProgressBar, ProgressStyle};
use ingress_core::model::{BatchRun, TransferAttempt};
use ingress_core::EngineObserver;
use std::time::Duration;

/// Progress bar per batch size, shown on stderr.
pub(crate) struct ProgressObserver {
    bar: Option<ProgressBar>,
    failures: u64,
}

impl ProgressObserver {
    pub(crate) fn new() -> Self {
        Self {
            bar: None,
            failures: 0,
        }
    }

    fn style() -> ProgressStyle {
        ProgressStyle::with_template("{spinner} {prefix} [{bar:30}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .tick_strings(&["-", "\\", "|", "/", "-"])
            .progress_chars("=> ")
    }
}

impl EngineObserver for ProgressObserver {
    fn batch_started(&mut self, batch: &BatchRun) {
        let pb = ProgressBar::new(batch.expected_total);
        pb.set_style(Self::style());
        pb.set_prefix(format!("batch size {}", batch.multiplier));
        pb.enable_steady_tick(Duration::from_millis(120));
        self.failures = 0;
        self.bar = Some(pb);
    }

    fn attempt_recorded(&mut self, attempt: &TransferAttempt) {
        if let Some(pb) = &self.bar {
            if !attempt.is_ok() {
                self.failures += 1;
                pb.set_message(format!("{} failed", self.failures));
            }
            pb.inc(1);
        }
    }

    fn batch_finished(&mut self, batch: &BatchRun) {
        if let Some(pb) = self.bar.take() {
            pb.finish_with_message(format!(
                "{} ok, {} failed",
                batch.succeeded(),
                batch.failed()
            ));
        }
    }
}
