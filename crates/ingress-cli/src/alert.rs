use ingress_core::{AlertSink, HealthCheck};
use log::warn;
use std::io::Write;
use std::process::{Command, Stdio};

use crate::config::AlertSettings;

/// Rings the terminal bell and repeats the failed line on stderr.
pub(crate) struct BellAlert;

impl AlertSink for BellAlert {
    fn alert(&self, check: &HealthCheck) {
        let mut stderr = std::io::stderr();
        let _ = writeln!(stderr, "\x07{}", check.line());
        let _ = stderr.flush();
    }
}

/// Runs an external program (e.g. `say "Connection failed"`) and waits for it.
pub(crate) struct CommandAlert {
    program: String,
    args: Vec<String>,
}

impl CommandAlert {
    pub(crate) fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}

impl AlertSink for CommandAlert {
    fn alert(&self, _check: &HealthCheck) {
        let status = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .status();
        match status {
            Ok(status) if status.success() => {}
            Ok(status) => warn!("alert command '{}' exited with {}", self.program, status),
            Err(err) => warn!("failed to run alert command '{}': {}", self.program, err),
        }
    }
}

/// Forwards each alert to every configured sink.
#[derive(Default)]
pub(crate) struct Alerts {
    sinks: Vec<Box<dyn AlertSink + Send>>,
}

impl Alerts {
    pub(crate) fn from_settings(settings: &AlertSettings) -> Self {
        let mut alerts = Alerts::default();
        if settings.bell {
            alerts.sinks.push(Box::new(BellAlert));
        }
        if let Some((program, args)) = settings.command.as_ref().and_then(|c| c.split_first()) {
            alerts
                .sinks
                .push(Box::new(CommandAlert::new(program.clone(), args.to_vec())));
        }
        alerts
    }

    pub(crate) fn sink_count(&self) -> usize {
        self.sinks.len()
    }
}

impl AlertSink for Alerts {
    fn alert(&self, check: &HealthCheck) {
        for sink in &self.sinks {
            sink.alert(check);
        }
    }
}
