//! Connectivity health monitor.
//!
//! Opens and immediately closes a session on a fixed interval. Each check
//! produces one status line; failed checks also go to the alert sink.

use std::io::{self, Write};
use std::time::Duration;

use chrono::{DateTime, Local};
use log::{debug, warn};

use crate::endpoint::{Credential, Endpoint};
use crate::schedule::Pause;
use crate::session::{SessionGuard, SessionProvider};

const LINE_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    Up,
    Down(String),
}

#[derive(Debug, Clone)]
pub struct HealthCheck {
    pub at: DateTime<Local>,
    pub endpoint: Endpoint,
    pub status: HealthStatus,
}

impl HealthCheck {
    pub fn is_up(&self) -> bool {
        self.status == HealthStatus::Up
    }

    pub fn line(&self) -> String {
        let ts = self.at.format(LINE_TIMESTAMP_FORMAT);
        match &self.status {
            HealthStatus::Up => format!("{ts} - SFTP connection to {} succeeded.", self.endpoint),
            HealthStatus::Down(cause) => {
                format!("{ts} - SFTP connection to {} failed: {cause}", self.endpoint)
            }
        }
    }
}

/// Out-of-band notification for failed checks.
pub trait AlertSink {
    fn alert(&self, check: &HealthCheck);
}

/// Drops alerts.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoAlert;

impl AlertSink for NoAlert {
    fn alert(&self, _check: &HealthCheck) {}
}

impl<A: AlertSink + ?Sized> AlertSink for &A {
    fn alert(&self, check: &HealthCheck) {
        (**self).alert(check)
    }
}

impl<A: AlertSink + ?Sized> AlertSink for Box<A> {
    fn alert(&self, check: &HealthCheck) {
        (**self).alert(check)
    }
}

/// Counts from a monitor run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HealthTally {
    pub checks: u64,
    pub failures: u64,
}

pub struct HealthMonitor<P, A, Z> {
    provider: P,
    alert: A,
    pause: Z,
    endpoint: Endpoint,
    credential: Credential,
    interval: Duration,
}

impl<P, A, Z> HealthMonitor<P, A, Z>
where
    P: SessionProvider,
    A: AlertSink,
    Z: Pause,
{
    pub fn new(
        provider: P,
        alert: A,
        pause: Z,
        endpoint: Endpoint,
        credential: Credential,
        interval: Duration,
    ) -> Self {
        Self {
            provider,
            alert,
            pause,
            endpoint,
            credential,
            interval,
        }
    }

    pub fn check_once(&self) -> HealthCheck {
        let status = match self.provider.open(&self.endpoint, &self.credential) {
            Ok(session) => {
                SessionGuard::new(session).close();
                debug!("health check against {} passed", self.endpoint);
                HealthStatus::Up
            }
            Err(err) => {
                warn!("health check against {} failed: {}", self.endpoint, err);
                HealthStatus::Down(err.to_string())
            }
        };
        HealthCheck {
            at: Local::now(),
            endpoint: self.endpoint.clone(),
            status,
        }
    }

    /// Check, report, alert, pause; repeat. `max_checks = None` never returns
    /// unless writing to `out` fails.
    pub fn run<W: Write>(&self, out: &mut W, max_checks: Option<u64>) -> io::Result<HealthTally> {
        let mut tally = HealthTally::default();
        loop {
            let check = self.check_once();
            writeln!(out, "{}", check.line())?;
            out.flush()?;

            tally.checks += 1;
            if !check.is_up() {
                tally.failures += 1;
                self.alert.alert(&check);
            }

            if max_checks.is_some_and(|max| tally.checks >= max) {
                return Ok(tally);
            }
            self.pause.pause(self.interval);
        }
    }
}
