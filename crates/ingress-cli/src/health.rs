use eyre::Result;
use ingress_core::{HealthMonitor, ThreadPause};
use log::{debug, info};
use std::io;

use crate::alert::Alerts;
use crate::config::HealthRuntime;

pub async fn run_health(runtime: HealthRuntime) -> Result<()> {
    let HealthRuntime {
        config,
        connector,
        count,
        alert,
    } = runtime;

    match count {
        Some(count) => info!(
            "checking {} every {:?} ({} check(s))",
            config.endpoint, config.interval, count
        ),
        None => info!(
            "checking {} every {:?} until interrupted",
            config.endpoint, config.interval
        ),
    }

    let alerts = Alerts::from_settings(&alert);
    debug!("{} alert sink(s) configured", alerts.sink_count());
    let tally = tokio::task::spawn_blocking(move || {
        let monitor = HealthMonitor::new(
            connector,
            alerts,
            ThreadPause,
            config.endpoint,
            config.credential,
            config.interval,
        );
        let stdout = io::stdout();
        let mut out = stdout.lock();
        monitor.run(&mut out, count)
    })
    .await??;

    info!(
        "health monitor stopped after {} check(s), {} failed",
        tally.checks, tally.failures
    );
    Ok(())
}
