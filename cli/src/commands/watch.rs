//! Watch command - report ports as they start and stop listening.

use std::future::Future;
use std::time::Duration;

use anyhow::Result;
use chrono::Local;
use portpilot_core::{Config, Notification, PortScannerPort, PortService, ScanReport};
use serde_json::json;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

use super::scanner_for;

pub async fn run(interval_secs: Option<u64>, config: &Config, json: bool) -> Result<()> {
    let period = interval_secs
        .map(|secs| Duration::from_secs(secs.max(1)))
        .unwrap_or_else(|| config.refresh_interval());

    let service = PortService::from_config(scanner_for(config), config);

    info!(interval = ?period, "Watching listening ports");

    watch_loop(&service, period, ctrl_c(), |report, first| {
        if first {
            if !json {
                println!(
                    "Watching {} listening ports every {}s (Ctrl+C to stop)",
                    report.records.len(),
                    period.as_secs()
                );
            }
            return Ok(());
        }
        report
            .notifications
            .iter()
            .try_for_each(|n| print_notification(n, json))
    })
    .await
}

async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        debug!(error = %e, "Failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
}

/// Refresh every `period` until `shutdown` resolves, handing each report to
/// `on_report` (with `true` for the first one).
///
/// `shutdown` is polled across ticks and in-flight scans alike, so a stop
/// request is never lost while a slow tool runs.
async fn watch_loop<S, F>(
    service: &PortService<S>,
    period: Duration,
    shutdown: F,
    mut on_report: impl FnMut(&ScanReport, bool) -> Result<()>,
) -> Result<()>
where
    S: PortScannerPort,
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);

    // A scan slower than the period delays the next tick instead of piling up.
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut first = true;

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = &mut shutdown => break,
        }

        let report = tokio::select! {
            report = service.refresh() => report,
            _ = &mut shutdown => break,
        };

        on_report(&report, first)?;
        first = false;
    }

    Ok(())
}

fn print_notification(notification: &Notification, json: bool) -> Result<()> {
    let now = Local::now();
    if json {
        let line = json!({
            "time": now.to_rfc3339(),
            "event": notification,
            "message": notification.to_string(),
        });
        println!("{}", serde_json::to_string(&line)?);
    } else {
        println!("[{}] {}", now.format("%H:%M:%S"), notification);
    }
    Ok(())
}
