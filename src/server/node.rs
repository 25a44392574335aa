use crate::runtime;
use crate::server::Settings;
use crate::sim::Zone;
use crate::Result;

use actix::Arbiter;
use colored::Colorize;
use tracing::{error, info};

use std::time::Duration;

/// Runs the configured zone on the virtual clock and reports every node's counters.
pub fn simulate(settings: Settings) -> Result<()> {
    let mut zone = Zone::build(settings.zone)?;
    zone.run_for(Duration::from_secs(settings.duration_secs))?;
    info!(
        "[{}] {} events in {:?} of virtual time",
        "zone".white(),
        zone.simulator().processed(),
        zone.simulator().now()
    );
    for (label, stats) in zone.stats() {
        info!("[{}] {}: {:?}", "zone".white(), label, stats);
    }
    Ok(())
}

/// Starts the configured zone on the current actix system and reports after the configured
/// duration. Must be called from within a running system.
pub fn run(settings: Settings) -> Result<()> {
    let report_after = Duration::from_secs(settings.duration_secs);
    let execution = async move {
        let zone = match runtime::launch(settings.zone).await {
            Ok(zone) => zone,
            Err(err) => {
                error!("[{}] launch failed: {}", "zone".white(), err);
                return;
            }
        };
        tokio::time::sleep(report_after).await;
        match zone.status().await {
            Ok(statuses) => {
                for status in statuses {
                    info!("[{}] {} ({}): {:?}", "zone".white(), status.label, status.kind, status.stats);
                }
            }
            Err(err) => error!("[{}] status unavailable: {}", "zone".white(), err),
        }
        // Keep the actors' addresses alive until the system stops
        futures::future::pending::<()>().await;
    };

    let arbiter = Arbiter::new();
    arbiter.spawn(execution);
    Ok(())
}
