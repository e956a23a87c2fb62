// libs/sniper-cell/src/services/scheduler.rs
use std::future::Future;

use tracing::{debug, error, info};

use shared_models::SniperError;

use crate::models::SchedulerConfig;
use crate::services::check::CheckOrchestrator;

/// Runs a cycle right away, then again `delay` after each cycle finishes,
/// until `shutdown` resolves. A running cycle is never interrupted; shutdown
/// is only observed while waiting. Returns the number of cycles run, or the
/// first fatal error, which stops the schedule.
pub async fn run_every<F>(
    orchestrator: &mut CheckOrchestrator,
    config: &SchedulerConfig,
    shutdown: F,
) -> Result<u64, SniperError>
where
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);
    let delay = config.delay();
    let mut cycles = 0u64;

    info!("Checking every {} seconds", config.delay_seconds);

    loop {
        cycles += 1;
        if let Err(e) = orchestrator.run_cycle().await {
            error!("Stopping after {} cycles: {}", cycles, e);
            return Err(e);
        }
        debug!(cycles, "Waiting {:?} for the next cycle", delay);

        tokio::select! {
            _ = &mut shutdown => {
                info!("Shutdown signal received after {} cycles", cycles);
                break;
            }
            _ = tokio::time::sleep(delay) => {}
        }
    }

    Ok(cycles)
}
