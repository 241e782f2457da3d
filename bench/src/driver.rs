//! Load driver: fans out simulated clients and collects the outcome

use crate::config::BenchConfig;
use crate::script::run_client;
use crate::stats::{ClientFailure, RunSummary, Tally};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info};

/// Launches one task per simulated client against a single target
pub struct LoadDriver {
    config: Arc<BenchConfig>,
    tally: Arc<Tally>,
}

impl LoadDriver {
    pub fn new(config: BenchConfig) -> Self {
        Self {
            config: Arc::new(config),
            tally: Arc::new(Tally::new()),
        }
    }

    /// Run every client to completion or abandonment.
    ///
    /// Client failures are logged and collected, never propagated.
    pub async fn run(&self) -> RunSummary {
        let start = Instant::now();
        let url = Arc::new(self.config.url());
        let limiter = self
            .config
            .max_concurrency
            .map(|permits| Arc::new(Semaphore::new(permits)));

        info!(
            "Launching {} clients against {} (max concurrency: {})",
            self.config.clients,
            url,
            self.config
                .max_concurrency
                .map_or_else(|| "unbounded".to_string(), |n| n.to_string())
        );

        let mut tasks = JoinSet::new();
        for index in 0..self.config.clients {
            let config = self.config.clone();
            let tally = self.tally.clone();
            let url = url.clone();
            let limiter = limiter.clone();

            tasks.spawn(async move {
                // Semaphore is never closed, so acquisition only waits
                let _permit = match limiter {
                    Some(limiter) => limiter.acquire_owned().await.ok(),
                    None => None,
                };
                let _active = tally.enter();

                match run_client(
                    index,
                    &url,
                    &config.session_id,
                    &config.script,
                    tally.clone(),
                )
                .await
                {
                    Ok(()) => {
                        tally.record_success();
                        None
                    }
                    Err(e) => {
                        error!("{}: {}", index, e);
                        Some(ClientFailure {
                            index,
                            step: e.step(),
                            message: e.to_string(),
                        })
                    }
                }
            });
        }

        let mut failures = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Some(failure)) => failures.push(failure),
                Ok(None) => {}
                Err(e) => error!("client task did not finish: {}", e),
            }
        }

        self.tally
            .summarize(self.config.clients, failures, start.elapsed())
    }
}
