// src/rank/mod.rs

//! The periodic ranking service.
//!
//! Recomputes corpus statistics in three sequential phases: document
//! frequency, inverse document frequency, then per-document norms. Each
//! phase retries with exponential backoff; a phase that exhausts its
//! retries fails the whole run, and the next tick starts over from
//! phase 1.

use std::time::Duration;

use tokio::time::{interval, sleep, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::error::{AppError, Result};
use crate::store::rank;
use crate::store::Store;

/// Ranking service settings.
#[derive(Debug, Clone)]
pub struct RankerOptions {
    /// Time between ranking runs
    pub interval: Duration,
    /// Retries per phase beyond the first attempt
    pub max_retries: u32,
    /// First backoff delay; doubles per retry
    pub base_delay: Duration,
    /// Backoff ceiling
    pub max_delay: Duration,
}

impl Default for RankerOptions {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(600),
            max_retries: 5,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Phase {
    DocumentFrequency,
    InverseDocumentFrequency,
    DocumentNorms,
}

impl Phase {
    fn name(&self) -> &'static str {
        match self {
            Phase::DocumentFrequency => "document_frequency",
            Phase::InverseDocumentFrequency => "inverse_document_frequency",
            Phase::DocumentNorms => "document_norms",
        }
    }
}

/// Periodic three-phase ranking job.
pub struct Ranker {
    store: Store,
    options: RankerOptions,
}

impl Ranker {
    pub fn new(store: Store) -> Self {
        Self::with_options(store, RankerOptions::default())
    }

    pub fn with_options(store: Store, options: RankerOptions) -> Self {
        Self { store, options }
    }

    /// Run until cancelled: one update immediately, then one per tick.
    pub async fn run(&self, cancel: CancellationToken) {
        info!("running initial ranking update");
        if let Err(e) = self.update_rankings(&cancel).await {
            error!(error = %e, "initial ranking update failed");
        }

        let mut ticker = interval(self.options.interval);
        ticker.tick().await; // consume the immediate first tick

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("ranker stopped");
                    return;
                }
                _ = ticker.tick() => {
                    info!("running scheduled ranking update");
                    if let Err(e) = self.update_rankings(&cancel).await {
                        error!(error = %e, "scheduled ranking update failed");
                    }
                }
            }
        }
    }

    /// Execute one full three-phase run.
    pub async fn update_rankings(&self, cancel: &CancellationToken) -> Result<()> {
        let start = Instant::now();

        self.run_phase(cancel, Phase::DocumentFrequency).await?;
        self.run_phase(cancel, Phase::InverseDocumentFrequency).await?;
        self.run_phase(cancel, Phase::DocumentNorms).await?;

        info!(elapsed_ms = start.elapsed().as_millis() as u64, "ranking update completed");
        Ok(())
    }

    /// Run one phase with bounded retry and cancellation-aware backoff.
    async fn run_phase(&self, cancel: &CancellationToken, phase: Phase) -> Result<()> {
        let mut last_err = None;

        for attempt in 0..=self.options.max_retries {
            if attempt > 0 {
                let delay = backoff_delay(
                    attempt,
                    self.options.base_delay,
                    self.options.max_delay,
                );
                warn!(
                    phase = phase.name(),
                    attempt,
                    max_retries = self.options.max_retries,
                    delay_ms = delay.as_millis() as u64,
                    "retrying ranking phase after error"
                );
                tokio::select! {
                    _ = cancel.cancelled() => return Err(AppError::Cancelled),
                    _ = sleep(delay) => {}
                }
            }

            match self.exec_phase(phase).await {
                Ok(()) => {
                    if attempt > 0 {
                        info!(phase = phase.name(), attempt = attempt + 1, "ranking phase succeeded on retry");
                    }
                    return Ok(());
                }
                Err(e) => {
                    error!(phase = phase.name(), attempt = attempt + 1, error = %e, "ranking phase failed");
                    last_err = Some(e);
                }
            }
        }

        Err(last_err.expect("loop ran at least once"))
    }

    async fn exec_phase(&self, phase: Phase) -> Result<()> {
        match phase {
            Phase::DocumentFrequency => rank::update_document_frequency(&self.store.pool).await,
            Phase::InverseDocumentFrequency => {
                rank::update_inverse_document_frequency(&self.store.pool).await
            }
            Phase::DocumentNorms => rank::update_document_norms(&self.store.pool).await,
        }
    }
}

/// Delay before retry `attempt` (1-based): base * 2^(attempt-1), capped.
fn backoff_delay(attempt: u32, base: Duration, cap: Duration) -> Duration {
    let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
    base.saturating_mul(factor).min(cap)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_doubles_and_caps() {
        let base = Duration::from_millis(100);
        let cap = Duration::from_secs(5);
        assert_eq!(backoff_delay(1, base, cap), Duration::from_millis(100));
        assert_eq!(backoff_delay(2, base, cap), Duration::from_millis(200));
        assert_eq!(backoff_delay(3, base, cap), Duration::from_millis(400));
        assert_eq!(backoff_delay(4, base, cap), Duration::from_millis(800));
        assert_eq!(backoff_delay(7, base, cap), Duration::from_secs(5));
        assert_eq!(backoff_delay(30, base, cap), Duration::from_secs(5));
    }

    #[test]
    fn test_default_options_match_service_contract() {
        let options = RankerOptions::default();
        assert_eq!(options.interval, Duration::from_secs(600));
        assert_eq!(options.max_retries, 5);
        assert_eq!(options.base_delay, Duration::from_millis(100));
        assert_eq!(options.max_delay, Duration::from_secs(5));
    }
}
