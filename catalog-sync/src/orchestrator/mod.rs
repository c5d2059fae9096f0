//! Orchestrator module for the change consumer.
//!
//! Runs the consume-apply-commit loop: poll one message, decode it, apply it
//! to the search index and only then commit its offset.

mod retry;
mod stats;

use std::sync::Arc;
use std::time::Instant;
use tokio::sync::broadcast;
use tokio::time::{interval, sleep, Duration, MissedTickBehavior};
use tracing::{debug, error, info, instrument, warn};

use crate::config::Settings;
use crate::consumer::{ConsumedMessage, Consumer};
use crate::dead_letter::{DeadLetterReason, DeadLetterSink};
use crate::errors::IngestError;
use crate::processor::EventProcessor;
use crate::updater::IndexUpdater;

pub use retry::RetryTracker;
pub use stats::{PipelineStats, StatsSnapshot};

/// Configuration for the orchestrator.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Longest a single poll waits for a message.
    pub poll_timeout: Duration,
    /// Pause after a failed apply before the event is redelivered.
    pub retry_backoff: Duration,
    /// Failed applies after which an event is dead-lettered, if a sink exists.
    pub max_apply_attempts: Option<u32>,
    /// How often progress counters are logged.
    pub progress_interval: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            poll_timeout: Duration::from_millis(100),
            retry_backoff: Duration::from_secs(1),
            max_apply_attempts: None,
            progress_interval: Duration::from_secs(10),
        }
    }
}

impl OrchestratorConfig {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            poll_timeout: settings.poll_timeout,
            retry_backoff: settings.retry_backoff,
            max_apply_attempts: settings.max_apply_attempts,
            ..Self::default()
        }
    }
}

/// Requests a running orchestrator to stop.
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    shutdown_tx: broadcast::Sender<()>,
}

impl ShutdownHandle {
    /// Stop polling. An event being applied is finished and committed first.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }
}

enum LoopEvent {
    Shutdown,
    Progress,
    Polled(Result<Option<ConsumedMessage>, IngestError>),
}

/// Orchestrator that drives the change consumer.
///
/// The orchestrator:
/// - Processes messages one at a time, in partition order
/// - Commits an offset only after the event was applied to the index
/// - Rewinds and redelivers events whose apply failed
/// - Routes undecodable or exhausted events to the dead-letter sink
/// - Handles shutdown requests
pub struct Orchestrator {
    consumer: Arc<dyn Consumer>,
    processor: EventProcessor,
    updater: IndexUpdater,
    dead_letter: Option<Arc<dyn DeadLetterSink>>,
    config: OrchestratorConfig,
    shutdown_tx: broadcast::Sender<()>,
    shutdown_rx: broadcast::Receiver<()>,
    stats: Arc<PipelineStats>,
    retries: RetryTracker,
}

impl Orchestrator {
    /// Create a new orchestrator with the given components.
    pub fn new(consumer: Arc<dyn Consumer>, processor: EventProcessor, updater: IndexUpdater) -> Self {
        Self::with_config(consumer, processor, updater, OrchestratorConfig::default())
    }

    /// Create a new orchestrator with custom configuration.
    pub fn with_config(
        consumer: Arc<dyn Consumer>,
        processor: EventProcessor,
        updater: IndexUpdater,
        config: OrchestratorConfig,
    ) -> Self {
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

        Self {
            consumer,
            processor,
            updater,
            dead_letter: None,
            config,
            shutdown_tx,
            shutdown_rx,
            stats: Arc::new(PipelineStats::default()),
            retries: RetryTracker::new(),
        }
    }

    /// Route unprocessable events to `sink` instead of skipping them.
    pub fn with_dead_letter(mut self, sink: Arc<dyn DeadLetterSink>) -> Self {
        self.dead_letter = Some(sink);
        self
    }

    /// A handle that stops [`run`](Self::run) from another task.
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            shutdown_tx: self.shutdown_tx.clone(),
        }
    }

    /// Shared progress counters.
    pub fn stats(&self) -> Arc<PipelineStats> {
        Arc::clone(&self.stats)
    }

    /// Run the orchestrator.
    ///
    /// Subscribes, then processes events until a shutdown is requested.
    #[instrument(skip(self))]
    pub async fn run(&mut self) -> Result<(), IngestError> {
        info!("Starting catalog sync orchestrator");

        self.consumer.subscribe()?;

        info!(
            poll_timeout_ms = self.config.poll_timeout.as_millis() as u64,
            max_apply_attempts = ?self.config.max_apply_attempts,
            dead_letter = self.dead_letter.is_some(),
            "Ready to process change events"
        );

        let mut progress_timer = interval(self.config.progress_interval);
        progress_timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // Skip the first tick immediately
        progress_timer.tick().await;

        let mut previous = self.stats.snapshot();
        let mut previous_time = Instant::now();

        loop {
            let next = tokio::select! {
                biased;
                _ = self.shutdown_rx.recv() => LoopEvent::Shutdown,
                _ = progress_timer.tick() => LoopEvent::Progress,
                polled = self.consumer.poll(self.config.poll_timeout) => LoopEvent::Polled(polled),
            };

            match next {
                LoopEvent::Shutdown => {
                    info!("Received shutdown request");
                    break;
                }
                LoopEvent::Progress => {
                    let current = self.stats.snapshot();
                    let now = Instant::now();
                    let elapsed_secs = now.duration_since(previous_time).as_secs_f64();

                    let events_per_sec = if elapsed_secs > 0.0 {
                        (current.events_settled().saturating_sub(previous.events_settled()) as f64)
                            / elapsed_secs
                    } else {
                        0.0
                    };

                    info!(
                        events_applied = current.events_applied,
                        events_skipped = current.events_skipped,
                        events_dead_lettered = current.events_dead_lettered,
                        apply_failures = current.apply_failures,
                        events_per_sec = format!("{:.2}", events_per_sec),
                        "Processing progress"
                    );

                    previous = current;
                    previous_time = now;
                }
                LoopEvent::Polled(Ok(Some(message))) => self.handle_message(message).await,
                LoopEvent::Polled(Ok(None)) => {}
                LoopEvent::Polled(Err(e)) => {
                    error!(error = %e, "Failed to poll change topic");
                    sleep(self.config.poll_timeout).await;
                }
            }
        }

        let totals = self.stats.snapshot();
        info!(
            events_applied = totals.events_applied,
            events_skipped = totals.events_skipped,
            events_dead_lettered = totals.events_dead_lettered,
            apply_failures = totals.apply_failures,
            "Orchestrator shutdown complete"
        );
        Ok(())
    }

    /// Decode, apply and commit a single message.
    #[instrument(skip_all, fields(position = %message))]
    async fn handle_message(&mut self, message: ConsumedMessage) {
        let event = match self.processor.process(&message) {
            Ok(event) => event,
            Err(e) => {
                self.divert(&message, DeadLetterReason::from(e)).await;
                return;
            }
        };

        match self.updater.apply(&event).await {
            Ok(()) => {
                self.retries.clear(&message);
                self.stats.record_applied();
                self.commit(&message);
                debug!(
                    operation = %event.operation,
                    entity_id = %event.entity_id(),
                    "Applied change event"
                );
            }
            Err(e) => {
                self.stats.record_apply_failure();
                let attempt = self.retries.record_failure(&message);

                if self.attempts_exhausted(attempt) {
                    let reason = DeadLetterReason::exhausted(attempt, &e);
                    if self.dead_letter(&message, &reason).await {
                        self.retries.clear(&message);
                        return;
                    }
                }

                error!(
                    operation = %event.operation,
                    entity_id = %event.entity_id(),
                    attempt = attempt,
                    error = %e,
                    "Failed to apply change event. Not committing, it will be redelivered"
                );
                self.redeliver(&message).await;
            }
        }
    }

    /// Take an undecodable message out of the stream.
    async fn divert(&self, message: &ConsumedMessage, reason: DeadLetterReason) {
        if self.dead_letter.is_some() {
            if !self.dead_letter(message, &reason).await {
                self.redeliver(message).await;
            }
            return;
        }

        warn!(reason = %reason, "Skipping unprocessable change event");
        self.stats.record_skipped();
        self.commit(message);
    }

    /// Send to the dead-letter sink and commit. Returns whether the message
    /// left the stream.
    async fn dead_letter(&self, message: &ConsumedMessage, reason: &DeadLetterReason) -> bool {
        let Some(sink) = &self.dead_letter else {
            return false;
        };

        match sink.send(message, reason).await {
            Ok(()) => {
                self.stats.record_dead_lettered();
                self.commit(message);
                true
            }
            Err(e) => {
                error!(error = %e, reason = %reason, "Failed to dead-letter message");
                false
            }
        }
    }

    fn attempts_exhausted(&self, attempt: u32) -> bool {
        match self.config.max_apply_attempts {
            Some(max) => self.dead_letter.is_some() && attempt >= max,
            None => false,
        }
    }

    fn commit(&self, message: &ConsumedMessage) {
        if let Err(e) = self.consumer.commit(message) {
            // Offset stays behind; the applied event will be replayed
            error!(error = %e, "Failed to commit offset");
        }
    }

    async fn redeliver(&self, message: &ConsumedMessage) {
        if let Err(e) = self.consumer.rewind(message) {
            error!(error = %e, "Failed to rewind partition");
        }
        sleep(self.config.retry_backoff).await;
    }
}
