//! Submit-and-poll driver for asynchronous generation tasks

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::domain::{DomainError, GenerationOutcome, GenerationProvider, GenerationRequest, TaskState};
use crate::infrastructure::observability::record_generation_duration;

/// Poll cadence and hard attempt cap
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSchedule {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for PollSchedule {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            max_attempts: 60,
        }
    }
}

/// Per-call behaviour for a generation run
#[derive(Debug, Clone, Copy, Default)]
pub struct OrchestratorPolicy {
    /// Substitute the garment image when no result was produced
    pub placeholder_on_failure: bool,
}

#[derive(Debug)]
enum Phase {
    Submitted { task_id: String },
    Polling { task_id: String, attempts: u32 },
    Finished(GenerationOutcome),
}

/// Drives one task through `Submitted -> Polling -> Finished`
pub struct GenerationOrchestrator {
    provider: Arc<dyn GenerationProvider>,
    provider_name: &'static str,
    schedule: PollSchedule,
}

impl std::fmt::Debug for GenerationOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerationOrchestrator")
            .field("provider", &self.provider_name)
            .field("schedule", &self.schedule)
            .finish()
    }
}

impl GenerationOrchestrator {
    pub fn new(provider: Arc<dyn GenerationProvider>, schedule: PollSchedule) -> Self {
        let provider_name = provider.provider_name();

        Self {
            provider,
            provider_name,
            schedule,
        }
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider_name
    }

    /// Runs a task to a terminal outcome
    ///
    /// Only an oversized upload is returned as `Err`: it is the caller's input
    /// that was rejected, so no placeholder is substituted for it.
    pub async fn run(
        &self,
        request: &GenerationRequest,
        policy: OrchestratorPolicy,
    ) -> Result<GenerationOutcome, DomainError> {
        let started = Instant::now();

        let mut phase = match self.provider.submit(request).await {
            Ok(task_id) => Phase::Submitted { task_id },
            Err(e @ DomainError::PayloadTooLarge { .. }) => {
                record_generation_duration(self.provider_name, "rejected", started.elapsed());
                return Err(e);
            }
            Err(e) => {
                warn!(provider = self.provider_name, error = %e, "Task submission failed");
                Phase::Finished(GenerationOutcome::Failed {
                    task_id: None,
                    error: e.public_message(),
                })
            }
        };

        let outcome = loop {
            phase = match phase {
                Phase::Finished(outcome) => break outcome,
                Phase::Submitted { task_id } => {
                    info!(task_id = %task_id, "Generation task submitted, polling");
                    Phase::Polling {
                        task_id,
                        attempts: 0,
                    }
                }
                Phase::Polling { task_id, attempts } => self.poll_once(task_id, attempts).await,
            };
        };

        record_generation_duration(self.provider_name, outcome_label(&outcome), started.elapsed());

        if policy.placeholder_on_failure {
            return Ok(outcome.with_placeholder(&request.garment_url));
        }

        Ok(outcome)
    }

    async fn poll_once(&self, task_id: String, attempts: u32) -> Phase {
        if attempts >= self.schedule.max_attempts {
            warn!(task_id = %task_id, attempts, "Generation timed out");
            return Phase::Finished(GenerationOutcome::TimedOut { task_id, attempts });
        }

        tokio::time::sleep(self.schedule.interval).await;
        let attempts = attempts + 1;

        match self.provider.poll(&task_id).await {
            Ok(TaskState::Succeeded { result_url }) => {
                info!(task_id = %task_id, attempts, "Generation succeeded");
                Phase::Finished(GenerationOutcome::Success {
                    task_id,
                    result_url,
                })
            }
            Ok(TaskState::Failed { message }) => {
                warn!(task_id = %task_id, attempts, error = %message, "Generation failed");
                Phase::Finished(GenerationOutcome::Failed {
                    task_id: Some(task_id),
                    error: message,
                })
            }
            Ok(TaskState::Pending) => {
                debug!(task_id = %task_id, attempts, "Generation still pending");
                Phase::Polling { task_id, attempts }
            }
            Err(e) => {
                // Transient; the attempt still counts toward the cap
                warn!(task_id = %task_id, attempts, error = %e, "Poll request failed");
                Phase::Polling { task_id, attempts }
            }
        }
    }
}

/// Metric label for an outcome
pub fn outcome_label(outcome: &GenerationOutcome) -> &'static str {
    match outcome {
        GenerationOutcome::Success { .. } => "success",
        GenerationOutcome::FailedWithPlaceholder { .. } => "placeholder",
        GenerationOutcome::Failed { .. } => "failed",
        GenerationOutcome::TimedOut { .. } => "timed_out",
    }
}
