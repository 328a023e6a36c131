//! Polling state machine for a background match job
//!
//! The poller only decides *when* to ask for a status and what a status means. The
//! actual request and delay are carried out by the command executor, which reports
//! back with [`Message::StatusReceived`]. Every start of a poll chain takes a new
//! epoch, and a response is applied only when both its job id and its epoch match
//! the chain in flight. Replies queued before a detach are therefore dropped even
//! when the same job is attached again, so each job id gets exactly one terminal
//! transition.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::{
    error::ApiError,
    job::{JobId, JobStatus, JobStatusResponse},
};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1500);

const JOB_FAILED_FALLBACK: &str = "Matching failed.";
const STATUS_FAILED_FALLBACK: &str = "Failed to check status.";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PollState {
    #[default]
    Idle,
    InFlight {
        job_id: JobId,
        epoch: u64,
        polls: u32,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Message {
    /// A fresh upload was accepted; supersedes any job already in flight
    JobAccepted(JobId),
    /// The view came back while a job from the session is still running
    Attached(JobId),
    /// The view went away or the session was cleared
    Detached,
    StatusReceived {
        job_id: JobId,
        epoch: u64,
        result: Result<JobStatusResponse, ApiError>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    SchedulePoll {
        job_id: JobId,
        epoch: u64,
        delay: Duration,
    },
    CancelPolling,
    Completed { job_id: JobId },
    Failed { job_id: JobId, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobPoller {
    state: PollState,
    interval: Duration,
    /// Bumped by every start of a poll chain
    epoch: u64,
}

impl Default for JobPoller {
    fn default() -> Self {
        Self::new(DEFAULT_POLL_INTERVAL)
    }
}

impl JobPoller {
    pub fn new(interval: Duration) -> Self {
        Self {
            state: PollState::Idle,
            interval,
            epoch: 0,
        }
    }

    pub fn state(&self) -> &PollState {
        &self.state
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn current_job(&self) -> Option<&JobId> {
        match &self.state {
            PollState::InFlight { job_id, .. } => Some(job_id),
            PollState::Idle => None,
        }
    }

    pub fn is_in_flight(&self) -> bool {
        matches!(self.state, PollState::InFlight { .. })
    }

    pub fn update(&mut self, message: Message) -> Vec<Effect> {
        match message {
            Message::JobAccepted(job_id) => {
                let mut effects = Vec::new();
                if self.is_in_flight() {
                    effects.push(Effect::CancelPolling);
                }
                effects.push(self.start(job_id));
                effects
            }
            Message::Attached(job_id) => {
                if self.current_job() == Some(&job_id) {
                    return vec![];
                }
                let mut effects = Vec::new();
                if self.is_in_flight() {
                    effects.push(Effect::CancelPolling);
                }
                effects.push(self.start(job_id));
                effects
            }
            Message::Detached => match std::mem::take(&mut self.state) {
                PollState::InFlight { .. } => vec![Effect::CancelPolling],
                PollState::Idle => vec![],
            },
            Message::StatusReceived {
                job_id,
                epoch,
                result,
            } => {
                let PollState::InFlight {
                    job_id: current,
                    epoch: current_epoch,
                    polls,
                } = &mut self.state
                else {
                    log::debug!("status for {job_id} ignored: no job in flight");
                    return vec![];
                };
                if *current != job_id {
                    log::debug!("status for {job_id} ignored: tracking {current}");
                    return vec![];
                }
                if *current_epoch != epoch {
                    log::debug!(
                        "stale status for {job_id} ignored: epoch {epoch}, tracking {current_epoch}"
                    );
                    return vec![];
                }
                *polls += 1;

                match result {
                    Ok(response) => match response.status {
                        JobStatus::Pending | JobStatus::Processing => {
                            log::trace!(
                                "job {job_id} still {} after {polls} polls",
                                response.status
                            );
                            vec![Effect::SchedulePoll {
                                job_id,
                                epoch,
                                delay: self.interval,
                            }]
                        }
                        JobStatus::Completed => {
                            log::info!("job {job_id} completed after {polls} polls");
                            self.state = PollState::Idle;
                            vec![Effect::Completed { job_id }]
                        }
                        JobStatus::Failed => {
                            self.state = PollState::Idle;
                            let message = response
                                .error
                                .filter(|message| !message.is_empty())
                                .unwrap_or_else(|| JOB_FAILED_FALLBACK.to_string());
                            log::warn!("job {job_id} failed: {message}");
                            vec![Effect::Failed { job_id, message }]
                        }
                    },
                    Err(error) => {
                        self.state = PollState::Idle;
                        log::warn!("status check for {job_id} failed: {error}");
                        vec![Effect::Failed {
                            job_id,
                            message: error.user_message(STATUS_FAILED_FALLBACK),
                        }]
                    }
                }
            }
        }
    }

    fn start(&mut self, job_id: JobId) -> Effect {
        self.epoch = self.epoch.wrapping_add(1);
        self.state = PollState::InFlight {
            job_id: job_id.clone(),
            epoch: self.epoch,
            polls: 0,
        };
        Effect::SchedulePoll {
            job_id,
            epoch: self.epoch,
            delay: Duration::ZERO,
        }
    }
}
